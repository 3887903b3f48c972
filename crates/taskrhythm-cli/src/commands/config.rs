use clap::Subcommand;

use super::{CmdResult, Context};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the whole configuration as TOML
    Show,
    /// Get a config value
    Get {
        /// Config key (e.g. "scheduler.default_task_minutes")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value (empty string clears an optional key)
        value: String,
    },
}

pub fn run(ctx: Context, action: ConfigAction) -> CmdResult {
    let mut config = ctx.config;
    match action {
        ConfigAction::Show => {
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Get { key } => match config.get(&key) {
            Some(value) => println!("{value}"),
            None => return Err(format!("unknown config key: {key}").into()),
        },
        ConfigAction::Set { key, value } => {
            config.set(&key, &value)?;
            config.save()?;
            println!("ok");
        }
    }
    Ok(())
}
