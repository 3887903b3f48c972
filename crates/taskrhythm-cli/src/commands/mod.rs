use std::path::PathBuf;

use taskrhythm_core::{Config, ScheduleDb, UserId};

pub mod config;
pub mod schedule;
pub mod task;
pub mod window;

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Settings shared by every command.
pub struct Context {
    pub config: Config,
    pub user: UserId,
    db_override: Option<PathBuf>,
}

impl Context {
    pub fn load(
        user: Option<UserId>,
        db: Option<PathBuf>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let config = Config::load()?;
        let user = user.unwrap_or(config.user.default_user);
        Ok(Self {
            config,
            user,
            db_override: db,
        })
    }

    pub fn db_path(&self) -> Result<PathBuf, Box<dyn std::error::Error>> {
        match &self.db_override {
            Some(path) => Ok(path.clone()),
            None => Ok(self.config.database_path()?),
        }
    }

    pub fn open_db(&self) -> Result<ScheduleDb, Box<dyn std::error::Error>> {
        let path = self.db_path()?;
        tracing::debug!(path = %path.display(), user = self.user, "opening database");
        Ok(ScheduleDb::open_at(path)?)
    }
}

/// `-` for absent values in plain-text listings.
pub fn or_dash<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}
