use clap::Subcommand;
use taskrhythm_core::parse::{day_name, parse_day, parse_time_of_day};
use taskrhythm_core::{EnergyLevel, NewWindow, WindowId, WindowUpdate};

use super::{CmdResult, Context};

#[derive(Subcommand)]
pub enum WindowAction {
    /// Define a weekly energy window
    Add {
        /// Day of week: monday..sunday, mon..sun, or 0 (Monday) to 6 (Sunday)
        #[arg(long)]
        day: String,
        /// Start time (HH:MM)
        #[arg(long)]
        start: String,
        /// End time (HH:MM); at or before the start means past midnight
        #[arg(long)]
        end: String,
        /// Energy level: high, medium or low
        #[arg(long)]
        energy: String,
    },
    /// List energy windows
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Change an energy window
    Update {
        /// Window ID
        id: i64,
        #[arg(long)]
        day: Option<String>,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        #[arg(long)]
        energy: Option<String>,
    },
    /// Delete an energy window; its tasks return to the backlog
    Delete {
        /// Window ID
        id: i64,
    },
}

pub fn run(ctx: &Context, action: WindowAction) -> CmdResult {
    let db = ctx.open_db()?;

    match action {
        WindowAction::Add {
            day,
            start,
            end,
            energy,
        } => {
            let new = NewWindow::new(
                parse_day(&day)?,
                parse_time_of_day(&start)?,
                parse_time_of_day(&end)?,
                EnergyLevel::parse(&energy)?,
            );
            let window = db.create_window(ctx.user, &new)?;
            println!(
                "Window created: {} ({} minutes)",
                window.id,
                window.duration_minutes()
            );
        }
        WindowAction::List { json } => {
            let windows = db.list_windows(ctx.user)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&windows)?);
            } else if windows.is_empty() {
                println!("No energy windows.");
            } else {
                for w in &windows {
                    println!(
                        "{:>4}  {:<9} {}-{}  {:<6} {:>4} min",
                        w.id,
                        day_name(w.day_of_week),
                        w.time_start.format("%H:%M"),
                        w.time_end.format("%H:%M"),
                        w.energy_level.as_str(),
                        w.duration_minutes()
                    );
                }
            }
        }
        WindowAction::Update {
            id,
            day,
            start,
            end,
            energy,
        } => {
            let update = WindowUpdate {
                day_of_week: day.as_deref().map(parse_day).transpose()?,
                time_start: start.as_deref().map(parse_time_of_day).transpose()?,
                time_end: end.as_deref().map(parse_time_of_day).transpose()?,
                energy_level: energy.as_deref().map(EnergyLevel::parse).transpose()?,
            };
            let window = db.update_window(ctx.user, WindowId(id), &update)?;
            println!("Window {} updated", window.id);
        }
        WindowAction::Delete { id } => {
            let detached = db.delete_window(ctx.user, WindowId(id))?;
            println!("Window {id} deleted ({detached} task(s) returned to the backlog)");
        }
    }
    Ok(())
}
