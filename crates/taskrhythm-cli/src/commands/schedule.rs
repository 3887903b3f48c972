use chrono::Local;
use clap::Subcommand;
use taskrhythm_core::parse::{day_name, parse_date};
use taskrhythm_core::scheduler::CLEARED_MESSAGE;
use taskrhythm_core::MessageKind;

use super::{or_dash, CmdResult, Context};

#[derive(Subcommand)]
pub enum ScheduleAction {
    /// Assign backlog tasks to energy windows
    Run {
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Reference date for deadline checks (YYYY-MM-DD, default: today)
        #[arg(long)]
        today: Option<String>,
    },
    /// Unassign every task
    Clear,
    /// Show windows with their tasks
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

pub fn run(ctx: &Context, action: ScheduleAction) -> CmdResult {
    let mut db = ctx.open_db()?;

    match action {
        ScheduleAction::Run { json, today } => {
            let today = match today {
                Some(raw) => parse_date(&raw)?,
                None => Local::now().date_naive(),
            };
            let outcome = db.run_scheduling_pass(ctx.user, today, &ctx.config.scheduler)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                println!("{}", outcome.message);
                for a in &outcome.assignments {
                    println!("  task {} -> window {}", a.task_id, a.window_id);
                }
                if !outcome.unassigned_tasks.is_empty() {
                    println!("Unassigned:");
                    for t in &outcome.unassigned_tasks {
                        println!("  {} {}", t.id, t.title);
                    }
                }
            }
        }
        ScheduleAction::Clear => {
            let cleared = db.clear_schedule(ctx.user)?;
            println!("{CLEARED_MESSAGE} ({cleared} task(s) unassigned)");
        }
        ScheduleAction::Show { json } => {
            let view = db.schedule_view(ctx.user)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&view)?);
                return Ok(());
            }

            let label = match view.kind {
                MessageKind::Info => "info",
                MessageKind::Success => "ok",
                MessageKind::Warning => "warning",
            };
            println!("[{label}] {}", view.message);
            for slot in &view.slots {
                let w = &slot.window;
                println!(
                    "{} {}-{} ({}, {} of {} min free)",
                    day_name(w.day_of_week),
                    w.time_start.format("%H:%M"),
                    w.time_end.format("%H:%M"),
                    w.energy_level,
                    slot.available_minutes,
                    slot.total_minutes
                );
                for t in &slot.tasks {
                    println!(
                        "  {} {} [{}, {} min]",
                        t.id,
                        t.title,
                        t.effort,
                        or_dash(t.estimated_duration)
                    );
                }
            }
            if !view.unassigned.is_empty() {
                println!("Unassigned:");
                for t in &view.unassigned {
                    println!("  {} {} [{}]", t.id, t.title, t.effort);
                }
            }
        }
    }
    Ok(())
}
