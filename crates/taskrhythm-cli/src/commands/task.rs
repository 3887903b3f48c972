//! Task management commands for CLI.

use clap::Subcommand;
use taskrhythm_core::parse::parse_date;
use taskrhythm_core::{EffortLevel, NewTask, TaskId, TaskUpdate};

use super::{or_dash, CmdResult, Context};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task to the backlog
    Add {
        /// Task title
        title: String,
        /// Required energy: high, medium or low
        #[arg(long)]
        effort: String,
        /// Estimated duration in minutes
        #[arg(long)]
        minutes: Option<u32>,
        /// Deadline (YYYY-MM-DD)
        #[arg(long)]
        deadline: Option<String>,
        /// Task description
        #[arg(long)]
        description: Option<String>,
    },
    /// List tasks
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
        /// Include completed tasks
        #[arg(long)]
        all: bool,
    },
    /// Change fields of a task; omitted flags keep their value
    Update {
        /// Task ID
        id: i64,
        #[arg(long)]
        title: Option<String>,
        /// Required energy: high, medium or low
        #[arg(long)]
        effort: Option<String>,
        /// Estimated duration in minutes
        #[arg(long)]
        minutes: Option<u32>,
        /// Deadline (YYYY-MM-DD)
        #[arg(long)]
        deadline: Option<String>,
        /// Task description (empty string clears it)
        #[arg(long)]
        description: Option<String>,
    },
    /// Mark a task completed
    Done {
        /// Task ID
        id: i64,
    },
    /// Mark a completed task open again
    Reopen {
        /// Task ID
        id: i64,
    },
    /// Delete a task
    Delete {
        /// Task ID
        id: i64,
    },
}

pub fn run(ctx: &Context, action: TaskAction) -> CmdResult {
    let db = ctx.open_db()?;

    match action {
        TaskAction::Add {
            title,
            effort,
            minutes,
            deadline,
            description,
        } => {
            let mut new = NewTask::new(title, EffortLevel::parse(&effort)?);
            if let Some(minutes) = minutes {
                new = new.with_duration(minutes);
            }
            if let Some(deadline) = deadline {
                new = new.with_deadline(parse_date(&deadline)?);
            }
            if let Some(description) = description {
                new = new.with_description(description);
            }
            let task = db.create_task(ctx.user, &new)?;
            println!("Task created: {}", task.id);
        }
        TaskAction::List { json, all } => {
            let tasks: Vec<_> = db
                .list_tasks(ctx.user)?
                .into_iter()
                .filter(|t| all || !t.is_completed)
                .collect();
            if json {
                println!("{}", serde_json::to_string_pretty(&tasks)?);
            } else if tasks.is_empty() {
                println!("No tasks.");
            } else {
                for t in &tasks {
                    let status = if t.is_completed { "done" } else { "open" };
                    println!(
                        "{:>4}  {:<6} {:<6} {:>5}  {:<10}  {:>6}  {}",
                        t.id,
                        status,
                        t.effort.as_str(),
                        or_dash(t.estimated_duration),
                        or_dash(t.deadline),
                        or_dash(t.assigned_window),
                        t.title
                    );
                }
            }
        }
        TaskAction::Update {
            id,
            title,
            effort,
            minutes,
            deadline,
            description,
        } => {
            let update = TaskUpdate {
                title,
                description,
                effort: effort.as_deref().map(EffortLevel::parse).transpose()?,
                estimated_duration: minutes,
                deadline: deadline.as_deref().map(parse_date).transpose()?,
            };
            let task = db.update_task(ctx.user, TaskId(id), &update)?;
            println!("Task {} updated", task.id);
        }
        TaskAction::Done { id } => {
            let task = db.set_task_completed(ctx.user, TaskId(id), true)?;
            println!("Task {} completed", task.id);
        }
        TaskAction::Reopen { id } => {
            let task = db.set_task_completed(ctx.user, TaskId(id), false)?;
            println!("Task {} reopened", task.id);
        }
        TaskAction::Delete { id } => {
            db.delete_task(ctx.user, TaskId(id))?;
            println!("Task {id} deleted");
        }
    }
    Ok(())
}
