//! Energy-aware batch scheduler.
//!
//! One pass walks a user's backlog in order and assigns each task to the
//! first energy window that fits it:
//! - capacity is recomputed from live data for every candidate window
//! - assignments made earlier in the pass count against later tasks
//! - everything is written with a single store call at the end
//!
//! The engine runs inside whatever transaction the caller opened on the
//! store. Passes for the same user must not run concurrently; the SQLite
//! adapter serializes writers with immediate transactions, other callers
//! have to provide their own per-user lock.

pub mod backlog;
pub mod capacity;
mod clear;
pub mod matcher;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::energy::WindowId;
use crate::error::{ConfigError, DatabaseError, Result};
use crate::storage::ScheduleStore;
use crate::task::{Task, TaskId, UserId};

pub use backlog::BacklogOrder;
pub use clear::{clear_schedule, CLEARED_MESSAGE};
pub use matcher::{energy_priority, CapacitySource, EffortEnergyMatcher, DEFAULT_TASK_MINUTES};

pub const NO_WINDOWS_MESSAGE: &str =
    "To get started, define your energy windows to match your natural rhythm.";
pub const EMPTY_BACKLOG_MESSAGE: &str = "Your schedule is clear. Add tasks when you're ready.";
pub const NOTHING_FITS_MESSAGE: &str = "These tasks are waiting for an energy window that fits. \
     Consider adding more windows or adjusting task durations.";
pub const READY_MESSAGE: &str = "Your schedule is ready.";

/// Scheduler configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Minutes assumed for tasks without an estimate
    #[serde(default = "default_task_minutes")]
    pub default_task_minutes: u32,
    /// Effort tie-break used when ordering the backlog
    #[serde(default)]
    pub backlog_order: BacklogOrder,
}

fn default_task_minutes() -> u32 {
    DEFAULT_TASK_MINUTES
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_task_minutes: DEFAULT_TASK_MINUTES,
            backlog_order: BacklogOrder::default(),
        }
    }
}

impl SchedulerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_task_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "scheduler.default_task_minutes".to_string(),
                message: "must be at least 1 minute".to_string(),
            });
        }
        Ok(())
    }
}

/// A staged task → window link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub task_id: TaskId,
    pub window_id: WindowId,
}

/// Result of one scheduling pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassOutcome {
    pub assigned_count: usize,
    pub unassigned_count: usize,
    pub message: String,
    /// Tasks left without a window, unchanged.
    pub unassigned_tasks: Vec<Task>,
    /// Links written by this pass.
    pub assignments: Vec<Assignment>,
}

impl PassOutcome {
    fn untouched(message: &str, backlog: Vec<Task>) -> Self {
        Self {
            assigned_count: 0,
            unassigned_count: backlog.len(),
            message: message.to_string(),
            unassigned_tasks: backlog,
            assignments: Vec::new(),
        }
    }
}

/// Summary line for a finished pass.
pub fn pass_message(assigned: usize, unassigned: usize) -> String {
    match (assigned, unassigned) {
        (0, u) if u > 0 => NOTHING_FITS_MESSAGE.to_string(),
        (a, u) if a > 0 && u > 0 => {
            format!("Scheduled {a} task(s). Some tasks need more window space or flexibility.")
        }
        (a, 0) if a > 0 => format!("Great! All {a} task(s) are scheduled to match your energy."),
        _ => READY_MESSAGE.to_string(),
    }
}

/// Store reads plus the assignments staged so far in the current pass.
struct StagedView<'a, S: ?Sized> {
    store: &'a S,
    staged: &'a [Task],
}

impl<S: ScheduleStore + ?Sized> CapacitySource for StagedView<'_, S> {
    fn assigned_tasks(&self, window: WindowId) -> Result<Vec<Task>, DatabaseError> {
        let mut tasks = self.store.list_non_completed_tasks_assigned_to(window)?;
        tasks.extend(self.staged.iter().filter(|t| t.occupies(window)).cloned());
        Ok(tasks)
    }
}

/// Runs scheduling passes.
#[derive(Debug, Clone, Default)]
pub struct SchedulingEngine {
    config: SchedulerConfig,
    matcher: EffortEnergyMatcher,
}

impl SchedulingEngine {
    /// Create an engine with default config
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with custom config
    pub fn with_config(config: SchedulerConfig) -> Self {
        let matcher = EffortEnergyMatcher::new(config.default_task_minutes);
        Self { config, matcher }
    }

    /// Assign as much of `user_id`'s backlog as fits.
    ///
    /// `today` is the reference date for deadline checks. Nothing is written
    /// unless at least one task was matched; then all links go out in one
    /// `persist_assignments` call.
    ///
    /// # Errors
    /// Only storage failures. The caller's transaction should be dropped
    /// without committing in that case.
    pub fn run_pass<S>(
        &self,
        store: &mut S,
        user_id: UserId,
        today: NaiveDate,
    ) -> Result<PassOutcome>
    where
        S: ScheduleStore + ?Sized,
    {
        let backlog = store.list_unassigned_incomplete_tasks(user_id, self.config.backlog_order)?;
        let windows = store.list_windows(user_id)?;

        if windows.is_empty() {
            info!(user_id, backlog = backlog.len(), "no energy windows defined");
            return Ok(PassOutcome::untouched(NO_WINDOWS_MESSAGE, backlog));
        }
        if backlog.is_empty() {
            info!(user_id, "backlog empty");
            return Ok(PassOutcome::untouched(EMPTY_BACKLOG_MESSAGE, backlog));
        }

        let mut staged: Vec<Task> = Vec::new();
        let mut unassigned: Vec<Task> = Vec::new();

        for task in backlog {
            let view = StagedView {
                store: &*store,
                staged: &staged,
            };
            let found = self
                .matcher
                .find_best_window(&task, &windows, &view, today)?
                .map(|w| w.id);
            match found {
                Some(window_id) => staged.push(task.assigned_to(window_id)),
                None => unassigned.push(task),
            }
        }

        let assignments: Vec<Assignment> = staged
            .iter()
            .filter_map(|t| {
                t.assigned_window.map(|window_id| Assignment {
                    task_id: t.id,
                    window_id,
                })
            })
            .collect();

        if !assignments.is_empty() {
            store.persist_assignments(&assignments)?;
        }

        let message = pass_message(assignments.len(), unassigned.len());
        info!(
            user_id,
            assigned = assignments.len(),
            unassigned = unassigned.len(),
            "scheduling pass finished"
        );

        Ok(PassOutcome {
            assigned_count: assignments.len(),
            unassigned_count: unassigned.len(),
            message,
            unassigned_tasks: unassigned,
            assignments,
        })
    }
}
