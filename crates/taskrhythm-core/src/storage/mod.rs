mod config;
pub mod database;
mod memory;
pub mod migrations;

pub use config::{Config, StorageConfig, UserConfig};
pub use database::{ScheduleDb, ScheduleTx};
pub use memory::MemoryStore;

use std::path::PathBuf;

use crate::energy::{EnergyWindow, WindowId};
use crate::error::DatabaseError;
use crate::scheduler::{Assignment, BacklogOrder};
use crate::task::{Task, UserId};

/// What the scheduler needs from persistence.
///
/// Implementations are expected to be transaction-scoped: the scheduler
/// writes through them and the caller decides whether the writes stick.
pub trait ScheduleStore {
    /// Non-completed tasks of `user_id` with no window, in `order`.
    fn list_unassigned_incomplete_tasks(
        &self,
        user_id: UserId,
        order: BacklogOrder,
    ) -> Result<Vec<Task>, DatabaseError>;

    /// All windows of `user_id`, Monday first, then by start time.
    fn list_windows(&self, user_id: UserId) -> Result<Vec<EnergyWindow>, DatabaseError>;

    /// Non-completed tasks currently assigned to `window_id`.
    fn list_non_completed_tasks_assigned_to(
        &self,
        window_id: WindowId,
    ) -> Result<Vec<Task>, DatabaseError>;

    /// Apply every link, or none of them.
    fn persist_assignments(&mut self, assignments: &[Assignment]) -> Result<(), DatabaseError>;

    /// Detach all tasks of `user_id` from their windows. Returns rows changed.
    fn persist_clear_all(&mut self, user_id: UserId) -> Result<usize, DatabaseError>;
}

/// Returns the data directory.
///
/// `TASKRHYTHM_HOME` wins when set. Otherwise `~/.config/taskrhythm[-dev]/`,
/// with `TASKRHYTHM_ENV=dev` selecting the development directory.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, std::io::Error> {
    let dir = match std::env::var_os("TASKRHYTHM_HOME") {
        Some(home) => PathBuf::from(home),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("TASKRHYTHM_ENV").unwrap_or_else(|_| "production".to_string());

            if env == "dev" {
                base_dir.join("taskrhythm-dev")
            } else {
                base_dir.join("taskrhythm")
            }
        }
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
