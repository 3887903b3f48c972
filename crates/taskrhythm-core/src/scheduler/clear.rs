//! Bulk unassignment.

use tracing::info;

use crate::error::Result;
use crate::storage::ScheduleStore;
use crate::task::UserId;

pub const CLEARED_MESSAGE: &str = "Schedule cleared. Tasks are ready to be rescheduled.";

/// Detach every task of `user_id` from its window, completed tasks included.
///
/// One bulk write; running it again changes nothing. Returns how many tasks
/// were detached.
pub fn clear_schedule<S>(store: &mut S, user_id: UserId) -> Result<usize>
where
    S: ScheduleStore + ?Sized,
{
    let cleared = store.persist_clear_all(user_id)?;
    info!(user_id, cleared, "schedule cleared");
    Ok(cleared)
}
