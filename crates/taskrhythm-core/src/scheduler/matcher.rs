//! Effort-to-energy matching.
//!
//! Picks one window for one task: first fit, walking energy levels in the
//! task's preference order and windows in their given order.

use chrono::NaiveDate;
use tracing::debug;

use crate::energy::{EnergyLevel, EnergyWindow, WindowId};
use crate::error::DatabaseError;
use crate::task::{EffortLevel, Task};

use super::capacity;

/// Duration assumed for tasks without an estimate.
pub const DEFAULT_TASK_MINUTES: u32 = 60;

const HIGH_EFFORT: [EnergyLevel; 2] = [EnergyLevel::High, EnergyLevel::Medium];
const MEDIUM_EFFORT: [EnergyLevel; 3] = [EnergyLevel::Medium, EnergyLevel::High, EnergyLevel::Low];
const LOW_EFFORT: [EnergyLevel; 3] = [EnergyLevel::Low, EnergyLevel::Medium, EnergyLevel::High];

/// Acceptable energy levels for an effort, most preferred first.
///
/// High effort never falls back to low energy. Unknown efforts get the
/// medium ordering.
pub fn energy_priority(effort: &EffortLevel) -> &'static [EnergyLevel] {
    match effort {
        EffortLevel::High => &HIGH_EFFORT,
        EffortLevel::Medium => &MEDIUM_EFFORT,
        EffortLevel::Low => &LOW_EFFORT,
        EffortLevel::Unrecognized(_) => &MEDIUM_EFFORT,
    }
}

/// Live view of which non-completed tasks occupy a window.
///
/// Queried again for every candidate window so that assignments made
/// earlier in a pass are visible to later tasks.
pub trait CapacitySource {
    fn assigned_tasks(&self, window: WindowId) -> Result<Vec<Task>, DatabaseError>;
}

#[derive(Debug, Clone, Copy)]
pub struct EffortEnergyMatcher {
    default_task_minutes: u32,
}

impl Default for EffortEnergyMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_TASK_MINUTES)
    }
}

impl EffortEnergyMatcher {
    pub fn new(default_task_minutes: u32) -> Self {
        Self {
            default_task_minutes,
        }
    }

    /// Find the first window with enough room for `task`, or `None`.
    ///
    /// A deadline before `current_date` disqualifies every window. Any other
    /// deadline leaves the candidates untouched.
    ///
    /// # Errors
    /// Only a failing capacity lookup, never the matching itself.
    pub fn find_best_window<'w, C>(
        &self,
        task: &Task,
        windows: &'w [EnergyWindow],
        assigned: &C,
        current_date: NaiveDate,
    ) -> Result<Option<&'w EnergyWindow>, DatabaseError>
    where
        C: CapacitySource + ?Sized,
    {
        if let Some(deadline) = task.deadline {
            let days_until_deadline = (deadline - current_date).num_days();
            if days_until_deadline < 0 {
                debug!(task = %task.id, %deadline, "deadline passed, no candidate windows");
                return Ok(None);
            }
        }

        let needed = task.effective_duration(self.default_task_minutes);

        for &level in energy_priority(&task.effort) {
            for window in windows.iter().filter(|w| w.energy_level == level) {
                let occupied = assigned.assigned_tasks(window.id)?;
                let free = capacity::available_capacity(window, &occupied);
                if free >= needed {
                    debug!(
                        task = %task.id,
                        window = %window.id,
                        energy = %level,
                        free,
                        needed,
                        "window fits"
                    );
                    return Ok(Some(window));
                }
            }
        }

        debug!(task = %task.id, needed, effort = %task.effort, "no window fits");
        Ok(None)
    }
}
