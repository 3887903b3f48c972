//! Backlog ordering.
//!
//! Tasks with the nearest deadline go first, tasks without one go last.
//! Effort breaks ties, then age (oldest first), then id.
//!
//! The effort tie-break has two variants. `Lexical` compares the stored text
//! descending, which yields medium, low, high. `Ranked` compares
//! high > medium > low. `Lexical` stays the default so existing schedules do
//! not reshuffle.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::task::Task;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BacklogOrder {
    #[default]
    Lexical,
    Ranked,
}

impl BacklogOrder {
    pub fn compare(self, a: &Task, b: &Task) -> Ordering {
        let by_deadline = match (a.deadline, b.deadline) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        let by_effort = match self {
            BacklogOrder::Lexical => b.effort.as_str().cmp(a.effort.as_str()),
            BacklogOrder::Ranked => b.effort.rank().cmp(&a.effort.rank()),
        };
        by_deadline
            .then(by_effort)
            .then_with(|| a.created_at.cmp(&b.created_at))
            .then_with(|| a.id.cmp(&b.id))
    }

    pub fn sort(self, tasks: &mut [Task]) {
        tasks.sort_by(|a, b| self.compare(a, b));
    }

    /// Equivalent `ORDER BY` clause for the `tasks` table.
    pub(crate) fn sql_order_by(self) -> &'static str {
        match self {
            BacklogOrder::Lexical => {
                "ORDER BY deadline IS NULL, deadline ASC, effort_level DESC, created_at ASC, id ASC"
            }
            BacklogOrder::Ranked => {
                "ORDER BY deadline IS NULL, deadline ASC,
                 CASE effort_level
                     WHEN 'high' THEN 2 WHEN 'medium' THEN 1 WHEN 'low' THEN 0 ELSE -1
                 END DESC,
                 created_at ASC, id ASC"
            }
        }
    }
}
