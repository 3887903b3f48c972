//! In-memory schedule store.
//!
//! Used by tests and by callers that keep their own persistence. Ordering
//! matches the SQLite adapter.

use std::collections::BTreeMap;

use chrono::{SubsecRound, Utc};

use super::ScheduleStore;
use crate::energy::{EnergyWindow, NewWindow, WindowId};
use crate::error::DatabaseError;
use crate::scheduler::{Assignment, BacklogOrder};
use crate::task::{NewTask, Task, TaskId, UserId};

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tasks: BTreeMap<TaskId, Task>,
    windows: BTreeMap<WindowId, EnergyWindow>,
    next_task: i64,
    next_window: i64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a task for `user_id` with the next free id.
    pub fn insert_task(&mut self, user_id: UserId, new: NewTask) -> Task {
        self.next_task += 1;
        let task = Task {
            id: TaskId(self.next_task),
            user_id,
            title: new.title,
            description: new.description,
            effort: new.effort,
            estimated_duration: new.estimated_duration,
            deadline: new.deadline,
            is_completed: false,
            assigned_window: None,
            created_at: Utc::now().trunc_subsecs(6),
        };
        self.tasks.insert(task.id, task.clone());
        task
    }

    /// Create a window for `user_id` with the next free id.
    pub fn insert_window(&mut self, user_id: UserId, new: NewWindow) -> EnergyWindow {
        self.next_window += 1;
        let window = EnergyWindow {
            id: WindowId(self.next_window),
            user_id,
            day_of_week: new.day_of_week,
            time_start: new.time_start,
            time_end: new.time_end,
            energy_level: new.energy_level,
            created_at: Utc::now().trunc_subsecs(6),
        };
        self.windows.insert(window.id, window.clone());
        window
    }

    /// Link a task to a window directly. Returns false if the task is unknown.
    pub fn assign(&mut self, task_id: TaskId, window_id: WindowId) -> bool {
        match self.tasks.get_mut(&task_id) {
            Some(task) => {
                task.assigned_window = Some(window_id);
                true
            }
            None => false,
        }
    }

    /// Returns false if the task is unknown.
    pub fn set_completed(&mut self, task_id: TaskId, completed: bool) -> bool {
        match self.tasks.get_mut(&task_id) {
            Some(task) => {
                task.is_completed = completed;
                true
            }
            None => false,
        }
    }

    pub fn task(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.get(&task_id)
    }

    /// All tasks of `user_id` in id order.
    pub fn tasks_for(&self, user_id: UserId) -> Vec<Task> {
        self.tasks
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect()
    }

    /// All windows of `user_id` in week order.
    pub fn windows_for(&self, user_id: UserId) -> Vec<EnergyWindow> {
        let mut windows: Vec<EnergyWindow> = self
            .windows
            .values()
            .filter(|w| w.user_id == user_id)
            .cloned()
            .collect();
        windows.sort_by_key(EnergyWindow::sort_key);
        windows
    }

    fn check(&self, a: &Assignment) -> Result<(), DatabaseError> {
        let task = self.tasks.get(&a.task_id).ok_or(DatabaseError::NotFound {
            entity: "task",
            id: a.task_id.0,
        })?;
        let window = self.windows.get(&a.window_id).ok_or(DatabaseError::NotFound {
            entity: "window",
            id: a.window_id.0,
        })?;
        if task.user_id != window.user_id {
            return Err(DatabaseError::OwnershipViolation {
                task: a.task_id,
                window: a.window_id,
            });
        }
        Ok(())
    }
}

impl ScheduleStore for MemoryStore {
    fn list_unassigned_incomplete_tasks(
        &self,
        user_id: UserId,
        order: BacklogOrder,
    ) -> Result<Vec<Task>, DatabaseError> {
        let mut backlog: Vec<Task> = self
            .tasks
            .values()
            .filter(|t| t.user_id == user_id && t.is_backlog())
            .cloned()
            .collect();
        order.sort(&mut backlog);
        Ok(backlog)
    }

    fn list_windows(&self, user_id: UserId) -> Result<Vec<EnergyWindow>, DatabaseError> {
        Ok(self.windows_for(user_id))
    }

    fn list_non_completed_tasks_assigned_to(
        &self,
        window_id: WindowId,
    ) -> Result<Vec<Task>, DatabaseError> {
        Ok(self
            .tasks
            .values()
            .filter(|t| t.occupies(window_id))
            .cloned()
            .collect())
    }

    fn persist_assignments(&mut self, assignments: &[Assignment]) -> Result<(), DatabaseError> {
        for a in assignments {
            self.check(a)?;
        }
        for a in assignments {
            self.assign(a.task_id, a.window_id);
        }
        Ok(())
    }

    fn persist_clear_all(&mut self, user_id: UserId) -> Result<usize, DatabaseError> {
        let mut cleared = 0;
        for task in self.tasks.values_mut().filter(|t| t.user_id == user_id) {
            if task.assigned_window.take().is_some() {
                cleared += 1;
            }
        }
        Ok(cleared)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::energy::EnergyLevel;
    use crate::task::EffortLevel;
    use chrono::{NaiveTime, Weekday};

    fn window(day: Weekday, start: u32) -> NewWindow {
        NewWindow::new(
            day,
            NaiveTime::from_hms_opt(start, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(start + 1, 0, 0).unwrap(),
            EnergyLevel::Medium,
        )
    }

    #[test]
    fn windows_are_listed_per_user_in_week_order() {
        let mut store = MemoryStore::new();
        store.insert_window(1, window(Weekday::Fri, 9));
        store.insert_window(2, window(Weekday::Mon, 9));
        store.insert_window(1, window(Weekday::Mon, 14));
        store.insert_window(1, window(Weekday::Mon, 8));

        let days: Vec<_> = store
            .list_windows(1)
            .unwrap()
            .iter()
            .map(|w| (w.day_of_week, w.time_start))
            .collect();
        assert_eq!(days.len(), 3);
        assert_eq!(days[0].0, Weekday::Mon);
        assert!(days[0].1 < days[1].1);
        assert_eq!(days[2].0, Weekday::Fri);
    }

    #[test]
    fn a_bad_assignment_applies_nothing() {
        let mut store = MemoryStore::new();
        let mine = store.insert_window(1, window(Weekday::Mon, 9));
        let theirs = store.insert_window(2, window(Weekday::Mon, 9));
        let a = store.insert_task(1, NewTask::new("A", EffortLevel::Low));
        let b = store.insert_task(1, NewTask::new("B", EffortLevel::Low));

        let err = store
            .persist_assignments(&[
                Assignment {
                    task_id: a.id,
                    window_id: mine.id,
                },
                Assignment {
                    task_id: b.id,
                    window_id: theirs.id,
                },
            ])
            .unwrap_err();

        assert!(matches!(err, DatabaseError::OwnershipViolation { .. }));
        assert!(store.task(a.id).unwrap().assigned_window.is_none());
    }

    #[test]
    fn unknown_window_is_not_found() {
        let mut store = MemoryStore::new();
        let a = store.insert_task(1, NewTask::new("A", EffortLevel::Low));
        let err = store
            .persist_assignments(&[Assignment {
                task_id: a.id,
                window_id: WindowId(99),
            }])
            .unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound { entity: "window", id: 99 }));
    }

    #[test]
    fn completed_tasks_do_not_occupy() {
        let mut store = MemoryStore::new();
        let w = store.insert_window(1, window(Weekday::Mon, 9));
        let t = store.insert_task(1, NewTask::new("A", EffortLevel::Low));
        store.assign(t.id, w.id);
        assert_eq!(store.list_non_completed_tasks_assigned_to(w.id).unwrap().len(), 1);
        store.set_completed(t.id, true);
        assert!(store.list_non_completed_tasks_assigned_to(w.id).unwrap().is_empty());
    }
}
