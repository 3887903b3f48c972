//! Read-only schedule overview: windows with their tasks plus the backlog.

use serde::{Deserialize, Serialize};

use crate::energy::EnergyWindow;
use crate::scheduler::capacity::{available_capacity, duration, used_minutes};
use crate::scheduler::EMPTY_BACKLOG_MESSAGE;
use crate::task::Task;

pub const DEFINE_WINDOWS_MESSAGE: &str =
    "Define your energy windows to get started with scheduling.";
pub const WAITING_MESSAGE: &str =
    "These tasks are waiting to be scheduled. Run `schedule run` to assign them.";

/// How a status message should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Info,
    Success,
    Warning,
}

/// One window and the open tasks it holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowSlot {
    pub window: EnergyWindow,
    pub tasks: Vec<Task>,
    pub total_minutes: u32,
    pub used_minutes: u32,
    pub available_minutes: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleView {
    pub slots: Vec<WindowSlot>,
    pub unassigned: Vec<Task>,
    pub message: String,
    pub kind: MessageKind,
}

impl ScheduleView {
    /// Group `tasks` under `windows`. Completed tasks are left out.
    ///
    /// Tasks pointing at a window that is not in `windows` count as
    /// unassigned.
    pub fn build(mut windows: Vec<EnergyWindow>, tasks: &[Task]) -> Self {
        windows.sort_by_key(EnergyWindow::sort_key);

        let open: Vec<&Task> = tasks.iter().filter(|t| !t.is_completed).collect();

        let slots: Vec<WindowSlot> = windows
            .into_iter()
            .map(|window| {
                let held: Vec<Task> = open
                    .iter()
                    .filter(|t| t.occupies(window.id))
                    .map(|t| (*t).clone())
                    .collect();
                WindowSlot {
                    total_minutes: duration(&window),
                    used_minutes: used_minutes(&held),
                    available_minutes: available_capacity(&window, &held),
                    tasks: held,
                    window,
                }
            })
            .collect();

        let unassigned: Vec<Task> = open
            .iter()
            .filter(|t| match t.assigned_window {
                None => true,
                Some(id) => !slots.iter().any(|s| s.window.id == id),
            })
            .map(|t| (*t).clone())
            .collect();

        let assigned: usize = slots.iter().map(|s| s.tasks.len()).sum();
        let (message, kind) = status(slots.is_empty(), assigned, unassigned.len());

        Self {
            slots,
            unassigned,
            message,
            kind,
        }
    }

    pub fn assigned_count(&self) -> usize {
        self.slots.iter().map(|s| s.tasks.len()).sum()
    }
}

fn status(no_windows: bool, assigned: usize, unassigned: usize) -> (String, MessageKind) {
    if no_windows {
        return (DEFINE_WINDOWS_MESSAGE.to_string(), MessageKind::Info);
    }
    match (assigned, unassigned) {
        (0, 0) => (EMPTY_BACKLOG_MESSAGE.to_string(), MessageKind::Success),
        (0, _) => (WAITING_MESSAGE.to_string(), MessageKind::Info),
        (a, 0) => (
            format!("All set! {a} task(s) are scheduled to match your energy."),
            MessageKind::Success,
        ),
        (a, u) => (
            format!("{a} task(s) scheduled. {u} task(s) still need a window."),
            MessageKind::Warning,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::energy::{EnergyLevel, WindowId};
    use crate::task::{EffortLevel, TaskId};
    use chrono::{NaiveTime, Weekday};

    fn window(id: i64, day: Weekday) -> EnergyWindow {
        EnergyWindow::new(
            WindowId(id),
            1,
            day,
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            EnergyLevel::High,
        )
    }

    fn task(id: i64) -> Task {
        Task::new(TaskId(id), 1, format!("Task {id}"), EffortLevel::High).with_duration(30)
    }

    #[test]
    fn no_windows() {
        let view = ScheduleView::build(vec![], &[task(1)]);
        assert_eq!(view.kind, MessageKind::Info);
        assert_eq!(view.message, DEFINE_WINDOWS_MESSAGE);
        assert_eq!(view.unassigned.len(), 1);
    }

    #[test]
    fn nothing_at_all() {
        let view = ScheduleView::build(vec![window(1, Weekday::Mon)], &[]);
        assert_eq!(view.kind, MessageKind::Success);
        assert_eq!(view.message, "Your schedule is clear. Add tasks when you're ready.");
    }

    #[test]
    fn only_waiting() {
        let view = ScheduleView::build(vec![window(1, Weekday::Mon)], &[task(1)]);
        assert_eq!(view.kind, MessageKind::Info);
        assert_eq!(view.message, WAITING_MESSAGE);
    }

    #[test]
    fn all_scheduled() {
        let tasks = [task(1).assigned_to(WindowId(1)), task(2).assigned_to(WindowId(1))];
        let view = ScheduleView::build(vec![window(1, Weekday::Mon)], &tasks);
        assert_eq!(view.kind, MessageKind::Success);
        assert_eq!(view.message, "All set! 2 task(s) are scheduled to match your energy.");
        assert_eq!(view.slots[0].used_minutes, 60);
        assert_eq!(view.slots[0].available_minutes, 60);
    }

    #[test]
    fn mixed() {
        let tasks = [task(1).assigned_to(WindowId(1)), task(2), task(3).completed()];
        let view = ScheduleView::build(vec![window(1, Weekday::Mon)], &tasks);
        assert_eq!(view.kind, MessageKind::Warning);
        assert_eq!(view.message, "1 task(s) scheduled. 1 task(s) still need a window.");
        assert_eq!(view.assigned_count(), 1);
    }

    #[test]
    fn slots_follow_week_order() {
        let view = ScheduleView::build(vec![window(2, Weekday::Sun), window(1, Weekday::Tue)], &[]);
        let ids: Vec<_> = view.slots.iter().map(|s| s.window.id).collect();
        assert_eq!(ids, vec![WindowId(1), WindowId(2)]);
    }
}
