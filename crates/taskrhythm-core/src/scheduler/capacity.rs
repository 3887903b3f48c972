//! Window capacity accounting.
//!
//! Capacity is derived from the tasks currently assigned to a window and is
//! never stored.

use chrono::{Duration, NaiveDate, NaiveDateTime};

use crate::energy::EnergyWindow;
use crate::task::Task;

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Window length in minutes.
///
/// Both ends are placed on the same reference day; when the end is not after
/// the start the window crosses midnight and a day is added to the end.
pub fn duration(window: &EnergyWindow) -> u32 {
    let day = NaiveDate::MIN;
    let start = NaiveDateTime::new(day, window.time_start);
    let mut end = NaiveDateTime::new(day, window.time_end);
    if end <= start {
        end += Duration::days(1);
    }
    let minutes = (end - start).num_minutes().clamp(1, MINUTES_PER_DAY);
    minutes as u32
}

/// Minutes consumed by `assigned`. Tasks without an estimate count zero.
pub fn used_minutes(assigned: &[Task]) -> u32 {
    assigned
        .iter()
        .filter_map(|t| t.estimated_duration)
        .fold(0u32, u32::saturating_add)
}

/// Free minutes left in `window` given its non-completed assigned tasks.
/// Never negative.
pub fn available_capacity(window: &EnergyWindow, assigned: &[Task]) -> u32 {
    duration(window).saturating_sub(used_minutes(assigned))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::energy::{EnergyLevel, WindowId};
    use crate::task::{EffortLevel, TaskId};
    use chrono::{NaiveTime, Weekday};
    use proptest::prelude::*;

    fn window(start: (u32, u32), end: (u32, u32)) -> EnergyWindow {
        EnergyWindow::new(
            WindowId(1),
            1,
            Weekday::Mon,
            NaiveTime::from_hms_opt(start.0, start.1, 0).unwrap(),
            NaiveTime::from_hms_opt(end.0, end.1, 0).unwrap(),
            EnergyLevel::High,
        )
    }

    fn task(id: i64, minutes: Option<u32>) -> Task {
        let t = Task::new(TaskId(id), 1, format!("Task {id}"), EffortLevel::High)
            .assigned_to(WindowId(1));
        match minutes {
            Some(m) => t.with_duration(m),
            None => t,
        }
    }

    #[test]
    fn same_day_window_duration() {
        assert_eq!(duration(&window((9, 0), (11, 0))), 120);
        assert_eq!(duration(&window((13, 15), (14, 0))), 45);
    }

    #[test]
    fn midnight_wrap_adds_a_day() {
        assert_eq!(duration(&window((22, 0), (6, 0))), 480);
    }

    #[test]
    fn equal_start_and_end_is_a_full_day() {
        assert_eq!(duration(&window((8, 0), (8, 0))), 1440);
    }

    #[test]
    fn unspecified_durations_consume_nothing() {
        let w = window((9, 0), (11, 0));
        let assigned = vec![task(1, Some(30)), task(2, None)];
        assert_eq!(used_minutes(&assigned), 30);
        assert_eq!(available_capacity(&w, &assigned), 90);
    }

    #[test]
    fn overbooked_window_clamps_to_zero() {
        let w = window((9, 0), (10, 0));
        let assigned = vec![task(1, Some(45)), task(2, Some(45))];
        assert_eq!(available_capacity(&w, &assigned), 0);
    }

    proptest! {
        #[test]
        fn duration_is_always_positive_and_at_most_a_day(
            sh in 0u32..24, sm in 0u32..60, eh in 0u32..24, em in 0u32..60,
        ) {
            let d = duration(&window((sh, sm), (eh, em)));
            prop_assert!(d >= 1);
            prop_assert!(d <= 1440);
        }

        #[test]
        fn capacity_stays_between_zero_and_duration(
            sh in 0u32..24, eh in 0u32..24,
            minutes in proptest::collection::vec(proptest::option::of(1u32..600), 0..8),
        ) {
            let w = window((sh, 0), (eh, 0));
            let assigned: Vec<Task> = minutes
                .iter()
                .enumerate()
                .map(|(i, m)| task(i as i64, *m))
                .collect();
            let free = available_capacity(&w, &assigned);
            prop_assert!(free <= duration(&w));
        }
    }
}
