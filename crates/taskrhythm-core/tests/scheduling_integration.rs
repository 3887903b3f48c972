//! End-to-end scheduling passes against the SQLite store.

use chrono::{Duration, NaiveDate, NaiveTime, Weekday};
use taskrhythm_core::scheduler::NO_WINDOWS_MESSAGE;
use taskrhythm_core::{
    EffortLevel, EnergyLevel, NewTask, NewWindow, ScheduleDb, SchedulerConfig, TaskId,
};

fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
}

fn assigned_window(db: &ScheduleDb, user: i64, id: TaskId) -> Option<i64> {
    db.get_task(user, id)
        .unwrap()
        .unwrap()
        .assigned_window
        .map(|w| w.0)
}

#[test]
fn scenario_a_single_task_fits_single_window() {
    let mut db = ScheduleDb::open_memory().unwrap();
    let w = db
        .create_window(1, &NewWindow::new(Weekday::Mon, hm(9, 0), hm(11, 0), EnergyLevel::High))
        .unwrap();
    let t = db
        .create_task(1, &NewTask::new("Write report", EffortLevel::High).with_duration(90))
        .unwrap();

    let outcome = db
        .run_scheduling_pass(1, today(), &SchedulerConfig::default())
        .unwrap();

    assert_eq!(outcome.assigned_count, 1);
    assert_eq!(outcome.unassigned_count, 0);
    assert_eq!(
        outcome.message,
        "Great! All 1 task(s) are scheduled to match your energy."
    );
    assert_eq!(assigned_window(&db, 1, t.id), Some(w.id.0));
}

#[test]
fn scenario_b_full_window_leaves_task_unassigned() {
    let mut db = ScheduleDb::open_memory().unwrap();
    db.create_window(1, &NewWindow::new(Weekday::Mon, hm(9, 0), hm(11, 0), EnergyLevel::High))
        .unwrap();
    db.create_task(1, &NewTask::new("Existing", EffortLevel::High).with_duration(90))
        .unwrap();
    db.run_scheduling_pass(1, today(), &SchedulerConfig::default())
        .unwrap();

    let fresh = db
        .create_task(1, &NewTask::new("New", EffortLevel::High).with_duration(60))
        .unwrap();
    let outcome = db
        .run_scheduling_pass(1, today(), &SchedulerConfig::default())
        .unwrap();

    assert_eq!(outcome.assigned_count, 0);
    assert_eq!(outcome.unassigned_count, 1);
    assert_eq!(outcome.unassigned_tasks[0].id, fresh.id);
    assert!(assigned_window(&db, 1, fresh.id).is_none());
}

#[test]
fn scenario_c_no_windows() {
    let mut db = ScheduleDb::open_memory().unwrap();
    for title in ["One", "Two", "Three"] {
        db.create_task(1, &NewTask::new(title, EffortLevel::Medium))
            .unwrap();
    }

    let outcome = db
        .run_scheduling_pass(1, today(), &SchedulerConfig::default())
        .unwrap();

    assert_eq!(outcome.assigned_count, 0);
    assert_eq!(outcome.unassigned_count, 3);
    assert_eq!(outcome.message, NO_WINDOWS_MESSAGE);
}

#[test]
fn scenario_d_low_effort_falls_back_to_medium() {
    let mut db = ScheduleDb::open_memory().unwrap();
    db.create_window(1, &NewWindow::new(Weekday::Mon, hm(9, 0), hm(9, 30), EnergyLevel::Low))
        .unwrap();
    let medium = db
        .create_window(1, &NewWindow::new(Weekday::Tue, hm(9, 0), hm(10, 30), EnergyLevel::Medium))
        .unwrap();
    let t = db
        .create_task(1, &NewTask::new("Inbox", EffortLevel::Low))
        .unwrap();

    let outcome = db
        .run_scheduling_pass(1, today(), &SchedulerConfig::default())
        .unwrap();

    assert_eq!(outcome.assigned_count, 1);
    assert_eq!(assigned_window(&db, 1, t.id), Some(medium.id.0));
}

#[test]
fn second_pass_changes_nothing() {
    let mut db = ScheduleDb::open_memory().unwrap();
    db.create_window(1, &NewWindow::new(Weekday::Mon, hm(9, 0), hm(10, 0), EnergyLevel::High))
        .unwrap();
    db.create_task(1, &NewTask::new("Fits", EffortLevel::High).with_duration(60))
        .unwrap();
    db.create_task(1, &NewTask::new("Too big", EffortLevel::High).with_duration(120))
        .unwrap();

    let first = db
        .run_scheduling_pass(1, today(), &SchedulerConfig::default())
        .unwrap();
    let before = db.list_tasks(1).unwrap();
    let second = db
        .run_scheduling_pass(1, today(), &SchedulerConfig::default())
        .unwrap();

    assert_eq!(first.assigned_count, 1);
    assert_eq!(second.assigned_count, 0);
    assert_eq!(second.unassigned_count, 1);
    assert_eq!(db.list_tasks(1).unwrap(), before);
}

#[test]
fn passed_deadline_stays_in_backlog() {
    let mut db = ScheduleDb::open_memory().unwrap();
    db.create_window(1, &NewWindow::new(Weekday::Mon, hm(9, 0), hm(17, 0), EnergyLevel::High))
        .unwrap();
    let late = db
        .create_task(
            1,
            &NewTask::new("Late", EffortLevel::High).with_deadline(today() - Duration::days(1)),
        )
        .unwrap();
    let due_today = db
        .create_task(1, &NewTask::new("Due today", EffortLevel::High).with_deadline(today()))
        .unwrap();

    let outcome = db
        .run_scheduling_pass(1, today(), &SchedulerConfig::default())
        .unwrap();

    assert_eq!(outcome.assigned_count, 1);
    assert_eq!(outcome.unassigned_tasks[0].id, late.id);
    assert!(assigned_window(&db, 1, due_today.id).is_some());
}

#[test]
fn passes_only_touch_the_invoking_user() {
    let mut db = ScheduleDb::open_memory().unwrap();
    db.create_window(1, &NewWindow::new(Weekday::Mon, hm(9, 0), hm(12, 0), EnergyLevel::High))
        .unwrap();
    let other_window = db
        .create_window(2, &NewWindow::new(Weekday::Mon, hm(9, 0), hm(12, 0), EnergyLevel::High))
        .unwrap();
    let theirs = db
        .create_task(2, &NewTask::new("Theirs", EffortLevel::High).with_duration(30))
        .unwrap();
    db.create_task(1, &NewTask::new("Mine", EffortLevel::High).with_duration(30))
        .unwrap();

    db.run_scheduling_pass(1, today(), &SchedulerConfig::default())
        .unwrap();
    assert!(assigned_window(&db, 2, theirs.id).is_none());

    db.run_scheduling_pass(2, today(), &SchedulerConfig::default())
        .unwrap();
    assert_eq!(assigned_window(&db, 2, theirs.id), Some(other_window.id.0));

    let cleared = db.clear_schedule(1).unwrap();
    assert_eq!(cleared, 1);
    assert_eq!(assigned_window(&db, 2, theirs.id), Some(other_window.id.0));
}

#[test]
fn clear_then_rerun_reassigns_everything() {
    let mut db = ScheduleDb::open_memory().unwrap();
    db.create_window(1, &NewWindow::new(Weekday::Wed, hm(13, 0), hm(15, 0), EnergyLevel::Medium))
        .unwrap();
    for title in ["A", "B"] {
        db.create_task(1, &NewTask::new(title, EffortLevel::Medium).with_duration(45))
            .unwrap();
    }
    db.run_scheduling_pass(1, today(), &SchedulerConfig::default())
        .unwrap();

    assert_eq!(db.clear_schedule(1).unwrap(), 2);
    assert_eq!(db.clear_schedule(1).unwrap(), 0);
    assert!(db.list_tasks(1).unwrap().iter().all(|t| t.assigned_window.is_none()));

    let outcome = db
        .run_scheduling_pass(1, today(), &SchedulerConfig::default())
        .unwrap();
    assert_eq!(outcome.assigned_count, 2);
}

#[test]
fn schedule_view_reflects_the_pass() {
    let mut db = ScheduleDb::open_memory().unwrap();
    db.create_window(1, &NewWindow::new(Weekday::Mon, hm(9, 0), hm(10, 0), EnergyLevel::High))
        .unwrap();
    db.create_task(1, &NewTask::new("Fits", EffortLevel::High).with_duration(40))
        .unwrap();
    db.create_task(1, &NewTask::new("Too big", EffortLevel::High).with_duration(40))
        .unwrap();
    db.run_scheduling_pass(1, today(), &SchedulerConfig::default())
        .unwrap();

    let view = db.schedule_view(1).unwrap();
    assert_eq!(view.slots.len(), 1);
    assert_eq!(view.slots[0].used_minutes, 40);
    assert_eq!(view.slots[0].available_minutes, 20);
    assert_eq!(view.unassigned.len(), 1);
    assert_eq!(
        view.message,
        "1 task(s) scheduled. 1 task(s) still need a window."
    );
}

#[test]
fn database_file_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("taskrhythm.db");

    {
        let mut db = ScheduleDb::open_at(&path).unwrap();
        db.create_window(1, &NewWindow::new(Weekday::Fri, hm(22, 0), hm(1, 0), EnergyLevel::Low))
            .unwrap();
        db.create_task(1, &NewTask::new("Night owl", EffortLevel::Low).with_duration(180))
            .unwrap();
        let outcome = db
            .run_scheduling_pass(1, today(), &SchedulerConfig::default())
            .unwrap();
        assert_eq!(outcome.assigned_count, 1);
    }

    let db = ScheduleDb::open_at(&path).unwrap();
    let windows = db.list_windows(1).unwrap();
    assert_eq!(windows[0].duration_minutes(), 180);
    assert!(db.list_tasks(1).unwrap()[0].assigned_window.is_some());
}
