//! SQLite-based storage for tasks and energy windows.
//!
//! `ScheduleDb` owns the connection and offers plain CRUD. Scheduling work
//! goes through `ScheduleTx`, an immediate transaction that implements
//! [`ScheduleStore`]; dropping it without `commit()` rolls everything back.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, SubsecRound, Utc, Weekday};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use tracing::{debug, warn};

use super::{migrations, ScheduleStore};
use crate::energy::{EnergyLevel, EnergyWindow, NewWindow, WindowId, WindowUpdate};
use crate::error::{DatabaseError, Result};
use crate::scheduler::{
    self, Assignment, BacklogOrder, PassOutcome, SchedulerConfig, SchedulingEngine,
};
use crate::task::{EffortLevel, NewTask, Task, TaskId, TaskUpdate, UserId};
use crate::view::ScheduleView;

const TASK_COLUMNS: &str = "id, user_id, title, description, effort_level, estimated_duration, \
     deadline, is_completed, assigned_window_id, created_at";

const WINDOW_COLUMNS: &str =
    "id, user_id, day_of_week, time_start, time_end, energy_level, created_at";

/// How long a connection waits for another writer before giving up with `Locked`.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

// === Helper Functions ===

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

/// A stored value that no longer decodes. Surfaces as `DatabaseError::Corrupt`.
fn corrupt(idx: usize, field: &'static str, value: impl ToString) -> rusqlite::Error {
    conversion_error(
        idx,
        DatabaseError::Corrupt {
            field,
            value: value.to_string(),
        },
    )
}

/// Format a timestamp for storage (sortable as text).
fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(
    idx: usize,
    field: &'static str,
    raw: &str,
) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| corrupt(idx, field, raw))
}

fn format_time(t: &NaiveTime) -> String {
    t.format("%H:%M:%S").to_string()
}

fn parse_time(idx: usize, field: &'static str, raw: &str) -> rusqlite::Result<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M:%S").map_err(|_| corrupt(idx, field, raw))
}

fn format_date(d: &NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

fn parse_date(idx: usize, field: &'static str, raw: &str) -> rusqlite::Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| corrupt(idx, field, raw))
}

fn day_index(day: Weekday) -> i64 {
    day.num_days_from_monday() as i64
}

fn parse_day(idx: usize, raw: i64) -> rusqlite::Result<Weekday> {
    usize::try_from(raw)
        .ok()
        .and_then(|i| WEEK.get(i).copied())
        .ok_or_else(|| corrupt(idx, "day_of_week", raw))
}

fn parse_energy_level(idx: usize, raw: &str) -> rusqlite::Result<EnergyLevel> {
    match raw {
        "high" => Ok(EnergyLevel::High),
        "medium" => Ok(EnergyLevel::Medium),
        "low" => Ok(EnergyLevel::Low),
        other => Err(corrupt(idx, "energy_level", other)),
    }
}

fn parse_duration(idx: usize, raw: Option<i64>) -> rusqlite::Result<Option<u32>> {
    raw.map(|m| u32::try_from(m).map_err(|_| corrupt(idx, "estimated_duration", m)))
        .transpose()
}

/// Build a Task from a row selected with `TASK_COLUMNS`.
fn row_to_task(row: &Row) -> rusqlite::Result<Task> {
    let deadline: Option<String> = row.get(6)?;
    let created_at: String = row.get(9)?;

    Ok(Task {
        id: TaskId(row.get(0)?),
        user_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        effort: EffortLevel::from(row.get::<_, String>(4)?),
        estimated_duration: parse_duration(5, row.get(5)?)?,
        deadline: deadline
            .as_deref()
            .map(|d| parse_date(6, "deadline", d))
            .transpose()?,
        is_completed: row.get(7)?,
        assigned_window: row.get::<_, Option<i64>>(8)?.map(WindowId),
        created_at: parse_timestamp(9, "created_at", &created_at)?,
    })
}

/// Build an EnergyWindow from a row selected with `WINDOW_COLUMNS`.
fn row_to_window(row: &Row) -> rusqlite::Result<EnergyWindow> {
    let time_start: String = row.get(3)?;
    let time_end: String = row.get(4)?;
    let energy_level: String = row.get(5)?;
    let created_at: String = row.get(6)?;

    Ok(EnergyWindow {
        id: WindowId(row.get(0)?),
        user_id: row.get(1)?,
        day_of_week: parse_day(2, row.get(2)?)?,
        time_start: parse_time(3, "time_start", &time_start)?,
        time_end: parse_time(4, "time_end", &time_end)?,
        energy_level: parse_energy_level(5, &energy_level)?,
        created_at: parse_timestamp(6, "created_at", &created_at)?,
    })
}

// === Queries shared by ScheduleDb and ScheduleTx ===

fn query_tasks(
    conn: &Connection,
    sql: &str,
    user_or_window: i64,
) -> Result<Vec<Task>, DatabaseError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([user_or_window], row_to_task)?;
    let tasks = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(tasks)
}

fn select_backlog(
    conn: &Connection,
    user_id: UserId,
    order: BacklogOrder,
) -> Result<Vec<Task>, DatabaseError> {
    let sql = format!(
        "SELECT {TASK_COLUMNS} FROM tasks
         WHERE user_id = ?1 AND is_completed = 0 AND assigned_window_id IS NULL
         {}",
        order.sql_order_by()
    );
    query_tasks(conn, &sql, user_id)
}

fn select_assigned(conn: &Connection, window_id: WindowId) -> Result<Vec<Task>, DatabaseError> {
    let sql = format!(
        "SELECT {TASK_COLUMNS} FROM tasks
         WHERE assigned_window_id = ?1 AND is_completed = 0
         ORDER BY id"
    );
    query_tasks(conn, &sql, window_id.0)
}

fn select_windows(conn: &Connection, user_id: UserId) -> Result<Vec<EnergyWindow>, DatabaseError> {
    let sql = format!(
        "SELECT {WINDOW_COLUMNS} FROM energy_windows
         WHERE user_id = ?1
         ORDER BY day_of_week, time_start, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([user_id], row_to_window)?;
    let windows = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(windows)
}

fn write_assignments(conn: &Connection, assignments: &[Assignment]) -> Result<(), DatabaseError> {
    let mut task_owner = conn.prepare("SELECT user_id FROM tasks WHERE id = ?1")?;
    let mut window_owner = conn.prepare("SELECT user_id FROM energy_windows WHERE id = ?1")?;
    let mut update = conn.prepare("UPDATE tasks SET assigned_window_id = ?2 WHERE id = ?1")?;

    for a in assignments {
        let task_user: UserId = task_owner
            .query_row([a.task_id.0], |r| r.get(0))
            .optional()?
            .ok_or(DatabaseError::NotFound {
                entity: "task",
                id: a.task_id.0,
            })?;
        let window_user: UserId = window_owner
            .query_row([a.window_id.0], |r| r.get(0))
            .optional()?
            .ok_or(DatabaseError::NotFound {
                entity: "window",
                id: a.window_id.0,
            })?;
        if task_user != window_user {
            return Err(DatabaseError::OwnershipViolation {
                task: a.task_id,
                window: a.window_id,
            });
        }
        update.execute(params![a.task_id.0, a.window_id.0])?;
    }
    debug!(count = assignments.len(), "assignments written");
    Ok(())
}

fn write_clear_all(conn: &Connection, user_id: UserId) -> Result<usize, DatabaseError> {
    let changed = conn.execute(
        "UPDATE tasks SET assigned_window_id = NULL
         WHERE user_id = ?1 AND assigned_window_id IS NOT NULL",
        [user_id],
    )?;
    Ok(changed)
}

/// SQLite database for schedule storage.
pub struct ScheduleDb {
    conn: Connection,
}

impl ScheduleDb {
    /// Open (or create) the database file at `path`.
    ///
    /// Creates tables if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(&path)
            .map_err(|source| DatabaseError::OpenFailed { path, source })?;
        Self::init(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, DatabaseError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.busy_timeout(DEFAULT_BUSY_TIMEOUT)?;
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Change how long this connection waits on another writer's lock.
    pub fn set_busy_timeout(&self, timeout: Duration) -> Result<(), DatabaseError> {
        self.conn.busy_timeout(timeout)?;
        Ok(())
    }

    /// Begin an immediate (write-locking) transaction.
    ///
    /// Two scheduling passes on the same file cannot interleave: the second
    /// waits for the first to commit or roll back. If the busy timeout runs
    /// out first it fails with [`DatabaseError::Locked`].
    pub fn transaction(&mut self) -> Result<ScheduleTx<'_>, DatabaseError> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        Ok(ScheduleTx { tx })
    }

    /// Run one scheduling pass for `user_id` in its own transaction.
    ///
    /// # Errors
    /// Any storage failure; nothing from the pass is kept in that case.
    pub fn run_scheduling_pass(
        &mut self,
        user_id: UserId,
        today: NaiveDate,
        config: &SchedulerConfig,
    ) -> Result<PassOutcome> {
        let engine = SchedulingEngine::with_config(config.clone());
        let mut tx = self.transaction()?;
        match engine.run_pass(&mut tx, user_id, today) {
            Ok(outcome) => {
                tx.commit()?;
                Ok(outcome)
            }
            Err(err) => {
                warn!(user_id, error = %err, "scheduling pass rolled back");
                Err(err)
            }
        }
    }

    /// Detach all of `user_id`'s tasks from their windows in one transaction.
    pub fn clear_schedule(&mut self, user_id: UserId) -> Result<usize> {
        let mut tx = self.transaction()?;
        let cleared = scheduler::clear_schedule(&mut tx, user_id)?;
        tx.commit()?;
        Ok(cleared)
    }

    /// Windows with their tasks, for display.
    pub fn schedule_view(&self, user_id: UserId) -> Result<ScheduleView, DatabaseError> {
        let windows = select_windows(&self.conn, user_id)?;
        let tasks = self.list_tasks(user_id)?;
        Ok(ScheduleView::build(windows, &tasks))
    }

    // === Task CRUD ===

    pub fn create_task(&self, user_id: UserId, new: &NewTask) -> Result<Task> {
        new.validate()?;
        let created_at = Utc::now().trunc_subsecs(6);
        self.conn.execute(
            "INSERT INTO tasks (user_id, title, description, effort_level,
                                estimated_duration, deadline, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user_id,
                new.title,
                new.description,
                new.effort.as_str(),
                new.estimated_duration.map(i64::from),
                new.deadline.as_ref().map(format_date),
                format_timestamp(&created_at),
            ],
        )?;
        let id = TaskId(self.conn.last_insert_rowid());
        debug!(user_id, task = %id, "task created");

        Ok(Task {
            id,
            user_id,
            title: new.title.clone(),
            description: new.description.clone(),
            effort: new.effort.clone(),
            estimated_duration: new.estimated_duration,
            deadline: new.deadline,
            is_completed: false,
            assigned_window: None,
            created_at,
        })
    }

    pub fn get_task(&self, user_id: UserId, id: TaskId) -> Result<Option<Task>, DatabaseError> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1 AND user_id = ?2");
        let task = self
            .conn
            .query_row(&sql, params![id.0, user_id], row_to_task)
            .optional()?;
        Ok(task)
    }

    /// All tasks of `user_id`: open tasks before completed ones, then by
    /// deadline (tasks without one first), then newest first.
    pub fn list_tasks(&self, user_id: UserId) -> Result<Vec<Task>, DatabaseError> {
        let sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks
             WHERE user_id = ?1
             ORDER BY is_completed, deadline, created_at DESC, id DESC"
        );
        query_tasks(&self.conn, &sql, user_id)
    }

    /// Change the given fields of a task. The window link is left as it is.
    ///
    /// # Errors
    /// `NotFound` when the task is missing or belongs to another user,
    /// `Validation` when the result would be an invalid task.
    pub fn update_task(&self, user_id: UserId, id: TaskId, update: &TaskUpdate) -> Result<Task> {
        let mut task = self.get_task(user_id, id)?.ok_or(DatabaseError::NotFound {
            entity: "task",
            id: id.0,
        })?;
        update.validate()?;
        if update.is_empty() {
            return Ok(task);
        }
        update.apply(&mut task);
        self.conn.execute(
            "UPDATE tasks
             SET title = ?3, description = ?4, effort_level = ?5,
                 estimated_duration = ?6, deadline = ?7
             WHERE id = ?1 AND user_id = ?2",
            params![
                id.0,
                user_id,
                task.title,
                task.description,
                task.effort.as_str(),
                task.estimated_duration.map(i64::from),
                task.deadline.as_ref().map(format_date),
            ],
        )?;
        debug!(user_id, task = %id, "task updated");
        Ok(task)
    }

    /// Mark a task done (or not). The window link is left as it is; completed
    /// tasks simply stop counting against capacity.
    pub fn set_task_completed(
        &self,
        user_id: UserId,
        id: TaskId,
        completed: bool,
    ) -> Result<Task, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE tasks SET is_completed = ?3 WHERE id = ?1 AND user_id = ?2",
            params![id.0, user_id, completed],
        )?;
        if changed == 0 {
            return Err(DatabaseError::NotFound {
                entity: "task",
                id: id.0,
            });
        }
        self.get_task(user_id, id)?.ok_or(DatabaseError::NotFound {
            entity: "task",
            id: id.0,
        })
    }

    pub fn delete_task(&self, user_id: UserId, id: TaskId) -> Result<(), DatabaseError> {
        let changed = self.conn.execute(
            "DELETE FROM tasks WHERE id = ?1 AND user_id = ?2",
            params![id.0, user_id],
        )?;
        if changed == 0 {
            return Err(DatabaseError::NotFound {
                entity: "task",
                id: id.0,
            });
        }
        Ok(())
    }

    // === Window CRUD ===

    pub fn create_window(
        &self,
        user_id: UserId,
        new: &NewWindow,
    ) -> Result<EnergyWindow, DatabaseError> {
        let created_at = Utc::now().trunc_subsecs(6);
        self.conn.execute(
            "INSERT INTO energy_windows
                 (user_id, day_of_week, time_start, time_end, energy_level, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user_id,
                day_index(new.day_of_week),
                format_time(&new.time_start),
                format_time(&new.time_end),
                new.energy_level.as_str(),
                format_timestamp(&created_at),
            ],
        )?;
        let id = WindowId(self.conn.last_insert_rowid());
        debug!(user_id, window = %id, "window created");

        Ok(EnergyWindow {
            id,
            user_id,
            day_of_week: new.day_of_week,
            time_start: new.time_start,
            time_end: new.time_end,
            energy_level: new.energy_level,
            created_at,
        })
    }

    pub fn get_window(
        &self,
        user_id: UserId,
        id: WindowId,
    ) -> Result<Option<EnergyWindow>, DatabaseError> {
        let sql =
            format!("SELECT {WINDOW_COLUMNS} FROM energy_windows WHERE id = ?1 AND user_id = ?2");
        let window = self
            .conn
            .query_row(&sql, params![id.0, user_id], row_to_window)
            .optional()?;
        Ok(window)
    }

    /// All windows of `user_id` in week order.
    pub fn list_windows(&self, user_id: UserId) -> Result<Vec<EnergyWindow>, DatabaseError> {
        select_windows(&self.conn, user_id)
    }

    pub fn update_window(
        &self,
        user_id: UserId,
        id: WindowId,
        update: &WindowUpdate,
    ) -> Result<EnergyWindow, DatabaseError> {
        let mut window = self.get_window(user_id, id)?.ok_or(DatabaseError::NotFound {
            entity: "window",
            id: id.0,
        })?;
        if update.is_empty() {
            return Ok(window);
        }
        update.apply(&mut window);
        self.conn.execute(
            "UPDATE energy_windows
             SET day_of_week = ?3, time_start = ?4, time_end = ?5, energy_level = ?6
             WHERE id = ?1 AND user_id = ?2",
            params![
                id.0,
                user_id,
                day_index(window.day_of_week),
                format_time(&window.time_start),
                format_time(&window.time_end),
                window.energy_level.as_str(),
            ],
        )?;
        Ok(window)
    }

    /// Delete a window. Tasks assigned to it become unassigned.
    /// Returns how many open tasks went back to the backlog.
    pub fn delete_window(&self, user_id: UserId, id: WindowId) -> Result<usize, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let detached: i64 = tx.query_row(
            "SELECT COUNT(*) FROM tasks WHERE assigned_window_id = ?1 AND is_completed = 0",
            [id.0],
            |r| r.get(0),
        )?;
        let changed = tx.execute(
            "DELETE FROM energy_windows WHERE id = ?1 AND user_id = ?2",
            params![id.0, user_id],
        )?;
        if changed == 0 {
            return Err(DatabaseError::NotFound {
                entity: "window",
                id: id.0,
            });
        }
        tx.commit()?;
        Ok(detached as usize)
    }
}

/// A write-locked unit of work on [`ScheduleDb`].
///
/// Rolls back on drop unless [`ScheduleTx::commit`] was called.
pub struct ScheduleTx<'conn> {
    tx: Transaction<'conn>,
}

impl ScheduleTx<'_> {
    pub fn commit(self) -> Result<(), DatabaseError> {
        self.tx.commit()?;
        Ok(())
    }
}

impl ScheduleStore for ScheduleTx<'_> {
    fn list_unassigned_incomplete_tasks(
        &self,
        user_id: UserId,
        order: BacklogOrder,
    ) -> Result<Vec<Task>, DatabaseError> {
        select_backlog(&self.tx, user_id, order)
    }

    fn list_windows(&self, user_id: UserId) -> Result<Vec<EnergyWindow>, DatabaseError> {
        select_windows(&self.tx, user_id)
    }

    fn list_non_completed_tasks_assigned_to(
        &self,
        window_id: WindowId,
    ) -> Result<Vec<Task>, DatabaseError> {
        select_assigned(&self.tx, window_id)
    }

    fn persist_assignments(&mut self, assignments: &[Assignment]) -> Result<(), DatabaseError> {
        write_assignments(&self.tx, assignments)
    }

    fn persist_clear_all(&mut self, user_id: UserId) -> Result<usize, DatabaseError> {
        write_clear_all(&self.tx, user_id)
    }
}
