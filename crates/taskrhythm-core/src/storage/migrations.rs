//! Database schema migrations for taskrhythm.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};
use tracing::{debug, warn};

/// Current schema version.
///
/// Increment this when adding new migrations.
pub const CURRENT_VERSION: i32 = 2;

/// Apply all pending migrations to bring the database to the current schema version.
///
/// # Errors
/// Returns an error if migration fails.
pub fn migrate(conn: &Connection) -> SqliteResult<()> {
    create_schema_version_table(conn)?;

    let current_version = get_schema_version(conn);

    if current_version < 1 {
        migrate_v1(conn)?;
    }
    if current_version < 2 {
        migrate_v2(conn)?;
    }

    Ok(())
}

fn create_schema_version_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY
        );",
    )
}

/// Get the current schema version from the database.
///
/// Returns 0 if no version is set (initial database).
pub fn get_schema_version(conn: &Connection) -> i32 {
    conn.query_row("SELECT version FROM schema_version", [], |row| {
        row.get::<_, i32>(0)
    })
    .unwrap_or_else(|e| {
        if !matches!(e, rusqlite::Error::QueryReturnedNoRows) {
            warn!("failed to read schema_version: {e}");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    debug!(version, "schema version set");
    Ok(())
}

/// Migration v1: windows and tasks.
///
/// Days are stored as 0-6 (Monday=0) so that `ORDER BY day_of_week` is the
/// natural week order. Times are `HH:MM:SS`, dates `YYYY-MM-DD`, timestamps
/// RFC3339 UTC with microseconds; all of them sort correctly as text.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS energy_windows (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id       INTEGER NOT NULL,
            day_of_week   INTEGER NOT NULL CHECK (day_of_week BETWEEN 0 AND 6),
            time_start    TEXT NOT NULL,
            time_end      TEXT NOT NULL,
            energy_level  TEXT NOT NULL CHECK (energy_level IN ('high', 'medium', 'low')),
            created_at    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id                  INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id             INTEGER NOT NULL,
            title               TEXT NOT NULL,
            description         TEXT,
            effort_level        TEXT NOT NULL,
            estimated_duration  INTEGER
                CHECK (estimated_duration IS NULL OR estimated_duration > 0),
            deadline            TEXT,
            is_completed        INTEGER NOT NULL DEFAULT 0,
            assigned_window_id  INTEGER REFERENCES energy_windows(id) ON DELETE SET NULL,
            created_at          TEXT NOT NULL
        );",
    )?;

    set_schema_version(&tx, 1)?;
    tx.commit()?;
    Ok(())
}

/// Migration v2: indexes for the scheduling queries.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;

    tx.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_windows_user_order
            ON energy_windows(user_id, day_of_week, time_start);
         CREATE INDEX IF NOT EXISTS idx_tasks_backlog
            ON tasks(user_id, is_completed, assigned_window_id);
         CREATE INDEX IF NOT EXISTS idx_tasks_window
            ON tasks(assigned_window_id);",
    )?;

    set_schema_version(&tx, 2)?;
    tx.commit()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_database_reaches_current_version() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), CURRENT_VERSION);
    }

    #[test]
    fn migrate_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        migrate(&conn).unwrap();
        assert_eq!(get_schema_version(&conn), CURRENT_VERSION);

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |r| r.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn energy_level_is_constrained() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        let result = conn.execute(
            "INSERT INTO energy_windows
                 (user_id, day_of_week, time_start, time_end, energy_level, created_at)
             VALUES (1, 0, '09:00:00', '10:00:00', 'extreme', '2026-01-01T00:00:00Z')",
            [],
        );
        assert!(result.is_err());
    }
}
