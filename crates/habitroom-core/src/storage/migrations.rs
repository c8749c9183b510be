//! Database schema migrations for habitroom.
//!
//! Migrations are versioned and applied automatically when opening the database.
//! The `schema_version` table tracks the current migration version.

use rusqlite::{Connection, Result as SqliteResult};

/// Current schema version.
pub const SCHEMA_VERSION: i32 = 2;

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
            tracing::warn!(error = %e, "failed to read schema_version");
        }
        0
    })
}

fn set_schema_version(conn: &Connection, version: i32) -> SqliteResult<()> {
    conn.execute("DELETE FROM schema_version", [])?;
    conn.execute(
        "INSERT INTO schema_version (version) VALUES (?1)",
        [version],
    )?;
    Ok(())
}

/// Migration v1: habits, completion log, skip days.
///
/// `habit_logs` carries a unique (habit_key, completed_date) constraint so a
/// second insert for the same day is rejected by the store, not by a prior read.
fn migrate_v1(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE TABLE IF NOT EXISTS habits (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            habit_key     TEXT NOT NULL UNIQUE,
            label         TEXT NOT NULL,
            frequency     TEXT NOT NULL DEFAULT 'daily',
            specific_days TEXT NOT NULL DEFAULT '[0,1,2,3,4,5,6]',
            skippable     INTEGER NOT NULL DEFAULT 0,
            critical      INTEGER NOT NULL DEFAULT 0,
            active        INTEGER NOT NULL DEFAULT 1,
            sort_order    INTEGER NOT NULL DEFAULT 0,
            created_on    TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS habit_logs (
            id             INTEGER PRIMARY KEY AUTOINCREMENT,
            habit_key      TEXT NOT NULL REFERENCES habits(habit_key),
            completed_date TEXT NOT NULL,
            UNIQUE (habit_key, completed_date)
        );

        CREATE TABLE IF NOT EXISTS skip_days (
            id            INTEGER PRIMARY KEY AUTOINCREMENT,
            date          TEXT NOT NULL,
            reason        TEXT NOT NULL,
            auto_recovery INTEGER NOT NULL DEFAULT 0,
            created_at    TEXT NOT NULL
        );",
    )?;
    set_schema_version(&tx, 1)?;
    tx.commit()
}

/// Migration v2: indexes for the lookback window queries.
fn migrate_v2(conn: &Connection) -> SqliteResult<()> {
    let tx = conn.unchecked_transaction()?;
    tx.execute_batch(
        "CREATE INDEX IF NOT EXISTS idx_habit_logs_completed_date ON habit_logs(completed_date);
         CREATE INDEX IF NOT EXISTS idx_skip_days_date ON skip_days(date);
         CREATE INDEX IF NOT EXISTS idx_habits_active_sort ON habits(active, sort_order);",
    )?;
    set_schema_version(&tx, 2)?;
    tx.commit()
}
