//! SQLite-backed store for habits, the completion log, and skip days.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, ToSql};

use super::data_dir;
use super::migrations;
use super::traits::{HabitLogStore, HabitStore, SkipDayStore};
use crate::calendar::{format_date, DATE_FORMAT};
use crate::error::{CoreError, DatabaseError};
use crate::habits::model::{Habit, HabitPatch, NewHabitRecord, Recurrence};
use crate::habits::skip_days::SkipDay;
use crate::habits::streak::HabitLogEntry;

const HABIT_COLUMNS: &str = "id, habit_key, label, frequency, specific_days, skippable, \
                             critical, active, sort_order, created_on";

fn conversion_error(
    index: usize,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err))
}

fn get_date(row: &rusqlite::Row, index: usize) -> Result<NaiveDate, rusqlite::Error> {
    let s: String = row.get(index)?;
    NaiveDate::parse_from_str(&s, DATE_FORMAT).map_err(|e| conversion_error(index, e))
}

/// Parse datetime from RFC3339 string with fallback to current time
fn parse_datetime_fallback(dt_str: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(dt_str)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn row_to_habit(row: &rusqlite::Row) -> Result<Habit, rusqlite::Error> {
    let frequency: String = row.get(3)?;
    let days_json: String = row.get(4)?;
    let days: Vec<u8> = serde_json::from_str(&days_json).map_err(|e| conversion_error(4, e))?;
    let recurrence = Recurrence::from_parts(&frequency, &days).map_err(|e| conversion_error(4, e))?;

    Ok(Habit {
        id: row.get(0)?,
        key: row.get(1)?,
        label: row.get(2)?,
        recurrence,
        skippable: row.get(5)?,
        critical: row.get(6)?,
        active: row.get(7)?,
        sort_order: row.get(8)?,
        created_on: get_date(row, 9)?,
    })
}

fn row_to_skip_day(row: &rusqlite::Row) -> Result<SkipDay, rusqlite::Error> {
    let created_at: String = row.get(4)?;
    Ok(SkipDay {
        id: row.get(0)?,
        date: get_date(row, 1)?,
        reason: row.get(2)?,
        auto_recovery: row.get(3)?,
        created_at: parse_datetime_fallback(&created_at),
    })
}

fn days_json(recurrence: &Recurrence) -> String {
    // a Vec<u8> always serializes
    serde_json::to_string(&recurrence.days()).unwrap_or_else(|_| "[]".into())
}

/// SQLite database holding every habitroom table.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/habitroom.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the data directory is unavailable or the database
    /// cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("habitroom.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (or create) the database file at `path`.
    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::init(conn)
    }

    /// Open an in-memory database.
    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self, DatabaseError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        migrations::migrate(&conn).map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }
}

impl HabitStore for Database {
    fn list_habits(&self, active_only: bool) -> Result<Vec<Habit>, DatabaseError> {
        let sql = format!(
            "SELECT {HABIT_COLUMNS} FROM habits
             WHERE (?1 = 0 OR active = 1)
             ORDER BY sort_order ASC, id ASC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![active_only], row_to_habit)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn get_habit(&self, key: &str) -> Result<Option<Habit>, DatabaseError> {
        let sql = format!("SELECT {HABIT_COLUMNS} FROM habits WHERE habit_key = ?1");
        Ok(self
            .conn
            .query_row(&sql, params![key], row_to_habit)
            .optional()?)
    }

    fn insert_habit(&self, record: &NewHabitRecord) -> Result<Habit, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let sort_order: i64 = tx.query_row(
            "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM habits",
            [],
            |row| row.get(0),
        )?;
        tx.execute(
            "INSERT INTO habits (habit_key, label, frequency, specific_days, skippable,
                                 critical, active, sort_order, created_on)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?8)",
            params![
                record.key,
                record.label,
                record.recurrence.frequency(),
                days_json(&record.recurrence),
                record.skippable,
                record.critical,
                sort_order,
                format_date(record.created_on),
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(Habit {
            id,
            key: record.key.clone(),
            label: record.label.clone(),
            recurrence: record.recurrence.clone(),
            skippable: record.skippable,
            critical: record.critical,
            active: true,
            sort_order,
            created_on: record.created_on,
        })
    }

    fn update_habit(&self, key: &str, patch: &HabitPatch) -> Result<bool, DatabaseError> {
        let mut sets: Vec<&str> = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(label) = &patch.label {
            sets.push("label = ?");
            values.push(Box::new(label.clone()));
        }
        if let Some(recurrence) = &patch.recurrence {
            sets.push("frequency = ?");
            values.push(Box::new(recurrence.frequency()));
            sets.push("specific_days = ?");
            values.push(Box::new(days_json(recurrence)));
        }
        if let Some(skippable) = patch.skippable {
            sets.push("skippable = ?");
            values.push(Box::new(skippable));
        }
        if let Some(critical) = patch.critical {
            sets.push("critical = ?");
            values.push(Box::new(critical));
        }
        if let Some(active) = patch.active {
            sets.push("active = ?");
            values.push(Box::new(active));
        }
        if let Some(sort_order) = patch.sort_order {
            sets.push("sort_order = ?");
            values.push(Box::new(sort_order));
        }

        if sets.is_empty() {
            return Ok(self.get_habit(key)?.is_some());
        }

        let sql = format!("UPDATE habits SET {} WHERE habit_key = ?", sets.join(", "));
        values.push(Box::new(key.to_string()));
        let changed = self
            .conn
            .execute(&sql, rusqlite::params_from_iter(values.iter()))?;
        Ok(changed > 0)
    }

    fn soft_delete_habit(&self, key: &str) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            "UPDATE habits SET active = 0 WHERE habit_key = ?1",
            params![key],
        )?;
        Ok(changed > 0)
    }
}

impl HabitLogStore for Database {
    fn log_exists(&self, habit_key: &str, date: NaiveDate) -> Result<bool, DatabaseError> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM habit_logs WHERE habit_key = ?1 AND completed_date = ?2",
                params![habit_key, format_date(date)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn insert_log(&self, habit_key: &str, date: NaiveDate) -> Result<bool, DatabaseError> {
        let inserted = self.conn.execute(
            "INSERT INTO habit_logs (habit_key, completed_date) VALUES (?1, ?2)
             ON CONFLICT (habit_key, completed_date) DO NOTHING",
            params![habit_key, format_date(date)],
        )?;
        Ok(inserted == 1)
    }

    fn delete_log(&self, habit_key: &str, date: NaiveDate) -> Result<bool, DatabaseError> {
        let deleted = self.conn.execute(
            "DELETE FROM habit_logs WHERE habit_key = ?1 AND completed_date = ?2",
            params![habit_key, format_date(date)],
        )?;
        Ok(deleted > 0)
    }

    fn list_logs_since(
        &self,
        habit_key: Option<&str>,
        from: NaiveDate,
    ) -> Result<Vec<HabitLogEntry>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT habit_key, completed_date FROM habit_logs
             WHERE completed_date >= ?1 AND (?2 IS NULL OR habit_key = ?2)
             ORDER BY completed_date ASC",
        )?;
        let rows = stmt.query_map(params![format_date(from), habit_key], |row| {
            Ok(HabitLogEntry {
                habit_key: row.get(0)?,
                date: get_date(row, 1)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl SkipDayStore for Database {
    fn skip_reason_on(&self, date: NaiveDate) -> Result<Option<String>, DatabaseError> {
        Ok(self
            .conn
            .query_row(
                "SELECT reason FROM skip_days WHERE date = ?1 ORDER BY id DESC LIMIT 1",
                params![format_date(date)],
                |row| row.get(0),
            )
            .optional()?)
    }

    fn list_skip_days_since(&self, from: NaiveDate) -> Result<Vec<SkipDay>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, reason, auto_recovery, created_at FROM skip_days
             WHERE date >= ?1
             ORDER BY date ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![format_date(from)], row_to_skip_day)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn list_skip_days(&self) -> Result<Vec<SkipDay>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, reason, auto_recovery, created_at FROM skip_days
             ORDER BY date ASC, id ASC",
        )?;
        let rows = stmt.query_map([], row_to_skip_day)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn insert_skip_day(
        &self,
        date: NaiveDate,
        reason: &str,
        auto_recovery: bool,
    ) -> Result<SkipDay, DatabaseError> {
        let created_at = Utc::now();
        self.conn.execute(
            "INSERT INTO skip_days (date, reason, auto_recovery, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![format_date(date), reason, auto_recovery, created_at.to_rfc3339()],
        )?;
        Ok(SkipDay {
            id: self.conn.last_insert_rowid(),
            date,
            reason: reason.to_string(),
            auto_recovery,
            created_at,
        })
    }

    fn delete_skip_day(&self, id: i64) -> Result<bool, DatabaseError> {
        let deleted = self
            .conn
            .execute("DELETE FROM skip_days WHERE id = ?1", params![id])?;
        Ok(deleted > 0)
    }
}
