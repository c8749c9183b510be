use chrono::NaiveDate;

use crate::error::DatabaseError;
use crate::habits::model::{Habit, HabitPatch, NewHabitRecord};
use crate::habits::skip_days::SkipDay;
use crate::habits::streak::HabitLogEntry;

/// Habit definitions. Habits are never physically removed.
pub trait HabitStore {
    /// Habits ordered by sort position.
    fn list_habits(&self, active_only: bool) -> Result<Vec<Habit>, DatabaseError>;

    fn get_habit(&self, key: &str) -> Result<Option<Habit>, DatabaseError>;

    /// Insert at the end of the sort order. A duplicate key is a
    /// `DatabaseError::Constraint`.
    fn insert_habit(&self, record: &NewHabitRecord) -> Result<Habit, DatabaseError>;

    /// Apply a partial update. Returns false if no habit has `key`.
    fn update_habit(&self, key: &str, patch: &HabitPatch) -> Result<bool, DatabaseError>;

    /// Clear `active`. Returns false if no habit has `key`.
    fn soft_delete_habit(&self, key: &str) -> Result<bool, DatabaseError>;
}

/// Completion log, at most one entry per (habit, date).
pub trait HabitLogStore {
    fn log_exists(&self, habit_key: &str, date: NaiveDate) -> Result<bool, DatabaseError>;

    /// Conditional insert. Returns false when an entry for the pair already
    /// existed, which callers treat as "already completed".
    fn insert_log(&self, habit_key: &str, date: NaiveDate) -> Result<bool, DatabaseError>;

    /// Returns false if there was nothing to delete.
    fn delete_log(&self, habit_key: &str, date: NaiveDate) -> Result<bool, DatabaseError>;

    /// Entries on or after `from`, for one habit or for all of them.
    fn list_logs_since(
        &self,
        habit_key: Option<&str>,
        from: NaiveDate,
    ) -> Result<Vec<HabitLogEntry>, DatabaseError>;
}

/// Organization-wide skip days.
pub trait SkipDayStore {
    /// Reason recorded for `date`, if it is a skip day.
    fn skip_reason_on(&self, date: NaiveDate) -> Result<Option<String>, DatabaseError>;

    /// Skip days on or after `from`, ordered by date then insertion.
    fn list_skip_days_since(&self, from: NaiveDate) -> Result<Vec<SkipDay>, DatabaseError>;

    fn list_skip_days(&self) -> Result<Vec<SkipDay>, DatabaseError>;

    fn insert_skip_day(
        &self,
        date: NaiveDate,
        reason: &str,
        auto_recovery: bool,
    ) -> Result<SkipDay, DatabaseError>;

    fn delete_skip_day(&self, id: i64) -> Result<bool, DatabaseError>;
}

/// Everything the habit tracker needs from storage.
pub trait HabitRepository: HabitStore + HabitLogStore + SkipDayStore {}

impl<T: HabitStore + HabitLogStore + SkipDayStore> HabitRepository for T {}
