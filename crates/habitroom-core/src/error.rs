//! Core error types for habitroom-core.
//!
//! Store failures are split by direction: a failed read aborts the whole
//! composition, a failed primary write is reported as such, and a failed
//! secondary write (the auto-recovery skip day) gets its own variant so the
//! caller knows the primary record landed.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Core error type for habitroom-core.
#[derive(Error, Debug)]
pub enum CoreError {
    /// A listing or lookup against the store failed
    #[error("Store read failed: {0}")]
    StoreRead(#[source] DatabaseError),

    /// The primary write of an operation failed
    #[error("Store write failed: {0}")]
    StoreWrite(#[source] DatabaseError),

    /// Skip day was recorded but its recovery companion was not
    #[error("Skip day {date} added but recovery day failed: {source}")]
    RecoveryDay {
        date: NaiveDate,
        #[source]
        source: DatabaseError,
    },

    /// Opening or migrating the database failed
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Habit not found: {0}")]
    HabitNotFound(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Database-specific errors.
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// Failed to open database connection
    #[error("Failed to open database at {path}: {source}")]
    OpenFailed {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// Query execution failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Migration failed
    #[error("Database migration failed: {0}")]
    MigrationFailed(String),

    /// A uniqueness or foreign key constraint rejected the write
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Database is locked
    #[error("Database is locked")]
    Locked,
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to load configuration
    #[error("Failed to load configuration from {path}: {message}")]
    LoadFailed { path: PathBuf, message: String },

    /// Failed to save configuration
    #[error("Failed to save configuration to {path}: {message}")]
    SaveFailed { path: PathBuf, message: String },

    /// Invalid configuration value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    /// Data directory could not be resolved or created
    #[error("Data directory unavailable: {0}")]
    DataDir(String),
}

/// Validation errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Recurrence must include at least one weekday")]
    EmptyRecurrence,

    #[error("Weekday index {0} out of range (0 = Sunday .. 6 = Saturday)")]
    InvalidWeekday(u8),

    #[error("Habit label must not be empty")]
    EmptyLabel,

    #[error("Label '{0}' does not produce a usable habit key")]
    EmptyKey(String),

    #[error("A habit with key '{0}' already exists")]
    DuplicateKey(String),

    #[error("Skip day reason must not be empty")]
    EmptyReason,

    #[error("Invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(code, _msg) => match code.code {
                rusqlite::ErrorCode::DatabaseLocked | rusqlite::ErrorCode::DatabaseBusy => {
                    DatabaseError::Locked
                }
                rusqlite::ErrorCode::ConstraintViolation => {
                    DatabaseError::Constraint(err.to_string())
                }
                _ => DatabaseError::QueryFailed(err.to_string()),
            },
            _ => DatabaseError::QueryFailed(err.to_string()),
        }
    }
}

impl DatabaseError {
    pub fn is_constraint(&self) -> bool {
        matches!(self, DatabaseError::Constraint(_))
    }
}

/// Result type alias for CoreError
pub type Result<T, E = CoreError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovery_day_message_names_the_date() {
        let err = CoreError::RecoveryDay {
            date: NaiveDate::from_ymd_opt(2026, 3, 21).unwrap(),
            source: DatabaseError::Locked,
        };
        let msg = err.to_string();
        assert!(msg.contains("2026-03-21"));
        assert!(msg.contains("recovery day failed"));
    }

    #[test]
    fn query_errors_are_not_constraints() {
        let err: DatabaseError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(!err.is_constraint());
    }
}
