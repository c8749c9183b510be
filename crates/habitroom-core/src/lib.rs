//! # Habitroom Core Library
//!
//! Core logic for the Habitroom habit tracker. Every operation is available
//! through the standalone CLI binary, which is a thin layer over this crate.
//!
//! ## Architecture
//!
//! - **Calendar**: resolves instants to civil dates in one fixed timezone
//! - **Habits**: recurrence sets, skip days, the streak and missed-day engine,
//!   today's status composition, and the toggle operation
//! - **Storage**: store traits, the SQLite implementation, and TOML config
//!
//! ## Key Components
//!
//! - [`HabitTracker`]: read and write paths over a store
//! - [`StreakEngine`]: backward streak / missed-day walks
//! - [`Database`]: SQLite store for habits, logs, and skip days
//! - [`Config`]: application configuration management

pub mod calendar;
pub mod error;
pub mod habits;
pub mod storage;

pub use calendar::CivilCalendar;
pub use error::{ConfigError, CoreError, DatabaseError, Result, ValidationError};
pub use habits::{
    DayReport, Habit, HabitLogEntry, HabitPatch, HabitStatus, HabitTracker, NewHabit, Recurrence,
    SkipDay, StreakEngine, StreakSummary, ToggleOutcome,
};
pub use storage::{Config, Database, HabitLogStore, HabitRepository, HabitStore, SkipDayStore};
