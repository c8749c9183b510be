//! Habits: recurrence, skip days, streaks, today's statuses, and the tracker
//! service that ties them to a store.

pub mod model;
pub mod report;
pub mod skip_days;
pub mod status;
pub mod streak;
pub mod tracker;

pub use model::{derive_key, is_applicable, Habit, HabitPatch, NewHabit, Recurrence};
pub use report::{DayReport, Outcome, ReportEntry};
pub use skip_days::{SkipDay, SkipDayIndex, RECOVERY_REASON};
pub use status::{compose_today, HabitStatus};
pub use streak::{milestone_for, HabitLogEntry, StreakEngine, StreakSummary, MILESTONES};
pub use tracker::{HabitTracker, ToggleOutcome};
