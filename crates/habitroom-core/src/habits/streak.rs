//! Streak and missed-day engine.
//!
//! For each habit two independent backward walks start at the civil day
//! before "today". Days the habit does not apply on, and skip days for
//! skippable habits, are passed over without counting or stopping. The
//! streak walk counts completed days until the first miss; the missed-day
//! walk counts misses until the first completion. Both walks stop at the
//! configured horizon and at the habit's creation date.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::{weekday_of, CivilCalendar};

use super::model::{is_applicable, Habit};
use super::skip_days::{SkipDay, SkipDayIndex};

/// Default number of calendar days a walk may cover.
pub const DEFAULT_HORIZON_DAYS: u32 = 365;

/// Streak lengths that trigger a celebration when reached by completing today.
pub const MILESTONES: [u32; 3] = [7, 30, 100];

/// "Habit X was completed on civil date D."
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HabitLogEntry {
    pub habit_key: String,
    pub date: NaiveDate,
}

impl HabitLogEntry {
    pub fn new(habit_key: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            habit_key: habit_key.into(),
            date,
        }
    }
}

/// Result of both walks for one habit, ending yesterday.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreakSummary {
    pub streak: u32,
    pub missed_days: u32,
}

/// The milestone reached by a streak of `streak` days, if any.
pub fn milestone_for(streak: u32) -> Option<u32> {
    MILESTONES.contains(&streak).then_some(streak)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Run {
    Completed,
    Missed,
}

/// Computes streak summaries from a bounded window of log entries.
#[derive(Debug, Clone)]
pub struct StreakEngine {
    calendar: CivilCalendar,
    horizon_days: u32,
}

impl Default for StreakEngine {
    fn default() -> Self {
        Self::new(CivilCalendar::default(), DEFAULT_HORIZON_DAYS)
    }
}

impl StreakEngine {
    pub fn new(calendar: CivilCalendar, horizon_days: u32) -> Self {
        Self {
            calendar,
            horizon_days,
        }
    }

    pub fn calendar(&self) -> &CivilCalendar {
        &self.calendar
    }

    pub fn horizon_days(&self) -> u32 {
        self.horizon_days
    }

    /// Compute `(streak, missed_days)` per habit key as of `as_of`.
    ///
    /// `log_entries` may contain entries for habits not in `habits`; they are
    /// ignored. Entries on or after today do not affect the result.
    pub fn compute_streaks(
        &self,
        habits: &[Habit],
        log_entries: &[HabitLogEntry],
        skip_days: &[SkipDay],
        as_of: DateTime<Utc>,
    ) -> HashMap<String, StreakSummary> {
        let today = self.calendar.civil_date(as_of);
        let index = SkipDayIndex::build(skip_days);
        self.compute_for_date(habits, log_entries, &index, today)
    }

    /// Same as [`compute_streaks`](Self::compute_streaks) with today already
    /// resolved to a civil date.
    pub fn compute_for_date(
        &self,
        habits: &[Habit],
        log_entries: &[HabitLogEntry],
        skip_index: &SkipDayIndex,
        today: NaiveDate,
    ) -> HashMap<String, StreakSummary> {
        let mut completed_by_habit: HashMap<&str, HashSet<NaiveDate>> = HashMap::new();
        for entry in log_entries {
            completed_by_habit
                .entry(entry.habit_key.as_str())
                .or_default()
                .insert(entry.date);
        }

        let empty = HashSet::new();
        habits
            .iter()
            .map(|habit| {
                let completed = completed_by_habit
                    .get(habit.key.as_str())
                    .unwrap_or(&empty);
                let summary = StreakSummary {
                    streak: self.walk(habit, completed, skip_index, today, Run::Completed),
                    missed_days: self.walk(habit, completed, skip_index, today, Run::Missed),
                };
                tracing::debug!(
                    habit = %habit.key,
                    streak = summary.streak,
                    missed_days = summary.missed_days,
                    "streak computed"
                );
                (habit.key.clone(), summary)
            })
            .collect()
    }

    fn walk(
        &self,
        habit: &Habit,
        completed: &HashSet<NaiveDate>,
        skip_index: &SkipDayIndex,
        today: NaiveDate,
        run: Run,
    ) -> u32 {
        let mut count = 0;
        let mut cursor = today.pred_opt();

        for _ in 0..self.horizon_days {
            let Some(date) = cursor else { break };
            if date < habit.created_on {
                break;
            }
            cursor = date.pred_opt();

            if !is_applicable(habit, weekday_of(date)) {
                continue;
            }
            if habit.skippable && skip_index.contains(date) {
                continue;
            }

            match (run, completed.contains(&date)) {
                (Run::Completed, true) | (Run::Missed, false) => count += 1,
                _ => break,
            }
        }

        count
    }
}
