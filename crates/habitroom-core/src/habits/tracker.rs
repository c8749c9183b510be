//! Habit tracker service: the read path (today's statuses, day report) and
//! the write paths (toggle, skip days, habit management) over a store.
//!
//! Store reads that feed a composition abort it on the first failure; no
//! partial list is returned. Milestone detection after a toggle is
//! best-effort and never turns a successful toggle into an error.

use std::collections::HashSet;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::model::{Habit, HabitPatch, NewHabit};
use super::report::DayReport;
use super::skip_days::{recovery_date, SkipDay, SkipDayIndex, RECOVERY_REASON};
use super::status::{compose_today, HabitStatus};
use super::streak::{milestone_for, StreakEngine, DEFAULT_HORIZON_DAYS};
use crate::calendar::{weekday_of, CivilCalendar};
use crate::error::{ConfigError, CoreError, Result, ValidationError};
use crate::storage::{Config, HabitRepository};

/// Result of flipping today's completion for one habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleOutcome {
    pub completed: bool,
    /// Streak length reached by this completion, when it is a milestone
    pub milestone: Option<u32>,
}

pub struct HabitTracker<S> {
    store: S,
    engine: StreakEngine,
    lookback_days: u32,
}

impl<S: HabitRepository> HabitTracker<S> {
    pub fn new(store: S, engine: StreakEngine, lookback_days: u32) -> Self {
        Self {
            store,
            engine,
            lookback_days,
        }
    }

    /// Tracker with the default calendar, horizon, and lookback window.
    pub fn with_defaults(store: S) -> Self {
        Self::new(store, StreakEngine::default(), DEFAULT_HORIZON_DAYS)
    }

    /// Build a tracker from the timezone and windows in `config`.
    ///
    /// # Errors
    /// Returns an error if the configured timezone is unknown.
    pub fn from_config(store: S, config: &Config) -> Result<Self, ConfigError> {
        Ok(Self::new(
            store,
            config.streak_engine()?,
            config.streaks.lookback_days,
        ))
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn calendar(&self) -> &CivilCalendar {
        self.engine.calendar()
    }

    /// First date read from the store. Never later than the walk horizon.
    fn window_start(&self, today: NaiveDate) -> NaiveDate {
        let days = self.lookback_days.max(self.engine.horizon_days());
        today
            .checked_sub_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MIN)
    }

    /// Status of every active habit for the civil day containing `as_of`.
    ///
    /// # Errors
    /// Returns `CoreError::StoreRead` if any of the underlying reads fails.
    pub fn today_statuses(&self, as_of: DateTime<Utc>) -> Result<Vec<HabitStatus>> {
        let today = self.calendar().civil_date(as_of);
        let from = self.window_start(today);

        let habits = self.store.list_habits(true).map_err(CoreError::StoreRead)?;
        let skip_reason = self.store.skip_reason_on(today).map_err(CoreError::StoreRead)?;
        let logs = self
            .store
            .list_logs_since(None, from)
            .map_err(CoreError::StoreRead)?;
        let skip_days = self
            .store
            .list_skip_days_since(from)
            .map_err(CoreError::StoreRead)?;

        let completed_today: HashSet<String> = logs
            .iter()
            .filter(|entry| entry.date == today)
            .map(|entry| entry.habit_key.clone())
            .collect();
        let index = SkipDayIndex::build(&skip_days);
        let streaks = self.engine.compute_for_date(&habits, &logs, &index, today);

        Ok(compose_today(
            &habits,
            &completed_today,
            skip_reason.as_deref(),
            &streaks,
            weekday_of(today),
        ))
    }

    /// [`today_statuses`](Self::today_statuses) at the current instant.
    pub fn get_today_habit_statuses(&self) -> Result<Vec<HabitStatus>> {
        self.today_statuses(Utc::now())
    }

    /// Flip today's completion state for `habit_key`.
    ///
    /// Completing reports a milestone when the streak ending yesterday plus
    /// today reaches one. Un-completing never reports a milestone.
    ///
    /// # Errors
    /// Returns `StoreRead` if the existence check fails and `StoreWrite` if the
    /// insert or delete fails. Failures while computing the milestone are
    /// logged and swallowed.
    pub fn toggle(&self, habit_key: &str, as_of: DateTime<Utc>) -> Result<ToggleOutcome> {
        let today = self.calendar().civil_date(as_of);

        let exists = self
            .store
            .log_exists(habit_key, today)
            .map_err(CoreError::StoreRead)?;

        if exists {
            self.store
                .delete_log(habit_key, today)
                .map_err(CoreError::StoreWrite)?;
            tracing::info!(habit = habit_key, date = %today, "habit marked not done");
            return Ok(ToggleOutcome {
                completed: false,
                milestone: None,
            });
        }

        let inserted = self
            .store
            .insert_log(habit_key, today)
            .map_err(CoreError::StoreWrite)?;
        if !inserted {
            // lost a race with another toggle; the day is already complete
            tracing::debug!(habit = habit_key, date = %today, "habit already completed");
            return Ok(ToggleOutcome {
                completed: true,
                milestone: None,
            });
        }
        tracing::info!(habit = habit_key, date = %today, "habit completed");

        let milestone = match self.milestone_after_completion(habit_key, today) {
            Ok(milestone) => milestone,
            Err(e) => {
                tracing::warn!(habit = habit_key, error = %e, "milestone check skipped");
                None
            }
        };

        Ok(ToggleOutcome {
            completed: true,
            milestone,
        })
    }

    /// [`toggle`](Self::toggle) at the current instant.
    pub fn toggle_habit(&self, habit_key: &str) -> Result<ToggleOutcome> {
        self.toggle(habit_key, Utc::now())
    }

    fn milestone_after_completion(&self, habit_key: &str, today: NaiveDate) -> Result<Option<u32>> {
        let from = self.window_start(today);
        let habit = self
            .store
            .get_habit(habit_key)
            .map_err(CoreError::StoreRead)?
            .ok_or_else(|| CoreError::HabitNotFound(habit_key.to_string()))?;
        let logs = self
            .store
            .list_logs_since(Some(habit_key), from)
            .map_err(CoreError::StoreRead)?;
        let skip_days = self
            .store
            .list_skip_days_since(from)
            .map_err(CoreError::StoreRead)?;

        let index = SkipDayIndex::build(&skip_days);
        let streaks =
            self.engine
                .compute_for_date(std::slice::from_ref(&habit), &logs, &index, today);
        let ending_yesterday = streaks.get(habit_key).map_or(0, |s| s.streak);

        Ok(milestone_for(ending_yesterday + 1))
    }

    /// Record a skip day, plus a "Recovery" day after it when `auto_recovery`
    /// is set. Returns the records added.
    ///
    /// # Errors
    /// `Validation` for an empty reason, `StoreWrite` if the skip day itself
    /// fails, `RecoveryDay` if only the recovery companion fails.
    pub fn add_skip_day(
        &self,
        date: NaiveDate,
        reason: &str,
        auto_recovery: bool,
    ) -> Result<Vec<SkipDay>> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ValidationError::EmptyReason.into());
        }

        let primary = self
            .store
            .insert_skip_day(date, reason, auto_recovery)
            .map_err(CoreError::StoreWrite)?;
        tracing::info!(date = %date, reason, auto_recovery, "skip day added");
        let mut added = vec![primary];

        if auto_recovery {
            let Some(next) = recovery_date(date) else {
                return Ok(added);
            };
            match self.store.insert_skip_day(next, RECOVERY_REASON, false) {
                Ok(day) => added.push(day),
                Err(source) => {
                    tracing::warn!(date = %next, error = %source, "recovery day not recorded");
                    return Err(CoreError::RecoveryDay { date, source });
                }
            }
        }

        Ok(added)
    }

    /// All skip days ordered by date.
    pub fn skip_days(&self) -> Result<Vec<SkipDay>> {
        self.store.list_skip_days().map_err(CoreError::StoreRead)
    }

    /// Returns false if no skip day had `id`.
    pub fn delete_skip_day(&self, id: i64) -> Result<bool> {
        self.store.delete_skip_day(id).map_err(CoreError::StoreWrite)
    }

    pub fn habits(&self, active_only: bool) -> Result<Vec<Habit>> {
        self.store
            .list_habits(active_only)
            .map_err(CoreError::StoreRead)
    }

    /// Validate and add a habit created on the civil day containing `as_of`.
    ///
    /// # Errors
    /// `Validation` for bad input or a key that is already taken,
    /// `StoreWrite` for any other store failure.
    pub fn create_habit(&self, new_habit: NewHabit, as_of: DateTime<Utc>) -> Result<Habit> {
        let record = new_habit.into_record(self.calendar().civil_date(as_of))?;
        match self.store.insert_habit(&record) {
            Ok(habit) => {
                tracing::info!(habit = %habit.key, "habit created");
                Ok(habit)
            }
            Err(e) if e.is_constraint() => Err(ValidationError::DuplicateKey(record.key).into()),
            Err(e) => Err(CoreError::StoreWrite(e)),
        }
    }

    /// # Errors
    /// `Validation` for an invalid patch, `HabitNotFound` for an unknown key.
    pub fn update_habit(&self, habit_key: &str, patch: HabitPatch) -> Result<()> {
        let patch = patch.validated()?;
        let found = self
            .store
            .update_habit(habit_key, &patch)
            .map_err(CoreError::StoreWrite)?;
        if !found {
            return Err(CoreError::HabitNotFound(habit_key.to_string()));
        }
        Ok(())
    }

    /// Soft delete: the habit stops appearing but its log is kept.
    pub fn delete_habit(&self, habit_key: &str) -> Result<()> {
        let found = self
            .store
            .soft_delete_habit(habit_key)
            .map_err(CoreError::StoreWrite)?;
        if !found {
            return Err(CoreError::HabitNotFound(habit_key.to_string()));
        }
        tracing::info!(habit = habit_key, "habit deactivated");
        Ok(())
    }

    /// End-of-day summary for the civil day containing `as_of`.
    pub fn day_report(&self, as_of: DateTime<Utc>) -> Result<DayReport> {
        let statuses = self.today_statuses(as_of)?;
        Ok(DayReport::from_statuses(
            self.calendar().civil_date(as_of),
            &statuses,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habits::model::Recurrence;
    use crate::habits::streak::StreakSummary;
    use crate::storage::{Database, HabitLogStore};
    use chrono::{Duration, TimeZone};

    // Saturday 2026-03-21, noon in Toronto
    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 21, 16, 0, 0).unwrap()
    }

    fn tracker() -> HabitTracker<Database> {
        HabitTracker::with_defaults(Database::open_in_memory().unwrap())
    }

    fn add(t: &HabitTracker<Database>, label: &str, recurrence: Recurrence, skippable: bool) -> Habit {
        let new_habit = NewHabit {
            label: label.into(),
            recurrence,
            skippable,
            critical: false,
        };
        t.create_habit(new_habit, now() - Duration::days(60)).unwrap()
    }

    fn complete_days_ago(t: &HabitTracker<Database>, key: &str, ago: &[i64]) {
        let today = t.calendar().civil_date(now());
        for &n in ago {
            t.store().insert_log(key, today - Duration::days(n)).unwrap();
        }
    }

    #[test]
    fn toggle_twice_is_a_round_trip() {
        let t = tracker();
        let h = add(&t, "Drink water", Recurrence::Daily, true);

        let on = t.toggle(&h.key, now()).unwrap();
        assert!(on.completed);
        let off = t.toggle(&h.key, now()).unwrap();
        assert_eq!(off, ToggleOutcome { completed: false, milestone: None });

        let statuses = t.today_statuses(now()).unwrap();
        assert!(!statuses[0].completed);
        assert!(t
            .store()
            .list_logs_since(None, NaiveDate::from_ymd_opt(2000, 1, 1).unwrap())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn seventh_day_is_a_milestone() {
        let t = tracker();
        let h = add(&t, "Drink water", Recurrence::Daily, true);
        complete_days_ago(&t, &h.key, &[1, 2, 3, 4, 5, 6]);
        assert_eq!(
            t.toggle(&h.key, now()).unwrap(),
            ToggleOutcome { completed: true, milestone: Some(7) }
        );
    }

    fn hundredth_day_outcome(t: &HabitTracker<Database>) -> (StreakSummary, ToggleOutcome) {
        let h = t
            .create_habit(
                NewHabit {
                    label: "Drink water".into(),
                    recurrence: Recurrence::Daily,
                    skippable: true,
                    critical: false,
                },
                now() - Duration::days(200),
            )
            .unwrap();
        let ago: Vec<i64> = (1..=99).collect();
        complete_days_ago(t, &h.key, &ago);

        let status = &t.today_statuses(now()).unwrap()[0];
        let summary = StreakSummary {
            streak: status.streak,
            missed_days: status.missed_days,
        };
        (summary, t.toggle(&h.key, now()).unwrap())
    }

    #[test]
    fn hundredth_day_is_a_milestone_at_configured_windows() {
        let t = HabitTracker::from_config(Database::open_in_memory().unwrap(), &Config::default())
            .unwrap();
        let (summary, outcome) = hundredth_day_outcome(&t);
        assert_eq!(summary, StreakSummary { streak: 99, missed_days: 0 });
        assert_eq!(outcome, ToggleOutcome { completed: true, milestone: Some(100) });
    }

    #[test]
    fn short_lookback_still_reads_the_whole_horizon() {
        let t = HabitTracker::new(Database::open_in_memory().unwrap(), StreakEngine::default(), 30);
        let (summary, outcome) = hundredth_day_outcome(&t);
        assert_eq!(summary.streak, 99);
        assert_eq!(outcome.milestone, Some(100));
    }

    #[test]
    fn sixth_day_is_not_a_milestone() {
        let t = tracker();
        let h = add(&t, "Drink water", Recurrence::Daily, true);
        complete_days_ago(&t, &h.key, &[1, 2, 3, 4, 5]);
        assert_eq!(t.toggle(&h.key, now()).unwrap().milestone, None);
    }

    #[test]
    fn uncompleting_never_reports_a_milestone() {
        let t = tracker();
        let h = add(&t, "Drink water", Recurrence::Daily, true);
        complete_days_ago(&t, &h.key, &[0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(
            t.toggle(&h.key, now()).unwrap(),
            ToggleOutcome { completed: false, milestone: None }
        );
    }

    #[test]
    fn toggling_an_unknown_habit_fails_the_write() {
        let t = tracker();
        assert!(matches!(
            t.toggle("ghost", now()),
            Err(CoreError::StoreWrite(_))
        ));
    }

    #[test]
    fn auto_recovery_adds_exactly_two_records() {
        let t = tracker();
        let d = NaiveDate::from_ymd_opt(2026, 4, 4).unwrap();
        let added = t.add_skip_day(d, "Wedding", true).unwrap();
        assert_eq!(added.len(), 2);

        let all = t.skip_days().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!((all[0].date, all[0].reason.as_str(), all[0].auto_recovery), (d, "Wedding", true));
        assert_eq!(
            (all[1].date, all[1].reason.as_str(), all[1].auto_recovery),
            (d.succ_opt().unwrap(), RECOVERY_REASON, false)
        );
    }

    #[test]
    fn skip_day_without_recovery_adds_one_record() {
        let t = tracker();
        let d = NaiveDate::from_ymd_opt(2026, 4, 4).unwrap();
        assert_eq!(t.add_skip_day(d, "Sick", false).unwrap().len(), 1);
        assert!(matches!(
            t.add_skip_day(d, "  ", false),
            Err(CoreError::Validation(ValidationError::EmptyReason))
        ));
        let id = t.skip_days().unwrap()[0].id;
        assert!(t.delete_skip_day(id).unwrap());
        assert!(t.skip_days().unwrap().is_empty());
    }

    #[test]
    fn habit_management() {
        let t = tracker();
        let h = add(&t, "Take heart meds", Recurrence::Daily, false);
        assert_eq!(h.key, "take_heart_meds");
        assert_eq!(h.created_on, NaiveDate::from_ymd_opt(2026, 1, 20).unwrap());

        let dup = t.create_habit(
            NewHabit {
                label: "Take heart meds!".into(),
                recurrence: Recurrence::Daily,
                skippable: false,
                critical: true,
            },
            now(),
        );
        assert!(matches!(
            dup,
            Err(CoreError::Validation(ValidationError::DuplicateKey(_)))
        ));

        t.update_habit(
            &h.key,
            HabitPatch {
                label: Some("Heart meds".into()),
                critical: Some(true),
                ..Default::default()
            },
        )
        .unwrap();
        let updated = &t.habits(true).unwrap()[0];
        assert_eq!(updated.key, "take_heart_meds");
        assert_eq!(updated.label, "Heart meds");
        assert!(updated.critical);

        assert!(matches!(
            t.update_habit("ghost", HabitPatch::default()),
            Err(CoreError::HabitNotFound(_))
        ));

        t.delete_habit(&h.key).unwrap();
        assert!(t.today_statuses(now()).unwrap().is_empty());
        assert_eq!(t.habits(false).unwrap().len(), 1);
    }

    #[test]
    fn statuses_reflect_skip_day_and_streaks() {
        let t = tracker();
        let meds = add(&t, "Heart meds", Recurrence::Daily, false);
        let meta = add(&t, "Post on Meta", Recurrence::Daily, true);
        let gbp = add(&t, "Google Business", Recurrence::weekdays([2, 5]).unwrap(), true);
        complete_days_ago(&t, &meds.key, &[0, 1, 2]);
        t.add_skip_day(t.calendar().civil_date(now()), "Holiday", false)
            .unwrap();

        let statuses = t.today_statuses(now()).unwrap();
        let keys: Vec<&str> = statuses.iter().map(|s| s.habit.key.as_str()).collect();
        assert_eq!(keys, vec![meds.key.as_str(), meta.key.as_str(), gbp.key.as_str()]);

        assert!(statuses[0].completed && !statuses[0].skipped);
        assert_eq!(statuses[0].streak, 2);
        assert!(statuses[1].skipped);
        assert_eq!(statuses[1].skip_reason.as_deref(), Some("Holiday"));
        // Saturday
        assert!(!statuses[2].applicable);

        let report = t.day_report(now()).unwrap();
        assert_eq!((report.completed, report.total), (2, 2));
        assert!(report.is_perfect());
    }
}
