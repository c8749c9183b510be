//! Failure policy of the tracker, driven through a store that fails on demand.

use std::cell::RefCell;
use std::collections::HashSet;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use habitroom_core::habits::model::NewHabitRecord;
use habitroom_core::habits::{HabitTracker, NewHabit, Recurrence, RECOVERY_REASON};
use habitroom_core::{
    CoreError, Database, DatabaseError, Habit, HabitLogEntry, HabitLogStore, HabitPatch,
    HabitStore, SkipDay, SkipDayStore, ToggleOutcome,
};

/// Wraps a real database and fails the named operations.
struct FlakyStore {
    inner: Database,
    failing: RefCell<HashSet<&'static str>>,
    /// `log_exists` answers false regardless of the stored state
    stale_exists: RefCell<bool>,
}

impl FlakyStore {
    fn new() -> Self {
        Self {
            inner: Database::open_in_memory().unwrap(),
            failing: RefCell::new(HashSet::new()),
            stale_exists: RefCell::new(false),
        }
    }

    fn fail(&self, op: &'static str) {
        self.failing.borrow_mut().insert(op);
    }

    fn check(&self, op: &'static str) -> Result<(), DatabaseError> {
        if self.failing.borrow().contains(op) {
            Err(DatabaseError::QueryFailed(format!("injected failure in {op}")))
        } else {
            Ok(())
        }
    }
}

impl HabitStore for FlakyStore {
    fn list_habits(&self, active_only: bool) -> Result<Vec<Habit>, DatabaseError> {
        self.check("list_habits")?;
        self.inner.list_habits(active_only)
    }

    fn get_habit(&self, key: &str) -> Result<Option<Habit>, DatabaseError> {
        self.check("get_habit")?;
        self.inner.get_habit(key)
    }

    fn insert_habit(&self, record: &NewHabitRecord) -> Result<Habit, DatabaseError> {
        self.check("insert_habit")?;
        self.inner.insert_habit(record)
    }

    fn update_habit(&self, key: &str, patch: &HabitPatch) -> Result<bool, DatabaseError> {
        self.check("update_habit")?;
        self.inner.update_habit(key, patch)
    }

    fn soft_delete_habit(&self, key: &str) -> Result<bool, DatabaseError> {
        self.check("soft_delete_habit")?;
        self.inner.soft_delete_habit(key)
    }
}

impl HabitLogStore for FlakyStore {
    fn log_exists(&self, habit_key: &str, date: NaiveDate) -> Result<bool, DatabaseError> {
        self.check("log_exists")?;
        if *self.stale_exists.borrow() {
            return Ok(false);
        }
        self.inner.log_exists(habit_key, date)
    }

    fn insert_log(&self, habit_key: &str, date: NaiveDate) -> Result<bool, DatabaseError> {
        self.check("insert_log")?;
        self.inner.insert_log(habit_key, date)
    }

    fn delete_log(&self, habit_key: &str, date: NaiveDate) -> Result<bool, DatabaseError> {
        self.check("delete_log")?;
        self.inner.delete_log(habit_key, date)
    }

    fn list_logs_since(
        &self,
        habit_key: Option<&str>,
        from: NaiveDate,
    ) -> Result<Vec<HabitLogEntry>, DatabaseError> {
        self.check("list_logs_since")?;
        self.inner.list_logs_since(habit_key, from)
    }
}

impl SkipDayStore for FlakyStore {
    fn skip_reason_on(&self, date: NaiveDate) -> Result<Option<String>, DatabaseError> {
        self.check("skip_reason_on")?;
        self.inner.skip_reason_on(date)
    }

    fn list_skip_days_since(&self, from: NaiveDate) -> Result<Vec<SkipDay>, DatabaseError> {
        self.check("list_skip_days_since")?;
        self.inner.list_skip_days_since(from)
    }

    fn list_skip_days(&self) -> Result<Vec<SkipDay>, DatabaseError> {
        self.check("list_skip_days")?;
        self.inner.list_skip_days()
    }

    fn insert_skip_day(
        &self,
        date: NaiveDate,
        reason: &str,
        auto_recovery: bool,
    ) -> Result<SkipDay, DatabaseError> {
        if reason == RECOVERY_REASON {
            self.check("insert_recovery_day")?;
        } else {
            self.check("insert_skip_day")?;
        }
        self.inner.insert_skip_day(date, reason, auto_recovery)
    }

    fn delete_skip_day(&self, id: i64) -> Result<bool, DatabaseError> {
        self.check("delete_skip_day")?;
        self.inner.delete_skip_day(id)
    }
}

// Saturday 2026-03-21, noon in Toronto
fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 21, 16, 0, 0).unwrap()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 21).unwrap()
}

fn setup() -> (HabitTracker<FlakyStore>, String) {
    let tracker = HabitTracker::with_defaults(FlakyStore::new());
    let habit = tracker
        .create_habit(
            NewHabit {
                label: "Drink water".into(),
                recurrence: Recurrence::Daily,
                skippable: true,
                critical: false,
            },
            now() - Duration::days(30),
        )
        .unwrap();
    (tracker, habit.key)
}

fn logged_today(tracker: &HabitTracker<FlakyStore>, key: &str) -> bool {
    tracker.store().inner.log_exists(key, today()).unwrap()
}

#[test]
fn any_failed_read_aborts_todays_statuses() {
    for op in [
        "list_habits",
        "skip_reason_on",
        "list_logs_since",
        "list_skip_days_since",
    ] {
        let (tracker, _) = setup();
        tracker.store().fail(op);
        assert!(
            matches!(tracker.today_statuses(now()), Err(CoreError::StoreRead(_))),
            "{op} should abort the composition"
        );
        assert!(matches!(tracker.day_report(now()), Err(CoreError::StoreRead(_))));
    }
}

#[test]
fn failed_existence_check_is_a_read_error() {
    let (tracker, key) = setup();
    tracker.store().fail("log_exists");
    assert!(matches!(
        tracker.toggle(&key, now()),
        Err(CoreError::StoreRead(_))
    ));
    assert!(!logged_today(&tracker, &key));
}

#[test]
fn failed_insert_is_a_write_error() {
    let (tracker, key) = setup();
    tracker.store().fail("insert_log");
    assert!(matches!(
        tracker.toggle(&key, now()),
        Err(CoreError::StoreWrite(_))
    ));
    assert!(!logged_today(&tracker, &key));
}

#[test]
fn failed_delete_is_a_write_error() {
    let (tracker, key) = setup();
    tracker.toggle(&key, now()).unwrap();
    tracker.store().fail("delete_log");
    assert!(matches!(
        tracker.toggle(&key, now()),
        Err(CoreError::StoreWrite(_))
    ));
    assert!(logged_today(&tracker, &key));
}

#[test]
fn milestone_failure_does_not_fail_the_toggle() {
    let (tracker, key) = setup();
    for n in 1..=6 {
        tracker
            .store()
            .inner
            .insert_log(&key, today() - Duration::days(n))
            .unwrap();
    }
    tracker.store().fail("get_habit");

    let outcome = tracker.toggle(&key, now()).unwrap();
    assert_eq!(
        outcome,
        ToggleOutcome {
            completed: true,
            milestone: None
        }
    );
    assert!(logged_today(&tracker, &key));
}

#[test]
fn concurrent_completion_is_reported_as_completed() {
    let (tracker, key) = setup();
    tracker.store().inner.insert_log(&key, today()).unwrap();
    *tracker.store().stale_exists.borrow_mut() = true;

    let outcome = tracker.toggle(&key, now()).unwrap();
    assert_eq!(
        outcome,
        ToggleOutcome {
            completed: true,
            milestone: None
        }
    );
    let entries = tracker
        .store()
        .inner
        .list_logs_since(Some(&key), today())
        .unwrap();
    assert_eq!(entries.len(), 1);
}

#[test]
fn failed_recovery_day_keeps_the_primary_record() {
    let (tracker, _) = setup();
    tracker.store().fail("insert_recovery_day");
    let date = NaiveDate::from_ymd_opt(2026, 4, 4).unwrap();

    match tracker.add_skip_day(date, "Wedding", true) {
        Err(CoreError::RecoveryDay { date: failed, .. }) => assert_eq!(failed, date),
        other => panic!("expected RecoveryDay, got {other:?}"),
    }

    let recorded = tracker.store().inner.list_skip_days().unwrap();
    assert_eq!(recorded.len(), 1);
    assert_eq!(recorded[0].date, date);
    assert!(recorded[0].auto_recovery);
}

#[test]
fn failed_primary_skip_day_writes_nothing() {
    let (tracker, _) = setup();
    tracker.store().fail("insert_skip_day");
    let date = NaiveDate::from_ymd_opt(2026, 4, 4).unwrap();

    assert!(matches!(
        tracker.add_skip_day(date, "Wedding", true),
        Err(CoreError::StoreWrite(_))
    ));
    assert!(tracker.store().inner.list_skip_days().unwrap().is_empty());
}
