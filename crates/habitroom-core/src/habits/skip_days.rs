//! Skip days and the date → reason index the streak engine consults.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Reason recorded on the companion day inserted by auto-recovery.
pub const RECOVERY_REASON: &str = "Recovery";

/// A date on which every skippable habit counts as satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkipDay {
    pub id: i64,
    pub date: NaiveDate,
    pub reason: String,
    /// When set at creation, the following day was added as a recovery day
    pub auto_recovery: bool,
    pub created_at: DateTime<Utc>,
}

/// The day after `date`, used for the auto-recovery companion.
pub fn recovery_date(date: NaiveDate) -> Option<NaiveDate> {
    date.succ_opt()
}

/// Lookup from civil date to skip reason.
#[derive(Debug, Clone, Default)]
pub struct SkipDayIndex {
    reasons: HashMap<NaiveDate, String>,
}

impl SkipDayIndex {
    /// Build the index. A later entry for the same date replaces an earlier one.
    pub fn build<'a, I>(skip_days: I) -> Self
    where
        I: IntoIterator<Item = &'a SkipDay>,
    {
        let mut reasons = HashMap::new();
        for day in skip_days {
            reasons.insert(day.date, day.reason.clone());
        }
        Self { reasons }
    }

    pub fn reason_for(&self, date: NaiveDate) -> Option<&str> {
        self.reasons.get(&date).map(String::as_str)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.reasons.contains_key(&date)
    }

    pub fn len(&self) -> usize {
        self.reasons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(id: i64, date: &str, reason: &str) -> SkipDay {
        SkipDay {
            id,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            reason: reason.into(),
            auto_recovery: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn lookup_by_date() {
        let days = vec![day(1, "2026-03-20", "Wedding"), day(2, "2026-03-21", RECOVERY_REASON)];
        let index = SkipDayIndex::build(&days);
        assert_eq!(index.len(), 2);
        assert_eq!(index.reason_for(days[0].date), Some("Wedding"));
        assert_eq!(index.reason_for(days[1].date), Some("Recovery"));
        assert!(!index.contains(NaiveDate::from_ymd_opt(2026, 3, 22).unwrap()));
    }

    #[test]
    fn duplicate_dates_keep_the_last_reason() {
        let days = vec![day(1, "2026-03-20", "Travel"), day(2, "2026-03-20", "Sick")];
        let index = SkipDayIndex::build(&days);
        assert_eq!(index.len(), 1);
        assert_eq!(index.reason_for(days[0].date), Some("Sick"));
    }

    #[test]
    fn recovery_is_the_next_calendar_day() {
        let d = NaiveDate::from_ymd_opt(2026, 2, 28).unwrap();
        assert_eq!(recovery_date(d), NaiveDate::from_ymd_opt(2026, 3, 1));
    }
}
