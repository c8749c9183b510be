//! Per-habit status for one civil day.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::model::{is_applicable, Habit};
use super::streak::StreakSummary;

/// Computed view of one habit for today. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitStatus {
    pub habit: Habit,
    /// Today's weekday is in the habit's recurrence set
    pub applicable: bool,
    /// A log entry exists for today
    pub completed: bool,
    /// Today is a skip day and the habit is skippable
    pub skipped: bool,
    pub skip_reason: Option<String>,
    pub streak: u32,
    pub missed_days: u32,
    /// Only set right after a toggle completes a milestone
    pub milestone: Option<u32>,
}

impl HabitStatus {
    /// Completed or excused by a skip day.
    pub fn is_satisfied(&self) -> bool {
        self.completed || self.skipped
    }
}

/// Combine today's facts with precomputed streaks into one status per
/// active habit, preserving the order of `habits`.
pub fn compose_today(
    habits: &[Habit],
    completed_today: &HashSet<String>,
    todays_skip_reason: Option<&str>,
    streaks: &HashMap<String, StreakSummary>,
    today_weekday: u8,
) -> Vec<HabitStatus> {
    habits
        .iter()
        .filter(|habit| habit.active)
        .map(|habit| {
            let skipped = todays_skip_reason.is_some() && habit.skippable;
            let summary = streaks.get(&habit.key).copied().unwrap_or_default();
            HabitStatus {
                habit: habit.clone(),
                applicable: is_applicable(habit, today_weekday),
                completed: completed_today.contains(&habit.key),
                skipped,
                skip_reason: if skipped {
                    todays_skip_reason.map(str::to_string)
                } else {
                    None
                },
                streak: summary.streak,
                missed_days: summary.missed_days,
                milestone: None,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::habits::model::Recurrence;
    use chrono::NaiveDate;

    fn habit(key: &str, recurrence: Recurrence, skippable: bool, active: bool) -> Habit {
        Habit {
            id: 0,
            key: key.into(),
            label: key.into(),
            recurrence,
            skippable,
            critical: false,
            active,
            sort_order: 0,
            created_on: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
        }
    }

    #[test]
    fn composes_flags_and_streaks() {
        let habits = vec![
            habit("meds", Recurrence::Daily, false, true),
            habit("gbp", Recurrence::weekdays([2, 5]).unwrap(), true, true),
            habit("old", Recurrence::Daily, true, false),
        ];
        let completed: HashSet<String> = ["meds".to_string()].into_iter().collect();
        let mut streaks = HashMap::new();
        streaks.insert("meds".to_string(), StreakSummary { streak: 4, missed_days: 0 });

        // Saturday, skip day
        let statuses = compose_today(&habits, &completed, Some("Vacation"), &streaks, 6);
        assert_eq!(statuses.len(), 2);

        let meds = &statuses[0];
        assert!(meds.applicable && meds.completed && !meds.skipped);
        assert_eq!(meds.skip_reason, None);
        assert_eq!(meds.streak, 4);

        let gbp = &statuses[1];
        assert!(!gbp.applicable);
        assert!(gbp.skipped);
        assert_eq!(gbp.skip_reason.as_deref(), Some("Vacation"));
        assert_eq!((gbp.streak, gbp.missed_days), (0, 0));
        assert!(statuses.iter().all(|s| s.milestone.is_none()));
    }

    #[test]
    fn no_skip_day_means_nothing_skipped() {
        let habits = vec![habit("meta", Recurrence::Daily, true, true)];
        let statuses = compose_today(&habits, &HashSet::new(), None, &HashMap::new(), 2);
        assert!(!statuses[0].skipped);
        assert!(!statuses[0].is_satisfied());
    }
}
