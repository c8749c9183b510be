//! End-of-day habit report.
//!
//! Summarises the applicable habits for one day: what was done, what was
//! excused by a skip day, and what was missed, plus a percentage score.
//! Delivery (email, notification) is left to the caller.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::status::HabitStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    Completed,
    Skipped { reason: Option<String> },
    Missed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEntry {
    pub key: String,
    pub label: String,
    pub critical: bool,
    pub outcome: Outcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayReport {
    pub date: NaiveDate,
    pub entries: Vec<ReportEntry>,
    /// Completed plus skipped
    pub completed: usize,
    pub total: usize,
    pub score_percent: u32,
}

impl DayReport {
    pub fn from_statuses(date: NaiveDate, statuses: &[HabitStatus]) -> Self {
        let entries: Vec<ReportEntry> = statuses
            .iter()
            .filter(|s| s.applicable)
            .map(|s| ReportEntry {
                key: s.habit.key.clone(),
                label: s.habit.label.clone(),
                critical: s.habit.critical,
                outcome: if s.skipped {
                    Outcome::Skipped {
                        reason: s.skip_reason.clone(),
                    }
                } else if s.completed {
                    Outcome::Completed
                } else {
                    Outcome::Missed
                },
            })
            .collect();

        let total = entries.len();
        let completed = statuses
            .iter()
            .filter(|s| s.applicable && s.is_satisfied())
            .count();
        let score_percent = if total == 0 {
            100
        } else {
            ((completed as f64 / total as f64) * 100.0).round() as u32
        };

        Self {
            date,
            entries,
            completed,
            total,
            score_percent,
        }
    }

    pub fn is_perfect(&self) -> bool {
        self.completed == self.total
    }

    /// Critical habits that were neither completed nor skipped.
    pub fn missed_critical(&self) -> Vec<&ReportEntry> {
        self.entries
            .iter()
            .filter(|e| e.critical && e.outcome == Outcome::Missed)
            .collect()
    }
}
