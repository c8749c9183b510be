//! Habit records, recurrence sets, and the applicability rule.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Highest valid weekday index (Saturday).
pub const MAX_WEEKDAY: u8 = 6;

/// Which weekdays a habit is in scope on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Recurrence {
    /// Every day of the week
    Daily,
    /// An explicit set of weekday indices, 0 = Sunday
    Weekdays(BTreeSet<u8>),
}

impl Recurrence {
    /// Build a weekday set, rejecting out-of-range indices and empty sets.
    ///
    /// # Errors
    /// Returns `InvalidWeekday` or `EmptyRecurrence`.
    pub fn weekdays<I: IntoIterator<Item = u8>>(days: I) -> Result<Self, ValidationError> {
        let recurrence = Recurrence::Weekdays(days.into_iter().collect());
        recurrence.validate()?;
        Ok(recurrence)
    }

    /// Rebuild a recurrence from its stored `frequency` tag and day list.
    ///
    /// # Errors
    /// Returns a validation error if a `specific` recurrence is empty or out of range.
    pub fn from_parts(frequency: &str, days: &[u8]) -> Result<Self, ValidationError> {
        match frequency {
            "daily" => Ok(Recurrence::Daily),
            _ => Self::weekdays(days.iter().copied()),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Recurrence::Daily => Ok(()),
            Recurrence::Weekdays(days) => {
                if let Some(&bad) = days.iter().find(|&&d| d > MAX_WEEKDAY) {
                    return Err(ValidationError::InvalidWeekday(bad));
                }
                if days.is_empty() {
                    return Err(ValidationError::EmptyRecurrence);
                }
                Ok(())
            }
        }
    }

    pub fn includes(&self, weekday: u8) -> bool {
        match self {
            Recurrence::Daily => weekday <= MAX_WEEKDAY,
            Recurrence::Weekdays(days) => days.contains(&weekday),
        }
    }

    /// Stored frequency tag.
    pub fn frequency(&self) -> &'static str {
        match self {
            Recurrence::Daily => "daily",
            Recurrence::Weekdays(_) => "specific",
        }
    }

    /// Weekday indices in ascending order; `Daily` expands to all seven.
    pub fn days(&self) -> Vec<u8> {
        match self {
            Recurrence::Daily => (0..=MAX_WEEKDAY).collect(),
            Recurrence::Weekdays(days) => days.iter().copied().collect(),
        }
    }
}

/// A recurring obligation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Habit {
    pub id: i64,
    /// Stable identifier derived from the label at creation
    pub key: String,
    pub label: String,
    pub recurrence: Recurrence,
    /// Auto-satisfied on a skip day
    pub skippable: bool,
    /// Escalated warning when missed; no effect on streaks
    pub critical: bool,
    pub active: bool,
    pub sort_order: i64,
    /// Civil date the habit was added
    pub created_on: NaiveDate,
}

/// Whether `habit` is in scope on `weekday` (0 = Sunday).
pub fn is_applicable(habit: &Habit, weekday: u8) -> bool {
    habit.recurrence.includes(weekday)
}

/// User input for adding a habit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHabit {
    pub label: String,
    pub recurrence: Recurrence,
    #[serde(default)]
    pub skippable: bool,
    #[serde(default)]
    pub critical: bool,
}

impl NewHabit {
    /// Validate and turn the input into a store record.
    ///
    /// # Errors
    /// Returns a validation error for an empty label, a label with no usable
    /// key characters, or an invalid recurrence.
    pub fn into_record(self, created_on: NaiveDate) -> Result<NewHabitRecord, ValidationError> {
        let label = validate_label(&self.label)?;
        self.recurrence.validate()?;
        let key = derive_key(&label)?;
        Ok(NewHabitRecord {
            key,
            label,
            recurrence: self.recurrence,
            skippable: self.skippable,
            critical: self.critical,
            created_on,
        })
    }
}

/// A validated habit ready for insertion. The store assigns id and sort order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewHabitRecord {
    pub key: String,
    pub label: String,
    pub recurrence: Recurrence,
    pub skippable: bool,
    pub critical: bool,
    pub created_on: NaiveDate,
}

/// Partial update of a habit. The key is never changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HabitPatch {
    pub label: Option<String>,
    pub recurrence: Option<Recurrence>,
    pub skippable: Option<bool>,
    pub critical: Option<bool>,
    pub active: Option<bool>,
    pub sort_order: Option<i64>,
}

impl HabitPatch {
    pub fn is_empty(&self) -> bool {
        self.label.is_none()
            && self.recurrence.is_none()
            && self.skippable.is_none()
            && self.critical.is_none()
            && self.active.is_none()
            && self.sort_order.is_none()
    }

    /// Trim the label and check every supplied field.
    ///
    /// # Errors
    /// Returns a validation error for an empty label or invalid recurrence.
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        if let Some(label) = &self.label {
            self.label = Some(validate_label(label)?);
        }
        if let Some(recurrence) = &self.recurrence {
            recurrence.validate()?;
        }
        Ok(self)
    }
}

fn validate_label(label: &str) -> Result<String, ValidationError> {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyLabel);
    }
    Ok(trimmed.to_string())
}

/// Derive a habit key from its label: lowercase ASCII alphanumerics, with
/// every other run of characters collapsed to one underscore.
///
/// # Errors
/// Returns `EmptyKey` if nothing alphanumeric remains.
pub fn derive_key(label: &str) -> Result<String, ValidationError> {
    let mut key = String::with_capacity(label.len());
    let mut pending_sep = false;
    for c in label.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_sep && !key.is_empty() {
                key.push('_');
            }
            pending_sep = false;
            key.push(c);
        } else {
            pending_sep = true;
        }
    }
    if key.is_empty() {
        return Err(ValidationError::EmptyKey(label.to_string()));
    }
    Ok(key)
}
