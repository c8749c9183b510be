//! Civil calendar in one fixed timezone.
//!
//! Every instant crossing the core boundary is resolved to a civil date and
//! weekday here before any comparison. Weekdays are numbered 0 = Sunday
//! through 6 = Saturday, matching the stored recurrence sets.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::error::{ConfigError, ValidationError};

/// Date format used in the store and at every external boundary.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Timezone used when the configuration does not name one.
pub const DEFAULT_TIMEZONE: &str = "America/Toronto";

/// Resolves instants to civil dates in a named IANA timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CivilCalendar {
    tz: Tz,
}

impl CivilCalendar {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Build a calendar from an IANA name such as `"America/Toronto"`.
    ///
    /// # Errors
    /// Returns `ConfigError::InvalidValue` if the name is not a known zone.
    pub fn from_name(name: &str) -> Result<Self, ConfigError> {
        let tz = name
            .parse::<Tz>()
            .map_err(|e| ConfigError::InvalidValue {
                key: "timezone".into(),
                message: e.to_string(),
            })?;
        Ok(Self { tz })
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// Civil date of `instant` in this calendar's timezone.
    pub fn civil_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    /// Civil weekday of `instant`, 0 = Sunday.
    pub fn civil_weekday(&self, instant: DateTime<Utc>) -> u8 {
        weekday_of(self.civil_date(instant))
    }

    pub fn today(&self) -> NaiveDate {
        self.civil_date(Utc::now())
    }
}

impl Default for CivilCalendar {
    fn default() -> Self {
        Self {
            tz: chrono_tz::America::Toronto,
        }
    }
}

/// Weekday index of a civil date, 0 = Sunday.
pub fn weekday_of(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a `YYYY-MM-DD` date string.
///
/// # Errors
/// Returns `ValidationError::InvalidDate` when the string is not a valid date.
pub fn parse_date(s: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDate(s.to_string()))
}
