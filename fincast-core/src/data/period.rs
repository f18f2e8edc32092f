//! Lookback period parsing and trading-day end-date resolution.
//!
//! Periods are strings like `15y`, `6m`, `30d`: digits followed by a unit
//! letter (case-insensitive). Anything else is a parse error, never a
//! silent default.

use chrono::{Datelike, Duration, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Malformed or unrepresentable lookback period.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PeriodError {
    #[error("empty period string")]
    Empty,
    #[error("period must be digits followed by 'y', 'm', or 'd' (e.g. '15y', '6m', '30d'), got '{0}'")]
    Malformed(String),
    #[error("period magnitude must be at least 1")]
    ZeroMagnitude,
    #[error("period '{0}' reaches outside the representable date range")]
    OutOfRange(String),
}

/// Unit of a lookback period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PeriodUnit {
    Years,
    Months,
    Days,
}

/// A parsed lookback period: signed magnitude back from an end date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lookback {
    pub magnitude: u32,
    pub unit: PeriodUnit,
}

impl FromStr for Lookback {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PeriodError::Empty);
        }
        let (digits, unit_char) = s.split_at(s.len() - 1);
        let unit = match unit_char.chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('y') => PeriodUnit::Years,
            Some('m') => PeriodUnit::Months,
            Some('d') => PeriodUnit::Days,
            _ => return Err(PeriodError::Malformed(s.to_string())),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PeriodError::Malformed(s.to_string()));
        }
        let magnitude: u32 = digits
            .parse()
            .map_err(|_| PeriodError::Malformed(s.to_string()))?;
        if magnitude == 0 {
            return Err(PeriodError::ZeroMagnitude);
        }
        Ok(Lookback { magnitude, unit })
    }
}

impl Lookback {
    /// The start date of the window ending at `end`.
    ///
    /// Years and months use calendar month arithmetic (clamping to the last
    /// day of shorter months); days are exact.
    pub fn start_from(&self, end: NaiveDate) -> Result<NaiveDate, PeriodError> {
        let out_of_range = || PeriodError::OutOfRange(format!("{}{:?}", self.magnitude, self.unit));
        match self.unit {
            PeriodUnit::Years => end
                .checked_sub_months(Months::new(12 * self.magnitude))
                .ok_or_else(out_of_range),
            PeriodUnit::Months => end
                .checked_sub_months(Months::new(self.magnitude))
                .ok_or_else(out_of_range),
            PeriodUnit::Days => end
                .checked_sub_signed(Duration::days(i64::from(self.magnitude)))
                .ok_or_else(out_of_range),
        }
    }
}

/// Roll a date back to the most recent weekday.
///
/// Saturday rolls back one day, Sunday two, targeting the last plausible
/// trading session. Weekdays pass through unchanged; exchange holidays are
/// not modeled — the provider simply returns no bar for those.
pub fn last_weekday(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date - Duration::days(1),
        Weekday::Sun => date - Duration::days(2),
        _ => date,
    }
}
