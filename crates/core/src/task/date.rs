//! Calendar-day handling for task rows
//!
//! Task dates travel as `YYYY-MM-DD` strings. Anything else coming from the UI
//! or from old rows is coerced to a real day instead of failing.

use chrono::{Datelike, Days, NaiveDate};
use tracing::warn;

use crate::{Error, Result};

/// Storage format of the `date` column
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Render a day the way the backend stores it
pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Coerce a raw date string into a calendar day.
///
/// A bare day-of-month resolves inside `today`'s month. Unparseable input
/// falls back to `today` with a warning.
pub fn normalize_date(raw: &str, today: NaiveDate) -> NaiveDate {
    let trimmed = raw.trim();

    if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
        return date;
    }

    let is_day_number =
        (1..=2).contains(&trimmed.len()) && trimmed.bytes().all(|b| b.is_ascii_digit());
    if is_day_number {
        if let Some(date) = trimmed
            .parse::<u32>()
            .ok()
            .and_then(|day| today.with_day(day))
        {
            return date;
        }
    }

    warn!(raw = %raw, today = %today, "Invalid task date, using today");
    today
}

/// Inclusive range of calendar days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// Create a window, rejecting a start after the end
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(Error::InvalidInput(format!(
                "Window start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    /// The calendar month containing `day`
    pub fn month_of(day: NaiveDate) -> Self {
        let start = day.with_day(1).unwrap_or(day);
        let end = start
            .checked_add_months(chrono::Months::new(1))
            .and_then(|next| next.pred_opt())
            .unwrap_or(day);
        Self { start, end }
    }

    /// The seven days before `today`, plus today
    pub fn last_week(today: NaiveDate) -> Self {
        let start = today.checked_sub_days(Days::new(7)).unwrap_or(today);
        Self { start, end: today }
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.start <= day && day <= self.end
    }
}
