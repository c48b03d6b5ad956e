//! Calendar-day normalization for reminder dates
//!
//! Dates are entered as `dd/mm/yyyy` and compared at day granularity: both
//! the reminder date and "now" are truncated to local midnight before any
//! comparison, so the time of day a reminder was entered never matters.

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use std::fmt;
use thiserror::Error;

/// Milliseconds since the unix epoch
pub type Timestamp = i64;

pub const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

/// Why a display date was rejected
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    #[error("expected dd/mm/yyyy, got '{0}'")]
    Format(String),

    #[error("'{0}' is not a calendar date")]
    OutOfRange(String),
}

fn component(part: &str, max_len: usize, input: &str) -> Result<u32, DateError> {
    if part.is_empty() || part.len() > max_len || !part.chars().all(|c| c.is_ascii_digit()) {
        return Err(DateError::Format(input.to_string()));
    }
    part.parse()
        .map_err(|_| DateError::Format(input.to_string()))
}

/// Parse a `dd/mm/yyyy` display date
///
/// Whitespace around the string and around each component is ignored and
/// leading zeros are optional, so `" 7/1/2025"` and `"07/01/2025"` agree.
pub fn parse_display_date(input: &str) -> Result<NaiveDate, DateError> {
    let parts: Vec<&str> = input.trim().split('/').map(str::trim).collect();
    if parts.len() != 3 || parts[2].len() != 4 {
        return Err(DateError::Format(input.to_string()));
    }

    let day = component(parts[0], 2, input)?;
    let month = component(parts[1], 2, input)?;
    let year = component(parts[2], 4, input)? as i32;

    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| DateError::OutOfRange(input.to_string()))
}

/// Render a date the way it is entered and displayed
pub fn format_display_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// The first instant of `date` in the local time zone
///
/// Where a DST transition skips local midnight the day starts at the first
/// valid local time after it.
pub fn local_midnight(date: NaiveDate) -> DateTime<Local> {
    let midnight = NaiveDateTime::new(date, NaiveTime::default());
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .or_else(|| {
            Local
                .from_local_datetime(&(midnight + Duration::hours(1)))
                .earliest()
        })
        .unwrap_or_else(|| Local.from_utc_datetime(&midnight))
}

/// Normalize a display date to its local-midnight timestamp
pub fn normalize(input: &str) -> Result<Timestamp, DateError> {
    let date = parse_display_date(input)?;
    Ok(local_midnight(date).timestamp_millis())
}

/// "Today" normalized the same way as reminder dates
pub fn today_midnight(now: &DateTime<Local>) -> Timestamp {
    local_midnight(now.date_naive()).timestamp_millis()
}

fn local_date(ts: Timestamp) -> Option<NaiveDate> {
    Local
        .timestamp_millis_opt(ts)
        .earliest()
        .map(|dt| dt.date_naive())
}

/// Signed whole days from `today` to `target`, both normalized timestamps
///
/// Equal to `(target - today) / MILLIS_PER_DAY` truncated toward zero,
/// except that a 23h or 25h DST day in between still counts as one day.
pub fn day_difference(target: Timestamp, today: Timestamp) -> i64 {
    match (local_date(target), local_date(today)) {
        (Some(target), Some(today)) => (target - today).num_days(),
        _ => (target - today) / MILLIS_PER_DAY,
    }
}

/// True when `target` falls on today or later
pub fn is_upcoming(target: Timestamp, today: Timestamp) -> bool {
    target >= today
}

/// Signed distance of a reminder from today, in days
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayOffset {
    /// `n` days in the future
    Ahead(u64),
    Today,
    /// `n` days in the past
    Passed(u64),
}

impl DayOffset {
    pub fn from_days(diff: i64) -> Self {
        match diff {
            0 => DayOffset::Today,
            d if d > 0 => DayOffset::Ahead(d.unsigned_abs()),
            d => DayOffset::Passed(d.unsigned_abs()),
        }
    }

    pub fn between(target: Timestamp, today: Timestamp) -> Self {
        Self::from_days(day_difference(target, today))
    }

    /// Today counts as upcoming
    pub fn is_upcoming(&self) -> bool {
        !matches!(self, DayOffset::Passed(_))
    }
}

impl fmt::Display for DayOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DayOffset::Ahead(n) => write!(f, "H-{}", n),
            DayOffset::Today => f.write_str("Today"),
            DayOffset::Passed(n) => write!(f, "H+{} (Passed)", n),
        }
    }
}
