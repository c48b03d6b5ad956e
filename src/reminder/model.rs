//! The reminder entity as stored per user

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::date::{normalize, today_midnight, DateError, DayOffset, Timestamp};

/// A medical-appointment reminder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    /// Assigned by the document store on creation
    #[serde(default, skip_serializing)]
    pub id: String,

    /// Display name ("Checkup")
    #[serde(default)]
    pub name: String,

    /// Display date as entered, `dd/mm/yyyy`
    #[serde(default)]
    pub date: String,

    /// Local midnight of `date`; `None` when the stored value is missing or unset
    #[serde(default, deserialize_with = "deserialize_timestamp")]
    pub date_timestamp: Option<Timestamp>,

    /// Provider or doctor name
    #[serde(default)]
    pub doctor: String,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default)]
    pub is_completed: bool,
}

/// Older documents carry `0` (or nothing) where the timestamp failed to parse
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<Timestamp>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .filter(|ts| *ts != 0),
        _ => None,
    })
}

impl Reminder {
    /// Build a not-yet-stored reminder, normalizing its date
    pub fn new(
        name: &str,
        date: &str,
        doctor: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DateError> {
        let date_timestamp = normalize(date)?;
        Ok(Self {
            id: String::new(),
            name: name.to_string(),
            date: date.trim().to_string(),
            date_timestamp: Some(date_timestamp),
            doctor: doctor.to_string(),
            created_at,
            is_completed: false,
        })
    }

    /// Day offset relative to `now`, `None` without a timestamp
    pub fn days_until(&self, now: &DateTime<Local>) -> Option<DayOffset> {
        self.date_timestamp
            .map(|ts| DayOffset::between(ts, today_midnight(now)))
    }

    /// `"H-7"`, `"Today"`, `"H+2 (Passed)"`, or empty without a timestamp
    pub fn days_until_label(&self, now: &DateTime<Local>) -> String {
        self.days_until(now)
            .map(|offset| offset.to_string())
            .unwrap_or_default()
    }

    /// Dated today or later; a reminder without a timestamp is never upcoming
    pub fn is_upcoming(&self, now: &DateTime<Local>) -> bool {
        self.date_timestamp
            .map(|ts| ts >= today_midnight(now))
            .unwrap_or(false)
    }

    /// Candidate for the nearest-reminder slot
    pub fn is_pending(&self, now: &DateTime<Local>) -> bool {
        !self.is_completed && self.is_upcoming(now)
    }
}
