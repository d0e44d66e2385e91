use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// A calendar month, the key of a weekend-priority snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self, CoreError> {
        if !(1..=12).contains(&month) {
            return Err(CoreError::invalid(
                "month",
                format!("{month} is not between 1 and 12"),
            ));
        }
        if !(1..=9999).contains(&year) {
            return Err(CoreError::invalid("year", format!("{year} is out of range")));
        }
        Ok(Self { year, month })
    }

    /// Parses the raw `month` and `year` query parameters.
    pub fn parse(month: &str, year: &str) -> Result<Self, CoreError> {
        let month = month
            .trim()
            .parse::<u32>()
            .map_err(|_| CoreError::invalid("month", format!("'{month}' is not a number")))?;
        let year = year
            .trim()
            .parse::<i32>()
            .map_err(|_| CoreError::invalid("year", format!("'{year}' is not a number")))?;
        Self::new(year, month)
    }
}

/// A per-month snapshot of precomputed weekend scheduling preferences.
///
/// The `data` payload is opaque to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekendPriority {
    pub data: JsonValue,
    pub month: u32,
    pub year: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calculated_at: Option<DateTime<Utc>>,
}

impl WeekendPriority {
    /// The answer for a month that has never been saved.
    pub fn empty(period: MonthKey) -> Self {
        Self {
            data: JsonValue::Array(Vec::new()),
            month: period.month,
            year: period.year,
            calculated_at: None,
        }
    }

    pub fn period(&self) -> MonthKey {
        MonthKey {
            year: self.year,
            month: self.month,
        }
    }
}
