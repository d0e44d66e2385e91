use crate::error::CoreError;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Width of the `shifts.shift_id` column.
pub const MAX_SHIFT_ID_LEN: usize = 20;

/// All shifts of a single day, keyed by shift identifier (e.g. "morning").
pub type DayShifts = BTreeMap<String, ShiftEntry>;

/// The grouped result of a shift query: `date → shift id → entry`.
pub type ShiftMap = BTreeMap<String, DayShifts>;

/// The staffing record of one shift on one day.
///
/// Every field falls back to its empty value when it is missing or `null` in
/// the incoming JSON, so older clients that omit a map still round-trip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ShiftEntry {
    #[serde(deserialize_with = "null_as_default")]
    pub employees: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub reason: String,
    /// Star rating earned per employee.
    #[serde(deserialize_with = "null_as_default")]
    pub stars: BTreeMap<String, u32>,
    /// Employees that arrived late.
    #[serde(deserialize_with = "null_as_default")]
    pub late: BTreeMap<String, bool>,
    /// Scheduled employee → the person who covered for them.
    #[serde(deserialize_with = "null_as_default")]
    pub replacements: BTreeMap<String, String>,
    #[serde(deserialize_with = "null_as_default")]
    pub management_issue: bool,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// An optional, inclusive range over date keys.
///
/// Bounds are compared as plain strings, exactly like the `date_key` column,
/// so a malformed bound simply narrows or widens the result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct DateRange {
    #[serde(rename = "start_date")]
    pub start: Option<String>,
    #[serde(rename = "end_date")]
    pub end: Option<String>,
}

impl DateRange {
    pub fn new(start: Option<String>, end: Option<String>) -> Self {
        Self { start, end }
    }

    /// Returns `true` if `date_key` lies inside both (optional) bounds.
    pub fn contains(&self, date_key: &str) -> bool {
        let after_start = self.start.as_deref().is_none_or(|start| date_key >= start);
        let before_end = self.end.as_deref().is_none_or(|end| date_key <= end);
        after_start && before_end
    }
}

/// Checks that a date key written by a save is an ISO `YYYY-MM-DD` date.
pub fn validate_shift_date(date: &str) -> Result<(), CoreError> {
    if date.len() != 10 || NaiveDate::parse_from_str(date, "%Y-%m-%d").is_err() {
        return Err(CoreError::invalid(
            "date",
            format!("'{date}' is not a YYYY-MM-DD date"),
        ));
    }
    Ok(())
}

pub fn validate_shift_id(shift_id: &str) -> Result<(), CoreError> {
    if shift_id.trim().is_empty() {
        return Err(CoreError::invalid("shift id", "must not be empty"));
    }
    if shift_id.chars().count() > MAX_SHIFT_ID_LEN {
        return Err(CoreError::invalid(
            "shift id",
            format!("'{shift_id}' is longer than {MAX_SHIFT_ID_LEN} characters"),
        ));
    }
    Ok(())
}
