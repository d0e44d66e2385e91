use crate::error::DbError;
use async_trait::async_trait;
use core_types::{
    validate_shift_date, validate_shift_id, AppConfig, DateRange, DayShifts, Employee, MonthKey,
    ShiftMap, WeekendPriority,
};
use serde_json::Value as JsonValue;

/// The storage contract of the scheduling backend.
///
/// This trait is what the web server holds on to, allowing the underlying
/// implementation (PostgreSQL or in-memory) to be swapped out.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    /// Fetches every shift inside `range`, grouped by date and shift id.
    async fn get_shifts(&self, range: &DateRange) -> Result<ShiftMap, DbError>;

    /// Replaces all shifts stored for `date` with `shifts`.
    ///
    /// Either every row of the day is replaced or nothing changes.
    async fn save_shifts(&self, date: &str, shifts: &DayShifts) -> Result<(), DbError>;

    /// Returns all employee names in lexicographic (byte) order.
    async fn get_employees(&self) -> Result<Vec<String>, DbError>;

    /// Adds an employee. The name is trimmed first; an existing name yields
    /// `DbError::Duplicate` and leaves the roster unchanged.
    async fn add_employee(&self, name: &str) -> Result<Employee, DbError>;

    /// Fetches the live configuration document, or `DbError::NotFound`.
    async fn get_configuration(&self) -> Result<AppConfig, DbError>;

    async fn save_configuration(&self, config: &AppConfig) -> Result<(), DbError>;

    /// Fetches the snapshot for `period`, or an empty one if none was saved.
    async fn get_weekend_priority(&self, period: MonthKey) -> Result<WeekendPriority, DbError>;

    /// Stores `data` as the snapshot for `period`, stamping the calculation time.
    async fn save_weekend_priority(
        &self,
        period: MonthKey,
        data: &JsonValue,
    ) -> Result<WeekendPriority, DbError>;

    /// Verifies the backend can serve queries.
    async fn ping(&self) -> Result<(), DbError>;

    /// Releases backend resources during shutdown.
    async fn close(&self) {}
}

/// Validates the keys of a day before any of it is written.
pub(crate) fn validate_day(date: &str, shifts: &DayShifts) -> Result<(), DbError> {
    validate_shift_date(date)?;
    for shift_id in shifts.keys() {
        validate_shift_id(shift_id)?;
    }
    Ok(())
}
