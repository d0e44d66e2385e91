use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Width of the `employees.name` column.
pub const MAX_EMPLOYEE_NAME_LEN: usize = 100;

/// The roster seeded into an empty database.
pub const DEFAULT_ROSTER: [&str; 8] = [
    "Bhargav", "Pranav", "Guru", "Kalyan", "Nawaz", "Nithin", "Vishrut", "Vishnu",
];

/// A row of the `employees` table as returned to API callers.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Employee {
    pub id: i32,
    pub name: String,
}

/// Trims a submitted employee name and rejects names that are empty or too long.
///
/// Names are otherwise kept exactly as typed; uniqueness is case-sensitive.
pub fn normalize_employee_name(raw: &str) -> Result<String, CoreError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(CoreError::invalid("name", "Employee name is required"));
    }
    if name.chars().count() > MAX_EMPLOYEE_NAME_LEN {
        return Err(CoreError::invalid(
            "name",
            format!("Employee name must be at most {MAX_EMPLOYEE_NAME_LEN} characters"),
        ));
    }
    Ok(name.to_string())
}
