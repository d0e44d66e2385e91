//! # Shiftboard Core Types
//!
//! The shared vocabulary of the workspace: shift entries, the employee roster,
//! the application configuration document, and weekend-priority snapshots.
//!
//! Every layer (persistence, HTTP, client) speaks in these types, so a
//! malformed payload is rejected at the boundary where it is deserialized
//! instead of surfacing later as a query failure.

pub mod app_config;
pub mod employee;
pub mod error;
pub mod shift;
pub mod weekend;

// Re-export the core types to provide a clean public API.
pub use app_config::{AppConfig, Prizes, StarRate, APP_CONFIG_KEY};
pub use employee::{normalize_employee_name, Employee, DEFAULT_ROSTER};
pub use error::CoreError;
pub use shift::{
    validate_shift_date, validate_shift_id, DateRange, DayShifts, ShiftEntry, ShiftMap,
};
pub use weekend::{MonthKey, WeekendPriority};
