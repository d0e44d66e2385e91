use chrono::{DateTime, Utc};
use core_types::Employee;
use serde::Deserialize;

/// The acknowledgement returned by every save endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SaveResponse {
    pub success: bool,
    pub message: String,
}

/// The response from a successful `POST /api/employees` request.
#[derive(Debug, Clone, Deserialize)]
pub struct AddEmployeeResponse {
    pub success: bool,
    pub employee: Employee,
}

/// The response from `GET /api/health`.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub database: String,
    pub environment: String,
}

impl HealthStatus {
    pub fn database_connected(&self) -> bool {
        self.database == "Connected"
    }
}

/// Represents an error response from the scheduling API.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    pub error: Option<String>,
}
