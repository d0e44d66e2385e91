use crate::{error::AppError, AppState};
use axum::{
    async_trait,
    extract::{FromRequestParts, OriginalUri, Path, Query, State},
    http::{request::Parts, HeaderMap, Method},
    Json,
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, Utc};
use core_types::{
    AppConfig, DateRange, DayShifts, Employee, MonthKey, ShiftMap, WeekendPriority,
};
use database::{DbError, ScheduleStore};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// How long the health check waits for the store before reporting it down.
/// Shorter than the pool acquire timeout.
pub const HEALTH_PING_TIMEOUT: Duration = Duration::from_secs(2);

/// Extracts the schedule store, rejecting with 503 when the server runs
/// without a database.
///
/// It is the first argument of every database-backed handler, so the
/// availability check happens before the body is even read.
pub struct Store(pub Arc<dyn ScheduleStore>);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for Store {
    type Rejection = AppError;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        state.store.clone().map(Store).ok_or(AppError::Unavailable)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
    pub message: String,
}

impl SuccessResponse {
    fn new(message: &str) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.to_string(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct AddEmployeeRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddEmployeeResponse {
    pub success: bool,
    pub employee: Employee,
}

#[derive(Debug, Deserialize)]
pub struct WeekendPriorityQuery {
    pub month: Option<String>,
    pub year: Option<String>,
}

/// A month or year as sent by the browser: a number, or a numeric string
/// taken straight from a form control.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum NumberOrText {
    Number(i64),
    Text(String),
}

impl fmt::Display for NumberOrText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NumberOrText::Number(n) => write!(f, "{n}"),
            NumberOrText::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SaveWeekendPriorityRequest {
    pub data: JsonValue,
    pub month: NumberOrText,
    pub year: NumberOrText,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: DateTime<Utc>,
    pub database: &'static str,
    pub environment: String,
}

#[derive(Debug, Serialize)]
pub struct EchoResponse {
    pub message: &'static str,
    pub timestamp: DateTime<Utc>,
    pub headers: BTreeMap<String, String>,
    pub url: String,
}

/// # GET /api/shifts?start_date&end_date
pub async fn get_shifts(
    Store(store): Store,
    WithRejection(Query(range), _): WithRejection<Query<DateRange>, AppError>,
) -> Result<Json<ShiftMap>, AppError> {
    let shifts = store
        .get_shifts(&range)
        .await
        .map_err(|e| AppError::store("Failed to fetch shifts", e))?;
    Ok(Json(shifts))
}

/// # POST /api/shifts/:date
/// Replaces every shift of the given day with the posted map.
pub async fn save_shifts(
    Store(store): Store,
    Path(date): Path<String>,
    WithRejection(Json(shifts), _): WithRejection<Json<DayShifts>, AppError>,
) -> Result<Json<SuccessResponse>, AppError> {
    store
        .save_shifts(&date, &shifts)
        .await
        .map_err(|e| AppError::store("Failed to save shifts", e))?;
    Ok(SuccessResponse::new("Shifts saved successfully"))
}

/// # GET /api/employees
pub async fn get_employees(Store(store): Store) -> Result<Json<Vec<String>>, AppError> {
    let employees = store
        .get_employees()
        .await
        .map_err(|e| AppError::store("Failed to fetch employees", e))?;
    Ok(Json(employees))
}

/// # POST /api/employees
pub async fn add_employee(
    Store(store): Store,
    WithRejection(Json(request), _): WithRejection<Json<AddEmployeeRequest>, AppError>,
) -> Result<Json<AddEmployeeResponse>, AppError> {
    let name = request.name.unwrap_or_default();
    let employee = store
        .add_employee(&name)
        .await
        .map_err(|e| AppError::store("Failed to add employee", e))?;
    tracing::info!(id = employee.id, name = %employee.name, "Employee added.");
    Ok(Json(AddEmployeeResponse {
        success: true,
        employee,
    }))
}

/// # GET /api/config
pub async fn get_configuration(Store(store): Store) -> Result<Json<AppConfig>, AppError> {
    let config = store.get_configuration().await.map_err(|e| match e {
        DbError::NotFound => AppError::NotFound("Configuration not found".to_string()),
        other => AppError::store("Failed to fetch configuration", other),
    })?;
    Ok(Json(config))
}

/// # POST /api/config
pub async fn save_configuration(
    Store(store): Store,
    WithRejection(Json(config), _): WithRejection<Json<AppConfig>, AppError>,
) -> Result<Json<SuccessResponse>, AppError> {
    store
        .save_configuration(&config)
        .await
        .map_err(|e| AppError::store("Failed to save configuration", e))?;
    Ok(SuccessResponse::new("Configuration saved successfully"))
}

/// # GET /api/weekend-priority?month&year
/// Months that were never saved answer with empty data, not 404.
pub async fn get_weekend_priority(
    Store(store): Store,
    WithRejection(Query(query), _): WithRejection<Query<WeekendPriorityQuery>, AppError>,
) -> Result<Json<WeekendPriority>, AppError> {
    let (Some(month), Some(year)) = (
        query.month.filter(|m| !m.trim().is_empty()),
        query.year.filter(|y| !y.trim().is_empty()),
    ) else {
        return Err(AppError::BadRequest("Month and year are required".to_string()));
    };
    let period =
        MonthKey::parse(&month, &year).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let snapshot = store
        .get_weekend_priority(period)
        .await
        .map_err(|e| AppError::store("Failed to fetch weekend priority", e))?;
    Ok(Json(snapshot))
}

/// # POST /api/weekend-priority
pub async fn save_weekend_priority(
    Store(store): Store,
    WithRejection(Json(request), _): WithRejection<Json<SaveWeekendPriorityRequest>, AppError>,
) -> Result<Json<SuccessResponse>, AppError> {
    let period = MonthKey::parse(&request.month.to_string(), &request.year.to_string())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    store
        .save_weekend_priority(period, &request.data)
        .await
        .map_err(|e| AppError::store("Failed to save weekend priority", e))?;
    Ok(SuccessResponse::new("Weekend priority data saved successfully"))
}

/// # GET /api/health
/// Always answers 200; the `database` field tells whether the store is usable.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let connected = match &state.store {
        Some(store) => match tokio::time::timeout(HEALTH_PING_TIMEOUT, store.ping()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Database ping failed.");
                false
            }
            Err(_) => {
                tracing::warn!(timeout = ?HEALTH_PING_TIMEOUT, "Database ping timed out.");
                false
            }
        },
        None => false,
    };

    Json(HealthResponse {
        status: "OK",
        timestamp: Utc::now(),
        database: if connected { "Connected" } else { "Not Available" },
        environment: state.environment.clone(),
    })
}

/// # GET /api/test
/// Echoes the request back for debugging proxies and CORS setups.
pub async fn echo(headers: HeaderMap, OriginalUri(uri): OriginalUri) -> Json<EchoResponse> {
    let headers = headers
        .iter()
        .map(|(name, value)| {
            (
                name.to_string(),
                String::from_utf8_lossy(value.as_bytes()).into_owned(),
            )
        })
        .collect();

    Json(EchoResponse {
        message: "API is working!",
        timestamp: Utc::now(),
        headers,
        url: uri.to_string(),
    })
}

/// Fallback for unmatched `/api/*` routes.
pub async fn api_not_found(method: Method, OriginalUri(uri): OriginalUri) -> AppError {
    AppError::RouteNotFound {
        method: method.to_string(),
        path: uri.to_string(),
    }
}

/// Fallback for everything else when no static directory is configured.
pub async fn not_found(OriginalUri(uri): OriginalUri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}
