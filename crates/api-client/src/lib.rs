use crate::error::ApiError;
use core_types::{AppConfig, DayShifts, Employee, ShiftMap, WeekendPriority};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value as JsonValue};

pub mod error;
pub mod responses;

// --- Public API ---
pub use responses::{AddEmployeeResponse, ApiErrorResponse, HealthStatus, SaveResponse};

/// A typed client for the shift scheduling REST API.
///
/// Every method maps to one endpoint. Non-2xx answers become
/// `ApiError::Server`, carrying the server's own error message when it sent one.
#[derive(Debug, Clone)]
pub struct ShiftApiClient {
    client: reqwest::Client,
    api_url: String,
}

impl ShiftApiClient {
    /// Creates a client for the server at `base_url` (e.g. `http://localhost:3001`).
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = base_url.trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::InvalidData(format!(
                "base URL '{base_url}' must start with http:// or https://"
            )));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            api_url: format!("{base_url}/api"),
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.api_url, endpoint)
    }

    /// `/shifts/{date}` with the date percent-encoded as a single path segment.
    fn shift_day_url(&self, date: &str) -> Result<Url, ApiError> {
        let mut url = Url::parse(&self.api_url)
            .map_err(|e| ApiError::InvalidData(format!("invalid API URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| ApiError::InvalidData("API URL cannot take a path".to_string()))?
            .pop_if_empty()
            .push("shifts")
            .push(date);
        Ok(url)
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        self.call(endpoint, self.client.get(self.url(endpoint))).await
    }

    async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.call(endpoint, self.client.post(self.url(endpoint)).json(body))
            .await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let result: Result<T, ApiError> = async move {
            let response = request.send().await?;
            let status = response.status();
            let text = response.text().await?;

            if status.is_success() {
                serde_json::from_str::<T>(&text)
                    .map_err(|e| ApiError::Deserialization(e.to_string()))
            } else {
                Err(server_error(status, &text))
            }
        }
        .await;

        if let Err(e) = &result {
            tracing::error!(endpoint, error = %e, "API call failed.");
        }
        result
    }

    /// Fetches shifts, optionally bounded by inclusive `YYYY-MM-DD` dates.
    pub async fn get_shifts(
        &self,
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<ShiftMap, ApiError> {
        let mut query = Vec::new();
        if let Some(start) = start_date {
            query.push(("start_date", start));
        }
        if let Some(end) = end_date {
            query.push(("end_date", end));
        }
        let request = self.client.get(self.url("/shifts")).query(&query);
        self.call("/shifts", request).await
    }

    /// Replaces every shift of `date` with `shifts`.
    pub async fn save_shifts(&self, date: &str, shifts: &DayShifts) -> Result<SaveResponse, ApiError> {
        let request = self.client.post(self.shift_day_url(date)?).json(shifts);
        self.call("/shifts/:date", request).await
    }

    pub async fn get_employees(&self) -> Result<Vec<String>, ApiError> {
        self.get("/employees").await
    }

    pub async fn add_employee(&self, name: &str) -> Result<Employee, ApiError> {
        let response: AddEmployeeResponse =
            self.post("/employees", &json!({ "name": name })).await?;
        Ok(response.employee)
    }

    pub async fn get_configuration(&self) -> Result<AppConfig, ApiError> {
        self.get("/config").await
    }

    pub async fn save_configuration(&self, config: &AppConfig) -> Result<SaveResponse, ApiError> {
        self.post("/config", config).await
    }

    pub async fn get_weekend_priority(
        &self,
        month: u32,
        year: i32,
    ) -> Result<WeekendPriority, ApiError> {
        let request = self
            .client
            .get(self.url("/weekend-priority"))
            .query(&[("month", month.to_string()), ("year", year.to_string())]);
        self.call("/weekend-priority", request).await
    }

    pub async fn save_weekend_priority(
        &self,
        data: &JsonValue,
        month: u32,
        year: i32,
    ) -> Result<SaveResponse, ApiError> {
        let body = json!({ "data": data, "month": month, "year": year });
        self.post("/weekend-priority", &body).await
    }

    pub async fn health_check(&self) -> Result<HealthStatus, ApiError> {
        self.get("/health").await
    }

    /// Returns `true` if the server answered the health check.
    pub async fn test_connection(&self) -> bool {
        match self.health_check().await {
            Ok(health) => {
                tracing::info!(database = %health.database, "API connection successful.");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "API connection failed.");
                false
            }
        }
    }
}

/// Builds the error for a non-2xx response from its status and body text.
fn server_error(status: StatusCode, text: &str) -> ApiError {
    let message = serde_json::from_str::<ApiErrorResponse>(text)
        .ok()
        .and_then(|body| body.error)
        .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));
    ApiError::Server {
        status: status.as_u16(),
        message,
    }
}
