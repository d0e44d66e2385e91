use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use database::DbError;
use serde_json::json;
use std::any::Any;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    /// A store call failed; `context` is the message shown to the client
    /// when the failure is not the client's fault.
    #[error("{context}: {source}")]
    Store {
        context: &'static str,
        #[source]
        source: DbError,
    },
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("Database service unavailable")]
    Unavailable,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("API endpoint not found: {method} {path}")]
    RouteNotFound { method: String, path: String },
    #[error("Invalid JSON body: {0}")]
    Json(#[from] JsonRejection),
    #[error("Invalid query string: {0}")]
    Query(#[from] QueryRejection),
}

impl AppError {
    pub fn store(context: &'static str, source: DbError) -> Self {
        AppError::Store { context, source }
    }
}

/// Converts our custom `AppError` into an HTTP response.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::Store { context, source } => match source {
                DbError::Duplicate(_) => (
                    StatusCode::BAD_REQUEST,
                    json!({ "error": "Employee already exists" }),
                ),
                DbError::Invalid(invalid) => (
                    StatusCode::BAD_REQUEST,
                    json!({ "error": invalid.to_string() }),
                ),
                DbError::NotFound => (
                    StatusCode::NOT_FOUND,
                    json!({ "error": DbError::NotFound.to_string() }),
                ),
                other => {
                    tracing::error!(error = ?other, "{context}.");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        json!({ "error": context }),
                    )
                }
            },
            AppError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            AppError::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                json!({
                    "error": "Database service unavailable",
                    "message": "Please check your database configuration",
                }),
            ),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, json!({ "error": message })),
            AppError::RouteNotFound { method, path } => {
                tracing::info!(%method, %path, "API route not found.");
                (
                    StatusCode::NOT_FOUND,
                    json!({
                        "error": "API endpoint not found",
                        "path": path,
                        "method": method,
                    }),
                )
            }
            AppError::Json(rejection) => {
                let status = match rejection {
                    JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
                        StatusCode::BAD_REQUEST
                    }
                    ref other => other.status(),
                };
                (status, json!({ "error": rejection.body_text() }))
            }
            AppError::Query(rejection) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": rejection.body_text() }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Turns a panic inside a handler into a structured 500 response.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else {
        "Unknown panic".to_string()
    };

    tracing::error!(panic = %message, "Handler panicked.");

    let body = Json(json!({
        "error": "Internal server error",
        "message": message,
        "timestamp": Utc::now().to_rfc3339(),
    }));
    (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
}
