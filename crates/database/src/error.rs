use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database connection is not configured: {0}")]
    ConnectionConfigError(String),

    #[error("Database operation failed: {0}")]
    ConnectionError(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("An error occurred during JSON serialization/deserialization: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] CoreError),

    #[error("Employee already exists: {0}")]
    Duplicate(String),

    #[error("The requested data was not found in the database.")]
    NotFound,
}
