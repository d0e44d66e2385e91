use crate::error::DbError;
use configuration::Settings;
use core_types::{AppConfig, APP_CONFIG_KEY, DEFAULT_ROSTER};
use sqlx::types::Json;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

/// Creates the connection pool to the PostgreSQL database.
///
/// The pool is lazy: no connection is opened until the first query, so the
/// server can start (and report the database as unavailable) while the
/// database is still coming up. Fails only if `DATABASE_URL` is unset or
/// cannot be parsed.
pub fn connect(settings: &Settings) -> Result<PgPool, DbError> {
    let database_url = settings
        .database_url()
        .ok_or_else(|| DbError::ConnectionConfigError("DATABASE_URL must be set.".to_string()))?;

    let pool = PgPoolOptions::new()
        .max_connections(settings.db_max_connections)
        .acquire_timeout(Duration::from_secs(settings.db_acquire_timeout_secs))
        .connect_lazy(database_url)?;

    Ok(pool)
}

/// Applies the embedded schema migrations. Safe to run on every start.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Inserts the default roster and configuration document.
///
/// Existing rows are left untouched, so a configuration saved from the UI
/// survives restarts.
pub async fn seed_defaults(pool: &PgPool) -> Result<(), DbError> {
    let mut tx = pool.begin().await?;

    for name in DEFAULT_ROSTER {
        sqlx::query("INSERT INTO employees (name) VALUES ($1) ON CONFLICT (name) DO NOTHING")
            .bind(name)
            .execute(&mut *tx)
            .await?;
    }

    sqlx::query(
        "INSERT INTO configuration (key_name, value) VALUES ($1, $2) ON CONFLICT (key_name) DO NOTHING",
    )
    .bind(APP_CONFIG_KEY)
    .bind(Json(AppConfig::default()))
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(())
}

/// Bootstraps the database: creates any missing tables, then seeds defaults.
pub async fn initialize_database(pool: &PgPool) -> Result<(), DbError> {
    run_migrations(pool).await?;
    seed_defaults(pool).await?;
    tracing::info!("Database initialized.");
    Ok(())
}
