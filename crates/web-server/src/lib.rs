use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use configuration::{CorsOrigins, Settings};
use database::{DbRepository, ScheduleStore};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// Largest accepted JSON body. A month of shifts is a few kilobytes.
const BODY_LIMIT_BYTES: usize = 1024 * 1024;

/// The shared application state that all handlers can access.
pub struct AppState {
    /// `None` when no database is configured; database-backed routes then answer 503.
    pub store: Option<Arc<dyn ScheduleStore>>,
    /// Reported by the health endpoint.
    pub environment: String,
}

impl AppState {
    pub fn new(store: Option<Arc<dyn ScheduleStore>>, environment: impl Into<String>) -> Self {
        Self {
            store,
            environment: environment.into(),
        }
    }
}

/// Builds the application router.
///
/// API routes live under `/api`; unmatched API paths answer with a JSON 404.
/// Every other path is served from `static_dir` when one is given.
pub fn build_router(state: Arc<AppState>, static_dir: Option<PathBuf>) -> Router {
    // Each method router shares the API fallback, so a known path called with
    // the wrong method gets the same JSON 404 as an unknown path.
    let not_found = handlers::api_not_found;
    let api = Router::new()
        .route("/health", get(handlers::health).fallback(not_found))
        .route("/test", get(handlers::echo).fallback(not_found))
        .route("/shifts", get(handlers::get_shifts).fallback(not_found))
        .route("/shifts/:date", post(handlers::save_shifts).fallback(not_found))
        .route(
            "/employees",
            get(handlers::get_employees)
                .post(handlers::add_employee)
                .fallback(not_found),
        )
        .route(
            "/config",
            get(handlers::get_configuration)
                .post(handlers::save_configuration)
                .fallback(not_found),
        )
        .route(
            "/weekend-priority",
            get(handlers::get_weekend_priority)
                .post(handlers::save_weekend_priority)
                .fallback(not_found),
        )
        .fallback(not_found);

    let router = Router::new().nest("/api", api);
    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir)),
        None => router.fallback(handlers::not_found),
    };

    router
        .with_state(state)
        .layer(CatchPanicLayer::custom(error::handle_panic))
        // This middleware will automatically log information about every incoming request.
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
}

/// Translates the configured origins into a CORS layer.
///
/// Credentials are only allowed for an explicit origin list; browsers refuse
/// credentialed responses with a wildcard origin.
pub fn cors_layer(origins: &CorsOrigins) -> anyhow::Result<CorsLayer> {
    let layer = match origins {
        CorsOrigins::Any => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        CorsOrigins::Exact(list) => {
            let values = list
                .iter()
                .map(|origin| {
                    HeaderValue::from_str(origin)
                        .with_context(|| format!("Invalid CORS origin '{origin}'"))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(values))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::ACCEPT, header::AUTHORIZATION])
                .allow_credentials(true)
        }
    };
    Ok(layer)
}

/// Opens the PostgreSQL store, or returns `None` to run without a database.
///
/// A missing `DATABASE_URL` is not fatal. A failed bootstrap is logged and the
/// store is still returned, so the health check reports the outage.
pub async fn open_store(settings: &Settings) -> Option<Arc<dyn ScheduleStore>> {
    if settings.database_url().is_none() {
        tracing::warn!("DATABASE_URL is not set; database features are disabled.");
        return None;
    }

    let pool = match database::connect(settings) {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!(error = %e, "Failed to create the database pool.");
            return None;
        }
    };

    if let Err(e) = database::initialize_database(&pool).await {
        tracing::error!(error = %e, "Failed to initialize the database.");
    }

    Some(Arc::new(DbRepository::new(pool)))
}

/// The main function to configure and run the web server.
pub async fn run_server(settings: &Settings) -> anyhow::Result<()> {
    tracing::info!(environment = %settings.environment, "Starting shift scheduling server.");

    let store = open_store(settings).await;
    let state = Arc::new(AppState::new(store.clone(), settings.environment.clone()));

    let app = build_router(state, settings.static_dir.clone())
        .layer(cors_layer(&settings.cors_origins())?);

    let addr = settings.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    tracing::info!("Web server listening on http://{}", addr);
    if store.is_none() {
        tracing::warn!("Database service not available - check your configuration.");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutting down gracefully...");
    if let Some(store) = store {
        store.close().await;
    }
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C.");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM.");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
