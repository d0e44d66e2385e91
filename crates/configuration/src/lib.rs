use crate::error::ConfigError;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use settings::{CorsOrigins, Settings};

/// The optional settings file looked up in the working directory (`shiftboard.toml`).
pub const DEFAULT_CONFIG_FILE: &str = "shiftboard";

/// Loads the application settings.
///
/// Sources are layered from lowest to highest precedence: built-in defaults,
/// the optional `shiftboard.toml`, then the process environment (`DATABASE_URL`,
/// `PORT`, `CORS_ORIGIN`, ...). Call `dotenvy::dotenv()` first to pick up a `.env`.
pub fn load_settings() -> Result<Settings, ConfigError> {
    settings::build(Some(DEFAULT_CONFIG_FILE), None)
}
