use crate::error::ConfigError;
use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// The runtime settings of the server process.
///
/// Field names double as environment variable names (`database_url` is read
/// from `DATABASE_URL`, `port` from `PORT`, and so on).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// PostgreSQL connection string. When absent, database-backed endpoints answer 503.
    pub database_url: Option<String>,
    /// The interface to bind the HTTP listener on.
    pub host: String,
    pub port: u16,
    /// `*` or a comma-separated list of allowed browser origins.
    pub cors_origin: Option<String>,
    /// Reported by the health endpoint (e.g. "development", "production").
    /// Falls back to `NODE_ENV`, then to "development".
    #[serde(default)]
    pub environment: String,
    /// The environment name used by older deployments.
    #[serde(default)]
    node_env: Option<String>,
    /// Directory holding the browser client, served for all non-API paths.
    pub static_dir: Option<PathBuf>,
    pub db_max_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// When set, logs are also written to a daily-rolling file in this directory.
    pub log_dir: Option<PathBuf>,
}

const DEFAULT_ENVIRONMENT: &str = "development";

/// Which browser origins may call the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    Exact(Vec<String>),
}

impl Settings {
    /// The connection string, treating an empty value as unset.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip: IpAddr = self.host.parse().map_err(|_| {
            ConfigError::ValidationError(format!("HOST '{}' is not an IP address", self.host))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn cors_origins(&self) -> CorsOrigins {
        let Some(raw) = self.cors_origin.as_deref() else {
            return CorsOrigins::Any;
        };
        let origins: Vec<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();
        if origins.is_empty() || origins.iter().any(|origin| origin == "*") {
            CorsOrigins::Any
        } else {
            CorsOrigins::Exact(origins)
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.db_max_connections == 0 {
            return Err(ConfigError::ValidationError(
                "DB_MAX_CONNECTIONS must be at least 1".to_string(),
            ));
        }
        if self.db_acquire_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "DB_ACQUIRE_TIMEOUT_SECS must be at least 1".to_string(),
            ));
        }
        self.socket_addr()?;
        Ok(())
    }
}

/// Builds the settings from defaults, an optional file, and the environment.
///
/// `env` replaces the process environment as the source of variables; tests
/// use it to avoid touching global state.
pub(crate) fn build(
    file: Option<&str>,
    env: Option<config::Map<String, String>>,
) -> Result<Settings, ConfigError> {
    let mut builder = config::Config::builder()
        .set_default("host", "0.0.0.0")?
        .set_default("port", 3001)?
        .set_default("db_max_connections", 10)?
        .set_default("db_acquire_timeout_secs", 5)?;

    if let Some(name) = file {
        builder = builder.add_source(config::File::with_name(name).required(false));
    }

    let mut settings = builder
        .add_source(config::Environment::default().try_parsing(true).source(env))
        .build()?
        .try_deserialize::<Settings>()?;

    if settings.environment.trim().is_empty() {
        settings.environment = settings
            .node_env
            .take()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string());
    }

    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn from_env(pairs: &[(&str, &str)]) -> Result<Settings, ConfigError> {
        let env = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<config::Map<String, String>>();
        build(None, Some(env))
    }

    #[test]
    fn defaults_apply_without_environment() {
        let settings = from_env(&[]).unwrap();
        assert_eq!(settings.port, 3001);
        assert_eq!(settings.environment, "development");
        assert_eq!(settings.database_url(), None);
        assert_eq!(settings.cors_origins(), CorsOrigins::Any);
        assert_eq!(settings.socket_addr().unwrap().to_string(), "0.0.0.0:3001");
    }

    #[test]
    fn environment_overrides_defaults() {
        let settings = from_env(&[
            ("DATABASE_URL", "postgres://localhost/shifts"),
            ("PORT", "8080"),
            ("ENVIRONMENT", "production"),
            ("STATIC_DIR", "public"),
        ])
        .unwrap();

        assert_eq!(settings.database_url(), Some("postgres://localhost/shifts"));
        assert_eq!(settings.port, 8080);
        assert_eq!(settings.environment, "production");
        assert_eq!(settings.static_dir, Some(PathBuf::from("public")));
    }

    #[test]
    fn node_env_is_a_fallback_for_environment() {
        let settings = from_env(&[("NODE_ENV", "production")]).unwrap();
        assert_eq!(settings.environment, "production");

        let settings = from_env(&[("NODE_ENV", "production"), ("ENVIRONMENT", "staging")]).unwrap();
        assert_eq!(settings.environment, "staging");
    }

    #[test]
    fn blank_database_url_counts_as_missing() {
        let settings = from_env(&[("DATABASE_URL", "  ")]).unwrap();
        assert_eq!(settings.database_url(), None);
    }

    #[test]
    fn cors_origin_list_is_split() {
        let settings = from_env(&[(
            "CORS_ORIGIN",
            "https://a.example, https://b.example",
        )])
        .unwrap();
        assert_eq!(
            settings.cors_origins(),
            CorsOrigins::Exact(vec![
                "https://a.example".to_string(),
                "https://b.example".to_string()
            ])
        );

        let wildcard = from_env(&[("CORS_ORIGIN", "*")]).unwrap();
        assert_eq!(wildcard.cors_origins(), CorsOrigins::Any);
    }

    #[test]
    fn zero_pool_size_is_rejected() {
        let result = from_env(&[("DB_MAX_CONNECTIONS", "0")]);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn non_numeric_port_is_a_load_error() {
        let result = from_env(&[("PORT", "eighty")]);
        assert!(matches!(result, Err(ConfigError::LoadError(_))));
    }
}
