//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `STOREFRONT_BASE_URL` - Public URL for the storefront
//! - `BACKEND_API_URL` - Base URL of the backend REST API (e.g. `https://api.example.dz/api/`)
//!
//! ## Optional
//! - `STOREFRONT_HOST` - Bind address (default: 127.0.0.1)
//! - `STOREFRONT_PORT` - Listen port (default: 3000)
//! - `STORE_NAME` - Shop name shown in the header (default: Boiler Parts)
//! - `STORE_PHONE` - Phone number shown in the header and footer
//! - `BACKEND_TIMEOUT_SECS` - Backend request timeout (default: 15)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `LOG_FORMAT` - `json` for JSON logs, anything else for text

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use boilerparts_api::ApiConfig;
use thiserror::Error;
use url::Url;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Shop identity shown on every page
    pub store: StoreInfo,
    /// Backend REST API
    pub backend: BackendConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Emit JSON logs instead of text
    pub json_logs: bool,
}

/// Shop identity.
#[derive(Debug, Clone)]
pub struct StoreInfo {
    pub name: String,
    pub phone: Option<String>,
}

/// Backend REST API settings.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub api_url: Url,
    pub timeout: Duration,
}

impl BackendConfig {
    /// Client configuration for [`boilerparts_api::ApiClient`].
    #[must_use]
    pub fn api_config(&self) -> ApiConfig {
        ApiConfig::new(self.api_url.clone()).with_timeout(self.timeout)
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let env = Env(&lookup);

        let host = env
            .get_or_default("STOREFRONT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_HOST".to_string(), e.to_string())
            })?;
        let port = env
            .get_or_default("STOREFRONT_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("STOREFRONT_PORT".to_string(), e.to_string())
            })?;
        let base_url = env.required("STOREFRONT_BASE_URL")?;

        let store = StoreInfo {
            name: env.get_or_default("STORE_NAME", "Boiler Parts"),
            phone: env.optional("STORE_PHONE"),
        };

        Ok(Self {
            host,
            port,
            base_url,
            store,
            backend: backend_from_env(&env)?,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            json_logs: env
                .optional("LOG_FORMAT")
                .is_some_and(|format| format.eq_ignore_ascii_case("json")),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether the site is served over HTTPS (secure cookies).
    #[must_use]
    pub fn is_secure(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

fn backend_from_env(env: &Env<'_>) -> Result<BackendConfig, ConfigError> {
    let api_url = Url::parse(&env.required("BACKEND_API_URL")?).map_err(|e| {
        ConfigError::InvalidEnvVar("BACKEND_API_URL".to_string(), e.to_string())
    })?;
    let timeout_secs = env
        .get_or_default("BACKEND_TIMEOUT_SECS", "15")
        .parse::<u64>()
        .map_err(|e| {
            ConfigError::InvalidEnvVar("BACKEND_TIMEOUT_SECS".to_string(), e.to_string())
        })?;

    Ok(BackendConfig {
        api_url,
        timeout: Duration::from_secs(timeout_secs),
    })
}

// =============================================================================
// Helper Functions
// =============================================================================

struct Env<'a>(&'a dyn Fn(&str) -> Option<String>);

impl Env<'_> {
    /// Get a required variable. Blank values count as missing.
    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    /// Get an optional variable.
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|value| !value.trim().is_empty())
    }

    /// Get a variable with a default value.
    fn get_or_default(&self, key: &str, default: &str) -> String {
        self.optional(key).unwrap_or_else(|| default.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<StorefrontConfig, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        StorefrontConfig::from_lookup(|key| vars.get(key).cloned())
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("STOREFRONT_BASE_URL", "http://localhost:3000"),
        ("BACKEND_API_URL", "http://localhost:8000/api/"),
    ];

    #[test]
    fn test_defaults() {
        let config = load(&REQUIRED).unwrap();
        assert_eq!(config.port, 3000);
        assert_eq!(config.socket_addr().to_string(), "127.0.0.1:3000");
        assert_eq!(config.store.name, "Boiler Parts");
        assert_eq!(config.backend.timeout, Duration::from_secs(15));
        assert!(!config.json_logs);
        assert!(!config.is_secure());
    }

    #[test]
    fn test_missing_backend_url() {
        let err = load(&[("STOREFRONT_BASE_URL", "http://localhost:3000")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(key) if key == "BACKEND_API_URL"));
    }

    #[test]
    fn test_invalid_port() {
        let mut vars = REQUIRED.to_vec();
        vars.push(("STOREFRONT_PORT", "eighty"));
        assert!(matches!(
            load(&vars).unwrap_err(),
            ConfigError::InvalidEnvVar(key, _) if key == "STOREFRONT_PORT"
        ));
    }

    #[test]
    fn test_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([
            ("STORE_NAME", "Pièces Chaudières"),
            ("STORE_PHONE", "0550 12 34 56"),
            ("BACKEND_TIMEOUT_SECS", "5"),
            ("LOG_FORMAT", "JSON"),
        ]);
        let config = load(&vars).unwrap();
        assert_eq!(config.store.name, "Pièces Chaudières");
        assert_eq!(config.store.phone.as_deref(), Some("0550 12 34 56"));
        assert_eq!(config.backend.timeout, Duration::from_secs(5));
        assert!(config.json_logs);
    }

    #[test]
    fn test_api_config_gets_trailing_slash() {
        let config = load(&[
            ("STOREFRONT_BASE_URL", "http://localhost:3000"),
            ("BACKEND_API_URL", "http://localhost:8000/api"),
        ])
        .unwrap();
        assert_eq!(
            config.backend.api_config().base_url.as_str(),
            "http://localhost:8000/api/"
        );
    }
}
