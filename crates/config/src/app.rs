// vantage-config/src/app.rs
// ============================================================================
// Module: Application Configuration
// Description: Environment-sourced configuration for the control plane.
// Purpose: One validated config object built once at process startup.
// Dependencies: vantage-core, std::env
// ============================================================================

//! ## Overview
//! Configuration is environment-first: mandatory variables fail startup
//! immediately with a descriptive error, optional variables fall back to
//! safe defaults (most notably, the absence of a cache URL selects the
//! in-memory cache backend rather than failing).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::env;
use std::time::Duration;

use thiserror::Error;

/// The set of connection-config field names that must be encrypted at rest.
pub const SENSITIVE_FIELDS: &[&str] = &[
    "password",
    "api_key",
    "secret",
    "token",
    "access_token",
    "refresh_token",
    "client_secret",
    "private_key",
    "ssh_key",
];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised while loading configuration from the environment.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A mandatory environment variable was absent or empty.
    #[error("missing required environment variable: {0}")]
    Missing(&'static str),
    /// A present environment variable could not be parsed.
    #[error("invalid value for {name}: {reason}")]
    Invalid {
        /// The offending variable's name.
        name: &'static str,
        /// Why parsing failed.
        reason: String,
    },
}

// ============================================================================
// SECTION: Config Sections
// ============================================================================

/// Database connection configuration.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// The connection URL (Postgres or SQLite, matching the store backend).
    pub url: String,
    /// Maximum pool size, defaulting to 10.
    pub max_connections: u32,
    /// Per-query timeout, defaulting to 30 seconds per the concurrency model.
    pub query_timeout: Duration,
}

/// Cache connection configuration. Absence of `CACHE_URL` selects the
/// in-memory cache backend rather than failing startup.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// The backing store URL, or `None` to use the in-memory backend.
    pub url: Option<String>,
    /// Per-call timeout, defaulting to 100ms per the concurrency model.
    pub timeout: Duration,
}

/// Model-provider credentials for the external LLM gateway (C3).
#[derive(Debug, Clone, Default)]
pub struct ModelProviderConfig {
    /// API key for the configured model provider, if any.
    pub api_key: Option<String>,
    /// Base URL override for the model provider, if any.
    pub base_url: Option<String>,
    /// Per-call timeout, defaulting to 30 seconds per the concurrency model.
    pub timeout: Duration,
}

/// Outbound notification configuration (deployment/trust transition alerts).
#[derive(Debug, Clone, Default)]
pub struct NotificationConfig {
    /// Webhook URLs to post operator notifications to.
    pub webhook_urls: Vec<String>,
}

/// CORS configuration for the HTTP surface.
#[derive(Debug, Clone, Default)]
pub struct CorsConfig {
    /// Allowed origins; empty means no cross-origin access is permitted.
    pub allowed_origins: BTreeSet<String>,
}

// ============================================================================
// SECTION: Application Config
// ============================================================================

/// The fully resolved application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Database connection settings. Mandatory.
    pub database: DatabaseConfig,
    /// The symmetric encryption key used for sensitive connection-config
    /// fields, decoded from `VANTAGE_ENCRYPTION_KEY`. Mandatory.
    pub encryption_key: Vec<u8>,
    /// Cache connection settings. Optional; defaults to in-memory.
    pub cache: CacheConfig,
    /// Model provider credentials. Optional.
    pub model_provider: ModelProviderConfig,
    /// Notification webhook settings. Optional.
    pub notifications: NotificationConfig,
    /// CORS allow-list. Optional.
    pub cors: CorsConfig,
    /// `RUST_LOG`-style filter directive for the tracing subscriber.
    pub log_filter: String,
}

impl AppConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Missing`] when `DATABASE_URL` or
    /// `VANTAGE_ENCRYPTION_KEY` are absent, and [`ConfigError::Invalid`] when
    /// a present variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = required_var("DATABASE_URL")?;
        let encryption_key = decode_hex(required_var("VANTAGE_ENCRYPTION_KEY")?, "VANTAGE_ENCRYPTION_KEY")?;

        let database = DatabaseConfig {
            url: database_url,
            max_connections: optional_u32("DATABASE_MAX_CONNECTIONS", 10)?,
            query_timeout: Duration::from_secs(optional_u64("DATABASE_QUERY_TIMEOUT_SECS", 30)?),
        };

        let cache = CacheConfig {
            url: optional_var("CACHE_URL"),
            timeout: Duration::from_millis(optional_u64("CACHE_TIMEOUT_MS", 100)?),
        };

        let model_provider = ModelProviderConfig {
            api_key: optional_var("MODEL_PROVIDER_API_KEY"),
            base_url: optional_var("MODEL_PROVIDER_BASE_URL"),
            timeout: Duration::from_secs(optional_u64("MODEL_PROVIDER_TIMEOUT_SECS", 30)?),
        };

        let notifications = NotificationConfig {
            webhook_urls: optional_var("NOTIFICATION_WEBHOOK_URLS")
                .map(|raw| split_csv(&raw))
                .unwrap_or_default(),
        };

        let cors = CorsConfig {
            allowed_origins: optional_var("CORS_ALLOWED_ORIGINS")
                .map(|raw| split_csv(&raw).into_iter().collect())
                .unwrap_or_default(),
        };

        let log_filter = optional_var("RUST_LOG").unwrap_or_else(|| "info".to_string());

        if cache.url.is_none() {
            tracing::info!("CACHE_URL not set, using in-memory cache backend");
        }

        Ok(Self {
            database,
            encryption_key,
            cache,
            model_provider,
            notifications,
            cors,
            log_filter,
        })
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn required_var(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::Missing(name)),
    }
}

fn optional_var(name: &'static str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

fn optional_u32(name: &'static str, default: u32) -> Result<u32, ConfigError> {
    match optional_var(name) {
        Some(raw) => raw.parse().map_err(|err| ConfigError::Invalid {
            name,
            reason: format!("{err}"),
        }),
        None => Ok(default),
    }
}

fn optional_u64(name: &'static str, default: u64) -> Result<u64, ConfigError> {
    match optional_var(name) {
        Some(raw) => raw.parse().map_err(|err| ConfigError::Invalid {
            name,
            reason: format!("{err}"),
        }),
        None => Ok(default),
    }
}

fn split_csv(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

fn decode_hex(raw: String, name: &'static str) -> Result<Vec<u8>, ConfigError> {
    if raw.len() % 2 != 0 {
        return Err(ConfigError::Invalid {
            name,
            reason: "hex-encoded key must have an even length".to_string(),
        });
    }
    (0..raw.len())
        .step_by(2)
        .map(|index| {
            u8::from_str_radix(&raw[index..index + 2], 16).map_err(|err| ConfigError::Invalid {
                name,
                reason: format!("{err}"),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn clear_env() {
        for key in [
            "DATABASE_URL",
            "VANTAGE_ENCRYPTION_KEY",
            "CACHE_URL",
            "DATABASE_MAX_CONNECTIONS",
            "CORS_ALLOWED_ORIGINS",
        ] {
            unsafe { env::remove_var(key) };
        }
    }

    #[test]
    fn missing_database_url_is_an_error() {
        let _guard = ENV_LOCK.lock().expect("lock poisoned");
        clear_env();
        unsafe { env::set_var("VANTAGE_ENCRYPTION_KEY", "00112233") };
        let err = AppConfig::from_env().expect_err("should fail without DATABASE_URL");
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
        clear_env();
    }

    #[test]
    fn absent_cache_url_selects_in_memory_default() {
        let _guard = ENV_LOCK.lock().expect("lock poisoned");
        clear_env();
        unsafe {
            env::set_var("DATABASE_URL", "postgres://localhost/vantage");
            env::set_var("VANTAGE_ENCRYPTION_KEY", "00112233445566778899aabbccddeeff");
        }
        let config = AppConfig::from_env().expect("config should load");
        assert!(config.cache.url.is_none());
        clear_env();
    }

    #[test]
    fn odd_length_hex_key_is_invalid() {
        let _guard = ENV_LOCK.lock().expect("lock poisoned");
        clear_env();
        unsafe {
            env::set_var("DATABASE_URL", "postgres://localhost/vantage");
            env::set_var("VANTAGE_ENCRYPTION_KEY", "abc");
        }
        let err = AppConfig::from_env().expect_err("odd-length hex should fail");
        assert!(matches!(err, ConfigError::Invalid { .. }));
        clear_env();
    }
}
