// vantage-config/src/lib.rs
// ============================================================================
// Module: Vantage Config Library
// Description: Environment-sourced application configuration.
// Purpose: Single source of truth for how the control plane is configured.
// Dependencies: vantage-core
// ============================================================================

//! ## Overview
//! `vantage-config` loads the process environment once at startup into an
//! [`AppConfig`], failing fast on missing mandatory variables and applying
//! safe defaults everywhere else (absent `CACHE_URL` selects the in-memory
//! cache; absent `CORS_ALLOWED_ORIGINS` disables cross-origin access).

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod app;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use app::AppConfig;
pub use app::CacheConfig;
pub use app::ConfigError;
pub use app::CorsConfig;
pub use app::DatabaseConfig;
pub use app::ModelProviderConfig;
pub use app::NotificationConfig;
pub use app::SENSITIVE_FIELDS;
