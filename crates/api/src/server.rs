// vantage-api/src/server.rs
// ============================================================================
// Module: HTTP Server
// Description: Router assembly, middleware, and the serve() entry point.
// Purpose: Wire every route module onto one axum::Router and bind it.
// Dependencies: axum, tower-http, vantage-config
// ============================================================================

//! ## Overview
//! Grounded on the teacher's `server.rs` `serve_http`/`serve_sse` split: bind
//! a `TcpListener`, build the router, call `axum::serve`. There is no TLS
//! path here — the teacher's mTLS/`axum-server` setup was built for an
//! MCP transport between a gateway and a tool host; this control plane
//! sits behind the caller's own TLS-terminating ingress, matching
//! `spec.md`'s external-interfaces section, which never mentions
//! certificate loading.

use std::net::AddrParseError;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use axum::routing::patch;
use axum::routing::post;
use axum::routing::put;
use thiserror::Error;
use tower_http::cors::AllowOrigin;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::routes;
use crate::state::AppState;

/// Errors that can occur while starting the HTTP server.
#[derive(Debug, Error)]
pub enum ServeError {
    /// The configured bind address could not be parsed.
    #[error("invalid bind address: {0}")]
    InvalidAddress(#[from] AddrParseError),
    /// The listener could not be bound.
    #[error("failed to bind {0}: {1}")]
    Bind(SocketAddr, #[source] std::io::Error),
    /// `axum::serve` itself failed.
    #[error("http server failed: {0}")]
    Serve(#[source] std::io::Error),
}

/// Builds the full application router over `state`.
#[must_use]
pub fn router(state: Arc<AppState>) -> Router {
    let cors = build_cors(&state.config.cors);

    let judgment_routes = Router::new()
        .route("/judgment/execute", post(routes::judgment::execute))
        .route("/judgment/replay/{execution_id}", get(routes::judgment::replay))
        .route("/judgment/replay/batch", post(routes::judgment::replay_batch))
        .route("/judgment/what-if/{execution_id}", post(routes::judgment::what_if));

    let deployment_routes = Router::new()
        .route("/deployments", post(routes::deployment::create))
        .route("/deployments/{deployment_id}/start-canary", post(routes::deployment::start_canary))
        .route("/deployments/{deployment_id}/traffic", put(routes::deployment::set_traffic))
        .route("/deployments/{deployment_id}/promote", post(routes::deployment::promote))
        .route("/deployments/{deployment_id}/rollback", post(routes::deployment::rollback))
        .route("/deployments/{deployment_id}/metrics", get(routes::deployment::metrics))
        .route("/deployments/{deployment_id}/health", get(routes::deployment::health));

    let ruleset_routes = Router::new()
        .route("/rulesets", get(routes::rulesets::list).post(routes::rulesets::create))
        .route("/rulesets/validate", post(routes::rulesets::validate))
        .route("/rulesets/{ruleset_id}", get(routes::rulesets::get).patch(routes::rulesets::patch).delete(routes::rulesets::delete))
        .route("/rulesets/{ruleset_id}/versions", post(routes::rulesets::create_version))
        .route("/rulesets/{ruleset_id}/execute", post(routes::rulesets::execute));

    let trust_routes = Router::new()
        .route("/trust/rules/{ruleset_id}", get(routes::trust::get).post(routes::trust::set))
        .route("/trust/rules/{ruleset_id}/calculate", post(routes::trust::calculate))
        .route("/trust/rules/{ruleset_id}/level", patch(routes::trust::set_level))
        .route("/trust/rules/{ruleset_id}/history", get(routes::trust::history))
        .route("/trust/evaluate/batch", post(routes::trust::evaluate_batch));

    let chat_routes =
        Router::new().route("/agents/chat", post(routes::chat::chat)).route("/agents/chat/stream", post(routes::chat::chat_stream));

    let flag_routes = Router::new()
        .route("/feature-flags/{feature}", get(routes::flags::status))
        .route("/feature-flags/{feature}/global", patch(routes::flags::set_global))
        .route("/feature-flags/{feature}/tenant", patch(routes::flags::set_tenant))
        .route("/feature-flags/{feature}/rollout", patch(routes::flags::set_rollout));

    let health_routes =
        Router::new().route("/health/live", get(routes::health::liveness)).route("/health/ready", get(routes::health::readiness));

    Router::new()
        .merge(judgment_routes)
        .merge(deployment_routes)
        .merge(ruleset_routes)
        .merge(trust_routes)
        .merge(chat_routes)
        .merge(flag_routes)
        .merge(health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn build_cors(config: &vantage_config::CorsConfig) -> CorsLayer {
    if config.allowed_origins.is_empty() {
        return CorsLayer::new();
    }
    let origins: Vec<_> = config.allowed_origins.iter().filter_map(|origin| origin.parse().ok()).collect();
    CorsLayer::new().allow_origin(AllowOrigin::list(origins)).allow_methods(tower_http::cors::Any).allow_headers(tower_http::cors::Any)
}

/// Binds `addr` and serves the application router until the process exits.
///
/// # Errors
///
/// Returns [`ServeError`] if the address is invalid, the listener cannot be
/// bound, or `axum::serve` itself fails.
pub async fn serve(state: Arc<AppState>, addr: &str) -> Result<(), ServeError> {
    let socket_addr: SocketAddr = addr.parse()?;
    let listener = tokio::net::TcpListener::bind(socket_addr).await.map_err(|error| ServeError::Bind(socket_addr, error))?;
    tracing::info!(%socket_addr, "vantage-api listening");
    let app = router(state);
    axum::serve(listener, app).await.map_err(ServeError::Serve)
}
