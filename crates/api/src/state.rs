// vantage-api/src/state.rs
// ============================================================================
// Module: Application State
// Description: The one shared handle every handler is injected with.
// Purpose: Bundle store, cache, config, and component collaborators.
// Dependencies: vantage-config, vantage-store, vantage-cache, vantage-providers
// ============================================================================

//! ## Overview
//! One `Arc<AppState>` per process, built once in `main` and cloned into
//! every handler via axum's `State` extractor — the same state-bundling
//! pattern the teacher's `crates/api/src/server.rs` uses for its
//! `ServerState`. C2 (script evaluator) and C3 (LLM gateway) are external
//! systems per spec.md's component list; `AppState` holds them behind their
//! trait objects so a real HTTP-backed implementation can be substituted
//! without touching a single handler.

use std::sync::Arc;

use vantage_cache::Cache;
use vantage_config::AppConfig;
use vantage_intent::PatternRegistry;
use vantage_providers::evaluator::ScriptEvaluator;
use vantage_providers::gateway::ModelGateway;
use vantage_store::PgStore;

use crate::auth::TokenTable;

/// Everything a handler needs, injected once at startup.
pub struct AppState {
    /// Resolved application configuration.
    pub config: AppConfig,
    /// The Postgres-backed store, implementing every persistence port.
    pub store: PgStore,
    /// The cache backend (Redis-backed or in-memory, per `config.cache`).
    pub cache: Arc<dyn Cache>,
    /// C4's compiled rule patterns.
    pub intent_patterns: PatternRegistry,
    /// C3: the external LLM gateway used by classification, judgment, and
    /// general-passthrough routing.
    pub model_gateway: Arc<dyn ModelGateway>,
    /// C2: the external script evaluator used by the judgment engine.
    pub script_evaluator: Arc<dyn ScriptEvaluator>,
    /// Provisioned bearer credentials.
    pub tokens: TokenTable,
}
