// vantage-api/src/main.rs
// ============================================================================
// Module: Process Entry Point
// Description: Loads config, builds AppState, and serves the HTTP surface.
// Purpose: The one binary this crate ships.
// Dependencies: tokio, tracing-subscriber, vantage-config, vantage-store
// ============================================================================

//! ## Overview
//! Startup order mirrors the teacher's CLI bootstrap: install the tracing
//! subscriber first (so config/connect failures are still logged), load
//! [`vantage_config::AppConfig`], connect the store, wire the cache and
//! provider fakes, provision bearer tokens, then serve. C2/C3 have no
//! production implementation in this repo (`spec.md` scopes them as
//! external systems) — [`vantage_providers::evaluator::EchoEvaluator`] and
//! [`vantage_providers::gateway::FakeModelGateway`] stand in at the seam a
//! real adapter would fill.

use std::env;
use std::sync::Arc;

use vantage_api::AppState;
use vantage_api::TokenTable;
use vantage_api::auth::Principal;
use vantage_cache::memory::InMemoryCache;
use vantage_config::AppConfig;
use vantage_core::TenantId;
use vantage_core::UserId;
use vantage_intent::PatternRegistry;
use vantage_providers::evaluator::EchoEvaluator;
use vantage_providers::gateway::FakeModelGateway;
use vantage_store::PgStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env()?;
    tracing_subscriber::fmt().with_env_filter(config.log_filter.as_str()).json().init();

    let store = PgStore::connect(&config.database).await?;
    let cache: Arc<dyn vantage_cache::Cache> = Arc::new(InMemoryCache::new());
    let tokens = provision_tokens()?;

    let state = Arc::new(AppState {
        config: config.clone(),
        store,
        cache,
        intent_patterns: PatternRegistry::new(),
        model_gateway: Arc::new(FakeModelGateway { output: serde_json::json!({}), confidence: 0.5 }),
        script_evaluator: Arc::new(EchoEvaluator::new(0.8)),
        tokens,
    });

    let bind = env::var("VANTAGE_API_BIND").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    vantage_api::serve(state, &bind).await?;
    Ok(())
}

/// Parses `VANTAGE_API_TOKENS` (`token:user_id:tenant_id:role[,...]`) into a
/// [`TokenTable`]. Absent entirely, the table is empty and every request is
/// rejected — the safe default for a freshly deployed instance.
fn provision_tokens() -> Result<TokenTable, Box<dyn std::error::Error>> {
    let mut table = TokenTable::new();
    let Ok(raw) = env::var("VANTAGE_API_TOKENS") else {
        return Ok(table);
    };
    for entry in raw.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
        let mut parts = entry.splitn(4, ':');
        let (Some(token), Some(user_id), Some(tenant_id), Some(role_name)) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(format!("malformed VANTAGE_API_TOKENS entry: {entry}").into());
        };
        let role = vantage_access::Role::from_name(role_name).ok_or_else(|| format!("unknown role in token entry: {role_name}"))?;
        table.insert(token, Principal { user_id: UserId::new(user_id), tenant_id: TenantId::new(tenant_id), role });
    }
    Ok(table)
}
