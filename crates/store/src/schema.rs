// vantage-store/src/schema.rs
// ============================================================================
// Module: Schema
// Description: Idempotent DDL for every table the four ports need.
// Purpose: Let PgStore::connect bring a fresh database up to the current
//          shape without a separate migration runner.
// Dependencies: sqlx
// ============================================================================

//! ## Overview
//! Every table follows the same shape: a handful of indexed columns for the
//! predicates each port's queries actually filter or sort on, plus one
//! `data JSONB` column holding the full canonical domain value. This
//! generalizes the teacher's own snapshot-store idiom (store.rs's
//! `run_state_versions` table: shallow SQL columns for lookup, one opaque
//! serialized payload for the value) from a single table to all ten.

use sqlx::PgPool;

use crate::error::SqlError;

const DDL: &str = r"
CREATE TABLE IF NOT EXISTS rulesets (
    id TEXT PRIMARY KEY,
    tenant_id TEXT NOT NULL,
    name TEXT NOT NULL,
    last_trust_eval_execution_count BIGINT NOT NULL DEFAULT 0,
    last_trust_eval_feedback_count BIGINT NOT NULL DEFAULT 0,
    data JSONB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_rulesets_tenant ON rulesets (tenant_id);

CREATE TABLE IF NOT EXISTS ruleset_versions (
    ruleset_id TEXT NOT NULL,
    version INTEGER NOT NULL,
    data JSONB NOT NULL,
    PRIMARY KEY (ruleset_id, version)
);

CREATE TABLE IF NOT EXISTS deployments (
    id TEXT PRIMARY KEY,
    ruleset_id TEXT NOT NULL,
    tenant_id TEXT NOT NULL,
    status TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    data JSONB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_deployments_ruleset_status ON deployments (ruleset_id, status);

CREATE TABLE IF NOT EXISTS canary_assignments (
    id TEXT PRIMARY KEY,
    deployment_id TEXT NOT NULL,
    identifier TEXT NOT NULL,
    expires_at TIMESTAMPTZ,
    data JSONB NOT NULL
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_canary_assignments_lookup ON canary_assignments (deployment_id, identifier);
CREATE INDEX IF NOT EXISTS idx_canary_assignments_expiry ON canary_assignments (expires_at);

CREATE TABLE IF NOT EXISTS canary_execution_logs (
    id TEXT PRIMARY KEY,
    deployment_id TEXT NOT NULL,
    execution_id TEXT NOT NULL,
    canary_version TEXT NOT NULL,
    success BOOLEAN NOT NULL,
    needs_reprocess BOOLEAN NOT NULL DEFAULT FALSE,
    reprocessed_at TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL,
    data JSONB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_canary_logs_deployment_version ON canary_execution_logs (deployment_id, canary_version, created_at);
CREATE INDEX IF NOT EXISTS idx_canary_logs_reprocess ON canary_execution_logs (deployment_id, needs_reprocess, reprocessed_at);

CREATE TABLE IF NOT EXISTS judgment_executions (
    id TEXT PRIMARY KEY,
    tenant_id TEXT NOT NULL,
    ruleset_id TEXT NOT NULL,
    success BOOLEAN NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    data JSONB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_judgment_executions_ruleset ON judgment_executions (ruleset_id, created_at DESC);

CREATE TABLE IF NOT EXISTS trust_level_history (
    id TEXT PRIMARY KEY,
    ruleset_id TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    data JSONB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_trust_history_ruleset ON trust_level_history (ruleset_id, created_at DESC);

CREATE TABLE IF NOT EXISTS deployment_metrics (
    id TEXT PRIMARY KEY,
    deployment_id TEXT NOT NULL,
    version_type TEXT NOT NULL,
    window_end TIMESTAMPTZ NOT NULL,
    data JSONB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_deployment_metrics_lookup ON deployment_metrics (deployment_id, version_type, window_end DESC);

CREATE TABLE IF NOT EXISTS action_risk_definitions (
    tenant_id TEXT NOT NULL,
    action_type TEXT NOT NULL,
    priority INTEGER NOT NULL DEFAULT 0,
    data JSONB NOT NULL,
    PRIMARY KEY (tenant_id, action_type)
);

CREATE TABLE IF NOT EXISTS decision_matrix (
    tenant_id TEXT NOT NULL,
    trust_level INTEGER NOT NULL,
    risk_level TEXT NOT NULL,
    data JSONB NOT NULL,
    PRIMARY KEY (tenant_id, trust_level, risk_level)
);

CREATE TABLE IF NOT EXISTS audit_log (
    id BIGSERIAL PRIMARY KEY,
    tenant_id TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    data JSONB NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_audit_log_tenant ON audit_log (tenant_id, created_at DESC);
";

/// Runs the full DDL against `pool`. Idempotent: safe to call on every
/// process start, including against an already-initialized database.
pub(crate) async fn ensure_schema(pool: &PgPool) -> Result<(), SqlError> {
    sqlx::raw_sql(DDL).execute(pool).await?;
    Ok(())
}
