// vantage-store/src/judgment_store.rs
// ============================================================================
// Module: JudgmentStore Implementation
// Description: Postgres-backed persistence for C8's nine-step procedure.
// Purpose: Give vantage-judgment a concrete store without it depending on sqlx.
// Dependencies: sqlx, vantage-judgment::ports, vantage-core
// ============================================================================

use async_trait::async_trait;
use serde_json::Value;
use time::OffsetDateTime;
use vantage_core::ActionRiskDefinition;
use vantage_core::CanaryAssignment;
use vantage_core::CanaryExecutionLog;
use vantage_core::Deployment;
use vantage_core::DeploymentId;
use vantage_core::DecisionMatrixEntry;
use vantage_core::Identifier;
use vantage_core::JudgmentExecution;
use vantage_core::RiskLevel;
use vantage_core::Ruleset;
use vantage_core::RulesetId;
use vantage_core::RulesetVersion;
use vantage_core::TenantId;
use vantage_core::TrustLevel;
use vantage_judgment::JudgmentStore;
use vantage_judgment::ports::GuardState;
use vantage_judgment::ports::StoreError;

use crate::error::decode_json;
use crate::pg_store::PgStore;

/// How many recent executions [`JudgmentStore::guard_state`] scans to
/// derive `consecutive_failures` and `seconds_since_last_auto_execute`.
const GUARD_STATE_LOOKBACK: i64 = 50;

fn risk_level_column(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => "low",
        RiskLevel::Medium => "medium",
        RiskLevel::High => "high",
        RiskLevel::Critical => "critical",
    }
}

#[async_trait]
impl JudgmentStore for PgStore {
    async fn ruleset(&self, ruleset_id: &RulesetId) -> Result<Ruleset, StoreError> {
        let row: (Value,) = sqlx::query_as("SELECT data FROM rulesets WHERE id = $1")
            .bind(ruleset_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(crate::error::SqlError::from)?
            .ok_or_else(|| crate::error::SqlError::NotFound(format!("ruleset {ruleset_id}")))?;
        Ok(decode_json::<Ruleset>("rulesets", row.0)?)
    }

    async fn ruleset_version(&self, ruleset_id: &RulesetId, version: u32) -> Result<RulesetVersion, StoreError> {
        let row: (Value,) = sqlx::query_as("SELECT data FROM ruleset_versions WHERE ruleset_id = $1 AND version = $2")
            .bind(ruleset_id.as_str())
            .bind(i64::from(version))
            .fetch_optional(&self.pool)
            .await
            .map_err(crate::error::SqlError::from)?
            .ok_or_else(|| crate::error::SqlError::NotFound(format!("ruleset_version {ruleset_id}/{version}")))?;
        Ok(decode_json::<RulesetVersion>("ruleset_versions", row.0)?)
    }

    async fn active_canary_deployment(&self, ruleset_id: &RulesetId) -> Result<Option<Deployment>, StoreError> {
        let row: Option<(Value,)> = sqlx::query_as("SELECT data FROM deployments WHERE ruleset_id = $1 AND status = 'canary' LIMIT 1")
            .bind(ruleset_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(crate::error::SqlError::from)?;
        row.map(|(data,)| decode_json::<Deployment>("deployments", data)).transpose().map_err(Into::into)
    }

    async fn canary_assignment(&self, deployment_id: &DeploymentId, identifier: &Identifier) -> Result<Option<CanaryAssignment>, StoreError> {
        let row: Option<(Value,)> = sqlx::query_as("SELECT data FROM canary_assignments WHERE deployment_id = $1 AND identifier = $2")
            .bind(deployment_id.as_str())
            .bind(identifier.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(crate::error::SqlError::from)?;
        row.map(|(data,)| decode_json::<CanaryAssignment>("canary_assignments", data)).transpose().map_err(Into::into)
    }

    async fn save_canary_assignment(&self, assignment: &CanaryAssignment) -> Result<(), StoreError> {
        let data = serde_json::to_value(assignment).map_err(|source| crate::error::SqlError::Decode { table: "canary_assignments", source })?;
        sqlx::query(
            "INSERT INTO canary_assignments (id, deployment_id, identifier, expires_at, data)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (id) DO UPDATE SET expires_at = EXCLUDED.expires_at, data = EXCLUDED.data",
        )
        .bind(assignment.id.as_str())
        .bind(assignment.deployment_id.as_str())
        .bind(assignment.identifier.as_str())
        .bind(assignment.expires_at)
        .bind(data)
        .execute(&self.pool)
        .await
        .map_err(crate::error::SqlError::from)?;
        Ok(())
    }

    async fn action_risk(&self, tenant_id: &TenantId, action_type: Option<&str>) -> Result<Option<ActionRiskDefinition>, StoreError> {
        if let Some(action_type) = action_type {
            let exact: Option<(Value,)> = sqlx::query_as("SELECT data FROM action_risk_definitions WHERE tenant_id = $1 AND action_type = $2")
                .bind(tenant_id.as_str())
                .bind(action_type)
                .fetch_optional(&self.pool)
                .await
                .map_err(crate::error::SqlError::from)?;
            if let Some((data,)) = exact {
                return Ok(Some(decode_json::<ActionRiskDefinition>("action_risk_definitions", data)?));
            }
        }
        let fallback: Option<(Value,)> =
            sqlx::query_as("SELECT data FROM action_risk_definitions WHERE tenant_id = $1 ORDER BY priority DESC LIMIT 1")
                .bind(tenant_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(crate::error::SqlError::from)?;
        fallback.map(|(data,)| decode_json::<ActionRiskDefinition>("action_risk_definitions", data)).transpose().map_err(Into::into)
    }

    async fn decision_matrix_entry(&self, tenant_id: &TenantId, trust_level: TrustLevel, risk_level: RiskLevel) -> Result<Option<DecisionMatrixEntry>, StoreError> {
        let row: Option<(Value,)> = sqlx::query_as(
            "SELECT data FROM decision_matrix WHERE tenant_id = $1 AND trust_level = $2 AND risk_level = $3",
        )
        .bind(tenant_id.as_str())
        .bind(i32::from(trust_level.as_u8()))
        .bind(risk_level_column(risk_level))
        .fetch_optional(&self.pool)
        .await
        .map_err(crate::error::SqlError::from)?;
        row.map(|(data,)| decode_json::<DecisionMatrixEntry>("decision_matrix", data)).transpose().map_err(Into::into)
    }

    async fn guard_state(&self, ruleset_id: &RulesetId) -> Result<GuardState, StoreError> {
        let rows: Vec<(Value, bool, OffsetDateTime)> = sqlx::query_as(
            "SELECT data, success, created_at FROM judgment_executions WHERE ruleset_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(ruleset_id.as_str())
        .bind(GUARD_STATE_LOOKBACK)
        .fetch_all(&self.pool)
        .await
        .map_err(crate::error::SqlError::from)?;

        let mut consecutive_failures = 0u32;
        for (_, success, _) in &rows {
            if *success {
                break;
            }
            consecutive_failures += 1;
        }

        let mut seconds_since_last_auto_execute = None;
        for (data, _, created_at) in &rows {
            let execution: JudgmentExecution = decode_json("judgment_executions", data.clone())?;
            if execution.auto_executed {
                let elapsed = OffsetDateTime::now_utc() - *created_at;
                seconds_since_last_auto_execute = Some(elapsed.whole_seconds().max(0).unsigned_abs());
                break;
            }
        }

        Ok(GuardState { consecutive_failures, seconds_since_last_auto_execute })
    }

    async fn append_execution(&self, execution: &JudgmentExecution) -> Result<(), StoreError> {
        let data = serde_json::to_value(execution).map_err(|source| crate::error::SqlError::Decode { table: "judgment_executions", source })?;
        sqlx::query("INSERT INTO judgment_executions (id, tenant_id, ruleset_id, success, created_at, data) VALUES ($1, $2, $3, $4, $5, $6)")
            .bind(execution.id.as_str())
            .bind(execution.tenant_id.as_str())
            .bind(execution.ruleset_id.as_str())
            .bind(execution.success)
            .bind(execution.created_at)
            .bind(data)
            .execute(&self.pool)
            .await
            .map_err(crate::error::SqlError::from)?;
        Ok(())
    }

    async fn append_canary_log(&self, log: &CanaryExecutionLog) -> Result<(), StoreError> {
        let data = serde_json::to_value(log).map_err(|source| crate::error::SqlError::Decode { table: "canary_execution_logs", source })?;
        sqlx::query(
            "INSERT INTO canary_execution_logs
                 (id, deployment_id, execution_id, canary_version, success, needs_reprocess, reprocessed_at, created_at, data)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(log.id.as_str())
        .bind(log.deployment_id.as_str())
        .bind(log.execution_id.as_str())
        .bind(format!("{:?}", log.canary_version).to_lowercase())
        .bind(log.success)
        .bind(log.needs_reprocess)
        .bind(log.reprocessed_at)
        .bind(log.created_at)
        .bind(data)
        .execute(&self.pool)
        .await
        .map_err(crate::error::SqlError::from)?;
        Ok(())
    }

    async fn record_execution_counters(&self, ruleset_id: &RulesetId) -> Result<(), StoreError> {
        let row: (Value,) = sqlx::query_as("SELECT data FROM rulesets WHERE id = $1")
            .bind(ruleset_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(crate::error::SqlError::from)?
            .ok_or_else(|| crate::error::SqlError::NotFound(format!("ruleset {ruleset_id}")))?;
        let mut ruleset: Ruleset = decode_json("rulesets", row.0)?;
        ruleset.execution_count += 1;
        ruleset.last_execution_at = Some(OffsetDateTime::now_utc());
        let data = serde_json::to_value(&ruleset).map_err(|source| crate::error::SqlError::Decode { table: "rulesets", source })?;
        sqlx::query("UPDATE rulesets SET data = $1 WHERE id = $2")
            .bind(data)
            .bind(ruleset_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(crate::error::SqlError::from)?;
        Ok(())
    }
}
