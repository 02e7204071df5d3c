// vantage-store/src/deployment_store.rs
// ============================================================================
// Module: DeploymentStore Implementation
// Description: Postgres-backed persistence for C12's state machine.
// Purpose: Give vantage-deployment a concrete store without it depending on sqlx.
// Dependencies: sqlx, vantage-deployment::ports, vantage-core
// ============================================================================

use async_trait::async_trait;
use serde_json::Value;
use time::OffsetDateTime;
use vantage_core::CanaryExecutionLog;
use vantage_core::CanaryLogId;
use vantage_core::Deployment;
use vantage_core::DeploymentId;
use vantage_core::ExecutionId;
use vantage_core::JudgmentExecution;
use vantage_core::RulesetId;
use vantage_core::TrustHistory;
use vantage_deployment::DeploymentStore;
use vantage_deployment::ports::DeploymentNotification;
use vantage_deployment::ports::StoreError;

use crate::error::decode_json;
use crate::pg_store::PgStore;

fn status_column(deployment: &Deployment) -> &'static str {
    match deployment.status {
        vantage_core::DeploymentStatus::Draft => "draft",
        vantage_core::DeploymentStatus::Canary => "canary",
        vantage_core::DeploymentStatus::Active => "active",
        vantage_core::DeploymentStatus::Deprecated => "deprecated",
        vantage_core::DeploymentStatus::RolledBack => "rolled_back",
    }
}

#[async_trait]
impl DeploymentStore for PgStore {
    async fn deployment(&self, deployment_id: &DeploymentId) -> Result<Deployment, StoreError> {
        let row: (Value,) = sqlx::query_as("SELECT data FROM deployments WHERE id = $1")
            .bind(deployment_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(crate::error::SqlError::from)?
            .ok_or_else(|| crate::error::SqlError::NotFound(format!("deployment {deployment_id}")))?;
        Ok(decode_json::<Deployment>("deployments", row.0)?)
    }

    async fn active_or_canary_deployment(&self, ruleset_id: &RulesetId) -> Result<Option<Deployment>, StoreError> {
        let row: Option<(Value,)> = sqlx::query_as(
            "SELECT data FROM deployments WHERE ruleset_id = $1 AND status IN ('canary', 'active') LIMIT 1",
        )
        .bind(ruleset_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(crate::error::SqlError::from)?;
        row.map(|(data,)| decode_json::<Deployment>("deployments", data)).transpose().map_err(Into::into)
    }

    async fn most_recent_deprecated(&self, ruleset_id: &RulesetId) -> Result<Option<Deployment>, StoreError> {
        let row: Option<(Value,)> = sqlx::query_as(
            "SELECT data FROM deployments WHERE ruleset_id = $1 AND status = 'deprecated' ORDER BY created_at DESC LIMIT 1",
        )
        .bind(ruleset_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(crate::error::SqlError::from)?;
        row.map(|(data,)| decode_json::<Deployment>("deployments", data)).transpose().map_err(Into::into)
    }

    async fn save_deployment(&self, deployment: &Deployment) -> Result<(), StoreError> {
        let data = serde_json::to_value(deployment).map_err(|source| crate::error::SqlError::Decode { table: "deployments", source })?;
        sqlx::query(
            "INSERT INTO deployments (id, ruleset_id, tenant_id, status, created_at, data)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (id) DO UPDATE SET status = EXCLUDED.status, data = EXCLUDED.data",
        )
        .bind(deployment.id.as_str())
        .bind(deployment.ruleset_id.as_str())
        .bind(deployment.tenant_id.as_str())
        .bind(status_column(deployment))
        .bind(deployment.started_at)
        .bind(data)
        .execute(&self.pool)
        .await
        .map_err(crate::error::SqlError::from)?;
        Ok(())
    }

    async fn delete_assignments(&self, deployment_id: &DeploymentId) -> Result<u64, StoreError> {
        let result = sqlx::query("DELETE FROM canary_assignments WHERE deployment_id = $1")
            .bind(deployment_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(crate::error::SqlError::from)?;
        Ok(result.rows_affected())
    }

    async fn v2_execution_logs(&self, deployment_id: &DeploymentId) -> Result<Vec<CanaryExecutionLog>, StoreError> {
        let rows: Vec<(Value,)> = sqlx::query_as(
            "SELECT data FROM canary_execution_logs WHERE deployment_id = $1 AND canary_version = 'v2'",
        )
        .bind(deployment_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(crate::error::SqlError::from)?;
        rows.into_iter().map(|(data,)| decode_json::<CanaryExecutionLog>("canary_execution_logs", data).map_err(Into::into)).collect()
    }

    async fn save_execution_log(&self, log: &CanaryExecutionLog) -> Result<(), StoreError> {
        let data = serde_json::to_value(log).map_err(|source| crate::error::SqlError::Decode { table: "canary_execution_logs", source })?;
        sqlx::query(
            "UPDATE canary_execution_logs
             SET success = $2, needs_reprocess = $3, reprocessed_at = $4, data = $5
             WHERE id = $1",
        )
        .bind(log.id.as_str())
        .bind(log.success)
        .bind(log.needs_reprocess)
        .bind(log.reprocessed_at)
        .bind(data)
        .execute(&self.pool)
        .await
        .map_err(crate::error::SqlError::from)?;
        Ok(())
    }

    async fn set_execution_metadata(&self, execution_id: &ExecutionId, key: &str, value: Value) -> Result<(), StoreError> {
        let row: (Value,) = sqlx::query_as("SELECT data FROM judgment_executions WHERE id = $1")
            .bind(execution_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(crate::error::SqlError::from)?
            .ok_or_else(|| crate::error::SqlError::NotFound(format!("judgment_execution {execution_id}")))?;
        let mut execution: JudgmentExecution = decode_json("judgment_executions", row.0)?;
        execution.metadata.insert(key.to_owned(), value);
        let data = serde_json::to_value(&execution).map_err(|source| crate::error::SqlError::Decode { table: "judgment_executions", source })?;
        sqlx::query("UPDATE judgment_executions SET data = $1 WHERE id = $2")
            .bind(data)
            .bind(execution_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(crate::error::SqlError::from)?;
        Ok(())
    }

    async fn reprocessable_logs(&self, deployment_id: &DeploymentId, limit: u32) -> Result<Vec<CanaryExecutionLog>, StoreError> {
        let rows: Vec<(Value,)> = sqlx::query_as(
            "SELECT data FROM canary_execution_logs
             WHERE deployment_id = $1 AND needs_reprocess = TRUE AND reprocessed_at IS NULL
             ORDER BY created_at ASC
             LIMIT $2",
        )
        .bind(deployment_id.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(crate::error::SqlError::from)?;
        rows.into_iter().map(|(data,)| decode_json::<CanaryExecutionLog>("canary_execution_logs", data).map_err(Into::into)).collect()
    }

    async fn mark_reprocessed(&self, log_id: &CanaryLogId, reprocessed_at: OffsetDateTime) -> Result<(), StoreError> {
        let row: (Value,) = sqlx::query_as("SELECT data FROM canary_execution_logs WHERE id = $1")
            .bind(log_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(crate::error::SqlError::from)?
            .ok_or_else(|| crate::error::SqlError::NotFound(format!("canary_execution_log {log_id}")))?;
        let mut log: CanaryExecutionLog = decode_json("canary_execution_logs", row.0)?;
        log.reprocessed_at = Some(reprocessed_at);
        let data = serde_json::to_value(&log).map_err(|source| crate::error::SqlError::Decode { table: "canary_execution_logs", source })?;
        sqlx::query("UPDATE canary_execution_logs SET reprocessed_at = $2, data = $3 WHERE id = $1")
            .bind(log_id.as_str())
            .bind(reprocessed_at)
            .bind(data)
            .execute(&self.pool)
            .await
            .map_err(crate::error::SqlError::from)?;
        Ok(())
    }

    async fn append_trust_history(&self, history: &TrustHistory) -> Result<(), StoreError> {
        let data = serde_json::to_value(history).map_err(|source| crate::error::SqlError::Decode { table: "trust_level_history", source })?;
        sqlx::query("INSERT INTO trust_level_history (id, ruleset_id, created_at, data) VALUES ($1, $2, $3, $4)")
            .bind(history.id.as_str())
            .bind(history.ruleset_id.as_str())
            .bind(history.created_at)
            .bind(data)
            .execute(&self.pool)
            .await
            .map_err(crate::error::SqlError::from)?;
        Ok(())
    }

    async fn notify(&self, notification: DeploymentNotification) -> Result<(), StoreError> {
        let tenant_id: (String,) = sqlx::query_as("SELECT tenant_id FROM deployments WHERE id = $1")
            .bind(notification.deployment_id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(crate::error::SqlError::from)?
            .ok_or_else(|| crate::error::SqlError::NotFound(format!("deployment {}", notification.deployment_id)))?;
        let data = serde_json::json!({
            "kind": "deployment_notification",
            "deployment_id": notification.deployment_id.as_str(),
            "event": notification.event,
            "detail": notification.detail,
        });
        sqlx::query("INSERT INTO audit_log (tenant_id, created_at, data) VALUES ($1, $2, $3)")
            .bind(tenant_id.0)
            .bind(OffsetDateTime::now_utc())
            .bind(data)
            .execute(&self.pool)
            .await
            .map_err(crate::error::SqlError::from)?;
        Ok(())
    }
}
