// vantage-store/src/audit_sink.rs
// ============================================================================
// Module: AuditSink Implementation
// Description: Postgres-backed persistence for C16's append-only rows.
// Purpose: Give vantage-audit a concrete sink without it depending on sqlx.
// Dependencies: sqlx, vantage-audit, vantage-core
// ============================================================================

use async_trait::async_trait;
use vantage_audit::AuditRecord;
use vantage_audit::AuditSink;
use vantage_audit::SinkError;

use crate::pg_store::PgStore;

#[async_trait]
impl AuditSink for PgStore {
    async fn append(&self, record: &AuditRecord) -> Result<(), SinkError> {
        let data = serde_json::json!({
            "user_id": record.user_id.as_ref().map(vantage_core::UserId::as_str),
            "action": record.action,
            "resource": record.resource,
            "resource_id": record.resource_id,
            "method": record.method,
            "path": record.path,
            "status": record.status,
            "ip": record.ip,
            "user_agent": record.user_agent,
            "request_body": record.request_body,
            "response_summary": record.response_summary,
            "masked_pii_count": record.masked_pii_count,
            "duration_ms": record.duration_ms,
        });
        sqlx::query("INSERT INTO audit_log (tenant_id, created_at, data) VALUES ($1, $2, $3)")
            .bind(record.tenant_id.as_str())
            .bind(record.created_at)
            .bind(data)
            .execute(&self.pool)
            .await
            .map_err(|error| SinkError::Backend(error.to_string()))?;
        Ok(())
    }
}
