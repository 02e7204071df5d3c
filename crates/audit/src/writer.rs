// vantage-audit/src/writer.rs
// ============================================================================
// Module: Audit Writer Port & Best-Effort Wrapper
// Description: The append-only sink trait, plus a never-blocks-the-caller wrapper.
// Purpose: Let every mutating call log a record without risking the call itself.
// Dependencies: crate::record
// ============================================================================

//! ## Overview
//! Grounded on spec.md §4.14's closing sentence: "the writer is best-effort:
//! audit failures log but never block the originating request." [`AuditSink`]
//! is the persistence boundary (implemented by `vantage-store`); [`write`]
//! is the only entry point callers use, and it never propagates a sink
//! failure — it logs one and returns.

use async_trait::async_trait;
use thiserror::Error;

use crate::record::AuditRecord;

/// Errors an [`AuditSink`] implementation can surface.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The backing store failed to append the record.
    #[error("audit sink error: {0}")]
    Backend(String),
}

/// The append-only surface the audit writer needs from persistence.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Appends one record. Implementations should treat this as an insert
    /// only — audit rows are never updated or deleted.
    async fn append(&self, record: &AuditRecord) -> Result<(), SinkError>;
}

/// Writes `record` to `sink`, logging and swallowing any failure so the
/// caller's own request is never blocked or failed by an audit outage.
pub async fn write(sink: &dyn AuditSink, record: AuditRecord) {
    if let Err(error) = sink.append(&record).await {
        tracing::error!(
            action = %record.action,
            resource = %record.resource,
            resource_id = ?record.resource_id,
            %error,
            "audit write failed; the originating request was not blocked"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use time::OffsetDateTime;
    use vantage_core::TenantId;

    use super::*;
    use crate::record::AuditRecordInput;

    #[derive(Default)]
    struct FailingSink {
        attempts: Mutex<u32>,
    }

    #[async_trait]
    impl AuditSink for FailingSink {
        async fn append(&self, _record: &AuditRecord) -> Result<(), SinkError> {
            *self.attempts.lock().expect("mutex poisoned") += 1;
            Err(SinkError::Backend("connection refused".to_owned()))
        }
    }

    fn sample_record() -> AuditRecord {
        AuditRecordInput {
            user_id: None,
            tenant_id: TenantId::new("t1"),
            action: "ruleset.update".to_owned(),
            resource: "ruleset".to_owned(),
            resource_id: Some("r1".to_owned()),
            method: "PATCH".to_owned(),
            path: "/rulesets/r1".to_owned(),
            status: 200,
            ip: None,
            user_agent: None,
            request_body: None,
            response_summary: None,
            duration_ms: 5,
        }
        .into_record(OffsetDateTime::now_utc())
    }

    #[tokio::test]
    async fn a_failing_sink_does_not_panic_or_propagate() {
        let sink = FailingSink::default();
        write(&sink, sample_record()).await;
        assert_eq!(*sink.attempts.lock().expect("mutex poisoned"), 1);
    }
}
