// vantage-audit/src/record.rs
// ============================================================================
// Module: Audit Record
// Description: The fixed shape every state-mutating call appends.
// Purpose: Give every mutating call a single, uniform forensic row.
// Dependencies: vantage-core, crate::masking
// ============================================================================

use time::OffsetDateTime;
use vantage_core::TenantId;
use vantage_core::UserId;

use crate::masking::Detection;
use crate::masking::PiiCategory;
use crate::masking::mask_pii;

/// One append-only audit row. Mirrors spec.md §4.14's field list exactly.
#[derive(Debug, Clone)]
pub struct AuditRecord {
    /// Acting user, when the call carried an authenticated identity.
    pub user_id: Option<UserId>,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Short action name (`judgment.execute`, `deployment.rollback`, ...).
    pub action: String,
    /// The resource type acted upon (`ruleset`, `deployment`, ...).
    pub resource: String,
    /// The specific resource instance, when applicable.
    pub resource_id: Option<String>,
    /// HTTP method.
    pub method: String,
    /// HTTP path.
    pub path: String,
    /// HTTP response status.
    pub status: u16,
    /// Caller IP address, PII-masked like everything else in this record.
    pub ip: Option<String>,
    /// Caller user agent string.
    pub user_agent: Option<String>,
    /// The request body, PII-masked before being retained.
    pub request_body: Option<String>,
    /// A short summary of the response (never the full body).
    pub response_summary: Option<String>,
    /// Count of PII detections redacted from `request_body`, kept for
    /// forensics without retaining the original values.
    pub masked_pii_count: usize,
    /// Request duration in milliseconds.
    pub duration_ms: u64,
    /// When this record was written.
    pub created_at: OffsetDateTime,
}

/// The raw inputs to build an [`AuditRecord`], before masking is applied.
#[derive(Debug, Clone)]
pub struct AuditRecordInput {
    /// Acting user, when authenticated.
    pub user_id: Option<UserId>,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Short action name.
    pub action: String,
    /// Resource type.
    pub resource: String,
    /// Specific resource instance.
    pub resource_id: Option<String>,
    /// HTTP method.
    pub method: String,
    /// HTTP path.
    pub path: String,
    /// HTTP response status.
    pub status: u16,
    /// Caller IP, masked on build.
    pub ip: Option<String>,
    /// Caller user agent.
    pub user_agent: Option<String>,
    /// Raw request body, masked on build.
    pub request_body: Option<String>,
    /// Short response summary.
    pub response_summary: Option<String>,
    /// Request duration in milliseconds.
    pub duration_ms: u64,
}

impl AuditRecordInput {
    /// Masks `request_body` and `ip`, producing the record actually
    /// written to the audit log.
    #[must_use]
    pub fn into_record(self, now: OffsetDateTime) -> AuditRecord {
        let (body, body_detections) = mask_pii(self.request_body.as_deref(), &[]);
        let (ip, ip_detections) = mask_pii(self.ip.as_deref(), &[PiiCategory::IpAddress]);
        let masked_pii_count = count(&body_detections) + count(&ip_detections);

        AuditRecord {
            user_id: self.user_id,
            tenant_id: self.tenant_id,
            action: self.action,
            resource: self.resource,
            resource_id: self.resource_id,
            method: self.method,
            path: self.path,
            status: self.status,
            ip,
            user_agent: self.user_agent,
            request_body: body,
            response_summary: self.response_summary,
            masked_pii_count,
            duration_ms: self.duration_ms,
            created_at: now,
        }
    }
}

fn count(detections: &[Detection]) -> usize {
    detections.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_input() -> AuditRecordInput {
        AuditRecordInput {
            user_id: Some(UserId::new("u1")),
            tenant_id: TenantId::new("t1"),
            action: "judgment.execute".to_owned(),
            resource: "ruleset".to_owned(),
            resource_id: Some("r1".to_owned()),
            method: "POST".to_owned(),
            path: "/judgment/execute".to_owned(),
            status: 200,
            ip: Some("192.168.1.100".to_owned()),
            user_agent: Some("curl/8.0".to_owned()),
            request_body: Some("contact: test@example.com".to_owned()),
            response_summary: Some("decision=auto_execute".to_owned()),
            duration_ms: 42,
        }
    }

    #[test]
    fn into_record_masks_body_and_ip_and_counts_detections() {
        let record = base_input().into_record(OffsetDateTime::now_utc());
        assert_eq!(record.ip.as_deref(), Some("192.168.***.***"));
        let body = record.request_body.expect("body should survive masking");
        assert!(!body.contains("test@example.com"));
        assert_eq!(record.masked_pii_count, 2);
    }

    #[test]
    fn into_record_with_no_pii_keeps_count_at_zero() {
        let mut input = base_input();
        input.request_body = Some("no sensitive data here".to_owned());
        input.ip = None;
        let record = input.into_record(OffsetDateTime::now_utc());
        assert_eq!(record.masked_pii_count, 0);
        assert!(record.ip.is_none());
    }
}
