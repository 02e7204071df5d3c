// vantage-api/src/audit.rs
// ============================================================================
// Module: Audit Call-Sites Helper
// Description: One helper every state-mutating handler calls into C16.
// Purpose: Give every mutation a uniform, best-effort audit row.
// Dependencies: vantage-audit, crate::state
// ============================================================================

//! ## Overview
//! spec.md §4.14 names `ip`/`user_agent`/`duration_ms` as part of the fixed
//! record shape, but nothing in this control plane's HTTP layer currently
//! extracts connection info or times a request — there is no middleware
//! layer building that context (see `routes::judgment`'s precedent of
//! calling into engines directly rather than through `tower` layers). Those
//! fields are left `None`/`0` here rather than invented; `request_body` and
//! `response_summary` are likewise omitted since most of these handlers
//! mutate through typed domain values, not raw JSON worth re-serializing.

use time::OffsetDateTime;
use vantage_audit::AuditRecordInput;

use crate::auth::Principal;
use crate::state::AppState;

/// Appends one best-effort audit row for a state-mutating call.
pub async fn record(state: &AppState, principal: &Principal, action: &str, resource: &str, resource_id: &str, method: &str, path: &str) {
    let input = AuditRecordInput {
        user_id: Some(principal.user_id.clone()),
        tenant_id: principal.tenant_id.clone(),
        action: action.to_owned(),
        resource: resource.to_owned(),
        resource_id: Some(resource_id.to_owned()),
        method: method.to_owned(),
        path: path.to_owned(),
        status: 200,
        ip: None,
        user_agent: None,
        request_body: None,
        response_summary: None,
        duration_ms: 0,
    };
    vantage_audit::write(&state.store, input.into_record(OffsetDateTime::now_utc())).await;
}
