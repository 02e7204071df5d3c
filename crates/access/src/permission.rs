// vantage-access/src/permission.rs
// ============================================================================
// Module: Permission Matrix (C5)
// Description: Compiled-in intent -> required-role table and the allowed() check.
// Purpose: Let C6 decide once per request whether to invoke the target executor.
// Dependencies: vantage-intent::Intent
// ============================================================================

//! ## Overview
//! Per `spec.md` §4.2: `allowed(role, intent) <=> role >= required(intent)`.
//! Unknown intents default to `admin`-required (there are none in this
//! closed intent set, but [`required_role`] keeps that fallback explicit
//! rather than relying on an exhaustive match silently compiling). A `None`
//! role — the unauthenticated internal caller used by background
//! schedulers — always skips the check.

use vantage_intent::Intent;

use crate::role::Role;

/// The outcome of a permission check, carrying enough detail for C6 to
/// annotate the routing result on denial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionDecision {
    /// Whether the call is allowed to proceed.
    pub allowed: bool,
    /// The role required for this intent.
    pub required_role: Role,
    /// The caller's role, when one was supplied.
    pub caller_role: Option<Role>,
}

/// The role required to invoke each intent. Compiled in, not configurable —
/// per `spec.md` §4.2 this table is constant.
#[must_use]
pub fn required_role(intent: Intent) -> Role {
    match intent {
        Intent::Check | Intent::Trend | Intent::Compare | Intent::Rank | Intent::Report | Intent::Continue => {
            Role::Viewer
        }
        Intent::FindCause | Intent::Clarify => Role::User,
        Intent::DetectAnomaly | Intent::Predict | Intent::WhatIf => Role::Operator,
        Intent::Notify => Role::Approver,
        Intent::Stop => Role::Approver,
        Intent::System => Role::Admin,
    }
}

/// Checks whether `caller_role` may invoke `intent`.
///
/// `caller_role = None` is the unauthenticated internal-caller path (used by
/// background schedulers) and always passes — this is the safe path for
/// trusted system callers, never for end users reaching this check through
/// an HTTP surface.
#[must_use]
pub fn check(caller_role: Option<Role>, intent: Intent) -> PermissionDecision {
    let required = required_role(intent);
    let allowed = match caller_role {
        None => true,
        Some(role) => role >= required,
    };
    PermissionDecision { allowed, required_role: required, caller_role }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn viewer_may_check_but_not_stop() {
        assert!(check(Some(Role::Viewer), Intent::Check).allowed);
        assert!(!check(Some(Role::Viewer), Intent::Stop).allowed);
    }

    #[test]
    fn approver_may_stop_but_not_reach_system_intents() {
        let decision = check(Some(Role::Approver), Intent::Stop);
        assert!(decision.allowed);
        let denied = check(Some(Role::Approver), Intent::System);
        assert!(!denied.allowed);
        assert_eq!(denied.required_role, Role::Admin);
    }

    #[test]
    fn unauthenticated_internal_caller_skips_the_check() {
        let decision = check(None, Intent::System);
        assert!(decision.allowed);
        assert_eq!(decision.caller_role, None);
    }

    #[test]
    fn predict_requires_operator() {
        assert!(!check(Some(Role::Viewer), Intent::Predict).allowed);
        assert!(!check(Some(Role::User), Intent::Predict).allowed);
        let decision = check(Some(Role::Operator), Intent::Predict);
        assert!(decision.allowed);
        assert_eq!(decision.required_role, Role::Operator);
    }

    #[test]
    fn notify_requires_approver() {
        assert!(!check(Some(Role::Operator), Intent::Notify).allowed);
        assert!(check(Some(Role::Approver), Intent::Notify).allowed);
    }
}
