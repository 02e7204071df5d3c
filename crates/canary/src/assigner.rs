// vantage-canary/src/assigner.rs
// ============================================================================
// Module: Canary Assigner (C9)
// Description: Sticky-session routing of identifiers to v1/v2 for a deployment.
// Purpose: Give every identifier a deterministic, monotonic canary bucket.
// Dependencies: vantage-core::domain, sha2
// ============================================================================

//! ## Overview
//! Per `spec.md` §4.6: an identifier already assigned keeps its version; an
//! unassigned identifier is bucketed by `sha256(deployment_id || identifier)
//! mod 100` against the current `canary_traffic_percentage`. Because the
//! hash is fixed for a given `(deployment_id, identifier)` pair, ramping the
//! percentage up never migrates a `v2` identifier back to `v1` — the bucket
//! value never changes, only the threshold it is compared against does.

use sha2::Digest;
use sha2::Sha256;
use vantage_core::CanaryVersion;
use vantage_core::DeploymentId;
use vantage_core::Identifier;
use vantage_core::IdentifierType;

/// Computes the deterministic bucket `[0, 100)` for `(deployment_id, identifier)`.
#[must_use]
pub fn bucket(deployment_id: &DeploymentId, identifier: &Identifier) -> u8 {
    let input = format!("{deployment_id}{identifier}");
    let digest = Sha256::digest(input.as_bytes());
    let mut value: u128 = 0;
    for byte in digest.iter().take(16) {
        value = (value << 8) | u128::from(*byte);
    }
    #[allow(clippy::cast_possible_truncation, reason = "value % 100 always fits in u8")]
    {
        (value % 100) as u8
    }
}

/// Decides which version a fresh `(deployment_id, identifier)` pair routes to,
/// given the deployment's current traffic percentage.
#[must_use]
pub fn assign_version(
    deployment_id: &DeploymentId,
    identifier: &Identifier,
    traffic_percentage: u8,
) -> CanaryVersion {
    if bucket(deployment_id, identifier) < traffic_percentage.min(100) {
        CanaryVersion::V2
    } else {
        CanaryVersion::V1
    }
}

/// Picks the highest-priority identifier among the candidates offered by a
/// request, per the priority order `workflow_instance > session > user`.
#[must_use]
pub fn pick_identifier<'a>(
    candidates: &'a [(IdentifierType, &'a Identifier)],
) -> Option<(&'a IdentifierType, &'a Identifier)> {
    candidates
        .iter()
        .max_by_key(|(kind, _)| *kind)
        .map(|(kind, identifier)| (kind, *identifier))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_is_deterministic_for_fixed_identifier() {
        let deployment = DeploymentId::new("d1");
        let identifier = Identifier::new("user-42");
        let first = assign_version(&deployment, &identifier, 10);
        let second = assign_version(&deployment, &identifier, 10);
        assert_eq!(first, second);
    }

    #[test]
    fn ramping_percentage_up_never_migrates_v2_back_to_v1() {
        let deployment = DeploymentId::new("d1");
        let mut promoted_at_10 = Vec::new();
        for index in 0..1000 {
            let identifier = Identifier::new(format!("user-{index}"));
            if assign_version(&deployment, &identifier, 10) == CanaryVersion::V2 {
                promoted_at_10.push(identifier);
            }
        }
        for identifier in &promoted_at_10 {
            assert_eq!(assign_version(&deployment, identifier, 50), CanaryVersion::V2);
        }
    }

    #[test]
    fn priority_prefers_workflow_instance_over_session_and_user() {
        let user = Identifier::new("u1");
        let session = Identifier::new("s1");
        let workflow = Identifier::new("w1");
        let candidates = [
            (IdentifierType::User, &user),
            (IdentifierType::Session, &session),
            (IdentifierType::WorkflowInstance, &workflow),
        ];
        let (kind, identifier) = pick_identifier(&candidates).expect("candidates non-empty");
        assert_eq!(*kind, IdentifierType::WorkflowInstance);
        assert_eq!(identifier, &workflow);
    }
}
