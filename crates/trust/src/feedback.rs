// vantage-trust/src/feedback.rs
// ============================================================================
// Module: Feedback Promotion
// Description: Promotes FeedbackLog rows into deduplicated Sample rows.
// Purpose: Feed C7's feedback component and curate few-shot samples for C3.
// Dependencies: vantage-core::{domain, hashing}
// ============================================================================

//! ## Overview
//! Per `SPEC_FULL.md`'s data-model supplement, positive/negative feedback
//! drives C7's feedback trust component directly; corrections are promoted
//! to a [`Sample`] keyed by a content hash of `(ruleset_id, input_data,
//! corrected_output)` so the same correction is never stored twice.

use vantage_core::FeedbackKind;
use vantage_core::RulesetId;
use vantage_core::hashing::DEFAULT_HASH_ALGORITHM;
use vantage_core::hashing::HashError;
use vantage_core::hashing::hash_canonical_json;

/// The content identity a correction is deduplicated against.
#[derive(Debug, Clone, serde::Serialize)]
struct SampleContent<'a> {
    ruleset_id: &'a RulesetId,
    input_data: &'a serde_json::Value,
    output_data: &'a serde_json::Value,
}

/// Computes the deduplication hash for a candidate sample.
///
/// # Errors
///
/// Returns [`HashError`] when the content cannot be canonicalized.
pub fn content_hash(
    ruleset_id: &RulesetId,
    input_data: &serde_json::Value,
    output_data: &serde_json::Value,
) -> Result<String, HashError> {
    let content = SampleContent {
        ruleset_id,
        input_data,
        output_data,
    };
    Ok(hash_canonical_json(DEFAULT_HASH_ALGORITHM, &content)?.value)
}

/// Whether a feedback event should be promoted to a reusable sample.
///
/// Per `spec.md` §3, only corrections carry a distinct corrected output
/// worth curating; plain positive/negative feedback only updates counters.
#[must_use]
pub fn should_promote(kind: FeedbackKind) -> bool {
    matches!(kind, FeedbackKind::Correction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_corrections_are_promoted() {
        assert!(!should_promote(FeedbackKind::Positive));
        assert!(!should_promote(FeedbackKind::Negative));
        assert!(should_promote(FeedbackKind::Correction));
    }

    #[test]
    fn identical_content_hashes_identically() {
        let ruleset_id = RulesetId::new("r1");
        let input = serde_json::json!({"line": "L1"});
        let output = serde_json::json!({"decision": "reject"});
        let first = content_hash(&ruleset_id, &input, &output).expect("hashing succeeds");
        let second = content_hash(&ruleset_id, &input, &output).expect("hashing succeeds");
        assert_eq!(first, second);
    }
}
