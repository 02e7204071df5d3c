// vantage-intent/src/rules.rs
// ============================================================================
// Module: Rule Stage
// Description: Ordered pattern list scanned before falling back to the model.
// Purpose: Classify the common case cheaply, without a model round-trip.
// Dependencies: vantage-core::TenantId
// ============================================================================

//! ## Overview
//! Per `spec.md` §4.1 step 1: an ordered list of `(pattern, intent,
//! confidence)` entries is scanned in order; the first match with
//! confidence `>= 0.9` wins. Patterns are plain case-insensitive keyword
//! substrings — real deployments load additional tenant-specific keyword
//! sets from the module registry (e.g. "batch yield" for a pharma tenant);
//! [`PatternRegistry::with_tenant_keywords`] is the extension point for that,
//! per this repo's `SPEC_FULL.md` supplement.

use vantage_core::TenantId;

use crate::types::Intent;

/// One rule-stage entry: a keyword, the intent it implies, and the
/// confidence assigned on match.
#[derive(Debug, Clone)]
pub struct Pattern {
    /// Lowercase keyword or phrase matched as a substring.
    pub keyword: &'static str,
    /// The intent this keyword implies.
    pub intent: Intent,
    /// Confidence assigned when this pattern matches.
    pub confidence: f64,
}

/// Minimum confidence a rule-stage match must carry to win outright.
pub const RULE_MATCH_THRESHOLD: f64 = 0.9;

const BASE_PATTERNS: &[Pattern] = &[
    Pattern { keyword: "why did", intent: Intent::FindCause, confidence: 0.95 },
    Pattern { keyword: "root cause", intent: Intent::FindCause, confidence: 0.95 },
    Pattern { keyword: "anomaly", intent: Intent::DetectAnomaly, confidence: 0.93 },
    Pattern { keyword: "unusual", intent: Intent::DetectAnomaly, confidence: 0.9 },
    Pattern { keyword: "what if", intent: Intent::WhatIf, confidence: 0.95 },
    Pattern { keyword: "predict", intent: Intent::Predict, confidence: 0.93 },
    Pattern { keyword: "forecast", intent: Intent::Predict, confidence: 0.93 },
    Pattern { keyword: "compare", intent: Intent::Compare, confidence: 0.92 },
    Pattern { keyword: "versus", intent: Intent::Compare, confidence: 0.9 },
    Pattern { keyword: "rank", intent: Intent::Rank, confidence: 0.92 },
    Pattern { keyword: "top ", intent: Intent::Rank, confidence: 0.9 },
    Pattern { keyword: "trend", intent: Intent::Trend, confidence: 0.93 },
    Pattern { keyword: "over the last", intent: Intent::Trend, confidence: 0.9 },
    Pattern { keyword: "report", intent: Intent::Report, confidence: 0.92 },
    Pattern { keyword: "notify", intent: Intent::Notify, confidence: 0.93 },
    Pattern { keyword: "alert me", intent: Intent::Notify, confidence: 0.93 },
    Pattern { keyword: "stop", intent: Intent::Stop, confidence: 0.95 },
    Pattern { keyword: "cancel", intent: Intent::Stop, confidence: 0.93 },
    Pattern { keyword: "clarify", intent: Intent::Clarify, confidence: 0.9 },
    Pattern { keyword: "what do you mean", intent: Intent::Clarify, confidence: 0.9 },
    Pattern { keyword: "help", intent: Intent::System, confidence: 0.9 },
    Pattern { keyword: "continue", intent: Intent::Continue, confidence: 0.9 },
    Pattern { keyword: "status of", intent: Intent::Check, confidence: 0.9 },
    Pattern { keyword: "is ", intent: Intent::Check, confidence: 0.9 },
];

/// An ordered pattern list, optionally extended with tenant keyword sets.
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    patterns: Vec<Pattern>,
}

impl Default for PatternRegistry {
    fn default() -> Self {
        Self { patterns: BASE_PATTERNS.to_vec() }
    }
}

impl PatternRegistry {
    /// Builds the base (tenant-agnostic) pattern registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Extends the base registry with tenant-specific keyword patterns,
    /// loaded by the caller from the module registry and scoped by C15.
    /// Tenant patterns are scanned before the base list, so a tenant can
    /// sharpen a keyword the base list would otherwise miss.
    #[must_use]
    pub fn with_tenant_keywords(mut self, tenant_id: &TenantId, keywords: &[(&'static str, Intent, f64)]) -> Self {
        tracing::debug!(%tenant_id, count = keywords.len(), "loaded tenant intent keywords");
        let mut tenant_patterns: Vec<Pattern> = keywords
            .iter()
            .map(|(keyword, intent, confidence)| Pattern { keyword, intent: *intent, confidence: *confidence })
            .collect();
        tenant_patterns.extend(self.patterns);
        self.patterns = tenant_patterns;
        self
    }

    /// Scans `utterance` against the registry; returns the first match at or
    /// above [`RULE_MATCH_THRESHOLD`].
    #[must_use]
    pub fn scan(&self, utterance: &str) -> Option<&Pattern> {
        let lowered = utterance.to_lowercase();
        self.patterns
            .iter()
            .find(|pattern| pattern.confidence >= RULE_MATCH_THRESHOLD && lowered.contains(pattern.keyword))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_cause_pattern_beats_check_pattern_by_order() {
        let registry = PatternRegistry::new();
        let matched = registry.scan("why did line 3 stop today").expect("rule hit expected");
        assert_eq!(matched.intent, Intent::FindCause);
    }

    #[test]
    fn unmatched_utterance_falls_through_to_none() {
        let registry = PatternRegistry::new();
        assert!(registry.scan("zzz qqq unrelated gibberish").is_none());
    }

    #[test]
    fn tenant_keywords_are_scanned_before_base_patterns() {
        let tenant = TenantId::new("pharma-co");
        let registry = PatternRegistry::new()
            .with_tenant_keywords(&tenant, &[("batch yield", Intent::Check, 0.95)]);
        let matched = registry.scan("what is the batch yield right now").expect("rule hit expected");
        assert_eq!(matched.intent, Intent::Check);
        assert_eq!(matched.keyword, "batch yield");
    }
}
