// vantage-trust/src/score.rs
// ============================================================================
// Module: Trust Score Composition
// Description: Computes TrustComponents from raw execution history and combines them.
// Purpose: Give C7 a pure, testable scoring function independent of storage.
// Dependencies: vantage-core::domain
// ============================================================================

//! ## Overview
//! Per `spec.md` §4.4, each component is in `[0, 1]` and the score is a
//! linear combination under [`TrustWeights`]. This module is pure: callers
//! supply the raw inputs (execution count, accuracy, recent result variance,
//! feedback counts, ruleset age) and receive back the component breakdown and
//! composed score.

use vantage_core::TrustComponents;
use vantage_core::TrustWeights;

/// Inputs needed to compute a ruleset's [`TrustComponents`].
#[derive(Debug, Clone, Copy)]
pub struct ScoreInputs {
    /// Observed accuracy rate, or `None` absent feedback.
    pub accuracy_rate: Option<f64>,
    /// Variance of results across the last N executions of equivalent inputs.
    pub recent_result_variance: f64,
    /// Total judgment executions observed.
    pub execution_count: u64,
    /// The execution-count target at which `frequency` saturates to 1.0.
    pub frequency_target: u64,
    /// Positive feedback count.
    pub positive_feedback: u64,
    /// Negative feedback count.
    pub negative_feedback: u64,
    /// Days since the ruleset was created.
    pub age_days: f64,
    /// The age in days at which `age` saturates to 1.0.
    pub age_target_days: f64,
}

const FEEDBACK_EPSILON: f64 = 1e-6;

/// Computes the five trust components from raw inputs, each clamped to `[0, 1]`.
#[must_use]
pub fn components(inputs: ScoreInputs) -> TrustComponents {
    let accuracy = inputs.accuracy_rate.unwrap_or(0.5).clamp(0.0, 1.0);
    let consistency = (1.0 - inputs.recent_result_variance).clamp(0.0, 1.0);
    let frequency = saturating_log(inputs.execution_count, inputs.frequency_target);
    let feedback_total = inputs.positive_feedback + inputs.negative_feedback;
    let feedback = if feedback_total == 0 {
        0.0
    } else {
        (inputs.positive_feedback as f64 / (feedback_total as f64 + FEEDBACK_EPSILON)).clamp(0.0, 1.0)
    };
    let age = if inputs.age_target_days <= 0.0 {
        1.0
    } else {
        (inputs.age_days / inputs.age_target_days).clamp(0.0, 1.0)
    };

    TrustComponents {
        accuracy,
        consistency,
        frequency,
        feedback,
        age,
    }
}

fn saturating_log(count: u64, target: u64) -> f64 {
    if target == 0 {
        return 1.0;
    }
    let numerator = (1.0 + count as f64).ln();
    let denominator = (1.0 + target as f64).ln();
    if denominator <= 0.0 {
        return 1.0;
    }
    (numerator / denominator).clamp(0.0, 1.0)
}

/// Combines [`TrustComponents`] under [`TrustWeights`] into a single score in `[0, 1]`.
#[must_use]
pub fn compose(components: &TrustComponents, weights: &TrustWeights) -> f64 {
    let raw = components.accuracy * weights.accuracy
        + components.consistency * weights.consistency
        + components.frequency * weights.frequency
        + components.feedback * weights.feedback
        + components.age * weights.age;
    raw.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn absent_feedback_defaults_accuracy_to_half() {
        let components = components(ScoreInputs {
            accuracy_rate: None,
            recent_result_variance: 0.0,
            execution_count: 0,
            frequency_target: 1000,
            positive_feedback: 0,
            negative_feedback: 0,
            age_days: 0.0,
            age_target_days: 30.0,
        });
        assert!((components.accuracy - 0.5).abs() < f64::EPSILON);
        assert!((components.feedback - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn frequency_saturates_at_target() {
        let components = components(ScoreInputs {
            accuracy_rate: Some(1.0),
            recent_result_variance: 0.0,
            execution_count: 1000,
            frequency_target: 1000,
            positive_feedback: 0,
            negative_feedback: 0,
            age_days: 0.0,
            age_target_days: 30.0,
        });
        assert!((components.frequency - 1.0).abs() < 1e-9);
    }

    proptest! {
        #[test]
        fn composed_score_always_in_unit_interval(
            accuracy in 0.0f64..=1.0,
            consistency in 0.0f64..=1.0,
            frequency in 0.0f64..=1.0,
            feedback in 0.0f64..=1.0,
            age in 0.0f64..=1.0,
        ) {
            let components = TrustComponents { accuracy, consistency, frequency, feedback, age };
            let score = compose(&components, &TrustWeights::default());
            prop_assert!((0.0..=1.0).contains(&score));
        }
    }
}
