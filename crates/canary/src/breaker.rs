// vantage-canary/src/breaker.rs
// ============================================================================
// Module: Canary Circuit Breaker (C11)
// Description: Stateless health verdict over a deployment's latest metrics windows.
// Purpose: Decide, every evaluation, whether a canary deployment must halt.
// Dependencies: vantage-core::domain
// ============================================================================

//! ## Overview
//! Per `spec.md` §4.8, the breaker holds no state of its own: every call
//! re-derives [`CircuitStatus`] from the latest canary and stable
//! [`DeploymentMetricsWindow`]s. Four independent checks run against
//! `canary`; the worst outcome wins. A canary below `min_samples` is always
//! `Healthy` — there is not yet enough evidence to act on.

use vantage_core::CanaryConfig;
use vantage_core::DeploymentMetricsWindow;

/// Overall verdict for a deployment's canary population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CircuitState {
    /// No threshold breached.
    Healthy,
    /// At least one threshold crossed its warning line (0.7x) but not its limit.
    Warning,
    /// At least one threshold breached outright; halt is recommended.
    Critical,
}

/// The full verdict produced by [`evaluate`].
#[derive(Debug, Clone, PartialEq)]
pub struct CircuitStatus {
    /// Worst of the four individual checks.
    pub state: CircuitState,
    /// `true` when `state == Critical`.
    pub should_halt: bool,
    /// Human-readable text for the first check that went `Critical`.
    pub halt_reason: Option<String>,
    /// Human-readable text for every check that went `Warning` (including
    /// ones later overridden by a `Critical` check elsewhere).
    pub warnings: Vec<String>,
}

/// Evaluates `canary` against `stable` under `config`.
///
/// `stable` is `None` when no stable-population window exists yet (for
/// example immediately after `start_canary`); relative checks are skipped
/// in that case, since there is nothing to compare against.
#[must_use]
pub fn evaluate(
    canary: &DeploymentMetricsWindow,
    stable: Option<&DeploymentMetricsWindow>,
    config: &CanaryConfig,
) -> CircuitStatus {
    if canary.sample_count < config.min_samples {
        return CircuitStatus {
            state: CircuitState::Healthy,
            should_halt: false,
            halt_reason: None,
            warnings: Vec::new(),
        };
    }

    let mut worst = CircuitState::Healthy;
    let mut halt_reason = None;
    let mut warnings = Vec::new();

    let mut check = |state: CircuitState, text: String| {
        if state == CircuitState::Critical && halt_reason.is_none() {
            halt_reason = Some(text.clone());
        }
        if state == CircuitState::Warning {
            warnings.push(text);
        }
        if state > worst {
            worst = state;
        }
    };

    // Check 1: absolute error rate.
    check(
        classify(canary.error_rate, config.error_rate_threshold),
        format!(
            "canary error rate {:.4} vs threshold {:.4}",
            canary.error_rate, config.error_rate_threshold
        ),
    );

    // Check 2: error rate relative to stable (only when stable has errors to compare).
    if let Some(stable) = stable {
        if stable.error_rate > 0.0 {
            let relative = canary.error_rate / stable.error_rate;
            check(
                classify(relative, config.relative_error_threshold),
                format!(
                    "canary error rate {:.4}x stable vs threshold {:.1}x",
                    relative, config.relative_error_threshold
                ),
            );
        }

        // Check 3: P95 latency relative to stable (only when both are defined).
        if let (Some(canary_p95), Some(stable_p95)) = (canary.latency_p95_ms, stable.latency_p95_ms) {
            if stable_p95 > 0.0 {
                let relative = canary_p95 / stable_p95;
                check(
                    classify(relative, config.latency_p95_threshold),
                    format!(
                        "canary p95 latency {:.1}x stable vs threshold {:.1}x",
                        relative, config.latency_p95_threshold
                    ),
                );
            }
        }
    }

    // Check 4: consecutive failures (discrete, no warning band).
    if canary.consecutive_failures >= config.consecutive_failure_threshold {
        check(
            CircuitState::Critical,
            format!(
                "{} consecutive canary failures vs threshold {}",
                canary.consecutive_failures, config.consecutive_failure_threshold
            ),
        );
    }

    let should_halt = worst == CircuitState::Critical;
    CircuitStatus {
        state: worst,
        should_halt,
        halt_reason,
        warnings,
    }
}

/// Classifies `value` against `threshold` with a 0.7x warning band below it.
fn classify(value: f64, threshold: f64) -> CircuitState {
    if value >= threshold {
        CircuitState::Critical
    } else if value >= threshold * 0.7 {
        CircuitState::Warning
    } else {
        CircuitState::Healthy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;
    use vantage_core::DeploymentId;
    use vantage_core::MetricsWindowId;
    use vantage_core::VersionType;

    fn window(sample_count: u64, error_rate: f64, p95: Option<f64>, consecutive_failures: u32) -> DeploymentMetricsWindow {
        DeploymentMetricsWindow {
            id: MetricsWindowId::new("w1"),
            deployment_id: DeploymentId::new("d1"),
            version_type: VersionType::Canary,
            sample_count,
            success_count: sample_count,
            error_count: 0,
            error_rate,
            latency_p50_ms: None,
            latency_p95_ms: p95,
            latency_p99_ms: None,
            latency_avg_ms: None,
            consecutive_failures,
            window_start: datetime!(2026 - 07 - 27 00:00:00 UTC),
            window_end: datetime!(2026 - 07 - 27 00:01:00 UTC),
        }
    }

    #[test]
    fn below_min_samples_is_always_healthy() {
        let config = CanaryConfig::default();
        let canary = window(10, 0.99, Some(9999.0), 999);
        let status = evaluate(&canary, None, &config);
        assert_eq!(status.state, CircuitState::Healthy);
        assert!(!status.should_halt);
    }

    #[test]
    fn absolute_error_rate_breach_halts() {
        let config = CanaryConfig::default();
        let canary = window(200, 0.10, None, 0);
        let status = evaluate(&canary, None, &config);
        assert_eq!(status.state, CircuitState::Critical);
        assert!(status.should_halt);
        assert!(status.halt_reason.is_some());
    }

    #[test]
    fn warning_band_does_not_halt() {
        let config = CanaryConfig::default();
        let canary = window(200, config.error_rate_threshold * 0.8, None, 0);
        let status = evaluate(&canary, None, &config);
        assert_eq!(status.state, CircuitState::Warning);
        assert!(!status.should_halt);
        assert_eq!(status.warnings.len(), 1);
    }

    #[test]
    fn relative_checks_skipped_without_stable_population() {
        let config = CanaryConfig::default();
        let canary = window(200, 0.01, Some(500.0), 0);
        let status = evaluate(&canary, None, &config);
        assert_eq!(status.state, CircuitState::Healthy);
    }

    #[test]
    fn consecutive_failures_breach_halts_regardless_of_rates() {
        let config = CanaryConfig::default();
        let canary = window(200, 0.0, None, config.consecutive_failure_threshold);
        let status = evaluate(&canary, None, &config);
        assert_eq!(status.state, CircuitState::Critical);
        assert!(status.should_halt);
    }
}
