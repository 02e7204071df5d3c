// vantage-core/src/ids.rs
// ============================================================================
// Module: Core Identifiers
// Description: Canonical opaque identifiers shared across the control plane.
// Purpose: Provide strongly typed, serializable IDs with stable string forms.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! This module defines the string-based identifiers used throughout the
//! control plane. Identifiers are opaque and serialize as strings; validation
//! of format (e.g. UUID-ness) is left to the persistence layer.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

// ============================================================================
// SECTION: Macro
// ============================================================================

macro_rules! opaque_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            #[doc = concat!("Creates a new `", stringify!($name), "`.")]
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }
    };
}

// ============================================================================
// SECTION: Identifier Types
// ============================================================================

opaque_id!(
    /// Tenant identifier; the mandatory filter column for every query.
    TenantId
);
opaque_id!(
    /// User identifier resolved from a bearer credential.
    UserId
);
opaque_id!(
    /// Identifier of a named, versioned ruleset.
    RulesetId
);
opaque_id!(
    /// Identifier of an immutable ruleset version.
    RulesetVersionId
);
opaque_id!(
    /// Identifier of a planned version transition for a ruleset.
    DeploymentId
);
opaque_id!(
    /// Identifier of a sticky canary assignment row.
    AssignmentId
);
opaque_id!(
    /// Identifier of a windowed metrics aggregate.
    MetricsWindowId
);
opaque_id!(
    /// Identifier of a canary execution log row.
    CanaryLogId
);
opaque_id!(
    /// Identifier of a single judgment call.
    ExecutionId
);
opaque_id!(
    /// Identifier of a trust history row.
    TrustHistoryId
);
opaque_id!(
    /// Identifier of an auto-execution log row.
    AutoExecutionLogId
);
opaque_id!(
    /// Identifier of a feedback log row.
    FeedbackId
);
opaque_id!(
    /// Identifier of a promoted feedback sample.
    SampleId
);
opaque_id!(
    /// Identifier of a curated golden sample set.
    GoldenSampleSetId
);
opaque_id!(
    /// Sticky-assignment identifier (user, session, or workflow instance).
    Identifier
);
opaque_id!(
    /// Correlation identifier threaded through a single request.
    CorrelationId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_display_and_from() {
        let id = TenantId::from("tenant-7");
        assert_eq!(id.as_str(), "tenant-7");
        assert_eq!(id.to_string(), "tenant-7");
    }

    #[test]
    fn equal_ids_hash_equal() {
        let a = RulesetId::new("r1");
        let b = RulesetId::new("r1");
        assert_eq!(a, b);
    }
}
