// vantage-access/src/role.rs
// ============================================================================
// Module: Role Hierarchy
// Description: The five totally-ordered roles permission checks compare against.
// Purpose: Give C5 a single source of truth for "is this role senior enough."
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Per `spec.md` §4.2, the five roles are totally ordered:
//! `viewer < user < operator < approver < admin`. The derived [`Ord`] gives
//! us that ordering for free — `role >= required` is the entire permission
//! check.

use serde::Deserialize;
use serde::Serialize;

/// A caller's authority level, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Read-only access.
    Viewer,
    /// Ordinary end user.
    User,
    /// Operates on staged actions.
    Operator,
    /// Approves staged actions.
    Approver,
    /// Full authority, including manual trust overrides.
    Admin,
}

impl Role {
    /// Parses a role from its lowercase name, as stored on a user record.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "viewer" => Some(Self::Viewer),
            "user" => Some(Self::User),
            "operator" => Some(Self::Operator),
            "approver" => Some(Self::Approver),
            "admin" => Some(Self::Admin),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_are_totally_ordered_as_specified() {
        assert!(Role::Viewer < Role::User);
        assert!(Role::User < Role::Operator);
        assert!(Role::Operator < Role::Approver);
        assert!(Role::Approver < Role::Admin);
    }

    #[test]
    fn unknown_role_name_parses_to_none() {
        assert_eq!(Role::from_name("superuser"), None);
    }
}
