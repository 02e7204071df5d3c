// vantage-access/src/scope.rs
// ============================================================================
// Module: Data-Scope Filter (C15)
// Description: Per-user factory/line/product/shift/equipment restriction.
// Purpose: Prevent any data-touching executor from crossing tenant/scope lines.
// Dependencies: serde, crate::role
// ============================================================================

//! ## Overview
//! Per `spec.md` §4.13: a scope with empty sets and `all_access = false`
//! must yield an intentionally empty result set, never a cross-tenant leak
//! (Testable Property 8). `admin` always yields `all_access = true`.

use std::collections::BTreeSet;

use serde::Deserialize;
use serde::Serialize;

use crate::role::Role;

/// The per-user data restriction applied to every scoped query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataScope {
    /// Factory codes the caller may see.
    pub factory_codes: BTreeSet<String>,
    /// Line codes the caller may see.
    pub line_codes: BTreeSet<String>,
    /// Product family codes the caller may see.
    pub product_families: BTreeSet<String>,
    /// Shift codes the caller may see.
    pub shift_codes: BTreeSet<String>,
    /// Equipment ids the caller may see.
    pub equipment_ids: BTreeSet<String>,
    /// `true` when the caller bypasses all of the above restrictions.
    pub all_access: bool,
}

/// The user-metadata fields a [`DataScope`] is derived from.
#[derive(Debug, Clone, Default)]
pub struct ScopeMetadata {
    /// Factory codes granted to the user.
    pub factory_codes: BTreeSet<String>,
    /// Line codes granted to the user.
    pub line_codes: BTreeSet<String>,
    /// Product families granted to the user.
    pub product_families: BTreeSet<String>,
    /// Shift codes granted to the user.
    pub shift_codes: BTreeSet<String>,
    /// Equipment ids granted to the user.
    pub equipment_ids: BTreeSet<String>,
}

impl DataScope {
    /// Derives a [`DataScope`] from a role and the user's granted metadata.
    /// `admin` always yields `all_access = true`, regardless of metadata.
    #[must_use]
    pub fn derive(role: Role, metadata: ScopeMetadata) -> Self {
        if role == Role::Admin {
            return Self { all_access: true, ..Self::default() };
        }
        Self {
            factory_codes: metadata.factory_codes,
            line_codes: metadata.line_codes,
            product_families: metadata.product_families,
            shift_codes: metadata.shift_codes,
            equipment_ids: metadata.equipment_ids,
            all_access: false,
        }
    }

    /// Whether a row carrying `factory_code` is visible under this scope.
    /// `None` means the row has no factory dimension and is unaffected by
    /// this particular restriction.
    #[must_use]
    pub fn permits_factory(&self, factory_code: Option<&str>) -> bool {
        self.permits(&self.factory_codes, factory_code)
    }

    /// Whether a row carrying `line_code` is visible under this scope.
    #[must_use]
    pub fn permits_line(&self, line_code: Option<&str>) -> bool {
        self.permits(&self.line_codes, line_code)
    }

    /// Whether a row carrying `product_family` is visible under this scope.
    #[must_use]
    pub fn permits_product_family(&self, product_family: Option<&str>) -> bool {
        self.permits(&self.product_families, product_family)
    }

    /// Whether a row carrying `shift_code` is visible under this scope.
    #[must_use]
    pub fn permits_shift(&self, shift_code: Option<&str>) -> bool {
        self.permits(&self.shift_codes, shift_code)
    }

    /// Whether a row carrying `equipment_id` is visible under this scope.
    #[must_use]
    pub fn permits_equipment(&self, equipment_id: Option<&str>) -> bool {
        self.permits(&self.equipment_ids, equipment_id)
    }

    fn permits(&self, allowed: &BTreeSet<String>, value: Option<&str>) -> bool {
        if self.all_access {
            return true;
        }
        match value {
            None => true,
            Some(value) => allowed.contains(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_always_gets_all_access_regardless_of_metadata() {
        let scope = DataScope::derive(Role::Admin, ScopeMetadata::default());
        assert!(scope.all_access);
        assert!(scope.permits_factory(Some("anything")));
    }

    #[test]
    fn empty_scope_without_all_access_denies_every_scoped_row() {
        let scope = DataScope::derive(Role::User, ScopeMetadata::default());
        assert!(!scope.all_access);
        assert!(!scope.permits_factory(Some("F1")));
        assert!(!scope.permits_line(Some("L1")));
    }

    #[test]
    fn rows_without_the_scoped_dimension_are_unaffected() {
        let scope = DataScope::derive(Role::User, ScopeMetadata::default());
        assert!(scope.permits_factory(None));
    }

    #[test]
    fn granted_codes_are_visible_others_are_not() {
        let mut metadata = ScopeMetadata::default();
        metadata.factory_codes.insert("F1".to_string());
        let scope = DataScope::derive(Role::User, metadata);
        assert!(scope.permits_factory(Some("F1")));
        assert!(!scope.permits_factory(Some("F2")));
    }
}
