//! Tenant identifier type.
//!
//! This module defines the [`TenantId`] type, the integer identifier assigned
//! to every tenant row, together with the reserved sentinel values that never
//! touch storage.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Domain of the super tenant.
///
/// The super tenant is resolved by constant comparison and is never stored.
pub const SUPER_TENANT_DOMAIN: &str = "carbon.super";

/// An integer tenant identifier.
///
/// Store-assigned identifiers are always positive. Two negative values are
/// reserved: [`TenantId::SUPER`] for the super tenant and
/// [`TenantId::INVALID`] for "no such tenant". Zero marks a tenant that has
/// not been assigned an id yet.
///
/// # Examples
///
/// ```
/// use tenant_registry::tenant::TenantId;
///
/// let id = TenantId::new(5);
/// assert!(id.is_assigned());
/// assert!(!TenantId::UNASSIGNED.is_assigned());
/// assert!(TenantId::SUPER.is_reserved());
/// assert_eq!(id.to_string(), "5");
/// ```
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(i32);

impl TenantId {
    /// Identifier of the super tenant.
    pub const SUPER: TenantId = TenantId(-1234);

    /// Sentinel returned when a domain does not resolve to a tenant.
    pub const INVALID: TenantId = TenantId(-1);

    /// Placeholder for a tenant whose id the store will assign.
    pub const UNASSIGNED: TenantId = TenantId(0);

    /// Creates a tenant ID from its raw value.
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Returns the raw integer value.
    pub const fn value(self) -> i32 {
        self.0
    }

    /// Returns `true` for ids that can name a stored tenant row.
    pub const fn is_assigned(self) -> bool {
        self.0 > 0
    }

    /// Returns `true` for the super tenant and invalid sentinels.
    pub const fn is_reserved(self) -> bool {
        self.0 == Self::SUPER.0 || self.0 == Self::INVALID.0
    }

    /// Returns `true` if this is the super tenant.
    pub const fn is_super(self) -> bool {
        self.0 == Self::SUPER.0
    }

    /// Returns `true` unless this is the invalid sentinel.
    pub const fn is_valid(self) -> bool {
        self.0 != Self::INVALID.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TenantId({})", self.0)
    }
}

impl FromStr for TenantId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(TenantId)
    }
}

impl From<i32> for TenantId {
    fn from(id: i32) -> Self {
        TenantId(id)
    }
}

impl From<TenantId> for i32 {
    fn from(id: TenantId) -> Self {
        id.0
    }
}

/// Normalizes a tenant domain for storage and lookup.
///
/// Domains are case-insensitive; the canonical form is lowercase.
///
/// # Examples
///
/// ```
/// use tenant_registry::tenant::normalize_domain;
///
/// assert_eq!(normalize_domain("ACME.com"), "acme.com");
/// ```
pub fn normalize_domain(domain: &str) -> String {
    domain.to_lowercase()
}
