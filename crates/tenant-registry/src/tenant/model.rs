//! The tenant record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::realm::RealmConfig;

use super::{TenantId, normalize_domain};

/// A tenant of the identity system.
///
/// Tenants returned by [`get_tenant`](crate::manager::TenantManager::get_tenant)
/// are fully hydrated: `realm_config` carries the primary configuration with
/// its secondary chain attached and `admin_name` is copied from it. Tenants
/// returned by the listing operations are lightweight and carry neither.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    /// Store-assigned or caller-assigned identifier. Zero when unassigned.
    #[serde(default)]
    pub id: TenantId,
    /// Unique tenant domain.
    pub domain: String,
    /// Contact email.
    pub email: String,
    /// Creation timestamp. Filled with the current time on insert if absent.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Whether the tenant may authenticate.
    #[serde(default = "default_active")]
    pub active: bool,
    /// Administrator user name, derived from the primary realm configuration.
    #[serde(default)]
    pub admin_name: Option<String>,
    /// Primary realm configuration with its secondary chain.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm_config: Option<RealmConfig>,
}

fn default_active() -> bool {
    true
}

impl Tenant {
    /// Creates an active tenant that has not been assigned an id.
    pub fn new(domain: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: TenantId::UNASSIGNED,
            domain: domain.into(),
            email: email.into(),
            created_at: None,
            active: true,
            admin_name: None,
            realm_config: None,
        }
    }

    /// Sets an explicit id (pre-provisioning).
    pub fn with_id(mut self, id: TenantId) -> Self {
        self.id = id;
        self
    }

    /// Sets the primary realm configuration.
    pub fn with_realm_config(mut self, config: RealmConfig) -> Self {
        self.realm_config = Some(config);
        self
    }

    /// Sets the creation timestamp.
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Sets the active flag.
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Returns the domain in its canonical lowercase form.
    pub fn normalized_domain(&self) -> String {
        normalize_domain(&self.domain)
    }

    /// Length of the realm configuration chain, counting the primary.
    pub fn realm_chain_len(&self) -> usize {
        self.realm_config.as_ref().map_or(0, RealmConfig::chain_len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tenant_defaults() {
        let tenant = Tenant::new("ACME.com", "a@acme.com");
        assert_eq!(tenant.id, TenantId::UNASSIGNED);
        assert!(tenant.active);
        assert_eq!(tenant.normalized_domain(), "acme.com");
        assert_eq!(tenant.realm_chain_len(), 0);
    }

    #[test]
    fn test_deserialize_minimal() {
        let tenant: Tenant =
            serde_json::from_str(r#"{"domain": "acme.com", "email": "a@acme.com"}"#).unwrap();
        assert!(tenant.active);
        assert!(tenant.created_at.is_none());
        assert!(!tenant.id.is_assigned());
    }

    #[test]
    fn test_builder_chain() {
        let tenant = Tenant::new("acme.com", "a@acme.com")
            .with_id(TenantId::new(9))
            .with_active(false)
            .with_realm_config(RealmConfig::default());
        assert_eq!(tenant.id.value(), 9);
        assert!(!tenant.active);
        assert_eq!(tenant.realm_chain_len(), 1);
    }
}
