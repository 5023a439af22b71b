//! Realm configuration documents.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::tenant::TenantId;

/// A tenant's realm configuration.
///
/// The registry treats most of the document as opaque. It reads
/// `admin_user_name` to derive the tenant's administrator and owns the
/// secondary chain: an ordered list of additional configuration documents
/// linked after the primary one. The chain only grows at its tail and is
/// never serialized; it is rebuilt from external fragments on every
/// hydration.
///
/// # Examples
///
/// ```
/// use tenant_registry::realm::RealmConfig;
///
/// let mut primary = RealmConfig::default();
/// primary.admin_user_name = Some("admin".to_string());
///
/// let mut ldap = RealmConfig::default();
/// ldap.user_store_class = Some("ReadOnlyLdapUserStore".to_string());
/// primary.append_secondary(ldap);
///
/// assert_eq!(primary.chain_len(), 2);
/// assert_eq!(
///     primary.tail().user_store_class.as_deref(),
///     Some("ReadOnlyLdapUserStore")
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealmConfig {
    /// Tenant the document belongs to. Resolved on parse.
    #[serde(skip)]
    pub tenant_id: TenantId,

    /// Realm implementation class.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm_class: Option<String>,

    /// Administrator user name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_user_name: Option<String>,

    /// Administrator role name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_role_name: Option<String>,

    /// Role every user implicitly holds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub everyone_role_name: Option<String>,

    /// User store implementation class.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_store_class: Option<String>,

    /// Realm-level properties.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub realm_properties: BTreeMap<String, String>,

    /// User store properties.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub user_store_properties: BTreeMap<String, String>,

    #[serde(skip)]
    secondary: Vec<RealmConfig>,
}

impl RealmConfig {
    /// Creates an empty primary document owned by `tenant_id`.
    pub fn for_tenant(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            ..Self::default()
        }
    }

    /// Sets the administrator user name.
    pub fn with_admin_user_name(mut self, name: impl Into<String>) -> Self {
        self.admin_user_name = Some(name.into());
        self
    }

    /// Sets the user store implementation class.
    pub fn with_user_store_class(mut self, class: impl Into<String>) -> Self {
        self.user_store_class = Some(class.into());
        self
    }

    /// Returns the secondary configurations, in chain order.
    pub fn secondary(&self) -> &[RealmConfig] {
        &self.secondary
    }

    /// Iterates over the whole chain, primary first.
    pub fn chain(&self) -> impl Iterator<Item = &RealmConfig> {
        std::iter::once(self).chain(self.secondary.iter())
    }

    /// Number of documents in the chain, counting the primary.
    pub fn chain_len(&self) -> usize {
        1 + self.secondary.len()
    }

    /// Returns the last document of the chain.
    pub fn tail(&self) -> &RealmConfig {
        self.secondary.last().unwrap_or(self)
    }

    /// Links a configuration after the current tail.
    ///
    /// A fragment that carries its own chain is flattened so the chain stays
    /// a single sequence.
    pub fn append_secondary(&mut self, mut config: RealmConfig) {
        let nested = std::mem::take(&mut config.secondary);
        self.secondary.push(config);
        self.secondary.extend(nested);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(class: &str) -> RealmConfig {
        RealmConfig::default().with_user_store_class(class)
    }

    #[test]
    fn test_empty_chain() {
        let primary = store("jdbc");
        assert_eq!(primary.chain_len(), 1);
        assert!(primary.secondary().is_empty());
        assert_eq!(primary.tail(), &primary);
    }

    #[test]
    fn test_append_keeps_order() {
        let mut primary = store("jdbc");
        primary.append_secondary(store("ldap"));
        primary.append_secondary(store("ad"));

        let classes: Vec<_> = primary
            .chain()
            .filter_map(|c| c.user_store_class.as_deref())
            .collect();
        assert_eq!(classes, vec!["jdbc", "ldap", "ad"]);
        assert_eq!(primary.tail().user_store_class.as_deref(), Some("ad"));
    }

    #[test]
    fn test_append_flattens_nested_chain() {
        let mut fragment = store("ldap");
        fragment.append_secondary(store("ad"));

        let mut primary = store("jdbc");
        primary.append_secondary(fragment);

        assert_eq!(primary.chain_len(), 3);
        assert!(primary.secondary()[0].secondary().is_empty());
    }

    #[test]
    fn test_for_tenant() {
        let config = RealmConfig::for_tenant(TenantId::new(8)).with_admin_user_name("root");
        assert_eq!(config.tenant_id, TenantId::new(8));
        assert_eq!(config.admin_user_name.as_deref(), Some("root"));
        assert_eq!(config.chain_len(), 1);
    }

    #[test]
    fn test_secondary_not_serialized() {
        let mut primary = store("jdbc");
        primary.tenant_id = TenantId::new(3);
        primary.append_secondary(store("ldap"));

        let json = serde_json::to_value(&primary).unwrap();
        assert_eq!(json, serde_json::json!({"userStoreClass": "jdbc"}));
    }
}
