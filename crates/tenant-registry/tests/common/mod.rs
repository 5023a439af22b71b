//! Shared fixtures for the tenant registry integration tests.

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tenant_registry::error::{ConfigError, ConfigResult};
use tenant_registry::realm::{
    DirectoryFragmentSource, JsonRealmConfigCodec, RealmCache, RealmConfig, RealmConfigCodec,
    USER_STORES_DIR,
};
use tenant_registry::{SqliteTenantStore, Tenant, TenantId, TenantRegistry, TenantStore};

/// Creates an in-memory store with its schema.
pub async fn create_store() -> SqliteTenantStore {
    let store = SqliteTenantStore::in_memory().expect("Failed to create SQLite store");
    store.init_schema().await.expect("Failed to initialize schema");
    store
}

/// Creates a registry over a fresh in-memory store.
pub async fn create_registry() -> TenantRegistry<SqliteTenantStore> {
    TenantRegistry::new(create_store().await)
}

/// Creates a registry that discovers fragments under `tenants_dir`.
pub async fn create_registry_with_fragments(
    tenants_dir: &Path,
) -> TenantRegistry<SqliteTenantStore> {
    create_registry()
        .await
        .with_fragment_source(Arc::new(DirectoryFragmentSource::new(tenants_dir, "json")))
}

/// A primary realm configuration with an administrator.
pub fn realm_config(admin: &str) -> RealmConfig {
    let mut config = RealmConfig::default()
        .with_admin_user_name(admin)
        .with_user_store_class("JdbcUserStore");
    config.realm_class = Some("DefaultRealm".to_string());
    config.admin_role_name = Some("admin".to_string());
    config.everyone_role_name = Some("everyone".to_string());
    config
}

/// A tenant with a primary realm configuration.
pub fn tenant(domain: &str) -> Tenant {
    Tenant::new(domain, format!("admin@{}", domain.to_lowercase()))
        .with_realm_config(realm_config("admin"))
}

/// Writes a secondary configuration fragment for `tenant_id`.
pub fn write_fragment(tenants_dir: &Path, tenant_id: TenantId, file_name: &str, contents: &str) {
    let dir = tenants_dir
        .join(tenant_id.to_string())
        .join(USER_STORES_DIR);
    std::fs::create_dir_all(&dir).expect("Failed to create fragment directory");
    std::fs::write(dir.join(file_name), contents).expect("Failed to write fragment");
}

/// A secondary fragment document naming its user store class.
pub fn fragment(user_store_class: &str) -> String {
    format!(r#"{{"userStoreClass": "{}"}}"#, user_store_class)
}

/// Realm cache that records every invalidation.
#[derive(Debug, Default)]
pub struct RecordingRealmCache {
    invalidations: Mutex<Vec<(TenantId, String)>>,
}

impl RecordingRealmCache {
    pub fn invalidations(&self) -> Vec<(TenantId, String)> {
        self.invalidations.lock().clone()
    }
}

impl RealmCache for RecordingRealmCache {
    fn invalidate(&self, tenant_id: TenantId, realm_name: &str) {
        self.invalidations
            .lock()
            .push((tenant_id, realm_name.to_string()));
    }
}

/// JSON codec whose serialization always fails.
#[derive(Debug, Default)]
pub struct UnserializableCodec;

impl RealmConfigCodec for UnserializableCodec {
    fn serialize(&self, _config: &RealmConfig) -> ConfigResult<Vec<u8>> {
        Err(ConfigError::Serialize {
            message: "payload rejected".to_string(),
        })
    }

    fn parse(
        &self,
        bytes: &[u8],
        tenant_id: TenantId,
        location: &str,
    ) -> ConfigResult<RealmConfig> {
        JsonRealmConfigCodec.parse(bytes, tenant_id, location)
    }
}
