//! The caching tenant registry.
//!
//! [`TenantRegistry`] implements [`TenantManager`] over any [`TenantStore`].
//! It keeps a [`DomainIndex`] for domain/id resolution and a [`TenantCache`]
//! of hydrated tenants in front of the store, and assembles the realm
//! configuration chain when a tenant is loaded.
//!
//! Update paths invalidate cached state immediately before and again
//! immediately after the store write. Loads take a generation ticket before
//! reading, so a value read before a concurrent invalidation is never cached.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use crate::cache::{DomainIndex, TenantCache};
use crate::error::{StorageError, StorageResult, TenantError};
use crate::manager::TenantManager;
use crate::realm::{
    FragmentSource, JsonRealmConfigCodec, NoFragments, NoopRealmCache, PRIMARY_REALM, RealmCache,
    RealmConfig, RealmConfigCodec, SecondaryChainBuilder,
};
use crate::store::{TenantRecord, TenantRow, TenantStore};
use crate::tenant::{SUPER_TENANT_DOMAIN, Tenant, TenantId, normalize_domain};

#[cfg(feature = "sqlite")]
use crate::config::RegistryConfig;
#[cfg(feature = "sqlite")]
use crate::error::ConfigError;
#[cfg(feature = "sqlite")]
use crate::store::sqlite::SqliteTenantStore;

fn invalid_tenant(message: impl Into<String>) -> StorageError {
    TenantError::InvalidTenant {
        message: message.into(),
    }
    .into()
}

/// Tenant registry backed by a [`TenantStore`].
///
/// The registry is `Send + Sync`; share it between tasks with an [`Arc`].
pub struct TenantRegistry<S> {
    store: S,
    codec: Arc<dyn RealmConfigCodec>,
    fragments: Arc<dyn FragmentSource>,
    chain_builder: SecondaryChainBuilder,
    realm_cache: Arc<dyn RealmCache>,
    domain_index: DomainIndex,
    tenant_cache: TenantCache,
}

impl<S: std::fmt::Debug> std::fmt::Debug for TenantRegistry<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantRegistry")
            .field("store", &self.store)
            .field("indexed_domains", &self.domain_index.len())
            .field("cached_tenants", &self.tenant_cache.len())
            .finish_non_exhaustive()
    }
}

impl<S: TenantStore> TenantRegistry<S> {
    /// Creates a registry over `store` with the JSON codec, no secondary
    /// fragments, and no external realm cache.
    ///
    /// The store schema must already exist.
    pub fn new(store: S) -> Self {
        let codec: Arc<dyn RealmConfigCodec> = Arc::new(JsonRealmConfigCodec);
        let fragments: Arc<dyn FragmentSource> = Arc::new(NoFragments);
        let registry = Self {
            store,
            chain_builder: SecondaryChainBuilder::new(fragments.clone(), codec.clone()),
            codec,
            fragments,
            realm_cache: Arc::new(NoopRealmCache),
            domain_index: DomainIndex::new(),
            tenant_cache: TenantCache::new(),
        };
        registry.clear_caches();
        registry
    }

    /// Replaces the realm configuration codec.
    pub fn with_codec(mut self, codec: Arc<dyn RealmConfigCodec>) -> Self {
        self.codec = codec;
        self.chain_builder = SecondaryChainBuilder::new(self.fragments.clone(), self.codec.clone());
        self
    }

    /// Replaces the source of secondary configuration fragments.
    pub fn with_fragment_source(mut self, fragments: Arc<dyn FragmentSource>) -> Self {
        self.fragments = fragments;
        self.chain_builder = SecondaryChainBuilder::new(self.fragments.clone(), self.codec.clone());
        self
    }

    /// Wires in the external realm cache.
    pub fn with_realm_cache(mut self, realm_cache: Arc<dyn RealmCache>) -> Self {
        self.realm_cache = realm_cache;
        self
    }

    /// Returns the underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns the domain index.
    pub fn domain_index(&self) -> &DomainIndex {
        &self.domain_index
    }

    /// Returns the tenant object cache.
    pub fn tenant_cache(&self) -> &TenantCache {
        &self.tenant_cache
    }

    fn clear_caches(&self) {
        self.domain_index.clear();
        self.tenant_cache.clear();
    }

    /// Evicts every cached entry of `id`, in both directions of the index.
    fn evict(&self, id: TenantId) {
        self.tenant_cache.invalidate(id);
        self.domain_index.forget_id(id);
    }

    /// Validates a tenant and builds the row written for it.
    fn row_for(&self, tenant: &Tenant, realm_config: Option<Vec<u8>>) -> StorageResult<TenantRow> {
        let domain = tenant.normalized_domain();
        if domain.is_empty() {
            return Err(invalid_tenant("tenant domain must not be empty"));
        }
        if domain == SUPER_TENANT_DOMAIN {
            return Err(invalid_tenant(format!(
                "tenant domain '{}' is reserved",
                domain
            )));
        }

        Ok(TenantRow {
            domain,
            email: tenant.email.clone(),
            created_at: tenant.created_at.unwrap_or_else(Utc::now),
            active: tenant.active,
            realm_config,
        })
    }

    fn serialize_config(&self, tenant: &Tenant) -> StorageResult<Option<Vec<u8>>> {
        let payload = tenant
            .realm_config
            .as_ref()
            .map(|config| self.codec.serialize(config))
            .transpose()?;
        Ok(payload)
    }

    /// Turns a stored row into a fully hydrated tenant.
    ///
    /// The primary payload must parse; secondary fragments that do not are
    /// skipped by the chain builder.
    fn hydrate(&self, mut record: TenantRecord) -> StorageResult<Tenant> {
        let id = record.id;
        let mut realm_config = match record.realm_config.take() {
            Some(payload) => {
                let location = format!("realm configuration of tenant {}", id);
                self.codec.parse(&payload, id, &location)?
            }
            None => RealmConfig::for_tenant(id),
        };

        self.chain_builder.attach(id, &mut realm_config);

        let mut tenant = record.into_tenant();
        tenant.admin_name = realm_config.admin_user_name.clone();
        tenant.realm_config = Some(realm_config);
        Ok(tenant)
    }

    async fn insert(&self, tenant: &Tenant, explicit_id: Option<TenantId>) -> StorageResult<TenantId> {
        let payload = self.serialize_config(tenant).inspect_err(|e| {
            tracing::error!(
                domain = %tenant.domain,
                error = %e,
                "Error in serializing the realm configuration"
            );
        })?;
        let row = self.row_for(tenant, payload)?;

        let id = self
            .store
            .insert(&row, explicit_id)
            .await
            .inspect_err(|e| {
                tracing::error!(domain = %row.domain, error = %e, "Error in adding tenant");
            })?;

        tracing::info!(tenant_id = %id, domain = %row.domain, "Added tenant");
        Ok(id)
    }
}

#[cfg(feature = "sqlite")]
impl TenantRegistry<SqliteTenantStore> {
    /// Opens the SQLite store described by `config`, creates its schema, and
    /// builds a registry over it.
    ///
    /// # Examples
    ///
    /// ```
    /// use tenant_registry::{RegistryConfig, Tenant, TenantManager, TenantRegistry};
    ///
    /// # tokio::runtime::Runtime::new().unwrap().block_on(async {
    /// let registry = TenantRegistry::open(&RegistryConfig::default()).await.unwrap();
    /// let id = registry.add_tenant(&Tenant::new("acme.com", "admin@acme.com")).await.unwrap();
    /// assert_eq!(registry.get_tenant_id("ACME.com").await.unwrap(), id);
    /// # });
    /// ```
    pub async fn open(config: &RegistryConfig) -> StorageResult<Self> {
        config.validate().map_err(|errors| ConfigError::Parse {
            location: "registry configuration".to_string(),
            message: errors.join("; "),
        })?;

        let store = match &config.database {
            Some(path) => SqliteTenantStore::with_config(path, config.store.clone())?,
            None => SqliteTenantStore::with_config(":memory:", config.store.clone())?,
        };
        store.init_schema().await?;

        Ok(Self::new(store).with_fragment_source(config.fragment_source()))
    }
}

#[async_trait]
impl<S: TenantStore> TenantManager for TenantRegistry<S> {
    async fn add_tenant(&self, tenant: &Tenant) -> StorageResult<TenantId> {
        if tenant.id.is_assigned() {
            return self.add_tenant_with_given_id(tenant).await;
        }
        self.insert(tenant, None).await
    }

    async fn add_tenant_with_given_id(&self, tenant: &Tenant) -> StorageResult<TenantId> {
        let id = tenant.id;
        if !id.is_assigned() {
            return Err(invalid_tenant(format!(
                "tenant id {} cannot be assigned explicitly",
                id
            )));
        }

        if self.get_tenant(id).await?.is_some() {
            tracing::error!(tenant_id = %id, domain = %tenant.domain, "Tenant already exists");
            return Err(TenantError::AlreadyExists { tenant_id: id }.into());
        }

        // A concurrent insert between the check and here hits the primary key
        // and surfaces as the same AlreadyExists error.
        self.insert(tenant, Some(id)).await
    }

    async fn update_tenant(&self, tenant: &Tenant) -> StorageResult<()> {
        let id = tenant.id;
        let row = self.row_for(tenant, None)?;

        self.evict(id);
        let result = self.store.update(id, &row).await;
        self.evict(id);

        let changed = result.inspect_err(|e| {
            tracing::error!(
                tenant_id = %id,
                domain = %row.domain,
                error = %e,
                "Error in updating tenant"
            );
        })?;
        if !changed {
            tracing::debug!(tenant_id = %id, "No tenant row to update");
        }
        Ok(())
    }

    async fn update_tenant_realm_config(&self, tenant: &Tenant) -> StorageResult<()> {
        let id = tenant.id;
        let Some(config) = tenant.realm_config.as_ref() else {
            tracing::debug!(tenant_id = %id, "No realm configuration to store");
            return Ok(());
        };

        let payload = self.codec.serialize(config).inspect_err(|e| {
            tracing::error!(
                tenant_id = %id,
                error = %e,
                "Error in serializing the realm configuration"
            );
        })?;
        if payload.iter().all(u8::is_ascii_whitespace) {
            tracing::debug!(tenant_id = %id, "Serialized realm configuration is empty");
            return Ok(());
        }

        let changed = self
            .store
            .update_config(id, &payload)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    tenant_id = %id,
                    error = %e,
                    "Error in updating the realm configuration"
                );
            })?;

        self.tenant_cache.invalidate(id);
        self.realm_cache.invalidate(id, PRIMARY_REALM);

        if changed {
            tracing::info!(tenant_id = %id, "Updated realm configuration");
        }
        Ok(())
    }

    async fn get_tenant(&self, id: TenantId) -> StorageResult<Option<Arc<Tenant>>> {
        if !id.is_assigned() {
            return Ok(None);
        }
        if let Some(tenant) = self.tenant_cache.get(id) {
            return Ok(Some(tenant));
        }

        let ticket = self.tenant_cache.ticket(id);
        let record = self.store.select_by_id(id).await.inspect_err(|e| {
            tracing::error!(tenant_id = %id, error = %e, "Error in getting tenant");
        })?;
        let Some(record) = record else {
            return Ok(None);
        };

        let tenant = Arc::new(self.hydrate(record).inspect_err(|e| {
            tracing::error!(tenant_id = %id, error = %e, "Error in loading tenant");
        })?);
        self.tenant_cache.put(ticket, tenant.clone());
        Ok(Some(tenant))
    }

    async fn get_all_tenants(&self) -> StorageResult<Vec<Tenant>> {
        let records = self.store.select_all().await.inspect_err(|e| {
            tracing::error!(error = %e, "Error in getting the tenants");
        })?;
        Ok(records.into_iter().map(TenantRecord::into_tenant).collect())
    }

    async fn get_tenants_matching_domain(&self, fragment: &str) -> StorageResult<Vec<Tenant>> {
        let records = self
            .store
            .select_by_domain_substring(fragment)
            .await
            .inspect_err(|e| {
                tracing::error!(
                    fragment,
                    error = %e,
                    "Error in getting the tenants matching domain"
                );
            })?;
        Ok(records.into_iter().map(TenantRecord::into_tenant).collect())
    }

    async fn get_domain(&self, id: TenantId) -> StorageResult<Option<String>> {
        if id.is_super() {
            return Ok(Some(SUPER_TENANT_DOMAIN.to_string()));
        }
        if !id.is_assigned() {
            return Ok(None);
        }
        if let Some(domain) = self.domain_index.lookup_domain(id) {
            return Ok(Some(domain));
        }

        let ticket = self.domain_index.ticket();
        let domain = self
            .store
            .select_domain_by_id(id)
            .await
            .inspect_err(|e| {
                tracing::error!(tenant_id = %id, error = %e, "Error in getting tenant domain");
            })?;
        if let Some(domain) = &domain {
            self.domain_index.remember(ticket, domain, id);
        }
        Ok(domain)
    }

    async fn get_tenant_id(&self, domain: &str) -> StorageResult<TenantId> {
        let domain = normalize_domain(domain);
        if domain == SUPER_TENANT_DOMAIN {
            return Ok(TenantId::SUPER);
        }
        if domain.is_empty() {
            return Ok(TenantId::INVALID);
        }
        if let Some(id) = self.domain_index.lookup_id(&domain) {
            return Ok(id);
        }

        let ticket = self.domain_index.ticket();
        let id = self
            .store
            .select_id_by_domain(&domain)
            .await
            .inspect_err(|e| {
                tracing::error!(domain = %domain, error = %e, "Error in getting tenant id");
            })?
            .unwrap_or(TenantId::INVALID);
        if id.is_valid() {
            self.domain_index.remember(ticket, &domain, id);
        }
        Ok(id)
    }

    async fn activate_tenant(&self, id: TenantId) -> StorageResult<()> {
        self.tenant_cache.invalidate(id);
        let result = self.store.set_active(id, true).await;
        self.tenant_cache.invalidate(id);

        let changed = result.inspect_err(|e| {
            tracing::error!(tenant_id = %id, error = %e, "Error in activating the tenant");
        })?;
        if changed {
            tracing::info!(tenant_id = %id, "Activated tenant");
        } else {
            tracing::debug!(tenant_id = %id, "No tenant row to activate");
        }
        Ok(())
    }

    async fn deactivate_tenant(&self, id: TenantId) -> StorageResult<()> {
        self.evict(id);
        let result = self.store.set_active(id, false).await;
        self.evict(id);

        let changed = result.inspect_err(|e| {
            tracing::error!(tenant_id = %id, error = %e, "Error in deactivating the tenant");
        })?;
        if changed {
            tracing::info!(tenant_id = %id, "Deactivated tenant");
        } else {
            tracing::debug!(tenant_id = %id, "No tenant row to deactivate");
        }
        Ok(())
    }

    async fn is_tenant_active(&self, id: TenantId) -> StorageResult<bool> {
        if id.is_super() {
            return Ok(true);
        }
        if !id.is_assigned() {
            return Ok(false);
        }

        let active = self.store.select_active(id).await.inspect_err(|e| {
            tracing::error!(tenant_id = %id, error = %e, "Error in getting tenant status");
        })?;
        Ok(active.unwrap_or(false))
    }

    async fn delete_tenant(
        &self,
        id: TenantId,
        remove_from_persistent_storage: bool,
    ) -> StorageResult<()> {
        let domain = self.get_domain(id).await?;

        self.evict(id);
        if let Some(domain) = &domain {
            self.domain_index.forget_domain(domain);
        }

        if remove_from_persistent_storage {
            let result = self.store.delete(id).await;
            self.evict(id);

            let deleted = result.inspect_err(|e| {
                tracing::error!(tenant_id = %id, error = %e, "Error in deleting the tenant");
            })?;
            if deleted {
                tracing::info!(
                    tenant_id = %id,
                    domain = domain.as_deref().unwrap_or_default(),
                    "Deleted tenant"
                );
            }
        }
        Ok(())
    }

    fn reset_caches(&self) {
        self.clear_caches();
        tracing::debug!("Cleared tenant caches");
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;

    async fn registry() -> TenantRegistry<SqliteTenantStore> {
        let store = SqliteTenantStore::in_memory().unwrap();
        store.init_schema().await.unwrap();
        TenantRegistry::new(store)
    }

    #[tokio::test]
    async fn test_row_rejects_empty_and_reserved_domains() {
        let registry = registry().await;

        let err = registry
            .row_for(&Tenant::new("", "a@b.c"), None)
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::Tenant(TenantError::InvalidTenant { .. })
        ));

        let err = registry
            .row_for(&Tenant::new("Carbon.Super", "a@b.c"), None)
            .unwrap_err();
        assert!(matches!(
            err,
            StorageError::Tenant(TenantError::InvalidTenant { .. })
        ));
    }

    #[tokio::test]
    async fn test_row_fills_missing_creation_time() {
        let registry = registry().await;
        let before = Utc::now();
        let row = registry
            .row_for(&Tenant::new("Acme.COM", "a@acme.com"), None)
            .unwrap();
        assert_eq!(row.domain, "acme.com");
        assert!(row.created_at >= before);
    }

    #[tokio::test]
    async fn test_hydrate_without_payload_gets_empty_config() {
        let registry = registry().await;
        let id = registry
            .add_tenant(&Tenant::new("bare.org", "ops@bare.org"))
            .await
            .unwrap();

        let tenant = registry.get_tenant(id).await.unwrap().unwrap();
        let config = tenant.realm_config.as_ref().unwrap();
        assert_eq!(config.tenant_id, id);
        assert_eq!(config.chain_len(), 1);
        assert!(tenant.admin_name.is_none());
    }

    #[tokio::test]
    async fn test_reserved_ids_skip_store() {
        let registry = registry().await;
        assert!(registry.get_tenant(TenantId::SUPER).await.unwrap().is_none());
        assert!(registry.get_tenant(TenantId::INVALID).await.unwrap().is_none());
        assert_eq!(
            registry.get_domain(TenantId::SUPER).await.unwrap().as_deref(),
            Some(SUPER_TENANT_DOMAIN)
        );
        assert!(registry.get_domain(TenantId::INVALID).await.unwrap().is_none());
        assert!(registry.is_tenant_active(TenantId::SUPER).await.unwrap());
    }
}
