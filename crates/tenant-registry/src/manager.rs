//! The public tenant management contract.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::StorageResult;
use crate::tenant::{SUPER_TENANT_DOMAIN, Tenant, TenantId};

/// Tenant management operations.
///
/// This is the contract the rest of the identity system calls on nearly
/// every request: resolving domains to ids and hydrating tenants. Reads that
/// find nothing return `Ok(None)` (or the [`TenantId::INVALID`] sentinel for
/// [`get_tenant_id`](TenantManager::get_tenant_id)); only failed operations
/// return errors.
///
/// Implementations must leave no stale cache entry behind once a mutating
/// call has returned.
#[async_trait]
pub trait TenantManager: Send + Sync {
    /// Adds a tenant and returns its id.
    ///
    /// A tenant whose `id` is positive is created under that id through
    /// [`add_tenant_with_given_id`](TenantManager::add_tenant_with_given_id);
    /// otherwise the store assigns a fresh id.
    ///
    /// # Errors
    ///
    /// * `TenantError::AlreadyExists` - If an explicit id is taken
    /// * `TenantError::DomainAlreadyExists` - If the domain is taken
    /// * `TenantError::InvalidTenant` - If the domain is empty or reserved
    async fn add_tenant(&self, tenant: &Tenant) -> StorageResult<TenantId>;

    /// Adds a tenant under the caller-supplied id.
    ///
    /// Used to replicate a tenant across environments with the same id.
    async fn add_tenant_with_given_id(&self, tenant: &Tenant) -> StorageResult<TenantId>;

    /// Updates domain, email and creation time. The configuration payload
    /// and active flag are left untouched.
    async fn update_tenant(&self, tenant: &Tenant) -> StorageResult<()>;

    /// Replaces the stored primary realm configuration.
    async fn update_tenant_realm_config(&self, tenant: &Tenant) -> StorageResult<()>;

    /// Returns the fully hydrated tenant, with its realm configuration chain.
    async fn get_tenant(&self, id: TenantId) -> StorageResult<Option<Arc<Tenant>>>;

    /// Lists every tenant, without realm configuration.
    async fn get_all_tenants(&self) -> StorageResult<Vec<Tenant>>;

    /// Lists tenants whose domain contains `fragment`, case-insensitively.
    async fn get_tenants_matching_domain(&self, fragment: &str) -> StorageResult<Vec<Tenant>>;

    /// Resolves a tenant id to its domain.
    async fn get_domain(&self, id: TenantId) -> StorageResult<Option<String>>;

    /// Resolves a domain to its tenant id, or [`TenantId::INVALID`].
    async fn get_tenant_id(&self, domain: &str) -> StorageResult<TenantId>;

    /// Marks a tenant active.
    async fn activate_tenant(&self, id: TenantId) -> StorageResult<()>;

    /// Marks a tenant inactive.
    async fn deactivate_tenant(&self, id: TenantId) -> StorageResult<()>;

    /// Returns whether a tenant is active. Unknown tenants are inactive.
    async fn is_tenant_active(&self, id: TenantId) -> StorageResult<bool>;

    /// Evicts a tenant from every cache and, if requested, deletes its row.
    async fn delete_tenant(
        &self,
        id: TenantId,
        remove_from_persistent_storage: bool,
    ) -> StorageResult<()>;

    /// Evicts a tenant and deletes its row.
    async fn delete_tenant_completely(&self, id: TenantId) -> StorageResult<()> {
        self.delete_tenant(id, true).await
    }

    /// Domain of the super tenant.
    fn super_tenant_domain(&self) -> &'static str {
        SUPER_TENANT_DOMAIN
    }

    /// Drops every cached mapping and tenant.
    fn reset_caches(&self);

    /// Prepares storage partitions of existing tenants.
    ///
    /// Relational stores keep every tenant in one table and need nothing.
    async fn initialize_existing_partitions(&self) -> StorageResult<()> {
        Ok(())
    }
}
