//! Persistent tenant storage.
//!
//! The [`TenantStore`] trait is the durable leaf of the registry. Each method
//! is one atomic unit of work: it acquires a connection, runs inside a single
//! transaction, commits on success or rolls back on failure, and releases
//! the connection on every exit path.
//!
//! Update-style methods report whether a row was affected instead of
//! failing when the id does not exist.

#[cfg(feature = "sqlite")]
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::StorageResult;
use crate::tenant::{Tenant, TenantId};

/// Column values written for a tenant.
#[derive(Debug, Clone, PartialEq)]
pub struct TenantRow {
    /// Normalized (lowercase) domain.
    pub domain: String,
    /// Contact email.
    pub email: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Active flag. Ignored by [`TenantStore::update`].
    pub active: bool,
    /// Serialized primary realm configuration.
    pub realm_config: Option<Vec<u8>>,
}

/// A tenant row read back from storage.
#[derive(Debug, Clone, PartialEq)]
pub struct TenantRecord {
    /// Tenant id.
    pub id: TenantId,
    /// Normalized domain.
    pub domain: String,
    /// Contact email.
    pub email: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Active flag.
    pub active: bool,
    /// Serialized primary realm configuration. Listing queries leave it out.
    pub realm_config: Option<Vec<u8>>,
}

impl TenantRecord {
    /// Converts the row into a lightweight tenant without configuration.
    pub fn into_tenant(self) -> Tenant {
        Tenant {
            id: self.id,
            domain: self.domain,
            email: self.email,
            created_at: Some(self.created_at),
            active: self.active,
            admin_name: None,
            realm_config: None,
        }
    }
}

/// Durable CRUD over tenant rows.
#[async_trait]
pub trait TenantStore: Send + Sync {
    /// Returns a human-readable name for this storage backend.
    fn backend_name(&self) -> &'static str;

    /// Creates the schema if needed. Idempotent.
    async fn init_schema(&self) -> StorageResult<()>;

    /// Inserts a tenant row.
    ///
    /// With `explicit_id` the row is stored under that id; otherwise the
    /// store assigns a fresh id that has never been issued before.
    ///
    /// # Errors
    ///
    /// * `TenantError::AlreadyExists` - If the explicit id is taken
    /// * `TenantError::DomainAlreadyExists` - If the domain is taken
    async fn insert(&self, row: &TenantRow, explicit_id: Option<TenantId>)
    -> StorageResult<TenantId>;

    /// Updates domain, email and creation time. Leaves the active flag and
    /// configuration payload untouched.
    async fn update(&self, id: TenantId, row: &TenantRow) -> StorageResult<bool>;

    /// Replaces only the configuration payload.
    async fn update_config(&self, id: TenantId, realm_config: &[u8]) -> StorageResult<bool>;

    /// Reads a full row, including the configuration payload.
    async fn select_by_id(&self, id: TenantId) -> StorageResult<Option<TenantRecord>>;

    /// Resolves a normalized domain to its id.
    async fn select_id_by_domain(&self, domain: &str) -> StorageResult<Option<TenantId>>;

    /// Resolves an id to its domain.
    async fn select_domain_by_id(&self, id: TenantId) -> StorageResult<Option<String>>;

    /// Reads the active flag of a tenant.
    async fn select_active(&self, id: TenantId) -> StorageResult<Option<bool>>;

    /// Lists every tenant, without configuration payloads.
    async fn select_all(&self) -> StorageResult<Vec<TenantRecord>>;

    /// Lists tenants whose domain contains `fragment`, case-insensitively.
    async fn select_by_domain_substring(&self, fragment: &str)
    -> StorageResult<Vec<TenantRecord>>;

    /// Sets the active flag.
    async fn set_active(&self, id: TenantId, active: bool) -> StorageResult<bool>;

    /// Deletes a tenant row.
    async fn delete(&self, id: TenantId) -> StorageResult<bool>;
}
