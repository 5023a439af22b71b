//! Tenant Registry
//!
//! This crate keeps the authoritative list of tenants of a multi-tenant
//! identity system. It persists tenants in a relational store, resolves
//! domains to ids and back through an in-memory index, caches fully loaded
//! tenants, and assembles each tenant's realm configuration from its stored
//! primary document plus any secondary fragments found on disk.
//!
//! # Features
//!
//! - `sqlite` (default) - SQLite store with in-memory and file modes
//! - `cli` - the `tenant-admin` administration binary
//!
//! # Architecture
//!
//! - [`tenant`] - Tenant ids, reserved sentinels, and the tenant record
//! - [`store`] - The [`TenantStore`] trait and its SQLite implementation
//! - [`cache`] - Domain index and tenant object cache
//! - [`realm`] - Realm configuration documents and secondary chain assembly
//! - [`manager`] - The [`TenantManager`] contract
//! - [`registry`] - [`TenantRegistry`], the caching implementation
//! - [`config`] - Registry configuration
//! - [`error`] - Error types for all operations
//!
//! # Quick Start
//!
//! ```
//! use tenant_registry::realm::RealmConfig;
//! use tenant_registry::{RegistryConfig, Tenant, TenantId, TenantManager, TenantRegistry};
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let registry = TenantRegistry::open(&RegistryConfig::default()).await.unwrap();
//!
//! let config = RealmConfig::default().with_admin_user_name("admin");
//! let tenant = Tenant::new("Acme.com", "admin@acme.com").with_realm_config(config);
//! let id = registry.add_tenant(&tenant).await.unwrap();
//!
//! assert_eq!(registry.get_tenant_id("acme.com").await.unwrap(), id);
//! assert_eq!(registry.get_domain(id).await.unwrap().as_deref(), Some("acme.com"));
//!
//! let loaded = registry.get_tenant(id).await.unwrap().unwrap();
//! assert_eq!(loaded.admin_name.as_deref(), Some("admin"));
//!
//! registry.delete_tenant(id, true).await.unwrap();
//! assert_eq!(registry.get_tenant_id("acme.com").await.unwrap(), TenantId::INVALID);
//! # });
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod cache;
pub mod config;
pub mod error;
pub mod manager;
pub mod realm;
pub mod registry;
pub mod store;
pub mod tenant;

// Re-export commonly used types at crate root
pub use config::RegistryConfig;
pub use error::{BackendError, ConfigError, StorageError, StorageResult, TenantError};
pub use manager::TenantManager;
pub use registry::TenantRegistry;
pub use store::{TenantRecord, TenantRow, TenantStore};
pub use tenant::{SUPER_TENANT_DOMAIN, Tenant, TenantId};

#[cfg(feature = "sqlite")]
pub use store::sqlite::{SqliteStoreConfig, SqliteTenantStore};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
