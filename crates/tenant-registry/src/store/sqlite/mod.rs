//! SQLite tenant store.
//!
//! Supports in-memory databases (for tests and embedded use) and file-based
//! databases. File databases run in WAL mode so readers do not block the
//! single writer.
//!
//! # Example
//!
//! ```no_run
//! use tenant_registry::store::TenantStore;
//! use tenant_registry::store::sqlite::SqliteTenantStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqliteTenantStore::open("tenants.db")?;
//! store.init_schema().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE tenants (
//!     id INTEGER PRIMARY KEY AUTOINCREMENT,
//!     domain TEXT NOT NULL UNIQUE COLLATE NOCASE,
//!     email TEXT NOT NULL,
//!     created_at TEXT NOT NULL,     -- RFC 3339
//!     active INTEGER NOT NULL DEFAULT 1,
//!     realm_config BLOB
//! );
//! ```

mod backend;
mod schema;
mod storage;

pub use backend::{SqliteStoreConfig, SqliteTenantStore};
pub use schema::SCHEMA_VERSION;
