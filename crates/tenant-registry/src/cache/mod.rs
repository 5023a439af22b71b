//! In-memory caches in front of the tenant store.
//!
//! - [`DomainIndex`] - domain ↔ id mappings used by resolution paths
//! - [`TenantCache`] - fully hydrated tenants keyed by id
//!
//! The two caches are independent. Each one is safe for concurrent use on
//! its own, and neither is kept atomically consistent with the other: after
//! a write, one may briefly be fresh while the other is still being purged.
//! Both use generation tickets so that a value read from the store before an
//! invalidation is never cached after it.

mod domain_index;
mod tenant_cache;

pub use domain_index::{DomainIndex, IndexTicket};
pub use tenant_cache::{LoadTicket, TenantCache};
