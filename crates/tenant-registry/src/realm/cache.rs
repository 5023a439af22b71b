//! Invalidation hook for the external realm cache.

use crate::tenant::TenantId;

/// Name under which a tenant's primary realm is cached.
pub const PRIMARY_REALM: &str = "primary";

/// A cache of instantiated realms kept outside the registry.
///
/// The registry calls [`invalidate`](RealmCache::invalidate) after every
/// successful update of a tenant's configuration payload.
pub trait RealmCache: Send + Sync {
    /// Drops the cached realm `realm_name` of `tenant_id`.
    fn invalidate(&self, tenant_id: TenantId, realm_name: &str);
}

/// Realm cache used when no external cache is wired in.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRealmCache;

impl RealmCache for NoopRealmCache {
    fn invalidate(&self, _tenant_id: TenantId, _realm_name: &str) {}
}
