//! Cache of fully hydrated tenants.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::tenant::{Tenant, TenantId};

/// Generation of one tenant's slot observed before hydrating it from the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    id: TenantId,
    epoch: u64,
    generation: u64,
}

#[derive(Debug, Default)]
struct Slots {
    entries: HashMap<TenantId, Arc<Tenant>>,
    generations: HashMap<TenantId, u64>,
    epoch: u64,
}

impl Slots {
    fn generation(&self, id: TenantId) -> u64 {
        self.generations.get(&id).copied().unwrap_or(0)
    }
}

/// Id-keyed cache of hydrated [`Tenant`] objects.
///
/// Each id has its own generation, advanced by [`invalidate`](TenantCache::invalidate)
/// in the same critical section that removes the entry. A load of that id
/// started before the invalidation carries an older ticket and its
/// [`put`](TenantCache::put) is dropped, so a slow reader cannot reinstate a
/// tenant that a concurrent write has already superseded. Loads of other ids
/// are unaffected. [`clear`](TenantCache::clear) advances an epoch shared by
/// all ids.
#[derive(Debug, Default)]
pub struct TenantCache {
    slots: RwLock<Slots>,
}

impl TenantCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached tenant for `id`.
    pub fn get(&self, id: TenantId) -> Option<Arc<Tenant>> {
        self.slots.read().entries.get(&id).cloned()
    }

    /// Takes a ticket before reading tenant `id` from the store.
    pub fn ticket(&self, id: TenantId) -> LoadTicket {
        let slots = self.slots.read();
        LoadTicket {
            id,
            epoch: slots.epoch,
            generation: slots.generation(id),
        }
    }

    /// Caches a tenant loaded under `ticket`.
    ///
    /// Returns `false` if the tenant's id does not match the ticket, or if
    /// the id was invalidated or the cache cleared after the ticket was taken.
    pub fn put(&self, ticket: LoadTicket, tenant: Arc<Tenant>) -> bool {
        let mut slots = self.slots.write();
        if tenant.id != ticket.id
            || slots.epoch != ticket.epoch
            || slots.generation(ticket.id) != ticket.generation
        {
            return false;
        }
        slots.entries.insert(ticket.id, tenant);
        true
    }

    /// Drops the entry for `id`.
    pub fn invalidate(&self, id: TenantId) {
        let mut slots = self.slots.write();
        *slots.generations.entry(id).or_insert(0) += 1;
        slots.entries.remove(&id);
    }

    /// Drops every entry.
    pub fn clear(&self) {
        let mut slots = self.slots.write();
        slots.epoch += 1;
        slots.entries.clear();
        slots.generations.clear();
    }

    /// Number of cached tenants.
    pub fn len(&self) -> usize {
        self.slots.read().entries.len()
    }

    /// Returns `true` if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.slots.read().entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tenant(id: i32) -> Arc<Tenant> {
        Arc::new(Tenant::new("acme.com", "a@acme.com").with_id(TenantId::new(id)))
    }

    #[test]
    fn test_put_get_invalidate() {
        let cache = TenantCache::new();
        assert!(cache.put(cache.ticket(TenantId::new(1)), tenant(1)));
        assert_eq!(cache.get(TenantId::new(1)).unwrap().domain, "acme.com");

        cache.invalidate(TenantId::new(1));
        assert!(cache.get(TenantId::new(1)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_put_after_invalidation_is_dropped() {
        let cache = TenantCache::new();
        let ticket = cache.ticket(TenantId::new(1));
        cache.invalidate(TenantId::new(1));

        assert!(!cache.put(ticket, tenant(1)));
        assert!(cache.get(TenantId::new(1)).is_none());

        assert!(cache.put(cache.ticket(TenantId::new(1)), tenant(1)));
    }

    #[test]
    fn test_invalidating_other_tenant_keeps_load() {
        let cache = TenantCache::new();
        let ticket = cache.ticket(TenantId::new(1));
        cache.invalidate(TenantId::new(2));

        assert!(cache.put(ticket, tenant(1)));
        assert!(cache.get(TenantId::new(1)).is_some());
    }

    #[test]
    fn test_put_under_wrong_ticket_is_dropped() {
        let cache = TenantCache::new();
        assert!(!cache.put(cache.ticket(TenantId::new(1)), tenant(2)));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = TenantCache::new();
        cache.put(cache.ticket(TenantId::new(1)), tenant(1));
        cache.put(cache.ticket(TenantId::new(2)), tenant(2));
        assert_eq!(cache.len(), 2);

        let ticket = cache.ticket(TenantId::new(3));
        cache.clear();
        assert!(cache.is_empty());
        assert!(!cache.put(ticket, tenant(3)));
    }
}
