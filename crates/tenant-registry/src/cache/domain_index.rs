//! Bidirectional domain ↔ id index.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use crate::tenant::TenantId;

/// Generation observed before a store read.
///
/// Passed back to [`DomainIndex::remember`] so a result read before a
/// concurrent [`forget`](DomainIndex::forget_id) is not cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexTicket(u64);

/// Best-effort cache of domain → id and id → domain mappings.
///
/// The two directions are guarded independently; no operation holds both
/// locks at once. Entries are only added after a successful store read and
/// are removed in both directions whenever the mapping may have changed.
/// Reserved ids and the super tenant domain must never be remembered; the
/// registry resolves those before consulting the index.
///
/// Unlike [`TenantCache`](super::TenantCache), the generation here is shared
/// by every mapping: a domain lookup does not know its id until the store
/// answers, and a rename only forgets by id, so a per-key ticket could miss
/// the invalidation that matters.
#[derive(Debug, Default)]
pub struct DomainIndex {
    by_domain: RwLock<HashMap<String, TenantId>>,
    by_id: RwLock<HashMap<TenantId, String>>,
    generation: AtomicU64,
}

impl DomainIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up the id of a normalized domain.
    pub fn lookup_id(&self, domain: &str) -> Option<TenantId> {
        self.by_domain.read().get(domain).copied()
    }

    /// Looks up the domain of an id.
    pub fn lookup_domain(&self, id: TenantId) -> Option<String> {
        self.by_id.read().get(&id).cloned()
    }

    /// Takes a ticket before reading the mapping from the store.
    pub fn ticket(&self) -> IndexTicket {
        IndexTicket(self.generation.load(Ordering::SeqCst))
    }

    /// Records a mapping read from the store.
    ///
    /// Returns `false` without recording if the mapping was invalidated
    /// after `ticket` was taken, or if either side is a sentinel.
    pub fn remember(&self, ticket: IndexTicket, domain: &str, id: TenantId) -> bool {
        if domain.is_empty() || !id.is_assigned() {
            return false;
        }

        {
            let mut by_domain = self.by_domain.write();
            if self.generation.load(Ordering::SeqCst) != ticket.0 {
                return false;
            }
            by_domain.insert(domain.to_string(), id);
        }

        let mut by_id = self.by_id.write();
        if self.generation.load(Ordering::SeqCst) != ticket.0 {
            drop(by_id);
            self.by_domain.write().remove(domain);
            return false;
        }
        by_id.insert(id, domain.to_string());
        true
    }

    /// Removes every mapping that involves `id`.
    ///
    /// Returns the domain the id was mapped to, if any.
    pub fn forget_id(&self, id: TenantId) -> Option<String> {
        self.generation.fetch_add(1, Ordering::SeqCst);

        let domain = self.by_id.write().remove(&id);
        let mut by_domain = self.by_domain.write();
        if let Some(domain) = &domain {
            by_domain.remove(domain);
        }
        by_domain.retain(|_, mapped| *mapped != id);
        domain
    }

    /// Removes every mapping that involves `domain`.
    ///
    /// Returns the id the domain was mapped to, if any.
    pub fn forget_domain(&self, domain: &str) -> Option<TenantId> {
        self.generation.fetch_add(1, Ordering::SeqCst);

        let id = self.by_domain.write().remove(domain);
        let mut by_id = self.by_id.write();
        if let Some(id) = id {
            by_id.remove(&id);
        }
        by_id.retain(|_, mapped| mapped != domain);
        id
    }

    /// Removes all mappings.
    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.by_domain.write().clear();
        self.by_id.write().clear();
    }

    /// Number of domain → id mappings.
    pub fn len(&self) -> usize {
        self.by_domain.read().len()
    }

    /// Returns `true` if no mapping is cached.
    pub fn is_empty(&self) -> bool {
        self.by_domain.read().is_empty() && self.by_id.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remember_both_directions() {
        let index = DomainIndex::new();
        let ticket = index.ticket();
        assert!(index.remember(ticket, "acme.com", TenantId::new(5)));

        assert_eq!(index.lookup_id("acme.com"), Some(TenantId::new(5)));
        assert_eq!(index.lookup_domain(TenantId::new(5)).as_deref(), Some("acme.com"));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_sentinels_not_remembered() {
        let index = DomainIndex::new();
        assert!(!index.remember(index.ticket(), "acme.com", TenantId::INVALID));
        assert!(!index.remember(index.ticket(), "carbon.super", TenantId::SUPER));
        assert!(!index.remember(index.ticket(), "", TenantId::new(3)));
        assert!(index.is_empty());
    }

    #[test]
    fn test_forget_id_purges_both_directions() {
        let index = DomainIndex::new();
        index.remember(index.ticket(), "acme.com", TenantId::new(5));
        index.remember(index.ticket(), "globex.com", TenantId::new(6));

        assert_eq!(index.forget_id(TenantId::new(5)).as_deref(), Some("acme.com"));
        assert_eq!(index.lookup_id("acme.com"), None);
        assert_eq!(index.lookup_domain(TenantId::new(5)), None);
        assert_eq!(index.lookup_id("globex.com"), Some(TenantId::new(6)));
    }

    #[test]
    fn test_forget_domain_purges_both_directions() {
        let index = DomainIndex::new();
        index.remember(index.ticket(), "acme.com", TenantId::new(5));

        assert_eq!(index.forget_domain("acme.com"), Some(TenantId::new(5)));
        assert!(index.is_empty());
        assert_eq!(index.forget_domain("acme.com"), None);
    }

    #[test]
    fn test_stale_ticket_is_rejected() {
        let index = DomainIndex::new();
        let ticket = index.ticket();
        index.forget_id(TenantId::new(5));

        assert!(!index.remember(ticket, "acme.com", TenantId::new(5)));
        assert!(index.is_empty());
        assert!(index.remember(index.ticket(), "acme.com", TenantId::new(5)));
    }

    #[test]
    fn test_clear() {
        let index = DomainIndex::new();
        index.remember(index.ticket(), "acme.com", TenantId::new(5));
        index.clear();
        assert!(index.is_empty());
    }
}
