//! Concurrent access tests.
//!
//! Many tasks share one registry over a file database with a real
//! connection pool.

mod common;

use std::sync::Arc;

use common::*;
use tempfile::TempDir;
use tenant_registry::{RegistryConfig, TenantId, TenantManager, TenantRegistry};

async fn file_registry(dir: &TempDir) -> Arc<TenantRegistry<tenant_registry::SqliteTenantStore>> {
    let config = RegistryConfig {
        database: Some(dir.path().join("tenants.db")),
        ..RegistryConfig::default()
    };
    Arc::new(TenantRegistry::open(&config).await.unwrap())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_get_distinct_ids() {
    let dir = TempDir::new().unwrap();
    let registry = file_registry(&dir).await;

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let registry = registry.clone();
            tokio::spawn(async move {
                registry
                    .add_tenant(&tenant(&format!("tenant{}.com", i)))
                    .await
                    .unwrap()
            })
        })
        .collect();

    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 16);
    assert_eq!(registry.get_all_tenants().await.unwrap().len(), 16);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_explicit_id_has_one_winner() {
    let dir = TempDir::new().unwrap();
    let registry = file_registry(&dir).await;
    let requested = TenantId::new(500);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let registry = registry.clone();
            tokio::spawn(async move {
                registry
                    .add_tenant_with_given_id(
                        &tenant(&format!("race{}.com", i)).with_id(requested),
                    )
                    .await
            })
        })
        .collect();

    let mut winners = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(id) => {
                assert_eq!(id, requested);
                winners += 1;
            }
            Err(e) => assert!(e.is_already_exists(), "unexpected error: {}", e),
        }
    }
    assert_eq!(winners, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reads_after_deactivate_are_never_stale() {
    let dir = TempDir::new().unwrap();
    let registry = file_registry(&dir).await;
    let id = registry.add_tenant(&tenant("busy.com")).await.unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let registry = registry.clone();
            tokio::spawn(async move {
                for _ in 0..50 {
                    registry.get_tenant(id).await.unwrap();
                    registry.get_tenant_id("busy.com").await.unwrap();
                }
            })
        })
        .collect();

    registry.deactivate_tenant(id).await.unwrap();
    assert!(!registry.get_tenant(id).await.unwrap().unwrap().active);

    for reader in readers {
        reader.await.unwrap();
    }
    assert!(!registry.get_tenant(id).await.unwrap().unwrap().active);
    assert!(!registry.is_tenant_active(id).await.unwrap());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reads_after_delete_are_never_stale() {
    let dir = TempDir::new().unwrap();
    let registry = file_registry(&dir).await;
    let id = registry.add_tenant(&tenant("doomed.com")).await.unwrap();

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let registry = registry.clone();
            tokio::spawn(async move {
                for _ in 0..50 {
                    registry.get_tenant(id).await.unwrap();
                    registry.get_domain(id).await.unwrap();
                }
            })
        })
        .collect();

    registry.delete_tenant(id, true).await.unwrap();
    for reader in readers {
        reader.await.unwrap();
    }

    assert!(registry.get_tenant(id).await.unwrap().is_none());
    assert!(registry.get_domain(id).await.unwrap().is_none());
    assert_eq!(
        registry.get_tenant_id("doomed.com").await.unwrap(),
        TenantId::INVALID
    );
}
