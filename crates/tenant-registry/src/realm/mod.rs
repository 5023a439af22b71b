//! Realm configuration documents and secondary chain assembly.
//!
//! A tenant's primary realm configuration is stored as an opaque payload in
//! the tenant row. At hydration time the [`SecondaryChainBuilder`] discovers
//! additional configuration fragments through a [`FragmentSource`], parses
//! them with a [`RealmConfigCodec`], and links them after the primary
//! document.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use tenant_registry::realm::{
//!     JsonRealmConfigCodec, NoFragments, RealmConfig, SecondaryChainBuilder,
//! };
//! use tenant_registry::tenant::TenantId;
//!
//! let builder = SecondaryChainBuilder::new(Arc::new(NoFragments), Arc::new(JsonRealmConfigCodec));
//! let mut primary = RealmConfig::default();
//! assert_eq!(builder.attach(TenantId::new(1), &mut primary), 0);
//! assert_eq!(primary.chain_len(), 1);
//! ```

mod cache;
mod chain;
mod codec;
mod config;
mod fragments;

pub use cache::{NoopRealmCache, PRIMARY_REALM, RealmCache};
pub use chain::SecondaryChainBuilder;
pub use codec::{JsonRealmConfigCodec, RealmConfigCodec};
pub use config::RealmConfig;
pub use fragments::{DirectoryFragmentSource, FragmentSource, NoFragments, USER_STORES_DIR};
