//! Assembly of the secondary configuration chain.

use std::sync::Arc;

use crate::error::ConfigError;
use crate::tenant::TenantId;

use super::{FragmentSource, RealmConfig, RealmConfigCodec};

/// Links externally discovered configuration fragments onto a primary
/// realm configuration.
#[derive(Clone)]
pub struct SecondaryChainBuilder {
    source: Arc<dyn FragmentSource>,
    codec: Arc<dyn RealmConfigCodec>,
}

impl std::fmt::Debug for SecondaryChainBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecondaryChainBuilder").finish_non_exhaustive()
    }
}

impl SecondaryChainBuilder {
    /// Creates a builder over a fragment source and codec.
    pub fn new(source: Arc<dyn FragmentSource>, codec: Arc<dyn RealmConfigCodec>) -> Self {
        Self { source, codec }
    }

    /// Appends every parsable fragment of `tenant_id` after the current tail
    /// of `primary`, in the order the source yields them.
    ///
    /// An existing chain is extended, never reset. Fragments that cannot be
    /// read or parsed are logged and skipped, and a failed enumeration leaves
    /// the chain unchanged. Returns the number of fragments linked.
    pub fn attach(&self, tenant_id: TenantId, primary: &mut RealmConfig) -> usize {
        let locations = match self.source.locate(tenant_id) {
            Ok(locations) => locations,
            Err(e) => {
                tracing::warn!(
                    tenant_id = %tenant_id,
                    error = %e,
                    "Failed to enumerate secondary realm configurations"
                );
                return 0;
            }
        };

        let mut linked = 0;
        for location in locations {
            let shown = location.display().to_string();
            let parsed = self
                .source
                .read(&location)
                .map_err(|source| ConfigError::Io {
                    location: location.clone(),
                    source,
                })
                .and_then(|bytes| self.codec.parse(&bytes, tenant_id, &shown));

            match parsed {
                Ok(fragment) => {
                    primary.append_secondary(fragment);
                    linked += 1;
                }
                Err(e) => {
                    tracing::error!(
                        tenant_id = %tenant_id,
                        location = %shown,
                        error = %e,
                        "Error while creating realm configuration"
                    );
                }
            }
        }

        if linked > 0 {
            tracing::debug!(
                tenant_id = %tenant_id,
                linked,
                chain_len = primary.chain_len(),
                "Linked secondary realm configurations"
            );
        }
        linked
    }
}
