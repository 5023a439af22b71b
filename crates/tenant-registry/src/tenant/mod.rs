//! Tenant identity types.
//!
//! - [`TenantId`] - Integer tenant identifier with reserved sentinels
//! - [`Tenant`] - The tenant record stored by the registry
//! - [`SUPER_TENANT_DOMAIN`] - Domain of the super tenant, never stored

mod id;
mod model;

pub use id::{SUPER_TENANT_DOMAIN, TenantId, normalize_domain};
pub use model::Tenant;
