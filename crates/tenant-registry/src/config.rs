//! Registry configuration.
//!
//! [`RegistryConfig`] can be built programmatically, deserialized with serde,
//! or read from `TENANT_REGISTRY_*` environment variables.
//!
//! # Examples
//!
//! ```
//! use tenant_registry::RegistryConfig;
//!
//! let config: RegistryConfig = serde_json::from_str(r#"{"tenantsDir": "/var/tenants"}"#).unwrap();
//! assert_eq!(config.fragment_extension, "json");
//! assert!(config.database.is_none());
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::realm::{DirectoryFragmentSource, FragmentSource, NoFragments};
#[cfg(feature = "sqlite")]
use crate::store::sqlite::SqliteStoreConfig;

/// Environment variable naming the SQLite database file.
pub const ENV_DATABASE: &str = "TENANT_REGISTRY_DATABASE";
/// Environment variable naming the per-tenant configuration root.
pub const ENV_TENANTS_DIR: &str = "TENANT_REGISTRY_TENANTS_DIR";
/// Environment variable naming the fragment file extension.
pub const ENV_FRAGMENT_EXTENSION: &str = "TENANT_REGISTRY_FRAGMENT_EXTENSION";
/// Environment variable for the connection pool size.
pub const ENV_MAX_CONNECTIONS: &str = "TENANT_REGISTRY_MAX_CONNECTIONS";
/// Environment variable for the SQLite busy timeout.
pub const ENV_BUSY_TIMEOUT_MS: &str = "TENANT_REGISTRY_BUSY_TIMEOUT_MS";

/// Configuration of a tenant registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryConfig {
    /// SQLite database file. `None` opens an in-memory database.
    #[serde(default)]
    pub database: Option<PathBuf>,

    /// Root directory holding `<tenant_id>/userstores/` fragment directories.
    /// `None` disables secondary configuration discovery.
    #[serde(default)]
    pub tenants_dir: Option<PathBuf>,

    /// File extension of secondary configuration fragments.
    #[serde(default = "default_fragment_extension")]
    pub fragment_extension: String,

    /// Connection pool settings.
    #[cfg(feature = "sqlite")]
    #[serde(default)]
    pub store: SqliteStoreConfig,
}

fn default_fragment_extension() -> String {
    "json".to_string()
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            database: None,
            tenants_dir: None,
            fragment_extension: default_fragment_extension(),
            #[cfg(feature = "sqlite")]
            store: SqliteStoreConfig::default(),
        }
    }
}

impl RegistryConfig {
    /// Creates a configuration from `TENANT_REGISTRY_*` environment variables.
    ///
    /// Unset variables keep their defaults. Unparsable numbers are ignored
    /// with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Creates a configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(database) = lookup(ENV_DATABASE).filter(|v| !v.is_empty()) {
            config.database = Some(PathBuf::from(database));
        }
        if let Some(dir) = lookup(ENV_TENANTS_DIR).filter(|v| !v.is_empty()) {
            config.tenants_dir = Some(PathBuf::from(dir));
        }
        if let Some(extension) = lookup(ENV_FRAGMENT_EXTENSION).filter(|v| !v.is_empty()) {
            config.fragment_extension = extension.trim_start_matches('.').to_string();
        }

        #[cfg(feature = "sqlite")]
        {
            if let Some(value) = parse_var(&lookup, ENV_MAX_CONNECTIONS) {
                config.store.max_connections = value;
            }
            if let Some(value) = parse_var(&lookup, ENV_BUSY_TIMEOUT_MS) {
                config.store.busy_timeout_ms = value;
            }
        }

        config
    }

    /// Returns the fragment source this configuration describes.
    pub fn fragment_source(&self) -> Arc<dyn FragmentSource> {
        match &self.tenants_dir {
            Some(dir) => Arc::new(DirectoryFragmentSource::new(
                dir.clone(),
                self.fragment_extension.clone(),
            )),
            None => Arc::new(NoFragments),
        }
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.fragment_extension.is_empty() {
            errors.push("Fragment extension cannot be empty".to_string());
        }

        #[cfg(feature = "sqlite")]
        {
            if self.store.max_connections == 0 {
                errors.push("Max connections cannot be 0".to_string());
            }
            if self.store.min_connections > self.store.max_connections {
                errors.push("Min connections cannot exceed max connections".to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(feature = "sqlite")]
fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(variable = key, value = %raw, error = %e, "Ignoring invalid setting");
            None
        }
    }
}
