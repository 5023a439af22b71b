//! Error types for the tenant registry.
//!
//! Errors are grouped by category: tenant invariant violations, storage
//! backend failures, and realm configuration failures. "Not found" is never
//! an error here; read paths return `Ok(None)` instead.

// Error enum variant fields are self-documenting via their #[error(...)] messages
#![allow(missing_docs)]

use std::path::PathBuf;

use thiserror::Error;

use crate::tenant::TenantId;

/// The primary error type for all registry operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Tenant invariant violations
    #[error(transparent)]
    Tenant(#[from] TenantError),

    /// Backend-specific errors
    #[error(transparent)]
    Backend(#[from] BackendError),

    /// Realm configuration errors
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Errors related to tenant identity and uniqueness.
#[derive(Error, Debug)]
pub enum TenantError {
    /// A tenant with the given id already exists.
    #[error("tenant already exists: {tenant_id}")]
    AlreadyExists { tenant_id: TenantId },

    /// Another tenant already owns the domain.
    #[error("tenant domain already registered: {domain}")]
    DomainAlreadyExists { domain: String },

    /// The tenant record is not acceptable for storage.
    #[error("invalid tenant: {message}")]
    InvalidTenant { message: String },
}

/// Errors originating from the database backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// Connection to the backend failed.
    #[error("connection failed to {backend_name}: {message}")]
    ConnectionFailed {
        backend_name: String,
        message: String,
    },

    /// Connection pool exhausted.
    #[error("connection pool exhausted for {backend_name}")]
    PoolExhausted { backend_name: String },

    /// Schema migration error.
    #[error("schema migration failed: {message}")]
    MigrationError { message: String },

    /// Internal backend error.
    #[error("internal error in {backend_name}: {message}")]
    Internal {
        backend_name: String,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A stored value could not be decoded.
    #[error("serialization error: {message}")]
    SerializationError { message: String },
}

/// Errors related to realm configuration documents.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A configuration document could not be parsed.
    #[error("failed to parse realm configuration from {location}: {message}")]
    Parse { location: String, message: String },

    /// A configuration document could not be serialized.
    #[error("failed to serialize realm configuration: {message}")]
    Serialize { message: String },

    /// A configuration fragment could not be read.
    #[error("failed to read realm configuration fragment {}", .location.display())]
    Io {
        location: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type alias for registry operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for configuration codec operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        StorageError::Backend(BackendError::Internal {
            backend_name: "sqlite".to_string(),
            message: err.to_string(),
            source: Some(Box::new(err)),
        })
    }
}

#[cfg(feature = "sqlite")]
impl From<r2d2::Error> for StorageError {
    fn from(err: r2d2::Error) -> Self {
        tracing::warn!(error = %err, "Timed out waiting for a pooled SQLite connection");
        StorageError::Backend(BackendError::PoolExhausted {
            backend_name: "sqlite".to_string(),
        })
    }
}

impl StorageError {
    /// Returns `true` if this error reports an explicit-id collision.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, StorageError::Tenant(TenantError::AlreadyExists { .. }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_error_display() {
        let err = StorageError::Tenant(TenantError::AlreadyExists {
            tenant_id: TenantId::new(42),
        });
        assert_eq!(err.to_string(), "tenant already exists: 42");
        assert!(err.is_already_exists());
    }

    #[test]
    fn test_domain_error_display() {
        let err = TenantError::DomainAlreadyExists {
            domain: "acme.com".to_string(),
        };
        assert!(err.to_string().contains("acme.com"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Parse {
            location: "ldap.json".to_string(),
            message: "expected value".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to parse realm configuration from ldap.json: expected value"
        );

        let storage_err: StorageError = err.into();
        assert!(matches!(storage_err, StorageError::Config(_)));
        assert!(!storage_err.is_already_exists());
    }

    #[test]
    fn test_io_error_keeps_source() {
        let err = ConfigError::Io {
            location: PathBuf::from("/tmp/missing.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.to_string().contains("/tmp/missing.json"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
