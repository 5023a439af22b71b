//! Discovery of secondary configuration fragments.

use std::io;
use std::path::{Path, PathBuf};

use crate::tenant::TenantId;

/// Directory under a tenant's directory that holds fragment files.
pub const USER_STORES_DIR: &str = "userstores";

/// Enumerates the secondary configuration fragments of a tenant.
pub trait FragmentSource: Send + Sync {
    /// Returns the fragment locations for a tenant, in chain order.
    ///
    /// A tenant without fragments yields an empty list.
    fn locate(&self, tenant_id: TenantId) -> io::Result<Vec<PathBuf>>;

    /// Reads the bytes of one fragment.
    fn read(&self, location: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(location)
    }
}

/// A source that never yields fragments.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFragments;

impl FragmentSource for NoFragments {
    fn locate(&self, _tenant_id: TenantId) -> io::Result<Vec<PathBuf>> {
        Ok(Vec::new())
    }
}

/// Scans `<root>/<tenant_id>/userstores/` for fragment files.
///
/// Files are matched by extension, case-insensitively. The order is the
/// order `read_dir` returns, which depends on the platform and filesystem;
/// it is not sorted.
#[derive(Debug, Clone)]
pub struct DirectoryFragmentSource {
    root: PathBuf,
    extension: String,
}

impl DirectoryFragmentSource {
    /// Creates a source rooted at the tenants directory.
    pub fn new(root: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            extension: extension.into().trim_start_matches('.').to_lowercase(),
        }
    }

    /// Directory scanned for a tenant.
    pub fn tenant_dir(&self, tenant_id: TenantId) -> PathBuf {
        self.root.join(tenant_id.to_string()).join(USER_STORES_DIR)
    }

    fn matches(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.to_lowercase() == self.extension)
    }
}

impl FragmentSource for DirectoryFragmentSource {
    fn locate(&self, tenant_id: TenantId) -> io::Result<Vec<PathBuf>> {
        let dir = self.tenant_dir(tenant_id);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut locations = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && self.matches(&path) {
                locations.push(path);
            }
        }
        Ok(locations)
    }
}
