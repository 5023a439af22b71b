//! TenantStore implementation for SQLite.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{OptionalExtension, Row, params};

use crate::error::{BackendError, StorageError, StorageResult, TenantError};
use crate::store::{TenantRecord, TenantRow, TenantStore};
use crate::tenant::TenantId;

use super::SqliteTenantStore;
use super::backend::internal_error;

const LIST_COLUMNS: &str = "id, domain, email, created_at, active";

fn serialization_error(message: String) -> StorageError {
    StorageError::Backend(BackendError::SerializationError { message })
}

fn parse_timestamp(value: &str) -> StorageResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| serialization_error(format!("Invalid created_at '{}': {}", value, e)))
}

/// Raw column values, before timestamp decoding.
struct RawRow {
    id: i32,
    domain: String,
    email: String,
    created_at: String,
    active: bool,
    realm_config: Option<Vec<u8>>,
}

impl RawRow {
    fn from_list_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            domain: row.get(1)?,
            email: row.get(2)?,
            created_at: row.get(3)?,
            active: row.get(4)?,
            realm_config: None,
        })
    }

    fn from_full_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let mut raw = Self::from_list_row(row)?;
        raw.realm_config = row.get(5)?;
        Ok(raw)
    }

    fn into_record(self) -> StorageResult<TenantRecord> {
        Ok(TenantRecord {
            id: TenantId::new(self.id),
            domain: self.domain,
            email: self.email,
            created_at: parse_timestamp(&self.created_at)?,
            active: self.active,
            realm_config: self.realm_config,
        })
    }
}

/// Maps a failed write onto the tenant error it represents.
///
/// A uniqueness failure on `tenants.domain` means the domain is taken; a
/// primary key failure on an explicit id means the id is taken.
fn write_error(
    err: rusqlite::Error,
    action: &str,
    row: &TenantRow,
    explicit_id: Option<TenantId>,
) -> StorageError {
    if let rusqlite::Error::SqliteFailure(failure, message) = &err {
        if failure.code == rusqlite::ErrorCode::ConstraintViolation {
            let message = message.as_deref().unwrap_or_default();
            let on_id = message.contains("tenants.id")
                || failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY;
            let on_domain = message.contains("tenants.domain")
                || (failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE && !on_id);

            if on_domain {
                return TenantError::DomainAlreadyExists {
                    domain: row.domain.clone(),
                }
                .into();
            }
            if let (true, Some(tenant_id)) = (on_id, explicit_id) {
                return TenantError::AlreadyExists { tenant_id }.into();
            }
        }
    }
    internal_error(format!("Failed to {} '{}': {}", action, row.domain, err))
}

/// Escapes `%`, `_` and `\` so they match literally in a LIKE pattern.
fn like_pattern(fragment: &str) -> String {
    let mut pattern = String::with_capacity(fragment.len() + 2);
    pattern.push('%');
    for c in fragment.to_lowercase().chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[async_trait]
impl TenantStore for SqliteTenantStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn init_schema(&self) -> StorageResult<()> {
        self.create_schema()
    }

    async fn insert(
        &self,
        row: &TenantRow,
        explicit_id: Option<TenantId>,
    ) -> StorageResult<TenantId> {
        let created_at = row.created_at.to_rfc3339();

        self.write("insert tenant", |tx| {
            let result = match explicit_id {
                Some(id) => tx.execute(
                    "INSERT INTO tenants (id, domain, email, created_at, active, realm_config)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        id.value(),
                        row.domain,
                        row.email,
                        created_at,
                        row.active,
                        row.realm_config
                    ],
                ),
                None => tx.execute(
                    "INSERT INTO tenants (domain, email, created_at, active, realm_config)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![row.domain, row.email, created_at, row.active, row.realm_config],
                ),
            };
            result.map_err(|e| write_error(e, "insert tenant", row, explicit_id))?;

            match explicit_id {
                Some(id) => Ok(id),
                None => {
                    let rowid = tx.last_insert_rowid();
                    i32::try_from(rowid).map(TenantId::new).map_err(|_| {
                        internal_error(format!("Assigned tenant id {} out of range", rowid))
                    })
                }
            }
        })
    }

    async fn update(&self, id: TenantId, row: &TenantRow) -> StorageResult<bool> {
        let created_at = row.created_at.to_rfc3339();

        self.write("update tenant", |tx| {
            let changed = tx
                .execute(
                    "UPDATE tenants SET domain = ?1, email = ?2, created_at = ?3 WHERE id = ?4",
                    params![row.domain, row.email, created_at, id.value()],
                )
                .map_err(|e| write_error(e, "update tenant", row, None))?;
            Ok(changed > 0)
        })
    }

    async fn update_config(&self, id: TenantId, realm_config: &[u8]) -> StorageResult<bool> {
        self.write("update tenant realm config", |tx| {
            let changed = tx
                .execute(
                    "UPDATE tenants SET realm_config = ?1 WHERE id = ?2",
                    params![realm_config, id.value()],
                )
                .map_err(|e| {
                    internal_error(format!("Failed to update realm config of {}: {}", id, e))
                })?;
            Ok(changed > 0)
        })
    }

    async fn select_by_id(&self, id: TenantId) -> StorageResult<Option<TenantRecord>> {
        let raw = self.read("select tenant", |tx| {
            Ok(tx
                .query_row(
                    "SELECT id, domain, email, created_at, active, realm_config
                     FROM tenants WHERE id = ?1",
                    [id.value()],
                    RawRow::from_full_row,
                )
                .optional()?)
        })?;

        raw.map(RawRow::into_record).transpose()
    }

    async fn select_id_by_domain(&self, domain: &str) -> StorageResult<Option<TenantId>> {
        self.read("select tenant id", |tx| {
            let id: Option<i32> = tx
                .query_row("SELECT id FROM tenants WHERE domain = ?1", [domain], |row| {
                    row.get(0)
                })
                .optional()?;
            Ok(id.map(TenantId::new))
        })
    }

    async fn select_domain_by_id(&self, id: TenantId) -> StorageResult<Option<String>> {
        self.read("select tenant domain", |tx| {
            Ok(tx
                .query_row("SELECT domain FROM tenants WHERE id = ?1", [id.value()], |row| {
                    row.get(0)
                })
                .optional()?)
        })
    }

    async fn select_active(&self, id: TenantId) -> StorageResult<Option<bool>> {
        self.read("select tenant status", |tx| {
            Ok(tx
                .query_row("SELECT active FROM tenants WHERE id = ?1", [id.value()], |row| {
                    row.get(0)
                })
                .optional()?)
        })
    }

    async fn select_all(&self) -> StorageResult<Vec<TenantRecord>> {
        let rows = self.read("select tenants", |tx| {
            let mut stmt =
                tx.prepare(&format!("SELECT {} FROM tenants ORDER BY id", LIST_COLUMNS))?;
            let rows = stmt
                .query_map([], RawRow::from_list_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })?;

        rows.into_iter().map(RawRow::into_record).collect()
    }

    async fn select_by_domain_substring(
        &self,
        fragment: &str,
    ) -> StorageResult<Vec<TenantRecord>> {
        let pattern = like_pattern(fragment);

        let rows = self.read("select matching tenants", |tx| {
            let mut stmt = tx.prepare(&format!(
                "SELECT {} FROM tenants WHERE domain LIKE ?1 ESCAPE '\\' ORDER BY id",
                LIST_COLUMNS
            ))?;
            let rows = stmt
                .query_map([&pattern], RawRow::from_list_row)?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            Ok(rows)
        })?;

        rows.into_iter().map(RawRow::into_record).collect()
    }

    async fn set_active(&self, id: TenantId, active: bool) -> StorageResult<bool> {
        self.write("set tenant status", |tx| {
            let changed = tx.execute(
                "UPDATE tenants SET active = ?1 WHERE id = ?2",
                params![active, id.value()],
            )?;
            Ok(changed > 0)
        })
    }

    async fn delete(&self, id: TenantId) -> StorageResult<bool> {
        self.write("delete tenant", |tx| {
            let changed = tx.execute("DELETE FROM tenants WHERE id = ?1", [id.value()])?;
            Ok(changed > 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("Acme"), "%acme%");
        assert_eq!(like_pattern("a_b%c"), "%a\\_b\\%c%");
        assert_eq!(like_pattern("x\\y"), "%x\\\\y%");
    }

    #[test]
    fn test_parse_timestamp() {
        let ts = parse_timestamp("2024-03-01T10:00:00+02:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-03-01T08:00:00+00:00");
        assert!(parse_timestamp("yesterday").is_err());
    }
}
