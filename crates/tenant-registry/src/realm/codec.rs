//! Realm configuration codec.

use crate::error::{ConfigError, ConfigResult};
use crate::tenant::TenantId;

use super::RealmConfig;

/// Converts realm configuration documents to and from their stored payload.
///
/// Implementations serialize only the primary document; the secondary chain
/// is never part of the payload.
pub trait RealmConfigCodec: Send + Sync {
    /// Serializes the primary document.
    fn serialize(&self, config: &RealmConfig) -> ConfigResult<Vec<u8>>;

    /// Parses a payload and resolves `tenant_id` onto the result.
    ///
    /// `location` names the payload source in error messages.
    fn parse(&self, bytes: &[u8], tenant_id: TenantId, location: &str)
    -> ConfigResult<RealmConfig>;
}

/// JSON codec backed by `serde_json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRealmConfigCodec;

impl RealmConfigCodec for JsonRealmConfigCodec {
    fn serialize(&self, config: &RealmConfig) -> ConfigResult<Vec<u8>> {
        serde_json::to_vec(config).map_err(|e| ConfigError::Serialize {
            message: e.to_string(),
        })
    }

    fn parse(
        &self,
        bytes: &[u8],
        tenant_id: TenantId,
        location: &str,
    ) -> ConfigResult<RealmConfig> {
        let mut config: RealmConfig =
            serde_json::from_slice(bytes).map_err(|e| ConfigError::Parse {
                location: location.to_string(),
                message: e.to_string(),
            })?;
        config.tenant_id = tenant_id;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_resolves_tenant_id() {
        let codec = JsonRealmConfigCodec;
        let config = codec
            .parse(br#"{"adminUserName": "root"}"#, TenantId::new(12), "row 12")
            .unwrap();
        assert_eq!(config.tenant_id, TenantId::new(12));
        assert_eq!(config.admin_user_name.as_deref(), Some("root"));
    }

    #[test]
    fn test_parse_error_names_location() {
        let err = JsonRealmConfigCodec
            .parse(b"<UserManager/>", TenantId::new(1), "fragment.xml")
            .unwrap_err();
        match err {
            ConfigError::Parse { location, .. } => assert_eq!(location, "fragment.xml"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_serialize_drops_chain() {
        let codec = JsonRealmConfigCodec;
        let mut primary = RealmConfig::default().with_admin_user_name("admin");
        primary.append_secondary(RealmConfig::default());

        let bytes = codec.serialize(&primary).unwrap();
        let parsed = codec.parse(&bytes, TenantId::new(4), "payload").unwrap();
        assert_eq!(parsed.chain_len(), 1);
        assert_eq!(parsed.admin_user_name.as_deref(), Some("admin"));
    }
}
