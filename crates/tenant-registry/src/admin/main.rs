//! Tenant registry administration tool.
//!
//! Operates on a SQLite tenant database and prints results as JSON.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::json;
use tenant_registry::realm::RealmConfig;
use tenant_registry::{
    RegistryConfig, SqliteTenantStore, Tenant, TenantId, TenantManager, TenantRegistry,
};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "tenant-admin", version, about = "Administer the tenant registry")]
struct Cli {
    /// SQLite database file.
    #[arg(long, env = "TENANT_REGISTRY_DATABASE", default_value = "tenants.db")]
    database: PathBuf,

    /// Root directory of per-tenant secondary realm configurations.
    #[arg(long, env = "TENANT_REGISTRY_TENANTS_DIR")]
    tenants_dir: Option<PathBuf>,

    /// Log level.
    #[arg(long, env = "TENANT_REGISTRY_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Add a tenant.
    Add {
        /// Tenant domain.
        domain: String,
        /// Contact email.
        #[arg(long)]
        email: String,
        /// Explicit tenant id.
        #[arg(long)]
        id: Option<TenantId>,
        /// Administrator user name.
        #[arg(long)]
        admin: Option<String>,
        /// JSON realm configuration document.
        #[arg(long)]
        realm_config: Option<PathBuf>,
        /// Create the tenant inactive.
        #[arg(long)]
        inactive: bool,
    },
    /// Show a tenant with its realm configuration.
    Get {
        #[arg(allow_hyphen_values = true)]
        id: TenantId,
    },
    /// List tenants.
    List {
        /// Only tenants whose domain contains this text.
        #[arg(long)]
        domain_contains: Option<String>,
    },
    /// Resolve a domain to its tenant id.
    Resolve { domain: String },
    /// Activate a tenant.
    Activate {
        #[arg(allow_hyphen_values = true)]
        id: TenantId,
    },
    /// Deactivate a tenant.
    Deactivate {
        #[arg(allow_hyphen_values = true)]
        id: TenantId,
    },
    /// Delete a tenant.
    Delete {
        #[arg(allow_hyphen_values = true)]
        id: TenantId,
        /// Only evict the tenant from the caches.
        #[arg(long)]
        keep_row: bool,
    },
}

fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("tenant_registry={}", level)));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn load_realm_config(path: Option<&PathBuf>, admin: Option<String>) -> anyhow::Result<RealmConfig> {
    let mut config = match path {
        Some(path) => {
            let bytes = std::fs::read(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_slice(&bytes)
                .with_context(|| format!("Invalid realm configuration in {}", path.display()))?
        }
        None => RealmConfig::default(),
    };
    if admin.is_some() {
        config.admin_user_name = admin;
    }
    Ok(config)
}

/// Tenant JSON with the assembled realm chain alongside it.
///
/// The secondary configurations are not part of the tenant's serialized
/// form, so they are listed separately.
fn tenant_view(tenant: &Tenant) -> serde_json::Value {
    let secondary: Vec<_> = tenant
        .realm_config
        .iter()
        .flat_map(|config| config.secondary())
        .collect();
    json!({
        "tenant": tenant,
        "realmChainLength": tenant.realm_chain_len(),
        "secondaryRealmConfigs": secondary,
    })
}

async fn open_registry(cli: &Cli) -> anyhow::Result<TenantRegistry<SqliteTenantStore>> {
    let mut config = RegistryConfig::from_env();
    config.database = Some(cli.database.clone());
    if cli.tenants_dir.is_some() {
        config.tenants_dir = cli.tenants_dir.clone();
    }

    info!(database = %cli.database.display(), "Opening tenant registry");
    TenantRegistry::open(&config)
        .await
        .with_context(|| format!("Failed to open {}", cli.database.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    let registry = open_registry(&cli).await?;

    match cli.command {
        Command::Add {
            domain,
            email,
            id,
            admin,
            realm_config,
            inactive,
        } => {
            let config = load_realm_config(realm_config.as_ref(), admin)?;
            let tenant = Tenant::new(domain, email)
                .with_id(id.unwrap_or_default())
                .with_active(!inactive)
                .with_realm_config(config);
            let id = registry.add_tenant(&tenant).await?;
            print_json(&json!({ "tenantId": id, "domain": tenant.normalized_domain() }))?;
        }
        Command::Get { id } => match registry.get_tenant(id).await? {
            Some(tenant) => print_json(&tenant_view(&tenant))?,
            None => anyhow::bail!("Tenant {} not found", id),
        },
        Command::List { domain_contains } => {
            let tenants = match domain_contains {
                Some(fragment) => registry.get_tenants_matching_domain(&fragment).await?,
                None => registry.get_all_tenants().await?,
            };
            print_json(&tenants)?;
        }
        Command::Resolve { domain } => {
            let id = registry.get_tenant_id(&domain).await?;
            if !id.is_valid() {
                anyhow::bail!("No tenant with domain {}", domain);
            }
            print_json(&json!({ "tenantId": id, "domain": domain.to_lowercase() }))?;
        }
        Command::Activate { id } => {
            registry.activate_tenant(id).await?;
            print_json(&json!({ "tenantId": id, "active": true }))?;
        }
        Command::Deactivate { id } => {
            registry.deactivate_tenant(id).await?;
            print_json(&json!({ "tenantId": id, "active": false }))?;
        }
        Command::Delete { id, keep_row } => {
            registry.delete_tenant(id, !keep_row).await?;
            print_json(&json!({ "tenantId": id, "deleted": !keep_row }))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tenant_view_lists_secondary_configs() {
        let mut config = RealmConfig::default().with_admin_user_name("admin");
        config.append_secondary(RealmConfig::default().with_user_store_class("LdapUserStore"));
        let tenant = Tenant::new("acme.com", "a@acme.com")
            .with_id(TenantId::new(5))
            .with_realm_config(config);

        let view = tenant_view(&tenant);
        assert_eq!(view["realmChainLength"], 2);
        assert_eq!(
            view["secondaryRealmConfigs"][0]["userStoreClass"],
            "LdapUserStore"
        );
        assert_eq!(view["tenant"]["domain"], "acme.com");
    }

    #[test]
    fn test_tenant_view_without_config() {
        let view = tenant_view(&Tenant::new("bare.com", "b@bare.com"));
        assert_eq!(view["realmChainLength"], 0);
        assert_eq!(view["secondaryRealmConfigs"], json!([]));
    }
}
