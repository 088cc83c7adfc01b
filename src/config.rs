use anyhow::{bail, Context, Result};
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::catalog::CatalogConfig;

// ============================================================================
// Application Configuration
// ============================================================================
//
// Read once at start-up from environment variables:
//
//   CONTRACTS_STORE           postgres | memory         (default: postgres)
//   DATABASE_URL              required for postgres
//   DATABASE_MAX_CONNECTIONS  pool size                 (default: 10)
//   BIND_ADDR                 API listener              (default: 0.0.0.0:8080)
//   METRICS_PORT              /metrics + /health        (default: 9090)
//   SHOPIFY_API_VERSION       Admin GraphQL version     (default: 2024-10)
//   CATALOG_TIMEOUT_SECS      catalog request timeout   (default: 10)
//   DEMO_SHOP                 shop given a session when running on memory
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres { url: String, max_connections: u32 },
    Memory { demo_shop: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub store: StoreBackend,
    pub bind_addr: SocketAddr,
    pub metrics_port: u16,
    pub catalog: CatalogConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = lookup("CONTRACTS_STORE").unwrap_or_else(|| "postgres".to_string());

        let store = match backend.as_str() {
            "postgres" => StoreBackend::Postgres {
                url: lookup("DATABASE_URL")
                    .context("DATABASE_URL must be set when CONTRACTS_STORE=postgres")?,
                max_connections: parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10)?,
            },
            "memory" => StoreBackend::Memory {
                demo_shop: lookup("DEMO_SHOP").unwrap_or_else(|| "demo.myshopify.com".to_string()),
            },
            other => bail!("Unknown CONTRACTS_STORE '{}', expected postgres or memory", other),
        };

        let bind_addr = parse_or(
            &lookup,
            "BIND_ADDR",
            SocketAddr::from(([0, 0, 0, 0], 8080)),
        )?;
        let metrics_port = parse_or(&lookup, "METRICS_PORT", 9090)?;

        let mut catalog = CatalogConfig::default();
        if let Some(version) = lookup("SHOPIFY_API_VERSION") {
            catalog.api_version = version;
        }
        catalog.request_timeout = Duration::from_secs(parse_or(&lookup, "CATALOG_TIMEOUT_SECS", 10)?);

        Ok(Self {
            store,
            bind_addr,
            metrics_port,
            catalog,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("Invalid {}='{}': {}", key, raw, e)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_postgres_defaults() {
        let cfg = config(&[("DATABASE_URL", "postgres://localhost/contracts")]).unwrap();

        assert_eq!(
            cfg.store,
            StoreBackend::Postgres {
                url: "postgres://localhost/contracts".to_string(),
                max_connections: 10,
            }
        );
        assert_eq!(cfg.bind_addr.port(), 8080);
        assert_eq!(cfg.metrics_port, 9090);
        assert_eq!(cfg.catalog.api_version, "2024-10");
    }

    #[test]
    fn test_postgres_requires_database_url() {
        assert!(config(&[]).is_err());
    }

    #[test]
    fn test_memory_backend_with_overrides() {
        let cfg = config(&[
            ("CONTRACTS_STORE", "memory"),
            ("DEMO_SHOP", "acme.myshopify.com"),
            ("BIND_ADDR", "127.0.0.1:3000"),
            ("METRICS_PORT", "9100"),
            ("SHOPIFY_API_VERSION", "2025-01"),
            ("CATALOG_TIMEOUT_SECS", "3"),
        ])
        .unwrap();

        assert_eq!(
            cfg.store,
            StoreBackend::Memory {
                demo_shop: "acme.myshopify.com".to_string()
            }
        );
        assert_eq!(cfg.bind_addr.to_string(), "127.0.0.1:3000");
        assert_eq!(cfg.metrics_port, 9100);
        assert_eq!(cfg.catalog.api_version, "2025-01");
        assert_eq!(cfg.catalog.request_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(config(&[("CONTRACTS_STORE", "redis")]).is_err());

        let err = config(&[("CONTRACTS_STORE", "memory"), ("METRICS_PORT", "lots")]).unwrap_err();
        assert!(err.to_string().contains("METRICS_PORT"));
    }
}
