use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{bail, Context};
use rust_decimal::Decimal;

use crate::domain::order::PricingPolicy;
use crate::utils::RetryConfig;

// ============================================================================
// Application Configuration
// ============================================================================
//
// Read once at startup from the environment; a `.env` file is loaded first
// when present.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Scylla,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(StorageBackend::Memory),
            "scylla" => Ok(StorageBackend::Scylla),
            other => bail!("unknown storage backend {:?} (expected memory or scylla)", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,

    pub storage: StorageBackend,
    pub scylla_nodes: Vec<String>,
    pub scylla_keyspace: String,

    pub media_dir: PathBuf,
    pub media_base_url: String,
    pub media_max_bytes: usize,

    pub pricing: PricingPolicy,
    pub conflict_retries: u32,
    pub event_bus_capacity: usize,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = Self::from_lookup(|key| env::var(key).ok())?;
        tracing::info!(
            host = %config.server_host,
            port = config.server_port,
            storage = ?config.storage,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Build from any key lookup; unset keys fall back to defaults
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let server_port = get("SERVER_PORT", "8080")
            .parse::<u16>()
            .context("Invalid SERVER_PORT")?;
        let storage: StorageBackend = get("STORAGE_BACKEND", "memory").parse()?;

        let scylla_nodes = get("SCYLLA_NODES", "127.0.0.1:9042")
            .split(',')
            .map(str::trim)
            .filter(|node| !node.is_empty())
            .map(String::from)
            .collect::<Vec<_>>();
        if storage == StorageBackend::Scylla && scylla_nodes.is_empty() {
            bail!("SCYLLA_NODES must list at least one node");
        }

        let decimal = |key: &str, default: &str| -> anyhow::Result<Decimal> {
            get(key, default)
                .trim()
                .parse::<Decimal>()
                .with_context(|| format!("Invalid {}", key))
        };
        let free_shipping_threshold = match lookup("FREE_SHIPPING_THRESHOLD") {
            Some(value) if !value.trim().is_empty() => Some(
                value
                    .trim()
                    .parse::<Decimal>()
                    .context("Invalid FREE_SHIPPING_THRESHOLD")?,
            ),
            _ => None,
        };
        let pricing = PricingPolicy {
            flat_shipping_fee: decimal("SHIPPING_FEE", "5000")?,
            free_shipping_threshold,
            tax_rate: decimal("TAX_RATE", "0")?,
        };

        Ok(Self {
            server_host: get("SERVER_HOST", "127.0.0.1"),
            server_port,
            storage,
            scylla_nodes,
            scylla_keyspace: get("SCYLLA_KEYSPACE", "fishhappy"),
            media_dir: PathBuf::from(get("MEDIA_DIR", "./media")),
            media_base_url: get("MEDIA_BASE_URL", "/media"),
            media_max_bytes: get("MEDIA_MAX_BYTES", "5242880")
                .parse()
                .context("Invalid MEDIA_MAX_BYTES")?,
            pricing,
            conflict_retries: get("CONFLICT_RETRIES", "5")
                .parse()
                .context("Invalid CONFLICT_RETRIES")?,
            event_bus_capacity: get("EVENT_BUS_CAPACITY", "256")
                .parse()
                .context("Invalid EVENT_BUS_CAPACITY")?,
        })
    }

    pub fn bind_addr(&self) -> (String, u16) {
        (self.server_host.clone(), self.server_port)
    }

    pub fn retry(&self) -> RetryConfig {
        RetryConfig::for_conflicts(self.conflict_retries)
    }
}
