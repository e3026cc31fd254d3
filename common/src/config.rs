//! Configuration management for the transfer client
//!
//! Values come from a TOML file, then environment variables (with `.env`
//! support for local development) override the endpoint URLs.

use std::{env, fs, path::Path, str::FromStr};

use alloy_primitives::Address;
use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

use crate::consts::{INVENTORY_ADDRESS, RECIPIENT_ADDRESS};

const DEFAULT_WALLET_POLL_INTERVAL_MS: u64 = 1_000;
const DEFAULT_LOG_POLL_INTERVAL_MS: u64 = 4_000;

/// Configuration for the transfer client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// read-only endpoint of the inventory chain
    pub inventory_rpc_url: String,
    /// JSON-RPC endpoint of the user's wallet. `None` means no wallet is
    /// available and the client stays inert.
    pub wallet_rpc_url: Option<String>,
    /// recipient of every transfer
    pub recipient_address: String,
    /// address whose balance gates transfers
    pub inventory_address: String,
    /// how often the wallet is polled for account/chain changes
    pub wallet_poll_interval_ms: u64,
    /// how often the inventory chain is polled for transfer logs
    pub log_poll_interval_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            inventory_rpc_url: "http://localhost:8545".to_string(),
            wallet_rpc_url: None,
            recipient_address: RECIPIENT_ADDRESS.to_string(),
            inventory_address: INVENTORY_ADDRESS.to_string(),
            wallet_poll_interval_ms: DEFAULT_WALLET_POLL_INTERVAL_MS,
            log_poll_interval_ms: DEFAULT_LOG_POLL_INTERVAL_MS,
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist, then apply environment overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let cfg = if path.exists() {
            let raw = fs::read_to_string(path)?;
            Self::from_toml(&raw)?
        } else {
            Self::default()
        };

        Ok(cfg.with_env_overrides())
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Apply `INVENTORY_RPC_URL` and `WALLET_RPC_URL` from the environment.
    ///
    /// A `.env` file is loaded first if present.
    pub fn with_env_overrides(mut self) -> Self {
        let _ = dotenv::dotenv();

        if let Ok(url) = env::var("INVENTORY_RPC_URL") {
            self.inventory_rpc_url = url;
        }
        if let Ok(url) = env::var("WALLET_RPC_URL") {
            self.wallet_rpc_url = Some(url).filter(|u| !u.is_empty());
        }

        self
    }

    pub fn recipient(&self) -> Result<Address> {
        Address::from_str(&self.recipient_address)
            .map_err(|e| anyhow!("Invalid recipient address {}: {e}", self.recipient_address))
    }

    pub fn inventory(&self) -> Result<Address> {
        Address::from_str(&self.inventory_address)
            .map_err(|e| anyhow!("Invalid inventory address {}: {e}", self.inventory_address))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.inventory_rpc_url.starts_with("http") {
            return Err(anyhow!(
                "Invalid inventory RPC URL: {}",
                self.inventory_rpc_url
            ));
        }

        if let Some(url) = &self.wallet_rpc_url {
            if !url.starts_with("http") {
                return Err(anyhow!("Invalid wallet RPC URL: {url}"));
            }
        }

        self.recipient()?;
        self.inventory()?;

        if self.wallet_poll_interval_ms == 0 || self.log_poll_interval_ms == 0 {
            return Err(anyhow!("Poll intervals must be non-zero"));
        }

        Ok(())
    }
}
