use std::path::{Path, PathBuf};

pub mod chains;
pub mod config;
pub mod consts;

pub use chains::{
    chain_by_id, chain_by_name, chain_id_hex, chain_registry, ChainConfig, NativeCurrency,
};
pub use config::ClientConfig;
pub use consts::*;

pub fn workspace_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// default location of the client configuration file
pub fn default_config_path() -> PathBuf {
    workspace_dir().join("config").join("client.toml")
}
