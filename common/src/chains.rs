use serde::{Deserialize, Serialize};

/// Native currency metadata, as handed to `wallet_addEthereumChain`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl NativeCurrency {
    fn ether() -> Self {
        Self {
            name: "ETH".to_string(),
            symbol: "ETH".to_string(),
            decimals: 18,
        }
    }
}

/// Static description of a selectable chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainConfig {
    /// short name used by the chain selector
    pub short_name: &'static str,
    /// 0x-prefixed hex chain id
    pub chain_id: String,
    pub name: String,
    pub rpc_url: String,
    pub native_currency: NativeCurrency,
}

/// Renders a numeric chain id the way wallets report it
pub fn chain_id_hex(chain_id: u64) -> String {
    let bytes = chain_id.to_be_bytes();
    let encoded = hex::encode(bytes);
    let trimmed = encoded.trim_start_matches('0');
    if trimmed.is_empty() {
        "0x0".to_string()
    } else {
        format!("0x{trimmed}")
    }
}

/// The registry of chains the client can switch the wallet to.
///
/// Order is the selector order.
pub fn chain_registry() -> Vec<ChainConfig> {
    vec![
        ChainConfig {
            short_name: "arbitrum",
            chain_id: "0xa4b1".to_string(),
            name: "Arbitrum One".to_string(),
            rpc_url: "https://arb1.arbitrum.io/rpc".to_string(),
            native_currency: NativeCurrency::ether(),
        },
        ChainConfig {
            short_name: "optimism",
            chain_id: "0xa".to_string(),
            name: "Optimism".to_string(),
            rpc_url: "https://mainnet.optimism.io".to_string(),
            native_currency: NativeCurrency::ether(),
        },
        ChainConfig {
            short_name: "base",
            chain_id: "0x2105".to_string(),
            name: "Base".to_string(),
            rpc_url: "https://mainnet.base.org".to_string(),
            native_currency: NativeCurrency::ether(),
        },
    ]
}

pub fn chain_by_name(short_name: &str) -> Option<ChainConfig> {
    chain_registry()
        .into_iter()
        .find(|c| c.short_name == short_name)
}

/// Looks a chain up by its hex id (case-insensitive)
pub fn chain_by_id(chain_id: &str) -> Option<ChainConfig> {
    chain_registry()
        .into_iter()
        .find(|c| c.chain_id.eq_ignore_ascii_case(chain_id))
}
