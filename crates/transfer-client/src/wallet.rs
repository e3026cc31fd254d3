//! Wallet capability consumed by the session.
//!
//! The wallet holds the user's keys, signs transactions and owns the
//! active network. The client never signs anything itself.

use std::{sync::Arc, time::Duration};

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use common::{ChainConfig, NativeCurrency};
use log::debug;
use serde::Serialize;
use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle, time::sleep};

use crate::error::ProviderError;

const WATCH_LOG_TARGET: &str = "WALLET";

/// Network the wallet is currently on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkInfo {
    pub chain_id: u64,
    /// well-known network name, `None` or `"unknown"` for custom chains
    pub name: Option<String>,
}

/// Plain value transfer handed to the wallet for signing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub to: Address,
    pub value: U256,
    pub gas_limit: u64,
    pub gas_price: U256,
}

/// Transaction accepted by the wallet, not yet confirmed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingTransaction {
    pub hash: B256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
    pub hash: B256,
    pub block_number: Option<u64>,
    pub success: bool,
}

/// Parameters of `wallet_addEthereumChain`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddChainParams {
    pub chain_id: String,
    pub chain_name: String,
    pub rpc_urls: Vec<String>,
    pub native_currency: NativeCurrency,
}

impl From<&ChainConfig> for AddChainParams {
    fn from(cfg: &ChainConfig) -> Self {
        Self {
            chain_id: cfg.chain_id.clone(),
            chain_name: cfg.name.clone(),
            rpc_urls: vec![cfg.rpc_url.clone()],
            native_currency: cfg.native_currency.clone(),
        }
    }
}

/// Notifications pushed by the wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    AccountsChanged(Vec<Address>),
    ChainChanged(u64),
}

#[async_trait]
pub trait WalletCapability: Send + Sync {
    /// Prompts the user for account access
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError>;

    /// Accounts already authorised, without prompting
    async fn current_accounts(&self) -> Result<Vec<Address>, ProviderError>;

    async fn signer_address(&self) -> Result<Address, ProviderError>;

    async fn signer_balance(&self) -> Result<U256, ProviderError>;

    async fn network(&self) -> Result<NetworkInfo, ProviderError>;

    async fn gas_price(&self) -> Result<U256, ProviderError>;

    async fn send_transaction(
        &self,
        tx: TransactionRequest,
    ) -> Result<PendingTransaction, ProviderError>;

    /// Suspends until the transaction is mined. No timeout is applied.
    async fn wait_for_receipt(&self, hash: B256) -> Result<TransactionReceipt, ProviderError>;

    async fn switch_chain(&self, chain_id: &str) -> Result<(), ProviderError>;

    async fn add_chain(&self, params: AddChainParams) -> Result<(), ProviderError>;
}

/// Last observed account list and chain id.
///
/// The first observation of each only records it; later ones yield an
/// event when they differ from the previous one.
#[derive(Debug, Default)]
pub struct WalletObserver {
    accounts: Option<Vec<Address>>,
    chain_id: Option<u64>,
}

impl WalletObserver {
    pub fn observe_accounts(&mut self, accounts: Vec<Address>) -> Option<WalletEvent> {
        if self.accounts.as_ref() == Some(&accounts) {
            return None;
        }
        let first = self.accounts.replace(accounts.clone()).is_none();
        (!first).then_some(WalletEvent::AccountsChanged(accounts))
    }

    pub fn observe_chain(&mut self, chain_id: u64) -> Option<WalletEvent> {
        if self.chain_id == Some(chain_id) {
            return None;
        }
        let first = self.chain_id.replace(chain_id).is_none();
        (!first).then_some(WalletEvent::ChainChanged(chain_id))
    }
}

/// Polls the wallet's accounts and network and forwards every change as a
/// wallet event. Stops once the receiving side is dropped.
pub fn spawn_wallet_watch<E>(
    wallet: Arc<dyn WalletCapability>,
    tx: UnboundedSender<E>,
    interval: Duration,
) -> JoinHandle<()>
where
    E: From<WalletEvent> + Send + 'static,
{
    tokio::spawn(async move {
        let mut observer = WalletObserver::default();

        loop {
            let mut changes = Vec::new();

            match wallet.current_accounts().await {
                Ok(accounts) => changes.extend(observer.observe_accounts(accounts)),
                Err(e) => debug!(target: WATCH_LOG_TARGET, "eth_accounts failed: {e}"),
            }
            match wallet.network().await {
                Ok(network) => changes.extend(observer.observe_chain(network.chain_id)),
                Err(e) => debug!(target: WATCH_LOG_TARGET, "eth_chainId failed: {e}"),
            }

            for change in changes {
                debug!(target: WATCH_LOG_TARGET, "{change:?}");
                if tx.send(change.into()).is_err() {
                    return;
                }
            }

            sleep(interval).await;
            if tx.is_closed() {
                break;
            }
        }
    })
}

/// `0x1234...abcd` form of an address
pub fn short_address(address: &str) -> String {
    if address.len() <= 10 {
        return address.to_string();
    }
    format!("{}...{}", &address[..6], &address[address.len() - 4..])
}
