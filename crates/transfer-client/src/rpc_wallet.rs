//! `WalletCapability` backed by a JSON-RPC wallet endpoint (EIP-1193 methods
//! exposed over HTTP, e.g. a desktop wallet bridge or a dev node with
//! unlocked accounts).

use std::time::Duration;

use alloy_primitives::{Address, B256, U256};
use async_trait::async_trait;
use log::{info, warn};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::time::sleep;

use crate::{
    error::ProviderError,
    rpc::{parse_hash, parse_quantity, parse_u64_quantity, to_quantity, JsonRpcClient},
    wallet::{
        AddChainParams, NetworkInfo, PendingTransaction, TransactionReceipt, TransactionRequest,
        WalletCapability,
    },
};

const WALLET_LOG_TARGET: &str = "WALLET";
const RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(2);

pub struct RpcWallet {
    rpc: JsonRpcClient,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    transaction_hash: String,
    block_number: Option<String>,
    status: Option<String>,
}

impl RpcWallet {
    pub fn new(url: &str) -> Result<Self, ProviderError> {
        info!(target: WALLET_LOG_TARGET, "Creating wallet client for {url}");
        Ok(Self {
            rpc: JsonRpcClient::new(url)?,
        })
    }

    async fn chain_id(&self) -> Result<u64, ProviderError> {
        let raw: String = self.rpc.request("eth_chainId", json!([])).await?;
        parse_u64_quantity(&raw)
    }
}

/// Names a provider library reports for chains it knows about
pub fn well_known_network_name(chain_id: u64) -> Option<&'static str> {
    match chain_id {
        1 => Some("homestead"),
        10 => Some("optimism"),
        137 => Some("matic"),
        42161 => Some("arbitrum"),
        11155111 => Some("sepolia"),
        _ => None,
    }
}

#[async_trait]
impl WalletCapability for RpcWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.rpc.request("eth_requestAccounts", json!([])).await
    }

    async fn current_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        self.rpc.request("eth_accounts", json!([])).await
    }

    async fn signer_address(&self) -> Result<Address, ProviderError> {
        self.current_accounts()
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::other("unknown account #0"))
    }

    async fn signer_balance(&self) -> Result<U256, ProviderError> {
        let signer = self.signer_address().await?;
        let raw: String = self
            .rpc
            .request("eth_getBalance", json!([signer, "latest"]))
            .await?;
        parse_quantity(&raw)
    }

    async fn network(&self) -> Result<NetworkInfo, ProviderError> {
        let chain_id = self.chain_id().await?;
        Ok(NetworkInfo {
            chain_id,
            name: Some(
                well_known_network_name(chain_id)
                    .unwrap_or("unknown")
                    .to_string(),
            ),
        })
    }

    async fn gas_price(&self) -> Result<U256, ProviderError> {
        let raw: String = self.rpc.request("eth_gasPrice", json!([])).await?;
        parse_quantity(&raw)
    }

    async fn send_transaction(
        &self,
        tx: TransactionRequest,
    ) -> Result<PendingTransaction, ProviderError> {
        let from = self.signer_address().await?;
        let params = json!([{
            "from": from,
            "to": tx.to,
            "value": to_quantity(tx.value),
            "gas": to_quantity(U256::from(tx.gas_limit)),
            "gasPrice": to_quantity(tx.gas_price),
        }]);

        let raw: String = self.rpc.request("eth_sendTransaction", params).await?;
        Ok(PendingTransaction {
            hash: parse_hash(&raw)?,
        })
    }

    async fn wait_for_receipt(&self, hash: B256) -> Result<TransactionReceipt, ProviderError> {
        loop {
            let receipt: Option<RawReceipt> = self
                .rpc
                .request("eth_getTransactionReceipt", json!([hash]))
                .await?;

            if let Some(receipt) = receipt {
                let block_number = receipt
                    .block_number
                    .as_deref()
                    .map(parse_u64_quantity)
                    .transpose()?;
                let success = receipt.status.as_deref().map_or(true, |s| s == "0x1");
                if !success {
                    warn!(target: WALLET_LOG_TARGET, "transaction {hash} reverted");
                }
                return Ok(TransactionReceipt {
                    hash: parse_hash(&receipt.transaction_hash)?,
                    block_number,
                    success,
                });
            }

            sleep(RECEIPT_POLL_INTERVAL).await;
        }
    }

    async fn switch_chain(&self, chain_id: &str) -> Result<(), ProviderError> {
        let _: Value = self
            .rpc
            .request("wallet_switchEthereumChain", json!([{ "chainId": chain_id }]))
            .await?;
        Ok(())
    }

    async fn add_chain(&self, params: AddChainParams) -> Result<(), ProviderError> {
        let _: Value = self
            .rpc
            .request("wallet_addEthereumChain", json!([params]))
            .await?;
        Ok(())
    }
}
