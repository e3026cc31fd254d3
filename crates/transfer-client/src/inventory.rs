//! Read-only access to the inventory chain.
//!
//! This connection is independent of the wallet's active network: it only
//! reads balances and watches `Transfer` logs touching the inventory address.

use std::{sync::Arc, time::Duration};

use alloy_primitives::{keccak256, utils::format_ether, Address, B256, U256};
use async_trait::async_trait;
use common::TRANSFER_EVENT_SIGNATURE;
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::{sync::mpsc::UnboundedSender, task::JoinHandle, time::sleep};

use crate::{
    error::ProviderError,
    rpc::{parse_quantity, parse_u64_quantity, JsonRpcClient},
};

const INVENTORY_LOG_TARGET: &str = "INVENTORY";

/// Most blocks asked of `eth_getLogs` in one poll
pub const MAX_LOG_RANGE: u64 = 1_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    Latest,
    Number(u64),
}

impl BlockTag {
    fn to_param(self) -> Value {
        match self {
            BlockTag::Latest => json!("latest"),
            BlockTag::Number(n) => json!(format!("0x{n:x}")),
        }
    }
}

/// `eth_getLogs` filter: emitting address plus positional topics, `None`
/// matching anything
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogFilter {
    pub address: Address,
    pub topics: Vec<Option<B256>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub address: Address,
    pub topics: Vec<B256>,
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub transaction_hash: Option<B256>,
}

/// Which side of a `Transfer` the inventory address is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferDirection {
    Incoming,
    Outgoing,
}

impl TransferDirection {
    /// Filter matching `Transfer` logs with the inventory as `to` or `from`
    pub fn filter(self, inventory: Address) -> LogFilter {
        let padded = inventory.into_word();
        let topics = match self {
            TransferDirection::Incoming => vec![Some(transfer_topic()), None, Some(padded)],
            TransferDirection::Outgoing => vec![Some(transfer_topic()), Some(padded), None],
        };
        LogFilter {
            address: inventory,
            topics,
        }
    }
}

pub fn transfer_topic() -> B256 {
    keccak256(TRANSFER_EVENT_SIGNATURE.as_bytes())
}

#[async_trait]
pub trait InventoryReader: Send + Sync {
    async fn balance(&self, address: Address, block: BlockTag) -> Result<U256, ProviderError>;

    async fn block_number(&self) -> Result<u64, ProviderError>;

    async fn logs(
        &self,
        filter: &LogFilter,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<LogEntry>, ProviderError>;
}

pub struct RpcInventoryReader {
    rpc: JsonRpcClient,
}

impl RpcInventoryReader {
    pub fn new(url: &str) -> Result<Self, ProviderError> {
        info!(target: INVENTORY_LOG_TARGET, "Creating inventory chain client for {url}");
        Ok(Self {
            rpc: JsonRpcClient::new(url)?,
        })
    }
}

#[async_trait]
impl InventoryReader for RpcInventoryReader {
    async fn balance(&self, address: Address, block: BlockTag) -> Result<U256, ProviderError> {
        let raw: String = self
            .rpc
            .request("eth_getBalance", json!([address, block.to_param()]))
            .await?;
        parse_quantity(&raw)
    }

    async fn block_number(&self) -> Result<u64, ProviderError> {
        let raw: String = self.rpc.request("eth_blockNumber", json!([])).await?;
        parse_u64_quantity(&raw)
    }

    async fn logs(
        &self,
        filter: &LogFilter,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<LogEntry>, ProviderError> {
        let params = json!([{
            "address": filter.address,
            "topics": filter.topics,
            "fromBlock": BlockTag::Number(from_block).to_param(),
            "toBlock": BlockTag::Number(to_block).to_param(),
        }]);
        self.rpc.request("eth_getLogs", params).await
    }
}

/// Inventory balance as of a block
#[derive(Debug, Clone, PartialEq)]
pub struct InventorySnapshot {
    pub balance: f64,
    pub as_of_block: u64,
    pub is_low: bool,
}

impl InventorySnapshot {
    /// Rounds the balance to display precision; anything that shows as
    /// `0.0000` counts as low.
    pub fn new(balance_wei: U256, as_of_block: u64) -> Self {
        let balance = round_to(ether_to_f64(balance_wei), 4);
        Self {
            balance,
            as_of_block,
            is_low: balance <= 0.0,
        }
    }

    pub fn display(&self) -> String {
        format!("{:.4}", self.balance)
    }
}

pub fn ether_to_f64(wei: U256) -> f64 {
    format_ether(wei).parse().unwrap_or(0.0)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Reads the inventory balance at the latest block
pub async fn fetch_snapshot(
    reader: &dyn InventoryReader,
    inventory: Address,
) -> Result<InventorySnapshot, ProviderError> {
    let block = reader.block_number().await?;
    debug!(target: INVENTORY_LOG_TARGET, "Fetching balance at block: {block}");

    let balance = reader.balance(inventory, BlockTag::Number(block)).await?;
    let snapshot = InventorySnapshot::new(balance, block);
    debug!(target: INVENTORY_LOG_TARGET, "New inventory balance: {}", snapshot.display());

    Ok(snapshot)
}

/// Standing watch for `Transfer` logs on one side of the inventory address.
///
/// Every matching log is forwarded after `settle_delay`. A poll covers at
/// most `MAX_LOG_RANGE` blocks, so a watch that fell behind catches up over
/// several polls. The watch is never torn down while the receiving side is
/// alive.
pub fn spawn_transfer_watch<E>(
    reader: Arc<dyn InventoryReader>,
    inventory: Address,
    direction: TransferDirection,
    tx: UnboundedSender<E>,
    poll_interval: Duration,
    settle_delay: Duration,
) -> JoinHandle<()>
where
    E: From<TransferDirection> + Send + 'static,
{
    tokio::spawn(async move {
        let filter = direction.filter(inventory);
        let mut next_block = match reader.block_number().await {
            Ok(head) => head + 1,
            Err(e) => {
                warn!(target: INVENTORY_LOG_TARGET, "Error setting up transfer listener: {e}");
                0
            }
        };
        info!(target: INVENTORY_LOG_TARGET, "{direction:?} transfer listener set up");

        loop {
            sleep(poll_interval).await;
            if tx.is_closed() {
                break;
            }

            let head = match reader.block_number().await {
                Ok(head) => head,
                Err(e) => {
                    debug!(target: INVENTORY_LOG_TARGET, "eth_blockNumber failed: {e}");
                    continue;
                }
            };
            if next_block == 0 {
                next_block = head + 1;
                continue;
            }
            if head < next_block {
                continue;
            }

            let to_block = head.min(next_block + MAX_LOG_RANGE - 1);
            match reader.logs(&filter, next_block, to_block).await {
                Ok(logs) => {
                    for log in logs {
                        info!(
                            target: INVENTORY_LOG_TARGET,
                            "{direction:?} inventory transfer: {:?}", log.transaction_hash
                        );
                        let tx = tx.clone();
                        tokio::spawn(async move {
                            sleep(settle_delay).await;
                            let _ = tx.send(direction.into());
                        });
                    }
                    next_block = to_block + 1;
                }
                Err(e) => debug!(target: INVENTORY_LOG_TARGET, "eth_getLogs failed: {e}"),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use common::{INVENTORY_ADDRESS, SETTLE_DELAY_MS};
    use tokio::sync::mpsc;

    use super::*;
    use crate::mock::MockInventory;

    #[test]
    fn test_transfer_topic() {
        assert_eq!(
            transfer_topic(),
            B256::from_str("0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef")
                .unwrap()
        );
    }

    #[test]
    fn test_filters_pad_inventory_address() {
        let inventory = Address::from_str(INVENTORY_ADDRESS).unwrap();
        let incoming = TransferDirection::Incoming.filter(inventory);
        let outgoing = TransferDirection::Outgoing.filter(inventory);

        assert_eq!(incoming.address, inventory);
        assert_eq!(incoming.topics[1], None);
        assert_eq!(incoming.topics[2], Some(inventory.into_word()));
        assert_eq!(outgoing.topics[1], Some(inventory.into_word()));
        assert_eq!(outgoing.topics[2], None);
        assert_eq!(&inventory.into_word()[12..], inventory.as_slice());
    }

    #[test]
    fn test_snapshot_rounding() {
        let ten = U256::from(10u64) * U256::from(10u64).pow(U256::from(18u64));
        let snapshot = InventorySnapshot::new(ten, 42);
        assert_eq!(snapshot.display(), "10.0000");
        assert!(!snapshot.is_low);

        // 0.00004 ETH displays as 0.0000
        let dust = U256::from(40_000_000_000_000u64);
        assert!(InventorySnapshot::new(dust, 1).is_low);
        assert!(InventorySnapshot::new(U256::ZERO, 1).is_low);
    }

    #[tokio::test]
    async fn test_fetch_snapshot_reads_latest_block() {
        let inventory = Address::from_str(INVENTORY_ADDRESS).unwrap();
        let reader = MockInventory::with_balance_eth(3);
        reader.set_block(77);

        let snapshot = fetch_snapshot(&reader, inventory).await.unwrap();
        assert_eq!(snapshot.as_of_block, 77);
        assert_eq!(snapshot.display(), "3.0000");
        assert_eq!(reader.balance_queries(), vec![(inventory, BlockTag::Number(77))]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_forwards_logs_after_settle_delay() {
        let inventory = Address::from_str(INVENTORY_ADDRESS).unwrap();
        let reader = Arc::new(MockInventory::with_balance_eth(1));
        reader.set_block(10);

        let (tx, mut rx) = mpsc::unbounded_channel::<TransferDirection>();
        let _watch = spawn_transfer_watch(
            reader.clone(),
            inventory,
            TransferDirection::Incoming,
            tx,
            Duration::from_secs(1),
            Duration::from_millis(SETTLE_DELAY_MS),
        );

        // let the watch record its starting block
        sleep(Duration::from_millis(10)).await;
        reader.set_block(12);
        reader.push_log(LogEntry {
            address: inventory,
            topics: vec![transfer_topic()],
            block_number: Some("0xc".to_string()),
            transaction_hash: None,
        });

        let start = tokio::time::Instant::now();
        let direction = rx.recv().await.unwrap();
        assert_eq!(direction, TransferDirection::Incoming);
        assert!(start.elapsed() >= Duration::from_millis(SETTLE_DELAY_MS));
        assert_eq!(reader.log_queries(), vec![(11, 12)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_caps_log_range_after_outage() {
        let inventory = Address::from_str(INVENTORY_ADDRESS).unwrap();
        let reader = Arc::new(MockInventory::with_balance_eth(1));
        reader.set_block(10);

        let (tx, _rx) = mpsc::unbounded_channel::<TransferDirection>();
        let _watch = spawn_transfer_watch(
            reader.clone(),
            inventory,
            TransferDirection::Outgoing,
            tx,
            Duration::from_secs(1),
            Duration::from_millis(SETTLE_DELAY_MS),
        );

        sleep(Duration::from_millis(10)).await;
        reader.set_block(2_510);

        sleep(Duration::from_millis(3_500)).await;
        assert_eq!(
            reader.log_queries(),
            vec![(11, 1_010), (1_011, 2_010), (2_011, 2_510)]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_uses_given_settle_delay() {
        let inventory = Address::from_str(INVENTORY_ADDRESS).unwrap();
        let reader = Arc::new(MockInventory::with_balance_eth(1));
        reader.set_block(10);

        let (tx, mut rx) = mpsc::unbounded_channel::<TransferDirection>();
        let _watch = spawn_transfer_watch(
            reader.clone(),
            inventory,
            TransferDirection::Outgoing,
            tx,
            Duration::from_secs(1),
            Duration::from_millis(500),
        );

        sleep(Duration::from_millis(10)).await;
        reader.set_block(11);
        reader.push_log(LogEntry {
            address: inventory,
            topics: vec![transfer_topic()],
            block_number: Some("0xb".to_string()),
            transaction_hash: None,
        });

        let start = tokio::time::Instant::now();
        assert_eq!(rx.recv().await, Some(TransferDirection::Outgoing));
        let waited = start.elapsed();
        assert!(waited >= Duration::from_millis(500));
        assert!(waited < Duration::from_millis(SETTLE_DELAY_MS));
    }
}
