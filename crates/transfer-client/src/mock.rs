//! In-memory capabilities for tests

use std::{
    str::FromStr,
    sync::{Arc, Mutex, MutexGuard},
};

use alloy_primitives::{keccak256, utils::parse_ether, Address, B256, U256};
use async_trait::async_trait;
use tokio::sync::Notify;

use crate::{
    error::ProviderError,
    inventory::{BlockTag, InventoryReader, LogEntry, LogFilter},
    wallet::{
        AddChainParams, NetworkInfo, PendingTransaction, TransactionReceipt, TransactionRequest,
        WalletCapability,
    },
};

pub const USER: &str = "0x70997970C51812dc3A010C7d01b50e0d17dc79C8";

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

pub fn user() -> Address {
    Address::from_str(USER).unwrap()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchBehavior {
    Accept,
    Unrecognized,
    Fail(String),
}

struct WalletState {
    authorized: Vec<Address>,
    signer: Option<Address>,
    reject_request: bool,
    balance: U256,
    gas: U256,
    network: NetworkInfo,
    reject_send: bool,
    revert: bool,
    sent: Vec<TransactionRequest>,
    switch: SwitchBehavior,
    add_error: Option<String>,
    switch_calls: Vec<String>,
    add_calls: Vec<AddChainParams>,
    receipt_gate: Option<Arc<Notify>>,
    switch_gate: Option<Arc<Notify>>,
}

pub struct MockWallet {
    state: Mutex<WalletState>,
}

impl MockWallet {
    /// wallet with `USER` already authorised
    pub fn connected() -> Self {
        Self {
            state: Mutex::new(WalletState {
                authorized: vec![user()],
                signer: None,
                reject_request: false,
                balance: parse_ether("5").unwrap(),
                gas: U256::from(1_000_000_000u64),
                network: NetworkInfo {
                    chain_id: 42161,
                    name: None,
                },
                reject_send: false,
                revert: false,
                sent: vec![],
                switch: SwitchBehavior::Accept,
                add_error: None,
                switch_calls: vec![],
                add_calls: vec![],
                receipt_gate: None,
                switch_gate: None,
            }),
        }
    }

    /// wallet that has not granted access yet
    pub fn fresh() -> Self {
        let wallet = Self::connected();
        lock(&wallet.state).authorized.clear();
        wallet
    }

    pub fn set_balance(&self, balance: U256) {
        lock(&self.state).balance = balance;
    }

    pub fn gas(&self) -> U256 {
        lock(&self.state).gas
    }

    pub fn set_network(&self, chain_id: u64, name: Option<&str>) {
        lock(&self.state).network = NetworkInfo {
            chain_id,
            name: name.map(str::to_string),
        };
    }

    pub fn set_accounts(&self, accounts: Vec<Address>) {
        lock(&self.state).authorized = accounts;
    }

    pub fn set_signer(&self, signer: Address) {
        lock(&self.state).signer = Some(signer);
    }

    pub fn reject_requests(&self) {
        lock(&self.state).reject_request = true;
    }

    pub fn reject_next_send(&self) {
        lock(&self.state).reject_send = true;
    }

    pub fn revert_next(&self) {
        lock(&self.state).revert = true;
    }

    pub fn set_switch(&self, behavior: SwitchBehavior) {
        lock(&self.state).switch = behavior;
    }

    pub fn fail_add(&self, message: &str) {
        lock(&self.state).add_error = Some(message.to_string());
    }

    /// Receipts are held back until the returned handle is notified
    pub fn hold_receipts(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        lock(&self.state).receipt_gate = Some(gate.clone());
        gate
    }

    /// Chain switches are held back until the returned handle is notified
    pub fn hold_switches(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        lock(&self.state).switch_gate = Some(gate.clone());
        gate
    }

    pub fn sent(&self) -> Vec<TransactionRequest> {
        lock(&self.state).sent.clone()
    }

    pub fn switch_calls(&self) -> Vec<String> {
        lock(&self.state).switch_calls.clone()
    }

    pub fn add_calls(&self) -> Vec<AddChainParams> {
        lock(&self.state).add_calls.clone()
    }
}

#[async_trait]
impl WalletCapability for MockWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        let mut state = lock(&self.state);
        if state.reject_request {
            return Err(ProviderError::user_rejected());
        }
        if state.authorized.is_empty() {
            state.authorized.push(user());
        }
        Ok(state.authorized.clone())
    }

    async fn current_accounts(&self) -> Result<Vec<Address>, ProviderError> {
        Ok(lock(&self.state).authorized.clone())
    }

    async fn signer_address(&self) -> Result<Address, ProviderError> {
        let state = lock(&self.state);
        state
            .signer
            .or_else(|| state.authorized.first().copied())
            .ok_or_else(|| ProviderError::other("unknown account #0"))
    }

    async fn signer_balance(&self) -> Result<U256, ProviderError> {
        Ok(lock(&self.state).balance)
    }

    async fn network(&self) -> Result<NetworkInfo, ProviderError> {
        Ok(lock(&self.state).network.clone())
    }

    async fn gas_price(&self) -> Result<U256, ProviderError> {
        Ok(lock(&self.state).gas)
    }

    async fn send_transaction(
        &self,
        tx: TransactionRequest,
    ) -> Result<PendingTransaction, ProviderError> {
        let mut state = lock(&self.state);
        if std::mem::take(&mut state.reject_send) {
            return Err(ProviderError::user_rejected());
        }
        state.sent.push(tx);
        let hash = keccak256(state.sent.len().to_be_bytes());
        Ok(PendingTransaction { hash })
    }

    async fn wait_for_receipt(&self, hash: B256) -> Result<TransactionReceipt, ProviderError> {
        let gate = lock(&self.state).receipt_gate.clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        let success = !std::mem::take(&mut lock(&self.state).revert);
        Ok(TransactionReceipt {
            hash,
            block_number: Some(1),
            success,
        })
    }

    async fn switch_chain(&self, chain_id: &str) -> Result<(), ProviderError> {
        let gate = lock(&self.state).switch_gate.clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let mut state = lock(&self.state);
        state.switch_calls.push(chain_id.to_string());
        match state.switch.clone() {
            SwitchBehavior::Accept => {
                if let Ok(id) = u64::from_str_radix(chain_id.trim_start_matches("0x"), 16) {
                    state.network = NetworkInfo { chain_id: id, name: None };
                }
                Ok(())
            }
            SwitchBehavior::Unrecognized => Err(ProviderError::new(
                4902,
                format!("Unrecognized chain ID \"{chain_id}\"."),
            )),
            SwitchBehavior::Fail(message) => Err(ProviderError::new(-32603, message)),
        }
    }

    async fn add_chain(&self, params: AddChainParams) -> Result<(), ProviderError> {
        let mut state = lock(&self.state);
        state.add_calls.push(params);
        match state.add_error.clone() {
            Some(message) => Err(ProviderError::new(-32603, message)),
            None => Ok(()),
        }
    }
}

struct InventoryState {
    balance: U256,
    block: u64,
    failing: bool,
    logs: Vec<LogEntry>,
    balance_queries: Vec<(Address, BlockTag)>,
    log_queries: Vec<(u64, u64)>,
}

pub struct MockInventory {
    state: Mutex<InventoryState>,
}

impl MockInventory {
    pub fn with_balance_eth(eth: u64) -> Self {
        Self {
            state: Mutex::new(InventoryState {
                balance: U256::from(eth) * U256::from(10u64).pow(U256::from(18u64)),
                block: 1,
                failing: false,
                logs: vec![],
                balance_queries: vec![],
                log_queries: vec![],
            }),
        }
    }

    pub fn set_balance_eth(&self, eth: u64) {
        lock(&self.state).balance = U256::from(eth) * U256::from(10u64).pow(U256::from(18u64));
    }

    pub fn set_block(&self, block: u64) {
        lock(&self.state).block = block;
    }

    pub fn set_failing(&self, failing: bool) {
        lock(&self.state).failing = failing;
    }

    pub fn push_log(&self, log: LogEntry) {
        lock(&self.state).logs.push(log);
    }

    pub fn balance_queries(&self) -> Vec<(Address, BlockTag)> {
        lock(&self.state).balance_queries.clone()
    }

    pub fn log_queries(&self) -> Vec<(u64, u64)> {
        lock(&self.state).log_queries.clone()
    }
}

#[async_trait]
impl InventoryReader for MockInventory {
    async fn balance(&self, address: Address, block: BlockTag) -> Result<U256, ProviderError> {
        let mut state = lock(&self.state);
        if state.failing {
            return Err(ProviderError::other("connection refused"));
        }
        state.balance_queries.push((address, block));
        Ok(state.balance)
    }

    async fn block_number(&self) -> Result<u64, ProviderError> {
        let state = lock(&self.state);
        if state.failing {
            return Err(ProviderError::other("connection refused"));
        }
        Ok(state.block)
    }

    async fn logs(
        &self,
        _filter: &LogFilter,
        from_block: u64,
        to_block: u64,
    ) -> Result<Vec<LogEntry>, ProviderError> {
        let mut state = lock(&self.state);
        state.log_queries.push((from_block, to_block));
        Ok(std::mem::take(&mut state.logs))
    }
}
