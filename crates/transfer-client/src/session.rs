//! Session state and event handling.
//!
//! A `Session` owns every piece of client state. It is driven by
//! [`SessionEvent`]s handled one at a time and publishes a [`ViewState`]
//! snapshot after each of them.

use std::{str::FromStr, sync::Arc, time::Duration};

use alloy_primitives::Address;
use common::{
    chain_by_id, chain_by_name, chain_id_hex, ClientConfig, DEFAULT_CHAIN, GAS_LIMIT,
    NOTIFICATION_TTL_MS, PROCESSING_LOCK_TTL_MS, RECIPIENT_ADDRESS, SETTLE_DELAY_MS,
    INVENTORY_ADDRESS,
};
use log::{debug, error, info, warn};
use tokio::{
    sync::{
        mpsc::{self, UnboundedReceiver, UnboundedSender},
        watch,
    },
    time::sleep,
};

use crate::{
    amount::{check_amount, is_valid_amount, parse_amount},
    error::ClientError,
    event::SessionEvent,
    inventory::{fetch_snapshot, BlockTag, InventoryReader, InventorySnapshot},
    lock::{Acquire, Clock, JobId, ProcessingLock, TokioClock},
    notify::{Notifier, Severity},
    transfer::{self, TransferContext, TransferOutcome, TransferRequest, TransferUpdate},
    units::{format_ether_short, format_gwei},
    view::{BalanceLookup, BalanceStyle, ViewState, CONNECT_LABEL, NOT_CONNECTED, UNKNOWN_NETWORK},
    wallet::{short_address, AddChainParams, WalletCapability},
};

const SESSION_LOG_TARGET: &str = "SESSION";

const CONNECT_INIT_FAILED: &str = "Failed to initialize wallet connection";
const TRANSFER_IN_PROGRESS: &str = "A transaction is already in progress. Please wait...";
const PROCESSING_TRANSFER: &str = "Processing transfer...";
const INVENTORY_FETCH_FAILED: &str = "Error fetching inventory balance";
const INVENTORY_UPDATED: &str = "Inventory balance updated";

/// Fixed parameters of a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSettings {
    pub recipient: Address,
    pub inventory: Address,
    pub lock_ttl: Duration,
    pub settle_delay: Duration,
    pub notification_ttl: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            recipient: Address::from_str(RECIPIENT_ADDRESS).unwrap_or_default(),
            inventory: Address::from_str(INVENTORY_ADDRESS).unwrap_or_default(),
            lock_ttl: Duration::from_millis(PROCESSING_LOCK_TTL_MS),
            settle_delay: Duration::from_millis(SETTLE_DELAY_MS),
            notification_ttl: Duration::from_millis(NOTIFICATION_TTL_MS),
        }
    }
}

impl SessionSettings {
    pub fn from_config(cfg: &ClientConfig) -> anyhow::Result<Self> {
        Ok(Self {
            recipient: cfg.recipient()?,
            inventory: cfg.inventory()?,
            ..Self::default()
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionState {
    pub wallet_address: Option<Address>,
    pub is_connected: bool,
    /// hex chain id of the wallet's network
    pub active_chain_id: Option<String>,
}

pub struct Session {
    settings: SessionSettings,
    wallet: Option<Arc<dyn WalletCapability>>,
    inventory_reader: Arc<dyn InventoryReader>,
    clock: Arc<dyn Clock>,
    events: UnboundedSender<SessionEvent>,
    view_tx: watch::Sender<ViewState>,

    connection: ConnectionState,
    amount_input: String,
    inventory: Option<InventorySnapshot>,
    inventory_error: bool,
    lock: ProcessingLock,
    switching: bool,
    notifier: Notifier,
    view: ViewState,
}

impl Session {
    /// Creates a session and the receiving end of its event queue.
    ///
    /// `wallet` is `None` when no wallet capability is available.
    pub fn new(
        settings: SessionSettings,
        wallet: Option<Arc<dyn WalletCapability>>,
        inventory_reader: Arc<dyn InventoryReader>,
    ) -> (Self, UnboundedReceiver<SessionEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let (view_tx, _) = watch::channel(ViewState::default());
        let lock = ProcessingLock::new(settings.lock_ttl);

        let session = Self {
            settings,
            wallet,
            inventory_reader,
            clock: Arc::new(TokioClock),
            events,
            view_tx,
            connection: ConnectionState::default(),
            amount_input: String::new(),
            inventory: None,
            inventory_error: false,
            lock,
            switching: false,
            notifier: Notifier::default(),
            view: ViewState::default(),
        };

        (session, rx)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Handle for enqueueing events from watchers and front-ends
    pub fn sender(&self) -> UnboundedSender<SessionEvent> {
        self.events.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ViewState> {
        self.view_tx.subscribe()
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn connection(&self) -> &ConnectionState {
        &self.connection
    }

    pub fn inventory(&self) -> Option<&InventorySnapshot> {
        self.inventory.as_ref()
    }

    pub fn lock_holder(&self) -> Option<JobId> {
        self.lock.holder()
    }

    /// Load sequence, then events in arrival order until `Shutdown`
    pub async fn run(mut self, mut rx: UnboundedReceiver<SessionEvent>) {
        self.start().await;

        while let Some(event) = rx.recv().await {
            if event == SessionEvent::Shutdown {
                info!(target: SESSION_LOG_TARGET, "shutting down");
                break;
            }
            self.handle(event).await;
        }
    }

    pub async fn start(&mut self) {
        self.refresh_inventory().await;
        self.init().await;

        if self.wallet.is_some() {
            let _ = self.switch_chain(DEFAULT_CHAIN);
        }

        self.publish();
    }

    pub async fn handle(&mut self, event: SessionEvent) {
        debug!(target: SESSION_LOG_TARGET, "handling {event:?}");

        match event {
            SessionEvent::Connect => {
                let _ = self.connect().await;
            }
            SessionEvent::Disconnect => self.disconnect(),
            SessionEvent::AccountsChanged => {
                info!(target: SESSION_LOG_TARGET, "Account changed, resetting connection");
                self.disconnect();
                self.init().await;
            }
            SessionEvent::ChainChanged => {
                info!(target: SESSION_LOG_TARGET, "Network changed, resetting connection");
                self.disconnect();
                self.init().await;
            }
            SessionEvent::SelectChain(name) => {
                let _ = self.switch_chain(&name);
            }
            SessionEvent::ChainSwitchFinished { chain, result } => {
                self.finish_switch(&chain, result)
            }
            SessionEvent::AmountInput(text) => self.set_amount(text),
            SessionEvent::Submit => {
                self.submit().await;
            }
            SessionEvent::LookupBalance(address) => self.lookup_balance(&address).await,
            SessionEvent::RefreshInventory => self.refresh_inventory().await,
            SessionEvent::InventoryTransfer(direction) => {
                debug!(target: SESSION_LOG_TARGET, "{direction:?} inventory transfer observed");
                self.refresh_inventory().await;
                self.notify(INVENTORY_UPDATED, Severity::Info);
            }
            SessionEvent::TransferProgress { job, update } => self.on_progress(job, update),
            SessionEvent::TransferFinished { job, outcome } => {
                self.finish_transfer(job, outcome).await
            }
            SessionEvent::HideNotification { generation } => {
                self.notifier.hide_generation(generation)
            }
            SessionEvent::CloseNotification => self.notifier.hide(),
            SessionEvent::Shutdown => {}
        }

        self.publish();
    }

    fn publish(&mut self) {
        self.view.notification = self.notifier.visible().cloned();
        self.view_tx.send_replace(self.view.clone());
    }

    fn notify(&mut self, message: impl Into<String>, severity: Severity) {
        if let Some(generation) = self.notifier.show(message, severity) {
            self.schedule(
                SessionEvent::HideNotification { generation },
                self.settings.notification_ttl,
            );
        }
    }

    fn schedule(&self, event: SessionEvent, delay: Duration) {
        let events = self.events.clone();
        tokio::spawn(async move {
            sleep(delay).await;
            let _ = events.send(event);
        });
    }

    /// Resets connection state, then silently reconnects to an already
    /// authorised account.
    async fn init(&mut self) {
        self.view.connect_label = CONNECT_LABEL.to_string();
        self.view.network_name = NOT_CONNECTED.to_string();

        let Some(wallet) = self.wallet.clone() else {
            self.notify(ClientError::WalletUnavailable.to_string(), Severity::Error);
            return;
        };

        match wallet.current_accounts().await {
            Ok(accounts) => {
                if let Some(account) = accounts.first().copied() {
                    info!(target: SESSION_LOG_TARGET, "Found existing connection, connecting...");
                    let _ = self.handle_connect(account).await;
                }
            }
            Err(e) => {
                error!(target: SESSION_LOG_TARGET, "Error checking existing connection: {e}");
                self.disconnect();
            }
        }
    }

    /// Prompts the wallet for account access
    pub async fn connect(&mut self) -> Result<(), ClientError> {
        let Some(wallet) = self.wallet.clone() else {
            self.notify(ClientError::WalletUnavailable.to_string(), Severity::Error);
            return Err(ClientError::WalletUnavailable);
        };

        let account = match wallet.request_accounts().await {
            Ok(accounts) => accounts
                .first()
                .copied()
                .ok_or_else(|| ClientError::ConnectionFailed("no accounts returned".to_string())),
            Err(e) if e.is_user_rejection() => Err(ClientError::ConnectionRejected),
            Err(e) => Err(ClientError::ConnectionFailed(e.message)),
        };

        match account {
            Ok(account) => self.handle_connect(account).await,
            Err(e) => {
                error!(target: SESSION_LOG_TARGET, "Connection error: {e:?}");
                self.notify(e.to_string(), Severity::Error);
                self.disconnect();
                Err(e)
            }
        }
    }

    async fn handle_connect(&mut self, account: Address) -> Result<(), ClientError> {
        let result = self.establish(account).await;
        if let Err(e) = &result {
            error!(target: SESSION_LOG_TARGET, "Error in handle_connect: {e:?}");
            self.notify(CONNECT_INIT_FAILED, Severity::Error);
            self.disconnect();
        }
        result
    }

    async fn establish(&mut self, account: Address) -> Result<(), ClientError> {
        let wallet = self.wallet.clone().ok_or(ClientError::WalletUnavailable)?;

        let signer = wallet
            .signer_address()
            .await
            .map_err(|e| ClientError::ConnectionFailed(e.message))?;
        if signer != account {
            return Err(ClientError::ConnectionFailed("Account mismatch".to_string()));
        }

        self.connection = ConnectionState {
            wallet_address: Some(account),
            is_connected: true,
            active_chain_id: None,
        };
        self.view.connect_label = short_address(&account.to_string());

        self.refresh_inventory().await;

        self.view.amount_input_enabled = true;
        self.view.chain_selector_enabled = true;

        let network = wallet
            .network()
            .await
            .map_err(|e| ClientError::ConnectionFailed(e.message))?;
        let chain_id = chain_id_hex(network.chain_id);

        let mut network_name = UNKNOWN_NETWORK.to_string();
        if let Some(cfg) = chain_by_id(&chain_id) {
            network_name = cfg.name;
            self.view.selected_chain = cfg.short_name.to_string();
        }
        if let Some(name) = network.name.filter(|n| !n.is_empty() && n != "unknown") {
            network_name = capitalize(&name);
        }
        self.view.network_name = network_name;
        self.connection.active_chain_id = Some(chain_id);

        let gas_price = wallet
            .gas_price()
            .await
            .map_err(|e| ClientError::ConnectionFailed(e.message))?;
        self.view.gas_price = format!("{} Gwei", format_gwei(gas_price));

        info!(target: SESSION_LOG_TARGET, "connected {account} on {}", self.view.network_name);
        Ok(())
    }

    pub fn disconnect(&mut self) {
        self.connection = ConnectionState::default();
        self.view.reset_connection();
    }

    /// Asks the wallet to move to the chain registered under `short_name`,
    /// registering the chain first if the wallet does not know it.
    ///
    /// The wallet round-trip runs as a spawned job reporting back with
    /// `ChainSwitchFinished`; submissions are refused until it does. The
    /// selection is not rolled back when the wallet refuses.
    pub fn switch_chain(&mut self, short_name: &str) -> Result<(), ClientError> {
        let Some(wallet) = self.wallet.clone() else {
            return Ok(());
        };

        let Some(cfg) = chain_by_name(short_name) else {
            self.notify(
                ClientError::InvalidChain(short_name.to_string()).to_string(),
                Severity::Error,
            );
            return Err(ClientError::InvalidChain(short_name.to_string()));
        };

        if self.switching {
            warn!(target: SESSION_LOG_TARGET, "switch to {} ignored, another switch is pending", cfg.name);
            return Ok(());
        }

        self.view.selected_chain = cfg.short_name.to_string();
        self.switching = true;
        self.view.transfer_enabled = false;

        let events = self.events.clone();
        tokio::spawn(async move {
            let result = match wallet.switch_chain(&cfg.chain_id).await {
                Ok(()) => Ok(()),
                Err(e) if e.is_unrecognized_chain() => {
                    info!(target: SESSION_LOG_TARGET, "{} unknown to wallet, adding it", cfg.name);
                    wallet
                        .add_chain(AddChainParams::from(&cfg))
                        .await
                        .map_err(|e| ClientError::ChainAddFailed(e.message))
                }
                Err(e) => Err(ClientError::ChainSwitchFailed(e.message)),
            };
            let _ = events.send(SessionEvent::ChainSwitchFinished {
                chain: cfg.short_name.to_string(),
                result,
            });
        });

        Ok(())
    }

    fn finish_switch(&mut self, chain: &str, result: Result<(), ClientError>) {
        match (result, chain_by_name(chain)) {
            (Ok(()), Some(cfg)) => {
                self.view.network_name = cfg.name;
                self.connection.active_chain_id = Some(cfg.chain_id);
            }
            (Ok(()), None) => {}
            (Err(e), _) => {
                error!(target: SESSION_LOG_TARGET, "{e}");
                self.notify(e.to_string(), Severity::Error);
            }
        }

        self.switching = false;
        self.validate_amount();
    }

    pub fn set_amount(&mut self, text: String) {
        self.amount_input = text;
        self.validate_amount();
    }

    /// Re-derives the quote and the transfer button, and reports a violated
    /// bound.
    fn validate_amount(&mut self) {
        let check = check_amount(&self.amount_input);
        self.view.quoted_amount = check.quote;
        self.update_transfer_button();

        if let Some(violation) = check.violation {
            self.notify(violation.notice(), Severity::Error);
        }
    }

    fn is_processing(&self) -> bool {
        self.switching || self.lock.is_fresh(self.clock.now())
    }

    fn update_transfer_button(&mut self) {
        let inventory_low = self.inventory.as_ref().is_some_and(|s| s.is_low);
        self.view.transfer_enabled = is_valid_amount(parse_amount(&self.amount_input))
            && !self.is_processing()
            && self.connection.is_connected
            && !self.inventory_error
            && !inventory_low;
    }

    /// Starts a transfer attempt. Returns the job id when one was started.
    pub async fn submit(&mut self) -> Option<JobId> {
        if self.switching {
            debug!(target: SESSION_LOG_TARGET, "submit refused while a chain switch is pending");
            self.notify(TRANSFER_IN_PROGRESS, Severity::Warning);
            return None;
        }

        let job = match self.lock.try_acquire(self.clock.now()) {
            Acquire::Busy { holder, held_for } => {
                debug!(target: SESSION_LOG_TARGET, "job {holder} busy for {held_for:?}");
                self.notify(TRANSFER_IN_PROGRESS, Severity::Warning);
                return None;
            }
            Acquire::TookOver { job, evicted } => {
                warn!(target: SESSION_LOG_TARGET, "job {evicted} went stale, processing lock reset");
                job
            }
            Acquire::Acquired(job) => job,
        };
        self.view.transfer_enabled = false;

        let wallet = match &self.wallet {
            Some(wallet) if self.connection.is_connected => wallet.clone(),
            _ => {
                self.finish_transfer(job, TransferOutcome::Failed(ClientError::NotConnected))
                    .await;
                return Some(job);
            }
        };

        let ctx = TransferContext {
            wallet,
            inventory_reader: self.inventory_reader.clone(),
            inventory: self.settings.inventory,
        };
        let request = TransferRequest {
            amount: self.amount_input.clone(),
            recipient: self.settings.recipient,
            gas_limit: GAS_LIMIT,
        };
        let events = self.events.clone();

        info!(target: SESSION_LOG_TARGET, "starting transfer job {job} for {}", request.amount);
        tokio::spawn(async move {
            let progress = events.clone();
            let outcome = transfer::execute(&ctx, &request, |update| {
                let _ = progress.send(SessionEvent::TransferProgress { job, update });
            })
            .await;
            let _ = events.send(SessionEvent::TransferFinished { job, outcome });
        });

        Some(job)
    }

    fn on_progress(&mut self, job: JobId, update: TransferUpdate) {
        match update {
            TransferUpdate::Processing => self.notify(PROCESSING_TRANSFER, Severity::Info),
            TransferUpdate::Submitted(hash) => {
                debug!(target: SESSION_LOG_TARGET, "job {job} submitted {hash}");
                self.notify(
                    format!("Transaction sent! Waiting for confirmation...\nHash: {hash}"),
                    Severity::Info,
                );
            }
        }
    }

    async fn finish_transfer(&mut self, job: JobId, outcome: TransferOutcome) {
        match outcome {
            TransferOutcome::Succeeded(receipt) => {
                info!(
                    target: SESSION_LOG_TARGET,
                    "Transaction processed: hash={} from={} amount={} expected={}",
                    receipt.hash, receipt.from, receipt.amount, receipt.expected_quote
                );
                self.notify(receipt.notice(), Severity::Success);
                self.schedule(SessionEvent::RefreshInventory, self.settings.settle_delay);
            }
            TransferOutcome::Rejected => {
                self.notify(ClientError::UserRejected.to_string(), Severity::Warning)
            }
            TransferOutcome::Failed(e) => {
                error!(target: SESSION_LOG_TARGET, "Transfer error: {e:?}");
                self.notify(e.to_string(), Severity::Error);
            }
        }

        if !self.lock.release(job) {
            debug!(target: SESSION_LOG_TARGET, "job {job} no longer holds the processing lock");
        }
        self.refresh_inventory().await;
        self.validate_amount();
    }

    /// Reads the inventory balance. Failures degrade the display and block
    /// transfers until the next successful refresh.
    pub async fn refresh_inventory(&mut self) {
        match fetch_snapshot(self.inventory_reader.as_ref(), self.settings.inventory).await {
            Ok(snapshot) => {
                self.inventory_error = false;
                self.view.inventory_balance = snapshot.display();

                if snapshot.is_low {
                    self.view.transfer_enabled = false;
                    self.view.inventory_style = BalanceStyle::Low;
                    self.inventory = Some(snapshot);
                    self.notify(
                        ClientError::InsufficientInventory.to_string(),
                        Severity::Warning,
                    );
                } else {
                    self.view.inventory_style = BalanceStyle::Normal;
                    self.inventory = Some(snapshot);
                    if self.connection.is_connected {
                        self.update_transfer_button();
                    }
                }
            }
            Err(e) => {
                error!(target: SESSION_LOG_TARGET, "Error updating inventory balance: {e}");
                self.inventory_error = true;
                self.view.inventory_balance = "Error".to_string();
                self.view.inventory_style = BalanceStyle::Error;
                self.view.transfer_enabled = false;
                self.notify(INVENTORY_FETCH_FAILED, Severity::Error);
            }
        }
    }

    /// Balance of an arbitrary address on the inventory chain
    pub async fn lookup_balance(&mut self, address: &str) {
        let lookup = match Address::from_str(address.trim()) {
            Ok(address) => match self.inventory_reader.balance(address, BlockTag::Latest).await {
                Ok(balance) => Some(BalanceLookup {
                    address: short_address(&address.to_string()),
                    balance: format_ether_short(balance),
                }),
                Err(e) => {
                    error!(target: SESSION_LOG_TARGET, "Error checking balance: {e}");
                    None
                }
            },
            Err(e) => {
                error!(target: SESSION_LOG_TARGET, "Error checking balance: {e}");
                None
            }
        };

        self.view.lookup = Some(lookup.unwrap_or_else(|| BalanceLookup {
            address: "Error".to_string(),
            balance: "0".to_string(),
        }));
    }
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
