//! Render model published to the front-end after every event

use common::DEFAULT_CHAIN;

use crate::notify::Notification;

pub const CONNECT_LABEL: &str = "Connect Wallet";
pub const NOT_CONNECTED: &str = "Not Connected";
pub const UNKNOWN_NETWORK: &str = "Unknown Network";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BalanceStyle {
    #[default]
    Normal,
    Low,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceLookup {
    pub address: String,
    pub balance: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub connect_label: String,
    pub network_name: String,
    pub gas_price: String,
    pub selected_chain: String,
    pub chain_selector_enabled: bool,
    pub amount_input_enabled: bool,
    pub quoted_amount: String,
    pub transfer_enabled: bool,
    pub inventory_balance: String,
    pub inventory_style: BalanceStyle,
    pub lookup: Option<BalanceLookup>,
    pub notification: Option<Notification>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            connect_label: CONNECT_LABEL.to_string(),
            network_name: NOT_CONNECTED.to_string(),
            gas_price: "-".to_string(),
            selected_chain: DEFAULT_CHAIN.to_string(),
            chain_selector_enabled: false,
            amount_input_enabled: false,
            quoted_amount: "0".to_string(),
            transfer_enabled: false,
            inventory_balance: "-".to_string(),
            inventory_style: BalanceStyle::Normal,
            lookup: None,
            notification: None,
        }
    }
}

impl ViewState {
    /// Controls reset on disconnect
    pub(crate) fn reset_connection(&mut self) {
        self.connect_label = CONNECT_LABEL.to_string();
        self.network_name = NOT_CONNECTED.to_string();
        self.gas_price = "-".to_string();
        self.transfer_enabled = false;
        self.amount_input_enabled = false;
        self.chain_selector_enabled = false;
    }
}
