use crate::{
    error::ClientError,
    inventory::TransferDirection,
    lock::JobId,
    transfer::{TransferOutcome, TransferUpdate},
    wallet::WalletEvent,
};

/// Everything that can change session state.
///
/// Operator input, wallet notifications, inventory watches, timers and
/// transfer jobs all funnel through one queue, handled in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Connect,
    Disconnect,
    AccountsChanged,
    ChainChanged,
    SelectChain(String),
    /// wallet answered a switch to the chain with this short name
    ChainSwitchFinished { chain: String, result: Result<(), ClientError> },
    AmountInput(String),
    Submit,
    LookupBalance(String),
    RefreshInventory,
    InventoryTransfer(TransferDirection),
    TransferProgress { job: JobId, update: TransferUpdate },
    TransferFinished { job: JobId, outcome: TransferOutcome },
    HideNotification { generation: u64 },
    CloseNotification,
    Shutdown,
}

impl From<WalletEvent> for SessionEvent {
    fn from(event: WalletEvent) -> Self {
        match event {
            WalletEvent::AccountsChanged(_) => SessionEvent::AccountsChanged,
            WalletEvent::ChainChanged(_) => SessionEvent::ChainChanged,
        }
    }
}

impl From<TransferDirection> for SessionEvent {
    fn from(direction: TransferDirection) -> Self {
        SessionEvent::InventoryTransfer(direction)
    }
}
