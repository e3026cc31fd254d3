//! Native-currency transfer client
//!
//! Sends fixed-recipient transfers from a connected wallet while the
//! inventory account on a separate chain gates whether transfers are
//! allowed:
//! - `wallet` / `rpc_wallet` for the user's signing capability
//! - `inventory` for balance reads and `Transfer` log watches
//! - `session` for the state machine tying them together

pub mod amount;
pub mod error;
pub mod event;
pub mod inventory;
pub mod lock;
pub mod notify;
pub mod rpc;
pub mod rpc_wallet;
pub mod session;
pub mod transfer;
pub mod units;
pub mod view;
pub mod wallet;

#[cfg(test)]
mod mock;

pub use error::{ClientError, ProviderError};
pub use event::SessionEvent;
pub use inventory::{spawn_transfer_watch, InventoryReader, RpcInventoryReader, TransferDirection};
pub use rpc_wallet::RpcWallet;
pub use session::{Session, SessionSettings};
pub use view::ViewState;
pub use wallet::{spawn_wallet_watch, WalletCapability};
