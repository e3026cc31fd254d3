//! Fixed values exposed at the client boundary.
//!
//! These are shared between the transfer client library and the console
//! front-end so both sides agree on bounds, rates and addresses.

/// Address that receives every native-currency transfer
pub const RECIPIENT_ADDRESS: &str = "0x91F0E13B4A91dAE49982516f9d2DfB8419c3adEe";

/// Address whose balance on the inventory chain gates transfers
pub const INVENTORY_ADDRESS: &str = "0x9d0399C22324562E4c27b10A4f59A1550B97eD6A";

/// Units of the quoted asset per unit of source-chain native currency.
/// Display only, never applied on-chain.
pub const CONVERSION_RATE: f64 = 20_000.0;

/// Lower transfer bound, in native currency
pub const MIN_AMOUNT: f64 = 0.0001;

/// Upper transfer bound, in native currency
pub const MAX_AMOUNT: f64 = 1.0;

/// Gas limit of a plain value transfer
pub const GAS_LIMIT: u64 = 21_000;

/// Symbol used in user-facing amount messages
pub const SOURCE_SYMBOL: &str = "ETH";

/// Symbol of the quoted asset
pub const QUOTE_SYMBOL: &str = "MON";

/// A held processing lock older than this is considered stuck
pub const PROCESSING_LOCK_TTL_MS: u64 = 30_000;

/// Delay between an observed inventory transfer and the balance refresh
pub const SETTLE_DELAY_MS: u64 = 2_000;

/// Lifetime of auto-hiding notifications
pub const NOTIFICATION_TTL_MS: u64 = 5_000;

/// Chain short name selected on load
pub const DEFAULT_CHAIN: &str = "arbitrum";

/// EIP-1193 code for a request the user declined
pub const USER_REJECTED_CODE: i64 = 4001;

/// EIP-3326 code for a chain the wallet does not know yet
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;

/// `keccak256("Transfer(address,address,uint256)")` signature
pub const TRANSFER_EVENT_SIGNATURE: &str = "Transfer(address,address,uint256)";
