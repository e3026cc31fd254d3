//! Transfer executor
//!
//! Runs the checks and the wallet round-trips of a single transfer attempt
//! and reports progress through a callback. Lock handling and cleanup belong
//! to the session.

use std::sync::Arc;

use alloy_primitives::{utils::parse_ether, Address, B256, U256};
use common::{MAX_AMOUNT, MIN_AMOUNT};
use log::info;

use crate::{
    amount::{expected_quote, is_valid_amount, parse_amount},
    error::ClientError,
    inventory::{BlockTag, InventoryReader, InventorySnapshot},
    wallet::{TransactionRequest, WalletCapability},
};

const TRANSFER_LOG_TARGET: &str = "TRANSFER";

/// One submit attempt, discarded afterwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    /// amount as typed, in source-chain native currency
    pub amount: String,
    pub recipient: Address,
    pub gas_limit: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferUpdate {
    /// all checks passed, wallet prompt about to open
    Processing,
    Submitted(B256),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransferReceipt {
    pub amount: String,
    pub expected_quote: f64,
    pub hash: B256,
    pub from: Address,
}

impl TransferReceipt {
    pub fn notice(&self) -> String {
        format!(
            "Transfer successful!\nAmount: {} ETH\nExpected MON: {}\nHash: {}",
            self.amount, self.expected_quote, self.hash
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TransferOutcome {
    Succeeded(TransferReceipt),
    /// the user declined the wallet prompt
    Rejected,
    Failed(ClientError),
}

/// Capabilities a transfer needs
#[derive(Clone)]
pub struct TransferContext {
    pub wallet: Arc<dyn WalletCapability>,
    pub inventory_reader: Arc<dyn InventoryReader>,
    pub inventory: Address,
}

pub async fn execute<F>(ctx: &TransferContext, request: &TransferRequest, on_update: F) -> TransferOutcome
where
    F: FnMut(TransferUpdate),
{
    match run(ctx, request, on_update).await {
        Ok(receipt) => TransferOutcome::Succeeded(receipt),
        Err(ClientError::UserRejected) => TransferOutcome::Rejected,
        Err(e) => TransferOutcome::Failed(e),
    }
}

async fn run<F>(
    ctx: &TransferContext,
    request: &TransferRequest,
    mut on_update: F,
) -> Result<TransferReceipt, ClientError>
where
    F: FnMut(TransferUpdate),
{
    let balance = ctx
        .inventory_reader
        .balance(ctx.inventory, BlockTag::Latest)
        .await?;
    if InventorySnapshot::new(balance, 0).is_low {
        return Err(ClientError::InsufficientInventory);
    }

    let text = request.amount.trim();
    let amount = parse_amount(text);
    if text.is_empty() || amount <= 0.0 {
        return Err(ClientError::InvalidAmount);
    }
    if !is_valid_amount(amount) {
        return Err(ClientError::OutOfBounds {
            min: MIN_AMOUNT,
            max: MAX_AMOUNT,
        });
    }
    let value = parse_ether(text).map_err(|_| ClientError::InvalidAmount)?;

    let user_balance = ctx.wallet.signer_balance().await?;
    let gas_price = ctx.wallet.gas_price().await?;
    let gas_cost = gas_price.saturating_mul(U256::from(request.gas_limit));
    if user_balance < value.saturating_add(gas_cost) {
        return Err(ClientError::InsufficientFunds);
    }

    on_update(TransferUpdate::Processing);

    let pending = ctx
        .wallet
        .send_transaction(TransactionRequest {
            to: request.recipient,
            value,
            gas_limit: request.gas_limit,
            gas_price,
        })
        .await
        .map_err(ClientError::from_submission)?;

    info!(target: TRANSFER_LOG_TARGET, "Transaction sent: {}", pending.hash);
    on_update(TransferUpdate::Submitted(pending.hash));

    let receipt = ctx
        .wallet
        .wait_for_receipt(pending.hash)
        .await
        .map_err(ClientError::from_submission)?;
    if !receipt.success {
        return Err(ClientError::SubmissionFailed(format!(
            "transaction {} reverted",
            pending.hash
        )));
    }

    let from = ctx.wallet.signer_address().await?;

    Ok(TransferReceipt {
        amount: text.to_string(),
        expected_quote: expected_quote(amount),
        hash: pending.hash,
        from,
    })
}
