//! The per-wallet settlement pipeline: fetch a window of transfer history, normalize it, and hand the result to
//! the reconciler.

use chrono::{Duration, Utc};
use log::*;
use tronscan_tools::{normalize_transfers, TokenTransfer, TronscanApi};
use trc20_settlement_engine::{
    db_types::{Order, TransferNotice},
    NotificationQueue,
    OrderStore,
    SettlementApi,
};

use crate::errors::ServerError;

pub fn to_notice(transfer: TokenTransfer) -> TransferNotice {
    TransferNotice {
        wallet: transfer.to,
        amount: transfer.amount,
        block_timestamp: transfer.block_timestamp,
        tx_hash: transfer.tx_hash,
    }
}

/// Polls one wallet's recent transfer history and settles whatever matches.
///
/// The window reaches `lookback_hours` into the past on every call. The overlap between consecutive rounds is
/// deliberate: transfers that settled an order in an earlier round simply find no pending order and are skipped,
/// so a generous window buys tolerance to ledger propagation lag at no correctness cost.
pub async fn poll_wallet<B, Q>(
    ledger: &TronscanApi,
    settlement: &SettlementApi<B, Q>,
    wallet: &str,
    lookback_hours: i64,
) -> Result<Vec<Order>, ServerError>
where
    B: OrderStore,
    Q: NotificationQueue,
{
    let now = Utc::now();
    let window_start = now - Duration::hours(lookback_hours);
    let raw = ledger.fetch_transfers(wallet, window_start.timestamp_millis(), now.timestamp_millis()).await?;
    let transfers = normalize_transfers(wallet, raw).into_iter().map(to_notice).collect::<Vec<_>>();
    if transfers.is_empty() {
        trace!("🔄️ No incoming transfers for {wallet} in the current window");
        return Ok(Vec::new());
    }
    debug!("🔄️ {} incoming transfers for {wallet} in the current window", transfers.len());
    let settled = settlement.settle_transfers(wallet, &transfers).await?;
    Ok(settled)
}
