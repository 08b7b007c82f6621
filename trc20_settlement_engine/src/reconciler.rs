use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use thiserror::Error;

use crate::{
    db_types::{NotificationTask, Order, TradeId, TransferNotice},
    events::{EventProducers, OrderSettledEvent},
    traits::{NotificationQueue, OrderStore, OrderStoreError},
};

/// Total delivery attempts granted to each merchant notification before it is abandoned for out-of-band
/// reconciliation.
pub const DEFAULT_MAX_DELIVERY_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Error)]
pub enum SettlementError {
    #[error("{0}")]
    StoreError(#[from] OrderStoreError),
    #[error(
        "Transfer {tx_hash} at {block_time} predates order {trade_id} created at {created_at}. This order cannot \
         actually be matched (amount reuse or a stale order); aborting this wallet's round"
    )]
    CausalityViolation { trade_id: TradeId, tx_hash: String, block_time: DateTime<Utc>, created_at: DateTime<Utc> },
    #[error("Order {0} vanished between lookup and fetch")]
    OrderVanished(TradeId),
}

/// The order reconciler.
///
/// `SettlementApi` takes a batch of normalized transfers observed for one wallet and matches each against the
/// unique pending order for (wallet, amount). Transfers are processed sequentially in the order the ledger
/// returned them: the first transfer at a given amount claims the pending order, and an equal-amount sibling in
/// the same batch correctly finds nothing on its own lookup.
pub struct SettlementApi<B, Q> {
    db: B,
    queue: Q,
    producers: EventProducers,
    max_delivery_attempts: u32,
}

impl<B, Q> Debug for SettlementApi<B, Q> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SettlementApi")
    }
}

impl<B, Q> SettlementApi<B, Q> {
    pub fn new(db: B, queue: Q, producers: EventProducers) -> Self {
        Self { db, queue, producers, max_delivery_attempts: DEFAULT_MAX_DELIVERY_ATTEMPTS }
    }

    pub fn with_max_delivery_attempts(mut self, attempts: u32) -> Self {
        self.max_delivery_attempts = attempts;
        self
    }
}

impl<B, Q> SettlementApi<B, Q>
where
    B: OrderStore,
    Q: NotificationQueue,
{
    /// Reconciles one wallet's batch of transfers and returns the orders that were settled.
    ///
    /// Skips (no matching order) are normal and continue the batch. Store faults and causality violations abort
    /// the remainder of the batch; the caller treats that as fatal to this wallet's round only, and the next
    /// scheduled round retries naturally.
    pub async fn settle_transfers(
        &self,
        wallet: &str,
        transfers: &[TransferNotice],
    ) -> Result<Vec<Order>, SettlementError> {
        let mut settled = Vec::new();
        for transfer in transfers {
            if let Some(order) = self.settle_one(wallet, transfer).await? {
                settled.push(order);
            }
        }
        Ok(settled)
    }

    async fn settle_one(&self, wallet: &str, transfer: &TransferNotice) -> Result<Option<Order>, SettlementError> {
        let amount = transfer.amount;
        let Some(trade_id) = self.db.trade_id_for_deposit(wallet, amount).await? else {
            debug!(
                "🔄️💰️ No pending order for {amount} USDT on {wallet}. Transfer {} skipped",
                transfer.tx_hash
            );
            return Ok(None);
        };
        let order = self
            .db
            .order_by_trade_id(&trade_id)
            .await?
            .ok_or_else(|| SettlementError::OrderVanished(trade_id.clone()))?;
        if transfer.block_timestamp < order.created_at {
            error!(
                "🔄️💰️ Temporal causality check failed for {trade_id}: block time {} < order creation {}",
                transfer.block_timestamp, order.created_at
            );
            return Err(SettlementError::CausalityViolation {
                trade_id,
                tx_hash: transfer.tx_hash.clone(),
                block_time: transfer.block_timestamp,
                created_at: order.created_at,
            });
        }
        let order = self.db.finalize_order(&trade_id, amount, &transfer.tx_hash).await?;
        info!("🔄️💰️ Order {trade_id} settled by transfer {} for {amount} USDT", transfer.tx_hash);
        let task = NotificationTask::for_order(&order);
        if let Err(e) = self.queue.enqueue(task, self.max_delivery_attempts).await {
            // Delivery guarantees live in the queue; a failed enqueue leaves the order settled and is
            // reconciled out-of-band.
            warn!("🔄️📮️ Could not enqueue the merchant notification for {trade_id}. {e}");
        }
        self.call_order_settled_hook(&order, &transfer.tx_hash).await;
        Ok(Some(order))
    }

    async fn call_order_settled_hook(&self, order: &Order, tx_hash: &str) {
        for emitter in &self.producers.order_settled_producer {
            trace!("🔄️📦️ Notifying order settled hook subscribers");
            let event = OrderSettledEvent::new(order.clone(), tx_hash.to_string());
            emitter.publish_event(event).await;
        }
    }
}
