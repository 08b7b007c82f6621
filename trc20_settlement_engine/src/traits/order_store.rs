use thiserror::Error;
use tsg_common::UsdtAmount;

use crate::db_types::{CallbackRecord, Order, TradeId};

#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("There is an internal database error: {0}")]
    DatabaseError(String),
    #[error("The order {0} does not exist")]
    OrderNotFound(TradeId),
    #[error("The order {0} is not pending and cannot be finalized")]
    OrderNotPending(TradeId),
}

impl From<sqlx::Error> for OrderStoreError {
    fn from(e: sqlx::Error) -> Self {
        OrderStoreError::DatabaseError(e.to_string())
    }
}

/// The order store contract consumed by the settlement engine.
///
/// The store owns the order schema; the engine only reads and triggers the pending → paid transition.
#[allow(async_fn_in_trait)]
pub trait OrderStore {
    /// Exact-match lookup of the unique *pending* order expecting `amount` on `wallet`.
    ///
    /// `amount` must already be at match precision (four fractional digits). `None` is a normal, frequent
    /// outcome: underpayment, overpayment, or a transfer unrelated to any order. The store guarantees at most
    /// one pending order per (wallet, amount) pair, which is what makes re-observation of settled transfers
    /// harmless: once the order is paid it is no longer pending and the lookup misses.
    async fn trade_id_for_deposit(
        &self,
        wallet: &str,
        amount: UsdtAmount,
    ) -> Result<Option<TradeId>, OrderStoreError>;

    /// Full order detail for a trade id.
    async fn order_by_trade_id(&self, trade_id: &TradeId) -> Result<Option<Order>, OrderStoreError>;

    /// The pending → paid transition. Records the actual amount and on-chain transaction hash and returns the
    /// updated order. Fails if the order does not exist or is no longer pending. Never retried inline by the
    /// engine: a failed finalize leaves the order for operator tooling, because a blind retry risks
    /// double-crediting.
    async fn finalize_order(
        &self,
        trade_id: &TradeId,
        actual_amount: UsdtAmount,
        tx_hash: &str,
    ) -> Result<Order, OrderStoreError>;

    /// Persists the outcome of one notification delivery attempt (audit row + the order's callback-confirmed
    /// flag). Called unconditionally by the dispatcher, success or failure.
    async fn record_callback_outcome(&self, record: &CallbackRecord) -> Result<(), OrderStoreError>;
}
