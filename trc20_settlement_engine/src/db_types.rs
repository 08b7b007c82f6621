use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;
use tsg_common::UsdtAmount;

//--------------------------------------        TradeId        --------------------------------------------------------
/// The gateway-internal identifier of an order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct TradeId(pub String);

impl FromStr for TradeId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for TradeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for TradeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TradeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------        OrderId        --------------------------------------------------------
/// The merchant-facing identifier of an order.
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------      OrderStatus      --------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatus {
    /// The order is awaiting an on-chain transfer.
    Pending,
    /// A matching transfer was observed and the order has been finalized.
    Paid,
    /// The order timed out before a matching transfer arrived.
    Expired,
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "Pending"),
            OrderStatus::Paid => write!(f, "Paid"),
            OrderStatus::Expired => write!(f, "Expired"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid order status: {0}")]
pub struct ConversionError(String);

impl FromStr for OrderStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Paid" => Ok(Self::Paid),
            "Expired" => Ok(Self::Expired),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatus::Pending
        })
    }
}

//--------------------------------------    CallbackConfirm    --------------------------------------------------------
/// Whether the merchant has acknowledged the payment notification with the expected `ok` response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum CallbackConfirm {
    Unconfirmed,
    Confirmed,
}

impl CallbackConfirm {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, CallbackConfirm::Confirmed)
    }
}

impl Display for CallbackConfirm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CallbackConfirm::Unconfirmed => write!(f, "Unconfirmed"),
            CallbackConfirm::Confirmed => write!(f, "Confirmed"),
        }
    }
}

impl From<String> for CallbackConfirm {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Confirmed" => Self::Confirmed,
            _ => Self::Unconfirmed,
        }
    }
}

//--------------------------------------     WalletAddress     --------------------------------------------------------
/// A wallet address currently assigned to receive incoming payments. Allocation is an external concern; the
/// settlement core only ever reads a snapshot of the active set, once per poll round.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct WalletAddress {
    pub token: String,
}

impl Display for WalletAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.token)
    }
}

impl From<&str> for WalletAddress {
    fn from(value: &str) -> Self {
        Self { token: value.to_string() }
    }
}

impl From<String> for WalletAddress {
    fn from(token: String) -> Self {
        Self { token }
    }
}

//--------------------------------------        Order          --------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub trade_id: TradeId,
    pub order_id: OrderId,
    /// The wallet address assigned to receive this order's payment.
    pub token: String,
    pub requested_amount: UsdtAmount,
    /// Set when a transfer is matched. Can differ from `requested_amount` only in sub-match-precision digits.
    pub actual_amount: Option<UsdtAmount>,
    pub status: OrderStatus,
    pub notify_url: String,
    pub block_transaction_id: Option<String>,
    pub callback_confirm: CallbackConfirm,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------       NewOrder        --------------------------------------------------------
/// A pending order as handed to the store. Order creation itself belongs to the merchant-facing service; this
/// type exists so backends and tests can seed the store.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub trade_id: TradeId,
    pub order_id: OrderId,
    pub token: String,
    pub requested_amount: UsdtAmount,
    pub notify_url: String,
}

impl NewOrder {
    pub fn new(trade_id: TradeId, order_id: OrderId, token: &str, requested_amount: UsdtAmount) -> Self {
        Self {
            trade_id,
            order_id,
            token: token.to_string(),
            requested_amount,
            notify_url: String::default(),
        }
    }

    pub fn with_notify_url(mut self, url: &str) -> Self {
        self.notify_url = url.to_string();
        self
    }
}

//--------------------------------------   NotificationTask    --------------------------------------------------------
/// A snapshot of an order at the moment of settlement, carrying everything a delivery attempt needs to rebuild
/// the signed merchant notification without re-querying the order store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationTask {
    pub trade_id: TradeId,
    pub order_id: OrderId,
    pub token: String,
    pub amount: UsdtAmount,
    pub actual_amount: UsdtAmount,
    pub block_transaction_id: String,
    pub notify_url: String,
}

impl NotificationTask {
    /// Snapshots a just-finalized order. `actual_amount` and `block_transaction_id` fall back to the requested
    /// amount and an empty hash if the store did not record them, which cannot happen after a successful
    /// finalize.
    pub fn for_order(order: &Order) -> Self {
        Self {
            trade_id: order.trade_id.clone(),
            order_id: order.order_id.clone(),
            token: order.token.clone(),
            amount: order.requested_amount,
            actual_amount: order.actual_amount.unwrap_or(order.requested_amount),
            block_transaction_id: order.block_transaction_id.clone().unwrap_or_default(),
            notify_url: order.notify_url.clone(),
        }
    }
}

//--------------------------------------    CallbackRecord     --------------------------------------------------------
/// The audited outcome of one notification delivery attempt. Persisted unconditionally, success or failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackRecord {
    pub trade_id: TradeId,
    pub attempt: u32,
    pub confirmed: bool,
    pub status_code: Option<u16>,
    pub response_body: Option<String>,
    /// The exact JSON payload that was sent, for reconciliation.
    pub payload: String,
}

//--------------------------------------    TransferNotice     --------------------------------------------------------
/// A normalized ledger transfer as presented to the reconciler: incoming, contract-confirmed, amount already at
/// match precision. Consumed once; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferNotice {
    pub wallet: String,
    pub amount: UsdtAmount,
    pub block_timestamp: DateTime<Utc>,
    pub tx_hash: String,
}
