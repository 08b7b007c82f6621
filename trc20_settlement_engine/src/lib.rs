//! TRC20 Settlement Engine
//!
//! The settlement engine is the core of the TRC20 payment gateway: it matches transfers observed on the Tron
//! ledger against pending merchant orders and drives order finalization. It is backend-agnostic.
//!
//! The library is divided into three main sections:
//! 1. The storage contracts ([`mod@traits`]). The engine reads orders and wallet addresses through the
//!    [`OrderStore`] and [`WalletDirectory`] traits, and hands settled orders to a durable [`NotificationQueue`].
//!    A SQLite backend implementing the storage traits ships behind the `sqlite` feature.
//! 2. The reconciler ([`SettlementApi`]). Given a batch of normalized transfers for one wallet, it performs the
//!    exact (wallet, amount) match, validates temporal causality, finalizes the order (pending → paid), and
//!    enqueues exactly one merchant notification per settlement.
//! 3. The event hooks ([`mod@events`]). Each settlement emits an `OrderSettledEvent` so side channels (e.g. the
//!    Telegram notifier) can react without being part of the settlement path.

pub mod db_types;
pub mod events;
mod reconciler;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(feature = "sqlite")]
pub use sqlite::{db, SqliteDatabase};
pub use reconciler::{SettlementApi, SettlementError, DEFAULT_MAX_DELIVERY_ATTEMPTS};
pub use traits::{NotificationQueue, OrderStore, OrderStoreError, QueueError, WalletDirectory};
