//! Storage and queue contracts of the settlement engine.
//!
//! The engine never talks to a database or a message broker directly. Backends implement these traits:
//!
//! * [`OrderStore`] is the contract with the order store. Its (wallet, amount) lookup over *pending* orders is the
//!   single source of truth enforcing the one-pending-order-per-deposit invariant; the engine deliberately adds no
//!   locking or dedup state of its own on top of it.
//! * [`WalletDirectory`] provides the snapshot of wallet addresses to poll in a round.
//! * [`NotificationQueue`] is a durable at-least-once work queue for merchant notifications. Enqueue, consume and
//!   retry bookkeeping are the backend's concern; the engine only ever enqueues.

mod notification_queue;
mod order_store;
mod wallet_directory;

pub use notification_queue::{NotificationQueue, QueueError};
pub use order_store::{OrderStore, OrderStoreError};
pub use wallet_directory::WalletDirectory;
