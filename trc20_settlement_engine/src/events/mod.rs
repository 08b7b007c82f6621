//! Event hooks of the settlement engine.
//!
//! A simple stateless pub-sub layer: the reconciler publishes an [`OrderSettledEvent`] for every finalized order,
//! and side channels (the Telegram notifier, for instance) register async handlers at startup. Handlers receive
//! only the event itself; they have no access to engine state and cannot affect the settlement path.

mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::OrderSettledEvent;
pub use hooks::{EventHandlers, EventHooks, EventProducers};
