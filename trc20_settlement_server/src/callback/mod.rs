//! Merchant notification delivery.
//!
//! A settled order produces one [`OrderNotifyPayload`], signed with the merchant's shared secret and POSTed to
//! the order's notify URL. The merchant acknowledges by answering `200 OK` with a body of exactly `ok`; anything
//! else counts as a failed attempt and is retried by the queue, up to the configured attempt budget. Every
//! attempt's outcome is persisted, confirmed or not.

mod dispatcher;
mod sign;

pub use dispatcher::{delivery_confirmed, CallbackDispatcher, DeliveryError, OrderNotifyPayload, STATUS_PAY_SUCCESS};
pub use sign::sign_fields;
