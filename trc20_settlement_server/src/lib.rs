//! # TRC20 settlement server
//! This module hosts the long-running settlement gateway. It is responsible for:
//! Polling the transfer history of every active wallet on a fixed cadence.
//! Matching observed transfers against pending merchant orders and finalizing them.
//! Delivering signed payment notifications to merchants, with bounded retries.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.

pub mod callback;
pub mod cli;
pub mod config;
pub mod errors;
pub mod notify_queue;
pub mod pipeline;
pub mod poll_worker;
pub mod server;
pub mod telegram;
