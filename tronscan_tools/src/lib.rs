//! Tronscan client for the TRC20 settlement gateway.
//!
//! This crate talks to the Tronscan TRC20 transfer-history API and turns its raw records into normalized
//! [`TokenTransfer`]s: incoming, contract-confirmed transfers with a fixed-point USDT amount. Everything else
//! (outgoing transfers, reverted contracts, malformed amounts) is filtered out before it reaches the settlement
//! engine.

mod api;
mod config;
mod data_objects;
mod error;
mod helpers;

pub use api::TronscanApi;
pub use config::{TronscanConfig, DEFAULT_TRONSCAN_API_URL, DEFAULT_USDT_CONTRACT_ID};
pub use data_objects::{RawTrc20Transfer, TokenTransfer, Trc20TransferPage, CONTRACT_RET_SUCCESS};
pub use error::LedgerApiError;
pub use helpers::normalize_transfers;
