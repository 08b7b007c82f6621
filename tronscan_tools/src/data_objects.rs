use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tsg_common::UsdtAmount;

/// The contract execution marker Tronscan reports for a transfer that actually settled on chain.
pub const CONTRACT_RET_SUCCESS: &str = "SUCCESS";

/// One page of the transfer-history response: `{page_size, code, data: [...]}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trc20TransferPage {
    #[serde(default)]
    pub page_size: i64,
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub data: Vec<RawTrc20Transfer>,
}

/// A raw transfer record as Tronscan returns it. Only the fields the gateway consumes are kept; unknown fields
/// are ignored on deserialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTrc20Transfer {
    /// Transfer amount in minor units, as a decimal integer string.
    pub amount: String,
    pub block_timestamp: i64,
    pub from: String,
    pub to: String,
    pub hash: String,
    #[serde(default)]
    pub confirmed: i64,
    #[serde(default)]
    pub contract_ret: String,
}

/// A normalized incoming transfer: addressed to the watched wallet, contract-confirmed, with the amount converted
/// to fixed-point USDT at match precision. Ephemeral; never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenTransfer {
    pub from: String,
    pub to: String,
    pub amount: UsdtAmount,
    pub block_timestamp: DateTime<Utc>,
    pub tx_hash: String,
}
