use chrono::DateTime;
use log::*;
use tsg_common::UsdtAmount;

use crate::data_objects::{RawTrc20Transfer, TokenTransfer, CONTRACT_RET_SUCCESS};

/// Normalizes a batch of raw transfer records for `wallet`.
///
/// Records that are not addressed to `wallet`, or whose contract did not execute successfully, are expected noise
/// (outgoing transfers, reverted transactions) and are dropped silently at trace level. A malformed amount drops
/// only that one record; the rest of the batch is unaffected.
pub fn normalize_transfers(wallet: &str, raw: Vec<RawTrc20Transfer>) -> Vec<TokenTransfer> {
    raw.into_iter().filter_map(|t| normalize_transfer(wallet, t)).collect()
}

fn normalize_transfer(wallet: &str, transfer: RawTrc20Transfer) -> Option<TokenTransfer> {
    if transfer.to != wallet || transfer.contract_ret != CONTRACT_RET_SUCCESS {
        trace!(
            "⛓️ Ignoring transfer {}: to={}, contract_ret={}. Not an incoming settled transfer for {wallet}",
            transfer.hash,
            transfer.to,
            transfer.contract_ret
        );
        return None;
    }
    let amount = match UsdtAmount::from_minor_units(&transfer.amount) {
        Ok(amount) => amount.rounded_4dp(),
        Err(e) => {
            warn!("⛓️ Skipping transfer {} with a malformed amount. {e}", transfer.hash);
            return None;
        },
    };
    let Some(block_timestamp) = DateTime::from_timestamp_millis(transfer.block_timestamp) else {
        warn!(
            "⛓️ Skipping transfer {} with an out-of-range block timestamp ({})",
            transfer.hash, transfer.block_timestamp
        );
        return None;
    };
    debug!("⛓️ Transfer {}: {} → {wallet} for {amount} USDT", transfer.hash, transfer.from);
    Some(TokenTransfer {
        from: transfer.from,
        to: transfer.to,
        amount,
        block_timestamp,
        tx_hash: transfer.hash,
    })
}

#[cfg(test)]
mod test {
    use super::*;

    const WALLET: &str = "TWallet1111111111111111111111111111";

    fn raw(to: &str, amount: &str, contract_ret: &str) -> RawTrc20Transfer {
        RawTrc20Transfer {
            amount: amount.to_string(),
            block_timestamp: 1_717_000_000_000,
            from: "TSender1111111111111111111111111111".to_string(),
            to: to.to_string(),
            hash: format!("hash-{amount}"),
            confirmed: 1,
            contract_ret: contract_ret.to_string(),
        }
    }

    #[test]
    fn incoming_settled_transfers_are_kept() {
        let transfers = normalize_transfers(WALLET, vec![raw(WALLET, "1500000", "SUCCESS")]);
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].amount.to_string(), "1.5000");
        assert_eq!(transfers[0].to, WALLET);
    }

    #[test]
    fn outgoing_and_reverted_transfers_are_dropped() {
        let batch = vec![
            raw("TSomeoneElse11111111111111111111111", "1500000", "SUCCESS"),
            raw(WALLET, "1500000", "REVERT"),
            raw(WALLET, "1500000", "OUT_OF_ENERGY"),
        ];
        assert!(normalize_transfers(WALLET, batch).is_empty());
    }

    #[test]
    fn malformed_amount_drops_one_record_not_the_batch() {
        let batch = vec![
            raw(WALLET, "not-a-number", "SUCCESS"),
            raw(WALLET, "10000000", "SUCCESS"),
        ];
        let transfers = normalize_transfers(WALLET, batch);
        assert_eq!(transfers.len(), 1);
        assert_eq!(transfers[0].amount.to_string(), "10.0000");
    }

    #[test]
    fn amounts_are_rounded_to_match_precision() {
        let transfers = normalize_transfers(WALLET, vec![raw(WALLET, "9999950", "SUCCESS")]);
        assert_eq!(transfers[0].amount, UsdtAmount::from_usdt(10));
    }
}
