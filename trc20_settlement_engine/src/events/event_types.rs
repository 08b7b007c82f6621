use crate::db_types::Order;

/// Published once for every order the reconciler finalizes. Carries the settled order and the on-chain
/// transaction hash that paid it.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderSettledEvent {
    pub order: Order,
    pub tx_hash: String,
}

impl OrderSettledEvent {
    pub fn new(order: Order, tx_hash: String) -> Self {
        Self { order, tx_hash }
    }
}
