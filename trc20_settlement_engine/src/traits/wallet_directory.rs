use crate::{
    db_types::WalletAddress,
    traits::OrderStoreError,
};

/// Read-only view of the wallet addresses currently assigned to receive payments. Address allocation is owned by
/// an external process; a poll round takes one snapshot and works off that.
#[allow(async_fn_in_trait)]
pub trait WalletDirectory {
    async fn active_wallets(&self) -> Result<Vec<WalletAddress>, OrderStoreError>;
}
