//! `SqliteDatabase` is the reference storage backend of the settlement engine: it implements the [`OrderStore`]
//! and [`WalletDirectory`] traits over a SQLite connection pool.

use std::fmt::Debug;

use sqlx::SqlitePool;
use tsg_common::UsdtAmount;

use super::db::{new_pool, orders, wallets};
use crate::{
    db_types::{CallbackRecord, NewOrder, Order, TradeId, WalletAddress},
    traits::{OrderStore, OrderStoreError, WalletDirectory},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new(url: &str) -> Result<Self, OrderStoreError> {
        let pool = new_pool(url).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Seeds one pending order. Order creation is owned by the merchant-facing service; this exists for
    /// tooling and tests.
    pub async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::insert_order(order, &mut conn).await
    }

    /// Registers a wallet address with the directory. Idempotent.
    pub async fn insert_wallet(&self, token: &str) -> Result<(), OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        wallets::insert_wallet(token, &mut conn).await
    }

    pub async fn count_callback_records(&self, trade_id: &TradeId) -> Result<i64, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::count_callback_records(trade_id, &mut conn).await
    }
}

impl OrderStore for SqliteDatabase {
    async fn trade_id_for_deposit(
        &self,
        wallet: &str,
        amount: UsdtAmount,
    ) -> Result<Option<TradeId>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::trade_id_for_deposit(wallet, amount, &mut conn).await
    }

    async fn order_by_trade_id(&self, trade_id: &TradeId) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_trade_id(trade_id, &mut conn).await
    }

    async fn finalize_order(
        &self,
        trade_id: &TradeId,
        actual_amount: UsdtAmount,
        tx_hash: &str,
    ) -> Result<Order, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::finalize_order(trade_id, actual_amount, tx_hash, &mut conn).await
    }

    async fn record_callback_outcome(&self, record: &CallbackRecord) -> Result<(), OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        orders::record_callback_outcome(record, &mut conn).await
    }
}

impl WalletDirectory for SqliteDatabase {
    async fn active_wallets(&self) -> Result<Vec<WalletAddress>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        wallets::active_wallets(&mut conn).await
    }
}

#[cfg(test)]
mod test {
    use crate::db_types::{CallbackConfirm, OrderId, OrderStatus};

    use super::*;

    const WALLET: &str = "TWallet1111111111111111111111111111";

    async fn test_db() -> SqliteDatabase {
        SqliteDatabase::new("sqlite::memory:").await.unwrap()
    }

    fn new_order(trade_id: &str, amount: UsdtAmount) -> NewOrder {
        NewOrder::new(TradeId(trade_id.to_string()), OrderId(format!("M-{trade_id}")), WALLET, amount)
            .with_notify_url("https://merchant.example/cb")
    }

    #[tokio::test]
    async fn deposit_lookup_only_sees_pending_orders() {
        let db = test_db().await;
        let amount = UsdtAmount::from_usdt(10);
        db.insert_order(new_order("T-1", amount)).await.unwrap();

        let hit = db.trade_id_for_deposit(WALLET, amount).await.unwrap();
        assert_eq!(hit, Some(TradeId("T-1".into())));
        // 9.9999 matches nothing.
        let near_miss = db.trade_id_for_deposit(WALLET, UsdtAmount::from(9_999_900)).await.unwrap();
        assert!(near_miss.is_none());

        let order = db.finalize_order(&TradeId("T-1".into()), amount, "txhash1").await.unwrap();
        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.actual_amount, Some(amount));
        assert_eq!(order.block_transaction_id.as_deref(), Some("txhash1"));

        // The paid order is no longer matchable: the second equal-amount transfer finds nothing.
        let second = db.trade_id_for_deposit(WALLET, amount).await.unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn finalize_is_not_repeatable() {
        let db = test_db().await;
        let amount = UsdtAmount::from_usdt(25);
        db.insert_order(new_order("T-2", amount)).await.unwrap();
        db.finalize_order(&TradeId("T-2".into()), amount, "txhash1").await.unwrap();
        let err = db.finalize_order(&TradeId("T-2".into()), amount, "txhash2").await.unwrap_err();
        assert!(matches!(err, OrderStoreError::OrderNotPending(_)));
        let missing = db.finalize_order(&TradeId("T-404".into()), amount, "txhash3").await.unwrap_err();
        assert!(matches!(missing, OrderStoreError::OrderNotFound(_)));
    }

    #[tokio::test]
    async fn pending_deposit_pairs_are_unique() {
        let db = test_db().await;
        let amount = UsdtAmount::from_usdt(10);
        db.insert_order(new_order("T-3", amount)).await.unwrap();
        // A second pending order for the same (wallet, amount) violates the store invariant.
        let err = db.insert_order(new_order("T-4", amount)).await;
        assert!(err.is_err());
        // A different amount on the same wallet is fine.
        db.insert_order(new_order("T-5", UsdtAmount::from_usdt(11))).await.unwrap();
    }

    #[tokio::test]
    async fn callback_outcome_updates_flag_and_audit_log() {
        let db = test_db().await;
        let amount = UsdtAmount::from_usdt(10);
        db.insert_order(new_order("T-6", amount)).await.unwrap();
        db.finalize_order(&TradeId("T-6".into()), amount, "txhash1").await.unwrap();

        let failed = CallbackRecord {
            trade_id: TradeId("T-6".into()),
            attempt: 1,
            confirmed: false,
            status_code: Some(500),
            response_body: Some("server error".to_string()),
            payload: "{}".to_string(),
        };
        db.record_callback_outcome(&failed).await.unwrap();
        let order = db.order_by_trade_id(&TradeId("T-6".into())).await.unwrap().unwrap();
        assert_eq!(order.callback_confirm, CallbackConfirm::Unconfirmed);

        let confirmed = CallbackRecord { attempt: 2, confirmed: true, status_code: Some(200), ..failed };
        db.record_callback_outcome(&confirmed).await.unwrap();
        let order = db.order_by_trade_id(&TradeId("T-6".into())).await.unwrap().unwrap();
        assert!(order.callback_confirm.is_confirmed());
        assert_eq!(db.count_callback_records(&TradeId("T-6".into())).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn wallet_directory_snapshot() {
        let db = test_db().await;
        db.insert_wallet(WALLET).await.unwrap();
        db.insert_wallet(WALLET).await.unwrap();
        db.insert_wallet("TWallet2222222222222222222222222222").await.unwrap();
        let wallets = db.active_wallets().await.unwrap();
        assert_eq!(wallets.len(), 2);
        assert_eq!(wallets[0], WalletAddress::from(WALLET));
    }
}
