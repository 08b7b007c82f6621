use log::debug;
use sqlx::SqliteConnection;
use tsg_common::UsdtAmount;

use crate::{
    db_types::{CallbackConfirm, CallbackRecord, NewOrder, Order, TradeId},
    traits::OrderStoreError,
};

/// Inserts a pending order. The partial unique index rejects a second pending order for the same
/// (wallet, amount) pair.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderStoreError> {
    let order = sqlx::query_as(
        r#"
            INSERT INTO orders (trade_id, order_id, token, requested_amount, notify_url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(order.trade_id)
    .bind(order.order_id)
    .bind(order.token)
    .bind(order.requested_amount)
    .bind(order.notify_url)
    .fetch_one(conn)
    .await?;
    Ok(order)
}

/// The (wallet, amount) match lookup. Only `Pending` rows are ever considered, so settled orders cannot be
/// re-matched when the poller re-observes an old transfer inside its lookback window.
pub async fn trade_id_for_deposit(
    wallet: &str,
    amount: UsdtAmount,
    conn: &mut SqliteConnection,
) -> Result<Option<TradeId>, OrderStoreError> {
    let trade_id: Option<String> = sqlx::query_scalar(
        "SELECT trade_id FROM orders WHERE token = $1 AND requested_amount = $2 AND status = 'Pending' LIMIT 1",
    )
    .bind(wallet)
    .bind(amount)
    .fetch_optional(conn)
    .await?;
    Ok(trade_id.map(TradeId::from))
}

pub async fn fetch_order_by_trade_id(
    trade_id: &TradeId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, OrderStoreError> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE trade_id = $1")
        .bind(trade_id.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

/// The pending → paid transition. The status guard in the WHERE clause makes this a no-op on anything but a
/// pending order, which is then reported as an explicit error.
pub async fn finalize_order(
    trade_id: &TradeId,
    actual_amount: UsdtAmount,
    tx_hash: &str,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderStoreError> {
    let result = sqlx::query(
        r#"
            UPDATE orders
            SET status = 'Paid', actual_amount = $2, block_transaction_id = $3, updated_at = CURRENT_TIMESTAMP
            WHERE trade_id = $1 AND status = 'Pending'
        "#,
    )
    .bind(trade_id.as_str())
    .bind(actual_amount)
    .bind(tx_hash)
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() == 0 {
        return match fetch_order_by_trade_id(trade_id, conn).await? {
            Some(_) => Err(OrderStoreError::OrderNotPending(trade_id.clone())),
            None => Err(OrderStoreError::OrderNotFound(trade_id.clone())),
        };
    }
    debug!("🗃️ Order {trade_id} marked as paid ({tx_hash})");
    fetch_order_by_trade_id(trade_id, conn).await?.ok_or_else(|| OrderStoreError::OrderNotFound(trade_id.clone()))
}

/// Writes the audit row for one delivery attempt and updates the order's callback-confirmed flag to match.
pub async fn record_callback_outcome(
    record: &CallbackRecord,
    conn: &mut SqliteConnection,
) -> Result<(), OrderStoreError> {
    let confirm = if record.confirmed { CallbackConfirm::Confirmed } else { CallbackConfirm::Unconfirmed };
    sqlx::query("UPDATE orders SET callback_confirm = $2, updated_at = CURRENT_TIMESTAMP WHERE trade_id = $1")
        .bind(record.trade_id.as_str())
        .bind(confirm)
        .execute(&mut *conn)
        .await?;
    sqlx::query(
        r#"
            INSERT INTO callback_log (trade_id, attempt, confirmed, status_code, response_body, payload)
            VALUES ($1, $2, $3, $4, $5, $6)
        "#,
    )
    .bind(record.trade_id.as_str())
    .bind(record.attempt)
    .bind(record.confirmed)
    .bind(record.status_code.map(i64::from))
    .bind(record.response_body.as_deref())
    .bind(record.payload.as_str())
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn count_callback_records(trade_id: &TradeId, conn: &mut SqliteConnection) -> Result<i64, OrderStoreError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM callback_log WHERE trade_id = $1")
        .bind(trade_id.as_str())
        .fetch_one(conn)
        .await?;
    Ok(count)
}
