pub mod orders;
pub mod wallets;

use std::{env, str::FromStr};

use log::*;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use crate::traits::OrderStoreError;

/// The schema is applied idempotently on every pool creation. The partial unique index on
/// `(token, requested_amount) WHERE status = 'Pending'` is the store-level enforcement of the
/// one-pending-order-per-deposit invariant the reconciler relies on.
const SCHEMA: [&str; 4] = [
    r#"CREATE TABLE IF NOT EXISTS orders (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        trade_id TEXT NOT NULL UNIQUE,
        order_id TEXT NOT NULL,
        token TEXT NOT NULL,
        requested_amount INTEGER NOT NULL,
        actual_amount INTEGER,
        status TEXT NOT NULL DEFAULT 'Pending',
        notify_url TEXT NOT NULL DEFAULT '',
        block_transaction_id TEXT,
        callback_confirm TEXT NOT NULL DEFAULT 'Unconfirmed',
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP,
        updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
    )"#,
    r#"CREATE UNIQUE INDEX IF NOT EXISTS idx_orders_pending_deposit
        ON orders (token, requested_amount) WHERE status = 'Pending'"#,
    r#"CREATE TABLE IF NOT EXISTS wallet_addresses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        token TEXT NOT NULL UNIQUE,
        enabled INTEGER NOT NULL DEFAULT 1,
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
    )"#,
    r#"CREATE TABLE IF NOT EXISTS callback_log (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        trade_id TEXT NOT NULL,
        attempt INTEGER NOT NULL,
        confirmed INTEGER NOT NULL,
        status_code INTEGER,
        response_body TEXT,
        payload TEXT NOT NULL,
        created_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
    )"#,
];

pub fn db_url() -> String {
    env::var("TSG_DATABASE_URL").unwrap_or_else(|_| {
        warn!("🗃️ TSG_DATABASE_URL is not set. Falling back to a local database file.");
        "sqlite://data/tsg.db".to_string()
    })
}

pub async fn new_pool(url: &str) -> Result<SqlitePool, OrderStoreError> {
    let options = SqliteConnectOptions::from_str(url)
        .map_err(|e| OrderStoreError::DatabaseError(format!("Invalid database url ({url}): {e}")))?
        .create_if_missing(true);
    // An in-memory SQLite database exists per connection, so the pool must not fan out.
    let max_connections = if url.contains(":memory:") { 1 } else { 8 };
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    for statement in SCHEMA {
        sqlx::query(statement).execute(&pool).await?;
    }
    debug!("🗃️ Connected to {url}");
    Ok(pool)
}
