use sqlx::SqliteConnection;

use crate::{db_types::WalletAddress, traits::OrderStoreError};

pub async fn active_wallets(conn: &mut SqliteConnection) -> Result<Vec<WalletAddress>, OrderStoreError> {
    let wallets = sqlx::query_as("SELECT token FROM wallet_addresses WHERE enabled = 1 ORDER BY id")
        .fetch_all(conn)
        .await?;
    Ok(wallets)
}

pub async fn insert_wallet(token: &str, conn: &mut SqliteConnection) -> Result<(), OrderStoreError> {
    sqlx::query("INSERT OR IGNORE INTO wallet_addresses (token) VALUES ($1)").bind(token).execute(conn).await?;
    Ok(())
}
