use std::sync::Arc;

use log::*;
use tronscan_tools::TronscanApi;
use trc20_settlement_engine::{
    events::{EventHandlers, EventHooks},
    SettlementApi,
    SqliteDatabase,
};

use crate::{
    callback::CallbackDispatcher,
    config::ServerConfig,
    errors::ServerError,
    notify_queue::{start_delivery_worker, MemoryQueue},
    pipeline::poll_wallet,
    poll_worker::{start_poll_worker, WalletPipeline},
    telegram::register_telegram_hook,
};

/// Wires the gateway together and runs it until interrupted.
///
/// Three long-lived pieces come up, in order: the event handlers (side channels), the notification delivery
/// worker, and the wallet poll worker. Everything shares the one SQLite pool.
pub async fn run_gateway(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new(&config.database_url)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;

    let mut hooks = EventHooks::default();
    register_telegram_hook(&mut hooks, config.telegram.clone());
    let handlers = EventHandlers::new(128, hooks);
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let (queue, receiver) = MemoryQueue::new();
    let settlement = Arc::new(
        SettlementApi::new(db.clone(), queue.clone(), producers)
            .with_max_delivery_attempts(config.callback_max_attempts),
    );
    let dispatcher = CallbackDispatcher::new(db.clone(), config.api_auth_token.clone());
    let _delivery_worker = start_delivery_worker(receiver, dispatcher, queue.clone(), config.callback_backoff);

    let ledger = TronscanApi::new(config.tronscan.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let pipeline = settlement_pipeline(ledger, Arc::clone(&settlement), config.lookback_hours);
    let _poll_worker = start_poll_worker(db, pipeline, config.poll_interval, config.round_budget);

    tokio::signal::ctrl_c().await?;
    info!("🛑️ Interrupt received. Shutting down the gateway");
    Ok(())
}

/// Builds the per-wallet pipeline used by the poll worker: fetch, normalize, settle, contain errors.
pub fn settlement_pipeline(
    ledger: TronscanApi,
    settlement: Arc<SettlementApi<SqliteDatabase, MemoryQueue>>,
    lookback_hours: i64,
) -> WalletPipeline {
    Arc::new(move |wallet| {
        let ledger = ledger.clone();
        let settlement = Arc::clone(&settlement);
        Box::pin(async move {
            match poll_wallet(&ledger, &settlement, &wallet.token, lookback_hours).await {
                Ok(settled) if !settled.is_empty() => {
                    info!("🔄️ {} settled {} order(s) this round", wallet.token, settled.len());
                },
                Ok(_) => {},
                Err(e) => {
                    // One wallet's bad round must not disturb the others; the next round retries naturally
                    warn!("🔄️ Polling {} failed this round. {e}", wallet.token);
                },
            }
        })
    })
}
