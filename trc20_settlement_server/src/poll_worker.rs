//! The wallet poll scheduler.
//!
//! A fixed-cadence timer fires poll rounds. Rounds never overlap: a round takes the coordinator's lock for its
//! whole lifetime, and a round that fires while its predecessor still runs simply waits its turn. The waiting
//! time counts against the newcomer's admission budget, so after a badly overrunning round the next one admits
//! few or no wallets and the system degrades by skipping work, never by piling it up.

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use log::*;
use tokio::{
    sync::Mutex,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};
use trc20_settlement_engine::{db_types::WalletAddress, SqliteDatabase, WalletDirectory};

/// The work executed for one wallet in one round. Must contain its own error handling; a pipeline failure for
/// one wallet is invisible to the others.
pub type WalletPipeline = Arc<dyn Fn(WalletAddress) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct PollRoundCoordinator<D> {
    directory: D,
    pipeline: WalletPipeline,
    round_budget: Duration,
    round_lock: Mutex<()>,
}

impl<D: WalletDirectory> PollRoundCoordinator<D> {
    pub fn new(directory: D, pipeline: WalletPipeline, round_budget: Duration) -> Self {
        Self { directory, pipeline, round_budget, round_lock: Mutex::new(()) }
    }

    /// Runs one poll round: snapshot the wallet directory, dispatch a pipeline task per wallet, wait for them
    /// all.
    ///
    /// The admission deadline starts ticking *before* the round lock is taken. Wallets are only dispatched while
    /// the deadline has not passed; wallets already dispatched always run to completion, however long they take.
    pub async fn run_round(&self) {
        let deadline = Instant::now() + self.round_budget;
        let _guard = self.round_lock.lock().await;
        let wallets = match self.directory.active_wallets().await {
            Ok(wallets) => wallets,
            Err(e) => {
                error!("⏱️ Could not load the wallet directory for this round. {e}");
                return;
            },
        };
        if wallets.is_empty() {
            debug!("⏱️ No active wallets to poll");
            return;
        }
        let total = wallets.len();
        let mut handles = Vec::with_capacity(total);
        let mut skipped = 0_usize;
        for wallet in wallets {
            if Instant::now() >= deadline {
                skipped += 1;
                continue;
            }
            trace!("⏱️ Dispatching poll task for {wallet}");
            let task = (self.pipeline)(wallet.clone());
            handles.push((wallet, tokio::spawn(task)));
        }
        if skipped > 0 {
            warn!(
                "⏱️ Round budget exhausted: {skipped} of {total} wallets skipped this round. They are picked up \
                 again on the next tick."
            );
        }
        for (wallet, handle) in handles {
            // A panicking pipeline task takes down its own wallet only
            if let Err(e) = handle.await {
                error!("⏱️ The poll task for {wallet} panicked. {e}");
            }
        }
    }
}

/// Runs poll rounds on a fixed cadence until cancelled.
///
/// Rounds are awaited in the tick loop itself: when a round overruns the interval, `Delay` coalesces the missed
/// ticks into a single pending one, so at most one invocation ever queues up behind a running round.
pub async fn run_poll_loop<D: WalletDirectory>(coordinator: PollRoundCoordinator<D>, poll_interval: Duration) {
    let mut timer = tokio::time::interval(poll_interval);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    loop {
        timer.tick().await;
        coordinator.run_round().await;
    }
}

/// Starts the poll worker. Do not await the returned JoinHandle, as it will run indefinitely.
pub fn start_poll_worker(
    db: SqliteDatabase,
    pipeline: WalletPipeline,
    poll_interval: Duration,
    round_budget: Duration,
) -> JoinHandle<()> {
    info!("⏱️ Wallet poll worker started (every {}s, budget {}ms)", poll_interval.as_secs(), round_budget.as_millis());
    let coordinator = PollRoundCoordinator::new(db, pipeline, round_budget);
    tokio::spawn(run_poll_loop(coordinator, poll_interval))
}
