//! The in-process notification queue and its delivery worker.
//!
//! The reconciler enqueues one [`NotificationTask`] per settled order. The delivery worker consumes them,
//! performs one attempt via the [`CallbackDispatcher`], and on failure schedules a retry after a fixed backoff,
//! up to the task's attempt budget. Attempts beyond the budget are abandoned (the per-attempt audit trail makes
//! the failure visible for out-of-band reconciliation).

use std::time::Duration;

use log::*;
use tokio::{sync::mpsc, task::JoinHandle};
use trc20_settlement_engine::{
    db_types::NotificationTask,
    NotificationQueue,
    OrderStore,
    QueueError,
    SqliteDatabase,
};

use crate::callback::CallbackDispatcher;

/// One unit of delivery work: the task plus its retry bookkeeping.
#[derive(Debug, Clone)]
pub struct QueuedDelivery {
    pub task: NotificationTask,
    /// 1-based attempt counter.
    pub attempt: u32,
    /// Total attempts granted, the first one included.
    pub max_attempts: u32,
}

/// An unbounded in-process queue of merchant notifications.
///
/// Cheap to clone; every clone feeds the same receiver. Dropping all clones closes the channel and lets the
/// delivery worker drain and exit.
#[derive(Clone)]
pub struct MemoryQueue {
    sender: mpsc::UnboundedSender<QueuedDelivery>,
}

impl MemoryQueue {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<QueuedDelivery>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    fn requeue(&self, delivery: QueuedDelivery, after: Duration) {
        let sender = self.sender.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            if sender.send(delivery).is_err() {
                debug!("📮️ Not rescheduling a delivery: the queue has shut down");
            }
        });
    }
}

impl NotificationQueue for MemoryQueue {
    async fn enqueue(&self, task: NotificationTask, max_retries: u32) -> Result<(), QueueError> {
        let delivery = QueuedDelivery { task, attempt: 1, max_attempts: max_retries };
        self.sender.send(delivery).map_err(|e| QueueError::Unavailable(e.to_string()))
    }
}

/// Consumes queued deliveries until the queue closes.
///
/// Attempts run one at a time; a failed attempt with budget left is rescheduled on its own timer, so a slow
/// merchant delays only its own retries, not the rest of the queue.
pub async fn run_delivery_loop<B: OrderStore>(
    mut receiver: mpsc::UnboundedReceiver<QueuedDelivery>,
    dispatcher: CallbackDispatcher<B>,
    queue: MemoryQueue,
    backoff: Duration,
) {
    info!("📮️ Notification delivery worker started");
    while let Some(delivery) = receiver.recv().await {
        let QueuedDelivery { task, attempt, max_attempts } = delivery;
        match dispatcher.deliver(&task, attempt).await {
            Ok(()) => {},
            Err(e) if attempt < max_attempts => {
                debug!(
                    "📮️ Scheduling attempt {}/{max_attempts} for {} in {}s. Last error: {e}",
                    attempt + 1,
                    task.trade_id,
                    backoff.as_secs()
                );
                queue.requeue(QueuedDelivery { task, attempt: attempt + 1, max_attempts }, backoff);
            },
            Err(e) => {
                error!(
                    "📮️ Giving up on the notification for {} after {attempt} attempts. {e}. The merchant must \
                     reconcile this order out-of-band.",
                    task.trade_id
                );
            },
        }
    }
    info!("📮️ Notification delivery worker has shut down");
}

/// Starts the delivery worker. Do not await the returned JoinHandle, as it runs until the queue closes.
pub fn start_delivery_worker(
    receiver: mpsc::UnboundedReceiver<QueuedDelivery>,
    dispatcher: CallbackDispatcher<SqliteDatabase>,
    queue: MemoryQueue,
    backoff: Duration,
) -> JoinHandle<()> {
    tokio::spawn(run_delivery_loop(receiver, dispatcher, queue, backoff))
}

#[cfg(test)]
mod test {
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    };

    use trc20_settlement_engine::{
        db_types::{CallbackRecord, Order, TradeId},
        OrderStoreError,
    };
    use tsg_common::{Secret, UsdtAmount};

    use super::*;

    /// Counts recorded delivery attempts; everything else is a stub.
    #[derive(Clone, Default)]
    struct CountingStore {
        attempts: Arc<AtomicU32>,
        confirmed: Arc<AtomicU32>,
    }

    impl OrderStore for CountingStore {
        async fn trade_id_for_deposit(&self, _: &str, _: UsdtAmount) -> Result<Option<TradeId>, OrderStoreError> {
            Ok(None)
        }

        async fn order_by_trade_id(&self, _: &TradeId) -> Result<Option<Order>, OrderStoreError> {
            Ok(None)
        }

        async fn finalize_order(
            &self,
            trade_id: &TradeId,
            _: UsdtAmount,
            _: &str,
        ) -> Result<Order, OrderStoreError> {
            Err(OrderStoreError::OrderNotFound(trade_id.clone()))
        }

        async fn record_callback_outcome(&self, record: &CallbackRecord) -> Result<(), OrderStoreError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            if record.confirmed {
                self.confirmed.fetch_add(1, Ordering::SeqCst);
            }
            Ok(())
        }
    }

    fn task(notify_url: &str) -> NotificationTask {
        NotificationTask {
            trade_id: TradeId("T-1".into()),
            order_id: "M-1001".to_string().into(),
            token: "TWallet1111111111111111111111111111".to_string(),
            amount: UsdtAmount::from_usdt(10),
            actual_amount: UsdtAmount::from_usdt(10),
            block_transaction_id: "abc123".to_string(),
            notify_url: notify_url.to_string(),
        }
    }

    #[tokio::test]
    async fn an_undeliverable_notification_gets_exactly_its_attempt_budget() {
        let store = CountingStore::default();
        let attempts = Arc::clone(&store.attempts);
        let dispatcher = CallbackDispatcher::new(store, Secret::new("hunter2".to_string()));
        let (queue, receiver) = MemoryQueue::new();
        // Port 1 is never listening, so every attempt fails with a transport error
        queue.enqueue(task("http://127.0.0.1:1/notify"), 5).await.unwrap();
        // The loop never returns on its own (the queue stays open for requeues), so give it a deadline
        let _ = tokio::time::timeout(
            Duration::from_secs(5),
            run_delivery_loop(receiver, dispatcher, queue.clone(), Duration::ZERO),
        )
        .await;
        assert_eq!(attempts.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn queue_shutdown_stops_the_worker() {
        let store = CountingStore::default();
        let dispatcher = CallbackDispatcher::new(store, Secret::new("hunter2".to_string()));
        let (queue, receiver) = MemoryQueue::new();
        drop(queue);
        // With every sender gone the loop drains and returns immediately
        tokio::time::timeout(Duration::from_secs(1), async move {
            run_delivery_loop(receiver, dispatcher, MemoryQueue::new().0, Duration::ZERO).await;
        })
        .await
        .unwrap();
    }
}
