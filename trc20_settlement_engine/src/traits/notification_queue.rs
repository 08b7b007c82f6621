use thiserror::Error;

use crate::db_types::NotificationTask;

#[derive(Debug, Clone, Error)]
pub enum QueueError {
    #[error("The notification queue is unavailable. {0}")]
    Unavailable(String),
}

/// A durable, at-least-once work queue for merchant notifications.
///
/// The engine enqueues exactly one task per settled order and walks away; delivery, retry scheduling (bounded by
/// `max_retries` total attempts) and consumer concurrency are entirely the queue's concern. No particular backing
/// store is assumed.
#[allow(async_fn_in_trait)]
pub trait NotificationQueue {
    async fn enqueue(&self, task: NotificationTask, max_retries: u32) -> Result<(), QueueError>;
}
