use std::sync::Arc;

use log::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use trc20_settlement_engine::{
    db_types::{CallbackRecord, NotificationTask},
    OrderStore,
};
use tsg_common::Secret;

use crate::callback::sign::sign_fields;

/// The order status code merchants receive for a settled payment.
pub const STATUS_PAY_SUCCESS: i64 = 2;

/// The body a merchant must answer with to acknowledge a notification.
const ACK_BODY: &str = "ok";

#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    #[error("Could not reach the merchant endpoint. {0}")]
    Transport(String),
    #[error("The merchant rejected the notification (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },
}

/// The JSON body POSTed to the merchant's notify URL. Amounts are rendered as fixed-point strings so the
/// merchant never has to parse a binary float.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderNotifyPayload {
    pub trade_id: String,
    pub order_id: String,
    pub amount: String,
    pub actual_amount: String,
    pub token: String,
    pub block_transaction_id: String,
    pub status: i64,
    pub signature: String,
}

impl OrderNotifyPayload {
    pub fn for_task(task: &NotificationTask, secret: &str) -> Self {
        let mut payload = Self {
            trade_id: task.trade_id.as_str().to_string(),
            order_id: task.order_id.as_str().to_string(),
            amount: task.amount.to_string(),
            actual_amount: task.actual_amount.to_string(),
            token: task.token.clone(),
            block_transaction_id: task.block_transaction_id.clone(),
            status: STATUS_PAY_SUCCESS,
            signature: String::new(),
        };
        payload.signature = sign_fields(&payload.signature_fields(), secret);
        payload
    }

    fn signature_fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("trade_id", self.trade_id.clone()),
            ("order_id", self.order_id.clone()),
            ("amount", self.amount.clone()),
            ("actual_amount", self.actual_amount.clone()),
            ("token", self.token.clone()),
            ("block_transaction_id", self.block_transaction_id.clone()),
            ("status", self.status.to_string()),
        ]
    }
}

/// A delivery attempt succeeds only when the merchant answers `200 OK` with a body of exactly `ok`. A 200 with
/// any other body is still a failure: the merchant's endpoint exists but did not process the notification.
pub fn delivery_confirmed(status: u16, body: &str) -> bool {
    status == 200 && body == ACK_BODY
}

/// Delivers merchant notifications and records the outcome of every attempt.
pub struct CallbackDispatcher<B> {
    db: B,
    client: Arc<Client>,
    secret: Secret<String>,
}

impl<B: Clone> Clone for CallbackDispatcher<B> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), client: Arc::clone(&self.client), secret: self.secret.clone() }
    }
}

impl<B> CallbackDispatcher<B>
where B: OrderStore
{
    pub fn new(db: B, secret: Secret<String>) -> Self {
        Self { db, client: Arc::new(Client::new()), secret }
    }

    /// Executes one delivery attempt for `task`.
    ///
    /// The outcome is persisted whatever happens: a confirmed delivery flips the order's callback flag, and a
    /// failed one leaves an audit row behind before the error is returned to the queue for retry scheduling.
    pub async fn deliver(&self, task: &NotificationTask, attempt: u32) -> Result<(), DeliveryError> {
        let payload = OrderNotifyPayload::for_task(task, self.secret.reveal());
        let payload_json = serde_json::to_string(&payload).unwrap_or_default();
        debug!("📤️ Delivering notification for {} to {} (attempt {attempt})", task.trade_id, task.notify_url);
        let result = self.post_notification(&task.notify_url, &payload).await;
        let (confirmed, status_code, response_body) = match &result {
            Ok(body) => (true, Some(200), Some(body.clone())),
            Err(DeliveryError::Rejected { status, body }) => (false, Some(*status), Some(body.clone())),
            Err(DeliveryError::Transport(_)) => (false, None, None),
        };
        let record = CallbackRecord {
            trade_id: task.trade_id.clone(),
            attempt,
            confirmed,
            status_code,
            response_body,
            payload: payload_json,
        };
        if let Err(e) = self.db.record_callback_outcome(&record).await {
            // The attempt outcome is an audit record; losing it does not change delivery semantics
            warn!("📤️ Could not record the delivery outcome for {}. {e}", task.trade_id);
        }
        match result {
            Ok(_) => {
                info!("📤️ Merchant confirmed the notification for {} on attempt {attempt}", task.trade_id);
                Ok(())
            },
            Err(e) => {
                warn!("📤️ Delivery attempt {attempt} for {} failed. {e}", task.trade_id);
                Err(e)
            },
        }
    }

    async fn post_notification(&self, url: &str, payload: &OrderNotifyPayload) -> Result<String, DeliveryError> {
        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| DeliveryError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| DeliveryError::Transport(e.to_string()))?;
        if delivery_confirmed(status, &body) {
            Ok(body)
        } else {
            Err(DeliveryError::Rejected { status, body })
        }
    }
}
