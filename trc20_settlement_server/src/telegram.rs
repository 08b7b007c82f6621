//! Telegram side channel.
//!
//! An optional announcement bot: when configured, every settled order is posted to a Telegram chat. The
//! notifier runs as an event-hook subscriber, entirely outside the settlement path; a Telegram outage costs
//! nothing but the announcement itself.

use std::env;

use log::*;
use reqwest::Client;
use serde_json::json;
use trc20_settlement_engine::events::{EventHooks, OrderSettledEvent};
use tsg_common::Secret;

#[derive(Clone, Debug, Default)]
pub struct TelegramConfig {
    pub bot_token: Secret<String>,
    pub chat_id: String,
}

impl TelegramConfig {
    pub fn from_env_or_default() -> Self {
        let bot_token = env::var("TSG_TELEGRAM_BOT_TOKEN").map(Secret::new).unwrap_or_default();
        let chat_id = env::var("TSG_TELEGRAM_CHAT_ID").unwrap_or_default();
        if bot_token.reveal().is_empty() || chat_id.is_empty() {
            info!(
                "🪛️ Telegram announcements are disabled. Set TSG_TELEGRAM_BOT_TOKEN and TSG_TELEGRAM_CHAT_ID to \
                 enable them."
            );
        }
        Self { bot_token, chat_id }
    }

    pub fn is_enabled(&self) -> bool {
        !self.bot_token.reveal().is_empty() && !self.chat_id.is_empty()
    }
}

/// Subscribes the announcement bot to the order-settled hook. A no-op when the bot is not configured.
pub fn register_telegram_hook(hooks: &mut EventHooks, config: TelegramConfig) {
    if !config.is_enabled() {
        return;
    }
    hooks.on_order_settled(move |event| {
        let config = config.clone();
        Box::pin(async move {
            let message = format_settlement_message(&event);
            send_to_bot(&config, &message).await;
        })
    });
}

fn format_settlement_message(event: &OrderSettledEvent) -> String {
    let order = &event.order;
    let amount = order.actual_amount.unwrap_or(order.requested_amount);
    format!(
        "<b>Order settled</b> 💰\nOrder: {}\nTrade id: <code>{}</code>\nAmount: <b>{amount} USDT</b>\nWallet: \
         <code>{}</code>\nTx: <code>{}</code>",
        order.order_id, order.trade_id, order.token, event.tx_hash
    )
}

/// Posts one message to the configured chat. Failures are logged and dropped.
async fn send_to_bot(config: &TelegramConfig, message: &str) {
    let url = format!("https://api.telegram.org/bot{}/sendMessage", config.bot_token.reveal());
    let body = json!({
        "chat_id": config.chat_id,
        "text": message,
        "parse_mode": "HTML",
    });
    let result = Client::new().post(&url).json(&body).send().await;
    match result {
        Ok(response) if response.status().is_success() => {
            trace!("🤖️ Settlement announcement sent to Telegram");
        },
        Ok(response) => {
            warn!("🤖️ Telegram rejected the announcement. HTTP {}", response.status());
        },
        Err(e) => {
            warn!("🤖️ Could not reach Telegram. {e}");
        },
    }
}

#[cfg(test)]
mod test {
    use chrono::Utc;
    use trc20_settlement_engine::db_types::{CallbackConfirm, Order, OrderStatus};
    use tsg_common::UsdtAmount;

    use super::*;

    #[test]
    fn unconfigured_bot_is_disabled() {
        assert!(!TelegramConfig::default().is_enabled());
        let half = TelegramConfig { bot_token: Secret::new("123:abc".into()), chat_id: String::new() };
        assert!(!half.is_enabled());
    }

    #[test]
    fn unconfigured_bot_registers_no_hook() {
        let mut hooks = EventHooks::default();
        register_telegram_hook(&mut hooks, TelegramConfig::default());
        assert!(hooks.on_order_settled.is_none());
    }

    #[test]
    fn settlement_message_names_the_order_and_transaction() {
        let now = Utc::now();
        let order = Order {
            id: 1,
            trade_id: "T-1".parse().unwrap(),
            order_id: "M-1001".to_string().into(),
            token: "TWallet1111111111111111111111111111".to_string(),
            requested_amount: UsdtAmount::from_usdt(10),
            actual_amount: Some(UsdtAmount::from_usdt(10)),
            status: OrderStatus::Paid,
            notify_url: String::new(),
            block_transaction_id: Some("abc123".to_string()),
            callback_confirm: CallbackConfirm::Unconfirmed,
            created_at: now,
            updated_at: now,
        };
        let event = OrderSettledEvent::new(order, "abc123".to_string());
        let message = format_settlement_message(&event);
        assert!(message.contains("#M-1001"));
        assert!(message.contains("10.0000 USDT"));
        assert!(message.contains("abc123"));
    }
}
