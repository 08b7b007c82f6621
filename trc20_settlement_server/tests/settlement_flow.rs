//! End-to-end settlement flow against an in-memory database and local one-shot HTTP stubs standing in for the
//! transfer-history API and the merchant endpoint.

use chrono::Utc;
use serde_json::json;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};
use tronscan_tools::{TronscanApi, TronscanConfig};
use trc20_settlement_engine::{
    db_types::{NewOrder, OrderId, OrderStatus, TradeId},
    events::EventProducers,
    OrderStore,
    SettlementApi,
    SqliteDatabase,
};
use trc20_settlement_server::{callback::CallbackDispatcher, notify_queue::MemoryQueue, pipeline::poll_wallet};
use tsg_common::{Secret, UsdtAmount};

const WALLET: &str = "TWallet1111111111111111111111111111";

/// Serves one HTTP request with a canned response, then closes.
async fn one_shot_http(body: String, content_type: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        // Read until the request headers are complete; these stubs don't care about the request itself
        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = stream.read(&mut buf).await.unwrap();
            request.extend_from_slice(&buf[..n]);
            if n == 0 || request.windows(4).any(|w| w == b"\r\n\r\n") {
                break;
            }
        }
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        stream.write_all(response.as_bytes()).await.unwrap();
    });
    format!("http://{addr}/")
}

fn transfer_page(amount: &str, block_timestamp_ms: i64, tx_hash: &str) -> String {
    json!({
        "page_size": 1,
        "code": 200,
        "data": [{
            "amount": amount,
            "block_timestamp": block_timestamp_ms,
            "from": "TSender1111111111111111111111111111",
            "to": WALLET,
            "hash": tx_hash,
            "confirmed": 1,
            "contract_ret": "SUCCESS"
        }]
    })
    .to_string()
}

async fn seeded_db(notify_url: &str) -> SqliteDatabase {
    let db = SqliteDatabase::new("sqlite::memory:").await.unwrap();
    db.insert_wallet(WALLET).await.unwrap();
    let order = NewOrder::new(TradeId("T-1".into()), OrderId("M-1001".into()), WALLET, UsdtAmount::from_usdt(10))
        .with_notify_url(notify_url);
    db.insert_order(order).await.unwrap();
    db
}

#[tokio::test]
async fn a_matching_transfer_settles_and_notifies_the_merchant() {
    // The transfer lands on chain after the order was created
    let block_ts = Utc::now().timestamp_millis() + 60_000;
    let ledger_url = one_shot_http(transfer_page("10000000", block_ts, "tx-e2e"), "application/json").await;
    let merchant_url = one_shot_http("ok".to_string(), "text/plain").await;

    let db = seeded_db(&merchant_url).await;
    let (queue, mut receiver) = MemoryQueue::new();
    let settlement = SettlementApi::new(db.clone(), queue, EventProducers::default());
    let ledger = TronscanApi::new(TronscanConfig::new(&ledger_url, "TContract111111111111111111111111111")).unwrap();

    let settled = poll_wallet(&ledger, &settlement, WALLET, 24).await.unwrap();
    assert_eq!(settled.len(), 1);
    assert_eq!(settled[0].status, OrderStatus::Paid);
    assert_eq!(settled[0].actual_amount, Some(UsdtAmount::from_usdt(10)));
    assert_eq!(settled[0].block_transaction_id.as_deref(), Some("tx-e2e"));

    // Exactly one notification was queued for the settlement
    let delivery = receiver.recv().await.unwrap();
    assert_eq!(delivery.attempt, 1);
    assert_eq!(delivery.task.trade_id, TradeId("T-1".into()));

    let dispatcher = CallbackDispatcher::new(db.clone(), Secret::new("hunter2".to_string()));
    dispatcher.deliver(&delivery.task, delivery.attempt).await.unwrap();

    let order = db.order_by_trade_id(&TradeId("T-1".into())).await.unwrap().unwrap();
    assert!(order.callback_confirm.is_confirmed());
    assert_eq!(db.count_callback_records(&TradeId("T-1".into())).await.unwrap(), 1);
}

#[tokio::test]
async fn a_near_miss_amount_settles_nothing() {
    let block_ts = Utc::now().timestamp_millis() + 60_000;
    // 9.9999 USDT against an order expecting 10.0000
    let ledger_url = one_shot_http(transfer_page("9999900", block_ts, "tx-miss"), "application/json").await;

    let db = seeded_db("https://merchant.example/cb").await;
    let (queue, mut receiver) = MemoryQueue::new();
    let settlement = SettlementApi::new(db.clone(), queue, EventProducers::default());
    let ledger = TronscanApi::new(TronscanConfig::new(&ledger_url, "TContract111111111111111111111111111")).unwrap();

    let settled = poll_wallet(&ledger, &settlement, WALLET, 24).await.unwrap();
    assert!(settled.is_empty());
    assert!(receiver.try_recv().is_err());

    let order = db.order_by_trade_id(&TradeId("T-1".into())).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert!(order.actual_amount.is_none());
}
