//! `WsLogClient` against an in-process WebSocket node.

use std::time::Duration;

use chainevents_core::client::ChainClient;
use chainevents_core::error::TransportError;
use chainevents_core::filter::WireFilter;
use chainevents_rpc::{WsClientConfig, WsLogClient};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

fn log_json(index: u64) -> Value {
    json!({
        "address": "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48",
        "topics": ["0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"],
        "data": "0x",
        "blockNumber": "0x1",
        "transactionHash": "0x1111111111111111111111111111111111111111111111111111111111111111",
        "logIndex": format!("0x{index:x}"),
        "removed": false
    })
}

/// Node that accepts one connection, answers `eth_subscribe` with `0xs1`,
/// pushes `pushes` logs, then forwards every later request it sees. When
/// `hang_up` is set it closes the socket right after pushing.
async fn spawn_node(pushes: Vec<Value>, hang_up: bool) -> (String, mpsc::UnboundedReceiver<Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let (sock, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(sock).await.unwrap();
        while let Some(Ok(msg)) = ws.next().await {
            let Message::Text(text) = msg else { continue };
            let req: Value = serde_json::from_str(text.as_str()).unwrap();
            let _ = seen_tx.send(req.clone());
            if req["method"] == "eth_subscribe" {
                let reply = json!({"jsonrpc": "2.0", "id": req["id"], "result": "0xs1"});
                ws.send(Message::Text(reply.to_string().into())).await.unwrap();
                for log in &pushes {
                    let push = json!({
                        "jsonrpc": "2.0",
                        "method": "eth_subscription",
                        "params": {"subscription": "0xs1", "result": log}
                    });
                    ws.send(Message::Text(push.to_string().into())).await.unwrap();
                }
                if hang_up {
                    let _ = ws.close(None).await;
                    return;
                }
            } else {
                let reply = json!({"jsonrpc": "2.0", "id": req["id"], "result": true});
                ws.send(Message::Text(reply.to_string().into())).await.unwrap();
            }
        }
    });

    (format!("ws://{addr}"), seen_rx)
}

fn config() -> WsClientConfig {
    WsClientConfig {
        reconnect_initial: Duration::from_secs(30),
        request_timeout: Duration::from_secs(5),
        ..WsClientConfig::default()
    }
}

#[tokio::test]
async fn subscription_delivers_logs_and_unsubscribes_on_drop() {
    let mut removed = log_json(9);
    removed["removed"] = json!(true);
    let (url, mut seen) = spawn_node(vec![log_json(1), removed, log_json(2)], false).await;

    let client = WsLogClient::connect(&url, config()).await.unwrap();
    let mut sub = client
        .subscribe_filter_logs(&WireFilter::default())
        .await
        .unwrap();

    let first = seen.recv().await.unwrap();
    assert_eq!(first["method"], "eth_subscribe");
    assert_eq!(first["params"][0], "logs");
    assert!(first["params"][1].get("fromBlock").is_none());

    assert_eq!(sub.logs.recv().await.unwrap().log_index, 1);
    assert_eq!(sub.logs.recv().await.unwrap().log_index, 2);
    assert_eq!(client.subscription_count(), 1);

    drop(sub);
    let unsub = tokio::time::timeout(Duration::from_secs(5), seen.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(unsub["method"], "eth_unsubscribe");
    assert_eq!(unsub["params"][0], "0xs1");
    assert_eq!(client.subscription_count(), 0);
}

#[tokio::test]
async fn disconnect_fails_and_closes_subscription() {
    let (url, _seen) = spawn_node(vec![log_json(1)], true).await;

    let client = WsLogClient::connect(&url, config()).await.unwrap();
    let mut sub = client
        .subscribe_filter_logs(&WireFilter::default())
        .await
        .unwrap();

    assert_eq!(sub.logs.recv().await.unwrap().log_index, 1);
    assert!(matches!(
        sub.errors.recv().await,
        Some(TransportError::WebSocket(_))
    ));
    assert!(sub.logs.recv().await.is_none());

    // reconnect is pending behind the backoff, so calls are refused
    let err = client.call("eth_blockNumber", vec![]).await.unwrap_err();
    assert!(matches!(err, TransportError::WebSocket(_)));
}

#[tokio::test]
async fn connect_failure_is_reported() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let err = WsLogClient::connect(format!("ws://{addr}"), config())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, TransportError::WebSocket(_)));
}

/// Node that numbers subscriptions `0xs1`, `0xs2`, ... and, once the
/// second one exists, pushes three logs to `0xs1` and one to `0xs2`.
async fn spawn_shared_node() -> (String, mpsc::UnboundedReceiver<Value>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (seen_tx, seen_rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        let (sock, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(sock).await.unwrap();
        let mut subscribed = 0u64;
        while let Some(Ok(msg)) = ws.next().await {
            let Message::Text(text) = msg else { continue };
            let req: Value = serde_json::from_str(text.as_str()).unwrap();
            let _ = seen_tx.send(req.clone());
            let result = match req["method"].as_str() {
                Some("eth_subscribe") => {
                    subscribed += 1;
                    json!(format!("0xs{subscribed}"))
                }
                Some("eth_getLogs") => json!([]),
                _ => json!(true),
            };
            let reply = json!({"jsonrpc": "2.0", "id": req["id"], "result": result});
            ws.send(Message::Text(reply.to_string().into())).await.unwrap();

            if req["method"] == "eth_subscribe" && subscribed == 2 {
                for (sub, index) in [("0xs1", 1), ("0xs1", 2), ("0xs1", 3), ("0xs2", 4)] {
                    let push = json!({
                        "jsonrpc": "2.0",
                        "method": "eth_subscription",
                        "params": {"subscription": sub, "result": log_json(index)}
                    });
                    ws.send(Message::Text(push.to_string().into())).await.unwrap();
                }
            }
        }
    });

    (format!("ws://{addr}"), seen_rx)
}

#[tokio::test]
async fn stalled_subscription_does_not_block_the_connection() {
    let (url, mut seen) = spawn_shared_node().await;
    let client = WsLogClient::connect(
        &url,
        WsClientConfig {
            channel_capacity: 1,
            ..config()
        },
    )
    .await
    .unwrap();

    let mut stalled = client
        .subscribe_filter_logs(&WireFilter::default())
        .await
        .unwrap();
    let mut healthy = client
        .subscribe_filter_logs(&WireFilter::default())
        .await
        .unwrap();

    let log = tokio::time::timeout(Duration::from_secs(5), healthy.logs.recv())
        .await
        .expect("healthy subscription starved")
        .unwrap();
    assert_eq!(log.log_index, 4);

    let logs = tokio::time::timeout(
        Duration::from_secs(5),
        client.filter_logs(&WireFilter::default()),
    )
    .await
    .expect("call starved")
    .unwrap();
    assert!(logs.is_empty());

    // the stalled subscription keeps what it buffered, then learns it lagged
    assert!(matches!(
        stalled.errors.recv().await,
        Some(TransportError::Lagged(id)) if id == "0xs1"
    ));
    assert_eq!(stalled.logs.recv().await.unwrap().log_index, 1);
    assert!(stalled.logs.recv().await.is_none());
    assert_eq!(client.subscription_count(), 1);

    let mut released = false;
    while let Ok(Some(req)) = tokio::time::timeout(Duration::from_millis(500), seen.recv()).await {
        if req["method"] == "eth_unsubscribe" && req["params"][0] == "0xs1" {
            released = true;
            break;
        }
    }
    assert!(released);
}
