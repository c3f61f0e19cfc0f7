//! WebSocket JSON-RPC log client with reconnect and `eth_subscribe` support.
//!
//! A background task owns the socket. Callers talk to it over a command
//! channel; node pushes are routed through the `SubscriptionManager`.
//!
//! When the socket drops, every in-flight request fails and every live
//! subscription receives a `TransportError::WebSocket` and is then closed.
//! The task reconnects with exponential backoff so later calls succeed,
//! but closed subscriptions are not resumed.
//!
//! The socket reader never waits on a subscriber. A subscription whose
//! buffer is full receives `TransportError::Lagged` and is released, so
//! the other subscriptions and calls sharing the connection keep going.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio::time;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use chainevents_core::client::{ChainClient, LogSubscription};
use chainevents_core::error::TransportError;
use chainevents_core::event::RawLog;
use chainevents_core::filter::WireFilter;

use crate::log::{parse_logs, RpcLog};
use crate::request::{JsonRpcRequest, JsonRpcResponse, RpcId, SubscriptionNotification};
use crate::subscriptions::{SubscriptionId, SubscriptionManager, SubscriptionSink};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Configuration for the WebSocket client.
#[derive(Debug, Clone)]
pub struct WsClientConfig {
    /// Reconnect backoff starting duration.
    pub reconnect_initial: Duration,
    /// Maximum reconnect backoff.
    pub reconnect_max: Duration,
    /// How long a request waits for its response.
    pub request_timeout: Duration,
    /// Buffered logs per subscription. Overflowing it closes that
    /// subscription with `TransportError::Lagged`.
    pub channel_capacity: usize,
}

impl Default for WsClientConfig {
    fn default() -> Self {
        Self {
            reconnect_initial: Duration::from_millis(500),
            reconnect_max: Duration::from_secs(60),
            request_timeout: Duration::from_secs(30),
            channel_capacity: 1_024,
        }
    }
}

type CallReply = oneshot::Sender<Result<Value, TransportError>>;
type SubscribeReply = oneshot::Sender<Result<SubscriptionId, TransportError>>;

/// Command sent from callers to the background WS task.
enum WsCommand {
    Call {
        method: String,
        params: Vec<Value>,
        tx: CallReply,
    },
    Subscribe {
        filter: Value,
        sink: SubscriptionSink,
        tx: SubscribeReply,
    },
    Unsubscribe(SubscriptionId),
    Close,
}

impl WsCommand {
    /// Answer a command that cannot be served right now.
    fn reject(self, error: impl Fn() -> TransportError) {
        match self {
            WsCommand::Call { tx, .. } => {
                let _ = tx.send(Err(error()));
            }
            WsCommand::Subscribe { tx, .. } => {
                let _ = tx.send(Err(error()));
            }
            WsCommand::Unsubscribe(_) | WsCommand::Close => {}
        }
    }
}

/// A request awaiting its response on the current connection.
enum Pending {
    Call(CallReply),
    Subscribe {
        tx: SubscribeReply,
        sink: SubscriptionSink,
    },
}

impl Pending {
    fn fail(self, error: TransportError) {
        match self {
            Pending::Call(tx) => {
                let _ = tx.send(Err(error));
            }
            Pending::Subscribe { tx, .. } => {
                let _ = tx.send(Err(error));
            }
        }
    }
}

/// WebSocket log client.
pub struct WsLogClient {
    url: String,
    cmd_tx: mpsc::UnboundedSender<WsCommand>,
    subscriptions: SubscriptionManager,
    config: WsClientConfig,
}

impl WsLogClient {
    /// Connect to `url` and start the background task. Fails if the first
    /// connection attempt fails.
    pub async fn connect(
        url: impl Into<String>,
        config: WsClientConfig,
    ) -> Result<Self, TransportError> {
        let url = url.into();
        let (ws, _) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| TransportError::WebSocket(e.to_string()))?;
        tracing::info!(url = %url, "WebSocket connected");

        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<WsCommand>();
        let subscriptions = SubscriptionManager::new();

        tokio::spawn(ws_task(
            url.clone(),
            ws,
            cmd_rx,
            subscriptions.clone(),
            config.clone(),
        ));

        Ok(Self {
            url,
            cmd_tx,
            subscriptions,
            config,
        })
    }

    /// Send one JSON-RPC call and return its `result`.
    pub async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, TransportError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(WsCommand::Call {
                method: method.to_string(),
                params,
                tx,
            })
            .map_err(|_| TransportError::Closed)?;
        self.await_reply(rx).await
    }

    /// Number of live subscriptions on this client.
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    async fn await_reply<T>(
        &self,
        rx: oneshot::Receiver<Result<T, TransportError>>,
    ) -> Result<T, TransportError> {
        match time::timeout(self.config.request_timeout, rx).await {
            Ok(Ok(reply)) => reply,
            Ok(Err(_)) => Err(TransportError::Closed),
            Err(_) => Err(TransportError::Other(format!(
                "request timed out after {:?}",
                self.config.request_timeout
            ))),
        }
    }
}

impl Drop for WsLogClient {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(WsCommand::Close);
    }
}

#[async_trait]
impl ChainClient for WsLogClient {
    async fn filter_logs(&self, filter: &WireFilter) -> Result<Vec<RawLog>, TransportError> {
        let result = self.call("eth_getLogs", vec![filter.to_json()]).await?;
        Ok(parse_logs(result)?)
    }

    async fn subscribe_filter_logs(
        &self,
        filter: &WireFilter,
    ) -> Result<LogSubscription, TransportError> {
        let (log_tx, log_rx) = mpsc::channel(self.config.channel_capacity.max(1));
        let (err_tx, err_rx) = mpsc::channel(16);
        let (tx, rx) = oneshot::channel();

        self.cmd_tx
            .send(WsCommand::Subscribe {
                filter: filter.to_json(),
                sink: SubscriptionSink {
                    logs: log_tx,
                    errors: err_tx,
                },
                tx,
            })
            .map_err(|_| TransportError::Closed)?;
        let id = self.await_reply(rx).await?;
        tracing::debug!(url = %self.url, subscription = %id, "log subscription established");

        let cmd_tx = self.cmd_tx.clone();
        Ok(LogSubscription::new(log_rx, err_rx).with_unsubscribe(move || {
            let _ = cmd_tx.send(WsCommand::Unsubscribe(id));
        }))
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}

/// Why a connection's dispatch loop ended.
enum Exit {
    /// The client was dropped or closed.
    Closed,
    /// The socket failed; reconnect.
    Disconnected(String),
}

/// Background task that owns the WebSocket connection.
async fn ws_task(
    url: String,
    first: WsStream,
    mut cmd_rx: mpsc::UnboundedReceiver<WsCommand>,
    subscriptions: SubscriptionManager,
    config: WsClientConfig,
) {
    let mut conn = Some(first);
    let mut backoff = config.reconnect_initial;

    loop {
        let ws = match conn.take() {
            Some(ws) => ws,
            None => match reconnect(&url, &mut cmd_rx, &mut backoff, &config).await {
                Some(ws) => ws,
                None => break,
            },
        };
        backoff = config.reconnect_initial;

        match run_connection(ws, &mut cmd_rx, &subscriptions).await {
            Exit::Closed => break,
            Exit::Disconnected(reason) => {
                tracing::warn!(
                    url = %url,
                    reason = %reason,
                    "WS disconnected, reconnecting in {backoff:?}"
                );
                subscriptions.close_all(&format!("connection lost: {reason}"));
            }
        }
    }

    subscriptions.clear();
    tracing::debug!(url = %url, "WS task stopped");
}

/// Wait out the backoff and reconnect, rejecting commands meanwhile.
/// Returns `None` if the client closed while waiting.
async fn reconnect(
    url: &str,
    cmd_rx: &mut mpsc::UnboundedReceiver<WsCommand>,
    backoff: &mut Duration,
    config: &WsClientConfig,
) -> Option<WsStream> {
    loop {
        let delay = time::sleep(*backoff);
        tokio::pin!(delay);
        loop {
            tokio::select! {
                _ = &mut delay => break,
                cmd = cmd_rx.recv() => match cmd {
                    None | Some(WsCommand::Close) => return None,
                    Some(cmd) => cmd.reject(|| TransportError::WebSocket("reconnecting".into())),
                },
            }
        }
        *backoff = (*backoff * 2).min(config.reconnect_max);

        match tokio_tungstenite::connect_async(url).await {
            Ok((ws, _)) => {
                tracing::info!(url = %url, "WebSocket reconnected");
                return Some(ws);
            }
            Err(e) => {
                tracing::warn!(error = %e, "WS connect failed, retrying in {backoff:?}");
            }
        }
    }
}

async fn run_connection(
    ws: WsStream,
    cmd_rx: &mut mpsc::UnboundedReceiver<WsCommand>,
    subscriptions: &SubscriptionManager,
) -> Exit {
    let (mut sink, mut stream) = ws.split();
    let mut pending: HashMap<u64, Pending> = HashMap::new();
    let mut next_id = 1u64;

    let exit = loop {
        tokio::select! {
            // Incoming commands from callers
            cmd = cmd_rx.recv() => {
                let id = next_id;
                next_id += 1;
                let (req, entry) = match cmd {
                    None | Some(WsCommand::Close) => break Exit::Closed,
                    Some(WsCommand::Call { method, params, tx }) => {
                        (JsonRpcRequest::new(id, method, params), Some(Pending::Call(tx)))
                    }
                    Some(WsCommand::Subscribe { filter, sink: subscriber, tx }) => (
                        JsonRpcRequest::new(id, "eth_subscribe", vec![json!("logs"), filter]),
                        Some(Pending::Subscribe { tx, sink: subscriber }),
                    ),
                    Some(WsCommand::Unsubscribe(sub)) => {
                        if !subscriptions.remove(&sub) {
                            continue;
                        }
                        (unsubscribe_request(id, &sub), None)
                    }
                };
                if let Some(entry) = entry {
                    pending.insert(id, entry);
                }
                if let Err(e) = send_request(&mut sink, &req).await {
                    break Exit::Disconnected(e);
                }
            }
            // Incoming messages from node
            msg = stream.next() => {
                match msg {
                    None => break Exit::Disconnected("stream ended".into()),
                    Some(Err(e)) => break Exit::Disconnected(e.to_string()),
                    Some(Ok(Message::Text(text))) => {
                        let orphan = handle_message(text.as_str(), &mut pending, subscriptions);
                        if let Some(orphan) = orphan {
                            let req = unsubscribe_request(next_id, &orphan);
                            next_id += 1;
                            if let Err(e) = send_request(&mut sink, &req).await {
                                break Exit::Disconnected(e);
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        break Exit::Disconnected("closed by peer".into())
                    }
                    _ => {}
                }
            }
        }
    };

    for (_, entry) in pending.drain() {
        entry.fail(match &exit {
            Exit::Closed => TransportError::Closed,
            Exit::Disconnected(reason) => TransportError::WebSocket(reason.clone()),
        });
    }
    if matches!(exit, Exit::Closed) {
        let _ = sink.close().await;
    }
    exit
}

fn unsubscribe_request(id: u64, sub: &SubscriptionId) -> JsonRpcRequest {
    JsonRpcRequest::new(id, "eth_unsubscribe", vec![json!(sub.0)])
}

async fn send_request<S>(sink: &mut S, req: &JsonRpcRequest) -> Result<(), String>
where
    S: futures::Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    let text = serde_json::to_string(req).map_err(|e| e.to_string())?;
    sink.send(Message::Text(text.into()))
        .await
        .map_err(|e| e.to_string())
}

/// Handle one text frame without waiting on any subscriber. Returns the
/// ID of a subscription the node should release: one established after
/// its requester went away, or one dropped for falling behind.
fn handle_message(
    text: &str,
    pending: &mut HashMap<u64, Pending>,
    subscriptions: &SubscriptionManager,
) -> Option<SubscriptionId> {
    let Ok(val) = serde_json::from_str::<Value>(text) else {
        tracing::debug!("failed to parse WS message as JSON");
        return None;
    };

    // Subscription push
    if val.get("method").and_then(Value::as_str) == Some("eth_subscription") {
        let notification = match serde_json::from_value::<SubscriptionNotification>(val) {
            Ok(n) => n,
            Err(e) => {
                tracing::debug!(error = %e, "malformed eth_subscription message");
                return None;
            }
        };
        let id = SubscriptionId(notification.params.subscription);
        return match serde_json::from_value::<RpcLog>(notification.params.result) {
            Ok(log) if log.removed => {
                tracing::debug!(subscription = %id, "skipping removed log");
                None
            }
            Ok(log) => subscriptions.dispatch(&id, log.into()),
            Err(e) => {
                subscriptions.report(&id, TransportError::Deserialization(e));
                None
            }
        };
    }

    // Regular JSON-RPC response
    let Ok(resp) = serde_json::from_value::<JsonRpcResponse>(val) else {
        return None;
    };
    let RpcId::Number(id) = resp.id else {
        return None;
    };
    // unsubscribe acknowledgements have no pending entry
    match pending.remove(&id)? {
        Pending::Call(tx) => {
            let _ = tx.send(resp.into_result());
            None
        }
        Pending::Subscribe { tx, sink } => {
            let outcome = resp.into_result().and_then(|v| match v {
                Value::String(s) => Ok(SubscriptionId(s)),
                other => Err(TransportError::Other(format!(
                    "unexpected eth_subscribe result: {other}"
                ))),
            });
            if let Ok(sub) = &outcome {
                subscriptions.register(sub.clone(), sink);
            }
            match tx.send(outcome) {
                Err(Ok(sub)) => {
                    subscriptions.remove(&sub);
                    Some(sub)
                }
                _ => None,
            }
        }
    }
}
