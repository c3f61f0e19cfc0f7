//! HTTP JSON-RPC log client backed by `reqwest`.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chainevents_core::client::{ChainClient, LogSubscription};
use chainevents_core::error::TransportError;
use chainevents_core::event::RawLog;
use chainevents_core::filter::WireFilter;

use crate::log::parse_logs;
use crate::request::{JsonRpcRequest, JsonRpcResponse};

/// Configuration for `HttpLogClient`.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub request_timeout: Duration,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// Bounded log queries over HTTP.
///
/// HTTP cannot push, so `subscribe_filter_logs` always fails with
/// `TransportError::Unsupported`.
pub struct HttpLogClient {
    url: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl HttpLogClient {
    /// Create a client for the given JSON-RPC endpoint URL.
    pub fn new(url: impl Into<String>, config: HttpClientConfig) -> Result<Self, TransportError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TransportError::Http(e.to_string()))?;

        Ok(Self {
            url: url.into(),
            http,
            next_id: AtomicU64::new(1),
        })
    }

    /// Send one JSON-RPC call and return its `result`.
    pub async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, TransportError> {
        let req = JsonRpcRequest::new(self.next_id.fetch_add(1, Ordering::Relaxed), method, params);

        let resp = self
            .http
            .post(&self.url)
            .json(&req)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Http(format!("HTTP {status}: {body}")));
        }

        resp.json::<JsonRpcResponse>()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?
            .into_result()
    }
}

#[async_trait]
impl ChainClient for HttpLogClient {
    async fn filter_logs(&self, filter: &WireFilter) -> Result<Vec<RawLog>, TransportError> {
        let result = self.call("eth_getLogs", vec![filter.to_json()]).await?;
        let logs = parse_logs(result)?;
        tracing::debug!(url = %self.url, count = logs.len(), "eth_getLogs");
        Ok(logs)
    }

    async fn subscribe_filter_logs(
        &self,
        _filter: &WireFilter,
    ) -> Result<LogSubscription, TransportError> {
        Err(TransportError::Unsupported(
            "log subscriptions need a WebSocket endpoint".into(),
        ))
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}
