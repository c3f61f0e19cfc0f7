//! Stream configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;

/// Connection settings for one Ethereum-compatible node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// HTTP(S) JSON-RPC endpoint used for historical queries,
    /// e.g. "https://mainnet.infura.io/v3/..."
    pub endpoint: String,
    /// WebSocket endpoint used for live subscriptions. Without one, live
    /// subscriptions fail with `TransportError::Unsupported`.
    #[serde(default)]
    pub websocket: Option<String>,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Initial WebSocket reconnect backoff in milliseconds
    #[serde(default = "default_reconnect_initial_ms")]
    pub reconnect_initial_ms: u64,
    #[serde(default = "default_reconnect_max_ms")]
    pub reconnect_max_ms: u64,
}

fn default_request_timeout_ms() -> u64 { 30_000 }
fn default_reconnect_initial_ms() -> u64 { 500 }
fn default_reconnect_max_ms() -> u64 { 60_000 }

impl ChainConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            websocket: None,
            request_timeout_ms: default_request_timeout_ms(),
            reconnect_initial_ms: default_reconnect_initial_ms(),
            reconnect_max_ms: default_reconnect_max_ms(),
        }
    }

    pub fn with_websocket(mut self, url: impl Into<String>) -> Self {
        self.websocket = Some(url.into());
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn reconnect_initial(&self) -> Duration {
        Duration::from_millis(self.reconnect_initial_ms)
    }

    pub fn reconnect_max(&self) -> Duration {
        Duration::from_millis(self.reconnect_max_ms)
    }

    /// Check both URLs and the timing values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_url("endpoint", &self.endpoint, &["http", "https"])?;
        if let Some(ws) = &self.websocket {
            check_url("websocket", ws, &["ws", "wss"])?;
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Zero { field: "request_timeout_ms" });
        }
        if self.reconnect_initial_ms == 0 {
            return Err(ConfigError::Zero { field: "reconnect_initial_ms" });
        }
        Ok(())
    }
}

fn check_url(
    field: &'static str,
    raw: &str,
    expected: &'static [&'static str],
) -> Result<(), ConfigError> {
    let parsed = url::Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        field,
        reason: e.to_string(),
    })?;
    if !expected.contains(&parsed.scheme()) {
        return Err(ConfigError::UnsupportedScheme {
            field,
            scheme: parsed.scheme().to_string(),
            expected,
        });
    }
    Ok(())
}

/// Settings shared by every subscriber a factory creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Capacity of each subscriber's event and error channels. A full
    /// channel pauses the decode loop until the caller reads.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize { 1_024 }

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl StreamConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.channel_capacity == 0 {
            return Err(ConfigError::Zero { field: "channel_capacity" });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_from_minimal_yaml() {
        let cfg: ChainConfig = serde_yaml::from_str("endpoint: https://rpc.example.org\n").unwrap();
        assert_eq!(cfg.websocket, None);
        assert_eq!(cfg.request_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.reconnect_initial_ms, 500);
        cfg.validate().unwrap();

        let stream: StreamConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(stream.channel_capacity, 1_024);
    }

    #[test]
    fn rejects_wrong_schemes() {
        let err = ChainConfig::new("ws://node:8546").validate().unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedScheme { field: "endpoint", .. }));

        let err = ChainConfig::new("http://node:8545")
            .with_websocket("http://node:8546")
            .validate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedScheme { field: "websocket", .. }));
    }

    #[test]
    fn rejects_garbage_url() {
        let err = ChainConfig::new("not a url").validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }

    #[test]
    fn zero_capacity_is_invalid() {
        let cfg = StreamConfig { channel_capacity: 0 };
        assert!(cfg.validate().is_err());
        assert!(StreamConfig::default().validate().is_ok());
    }
}
