//! `chainevents.yaml`: the CLI's configuration file.
//!
//! ```yaml
//! chain:
//!   endpoint: https://eth.example.org
//!   websocket: wss://eth.example.org/ws
//! stream:
//!   channel_capacity: 1024
//! log:
//!   level: info
//!   json: false
//! ```

use anyhow::{Context, Result};
use chainevents_observability::LogConfig;
use chainevents_stream::{ChainConfig, StreamConfig};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub chain: Option<ChainConfig>,
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl AppConfig {
    /// Load the file if given; otherwise start from defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config file '{}'", path.display()))?;
        serde_yaml::from_str(&text)
            .with_context(|| format!("parse config file '{}'", path.display()))
    }

    /// Chain settings with command-line endpoints applied on top.
    pub fn chain(&self, rpc: Option<&str>, ws: Option<&str>) -> Result<ChainConfig> {
        let mut chain = match (&self.chain, rpc) {
            (_, Some(rpc)) => {
                let mut chain = self.chain.clone().unwrap_or_else(|| ChainConfig::new(rpc));
                chain.endpoint = rpc.to_string();
                chain
            }
            (Some(chain), None) => chain.clone(),
            (None, None) => anyhow::bail!(
                "no RPC endpoint: pass --rpc, set CHAINEVENTS_RPC_URL or add `chain.endpoint` to the config file"
            ),
        };
        if let Some(ws) = ws {
            chain.websocket = Some(ws.to_string());
        }
        chain.validate().context("invalid chain configuration")?;
        Ok(chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_file() {
        let cfg: AppConfig = serde_yaml::from_str(
            "chain:\n  endpoint: https://a.example\n  websocket: wss://a.example/ws\nstream:\n  channel_capacity: 8\n",
        )
        .unwrap();
        assert_eq!(cfg.stream.channel_capacity, 8);
        assert_eq!(cfg.log.level, "info");

        let chain = cfg.chain(Some("https://b.example"), None).unwrap();
        assert_eq!(chain.endpoint, "https://b.example");
        assert_eq!(chain.websocket.as_deref(), Some("wss://a.example/ws"));
    }

    #[test]
    fn missing_endpoint_is_an_error() {
        assert!(AppConfig::default().chain(None, None).is_err());
        let chain = AppConfig::default()
            .chain(Some("http://localhost:8545"), Some("ws://localhost:8546"))
            .unwrap();
        assert_eq!(chain.websocket.as_deref(), Some("ws://localhost:8546"));
    }
}
