//! `EventFactory`: one place that owns the history and live clients.

use std::sync::Arc;

use chainevents_core::client::ChainClient;
use chainevents_evm::EventRequest;
use chainevents_rpc::{HttpClientConfig, HttpLogClient, WsClientConfig, WsLogClient};
use tracing::info;

use crate::config::{ChainConfig, StreamConfig};
use crate::error::SetupError;
use crate::finder::HistoryFinder;
use crate::subscriber::EventSubscriber;

/// Builds finders and subscribers over shared clients. The clients are
/// never closed by anything the factory creates.
#[derive(Clone)]
pub struct EventFactory {
    history: Arc<dyn ChainClient>,
    live: Arc<dyn ChainClient>,
    config: StreamConfig,
}

impl EventFactory {
    pub fn new(
        history: Arc<dyn ChainClient>,
        live: Arc<dyn ChainClient>,
        config: StreamConfig,
    ) -> Result<Self, SetupError> {
        config.validate()?;
        Ok(Self {
            history,
            live,
            config,
        })
    }

    /// Dial the configured node: HTTP for history, WebSocket (when
    /// configured) for live feeds. Without a WebSocket URL the HTTP client
    /// serves both, so live subscriptions fail as unsupported.
    pub async fn connect(chain: &ChainConfig, config: StreamConfig) -> Result<Self, SetupError> {
        chain.validate()?;
        config.validate()?;

        let http: Arc<dyn ChainClient> = Arc::new(HttpLogClient::new(
            chain.endpoint.clone(),
            HttpClientConfig {
                request_timeout: chain.request_timeout(),
            },
        )?);

        let live: Arc<dyn ChainClient> = match &chain.websocket {
            Some(url) => {
                let ws = WsLogClient::connect(
                    url.clone(),
                    WsClientConfig {
                        reconnect_initial: chain.reconnect_initial(),
                        reconnect_max: chain.reconnect_max(),
                        request_timeout: chain.request_timeout(),
                        channel_capacity: config.channel_capacity,
                    },
                )
                .await?;
                Arc::new(ws)
            }
            None => Arc::clone(&http),
        };

        info!(
            endpoint = %chain.endpoint,
            websocket = chain.websocket.as_deref().unwrap_or("-"),
            "event factory connected"
        );
        Self::new(http, live, config)
    }

    pub fn history_finder(&self, request: EventRequest) -> HistoryFinder {
        HistoryFinder::new(Arc::clone(&self.history), request)
    }

    pub fn subscriber(&self, request: EventRequest) -> EventSubscriber {
        EventSubscriber::new(Arc::clone(&self.live), request, self.config.channel_capacity)
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }
}
