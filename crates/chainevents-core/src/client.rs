//! The `ChainClient` trait: the capability event queries and subscriptions
//! run against.
//!
//! The client owns the node connection. The engine never closes it and
//! never assumes exclusive access, so a single client may back any number
//! of finders and subscribers at once.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::TransportError;
use crate::event::RawLog;
use crate::filter::WireFilter;

/// An open streaming log subscription as returned by
/// [`ChainClient::subscribe_filter_logs`].
///
/// The transport pushes records on `logs` and transport-level failures on
/// `errors`. Closing `logs` means the transport has ended the subscription.
/// Releasing the subscription (explicitly or by drop) runs the transport's
/// unsubscribe hook exactly once.
pub struct LogSubscription {
    pub logs: mpsc::Receiver<RawLog>,
    pub errors: mpsc::Receiver<TransportError>,
    on_unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl LogSubscription {
    pub fn new(logs: mpsc::Receiver<RawLog>, errors: mpsc::Receiver<TransportError>) -> Self {
        Self {
            logs,
            errors,
            on_unsubscribe: None,
        }
    }

    /// Register the hook that releases the subscription on the transport side.
    pub fn with_unsubscribe(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_unsubscribe = Some(Box::new(hook));
        self
    }

    /// Release the transport subscription. Idempotent.
    pub fn unsubscribe(&mut self) {
        if let Some(hook) = self.on_unsubscribe.take() {
            hook();
        }
    }
}

impl Drop for LogSubscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for LogSubscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogSubscription")
            .field("released", &self.on_unsubscribe.is_none())
            .finish_non_exhaustive()
    }
}

/// A connection to an Ethereum-compatible node that can answer log queries.
///
/// # Thread Safety
/// Implementations must be `Send + Sync`; the trait is object-safe and is
/// shared as `Arc<dyn ChainClient>`.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Run a bounded log query. Records come back in node order
    /// (block, then log index, ascending).
    async fn filter_logs(&self, filter: &WireFilter) -> Result<Vec<RawLog>, TransportError>;

    /// Open a streaming subscription for logs matching `filter`.
    /// Returns as soon as the subscription is established.
    async fn subscribe_filter_logs(
        &self,
        filter: &WireFilter,
    ) -> Result<LogSubscription, TransportError>;

    /// Identifier of the underlying endpoint, for logging.
    fn endpoint(&self) -> &str;
}
