//! Routing of `eth_subscription` pushes to their subscribers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use chainevents_core::error::TransportError;
use chainevents_core::event::RawLog;
use tokio::sync::mpsc;

/// A subscription ID returned by `eth_subscribe`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub String);

impl From<String> for SubscriptionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sending halves of one subscription's channels.
#[derive(Clone)]
pub struct SubscriptionSink {
    pub logs: mpsc::Sender<RawLog>,
    pub errors: mpsc::Sender<TransportError>,
}

/// Active subscriptions keyed by node-assigned ID.
#[derive(Clone, Default)]
pub struct SubscriptionManager {
    entries: Arc<Mutex<HashMap<SubscriptionId, SubscriptionSink>>>,
}

impl SubscriptionManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, id: SubscriptionId, sink: SubscriptionSink) {
        self.lock().insert(id, sink);
    }

    pub fn remove(&self, id: &SubscriptionId) -> bool {
        self.lock().remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Forward a log to its subscription without waiting. A subscriber
    /// that went away is forgotten; one whose buffer is full gets
    /// `TransportError::Lagged` and is dropped, closing its log channel.
    /// Returns the ID the node should be told to release.
    pub fn dispatch(&self, id: &SubscriptionId, log: RawLog) -> Option<SubscriptionId> {
        let Some(sender) = self.lock().get(id).map(|s| s.logs.clone()) else {
            tracing::debug!(subscription = %id, "push for unknown subscription");
            return None;
        };
        match sender.try_send(log) {
            Ok(()) => None,
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(subscription = %id, "subscriber buffer full, closing subscription");
                let sink = self.lock().remove(id)?;
                let _ = sink.errors.try_send(TransportError::Lagged(id.0.clone()));
                Some(id.clone())
            }
            Err(mpsc::error::TrySendError::Closed(_)) => self.remove(id).then(|| id.clone()),
        }
    }

    /// Report a per-subscription error without blocking.
    pub fn report(&self, id: &SubscriptionId, error: TransportError) {
        if let Some(sink) = self.lock().get(id) {
            let _ = sink.errors.try_send(error);
        }
    }

    /// Fail every subscription with `reason` and drop them all, closing
    /// their log channels.
    pub fn close_all(&self, reason: &str) {
        let drained: Vec<_> = self.lock().drain().collect();
        for (id, sink) in drained {
            tracing::debug!(subscription = %id, "closing subscription");
            let _ = sink
                .errors
                .try_send(TransportError::WebSocket(reason.to_string()));
        }
    }

    /// Drop every subscription without reporting an error.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SubscriptionId, SubscriptionSink>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
