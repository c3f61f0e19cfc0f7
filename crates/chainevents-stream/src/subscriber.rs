//! `EventSubscriber`: a live subscription and its decode loop.
//!
//! ```text
//! Idle ──subscribe()──▶ Active ──unsubscribe() / drop──▶ Closed(Cancelled)
//!                         │
//!                         └──transport closes logs──▶ Closed(TransportClosed)
//! ```
//!
//! The decode loop is the only writer to the event and error channels and
//! waits whenever either is full, so a slow reader slows the loop (and in
//! turn the transport) instead of growing a queue. Cancellation is checked
//! between records and while waiting to deliver, never in the middle of a
//! decode.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chainevents_core::{
    client::{ChainClient, LogSubscription},
    error::EventError,
    event::DecodedEvent,
};
use chainevents_evm::{EventRequest, LogDecoder};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::metrics::SubscriberMetrics;

/// Why a subscriber stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// `unsubscribe()` was called or the subscriber was dropped.
    Cancelled,
    /// The transport closed the record stream.
    TransportClosed,
}

/// Lifecycle of an `EventSubscriber`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberState {
    Idle,
    Active,
    Closed(CloseReason),
}

#[derive(Debug)]
struct Shared {
    state: Mutex<SubscriberState>,
    metrics: Mutex<SubscriberMetrics>,
}

impl Shared {
    fn state(&self) -> MutexGuard<'_, SubscriberState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn metrics(&self) -> MutexGuard<'_, SubscriberMetrics> {
        self.metrics.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Move to `Closed(reason)` unless already closed. Returns `true` if
    /// this call made the transition.
    fn close(&self, reason: CloseReason) -> bool {
        let mut state = self.state();
        if matches!(*state, SubscriberState::Closed(_)) {
            return false;
        }
        *state = SubscriberState::Closed(reason);
        true
    }
}

/// A live event subscription.
pub struct EventSubscriber {
    client: Arc<dyn ChainClient>,
    request: EventRequest,
    decoder: LogDecoder,
    capacity: usize,
    shared: Arc<Shared>,
    cancel: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl EventSubscriber {
    /// `capacity` bounds both output channels (minimum 1).
    pub fn new(client: Arc<dyn ChainClient>, request: EventRequest, capacity: usize) -> Self {
        let decoder = LogDecoder::new(Arc::clone(&request.abi));
        Self {
            client,
            request,
            decoder,
            capacity: capacity.max(1),
            shared: Arc::new(Shared {
                state: Mutex::new(SubscriberState::Idle),
                metrics: Mutex::new(SubscriberMetrics::default()),
            }),
            cancel: None,
            task: None,
        }
    }

    pub fn request(&self) -> &EventRequest {
        &self.request
    }

    pub fn state(&self) -> SubscriberState {
        *self.shared.state()
    }

    /// Returns a snapshot of current metrics.
    pub fn metrics(&self) -> SubscriberMetrics {
        self.shared.metrics().clone()
    }

    /// Open the transport subscription and start the decode loop.
    ///
    /// Returns the event and error receivers as soon as the subscription is
    /// established. Fails with `AlreadySubscribed` unless the subscriber is
    /// `Idle`; a failed attempt leaves it `Idle`.
    pub async fn subscribe(
        &mut self,
    ) -> Result<(mpsc::Receiver<DecodedEvent>, mpsc::Receiver<EventError>), EventError> {
        if self.state() != SubscriberState::Idle {
            return Err(EventError::AlreadySubscribed);
        }

        let filter = self.request.live_filter()?;
        let subscription = self.client.subscribe_filter_logs(&filter).await?;

        let (event_tx, event_rx) = mpsc::channel(self.capacity);
        let (error_tx, error_rx) = mpsc::channel(self.capacity);
        let (cancel_tx, cancel_rx) = oneshot::channel();

        *self.shared.state() = SubscriberState::Active;
        info!(
            endpoint = self.client.endpoint(),
            addresses = filter.addresses.len(),
            slots = filter.topics.len(),
            "subscriber active"
        );

        let decode_loop = DecodeLoop {
            subscription,
            decoder: self.decoder.clone(),
            events: event_tx,
            errors: error_tx,
            cancel: cancel_rx,
            shared: Arc::clone(&self.shared),
        };
        self.cancel = Some(cancel_tx);
        self.task = Some(tokio::spawn(decode_loop.run()));

        Ok((event_rx, error_rx))
    }

    /// Stop delivering and release the transport subscription. Idempotent;
    /// on an `Idle` subscriber it closes it without ever subscribing.
    pub fn unsubscribe(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        if self.shared.close(CloseReason::Cancelled) {
            info!(endpoint = self.client.endpoint(), "subscriber cancelled");
        }
    }

    /// Wait until the decode loop has finished and released the transport
    /// subscription. Returns at once if the loop never started.
    pub async fn closed(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "decode loop task failed");
            }
        }
    }
}

impl Drop for EventSubscriber {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
    }
}

/// Outcome of handing one item to an output channel.
enum Delivery {
    Sent,
    Cancelled,
    ReceiverGone,
}

struct DecodeLoop {
    subscription: LogSubscription,
    decoder: LogDecoder,
    events: mpsc::Sender<DecodedEvent>,
    errors: mpsc::Sender<EventError>,
    cancel: oneshot::Receiver<()>,
    shared: Arc<Shared>,
}

impl DecodeLoop {
    async fn run(mut self) {
        let mut transport_errors_open = true;

        let reason = loop {
            tokio::select! {
                biased;

                _ = &mut self.cancel => break CloseReason::Cancelled,

                raw = self.subscription.logs.recv() => {
                    let Some(raw) = raw else {
                        // forward whatever the transport reported before closing
                        while let Ok(e) = self.subscription.errors.try_recv() {
                            warn!(error = %e, "transport error");
                            self.shared.metrics().transport_errors += 1;
                            if let Delivery::Cancelled = self.send_error(e.into()).await {
                                break;
                            }
                        }
                        break CloseReason::TransportClosed;
                    };
                    match self.decoder.decode(&raw) {
                        Ok(event) => {
                            self.shared.metrics().events_decoded += 1;
                            match deliver(&self.events, event, &mut self.cancel).await {
                                Delivery::Sent => {}
                                // nobody is listening for events any more
                                Delivery::Cancelled | Delivery::ReceiverGone => {
                                    break CloseReason::Cancelled
                                }
                            }
                        }
                        Err(e) => {
                            warn!(
                                error = %e,
                                block = raw.block_number,
                                log_index = raw.log_index,
                                "failed to decode log"
                            );
                            self.shared.metrics().decode_errors += 1;
                            if let Delivery::Cancelled = self.send_error(e.into()).await {
                                break CloseReason::Cancelled;
                            }
                        }
                    }
                }

                err = self.subscription.errors.recv(), if transport_errors_open => match err {
                    Some(e) => {
                        warn!(error = %e, "transport error");
                        self.shared.metrics().transport_errors += 1;
                        if let Delivery::Cancelled = self.send_error(e.into()).await {
                            break CloseReason::Cancelled;
                        }
                    }
                    None => {
                        debug!("transport error channel closed");
                        transport_errors_open = false;
                    }
                },
            }
        };

        self.subscription.unsubscribe();
        if self.shared.close(reason) {
            info!(?reason, "subscriber closed");
        }
    }

    async fn send_error(&mut self, error: EventError) -> Delivery {
        deliver(&self.errors, error, &mut self.cancel).await
    }
}

/// Send `item`, waiting for room, unless cancellation arrives first.
async fn deliver<T>(
    tx: &mpsc::Sender<T>,
    item: T,
    cancel: &mut oneshot::Receiver<()>,
) -> Delivery {
    tokio::select! {
        biased;
        _ = cancel => Delivery::Cancelled,
        sent = tx.send(item) => match sent {
            Ok(()) => Delivery::Sent,
            Err(_) => Delivery::ReceiverGone,
        },
    }
}
