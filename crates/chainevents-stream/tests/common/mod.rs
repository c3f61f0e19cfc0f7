//! In-memory `ChainClient` and Transfer fixtures shared by the integration
//! tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use alloy_primitives::{Address, Bytes, B256, U256};
use async_trait::async_trait;
use chainevents_core::client::{ChainClient, LogSubscription};
use chainevents_core::error::TransportError;
use chainevents_core::event::RawLog;
use chainevents_core::filter::{EventDescription, WireFilter};
use chainevents_evm::{ContractAbi, EventRequest};
use tokio::sync::mpsc;

pub const ERC20_ABI: &str = r#"[
    {"type": "event", "name": "Transfer", "anonymous": false, "inputs": [
        {"name": "from", "type": "address", "indexed": true},
        {"name": "to", "type": "address", "indexed": true},
        {"name": "value", "type": "uint256", "indexed": false}
    ]}
]"#;

pub fn abi() -> Arc<ContractAbi> {
    Arc::new(ContractAbi::from_json(ERC20_ABI).unwrap())
}

pub fn transfer_request() -> EventRequest {
    EventRequest::new(abi())
        .address(token())
        .event(EventDescription::new("Transfer"))
}

pub fn token() -> Address {
    Address::repeat_byte(0xcc)
}

pub fn transfer_log(block: u64, index: u64, value: u64) -> RawLog {
    let sig = abi().event_schema("Transfer").unwrap().signature_hash;
    RawLog {
        address: token(),
        topics: vec![
            sig,
            Address::repeat_byte(0xaa).into_word(),
            Address::repeat_byte(0xbb).into_word(),
        ],
        data: Bytes::from(U256::from(value).to_be_bytes::<32>().to_vec()),
        block_number: block,
        transaction_hash: B256::repeat_byte(block as u8),
        log_index: index,
    }
}

/// A log whose signature the ABI does not know.
pub fn unknown_log() -> RawLog {
    RawLog {
        address: token(),
        topics: vec![B256::repeat_byte(0x99)],
        ..RawLog::default()
    }
}

/// Sending side of a mock subscription.
pub struct MockFeed {
    pub logs: mpsc::Sender<RawLog>,
    pub errors: mpsc::Sender<TransportError>,
}

/// Scripted chain client: fixed history, one live feed per subscribe call.
#[derive(Default)]
pub struct MockChainClient {
    history: Mutex<Vec<RawLog>>,
    fail_history: Mutex<Option<String>>,
    fail_subscribe: Mutex<bool>,
    feeds: Mutex<Vec<MockFeed>>,
    pub filters: Mutex<Vec<WireFilter>>,
    pub unsubscribed: Arc<AtomicUsize>,
}

impl MockChainClient {
    pub fn with_history(logs: Vec<RawLog>) -> Self {
        let client = Self::default();
        *client.history.lock().unwrap() = logs;
        client
    }

    pub fn failing_history(message: &str) -> Self {
        let client = Self::default();
        *client.fail_history.lock().unwrap() = Some(message.to_string());
        client
    }

    pub fn failing_subscribe() -> Self {
        let client = Self::default();
        *client.fail_subscribe.lock().unwrap() = true;
        client
    }

    /// Take the feed of the most recent subscription.
    pub fn take_feed(&self) -> MockFeed {
        self.feeds.lock().unwrap().pop().expect("no subscription opened")
    }

    pub fn unsubscribe_count(&self) -> usize {
        self.unsubscribed.load(Ordering::SeqCst)
    }

    pub fn last_filter(&self) -> WireFilter {
        self.filters.lock().unwrap().last().cloned().expect("no filter seen")
    }
}

#[async_trait]
impl ChainClient for MockChainClient {
    async fn filter_logs(&self, filter: &WireFilter) -> Result<Vec<RawLog>, TransportError> {
        self.filters.lock().unwrap().push(filter.clone());
        if let Some(message) = self.fail_history.lock().unwrap().clone() {
            return Err(TransportError::Http(message));
        }
        Ok(self.history.lock().unwrap().clone())
    }

    async fn subscribe_filter_logs(
        &self,
        filter: &WireFilter,
    ) -> Result<LogSubscription, TransportError> {
        self.filters.lock().unwrap().push(filter.clone());
        if *self.fail_subscribe.lock().unwrap() {
            return Err(TransportError::WebSocket("refused".into()));
        }
        let (log_tx, log_rx) = mpsc::channel(16);
        let (err_tx, err_rx) = mpsc::channel(16);
        self.feeds.lock().unwrap().push(MockFeed {
            logs: log_tx,
            errors: err_tx,
        });
        let counter = Arc::clone(&self.unsubscribed);
        Ok(LogSubscription::new(log_rx, err_rx).with_unsubscribe(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }))
    }

    fn endpoint(&self) -> &str {
        "mock://chain"
    }
}
