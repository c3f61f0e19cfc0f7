//! Raw and decoded log records.

use crate::types::NormalizedValue;
use alloy_primitives::{Address, Bytes, B256};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A log record exactly as delivered by the chain client.
/// This is the input to the decoder.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLog {
    /// Contract that emitted the log
    pub address: Address,
    /// topics[0] is the event signature hash; topics[1..] are indexed arguments
    pub topics: Vec<B256>,
    /// ABI-encoded non-indexed arguments
    pub data: Bytes,
    pub block_number: u64,
    pub transaction_hash: B256,
    /// Position of the log within its block
    pub log_index: u64,
}

impl RawLog {
    /// Returns topics[0], the event signature hash, if present.
    pub fn signature(&self) -> Option<B256> {
        self.topics.first().copied()
    }
}

/// A fully decoded event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecodedEvent {
    pub block_number: u64,
    pub transaction_hash: B256,
    pub log_index: u64,
    pub address: Address,
    /// Event name, e.g. "Transfer"
    pub event: String,
    /// Decoded values keyed by argument name, in declaration order
    pub fields: IndexMap<String, NormalizedValue>,
}

impl DecodedEvent {
    /// Get a field value by name.
    pub fn field(&self, name: &str) -> Option<&NormalizedValue> {
        self.fields.get(name)
    }
}
