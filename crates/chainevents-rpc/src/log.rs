//! Log objects as returned by `eth_getLogs` and pushed by
//! `eth_subscribe("logs")`.

use alloy_primitives::{Address, Bytes, B256, U64};
use chainevents_core::event::RawLog;
use serde::Deserialize;

/// A log in node JSON form. Quantities are hex strings; block and
/// transaction fields are absent for pending logs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcLog {
    pub address: Address,
    #[serde(default)]
    pub topics: Vec<B256>,
    #[serde(default)]
    pub data: Bytes,
    pub block_number: Option<U64>,
    pub transaction_hash: Option<B256>,
    pub log_index: Option<U64>,
    /// Set when the log was dropped by a reorg
    #[serde(default)]
    pub removed: bool,
}

impl From<RpcLog> for RawLog {
    fn from(log: RpcLog) -> Self {
        RawLog {
            address: log.address,
            topics: log.topics,
            data: log.data,
            block_number: log.block_number.map(|n| n.to::<u64>()).unwrap_or_default(),
            transaction_hash: log.transaction_hash.unwrap_or_default(),
            log_index: log.log_index.map(|n| n.to::<u64>()).unwrap_or_default(),
        }
    }
}

/// Parse an `eth_getLogs` result, dropping logs flagged `removed`.
pub fn parse_logs(value: serde_json::Value) -> Result<Vec<RawLog>, serde_json::Error> {
    let logs: Vec<RpcLog> = serde_json::from_value(value)?;
    Ok(logs
        .into_iter()
        .filter(|l| !l.removed)
        .map(RawLog::from)
        .collect())
}
