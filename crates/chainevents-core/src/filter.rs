//! Chain-level log filter types.
//!
//! `WireFilter` is what gets sent to the node (`eth_getLogs` /
//! `eth_subscribe("logs")`). Its JSON form follows the Ethereum JSON-RPC
//! filter object: wildcard topic slots are `null`, single-candidate slots a
//! bare hash, multi-candidate slots an array.

use alloy_primitives::{Address, B256};
use indexmap::IndexMap;
use serde::ser::{SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};

/// A block-range bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockNumber {
    Earliest,
    Latest,
    Number(u64),
}

impl Serialize for BlockNumber {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            BlockNumber::Earliest => serializer.serialize_str("earliest"),
            BlockNumber::Latest => serializer.serialize_str("latest"),
            BlockNumber::Number(n) => serializer.serialize_str(&format!("{n:#x}")),
        }
    }
}

impl std::str::FromStr for BlockNumber {
    type Err = String;

    /// Accepts `earliest`, `latest`, a `0x` hex quantity or a decimal number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "earliest" => Ok(BlockNumber::Earliest),
            "latest" => Ok(BlockNumber::Latest),
            _ => {
                let parsed = match s.strip_prefix("0x") {
                    Some(hex) => u64::from_str_radix(hex, 16),
                    None => s.parse(),
                };
                parsed
                    .map(BlockNumber::Number)
                    .map_err(|_| format!("invalid block number: {s:?}"))
            }
        }
    }
}

impl<'de> Deserialize<'de> for BlockNumber {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Number(u64),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Text(s) => s.parse().map_err(serde::de::Error::custom),
            Repr::Number(n) => Ok(BlockNumber::Number(n)),
        }
    }
}

impl From<u64> for BlockNumber {
    fn from(n: u64) -> Self {
        BlockNumber::Number(n)
    }
}

/// Inclusive block range `[from, to]` for historical queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockRange {
    pub from: BlockNumber,
    pub to: BlockNumber,
}

impl BlockRange {
    pub fn new(from: impl Into<BlockNumber>, to: impl Into<BlockNumber>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl Default for BlockRange {
    /// Genesis to the current head.
    fn default() -> Self {
        Self {
            from: BlockNumber::Earliest,
            to: BlockNumber::Latest,
        }
    }
}

/// One topic slot of a wire filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Match any value in this position
    Any,
    /// Match any of these hashes (OR semantics)
    OneOf(Vec<B256>),
}

impl Topic {
    /// Builds a slot from candidate hashes; no candidates means wildcard.
    pub fn from_candidates(candidates: Vec<B256>) -> Self {
        if candidates.is_empty() {
            Topic::Any
        } else {
            Topic::OneOf(candidates)
        }
    }

    pub fn is_wildcard(&self) -> bool {
        matches!(self, Topic::Any)
    }

    /// Returns `true` if `hash` is accepted by this slot.
    pub fn matches(&self, hash: &B256) -> bool {
        match self {
            Topic::Any => true,
            Topic::OneOf(set) => set.contains(hash),
        }
    }
}

impl From<B256> for Topic {
    fn from(hash: B256) -> Self {
        Topic::OneOf(vec![hash])
    }
}

impl Serialize for Topic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Topic::Any => serializer.serialize_none(),
            Topic::OneOf(set) if set.len() == 1 => set[0].serialize(serializer),
            Topic::OneOf(set) => {
                let mut seq = serializer.serialize_seq(Some(set.len()))?;
                for hash in set {
                    seq.serialize_element(hash)?;
                }
                seq.end()
            }
        }
    }
}

/// The address + topic query sent to the chain node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireFilter {
    /// Emitting contracts (empty = any contract)
    #[serde(rename = "address")]
    pub addresses: Vec<Address>,
    /// Topic slots; slot 0 is the event signature when an event is selected
    pub topics: Vec<Topic>,
    /// `None` = open lower bound
    #[serde(skip_serializing_if = "Option::is_none")]
    pub from_block: Option<BlockNumber>,
    /// `None` = open-ended (live subscriptions)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub to_block: Option<BlockNumber>,
}

impl WireFilter {
    /// Returns `true` if a log with the given address and topics passes this
    /// filter the way a node would evaluate it.
    pub fn matches(&self, address: &Address, topics: &[B256]) -> bool {
        if !self.addresses.is_empty() && !self.addresses.contains(address) {
            return false;
        }
        if topics.len() < self.topics.len() {
            // a trailing wildcard still requires the topic to exist
            return false;
        }
        self.topics
            .iter()
            .zip(topics)
            .all(|(slot, topic)| slot.matches(topic))
    }

    /// JSON-RPC filter object.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

/// User-facing event selection: which event, and which candidate values
/// (in loose textual form) each indexed argument may take.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDescription {
    /// Event name as declared in the contract ABI
    pub name: String,
    /// argument name → candidate values (OR semantics within a name)
    #[serde(default)]
    pub constraints: IndexMap<String, Vec<String>>,
}

impl EventDescription {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            constraints: IndexMap::new(),
        }
    }

    /// Add candidate values for an argument (can be called repeatedly;
    /// values accumulate).
    pub fn with<I, V>(mut self, argument: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        self.constraints
            .entry(argument.into())
            .or_default()
            .extend(values.into_iter().map(|v| v.to_string()));
        self
    }
}
