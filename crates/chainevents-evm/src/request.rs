//! `EventRequest`: what the caller wants to see, before it is lowered to a
//! chain-level `WireFilter`.

use alloy_primitives::Address;
use chainevents_core::{
    error::FilterError,
    filter::{BlockRange, EventDescription, WireFilter},
    schema::EventSchema,
};
use std::sync::Arc;

use crate::{abi::ContractAbi, topics};

/// An event query against one contract interface.
///
/// `event` is explicitly optional: `None` selects every event emitted by
/// `addresses`, and decoding resolves each record from its `topics[0]`.
#[derive(Debug, Clone)]
pub struct EventRequest {
    pub abi: Arc<ContractAbi>,
    pub addresses: Vec<Address>,
    pub event: Option<EventDescription>,
    /// Historical queries only; `None` = genesis to latest
    pub block_range: Option<BlockRange>,
}

impl EventRequest {
    pub fn new(abi: Arc<ContractAbi>) -> Self {
        Self {
            abi,
            addresses: Vec::new(),
            event: None,
            block_range: None,
        }
    }

    /// Add a contract address (can be called multiple times).
    pub fn address(mut self, address: Address) -> Self {
        self.addresses.push(address);
        self
    }

    /// Add multiple contract addresses.
    pub fn addresses(mut self, addresses: impl IntoIterator<Item = Address>) -> Self {
        self.addresses.extend(addresses);
        self
    }

    /// Select one event and its value constraints.
    pub fn event(mut self, event: EventDescription) -> Self {
        self.event = Some(event);
        self
    }

    pub fn block_range(mut self, range: BlockRange) -> Self {
        self.block_range = Some(range);
        self
    }

    /// Schema of the selected event, if any.
    pub fn schema(&self) -> Result<Option<&EventSchema>, FilterError> {
        match &self.event {
            Some(desc) => self.abi.event_schema(&desc.name).map(Some),
            None => Ok(None),
        }
    }

    /// Filter for a bounded historical query: both bounds are always set,
    /// defaulting to `earliest` / `latest`.
    pub fn historical_filter(&self) -> Result<WireFilter, FilterError> {
        let range = self.block_range.unwrap_or_default();
        let mut filter = self.base_filter()?;
        filter.from_block = Some(range.from);
        filter.to_block = Some(range.to);
        Ok(filter)
    }

    /// Filter for a live subscription: no block bounds.
    pub fn live_filter(&self) -> Result<WireFilter, FilterError> {
        self.base_filter()
    }

    fn base_filter(&self) -> Result<WireFilter, FilterError> {
        let topics = match &self.event {
            Some(desc) => {
                let schema = self.abi.event_schema(&desc.name)?;
                topics::build_topics(schema, Some(&desc.constraints))?
            }
            None => Vec::new(),
        };
        Ok(WireFilter {
            addresses: self.addresses.clone(),
            topics,
            from_block: None,
            to_block: None,
        })
    }
}
