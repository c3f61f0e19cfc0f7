//! Parsing helpers for command-line values.

use alloy_primitives::{Address, Bytes, B256};
use anyhow::{Context, Result};
use chainevents_core::filter::{BlockNumber, EventDescription};
use chainevents_evm::{ContractAbi, EventRequest};
use std::path::Path;
use std::sync::Arc;

/// Parse "earliest", "latest", a decimal or a 0x-prefixed block number.
pub fn parse_block(s: &str) -> Result<BlockNumber, String> {
    s.parse()
}

/// Parse a `name=v1,v2` constraint.
pub fn parse_constraint(s: &str) -> Result<(String, Vec<String>), String> {
    let (name, values) = s
        .split_once('=')
        .ok_or_else(|| format!("expected name=value[,value...], got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing argument name in '{s}'"));
    }
    let values = values
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    Ok((name.to_string(), values))
}

pub fn load_abi(path: &Path) -> Result<Arc<ContractAbi>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("read ABI file '{}'", path.display()))?;
    let abi = ContractAbi::from_json(&json)
        .with_context(|| format!("parse ABI file '{}'", path.display()))?;
    Ok(Arc::new(abi))
}

pub fn decode_hex(s: &str) -> Result<Bytes> {
    let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s)).context("invalid hex")?;
    Ok(Bytes::from(bytes))
}

pub fn parse_topic(s: &str) -> Result<B256> {
    s.parse::<B256>()
        .with_context(|| format!("invalid topic '{s}', expected 32 bytes of hex"))
}

/// Assemble an `EventRequest` from the shared query flags.
pub fn build_request(
    abi: Arc<ContractAbi>,
    addresses: &[Address],
    event: Option<&str>,
    constraints: &[(String, Vec<String>)],
) -> Result<EventRequest> {
    let mut request = EventRequest::new(abi).addresses(addresses.iter().copied());
    match event {
        Some(name) => {
            let mut description = EventDescription::new(name);
            for (argument, values) in constraints {
                description = description.with(argument.clone(), values.iter());
            }
            request = request.event(description);
        }
        None if !constraints.is_empty() => {
            anyhow::bail!("--where needs --event");
        }
        None => {}
    }
    Ok(request)
}
