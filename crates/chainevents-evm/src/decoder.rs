//! `LogDecoder`: turns a `RawLog` into a `DecodedEvent`.
//!
//! Decoding is fail-closed per record: a log whose topics or data do not fit
//! the resolved schema produces a `DecodeError` and no partial event.

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::B256;
use chainevents_core::{
    error::DecodeError,
    event::{DecodedEvent, RawLog},
    schema::EventSchema,
    types::{NormalizedValue, TypeTag},
};
use indexmap::IndexMap;
use rayon::prelude::*;
use std::sync::Arc;

use crate::{
    abi::{sol_type, ContractAbi},
    normalizer::normalize,
};

/// Batches smaller than this are decoded on the calling thread.
const PARALLEL_THRESHOLD: usize = 64;

/// Stateless decoder bound to one contract interface.
#[derive(Debug, Clone)]
pub struct LogDecoder {
    abi: Arc<ContractAbi>,
}

impl LogDecoder {
    pub fn new(abi: Arc<ContractAbi>) -> Self {
        Self { abi }
    }

    pub fn abi(&self) -> &ContractAbi {
        &self.abi
    }

    /// Decode a log, resolving its event from `topics[0]`.
    pub fn decode(&self, raw: &RawLog) -> Result<DecodedEvent, DecodeError> {
        let signature = raw
            .signature()
            .ok_or(DecodeError::UnknownEvent { signature: None })?;
        let schema = self
            .abi
            .event_by_signature(&signature)
            .ok_or(DecodeError::UnknownEvent {
                signature: Some(signature),
            })?;
        self.decode_with_schema(schema, raw)
    }

    /// Decode a log against a known schema.
    ///
    /// `topics[0]` must still be present but is not compared with the
    /// schema's signature hash.
    pub fn decode_with_schema(
        &self,
        schema: &EventSchema,
        raw: &RawLog,
    ) -> Result<DecodedEvent, DecodeError> {
        if raw.topics.len() != schema.topic_count() {
            return Err(DecodeError::TopicCountMismatch {
                event: schema.name.clone(),
                expected: schema.topic_count(),
                actual: raw.topics.len(),
            });
        }

        let mut data_values = unpack_data(schema, raw)?.into_iter();
        let mut topic_cursor = raw.topics[1..].iter();
        let mut fields = IndexMap::with_capacity(schema.arguments.len());

        for arg in &schema.arguments {
            let value = if arg.indexed {
                // count was checked above
                let topic = topic_cursor
                    .next()
                    .ok_or_else(|| unpack_err(schema, "topic cursor exhausted"))?;
                decode_topic(&arg.ty, topic).map_err(|reason| DecodeError::DataUnpack {
                    event: schema.name.clone(),
                    reason: format!("topic '{}': {reason}", arg.name),
                })?
            } else {
                let value = data_values
                    .next()
                    .ok_or_else(|| unpack_err(schema, "missing data value"))?;
                normalize(value, &arg.ty)
            };
            fields.insert(arg.name.clone(), value);
        }

        Ok(DecodedEvent {
            block_number: raw.block_number,
            transaction_hash: raw.transaction_hash,
            log_index: raw.log_index,
            address: raw.address,
            event: schema.name.clone(),
            fields,
        })
    }

    /// Decode a batch in parallel. Output order matches input order; the
    /// first failing record fails the whole batch.
    pub fn decode_batch(&self, raws: &[RawLog]) -> Result<Vec<DecodedEvent>, DecodeError> {
        if raws.len() < PARALLEL_THRESHOLD {
            return raws.iter().map(|raw| self.decode(raw)).collect();
        }
        raws.par_iter().map(|raw| self.decode(raw)).collect()
    }
}

fn unpack_err(schema: &EventSchema, reason: &str) -> DecodeError {
    DecodeError::DataUnpack {
        event: schema.name.clone(),
        reason: reason.to_string(),
    }
}

/// Unpack the data payload as a parameter sequence of the non-indexed types.
fn unpack_data(schema: &EventSchema, raw: &RawLog) -> Result<Vec<DynSolValue>, DecodeError> {
    let types: Vec<DynSolType> = schema.non_indexed().map(|a| sol_type(&a.ty)).collect();
    if types.is_empty() {
        return Ok(Vec::new());
    }
    match DynSolType::Tuple(types).abi_decode_params(&raw.data) {
        Ok(DynSolValue::Tuple(values)) => Ok(values),
        Ok(other) => Ok(vec![other]),
        Err(e) => Err(unpack_err(schema, &e.to_string())),
    }
}

/// Decode one indexed topic word.
///
/// Reference types are stored as a keccak256 hash and cannot be recovered;
/// the hash itself is returned.
fn decode_topic(ty: &TypeTag, topic: &B256) -> Result<NormalizedValue, String> {
    if ty.is_hash() || !ty.is_value_type() {
        return Ok(NormalizedValue::Hash(*topic));
    }
    sol_type(ty)
        .abi_decode(topic.as_slice())
        .map(|v| normalize(v, ty))
        .map_err(|e| e.to_string())
}
