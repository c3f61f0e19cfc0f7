//! ABI schema reader.
//!
//! Parses a standard Solidity ABI JSON document and exposes each event as
//! an `EventSchema`, indexed both by name (for filter construction) and by
//! signature hash (for resolving `topics[0]` while decoding).

use alloy_dyn_abi::{DynSolType, Specifier};
use alloy_json_abi::{Event, JsonAbi, Param};
use alloy_primitives::B256;
use chainevents_core::{
    error::FilterError,
    schema::{ArgumentDescriptor, EventSchema},
    types::TypeTag,
};
use std::collections::HashMap;

use crate::fingerprint;

/// A contract interface description, pre-processed for event lookups.
#[derive(Debug, Clone)]
pub struct ContractAbi {
    abi: JsonAbi,
    /// Schemas in ABI order
    schemas: Vec<EventSchema>,
    by_name: HashMap<String, usize>,
    by_signature: HashMap<B256, usize>,
}

impl ContractAbi {
    /// Parse a standard Ethereum ABI JSON string.
    pub fn from_json(abi_json: &str) -> Result<Self, FilterError> {
        let abi: JsonAbi = serde_json::from_str(abi_json).map_err(|e| FilterError::InvalidAbi {
            reason: format!("invalid ABI JSON: {e}"),
        })?;
        Self::from_json_abi(abi)
    }

    /// Build from an already parsed ABI.
    ///
    /// Anonymous events are skipped: without a signature topic they can be
    /// neither selected by a filter nor resolved while decoding. When an
    /// event name is overloaded, name lookups return the first declaration;
    /// signature lookups see every overload.
    pub fn from_json_abi(abi: JsonAbi) -> Result<Self, FilterError> {
        let mut schemas = Vec::new();
        let mut by_name = HashMap::new();
        let mut by_signature = HashMap::new();

        for event in abi.events() {
            if event.anonymous {
                continue;
            }
            let schema = schema_from_event(event)?;
            let idx = schemas.len();
            by_name.entry(schema.name.clone()).or_insert(idx);
            by_signature.insert(schema.signature_hash, idx);
            schemas.push(schema);
        }

        Ok(Self {
            abi,
            schemas,
            by_name,
            by_signature,
        })
    }

    /// Look up an event by name.
    pub fn event_schema(&self, name: &str) -> Result<&EventSchema, FilterError> {
        self.by_name
            .get(name)
            .map(|&idx| &self.schemas[idx])
            .ok_or_else(|| FilterError::SchemaMismatch {
                event: name.to_string(),
            })
    }

    /// Resolve an event from its signature hash (a log's `topics[0]`).
    pub fn event_by_signature(&self, signature: &B256) -> Option<&EventSchema> {
        self.by_signature.get(signature).map(|&idx| &self.schemas[idx])
    }

    /// All non-anonymous events in ABI order.
    pub fn events(&self) -> impl Iterator<Item = &EventSchema> {
        self.schemas.iter()
    }

    pub fn json_abi(&self) -> &JsonAbi {
        &self.abi
    }
}

/// Derive the schema of a single ABI event.
pub fn schema_from_event(event: &Event) -> Result<EventSchema, FilterError> {
    let mut arguments = Vec::with_capacity(event.inputs.len());
    for (i, param) in event.inputs.iter().enumerate() {
        let resolved = param.resolve().map_err(|e| FilterError::InvalidAbi {
            reason: format!("event '{}' param {i}: {e}", event.name),
        })?;
        let ty = type_tag(&resolved, &param.components).map_err(|reason| {
            FilterError::InvalidAbi {
                reason: format!("event '{}' param {i}: {reason}", event.name),
            }
        })?;
        let name = if param.name.is_empty() {
            format!("arg{i}")
        } else {
            param.name.clone()
        };
        arguments.push(ArgumentDescriptor::new(name, ty, param.indexed));
    }

    let mut schema = EventSchema {
        name: event.name.clone(),
        signature_hash: B256::ZERO,
        arguments,
    };
    schema.signature_hash = fingerprint::keccak256_signature(&schema.signature());
    Ok(schema)
}

/// Map an alloy `DynSolType` to a `TypeTag`, naming tuple components from
/// the ABI parameter list where available.
pub fn type_tag(ty: &DynSolType, components: &[Param]) -> Result<TypeTag, String> {
    let tag = match ty {
        DynSolType::Address => TypeTag::Address,
        DynSolType::Bool => TypeTag::Bool,
        DynSolType::Uint(bits) => TypeTag::Uint(*bits as u16),
        DynSolType::Int(bits) => TypeTag::Int(*bits as u16),
        DynSolType::FixedBytes(n) => TypeTag::FixedBytes(*n as u8),
        DynSolType::Bytes => TypeTag::Bytes,
        DynSolType::String => TypeTag::String,
        DynSolType::Function => TypeTag::Function,
        DynSolType::Array(inner) => TypeTag::Vec(Box::new(type_tag(inner, components)?)),
        DynSolType::FixedArray(inner, len) => TypeTag::Array {
            elem: Box::new(type_tag(inner, components)?),
            len: *len,
        },
        DynSolType::Tuple(types) => {
            let mut fields = Vec::with_capacity(types.len());
            for (i, inner) in types.iter().enumerate() {
                let (name, nested) = match components.get(i) {
                    Some(p) if !p.name.is_empty() => (p.name.clone(), p.components.as_slice()),
                    Some(p) => (i.to_string(), p.components.as_slice()),
                    None => (i.to_string(), &[][..]),
                };
                fields.push((name, type_tag(inner, nested)?));
            }
            TypeTag::Tuple(fields)
        }
        #[allow(unreachable_patterns)]
        other => return Err(format!("unsupported ABI type {other:?}")),
    };
    Ok(tag)
}

/// Build the alloy `DynSolType` for a `TypeTag`.
pub fn sol_type(ty: &TypeTag) -> DynSolType {
    match ty {
        TypeTag::Address => DynSolType::Address,
        TypeTag::Bool => DynSolType::Bool,
        TypeTag::Uint(bits) => DynSolType::Uint(*bits as usize),
        TypeTag::Int(bits) => DynSolType::Int(*bits as usize),
        TypeTag::FixedBytes(n) => DynSolType::FixedBytes(*n as usize),
        TypeTag::Bytes => DynSolType::Bytes,
        TypeTag::String => DynSolType::String,
        TypeTag::Function => DynSolType::Function,
        TypeTag::Array { elem, len } => DynSolType::FixedArray(Box::new(sol_type(elem)), *len),
        TypeTag::Vec(elem) => DynSolType::Array(Box::new(sol_type(elem))),
        TypeTag::Tuple(fields) => {
            DynSolType::Tuple(fields.iter().map(|(_, t)| sol_type(t)).collect())
        }
    }
}
