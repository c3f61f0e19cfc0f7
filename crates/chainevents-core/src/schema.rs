//! Event schema: the ordered argument layout of one contract event.
//!
//! A schema is a read-only view derived from a contract interface
//! description. It carries no state of its own and can be re-derived at any
//! time.

use crate::types::TypeTag;
use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// One event argument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgumentDescriptor {
    pub name: String,
    pub ty: TypeTag,
    /// Stored in topics[1..] rather than the data payload
    pub indexed: bool,
}

impl ArgumentDescriptor {
    pub fn new(name: impl Into<String>, ty: TypeTag, indexed: bool) -> Self {
        Self {
            name: name.into(),
            ty,
            indexed,
        }
    }
}

/// The layout of a single contract event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSchema {
    /// Event name, e.g. "Transfer"
    pub name: String,
    /// keccak256 of the canonical signature; always topics[0] of a matching log
    pub signature_hash: B256,
    /// Arguments in declaration order (order matters for decoding)
    pub arguments: Vec<ArgumentDescriptor>,
}

impl EventSchema {
    /// Canonical signature string, e.g. `Transfer(address,address,uint256)`.
    pub fn signature(&self) -> String {
        let types: Vec<String> = self.arguments.iter().map(|a| a.ty.to_string()).collect();
        format!("{}({})", self.name, types.join(","))
    }

    /// Look up an argument by name.
    pub fn argument(&self, name: &str) -> Option<&ArgumentDescriptor> {
        self.arguments.iter().find(|a| a.name == name)
    }

    /// Indexed arguments in declaration order (topics[1..]).
    pub fn indexed(&self) -> impl Iterator<Item = &ArgumentDescriptor> {
        self.arguments.iter().filter(|a| a.indexed)
    }

    /// Non-indexed arguments in declaration order (data payload).
    pub fn non_indexed(&self) -> impl Iterator<Item = &ArgumentDescriptor> {
        self.arguments.iter().filter(|a| !a.indexed)
    }

    pub fn indexed_count(&self) -> usize {
        self.indexed().count()
    }

    /// Number of topics a log of this event carries: the signature slot
    /// plus one per indexed argument.
    pub fn topic_count(&self) -> usize {
        1 + self.indexed_count()
    }
}
