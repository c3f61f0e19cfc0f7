//! Argument type tags and decoded value representation.
//!
//! `TypeTag` mirrors the Solidity ABI type grammar closely enough to drive
//! both filter encoding and log decoding. `NormalizedValue` is what decoded
//! fields are reported as, so consumers never handle ABI tokens directly.

use alloy_primitives::{Address, B256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Declared type of an event argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeTag {
    /// 20-byte account / contract address
    Address,
    Bool,
    /// Unsigned integer (uint8 .. uint256). Width in bits.
    Uint(u16),
    /// Signed integer (int8 .. int256). Width in bits.
    Int(u16),
    /// Fixed-size byte array (bytes1 .. bytes32). Length in bytes.
    /// `bytes32` doubles as the 32-byte hash type.
    FixedBytes(u8),
    /// Variable-length byte array
    Bytes,
    /// UTF-8 string
    String,
    /// 24-byte external function pointer
    Function,
    /// Fixed-length array of a type
    Array { elem: Box<TypeTag>, len: usize },
    /// Variable-length array of a type
    Vec(Box<TypeTag>),
    /// Tuple / struct with named components
    Tuple(Vec<(String, TypeTag)>),
}

impl TypeTag {
    /// The 32-byte hash type (`bytes32`).
    pub const HASH: TypeTag = TypeTag::FixedBytes(32);

    /// Returns `true` for `bytes32`.
    pub fn is_hash(&self) -> bool {
        matches!(self, TypeTag::FixedBytes(32))
    }

    /// Returns `true` if values of this type occupy a single 32-byte word
    /// and are stored verbatim in an indexed topic.
    ///
    /// Everything else (strings, bytes, arrays, tuples) is stored in a topic
    /// as the keccak256 hash of its encoding.
    pub fn is_value_type(&self) -> bool {
        matches!(
            self,
            TypeTag::Address
                | TypeTag::Bool
                | TypeTag::Uint(_)
                | TypeTag::Int(_)
                | TypeTag::FixedBytes(_)
                | TypeTag::Function
        )
    }

    /// Returns `true` if the type uses offset + length encoding in ABI data.
    pub fn is_dynamic(&self) -> bool {
        match self {
            TypeTag::Bytes | TypeTag::String | TypeTag::Vec(_) => true,
            TypeTag::Array { elem, .. } => elem.is_dynamic(),
            TypeTag::Tuple(fields) => fields.iter().any(|(_, t)| t.is_dynamic()),
            _ => false,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeTag::Address => write!(f, "address"),
            TypeTag::Bool => write!(f, "bool"),
            TypeTag::Uint(bits) => write!(f, "uint{bits}"),
            TypeTag::Int(bits) => write!(f, "int{bits}"),
            TypeTag::FixedBytes(n) => write!(f, "bytes{n}"),
            TypeTag::Bytes => write!(f, "bytes"),
            TypeTag::String => write!(f, "string"),
            TypeTag::Function => write!(f, "function"),
            TypeTag::Array { elem, len } => write!(f, "{elem}[{len}]"),
            TypeTag::Vec(elem) => write!(f, "{elem}[]"),
            TypeTag::Tuple(fields) => {
                let parts: Vec<_> = fields.iter().map(|(_, t)| t.to_string()).collect();
                write!(f, "({})", parts.join(","))
            }
        }
    }
}

/// A decoded event field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum NormalizedValue {
    Uint(u128),
    /// Uints that do not fit in u128, as a decimal string
    BigUint(String),
    Int(i128),
    /// Ints that do not fit in i128, as a decimal string
    BigInt(String),
    Bool(bool),
    Bytes(Vec<u8>),
    Str(String),
    Address(Address),
    /// 32-byte value: a `bytes32` field, or the topic hash of an indexed
    /// reference-type argument whose preimage is not recoverable.
    Hash(B256),
    Array(Vec<NormalizedValue>),
    Tuple(Vec<(String, NormalizedValue)>),
}

impl NormalizedValue {
    pub fn as_address(&self) -> Option<Address> {
        match self {
            NormalizedValue::Address(a) => Some(*a),
            _ => None,
        }
    }

    pub fn as_hash(&self) -> Option<B256> {
        match self {
            NormalizedValue::Hash(h) => Some(*h),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            NormalizedValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Coerce to a u128 if this is a small Uint.
    pub fn as_u128(&self) -> Option<u128> {
        match self {
            NormalizedValue::Uint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            NormalizedValue::Str(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for NormalizedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormalizedValue::Uint(v) => write!(f, "{v}"),
            NormalizedValue::BigUint(v) => write!(f, "{v}"),
            NormalizedValue::Int(v) => write!(f, "{v}"),
            NormalizedValue::BigInt(v) => write!(f, "{v}"),
            NormalizedValue::Bool(v) => write!(f, "{v}"),
            NormalizedValue::Bytes(b) => write!(f, "0x{}", hex::encode(b)),
            NormalizedValue::Str(s) => write!(f, "{s}"),
            NormalizedValue::Address(a) => write!(f, "{a}"),
            NormalizedValue::Hash(h) => write!(f, "{h}"),
            NormalizedValue::Array(v) => {
                let parts: Vec<_> = v.iter().map(|x| x.to_string()).collect();
                write!(f, "[{}]", parts.join(", "))
            }
            NormalizedValue::Tuple(fields) => {
                let parts: Vec<_> = fields.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                write!(f, "{{{}}}", parts.join(", "))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_tag_display() {
        assert_eq!(TypeTag::Uint(256).to_string(), "uint256");
        assert_eq!(TypeTag::HASH.to_string(), "bytes32");
        assert_eq!(TypeTag::Vec(Box::new(TypeTag::Address)).to_string(), "address[]");
        let tuple = TypeTag::Tuple(vec![
            ("a".into(), TypeTag::Bool),
            ("b".into(), TypeTag::String),
        ]);
        assert_eq!(tuple.to_string(), "(bool,string)");
    }

    #[test]
    fn value_and_dynamic_classification() {
        assert!(TypeTag::Address.is_value_type());
        assert!(TypeTag::HASH.is_hash());
        assert!(!TypeTag::String.is_value_type());
        assert!(TypeTag::String.is_dynamic());
        assert!(!TypeTag::Array { elem: Box::new(TypeTag::Bool), len: 2 }.is_dynamic());
        assert!(TypeTag::Array { elem: Box::new(TypeTag::Bytes), len: 2 }.is_dynamic());
    }

    #[test]
    fn normalized_value_serde_roundtrip() {
        let val = NormalizedValue::Address(Address::repeat_byte(0x11));
        let json = serde_json::to_string(&val).unwrap();
        let back: NormalizedValue = serde_json::from_str(&json).unwrap();
        assert_eq!(val, back);
    }
}
