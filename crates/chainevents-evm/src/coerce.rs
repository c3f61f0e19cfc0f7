//! Value type coercer.
//!
//! Filter values arrive in loose textual form (CLI flags, config files,
//! JSON requests). Each candidate is parsed according to the argument's
//! declared type and encoded the way the EVM stores that argument in an
//! indexed topic:
//! - value types (address, bool, intN/uintN, bytesN) → their 32-byte ABI word
//! - `string` / `bytes` → keccak256 of the raw contents
//! - arrays and tuples → keccak256 of the in-place encoding of their elements
//!
//! Unparseable input is always an error; nothing silently defaults to zero.

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, B256};
use chainevents_core::{error::FilterError, schema::ArgumentDescriptor, types::TypeTag};
use std::str::FromStr;

use crate::{abi, fingerprint};

/// Coerce one candidate value for `arg` into its topic hash.
pub fn coerce_topic(arg: &ArgumentDescriptor, raw: &str) -> Result<B256, FilterError> {
    coerce_value(&arg.ty, raw)
        .and_then(|value| encode_topic(&value))
        .map_err(|reason| FilterError::ValueCoercion {
            argument: arg.name.clone(),
            ty: arg.ty.to_string(),
            value: raw.to_string(),
            reason,
        })
}

/// Parse a textual value as the given type.
pub fn coerce_value(ty: &TypeTag, raw: &str) -> Result<DynSolValue, String> {
    let text = raw.trim();
    match ty {
        TypeTag::Address => Address::from_str(text)
            .map(DynSolValue::Address)
            .map_err(|e| format!("invalid address: {e}")),
        TypeTag::Bool => parse_bool(text).map(DynSolValue::Bool),
        TypeTag::FixedBytes(32) => parse_hash(text).map(|h| DynSolValue::FixedBytes(h, 32)),
        // strings are taken verbatim, surrounding whitespace included
        TypeTag::String => Ok(DynSolValue::String(raw.to_string())),
        TypeTag::Bytes => decode_hex(text).map(DynSolValue::Bytes),
        other => abi::sol_type(other)
            .coerce_str(text)
            .map_err(|e| e.to_string()),
    }
}

/// Encode a value the way it appears in an indexed topic.
pub fn encode_topic(value: &DynSolValue) -> Result<B256, String> {
    match value {
        DynSolValue::String(_)
        | DynSolValue::Bytes(_)
        | DynSolValue::Array(_)
        | DynSolValue::FixedArray(_)
        | DynSolValue::Tuple(_) => {
            let mut preimage = Vec::new();
            encode_in_place(value, false, &mut preimage);
            Ok(fingerprint::keccak256(preimage))
        }
        other => {
            let word = other.abi_encode();
            if word.len() != 32 {
                return Err(format!("expected a single 32-byte word, got {} bytes", word.len()));
            }
            Ok(B256::from_slice(&word))
        }
    }
}

/// In-place encoding used to hash indexed reference types: elements are
/// concatenated without offsets or lengths, each padded to 32 bytes when
/// nested inside an array or tuple.
fn encode_in_place(value: &DynSolValue, nested: bool, out: &mut Vec<u8>) {
    match value {
        DynSolValue::String(s) => push_contents(s.as_bytes(), nested, out),
        DynSolValue::Bytes(b) => push_contents(b, nested, out),
        DynSolValue::Array(items) | DynSolValue::FixedArray(items) | DynSolValue::Tuple(items) => {
            for item in items {
                encode_in_place(item, true, out);
            }
        }
        other => out.extend_from_slice(&other.abi_encode()),
    }
}

fn push_contents(bytes: &[u8], pad: bool, out: &mut Vec<u8>) {
    out.extend_from_slice(bytes);
    if pad {
        let rem = bytes.len() % 32;
        if rem != 0 {
            out.resize(out.len() + 32 - rem, 0);
        }
    }
}

/// Accepts the usual textual booleans: 1/t/T/TRUE/true/True and
/// 0/f/F/FALSE/false/False.
pub fn parse_bool(text: &str) -> Result<bool, String> {
    match text {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        other => Err(format!("'{other}' is not a boolean")),
    }
}

/// Parse up to 32 bytes of hex, left-padding shorter input with zeros.
pub fn parse_hash(text: &str) -> Result<B256, String> {
    let bytes = decode_hex(text)?;
    if bytes.len() > 32 {
        return Err(format!("hash longer than 32 bytes ({} bytes)", bytes.len()));
    }
    let mut word = [0u8; 32];
    word[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(B256::from(word))
}

fn decode_hex(text: &str) -> Result<Vec<u8>, String> {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    let result = if digits.len() % 2 == 1 {
        hex::decode(format!("0{digits}"))
    } else {
        hex::decode(digits)
    };
    result.map_err(|e| format!("invalid hex: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn arg(ty: TypeTag) -> ArgumentDescriptor {
        ArgumentDescriptor::new("x", ty, true)
    }

    #[test]
    fn address_is_left_padded() {
        let topic = coerce_topic(
            &arg(TypeTag::Address),
            "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045",
        )
        .unwrap();
        assert_eq!(
            topic.to_string(),
            "0x000000000000000000000000d8da6bf26964af9d7eed9e03e53415d37aa96045"
        );
    }

    #[test]
    fn hash_accepts_short_hex() {
        let topic = coerce_topic(&arg(TypeTag::HASH), "0x01").unwrap();
        assert_eq!(topic, B256::with_last_byte(1));
    }

    #[test]
    fn bool_textual_forms() {
        let t = coerce_topic(&arg(TypeTag::Bool), "True").unwrap();
        let f = coerce_topic(&arg(TypeTag::Bool), "0").unwrap();
        assert_eq!(t, B256::with_last_byte(1));
        assert_eq!(f, B256::ZERO);
    }

    #[test]
    fn bad_bool_is_an_error_not_false() {
        let err = coerce_topic(&arg(TypeTag::Bool), "maybe").unwrap_err();
        assert!(matches!(err, FilterError::ValueCoercion { ref value, .. } if value == "maybe"));
    }

    #[test]
    fn bad_address_is_an_error() {
        assert!(coerce_topic(&arg(TypeTag::Address), "0x1234zz").is_err());
    }

    #[test]
    fn string_is_hashed() {
        let topic = coerce_topic(&arg(TypeTag::String), "hello").unwrap();
        assert_eq!(topic, fingerprint::keccak256("hello"));
    }

    #[test]
    fn bytes_are_hashed() {
        let topic = coerce_topic(&arg(TypeTag::Bytes), "0xdeadbeef").unwrap();
        assert_eq!(topic, fingerprint::keccak256([0xde, 0xad, 0xbe, 0xef]));
    }

    #[test]
    fn integers_parse_decimal_and_hex() {
        let dec = coerce_topic(&arg(TypeTag::Uint(256)), "1000").unwrap();
        let hex = coerce_topic(&arg(TypeTag::Uint(256)), "0x3e8").unwrap();
        assert_eq!(dec, hex);
        assert_eq!(&dec[30..], &[0x03, 0xe8]);
    }

    #[test]
    fn negative_int_is_sign_extended() {
        let topic = coerce_topic(&arg(TypeTag::Int(24)), "-1").unwrap();
        assert_eq!(topic, B256::repeat_byte(0xff));
    }

    #[test]
    fn uint_overflow_is_an_error() {
        assert!(coerce_topic(&arg(TypeTag::Uint(8)), "256").is_err());
    }

    #[test]
    fn array_hash_uses_padded_elements() {
        let ty = TypeTag::Vec(Box::new(TypeTag::Uint(8)));
        let topic = coerce_topic(&arg(ty), "[1, 2]").unwrap();
        let mut preimage = vec![0u8; 64];
        preimage[31] = 1;
        preimage[63] = 2;
        assert_eq!(topic, fingerprint::keccak256(preimage));
    }
}
