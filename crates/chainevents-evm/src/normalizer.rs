//! Converts alloy `DynSolValue` → ChainEvents `NormalizedValue`.
//!
//! The declared `TypeTag` is carried alongside so tuple components keep
//! their ABI names.

use alloy_dyn_abi::DynSolValue;
use chainevents_core::types::{NormalizedValue, TypeTag};

/// Convert a decoded `DynSolValue` into a `NormalizedValue`.
pub fn normalize(val: DynSolValue, ty: &TypeTag) -> NormalizedValue {
    match val {
        DynSolValue::Bool(b) => NormalizedValue::Bool(b),

        DynSolValue::Int(i, _bits) => match i128::try_from(i) {
            Ok(v) => NormalizedValue::Int(v),
            Err(_) => NormalizedValue::BigInt(i.to_string()),
        },

        DynSolValue::Uint(u, _bits) => match u128::try_from(u) {
            Ok(v) => NormalizedValue::Uint(v),
            Err(_) => NormalizedValue::BigUint(u.to_string()),
        },

        DynSolValue::FixedBytes(word, 32) => NormalizedValue::Hash(word),
        DynSolValue::FixedBytes(word, size) => NormalizedValue::Bytes(word[..size].to_vec()),

        DynSolValue::Bytes(b) => NormalizedValue::Bytes(b),

        DynSolValue::String(s) => NormalizedValue::Str(s),

        DynSolValue::Address(a) => NormalizedValue::Address(a),

        DynSolValue::Array(vals) | DynSolValue::FixedArray(vals) => {
            let elem = match ty {
                TypeTag::Vec(elem) | TypeTag::Array { elem, .. } => Some(elem.as_ref()),
                _ => None,
            };
            NormalizedValue::Array(
                vals.into_iter()
                    .map(|v| match elem {
                        Some(t) => normalize(v, t),
                        None => normalize_untyped(v),
                    })
                    .collect(),
            )
        }

        DynSolValue::Tuple(vals) => {
            let declared: &[(String, TypeTag)] = match ty {
                TypeTag::Tuple(fields) => fields,
                _ => &[],
            };
            let named = vals
                .into_iter()
                .enumerate()
                .map(|(i, v)| match declared.get(i) {
                    Some((name, t)) => (name.clone(), normalize(v, t)),
                    None => (i.to_string(), normalize_untyped(v)),
                })
                .collect();
            NormalizedValue::Tuple(named)
        }

        // function pointers (address ++ selector): report raw bytes
        DynSolValue::Function(f) => NormalizedValue::Bytes(f.to_vec()),

        #[allow(unreachable_patterns)]
        other => NormalizedValue::Bytes(other.abi_encode()),
    }
}

/// Normalize without type information; tuple components get positional
/// names "0", "1", ...
pub fn normalize_untyped(val: DynSolValue) -> NormalizedValue {
    const UNKNOWN: TypeTag = TypeTag::Tuple(Vec::new());
    normalize(val, &UNKNOWN)
}
