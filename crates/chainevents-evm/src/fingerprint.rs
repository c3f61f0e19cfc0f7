//! Keccak-256 hashing for event signatures and indexed reference values.
//!
//! The signature hash of an EVM event is the keccak256 of its canonical
//! signature string, e.g.:
//!   keccak256("Transfer(address,address,uint256)")
//!   → 0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef

use alloy_primitives::B256;
use tiny_keccak::{Hasher, Keccak};

/// keccak256 of arbitrary bytes.
pub fn keccak256(data: impl AsRef<[u8]>) -> B256 {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data.as_ref());
    hasher.finalize(&mut output);
    B256::from(output)
}

/// Signature hash of an event.
/// Input: `"EventName(type1,type2,...)"`, the canonical ABI signature.
pub fn keccak256_signature(signature: &str) -> B256 {
    keccak256(signature.as_bytes())
}
