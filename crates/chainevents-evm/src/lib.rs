//! # chainevents-evm
//!
//! EVM side of ChainEvents: reads event layouts out of a Solidity ABI,
//! turns loosely-typed filter values into topic hashes, builds wire filters
//! and decodes raw logs back into named fields.
//!
//! ## Implementation notes
//! - Uses `alloy-dyn-abi` / `alloy-json-abi` for ABI types and data unpacking
//! - Topics[0] → event signature hash (keccak256 of the canonical signature)
//! - Topics[1..] → indexed arguments (each one 32-byte word)
//! - `data` → non-indexed arguments (ABI-encoded parameter sequence)

pub mod abi;
pub mod coerce;
pub mod decoder;
pub mod fingerprint;
pub mod normalizer;
pub mod request;
pub mod topics;

pub use abi::ContractAbi;
pub use decoder::LogDecoder;
pub use request::EventRequest;
pub use topics::build_topics;
