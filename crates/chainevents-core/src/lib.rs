//! # chainevents-core
//!
//! Core types shared across all ChainEvents crates: the typed event schema,
//! raw and decoded log records, the chain-level wire filter, the error
//! taxonomy and the `ChainClient` collaborator trait that historical and
//! live queries are executed against.

pub mod client;
pub mod error;
pub mod event;
pub mod filter;
pub mod schema;
pub mod types;

pub use client::{ChainClient, LogSubscription};
pub use error::{DecodeError, EventError, FilterError, TransportError};
pub use event::{DecodedEvent, RawLog};
pub use filter::{BlockNumber, BlockRange, EventDescription, Topic, WireFilter};
pub use schema::{ArgumentDescriptor, EventSchema};
pub use types::{NormalizedValue, TypeTag};
