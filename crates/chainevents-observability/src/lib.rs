//! # chainevents-observability
//!
//! Structured logging for ChainEvents binaries. Library crates only emit
//! `tracing` events; this crate installs the subscriber that prints them,
//! as human-readable text or JSON, with levels configurable per component.

pub mod tracing_setup;

pub use tracing_setup::{init_tracing, LogConfig};
