//! # chainevents-stream
//!
//! Runs event requests against a `ChainClient`:
//!
//! - [`HistoryFinder`]: one bounded `eth_getLogs`-style query, decoded in
//!   node order, failing as a whole on any bad record
//! - [`EventSubscriber`]: a live subscription with its own decode task,
//!   delivering events and per-record errors on separate bounded channels
//! - [`EventFactory`]: builds both from shared history and live clients

pub mod config;
pub mod error;
pub mod factory;
pub mod finder;
pub mod metrics;
pub mod subscriber;

pub use config::{ChainConfig, StreamConfig};
pub use error::{ConfigError, SetupError};
pub use factory::EventFactory;
pub use finder::HistoryFinder;
pub use metrics::SubscriberMetrics;
pub use subscriber::{CloseReason, EventSubscriber, SubscriberState};
