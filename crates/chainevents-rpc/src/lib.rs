//! # chainevents-rpc
//!
//! `ChainClient` implementations that talk JSON-RPC 2.0 to an Ethereum node.
//!
//! - [`HttpLogClient`]: bounded queries via `eth_getLogs`
//! - [`WsLogClient`]: bounded queries plus live `eth_subscribe("logs")`
//!
//! Both clients report failures as `TransportError` and never retry a
//! query on their own; the WebSocket client reconnects its socket in the
//! background but does not resume subscriptions that were cut off.

pub mod http;
pub mod log;
pub mod request;
pub mod subscriptions;
pub mod ws;

pub use http::{HttpClientConfig, HttpLogClient};
pub use ws::{WsClientConfig, WsLogClient};
