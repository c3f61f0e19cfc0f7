//! Error types for filter construction, log decoding and chain transport.

use alloy_primitives::B256;
use thiserror::Error;

/// Errors raised while turning an event request into a wire filter.
/// No partial filter is ever produced when one of these is returned.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("Event '{event}' not found in contract ABI")]
    SchemaMismatch { event: String },

    #[error("Cannot coerce '{value}' for argument '{argument}' ({ty}): {reason}")]
    ValueCoercion {
        argument: String,
        ty: String,
        value: String,
        reason: String,
    },

    #[error("Invalid contract ABI: {reason}")]
    InvalidAbi { reason: String },
}

/// Errors that can occur while decoding a single log record.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Unknown event signature {}", display_signature(.signature))]
    UnknownEvent { signature: Option<B256> },

    #[error("Topic count mismatch for '{event}': expected {expected}, got {actual}")]
    TopicCountMismatch {
        event: String,
        expected: usize,
        actual: usize,
    },

    #[error("Failed to unpack data of '{event}': {reason}")]
    DataUnpack { event: String, reason: String },
}

fn display_signature(signature: &Option<B256>) -> String {
    match signature {
        Some(sig) => sig.to_string(),
        None => "(missing topic0)".into(),
    }
}

/// Transport-level errors reported by a `ChainClient`.
/// The engine passes these through unchanged and never retries.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed (connection refused, timeout, non-2xx, ...).
    #[error("HTTP error: {0}")]
    Http(String),

    /// WebSocket connection/send/receive error.
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// JSON-RPC error object returned by the node.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// Response could not be deserialized.
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),

    /// The transport cannot perform the requested operation.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// The transport connection has been closed.
    #[error("Transport closed")]
    Closed,

    /// A shared connection dropped a subscription whose buffer was full.
    #[error("subscription {0} fell behind and was closed")]
    Lagged(String),

    #[error("{0}")]
    Other(String),
}

/// Umbrella error returned by finders and subscribers and carried on the
/// streaming error channel.
#[derive(Debug, Error)]
pub enum EventError {
    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Subscriber already subscribed or closed")]
    AlreadySubscribed,
}

impl EventError {
    /// Returns `true` if this error concerns a single malformed record.
    pub fn is_decode(&self) -> bool {
        matches!(self, Self::Decode(_))
    }

    /// Returns `true` if this error was reported by the chain client.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_event_display() {
        let err = DecodeError::UnknownEvent { signature: None };
        assert_eq!(err.to_string(), "Unknown event signature (missing topic0)");

        let err = DecodeError::UnknownEvent {
            signature: Some(B256::repeat_byte(0xab)),
        };
        assert!(err.to_string().contains("0xabab"));
    }

    #[test]
    fn umbrella_classification() {
        let decode: EventError = DecodeError::DataUnpack {
            event: "Transfer".into(),
            reason: "buffer overrun".into(),
        }
        .into();
        assert!(decode.is_decode());
        assert!(!decode.is_transport());

        let transport: EventError = TransportError::Closed.into();
        assert!(transport.is_transport());
    }
}
