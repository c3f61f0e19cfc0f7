use chainevents_core::error::TransportError;
use thiserror::Error;

/// Invalid configuration values.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid URL for '{field}': {reason}")]
    InvalidUrl { field: &'static str, reason: String },

    #[error("Unsupported scheme '{scheme}' for '{field}', expected one of {expected:?}")]
    UnsupportedScheme {
        field: &'static str,
        scheme: String,
        expected: &'static [&'static str],
    },

    #[error("'{field}' must be at least 1")]
    Zero { field: &'static str },
}

/// Errors raised while wiring an `EventFactory` to its transports.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
