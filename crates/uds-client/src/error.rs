//! Client setup errors

use thiserror::Error;

use crate::transport::TransportError;

/// Errors raised while loading configuration or building a client
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file could not be read
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    /// Values parse but are inconsistent
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// Transport could not be created from the configuration
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}
