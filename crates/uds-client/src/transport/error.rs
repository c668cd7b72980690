//! Transport layer errors

use std::time::Duration;

use thiserror::Error;

/// Failure moving raw frames to or from the device
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Channel could not be opened
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Send failed: {0}")]
    SendFailed(String),

    /// Channel is open but delivered no usable frame
    #[error("Receive failed: {0}")]
    ReceiveFailed(String),

    /// Nothing arrived within the receive window
    #[error("No frame received within {0:?}")]
    Timeout(Duration),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Transport exists but is not compiled in or not available on this platform
    #[error("Transport not supported: {0}")]
    Unsupported(String),
}

impl TransportError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TransportError::Timeout(_))
    }
}
