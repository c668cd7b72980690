//! UDS protocol errors

use std::convert::Infallible;
use std::fmt;

use thiserror::Error;

use super::memory::FieldFormat;
use super::NegativeResponseCode;
use crate::transport::TransportError;

/// Outcome of a failed diagnostic call
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UdsError {
    /// Parameters rejected before anything was sent
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Response timeout")]
    Timeout,

    #[error("Negative response: {nrc} (0x{nrc:02X}) for service 0x{service_id:02X}")]
    NegativeResponse {
        service_id: u8,
        nrc: NegativeResponseCode,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(InvalidReason),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(UnexpectedResponse),

    #[error("Transport error: {0}")]
    Transport(TransportError),
}

impl From<TransportError> for UdsError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout(_) => UdsError::Timeout,
            other => UdsError::Transport(other),
        }
    }
}

impl UdsError {
    /// Negative response code, if the device refused the request
    pub fn nrc(&self) -> Option<NegativeResponseCode> {
        match self {
            UdsError::NegativeResponse { nrc, .. } => Some(*nrc),
            _ => None,
        }
    }

    /// True when nothing was transmitted for the failed call
    pub fn is_validation(&self) -> bool {
        matches!(self, UdsError::Validation(_))
    }
}

/// Parameter that a value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Address,
    Size,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Address => f.write_str("address"),
            Field::Size => f.write_str("memory size"),
        }
    }
}

/// Malformed input parameters, raised before transmission
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("unsupported {field} format: {bits} bits (expected 8, 16, 24, 32 or 40)")]
    UnsupportedFormat { field: Field, bits: u32 },

    /// Width rejected before it is tied to the address or size field
    #[error("unsupported field width: {bits} bits (expected 8, 16, 24, 32 or 40)")]
    UnsupportedWidth { bits: u32 },

    #[error("{field} 0x{value:X} does not fit in {format}")]
    ValueOutOfRange {
        field: Field,
        value: u64,
        format: FieldFormat,
    },

    #[error("invalid addressAndLengthFormatIdentifier 0x{0:02X}")]
    InvalidFormatIdentifier(u8),

    #[error("data too short: expected {expected} bytes, got {actual}")]
    DataTooShort { expected: usize, actual: usize },

    #[error("data to write must not be empty")]
    EmptyData,
}

impl From<Infallible> for ValidationError {
    fn from(never: Infallible) -> Self {
        match never {}
    }
}

/// Why a response could not be understood as a PDU for the request
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidReason {
    #[error("empty response")]
    Empty,

    #[error("negative response too short ({len} bytes)")]
    NegativeTooShort { len: usize },

    #[error("0x{0:02X} is not the response id of any known service")]
    UnknownResponseId(u8),

    #[error("echo too short: expected at least {expected} bytes, got {actual}")]
    EchoTooShort { expected: usize, actual: usize },
}

/// Echoed parameter that did not match the request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EchoField {
    FormatIdentifier,
    Address,
    Size,
    DataIdentifier,
    SubFunction,
}

impl fmt::Display for EchoField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EchoField::FormatIdentifier => "addressAndLengthFormatIdentifier",
            EchoField::Address => "memory address",
            EchoField::Size => "memory size",
            EchoField::DataIdentifier => "data identifier",
            EchoField::SubFunction => "sub-function",
        };
        f.write_str(s)
    }
}

/// Well-formed response that does not answer the request that was sent
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UnexpectedResponse {
    #[error("response belongs to service 0x{actual:02X}, expected 0x{expected:02X}")]
    WrongService { expected: u8, actual: u8 },

    #[error("echoed {field} mismatch: expected 0x{expected:X}, got 0x{actual:X}")]
    EchoMismatch {
        field: EchoField,
        expected: u64,
        actual: u64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_timeout_maps_to_timeout() {
        let err: UdsError = TransportError::Timeout(std::time::Duration::from_millis(10)).into();
        assert_eq!(err, UdsError::Timeout);

        let err: UdsError = TransportError::ConnectionClosed.into();
        assert!(matches!(err, UdsError::Transport(TransportError::ConnectionClosed)));
    }

    #[test]
    fn test_echo_mismatch_message_names_field() {
        let err = UdsError::UnexpectedResponse(UnexpectedResponse::EchoMismatch {
            field: EchoField::Address,
            expected: 0x1234,
            actual: 0x1235,
        });
        assert_eq!(
            err.to_string(),
            "Unexpected response: echoed memory address mismatch: expected 0x1234, got 0x1235"
        );
    }

    #[test]
    fn test_nrc_accessor() {
        let err = UdsError::NegativeResponse {
            service_id: 0x3D,
            nrc: NegativeResponseCode::RequestOutOfRange,
        };
        assert_eq!(err.nrc(), Some(NegativeResponseCode::RequestOutOfRange));
        assert_eq!(UdsError::Timeout.nrc(), None);
    }
}
