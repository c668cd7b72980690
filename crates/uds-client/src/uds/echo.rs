//! Echo validation for positive responses
//!
//! Echo-validated services reflect part of the request back in their positive
//! response. The echoed fields are re-decoded with the formats that were sent
//! and compared field by field. Bytes after the echo are tolerated, since
//! some devices append status information.

use super::error::{EchoField, InvalidReason, UdsError, UnexpectedResponse};
use super::memory::MemoryLocation;

/// Request parameters that a positive response must echo back
pub trait EchoValidated {
    /// Value returned once the echo has been confirmed
    type Echo;

    /// Minimum number of payload bytes (after the response id) holding the echo
    fn echo_len(&self) -> usize;

    /// Compare the echoed fields against the parameters that were sent
    fn validate_echo(&self, payload: &[u8]) -> Result<Self::Echo, UdsError>;
}

fn ensure_len(payload: &[u8], expected: usize) -> Result<(), UdsError> {
    if payload.len() < expected {
        return Err(UdsError::InvalidResponse(InvalidReason::EchoTooShort {
            expected,
            actual: payload.len(),
        }));
    }
    Ok(())
}

fn compare(field: EchoField, expected: u64, actual: u64) -> Result<(), UdsError> {
    if expected != actual {
        return Err(UdsError::UnexpectedResponse(
            UnexpectedResponse::EchoMismatch {
                field,
                expected,
                actual,
            },
        ));
    }
    Ok(())
}

/// Confirmed WriteMemoryByAddress echo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteMemoryResponse {
    pub location: MemoryLocation,
    /// Bytes the device appended after the echo
    pub trailing: Vec<u8>,
}

/// WriteMemoryByAddress echoes `[ALFID][address][size]`
impl EchoValidated for MemoryLocation {
    type Echo = WriteMemoryResponse;

    fn echo_len(&self) -> usize {
        1 + self.encoded_len()
    }

    fn validate_echo(&self, payload: &[u8]) -> Result<WriteMemoryResponse, UdsError> {
        ensure_len(payload, self.echo_len())?;

        compare(
            EchoField::FormatIdentifier,
            u64::from(self.format_identifier()),
            u64::from(payload[0]),
        )?;

        let (address, size) =
            MemoryLocation::decode(&payload[1..], self.address_format(), self.size_format())?;
        compare(EchoField::Address, self.address(), address)?;
        compare(EchoField::Size, self.size(), size)?;

        Ok(WriteMemoryResponse {
            location: *self,
            trailing: payload[self.echo_len()..].to_vec(),
        })
    }
}

/// WriteDataByIdentifier echoes the 2-byte data identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataIdentifierEcho(pub u16);

impl EchoValidated for DataIdentifierEcho {
    type Echo = u16;

    fn echo_len(&self) -> usize {
        2
    }

    fn validate_echo(&self, payload: &[u8]) -> Result<u16, UdsError> {
        ensure_len(payload, self.echo_len())?;
        let did = u16::from_be_bytes([payload[0], payload[1]]);
        compare(EchoField::DataIdentifier, u64::from(self.0), u64::from(did))?;
        Ok(did)
    }
}

/// Services answering with their sub-function byte (e.g. TesterPresent)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubFunctionEcho(pub u8);

impl EchoValidated for SubFunctionEcho {
    type Echo = ();

    fn echo_len(&self) -> usize {
        1
    }

    fn validate_echo(&self, payload: &[u8]) -> Result<(), UdsError> {
        ensure_len(payload, self.echo_len())?;
        compare(
            EchoField::SubFunction,
            u64::from(self.0),
            u64::from(payload[0]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn location() -> MemoryLocation {
        MemoryLocation::new(0x1234, 4, 16, 8).unwrap()
    }

    fn mismatch(field: EchoField, expected: u64, actual: u64) -> UdsError {
        UdsError::UnexpectedResponse(UnexpectedResponse::EchoMismatch {
            field,
            expected,
            actual,
        })
    }

    #[test]
    fn test_exact_echo_accepted() {
        let echo = location().validate_echo(&[0x12, 0x12, 0x34, 0x04]).unwrap();
        assert_eq!(echo.location, location());
        assert!(echo.trailing.is_empty());
    }

    #[test]
    fn test_trailing_bytes_tolerated() {
        let echo = location()
            .validate_echo(&[0x12, 0x12, 0x34, 0x04, 0x01, 0x02, 0x03, 0x04, 0x05])
            .unwrap();
        assert_eq!(echo.trailing, vec![0x01, 0x02, 0x03, 0x04, 0x05]);
    }

    #[test]
    fn test_format_identifier_mismatch() {
        assert_eq!(
            location().validate_echo(&[0x21, 0x12, 0x34, 0x04]),
            Err(mismatch(EchoField::FormatIdentifier, 0x12, 0x21))
        );
    }

    #[test]
    fn test_address_mismatch() {
        assert_eq!(
            location().validate_echo(&[0x12, 0x12, 0x35, 0x04]),
            Err(mismatch(EchoField::Address, 0x1234, 0x1235))
        );
    }

    #[test]
    fn test_size_mismatch() {
        assert_eq!(
            location().validate_echo(&[0x12, 0x12, 0x34, 0x05]),
            Err(mismatch(EchoField::Size, 0x04, 0x05))
        );
    }

    #[test]
    fn test_short_echo_is_invalid() {
        assert_eq!(
            location().validate_echo(&[0x12, 0x12, 0x34]),
            Err(UdsError::InvalidResponse(InvalidReason::EchoTooShort {
                expected: 4,
                actual: 3
            }))
        );
        assert!(matches!(
            location().validate_echo(&[]),
            Err(UdsError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_data_identifier_echo() {
        let echo = DataIdentifierEcho(0xF190);
        assert_eq!(echo.validate_echo(&[0xF1, 0x90]), Ok(0xF190));
        assert_eq!(
            echo.validate_echo(&[0xF1, 0x91]),
            Err(mismatch(EchoField::DataIdentifier, 0xF190, 0xF191))
        );
        assert!(matches!(
            echo.validate_echo(&[0xF1]),
            Err(UdsError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_sub_function_echo() {
        let echo = SubFunctionEcho(0x00);
        assert_eq!(echo.validate_echo(&[0x00, 0xAA]), Ok(()));
        assert_eq!(
            echo.validate_echo(&[0x01]),
            Err(mismatch(EchoField::SubFunction, 0x00, 0x01))
        );
    }
}
