//! MemoryLocation codec
//!
//! Encodes an (address, size) pair into the variable-width big-endian fields
//! used by the memory services (0x23, 0x3D, 0x34, 0x35), together with the
//! addressAndLengthFormatIdentifier (ALFID) that announces their widths.
//!
//! ```text
//! ALFID:  bit 7-4 = memorySize length (bytes)
//!         bit 3-0 = memoryAddress length (bytes)
//!
//! address 0x1234 (16 bit), size 0x04 (8 bit)  ->  12 | 12 34 | 04
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::{Field, ValidationError};

/// Supported bit widths for an encoded address or size field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum FieldFormat {
    Bits8,
    Bits16,
    Bits24,
    Bits32,
    Bits40,
}

impl FieldFormat {
    /// All supported widths, narrowest first
    pub const ALL: [FieldFormat; 5] = [
        FieldFormat::Bits8,
        FieldFormat::Bits16,
        FieldFormat::Bits24,
        FieldFormat::Bits32,
        FieldFormat::Bits40,
    ];

    /// Resolve a bit width, rejecting anything outside {8, 16, 24, 32, 40}
    pub fn from_bits(bits: u32, field: Field) -> Result<Self, ValidationError> {
        match bits {
            8 => Ok(FieldFormat::Bits8),
            16 => Ok(FieldFormat::Bits16),
            24 => Ok(FieldFormat::Bits24),
            32 => Ok(FieldFormat::Bits32),
            40 => Ok(FieldFormat::Bits40),
            _ => Err(ValidationError::UnsupportedFormat { field, bits }),
        }
    }

    /// Resolve a byte length as announced in an ALFID nibble
    pub fn from_byte_len(len: usize) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.byte_len() == len)
    }

    /// Narrowest width that can hold `value`
    pub fn smallest_for(value: u64, field: Field) -> Result<Self, ValidationError> {
        Self::ALL
            .into_iter()
            .find(|f| value <= f.max_value())
            .ok_or(ValidationError::ValueOutOfRange {
                field,
                value,
                format: FieldFormat::Bits40,
            })
    }

    pub fn bits(self) -> u32 {
        match self {
            FieldFormat::Bits8 => 8,
            FieldFormat::Bits16 => 16,
            FieldFormat::Bits24 => 24,
            FieldFormat::Bits32 => 32,
            FieldFormat::Bits40 => 40,
        }
    }

    /// Number of bytes the field occupies on the wire
    pub fn byte_len(self) -> usize {
        self.bits().div_ceil(8) as usize
    }

    /// Largest value representable in this width
    pub fn max_value(self) -> u64 {
        (1u64 << self.bits()) - 1
    }

    fn check(self, value: u64, field: Field) -> Result<(), ValidationError> {
        if value > self.max_value() {
            return Err(ValidationError::ValueOutOfRange {
                field,
                value,
                format: self,
            });
        }
        Ok(())
    }

    /// Append `value` big-endian, zero-padded to the field width
    fn write(self, value: u64, out: &mut Vec<u8>) {
        let bytes = value.to_be_bytes();
        out.extend_from_slice(&bytes[bytes.len() - self.byte_len()..]);
    }

    /// Read a big-endian value occupying exactly `byte_len()` bytes
    fn read(self, bytes: &[u8]) -> u64 {
        bytes[..self.byte_len()]
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | u64::from(*b))
    }
}

impl TryFrom<u32> for FieldFormat {
    type Error = ValidationError;

    /// Width alone, without the field it belongs to (as read from config)
    fn try_from(bits: u32) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|f| f.bits() == bits)
            .ok_or(ValidationError::UnsupportedWidth { bits })
    }
}

impl From<FieldFormat> for u32 {
    fn from(format: FieldFormat) -> Self {
        format.bits()
    }
}

impl fmt::Display for FieldFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bits", self.bits())
    }
}

/// A validated memory region: address, size and their encoded widths
///
/// Construction is the only validation point. Once built, a location always
/// encodes, so a malformed region can never reach the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryLocation {
    address: u64,
    size: u64,
    address_format: FieldFormat,
    size_format: FieldFormat,
}

impl MemoryLocation {
    /// Create a location from raw bit widths
    ///
    /// # Example
    ///
    /// ```
    /// use uds_client::MemoryLocation;
    ///
    /// let loc = MemoryLocation::new(0x1234, 4, 16, 8).unwrap();
    /// assert_eq!(loc.format_identifier(), 0x12);
    /// assert_eq!(loc.encode(), vec![0x12, 0x34, 0x04]);
    /// ```
    pub fn new(
        address: u64,
        size: u64,
        address_bits: u32,
        size_bits: u32,
    ) -> Result<Self, ValidationError> {
        let address_format = FieldFormat::from_bits(address_bits, Field::Address)?;
        let size_format = FieldFormat::from_bits(size_bits, Field::Size)?;
        Self::with_formats(address, size, address_format, size_format)
    }

    /// Create a location with explicit field formats
    pub fn with_formats(
        address: u64,
        size: u64,
        address_format: FieldFormat,
        size_format: FieldFormat,
    ) -> Result<Self, ValidationError> {
        address_format.check(address, Field::Address)?;
        size_format.check(size, Field::Size)?;
        Ok(Self {
            address,
            size,
            address_format,
            size_format,
        })
    }

    /// Create a location using the narrowest format that holds each value
    pub fn auto(address: u64, size: u64) -> Result<Self, ValidationError> {
        let address_format = FieldFormat::smallest_for(address, Field::Address)?;
        let size_format = FieldFormat::smallest_for(size, Field::Size)?;
        Ok(Self {
            address,
            size,
            address_format,
            size_format,
        })
    }

    pub fn address(&self) -> u64 {
        self.address
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn address_format(&self) -> FieldFormat {
        self.address_format
    }

    pub fn size_format(&self) -> FieldFormat {
        self.size_format
    }

    /// addressAndLengthFormatIdentifier byte for this location
    pub fn format_identifier(&self) -> u8 {
        format_identifier(self.address_format, self.size_format)
    }

    /// Length of the encoded address and size fields, without the ALFID
    pub fn encoded_len(&self) -> usize {
        self.address_format.byte_len() + self.size_format.byte_len()
    }

    /// Encode address then size, each big-endian and zero-padded
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut out);
        out
    }

    pub(crate) fn encode_into(&self, out: &mut Vec<u8>) {
        self.address_format.write(self.address, out);
        self.size_format.write(self.size, out);
    }

    /// Decode an address and size pair; bytes past the two fields are ignored
    pub fn decode(
        bytes: &[u8],
        address_format: FieldFormat,
        size_format: FieldFormat,
    ) -> Result<(u64, u64), ValidationError> {
        let expected = address_format.byte_len() + size_format.byte_len();
        if bytes.len() < expected {
            return Err(ValidationError::DataTooShort {
                expected,
                actual: bytes.len(),
            });
        }

        let address = address_format.read(bytes);
        let size = size_format.read(&bytes[address_format.byte_len()..]);
        Ok((address, size))
    }

    /// Decode a location prefixed by its ALFID byte
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ValidationError> {
        let (&alfid, fields) = bytes
            .split_first()
            .ok_or(ValidationError::DataTooShort {
                expected: 1,
                actual: 0,
            })?;
        let (address_format, size_format) = parse_format_identifier(alfid)?;
        let (address, size) = Self::decode(fields, address_format, size_format)?;
        Ok(Self {
            address,
            size,
            address_format,
            size_format,
        })
    }
}

impl fmt::Display for MemoryLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{:0aw$X} (size 0x{:0sw$X})",
            self.address,
            self.size,
            aw = self.address_format.byte_len() * 2,
            sw = self.size_format.byte_len() * 2
        )
    }
}

/// (address, size) with automatic widths
impl TryFrom<(u64, u64)> for MemoryLocation {
    type Error = ValidationError;

    fn try_from((address, size): (u64, u64)) -> Result<Self, Self::Error> {
        Self::auto(address, size)
    }
}

/// (address, size, address_bits, size_bits)
impl TryFrom<(u64, u64, u32, u32)> for MemoryLocation {
    type Error = ValidationError;

    fn try_from(
        (address, size, address_bits, size_bits): (u64, u64, u32, u32),
    ) -> Result<Self, Self::Error> {
        Self::new(address, size, address_bits, size_bits)
    }
}

/// Build an ALFID byte from the two field formats
pub fn format_identifier(address_format: FieldFormat, size_format: FieldFormat) -> u8 {
    ((size_format.byte_len() as u8) << 4) | (address_format.byte_len() as u8)
}

/// Split an ALFID byte into (address_format, size_format)
pub fn parse_format_identifier(alfid: u8) -> Result<(FieldFormat, FieldFormat), ValidationError> {
    let size_len = usize::from(alfid >> 4);
    let address_len = usize::from(alfid & 0x0F);

    match (
        FieldFormat::from_byte_len(address_len),
        FieldFormat::from_byte_len(size_len),
    ) {
        (Some(a), Some(s)) => Ok((a, s)),
        _ => Err(ValidationError::InvalidFormatIdentifier(alfid)),
    }
}
