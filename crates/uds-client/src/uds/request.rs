//! Request PDU building

use super::error::ValidationError;
use super::memory::MemoryLocation;
use super::tester_present_sub_function;

/// A service request PDU: `service_id || payload`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    service_id: u8,
    payload: Vec<u8>,
}

impl Request {
    pub fn new(service_id: u8, payload: Vec<u8>) -> Self {
        Self {
            service_id,
            payload,
        }
    }

    /// WriteMemoryByAddress: `[sid][ALFID][address][size][data...]`
    ///
    /// `data` must not be empty; the size field announces how many bytes follow.
    pub fn write_memory_by_address(
        service_id: u8,
        location: &MemoryLocation,
        data: &[u8],
    ) -> Result<Self, ValidationError> {
        if data.is_empty() {
            return Err(ValidationError::EmptyData);
        }

        let mut payload = Vec::with_capacity(1 + location.encoded_len() + data.len());
        payload.push(location.format_identifier());
        location.encode_into(&mut payload);
        payload.extend_from_slice(data);

        Ok(Self::new(service_id, payload))
    }

    /// WriteDataByIdentifier: `[sid][DID_HI][DID_LO][data...]`
    pub fn write_data_by_identifier(
        service_id: u8,
        did: u16,
        data: &[u8],
    ) -> Result<Self, ValidationError> {
        if data.is_empty() {
            return Err(ValidationError::EmptyData);
        }

        let mut payload = did.to_be_bytes().to_vec();
        payload.extend_from_slice(data);
        Ok(Self::new(service_id, payload))
    }

    /// TesterPresent: `[sid][sub-function]`
    pub fn tester_present(service_id: u8, suppress_response: bool) -> Self {
        let sub_function = if suppress_response {
            tester_present_sub_function::SUPPRESS_POSITIVE_RESPONSE
        } else {
            tester_present_sub_function::ZERO_SUB_FUNCTION
        };
        Self::new(service_id, vec![sub_function])
    }

    pub fn service_id(&self) -> u8 {
        self.service_id
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Serialize to raw bytes for the transport
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(1 + self.payload.len());
        bytes.push(self.service_id);
        bytes.extend_from_slice(&self.payload);
        bytes
    }
}
