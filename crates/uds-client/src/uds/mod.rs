//! UDS (Unified Diagnostic Services) protocol implementation
//!
//! This module provides the protocol layer of the client: the memory location
//! codec, request building, response classification and echo validation, and
//! the [`UdsClient`] that drives one request/response exchange at a time.

mod client;
pub mod echo;
mod error;
pub mod memory;
mod nrc;
pub mod request;
pub mod response;

use std::collections::BTreeSet;

pub use client::{CallState, UdsClient};
pub use echo::{EchoValidated, WriteMemoryResponse};
pub use error::{EchoField, Field, InvalidReason, UdsError, UnexpectedResponse, ValidationError};
pub use memory::{FieldFormat, MemoryLocation};
pub use nrc::NegativeResponseCode;
pub use request::Request;
pub use response::Outcome;

use crate::config::ServiceOverrides;

/// Offset between a request service id and its positive response id
pub const POSITIVE_RESPONSE_OFFSET: u8 = 0x40;

/// TesterPresent (0x3E) sub-functions
pub mod tester_present_sub_function {
    /// Zero sub-function, a response is expected
    pub const ZERO_SUB_FUNCTION: u8 = 0x00;
    /// suppressPosRspMsgIndicationBit
    pub const SUPPRESS_POSITIVE_RESPONSE: u8 = 0x80;
}

/// Standard UDS service ID constants
pub mod service_id {
    pub const DIAGNOSTIC_SESSION_CONTROL: u8 = 0x10;
    pub const ECU_RESET: u8 = 0x11;
    pub const CLEAR_DIAGNOSTIC_INFO: u8 = 0x14;
    pub const READ_DTC_INFO: u8 = 0x19;
    pub const READ_DATA_BY_ID: u8 = 0x22;
    pub const READ_MEMORY_BY_ADDRESS: u8 = 0x23;
    pub const READ_SCALING_DATA_BY_ID: u8 = 0x24;
    pub const SECURITY_ACCESS: u8 = 0x27;
    pub const COMMUNICATION_CONTROL: u8 = 0x28;
    pub const AUTHENTICATION: u8 = 0x29;
    pub const READ_DATA_BY_PERIODIC_ID: u8 = 0x2A;
    pub const DYNAMICALLY_DEFINE_DATA_ID: u8 = 0x2C;
    pub const WRITE_DATA_BY_ID: u8 = 0x2E;
    pub const IO_CONTROL_BY_ID: u8 = 0x2F;
    pub const ROUTINE_CONTROL: u8 = 0x31;
    pub const REQUEST_DOWNLOAD: u8 = 0x34;
    pub const REQUEST_UPLOAD: u8 = 0x35;
    pub const TRANSFER_DATA: u8 = 0x36;
    pub const REQUEST_TRANSFER_EXIT: u8 = 0x37;
    pub const REQUEST_FILE_TRANSFER: u8 = 0x38;
    pub const WRITE_MEMORY_BY_ADDRESS: u8 = 0x3D;
    pub const TESTER_PRESENT: u8 = 0x3E;
    pub const ACCESS_TIMING_PARAMETER: u8 = 0x83;
    pub const SECURED_DATA_TRANSMISSION: u8 = 0x84;
    pub const CONTROL_DTC_SETTING: u8 = 0x85;
    pub const RESPONSE_ON_EVENT: u8 = 0x86;
    pub const LINK_CONTROL: u8 = 0x87;
    pub const NEGATIVE_RESPONSE: u8 = 0x7F;

    /// Every request service id defined by ISO 14229-1
    pub const STANDARD: &[u8] = &[
        DIAGNOSTIC_SESSION_CONTROL,
        ECU_RESET,
        CLEAR_DIAGNOSTIC_INFO,
        READ_DTC_INFO,
        READ_DATA_BY_ID,
        READ_MEMORY_BY_ADDRESS,
        READ_SCALING_DATA_BY_ID,
        SECURITY_ACCESS,
        COMMUNICATION_CONTROL,
        AUTHENTICATION,
        READ_DATA_BY_PERIODIC_ID,
        DYNAMICALLY_DEFINE_DATA_ID,
        WRITE_DATA_BY_ID,
        IO_CONTROL_BY_ID,
        ROUTINE_CONTROL,
        REQUEST_DOWNLOAD,
        REQUEST_UPLOAD,
        TRANSFER_DATA,
        REQUEST_TRANSFER_EXIT,
        REQUEST_FILE_TRANSFER,
        WRITE_MEMORY_BY_ADDRESS,
        TESTER_PRESENT,
        ACCESS_TIMING_PARAMETER,
        SECURED_DATA_TRANSMISSION,
        CONTROL_DTC_SETTING,
        RESPONSE_ON_EVENT,
        LINK_CONTROL,
    ];
}

/// Resolved service IDs for a specific ECU
///
/// Starts with the standard UDS service IDs and applies any OEM-specific
/// overrides for the echo-validated services this client sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceIds {
    pub write_memory_by_address: u8,
    pub write_data_by_id: u8,
    pub tester_present: u8,
}

impl Default for ServiceIds {
    fn default() -> Self {
        Self {
            write_memory_by_address: service_id::WRITE_MEMORY_BY_ADDRESS,
            write_data_by_id: service_id::WRITE_DATA_BY_ID,
            tester_present: service_id::TESTER_PRESENT,
        }
    }
}

impl ServiceIds {
    /// Create ServiceIds with OEM-specific overrides applied
    pub fn from_overrides(overrides: &ServiceOverrides) -> Self {
        let mut ids = Self::default();

        if let Some(v) = overrides.write_memory_by_address {
            ids.write_memory_by_address = v;
        }
        if let Some(v) = overrides.write_data_by_id {
            ids.write_data_by_id = v;
        }
        if let Some(v) = overrides.tester_present {
            ids.tester_present = v;
        }

        ids
    }

    fn iter(&self) -> impl Iterator<Item = u8> {
        [
            self.write_memory_by_address,
            self.write_data_by_id,
            self.tester_present,
        ]
        .into_iter()
    }
}

/// Table of services the client recognises when classifying responses
///
/// A positive response id that maps back to a known service is a valid PDU,
/// even when it answers a different request than the one in flight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownServices {
    services: BTreeSet<u8>,
}

impl Default for KnownServices {
    fn default() -> Self {
        Self {
            services: service_id::STANDARD.iter().copied().collect(),
        }
    }
}

impl KnownServices {
    /// Table with no services at all
    pub fn empty() -> Self {
        Self {
            services: BTreeSet::new(),
        }
    }

    /// Standard table plus the (possibly overridden) ids the client sends
    pub fn for_service_ids(ids: &ServiceIds) -> Self {
        let mut table = Self::default();
        table.services.extend(ids.iter());
        table
    }

    pub fn with_service(mut self, service_id: u8) -> Self {
        self.insert(service_id);
        self
    }

    pub fn insert(&mut self, service_id: u8) {
        self.services.insert(service_id);
    }

    pub fn contains(&self, service_id: u8) -> bool {
        self.services.contains(&service_id)
    }

    /// Positive response id for a request service id
    pub fn response_id(service_id: u8) -> u8 {
        service_id.wrapping_add(POSITIVE_RESPONSE_OFFSET)
    }

    /// Map a positive response id back to the known service it answers
    pub fn service_for_response(&self, response_id: u8) -> Option<u8> {
        let service_id = response_id.checked_sub(POSITIVE_RESPONSE_OFFSET)?;
        self.contains(service_id).then_some(service_id)
    }
}
