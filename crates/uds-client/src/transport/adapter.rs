//! Transport adapter trait

use std::time::Duration;

use async_trait::async_trait;

use super::TransportError;

/// Address information for CAN/ISO-TP
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressInfo {
    /// Transmit ID (tester -> ECU)
    pub tx_id: u32,
    /// Receive ID (ECU -> tester)
    pub rx_id: u32,
}

/// Transport-agnostic interface for moving raw UDS frames
///
/// Implementations own framing and the physical channel. The client pairs one
/// `send` with one or more `receive` calls and never issues two requests
/// concurrently on the same adapter.
#[async_trait]
pub trait TransportAdapter: Send + Sync {
    /// Send a raw UDS request
    ///
    /// Any response still buffered from an earlier, abandoned exchange must be
    /// discarded here so it is never delivered to this request.
    async fn send(&self, request: &[u8]) -> Result<(), TransportError>;

    /// Wait up to `timeout` for the next raw UDS response
    ///
    /// Returns [`TransportError::Timeout`] when nothing arrives in time.
    async fn receive(&self, timeout: Duration) -> Result<Vec<u8>, TransportError>;

    /// Current address configuration
    fn address_info(&self) -> AddressInfo {
        AddressInfo::default()
    }
}
