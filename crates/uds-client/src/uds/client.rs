//! UDS client for echo-validated diagnostic services
//!
//! Each call walks the same lifecycle:
//!
//! ```text
//! Idle -> Validating -> Sent -> AwaitingResponse -> Classified -> Done
//!             |                       |                 |
//!             +-----------------------+-----------------+-----> Failed
//! ```
//!
//! Validation failures never reach the transport. A responsePending (0x78)
//! negative response sends the call back to `AwaitingResponse`. The whole
//! call, pending extensions included, ends no later than the larger of the
//! call timeout and the P2* timeout after the request was sent.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use super::echo::{DataIdentifierEcho, EchoValidated, SubFunctionEcho, WriteMemoryResponse};
use super::{
    tester_present_sub_function, Field, FieldFormat, KnownServices, MemoryLocation,
    NegativeResponseCode, Outcome, Request, ServiceIds, UdsError, ValidationError,
};
use crate::config::ClientConfig;
use crate::transport::TransportAdapter;

const DEFAULT_TIMEOUT: Duration = Duration::from_millis(1000);
const RESPONSE_PENDING_TIMEOUT: Duration = Duration::from_millis(5000);

/// Lifecycle state of a single diagnostic call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Idle,
    Validating,
    Sent,
    AwaitingResponse,
    Classified,
    Done,
    Failed,
}

/// Tracks one call through its states for logging
struct Call {
    service_id: u8,
    state: CallState,
}

impl Call {
    fn new(service_id: u8) -> Self {
        Self {
            service_id,
            state: CallState::Idle,
        }
    }

    fn enter(&mut self, next: CallState) {
        trace!(
            service = format_args!("0x{:02X}", self.service_id),
            from = ?self.state,
            to = ?next,
            "UDS call state"
        );
        self.state = next;
    }

    fn finish<T>(&mut self, result: Result<T, UdsError>) -> Result<T, UdsError> {
        match &result {
            Ok(_) => self.enter(CallState::Done),
            Err(err) => {
                self.enter(CallState::Failed);
                match err {
                    UdsError::InvalidResponse(_) | UdsError::UnexpectedResponse(_) => {
                        warn!(service = format_args!("0x{:02X}", self.service_id), %err, "UDS call failed")
                    }
                    _ => {
                        debug!(service = format_args!("0x{:02X}", self.service_id), %err, "UDS call failed")
                    }
                }
            }
        }
        result
    }
}

/// UDS client for diagnostic communication
///
/// Clones share the transport and the channel lock, so a client and all of its
/// clones keep at most one request in flight. Build one client per transport.
#[derive(Clone)]
pub struct UdsClient {
    transport: Arc<dyn TransportAdapter>,
    timeout: Duration,
    p2_star_timeout: Duration,
    /// Service IDs to use (may include OEM overrides)
    svc: ServiceIds,
    known: KnownServices,
    default_address_format: Option<FieldFormat>,
    default_size_format: Option<FieldFormat>,
    channel: Arc<Mutex<()>>,
}

impl UdsClient {
    pub fn new(transport: Arc<dyn TransportAdapter>) -> Self {
        Self::with_service_ids(transport, ServiceIds::default())
    }

    /// Create a client with custom service IDs (for OEM-specific implementations)
    pub fn with_service_ids(transport: Arc<dyn TransportAdapter>, service_ids: ServiceIds) -> Self {
        Self {
            transport,
            timeout: DEFAULT_TIMEOUT,
            p2_star_timeout: RESPONSE_PENDING_TIMEOUT,
            svc: service_ids,
            known: KnownServices::for_service_ids(&service_ids),
            default_address_format: None,
            default_size_format: None,
            channel: Arc::new(Mutex::new(())),
        }
    }

    /// Create a client from configuration
    pub fn from_config(transport: Arc<dyn TransportAdapter>, config: &ClientConfig) -> Self {
        let mut client = Self::with_service_ids(
            transport,
            ServiceIds::from_overrides(&config.service_overrides),
        );
        client.timeout = config.request_timeout();
        client.p2_star_timeout = config.p2_star_timeout();
        client.default_address_format = config.default_address_format;
        client.default_size_format = config.default_size_format;
        for &service_id in &config.extra_services {
            client.known.insert(service_id);
        }
        client
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_p2_star_timeout(mut self, timeout: Duration) -> Self {
        self.p2_star_timeout = timeout;
        self
    }

    /// Replace the table of services recognised in responses
    pub fn with_known_services(mut self, known: KnownServices) -> Self {
        self.known = known;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Get the service IDs being used
    pub fn service_ids(&self) -> &ServiceIds {
        &self.svc
    }

    pub fn known_services(&self) -> &KnownServices {
        &self.known
    }

    /// Build a location using the configured default formats, or the
    /// narrowest formats that fit when none are configured
    pub fn memory_location(&self, address: u64, size: u64) -> Result<MemoryLocation, ValidationError> {
        let address_format = match self.default_address_format {
            Some(format) => format,
            None => FieldFormat::smallest_for(address, Field::Address)?,
        };
        let size_format = match self.default_size_format {
            Some(format) => format,
            None => FieldFormat::smallest_for(size, Field::Size)?,
        };
        MemoryLocation::with_formats(address, size, address_format, size_format)
    }

    /// Send a request and return the positive response payload
    ///
    /// The payload excludes the response service id. No echo validation is
    /// performed.
    pub async fn request(&self, request: &Request) -> Result<Vec<u8>, UdsError> {
        self.request_with_timeout(request, self.timeout).await
    }

    pub async fn request_with_timeout(
        &self,
        request: &Request,
        timeout: Duration,
    ) -> Result<Vec<u8>, UdsError> {
        let mut call = Call::new(request.service_id());
        // Already built; nothing left to check
        call.enter(CallState::Validating);
        let result = self.exchange(&mut call, request, timeout).await;
        call.finish(result)
    }

    /// Write Memory By Address (0x3D)
    ///
    /// `location` is anything convertible into a [`MemoryLocation`]: a location
    /// itself, `(address, size)` or `(address, size, address_bits, size_bits)`.
    /// The response must echo the ALFID, address and size that were sent.
    ///
    /// `data` is raw bytes; text has to be encoded by the caller:
    ///
    /// ```compile_fail
    /// # async fn write(client: uds_client::UdsClient, loc: uds_client::MemoryLocation) {
    /// let _ = client.write_memory_by_address(loc, "aaa").await;
    /// # }
    /// ```
    pub async fn write_memory_by_address<M>(
        &self,
        location: M,
        data: &[u8],
    ) -> Result<WriteMemoryResponse, UdsError>
    where
        M: TryInto<MemoryLocation>,
        ValidationError: From<M::Error>,
    {
        self.write_memory_by_address_with_timeout(location, data, self.timeout)
            .await
    }

    pub async fn write_memory_by_address_with_timeout<M>(
        &self,
        location: M,
        data: &[u8],
        timeout: Duration,
    ) -> Result<WriteMemoryResponse, UdsError>
    where
        M: TryInto<MemoryLocation>,
        ValidationError: From<M::Error>,
    {
        let mut call = Call::new(self.svc.write_memory_by_address);
        call.enter(CallState::Validating);

        let prepared = location
            .try_into()
            .map_err(ValidationError::from)
            .and_then(|location| {
                Request::write_memory_by_address(self.svc.write_memory_by_address, &location, data)
                .map(|request| (location, request))
            });
        let (location, request) = match prepared {
            Ok(prepared) => prepared,
            Err(err) => return call.finish(Err(err.into())),
        };

        debug!(%location, len = data.len(), "WriteMemoryByAddress");
        let result = self.execute(&mut call, &request, &location, timeout).await;
        call.finish(result)
    }

    /// Write Data By Identifier (0x2E); returns the echoed DID
    pub async fn write_data_by_identifier(
        &self,
        did: u16,
        data: &[u8],
    ) -> Result<u16, UdsError> {
        let mut call = Call::new(self.svc.write_data_by_id);
        call.enter(CallState::Validating);

        let request =
            match Request::write_data_by_identifier(self.svc.write_data_by_id, did, data) {
                Ok(request) => request,
                Err(err) => return call.finish(Err(err.into())),
            };

        let result = self
            .execute(&mut call, &request, &DataIdentifierEcho(did), self.timeout)
            .await;
        call.finish(result)
    }

    /// Tester Present (0x3E)
    ///
    /// With `suppress_response` the request is sent and no response is awaited.
    pub async fn tester_present(&self, suppress_response: bool) -> Result<(), UdsError> {
        let request = Request::tester_present(self.svc.tester_present, suppress_response);
        let mut call = Call::new(self.svc.tester_present);
        call.enter(CallState::Validating);

        if suppress_response {
            let result = {
                let _channel = self.channel.lock().await;
                self.transport
                    .send(&request.to_bytes())
                    .await
                    .map_err(UdsError::from)
            };
            if result.is_ok() {
                call.enter(CallState::Sent);
            }
            return call.finish(result);
        }

        let echo = SubFunctionEcho(tester_present_sub_function::ZERO_SUB_FUNCTION);
        let result = self
            .execute(&mut call, &request, &echo, self.timeout)
            .await;
        call.finish(result)
    }

    async fn execute<E: EchoValidated>(
        &self,
        call: &mut Call,
        request: &Request,
        echo: &E,
        timeout: Duration,
    ) -> Result<E::Echo, UdsError> {
        let payload = self.exchange(call, request, timeout).await?;
        echo.validate_echo(&payload)
    }

    /// Send one request and classify responses until one settles the call
    async fn exchange(
        &self,
        call: &mut Call,
        request: &Request,
        timeout: Duration,
    ) -> Result<Vec<u8>, UdsError> {
        let service_id = request.service_id();
        let bytes = request.to_bytes();

        // Held until the call settles; the channel carries one exchange at a time
        let _channel = self.channel.lock().await;

        self.transport.send(&bytes).await?;
        call.enter(CallState::Sent);
        debug!(request = %hex::encode(&bytes), "UDS request sent");

        let sent_at = Instant::now();
        let limit = sent_at + timeout.max(self.p2_star_timeout);
        let mut deadline = sent_at + timeout;
        loop {
            call.enter(CallState::AwaitingResponse);
            let response = self.receive_until(deadline).await?;
            trace!(response = %hex::encode(&response), "UDS response received");

            call.enter(CallState::Classified);
            match Outcome::classify(&response, service_id, &self.known) {
                Outcome::Negative {
                    nrc: NegativeResponseCode::ResponsePending,
                } => {
                    let now = Instant::now();
                    deadline = (now + self.p2_star_timeout).min(limit);
                    debug!(
                        service = format_args!("0x{:02X}", service_id),
                        remaining_ms = deadline.saturating_duration_since(now).as_millis() as u64,
                        "Response pending, extending deadline"
                    );
                }
                outcome => return outcome.into_result(service_id),
            }
        }
    }

    async fn receive_until(&self, deadline: Instant) -> Result<Vec<u8>, UdsError> {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            return Err(UdsError::Timeout);
        }

        match tokio::time::timeout_at(deadline, self.transport.receive(remaining)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(UdsError::Timeout),
        }
    }
}
