//! uds-client - echo-validated UDS request/response engine
//!
//! This crate sends ISO 14229 (UDS) requests over a pluggable transport and
//! confirms that positive responses echo the request parameters back.
//! WriteMemoryByAddress (0x3D) is the reference service.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      UdsClient                              │
//! │  One request in flight per client                           │
//! │                                                             │
//! │  ┌──────────────┐  ┌─────────────┐  ┌───────────────────┐   │
//! │  │MemoryLocation│  │  Outcome    │  │  EchoValidated    │   │
//! │  │(ALFID codec) │  │ (classify)  │  │ (echo compare)    │   │
//! │  └──────────────┘  └─────────────┘  └───────────────────┘   │
//! │                          │                                  │
//! │                 ┌────────┴────────┐                         │
//! │                 │TransportAdapter │                         │
//! │                 │(SocketCAN/Mock) │                         │
//! │                 └─────────────────┘                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use uds_client::{create_transport, ClientConfig, UdsClient};
//!
//! let config = ClientConfig::load("uds-client.toml")?;
//! let transport = create_transport(&config.transport).await?;
//! let client = UdsClient::from_config(transport, &config);
//!
//! let location = client.memory_location(0x1234, 4)?;
//! client.write_memory_by_address(location, &[0x66, 0x77, 0x88, 0x99]).await?;
//! ```

pub mod config;
pub mod error;
pub mod transport;
pub mod uds;

pub use config::{ClientConfig, ServiceOverrides, TransportConfig};
pub use error::ConfigError;
pub use transport::{create_transport, MockTransportAdapter, TransportAdapter, TransportError};
pub use uds::{
    CallState, EchoField, EchoValidated, FieldFormat, InvalidReason, MemoryLocation,
    NegativeResponseCode, Outcome, Request, ServiceIds, UdsClient, UdsError, UnexpectedResponse,
    ValidationError, WriteMemoryResponse,
};
