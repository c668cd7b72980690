//! UDS client configuration
//!
//! This module contains configuration types for the client, including
//! timing, transport, default memory field formats and service-id overrides.
//!
//! ```toml
//! request_timeout_ms = 1000
//! p2_star_timeout_ms = 5000
//! default_address_format = 32
//! extra_services = [0xBA]
//!
//! [service_overrides]
//! write_memory_by_address = 0xBD
//!
//! [transport]
//! type = "socketcan"
//! interface = "can0"
//!
//! [transport.isotp]
//! tx_id = "0x18DA00F1"
//! rx_id = "0x18DAF100"
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::uds::FieldFormat;

/// Configuration for a UDS client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Time to wait for the response to a request, in milliseconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
    /// Extended wait after a responsePending (0x78) NRC, in milliseconds
    #[serde(default = "default_p2_star_timeout")]
    pub p2_star_timeout_ms: u64,
    /// Address format used when a location is built without one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_address_format: Option<FieldFormat>,
    /// Size format used when a location is built without one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_size_format: Option<FieldFormat>,
    /// Service ID overrides for OEM variants
    #[serde(default)]
    pub service_overrides: ServiceOverrides,
    /// Additional request service ids to recognise in responses
    #[serde(default)]
    pub extra_services: Vec<u8>,
    /// Transport configuration
    #[serde(default)]
    pub transport: TransportConfig,
}

fn default_request_timeout() -> u64 {
    1000
}

fn default_p2_star_timeout() -> u64 {
    5000
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout(),
            p2_star_timeout_ms: default_p2_star_timeout(),
            default_address_format: None,
            default_size_format: None,
            service_overrides: ServiceOverrides::default(),
            extra_services: Vec::new(),
            transport: TransportConfig::default(),
        }
    }
}

impl ClientConfig {
    /// Parse a TOML document
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.p2_star_timeout_ms < self.request_timeout_ms {
            return Err(ConfigError::Invalid(format!(
                "p2_star_timeout_ms ({}) must not be shorter than request_timeout_ms ({})",
                self.p2_star_timeout_ms, self.request_timeout_ms
            )));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn p2_star_timeout(&self) -> Duration {
        Duration::from_millis(self.p2_star_timeout_ms)
    }
}

/// OEM-specific service ID overrides
///
/// Some manufacturers remap standard services; the overridden ids are used
/// for requests and added to the set of recognised services.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_memory_by_address: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub write_data_by_id: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tester_present: Option<u8>,
}

// =============================================================================
// Transport Configuration
// =============================================================================

/// Transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    /// SocketCAN with ISO-TP (Linux only)
    SocketCan(SocketCanConfig),
    /// Mock transport for testing
    Mock(MockConfig),
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self::Mock(MockConfig::default())
    }
}

/// SocketCAN configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocketCanConfig {
    /// CAN interface name (e.g., "can0")
    pub interface: String,
    /// ISO-TP configuration
    pub isotp: IsoTpConfig,
}

/// ISO-TP addressing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IsoTpConfig {
    /// Transmit CAN ID (tester -> ECU)
    pub tx_id: String,
    /// Receive CAN ID (ECU -> tester)
    pub rx_id: String,
}

/// Mock transport configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MockConfig {
    /// Simulated latency in milliseconds
    #[serde(default)]
    pub latency_ms: u64,
}
