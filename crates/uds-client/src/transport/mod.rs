//! Raw frame transports
//!
//! A transport moves whole UDS PDUs; segmentation and addressing stay below
//! this line. Two adapters ship with the crate:
//! - [`socketcan::SocketCanAdapter`], CAN with ISO-TP (Linux, `socketcan` feature)
//! - [`MockTransportAdapter`], scripted replies for tests
//!
//! ```ignore
//! use uds_client::transport::{create_transport, TransportAdapter};
//! use uds_client::config::TransportConfig;
//!
//! let transport = create_transport(&TransportConfig::Mock(Default::default())).await?;
//! transport.send(&[0x3E, 0x00]).await?;
//! let response = transport.receive(Duration::from_secs(1)).await?;
//! ```

mod adapter;
pub mod error;
pub mod mock;

#[cfg(all(target_os = "linux", feature = "socketcan"))]
pub mod socketcan;

pub use adapter::{AddressInfo, TransportAdapter};
pub use error::TransportError;
pub use mock::{MockReply, MockTransportAdapter};

use std::sync::Arc;

use tracing::info;

use crate::config::TransportConfig;

/// Open the transport described by `config`
pub async fn create_transport(
    config: &TransportConfig,
) -> Result<Arc<dyn TransportAdapter>, TransportError> {
    let transport: Arc<dyn TransportAdapter> = match config {
        #[cfg(all(target_os = "linux", feature = "socketcan"))]
        TransportConfig::SocketCan(cfg) => {
            info!(interface = %cfg.interface, "Opening SocketCAN ISO-TP transport");
            Arc::new(socketcan::SocketCanAdapter::new(cfg).await?)
        }
        #[cfg(not(all(target_os = "linux", feature = "socketcan")))]
        TransportConfig::SocketCan(_) => {
            return Err(TransportError::Unsupported(
                "SocketCAN requires Linux and the 'socketcan' feature".to_string(),
            ))
        }
        TransportConfig::Mock(cfg) => {
            info!(latency_ms = cfg.latency_ms, "Using mock transport");
            Arc::new(MockTransportAdapter::new(cfg))
        }
    };

    let address = transport.address_info();
    info!(
        tx_id = format_args!("0x{:X}", address.tx_id),
        rx_id = format_args!("0x{:X}", address.rx_id),
        "Transport ready"
    );
    Ok(transport)
}
