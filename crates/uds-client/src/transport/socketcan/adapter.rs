//! SocketCAN adapter using ISO-TP for UDS communication

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use socketcan::ExtendedId;
use socketcan_isotp::IsoTpSocket;
use tokio::sync::mpsc;

use crate::config::SocketCanConfig;
use crate::transport::{AddressInfo, TransportAdapter, TransportError};

/// SocketCAN adapter using ISO-TP for UDS communication
///
/// A blocking listener task drains the ISO-TP socket into a channel; `receive`
/// awaits that channel with a deadline.
pub struct SocketCanAdapter {
    socket: Arc<Mutex<IsoTpSocket>>,
    address_info: AddressInfo,
    running: Arc<AtomicBool>,
    incoming: tokio::sync::Mutex<mpsc::UnboundedReceiver<Vec<u8>>>,
}

impl SocketCanAdapter {
    pub async fn new(config: &SocketCanConfig) -> Result<Self, TransportError> {
        let tx_id = parse_can_id(&config.isotp.tx_id)?;
        let rx_id = parse_can_id(&config.isotp.rx_id)?;

        let mut socket = Self::create_socket(config, tx_id, rx_id)?;

        // Drain any stale data from previous sessions/processes
        Self::drain_socket(&mut socket);

        let (incoming_tx, incoming_rx) = mpsc::unbounded_channel();

        let adapter = Self {
            socket: Arc::new(Mutex::new(socket)),
            address_info: AddressInfo { tx_id, rx_id },
            running: Arc::new(AtomicBool::new(true)),
            incoming: tokio::sync::Mutex::new(incoming_rx),
        };

        adapter.start_listener(incoming_tx);

        Ok(adapter)
    }

    fn drain_socket(socket: &mut IsoTpSocket) {
        while let Ok(data) = socket.read() {
            if data.is_empty() {
                break;
            }
            tracing::debug!(data = %hex::encode(data), "Drained stale message from socket");
        }
    }

    fn create_socket(
        config: &SocketCanConfig,
        tx_id: u32,
        rx_id: u32,
    ) -> Result<IsoTpSocket, TransportError> {
        // 29-bit CAN IDs
        let ext_rx_id = ExtendedId::new(rx_id).ok_or_else(|| {
            TransportError::InvalidConfig(format!("Invalid extended CAN ID: 0x{:X}", rx_id))
        })?;
        let ext_tx_id = ExtendedId::new(tx_id).ok_or_else(|| {
            TransportError::InvalidConfig(format!("Invalid extended CAN ID: 0x{:X}", tx_id))
        })?;

        let socket = IsoTpSocket::open(&config.interface, ext_rx_id, ext_tx_id).map_err(|e| {
            TransportError::ConnectionFailed(format!("Failed to open ISO-TP socket: {}", e))
        })?;

        socket.set_nonblocking(true).map_err(|e| {
            TransportError::InvalidConfig(format!("Failed to set non-blocking: {}", e))
        })?;

        Ok(socket)
    }

    fn start_listener(&self, incoming_tx: mpsc::UnboundedSender<Vec<u8>>) {
        let socket = self.socket.clone();
        let running = self.running.clone();

        tokio::task::spawn_blocking(move || {
            while running.load(Ordering::SeqCst) {
                let frame = {
                    let mut socket_guard = socket.lock();
                    match socket_guard.read() {
                        Ok(data) if !data.is_empty() => Some(Ok(data.to_vec())),
                        Ok(_) => None,
                        Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => None,
                        Err(e) => Some(Err(e)),
                    }
                };

                match frame {
                    Some(Ok(data)) => {
                        tracing::trace!(data = %hex::encode(&data), "Incoming message received");
                        if incoming_tx.send(data).is_err() {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        tracing::error!(?e, "SocketCAN read error");
                        std::thread::sleep(Duration::from_millis(100));
                    }
                    None => std::thread::sleep(Duration::from_millis(1)),
                }
            }
            tracing::debug!("SocketCAN listener stopped");
        });
    }
}

#[async_trait]
impl TransportAdapter for SocketCanAdapter {
    async fn send(&self, request: &[u8]) -> Result<(), TransportError> {
        if !self.running.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionClosed);
        }

        // Frames still buffered belong to an abandoned exchange
        {
            let mut incoming = self.incoming.lock().await;
            while let Ok(stale) = incoming.try_recv() {
                tracing::debug!(data = %hex::encode(&stale), "Discarding late response");
            }
        }

        let socket = self.socket.clone();
        let request = request.to_vec();

        tokio::task::spawn_blocking(move || {
            let socket_guard = socket.lock();
            socket_guard
                .write(&request)
                .map_err(|e| TransportError::SendFailed(e.to_string()))
        })
        .await
        .map_err(|e| TransportError::SendFailed(format!("Task join error: {}", e)))??;

        Ok(())
    }

    async fn receive(&self, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        let mut incoming = self.incoming.lock().await;

        match tokio::time::timeout(timeout, incoming.recv()).await {
            Ok(Some(data)) => Ok(data),
            Ok(None) => Err(TransportError::ReceiveFailed(
                "SocketCAN listener stopped".to_string(),
            )),
            Err(_) => Err(TransportError::Timeout(timeout)),
        }
    }

    fn address_info(&self) -> AddressInfo {
        self.address_info.clone()
    }
}

impl Drop for SocketCanAdapter {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

/// Parse a CAN ID from string (supports hex with 0x prefix)
fn parse_can_id(s: &str) -> Result<u32, TransportError> {
    let s = s.trim();
    let (digits, radix) = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(rest) => (rest, 16),
        None => (s, 10),
    };

    u32::from_str_radix(digits, radix)
        .map_err(|e| TransportError::InvalidConfig(format!("Invalid CAN ID '{}': {}", s, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_can_id() {
        assert_eq!(parse_can_id("0x7E0").unwrap(), 0x7E0);
        assert_eq!(parse_can_id(" 0X18DA00F1 ").unwrap(), 0x18DA_00F1);
        assert_eq!(parse_can_id("2016").unwrap(), 2016);
        assert!(matches!(
            parse_can_id("0xZZ"),
            Err(TransportError::InvalidConfig(_))
        ));
    }
}
