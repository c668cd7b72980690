//! Mock transport adapter for testing
//!
//! Replies are scripted up front, either as a FIFO queue or as
//! request-prefix mappings, and every sent frame is recorded so tests can
//! assert exactly what reached the wire.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};

use super::{AddressInfo, TransportAdapter, TransportError};
use crate::config::MockConfig;

/// One scripted reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    /// Deliver these bytes
    Respond(Vec<u8>),
    /// Deliver nothing; the receive times out
    Silence,
}

/// Mock transport adapter for testing
pub struct MockTransportAdapter {
    config: MockConfig,
    connected: AtomicBool,
    /// Replies waiting to be received, in order
    inbox: Mutex<VecDeque<MockReply>>,
    /// Request prefix -> reply, queued when a matching request is sent
    responses: RwLock<Vec<(Vec<u8>, Vec<u8>)>>,
    sent: Mutex<Vec<Vec<u8>>>,
    receive_calls: AtomicUsize,
}

impl MockTransportAdapter {
    pub fn new(config: &MockConfig) -> Self {
        Self {
            config: config.clone(),
            connected: AtomicBool::new(true),
            inbox: Mutex::new(VecDeque::new()),
            responses: RwLock::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            receive_calls: AtomicUsize::new(0),
        }
    }

    /// Queue a reply for the next receive
    pub fn push_response(&self, response: impl Into<Vec<u8>>) {
        self.inbox.lock().push_back(MockReply::Respond(response.into()));
    }

    /// Queue a receive that times out
    pub fn push_silence(&self) {
        self.inbox.lock().push_back(MockReply::Silence);
    }

    /// Reply with `response` whenever a request starting with `request` is sent
    pub fn add_response(&self, request: Vec<u8>, response: Vec<u8>) {
        self.responses.write().push((request, response));
    }

    /// Set connection state
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Every frame sent so far
    pub fn sent(&self) -> Vec<Vec<u8>> {
        self.sent.lock().clone()
    }

    pub fn send_count(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn receive_count(&self) -> usize {
        self.receive_calls.load(Ordering::SeqCst)
    }

    /// Replies still queued
    pub fn pending_replies(&self) -> usize {
        self.inbox.lock().len()
    }

    fn find_response(&self, request: &[u8]) -> Option<Vec<u8>> {
        let responses = self.responses.read();

        // Exact match first, then prefix match for variable-length requests
        responses
            .iter()
            .find(|(req, _)| req == request)
            .or_else(|| responses.iter().find(|(req, _)| request.starts_with(req)))
            .map(|(_, resp)| resp.clone())
    }

    async fn simulate_latency(&self) {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }
    }
}

#[async_trait]
impl TransportAdapter for MockTransportAdapter {
    async fn send(&self, request: &[u8]) -> Result<(), TransportError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionClosed);
        }

        self.simulate_latency().await;

        tracing::debug!(request = %hex::encode(request), "Mock transport: sent message");
        self.sent.lock().push(request.to_vec());

        if let Some(response) = self.find_response(request) {
            self.inbox.lock().push_back(MockReply::Respond(response));
        }
        Ok(())
    }

    async fn receive(&self, timeout: Duration) -> Result<Vec<u8>, TransportError> {
        self.receive_calls.fetch_add(1, Ordering::SeqCst);

        if !self.connected.load(Ordering::SeqCst) {
            return Err(TransportError::ConnectionClosed);
        }

        let reply = self.inbox.lock().pop_front();
        match reply {
            Some(MockReply::Respond(data)) => {
                self.simulate_latency().await;
                Ok(data)
            }
            Some(MockReply::Silence) | None => {
                tokio::time::sleep(timeout).await;
                Err(TransportError::Timeout(timeout))
            }
        }
    }

    fn address_info(&self) -> AddressInfo {
        AddressInfo {
            tx_id: 0x7E0,
            rx_id: 0x7E8,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queued_replies_in_order() {
        let mock = MockTransportAdapter::new(&MockConfig::default());
        mock.push_response(vec![0x7E, 0x00]);
        mock.push_response(vec![0x50, 0x01]);

        mock.send(&[0x3E, 0x00]).await.unwrap();
        let timeout = Duration::from_millis(10);
        assert_eq!(mock.receive(timeout).await.unwrap(), vec![0x7E, 0x00]);
        assert_eq!(mock.receive(timeout).await.unwrap(), vec![0x50, 0x01]);
        assert_eq!(mock.sent(), vec![vec![0x3E, 0x00]]);
        assert_eq!(mock.receive_count(), 2);
    }

    #[tokio::test]
    async fn test_mapped_reply_queued_on_send() {
        let mock = MockTransportAdapter::new(&MockConfig::default());
        mock.add_response(vec![0x2E, 0xF1, 0x90], vec![0x6E, 0xF1, 0x90]);

        mock.send(&[0x2E, 0xF1, 0x90, 0x41]).await.unwrap();
        assert_eq!(mock.pending_replies(), 1);
        let response = mock.receive(Duration::from_millis(10)).await.unwrap();
        assert_eq!(response, vec![0x6E, 0xF1, 0x90]);
    }

    #[tokio::test]
    async fn test_silence_times_out() {
        let mock = MockTransportAdapter::new(&MockConfig::default());
        mock.push_silence();

        let err = mock.receive(Duration::from_millis(5)).await.unwrap_err();
        assert_eq!(err, TransportError::Timeout(Duration::from_millis(5)));

        // Empty queue behaves like silence
        let err = mock.receive(Duration::from_millis(5)).await.unwrap_err();
        assert!(err.is_timeout());
    }

    #[tokio::test]
    async fn test_disconnected() {
        let mock = MockTransportAdapter::new(&MockConfig::default());
        mock.set_connected(false);

        assert_eq!(
            mock.send(&[0x3E, 0x00]).await,
            Err(TransportError::ConnectionClosed)
        );
        assert_eq!(mock.send_count(), 0);
    }
}
