//! In-memory connector
//!
//! Records every message instead of sending it. Used by simulations and
//! tests; the [`MemoryHandle`] can make upcoming sends fail or take the
//! link down to exercise the delivery policy.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::{AsyncConnector, ConnectionStats, Connector, ConnectorError};

/// One recorded message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    /// Topic or path
    pub topic: String,
    /// Payload
    pub data: Vec<u8>,
    /// Content type given by the sender
    pub content_type: Option<String>,
}

#[derive(Debug, Default)]
struct Shared {
    sent: Mutex<Vec<SentMessage>>,
    stats: Mutex<ConnectionStats>,
    fail_next: AtomicUsize,
    offline: AtomicBool,
}

impl Shared {
    fn sent(&self) -> MutexGuard<'_, Vec<SentMessage>> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn stats(&self) -> MutexGuard<'_, ConnectionStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Connector that keeps messages in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    shared: Arc<Shared>,
}

/// Inspection and fault injection for a [`MemoryConnector`]
#[derive(Debug, Clone)]
pub struct MemoryHandle {
    shared: Arc<Shared>,
}

impl MemoryConnector {
    /// Connector plus its handle
    pub fn new() -> (Self, MemoryHandle) {
        let connector = Self::default();
        let handle = MemoryHandle {
            shared: Arc::clone(&connector.shared),
        };
        (connector, handle)
    }

    fn deliver(&self, topic: &str, data: &[u8], content_type: Option<&str>) -> Result<(), ConnectorError> {
        if self.shared.offline.load(Ordering::SeqCst) {
            self.shared.stats().record_failed(ConnectorError::NotConnected);
            return Err(ConnectorError::NotConnected);
        }

        let injected = self
            .shared
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            let err = ConnectorError::ProtocolError("injected failure".into());
            self.shared.stats().record_failed(&err);
            return Err(err);
        }

        self.shared.sent().push(SentMessage {
            topic: topic.to_string(),
            data: data.to_vec(),
            content_type: content_type.map(str::to_string),
        });
        self.shared.stats().record_sent(data.len());
        Ok(())
    }
}

impl MemoryHandle {
    /// Messages recorded so far
    pub fn sent(&self) -> Vec<SentMessage> {
        self.shared.sent().clone()
    }

    /// Remove and return the recorded messages
    pub fn take(&self) -> Vec<SentMessage> {
        std::mem::take(&mut *self.shared.sent())
    }

    /// Make the next `n` sends fail
    pub fn fail_next(&self, n: usize) {
        self.shared.fail_next.store(n, Ordering::SeqCst);
    }

    /// Take the link down or bring it back
    pub fn set_offline(&self, offline: bool) {
        self.shared.offline.store(offline, Ordering::SeqCst);
    }

    /// Counters
    pub fn stats(&self) -> ConnectionStats {
        self.shared.stats().clone()
    }
}

impl Connector for MemoryConnector {
    type Error = ConnectorError;

    fn send(&mut self, topic: &str, data: &[u8]) -> Result<(), Self::Error> {
        self.deliver(topic, data, None)
    }

    fn send_typed(&mut self, topic: &str, data: &[u8], content_type: &str) -> Result<(), Self::Error> {
        self.deliver(topic, data, Some(content_type))
    }

    fn is_connected(&self) -> bool {
        !self.shared.offline.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AsyncConnector for MemoryConnector {
    type Error = ConnectorError;

    async fn send(&mut self, topic: &str, data: &[u8]) -> Result<(), Self::Error> {
        self.deliver(topic, data, None)
    }

    async fn send_typed(&mut self, topic: &str, data: &[u8], content_type: &str) -> Result<(), Self::Error> {
        self.deliver(topic, data, Some(content_type))
    }

    fn is_connected(&self) -> bool {
        !self.shared.offline.load(Ordering::SeqCst)
    }

    fn stats(&self) -> ConnectionStats {
        self.shared.stats().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_messages() {
        let (mut c, handle) = MemoryConnector::new();
        Connector::send(&mut c, "/a", b"one").unwrap();
        Connector::send_typed(&mut c, "/b", b"two", "application/json").unwrap();

        let sent = handle.sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].topic, "/a");
        assert_eq!(sent[1].content_type.as_deref(), Some("application/json"));
        assert_eq!(handle.stats().bytes_sent, 6);

        assert_eq!(handle.take().len(), 2);
        assert!(handle.sent().is_empty());
    }

    #[test]
    fn injected_failures_are_counted_down() {
        let (mut c, handle) = MemoryConnector::new();
        handle.fail_next(2);

        assert!(Connector::send(&mut c, "/a", b"1").is_err());
        assert!(Connector::send(&mut c, "/a", b"2").is_err());
        assert!(Connector::send(&mut c, "/a", b"3").is_ok());
        assert_eq!(handle.stats().messages_failed, 2);
        assert_eq!(handle.sent().len(), 1);
    }

    #[test]
    fn offline_link_rejects() {
        let (mut c, handle) = MemoryConnector::new();
        handle.set_offline(true);
        assert!(!Connector::is_connected(&c));
        assert!(matches!(Connector::send(&mut c, "/a", b"x"), Err(ConnectorError::NotConnected)));

        handle.set_offline(false);
        assert!(Connector::send(&mut c, "/a", b"x").is_ok());
    }

    #[tokio::test]
    async fn async_path_shares_state() {
        let (mut c, handle) = MemoryConnector::new();
        AsyncConnector::send(&mut c, "/async", b"payload").await.unwrap();
        assert_eq!(AsyncConnector::stats(&c).messages_sent, 1);
        assert_eq!(handle.sent()[0].topic, "/async");
        assert_eq!(handle.sent()[0].content_type, None);
    }

    #[tokio::test]
    async fn async_typed_send_records_content_type() {
        let (mut c, handle) = MemoryConnector::new();
        AsyncConnector::send_typed(&mut c, "/async", b"\x02\x04", "avro/binary").await.unwrap();
        assert_eq!(handle.sent()[0].content_type.as_deref(), Some("avro/binary"));
    }
}
