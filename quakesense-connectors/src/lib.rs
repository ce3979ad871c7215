//! Transport Connectors for Edge-to-Server Delivery
//!
//! ## Overview
//!
//! An edge device resolves a shake session into one `RawSeismicEvent` and
//! hands it to an [`EventPublisher`]. The publisher encodes the event with
//! the wire codec from `quakesense-schemas` and pushes the bytes through a
//! [`Connector`]:
//!
//! ```text
//! Emission ─▶ EventPublisher ─▶ EventCodec (JSON | Avro) ─▶ Connector ─▶ server
//!                  │
//!                  └─ on failure: DeliveryPolicy
//!                       DropOnFailure            log, count, forget
//!                       BoundedRetry{capacity}   keep the newest N, retry on flush
//! ```
//!
//! ## Connectors
//!
//! | Connector           | Transport                        | Feature |
//! |---------------------|----------------------------------|---------|
//! | [`HttpConnector`]   | JSON/Avro `POST` via `ureq`      | `http`  |
//! | [`MemoryConnector`] | in-process queue, for tests/sims | always  |
//!
//! ## Delivery Guarantees
//!
//! None beyond best effort. The default policy drops an event whose send
//! fails, after logging it. The bounded retry buffer trades a little memory
//! for surviving short outages; once it is full the oldest failure is
//! discarded, and a flush makes exactly one pass, so nothing is retried
//! forever.
//!
//! ## Sync and Async
//!
//! [`Connector`] is the blocking interface used by the single-threaded edge
//! loop. [`AsyncConnector`] serves gateways running on `tokio`; the HTTP
//! implementation retries there with exponential backoff.
//!
//! ## Example Usage
//!
//! ```no_run
//! use quakesense_connectors::{DeliveryPolicy, EventPublisher, HttpConfig, HttpConnector};
//! use quakesense_schemas::{EventCodec, WireFormat};
//!
//! # fn example(emission: &quakesense_core::Emission) -> Result<(), Box<dyn std::error::Error>> {
//! let http = HttpConnector::new(HttpConfig::new("http://192.168.1.20:5000").timeout_ms(2_000))?;
//! let codec = EventCodec::new(WireFormat::Json)?;
//! let mut publisher = EventPublisher::new(http, codec, DeliveryPolicy::BoundedRetry { capacity: 8 })?;
//!
//! publisher.publish(emission)?;
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

#[cfg(feature = "http")]
pub mod http;
pub mod memory;
pub mod publisher;

#[cfg(feature = "http")]
pub use http::{AuthMethod, HttpConfig, HttpConnector, HttpError};
pub use memory::{MemoryConnector, MemoryHandle, SentMessage};
pub use publisher::{DeliveryPolicy, Delivery, EventPublisher, PublisherStats};

use thiserror::Error;

/// Path the server accepts events on
pub const SEISMIC_EVENT_PATH: &str = "/api/seismic-event";

/// Common connector errors
#[derive(Debug, Error)]
pub enum ConnectorError {
    /// Transport is down
    #[error("Not connected")]
    NotConnected,

    /// Transport did not answer in time
    #[error("Timeout")]
    Timeout,

    /// Peer rejected or garbled the message
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    /// Invalid settings
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Event could not be encoded
    #[error("Encoding error: {0}")]
    Encode(#[from] quakesense_schemas::SchemaError),

    /// HTTP transport failure
    #[cfg(feature = "http")]
    #[error(transparent)]
    Http(#[from] HttpError),
}

/// Trait for all transport connectors
pub trait Connector {
    /// Transport error
    type Error: std::fmt::Display;

    /// Send one message
    fn send(&mut self, topic: &str, data: &[u8]) -> Result<(), Self::Error>;

    /// Send one message, telling the transport its content type
    ///
    /// Transports without a notion of content type ignore it.
    fn send_typed(&mut self, topic: &str, data: &[u8], content_type: &str) -> Result<(), Self::Error> {
        let _ = content_type;
        self.send(topic, data)
    }

    /// Check if connected
    fn is_connected(&self) -> bool;
}

/// Async version of the Connector trait
#[async_trait::async_trait]
pub trait AsyncConnector: Send {
    /// Transport error
    type Error;

    /// Send one message asynchronously
    async fn send(&mut self, topic: &str, data: &[u8]) -> Result<(), Self::Error>;

    /// Send one message asynchronously, telling the transport its content type
    ///
    /// Transports without a notion of content type ignore it.
    async fn send_typed(&mut self, topic: &str, data: &[u8], content_type: &str) -> Result<(), Self::Error> {
        let _ = content_type;
        self.send(topic, data).await
    }

    /// Check if connected
    fn is_connected(&self) -> bool;

    /// Get connection statistics
    fn stats(&self) -> ConnectionStats;
}

/// Connection statistics common to all connectors
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Total messages sent successfully
    pub messages_sent: u64,
    /// Total messages failed to send
    pub messages_failed: u64,
    /// Total bytes sent
    pub bytes_sent: u64,
    /// Attempts beyond the first
    pub retries: u64,
    /// Last error message
    pub last_error: Option<String>,
}

impl ConnectionStats {
    fn record_sent(&mut self, bytes: usize) {
        self.messages_sent += 1;
        self.bytes_sent += bytes as u64;
    }

    fn record_failed(&mut self, error: impl ToString) {
        self.messages_failed += 1;
        self.last_error = Some(error.to_string());
    }
}
