//! Wire Schemas for QuakeSense Events
//!
//! ## Overview
//!
//! This crate is the contract between the edge and the server. It owns:
//!
//! - the Avro schemas (`raw_seismic_event_v1`, `classification_result_v1`)
//! - a thread-safe, versioned [`SchemaRegistry`] with a global default
//!   instance
//! - the JSON and Avro [`EventCodec`] for `RawSeismicEvent`
//! - ingest validation of untrusted JSON ([`validate_ingest`],
//!   [`parse_ingest`])
//!
//! ## Why Avro?
//!
//! The edge POSTs JSON today because it is easy to debug from a serial
//! console. Avro is carried alongside for constrained links:
//!
//! 1. **Compact Binary Format**: a raw event is well under half its JSON size
//! 2. **Schema Evolution**: firmware in the field lags the server by months
//! 3. **Cross-Language Support**: the dashboard and notebooks read the same data
//!
//! ## Schema Evolution Strategy
//!
//! 1. **Always Append**: new fields are added, never removed
//! 2. **Default Values**: old consumers ignore new fields gracefully
//! 3. **Version in Name**: `raw_seismic_event_v1`, `raw_seismic_event_v2`
//!
//! The JSON ingest path follows the same rule: the six fields every firmware
//! has ever sent are required, everything else defaults to zero.
//!
//! ## Usage Example
//!
//! ```rust
//! use quakesense_schemas::{EventCodec, WireFormat, GLOBAL_REGISTRY};
//! use quakesense_core::events::{DeviceId, RawSeismicEventBuilder};
//!
//! let schema = GLOBAL_REGISTRY.get_latest("raw_seismic_event")?;
//! assert_eq!(schema.name().unwrap().name, "RawSeismicEvent");
//!
//! let event = RawSeismicEventBuilder::new(DeviceId::new("hall-2").unwrap(), 42)
//!     .axes(0.9, 0.4, 0.1)
//!     .duration_ms(260)
//!     .build();
//!
//! let codec = EventCodec::new(WireFormat::Avro)?;
//! let bytes = codec.encode(&event)?;
//! assert_eq!(codec.decode(&bytes)?, event);
//! # Ok::<(), quakesense_schemas::SchemaError>(())
//! ```

pub mod codec;
pub mod registry;
pub mod schemas;
pub mod validation;

pub use codec::{EventCodec, EventEnvelope, WireFormat};
pub use registry::{SchemaMetadata, SchemaRegistry, GLOBAL_REGISTRY};
pub use validation::{parse_ingest, validate_ingest, IssueType, ValidationIssue, ValidationReport};

/// Schema-related errors
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// Schema JSON did not parse
    #[error("Failed to parse schema: {0}")]
    ParseError(String),

    /// No schema under that name
    #[error("Schema not found: {0}")]
    NotFound(String),

    /// Registration or decoding precondition failed
    #[error("Validation failed: {0}")]
    ValidationError(String),

    /// Event could not be written in the wire format
    #[error("Encode failed: {0}")]
    EncodeError(String),

    /// Bytes did not decode to an event
    #[error("Decode failed: {0}")]
    DecodeError(String),

    /// A thread panicked while holding the registry lock
    #[error("Schema registry lock poisoned")]
    LockPoisoned,

    /// Ingested event failed validation
    #[error("Event rejected: {}", .0.summary())]
    Rejected(ValidationReport),
}
