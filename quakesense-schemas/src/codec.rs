//! Wire codec for raw seismic events
//!
//! ## Formats
//!
//! - **JSON**: what the edge POSTs today. Field names are the serde names of
//!   `RawSeismicEvent`. An emission that carries its motion window is sent
//!   as an [`EventEnvelope`]: the twelve event fields flattened plus
//!   `raw_window`.
//! - **Avro**: compact binary datum against `raw_seismic_event_v1`, for
//!   links where every byte counts. The window is never sent over Avro.
//!
//! Both formats reproduce every field exactly on decode.

use apache_avro::{from_avro_datum, to_avro_datum, types::Value, Schema};
use serde::{Deserialize, Serialize};

use quakesense_core::events::{DeviceId, RawSeismicEvent};
use quakesense_core::window::WindowSample;

use crate::registry::GLOBAL_REGISTRY;
use crate::SchemaError;

/// Registry key of the event schema the codec writes
pub const RAW_EVENT_SCHEMA: &str = "raw_seismic_event_v1";

/// Supported wire formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireFormat {
    /// UTF-8 JSON object
    #[default]
    Json,
    /// Avro binary datum (no container header)
    Avro,
}

impl WireFormat {
    /// HTTP content type for the format
    pub fn content_type(&self) -> &'static str {
        match self {
            WireFormat::Json => "application/json",
            WireFormat::Avro => "avro/binary",
        }
    }
}

/// A raw event plus its optional motion window, as sent over JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// The twelve event fields, flattened
    #[serde(flatten)]
    pub event: RawSeismicEvent,

    /// Dynamic-axis samples around the session, oldest first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_window: Option<Vec<WindowSample>>,
}

impl EventEnvelope {
    /// Envelope without a window
    pub fn bare(event: RawSeismicEvent) -> Self {
        Self { event, raw_window: None }
    }

    /// Envelope with a window; an empty window is sent as absent
    pub fn with_window(event: RawSeismicEvent, window: &[WindowSample]) -> Self {
        Self {
            event,
            raw_window: if window.is_empty() { None } else { Some(window.to_vec()) },
        }
    }
}

/// Encodes and decodes events in one wire format
#[derive(Debug, Clone)]
pub struct EventCodec {
    format: WireFormat,
    schema: Schema,
}

impl EventCodec {
    /// Codec using the globally registered event schema
    pub fn new(format: WireFormat) -> Result<Self, SchemaError> {
        Ok(Self {
            format,
            schema: GLOBAL_REGISTRY.get(RAW_EVENT_SCHEMA)?,
        })
    }

    /// Codec with an explicit Avro schema
    pub fn with_schema(format: WireFormat, schema: Schema) -> Self {
        Self { format, schema }
    }

    /// Format in use
    pub fn format(&self) -> WireFormat {
        self.format
    }

    /// Encode one event
    pub fn encode(&self, event: &RawSeismicEvent) -> Result<Vec<u8>, SchemaError> {
        match self.format {
            WireFormat::Json => serde_json::to_vec(event).map_err(|e| SchemaError::EncodeError(e.to_string())),
            WireFormat::Avro => {
                let value = event_to_avro(event)?;
                to_avro_datum(&self.schema, value).map_err(|e| SchemaError::EncodeError(e.to_string()))
            }
        }
    }

    /// Encode an event with its window
    ///
    /// Avro has no window field; the window is dropped there.
    pub fn encode_envelope(&self, envelope: &EventEnvelope) -> Result<Vec<u8>, SchemaError> {
        match self.format {
            WireFormat::Json => {
                serde_json::to_vec(envelope).map_err(|e| SchemaError::EncodeError(e.to_string()))
            }
            WireFormat::Avro => self.encode(&envelope.event),
        }
    }

    /// Decode one event
    pub fn decode(&self, bytes: &[u8]) -> Result<RawSeismicEvent, SchemaError> {
        match self.format {
            WireFormat::Json => {
                let envelope: EventEnvelope =
                    serde_json::from_slice(bytes).map_err(|e| SchemaError::DecodeError(e.to_string()))?;
                Ok(envelope.event)
            }
            WireFormat::Avro => {
                let mut reader = bytes;
                let value = from_avro_datum(&self.schema, &mut reader, None)
                    .map_err(|e| SchemaError::DecodeError(e.to_string()))?;
                event_from_avro(&value)
            }
        }
    }

    /// Decode an event and, for JSON, its window
    pub fn decode_envelope(&self, bytes: &[u8]) -> Result<EventEnvelope, SchemaError> {
        match self.format {
            WireFormat::Json => serde_json::from_slice(bytes).map_err(|e| SchemaError::DecodeError(e.to_string())),
            WireFormat::Avro => self.decode(bytes).map(EventEnvelope::bare),
        }
    }
}

/// Build the Avro record for an event
pub fn event_to_avro(event: &RawSeismicEvent) -> Result<Value, SchemaError> {
    let timestamp = i64::try_from(event.timestamp)
        .map_err(|_| SchemaError::EncodeError(format!("timestamp {} does not fit an Avro long", event.timestamp)))?;
    let duration = i32::try_from(event.duration_ms)
        .map_err(|_| SchemaError::EncodeError(format!("duration {} does not fit an Avro int", event.duration_ms)))?;

    Ok(Value::Record(vec![
        ("horizontal_accel".to_string(), Value::Float(event.horizontal_accel)),
        ("total_accel".to_string(), Value::Float(event.total_accel)),
        ("vertical_accel".to_string(), Value::Float(event.vertical_accel)),
        ("x_accel".to_string(), Value::Float(event.x_accel)),
        ("y_accel".to_string(), Value::Float(event.y_accel)),
        ("z_accel".to_string(), Value::Float(event.z_accel)),
        (
            "peak_ground_acceleration".to_string(),
            Value::Float(event.peak_ground_acceleration),
        ),
        ("sound_level".to_string(), Value::Int(event.sound_level as i32)),
        ("sound_correlated".to_string(), Value::Boolean(event.sound_correlated)),
        ("duration_ms".to_string(), Value::Int(duration)),
        ("timestamp".to_string(), Value::Long(timestamp)),
        ("device_id".to_string(), Value::String(event.device_id.as_str().to_string())),
    ]))
}

/// Read an event back from its Avro record
pub fn event_from_avro(value: &Value) -> Result<RawSeismicEvent, SchemaError> {
    let fields = match value {
        Value::Record(fields) => fields,
        other => return Err(SchemaError::DecodeError(format!("expected record, got {:?}", other))),
    };

    let field = |name: &str| -> Result<&Value, SchemaError> {
        fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .ok_or_else(|| SchemaError::DecodeError(format!("missing field '{}'", name)))
    };
    let float = |name: &str| -> Result<f32, SchemaError> {
        match field(name)? {
            Value::Float(f) => Ok(*f),
            Value::Double(d) => Ok(*d as f32),
            other => Err(mismatch(name, "float", other)),
        }
    };
    let int = |name: &str| -> Result<i32, SchemaError> {
        match field(name)? {
            Value::Int(i) => Ok(*i),
            other => Err(mismatch(name, "int", other)),
        }
    };

    let sound_level = u16::try_from(int("sound_level")?)
        .map_err(|_| SchemaError::DecodeError("sound_level out of range".to_string()))?;
    let duration_ms = u32::try_from(int("duration_ms")?)
        .map_err(|_| SchemaError::DecodeError("duration_ms out of range".to_string()))?;
    let timestamp = match field("timestamp")? {
        Value::Long(l) => {
            u64::try_from(*l).map_err(|_| SchemaError::DecodeError("timestamp out of range".to_string()))?
        }
        other => return Err(mismatch("timestamp", "long", other)),
    };
    let sound_correlated = match field("sound_correlated")? {
        Value::Boolean(b) => *b,
        other => return Err(mismatch("sound_correlated", "boolean", other)),
    };
    let device_id = match field("device_id")? {
        Value::String(s) => DeviceId::new(s)
            .ok_or_else(|| SchemaError::DecodeError(format!("device_id '{}' too long", s)))?,
        other => return Err(mismatch("device_id", "string", other)),
    };

    Ok(RawSeismicEvent {
        horizontal_accel: float("horizontal_accel")?,
        total_accel: float("total_accel")?,
        vertical_accel: float("vertical_accel")?,
        x_accel: float("x_accel")?,
        y_accel: float("y_accel")?,
        z_accel: float("z_accel")?,
        peak_ground_acceleration: float("peak_ground_acceleration")?,
        sound_level,
        sound_correlated,
        duration_ms,
        timestamp,
        device_id,
    })
}

fn mismatch(field: &str, expected: &str, got: &Value) -> SchemaError {
    SchemaError::DecodeError(format!("field '{}': expected {}, got {:?}", field, expected, got))
}
