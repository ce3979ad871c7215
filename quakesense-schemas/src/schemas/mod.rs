//! QuakeSense Avro schemas
//!
//! Field names match the JSON wire names exactly, so a record can move
//! between the two formats without a mapping table. Units are carried in
//! the field docs.

use apache_avro::Schema;
use serde_json::json;

use crate::SchemaError;

/// Raw seismic event schema v1
///
/// The twelve fields emitted by the edge for one resolved shake session.
pub fn raw_seismic_event_v1() -> Result<Schema, SchemaError> {
    let schema_json = json!({
        "namespace": "io.quakesense.edge.v1",
        "type": "record",
        "name": "RawSeismicEvent",
        "doc": "One resolved shake session as seen by the edge",
        "fields": [
            {
                "name": "horizontal_accel",
                "type": "float",
                "doc": "sqrt(dx^2 + dy^2) at the confirming tick, m/s^2"
            },
            {
                "name": "total_accel",
                "type": "float",
                "doc": "sqrt(dx^2 + dy^2 + dz^2) at the confirming tick, m/s^2"
            },
            {
                "name": "vertical_accel",
                "type": "float",
                "doc": "Dynamic vertical acceleration, m/s^2"
            },
            {"name": "x_accel", "type": "float", "doc": "m/s^2"},
            {"name": "y_accel", "type": "float", "doc": "m/s^2"},
            {"name": "z_accel", "type": "float", "doc": "m/s^2"},
            {
                "name": "peak_ground_acceleration",
                "type": "float",
                "doc": "max(total, horizontal * 1.2), m/s^2"
            },
            {
                "name": "sound_level",
                "type": "int",
                "doc": "Smoothed sound level, ADC counts 0-4095"
            },
            {
                "name": "sound_correlated",
                "type": "boolean",
                "doc": "A sound spike fell inside the correlation window"
            },
            {
                "name": "duration_ms",
                "type": "int",
                "doc": "Session length at resolution"
            },
            {
                "name": "timestamp",
                "type": "long",
                "doc": "Resolution time, device milliseconds"
            },
            {
                "name": "device_id",
                "type": "string",
                "doc": "Emitting device"
            }
        ]
    });

    Schema::parse(&schema_json).map_err(|e| SchemaError::ParseError(e.to_string()))
}

/// Classification result schema v1
pub fn classification_result_v1() -> Result<Schema, SchemaError> {
    let schema_json = json!({
        "namespace": "io.quakesense.server.v1",
        "type": "record",
        "name": "ClassificationResult",
        "doc": "Labeled decision for one raw seismic event",
        "fields": [
            {
                "name": "label",
                "type": {
                    "type": "enum",
                    "name": "Label",
                    "symbols": ["genuine_earthquake", "false_alarm", "uncertain"]
                }
            },
            {
                "name": "confidence",
                "type": "float",
                "doc": "0.0-1.0"
            },
            {
                "name": "reasoning",
                "type": "string"
            },
            {
                "name": "model_version",
                "type": "string"
            }
        ]
    });

    Schema::parse(&schema_json).map_err(|e| SchemaError::ParseError(e.to_string()))
}
