//! Ingest Validation
//!
//! The server does not trust what arrives on `/api/seismic-event`. Before an
//! event reaches the feature extractor the raw JSON object is checked here:
//!
//! - every required field is present (all missing ones are reported
//!   together, not just the first)
//! - numbers are numbers, flags are booleans, the device id is a string
//! - accelerations are finite and non-negative (they are magnitudes)
//! - the sound level fits the 12-bit ADC range
//! - an attached `raw_window` fits the recorder capacity, carries finite
//!   non-negative axes and never goes back in time
//!
//! Optional fields (`vertical_accel`, the three axes, PGA, `duration_ms`)
//! are derived from the required ones when absent, so older firmware that
//! sends fewer fields is still accepted and the extractor never sees a
//! zero vertical component next to a large total.

use serde_json::{Map, Value};

use quakesense_core::constants::detection::PGA_HORIZONTAL_FACTOR;
use quakesense_core::constants::sensors::{SOUND_ADC_MAX, WINDOW_CAPACITY};
use quakesense_core::events::{peak_ground_acceleration, DeviceId, RawSeismicEvent};

use crate::codec::EventEnvelope;
use crate::SchemaError;

/// Fields an ingested event must carry
pub const REQUIRED_FIELDS: [&str; 6] = [
    "horizontal_accel",
    "total_accel",
    "sound_level",
    "sound_correlated",
    "timestamp",
    "device_id",
];

/// Acceleration fields checked for finiteness and sign
const ACCEL_FIELDS: [&str; 7] = [
    "horizontal_accel",
    "total_accel",
    "vertical_accel",
    "x_accel",
    "y_accel",
    "z_accel",
    "peak_ground_acceleration",
];

/// Everything wrong with one ingested object
#[derive(Debug, Default, Clone)]
pub struct ValidationReport {
    /// Problems that reject the event
    pub errors: Vec<ValidationIssue>,

    /// Accepted but suspicious
    pub warnings: Vec<ValidationIssue>,

    /// Notes, such as ignored unknown fields
    pub info: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Report with no issues
    pub fn new() -> Self {
        Self::default()
    }

    /// No rejecting issue was found
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, issue: ValidationIssue) {
        self.errors.push(issue);
    }

    /// Add a warning
    pub fn add_warning(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }

    /// Add info
    pub fn add_info(&mut self, issue: ValidationIssue) {
        self.info.push(issue);
    }

    /// Issues of any severity
    pub fn total_issues(&self) -> usize {
        self.errors.len() + self.warnings.len() + self.info.len()
    }

    /// Names of the missing required fields, in declaration order
    pub fn missing_fields(&self) -> Vec<&str> {
        self.errors
            .iter()
            .filter(|e| e.issue_type == IssueType::MissingField)
            .filter_map(|e| e.field.as_deref())
            .collect()
    }

    /// One-line summary of the errors
    pub fn summary(&self) -> String {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return format!("Missing required fields: {}", missing.join(", "));
        }
        self.errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// One finding
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    /// Type of issue
    pub issue_type: IssueType,

    /// Offending field, `None` for whole-object problems
    pub field: Option<String>,

    /// Text suitable for the 400 response body
    pub message: String,

    /// Issue severity
    pub severity: Severity,
}

impl ValidationIssue {
    fn error(issue_type: IssueType, field: &str, message: String) -> Self {
        Self {
            issue_type,
            field: Some(field.to_string()),
            message,
            severity: Severity::Error,
        }
    }
}

/// What kind of problem a finding is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueType {
    /// A required field is absent or null
    MissingField,

    /// Type doesn't match the wire format
    TypeMismatch,

    /// Value is impossible for the quantity (NaN, negative magnitude)
    PhysicsViolation,

    /// Value is outside the sensor's range
    OutOfRange,

    /// Field the ingest endpoint does not know
    UnknownField,
}

/// Issue severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational only
    Info,

    /// Should be reviewed
    Warning,

    /// Must be fixed
    Error,
}

/// Check one ingested JSON object
pub fn validate_ingest(value: &Value) -> ValidationReport {
    let mut report = ValidationReport::new();

    let object = match value {
        Value::Object(object) => object,
        _ => {
            report.add_error(ValidationIssue {
                issue_type: IssueType::TypeMismatch,
                field: None,
                message: "Expected a JSON object".to_string(),
                severity: Severity::Error,
            });
            return report;
        }
    };

    for name in REQUIRED_FIELDS {
        if !object.contains_key(name) {
            report.add_error(ValidationIssue::error(
                IssueType::MissingField,
                name,
                format!("Required field '{}' is missing", name),
            ));
        }
    }

    for name in ACCEL_FIELDS {
        check_accel(object, name, &mut report);
    }
    check_sound(object, &mut report);
    check_unsigned(object, "timestamp", u64::MAX, &mut report);
    check_unsigned(object, "duration_ms", u32::MAX as u64, &mut report);
    check_window(object, &mut report);

    if let Some(v) = object.get("sound_correlated") {
        if !v.is_boolean() {
            report.add_error(ValidationIssue::error(
                IssueType::TypeMismatch,
                "sound_correlated",
                "Field 'sound_correlated' must be a boolean".to_string(),
            ));
        }
    }

    if let Some(v) = object.get("device_id") {
        match v.as_str() {
            Some(id) if DeviceId::new(id).is_some() => {}
            Some(id) => report.add_error(ValidationIssue::error(
                IssueType::OutOfRange,
                "device_id",
                format!("Device id '{}' is longer than {} bytes", id, quakesense_core::constants::sensors::MAX_DEVICE_ID_LEN),
            )),
            None => report.add_error(ValidationIssue::error(
                IssueType::TypeMismatch,
                "device_id",
                "Field 'device_id' must be a string".to_string(),
            )),
        }
    }

    for name in object.keys() {
        if name != "raw_window" && !ACCEL_FIELDS.contains(&name.as_str()) && !is_known_scalar(name) {
            report.add_info(ValidationIssue {
                issue_type: IssueType::UnknownField,
                field: Some(name.clone()),
                message: format!("Ignoring unknown field '{}'", name),
                severity: Severity::Info,
            });
        }
    }

    report
}

/// Validate and decode an ingested JSON object
///
/// Returns `SchemaError::Rejected` with the full report when any error is
/// found. An optional `raw_window` array is decoded alongside.
pub fn parse_ingest(value: &Value) -> Result<EventEnvelope, SchemaError> {
    let report = validate_ingest(value);
    if !report.is_valid() {
        return Err(SchemaError::Rejected(report));
    }

    // Validation guarantees an object with well-typed fields
    let object = value
        .as_object()
        .ok_or_else(|| SchemaError::ValidationError("Expected a JSON object".to_string()))?;

    let f = |name: &str| object.get(name).and_then(Value::as_f64).map(|x| x as f32);
    let u = |name: &str| object.get(name).and_then(Value::as_u64).unwrap_or(0);

    let horizontal = f("horizontal_accel").unwrap_or(0.0);
    let total = f("total_accel").unwrap_or(0.0);
    let vertical = f("vertical_accel").unwrap_or_else(|| derived_vertical(total, horizontal));
    let axis = horizontal * std::f32::consts::FRAC_1_SQRT_2;

    let device_id = object
        .get("device_id")
        .and_then(Value::as_str)
        .and_then(DeviceId::new)
        .ok_or_else(|| SchemaError::ValidationError("invalid device_id".to_string()))?;

    let event = RawSeismicEvent {
        horizontal_accel: horizontal,
        total_accel: total,
        vertical_accel: vertical,
        x_accel: f("x_accel").unwrap_or(axis),
        y_accel: f("y_accel").unwrap_or(axis),
        z_accel: f("z_accel").unwrap_or(vertical),
        peak_ground_acceleration: f("peak_ground_acceleration")
            .unwrap_or_else(|| peak_ground_acceleration(total, horizontal, PGA_HORIZONTAL_FACTOR)),
        sound_level: u("sound_level") as u16,
        sound_correlated: object.get("sound_correlated").and_then(Value::as_bool).unwrap_or(false),
        duration_ms: object
            .get("duration_ms")
            .and_then(Value::as_u64)
            .map_or_else(|| derived_duration(horizontal), |d| d as u32),
        timestamp: u("timestamp"),
        device_id,
    };

    let raw_window = match object.get("raw_window") {
        None | Some(Value::Null) => None,
        Some(window) => Some(
            serde_json::from_value(window.clone())
                .map_err(|e| SchemaError::ValidationError(format!("invalid raw_window: {}", e)))?,
        ),
    };

    Ok(EventEnvelope { event, raw_window })
}

/// Vertical component left over once the horizontal part is removed
fn derived_vertical(total: f32, horizontal: f32) -> f32 {
    (total * total - horizontal * horizontal).max(0.0).sqrt()
}

/// Session length guessed from how hard the ground moved (ms)
fn derived_duration(horizontal: f32) -> u32 {
    if horizontal > 5.0 {
        1000
    } else if horizontal > 3.0 {
        600
    } else {
        300
    }
}

fn is_known_scalar(name: &str) -> bool {
    matches!(
        name,
        "sound_level" | "sound_correlated" | "duration_ms" | "timestamp" | "device_id"
    )
}

fn check_accel(object: &Map<String, Value>, name: &str, report: &mut ValidationReport) {
    let Some(v) = object.get(name) else { return };

    match v.as_f64() {
        None => report.add_error(ValidationIssue::error(
            IssueType::TypeMismatch,
            name,
            format!("Field '{}' must be a number", name),
        )),
        Some(x) if !x.is_finite() || !(x as f32).is_finite() => report.add_error(ValidationIssue::error(
            IssueType::PhysicsViolation,
            name,
            format!("Field '{}' is not finite", name),
        )),
        Some(x) if x < 0.0 => report.add_error(ValidationIssue::error(
            IssueType::PhysicsViolation,
            name,
            format!("Field '{}' is a magnitude and cannot be negative ({})", name, x),
        )),
        Some(_) => {}
    }
}

fn check_window(object: &Map<String, Value>, report: &mut ValidationReport) {
    let samples = match object.get("raw_window") {
        None | Some(Value::Null) => return,
        Some(Value::Array(samples)) => samples,
        Some(_) => {
            report.add_error(ValidationIssue::error(
                IssueType::TypeMismatch,
                "raw_window",
                "Field 'raw_window' must be an array".to_string(),
            ));
            return;
        }
    };

    if samples.len() > WINDOW_CAPACITY {
        report.add_error(ValidationIssue::error(
            IssueType::OutOfRange,
            "raw_window",
            format!("Window has {} samples, at most {} are accepted", samples.len(), WINDOW_CAPACITY),
        ));
        return;
    }

    let mut previous: Option<u64> = None;
    for (i, sample) in samples.iter().enumerate() {
        let Some(sample) = sample.as_object() else {
            report.add_error(ValidationIssue::error(
                IssueType::TypeMismatch,
                "raw_window",
                format!("Window sample {} must be an object", i),
            ));
            continue;
        };

        match sample.get("t").and_then(Value::as_u64) {
            Some(t) if previous.map_or(false, |p| t < p) => report.add_error(ValidationIssue::error(
                IssueType::PhysicsViolation,
                "raw_window",
                format!("Window sample {} goes back in time ({} after {})", i, t, previous.unwrap_or(0)),
            )),
            Some(t) => previous = Some(t),
            None => report.add_error(ValidationIssue::error(
                IssueType::TypeMismatch,
                "raw_window",
                format!("Window sample {} needs a non-negative integer 't'", i),
            )),
        }

        for axis in ["x", "y", "z"] {
            let problem = match sample.get(axis).and_then(Value::as_f64) {
                None => Some((IssueType::TypeMismatch, "must be a number")),
                Some(v) if !(v as f32).is_finite() => Some((IssueType::PhysicsViolation, "is not finite")),
                Some(v) if v < 0.0 => Some((IssueType::PhysicsViolation, "cannot be negative")),
                Some(_) => None,
            };
            if let Some((issue_type, what)) = problem {
                report.add_error(ValidationIssue::error(
                    issue_type,
                    "raw_window",
                    format!("Window sample {} axis '{}' {}", i, axis, what),
                ));
            }
        }
    }
}

fn check_sound(object: &Map<String, Value>, report: &mut ValidationReport) {
    let Some(v) = object.get("sound_level") else { return };

    match v.as_u64() {
        Some(level) if level <= SOUND_ADC_MAX as u64 => {}
        Some(level) => report.add_error(ValidationIssue::error(
            IssueType::OutOfRange,
            "sound_level",
            format!("Sound level {} exceeds ADC maximum {}", level, SOUND_ADC_MAX),
        )),
        None => report.add_error(ValidationIssue::error(
            IssueType::TypeMismatch,
            "sound_level",
            "Field 'sound_level' must be a non-negative integer".to_string(),
        )),
    }
}

fn check_unsigned(object: &Map<String, Value>, name: &str, max: u64, report: &mut ValidationReport) {
    let Some(v) = object.get(name) else { return };

    match v.as_u64() {
        Some(x) if x <= max => {}
        Some(x) => report.add_error(ValidationIssue::error(
            IssueType::OutOfRange,
            name,
            format!("Field '{}' value {} exceeds {}", name, x, max),
        )),
        None => report.add_error(ValidationIssue::error(
            IssueType::TypeMismatch,
            name,
            format!("Field '{}' must be a non-negative integer", name),
        )),
    }
}
