//! Error Types for the Edge Detection Loop
//!
//! ## Design Philosophy
//!
//! The edge loop runs on a microcontroller with a few tens of kilobytes of
//! RAM, so errors follow the same rules as every other value in the hot path:
//!
//! 1. **Small and `Copy`**: errors are returned from every sensor read and are
//!    cheap to pass around or stash in the driver's fault slot.
//!
//! 2. **No Heap Allocation**: messages are `&'static str`, never `String`.
//!
//! 3. **Fatal vs transient is the caller's call**: the same `SensorError`
//!    means "skip this tick" during the loop and "enter Fault" during startup
//!    probing. The driver decides, not the error.
//!
//! ## Error Categories
//!
//! ### Sensor Issues
//! - `SensorError::NotDetected`: startup detection failed, the part is absent or dead
//! - `SensorError::ReadFailed`: a single bus transaction failed
//! - `SensorError::Timeout`: the bounded read deadline expired
//!
//! ### Calibration Issues
//! - `CalibrationError::NoSamples`: every calibration read failed
//!
//! ### Driver Issues
//! - `DeviceError`: wraps the above plus lifecycle misuse (`NotStarted`) and
//!   the persistent `Faulted` condition
//!
//! ## Handling Strategy
//!
//! ```rust
//! use quakesense_core::errors::{DeviceError, SensorError};
//!
//! fn on_start_failure(err: DeviceError) {
//!     match err {
//!         DeviceError::Sensor(SensorError::NotDetected { .. }) => {
//!             // Accelerometer absent: show the Fault pattern and stay there
//!         }
//!         DeviceError::Calibration(_) => {
//!             // Nothing readable during calibration, treat as fatal at boot
//!         }
//!         _ => {}
//!     }
//! }
//! ```

use thiserror_no_std::Error;

/// Result type for sensor reads
pub type SensorResult<T> = Result<T, SensorError>;

/// Result type for driver operations
pub type DeviceResult<T> = Result<T, DeviceError>;

/// Sensor failures reported by hardware adapters
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// Part did not answer at startup
    #[error("Sensor not detected: {sensor}")]
    NotDetected {
        /// Which sensor failed to answer
        sensor: &'static str,
    },

    /// A single read transaction failed
    #[error("Sensor read failed: {reason}")]
    ReadFailed {
        /// Short adapter-provided reason
        reason: &'static str,
    },

    /// Read did not complete within its deadline
    #[error("Sensor read timed out")]
    Timeout,
}

/// Calibration failures
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationError {
    /// Every attempted calibration read failed
    #[error("No calibration samples could be read ({attempted} attempted)")]
    NoSamples {
        /// Number of reads attempted
        attempted: u16,
    },
}

/// Configuration rejected by `validate()`
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A field holds a value the detector cannot run with
    #[error("Invalid {field}: {reason}")]
    Invalid {
        /// Offending field name
        field: &'static str,
        /// Why the value was rejected
        reason: &'static str,
    },
}

/// Errors surfaced by the device driver
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceError {
    /// Sensor failure during detection or a blocking sequence
    #[error("Sensor failure: {0}")]
    Sensor(SensorError),

    /// Calibration could not produce a baseline
    #[error("Calibration failure: {0}")]
    Calibration(CalibrationError),

    /// Driver configuration was invalid
    #[error("Configuration failure: {0}")]
    Config(ConfigError),

    /// `tick` or a command was issued before `start`
    #[error("Device not started")]
    NotStarted,

    /// A fatal startup failure put the device in the Fault state
    #[error("Device is faulted")]
    Faulted,
}

impl From<SensorError> for DeviceError {
    fn from(err: SensorError) -> Self {
        DeviceError::Sensor(err)
    }
}

impl From<CalibrationError> for DeviceError {
    fn from(err: CalibrationError) -> Self {
        DeviceError::Calibration(err)
    }
}

impl From<ConfigError> for DeviceError {
    fn from(err: ConfigError) -> Self {
        DeviceError::Config(err)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for SensorError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::NotDetected { sensor } => defmt::write!(fmt, "Sensor not detected: {}", sensor),
            Self::ReadFailed { reason } => defmt::write!(fmt, "Read failed: {}", reason),
            Self::Timeout => defmt::write!(fmt, "Read timeout"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for CalibrationError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::NoSamples { attempted } => {
                defmt::write!(fmt, "No calibration samples ({} attempted)", attempted)
            }
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConfigError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Invalid { field, reason } => defmt::write!(fmt, "Invalid {}: {}", field, reason),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for DeviceError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Sensor(e) => defmt::write!(fmt, "Sensor: {}", e),
            Self::Calibration(e) => defmt::write!(fmt, "Calibration: {}", e),
            Self::Config(e) => defmt::write!(fmt, "Config: {}", e),
            Self::NotStarted => defmt::write!(fmt, "Not started"),
            Self::Faulted => defmt::write!(fmt, "Faulted"),
        }
    }
}
