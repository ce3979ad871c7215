//! Edge-side shake detection for QuakeSense
//!
//! Watches a tri-axial accelerometer and an ambient sound sensor, decides
//! when the ground has moved long enough to matter, vetoes motion that
//! coincides with a loud noise, and drives a bounded blinking alarm.
//!
//! Key constraints:
//! - Runs on a microcontroller (`no_std`, no heap in the tick path)
//! - One cooperative loop, no tick ever blocks on a sensor
//! - The clock is a parameter, every state machine is testable offline
//!
//! ```no_run
//! use quakesense_core::calibration::CalibrationBaseline;
//! use quakesense_core::config::{DetectorConfig, MonitorConfig};
//! use quakesense_core::device::EdgeMonitor;
//! use quakesense_core::events::DeviceId;
//! use quakesense_core::traits::AccelReading;
//!
//! let config = MonitorConfig::default().with_detector(DetectorConfig::firmware_b());
//! let baseline = CalibrationBaseline::new(0.02, -0.01, 9.81, 180);
//! let mut monitor = EdgeMonitor::new(config, DeviceId::new("hall-2").unwrap(), baseline).unwrap();
//!
//! let out = monitor.step(1_000, Some((AccelReading::new(0.9, 0.4, 9.9), 190)));
//! if let Some(emission) = out.emission {
//!     // hand emission.event to the transport
//! }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

// Optional logging: compiles to nothing without the `log` feature
#[cfg(feature = "log")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! log_info {
    ($($arg:tt)*) => { log::info!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_info {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! log_error {
    ($($arg:tt)*) => { log::error!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_error {
    ($($arg:tt)*) => {};
}

pub mod alarm;
pub mod buffer;
pub mod calibration;
pub mod config;
pub mod constants;
pub mod detector;
pub mod device;
pub mod errors;
pub mod events;
pub mod sampler;
pub mod sound;
pub mod time;
pub mod traits;
pub mod window;

// Public API
pub use alarm::{AlarmController, AlarmOutput};
pub use calibration::{calibrate, CalibrationBaseline};
pub use config::{AlarmConfig, CalibrationConfig, DetectorConfig, MonitorConfig};
pub use detector::{Detection, DetectorState, Resolution, ShakeDetector};
pub use device::{Command, Device, EdgeMonitor, Emission, TickOutput};
pub use errors::{CalibrationError, ConfigError, DeviceError, SensorError};
pub use events::{DeviceId, EventPriority, RawSeismicEvent, RawSeismicEventBuilder};
pub use sampler::{Sampler, SensorSample};
pub use sound::SoundSpikeTracker;
pub use time::{Timestamp, TimeSource};
pub use traits::{AccelReading, SignalPattern};
pub use window::{RawWindow, WindowSample};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
