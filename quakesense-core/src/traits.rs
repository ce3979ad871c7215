//! Hardware seams for the edge device
//!
//! The detection logic never touches a bus. Adapters for a specific board
//! implement these traits and the [`crate::device::Device`] driver composes
//! them. Reads use `nb` so a sensor that is not ready (or whose bounded
//! deadline expired) reports `WouldBlock` and the tick is skipped instead of
//! stalling the loop.

use crate::errors::SensorError;

/// One raw accelerometer reading in m/s²
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccelReading {
    /// X axis
    pub x: f32,
    /// Y axis
    pub y: f32,
    /// Z axis (vertical when mounted level)
    pub z: f32,
}

impl AccelReading {
    /// Build a reading from its three axes
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Tri-axial accelerometer
pub trait Accelerometer {
    /// Confirm the part is present and configured
    ///
    /// Called once at startup. Failure is fatal for the device.
    fn detect(&mut self) -> Result<(), SensorError>;

    /// Read one sample
    ///
    /// `WouldBlock` means no data within the read deadline.
    fn read_accel(&mut self) -> nb::Result<AccelReading, SensorError>;
}

/// Ambient sound level sensor on a 12-bit ADC
pub trait SoundSensor {
    /// Read the raw ADC level (0..=4095)
    fn read_sound(&mut self) -> nb::Result<u16, SensorError>;
}

/// Output pattern shown by the LED and buzzer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SignalPattern {
    /// Armed and quiet
    Idle,
    /// Baseline calibration in progress
    Calibrating,
    /// A shake session is open
    Analyzing,
    /// Alarm running; `lit` is the current blink phase
    Alarm {
        /// LED and buzzer on in this phase
        lit: bool,
    },
    /// Fatal startup failure, held until reset
    Fault,
}

/// Anything that can render a `SignalPattern`
pub trait Indicator {
    /// Drive the outputs to `pattern`
    fn show(&mut self, pattern: SignalPattern);
}

/// Blocking millisecond delay, used only by calibration
pub trait DelayMs {
    /// Sleep for `ms` milliseconds
    fn delay_ms(&mut self, ms: u32);
}

#[cfg(feature = "defmt")]
impl defmt::Format for SignalPattern {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Idle => defmt::write!(fmt, "Idle"),
            Self::Calibrating => defmt::write!(fmt, "Calibrating"),
            Self::Analyzing => defmt::write!(fmt, "Analyzing"),
            Self::Alarm { lit } => defmt::write!(fmt, "Alarm(lit={})", lit),
            Self::Fault => defmt::write!(fmt, "Fault"),
        }
    }
}
