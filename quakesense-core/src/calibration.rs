//! Baseline Calibration
//!
//! ## Overview
//!
//! A resting accelerometer does not read zero: gravity sits on one axis and
//! every part has its own offsets. The room is not silent either. Calibration
//! averages a fixed number of readings taken while the device is still and
//! stores the result as a `CalibrationBaseline`, which the sampler subtracts
//! from every live reading.
//!
//! ## Precondition
//!
//! The device must be physically still while calibrating. This is documented,
//! not checked: a shaken calibration produces a skewed baseline and nothing
//! here can tell the difference.
//!
//! ## Failure Handling
//!
//! Individual failed reads (either channel) are skipped. Calibration fails
//! only when no reading succeeded at all, in which case the caller keeps the
//! previous baseline.
//!
//! ```rust
//! use quakesense_core::calibration::CalibrationAccumulator;
//! use quakesense_core::traits::AccelReading;
//!
//! let mut acc = CalibrationAccumulator::new();
//! acc.add(AccelReading::new(0.1, -0.1, 9.8), 200);
//! acc.add(AccelReading::new(0.3, 0.1, 9.8), 220);
//!
//! let baseline = acc.finish(2).unwrap();
//! assert!((baseline.x - 0.2).abs() < 1e-6);
//! assert_eq!(baseline.sound, 210);
//! ```

use crate::config::CalibrationConfig;
use crate::errors::CalibrationError;
use crate::traits::{AccelReading, Accelerometer, DelayMs, SoundSensor};

/// Steady-state offsets subtracted from live readings
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CalibrationBaseline {
    /// X axis offset (m/s²)
    pub x: f32,
    /// Y axis offset (m/s²)
    pub y: f32,
    /// Z axis offset (m/s²)
    pub z: f32,
    /// Ambient sound level (ADC counts)
    pub sound: u16,
}

impl CalibrationBaseline {
    /// Baseline from explicit offsets
    pub const fn new(x: f32, y: f32, z: f32, sound: u16) -> Self {
        Self { x, y, z, sound }
    }
}

/// Running arithmetic mean of calibration readings
///
/// Sums are kept in `f64`/`u64` so a few hundred samples cannot lose
/// precision or overflow.
#[derive(Debug, Clone, Default)]
pub struct CalibrationAccumulator {
    sum_x: f64,
    sum_y: f64,
    sum_z: f64,
    sum_sound: u64,
    count: u32,
}

impl CalibrationAccumulator {
    /// Empty accumulator
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one successful reading pair
    pub fn add(&mut self, reading: AccelReading, sound: u16) {
        self.sum_x += reading.x as f64;
        self.sum_y += reading.y as f64;
        self.sum_z += reading.z as f64;
        self.sum_sound += sound as u64;
        self.count += 1;
    }

    /// Readings accumulated so far
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Average everything added so far
    ///
    /// `attempted` is only used for the error report.
    pub fn finish(&self, attempted: u16) -> Result<CalibrationBaseline, CalibrationError> {
        if self.count == 0 {
            return Err(CalibrationError::NoSamples { attempted });
        }

        let n = self.count as f64;
        Ok(CalibrationBaseline {
            x: (self.sum_x / n) as f32,
            y: (self.sum_y / n) as f32,
            z: (self.sum_z / n) as f32,
            sound: (self.sum_sound / self.count as u64) as u16,
        })
    }
}

/// Take `config.sample_count` readings and average them
///
/// Blocks for roughly `sample_count * sample_interval_ms`. This is the only
/// blocking sequence on the device and runs before the detector is armed.
pub fn calibrate<A, S, D>(
    accel: &mut A,
    sound: &mut S,
    delay: &mut D,
    config: &CalibrationConfig,
) -> Result<CalibrationBaseline, CalibrationError>
where
    A: Accelerometer,
    S: SoundSensor,
    D: DelayMs,
{
    let mut acc = CalibrationAccumulator::new();

    for i in 0..config.sample_count {
        match (accel.read_accel(), sound.read_sound()) {
            (Ok(reading), Ok(level)) => acc.add(reading, level),
            _ => {
                log_debug!("calibration sample {} skipped", i);
            }
        }

        if i + 1 < config.sample_count {
            delay.delay_ms(config.sample_interval_ms);
        }
    }

    let baseline = acc.finish(config.sample_count)?;
    log_info!(
        "calibrated from {} samples: x={} y={} z={} sound={}",
        acc.count(),
        baseline.x,
        baseline.y,
        baseline.z,
        baseline.sound
    );
    Ok(baseline)
}
