//! Per-tick sampling
//!
//! Turns one raw (accelerometer, sound) pair into a `SensorSample` of
//! baseline-relative dynamic accelerations. Sound is not baseline-relative:
//! it is a short moving average of raw ADC readings, and the spike tracker
//! compares it against the baseline itself.

use crate::buffer::CircularBuffer;
use crate::calibration::CalibrationBaseline;
use crate::constants::sensors::MAX_SOUND_AVERAGE_WINDOW;
use crate::time::Timestamp;
use crate::traits::AccelReading;

/// Dynamic acceleration and smoothed sound for one tick
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SensorSample {
    /// |raw x - baseline x| (m/s²)
    pub x: f32,
    /// |raw y - baseline y| (m/s²)
    pub y: f32,
    /// |raw z - baseline z| (m/s²)
    pub z: f32,
    /// Moving average of raw sound readings (ADC counts)
    pub sound: u16,
    /// Tick timestamp (ms)
    pub t: Timestamp,
}

impl SensorSample {
    /// `sqrt(x² + y²)`
    pub fn horizontal(&self) -> f32 {
        libm::sqrtf(self.x * self.x + self.y * self.y)
    }

    /// `sqrt(x² + y² + z²)`
    pub fn total(&self) -> f32 {
        libm::sqrtf(self.x * self.x + self.y * self.y + self.z * self.z)
    }

    /// Vertical component (the dynamic z axis)
    pub fn vertical(&self) -> f32 {
        self.z
    }
}

/// Applies the baseline and smooths sound
#[derive(Clone)]
pub struct Sampler {
    baseline: CalibrationBaseline,
    sound_history: CircularBuffer<u16, MAX_SOUND_AVERAGE_WINDOW>,
    sound_window: usize,
}

impl Sampler {
    /// Sampler around a baseline
    ///
    /// `sound_window` is clamped to `1..=MAX_SOUND_AVERAGE_WINDOW`.
    pub fn new(baseline: CalibrationBaseline, sound_window: usize) -> Self {
        Self {
            baseline,
            sound_history: CircularBuffer::new(),
            sound_window: sound_window.clamp(1, MAX_SOUND_AVERAGE_WINDOW),
        }
    }

    /// Baseline currently in force
    pub fn baseline(&self) -> &CalibrationBaseline {
        &self.baseline
    }

    /// Swap in a new baseline
    ///
    /// Called between ticks, so no sample ever mixes two baselines.
    pub fn replace_baseline(&mut self, baseline: CalibrationBaseline) {
        self.baseline = baseline;
    }

    /// Process one raw reading pair
    pub fn sample(&mut self, raw: AccelReading, raw_sound: u16, now: Timestamp) -> SensorSample {
        self.sound_history.push(raw_sound);

        SensorSample {
            x: libm::fabsf(raw.x - self.baseline.x),
            y: libm::fabsf(raw.y - self.baseline.y),
            z: libm::fabsf(raw.z - self.baseline.z),
            sound: self.average_sound(),
            t: now,
        }
    }

    fn average_sound(&self) -> u16 {
        let (sum, n) = self
            .sound_history
            .recent(self.sound_window)
            .fold((0u32, 0u32), |(sum, n), &level| (sum + level as u32, n + 1));

        if n == 0 {
            0
        } else {
            (sum / n) as u16
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline() -> CalibrationBaseline {
        CalibrationBaseline::new(0.1, -0.2, 9.8, 200)
    }

    #[test]
    fn subtracts_baseline_and_takes_magnitude() {
        let mut sampler = Sampler::new(baseline(), 5);
        let s = sampler.sample(AccelReading::new(3.1, -4.2, 9.8), 200, 10);

        assert!((s.x - 3.0).abs() < 1e-5);
        assert!((s.y - 4.0).abs() < 1e-5);
        assert!(s.z.abs() < 1e-5);
        assert!((s.horizontal() - 5.0).abs() < 1e-4);
        assert!((s.total() - 5.0).abs() < 1e-4);
        assert_eq!(s.t, 10);
    }

    #[test]
    fn negative_deviation_is_positive() {
        let mut sampler = Sampler::new(baseline(), 5);
        let s = sampler.sample(AccelReading::new(-0.9, -0.2, 8.8), 0, 0);
        assert!((s.x - 1.0).abs() < 1e-5);
        assert!((s.z - 1.0).abs() < 1e-4);
    }

    #[test]
    fn sound_is_moving_average_of_raw() {
        let mut sampler = Sampler::new(baseline(), 5);
        let levels = [100, 200, 300, 400, 500, 600];
        let mut last = 0;
        for (i, level) in levels.iter().enumerate() {
            last = sampler.sample(AccelReading::default(), *level, i as u64).sound;
        }
        // Window of 5 covers 200..=600
        assert_eq!(last, 400);
    }

    #[test]
    fn replace_baseline_applies_to_next_sample() {
        let mut sampler = Sampler::new(baseline(), 1);
        sampler.replace_baseline(CalibrationBaseline::new(1.0, 1.0, 1.0, 0));
        let s = sampler.sample(AccelReading::new(1.0, 1.0, 1.0), 0, 0);
        assert_eq!(s.total(), 0.0);
        assert_eq!(sampler.baseline().x, 1.0);
    }
}
