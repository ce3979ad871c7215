//! Runtime configuration for the edge loop
//!
//! All thresholds are plain data with `Default` impls that reproduce the
//! constants in [`crate::constants`]. Builders consume and return `Self` so a
//! deployment can start from a preset and override single fields:
//!
//! ```rust
//! use quakesense_core::config::DetectorConfig;
//!
//! let config = DetectorConfig::firmware_b()
//!     .with_sound_spike_threshold(650);
//! assert!(config.validate().is_ok());
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::constants::{alarm, detection, sensors};
use crate::errors::ConfigError;

/// Shake detector tuning
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DetectorConfig {
    /// Horizontal acceleration that opens a session (m/s²)
    pub shake_threshold: f32,
    /// Sustained motion needed to resolve a session (ms)
    pub min_shake_duration_ms: u64,
    /// Quiet time that abandons a session (ms)
    pub shake_reset_timeout_ms: u64,
    /// Spike-to-confirmation distance that vetoes an event (ms)
    pub sound_correlation_window_ms: u64,
    /// Sound level above baseline that counts as a spike
    pub sound_spike_threshold: u16,
    /// Deaf period after a sound-correlated session (ms)
    pub post_ignore_cooldown_ms: u64,
    /// Horizontal factor in the PGA estimate
    pub pga_horizontal_factor: f32,
}

impl DetectorConfig {
    /// Desk-mount firmware tuning (0.7 m/s², 250 ms)
    pub const fn firmware_a() -> Self {
        Self {
            shake_threshold: detection::SHAKE_THRESHOLD_A_MS2,
            min_shake_duration_ms: detection::MIN_SHAKE_DURATION_A_MS,
            shake_reset_timeout_ms: detection::SHAKE_RESET_TIMEOUT_MS,
            sound_correlation_window_ms: detection::SOUND_CORRELATION_WINDOW_MS,
            sound_spike_threshold: detection::SOUND_SPIKE_THRESHOLD,
            post_ignore_cooldown_ms: detection::POST_IGNORE_COOLDOWN_MS,
            pga_horizontal_factor: detection::PGA_HORIZONTAL_FACTOR,
        }
    }

    /// Wall-mount firmware tuning (0.8 m/s², 350 ms)
    pub const fn firmware_b() -> Self {
        let mut config = Self::firmware_a();
        config.shake_threshold = detection::SHAKE_THRESHOLD_B_MS2;
        config.min_shake_duration_ms = detection::MIN_SHAKE_DURATION_B_MS;
        config
    }

    /// Override the shake threshold
    pub fn with_shake_threshold(mut self, threshold: f32) -> Self {
        self.shake_threshold = threshold;
        self
    }

    /// Override the minimum shake duration
    pub fn with_min_shake_duration_ms(mut self, ms: u64) -> Self {
        self.min_shake_duration_ms = ms;
        self
    }

    /// Override the reset timeout
    pub fn with_shake_reset_timeout_ms(mut self, ms: u64) -> Self {
        self.shake_reset_timeout_ms = ms;
        self
    }

    /// Override the sound correlation window
    pub fn with_sound_correlation_window_ms(mut self, ms: u64) -> Self {
        self.sound_correlation_window_ms = ms;
        self
    }

    /// Override the spike threshold
    pub fn with_sound_spike_threshold(mut self, counts: u16) -> Self {
        self.sound_spike_threshold = counts;
        self
    }

    /// Override the post-ignore cooldown
    pub fn with_post_ignore_cooldown_ms(mut self, ms: u64) -> Self {
        self.post_ignore_cooldown_ms = ms;
        self
    }

    /// Check that the detector can run with these values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.shake_threshold.is_finite() || self.shake_threshold <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "shake_threshold",
                reason: "must be finite and positive",
            });
        }
        if self.min_shake_duration_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "min_shake_duration_ms",
                reason: "must be non-zero",
            });
        }
        if !self.pga_horizontal_factor.is_finite() || self.pga_horizontal_factor < 1.0 {
            return Err(ConfigError::Invalid {
                field: "pga_horizontal_factor",
                reason: "must be finite and at least 1.0",
            });
        }
        if self.sound_spike_threshold > sensors::SOUND_ADC_MAX {
            return Err(ConfigError::Invalid {
                field: "sound_spike_threshold",
                reason: "exceeds the sound ADC range",
            });
        }
        Ok(())
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::firmware_a()
    }
}

/// Alarm cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AlarmConfig {
    /// Alarm length after the latest trigger (ms)
    pub duration_ms: u64,
    /// Blink half-period (ms)
    pub blink_interval_ms: u64,
}

impl AlarmConfig {
    /// Override the alarm duration
    pub fn with_duration_ms(mut self, ms: u64) -> Self {
        self.duration_ms = ms;
        self
    }

    /// Override the blink interval
    pub fn with_blink_interval_ms(mut self, ms: u64) -> Self {
        self.blink_interval_ms = ms;
        self
    }

    /// Check the cadence is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.blink_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "blink_interval_ms",
                reason: "must be non-zero",
            });
        }
        Ok(())
    }
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            duration_ms: alarm::ALARM_DURATION_MS,
            blink_interval_ms: alarm::BLINK_INTERVAL_MS,
        }
    }
}

/// Baseline calibration parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CalibrationConfig {
    /// Readings averaged into the baseline
    pub sample_count: u16,
    /// Delay between readings (ms)
    pub sample_interval_ms: u32,
}

impl CalibrationConfig {
    /// Override the sample count
    pub fn with_sample_count(mut self, count: u16) -> Self {
        self.sample_count = count;
        self
    }

    /// Override the sample interval
    pub fn with_sample_interval_ms(mut self, ms: u32) -> Self {
        self.sample_interval_ms = ms;
        self
    }

    /// Check the parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_count == 0 {
            return Err(ConfigError::Invalid {
                field: "sample_count",
                reason: "must be non-zero",
            });
        }
        Ok(())
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            sample_count: sensors::CALIBRATION_SAMPLE_COUNT,
            sample_interval_ms: sensors::CALIBRATION_INTERVAL_MS,
        }
    }
}

/// Everything the edge monitor needs
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MonitorConfig {
    /// Shake detector tuning
    pub detector: DetectorConfig,
    /// Alarm cadence
    pub alarm: AlarmConfig,
    /// Calibration parameters
    pub calibration: CalibrationConfig,
    /// Sound moving-average window (samples)
    pub sound_window: SoundWindow,
}

/// Sound moving-average window, bounded by `MAX_SOUND_AVERAGE_WINDOW`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SoundWindow(pub usize);

impl Default for SoundWindow {
    fn default() -> Self {
        Self(sensors::SOUND_AVERAGE_WINDOW)
    }
}

impl MonitorConfig {
    /// Monitor config around a detector preset
    pub fn with_detector(mut self, detector: DetectorConfig) -> Self {
        self.detector = detector;
        self
    }

    /// Override the alarm cadence
    pub fn with_alarm(mut self, alarm: AlarmConfig) -> Self {
        self.alarm = alarm;
        self
    }

    /// Override calibration
    pub fn with_calibration(mut self, calibration: CalibrationConfig) -> Self {
        self.calibration = calibration;
        self
    }

    /// Override the sound averaging window
    pub fn with_sound_window(mut self, samples: usize) -> Self {
        self.sound_window = SoundWindow(samples);
        self
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.detector.validate()?;
        self.alarm.validate()?;
        self.calibration.validate()?;
        if self.sound_window.0 == 0 || self.sound_window.0 > sensors::MAX_SOUND_AVERAGE_WINDOW {
            return Err(ConfigError::Invalid {
                field: "sound_window",
                reason: "must be between 1 and MAX_SOUND_AVERAGE_WINDOW",
            });
        }
        Ok(())
    }
}
