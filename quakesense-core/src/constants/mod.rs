//! Constants for QuakeSense Core
//!
//! Every threshold the edge loop uses lives here, named with its unit. The
//! values are the defaults behind `DetectorConfig`, `AlarmConfig` and
//! `CalibrationConfig`; deployments override them through configuration,
//! never by editing the state machines.
//!
//! ## Organization
//!
//! - **Detection**: shake thresholds, debounce timing, sound veto
//! - **Alarm**: blink cadence and alarm duration
//! - **Sensors**: ADC ranges, calibration and buffer sizes
//!
//! ## Firmware Variants
//!
//! Two firmware builds shipped with different shake tuning. Both are kept as
//! named presets (`*_A` and `*_B`); the unsuffixed names point at variant A.

/// Shake detection thresholds and timing.
pub mod detection;

/// Alarm blink cadence and duration.
pub mod alarm;

/// Sensor ranges, calibration and buffer sizing.
pub mod sensors;

pub use detection::{
    SHAKE_THRESHOLD_MS2, MIN_SHAKE_DURATION_MS, SHAKE_RESET_TIMEOUT_MS,
    SOUND_CORRELATION_WINDOW_MS, SOUND_SPIKE_THRESHOLD, POST_IGNORE_COOLDOWN_MS,
    PGA_HORIZONTAL_FACTOR,
};

pub use alarm::{ALARM_DURATION_MS, BLINK_INTERVAL_MS};

pub use sensors::{
    SOUND_ADC_MAX, CALIBRATION_SAMPLE_COUNT, CALIBRATION_INTERVAL_MS,
    SOUND_AVERAGE_WINDOW, MAX_SOUND_AVERAGE_WINDOW, WINDOW_CAPACITY,
    MAX_DEVICE_ID_LEN,
};
