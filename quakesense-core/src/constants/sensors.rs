//! Sensor Ranges, Calibration and Buffer Sizing

// ===== SOUND CHANNEL =====

/// Full-scale reading of the 12-bit sound ADC.
pub const SOUND_ADC_MAX: u16 = 4095;

/// Default moving-average window for the sound level (samples).
pub const SOUND_AVERAGE_WINDOW: usize = 5;

/// Largest configurable sound averaging window (samples).
pub const MAX_SOUND_AVERAGE_WINDOW: usize = 16;

// ===== CALIBRATION =====

/// Samples averaged into the baseline.
///
/// At the default spacing this is one second of stillness.
pub const CALIBRATION_SAMPLE_COUNT: u16 = 100;

/// Spacing between calibration samples (ms).
pub const CALIBRATION_INTERVAL_MS: u32 = 10;

// ===== BUFFERS =====

/// Samples retained for the raw window attached to an emission.
///
/// 256 samples is 2.56 s at the nominal 100 Hz tick, enough for the
/// pre-trigger history plus the longest debounce preset.
pub const WINDOW_CAPACITY: usize = 256;

/// Longest device identifier carried inline in an event (bytes).
pub const MAX_DEVICE_ID_LEN: usize = 32;

/// Nominal tick rate of the edge loop (Hz).
pub const NOMINAL_SAMPLE_RATE_HZ: u32 = 100;
