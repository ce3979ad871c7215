//! Shake Detection Constants
//!
//! Accelerations are in m/s² after baseline subtraction, times in
//! milliseconds of the monotonic tick clock.

// ===== SHAKE THRESHOLDS =====

/// Horizontal acceleration that opens a shake session (m/s²), variant A.
///
/// Chosen above walking-induced floor vibration on a desk mount.
pub const SHAKE_THRESHOLD_A_MS2: f32 = 0.7;

/// Horizontal acceleration that opens a shake session (m/s²), variant B.
///
/// Stiffer threshold used by the wall-mounted build.
pub const SHAKE_THRESHOLD_B_MS2: f32 = 0.8;

/// Default shake threshold (m/s²).
pub const SHAKE_THRESHOLD_MS2: f32 = SHAKE_THRESHOLD_A_MS2;

// ===== DEBOUNCE TIMING =====

/// Sustained motion required before a session resolves (ms), variant A.
pub const MIN_SHAKE_DURATION_A_MS: u64 = 250;

/// Sustained motion required before a session resolves (ms), variant B.
pub const MIN_SHAKE_DURATION_B_MS: u64 = 350;

/// Default minimum shake duration (ms).
pub const MIN_SHAKE_DURATION_MS: u64 = MIN_SHAKE_DURATION_A_MS;

/// Quiet time below threshold that abandons a session (ms).
///
/// Short gaps between oscillation peaks stay inside one session; a pause
/// longer than this ends it without an event.
pub const SHAKE_RESET_TIMEOUT_MS: u64 = 150;

// ===== SOUND VETO =====

/// A sound spike within this many ms of confirmation vetoes the event.
///
/// Door slams and dropped objects are loud; ground motion mostly is not.
pub const SOUND_CORRELATION_WINDOW_MS: u64 = 1000;

/// Sound level above the calibrated baseline that counts as a spike
/// (ADC counts on the 12-bit sound channel).
pub const SOUND_SPIKE_THRESHOLD: u16 = 500;

/// Detector stays deaf for this long after a sound-correlated session (ms).
pub const POST_IGNORE_COOLDOWN_MS: u64 = 1000;

// ===== PEAK GROUND ACCELERATION =====

/// Horizontal amplification in `pga = max(total, horizontal * factor)`.
pub const PGA_HORIZONTAL_FACTOR: f32 = 1.2;
