//! Alarm Timing Constants

/// How long the alarm runs after a confirmed event (ms).
pub const ALARM_DURATION_MS: u64 = 10_000;

/// Half-period of the blink pattern (ms).
pub const BLINK_INTERVAL_MS: u64 = 300;
