//! Sound spike tracking
//!
//! Remembers only the latest moment sound rose more than
//! `sound_spike_threshold` above the calibrated ambient level. The shake
//! detector asks how long ago that was when it resolves a session.

use crate::time::Timestamp;

/// Timestamp cache of the most recent sound spike
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoundSpikeTracker {
    baseline: u16,
    threshold: u16,
    last_spike: Option<Timestamp>,
}

impl SoundSpikeTracker {
    /// Tracker for a calibrated ambient level
    pub fn new(baseline: u16, threshold: u16) -> Self {
        Self {
            baseline,
            threshold,
            last_spike: None,
        }
    }

    /// Adopt a recalibrated ambient level
    ///
    /// The last spike time is kept: a spike is an event in the past, not a
    /// property of the baseline.
    pub fn rebase(&mut self, baseline: u16) {
        self.baseline = baseline;
    }

    /// Record `now` as the latest spike if `level` exceeds the threshold
    ///
    /// Returns whether this observation was a spike.
    pub fn observe(&mut self, level: u16, now: Timestamp) -> bool {
        let spike = level > self.baseline.saturating_add(self.threshold);
        if spike {
            self.last_spike = Some(now);
        }
        spike
    }

    /// Time of the latest spike, if any
    pub fn last_spike(&self) -> Option<Timestamp> {
        self.last_spike
    }

    /// `now - lastSpikeTime`, or `None` before the first spike
    pub fn time_since_last_spike(&self, now: Timestamp) -> Option<u64> {
        self.last_spike.map(|t| now.saturating_sub(t))
    }

    /// Whether a spike happened less than `window_ms` before `now`
    pub fn is_correlated(&self, now: Timestamp, window_ms: u64) -> bool {
        matches!(self.time_since_last_spike(now), Some(dt) if dt < window_ms)
    }
}
