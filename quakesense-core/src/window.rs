//! Raw window capture
//!
//! The server extracts frequency and wave-arrival features far better from
//! the actual motion trace than from the single confirming tick. The recorder
//! keeps the last `WINDOW_CAPACITY` dynamic samples in a ring buffer, and on
//! resolution the device copies out the slice that covers the session plus a
//! short pre-trigger margin.

use heapless::Vec;

use crate::buffer::CircularBuffer;
use crate::constants::sensors::WINDOW_CAPACITY;
use crate::sampler::SensorSample;
use crate::time::Timestamp;

/// Default history kept before the session start (ms)
pub const DEFAULT_PRE_TRIGGER_MS: u64 = 200;

/// One dynamic-axis sample of the raw window
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowSample {
    /// Sample time (ms)
    pub t: Timestamp,
    /// Dynamic x (m/s²)
    pub x: f32,
    /// Dynamic y (m/s²)
    pub y: f32,
    /// Dynamic z (m/s²)
    pub z: f32,
}

impl WindowSample {
    /// `sqrt(x² + y²)`
    pub fn horizontal(&self) -> f32 {
        libm::sqrtf(self.x * self.x + self.y * self.y)
    }

    /// `sqrt(x² + y² + z²)`
    pub fn magnitude(&self) -> f32 {
        libm::sqrtf(self.x * self.x + self.y * self.y + self.z * self.z)
    }
}

impl From<&SensorSample> for WindowSample {
    fn from(s: &SensorSample) -> Self {
        Self {
            t: s.t,
            x: s.x,
            y: s.y,
            z: s.z,
        }
    }
}

/// Captured window, oldest sample first
pub type RawWindow = Vec<WindowSample, WINDOW_CAPACITY>;

/// Rolling history of dynamic samples
#[derive(Clone)]
pub struct WindowRecorder {
    history: CircularBuffer<WindowSample, WINDOW_CAPACITY>,
    pre_trigger_ms: u64,
}

impl WindowRecorder {
    /// Recorder keeping `pre_trigger_ms` of history before a session
    pub fn new(pre_trigger_ms: u64) -> Self {
        Self {
            history: CircularBuffer::new(),
            pre_trigger_ms,
        }
    }

    /// Append this tick's sample
    pub fn record(&mut self, sample: &SensorSample) {
        self.history.push(WindowSample::from(sample));
    }

    /// Samples retained
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Copy out every retained sample at or after `start - pre_trigger_ms`
    pub fn capture_since(&self, start: Timestamp) -> RawWindow {
        let from = start.saturating_sub(self.pre_trigger_ms);
        let mut window = RawWindow::new();
        for s in self.history.iter().filter(|s| s.t >= from) {
            // Capacity equals the ring size, so this cannot overflow
            let _ = window.push(*s);
        }
        window
    }

    /// Forget all history (after recalibration the old samples are stale)
    pub fn clear(&mut self) {
        self.history.clear();
    }
}

impl Default for WindowRecorder {
    fn default() -> Self {
        Self::new(DEFAULT_PRE_TRIGGER_MS)
    }
}
