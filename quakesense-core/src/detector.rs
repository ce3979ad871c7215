//! Shake Detector State Machine
//!
//! ## Overview
//!
//! The detector decides, tick by tick, whether the ground is moving long
//! enough to be worth reporting. It is a debounce on horizontal acceleration
//! with a sound veto at the end:
//!
//! ```text
//!            h > threshold                 h > threshold && now - start > min
//!   ┌──────┐ ─────────────▶ ┌───────────┐ ──────────────────────────────────▶ resolve
//!   │ Idle │                │ Analyzing │                                       │
//!   └──────┘ ◀───────────── └───────────┘                                       │
//!      ▲     h ≤ threshold && now - lastAbove > reset                           │
//!      │                                                                        │
//!      ├────────────────── Confirmed (alarm armed, high priority) ◀─────────────┤
//!      │                                                                        │
//!   ┌──────────┐                                                                │
//!   │ Cooldown │ ◀──────── IgnoredSoundCorrelated (low priority) ◀──────────────┘
//!   └──────────┘
//!        │ now ≥ until
//!        └────────▶ Idle
//! ```
//!
//! ## Timing Semantics
//!
//! - A session opens on the first tick strictly above threshold.
//! - Ticks below threshold inside a session do not end it until the quiet
//!   gap since the last above-threshold tick exceeds the reset timeout.
//! - Resolution happens on an above-threshold tick once the session is
//!   strictly longer than the minimum duration. The event carries the values
//!   measured on that confirming tick.
//! - After a sound-correlated resolution the detector is deaf for the
//!   cooldown period. The cooldown is a state, not a sleep, so the rest of
//!   the loop (alarm, indicator) keeps running.
//!
//! ## Invariants
//!
//! - At most one event per session.
//! - A session never resolves without at least one tick past the minimum
//!   duration, so sub-threshold motion can never emit.

use crate::config::DetectorConfig;
use crate::events::{peak_ground_acceleration, DeviceId, EventPriority, RawSeismicEvent};
use crate::sampler::SensorSample;
use crate::sound::SoundSpikeTracker;
use crate::time::Timestamp;

/// Detector state between ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// Waiting for motion
    Idle,
    /// Session open
    Analyzing {
        /// First above-threshold tick
        start: Timestamp,
        /// Latest above-threshold tick
        last_above: Timestamp,
    },
    /// Deaf period after a sound-correlated session
    Cooldown {
        /// First tick that may open a new session
        until: Timestamp,
    },
}

/// How a session ended when it produced an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Resolution {
    /// Sustained motion without a sound spike: alarm armed
    Confirmed,
    /// Sustained motion coinciding with a sound spike: reported, not alarmed
    IgnoredSoundCorrelated,
}

impl Resolution {
    /// Delivery priority of events resolved this way
    pub fn priority(self) -> EventPriority {
        match self {
            Resolution::Confirmed => EventPriority::High,
            Resolution::IgnoredSoundCorrelated => EventPriority::Low,
        }
    }
}

/// A resolved session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    /// How the session ended
    pub resolution: Resolution,
    /// The event to emit
    pub event: RawSeismicEvent,
}

impl Detection {
    /// Whether this detection should arm the alarm
    pub fn arms_alarm(&self) -> bool {
        self.resolution == Resolution::Confirmed
    }

    /// Delivery priority of the event
    pub fn priority(&self) -> EventPriority {
        self.resolution.priority()
    }
}

/// Debounced shake detector with sound veto
#[derive(Debug, Clone)]
pub struct ShakeDetector {
    config: DetectorConfig,
    device_id: DeviceId,
    state: DetectorState,
}

impl ShakeDetector {
    /// Detector for one device
    pub fn new(config: DetectorConfig, device_id: DeviceId) -> Self {
        Self {
            config,
            device_id,
            state: DetectorState::Idle,
        }
    }

    /// Current state
    pub fn state(&self) -> DetectorState {
        self.state
    }

    /// Whether a session is open
    pub fn is_analyzing(&self) -> bool {
        matches!(self.state, DetectorState::Analyzing { .. })
    }

    /// Tuning in force
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Drop any open session or cooldown
    pub fn reset(&mut self) {
        self.state = DetectorState::Idle;
    }

    /// Advance by one tick
    ///
    /// `sound` must already have observed this tick's sound level.
    pub fn tick(&mut self, sample: &SensorSample, sound: &SoundSpikeTracker) -> Option<Detection> {
        let now = sample.t;
        let horizontal = sample.horizontal();
        let above = horizontal > self.config.shake_threshold;

        if let DetectorState::Cooldown { until } = self.state {
            if now < until {
                return None;
            }
            log_debug!("cooldown over at {}", now);
            self.state = DetectorState::Idle;
        }

        match self.state {
            DetectorState::Idle => {
                if above {
                    log_debug!("session opened at {} (h={})", now, horizontal);
                    self.state = DetectorState::Analyzing {
                        start: now,
                        last_above: now,
                    };
                }
                None
            }
            DetectorState::Analyzing { start, last_above } => {
                if above {
                    if now.saturating_sub(start) > self.config.min_shake_duration_ms {
                        return Some(self.resolve(sample, start, sound));
                    }
                    self.state = DetectorState::Analyzing {
                        start,
                        last_above: now,
                    };
                } else if now.saturating_sub(last_above) > self.config.shake_reset_timeout_ms {
                    log_debug!("session abandoned at {} after {} ms", now, now.saturating_sub(start));
                    self.state = DetectorState::Idle;
                }
                None
            }
            DetectorState::Cooldown { .. } => None,
        }
    }

    fn resolve(&mut self, sample: &SensorSample, start: Timestamp, sound: &SoundSpikeTracker) -> Detection {
        let now = sample.t;
        let horizontal = sample.horizontal();
        let total = sample.total();
        let correlated = sound.is_correlated(now, self.config.sound_correlation_window_ms);
        let duration = now.saturating_sub(start);

        let event = RawSeismicEvent {
            horizontal_accel: horizontal,
            total_accel: total,
            vertical_accel: sample.vertical(),
            x_accel: sample.x,
            y_accel: sample.y,
            z_accel: sample.z,
            peak_ground_acceleration: peak_ground_acceleration(
                total,
                horizontal,
                self.config.pga_horizontal_factor,
            ),
            sound_level: sample.sound,
            sound_correlated: correlated,
            duration_ms: duration.min(u32::MAX as u64) as u32,
            timestamp: now,
            device_id: self.device_id,
        };

        let resolution = if correlated {
            log_info!("shake ignored: sound spike within {} ms", self.config.sound_correlation_window_ms);
            self.state = DetectorState::Cooldown {
                until: now.saturating_add(self.config.post_ignore_cooldown_ms),
            };
            Resolution::IgnoredSoundCorrelated
        } else {
            log_info!("shake confirmed: h={} pga={} duration={} ms", horizontal, event.peak_ground_acceleration, duration);
            self.state = DetectorState::Idle;
            Resolution::Confirmed
        };

        Detection { resolution, event }
    }
}
