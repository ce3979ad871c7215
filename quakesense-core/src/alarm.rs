//! Alarm Controller
//!
//! Once a confirmed shake arms it, the alarm runs on its own clock: it blinks
//! the LED and buzzer every `blink_interval_ms` until `end_time`, then forces
//! the outputs back to the safe (silent) pattern. It does not watch the
//! detector. A new confirmation while the alarm is running only pushes
//! `end_time` out; the blink phase carries on undisturbed.

use crate::config::AlarmConfig;
use crate::time::Timestamp;

/// Output requested by the alarm for this tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlarmOutput {
    /// Not alarming, outputs in the safe pattern
    Silent,
    /// Alarming, LED and buzzer on
    On,
    /// Alarming, LED and buzzer off
    Off,
}

impl AlarmOutput {
    /// Whether the alarm is running
    pub fn is_active(&self) -> bool {
        !matches!(self, AlarmOutput::Silent)
    }
}

/// Alarm timing state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AlarmState {
    /// Alarm is idle once `now >= end_time`
    pub end_time: Timestamp,
    /// Current blink phase
    pub blink_on: bool,
    /// Time of the latest blink flip
    pub last_blink: Timestamp,
}

/// Bounded-duration blinking alarm
#[derive(Debug, Clone)]
pub struct AlarmController {
    config: AlarmConfig,
    state: AlarmState,
}

impl AlarmController {
    /// Idle alarm
    pub fn new(config: AlarmConfig) -> Self {
        Self {
            config,
            state: AlarmState::default(),
        }
    }

    /// Timing state, for diagnostics
    pub fn state(&self) -> &AlarmState {
        &self.state
    }

    /// Whether the alarm is running at `now`
    pub fn is_active(&self, now: Timestamp) -> bool {
        now < self.state.end_time
    }

    /// Start the alarm, or extend it if already running
    pub fn trigger(&mut self, now: Timestamp) {
        let end = now.saturating_add(self.config.duration_ms);

        if self.is_active(now) {
            self.state.end_time = self.state.end_time.max(end);
            log_debug!("alarm extended to {}", self.state.end_time);
        } else {
            self.state = AlarmState {
                end_time: end,
                blink_on: true,
                last_blink: now,
            };
            log_info!("alarm started, ends at {}", end);
        }
    }

    /// Advance the blink pattern and report the output for this tick
    pub fn tick(&mut self, now: Timestamp) -> AlarmOutput {
        if !self.is_active(now) {
            self.state.blink_on = false;
            return AlarmOutput::Silent;
        }

        if now.saturating_sub(self.state.last_blink) >= self.config.blink_interval_ms {
            self.state.blink_on = !self.state.blink_on;
            self.state.last_blink = now;
        }

        if self.state.blink_on {
            AlarmOutput::On
        } else {
            AlarmOutput::Off
        }
    }

    /// Stop immediately and return to the safe pattern
    pub fn silence(&mut self) {
        self.state = AlarmState::default();
    }
}
