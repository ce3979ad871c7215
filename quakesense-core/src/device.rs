//! Edge device loop
//!
//! ## Overview
//!
//! Two layers:
//!
//! - [`EdgeMonitor`] is the pure tick function. Given `now` and this tick's
//!   raw reading (or `None` when the read failed) it runs Sampler → Sound
//!   Spike Tracker → Shake Detector → Alarm Controller in that order and
//!   returns everything that happened. No clock, no bus, no blocking, so it
//!   is the unit everything is tested against.
//!
//! - [`Device`] owns the hardware adapters and a clock. It detects the
//!   accelerometer, calibrates, and then feeds the monitor one tick at a
//!   time. A failed detection is fatal: the device shows the Fault pattern for
//!   good and every later call returns `DeviceError::Faulted`.
//!
//! ## Tick Order
//!
//! ```text
//! read ─▶ Sampler ─▶ SoundSpikeTracker.observe ─▶ WindowRecorder.record
//!                                               ─▶ ShakeDetector.tick
//!                                               ─▶ AlarmController.trigger/tick
//!                                               ─▶ SignalPattern
//! ```
//!
//! A skipped tick (read timeout or error) leaves sampler, tracker and
//! detector untouched; only the alarm keeps time.
//!
//! ## Example
//!
//! ```rust
//! use quakesense_core::calibration::CalibrationBaseline;
//! use quakesense_core::config::MonitorConfig;
//! use quakesense_core::device::EdgeMonitor;
//! use quakesense_core::events::DeviceId;
//! use quakesense_core::traits::AccelReading;
//!
//! let baseline = CalibrationBaseline::new(0.0, 0.0, 9.81, 200);
//! let mut monitor = EdgeMonitor::new(
//!     MonitorConfig::default(),
//!     DeviceId::new("lab-01").unwrap(),
//!     baseline,
//! ).unwrap();
//!
//! let mut events = 0;
//! for t in (0..400).step_by(10) {
//!     let out = monitor.step(t, Some((AccelReading::new(1.5, 0.0, 9.81), 210)));
//!     if out.emission.is_some() {
//!         events += 1;
//!     }
//! }
//! assert_eq!(events, 1);
//! ```

use crate::alarm::{AlarmController, AlarmOutput};
use crate::calibration::{calibrate, CalibrationBaseline};
use crate::config::MonitorConfig;
use crate::detector::{DetectorState, Detection, Resolution, ShakeDetector};
use crate::errors::{DeviceError, DeviceResult, SensorError};
use crate::events::{DeviceId, EventPriority, RawSeismicEvent};
use crate::sampler::{Sampler, SensorSample};
use crate::sound::SoundSpikeTracker;
use crate::time::{TimeSource, Timestamp};
use crate::traits::{AccelReading, Accelerometer, DelayMs, Indicator, SignalPattern, SoundSensor};
use crate::window::{RawWindow, WindowRecorder};

/// An event ready for transport
#[derive(Debug, Clone)]
pub struct Emission {
    /// The wire event
    pub event: RawSeismicEvent,
    /// How the session ended
    pub resolution: Resolution,
    /// Motion trace around the session
    pub window: RawWindow,
}

impl Emission {
    /// Delivery priority
    pub fn priority(&self) -> EventPriority {
        self.resolution.priority()
    }
}

/// Everything one tick produced
#[derive(Debug, Clone)]
pub struct TickOutput {
    /// Detector state after the tick
    pub state: DetectorState,
    /// Sample computed this tick, `None` if the tick was skipped
    pub sample: Option<SensorSample>,
    /// Event resolved this tick
    pub emission: Option<Emission>,
    /// Alarm output for this tick
    pub alarm: AlarmOutput,
    /// Pattern to show
    pub signal: SignalPattern,
}

/// Pure per-tick pipeline of the edge device
pub struct EdgeMonitor {
    config: MonitorConfig,
    sampler: Sampler,
    tracker: SoundSpikeTracker,
    detector: ShakeDetector,
    alarm: AlarmController,
    recorder: WindowRecorder,
}

impl EdgeMonitor {
    /// Armed monitor around a calibrated baseline
    pub fn new(
        config: MonitorConfig,
        device_id: DeviceId,
        baseline: CalibrationBaseline,
    ) -> Result<Self, crate::errors::ConfigError> {
        config.validate()?;

        Ok(Self {
            config,
            sampler: Sampler::new(baseline, config.sound_window.0),
            tracker: SoundSpikeTracker::new(baseline.sound, config.detector.sound_spike_threshold),
            detector: ShakeDetector::new(config.detector, device_id),
            alarm: AlarmController::new(config.alarm),
            recorder: WindowRecorder::default(),
        })
    }

    /// Configuration in force
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Baseline in force
    pub fn baseline(&self) -> &CalibrationBaseline {
        self.sampler.baseline()
    }

    /// Detector state
    pub fn state(&self) -> DetectorState {
        self.detector.state()
    }

    /// Install a new baseline between ticks
    ///
    /// Any open session is dropped and the window history cleared, since
    /// both were measured against the old baseline.
    pub fn recalibrate(&mut self, baseline: CalibrationBaseline) {
        self.sampler.replace_baseline(baseline);
        self.tracker.rebase(baseline.sound);
        self.detector.reset();
        self.recorder.clear();
    }

    /// Run one tick
    ///
    /// `reading` is `None` when this tick's sensor read failed or timed out.
    pub fn step(&mut self, now: Timestamp, reading: Option<(AccelReading, u16)>) -> TickOutput {
        let mut sample = None;
        let mut emission = None;

        if let Some((accel, raw_sound)) = reading {
            let s = self.sampler.sample(accel, raw_sound, now);
            self.tracker.observe(s.sound, now);
            self.recorder.record(&s);

            if let Some(detection) = self.detector.tick(&s, &self.tracker) {
                if detection.arms_alarm() {
                    self.alarm.trigger(now);
                }
                emission = Some(self.emit(detection));
            }
            sample = Some(s);
        } else {
            log_debug!("tick at {} skipped: no reading", now);
        }

        let alarm = self.alarm.tick(now);
        let state = self.detector.state();

        TickOutput {
            state,
            sample,
            emission,
            alarm,
            signal: signal_for(state, alarm),
        }
    }

    fn emit(&self, detection: Detection) -> Emission {
        Emission {
            event: detection.event,
            resolution: detection.resolution,
            window: self.recorder.capture_since(detection.event.session_start()),
        }
    }
}

/// Alarm outranks the detector; an open session shows Analyzing
fn signal_for(state: DetectorState, alarm: AlarmOutput) -> SignalPattern {
    match alarm {
        AlarmOutput::On => SignalPattern::Alarm { lit: true },
        AlarmOutput::Off => SignalPattern::Alarm { lit: false },
        AlarmOutput::Silent => match state {
            DetectorState::Analyzing { .. } => SignalPattern::Analyzing,
            _ => SignalPattern::Idle,
        },
    }
}

/// Commands accepted between ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Re-run baseline calibration with the configured parameters
    Recalibrate,
}

/// Hardware-facing driver around an `EdgeMonitor`
pub struct Device<A, S, I, D, T> {
    accel: A,
    sound: S,
    indicator: I,
    delay: D,
    clock: T,
    config: MonitorConfig,
    device_id: DeviceId,
    monitor: Option<EdgeMonitor>,
    fault: Option<DeviceError>,
}

impl<A, S, I, D, T> Device<A, S, I, D, T>
where
    A: Accelerometer,
    S: SoundSensor,
    I: Indicator,
    D: DelayMs,
    T: TimeSource,
{
    /// Unstarted device
    pub fn new(
        accel: A,
        sound: S,
        indicator: I,
        delay: D,
        clock: T,
        config: MonitorConfig,
        device_id: DeviceId,
    ) -> Self {
        Self {
            accel,
            sound,
            indicator,
            delay,
            clock,
            config,
            device_id,
            monitor: None,
            fault: None,
        }
    }

    /// Detect, calibrate and arm
    ///
    /// Any failure here is fatal and latches the Fault pattern.
    pub fn start(&mut self) -> DeviceResult<()> {
        if self.fault.is_some() {
            self.indicator.show(SignalPattern::Fault);
            return Err(DeviceError::Faulted);
        }

        if let Err(err) = self.config.validate() {
            return Err(self.enter_fault(err.into()));
        }

        if let Err(err) = self.accel.detect() {
            log_error!("accelerometer not detected: {}", err);
            return Err(self.enter_fault(err.into()));
        }

        self.indicator.show(SignalPattern::Calibrating);
        let baseline = match calibrate(&mut self.accel, &mut self.sound, &mut self.delay, &self.config.calibration) {
            Ok(baseline) => baseline,
            Err(err) => {
                log_error!("startup calibration failed: {}", err);
                return Err(self.enter_fault(err.into()));
            }
        };

        let monitor = match EdgeMonitor::new(self.config, self.device_id, baseline) {
            Ok(monitor) => monitor,
            Err(err) => return Err(self.enter_fault(err.into())),
        };
        self.monitor = Some(monitor);
        self.indicator.show(SignalPattern::Idle);
        log_info!("device {} armed", self.device_id);
        Ok(())
    }

    /// Read sensors and run one tick
    pub fn tick(&mut self) -> DeviceResult<TickOutput> {
        if self.fault.is_some() {
            self.indicator.show(SignalPattern::Fault);
            return Err(DeviceError::Faulted);
        }

        if self.monitor.is_none() {
            return Err(DeviceError::NotStarted);
        }

        let now = self.clock.now();
        let reading = match (read(self.accel.read_accel()), read(self.sound.read_sound())) {
            (Some(accel), Some(level)) => Some((accel, level)),
            _ => None,
        };

        let monitor = self.monitor.as_mut().ok_or(DeviceError::NotStarted)?;
        let out = monitor.step(now, reading);
        self.indicator.show(out.signal);
        Ok(out)
    }

    /// Handle a command between ticks
    ///
    /// A failed recalibration keeps the previous baseline.
    pub fn handle(&mut self, command: Command) -> DeviceResult<()> {
        if self.fault.is_some() {
            return Err(DeviceError::Faulted);
        }
        if self.monitor.is_none() {
            return Err(DeviceError::NotStarted);
        }

        match command {
            Command::Recalibrate => {
                self.indicator.show(SignalPattern::Calibrating);
                let result = calibrate(&mut self.accel, &mut self.sound, &mut self.delay, &self.config.calibration);
                self.indicator.show(SignalPattern::Idle);

                let baseline = result.map_err(|err| {
                    log_warn!("recalibration failed, keeping previous baseline: {}", err);
                    DeviceError::from(err)
                })?;
                if let Some(monitor) = self.monitor.as_mut() {
                    monitor.recalibrate(baseline);
                }
                Ok(())
            }
        }
    }

    /// Latched fatal error, if any
    pub fn fault(&self) -> Option<DeviceError> {
        self.fault
    }

    /// Monitor, once started
    pub fn monitor(&self) -> Option<&EdgeMonitor> {
        self.monitor.as_ref()
    }

    /// Mutable access to the clock (simulation and tests)
    pub fn clock_mut(&mut self) -> &mut T {
        &mut self.clock
    }

    /// Indicator, for inspection
    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    fn enter_fault(&mut self, err: DeviceError) -> DeviceError {
        self.fault = Some(err);
        self.monitor = None;
        self.indicator.show(SignalPattern::Fault);
        err
    }
}

/// `WouldBlock` and errors both skip the tick
fn read<V>(result: nb::Result<V, SensorError>) -> Option<V> {
    match result {
        Ok(value) => Some(value),
        Err(nb::Error::WouldBlock) => None,
        Err(nb::Error::Other(err)) => {
            log_warn!("sensor read failed: {}", err);
            None
        }
    }
}
