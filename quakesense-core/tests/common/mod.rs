//! Simulated hardware for integration tests
//!
//! Adapters hand out shared handles (`Rc<Cell<_>>`) so a test can change
//! what the sensors report after the `Device` has taken ownership of them.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use quakesense_core::{
    errors::SensorError,
    traits::{AccelReading, Accelerometer, DelayMs, Indicator, SignalPattern, SoundSensor},
};

/// Resting reading with gravity on z
pub const REST: AccelReading = AccelReading::new(0.0, 0.0, 9.81);

/// Ambient sound level used by the fixtures
pub const AMBIENT_SOUND: u16 = 180;

/// What the simulated accelerometer does on the next reads
#[derive(Clone)]
pub struct AccelHandle {
    pub reading: Rc<Cell<AccelReading>>,
    pub failures: Rc<Cell<u32>>,
    pub timeouts: Rc<Cell<u32>>,
}

impl AccelHandle {
    pub fn set(&self, reading: AccelReading) {
        self.reading.set(reading);
    }

    pub fn fail_next(&self, n: u32) {
        self.failures.set(n);
    }

    pub fn timeout_next(&self, n: u32) {
        self.timeouts.set(n);
    }
}

pub struct SimAccel {
    present: bool,
    handle: AccelHandle,
}

impl SimAccel {
    pub fn new(present: bool) -> (Self, AccelHandle) {
        let handle = AccelHandle {
            reading: Rc::new(Cell::new(REST)),
            failures: Rc::new(Cell::new(0)),
            timeouts: Rc::new(Cell::new(0)),
        };
        (
            Self {
                present,
                handle: handle.clone(),
            },
            handle,
        )
    }
}

impl Accelerometer for SimAccel {
    fn detect(&mut self) -> Result<(), SensorError> {
        if self.present {
            Ok(())
        } else {
            Err(SensorError::NotDetected { sensor: "accelerometer" })
        }
    }

    fn read_accel(&mut self) -> nb::Result<AccelReading, SensorError> {
        if !self.present {
            return Err(nb::Error::Other(SensorError::NotDetected { sensor: "accelerometer" }));
        }
        let timeouts = self.handle.timeouts.get();
        if timeouts > 0 {
            self.handle.timeouts.set(timeouts - 1);
            return Err(nb::Error::WouldBlock);
        }
        let failures = self.handle.failures.get();
        if failures > 0 {
            self.handle.failures.set(failures - 1);
            return Err(nb::Error::Other(SensorError::ReadFailed { reason: "bus error" }));
        }
        Ok(self.handle.reading.get())
    }
}

pub struct SimSound {
    level: Rc<Cell<u16>>,
}

impl SimSound {
    pub fn new() -> (Self, Rc<Cell<u16>>) {
        let level = Rc::new(Cell::new(AMBIENT_SOUND));
        (Self { level: level.clone() }, level)
    }
}

impl SoundSensor for SimSound {
    fn read_sound(&mut self) -> nb::Result<u16, SensorError> {
        Ok(self.level.get())
    }
}

/// Records every pattern shown
#[derive(Default)]
pub struct RecordingIndicator {
    pub shown: Rc<RefCell<Vec<SignalPattern>>>,
}

impl RecordingIndicator {
    pub fn new() -> (Self, Rc<RefCell<Vec<SignalPattern>>>) {
        let shown = Rc::new(RefCell::new(Vec::new()));
        (Self { shown: shown.clone() }, shown)
    }
}

impl Indicator for RecordingIndicator {
    fn show(&mut self, pattern: SignalPattern) {
        self.shown.borrow_mut().push(pattern);
    }
}

/// Delay that only counts
#[derive(Default)]
pub struct NoDelay {
    pub total_ms: u64,
}

impl DelayMs for NoDelay {
    fn delay_ms(&mut self, ms: u32) {
        self.total_ms += ms as u64;
    }
}
