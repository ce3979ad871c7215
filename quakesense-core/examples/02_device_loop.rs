//! Device Loop Example
//!
//! Runs the full `Device` driver (detection, calibration, cooperative tick
//! loop, recalibration command) against simulated hardware.
//!
//! ## What You'll Learn
//!
//! - Implementing the hardware traits for your board
//! - Driving `Device::tick` from a fixed-rate loop
//! - Reacting to emissions and indicator patterns
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 02_device_loop
//! ```

use quakesense_core::{
    config::{CalibrationConfig, MonitorConfig},
    device::{Command, Device},
    errors::SensorError,
    events::DeviceId,
    time::{FixedTime, TimeSource},
    traits::{AccelReading, Accelerometer, DelayMs, Indicator, SignalPattern, SoundSensor},
};

const TICK_MS: u64 = 10;

/// Board simulation: quiet table, a quake between 2 s and 3 s, a slammed
/// door (with a bang) at 5 s
struct Board {
    t: u64,
}

impl Board {
    fn motion(&self) -> (AccelReading, u16) {
        let t = self.t;
        let wobble = ((t % 40) as f32 / 40.0 - 0.5) * 0.02;

        if (2_000..3_000).contains(&t) {
            let phase = t as f32 / 1000.0 * 3.0 * core::f32::consts::TAU;
            (AccelReading::new(1.6 * phase.sin(), 1.1 * phase.cos(), 9.81 + 0.5 * phase.sin()), 220)
        } else if (5_000..5_400).contains(&t) {
            let sound = if t < 5_060 { 3_800 } else { 400 };
            (AccelReading::new(2.2, 0.1, 9.81), sound)
        } else {
            (AccelReading::new(wobble, -wobble, 9.81), 200)
        }
    }
}

struct SimAccel<'a>(&'a std::cell::Cell<u64>);
struct SimSound<'a>(&'a std::cell::Cell<u64>);

impl Accelerometer for SimAccel<'_> {
    fn detect(&mut self) -> Result<(), SensorError> {
        Ok(())
    }

    fn read_accel(&mut self) -> nb::Result<AccelReading, SensorError> {
        Ok(Board { t: self.0.get() }.motion().0)
    }
}

impl SoundSensor for SimSound<'_> {
    fn read_sound(&mut self) -> nb::Result<u16, SensorError> {
        Ok(Board { t: self.0.get() }.motion().1)
    }
}

struct ConsoleLed {
    last: Option<SignalPattern>,
}

impl Indicator for ConsoleLed {
    fn show(&mut self, pattern: SignalPattern) {
        // Only print pattern changes, ignore blink phase
        let kind = core::mem::discriminant(&pattern);
        if self.last.map(|p| core::mem::discriminant(&p)) != Some(kind) {
            println!("  [led] {:?}", pattern);
        }
        self.last = Some(pattern);
    }
}

struct NoDelay;

impl DelayMs for NoDelay {
    fn delay_ms(&mut self, _ms: u32) {}
}

fn main() {
    println!("QuakeSense Device Loop Example");
    println!("==============================\n");

    let board_time = std::cell::Cell::new(0u64);
    let config = MonitorConfig::default()
        .with_calibration(CalibrationConfig::default().with_sample_count(50));

    let mut device = Device::new(
        SimAccel(&board_time),
        SimSound(&board_time),
        ConsoleLed { last: None },
        NoDelay,
        FixedTime::new(0),
        config,
        DeviceId::new("SIM-LOOP").expect("short id"),
    );

    if let Err(e) = device.start() {
        eprintln!("startup failed: {}", e);
        return;
    }
    println!("  baseline: {:?}", device.monitor().map(|m| *m.baseline()));

    for _ in 0..1_200 {
        device.clock_mut().advance(TICK_MS);
        let now = device.clock_mut().now();
        board_time.set(now);

        match device.tick() {
            Ok(out) => {
                if let Some(emission) = out.emission {
                    println!(
                        "  t={:5}ms {:?} ({:?}) h={:.2} sound={} window={}",
                        now,
                        emission.resolution,
                        emission.priority(),
                        emission.event.horizontal_accel,
                        emission.event.sound_level,
                        emission.window.len()
                    );
                }
            }
            Err(e) => {
                eprintln!("tick failed: {}", e);
                break;
            }
        }

        if now == 8_000 {
            println!("  recalibrating at {}ms", now);
            if let Err(e) = device.handle(Command::Recalibrate) {
                eprintln!("  recalibration failed: {}", e);
            }
        }
    }
}
