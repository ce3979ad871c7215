//! Shake Detection Example
//!
//! Feeds three synthetic scenarios through the pure `EdgeMonitor` tick
//! function and prints what the edge would emit.
//!
//! ## What You'll Learn
//!
//! - Building a monitor from a detector preset and a baseline
//! - How the debounce ignores short bumps
//! - How a sound spike turns a shake into a low-priority, unalarmed event
//!
//! ## Running the Example
//!
//! ```bash
//! cargo run --example 01_shake_detection
//! ```

use quakesense_core::{
    calibration::CalibrationBaseline,
    config::{DetectorConfig, MonitorConfig},
    device::EdgeMonitor,
    events::DeviceId,
    traits::AccelReading,
};

/// Tick spacing of the simulated loop (100 Hz)
const TICK_MS: u64 = 10;

fn run(name: &str, preset: DetectorConfig, scenario: impl Fn(u64) -> (AccelReading, u16)) {
    println!("--- {} ---", name);

    let baseline = CalibrationBaseline::new(0.0, 0.0, 9.81, 180);
    let device_id = DeviceId::new("SYNTHETIC_GEN").expect("short id");
    let config = MonitorConfig::default().with_detector(preset);
    let mut monitor = EdgeMonitor::new(config, device_id, baseline).expect("valid config");

    let mut emitted = 0;
    for tick in 0..150 {
        let now = tick * TICK_MS;
        let out = monitor.step(now, Some(scenario(now)));

        if let Some(emission) = out.emission {
            emitted += 1;
            let e = emission.event;
            println!(
                "  t={:5}ms {:?} h={:.2} pga={:.2} dur={}ms sound={} window={} samples",
                now,
                emission.resolution,
                e.horizontal_accel,
                e.peak_ground_acceleration,
                e.duration_ms,
                e.sound_level,
                emission.window.len(),
            );
        }
    }

    if emitted == 0 {
        println!("  no event");
    }
    println!();
}

fn main() {
    println!("QuakeSense Shake Detection Example");
    println!("==================================\n");

    // Sustained 2 Hz sway well above threshold
    run("rolling ground motion", DetectorConfig::firmware_a(), |t| {
        let phase = t as f32 / 1000.0 * 2.0 * core::f32::consts::PI;
        (AccelReading::new(1.2 + 0.3 * phase.sin(), 0.8, 9.81 + 0.4 * phase.cos()), 190)
    });

    // 100 ms door bump: opens a session, never lasts long enough
    run("door bump", DetectorConfig::firmware_a(), |t| {
        let x = if (200..300).contains(&t) { 2.5 } else { 0.05 };
        (AccelReading::new(x, 0.0, 9.81), 190)
    });

    // Same motion, but a loud bang at t=300ms
    run("shake with loud bang", DetectorConfig::firmware_b(), |t| {
        let sound = if (300..330).contains(&t) { 3_900 } else { 190 };
        (AccelReading::new(1.4, 0.9, 9.81), sound)
    });
}
