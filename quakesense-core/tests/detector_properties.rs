//! Property tests for the shake detector and event math

use proptest::prelude::*;
use quakesense_core::{
    config::DetectorConfig,
    detector::{Resolution, ShakeDetector},
    events::{peak_ground_acceleration, DeviceId, RawSeismicEventBuilder},
    sampler::SensorSample,
    sound::SoundSpikeTracker,
};

fn detector(config: DetectorConfig) -> ShakeDetector {
    ShakeDetector::new(config, DeviceId::new("prop").unwrap())
}

fn quiet_tracker() -> SoundSpikeTracker {
    SoundSpikeTracker::new(200, 500)
}

fn sample(x: f32, y: f32, z: f32, t: u64) -> SensorSample {
    SensorSample { x, y, z, sound: 200, t }
}

/// Per-tick horizontal components, kept below the threshold by construction
fn sub_threshold(threshold: f32) -> impl Strategy<Value = (f32, f32, f32)> {
    (0.0f32..1.0, 0.0f32..std::f32::consts::TAU, 0.0f32..5.0).prop_map(move |(r, angle, z)| {
        let h = r * threshold * 0.95;
        (h * angle.cos(), h * angle.sin(), z)
    })
}

proptest! {
    #[test]
    fn sub_threshold_motion_never_emits(
        axes in prop::collection::vec(sub_threshold(0.7), 1..400),
        step in 1u64..50,
    ) {
        let mut d = detector(DetectorConfig::firmware_a());
        let tracker = quiet_tracker();

        for (i, (x, y, z)) in axes.into_iter().enumerate() {
            let s = sample(x.abs(), y.abs(), z, i as u64 * step);
            prop_assert!(d.tick(&s, &tracker).is_none());
            prop_assert!(!d.is_analyzing());
        }
    }

    #[test]
    fn one_event_per_session(
        h in 0.9f32..5.0,
        ticks in 30usize..200,
    ) {
        // A session of continuous motion resolves exactly once, then a new
        // session must wait at least the minimum duration again
        let config = DetectorConfig::firmware_a();
        let mut d = detector(config);
        let tracker = quiet_tracker();

        let mut emitted = Vec::new();
        for i in 0..ticks {
            let t = i as u64 * 10;
            if let Some(det) = d.tick(&sample(h, 0.0, 0.0, t), &tracker) {
                prop_assert_eq!(det.resolution, Resolution::Confirmed);
                emitted.push(t);
            }
        }

        for pair in emitted.windows(2) {
            prop_assert!(pair[1] - pair[0] > config.min_shake_duration_ms);
        }
    }

    #[test]
    fn bursts_shorter_than_minimum_never_emit(
        burst_ticks in 1u64..25,
        h in 0.8f32..10.0,
        repeats in 1usize..6,
    ) {
        // Bursts of at most 240 ms separated by quiet gaps longer than the reset
        let config = DetectorConfig::firmware_a();
        let mut d = detector(config);
        let tracker = quiet_tracker();
        let gap_ticks = config.shake_reset_timeout_ms / 10 + 2;

        let mut t = 0;
        for _ in 0..repeats {
            for _ in 0..burst_ticks {
                prop_assert!(d.tick(&sample(h, 0.0, 0.0, t), &tracker).is_none());
                t += 10;
            }
            for _ in 0..gap_ticks {
                prop_assert!(d.tick(&sample(0.0, 0.0, 0.0, t), &tracker).is_none());
                t += 10;
            }
        }
    }

    #[test]
    fn sound_spike_always_vetoes(
        h in 0.9f32..5.0,
        spike_offset in 0u64..900,
    ) {
        let config = DetectorConfig::firmware_a();
        let mut d = detector(config);
        let mut tracker = quiet_tracker();
        tracker.observe(1_000, spike_offset);

        let mut resolution = None;
        for i in 0..40u64 {
            let t = spike_offset + i * 10;
            if let Some(det) = d.tick(&sample(h, 0.0, 0.0, t), &tracker) {
                resolution = Some(det.resolution);
                break;
            }
        }

        prop_assert_eq!(resolution, Some(Resolution::IgnoredSoundCorrelated));
    }

    #[test]
    fn pga_is_max_of_total_and_scaled_horizontal(
        x in 0.0f32..20.0,
        y in 0.0f32..20.0,
        z in 0.0f32..20.0,
    ) {
        let event = RawSeismicEventBuilder::new(DeviceId::new("prop").unwrap(), 0)
            .axes(x, y, z)
            .build();

        let expected = event.total_accel.max(event.horizontal_accel * 1.2);
        prop_assert!((event.peak_ground_acceleration - expected).abs() < 1e-4);
        prop_assert!(event.peak_ground_acceleration >= event.total_accel);
        prop_assert!(event.horizontal_accel <= event.total_accel + 1e-4);
        prop_assert_eq!(
            peak_ground_acceleration(event.total_accel, event.horizontal_accel, 1.2),
            event.peak_ground_acceleration
        );
    }
}
