//! Shared fixtures for the ML integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use quakesense_core::events::{DeviceId, RawSeismicEvent, RawSeismicEventBuilder};
use quakesense_core::window::WindowSample;

/// Three-tree forest over five features, trained-looking thresholds
pub const SUPERVISED_MODEL: &str = r#"{
    "model_version": "rf-fixture-3",
    "feature_names": ["horizontal_accel", "sound_level", "frequency_dominant",
                      "wave_arrival_pattern", "duration_ms"],
    "model": {
        "family": "supervised",
        "classes": ["false_alarm", "genuine_earthquake", "uncertain"],
        "trees": [
            {"nodes": [
                {"kind": "internal", "feature": 0, "threshold": 1.5, "left": 1, "right": 2},
                {"kind": "external", "probabilities": [0.85, 0.05, 0.10]},
                {"kind": "internal", "feature": 2, "threshold": 10.0, "left": 3, "right": 4},
                {"kind": "external", "probabilities": [0.10, 0.85, 0.05]},
                {"kind": "external", "probabilities": [0.70, 0.20, 0.10]}
            ]},
            {"nodes": [
                {"kind": "internal", "feature": 1, "threshold": 1200, "left": 1, "right": 4},
                {"kind": "internal", "feature": 4, "threshold": 300, "left": 2, "right": 3},
                {"kind": "external", "probabilities": [0.60, 0.30, 0.10]},
                {"kind": "external", "probabilities": [0.15, 0.80, 0.05]},
                {"kind": "external", "probabilities": [0.90, 0.05, 0.05]}
            ]},
            {"nodes": [
                {"kind": "internal", "feature": 3, "threshold": 1.5, "left": 1, "right": 2},
                {"kind": "internal", "feature": 0, "threshold": 3.0, "left": 3, "right": 4},
                {"kind": "external", "probabilities": [0.05, 0.90, 0.05]},
                {"kind": "external", "probabilities": [0.55, 0.35, 0.10]},
                {"kind": "external", "probabilities": [0.25, 0.70, 0.05]}
            ]}
        ]
    }
}"#;

/// Two-tree isolation forest over total acceleration and duration
pub const ANOMALY_MODEL: &str = r#"{
    "model_version": "if-fixture-1",
    "feature_names": ["total_accel", "duration_ms"],
    "model": {
        "family": "anomaly",
        "sample_size": 128,
        "threshold": 0.5,
        "trees": [
            {"nodes": [
                {"kind": "internal", "feature": 0, "threshold": 4.0, "left": 1, "right": 2},
                {"kind": "external", "size": 120},
                {"kind": "external", "size": 2}
            ]},
            {"nodes": [
                {"kind": "internal", "feature": 1, "threshold": 800, "left": 1, "right": 2},
                {"kind": "external", "size": 118},
                {"kind": "external", "size": 3}
            ]}
        ]
    }
}"#;

/// Write `json` to `dir/name` and return the path
pub fn write_artifact(dir: &Path, name: &str, json: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, json).unwrap();
    path
}

pub fn event(horizontal: f32, sound: u16, correlated: bool, duration_ms: u32) -> RawSeismicEvent {
    RawSeismicEventBuilder::new(DeviceId::new("ESP32-TEST").unwrap(), 1_700_000_000_000)
        .axes(horizontal * 0.8, horizontal * 0.6, 0.5)
        .sound(sound, correlated)
        .duration_ms(duration_ms)
        .build()
}

/// 100 Hz window: vertical P pulse, then a 3 Hz horizontal S phase
pub fn quake_window(start: u64) -> Vec<WindowSample> {
    (0..200u64)
        .map(|i| {
            let t = start + i * 10;
            let s = (2.0 * std::f32::consts::PI * 3.0 * i as f32 / 100.0).sin();
            match i {
                0..=29 => WindowSample { t, x: 0.02, y: 0.02, z: 0.03 },
                30..=49 => WindowSample { t, x: 0.2, y: 0.1, z: 1.4 },
                _ => WindowSample { t, x: 2.0 + 1.5 * s, y: 1.0 + s, z: 0.3 },
            }
        })
        .collect()
}
