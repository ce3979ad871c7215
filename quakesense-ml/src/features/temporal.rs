//! Temporal and wave-arrival features
//!
//! A real quake arrives as a compressional P phase, strongest on the
//! vertical axis, followed by a shear S phase that dominates the horizontal
//! axes. A door slam hits every axis at once. With a window the extractor
//! looks for that ordering directly; without one it can only tell which
//! components were strong at the confirming tick.

use serde::{Deserialize, Serialize};

use quakesense_core::events::RawSeismicEvent;
use quakesense_core::window::WindowSample;

/// How the P and S phases arrived
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WaveArrivalPattern {
    /// Both phases, P clearly first
    PThenS,
    /// Both phases, no usable ordering
    Simultaneous,
    /// Only one phase
    SinglePeak,
    /// Neither phase
    Unknown,
}

impl WaveArrivalPattern {
    /// Numeric encoding used in the model input
    pub fn encode(&self) -> f32 {
        match self {
            WaveArrivalPattern::PThenS => 2.0,
            WaveArrivalPattern::Simultaneous => 1.0,
            WaveArrivalPattern::SinglePeak => 0.5,
            WaveArrivalPattern::Unknown => 0.0,
        }
    }

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            WaveArrivalPattern::PThenS => "p_then_s",
            WaveArrivalPattern::Simultaneous => "simultaneous",
            WaveArrivalPattern::SinglePeak => "single_peak",
            WaveArrivalPattern::Unknown => "unknown",
        }
    }
}

/// Outcome of phase detection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaveDetection {
    /// A vertical-dominant pulse was seen
    pub p_wave: bool,
    /// A horizontal-dominant pulse was seen
    pub s_wave: bool,
    /// Arrival pattern
    pub pattern: WaveArrivalPattern,
}

impl WaveDetection {
    fn unordered(p_wave: bool, s_wave: bool) -> Self {
        let pattern = match (p_wave, s_wave) {
            (true, true) => WaveArrivalPattern::Simultaneous,
            (true, false) | (false, true) => WaveArrivalPattern::SinglePeak,
            (false, false) => WaveArrivalPattern::Unknown,
        };
        Self { p_wave, s_wave, pattern }
    }
}

/// Thresholds for phase detection
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveThresholds {
    /// Fraction of the peak magnitude a sample must reach to count as a pulse
    pub amplitude_gate: f32,
    /// P must lead S by at least this much for `p_then_s` (ms)
    pub min_ps_separation_ms: u64,
    /// Without a window: P when vertical exceeds this fraction of horizontal
    pub p_vertical_ratio: f32,
    /// Without a window: S when horizontal exceeds this (m/s²)
    pub s_horizontal_accel: f32,
}

impl Default for WaveThresholds {
    fn default() -> Self {
        Self {
            amplitude_gate: 0.3,
            min_ps_separation_ms: 50,
            p_vertical_ratio: 0.7,
            s_horizontal_accel: 2.0,
        }
    }
}

/// Population variance of the magnitude series, 0 for fewer than 2 samples
pub fn magnitude_variance(series: &[f32]) -> f32 {
    if series.len() < 2 {
        return 0.0;
    }
    let n = series.len() as f32;
    let mean = series.iter().sum::<f32>() / n;
    series.iter().map(|x| (x - mean) * (x - mean)).sum::<f32>() / n
}

/// Phase detection on a raw window
pub fn detect_in_window(window: &[WindowSample], thresholds: &WaveThresholds) -> WaveDetection {
    let peak = window.iter().map(WindowSample::magnitude).fold(0.0f32, f32::max);
    if peak <= 0.0 {
        return WaveDetection::unordered(false, false);
    }
    let gate = thresholds.amplitude_gate * peak;

    let pulses = || window.iter().filter(move |s| s.magnitude() >= gate);
    let p = pulses().find(|s| s.z >= s.horizontal());
    let s = pulses().find(|s| s.horizontal() > s.z);

    match (p, s) {
        (Some(p), Some(s)) if s.t >= p.t + thresholds.min_ps_separation_ms => WaveDetection {
            p_wave: true,
            s_wave: true,
            pattern: WaveArrivalPattern::PThenS,
        },
        (p, s) => WaveDetection::unordered(p.is_some(), s.is_some()),
    }
}

/// Phase detection from the confirming tick alone
///
/// There is no timing information, so the best this can say is
/// `simultaneous`.
pub fn detect_from_event(event: &RawSeismicEvent, thresholds: &WaveThresholds) -> WaveDetection {
    let p_wave = event.vertical_accel > thresholds.p_vertical_ratio * event.horizontal_accel;
    let s_wave = event.horizontal_accel > thresholds.s_horizontal_accel;
    WaveDetection::unordered(p_wave, s_wave)
}
