//! Feature Extraction
//!
//! ## Overview
//!
//! Turns one `RawSeismicEvent` (and, when the edge attached it, the raw
//! motion window) into the full [`FeatureVector`] the classifier scores.
//!
//! ```text
//! RawSeismicEvent ──┬──────────────────────────────▶ 12 raw fields
//!                   │
//! raw window? ──────┼─ yes ─▶ FFT of |a(t)|      ──▶ frequency_dominant / mean
//!                   │         variance of |a(t)|  ──▶ temporal_variance
//!                   │         P/S pulse search    ──▶ p/s flags, arrival pattern
//!                   │
//!                   └─ no ──▶ band estimate (marked Estimated)
//!                             variance 0, P/S from the confirming tick
//! ```
//!
//! ## Determinism
//!
//! Extraction is a pure function of its inputs. There is no history between
//! calls, and the FFT plan is created per call so the extractor can be shared
//! across threads without locking.
//!
//! ## Model Input
//!
//! Models name the features they were trained on. [`FeatureVector::value`]
//! projects a vector onto any name in [`MODEL_FEATURES`].

pub mod spectral;
pub mod temporal;

use serde::{Deserialize, Serialize};

use quakesense_core::constants::sensors::NOMINAL_SAMPLE_RATE_HZ;
use quakesense_core::events::RawSeismicEvent;
use quakesense_core::window::WindowSample;

use crate::{MLError, MLResult};
pub use spectral::{FallbackBands, SpectralSummary};
pub use temporal::{WaveArrivalPattern, WaveDetection, WaveThresholds};

/// Every feature name a model may reference, in the canonical training order
pub const MODEL_FEATURES: [&str; 17] = [
    "horizontal_accel",
    "total_accel",
    "sound_level",
    "accel_to_sound_ratio",
    "sound_correlated",
    "vertical_accel",
    "x_accel",
    "y_accel",
    "z_accel",
    "peak_ground_acceleration",
    "frequency_dominant",
    "frequency_mean",
    "duration_ms",
    "wave_arrival_pattern",
    "temporal_variance",
    "p_wave_detected",
    "s_wave_detected",
];

/// Index of a model feature name
pub fn feature_index(name: &str) -> Option<usize> {
    MODEL_FEATURES.iter().position(|n| *n == name)
}

/// Where the frequency features came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrequencySource {
    /// Measured from the raw window spectrum
    #[default]
    Measured,
    /// Band estimate without a usable window
    Estimated,
}

/// Raw event plus derived features
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    /// The twelve edge fields
    #[serde(flatten)]
    pub raw: RawSeismicEvent,
    /// Strongest frequency (Hz)
    pub frequency_dominant: f32,
    /// Magnitude-weighted mean frequency (Hz)
    pub frequency_mean: f32,
    /// Variance of acceleration magnitude over the window
    pub temporal_variance: f32,
    /// P/S arrival pattern
    pub wave_arrival_pattern: WaveArrivalPattern,
    /// Vertical-dominant pulse seen
    pub p_wave_detected: bool,
    /// Horizontal-dominant pulse seen
    pub s_wave_detected: bool,
    /// Not part of the wire format
    #[serde(skip)]
    pub frequency_source: FrequencySource,
}

impl FeatureVector {
    /// `horizontal_accel / max(sound_level, 1)`
    pub fn accel_to_sound_ratio(&self) -> f32 {
        self.raw.horizontal_accel / (self.raw.sound_level.max(1) as f32)
    }

    /// Whether the frequency features are an estimate
    pub fn is_frequency_estimated(&self) -> bool {
        self.frequency_source == FrequencySource::Estimated
    }

    /// Value of a model feature by name
    pub fn value(&self, name: &str) -> Option<f32> {
        feature_index(name).and_then(|i| self.value_at(i))
    }

    /// Value of a model feature by index into [`MODEL_FEATURES`]
    pub fn value_at(&self, index: usize) -> Option<f32> {
        let flag = |b: bool| if b { 1.0 } else { 0.0 };
        let r = &self.raw;

        Some(match index {
            0 => r.horizontal_accel,
            1 => r.total_accel,
            2 => r.sound_level as f32,
            3 => self.accel_to_sound_ratio(),
            4 => flag(r.sound_correlated),
            5 => r.vertical_accel,
            6 => r.x_accel,
            7 => r.y_accel,
            8 => r.z_accel,
            9 => r.peak_ground_acceleration,
            10 => self.frequency_dominant,
            11 => self.frequency_mean,
            12 => r.duration_ms as f32,
            13 => self.wave_arrival_pattern.encode(),
            14 => self.temporal_variance,
            15 => flag(self.p_wave_detected),
            16 => flag(self.s_wave_detected),
            _ => return None,
        })
    }

    /// Project onto resolved feature indices, in order
    pub fn project(&self, indices: &[usize]) -> MLResult<Vec<f32>> {
        indices
            .iter()
            .map(|&i| self.value_at(i).ok_or(MLError::InvalidFeature(i)))
            .collect()
    }
}

/// Extractor tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Rate assumed when timestamps cannot tell (Hz)
    pub nominal_sample_rate_hz: f32,
    /// Windows shorter than this are treated as absent
    pub min_window_samples: usize,
    /// No-window frequency estimate
    pub fallback: FallbackBands,
    /// Phase detection
    pub waves: WaveThresholds,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            nominal_sample_rate_hz: NOMINAL_SAMPLE_RATE_HZ as f32,
            min_window_samples: 4,
            fallback: FallbackBands::default(),
            waves: WaveThresholds::default(),
        }
    }
}

impl ExtractorConfig {
    /// Set the nominal sample rate
    pub fn with_sample_rate_hz(mut self, hz: f32) -> Self {
        self.nominal_sample_rate_hz = hz;
        self
    }

    /// Set the shortest usable window
    pub fn with_min_window_samples(mut self, n: usize) -> Self {
        self.min_window_samples = n;
        self
    }

    /// Set the phase thresholds
    pub fn with_waves(mut self, waves: WaveThresholds) -> Self {
        self.waves = waves;
        self
    }

    /// Check ranges
    pub fn validate(&self) -> MLResult<()> {
        if !(self.nominal_sample_rate_hz > 0.0) {
            return Err(MLError::InvalidConfig("nominal_sample_rate_hz must be positive".into()));
        }
        if self.min_window_samples < 2 {
            return Err(MLError::InvalidConfig("min_window_samples must be at least 2".into()));
        }
        if !(0.0..=1.0).contains(&self.waves.amplitude_gate) {
            return Err(MLError::InvalidConfig("amplitude_gate must be within [0, 1]".into()));
        }
        Ok(())
    }
}

/// Stateless feature extractor
#[derive(Debug, Clone, Default)]
pub struct FeatureExtractor {
    config: ExtractorConfig,
}

impl FeatureExtractor {
    /// Extractor with validated tuning
    pub fn new(config: ExtractorConfig) -> MLResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Tuning in force
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Build the feature vector for one event
    ///
    /// A missing or too-short window is never an error; the no-window
    /// heuristics are used instead.
    pub fn extract(&self, event: &RawSeismicEvent, window: Option<&[WindowSample]>) -> FeatureVector {
        let window = window.filter(|w| w.len() >= self.config.min_window_samples);

        let (spectrum, source, variance, waves) = match window {
            Some(w) => {
                let series: Vec<f32> = w.iter().map(WindowSample::magnitude).collect();
                let rate = spectral::infer_sample_rate(w, self.config.nominal_sample_rate_hz);
                let (spectrum, source) =
                    match spectral::summarize(&series, rate, self.config.min_window_samples) {
                        Some(s) => (s, FrequencySource::Measured),
                        None => (self.estimate(event), FrequencySource::Estimated),
                    };
                (
                    spectrum,
                    source,
                    temporal::magnitude_variance(&series),
                    temporal::detect_in_window(w, &self.config.waves),
                )
            }
            None => (
                self.estimate(event),
                FrequencySource::Estimated,
                0.0,
                temporal::detect_from_event(event, &self.config.waves),
            ),
        };

        log::debug!(
            "features for {}@{}: f={:.1}Hz ({:?}) var={:.3} {}",
            event.device_id,
            event.timestamp,
            spectrum.dominant_hz,
            source,
            variance,
            waves.pattern.as_str()
        );

        FeatureVector {
            raw: *event,
            frequency_dominant: spectrum.dominant_hz,
            frequency_mean: spectrum.mean_hz,
            temporal_variance: variance,
            wave_arrival_pattern: waves.pattern,
            p_wave_detected: waves.p_wave,
            s_wave_detected: waves.s_wave,
            frequency_source: source,
        }
    }

    fn estimate(&self, event: &RawSeismicEvent) -> SpectralSummary {
        spectral::estimate(event.total_accel, event.duration_ms, &self.config.fallback)
    }
}
