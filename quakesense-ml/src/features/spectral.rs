//! Frequency features
//!
//! Earthquakes put most of their energy between 1 and 10 Hz; door slams,
//! footsteps and dropped objects ring well above 10 Hz. The extractor looks
//! at the magnitude series of the raw window, removes its mean, applies a
//! Hann window and takes the real-input spectrum up to Nyquist.

use rustfft::{num_complex::Complex, FftPlanner};

use quakesense_core::window::WindowSample;

/// Series whose spread is below this fraction of its level count as flat
const FLAT_TOLERANCE: f32 = 1e-5;

/// Dominant and magnitude-weighted mean frequency (Hz)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectralSummary {
    /// Frequency of the strongest non-DC bin
    pub dominant_hz: f32,
    /// Magnitude-weighted mean over the non-DC bins
    pub mean_hz: f32,
}

/// Sample rate implied by the window timestamps
///
/// Falls back to `nominal_hz` when the window spans no time.
pub fn infer_sample_rate(window: &[WindowSample], nominal_hz: f32) -> f32 {
    match (window.first(), window.last()) {
        (Some(first), Some(last)) if last.t > first.t && window.len() > 1 => {
            (window.len() - 1) as f32 * 1000.0 / (last.t - first.t) as f32
        }
        _ => nominal_hz,
    }
}

/// Spectrum of a magnitude series
///
/// Returns `None` for fewer than `min_samples` points or a flat series
/// (no energy outside DC).
pub fn summarize(series: &[f32], sample_rate_hz: f32, min_samples: usize) -> Option<SpectralSummary> {
    let n = series.len();
    if n < min_samples.max(2) || !(sample_rate_hz > 0.0) {
        return None;
    }

    let mean = series.iter().sum::<f32>() / n as f32;
    let spread = series.iter().fold(0.0f32, |acc, &x| acc.max((x - mean).abs()));
    if spread <= FLAT_TOLERANCE * mean.abs().max(1.0) {
        return None;
    }

    let hann = |i: usize| 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / (n as f32 - 1.0)).cos());

    let mut buffer: Vec<Complex<f32>> = series
        .iter()
        .enumerate()
        .map(|(i, &x)| Complex::new((x - mean) * hann(i), 0.0))
        .collect();

    let mut planner = FftPlanner::<f32>::new();
    let fft = planner.plan_fft_forward(n);
    fft.process(&mut buffer);

    let bin_hz = sample_rate_hz / n as f32;
    let magnitudes: Vec<f32> = buffer[..n / 2 + 1].iter().map(|c| c.norm()).collect();

    // Skip DC
    let mut dominant_bin = 0;
    let mut dominant_mag = 0.0f32;
    let mut weighted = 0.0f32;
    let mut total = 0.0f32;
    for (k, &m) in magnitudes.iter().enumerate().skip(1) {
        if m > dominant_mag {
            dominant_mag = m;
            dominant_bin = k;
        }
        weighted += k as f32 * bin_hz * m;
        total += m;
    }

    if dominant_bin == 0 || total <= f32::EPSILON {
        return None;
    }

    Some(SpectralSummary {
        dominant_hz: dominant_bin as f32 * bin_hz,
        mean_hz: weighted / total,
    })
}

/// Band estimate used when there is no usable window
///
/// Strong motion is assumed to be in the earthquake band, weak motion in the
/// impact band. Shorter events skew higher, longer ones lower:
/// `band × clamp(reference / duration, 0.5, 2.0)`.
pub fn estimate(total_accel: f32, duration_ms: u32, config: &FallbackBands) -> SpectralSummary {
    let band = if total_accel >= config.strong_motion_accel {
        config.earthquake_band_hz
    } else {
        config.impact_band_hz
    };

    let scale = if duration_ms == 0 {
        2.0
    } else {
        (config.reference_duration_ms as f32 / duration_ms as f32).clamp(0.5, 2.0)
    };

    let dominant = band * scale;
    SpectralSummary {
        dominant_hz: dominant,
        mean_hz: dominant,
    }
}

/// Bands for the no-window estimate
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FallbackBands {
    /// Total acceleration at or above which motion counts as strong (m/s²)
    pub strong_motion_accel: f32,
    /// Band assumed for strong motion (Hz)
    pub earthquake_band_hz: f32,
    /// Band assumed for weak motion (Hz)
    pub impact_band_hz: f32,
    /// Duration at which the band is used unscaled (ms)
    pub reference_duration_ms: u32,
}

impl Default for FallbackBands {
    fn default() -> Self {
        Self {
            strong_motion_accel: 3.0,
            earthquake_band_hz: 4.0,
            impact_band_hz: 20.0,
            reference_duration_ms: 500,
        }
    }
}
