//! Event Classification
//!
//! ## Overview
//!
//! [`Classifier::classify`] turns a [`FeatureVector`] into a
//! [`ClassificationResult`]. The decision runs in fixed order:
//!
//! ```text
//! sound_correlated? ── yes ─▶ false_alarm @ veto_confidence   (no scoring)
//!        │ no
//!        ▼
//! project onto the model's feature_names
//!        │
//!        ├─ supervised ─▶ mean tree probabilities ─▶ argmax, conf = max p
//!        └─ anomaly ────▶ isolation score s vs threshold t
//!                           s > t ─▶ genuine_earthquake, else false_alarm
//!                           d = (s - t) / (1 - t) or (t - s) / t
//!                           conf = 0.5 + d · (cap - 0.5)
//!        │
//!        ▼
//! frequency estimated? ─▶ conf × estimated_frequency_penalty
//! conf < uncertain_below ─▶ uncertain   (supervised; anomaly only if opted in)
//! ```
//!
//! The anomaly family is a binary inlier/outlier decision, so by default it
//! never reports `uncertain`.
//!
//! ## Concurrency
//!
//! A classifier is immutable after construction and holds no interior
//! mutability, so it is `Send + Sync` and one instance serves every request
//! through an `Arc`. Identical inputs always produce identical results.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::features::FeatureVector;
use crate::model::{ModelArtifact, ModelFamily};
use crate::scoring::Influence;
use crate::{MLError, MLResult};

/// Classification outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Label {
    /// Seismic motion
    GenuineEarthquake,
    /// Impact, noise or anything else that is not a quake
    FalseAlarm,
    /// Not enough confidence either way
    Uncertain,
}

impl Label {
    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Label::GenuineEarthquake => "genuine_earthquake",
            Label::FalseAlarm => "false_alarm",
            Label::Uncertain => "uncertain",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result reported downstream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    /// Decided label
    pub label: Label,
    /// Confidence in `[0, 1]`
    pub confidence: f32,
    /// Deterministic explanation
    pub reasoning: String,
    /// Version of the model that decided
    pub model_version: String,
}

/// Reasoning used for the sound veto
pub const SOUND_VETO_REASONING: &str = "Strong sound correlation indicates external impact/noise";

/// Rules applied around model scoring
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionPolicy {
    /// Label sound-correlated events `false_alarm` without scoring
    pub sound_veto: bool,
    /// Confidence reported for a veto
    pub veto_confidence: f32,
    /// Scored confidence below this becomes `uncertain`
    pub uncertain_below: f32,
    /// Confidence multiplier when the frequency features are estimated
    pub estimated_frequency_penalty: f32,
    /// Ceiling on anomaly-family confidence
    pub anomaly_confidence_cap: f32,
    /// Apply `uncertain_below` to the anomaly family too
    pub anomaly_uncertain: bool,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            sound_veto: true,
            veto_confidence: 0.95,
            uncertain_below: 0.55,
            estimated_frequency_penalty: 0.9,
            anomaly_confidence_cap: 0.95,
            anomaly_uncertain: false,
        }
    }
}

impl DecisionPolicy {
    /// Enable or disable the sound veto
    pub fn with_sound_veto(mut self, enabled: bool) -> Self {
        self.sound_veto = enabled;
        self
    }

    /// Set the uncertainty cut-off
    pub fn with_uncertain_below(mut self, confidence: f32) -> Self {
        self.uncertain_below = confidence;
        self
    }

    /// Let low-confidence anomaly verdicts become `uncertain`
    pub fn with_anomaly_uncertain(mut self, enabled: bool) -> Self {
        self.anomaly_uncertain = enabled;
        self
    }

    /// Set the estimated-frequency multiplier
    pub fn with_estimated_frequency_penalty(mut self, factor: f32) -> Self {
        self.estimated_frequency_penalty = factor;
        self
    }

    /// Check ranges
    pub fn validate(&self) -> MLResult<()> {
        let unit = |name: &str, v: f32| {
            if (0.0..=1.0).contains(&v) {
                Ok(())
            } else {
                Err(MLError::InvalidConfig(format!("{} must be within [0, 1], got {}", name, v)))
            }
        };
        unit("veto_confidence", self.veto_confidence)?;
        unit("uncertain_below", self.uncertain_below)?;
        unit("estimated_frequency_penalty", self.estimated_frequency_penalty)?;
        unit("anomaly_confidence_cap", self.anomaly_confidence_cap)?;
        Ok(())
    }
}

/// Loaded model plus decision policy
#[derive(Debug, Clone)]
pub struct Classifier {
    artifact: ModelArtifact,
    indices: Vec<usize>,
    policy: DecisionPolicy,
}

impl Classifier {
    /// Classifier over a parsed artifact
    pub fn new(artifact: ModelArtifact, policy: DecisionPolicy) -> MLResult<Self> {
        policy.validate()?;
        let indices = artifact.feature_indices()?;
        Ok(Self {
            artifact,
            indices,
            policy,
        })
    }

    /// Load the artifact at `path`
    pub fn from_path<P: AsRef<Path>>(path: P, policy: DecisionPolicy) -> MLResult<Self> {
        Self::new(ModelArtifact::load_path(path)?, policy)
    }

    /// Version string of the loaded model
    pub fn model_version(&self) -> &str {
        &self.artifact.model_version
    }

    /// Family of the loaded model
    pub fn family(&self) -> &'static str {
        self.artifact.model.name()
    }

    /// Policy in force
    pub fn policy(&self) -> &DecisionPolicy {
        &self.policy
    }

    /// Classify one event
    pub fn classify(&self, features: &FeatureVector) -> MLResult<ClassificationResult> {
        if self.policy.sound_veto && features.raw.sound_correlated {
            return Ok(self.result(
                Label::FalseAlarm,
                self.policy.veto_confidence,
                SOUND_VETO_REASONING.to_string(),
            ));
        }

        let input = features.project(&self.indices)?;
        let (label, confidence, mut reasoning, may_be_uncertain) = match &self.artifact.model {
            ModelFamily::Supervised(forest) => {
                let vote = forest.predict_proba(&input)?;
                let (best, p) = vote
                    .best()
                    .ok_or_else(|| MLError::InvalidModel("forest produced no probabilities".into()))?;
                let label = forest
                    .classes
                    .get(best)
                    .copied()
                    .ok_or_else(|| MLError::InvalidModel(format!("class index {} out of range", best)))?;
                let reasoning = format!(
                    "Random forest: {} pattern (p={:.2}); most influential feature: {}",
                    label,
                    p,
                    self.influential(&vote.influence)
                );
                (label, p, reasoning, true)
            }
            ModelFamily::Anomaly(forest) => {
                let verdict = forest.anomaly_score(&input)?;
                let cap = self.policy.anomaly_confidence_cap;
                let distance = verdict.score.boundary_distance(forest.threshold);
                let confidence = (0.5 + distance * (cap - 0.5)).min(cap);
                let (label, what) = if verdict.is_outlier {
                    (Label::GenuineEarthquake, "anomalous seismic pattern")
                } else {
                    (Label::FalseAlarm, "normal vibration pattern")
                };
                let reasoning = format!(
                    "Isolation forest: {} (score {:.2}, threshold {:.2}); most influential feature: {}",
                    what,
                    verdict.score.score,
                    forest.threshold,
                    self.influential(&verdict.influence)
                );
                (label, confidence, reasoning, self.policy.anomaly_uncertain)
            }
        };

        let mut confidence = confidence.clamp(0.0, 1.0);
        if features.is_frequency_estimated() {
            confidence *= self.policy.estimated_frequency_penalty;
            reasoning.push_str("; frequency estimated without raw window");
        }

        let label = if may_be_uncertain && confidence < self.policy.uncertain_below && label != Label::Uncertain {
            reasoning.push_str(&format!(
                "; confidence {:.2} below {:.2}, was {}",
                confidence, self.policy.uncertain_below, label
            ));
            Label::Uncertain
        } else {
            label
        };

        log::debug!(
            "{}@{} -> {} ({:.2})",
            features.raw.device_id,
            features.raw.timestamp,
            label,
            confidence
        );

        Ok(self.result(label, confidence, reasoning))
    }

    fn influential(&self, influence: &Influence) -> &str {
        influence
            .most_used()
            .and_then(|i| self.artifact.feature_names.get(i))
            .map(String::as_str)
            .unwrap_or("none")
    }

    fn result(&self, label: Label, confidence: f32, reasoning: String) -> ClassificationResult {
        ClassificationResult {
            label,
            confidence,
            reasoning,
            model_version: self.artifact.model_version.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureExtractor;
    use quakesense_core::events::{DeviceId, RawSeismicEventBuilder};
    use quakesense_core::window::WindowSample;

    fn supervised() -> ModelArtifact {
        ModelArtifact::from_json_str(
            r#"{
            "model_version": "rf-unit",
            "feature_names": ["horizontal_accel", "duration_ms"],
            "model": {
                "family": "supervised",
                "classes": ["false_alarm", "genuine_earthquake", "uncertain"],
                "trees": [
                    {"nodes": [
                        {"kind": "internal", "feature": 0, "threshold": 1.5, "left": 1, "right": 2},
                        {"kind": "external", "probabilities": [0.9, 0.1, 0.0]},
                        {"kind": "internal", "feature": 1, "threshold": 300, "left": 3, "right": 4},
                        {"kind": "external", "probabilities": [0.5, 0.5, 0.0]},
                        {"kind": "external", "probabilities": [0.05, 0.95, 0.0]}
                    ]},
                    {"nodes": [
                        {"kind": "internal", "feature": 0, "threshold": 2.0, "left": 1, "right": 2},
                        {"kind": "external", "probabilities": [0.8, 0.2, 0.0]},
                        {"kind": "external", "probabilities": [0.1, 0.9, 0.0]}
                    ]}
                ]
            }
        }"#,
        )
        .unwrap()
    }

    fn anomaly() -> ModelArtifact {
        ModelArtifact::from_json_str(
            r#"{
            "model_version": "if-unit",
            "feature_names": ["total_accel"],
            "model": {
                "family": "anomaly",
                "sample_size": 64,
                "trees": [
                    {"nodes": [
                        {"kind": "internal", "feature": 0, "threshold": 5.0, "left": 1, "right": 2},
                        {"kind": "external", "size": 60},
                        {"kind": "external", "size": 1}
                    ]}
                ]
            }
        }"#,
        )
        .unwrap()
    }

    fn window() -> Vec<WindowSample> {
        (0..64u64)
            .map(|i| WindowSample {
                t: i * 10,
                x: 2.0 + (i as f32 * 0.3).sin(),
                y: 0.5,
                z: 0.2,
            })
            .collect()
    }

    fn features(h: f32, duration: u32, correlated: bool, with_window: bool) -> FeatureVector {
        let event = RawSeismicEventBuilder::new(DeviceId::new("ESP32-01").unwrap(), 1_000)
            .axes(h, 0.0, 0.3)
            .sound(if correlated { 3_000 } else { 200 }, correlated)
            .duration_ms(duration)
            .build();
        let w = window();
        FeatureExtractor::default().extract(&event, with_window.then_some(&w[..]))
    }

    #[test]
    fn sound_correlation_vetoes_scoring() {
        let c = Classifier::new(supervised(), DecisionPolicy::default()).unwrap();
        let r = c.classify(&features(6.0, 900, true, true)).unwrap();

        assert_eq!(r.label, Label::FalseAlarm);
        assert_eq!(r.confidence, 0.95);
        assert_eq!(r.reasoning, SOUND_VETO_REASONING);
        assert_eq!(r.model_version, "rf-unit");
    }

    #[test]
    fn veto_can_be_disabled() {
        let c = Classifier::new(supervised(), DecisionPolicy::default().with_sound_veto(false)).unwrap();
        let r = c.classify(&features(6.0, 900, true, true)).unwrap();
        assert_eq!(r.label, Label::GenuineEarthquake);
    }

    #[test]
    fn supervised_argmax_and_influence() {
        let c = Classifier::new(supervised(), DecisionPolicy::default()).unwrap();
        let r = c.classify(&features(3.0, 900, false, true)).unwrap();

        assert_eq!(r.label, Label::GenuineEarthquake);
        assert!((r.confidence - (0.95 + 0.9) / 2.0).abs() < 1e-6);
        assert!(r.reasoning.contains("genuine_earthquake"));
        assert!(r.reasoning.ends_with("most influential feature: horizontal_accel"));
    }

    #[test]
    fn estimated_frequency_is_penalized_and_mentioned() {
        let c = Classifier::new(supervised(), DecisionPolicy::default()).unwrap();
        let r = c.classify(&features(3.0, 900, false, false)).unwrap();

        assert_eq!(r.label, Label::GenuineEarthquake);
        assert!((r.confidence - 0.925 * 0.9).abs() < 1e-6);
        assert!(r.reasoning.contains("frequency estimated"));
    }

    #[test]
    fn low_confidence_becomes_uncertain() {
        let c = Classifier::new(supervised(), DecisionPolicy::default()).unwrap();
        // Both trees split on horizontal_accel, short duration: (0.5 + 0.8) / 2 = 0.65 false alarm
        let r = c.classify(&features(1.8, 100, false, false)).unwrap();

        // 0.65 × 0.9 = 0.585 stays above 0.55
        assert_eq!(r.label, Label::FalseAlarm);

        let strict = Classifier::new(supervised(), DecisionPolicy::default().with_uncertain_below(0.6)).unwrap();
        let r = strict.classify(&features(1.8, 100, false, false)).unwrap();
        assert_eq!(r.label, Label::Uncertain);
        assert!(r.reasoning.contains("was false_alarm"));
    }

    #[test]
    fn anomaly_maps_outliers_to_earthquakes() {
        let c = Classifier::new(anomaly(), DecisionPolicy::default()).unwrap();
        assert_eq!(c.family(), "anomaly");

        let quake = c.classify(&features(8.0, 900, false, true)).unwrap();
        assert_eq!(quake.label, Label::GenuineEarthquake);
        assert!(quake.confidence > 0.55 && quake.confidence <= 0.95);
        assert!(quake.reasoning.contains("anomalous seismic pattern"));
        assert!(quake.reasoning.contains("total_accel"));

        // Inlier close to the boundary stays a false alarm: the family is binary
        let calm = c.classify(&features(1.0, 900, false, true)).unwrap();
        assert_eq!(calm.label, Label::FalseAlarm);
        assert!(calm.confidence > 0.5 && calm.confidence < 0.55);
        assert!(calm.reasoning.contains("normal vibration pattern"));
        assert!(!calm.reasoning.contains("below"));

        let opted_in = Classifier::new(anomaly(), DecisionPolicy::default().with_anomaly_uncertain(true)).unwrap();
        let calm = opted_in.classify(&features(1.0, 900, false, true)).unwrap();
        assert_eq!(calm.label, Label::Uncertain);
        assert!(calm.reasoning.contains("was false_alarm"));
    }

    fn isolated_outlier_model() -> ModelArtifact {
        // One split; the outlier side is a single training sample at depth 1
        ModelArtifact::from_json_str(
            r#"{
            "model_version": "if-256",
            "feature_names": ["total_accel"],
            "model": {
                "family": "anomaly",
                "sample_size": 256,
                "trees": [
                    {"nodes": [
                        {"kind": "internal", "feature": 0, "threshold": 5.0, "left": 1, "right": 2},
                        {"kind": "external", "size": 250},
                        {"kind": "external", "size": 1}
                    ]}
                ]
            }
        }"#,
        )
        .unwrap()
    }

    #[test]
    fn anomaly_confidence_reaches_the_cap_side_of_the_range() {
        let c = Classifier::new(isolated_outlier_model(), DecisionPolicy::default()).unwrap();

        // s = 2^(-1 / c(256)) ≈ 0.934, d ≈ 0.87, conf ≈ 0.89
        let quake = c.classify(&features(8.0, 900, false, true)).unwrap();
        assert_eq!(quake.label, Label::GenuineEarthquake);
        assert!(quake.confidence > 0.85 && quake.confidence <= 0.95);

        // Without a window the 0.9 penalty still clears the alert threshold
        let fv = features(8.0, 900, false, false);
        let quake = c.classify(&fv).unwrap();
        assert_eq!(quake.label, Label::GenuineEarthquake);
        assert!(quake.confidence > 0.75, "{}", quake.confidence);
        assert!(crate::alert::AlertPolicy::default().should_notify(&fv.raw, &quake));

        let calm = c.classify(&features(1.0, 900, false, false)).unwrap();
        assert_eq!(calm.label, Label::FalseAlarm);
    }

    #[test]
    fn anomaly_confidence_never_exceeds_cap() {
        let policy = DecisionPolicy {
            anomaly_confidence_cap: 0.8,
            ..DecisionPolicy::default()
        };
        let c = Classifier::new(isolated_outlier_model(), policy).unwrap();
        let quake = c.classify(&features(8.0, 900, false, true)).unwrap();
        assert!(quake.confidence <= 0.8);
        assert!(quake.confidence > 0.7);
    }

    #[test]
    fn classification_is_deterministic() {
        let c = Classifier::new(supervised(), DecisionPolicy::default()).unwrap();
        let fv = features(2.7, 450, false, true);
        assert_eq!(c.classify(&fv).unwrap(), c.classify(&fv).unwrap());
    }

    #[test]
    fn classifier_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Classifier>();
    }

    #[test]
    fn policy_validation() {
        assert!(DecisionPolicy::default().validate().is_ok());
        assert!(Classifier::new(supervised(), DecisionPolicy::default().with_uncertain_below(1.5)).is_err());
    }

    #[test]
    fn result_json_shape() {
        let r = ClassificationResult {
            label: Label::Uncertain,
            confidence: 0.5,
            reasoning: "x".into(),
            model_version: "v".into(),
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["label"], "uncertain");
        assert_eq!(json["model_version"], "v");
    }
}
