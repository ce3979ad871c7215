//! Model artifact
//!
//! One JSON document per deployed model:
//!
//! ```json
//! {
//!   "model_version": "rf-2024-11-02",
//!   "feature_names": ["horizontal_accel", "total_accel", "sound_level"],
//!   "model": {
//!     "family": "supervised",
//!     "classes": ["false_alarm", "genuine_earthquake"],
//!     "trees": [{"nodes": [...]}]
//!   }
//! }
//! ```
//!
//! Tree split indices refer to positions in `feature_names`, which in turn
//! must name features the extractor produces. Everything is checked at load
//! so a bad artifact stops the service at startup rather than failing
//! requests later.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::features::feature_index;
use crate::forest::{ForestStats, IsolationForest, RandomForest};
use crate::{MLError, MLResult};

/// Fitted model of either family
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum ModelFamily {
    /// Random forest with class-probability leaves
    Supervised(RandomForest),
    /// Isolation forest with sample-count leaves
    Anomaly(IsolationForest),
}

impl ModelFamily {
    /// Family name as written in the artifact
    pub fn name(&self) -> &'static str {
        match self {
            ModelFamily::Supervised(_) => "supervised",
            ModelFamily::Anomaly(_) => "anomaly",
        }
    }

    /// Forest statistics
    pub fn stats(&self) -> ForestStats {
        match self {
            ModelFamily::Supervised(f) => f.stats(),
            ModelFamily::Anomaly(f) => f.stats(),
        }
    }
}

/// Parsed model artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Reported with every classification
    pub model_version: String,
    /// Model input columns, in order
    pub feature_names: Vec<String>,
    /// The fitted forest
    pub model: ModelFamily,
}

impl ModelArtifact {
    /// Read and validate an artifact file
    pub fn load_path<P: AsRef<Path>>(path: P) -> MLResult<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| MLError::Io(format!("cannot read model {}: {}", path.display(), e)))?;
        let artifact = Self::from_json_str(&text)?;

        let stats = artifact.model.stats();
        log::info!(
            "loaded {} model {} from {}: {} trees, {} nodes, depth {}",
            artifact.model.name(),
            artifact.model_version,
            path.display(),
            stats.num_trees,
            stats.total_nodes,
            stats.max_depth
        );
        Ok(artifact)
    }

    /// Parse and validate an artifact document
    pub fn from_json_str(json: &str) -> MLResult<Self> {
        let artifact: Self =
            serde_json::from_str(json).map_err(|e| MLError::Parse(format!("invalid model artifact: {}", e)))?;
        artifact.feature_indices()?;
        Ok(artifact)
    }

    /// Resolve `feature_names` and check the forest against them
    ///
    /// Returns the index of each model column in the extractor's feature
    /// order.
    pub fn feature_indices(&self) -> MLResult<Vec<usize>> {
        if self.model_version.trim().is_empty() {
            return Err(MLError::InvalidModel("model_version is empty".into()));
        }
        if self.feature_names.is_empty() {
            return Err(MLError::InvalidModel("feature_names is empty".into()));
        }

        let mut indices = Vec::with_capacity(self.feature_names.len());
        for name in &self.feature_names {
            let index = feature_index(name).ok_or_else(|| MLError::UnknownFeature(name.clone()))?;
            if indices.contains(&index) {
                return Err(MLError::InvalidModel(format!("feature {} listed twice", name)));
            }
            indices.push(index);
        }

        let width = indices.len();
        match &self.model {
            ModelFamily::Supervised(forest) => forest.validate(width)?,
            ModelFamily::Anomaly(forest) => forest.validate(width)?,
        }
        Ok(indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUPERVISED: &str = r#"{
        "model_version": "rf-test-1",
        "feature_names": ["horizontal_accel", "sound_level"],
        "model": {
            "family": "supervised",
            "classes": ["false_alarm", "genuine_earthquake"],
            "trees": [
                {"nodes": [
                    {"kind": "internal", "feature": 0, "threshold": 1.5, "left": 1, "right": 2},
                    {"kind": "external", "probabilities": [0.9, 0.1]},
                    {"kind": "external", "probabilities": [0.2, 0.8]}
                ]}
            ]
        }
    }"#;

    #[test]
    fn parses_and_resolves_features() {
        let artifact = ModelArtifact::from_json_str(SUPERVISED).unwrap();
        assert_eq!(artifact.model_version, "rf-test-1");
        assert_eq!(artifact.model.name(), "supervised");
        assert_eq!(artifact.feature_indices().unwrap(), vec![0, 2]);
    }

    #[test]
    fn anomaly_family() {
        let json = r#"{
            "model_version": "if-1",
            "feature_names": ["total_accel"],
            "model": {"family": "anomaly", "sample_size": 32, "threshold": 0.6,
                      "trees": [{"nodes": [{"kind": "external", "size": 32}]}]}
        }"#;
        let artifact = ModelArtifact::from_json_str(json).unwrap();
        match artifact.model {
            ModelFamily::Anomaly(ref f) => assert_eq!(f.threshold, 0.6),
            _ => panic!("expected anomaly family"),
        }
    }

    #[test]
    fn invalid_json_is_a_parse_error() {
        assert!(matches!(ModelArtifact::from_json_str("{"), Err(MLError::Parse(_))));
    }

    #[test]
    fn unknown_family_and_class_fail() {
        let family = SUPERVISED.replace("\"supervised\"", "\"neural\"");
        assert!(matches!(ModelArtifact::from_json_str(&family), Err(MLError::Parse(_))));

        let class = SUPERVISED.replace("\"genuine_earthquake\"", "\"aftershock\"");
        assert!(matches!(ModelArtifact::from_json_str(&class), Err(MLError::Parse(_))));
    }

    #[test]
    fn unknown_feature_name_fails() {
        let json = SUPERVISED.replace("\"sound_level\"", "\"rate_of_change\"");
        assert!(matches!(
            ModelArtifact::from_json_str(&json),
            Err(MLError::UnknownFeature(ref n)) if n == "rate_of_change"
        ));
    }

    #[test]
    fn structural_errors_fail() {
        let out_of_range = SUPERVISED.replace("\"right\": 2", "\"right\": 9");
        assert!(matches!(
            ModelArtifact::from_json_str(&out_of_range),
            Err(MLError::InvalidModel(_))
        ));

        let bad_feature = SUPERVISED.replace("\"feature\": 0", "\"feature\": 2");
        assert!(matches!(
            ModelArtifact::from_json_str(&bad_feature),
            Err(MLError::InvalidModel(_))
        ));

        let bad_width = SUPERVISED.replace("[0.9, 0.1]", "[0.9, 0.05, 0.05]");
        assert!(matches!(
            ModelArtifact::from_json_str(&bad_width),
            Err(MLError::InvalidModel(_))
        ));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ModelArtifact::load_path("/nonexistent/quakesense/model.json").unwrap_err();
        assert!(matches!(err, MLError::Io(_)));
    }
}
