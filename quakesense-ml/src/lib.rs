//! Seismic Event Classification for the QuakeSense Server
//!
//! ## Overview
//!
//! Edge devices report every shake they confirm. Most of those are not
//! earthquakes: a slammed door, a truck on the street, a bumped desk. This
//! crate decides which is which:
//!
//! ```text
//! RawSeismicEvent ─┐
//!   (+ raw window) ├─▶ FeatureExtractor ─▶ FeatureVector ─▶ Classifier ─▶ ClassificationResult
//!                  │                                                           │
//!                  └──────────────────────────▶ Severity, AlertPolicy ◀────────┘
//! ```
//!
//! [`EventAnalyzer`] wires the stages together for the ingest path.
//!
//! ## Why Tree Ensembles?
//!
//! 1. **No runtime**: a forest is a list of thresholds, scored with a few
//!    comparisons per tree and no numeric library
//! 2. **Portable artifacts**: trees trained offline are shipped as plain JSON
//! 3. **Explainable**: the features a decision path split on name the
//!    reason for the verdict
//! 4. **Two families, one interface**: a supervised random forest when
//!    labeled data exists, an isolation forest when it does not
//!
//! ## Model Families
//!
//! | Family       | Leaves carry          | Decision                            |
//! |--------------|-----------------------|-------------------------------------|
//! | `supervised` | class probabilities   | argmax of mean probability          |
//! | `anomaly`    | training sample count | isolation score above threshold     |
//!
//! Artifacts are validated completely at load (see [`model`]), so a broken
//! model stops the service at startup rather than failing individual
//! requests.
//!
//! ## Concurrency
//!
//! Extraction is a pure function and a loaded [`Classifier`] is immutable.
//! Both are `Send + Sync`; share one instance across request handlers with
//! an `Arc`.
//!
//! ## Example
//!
//! ```no_run
//! use quakesense_ml::{AnalyzerConfig, EventAnalyzer};
//! # fn run(event: quakesense_core::events::RawSeismicEvent) -> quakesense_ml::MLResult<()> {
//! let analyzer = EventAnalyzer::from_config(&AnalyzerConfig::new("/etc/quakesense/model.json"))?;
//! let analysis = analyzer.analyze(&event, None)?;
//! if analysis.notify {
//!     println!("{} ({})", analysis.result.label, analysis.severity);
//! }
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod alert;
pub mod analyzer;
pub mod classifier;
pub mod features;
pub mod forest;
pub mod model;
pub mod node;
pub mod scoring;
pub mod tree;

pub use alert::{AlertPolicy, Severity};
pub use analyzer::{Analysis, AnalyzerConfig, EventAnalyzer};
pub use classifier::{ClassificationResult, Classifier, DecisionPolicy, Label};
pub use features::{
    ExtractorConfig, FeatureExtractor, FeatureVector, FrequencySource, WaveArrivalPattern, MODEL_FEATURES,
};
pub use forest::{ForestStats, IsolationForest, RandomForest, DEFAULT_ANOMALY_THRESHOLD};
pub use model::{ModelArtifact, ModelFamily};
pub use node::{ClassLeaf, IsolationLeaf, Node};
pub use scoring::{c_factor, calculate_anomaly_score, AnomalyScore};
pub use tree::Tree;

/// ML error types
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MLError {
    /// Feature index outside the model input
    #[error("Invalid feature index: {0}")]
    InvalidFeature(usize),

    /// Feature name the extractor does not produce
    #[error("Unknown feature name: {0}")]
    UnknownFeature(String),

    /// Structurally invalid model
    #[error("Invalid model: {0}")]
    InvalidModel(String),

    /// Configuration out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Artifact could not be read
    #[error("I/O error: {0}")]
    Io(String),

    /// Artifact is not valid JSON for the expected shape
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Result type for ML operations
pub type MLResult<T> = Result<T, MLError>;
