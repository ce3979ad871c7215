//! Server-side event analysis
//!
//! [`EventAnalyzer`] is the one call the ingest path makes per event:
//! extract features, classify, grade severity and decide on notification.
//! It keeps no per-request state and can be cloned cheaply (the classifier
//! is behind an `Arc`), so request handlers on any thread share one model.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use quakesense_core::events::RawSeismicEvent;
use quakesense_core::window::WindowSample;

use crate::alert::{AlertPolicy, Severity};
use crate::classifier::{ClassificationResult, Classifier, DecisionPolicy};
use crate::features::{ExtractorConfig, FeatureExtractor, FeatureVector};
use crate::MLResult;

/// Outcome of analyzing one event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analysis {
    /// Extracted features
    pub features: FeatureVector,
    /// Classifier verdict
    pub result: ClassificationResult,
    /// Severity band
    pub severity: Severity,
    /// Whether alerting should fire
    pub notify: bool,
}

/// Deployment configuration for an analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Model artifact to load at startup
    pub model_path: PathBuf,
    /// Extractor tuning
    #[serde(default)]
    pub extractor: ExtractorConfig,
    /// Decision rules
    #[serde(default)]
    pub decision: DecisionPolicy,
    /// Alert rules
    #[serde(default)]
    pub alerts: AlertPolicy,
}

impl AnalyzerConfig {
    /// Defaults around a model path
    pub fn new<P: Into<PathBuf>>(model_path: P) -> Self {
        Self {
            model_path: model_path.into(),
            extractor: ExtractorConfig::default(),
            decision: DecisionPolicy::default(),
            alerts: AlertPolicy::default(),
        }
    }
}

/// Feature extraction, classification and alert policy in one place
#[derive(Debug, Clone)]
pub struct EventAnalyzer {
    extractor: FeatureExtractor,
    classifier: Arc<Classifier>,
    alerts: AlertPolicy,
}

impl EventAnalyzer {
    /// Analyzer around an already loaded classifier
    pub fn new(extractor: FeatureExtractor, classifier: Arc<Classifier>, alerts: AlertPolicy) -> MLResult<Self> {
        alerts.validate()?;
        Ok(Self {
            extractor,
            classifier,
            alerts,
        })
    }

    /// Load everything named in `config`; fails if the model is unusable
    pub fn from_config(config: &AnalyzerConfig) -> MLResult<Self> {
        let extractor = FeatureExtractor::new(config.extractor)?;
        let classifier = Classifier::from_path(&config.model_path, config.decision)?;
        log::info!(
            "analyzer ready: {} model {}",
            classifier.family(),
            classifier.model_version()
        );
        Self::new(extractor, Arc::new(classifier), config.alerts)
    }

    /// Shared classifier
    pub fn classifier(&self) -> &Arc<Classifier> {
        &self.classifier
    }

    /// Analyze one event and its optional raw window
    pub fn analyze(&self, event: &RawSeismicEvent, window: Option<&[WindowSample]>) -> MLResult<Analysis> {
        let features = self.extractor.extract(event, window);
        let result = self.classifier.classify(&features)?;
        let severity = Severity::of(event);
        let notify = self.alerts.should_notify(event, &result);

        log::info!(
            "{}@{}: {} ({:.2}) severity={} notify={}",
            event.device_id,
            event.timestamp,
            result.label,
            result.confidence,
            severity,
            notify
        );

        Ok(Analysis {
            features,
            result,
            severity,
            notify,
        })
    }
}
