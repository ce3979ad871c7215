//! Loading model artifacts from disk

mod common;

use std::fs;

use quakesense_ml::{
    AnalyzerConfig, Classifier, DecisionPolicy, EventAnalyzer, Label, MLError, ModelArtifact, ModelFamily,
};
use tempfile::tempdir;

use common::{event, quake_window, write_artifact, ANOMALY_MODEL, SUPERVISED_MODEL};

#[test]
fn supervised_artifact_loads_from_disk() {
    let dir = tempdir().unwrap();
    let path = write_artifact(dir.path(), "rf.json", SUPERVISED_MODEL);

    let classifier = Classifier::from_path(&path, DecisionPolicy::default()).unwrap();
    assert_eq!(classifier.model_version(), "rf-fixture-3");
    assert_eq!(classifier.family(), "supervised");

    // Strong, quiet, long, with a real P-then-S window
    let e = event(4.0, 300, false, 900);
    let window = quake_window(e.timestamp - 2_000);
    let analysis = EventAnalyzer::new(Default::default(), classifier.into(), Default::default())
        .unwrap()
        .analyze(&e, Some(&window))
        .unwrap();

    assert!(!analysis.features.is_frequency_estimated());
    assert!(analysis.features.frequency_dominant < 10.0);
    assert_eq!(analysis.result.label, Label::GenuineEarthquake);
    assert!(analysis.result.confidence > 0.7);
    assert!(analysis.notify);
}

#[test]
fn analyzer_config_loads_everything() {
    let dir = tempdir().unwrap();
    let model = write_artifact(dir.path(), "if.json", ANOMALY_MODEL);

    let config_json = format!(
        r#"{{"model_path": {:?}, "decision": {{"uncertain_below": 0.5}}, "alerts": {{"confidence_threshold": 0.6}}}}"#,
        model.to_str().unwrap()
    );
    let config_path = write_artifact(dir.path(), "analyzer.json", &config_json);
    let config: AnalyzerConfig = serde_json::from_str(&fs::read_to_string(config_path).unwrap()).unwrap();
    assert_eq!(config.decision.uncertain_below, 0.5);
    assert_eq!(config.decision.veto_confidence, 0.95);

    let analyzer = EventAnalyzer::from_config(&config).unwrap();
    assert_eq!(analyzer.classifier().family(), "anomaly");

    // Isolated on both trees
    let strong = analyzer.analyze(&event(6.0, 200, false, 1_500), None).unwrap();
    assert_eq!(strong.result.label, Label::GenuineEarthquake);
    assert_eq!(strong.result.model_version, "if-fixture-1");
}

#[test]
fn missing_file_fails_at_startup() {
    let dir = tempdir().unwrap();
    let err = Classifier::from_path(dir.path().join("absent.json"), DecisionPolicy::default()).unwrap_err();
    assert!(matches!(err, MLError::Io(_)));

    let err = EventAnalyzer::from_config(&AnalyzerConfig::new(dir.path().join("absent.json"))).unwrap_err();
    assert!(matches!(err, MLError::Io(_)));
}

#[test]
fn corrupt_files_fail_at_startup() {
    let dir = tempdir().unwrap();

    let truncated = write_artifact(dir.path(), "truncated.json", &SUPERVISED_MODEL[..200]);
    assert!(matches!(
        Classifier::from_path(&truncated, DecisionPolicy::default()),
        Err(MLError::Parse(_))
    ));

    let empty_forest = r#"{"model_version": "x", "feature_names": ["total_accel"],
        "model": {"family": "anomaly", "sample_size": 64, "trees": []}}"#;
    let path = write_artifact(dir.path(), "empty.json", empty_forest);
    assert!(matches!(
        Classifier::from_path(&path, DecisionPolicy::default()),
        Err(MLError::InvalidModel(_))
    ));

    let unknown = SUPERVISED_MODEL.replace("\"frequency_dominant\"", "\"spectral_entropy\"");
    let path = write_artifact(dir.path(), "unknown.json", &unknown);
    assert!(matches!(
        Classifier::from_path(&path, DecisionPolicy::default()),
        Err(MLError::UnknownFeature(_))
    ));
}

#[test]
fn saved_artifact_reloads_identically() {
    let artifact = ModelArtifact::from_json_str(SUPERVISED_MODEL).unwrap();
    let dir = tempdir().unwrap();
    let path = write_artifact(dir.path(), "copy.json", &serde_json::to_string_pretty(&artifact).unwrap());

    let reloaded = ModelArtifact::load_path(&path).unwrap();
    assert_eq!(reloaded, artifact);
    assert!(matches!(reloaded.model, ModelFamily::Supervised(ref f) if f.trees.len() == 3));
}
