//! Extraction and classification are pure functions of their input

mod common;

use proptest::prelude::*;

use quakesense_core::events::{DeviceId, RawSeismicEventBuilder};
use quakesense_core::window::WindowSample;
use quakesense_ml::{Classifier, DecisionPolicy, FeatureExtractor, Label, ModelArtifact, MODEL_FEATURES};

use common::{ANOMALY_MODEL, SUPERVISED_MODEL};

fn window_strategy() -> impl Strategy<Value = Option<Vec<WindowSample>>> {
    prop::option::of(
        (prop::collection::vec((-4.0f32..4.0, -4.0f32..4.0, -4.0f32..4.0), 0..160), 5u64..20).prop_map(
            |(axes, step)| {
                axes.into_iter()
                    .enumerate()
                    .map(|(i, (x, y, z))| WindowSample { t: i as u64 * step, x, y, z })
                    .collect()
            },
        ),
    )
}

proptest! {
    #[test]
    fn extraction_and_classification_are_deterministic(
        (x, y, z) in (-9.0f32..9.0, -9.0f32..9.0, -9.0f32..9.0),
        sound in 0u16..4096,
        correlated in any::<bool>(),
        duration in 0u32..5_000,
        window in window_strategy(),
    ) {
        let event = RawSeismicEventBuilder::new(DeviceId::new("prop").unwrap(), 10_000)
            .axes(x, y, z)
            .sound(sound, correlated)
            .duration_ms(duration)
            .build();

        let extractor = FeatureExtractor::default();
        let a = extractor.extract(&event, window.as_deref());
        let b = extractor.extract(&event, window.as_deref());
        prop_assert_eq!(a, b);
        prop_assert_eq!(a.raw, event);

        for i in 0..MODEL_FEATURES.len() {
            let v = a.value_at(i).unwrap();
            prop_assert!(v.is_finite(), "{} = {}", MODEL_FEATURES[i], v);
        }

        for model in [SUPERVISED_MODEL, ANOMALY_MODEL] {
            let classifier = Classifier::new(ModelArtifact::from_json_str(model).unwrap(), DecisionPolicy::default()).unwrap();
            let first = classifier.classify(&a).unwrap();
            prop_assert_eq!(&first, &classifier.classify(&a).unwrap());
            prop_assert!((0.0..=1.0).contains(&first.confidence));
            if correlated {
                prop_assert_eq!(first.label, Label::FalseAlarm);
                prop_assert_eq!(first.confidence, 0.95);
            }
        }
    }
}
