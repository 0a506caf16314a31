use super::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Index of RMSP in the default feature layout
const RMSP_INDEX: usize = 9;

/// Stump on RMSP: quiet clips score -2, loud clips +2
fn rmsp_stump_json(num_feature: usize) -> String {
    format!(
        r#"{{
            "learner": {{
                "gradient_booster": {{
                    "name": "gbtree",
                    "model": {{
                        "trees": [{{
                            "left_children": [1, -1, -1],
                            "right_children": [2, -1, -1],
                            "split_indices": [{}, 0, 0],
                            "split_conditions": [0.1, -2.0, 2.0],
                            "default_left": [0, 0, 0]
                        }}]
                    }}
                }},
                "learner_model_param": {{ "base_score": "5E-1", "num_feature": "{}" }},
                "objective": {{ "name": "binary:logistic" }}
            }}
        }}"#,
        RMSP_INDEX, num_feature
    )
}

fn identity_scaler(len: usize) -> StandardScaler {
    StandardScaler::new(vec![0.0; len], vec![1.0; len]).unwrap()
}

fn create_classifier() -> CoughClassifier {
    let model = BoostedTrees::from_json(&rmsp_stump_json(57)).unwrap();
    CoughClassifier::new(model, identity_scaler(57), &CoughConfig::default()).unwrap()
}

/// One second of white noise at 48 kHz
fn generate_white_noise(seed: u64) -> Waveform {
    let mut rng = StdRng::seed_from_u64(seed);
    let samples = (0..48_000).map(|_| rng.gen_range(-1.0f32..1.0)).collect();
    Waveform::new(samples, 48_000).unwrap()
}

fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[test]
fn test_silent_clip_scores_exactly_zero() {
    let classifier = create_classifier();
    let silence = Waveform::new(vec![0.0; 48_000], 48_000).unwrap();
    assert_eq!(classifier.classify(&silence), 0.0);

    let err = classifier.try_classify(&silence).unwrap_err();
    assert_eq!(err, AnalysisError::SilentSignal);
    assert!(err.is_degenerate_input());
}

#[test]
fn test_loud_clip_takes_positive_leaf() {
    let classifier = create_classifier();
    let probability = classifier.try_classify(&generate_white_noise(3)).unwrap();
    assert!(
        (probability as f64 - sigmoid(2.0)).abs() < 1e-6,
        "Expected sigmoid(2) for a loud clip, got {}",
        probability
    );
    assert_eq!(classifier.classify(&generate_white_noise(3)), probability);
}

#[test]
fn test_classification_is_bounded_and_repeatable() {
    let classifier = create_classifier();
    let wave = generate_white_noise(42);
    let first = classifier.classify(&wave);
    let second = classifier.classify(&wave);
    assert!((0.0..=1.0).contains(&first));
    assert_eq!(first.to_bits(), second.to_bits());
}

#[test]
fn test_low_sample_rate_fails_closed() {
    // 8 kHz input cannot be low-passed at 6 kHz
    let classifier = create_classifier();
    let samples: Vec<f32> = (0..8_000).map(|i| ((i % 13) as f32 - 6.0) / 6.0).collect();
    let wave = Waveform::new(samples, 8_000).unwrap();
    assert_eq!(classifier.classify(&wave), 0.0);
    assert!(matches!(
        classifier.try_classify(&wave),
        Err(AnalysisError::InvalidCutoff { .. })
    ));
}

#[test]
fn test_mismatched_artifacts_rejected() {
    let model = BoostedTrees::from_json(&rmsp_stump_json(57)).unwrap();
    let result = CoughClassifier::new(model, identity_scaler(56), &CoughConfig::default());
    assert!(matches!(
        result,
        Err(AnalysisError::FeatureCountMismatch {
            expected: 56,
            actual: 57
        })
    ));

    let model = BoostedTrees::from_json(&rmsp_stump_json(58)).unwrap();
    let result = CoughClassifier::new(model, identity_scaler(57), &CoughConfig::default());
    assert!(matches!(
        result,
        Err(AnalysisError::FeatureCountMismatch {
            expected: 58,
            actual: 57
        })
    ));
}

#[test]
fn test_scaler_feature_names_checked() {
    let model = BoostedTrees::from_json(&rmsp_stump_json(57)).unwrap();
    let mut names = FeatureExtractor::default().feature_names();
    names.swap(8, 9);
    let scaler = identity_scaler(57).with_feature_names(names).unwrap();
    assert!(matches!(
        CoughClassifier::new(model, scaler, &CoughConfig::default()),
        Err(AnalysisError::ScalerFormat { .. })
    ));
}

#[test]
fn test_classify_cough_free_function() {
    let model = BoostedTrees::from_json(&rmsp_stump_json(57)).unwrap();
    let scaler = identity_scaler(57);
    let silence = Waveform::new(vec![0.0; 4_800], 48_000).unwrap();
    assert_eq!(classify_cough(&silence, &model, &scaler), 0.0);

    let probability = classify_cough(&generate_white_noise(5), &model, &scaler);
    assert!((probability as f64 - sigmoid(2.0)).abs() < 1e-6);

    // Wrong-length scaler fails closed rather than panicking
    assert_eq!(
        classify_cough(&generate_white_noise(5), &model, &identity_scaler(3)),
        0.0
    );
}

#[test]
fn test_out_of_range_mfcc_count_rejected() {
    let model = BoostedTrees::from_json(&rmsp_stump_json(57)).unwrap();
    let mut config = CoughConfig::default();
    config.features.n_mfcc = 200;
    assert!(matches!(
        CoughClassifier::new(model, identity_scaler(57), &config),
        Err(AnalysisError::InvalidConfig { .. })
    ));
}
