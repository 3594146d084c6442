//! Chained risk inference: diabetes, then cardio, then hypertension.
//!
//! Every step rebuilds the full raw row with whatever flags are known so far,
//! runs a fresh normalization pass over it, and projects that step's columns.
//! Earlier scaled vectors are never reused: the flag columns change between
//! steps and so do their scaled values.

use crate::error::{HealthError, HealthResult};
use crate::estimator::DerivedHealthValues;
use crate::models::ClassifierBundle;
use crate::normalizer::NormalizerState;
use crate::profile::{round_to, Profile};
use crate::schema::{Feature, FeatureVector, Target};
use log::debug;
use serde::{Deserialize, Serialize};

pub const DECISION_THRESHOLD: f64 = 0.5;

/// Risk percentages in [0, 100], one decimal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionResult {
    pub diabetes: f64,
    pub cardio: f64,
    pub hypertension: f64,
}

impl PredictionResult {
    fn from_probabilities(diabetes: f64, cardio: f64, hypertension: f64) -> Self {
        Self {
            diabetes: as_percent(diabetes),
            cardio: as_percent(cardio),
            hypertension: as_percent(hypertension),
        }
    }
}

fn as_percent(probability: f64) -> f64 {
    round_to(probability * 100.0, 1)
}

/// Runs the chain when both artifacts are loaded, otherwise reports zero risk.
pub fn predict_if_available(
    profile: &Profile,
    derived: &DerivedHealthValues,
    normalizer: Option<&NormalizerState>,
    models: Option<&ClassifierBundle>,
) -> HealthResult<PredictionResult> {
    match (normalizer, models) {
        (Some(normalizer), Some(models)) => predict(profile, derived, normalizer, models),
        _ => {
            debug!("Model bundle unavailable, skipping risk prediction");
            Ok(PredictionResult::default())
        },
    }
}

pub fn predict(
    profile: &Profile,
    derived: &DerivedHealthValues,
    normalizer: &NormalizerState,
    models: &ClassifierBundle,
) -> HealthResult<PredictionResult> {
    let base = base_row(profile, derived);

    let prob_d = run_step(Target::Diabetes, &base, normalizer, models)?;
    let is_diabetes = flag(prob_d);

    let cardio_row = base.with(Feature::Diabetes, is_diabetes);
    let prob_c = run_step(Target::Cardio, &cardio_row, normalizer, models)?;
    let is_cardio = flag(prob_c);

    let hypertension_row = base
        .with(Feature::HeartDisease, is_cardio)
        .with(Feature::Diabetes, is_diabetes);
    let prob_h = run_step(Target::Hypertension, &hypertension_row, normalizer, models)?;

    debug!("Chain probabilities: diabetes={:.4} cardio={:.4} hypertension={:.4}", prob_d, prob_c, prob_h);
    Ok(PredictionResult::from_probabilities(prob_d, prob_c, prob_h))
}

/// Raw row with every condition flag zeroed.
pub fn base_row(profile: &Profile, derived: &DerivedHealthValues) -> FeatureVector {
    FeatureVector::zeros()
        .with(Feature::Gender, profile.gender.encode())
        .with(Feature::Age, profile.age)
        .with(Feature::Bmi, derived.bmi)
        .with(Feature::SmokingHistory, profile.smoking as f64)
        .with(Feature::Hba1c, derived.hba1c)
        .with(Feature::BloodGlucose, derived.glucose)
}

fn flag(probability: f64) -> f64 {
    if probability > DECISION_THRESHOLD { 1.0 } else { 0.0 }
}

fn run_step(
    target: Target,
    raw: &FeatureVector,
    normalizer: &NormalizerState,
    models: &ClassifierBundle,
) -> HealthResult<f64> {
    let scaled = normalizer.transform(raw)?;
    let inputs = scaled.project(target);
    let classifier = models.get(target);
    if classifier.n_features() != inputs.len() {
        return Err(HealthError::ShapeMismatch {
            expected: classifier.n_features(),
            actual: inputs.len(),
        });
    }
    let probability = classifier.predict_proba(&inputs)?;

    if !(0.0..=1.0).contains(&probability) {
        return Err(HealthError::Prediction(format!(
            "{} classifier returned probability {}", target, probability
        )));
    }

    Ok(probability)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Classifier, LogisticModel};
    use crate::profile::Gender;
    use crate::schema::N_INPUTS;
    use std::sync::{Arc, Mutex};

    /// Records every input it sees and answers with a fixed probability.
    struct Recording {
        probability: f64,
        seen: Arc<Mutex<Vec<Vec<f64>>>>,
    }

    impl Classifier for Recording {
        fn predict_proba(&self, features: &[f64]) -> HealthResult<f64> {
            self.seen.lock().unwrap().push(features.to_vec());
            Ok(self.probability)
        }

        fn n_features(&self) -> usize {
            N_INPUTS
        }

        fn kind(&self) -> &'static str {
            "recording"
        }
    }

    struct Failing;

    /// Accepts a narrower input than the chain supplies.
    struct Narrow;

    impl Classifier for Narrow {
        fn predict_proba(&self, _features: &[f64]) -> HealthResult<f64> {
            Ok(0.5)
        }

        fn n_features(&self) -> usize {
            3
        }

        fn kind(&self) -> &'static str {
            "narrow"
        }
    }

    impl Classifier for Failing {
        fn predict_proba(&self, _features: &[f64]) -> HealthResult<f64> {
            Err(HealthError::Prediction("boom".to_string()))
        }

        fn n_features(&self) -> usize {
            N_INPUTS
        }

        fn kind(&self) -> &'static str {
            "failing"
        }
    }

    type Seen = Arc<Mutex<Vec<Vec<f64>>>>;

    fn recording(probability: f64) -> (Box<dyn Classifier>, Seen) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let model = Recording { probability, seen: Arc::clone(&seen) };
        (Box::new(model), seen)
    }

    fn sample() -> (Profile, DerivedHealthValues) {
        let profile = Profile {
            gender: Gender::Male,
            age: 55.0,
            height_cm: Some(170.0),
            weight_kg: Some(89.6),
            smoking: 3,
        };
        let derived = DerivedHealthValues { bmi: 31.0, glucose: 107.0, hba1c: 5.5 };
        (profile, derived)
    }

    #[test]
    fn test_chain_projects_and_feeds_flags_forward() {
        let (profile, derived) = sample();
        let (d, seen_d) = recording(0.8);
        let (c, seen_c) = recording(0.7);
        let (h, seen_h) = recording(0.1234);
        let models = ClassifierBundle::new(d, c, h);

        let result = predict(&profile, &derived, &NormalizerState::identity(), &models).unwrap();

        assert_eq!(*seen_d.lock().unwrap(), vec![vec![1.0, 55.0, 31.0, 3.0, 5.5, 107.0, 0.0, 0.0]]);
        // diabetes flag in the last slot
        assert_eq!(*seen_c.lock().unwrap(), vec![vec![1.0, 55.0, 31.0, 3.0, 5.5, 107.0, 0.0, 1.0]]);
        // diabetes then heart disease
        assert_eq!(*seen_h.lock().unwrap(), vec![vec![1.0, 55.0, 31.0, 3.0, 5.5, 107.0, 1.0, 1.0]]);

        assert_eq!(result, PredictionResult { diabetes: 80.0, cardio: 70.0, hypertension: 12.3 });
    }

    #[test]
    fn test_percentages_round_ties_to_even() {
        let (profile, derived) = sample();
        let (d, _) = recording(0.5625);
        let (c, _) = recording(0.0625);
        let (h, _) = recording(0.125);
        let models = ClassifierBundle::new(d, c, h);

        let result = predict(&profile, &derived, &NormalizerState::identity(), &models).unwrap();
        assert_eq!(result, PredictionResult { diabetes: 56.2, cardio: 6.2, hypertension: 12.5 });
    }

    #[test]
    fn test_threshold_is_strict() {
        let (profile, derived) = sample();
        let (d, _) = recording(0.5);
        let (c, seen_c) = recording(0.5);
        let (h, seen_h) = recording(0.5);
        let models = ClassifierBundle::new(d, c, h);

        predict(&profile, &derived, &NormalizerState::identity(), &models).unwrap();

        assert_eq!(seen_c.lock().unwrap()[0][7], 0.0);
        assert_eq!(&seen_h.lock().unwrap()[0][6..], &[0.0, 0.0]);
    }

    #[test]
    fn test_each_step_normalizes_its_own_row() {
        let (profile, derived) = sample();
        let mut normalizer = NormalizerState::identity();
        normalizer.mean[Feature::Diabetes.index()] = 0.25;
        normalizer.scale[Feature::Diabetes.index()] = 0.5;
        normalizer.mean[Feature::HeartDisease.index()] = 0.1;
        normalizer.scale[Feature::HeartDisease.index()] = 0.2;

        let (d, _) = recording(0.9);
        let (c, seen_c) = recording(0.2);
        let (h, seen_h) = recording(0.3);
        let models = ClassifierBundle::new(d, c, h);

        predict(&profile, &derived, &normalizer, &models).unwrap();

        // (1 - 0.25) / 0.5
        assert_eq!(seen_c.lock().unwrap()[0][7], 1.5);
        let h_inputs = seen_h.lock().unwrap()[0].clone();
        assert_eq!(h_inputs[6], 1.5);
        // heart disease flag 0: (0 - 0.1) / 0.2
        assert!((h_inputs[7] + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_missing_state_yields_zero_result() {
        let (profile, derived) = sample();
        let (d, seen_d) = recording(0.9);
        let (c, _) = recording(0.9);
        let (h, _) = recording(0.9);
        let models = ClassifierBundle::new(d, c, h);
        let normalizer = NormalizerState::identity();

        let zero = PredictionResult::default();
        assert_eq!(predict_if_available(&profile, &derived, None, Some(&models)).unwrap(), zero);
        assert_eq!(predict_if_available(&profile, &derived, Some(&normalizer), None).unwrap(), zero);
        assert_eq!(predict_if_available(&profile, &derived, None, None).unwrap(), zero);
        assert!(seen_d.lock().unwrap().is_empty());
    }

    #[test]
    fn test_classifier_failure_fails_whole_prediction() {
        let (profile, derived) = sample();
        let (d, _) = recording(0.9);
        let (h, seen_h) = recording(0.9);
        let models = ClassifierBundle::new(d, Box::new(Failing), h);

        let result = predict(&profile, &derived, &NormalizerState::identity(), &models);
        assert!(matches!(result, Err(HealthError::Prediction(_))));
        assert!(seen_h.lock().unwrap().is_empty());
    }

    #[test]
    fn test_classifier_width_must_match_projection() {
        let (profile, derived) = sample();
        let (c, _) = recording(0.1);
        let (h, _) = recording(0.1);
        let models = ClassifierBundle::new(Box::new(Narrow), c, h);

        let result = predict(&profile, &derived, &NormalizerState::identity(), &models);
        assert!(matches!(result, Err(HealthError::ShapeMismatch { expected: 3, actual: N_INPUTS })));
    }

    #[test]
    fn test_out_of_range_probability_rejected() {
        let (profile, derived) = sample();
        let (d, _) = recording(1.5);
        let (c, _) = recording(0.1);
        let (h, _) = recording(0.1);
        let models = ClassifierBundle::new(d, c, h);

        assert!(predict(&profile, &derived, &NormalizerState::identity(), &models).is_err());
    }

    #[test]
    fn test_repeated_prediction_is_bit_identical() {
        let (profile, derived) = sample();
        let normalizer = NormalizerState {
            mean: vec![0.5, 41.8, 27.3, 1.2, 5.5, 138.0, 0.07, 0.04, 0.09],
            scale: vec![0.5, 22.5, 6.6, 1.1, 1.07, 40.7, 0.26, 0.19, 0.28],
        };
        let logistic = |bias: f64| -> Box<dyn Classifier> {
            Box::new(LogisticModel::new(vec![0.1, 0.9, 0.4, 0.2, 1.3, 1.1, 0.3, 0.5], bias).unwrap())
        };
        let models = ClassifierBundle::new(logistic(-2.0), logistic(-3.0), logistic(-1.0));

        let first = predict(&profile, &derived, &normalizer, &models).unwrap();
        let second = predict(&profile, &derived, &normalizer, &models).unwrap();
        assert_eq!(first.diabetes.to_bits(), second.diabetes.to_bits());
        assert_eq!(first.cardio.to_bits(), second.cardio.to_bits());
        assert_eq!(first.hypertension.to_bits(), second.hypertension.to_bits());
        assert!((0.0..=100.0).contains(&first.hypertension));
    }
}
