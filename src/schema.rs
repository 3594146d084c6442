//! Column layout shared by the normalizer, the classifiers and training.
//!
//! The normalizer is fit over all nine columns in `Feature::ALL` order. Each
//! classifier sees only its own projection of the scaled vector, declared by
//! `Target::inputs`. Changing either order invalidates every saved bundle.

use serde::{Deserialize, Serialize};
use std::fmt;

pub const N_FEATURES: usize = 9;

/// Width of every classifier projection.
pub const N_INPUTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Gender,
    Age,
    Bmi,
    SmokingHistory,
    Hba1c,
    BloodGlucose,
    Hypertension,
    HeartDisease,
    Diabetes,
}

impl Feature {
    pub const ALL: [Feature; N_FEATURES] = [
        Feature::Gender,
        Feature::Age,
        Feature::Bmi,
        Feature::SmokingHistory,
        Feature::Hba1c,
        Feature::BloodGlucose,
        Feature::Hypertension,
        Feature::HeartDisease,
        Feature::Diabetes,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Dataset header name for this column.
    pub fn column_name(self) -> &'static str {
        match self {
            Feature::Gender => "gender",
            Feature::Age => "age",
            Feature::Bmi => "bmi",
            Feature::SmokingHistory => "smoking_history",
            Feature::Hba1c => "HbA1c_level",
            Feature::BloodGlucose => "blood_glucose_level",
            Feature::Hypertension => "hypertension",
            Feature::HeartDisease => "heart_disease",
            Feature::Diabetes => "diabetes",
        }
    }
}

/// The three chained prediction targets, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Diabetes,
    Cardio,
    Hypertension,
}

impl Target {
    pub const CHAIN: [Target; 3] = [Target::Diabetes, Target::Cardio, Target::Hypertension];

    /// The dataset column this target is trained against.
    pub fn label(self) -> Feature {
        match self {
            Target::Diabetes => Feature::Diabetes,
            Target::Cardio => Feature::HeartDisease,
            Target::Hypertension => Feature::Hypertension,
        }
    }

    /// Scaled columns the classifier was trained on, in training order.
    /// Hypertension takes diabetes before heart disease.
    pub fn inputs(self) -> &'static [Feature; N_INPUTS] {
        const DIABETES: [Feature; N_INPUTS] = [
            Feature::Gender,
            Feature::Age,
            Feature::Bmi,
            Feature::SmokingHistory,
            Feature::Hba1c,
            Feature::BloodGlucose,
            Feature::Hypertension,
            Feature::HeartDisease,
        ];
        const CARDIO: [Feature; N_INPUTS] = [
            Feature::Gender,
            Feature::Age,
            Feature::Bmi,
            Feature::SmokingHistory,
            Feature::Hba1c,
            Feature::BloodGlucose,
            Feature::Hypertension,
            Feature::Diabetes,
        ];
        const HYPERTENSION: [Feature; N_INPUTS] = [
            Feature::Gender,
            Feature::Age,
            Feature::Bmi,
            Feature::SmokingHistory,
            Feature::Hba1c,
            Feature::BloodGlucose,
            Feature::Diabetes,
            Feature::HeartDisease,
        ];

        match self {
            Target::Diabetes => &DIABETES,
            Target::Cardio => &CARDIO,
            Target::Hypertension => &HYPERTENSION,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Target::Diabetes => "diabetes",
            Target::Cardio => "cardio",
            Target::Hypertension => "hypertension",
        };
        f.write_str(name)
    }
}

/// A full row in `Feature::ALL` order, raw or scaled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureVector([f64; N_FEATURES]);

impl FeatureVector {
    pub fn zeros() -> Self {
        Self([0.0; N_FEATURES])
    }

    pub fn from_array(values: [f64; N_FEATURES]) -> Self {
        Self(values)
    }

    pub fn get(&self, feature: Feature) -> f64 {
        self.0[feature.index()]
    }

    pub fn set(&mut self, feature: Feature, value: f64) {
        self.0[feature.index()] = value;
    }

    pub fn with(mut self, feature: Feature, value: f64) -> Self {
        self.set(feature, value);
        self
    }

    pub fn as_array(&self) -> &[f64; N_FEATURES] {
        &self.0
    }

    pub fn project(&self, target: Target) -> Vec<f64> {
        target.inputs().iter().map(|&f| self.get(f)).collect()
    }
}
