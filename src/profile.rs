//! Request-boundary parsing of the user profile.
//!
//! Profile fields arrive loosely typed (JSON numbers or strings, possibly
//! missing). They are resolved here, once, into a `Profile` with documented
//! defaults so the computation never sees a malformed value.

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_AGE: f64 = 30.0;
pub const DEFAULT_HEIGHT_CM: f64 = 170.0;
pub const DEFAULT_WEIGHT_KG: f64 = 65.0;
pub const DEFAULT_SMOKING: u8 = 0;
pub const FALLBACK_BMI: f64 = 22.0;

/// Smoking history codes used by the training data:
/// 0 never, 1 no info, 2 former / not current, 3 current / ever.
pub const MAX_SMOKING: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Other,
}

impl Gender {
    pub fn encode(self) -> f64 {
        match self {
            Gender::Male => 1.0,
            Gender::Other => 0.0,
        }
    }
}

/// Profile exactly as submitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawProfile {
    #[serde(default)]
    pub gender: Option<Value>,
    #[serde(default)]
    pub age: Option<Value>,
    #[serde(default)]
    pub height: Option<Value>,
    #[serde(default)]
    pub weight: Option<Value>,
    #[serde(default)]
    pub smoking: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Profile {
    pub gender: Gender,
    pub age: f64,
    /// `None` when a value was supplied but could not be used.
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub smoking: u8,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            gender: Gender::Other,
            age: DEFAULT_AGE,
            height_cm: Some(DEFAULT_HEIGHT_CM),
            weight_kg: Some(DEFAULT_WEIGHT_KG),
            smoking: DEFAULT_SMOKING,
        }
    }
}

impl Profile {
    pub fn from_raw(raw: &RawProfile) -> Self {
        let gender = match raw.gender.as_ref().and_then(Value::as_str) {
            Some("Male") => Gender::Male,
            _ => Gender::Other,
        };

        let age = match present(&raw.age) {
            None => DEFAULT_AGE,
            Some(value) => numeric(value).unwrap_or_else(|| {
                warn!("Unusable age {}, using {}", value, DEFAULT_AGE);
                DEFAULT_AGE
            }),
        };

        let height_cm = present(&raw.height).map_or(Some(DEFAULT_HEIGHT_CM), numeric);
        let weight_kg = present(&raw.weight).map_or(Some(DEFAULT_WEIGHT_KG), numeric);

        let smoking = match present(&raw.smoking) {
            None => DEFAULT_SMOKING,
            Some(value) => match numeric(value).map(f64::trunc) {
                Some(code) if (0.0..=MAX_SMOKING as f64).contains(&code) => code as u8,
                _ => {
                    warn!("Unusable smoking code {}, using {}", value, DEFAULT_SMOKING);
                    DEFAULT_SMOKING
                },
            },
        };

        Self { gender, age, height_cm, weight_kg, smoking }
    }

    /// `weight / height_m^2` rounded to two decimals, or `FALLBACK_BMI` when
    /// the inputs are unusable or the result is not finite.
    pub fn bmi(&self) -> f64 {
        match (self.height_cm, self.weight_kg) {
            (Some(height_cm), Some(weight_kg)) => compute_bmi(height_cm, weight_kg),
            _ => FALLBACK_BMI,
        }
    }
}

pub fn compute_bmi(height_cm: f64, weight_kg: f64) -> f64 {
    let height_m = height_cm / 100.0;
    let bmi = round_to(weight_kg / (height_m * height_m), 2);
    if bmi.is_finite() {
        bmi
    } else {
        FALLBACK_BMI
    }
}

/// Rounds the exact binary value, ties to even.
pub fn round_to(value: f64, decimals: usize) -> f64 {
    format!("{:.*}", decimals, value).parse::<f64>().unwrap_or(value)
}

fn present(value: &Option<Value>) -> Option<&Value> {
    value.as_ref().filter(|v| !v.is_null())
}

fn numeric(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: Value) -> RawProfile {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_bmi_from_height_and_weight() {
        let profile = Profile::from_raw(&raw(json!({ "height": 170, "weight": 65 })));
        assert_eq!(profile.bmi(), 22.49);
    }

    #[test]
    fn test_zero_height_falls_back() {
        let profile = Profile::from_raw(&raw(json!({ "height": 0, "weight": 65 })));
        assert_eq!(profile.bmi(), FALLBACK_BMI);
        assert_eq!(compute_bmi(0.0, 0.0), FALLBACK_BMI);
    }

    #[test]
    fn test_unparseable_height_falls_back() {
        let profile = Profile::from_raw(&raw(json!({ "height": "tall", "weight": "80" })));
        assert_eq!(profile.bmi(), FALLBACK_BMI);
    }

    #[test]
    fn test_string_numbers_accepted() {
        let profile = Profile::from_raw(&raw(json!({
            "gender": "Male", "age": " 55 ", "height": "180", "weight": "81", "smoking": "2"
        })));

        assert_eq!(profile.gender, Gender::Male);
        assert_eq!(profile.age, 55.0);
        assert_eq!(profile.bmi(), 25.0);
        assert_eq!(profile.smoking, 2);
    }

    #[test]
    fn test_defaults_for_missing_fields() {
        let profile = Profile::from_raw(&RawProfile::default());
        assert_eq!(profile, Profile::default());
        assert_eq!(profile.bmi(), 22.49);
    }

    #[test]
    fn test_malformed_age_and_smoking_recovered() {
        let profile = Profile::from_raw(&raw(json!({ "age": "old", "smoking": 7, "gender": "female" })));
        assert_eq!(profile.age, DEFAULT_AGE);
        assert_eq!(profile.smoking, DEFAULT_SMOKING);
        assert_eq!(profile.gender, Gender::Other);
    }

    #[test]
    fn test_null_treated_as_missing() {
        let profile = Profile::from_raw(&raw(json!({ "age": null, "height": null })));
        assert_eq!(profile.age, DEFAULT_AGE);
        assert_eq!(profile.height_cm, Some(DEFAULT_HEIGHT_CM));
    }

    #[test]
    fn test_rounding_ties_go_to_even() {
        assert_eq!(compute_bmi(200.0, 88.5), 22.12);
        assert_eq!(round_to(86.25, 1), 86.2);
        assert_eq!(round_to(56.25, 1), 56.2);
        assert_eq!(round_to(0.5625 * 100.0, 1), 56.2);
        assert_eq!(round_to(86.35, 1), 86.3);
    }

    #[test]
    fn test_rounding_non_finite_passes_through() {
        assert!(round_to(f64::INFINITY, 2).is_infinite());
        assert!(round_to(f64::NAN, 1).is_nan());
    }
}
