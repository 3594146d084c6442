//! Simulated blood values from profile and intake. A demo heuristic, not a
//! clinical model.

use crate::foods::NutritionTotals;
use crate::profile::Profile;
use serde::{Deserialize, Serialize};

pub const BASE_GLUCOSE: f64 = 85.0;
pub const BASE_HBA1C: f64 = 5.0;
pub const GLUCOSE_RANGE: (f64, f64) = (70.0, 300.0);
pub const HBA1C_RANGE: (f64, f64) = (4.0, 15.0);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DerivedHealthValues {
    pub bmi: f64,
    pub glucose: f64,
    pub hba1c: f64,
}

pub fn estimate(profile: &Profile, totals: &NutritionTotals) -> DerivedHealthValues {
    let bmi = profile.bmi();
    let (glucose, hba1c) = simulate_blood_values(profile.age, bmi, totals.sugar);
    DerivedHealthValues { bmi, glucose, hba1c }
}

/// Adjustments are cumulative and applied in order before clamping.
pub fn simulate_blood_values(age: f64, bmi: f64, sugar: f64) -> (f64, f64) {
    let mut glucose = BASE_GLUCOSE;
    let mut hba1c = BASE_HBA1C;

    if bmi > 25.0 {
        glucose += (bmi - 25.0) * 2.0;
    }
    if bmi > 30.0 {
        hba1c += 0.5;
    }
    if age > 50.0 {
        glucose += 5.0;
    }
    glucose += sugar * 0.5;

    (clamp(glucose, GLUCOSE_RANGE), clamp(hba1c, HBA1C_RANGE))
}

// NaN lands on the lower bound.
fn clamp(value: f64, (lower, upper): (f64, f64)) -> f64 {
    if value.is_nan() {
        lower
    } else {
        value.max(lower).min(upper)
    }
}
