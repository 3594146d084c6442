use serde::{Deserialize, Serialize};
use crate::error::{HealthError, HealthResult};
use crate::schema::{FeatureVector, N_FEATURES};

/// Standard-score transform fit once over the full nine-column schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizerState {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl NormalizerState {
    /// Mean 0, scale 1: leaves vectors untouched.
    #[cfg(test)]
    pub fn identity() -> Self {
        Self {
            mean: vec![0.0; N_FEATURES],
            scale: vec![1.0; N_FEATURES],
        }
    }

    /// Fits population mean and standard deviation per column.
    /// Zero-variance columns get a scale of 1.
    pub fn fit(rows: &[FeatureVector]) -> HealthResult<Self> {
        if rows.is_empty() {
            return Err(HealthError::Training(
                "Cannot fit normalizer on an empty dataset".to_string()
            ));
        }

        let n = rows.len() as f64;
        let mut mean = vec![0.0; N_FEATURES];
        for row in rows {
            for (m, v) in mean.iter_mut().zip(row.as_array()) {
                *m += v;
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        let mut scale = vec![0.0; N_FEATURES];
        for row in rows {
            for ((s, v), m) in scale.iter_mut().zip(row.as_array()).zip(&mean) {
                *s += (v - m).powi(2);
            }
        }
        for s in &mut scale {
            let sd = (*s / n).sqrt();
            *s = if sd > f64::EPSILON { sd } else { 1.0 };
        }

        let state = Self { mean, scale };
        state.validate()?;
        Ok(state)
    }

    pub fn validate(&self) -> HealthResult<()> {
        if self.mean.len() != N_FEATURES || self.scale.len() != N_FEATURES {
            return Err(HealthError::InvalidNormalizer(format!(
                "expected {} columns, got mean={} scale={}",
                N_FEATURES,
                self.mean.len(),
                self.scale.len()
            )));
        }

        if self.mean.iter().any(|m| !m.is_finite()) {
            return Err(HealthError::InvalidNormalizer(
                "mean values must be finite".to_string()
            ));
        }

        if self.scale.iter().any(|s| !s.is_finite() || *s == 0.0) {
            return Err(HealthError::InvalidNormalizer(
                "scale values must be finite and non-zero".to_string()
            ));
        }

        Ok(())
    }

    pub fn transform(&self, raw: &FeatureVector) -> HealthResult<FeatureVector> {
        self.validate()?;

        let mut scaled = [0.0; N_FEATURES];
        for (i, value) in raw.as_array().iter().enumerate() {
            scaled[i] = (value - self.mean[i]) / self.scale[i];
        }

        Ok(FeatureVector::from_array(scaled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Feature;
    use approx::assert_relative_eq;

    #[test]
    fn test_transform_standardizes_each_column() {
        let normalizer = NormalizerState {
            mean: vec![0.5, 40.0, 27.0, 1.0, 5.5, 130.0, 0.1, 0.05, 0.1],
            scale: vec![0.5, 20.0, 6.0, 1.0, 1.0, 40.0, 0.3, 0.2, 0.3],
        };
        let raw = FeatureVector::zeros()
            .with(Feature::Gender, 1.0)
            .with(Feature::Age, 60.0)
            .with(Feature::BloodGlucose, 90.0);

        let scaled = normalizer.transform(&raw).unwrap();
        assert_relative_eq!(scaled.get(Feature::Gender), 1.0, epsilon = 1e-12);
        assert_relative_eq!(scaled.get(Feature::Age), 1.0, epsilon = 1e-12);
        assert_relative_eq!(scaled.get(Feature::BloodGlucose), -1.0, epsilon = 1e-12);
        assert_relative_eq!(scaled.get(Feature::Diabetes), -1.0 / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_fit_uses_population_statistics() {
        let rows = vec![
            FeatureVector::zeros().with(Feature::Age, 20.0),
            FeatureVector::zeros().with(Feature::Age, 40.0),
        ];

        let normalizer = NormalizerState::fit(&rows).unwrap();
        assert_relative_eq!(normalizer.mean[Feature::Age.index()], 30.0, epsilon = 1e-12);
        assert_relative_eq!(normalizer.scale[Feature::Age.index()], 10.0, epsilon = 1e-12);
        // constant column
        assert_relative_eq!(normalizer.scale[Feature::Bmi.index()], 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_wrong_dimension_rejected() {
        let normalizer = NormalizerState {
            mean: vec![0.0; 8],
            scale: vec![1.0; 8],
        };
        let result = normalizer.transform(&FeatureVector::zeros());
        assert!(matches!(result, Err(HealthError::InvalidNormalizer(_))));
    }

    #[test]
    fn test_zero_scale_rejected() {
        let mut normalizer = NormalizerState::identity();
        normalizer.scale[3] = 0.0;
        assert!(normalizer.validate().is_err());
    }
}
