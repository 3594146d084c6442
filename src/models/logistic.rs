use super::{check_shape, Classifier};
use crate::error::{HealthError, HealthResult};
use crate::schema::N_INPUTS;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl LogisticModel {
    pub fn new(weights: Vec<f64>, bias: f64) -> HealthResult<Self> {
        let model = Self { weights, bias };
        model.validate()?;
        Ok(model)
    }

    pub fn validate(&self) -> HealthResult<()> {
        if self.weights.len() != N_INPUTS {
            return Err(HealthError::InvalidModel(format!(
                "logistic model needs {} weights, got {}",
                N_INPUTS,
                self.weights.len()
            )));
        }

        if !self.bias.is_finite() || self.weights.iter().any(|w| !w.is_finite()) {
            return Err(HealthError::InvalidModel(
                "logistic weights and bias must be finite".to_string()
            ));
        }

        Ok(())
    }

    pub fn decision(&self, features: &[f64]) -> f64 {
        self.weights.iter()
            .zip(features)
            .map(|(w, x)| w * x)
            .sum::<f64>() + self.bias
    }
}

/// Logistic function, stable for large |z|.
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl Classifier for LogisticModel {
    fn predict_proba(&self, features: &[f64]) -> HealthResult<f64> {
        check_shape(self.weights.len(), features)?;
        Ok(sigmoid(self.decision(features)))
    }

    fn n_features(&self) -> usize {
        self.weights.len()
    }

    fn kind(&self) -> &'static str {
        "logistic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_logistic_probability() {
        let model = LogisticModel::new(vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 2.0], -0.5).unwrap();
        let x = [1.0, 9.0, 9.0, 9.0, 9.0, 9.0, 9.0, 0.25];

        let p = model.predict_proba(&x).unwrap();
        let expected = 1.0 / (1.0 + (-(1.0 + 0.5 - 0.5_f64)).exp());
        assert_relative_eq!(p, expected, epsilon = 1e-12);
    }

    #[test]
    fn test_sigmoid_is_stable_at_extremes() {
        assert_relative_eq!(sigmoid(800.0), 1.0, epsilon = 1e-12);
        assert_relative_eq!(sigmoid(-800.0), 0.0, epsilon = 1e-12);
        assert!(sigmoid(-800.0).is_finite());
    }

    #[test]
    fn test_wrong_input_width() {
        let model = LogisticModel::new(vec![0.0; N_INPUTS], 0.0).unwrap();
        let result = model.predict_proba(&[0.0; 9]);
        assert!(matches!(result, Err(HealthError::ShapeMismatch { expected: 8, actual: 9 })));
    }
}
