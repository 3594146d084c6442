use crate::schema::Target;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub rows: usize,
    pub train_size: usize,
    pub test_size: usize,
    pub seed: u64,
    pub targets: Vec<TargetReport>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetReport {
    pub target: Target,
    pub positive_rate: f64,
    pub train_accuracy: f64,
    pub test_accuracy: f64,
}

pub fn accuracy(predicted: &[f64], actual: &[f64]) -> f64 {
    if actual.is_empty() {
        return 0.0;
    }

    let correct = predicted.iter()
        .zip(actual)
        .filter(|(p, y)| (**p > 0.5) == (**y > 0.5))
        .count();
    correct as f64 / actual.len() as f64
}
