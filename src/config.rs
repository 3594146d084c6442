use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{HealthError, HealthResult};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub resources: ResourceConfig,
    pub training: TrainingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceConfig {
    pub foods: PathBuf,
    pub model: PathBuf,
}

impl Default for ResourceConfig {
    fn default() -> Self {
        Self {
            foods: PathBuf::from("data/cleaned_foods.csv"),
            model: PathBuf::from("model/health_model.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub dataset: PathBuf,
    pub test_fraction: f64,
    pub seed: u64,
    pub epochs: usize,
    pub learning_rate: f64,
    pub init_sd: f64,     // SD of the initial weight draw
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from("data/processed_diabetes.csv"),
            test_fraction: 0.2,
            seed: 42,
            epochs: 500,
            learning_rate: 0.5,
            init_sd: 0.01,
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> HealthResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> HealthResult<()> {
        self.training.validate()
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> HealthResult<()> {
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(HealthError::Validation(
                "test_fraction must be between 0 and 1 (exclusive)".to_string()
            ));
        }

        if self.epochs == 0 {
            return Err(HealthError::Validation(
                "At least one training epoch must be specified".to_string()
            ));
        }

        if !(self.learning_rate > 0.0) || !self.learning_rate.is_finite() {
            return Err(HealthError::Validation(
                "learning_rate must be positive".to_string()
            ));
        }

        if !(self.init_sd >= 0.0) || !self.init_sd.is_finite() {
            return Err(HealthError::Validation(
                "init_sd must be non-negative".to_string()
            ));
        }

        Ok(())
    }
}
