pub mod logistic;
pub mod forest;

use crate::error::{HealthError, HealthResult};
use crate::normalizer::NormalizerState;
use crate::schema::Target;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

pub use forest::ForestModel;
pub use logistic::LogisticModel;

/// A binary classifier over one scaled projection of the feature schema.
pub trait Classifier: Send + Sync {
    /// Probability of the positive class.
    fn predict_proba(&self, features: &[f64]) -> HealthResult<f64>;
    fn n_features(&self) -> usize;
    fn kind(&self) -> &'static str;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ClassifierConfig {
    Logistic(LogisticModel),
    Forest(ForestModel),
}

pub fn create_classifier(config: &ClassifierConfig) -> HealthResult<Box<dyn Classifier>> {
    match config {
        ClassifierConfig::Logistic(model) => {
            model.validate()?;
            Ok(Box::new(model.clone()))
        },
        ClassifierConfig::Forest(model) => {
            model.validate()?;
            Ok(Box::new(model.clone()))
        },
    }
}

pub(crate) fn check_shape(expected: usize, features: &[f64]) -> HealthResult<()> {
    if features.len() != expected {
        return Err(HealthError::ShapeMismatch {
            expected,
            actual: features.len(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfigs {
    pub diabetes: ClassifierConfig,
    pub cardio: ClassifierConfig,
    pub hypertension: ClassifierConfig,
}

/// On-disk form of the offline-fit artifacts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundleFile {
    pub normalizer: NormalizerState,
    pub classifiers: ClassifierConfigs,
}

impl ModelBundleFile {
    pub fn save<P: AsRef<Path>>(&self, path: P) -> HealthResult<()> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }
}

pub struct ClassifierBundle {
    diabetes: Box<dyn Classifier>,
    cardio: Box<dyn Classifier>,
    hypertension: Box<dyn Classifier>,
}

impl ClassifierBundle {
    pub fn new(
        diabetes: Box<dyn Classifier>,
        cardio: Box<dyn Classifier>,
        hypertension: Box<dyn Classifier>,
    ) -> Self {
        Self { diabetes, cardio, hypertension }
    }

    pub fn from_config(configs: &ClassifierConfigs) -> HealthResult<Self> {
        Ok(Self::new(
            create_classifier(&configs.diabetes)?,
            create_classifier(&configs.cardio)?,
            create_classifier(&configs.hypertension)?,
        ))
    }

    pub fn get(&self, target: Target) -> &dyn Classifier {
        match target {
            Target::Diabetes => self.diabetes.as_ref(),
            Target::Cardio => self.cardio.as_ref(),
            Target::Hypertension => self.hypertension.as_ref(),
        }
    }
}

impl std::fmt::Debug for ClassifierBundle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassifierBundle")
            .field("diabetes", &self.diabetes.kind())
            .field("cardio", &self.cardio.kind())
            .field("hypertension", &self.hypertension.kind())
            .finish()
    }
}

/// Normalizer plus the three chained classifiers, validated and ready to use.
#[derive(Debug)]
pub struct ModelBundle {
    pub normalizer: NormalizerState,
    pub classifiers: ClassifierBundle,
}

impl ModelBundle {
    pub fn from_file<P: AsRef<Path>>(path: P) -> HealthResult<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> HealthResult<Self> {
        let raw: ModelBundleFile = serde_json::from_reader(reader)?;
        Self::from_bundle_file(&raw)
    }

    pub fn from_bundle_file(raw: &ModelBundleFile) -> HealthResult<Self> {
        raw.normalizer.validate()?;
        Ok(Self {
            normalizer: raw.normalizer.clone(),
            classifiers: ClassifierBundle::from_config(&raw.classifiers)?,
        })
    }
}
