pub mod dataset;
pub mod report;

use crate::config::TrainingConfig;
use crate::error::{HealthError, HealthResult};
use crate::models::logistic::sigmoid;
use crate::models::{ClassifierConfig, ClassifierConfigs, LogisticModel, ModelBundleFile};
use crate::normalizer::NormalizerState;
use crate::schema::{FeatureVector, Target, N_INPUTS};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};

pub use dataset::*;
pub use report::*;

/// Fits the shared normalizer and one logistic model per chain target.
///
/// Classifiers are trained on the scaled projection `Target::inputs`, the same
/// projection the predictor feeds them at inference time.
pub struct Trainer {
    config: TrainingConfig,
    rng: StdRng,
}

struct Split {
    train: Vec<usize>,
    test: Vec<usize>,
}

impl Trainer {
    pub fn new(config: TrainingConfig) -> HealthResult<Self> {
        config.validate()?;
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self { config, rng })
    }

    pub fn train(&mut self, rows: &[FeatureVector]) -> HealthResult<(ModelBundleFile, TrainingReport)> {
        if rows.len() < 2 {
            return Err(HealthError::Training(format!(
                "need at least 2 rows to train, got {}", rows.len()
            )));
        }

        // Fit normalizer
        info!("Fitting normalizer on {} rows", rows.len());
        let normalizer = NormalizerState::fit(rows)?;
        let scaled = rows.iter()
            .map(|row| normalizer.transform(row))
            .collect::<HealthResult<Vec<_>>>()?;

        let split = self.split(rows.len());

        // Train each model in chain order
        let mut models = Vec::with_capacity(Target::CHAIN.len());
        let mut targets = Vec::with_capacity(Target::CHAIN.len());
        for target in Target::CHAIN {
            let (model, report) = self.train_target(target, rows, &scaled, &split)?;
            models.push(model);
            targets.push(report);
        }
        let [diabetes, cardio, hypertension]: [LogisticModel; 3] = models
            .try_into()
            .map_err(|_| HealthError::Training("incomplete model chain".to_string()))?;

        // Assemble bundle
        let bundle = ModelBundleFile {
            normalizer,
            classifiers: ClassifierConfigs {
                diabetes: ClassifierConfig::Logistic(diabetes),
                cardio: ClassifierConfig::Logistic(cardio),
                hypertension: ClassifierConfig::Logistic(hypertension),
            },
        };

        let report = TrainingReport {
            rows: rows.len(),
            train_size: split.train.len(),
            test_size: split.test.len(),
            seed: self.config.seed,
            targets,
        };

        Ok((bundle, report))
    }

    /// Shuffled split shared by all three targets. Both sides are non-empty.
    fn split(&mut self, n: usize) -> Split {
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(&mut self.rng);

        let n_test = ((n as f64 * self.config.test_fraction).ceil() as usize).clamp(1, n - 1);
        let train = indices.split_off(n_test);
        Split { train, test: indices }
    }

    fn train_target(
        &mut self,
        target: Target,
        raw: &[FeatureVector],
        scaled: &[FeatureVector],
        split: &Split,
    ) -> HealthResult<(LogisticModel, TargetReport)> {
        info!("Training {} model", target);

        let label = |i: usize| if raw[i].get(target.label()) > 0.5 { 1.0 } else { 0.0 };
        let inputs = |i: usize| scaled[i].project(target);

        let x_train: Vec<Vec<f64>> = split.train.iter().map(|&i| inputs(i)).collect();
        let y_train: Vec<f64> = split.train.iter().map(|&i| label(i)).collect();
        let x_test: Vec<Vec<f64>> = split.test.iter().map(|&i| inputs(i)).collect();
        let y_test: Vec<f64> = split.test.iter().map(|&i| label(i)).collect();

        let model = self.fit_logistic(&x_train, &y_train)?;

        let score = |x: &[Vec<f64>]| -> Vec<f64> {
            x.iter().map(|row| sigmoid(model.decision(row))).collect()
        };
        let train_accuracy = accuracy(&score(&x_train), &y_train);
        let test_accuracy = accuracy(&score(&x_test), &y_test);
        let positive_rate = (0..raw.len()).map(label).sum::<f64>() / raw.len() as f64;

        info!("  {} accuracy: train {:.4}, test {:.4}", target, train_accuracy, test_accuracy);

        Ok((model, TargetReport { target, positive_rate, train_accuracy, test_accuracy }))
    }

    /// Full-batch gradient descent on the log loss.
    fn fit_logistic(&mut self, x: &[Vec<f64>], y: &[f64]) -> HealthResult<LogisticModel> {
        let mut weights = vec![0.0; N_INPUTS];
        if self.config.init_sd > 0.0 {
            let init = Normal::new(0.0, self.config.init_sd)
                .map_err(|e| HealthError::Training(e.to_string()))?;
            for w in &mut weights {
                *w = init.sample(&mut self.rng);
            }
        }
        let mut bias = 0.0;

        let n = x.len() as f64;
        let lr = self.config.learning_rate;

        for epoch in 0..self.config.epochs {
            let mut grad_w = vec![0.0; N_INPUTS];
            let mut grad_b = 0.0;
            let mut loss = 0.0;

            for (row, &target) in x.iter().zip(y) {
                let z = weights.iter().zip(row).map(|(w, v)| w * v).sum::<f64>() + bias;
                let p = sigmoid(z);
                let err = p - target;
                for (g, v) in grad_w.iter_mut().zip(row) {
                    *g += err * v;
                }
                grad_b += err;
                loss -= target * p.max(1e-12).ln() + (1.0 - target) * (1.0 - p).max(1e-12).ln();
            }

            for (w, g) in weights.iter_mut().zip(&grad_w) {
                *w -= lr * g / n;
            }
            bias -= lr * grad_b / n;

            if epoch % 100 == 0 {
                debug!("epoch {} loss {:.6}", epoch, loss / n);
            }
        }

        LogisticModel::new(weights, bias)
    }
}
