use super::{check_shape, Classifier};
use crate::error::{HealthError, HealthResult};
use crate::schema::N_INPUTS;
use serde::{Deserialize, Serialize};

/// Flattened tree node. Children always sit at a higher index than their
/// parent, so every walk from the root terminates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        probability: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    fn validate(&self) -> HealthResult<()> {
        if self.nodes.is_empty() {
            return Err(HealthError::InvalidModel("decision tree has no nodes".to_string()));
        }

        for (i, node) in self.nodes.iter().enumerate() {
            match *node {
                TreeNode::Split { feature, threshold, left, right } => {
                    if feature >= N_INPUTS {
                        return Err(HealthError::InvalidModel(format!(
                            "node {} splits on feature {} (max {})", i, feature, N_INPUTS - 1
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(HealthError::InvalidModel(format!(
                            "node {} has a non-finite threshold", i
                        )));
                    }
                    for child in [left, right] {
                        if child <= i || child >= self.nodes.len() {
                            return Err(HealthError::InvalidModel(format!(
                                "node {} has invalid child index {}", i, child
                            )));
                        }
                    }
                },
                TreeNode::Leaf { probability } => {
                    if !(0.0..=1.0).contains(&probability) {
                        return Err(HealthError::InvalidModel(format!(
                            "leaf {} probability {} outside [0, 1]", i, probability
                        )));
                    }
                },
            }
        }

        Ok(())
    }

    /// Goes left when `x[feature] <= threshold`.
    fn leaf_probability(&self, features: &[f64]) -> HealthResult<f64> {
        let mut index = 0;
        for _ in 0..self.nodes.len() {
            match self.nodes.get(index) {
                Some(TreeNode::Split { feature, threshold, left, right }) => {
                    let value = features.get(*feature).ok_or(HealthError::ShapeMismatch {
                        expected: feature + 1,
                        actual: features.len(),
                    })?;
                    index = if value <= threshold { *left } else { *right };
                },
                Some(TreeNode::Leaf { probability }) => return Ok(*probability),
                None => break,
            }
        }

        Err(HealthError::Prediction(format!("tree walk did not reach a leaf (stopped at node {})", index)))
    }
}

/// Averages leaf probabilities across trees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestModel {
    pub trees: Vec<DecisionTree>,
}

impl ForestModel {
    pub fn validate(&self) -> HealthResult<()> {
        if self.trees.is_empty() {
            return Err(HealthError::InvalidModel("forest has no trees".to_string()));
        }
        for tree in &self.trees {
            tree.validate()?;
        }
        Ok(())
    }
}

impl Classifier for ForestModel {
    fn predict_proba(&self, features: &[f64]) -> HealthResult<f64> {
        check_shape(N_INPUTS, features)?;
        if self.trees.is_empty() {
            return Err(HealthError::Prediction("forest has no trees".to_string()));
        }

        let mut total = 0.0;
        for tree in &self.trees {
            total += tree.leaf_probability(features)?;
        }
        Ok(total / self.trees.len() as f64)
    }

    fn n_features(&self) -> usize {
        N_INPUTS
    }

    fn kind(&self) -> &'static str {
        "forest"
    }
}
