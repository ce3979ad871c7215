//! Tree ensembles
//!
//! Both families are loaded, never trained, here: the artifact carries the
//! fitted trees and this module only scores samples against them.
//!
//! - [`RandomForest`]: supervised, leaves hold class probabilities which are
//!   averaged across trees.
//! - [`IsolationForest`]: unsupervised, leaves hold the number of training
//!   samples that reached them; short isolation paths mean outliers.
//!
//! Every scoring call also reports which features the decision paths split
//! on, so the classifier can name what drove the result.

use serde::{Deserialize, Serialize};

use crate::classifier::Label;
use crate::node::{ClassLeaf, IsolationLeaf};
use crate::scoring::{c_factor, calculate_anomaly_score, AnomalyScore, Influence};
use crate::tree::Tree;
use crate::{MLError, MLResult};

/// Default outlier threshold on the isolation score
pub const DEFAULT_ANOMALY_THRESHOLD: f32 = 0.5;

/// Probability vectors may drift from 1.0 by this much
const PROBABILITY_SUM_TOLERANCE: f32 = 1e-3;

/// Averaged class probabilities for one sample
#[derive(Debug, Clone, PartialEq)]
pub struct ClassVote {
    /// Mean probability per class, in the forest's class order
    pub probabilities: Vec<f32>,
    /// Split usage along the decision paths
    pub influence: Influence,
}

impl ClassVote {
    /// Winning class index and its probability; ties go to the lowest index
    pub fn best(&self) -> Option<(usize, f32)> {
        let mut best: Option<(usize, f32)> = None;
        for (i, &p) in self.probabilities.iter().enumerate() {
            if best.map_or(true, |(_, b)| p > b) {
                best = Some((i, p));
            }
        }
        best
    }
}

/// Supervised random forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    /// Class order of every leaf's probability vector
    pub classes: Vec<Label>,
    /// Fitted trees
    pub trees: Vec<Tree<ClassLeaf>>,
}

impl RandomForest {
    /// Check structure against the model's feature count
    pub fn validate(&self, num_features: usize) -> MLResult<()> {
        if self.trees.is_empty() {
            return Err(MLError::InvalidModel("supervised forest has no trees".into()));
        }
        if self.classes.is_empty() {
            return Err(MLError::InvalidModel("supervised forest has no classes".into()));
        }
        for (i, class) in self.classes.iter().enumerate() {
            if self.classes[..i].contains(class) {
                return Err(MLError::InvalidModel(format!("class {} listed twice", class.as_str())));
            }
        }

        let width = self.classes.len();
        for (t, tree) in self.trees.iter().enumerate() {
            tree.validate(num_features, |leaf| check_class_leaf(leaf, width))
                .map_err(|e| in_tree(t, e))?;
        }
        Ok(())
    }

    /// Mean class probabilities over all trees
    pub fn predict_proba(&self, features: &[f32]) -> MLResult<ClassVote> {
        let mut sums = vec![0.0f32; self.classes.len()];
        let mut influence = Influence::new(features.len());

        for tree in &self.trees {
            let hit = tree.leaf(features, |f| influence.record(f))?;
            for (sum, p) in sums.iter_mut().zip(&hit.leaf.probabilities) {
                *sum += p;
            }
        }

        let n = self.trees.len().max(1) as f32;
        Ok(ClassVote {
            probabilities: sums.into_iter().map(|s| s / n).collect(),
            influence,
        })
    }

    /// Forest statistics
    pub fn stats(&self) -> ForestStats {
        ForestStats::of(&self.trees)
    }
}

fn check_class_leaf(leaf: &ClassLeaf, width: usize) -> MLResult<()> {
    if leaf.probabilities.len() != width {
        return Err(MLError::InvalidModel(format!(
            "leaf has {} probabilities for {} classes",
            leaf.probabilities.len(),
            width
        )));
    }
    if leaf.probabilities.iter().any(|p| !p.is_finite() || *p < 0.0) {
        return Err(MLError::InvalidModel("leaf probability is negative or not finite".into()));
    }
    let sum: f32 = leaf.probabilities.iter().sum();
    if (sum - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
        return Err(MLError::InvalidModel(format!("leaf probabilities sum to {}", sum)));
    }
    Ok(())
}

/// Isolation score for one sample
#[derive(Debug, Clone, PartialEq)]
pub struct IsolationVerdict {
    /// Score and path statistics
    pub score: AnomalyScore,
    /// `score > threshold`
    pub is_outlier: bool,
    /// Split usage along the isolation paths
    pub influence: Influence,
}

/// Unsupervised isolation forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsolationForest {
    /// Sub-sample size each tree was grown on, the `n` in `c(n)`
    pub sample_size: u32,
    /// Outlier threshold on the score
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    /// Fitted trees
    pub trees: Vec<Tree<IsolationLeaf>>,
}

fn default_threshold() -> f32 {
    DEFAULT_ANOMALY_THRESHOLD
}

impl IsolationForest {
    /// Check structure against the model's feature count
    pub fn validate(&self, num_features: usize) -> MLResult<()> {
        if self.trees.is_empty() {
            return Err(MLError::InvalidModel("isolation forest has no trees".into()));
        }
        if self.sample_size < 2 {
            return Err(MLError::InvalidModel("sample_size must be at least 2".into()));
        }
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(MLError::InvalidModel("threshold must be within (0, 1)".into()));
        }
        for (t, tree) in self.trees.iter().enumerate() {
            tree.validate(num_features, |_| Ok(())).map_err(|e| in_tree(t, e))?;
        }
        Ok(())
    }

    /// Path length of `features` in one tree, adjusted for the leaf size
    fn path_length(tree: &Tree<IsolationLeaf>, features: &[f32], influence: &mut Influence) -> MLResult<f32> {
        let hit = tree.leaf(features, |f| influence.record(f))?;
        Ok(hit.depth as f32 + c_factor(hit.leaf.size as usize))
    }

    /// Calculate anomaly score for a sample
    pub fn anomaly_score(&self, features: &[f32]) -> MLResult<IsolationVerdict> {
        let mut influence = Influence::new(features.len());
        let mut total = 0.0f32;
        for tree in &self.trees {
            total += Self::path_length(tree, features, &mut influence)?;
        }

        let avg_path_length = total / self.trees.len().max(1) as f32;
        let score = calculate_anomaly_score(avg_path_length, self.sample_size as usize);
        let score = AnomalyScore::new(score, avg_path_length, self.trees.len());

        Ok(IsolationVerdict {
            is_outlier: score.is_anomaly(self.threshold),
            score,
            influence,
        })
    }

    /// Forest statistics
    pub fn stats(&self) -> ForestStats {
        ForestStats::of(&self.trees)
    }
}

fn in_tree(index: usize, err: MLError) -> MLError {
    match err {
        MLError::InvalidModel(msg) => MLError::InvalidModel(format!("tree {}: {}", index, msg)),
        other => other,
    }
}

/// Forest statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForestStats {
    /// Number of trees
    pub num_trees: usize,
    /// Total nodes across all trees
    pub total_nodes: usize,
    /// Maximum tree depth
    pub max_depth: usize,
}

impl ForestStats {
    fn of<L>(trees: &[Tree<L>]) -> Self {
        Self {
            num_trees: trees.len(),
            total_nodes: trees.iter().map(Tree::node_count).sum(),
            max_depth: trees.iter().map(Tree::depth).max().unwrap_or(0),
        }
    }
}
