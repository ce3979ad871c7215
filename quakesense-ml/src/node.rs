//! Tree node representation
//!
//! Trees are stored flat, as a vector of nodes addressed by index, exactly
//! as they appear in the model artifact:
//!
//! ```json
//! {"kind": "internal", "feature": 0, "threshold": 1.8, "left": 1, "right": 2}
//! {"kind": "external", "probabilities": [0.9, 0.1]}
//! {"kind": "external", "size": 12}
//! ```
//!
//! The leaf payload differs by model family (class probabilities for the
//! supervised forest, training sample count for the isolation forest), so
//! nodes are generic over it.

use serde::{Deserialize, Serialize};

use crate::{MLError, MLResult};

/// One node of a flat tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node<L> {
    /// Internal node with split condition
    Internal {
        /// Index into the model's feature list
        feature: usize,
        /// Samples with `value < threshold` go left
        threshold: f32,
        /// Left child index
        left: usize,
        /// Right child index
        right: usize,
    },
    /// Leaf node
    External(L),
}

impl<L> Node<L> {
    /// Create an internal node
    pub fn internal(feature: usize, threshold: f32, left: usize, right: usize) -> Self {
        Node::Internal {
            feature,
            threshold,
            left,
            right,
        }
    }

    /// Create a leaf
    pub fn external(leaf: L) -> Self {
        Node::External(leaf)
    }

    /// Check if node is a leaf
    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::External(_))
    }

    /// Child index to visit next for `features`
    pub fn traverse(&self, features: &[f32]) -> MLResult<usize> {
        match *self {
            Node::Internal {
                feature,
                threshold,
                left,
                right,
            } => {
                let value = features.get(feature).copied().ok_or(MLError::InvalidFeature(feature))?;
                if value < threshold {
                    Ok(left)
                } else {
                    Ok(right)
                }
            }
            Node::External(_) => Err(MLError::InvalidModel("cannot traverse from a leaf".into())),
        }
    }
}

/// Leaf of a supervised tree: class probabilities in the model's class order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassLeaf {
    /// One probability per class
    pub probabilities: Vec<f32>,
}

/// Leaf of an isolation tree: training samples that reached it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IsolationLeaf {
    /// Sample count
    pub size: u32,
}
