//! Flat decision and isolation trees
//!
//! A tree is a node vector with the root at index 0. Load-time validation
//! requires every child index to point forward (greater than its parent's
//! index) and inside the vector, which rules out cycles, so traversal of a
//! validated tree always terminates at a leaf.

use serde::{Deserialize, Serialize};

use crate::node::Node;
use crate::{MLError, MLResult};

/// A tree over leaf payload `L`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree<L> {
    /// Nodes, root first
    pub nodes: Vec<Node<L>>,
}

/// Where a sample ended up
#[derive(Debug)]
pub struct LeafHit<'a, L> {
    /// The leaf reached
    pub leaf: &'a L,
    /// Edges from the root
    pub depth: usize,
}

impl<L> Tree<L> {
    /// Tree from nodes
    pub fn new(nodes: Vec<Node<L>>) -> Self {
        Self { nodes }
    }

    /// Get the number of nodes in the tree
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Check structure against the model's feature count
    ///
    /// `check_leaf` validates each leaf payload.
    pub fn validate<F>(&self, num_features: usize, mut check_leaf: F) -> MLResult<()>
    where
        F: FnMut(&L) -> MLResult<()>,
    {
        if self.nodes.is_empty() {
            return Err(MLError::InvalidModel("tree has no nodes".into()));
        }

        for (index, node) in self.nodes.iter().enumerate() {
            match node {
                Node::Internal {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= num_features {
                        return Err(MLError::InvalidModel(format!(
                            "node {} splits on feature {} but the model has {} features",
                            index, feature, num_features
                        )));
                    }
                    if !threshold.is_finite() {
                        return Err(MLError::InvalidModel(format!("node {} has a non-finite threshold", index)));
                    }
                    for child in [*left, *right] {
                        if child <= index || child >= self.nodes.len() {
                            return Err(MLError::InvalidModel(format!(
                                "node {} has child index {} out of range",
                                index, child
                            )));
                        }
                    }
                }
                Node::External(leaf) => check_leaf(leaf)?,
            }
        }

        Ok(())
    }

    /// Walk to the leaf for `features`, reporting each split feature used
    pub fn leaf<F>(&self, features: &[f32], mut on_split: F) -> MLResult<LeafHit<'_, L>>
    where
        F: FnMut(usize),
    {
        let mut index = 0;
        let mut depth = 0;

        // A validated tree reaches a leaf in fewer steps than it has nodes
        for _ in 0..self.nodes.len() {
            let node = self
                .nodes
                .get(index)
                .ok_or_else(|| MLError::InvalidModel(format!("child index {} out of range", index)))?;

            match node {
                Node::External(leaf) => return Ok(LeafHit { leaf, depth }),
                Node::Internal { feature, .. } => {
                    on_split(*feature);
                    index = node.traverse(features)?;
                    depth += 1;
                }
            }
        }

        Err(MLError::InvalidModel("tree traversal did not reach a leaf".into()))
    }

    /// Get tree depth (longest root-to-leaf path)
    pub fn depth(&self) -> usize {
        let mut depths = vec![0usize; self.nodes.len()];
        let mut max = 0;
        for (index, node) in self.nodes.iter().enumerate() {
            if let Node::Internal { left, right, .. } = node {
                let child_depth = depths[index] + 1;
                for child in [*left, *right] {
                    if let Some(d) = depths.get_mut(child) {
                        *d = (*d).max(child_depth);
                        max = max.max(*d);
                    }
                }
            }
        }
        max
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{ClassLeaf, IsolationLeaf};

    fn leaf(p: f32) -> Node<ClassLeaf> {
        Node::external(ClassLeaf {
            probabilities: vec![p, 1.0 - p],
        })
    }

    fn stump() -> Tree<ClassLeaf> {
        // x0 < 1.5 → [0.8, 0.2]; else x1 < 10 → [0.3, 0.7] / [0.1, 0.9]
        Tree::new(vec![
            Node::internal(0, 1.5, 1, 2),
            leaf(0.8),
            Node::internal(1, 10.0, 3, 4),
            leaf(0.3),
            leaf(0.1),
        ])
    }

    #[test]
    fn walks_to_the_right_leaf() {
        let tree = stump();
        let mut used = Vec::new();

        let hit = tree.leaf(&[2.0, 5.0], |f| used.push(f)).unwrap();
        assert_eq!(hit.leaf.probabilities, vec![0.3, 0.7]);
        assert_eq!(hit.depth, 2);
        assert_eq!(used, vec![0, 1]);

        let hit = tree.leaf(&[1.0, 50.0], |_| {}).unwrap();
        assert_eq!(hit.leaf.probabilities[0], 0.8);
        assert_eq!(hit.depth, 1);
    }

    #[test]
    fn depth_and_count() {
        assert_eq!(stump().node_count(), 5);
        assert_eq!(stump().depth(), 2);
    }

    #[test]
    fn validation_catches_bad_structure() {
        let ok = |_: &ClassLeaf| -> MLResult<()> { Ok(()) };
        assert!(stump().validate(2, ok).is_ok());

        // Feature out of range
        assert!(stump().validate(1, ok).is_err());

        // Backward edge would loop
        let cyclic = Tree::new(vec![Node::internal(0, 1.0, 0, 1), leaf(0.5)]);
        assert!(cyclic.validate(1, ok).is_err());

        // Child past the end
        let dangling = Tree::new(vec![Node::internal(0, 1.0, 1, 7), leaf(0.5)]);
        assert!(dangling.validate(1, ok).is_err());

        let empty: Tree<IsolationLeaf> = Tree::new(vec![]);
        assert!(empty.validate(1, |_| Ok(())).is_err());
    }

    #[test]
    fn leaf_check_is_applied() {
        let result = stump().validate(2, |leaf| {
            if leaf.probabilities.len() == 3 {
                Ok(())
            } else {
                Err(MLError::InvalidModel("wrong width".into()))
            }
        });
        assert!(result.is_err());
    }
}
