//! Tree Ensemble - native model artifact
//!
//! Decision tree / random forest exported as JSON from the training
//! environment. A single tree is just an ensemble of one.
//!
//! ```json
//! {
//!   "n_features": 15,
//!   "classes": [0, 1, 2, 3, 4, 5],
//!   "trees": [
//!     { "nodes": [
//!       { "kind": "split", "feature": 6, "threshold": 1200.0, "left": 1, "right": 2 },
//!       { "kind": "leaf", "value": [40, 0, 0, 0, 0, 2] },
//!       { "kind": "leaf", "value": [1, 0, 30, 5, 0, 0] }
//!     ] }
//!   ]
//! }
//! ```

use ndarray::{ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::predictor::{check_width, PredictError, Predictor};

// ============================================================================
// ARTIFACT SCHEMA
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    /// `x[feature] <= threshold` goes left, otherwise right
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    /// Per-class weights, aligned with `TreeEnsemble::classes`
    Leaf { value: Vec<f64> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    /// Node 0 is the root
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    pub n_features: usize,
    /// Class code for each leaf weight column
    pub classes: Vec<i64>,
    pub trees: Vec<Tree>,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TreeError {
    #[error("ensemble has no trees")]
    NoTrees,

    #[error("ensemble declares no classes")]
    NoClasses,

    #[error("tree {tree} has no nodes")]
    EmptyTree { tree: usize },

    #[error("tree {tree} node {node}: leaf has {actual} weights, expected {expected}")]
    LeafWidth { tree: usize, node: usize, expected: usize, actual: usize },

    #[error("tree {tree} node {node}: split on feature {feature} but model has {n_features} features")]
    FeatureOutOfRange { tree: usize, node: usize, feature: usize, n_features: usize },

    #[error("tree {tree} node {node}: child {child} must point forward and exist")]
    BadChild { tree: usize, node: usize, child: usize },

    #[error("tree {tree} node {node}: threshold is not finite")]
    BadThreshold { tree: usize, node: usize },
}

// ============================================================================
// VALIDATION
// ============================================================================

impl TreeEnsemble {
    /// Structural checks run once at load time.
    ///
    /// Children must have a higher index than their parent, which rules out
    /// cycles and lets `predict_row` walk without a step limit.
    pub fn validate(&self) -> Result<(), TreeError> {
        if self.trees.is_empty() {
            return Err(TreeError::NoTrees);
        }
        if self.classes.is_empty() {
            return Err(TreeError::NoClasses);
        }

        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(TreeError::EmptyTree { tree: t });
            }
            let len = tree.nodes.len();

            for (n, node) in tree.nodes.iter().enumerate() {
                match node {
                    Node::Leaf { value } => {
                        if value.len() != self.classes.len() {
                            return Err(TreeError::LeafWidth {
                                tree: t,
                                node: n,
                                expected: self.classes.len(),
                                actual: value.len(),
                            });
                        }
                    }
                    Node::Split { feature, threshold, left, right } => {
                        if *feature >= self.n_features {
                            return Err(TreeError::FeatureOutOfRange {
                                tree: t,
                                node: n,
                                feature: *feature,
                                n_features: self.n_features,
                            });
                        }
                        if !threshold.is_finite() {
                            return Err(TreeError::BadThreshold { tree: t, node: n });
                        }
                        for &child in [left, right] {
                            if child <= n || child >= len {
                                return Err(TreeError::BadChild { tree: t, node: n, child });
                            }
                        }
                    }
                }
            }
        }

        Ok(())
    }
}

// ============================================================================
// PREDICTION
// ============================================================================

impl Tree {
    /// Leaf weights reached by `row`
    fn leaf(&self, row: &ArrayView1<'_, f64>) -> &[f64] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { value } => return value,
                Node::Split { feature, threshold, left, right } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

impl TreeEnsemble {
    /// Mean class probability over all trees for one row
    pub fn predict_proba_row(&self, row: &ArrayView1<'_, f64>) -> Vec<f64> {
        let mut proba = vec![0.0; self.classes.len()];

        for tree in &self.trees {
            let leaf = tree.leaf(row);
            let total: f64 = leaf.iter().sum();
            if total <= 0.0 {
                continue;
            }
            for (p, w) in proba.iter_mut().zip(leaf) {
                *p += w / total;
            }
        }

        let n = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n);
        proba
    }

    /// Class code with the highest mean probability (first wins on ties)
    pub fn predict_row(&self, row: &ArrayView1<'_, f64>) -> i64 {
        let proba = self.predict_proba_row(row);
        let mut best = 0;
        for (i, p) in proba.iter().enumerate() {
            if *p > proba[best] {
                best = i;
            }
        }
        self.classes[best]
    }
}

impl Predictor for TreeEnsemble {
    fn predict(&self, batch: ArrayView2<'_, f64>) -> Result<Vec<i64>, PredictError> {
        check_width(&batch, self.n_features)?;
        Ok(batch.rows().into_iter().map(|row| self.predict_row(&row)).collect())
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn kind(&self) -> &'static str {
        if self.trees.len() == 1 {
            "decision_tree"
        } else {
            "random_forest"
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
