//! Gradient-boosted tree ensembles read from LightGBM `dump_model()` JSON.
//!
//! Only the subset of the dump needed for inference is modelled: the tree
//! structure with split thresholds, leaf values and node sample counts.

use crate::errors::ModelError;
use serde::Deserialize;

/// A node of one tree, either a numerical split or a leaf.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split(SplitNode),
    Leaf(LeafNode),
}

#[derive(Debug, Clone, Deserialize)]
pub struct SplitNode {
    pub split_feature: usize,
    pub threshold: f64,
    #[serde(default = "default_decision_type")]
    pub decision_type: String,
    #[serde(default)]
    pub default_left: bool,
    #[serde(default)]
    pub internal_value: f64,
    /// Training samples routed through this node; required by TreeSHAP.
    #[serde(default)]
    pub internal_count: Option<f64>,
    pub left_child: Box<TreeNode>,
    pub right_child: Box<TreeNode>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LeafNode {
    pub leaf_value: f64,
    #[serde(default)]
    pub leaf_count: Option<f64>,
}

fn default_decision_type() -> String {
    "<=".to_string()
}

impl TreeNode {
    /// Follows the decision path for `x` and returns the leaf value.
    pub fn predict(&self, x: &[f64]) -> Result<f64, ModelError> {
        let mut node = self;
        loop {
            match node {
                TreeNode::Leaf(leaf) => return Ok(leaf.leaf_value),
                TreeNode::Split(split) => {
                    node = if split.goes_left(x)? {
                        &split.left_child
                    } else {
                        &split.right_child
                    };
                }
            }
        }
    }

    /// Sample count of this node, if the dump recorded it.
    pub fn cover(&self) -> Option<f64> {
        match self {
            TreeNode::Split(split) => split.internal_count,
            TreeNode::Leaf(leaf) => leaf.leaf_count,
        }
    }

    /// Whether every node in the subtree has a positive sample count.
    pub fn has_complete_covers(&self) -> bool {
        let positive = self.cover().map(|c| c > 0.0).unwrap_or(false);
        match self {
            TreeNode::Leaf(_) => positive,
            TreeNode::Split(split) => {
                positive
                    && split.left_child.has_complete_covers()
                    && split.right_child.has_complete_covers()
            }
        }
    }

    /// Largest feature index used by any split, `None` for a single-leaf tree.
    pub fn max_feature(&self) -> Option<usize> {
        match self {
            TreeNode::Leaf(_) => None,
            TreeNode::Split(split) => [
                Some(split.split_feature),
                split.left_child.max_feature(),
                split.right_child.max_feature(),
            ]
            .into_iter()
            .flatten()
            .max(),
        }
    }

    fn validate(&self) -> Result<(), ModelError> {
        match self {
            TreeNode::Leaf(leaf) if !leaf.leaf_value.is_finite() => Err(ModelError::Artifact(
                "leaf value is not finite".to_string(),
            )),
            TreeNode::Leaf(_) => Ok(()),
            TreeNode::Split(split) => {
                if split.decision_type != "<=" {
                    return Err(ModelError::Artifact(format!(
                        "unsupported decision type '{}'",
                        split.decision_type
                    )));
                }
                split.left_child.validate()?;
                split.right_child.validate()
            }
        }
    }
}

impl SplitNode {
    /// Numerical `<=` split. NaN follows `default_left`.
    pub fn goes_left(&self, x: &[f64]) -> Result<bool, ModelError> {
        let value = x.get(self.split_feature).copied().ok_or_else(|| {
            ModelError::LayoutMismatch(format!(
                "split on feature {} but input has {} columns",
                self.split_feature,
                x.len()
            ))
        })?;
        if value.is_nan() {
            return Ok(self.default_left);
        }
        Ok(value <= self.threshold)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TreeInfo {
    #[serde(default)]
    pub tree_index: usize,
    pub tree_structure: TreeNode,
}

fn default_one() -> usize {
    1
}

/// A LightGBM model dump.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeEnsemble {
    #[serde(default = "default_one")]
    pub num_class: usize,
    #[serde(default = "default_one")]
    pub num_tree_per_iteration: usize,
    #[serde(default)]
    pub objective: String,
    pub feature_names: Vec<String>,
    pub tree_info: Vec<TreeInfo>,
}

impl TreeEnsemble {
    /// Parses and validates a dump.
    pub fn from_json(json: &str) -> Result<Self, ModelError> {
        let ensemble: TreeEnsemble = serde_json::from_str(json)
            .map_err(|e| ModelError::Artifact(format!("invalid model JSON: {}", e)))?;
        ensemble.validate()?;
        Ok(ensemble)
    }

    fn validate(&self) -> Result<(), ModelError> {
        if self.tree_info.is_empty() {
            return Err(ModelError::Artifact("model has no trees".to_string()));
        }
        if self.num_tree_per_iteration == 0 {
            return Err(ModelError::Artifact(
                "num_tree_per_iteration must be positive".to_string(),
            ));
        }
        for tree in &self.tree_info {
            tree.tree_structure.validate()?;
            if let Some(max) = tree.tree_structure.max_feature() {
                if max >= self.feature_names.len() {
                    return Err(ModelError::LayoutMismatch(format!(
                        "tree {} splits on feature {} but only {} features are declared",
                        tree.tree_index,
                        max,
                        self.feature_names.len()
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn is_multiclass(&self) -> bool {
        self.num_class > 1
    }

    /// Sum of leaf values over all trees (single-output models).
    pub fn predict_raw(&self, x: &[f64]) -> Result<f64, ModelError> {
        self.tree_info
            .iter()
            .map(|t| t.tree_structure.predict(x))
            .sum()
    }

    /// Raw per-class scores; tree `i` belongs to class `i % num_tree_per_iteration`.
    pub fn predict_raw_per_class(&self, x: &[f64]) -> Result<Vec<f64>, ModelError> {
        let k = self.num_tree_per_iteration;
        let mut scores = vec![0.0; k];
        for (i, tree) in self.tree_info.iter().enumerate() {
            scores[i % k] += tree.tree_structure.predict(x)?;
        }
        Ok(scores)
    }

    /// Index of the highest-scoring class.
    pub fn predict_class(&self, x: &[f64]) -> Result<usize, ModelError> {
        let raw = self.predict_raw_per_class(x)?;
        raw.iter()
            .enumerate()
            .filter(|(_, s)| s.is_finite())
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .ok_or_else(|| ModelError::Inference("no finite class score".to_string()))
    }
}
