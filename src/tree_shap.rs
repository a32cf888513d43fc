//! Exact path-dependent TreeSHAP (Lundberg et al., Algorithm 2).
//!
//! Attributions are computed against the regressor ensemble using the
//! training sample counts stored on each node as the background distribution.
//! For every input, `expected_value + sum(phi) == prediction`.

use crate::ensemble::{TreeEnsemble, TreeNode};
use crate::errors::ModelError;

#[derive(Debug, Clone, Copy)]
struct PathElement {
    /// `None` for the root placeholder.
    feature: Option<usize>,
    zero_fraction: f64,
    one_fraction: f64,
    weight: f64,
}

/// SHAP explainer over a single-output tree ensemble.
#[derive(Debug, Clone)]
pub struct TreeShap {
    ensemble: TreeEnsemble,
    expected_value: f64,
}

impl TreeShap {
    /// Fails if the ensemble is multiclass or any node lacks a sample count.
    pub fn new(ensemble: TreeEnsemble) -> Result<Self, ModelError> {
        if ensemble.is_multiclass() {
            return Err(ModelError::Explainer(
                "TreeSHAP explainer expects a single-output model".to_string(),
            ));
        }
        if !ensemble
            .tree_info
            .iter()
            .all(|t| t.tree_structure.has_complete_covers())
        {
            return Err(ModelError::Explainer(
                "model dump lacks node sample counts".to_string(),
            ));
        }
        let expected_value = ensemble
            .tree_info
            .iter()
            .map(|t| node_expectation(&t.tree_structure))
            .sum::<Result<f64, ModelError>>()?;

        Ok(Self {
            ensemble,
            expected_value,
        })
    }

    /// Cover-weighted mean prediction, the baseline attributions are measured from.
    pub fn expected_value(&self) -> f64 {
        self.expected_value
    }

    pub fn num_features(&self) -> usize {
        self.ensemble.feature_names.len()
    }

    /// One signed attribution per input column.
    pub fn shap_values(&self, x: &[f64]) -> Result<Vec<f64>, ModelError> {
        if x.len() != self.num_features() {
            return Err(ModelError::Explainer(format!(
                "expected {} features, got {}",
                self.num_features(),
                x.len()
            )));
        }

        let mut phi = vec![0.0; x.len()];
        for tree in &self.ensemble.tree_info {
            let path = Vec::with_capacity(16);
            recurse(&tree.tree_structure, x, &mut phi, path, 1.0, 1.0, None)?;
        }

        if phi.iter().any(|v| !v.is_finite()) {
            return Err(ModelError::Explainer(
                "attribution is not finite".to_string(),
            ));
        }
        Ok(phi)
    }
}

fn cover_of(node: &TreeNode) -> Result<f64, ModelError> {
    node.cover()
        .filter(|c| *c > 0.0)
        .ok_or_else(|| ModelError::Explainer("node without sample count".to_string()))
}

fn node_expectation(node: &TreeNode) -> Result<f64, ModelError> {
    match node {
        TreeNode::Leaf(leaf) => Ok(leaf.leaf_value),
        TreeNode::Split(split) => {
            let left = cover_of(&split.left_child)?;
            let right = cover_of(&split.right_child)?;
            let total = left + right;
            Ok((left * node_expectation(&split.left_child)?
                + right * node_expectation(&split.right_child)?)
                / total)
        }
    }
}

fn recurse(
    node: &TreeNode,
    x: &[f64],
    phi: &mut [f64],
    mut path: Vec<PathElement>,
    zero_fraction: f64,
    one_fraction: f64,
    feature: Option<usize>,
) -> Result<(), ModelError> {
    extend_path(&mut path, zero_fraction, one_fraction, feature);

    match node {
        TreeNode::Leaf(leaf) => {
            let depth = path.len() - 1;
            for i in 1..=depth {
                let el = path[i];
                let w = unwound_path_sum(&path, i);
                if let Some(f) = el.feature {
                    phi[f] += w * (el.one_fraction - el.zero_fraction) * leaf.leaf_value;
                }
            }
            Ok(())
        }
        TreeNode::Split(split) => {
            let (hot, cold) = if split.goes_left(x)? {
                (&split.left_child, &split.right_child)
            } else {
                (&split.right_child, &split.left_child)
            };
            let cover = cover_of(node)?;
            let hot_zero = cover_of(hot)? / cover;
            let cold_zero = cover_of(cold)? / cover;

            let mut incoming_zero = 1.0;
            let mut incoming_one = 1.0;

            // Undo an earlier split on the same feature so it is counted once
            if let Some(k) = path
                .iter()
                .position(|e| e.feature == Some(split.split_feature))
            {
                incoming_zero = path[k].zero_fraction;
                incoming_one = path[k].one_fraction;
                unwind_path(&mut path, k);
            }

            let f = Some(split.split_feature);
            recurse(
                hot,
                x,
                phi,
                path.clone(),
                hot_zero * incoming_zero,
                incoming_one,
                f,
            )?;
            recurse(cold, x, phi, path, cold_zero * incoming_zero, 0.0, f)
        }
    }
}

fn extend_path(path: &mut Vec<PathElement>, zero_fraction: f64, one_fraction: f64, feature: Option<usize>) {
    let depth = path.len();
    path.push(PathElement {
        feature,
        zero_fraction,
        one_fraction,
        weight: if depth == 0 { 1.0 } else { 0.0 },
    });
    let denom = (depth + 1) as f64;
    for i in (0..depth).rev() {
        path[i + 1].weight += one_fraction * path[i].weight * (i + 1) as f64 / denom;
        path[i].weight = zero_fraction * path[i].weight * (depth - i) as f64 / denom;
    }
}

fn unwind_path(path: &mut Vec<PathElement>, index: usize) {
    let depth = path.len() - 1;
    let one_fraction = path[index].one_fraction;
    let zero_fraction = path[index].zero_fraction;
    let denom = (depth + 1) as f64;
    let mut next_one_portion = path[depth].weight;

    for i in (0..depth).rev() {
        if one_fraction != 0.0 {
            let tmp = path[i].weight;
            path[i].weight = next_one_portion * denom / ((i + 1) as f64 * one_fraction);
            next_one_portion =
                tmp - path[i].weight * zero_fraction * (depth - i) as f64 / denom;
        } else {
            path[i].weight = path[i].weight * denom / (zero_fraction * (depth - i) as f64);
        }
    }

    for i in index..depth {
        path[i].feature = path[i + 1].feature;
        path[i].zero_fraction = path[i + 1].zero_fraction;
        path[i].one_fraction = path[i + 1].one_fraction;
    }
    path.truncate(depth);
}

fn unwound_path_sum(path: &[PathElement], index: usize) -> f64 {
    let depth = path.len() - 1;
    let one_fraction = path[index].one_fraction;
    let zero_fraction = path[index].zero_fraction;
    let mut next_one_portion = path[depth].weight;
    let mut total = 0.0;

    if one_fraction != 0.0 {
        for i in (0..depth).rev() {
            let tmp = next_one_portion / ((i + 1) as f64 * one_fraction);
            total += tmp;
            next_one_portion = path[i].weight - tmp * zero_fraction * (depth - i) as f64;
        }
    } else {
        for i in (0..depth).rev() {
            total += path[i].weight / (zero_fraction * (depth - i) as f64);
        }
    }
    total * (depth + 1) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn leaf(value: f64, count: u32) -> serde_json::Value {
        json!({"leaf_value": value, "leaf_count": count})
    }

    fn split(
        feature: usize,
        threshold: f64,
        count: u32,
        left: serde_json::Value,
        right: serde_json::Value,
    ) -> serde_json::Value {
        json!({
            "split_feature": feature,
            "threshold": threshold,
            "internal_count": count,
            "left_child": left,
            "right_child": right
        })
    }

    fn model(trees: Vec<serde_json::Value>, n_features: usize) -> TreeEnsemble {
        let tree_info: Vec<_> = trees
            .into_iter()
            .enumerate()
            .map(|(i, t)| json!({"tree_index": i, "tree_structure": t}))
            .collect();
        let names: Vec<String> = (0..n_features).map(|i| format!("f{}", i)).collect();
        TreeEnsemble::from_json(
            &json!({"feature_names": names, "tree_info": tree_info}).to_string(),
        )
        .unwrap()
    }

    #[test]
    fn test_stump_attribution() {
        // E = (4 * 10 + 6 * 20) / 10 = 16
        let explainer =
            TreeShap::new(model(vec![split(0, 5.0, 10, leaf(10.0, 4), leaf(20.0, 6))], 2)).unwrap();
        assert!((explainer.expected_value() - 16.0).abs() < 1e-9);

        let phi = explainer.shap_values(&[1.0, 99.0]).unwrap();
        assert!((phi[0] - (-6.0)).abs() < 1e-9, "phi = {:?}", phi);
        assert_eq!(phi[1], 0.0);
    }

    #[test]
    fn test_local_accuracy_on_interacting_tree() {
        let tree = split(
            0,
            5.0,
            100,
            split(1, 2.0, 40, leaf(1.0, 10), leaf(4.0, 30)),
            split(1, 3.0, 60, leaf(-2.0, 20), split(0, 8.0, 40, leaf(6.0, 25), leaf(9.0, 15))),
        );
        let second = split(2, 0.5, 100, leaf(0.5, 70), leaf(-1.5, 30));
        let ensemble = model(vec![tree, second], 3);
        let explainer = TreeShap::new(ensemble.clone()).unwrap();

        for x in [
            [1.0, 1.0, 0.0],
            [1.0, 5.0, 1.0],
            [6.0, 1.0, 0.0],
            [6.0, 4.0, 1.0],
            [9.0, 4.0, 0.0],
        ] {
            let phi = explainer.shap_values(&x).unwrap();
            let reconstructed = explainer.expected_value() + phi.iter().sum::<f64>();
            let prediction = ensemble.predict_raw(&x).unwrap();
            assert!(
                (reconstructed - prediction).abs() < 1e-9,
                "x = {:?}: {} vs {}",
                x,
                reconstructed,
                prediction
            );
        }
    }

    #[test]
    fn test_unused_feature_gets_zero() {
        let explainer =
            TreeShap::new(model(vec![split(1, 0.0, 10, leaf(1.0, 5), leaf(3.0, 5))], 3)).unwrap();
        let phi = explainer.shap_values(&[100.0, 1.0, -4.0]).unwrap();
        assert_eq!(phi[0], 0.0);
        assert_eq!(phi[2], 0.0);
        assert!((phi[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_wrong_width_fails() {
        let explainer =
            TreeShap::new(model(vec![split(0, 0.0, 10, leaf(1.0, 5), leaf(3.0, 5))], 2)).unwrap();
        assert!(matches!(
            explainer.shap_values(&[1.0]),
            Err(ModelError::Explainer(_))
        ));
    }

    #[test]
    fn test_missing_counts_rejected() {
        let bare = json!({
            "split_feature": 0,
            "threshold": 0.0,
            "left_child": {"leaf_value": 1.0},
            "right_child": {"leaf_value": 2.0}
        });
        assert!(TreeShap::new(model(vec![bare], 1)).is_err());
    }
}
