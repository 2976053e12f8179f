//! CART regression trees.
//!
//! Trees are grown depth-first with the squared-error criterion and stored as
//! a flat node vector (index 0 is the root). [`RegressionTree`] is the
//! building block of every tree-based surrogate; [`DecisionTreeRegressor`]
//! exposes a single tree as a [`Regressor`].

use crate::core::constants::{DEFAULT_TREE_MAX_DEPTH, PURE_NODE_VARIANCE};
use crate::core::error::Result;
use crate::core::types::{FeatureIndex, NodeIndex, SampleIndex};
use crate::model::{check_prediction_input, check_training_data, Regressor};

use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Growth limits of a regression tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum depth; the root is at depth 0
    pub max_depth: usize,
    /// Minimum number of samples required to split a node
    pub min_samples_split: usize,
    /// Minimum number of samples in each child
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        TreeParams {
            max_depth: DEFAULT_TREE_MAX_DEPTH,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// A node of a regression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Rows with `x[feature] <= threshold` go left, all others (NaN included) right
    Split {
        feature: FeatureIndex,
        threshold: f64,
        left: NodeIndex,
        right: NodeIndex,
    },
    /// Mean target of the rows that reached this node
    Leaf { value: f64, samples: usize },
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: FeatureIndex,
    threshold: f64,
    gain: f64,
}

/// A fitted regression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
    depth: usize,
}

impl RegressionTree {
    /// Grow a tree on the rows listed in `indices`.
    ///
    /// Rows may repeat, which is how bootstrap samples are passed in.
    pub fn fit(
        features: ArrayView2<'_, f64>,
        targets: ArrayView1<'_, f64>,
        indices: &[SampleIndex],
        params: &TreeParams,
    ) -> Self {
        let mut tree = RegressionTree {
            nodes: Vec::new(),
            depth: 0,
        };
        let mut rows = indices.to_vec();
        tree.grow(features, targets, &mut rows, 0, params);
        tree
    }

    /// Grow a tree on every row.
    pub fn fit_all(
        features: ArrayView2<'_, f64>,
        targets: ArrayView1<'_, f64>,
        params: &TreeParams,
    ) -> Self {
        let indices: Vec<SampleIndex> = (0..features.nrows()).collect();
        Self::fit(features, targets, &indices, params)
    }

    fn grow(
        &mut self,
        features: ArrayView2<'_, f64>,
        targets: ArrayView1<'_, f64>,
        rows: &mut [SampleIndex],
        depth: usize,
        params: &TreeParams,
    ) -> NodeIndex {
        let node_index = self.nodes.len();
        let samples = rows.len();
        let value = mean_of(targets, rows);
        self.nodes.push(TreeNode::Leaf { value, samples });
        self.depth = self.depth.max(depth);

        if depth >= params.max_depth
            || samples < params.min_samples_split.max(2)
            || variance_of(targets, rows, value) < PURE_NODE_VARIANCE
        {
            return node_index;
        }

        let Some(split) = find_best_split(features, targets, rows, params.min_samples_leaf) else {
            return node_index;
        };

        let boundary = partition_rows(features, rows, split.feature, split.threshold);
        let (left_rows, right_rows) = rows.split_at_mut(boundary);
        let left = self.grow(features, targets, left_rows, depth + 1, params);
        let right = self.grow(features, targets, right_rows, depth + 1, params);

        self.nodes[node_index] = TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_index
    }

    /// Predict a single feature vector.
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut index = 0;
        loop {
            match self.nodes.get(index) {
                Some(TreeNode::Leaf { value, .. }) => return *value,
                Some(TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let go_left = row.get(*feature).is_some_and(|v| *v <= *threshold);
                    index = if go_left { *left } else { *right };
                }
                None => return f64::NAN,
            }
        }
    }

    /// Predict a row of a feature matrix.
    pub fn predict_view(&self, row: ArrayView1<'_, f64>) -> f64 {
        match row.as_slice() {
            Some(slice) => self.predict_row(slice),
            None => self.predict_row(&row.to_vec()),
        }
    }

    /// Number of nodes.
    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Number of leaves.
    pub fn num_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|node| matches!(node, TreeNode::Leaf { .. }))
            .count()
    }

    /// Depth of the deepest leaf.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Node vector, root first.
    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }
}

fn mean_of(targets: ArrayView1<'_, f64>, rows: &[SampleIndex]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    rows.iter().map(|&i| targets[i]).sum::<f64>() / rows.len() as f64
}

fn variance_of(targets: ArrayView1<'_, f64>, rows: &[SampleIndex], mean: f64) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    rows.iter()
        .map(|&i| (targets[i] - mean) * (targets[i] - mean))
        .sum::<f64>()
        / rows.len() as f64
}

/// Best squared-error split over all features.
///
/// For each feature the rows are sorted once and swept left to right, so the
/// reduction in squared error at every distinct threshold comes from running
/// sums. Ties keep the first feature and the lowest threshold.
fn find_best_split(
    features: ArrayView2<'_, f64>,
    targets: ArrayView1<'_, f64>,
    rows: &[SampleIndex],
    min_samples_leaf: usize,
) -> Option<SplitCandidate> {
    let n = rows.len();
    let min_leaf = min_samples_leaf.max(1);
    if n < 2 * min_leaf {
        return None;
    }

    let total_sum: f64 = rows.iter().map(|&i| targets[i]).sum();
    let parent_score = total_sum * total_sum / n as f64;
    let mut order = rows.to_vec();
    let mut best: Option<SplitCandidate> = None;

    for feature in 0..features.ncols() {
        order.sort_by(|&a, &b| features[[a, feature]].total_cmp(&features[[b, feature]]));

        let mut left_sum = 0.0;
        for pos in 0..n - 1 {
            left_sum += targets[order[pos]];
            let left_count = pos + 1;
            let right_count = n - left_count;
            if left_count < min_leaf || right_count < min_leaf {
                continue;
            }

            let here = features[[order[pos], feature]];
            let next = features[[order[pos + 1], feature]];
            if !(next > here) {
                continue;
            }

            let right_sum = total_sum - left_sum;
            let gain = left_sum * left_sum / left_count as f64
                + right_sum * right_sum / right_count as f64
                - parent_score;

            if gain > best.map_or(0.0, |b| b.gain) {
                let mut threshold = here + (next - here) / 2.0;
                // Adjacent floats: the midpoint can round up onto `next`.
                if threshold >= next {
                    threshold = here;
                }
                best = Some(SplitCandidate {
                    feature,
                    threshold,
                    gain,
                });
            }
        }
    }

    best
}

/// Move rows going left to the front; returns the number of left rows.
fn partition_rows(
    features: ArrayView2<'_, f64>,
    rows: &mut [SampleIndex],
    feature: FeatureIndex,
    threshold: f64,
) -> usize {
    let mut boundary = 0;
    for i in 0..rows.len() {
        if features[[rows[i], feature]] <= threshold {
            rows.swap(boundary, i);
            boundary += 1;
        }
    }
    boundary
}

/// A single CART regression tree.
#[derive(Debug, Clone, Default)]
pub struct DecisionTreeRegressor {
    params: TreeParams,
    tree: Option<RegressionTree>,
    num_features: Option<usize>,
}

impl DecisionTreeRegressor {
    /// Create an unfitted tree with the given limits.
    pub fn new(params: TreeParams) -> Self {
        DecisionTreeRegressor {
            params,
            tree: None,
            num_features: None,
        }
    }

    /// Set the maximum depth.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.params.max_depth = max_depth;
        self
    }

    /// The fitted tree, if any.
    pub fn tree(&self) -> Option<&RegressionTree> {
        self.tree.as_ref()
    }
}

impl Regressor for DecisionTreeRegressor {
    fn fit(&mut self, features: ArrayView2<'_, f64>, targets: ArrayView1<'_, f64>) -> Result<()> {
        check_training_data(features, targets)?;
        let tree = RegressionTree::fit_all(features, targets, &self.params);
        log::debug!(
            "Decision tree fitted: {} leaves, depth {}",
            tree.num_leaves(),
            tree.depth()
        );
        self.tree = Some(tree);
        self.num_features = Some(features.ncols());
        Ok(())
    }

    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        check_prediction_input(features, self.num_features)?;
        let tree = match &self.tree {
            Some(tree) => tree,
            None => return Ok(Array1::zeros(features.nrows())),
        };
        Ok(features
            .rows()
            .into_iter()
            .map(|row| tree.predict_view(row))
            .collect())
    }

    fn num_features(&self) -> Option<usize> {
        self.num_features
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_step_function_is_learned_exactly() {
        let x = array![[1.0], [2.0], [3.0], [10.0], [11.0], [12.0]];
        let y = array![5.0, 5.0, 5.0, 20.0, 20.0, 20.0];
        let tree = RegressionTree::fit_all(x.view(), y.view(), &TreeParams::default());

        assert_eq!(tree.num_leaves(), 2);
        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.predict_row(&[0.0]), 5.0);
        assert_eq!(tree.predict_row(&[6.0]), 5.0);
        assert_eq!(tree.predict_row(&[7.0]), 20.0);
        assert_eq!(tree.predict_row(&[100.0]), 20.0);
    }

    #[test]
    fn test_max_depth_zero_is_mean() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![1.0, 2.0, 6.0];
        let params = TreeParams {
            max_depth: 0,
            ..TreeParams::default()
        };
        let tree = RegressionTree::fit_all(x.view(), y.view(), &params);
        assert_eq!(tree.num_nodes(), 1);
        assert_eq!(tree.predict_row(&[2.0]), 3.0);
    }

    #[test]
    fn test_picks_informative_feature() {
        let x = array![[0.3, 1.0], [0.1, 2.0], [0.2, 3.0], [0.4, 4.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let params = TreeParams {
            max_depth: 1,
            ..TreeParams::default()
        };
        let tree = RegressionTree::fit_all(x.view(), y.view(), &params);
        match &tree.nodes()[0] {
            TreeNode::Split {
                feature, threshold, ..
            } => {
                assert_eq!(*feature, 1);
                assert_eq!(*threshold, 2.5);
            }
            TreeNode::Leaf { .. } => panic!("expected a split at the root"),
        }
    }

    #[test]
    fn test_bootstrap_indices_with_repeats() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![1.0, 2.0, 3.0];
        let tree = RegressionTree::fit(x.view(), y.view(), &[0, 0, 2], &TreeParams::default());
        assert_eq!(tree.predict_row(&[1.0]), 1.0);
        assert_eq!(tree.predict_row(&[3.0]), 3.0);
    }

    #[test]
    fn test_regressor_interface() {
        let x = array![[1.0, 0.0], [2.0, 0.0], [3.0, 0.0], [4.0, 0.0]];
        let y = array![1.0, 1.0, 4.0, 4.0];
        let mut model = DecisionTreeRegressor::default();
        assert!(model.predict(x.view()).is_err());

        model.fit(x.view(), y.view()).unwrap();
        let pred = model.predict(x.view()).unwrap();
        assert_eq!(pred.to_vec(), vec![1.0, 1.0, 4.0, 4.0]);
        assert_eq!(model.predict_row(&[3.5, 0.0]).unwrap(), 4.0);
        assert!(model.predict(array![[1.0]].view()).is_err());
    }
}
