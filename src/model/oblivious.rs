//! Gradient boosting over oblivious (symmetric) trees.
//!
//! Every level of an oblivious tree applies the same `(feature, border)` test
//! to all of its nodes, so a tree of depth `d` is `d` tests plus `2^d` leaf
//! values and a row's leaf index is the bit pattern of its test outcomes.
//! Candidate borders are quantiles of each feature, computed once per fit.

use crate::core::constants::{
    DEFAULT_BOOSTING_ROUNDS, DEFAULT_OBLIVIOUS_DEPTH, DEFAULT_OBLIVIOUS_L2,
    DEFAULT_OBLIVIOUS_LEARNING_RATE,
};
use crate::core::error::{InverseDesignError, Result};
use crate::core::types::FeatureIndex;
use crate::model::{check_prediction_input, check_training_data, Regressor};

use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// Upper limit on candidate borders per feature.
const MAX_BORDERS: usize = 254;

/// Deepest tree accepted; leaf vectors grow as `2^depth`.
const MAX_OBLIVIOUS_DEPTH: usize = 16;

/// One symmetric tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObliviousTree {
    /// `(feature, border)` per level; `x[feature] > border` sets the level's bit
    splits: Vec<(FeatureIndex, f64)>,
    /// `2^splits.len()` leaf values
    leaf_values: Vec<f64>,
}

impl ObliviousTree {
    fn leaf_index(&self, row: ArrayView1<'_, f64>) -> usize {
        self.splits
            .iter()
            .enumerate()
            .fold(0, |index, (level, &(feature, border))| {
                if row[feature] > border {
                    index | (1 << level)
                } else {
                    index
                }
            })
    }

    /// Leaf value for a row.
    pub fn predict_view(&self, row: ArrayView1<'_, f64>) -> f64 {
        self.leaf_values
            .get(self.leaf_index(row))
            .copied()
            .unwrap_or(0.0)
    }

    /// Number of levels.
    pub fn depth(&self) -> usize {
        self.splits.len()
    }
}

/// Boosted ensemble of oblivious trees with L2-regularized leaves.
#[derive(Debug, Clone)]
pub struct ObliviousBoostingRegressor {
    num_rounds: usize,
    depth: usize,
    learning_rate: f64,
    l2_regularization: f64,
    base_score: f64,
    trees: Vec<ObliviousTree>,
    num_features: Option<usize>,
}

impl Default for ObliviousBoostingRegressor {
    fn default() -> Self {
        ObliviousBoostingRegressor {
            num_rounds: DEFAULT_BOOSTING_ROUNDS,
            depth: DEFAULT_OBLIVIOUS_DEPTH,
            learning_rate: DEFAULT_OBLIVIOUS_LEARNING_RATE,
            l2_regularization: DEFAULT_OBLIVIOUS_L2,
            base_score: 0.0,
            trees: Vec::new(),
            num_features: None,
        }
    }
}

impl ObliviousBoostingRegressor {
    /// Create an unfitted booster.
    pub fn new(num_rounds: usize, depth: usize, learning_rate: f64) -> Self {
        ObliviousBoostingRegressor {
            num_rounds,
            depth,
            learning_rate,
            ..Self::default()
        }
    }

    /// Set the L2 penalty on leaf values.
    pub fn with_l2_regularization(mut self, l2: f64) -> Self {
        self.l2_regularization = l2;
        self
    }

    /// Number of fitted trees.
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    fn validate(&self) -> Result<()> {
        if self.depth == 0 || self.depth > MAX_OBLIVIOUS_DEPTH {
            return Err(InverseDesignError::invalid_parameter(
                "depth",
                self.depth.to_string(),
                format!("must be in range [1, {}]", MAX_OBLIVIOUS_DEPTH),
            ));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(InverseDesignError::invalid_parameter(
                "learning_rate",
                self.learning_rate.to_string(),
                "must be finite and greater than 0",
            ));
        }
        if !(self.l2_regularization.is_finite() && self.l2_regularization >= 0.0) {
            return Err(InverseDesignError::invalid_parameter(
                "l2_regularization",
                self.l2_regularization.to_string(),
                "must be finite and non-negative",
            ));
        }
        Ok(())
    }

    /// Grow one tree on the current residuals.
    fn grow_tree(
        &self,
        features: ArrayView2<'_, f64>,
        residuals: &Array1<f64>,
        borders: &[Vec<f64>],
    ) -> ObliviousTree {
        let n = features.nrows();
        let lambda = self.l2_regularization;
        let mut leaf_of = vec![0usize; n];
        let mut splits = Vec::with_capacity(self.depth);

        for level in 0..self.depth {
            let num_leaves = 1 << level;
            let mut best: Option<(FeatureIndex, f64, f64)> = None;

            for (feature, feature_borders) in borders.iter().enumerate() {
                for &border in feature_borders {
                    let mut sums = vec![(0.0_f64, 0usize); 2 * num_leaves];
                    for row in 0..n {
                        let side = usize::from(features[[row, feature]] > border);
                        let slot = &mut sums[2 * leaf_of[row] + side];
                        slot.0 += residuals[row];
                        slot.1 += 1;
                    }
                    // Leaves that no row reaches on one side add nothing.
                    let score: f64 = sums
                        .iter()
                        .map(|&(sum, count)| sum * sum / (count as f64 + lambda).max(f64::MIN_POSITIVE))
                        .sum();
                    if best.map_or(true, |(_, _, s)| score > s) {
                        best = Some((feature, border, score));
                    }
                }
            }

            let Some((feature, border, _)) = best else {
                break;
            };
            for row in 0..n {
                if features[[row, feature]] > border {
                    leaf_of[row] |= 1 << level;
                }
            }
            splits.push((feature, border));
        }

        let num_leaves = 1 << splits.len();
        let mut sums = vec![(0.0_f64, 0usize); num_leaves];
        for row in 0..n {
            sums[leaf_of[row]].0 += residuals[row];
            sums[leaf_of[row]].1 += 1;
        }
        let leaf_values = sums
            .into_iter()
            .map(|(sum, count)| {
                let denominator = count as f64 + lambda;
                if denominator > 0.0 {
                    sum / denominator
                } else {
                    0.0
                }
            })
            .collect();

        ObliviousTree {
            splits,
            leaf_values,
        }
    }

    fn raw_score(&self, row: ArrayView1<'_, f64>) -> f64 {
        self.base_score
            + self.learning_rate
                * self
                    .trees
                    .iter()
                    .map(|tree| tree.predict_view(row))
                    .sum::<f64>()
    }
}

/// Quantile borders between distinct values of one feature column.
fn feature_borders(column: ArrayView1<'_, f64>) -> Vec<f64> {
    let mut values: Vec<f64> = column.to_vec();
    values.sort_by(f64::total_cmp);
    values.dedup();
    if values.len() < 2 {
        return Vec::new();
    }

    let midpoints: Vec<f64> = values.windows(2).map(|w| w[0] + (w[1] - w[0]) / 2.0).collect();
    if midpoints.len() <= MAX_BORDERS {
        return midpoints;
    }
    let step = midpoints.len() as f64 / MAX_BORDERS as f64;
    let mut borders: Vec<f64> = (0..MAX_BORDERS)
        .map(|i| midpoints[((i as f64 + 0.5) * step) as usize])
        .collect();
    borders.dedup();
    borders
}

impl Regressor for ObliviousBoostingRegressor {
    fn fit(&mut self, features: ArrayView2<'_, f64>, targets: ArrayView1<'_, f64>) -> Result<()> {
        check_training_data(features, targets)?;
        self.validate()?;

        let n = features.nrows();
        let borders: Vec<Vec<f64>> = features.columns().into_iter().map(feature_borders).collect();
        self.base_score = targets.sum() / n as f64;
        self.trees = Vec::with_capacity(self.num_rounds);

        if borders.iter().all(|b| b.is_empty()) {
            log::debug!("All features are constant; oblivious booster predicts the mean");
        } else {
            let mut scores = Array1::from_elem(n, self.base_score);
            for _ in 0..self.num_rounds {
                let residuals = &targets - &scores;
                if residuals.iter().all(|r| r.abs() < f64::EPSILON) {
                    break;
                }
                let tree = self.grow_tree(features, &residuals, &borders);
                for (score, row) in scores.iter_mut().zip(features.rows()) {
                    *score += self.learning_rate * tree.predict_view(row);
                }
                self.trees.push(tree);
            }
        }

        self.num_features = Some(features.ncols());
        log::debug!(
            "Oblivious boosting fitted: {} trees of depth <= {}",
            self.trees.len(),
            self.depth
        );
        Ok(())
    }

    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        check_prediction_input(features, self.num_features)?;
        Ok(features
            .rows()
            .into_iter()
            .map(|row| self.raw_score(row))
            .collect())
    }

    fn num_features(&self) -> Option<usize> {
        self.num_features
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn test_feature_borders() {
        assert_eq!(feature_borders(array![3.0, 1.0, 2.0, 2.0].view()), vec![1.5, 2.5]);
        assert!(feature_borders(array![5.0, 5.0].view()).is_empty());

        let many = Array1::from_shape_fn(1000, |i| i as f64);
        let borders = feature_borders(many.view());
        assert!(borders.len() <= MAX_BORDERS);
        assert!(borders.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_leaf_index_bits() {
        let tree = ObliviousTree {
            splits: vec![(0, 0.5), (1, 0.5)],
            leaf_values: vec![0.0, 1.0, 2.0, 3.0],
        };
        assert_eq!(tree.predict_view(array![0.0, 0.0].view()), 0.0);
        assert_eq!(tree.predict_view(array![1.0, 0.0].view()), 1.0);
        assert_eq!(tree.predict_view(array![0.0, 1.0].view()), 2.0);
        assert_eq!(tree.predict_view(array![1.0, 1.0].view()), 3.0);
    }

    #[test]
    fn test_fits_two_feature_interaction() {
        let x = Array2::from_shape_fn((40, 2), |(i, j)| ((i >> j) & 1) as f64 + i as f64 * 1e-3);
        let y = Array1::from_shape_fn(40, |i| if (i & 1) == 1 { 10.0 } else { -10.0 });

        let mut model = ObliviousBoostingRegressor::default();
        model.fit(x.view(), y.view()).unwrap();
        let pred = model.predict(x.view()).unwrap();

        let mse = (&pred - &y).mapv(|e| e * e).mean().unwrap();
        assert!(mse < 10.0, "mse too high: {}", mse);
    }

    #[test]
    fn test_constant_features_predict_mean() {
        let x = array![[1.0], [1.0], [1.0]];
        let y = array![1.0, 2.0, 3.0];
        let mut model = ObliviousBoostingRegressor::default();
        model.fit(x.view(), y.view()).unwrap();
        assert_eq!(model.num_trees(), 0);
        assert_eq!(model.predict_row(&[7.0]).unwrap(), 2.0);
    }

    #[test]
    fn test_default_shape_matches_forest_depth() {
        let model = ObliviousBoostingRegressor::default();
        assert_eq!(model.depth, 10);
        assert_eq!(model.num_rounds, 100);
        assert_eq!(model.learning_rate, DEFAULT_OBLIVIOUS_LEARNING_RATE);
    }

    #[test]
    fn test_invalid_depth() {
        let x = array![[1.0], [2.0]];
        let y = array![1.0, 2.0];
        let mut model = ObliviousBoostingRegressor::new(10, 0, 0.1);
        assert!(model.fit(x.view(), y.view()).is_err());
    }
}
