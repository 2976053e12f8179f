//! Random forest regression.

use crate::core::constants::{DEFAULT_FOREST_TREES, DEFAULT_MODEL_SEED};
use crate::core::error::{InverseDesignError, Result};
use crate::core::types::SampleIndex;
use crate::model::tree::{RegressionTree, TreeParams};
use crate::model::{check_prediction_input, check_training_data, Regressor};

use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// Bagged ensemble of CART trees, each grown on a bootstrap sample.
///
/// Trees are grown in parallel. Tree `i` draws its bootstrap sample from a
/// generator seeded with `seed + i`, and trees are collected in index order,
/// so the fitted forest does not depend on thread scheduling.
#[derive(Debug, Clone)]
pub struct RandomForestRegressor {
    num_trees: usize,
    params: TreeParams,
    seed: u64,
    trees: Vec<RegressionTree>,
    num_features: Option<usize>,
}

impl Default for RandomForestRegressor {
    fn default() -> Self {
        Self::new(DEFAULT_FOREST_TREES)
    }
}

impl RandomForestRegressor {
    /// Create an unfitted forest.
    pub fn new(num_trees: usize) -> Self {
        RandomForestRegressor {
            num_trees,
            params: TreeParams::default(),
            seed: DEFAULT_MODEL_SEED,
            trees: Vec::new(),
            num_features: None,
        }
    }

    /// Set the maximum depth of every tree.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.params.max_depth = max_depth;
        self
    }

    /// Set the base seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Number of fitted trees.
    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }
}

/// Sample `n` row indices with replacement.
fn bootstrap_sample(n: usize, seed: u64) -> Vec<SampleIndex> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n).map(|_| rng.gen_range(0..n)).collect()
}

impl Regressor for RandomForestRegressor {
    fn fit(&mut self, features: ArrayView2<'_, f64>, targets: ArrayView1<'_, f64>) -> Result<()> {
        check_training_data(features, targets)?;
        if self.num_trees == 0 {
            return Err(InverseDesignError::training(
                "Random forest needs at least one tree",
            ));
        }

        let n = features.nrows();
        let params = self.params;
        let seed = self.seed;
        self.trees = (0..self.num_trees)
            .into_par_iter()
            .map(|i| {
                let rows = bootstrap_sample(n, seed.wrapping_add(i as u64));
                RegressionTree::fit(features, targets, &rows, &params)
            })
            .collect();
        self.num_features = Some(features.ncols());

        log::debug!(
            "Random forest fitted: {} trees, mean depth {:.1}",
            self.trees.len(),
            self.trees.iter().map(|t| t.depth() as f64).sum::<f64>() / self.trees.len() as f64
        );
        Ok(())
    }

    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        check_prediction_input(features, self.num_features)?;
        let num_trees = self.trees.len() as f64;
        Ok(features
            .rows()
            .into_iter()
            .map(|row| {
                self.trees
                    .iter()
                    .map(|tree| tree.predict_view(row))
                    .sum::<f64>()
                    / num_trees
            })
            .collect())
    }

    fn num_features(&self) -> Option<usize> {
        self.num_features
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn linear_data(n: usize) -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((n, 2), |(i, j)| (i * (j + 1)) as f64);
        let y = Array1::from_shape_fn(n, |i| 3.0 * i as f64 + 1.0);
        (x, y)
    }

    #[test]
    fn test_bootstrap_sample_in_range() {
        let rows = bootstrap_sample(10, 7);
        assert_eq!(rows.len(), 10);
        assert!(rows.iter().all(|&i| i < 10));
        assert_eq!(rows, bootstrap_sample(10, 7));
    }

    #[test]
    fn test_forest_fits_monotone_trend() {
        let (x, y) = linear_data(40);
        let mut forest = RandomForestRegressor::new(20);
        forest.fit(x.view(), y.view()).unwrap();
        assert_eq!(forest.num_trees(), 20);

        let low = forest.predict_row(&[2.0, 4.0]).unwrap();
        let high = forest.predict_row(&[37.0, 74.0]).unwrap();
        assert!(low < high);
        assert!(low >= y[0] && high <= y[39]);
    }

    #[test]
    fn test_forest_is_deterministic() {
        let (x, y) = linear_data(25);
        let mut a = RandomForestRegressor::new(10);
        let mut b = RandomForestRegressor::new(10);
        a.fit(x.view(), y.view()).unwrap();
        b.fit(x.view(), y.view()).unwrap();
        assert_eq!(a.predict(x.view()).unwrap(), b.predict(x.view()).unwrap());
    }

    #[test]
    fn test_zero_trees_rejected() {
        let (x, y) = linear_data(5);
        assert!(RandomForestRegressor::new(0).fit(x.view(), y.view()).is_err());
    }
}
