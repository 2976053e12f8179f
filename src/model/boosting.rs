//! Gradient-boosted regression trees with squared-error loss.

use crate::core::constants::{DEFAULT_BOOSTING_LEARNING_RATE, DEFAULT_BOOSTING_ROUNDS};
use crate::core::error::{InverseDesignError, Result};
use crate::model::tree::{RegressionTree, TreeParams};
use crate::model::{check_prediction_input, check_training_data, Regressor};

use ndarray::{Array1, ArrayView1, ArrayView2};

/// Additive model `F(x) = base + lr · Σ tree_k(x)`, each tree fitted to the
/// residuals of the rounds before it.
#[derive(Debug, Clone)]
pub struct GradientBoostingRegressor {
    num_rounds: usize,
    learning_rate: f64,
    params: TreeParams,
    base_score: f64,
    trees: Vec<RegressionTree>,
    num_features: Option<usize>,
}

impl Default for GradientBoostingRegressor {
    fn default() -> Self {
        Self::new(DEFAULT_BOOSTING_ROUNDS, DEFAULT_BOOSTING_LEARNING_RATE)
    }
}

impl GradientBoostingRegressor {
    /// Create an unfitted booster.
    pub fn new(num_rounds: usize, learning_rate: f64) -> Self {
        GradientBoostingRegressor {
            num_rounds,
            learning_rate,
            params: TreeParams::default(),
            base_score: 0.0,
            trees: Vec::new(),
            num_features: None,
        }
    }

    /// Set the maximum depth of every tree.
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.params.max_depth = max_depth;
        self
    }

    /// Number of trees actually kept.
    pub fn num_trees(&self) -> usize {
        self.trees.len()
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

impl Regressor for GradientBoostingRegressor {
    fn fit(&mut self, features: ArrayView2<'_, f64>, targets: ArrayView1<'_, f64>) -> Result<()> {
        check_training_data(features, targets)?;
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(InverseDesignError::invalid_parameter(
                "learning_rate",
                self.learning_rate.to_string(),
                "must be finite and greater than 0",
            ));
        }

        let n = features.nrows();
        self.base_score = targets.sum() / n as f64;
        self.trees = Vec::with_capacity(self.num_rounds);

        let mut scores = Array1::from_elem(n, self.base_score);
        for round in 0..self.num_rounds {
            let residuals = &targets - &scores;
            if residuals.iter().all(|r| r.abs() < f64::EPSILON) {
                log::debug!("Boosting converged after {} rounds", round);
                break;
            }

            let tree = RegressionTree::fit_all(features, residuals.view(), &self.params);
            for (score, row) in scores.iter_mut().zip(features.rows()) {
                *score += self.learning_rate * tree.predict_view(row);
            }
            self.trees.push(tree);
        }

        self.num_features = Some(features.ncols());
        log::debug!(
            "Gradient boosting fitted: {} trees, base score {:.6}",
            self.trees.len(),
            self.base_score
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
