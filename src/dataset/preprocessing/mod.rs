//! Feature standardization.
//!
//! [`StandardScaler`] is fitted on the training split only and then applied
//! to held-out rows and to every candidate the swarm evaluates, so the search
//! space stays in raw units while the surrogates see standardized inputs.

use crate::core::error::{InverseDesignError, Result};

use ndarray::{Array1, Array2, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Zero-mean, unit-variance transform fitted per feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    /// Fit per-column mean and population standard deviation.
    ///
    /// Zero-variance or non-finite columns get a scale of 1.
    pub fn fit(features: ArrayView2<'_, f64>) -> Result<Self> {
        if features.nrows() == 0 {
            return Err(InverseDesignError::dataset(
                "Cannot fit a scaler on zero rows",
            ));
        }

        let mean = features
            .mean_axis(Axis(0))
            .ok_or_else(|| InverseDesignError::numerical("Mean of empty feature matrix"))?;
        let scale = features.std_axis(Axis(0), 0.0).mapv(|std| {
            if std.is_finite() && std > 0.0 {
                std
            } else {
                1.0
            }
        });

        log::debug!("Fitted scaler - mean: {:?}, scale: {:?}", mean, scale);
        Ok(StandardScaler { mean, scale })
    }

    /// Number of features the scaler was fitted on.
    pub fn num_features(&self) -> usize {
        self.mean.len()
    }

    /// Per-feature means.
    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    /// Per-feature scales.
    pub fn scale(&self) -> &Array1<f64> {
        &self.scale
    }

    /// Standardize every row of `features`.
    pub fn transform(&self, features: ArrayView2<'_, f64>) -> Result<Array2<f64>> {
        if features.ncols() != self.num_features() {
            return Err(InverseDesignError::dimension_mismatch(
                format!("{} features", self.num_features()),
                format!("{} columns", features.ncols()),
            ));
        }
        Ok((&features - &self.mean) / &self.scale)
    }

    /// Standardize a single feature vector.
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.num_features() {
            return Err(InverseDesignError::dimension_mismatch(
                format!("{} features", self.num_features()),
                format!("{} values", row.len()),
            ));
        }
        Ok(row
            .iter()
            .zip(self.mean.iter().zip(self.scale.iter()))
            .map(|(&x, (&mean, &scale))| (x - mean) / scale)
            .collect())
    }
}
