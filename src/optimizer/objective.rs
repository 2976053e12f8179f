//! The scalar the swarm minimizes.

use crate::core::error::Result;
use crate::core::numeric::finite_or_infinity;
use crate::dataset::StandardScaler;
use crate::model::{Regressor, SurrogateSet, TrainedSurrogate};

/// `|model(x) − target|` for a raw-space candidate `x`.
///
/// When the surrogates were trained on standardized features the candidate
/// is transformed first, so the swarm always searches in raw units.
pub fn absolute_error(
    candidate: &[f64],
    target: f64,
    model: &dyn Regressor,
    scaler: Option<&StandardScaler>,
) -> Result<f64> {
    let prediction = Objective::from_parts(model, scaler, target).predict(candidate)?;
    Ok((prediction - target).abs())
}

/// Objective bound to one surrogate and one target value.
#[derive(Debug, Clone, Copy)]
pub struct Objective<'a> {
    model: &'a dyn Regressor,
    scaler: Option<&'a StandardScaler>,
    target: f64,
}

impl<'a> Objective<'a> {
    /// Bind a trained surrogate and its set's transform to a target.
    pub fn new(set: &'a SurrogateSet, surrogate: &'a TrainedSurrogate, target: f64) -> Self {
        Objective {
            model: surrogate.model(),
            scaler: set.scaler(),
            target,
        }
    }

    /// Bind a bare model, with an optional transform.
    pub fn from_parts(
        model: &'a dyn Regressor,
        scaler: Option<&'a StandardScaler>,
        target: f64,
    ) -> Self {
        Objective {
            model,
            scaler,
            target,
        }
    }

    /// The target value.
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Model prediction at a raw-space candidate.
    pub fn predict(&self, candidate: &[f64]) -> Result<f64> {
        match self.scaler {
            Some(scaler) => self.model.predict_row(&scaler.transform_row(candidate)?),
            None => self.model.predict_row(candidate),
        }
    }

    /// Objective value for the swarm.
    ///
    /// Prediction failures and non-finite errors evaluate to +∞ so that such
    /// candidates are never preferred.
    pub fn evaluate(&self, candidate: &[f64]) -> f64 {
        match absolute_error(candidate, self.target, self.model, self.scaler) {
            Ok(error) => finite_or_infinity(error),
            Err(e) => {
                log::trace!("Objective evaluation failed: {}", e);
                f64::INFINITY
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::InverseDesignError;
    use ndarray::{array, Array1, ArrayView1, ArrayView2};

    /// Predicts the sum of the inputs.
    #[derive(Debug)]
    struct Sum;

    impl Regressor for Sum {
        fn fit(&mut self, _: ArrayView2<'_, f64>, _: ArrayView1<'_, f64>) -> Result<()> {
            Ok(())
        }

        fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
            Ok(features.rows().into_iter().map(|r| r.sum()).collect())
        }

        fn num_features(&self) -> Option<usize> {
            Some(2)
        }
    }

    #[derive(Debug)]
    struct Broken;

    impl Regressor for Broken {
        fn fit(&mut self, _: ArrayView2<'_, f64>, _: ArrayView1<'_, f64>) -> Result<()> {
            Ok(())
        }

        fn predict(&self, _: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
            Err(InverseDesignError::prediction("broken"))
        }

        fn num_features(&self) -> Option<usize> {
            Some(2)
        }
    }

    #[test]
    fn test_absolute_error() {
        assert_eq!(absolute_error(&[1.0, 2.0], 5.0, &Sum, None).unwrap(), 2.0);
        assert_eq!(absolute_error(&[4.0, 4.0], 5.0, &Sum, None).unwrap(), 3.0);
    }

    #[test]
    fn test_scaler_applied_before_predict() {
        let x = array![[0.0, 0.0], [2.0, 4.0]];
        let scaler = StandardScaler::fit(x.view()).unwrap();
        let objective = Objective::from_parts(&Sum, Some(&scaler), 0.0);
        // Column means (1, 2) map to zero.
        assert_eq!(objective.predict(&[1.0, 2.0]).unwrap(), 0.0);
        assert_eq!(objective.evaluate(&[2.0, 4.0]), 2.0);
    }

    #[test]
    fn test_failure_evaluates_to_infinity() {
        let objective = Objective::from_parts(&Broken, None, 1.0);
        assert_eq!(objective.evaluate(&[0.0, 0.0]), f64::INFINITY);
        assert!(objective.predict(&[0.0, 0.0]).is_err());
    }
}
