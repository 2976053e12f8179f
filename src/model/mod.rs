//! Regression surrogates and the registry that constructs them.
//!
//! Every surrogate implements [`Regressor`]. Which kinds are trained, and in
//! what order, is decided by a [`ModelRegistry`]: adding a model kind means
//! registering a constructor, not adding a branch.

pub mod boosting;
pub mod forest;
pub mod oblivious;
pub mod trainer;
pub mod tree;

pub use boosting::GradientBoostingRegressor;
pub use forest::RandomForestRegressor;
pub use oblivious::ObliviousBoostingRegressor;
pub use trainer::{train_surrogates, SurrogateSet, TrainedSurrogate};
pub use tree::{DecisionTreeRegressor, RegressionTree, TreeParams};

use crate::core::error::{InverseDesignError, Result};
use crate::core::types::ModelKind;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use std::fmt::Debug;

/// A regression model that can be fitted once and then queried concurrently.
pub trait Regressor: Send + Sync + Debug {
    /// Fit the model on a feature matrix and target vector.
    fn fit(&mut self, features: ArrayView2<'_, f64>, targets: ArrayView1<'_, f64>) -> Result<()>;

    /// Predict one value per row of `features`.
    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>>;

    /// Predict a single feature vector.
    fn predict_row(&self, row: &[f64]) -> Result<f64> {
        let features = Array2::from_shape_vec((1, row.len()), row.to_vec())
            .map_err(|e| InverseDesignError::prediction(e.to_string()))?;
        let predictions = self.predict(features.view())?;
        predictions
            .first()
            .copied()
            .ok_or_else(|| InverseDesignError::prediction("Model returned no prediction"))
    }

    /// Number of features seen during fit, `None` before fitting.
    fn num_features(&self) -> Option<usize>;
}

/// Constructor for an unfitted regressor.
pub type RegressorFactory = Box<dyn Fn() -> Box<dyn Regressor> + Send + Sync>;

/// Ordered mapping from model kind to regressor constructor.
///
/// Registration order is training order, and training order breaks ties
/// between equally good search runs.
pub struct ModelRegistry {
    entries: Vec<(ModelKind, RegressorFactory)>,
}

impl ModelRegistry {
    /// A registry with no model kinds.
    pub fn empty() -> Self {
        ModelRegistry {
            entries: Vec::new(),
        }
    }

    /// The four default surrogates in [`ModelKind::ALL`] order.
    pub fn with_defaults() -> Self {
        Self::with_kinds(&ModelKind::ALL)
    }

    /// Default constructors for the given kinds, in the order given.
    pub fn with_kinds(kinds: &[ModelKind]) -> Self {
        let mut registry = Self::empty();
        for &kind in kinds {
            registry.register(kind, default_factory(kind));
        }
        registry
    }

    /// Register a constructor.
    ///
    /// Replacing an existing kind keeps its position.
    pub fn register(&mut self, kind: ModelKind, factory: RegressorFactory) -> &mut Self {
        match self.entries.iter_mut().find(|(k, _)| *k == kind) {
            Some(entry) => entry.1 = factory,
            None => self.entries.push((kind, factory)),
        }
        self
    }

    /// Register a constructor from a closure.
    pub fn register_fn<F>(&mut self, kind: ModelKind, factory: F) -> &mut Self
    where
        F: Fn() -> Box<dyn Regressor> + Send + Sync + 'static,
    {
        self.register(kind, Box::new(factory))
    }

    /// Remove a kind, returning whether it was registered.
    pub fn remove(&mut self, kind: ModelKind) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(k, _)| *k != kind);
        self.entries.len() != before
    }

    /// Registered kinds in registration order.
    pub fn kinds(&self) -> Vec<ModelKind> {
        self.entries.iter().map(|(kind, _)| *kind).collect()
    }

    /// Number of registered kinds.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no kind is registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Construct an unfitted regressor of the given kind.
    pub fn create(&self, kind: ModelKind) -> Result<Box<dyn Regressor>> {
        self.entries
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, factory)| factory())
            .ok_or_else(|| {
                InverseDesignError::invalid_parameter(
                    "model_kind",
                    kind.to_string(),
                    "not registered",
                )
            })
    }

    /// Iterate over `(kind, factory)` pairs in registration order.
    pub fn iter(&self) -> impl Iterator<Item = (ModelKind, &RegressorFactory)> {
        self.entries.iter().map(|(kind, factory)| (*kind, factory))
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Debug for ModelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

fn default_factory(kind: ModelKind) -> RegressorFactory {
    match kind {
        ModelKind::RandomForest => Box::new(|| -> Box<dyn Regressor> {
            Box::new(RandomForestRegressor::default())
        }),
        ModelKind::DecisionTree => Box::new(|| -> Box<dyn Regressor> {
            Box::new(DecisionTreeRegressor::default())
        }),
        ModelKind::GradientBoosting => Box::new(|| -> Box<dyn Regressor> {
            Box::new(GradientBoostingRegressor::default())
        }),
        ModelKind::ObliviousBoosting => Box::new(|| -> Box<dyn Regressor> {
            Box::new(ObliviousBoostingRegressor::default())
        }),
    }
}

/// Reject training data the tree learners cannot use.
pub(crate) fn check_training_data(
    features: ArrayView2<'_, f64>,
    targets: ArrayView1<'_, f64>,
) -> Result<()> {
    if features.nrows() != targets.len() {
        return Err(InverseDesignError::dimension_mismatch(
            format!("features rows: {}", features.nrows()),
            format!("targets length: {}", targets.len()),
        ));
    }
    if features.nrows() == 0 {
        return Err(InverseDesignError::training("Cannot fit with zero samples"));
    }
    if features.ncols() == 0 {
        return Err(InverseDesignError::training("Cannot fit with zero features"));
    }
    if features.iter().chain(targets.iter()).any(|v| !v.is_finite()) {
        return Err(InverseDesignError::training(
            "Input contains NaN or infinity",
        ));
    }
    Ok(())
}

/// Reject prediction input that does not match the fitted width.
pub(crate) fn check_prediction_input(
    features: ArrayView2<'_, f64>,
    fitted_features: Option<usize>,
) -> Result<()> {
    let expected = fitted_features
        .ok_or_else(|| InverseDesignError::prediction("Model has not been fitted"))?;
    if features.ncols() != expected {
        return Err(InverseDesignError::dimension_mismatch(
            format!("{} features", expected),
            format!("{} columns", features.ncols()),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Constant(f64);

    impl Regressor for Constant {
        fn fit(&mut self, _: ArrayView2<'_, f64>, _: ArrayView1<'_, f64>) -> Result<()> {
            Ok(())
        }

        fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
            Ok(Array1::from_elem(features.nrows(), self.0))
        }

        fn num_features(&self) -> Option<usize> {
            None
        }
    }

    #[test]
    fn test_default_registry_order() {
        let registry = ModelRegistry::default();
        assert_eq!(registry.kinds(), ModelKind::ALL.to_vec());
    }

    #[test]
    fn test_register_replaces_in_place() {
        let mut registry =
            ModelRegistry::with_kinds(&[ModelKind::DecisionTree, ModelKind::RandomForest]);
        registry.register_fn(ModelKind::DecisionTree, || -> Box<dyn Regressor> {
            Box::new(Constant(3.0))
        });
        assert_eq!(
            registry.kinds(),
            vec![ModelKind::DecisionTree, ModelKind::RandomForest]
        );

        let model = registry.create(ModelKind::DecisionTree).unwrap();
        assert_eq!(model.predict_row(&[1.0, 2.0]).unwrap(), 3.0);
    }

    #[test]
    fn test_create_unregistered_kind() {
        let registry = ModelRegistry::with_kinds(&[ModelKind::DecisionTree]);
        assert!(registry.create(ModelKind::RandomForest).is_err());
    }

    #[test]
    fn test_remove() {
        let mut registry = ModelRegistry::with_defaults();
        assert!(registry.remove(ModelKind::ObliviousBoosting));
        assert!(!registry.remove(ModelKind::ObliviousBoosting));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_check_training_data() {
        let x = Array2::<f64>::zeros((2, 1));
        let y = Array1::from_vec(vec![1.0, f64::NAN]);
        assert!(check_training_data(x.view(), y.view()).is_err());
        let y = Array1::from_vec(vec![1.0]);
        assert!(check_training_data(x.view(), y.view()).is_err());
        let y = Array1::from_vec(vec![1.0, 2.0]);
        assert!(check_training_data(x.view(), y.view()).is_ok());
    }
}
