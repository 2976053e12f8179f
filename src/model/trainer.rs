//! Surrogate training.
//!
//! Splits the dataset, optionally standardizes features on the training rows,
//! then fits and scores every registered model kind. A kind that fails to fit
//! or to score is logged and left out; the others are unaffected.

use crate::core::constants::DEFAULT_MODEL_SEED;
use crate::core::error::Result;
use crate::core::numeric::{finite_or_infinity, finite_or_zero};
use crate::core::types::ModelKind;
use crate::dataset::{Dataset, StandardScaler, TrainTestSplit};
use crate::metrics_eval::evaluate_regression;
use crate::model::{ModelRegistry, Regressor, RegressorFactory};

use ndarray::Array2;
use std::time::Instant;

/// A fitted surrogate and its held-out scores.
#[derive(Debug)]
pub struct TrainedSurrogate {
    kind: ModelKind,
    model: Box<dyn Regressor>,
    r2: f64,
    mse: f64,
    y_pred_on_test: Vec<f64>,
}

impl TrainedSurrogate {
    /// Model kind.
    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    /// The fitted model. Expects inputs in the space it was trained in.
    pub fn model(&self) -> &dyn Regressor {
        self.model.as_ref()
    }

    /// Held-out R², 0.0 when not finite.
    pub fn r2(&self) -> f64 {
        self.r2
    }

    /// Held-out mean squared error, +∞ when not finite.
    pub fn mse(&self) -> f64 {
        self.mse
    }

    /// Predictions on the held-out rows, non-finite values zeroed.
    pub fn y_pred_on_test(&self) -> &[f64] {
        &self.y_pred_on_test
    }
}

/// Every surrogate that trained successfully, plus the shared feature
/// transform.
#[derive(Debug)]
pub struct SurrogateSet {
    surrogates: Vec<TrainedSurrogate>,
    scaler: Option<StandardScaler>,
    feature_names: Vec<String>,
    split: TrainTestSplit,
}

impl SurrogateSet {
    /// Trained surrogates in registration order.
    pub fn surrogates(&self) -> &[TrainedSurrogate] {
        &self.surrogates
    }

    /// Trained kinds in registration order.
    pub fn kinds(&self) -> Vec<ModelKind> {
        self.surrogates.iter().map(|s| s.kind).collect()
    }

    /// Look up a surrogate by kind.
    pub fn get(&self, kind: ModelKind) -> Option<&TrainedSurrogate> {
        self.surrogates.iter().find(|s| s.kind == kind)
    }

    /// Number of trained surrogates.
    pub fn len(&self) -> usize {
        self.surrogates.len()
    }

    /// Whether every model kind failed.
    pub fn is_empty(&self) -> bool {
        self.surrogates.is_empty()
    }

    /// The transform applied before every prediction, when standardizing.
    pub fn scaler(&self) -> Option<&StandardScaler> {
        self.scaler.as_ref()
    }

    /// Feature names in column order.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// The train/test split used for fitting and scoring.
    pub fn split(&self) -> &TrainTestSplit {
        &self.split
    }
}

/// Fit every registered model kind on a seeded train/test split.
///
/// Only dataset-level problems are errors. Individual model failures shrink
/// the returned set instead.
pub fn train_surrogates(
    dataset: &Dataset,
    registry: &ModelRegistry,
    standardize: bool,
) -> Result<SurrogateSet> {
    let split = TrainTestSplit::new(dataset.num_data(), DEFAULT_MODEL_SEED)?;
    let (train, test) = split.apply(dataset)?;

    let (scaler, x_train, x_test) = if standardize {
        let scaler = StandardScaler::fit(train.features())?;
        let x_train = scaler.transform(train.features())?;
        let x_test = scaler.transform(test.features())?;
        (Some(scaler), x_train, x_test)
    } else {
        (None, train.features().to_owned(), test.features().to_owned())
    };

    log::info!(
        "Training {} model kind(s) on {} rows ({} held out), standardize={}",
        registry.len(),
        train.num_data(),
        test.num_data(),
        standardize
    );

    let mut surrogates = Vec::with_capacity(registry.len());
    for (kind, factory) in registry.iter() {
        let start = Instant::now();
        match fit_and_score(kind, factory, &x_train, &train, &x_test, &test) {
            Ok(surrogate) => {
                log::info!(
                    "Trained {}: R²={:.4}, MSE={:.4} ({:.2?})",
                    kind,
                    surrogate.r2,
                    surrogate.mse,
                    start.elapsed()
                );
                surrogates.push(surrogate);
            }
            Err(e) if e.is_recoverable() => {
                log::warn!("Failed to train {}: {}", kind, e);
            }
            Err(e) => {
                log::error!("Training {} hit a {} error: {}", kind, e.category(), e);
            }
        }
    }

    if surrogates.is_empty() {
        log::warn!("No model kind trained successfully");
    }

    Ok(SurrogateSet {
        surrogates,
        scaler,
        feature_names: dataset.feature_names().to_vec(),
        split,
    })
}

fn fit_and_score(
    kind: ModelKind,
    factory: &RegressorFactory,
    x_train: &Array2<f64>,
    train: &Dataset,
    x_test: &Array2<f64>,
    test: &Dataset,
) -> Result<TrainedSurrogate> {
    let mut model = factory();
    model.fit(x_train.view(), train.targets())?;

    let y_pred = model.predict(x_test.view())?;
    let metrics = evaluate_regression(&y_pred.view(), &test.targets());

    Ok(TrainedSurrogate {
        kind,
        model,
        r2: finite_or_zero(metrics.r2),
        mse: finite_or_infinity(metrics.mse),
        y_pred_on_test: y_pred.iter().map(|&p| finite_or_zero(p)).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::InverseDesignError;
    use ndarray::{Array1, ArrayView1, ArrayView2};

    #[derive(Debug)]
    struct FailingFit;

    impl Regressor for FailingFit {
        fn fit(&mut self, _: ArrayView2<'_, f64>, _: ArrayView1<'_, f64>) -> Result<()> {
            Err(InverseDesignError::training("fit always fails"))
        }

        fn predict(&self, _: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
            Err(InverseDesignError::prediction("not fitted"))
        }

        fn num_features(&self) -> Option<usize> {
            None
        }
    }

    fn dataset(n: usize) -> Dataset {
        let x = Array2::from_shape_fn((n, 2), |(i, j)| (i + j) as f64);
        let y = Array1::from_shape_fn(n, |i| 2.0 * i as f64);
        Dataset::new(x, y, vec!["a".into(), "b".into()], "y").unwrap()
    }

    #[test]
    fn test_trains_registered_kinds_in_order() {
        let registry = ModelRegistry::with_kinds(&[ModelKind::DecisionTree, ModelKind::RandomForest]);
        let set = train_surrogates(&dataset(20), &registry, true).unwrap();

        assert_eq!(set.kinds(), vec![ModelKind::DecisionTree, ModelKind::RandomForest]);
        assert!(set.scaler().is_some());
        for surrogate in set.surrogates() {
            assert_eq!(surrogate.y_pred_on_test().len(), 4);
            assert!(surrogate.mse().is_finite());
        }
    }

    #[test]
    fn test_failing_kind_is_omitted() {
        let mut registry = ModelRegistry::with_kinds(&[ModelKind::DecisionTree]);
        registry.register_fn(ModelKind::GradientBoosting, || -> Box<dyn Regressor> {
            Box::new(FailingFit)
        });

        let set = train_surrogates(&dataset(12), &registry, false).unwrap();
        assert_eq!(set.kinds(), vec![ModelKind::DecisionTree]);
        assert!(set.get(ModelKind::GradientBoosting).is_none());
    }

    #[test]
    fn test_single_held_out_row_has_zero_r2() {
        let set = train_surrogates(
            &dataset(5),
            &ModelRegistry::with_kinds(&[ModelKind::DecisionTree]),
            true,
        )
        .unwrap();
        assert_eq!(set.split().test_indices.len(), 1);
        assert_eq!(set.surrogates()[0].r2(), 0.0);
    }

    #[test]
    fn test_no_scaler_without_standardization() {
        let set = train_surrogates(
            &dataset(10),
            &ModelRegistry::with_kinds(&[ModelKind::DecisionTree]),
            false,
        )
        .unwrap();
        assert!(set.scaler().is_none());
    }
}
