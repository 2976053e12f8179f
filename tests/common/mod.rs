//! Common test utilities for inverse design integration tests.
#![allow(dead_code)]

use inverse_design::*;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use rand::prelude::*;
use serde_json::{json, Value};
use std::fs;
use std::path::Path;

pub const TARGET: &str = "Epsilon";

/// Create test features uniformly in `[-5, 5)`
pub fn create_test_features(num_samples: usize, num_features: usize) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(42);

    let mut features = Array2::zeros((num_samples, num_features));

    for i in 0..num_samples {
        for j in 0..num_features {
            features[[i, j]] = rng.gen_range(-5.0..5.0);
        }
    }

    features
}

/// Create test labels as a linear combination of the features plus an offset
pub fn create_test_labels(features: &Array2<f64>) -> Array1<f64> {
    features
        .rows()
        .into_iter()
        .map(|row| {
            10.0 + row
                .iter()
                .enumerate()
                .map(|(j, x)| x * (j + 1) as f64)
                .sum::<f64>()
        })
        .collect()
}

/// Feature names `x0, x1, ...`
pub fn create_feature_names(num_features: usize) -> Vec<String> {
    (0..num_features).map(|i| format!("x{}", i)).collect()
}

/// Turn a matrix and labels into request records
pub fn to_records(
    features: &Array2<f64>,
    labels: &Array1<f64>,
    feature_names: &[String],
) -> Vec<Record> {
    features
        .rows()
        .into_iter()
        .zip(labels.iter())
        .map(|(row, label)| {
            let mut record = Record::new();
            for (name, value) in feature_names.iter().zip(row.iter()) {
                record.insert(name.clone(), json!(value));
            }
            record.insert(TARGET.to_string(), json!(label));
            record
        })
        .collect()
}

/// The five-row, two-feature dataset of the basic end-to-end scenario
pub fn create_epsilon_records() -> (Vec<Record>, Vec<String>) {
    let rows = [
        (1.0, 0.5, 8.0),
        (2.0, 0.7, 9.5),
        (3.0, 0.9, 11.2),
        (4.0, 1.1, 12.8),
        (5.0, 1.3, 14.1),
    ];
    let records = rows
        .iter()
        .map(|&(alpha, beta, epsilon)| {
            json!({"Alpha": alpha, "Beta": beta, TARGET: epsilon})
                .as_object()
                .cloned()
                .unwrap()
        })
        .collect();
    (records, vec!["Alpha".to_string(), "Beta".to_string()])
}

/// A small, seeded, fast configuration
pub fn create_test_config(repetitions: usize) -> OptimizerConfig {
    ConfigBuilder::new()
        .swarm_size(10)
        .max_iterations(5)
        .repetitions_per_model(repetitions)
        .random_seed(42)
        .build()
        .unwrap()
}

/// Write a JSON request document to `path`
pub fn create_test_request_json<P: AsRef<Path>>(
    path: P,
    records: &[Record],
    feature_names: &[String],
    targets: &[f64],
) -> std::io::Result<()> {
    let request = json!({
        "data": records,
        "features": feature_names,
        "target": TARGET,
        "target_value": targets,
        "pso_config": {"swarmsize": 8, "maxiter": 4, "n_solutions": 2, "random_seed": 1},
    });
    fs::write(path, serde_json::to_string_pretty(&request)?)
}

/// Walk a JSON tree and check that no number is non-finite
pub fn assert_all_numbers_finite(value: &Value) {
    match value {
        Value::Number(n) => {
            let f = n.as_f64().unwrap_or(0.0);
            assert!(f.is_finite(), "non-finite number {}", n);
        }
        Value::Array(items) => items.iter().for_each(assert_all_numbers_finite),
        Value::Object(map) => map.values().for_each(assert_all_numbers_finite),
        _ => {}
    }
}

/// A regressor whose fit always fails
#[derive(Debug, Default)]
pub struct FailingRegressor;

impl Regressor for FailingRegressor {
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

/// A regressor that scores normally on the held-out rows but predicts NaN
/// for every single candidate row the swarm evaluates
#[derive(Debug, Default)]
pub struct NanForSingleRows {
    mean: f64,
}

impl Regressor for NanForSingleRows {
    fn fit(&mut self, _: ArrayView2<'_, f64>, labels: ArrayView1<'_, f64>) -> Result<()> {
        self.mean = labels.mean().unwrap_or(0.0);
        Ok(())
    }

    fn predict(&self, features: ArrayView2<'_, f64>) -> Result<Array1<f64>> {
        let value = if features.nrows() == 1 { f64::NAN } else { self.mean };
        Ok(Array1::from_elem(features.nrows(), value))
    }

    fn num_features(&self) -> Option<usize> {
        None
    }
}

/// Convenience macro for creating records and feature names
#[macro_export]
macro_rules! create_test_data {
    ($samples:expr, $features:expr) => {{
        let features = common::create_test_features($samples, $features);
        let labels = common::create_test_labels(&features);
        let names = common::create_feature_names($features);
        (common::to_records(&features, &labels, &names), names)
    }};
}

/// Test fixture bundling records with the request they feed
pub struct TestDataFixture {
    pub features: Array2<f64>,
    pub labels: Array1<f64>,
    pub feature_names: Vec<String>,
}

impl TestDataFixture {
    pub fn new_regression(num_samples: usize, num_features: usize) -> Self {
        let features = create_test_features(num_samples, num_features);
        let labels = create_test_labels(&features);
        let feature_names = create_feature_names(num_features);

        TestDataFixture {
            features,
            labels,
            feature_names,
        }
    }

    /// Overwrite one column with a constant
    pub fn with_constant_column(mut self, column: usize, value: f64) -> Self {
        self.features.column_mut(column).fill(value);
        self
    }

    pub fn records(&self) -> Vec<Record> {
        to_records(&self.features, &self.labels, &self.feature_names)
    }

    pub fn request(&self, targets: Vec<f64>, config: OptimizerConfig) -> OptimizationRequest {
        OptimizationRequest::new(
            self.records(),
            self.feature_names.clone(),
            TARGET,
            targets,
            config,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_test_features() {
        let features = create_test_features(100, 5);
        assert_eq!(features.nrows(), 100);
        assert_eq!(features.ncols(), 5);
        assert!(features.iter().all(|x| x.is_finite() && (-5.0..5.0).contains(x)));
    }

    #[test]
    fn test_records_carry_every_column() {
        let fixture = TestDataFixture::new_regression(10, 3);
        let records = fixture.records();
        assert_eq!(records.len(), 10);
        assert!(records.iter().all(|r| r.len() == 4 && r.contains_key(TARGET)));
    }

    #[test]
    fn test_constant_column() {
        let fixture = TestDataFixture::new_regression(20, 2).with_constant_column(1, 0.0);
        assert!(fixture.features.column(1).iter().all(|&v| v == 0.0));
    }
}
