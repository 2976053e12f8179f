//! Tabular dataset for surrogate training.
//!
//! Records arrive as JSON-like rows keyed by column name. [`Dataset`] holds
//! them as a dense feature matrix in declared feature order plus a target
//! vector.

use crate::core::error::{InverseDesignError, Result};
use crate::core::types::SampleIndex;
use crate::{ensure, validation_error};

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};
use serde_json::Value;

/// One input row: column name to value.
pub type Record = serde_json::Map<String, Value>;

/// Dense feature matrix and target vector with their column names.
#[derive(Debug, Clone)]
pub struct Dataset {
    /// Feature matrix (num_data × num_features)
    features: Array2<f64>,
    /// Target values (num_data,)
    targets: Array1<f64>,
    /// Feature names in column order
    feature_names: Vec<String>,
    /// Name of the target column
    target_name: String,
}

impl Dataset {
    /// Create a dataset from arrays.
    pub fn new(
        features: Array2<f64>,
        targets: Array1<f64>,
        feature_names: Vec<String>,
        target_name: impl Into<String>,
    ) -> Result<Self> {
        if targets.len() != features.nrows() {
            return Err(InverseDesignError::dimension_mismatch(
                format!("features rows: {}", features.nrows()),
                format!("targets length: {}", targets.len()),
            ));
        }
        if feature_names.len() != features.ncols() {
            return Err(InverseDesignError::dimension_mismatch(
                format!("features columns: {}", features.ncols()),
                format!("feature names: {}", feature_names.len()),
            ));
        }
        if features.nrows() == 0 {
            return Err(InverseDesignError::dataset("Dataset has no rows"));
        }
        if features.ncols() == 0 {
            return Err(InverseDesignError::dataset("Dataset has no features"));
        }

        Ok(Dataset {
            features,
            targets,
            feature_names,
            target_name: target_name.into(),
        })
    }

    /// Build a dataset from records, checking that every row carries every
    /// declared feature and the target column.
    pub fn from_records(records: &[Record], feature_names: &[String], target: &str) -> Result<Self> {
        validate_records(records, feature_names, target)?;

        let num_features = feature_names.len();
        let mut features = Array2::<f64>::zeros((records.len(), num_features));
        let mut targets = Array1::<f64>::zeros(records.len());

        for (row_idx, row) in records.iter().enumerate() {
            for (col_idx, name) in feature_names.iter().enumerate() {
                features[[row_idx, col_idx]] = numeric_cell(row, name, row_idx)?;
            }
            targets[row_idx] = numeric_cell(row, target, row_idx)?;
        }

        Self::new(features, targets, feature_names.to_vec(), target)
    }

    /// Number of rows.
    pub fn num_data(&self) -> usize {
        self.features.nrows()
    }

    /// Number of feature columns.
    pub fn num_features(&self) -> usize {
        self.features.ncols()
    }

    /// Feature matrix view.
    pub fn features(&self) -> ArrayView2<'_, f64> {
        self.features.view()
    }

    /// Target vector view.
    pub fn targets(&self) -> ArrayView1<'_, f64> {
        self.targets.view()
    }

    /// Feature names in column order.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Name of the target column.
    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    /// Copy the given rows into a new dataset, in the order given.
    pub fn subset(&self, indices: &[SampleIndex]) -> Result<Self> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.num_data()) {
            return Err(InverseDesignError::dataset(format!(
                "Row index {} out of bounds for {} rows",
                bad,
                self.num_data()
            )));
        }

        let features = Array2::from_shape_fn((indices.len(), self.num_features()), |(i, j)| {
            self.features[[indices[i], j]]
        });
        let targets = Array1::from_iter(indices.iter().map(|&i| self.targets[i]));

        Self::new(
            features,
            targets,
            self.feature_names.clone(),
            self.target_name.clone(),
        )
    }
}

/// Validate records against the declared columns.
///
/// Fails on the first missing column, naming the row, before any numeric
/// conversion takes place.
pub fn validate_records(records: &[Record], feature_names: &[String], target: &str) -> Result<()> {
    ensure!(!records.is_empty(), validation_error!("Data must be a non-empty list"));
    ensure!(
        !feature_names.is_empty(),
        validation_error!("Features must be a non-empty list")
    );
    ensure!(
        !target.is_empty(),
        validation_error!("Target column name must not be empty")
    );

    for (row_idx, row) in records.iter().enumerate() {
        if let Some(missing) = feature_names.iter().find(|name| !row.contains_key(*name)) {
            return Err(validation_error!(
                "Feature {} missing in data row {}",
                missing,
                row_idx
            ));
        }
        ensure!(
            row.contains_key(target),
            validation_error!("Target {} missing in data row {}", target, row_idx)
        );
    }
    Ok(())
}

fn numeric_cell(row: &Record, column: &str, row_idx: usize) -> Result<f64> {
    match row.get(column) {
        Some(Value::Number(n)) => n.as_f64().ok_or_else(|| {
            InverseDesignError::validation(format!(
                "Column {} in data row {} is not representable as a float",
                column, row_idx
            ))
        }),
        // A numeric string is what CSV-backed clients tend to send.
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| {
            InverseDesignError::validation(format!(
                "Column {} in data row {} is not numeric: {:?}",
                column, row_idx, s
            ))
        }),
        Some(other) => Err(InverseDesignError::validation(format!(
            "Column {} in data row {} is not numeric: {}",
            column, row_idx, other
        ))),
        None => Err(InverseDesignError::validation(format!(
            "Column {} missing in data row {}",
            column, row_idx
        ))),
    }
}
