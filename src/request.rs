//! Incoming optimization requests.
//!
//! Requests are plain JSON documents. Both the descriptive field names and the
//! short names used by existing clients are accepted:
//!
//! ```json
//! {
//!   "data": [{"x1": 1.0, "x2": 0.5, "Epsilon": 10.2}],
//!   "features": ["x1", "x2"],
//!   "target": "Epsilon",
//!   "target_value": [11],
//!   "pso_config": {"swarmsize": 50, "maxiter": 4, "n_solutions": 3},
//!   "scale_before_fit": true
//! }
//! ```

use crate::config::OptimizerConfig;
use crate::core::error::{InverseDesignError, Result};
use crate::dataset::{validate_records, Dataset, Record};
use crate::{ensure, validation_error};

use serde::{Deserialize, Deserializer, Serialize};

/// One inverse optimization request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OptimizationRequest {
    /// Training rows
    #[serde(alias = "data", default)]
    pub records: Option<Vec<Record>>,
    /// Feature columns, in search-vector order
    #[serde(alias = "features", default)]
    pub feature_names: Option<Vec<String>>,
    /// Target column name
    #[serde(alias = "target", default)]
    pub target_column: Option<String>,
    /// Target values to invert for; a bare number is read as a one-element list
    #[serde(alias = "target_value", default, deserialize_with = "one_or_many")]
    pub target_values: Option<Vec<f64>>,
    /// Search and training configuration
    #[serde(alias = "pso_config", default)]
    pub config: OptimizerConfig,
    /// Top-level standardization switch; overrides the config when present
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale_before_fit: Option<bool>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(f64),
    Many(Vec<f64>),
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<OneOrMany>::deserialize(deserializer)?.map(|v| match v {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    }))
}

impl OptimizationRequest {
    /// Create a request from its parts.
    pub fn new(
        records: Vec<Record>,
        feature_names: Vec<String>,
        target_column: impl Into<String>,
        target_values: Vec<f64>,
        config: OptimizerConfig,
    ) -> Self {
        OptimizationRequest {
            records: Some(records),
            feature_names: Some(feature_names),
            target_column: Some(target_column.into()),
            target_values: Some(target_values),
            config,
            scale_before_fit: None,
        }
    }

    /// Parse a request from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Check required fields, non-empty lists, row completeness and the
    /// configuration.
    pub fn validate(&self) -> Result<()> {
        let records = required(&self.records, "data")?;
        let feature_names = required(&self.feature_names, "features")?;
        let target = required(&self.target_column, "target")?;
        let target_values = required(&self.target_values, "target_value")?;

        ensure!(
            !target_values.is_empty(),
            validation_error!("Target values must be a non-empty list")
        );
        if let Some(bad) = target_values.iter().find(|v| !v.is_finite()) {
            return Err(validation_error!("Target values must be finite, got {}", bad));
        }
        validate_records(records, feature_names, target)?;

        let config = self.effective_config();
        config.validate()?;
        if let (Some(lower), Some(upper)) = (&config.lower_bounds, &config.upper_bounds) {
            ensure!(
                lower.len() == feature_names.len() && upper.len() == feature_names.len(),
                validation_error!(
                    "Bounds overrides must have one entry per feature: {} features, {} bounds",
                    feature_names.len(),
                    lower.len()
                )
            );
        }
        Ok(())
    }

    /// The configuration with the top-level `scale_before_fit` applied.
    pub fn effective_config(&self) -> OptimizerConfig {
        let mut config = self.config.clone();
        if let Some(scale) = self.scale_before_fit {
            config.standardize_features = scale;
        }
        config
    }

    /// Build the training dataset.
    pub fn dataset(&self) -> Result<Dataset> {
        Dataset::from_records(
            required(&self.records, "data")?,
            required(&self.feature_names, "features")?,
            required(&self.target_column, "target")?,
        )
    }

    /// Requested target values, empty if absent.
    pub fn targets(&self) -> &[f64] {
        self.target_values.as_deref().unwrap_or(&[])
    }
}

fn required<'a, T>(field: &'a Option<T>, name: &str) -> Result<&'a T> {
    field
        .as_ref()
        .ok_or_else(|| InverseDesignError::validation(format!("Missing required field: {}", name)))
}
