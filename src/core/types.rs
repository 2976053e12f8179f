//! Core data types shared by the trainer, the swarm search and the report.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::InverseDesignError;

/// Feature index type for identifying columns in the feature matrix.
pub type FeatureIndex = usize;

/// Index of a row in the training data.
pub type SampleIndex = usize;

/// Tree node identifier type.
pub type NodeIndex = usize;

/// Regression model families available as surrogates.
///
/// Declaration order is the default registration order, which is also the
/// order used to break ties between equally good search runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ModelKind {
    /// Bagged ensemble of CART regression trees
    #[serde(rename = "Random Forest")]
    RandomForest,
    /// Single CART regression tree
    #[serde(rename = "Decision Tree")]
    DecisionTree,
    /// Gradient boosting over depth-limited CART trees
    #[serde(rename = "Gradient-Boosted Trees")]
    GradientBoosting,
    /// Gradient boosting over symmetric (oblivious) trees
    #[serde(rename = "Gradient-Boosted Trees (alt.)")]
    ObliviousBoosting,
}

impl ModelKind {
    /// All model kinds in default registration order.
    pub const ALL: [ModelKind; 4] = [
        ModelKind::RandomForest,
        ModelKind::DecisionTree,
        ModelKind::GradientBoosting,
        ModelKind::ObliviousBoosting,
    ];

    /// Human-readable name used in reports.
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::RandomForest => "Random Forest",
            ModelKind::DecisionTree => "Decision Tree",
            ModelKind::GradientBoosting => "Gradient-Boosted Trees",
            ModelKind::ObliviousBoosting => "Gradient-Boosted Trees (alt.)",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelKind {
    type Err = InverseDesignError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModelKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                InverseDesignError::invalid_parameter("model_kind", s, "unknown model kind")
            })
    }
}
