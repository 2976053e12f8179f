//! Tabular view of an [`OptimizationReport`].
//!
//! One [`BestSolutionRow`] per target: the fixed summary columns followed by
//! one column per feature. Per-run detail stays in the report itself.

use crate::core::numeric::sanitize_json;
use crate::core::types::ModelKind;
use crate::orchestrator::OptimizationReport;
use crate::optimizer::FeatureAssignment;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// Column names that precede the feature columns.
pub const SUMMARY_COLUMNS: [&str; 6] = [
    "target_value",
    "best_model",
    "best_runtime",
    "best_fopt",
    "prediction",
    "error",
];

/// Flattened best solution of one target.
#[derive(Debug, Clone, PartialEq)]
pub struct BestSolutionRow {
    pub target_value: f64,
    pub best_model: ModelKind,
    pub best_runtime: f64,
    pub best_fopt: f64,
    pub prediction: f64,
    pub error: f64,
    pub features: FeatureAssignment,
}

impl BestSolutionRow {
    /// Column headers in output order.
    pub fn columns(&self) -> Vec<String> {
        SUMMARY_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(self.features.names().iter().map(|n| feature_column(n)))
            .collect()
    }
}

/// A feature sharing a summary column's name would produce a duplicate key,
/// so it is prefixed.
fn feature_column(name: &str) -> String {
    if SUMMARY_COLUMNS.contains(&name) {
        format!("feature:{}", name)
    } else {
        name.to_string()
    }
}

fn nullable(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

impl Serialize for BestSolutionRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map =
            serializer.serialize_map(Some(SUMMARY_COLUMNS.len() + self.features.names().len()))?;
        map.serialize_entry("target_value", &nullable(self.target_value))?;
        map.serialize_entry("best_model", &self.best_model)?;
        map.serialize_entry("best_runtime", &nullable(self.best_runtime))?;
        map.serialize_entry("best_fopt", &nullable(self.best_fopt))?;
        map.serialize_entry("prediction", &nullable(self.prediction))?;
        map.serialize_entry("error", &nullable(self.error))?;
        for (name, value) in self.features.iter() {
            map.serialize_entry(&feature_column(name), &nullable(value))?;
        }
        map.end()
    }
}

/// One row per target result, in report order.
pub fn best_solution_rows(report: &OptimizationReport) -> Vec<BestSolutionRow> {
    report
        .results
        .iter()
        .map(|result| BestSolutionRow {
            target_value: result.target_value,
            best_model: result.best_model,
            best_runtime: result.best_runtime,
            best_fopt: result.best_fopt,
            prediction: result.best_solution.prediction,
            error: result.best_solution.error,
            features: result.best_solution.features.clone(),
        })
        .collect()
}

/// `{"results": [...], "best_solutions": [...]}` with every non-finite
/// number as `null`.
pub fn report_to_json(report: &OptimizationReport) -> crate::core::error::Result<serde_json::Value> {
    let mut value = serde_json::to_value(report)?;
    if let serde_json::Value::Object(map) = &mut value {
        map.insert(
            "best_solutions".to_string(),
            serde_json::to_value(best_solution_rows(report))?,
        );
    }
    Ok(sanitize_json(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::SearchRunRecord;
    use crate::orchestrator::TargetResult;

    fn report() -> OptimizationReport {
        let record = SearchRunRecord {
            solution: FeatureAssignment::new(
                vec!["Alpha".into(), "error".into()],
                vec![1.5, 2.0],
            )
            .unwrap(),
            prediction: 10.5,
            error: 0.5,
            runtime: 0.01,
            fopt: 0.49,
            mse: f64::INFINITY,
            r2: 0.0,
            accuracy_like: 0.95,
            y_pred_on_test: vec![1.0],
        };
        let result =
            TargetResult::from_runs(11.0, vec![(ModelKind::DecisionTree, vec![record])]).unwrap();
        OptimizationReport {
            results: vec![result],
        }
    }

    #[test]
    fn test_rows_flatten_best_solution() {
        let rows = best_solution_rows(&report());
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.target_value, 11.0);
        assert_eq!(row.best_model, ModelKind::DecisionTree);
        assert_eq!(row.best_fopt, 0.49);
        assert_eq!(row.best_runtime, 0.01);
        assert_eq!(row.features.get("Alpha"), Some(1.5));
        assert_eq!(row.columns().len(), 8);
        assert_eq!(row.columns()[7], "feature:error");
    }

    #[test]
    fn test_row_json_columns() {
        let rows = best_solution_rows(&report());
        let json = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(json["best_model"], "Decision Tree");
        assert_eq!(json["Alpha"], 1.5);
        assert_eq!(json["feature:error"], 2.0);
        assert_eq!(json["error"], 0.5);
        assert_eq!(json["best_runtime"], 0.01);
        assert_eq!(json["best_fopt"], 0.49);
        assert!(json.get("runtime").is_none());
        assert!(json.get("fopt").is_none());
    }

    #[test]
    fn test_report_json_has_no_non_finite_numbers() {
        let json = report_to_json(&report()).unwrap();
        let text = json.to_string();
        assert!(!text.contains("NaN"));
        assert!(!text.contains("Infinity"));
        assert!(json["results"][0]["best_solution"]["mse"].is_null());
        assert_eq!(json["best_solutions"].as_array().unwrap().len(), 1);
    }
}
