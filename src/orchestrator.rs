//! Multi-target orchestration.
//!
//! [`InverseOptimizer`] owns everything a request needs after validation:
//! the trained surrogates, the search space and the configuration. For each
//! requested target it runs every surrogate's repetitions in trained order
//! and keeps the lowest-error record as the target's best solution.

use crate::bounds::FeatureSpace;
use crate::config::OptimizerConfig;
use crate::core::error::Result;
use crate::core::numeric::{finite_or_null, finite_vec_or_null};
use crate::core::types::ModelKind;
use crate::dataset::{Dataset, Record};
use crate::model::{train_surrogates, ModelRegistry, SurrogateSet};
use crate::optimizer::{FeatureAssignment, ModelRuns, SearchRunRecord, SearchRunner};
use crate::request::OptimizationRequest;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::ops::Index;
use std::time::Instant;

/// The winning record of a target, restated with its target value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BestSolution {
    /// Optimized feature vector, raw units
    pub features: FeatureAssignment,
    #[serde(serialize_with = "finite_or_null")]
    pub prediction: f64,
    #[serde(serialize_with = "finite_or_null")]
    pub target_value: f64,
    #[serde(serialize_with = "finite_or_null")]
    pub error: f64,
    #[serde(serialize_with = "finite_or_null")]
    pub runtime: f64,
    #[serde(serialize_with = "finite_or_null")]
    pub mse: f64,
    #[serde(serialize_with = "finite_or_null")]
    pub r2: f64,
    #[serde(serialize_with = "finite_or_null")]
    pub accuracy_like: f64,
    #[serde(serialize_with = "finite_vec_or_null")]
    pub y_pred_on_test: Vec<f64>,
}

impl BestSolution {
    fn from_record(record: &SearchRunRecord, target_value: f64) -> Self {
        BestSolution {
            features: record.solution.clone(),
            prediction: record.prediction,
            target_value,
            error: record.error,
            runtime: record.runtime,
            mse: record.mse,
            r2: record.r2,
            accuracy_like: record.accuracy_like,
            y_pred_on_test: record.y_pred_on_test.clone(),
        }
    }
}

/// Best solution for one requested target plus every run behind it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TargetResult {
    #[serde(serialize_with = "finite_or_null")]
    pub target_value: f64,
    pub best_model: ModelKind,
    #[serde(serialize_with = "finite_or_null")]
    pub best_runtime: f64,
    #[serde(serialize_with = "finite_or_null")]
    pub best_fopt: f64,
    pub best_solution: BestSolution,
    /// Every trained model kind and its records; a kind whose repetitions
    /// all failed maps to an empty list
    pub comparison_table: ComparisonTable,
}

impl TargetResult {
    /// Build the result for `target_value` from per-model runs in trained order.
    ///
    /// Returns `None` when no run produced a record.
    pub fn from_runs(target_value: f64, runs: Vec<ModelRuns>) -> Option<Self> {
        let (best_model, best) = select_best(&runs)?;
        let best_solution = BestSolution::from_record(best, target_value);
        let best_runtime = best.runtime;
        let best_fopt = best.fopt;

        Some(TargetResult {
            target_value,
            best_model,
            best_runtime,
            best_fopt,
            best_solution,
            comparison_table: runs.into_iter().collect(),
        })
    }

    /// Every record for this target.
    pub fn all_records(&self) -> impl Iterator<Item = &SearchRunRecord> {
        self.comparison_table.values().flatten()
    }
}

/// Records per model kind, kept in trained order and serialized as a map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ComparisonTable {
    entries: Vec<ModelRuns>,
}

impl ComparisonTable {
    /// Number of model kinds.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Records of one model kind.
    pub fn get(&self, kind: &ModelKind) -> Option<&Vec<SearchRunRecord>> {
        self.entries
            .iter()
            .find(|(k, _)| k == kind)
            .map(|(_, records)| records)
    }

    pub fn contains_key(&self, kind: &ModelKind) -> bool {
        self.get(kind).is_some()
    }

    /// Model kinds in trained order.
    pub fn keys(&self) -> impl Iterator<Item = &ModelKind> {
        self.entries.iter().map(|(kind, _)| kind)
    }

    pub fn values(&self) -> impl Iterator<Item = &Vec<SearchRunRecord>> {
        self.entries.iter().map(|(_, records)| records)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ModelKind, &Vec<SearchRunRecord>)> {
        self.entries.iter().map(|(kind, records)| (kind, records))
    }
}

impl FromIterator<ModelRuns> for ComparisonTable {
    fn from_iter<I: IntoIterator<Item = ModelRuns>>(iter: I) -> Self {
        let mut table = ComparisonTable::default();
        for (kind, records) in iter {
            match table.entries.iter_mut().find(|(k, _)| *k == kind) {
                Some((_, existing)) => *existing = records,
                None => table.entries.push((kind, records)),
            }
        }
        table
    }
}

impl Index<&ModelKind> for ComparisonTable {
    type Output = Vec<SearchRunRecord>;

    fn index(&self, kind: &ModelKind) -> &Self::Output {
        match self.get(kind) {
            Some(records) => records,
            None => panic!("{} is not in the comparison table", kind),
        }
    }
}

impl Serialize for ComparisonTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (kind, records) in &self.entries {
            map.serialize_entry(kind, records)?;
        }
        map.end()
    }
}

/// Lowest-error record across models (in the given order) and repetitions.
///
/// The first record with the minimum error wins.
pub fn select_best(runs: &[ModelRuns]) -> Option<(ModelKind, &SearchRunRecord)> {
    let mut best: Option<(ModelKind, &SearchRunRecord)> = None;
    for (kind, records) in runs {
        for record in records {
            if best.map_or(true, |(_, b)| record.error < b.error) {
                best = Some((*kind, record));
            }
        }
    }
    best
}

/// Ordered target results of one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OptimizationReport {
    pub results: Vec<TargetResult>,
}

impl OptimizationReport {
    /// Number of targets that produced a result.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether no target produced a result.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Result for a target value, if present.
    pub fn result_for(&self, target_value: f64) -> Option<&TargetResult> {
        self.results.iter().find(|r| r.target_value == target_value)
    }
}

/// Trained surrogates, search space and configuration for one request.
#[derive(Debug)]
pub struct InverseOptimizer {
    config: OptimizerConfig,
    surrogates: SurrogateSet,
    space: FeatureSpace,
}

impl InverseOptimizer {
    /// Validate a request and train the default surrogates.
    pub fn new(request: &OptimizationRequest) -> Result<Self> {
        Self::with_registry(request, &ModelRegistry::default())
    }

    /// Validate a request and train the surrogates of `registry`.
    pub fn with_registry(request: &OptimizationRequest, registry: &ModelRegistry) -> Result<Self> {
        request.validate()?;
        let dataset = request.dataset()?;
        Self::from_dataset(&dataset, request.effective_config(), registry)
    }

    /// Train on an already-built dataset.
    pub fn from_dataset(
        dataset: &Dataset,
        config: OptimizerConfig,
        registry: &ModelRegistry,
    ) -> Result<Self> {
        config.validate()?;

        let space = match (&config.lower_bounds, &config.upper_bounds) {
            (Some(lower), Some(upper)) => FeatureSpace::from_overrides(
                dataset.feature_names(),
                lower,
                upper,
                &config.bounds_policy,
            )?,
            (lower, upper) => {
                if lower.is_some() || upper.is_some() {
                    log::warn!(
                        "Only one of lower_bounds/upper_bounds was supplied; deriving both from the data"
                    );
                }
                FeatureSpace::from_data(
                    dataset.feature_names(),
                    dataset.features(),
                    &config.bounds_policy,
                )?
            }
        };

        let surrogates = train_surrogates(dataset, registry, config.standardize_features)?;

        Ok(InverseOptimizer {
            config,
            surrogates,
            space,
        })
    }

    /// The configuration in effect.
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// The trained surrogates.
    pub fn surrogates(&self) -> &SurrogateSet {
        &self.surrogates
    }

    /// The search space.
    pub fn feature_space(&self) -> &FeatureSpace {
        &self.space
    }

    /// All runs for one target, per surrogate in trained order.
    pub fn optimize_single_target(&self, target: f64, target_index: usize) -> Vec<ModelRuns> {
        let runner = SearchRunner::new(&self.surrogates, &self.space, &self.config);
        self.surrogates
            .surrogates()
            .iter()
            .enumerate()
            .map(|(model_index, surrogate)| {
                (
                    surrogate.kind(),
                    runner.run(surrogate, model_index, target, target_index),
                )
            })
            .collect()
    }

    /// Run every target; targets without a single record are left out.
    pub fn optimize_for_targets(&self, targets: &[f64]) -> OptimizationReport {
        log::info!("Starting optimization for targets: {:?}", targets);
        let mut results = Vec::with_capacity(targets.len());

        for (target_index, &target) in targets.iter().enumerate() {
            let start = Instant::now();
            let runs = self.optimize_single_target(target, target_index);
            match TargetResult::from_runs(target, runs) {
                Some(result) => {
                    log::info!(
                        "Target {}: best {} with error {:.6} ({:.2?})",
                        target,
                        result.best_model,
                        result.best_solution.error,
                        start.elapsed()
                    );
                    results.push(result);
                }
                None => log::warn!("No successful runs for target {}; omitting it", target),
            }
        }

        OptimizationReport { results }
    }
}

/// Train surrogates on `records` and invert them for every target value.
pub fn optimize(
    records: Vec<Record>,
    feature_names: Vec<String>,
    target_column: &str,
    target_values: Vec<f64>,
    config: OptimizerConfig,
) -> Result<OptimizationReport> {
    optimize_with_registry(
        records,
        feature_names,
        target_column,
        target_values,
        config,
        &ModelRegistry::default(),
    )
}

/// [`optimize`] with an explicit set of model kinds.
pub fn optimize_with_registry(
    records: Vec<Record>,
    feature_names: Vec<String>,
    target_column: &str,
    target_values: Vec<f64>,
    config: OptimizerConfig,
    registry: &ModelRegistry,
) -> Result<OptimizationReport> {
    let request =
        OptimizationRequest::new(records, feature_names, target_column, target_values, config);
    let optimizer = InverseOptimizer::with_registry(&request, registry)?;
    Ok(optimizer.optimize_for_targets(request.targets()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(error: f64) -> SearchRunRecord {
        SearchRunRecord {
            solution: FeatureAssignment::new(vec!["x".into()], vec![error]).unwrap(),
            prediction: 0.0,
            error,
            runtime: 0.0,
            fopt: error,
            mse: 0.0,
            r2: 0.0,
            accuracy_like: 0.0,
            y_pred_on_test: vec![],
        }
    }

    #[test]
    fn test_select_best_minimum_error() {
        let runs = vec![
            (ModelKind::RandomForest, vec![record(3.0), record(2.0)]),
            (ModelKind::DecisionTree, vec![record(0.5), record(4.0)]),
        ];
        let (kind, best) = select_best(&runs).unwrap();
        assert_eq!(kind, ModelKind::DecisionTree);
        assert_eq!(best.error, 0.5);
    }

    #[test]
    fn test_select_best_ties_keep_first() {
        let runs = vec![
            (ModelKind::GradientBoosting, vec![record(1.0)]),
            (ModelKind::RandomForest, vec![record(1.0)]),
        ];
        let (kind, _) = select_best(&runs).unwrap();
        assert_eq!(kind, ModelKind::GradientBoosting);
    }

    #[test]
    fn test_empty_runs_give_no_result() {
        let runs = vec![(ModelKind::RandomForest, vec![])];
        assert!(select_best(&runs).is_none());
        assert!(TargetResult::from_runs(1.0, runs).is_none());
    }

    #[test]
    fn test_target_result_keeps_empty_model_lists() {
        let runs = vec![
            (ModelKind::RandomForest, vec![]),
            (ModelKind::DecisionTree, vec![record(1.5)]),
        ];
        let result = TargetResult::from_runs(7.0, runs).unwrap();
        assert_eq!(result.best_model, ModelKind::DecisionTree);
        assert_eq!(result.best_solution.target_value, 7.0);
        assert_eq!(result.comparison_table.len(), 2);
        assert!(result.comparison_table[&ModelKind::RandomForest].is_empty());
        assert_eq!(result.all_records().count(), 1);
    }

    #[test]
    fn test_comparison_table_keeps_trained_order() {
        let runs = vec![
            (ModelKind::ObliviousBoosting, vec![record(2.0)]),
            (ModelKind::DecisionTree, vec![record(1.0)]),
            (ModelKind::RandomForest, vec![]),
        ];
        let result = TargetResult::from_runs(3.0, runs).unwrap();
        let kinds: Vec<ModelKind> = result.comparison_table.keys().copied().collect();
        assert_eq!(
            kinds,
            vec![
                ModelKind::ObliviousBoosting,
                ModelKind::DecisionTree,
                ModelKind::RandomForest
            ]
        );

        let json = serde_json::to_string(&result.comparison_table).unwrap();
        let first = json.find(&format!("\"{}\"", ModelKind::ObliviousBoosting)).unwrap();
        let second = json.find(&format!("\"{}\"", ModelKind::DecisionTree)).unwrap();
        assert!(first < second);
        assert!(result.comparison_table.get(&ModelKind::GradientBoosting).is_none());
    }
}
