//! Property tests for bounds, best selection and serialization.

use inverse_design::orchestrator::select_best;
use inverse_design::*;
use ndarray::Array2;
use proptest::prelude::*;

mod common;
use common::*;

fn cell() -> impl Strategy<Value = f64> {
    prop_oneof![
        8 => -1.0e6..1.0e6f64,
        1 => Just(0.0),
        1 => Just(f64::NAN),
    ]
}

fn any_float() -> impl Strategy<Value = f64> {
    prop_oneof![
        6 => -1.0e3..1.0e3f64,
        1 => Just(f64::NAN),
        1 => Just(f64::INFINITY),
        1 => Just(f64::NEG_INFINITY),
    ]
}

fn record(error: f64, values: Vec<f64>) -> SearchRunRecord {
    let names = create_feature_names(values.len());
    SearchRunRecord {
        solution: FeatureAssignment::new(names, values).unwrap(),
        prediction: error,
        error,
        runtime: 0.01,
        fopt: error,
        mse: error,
        r2: 0.5,
        accuracy_like: 0.0,
        y_pred_on_test: vec![error],
    }
}

proptest! {
    #[test]
    fn prop_derived_bounds_are_valid(
        rows in 1usize..8,
        cols in 1usize..5,
        cells in prop::collection::vec(cell(), 40),
        constant in prop::option::of(-1.0e6..1.0e6f64),
    ) {
        let mut features = Array2::from_shape_fn((rows, cols), |(i, j)| cells[(i * cols + j) % cells.len()]);
        if let Some(value) = constant {
            features.column_mut(0).fill(value);
        }
        let names = create_feature_names(cols);

        let space = FeatureSpace::from_data(&names, features.view(), &BoundsPolicy::default()).unwrap();
        for i in 0..cols {
            let (lo, hi) = space.interval(i).unwrap();
            prop_assert!(lo.is_finite() && hi.is_finite());
            prop_assert!(hi > lo, "feature {}: [{}, {}]", i, lo, hi);
        }
    }

    #[test]
    fn prop_repair_is_idempotent_on_valid_bounds(
        pairs in prop::collection::vec((-1.0e6..1.0e6f64, 1.0e-3..1.0e3f64), 1..10),
    ) {
        let mut lower: Vec<f64> = pairs.iter().map(|(lo, _)| *lo).collect();
        let mut upper: Vec<f64> = pairs.iter().map(|(lo, width)| lo + width).collect();
        let (lower0, upper0) = (lower.clone(), upper.clone());

        let repaired = repair_bounds(&mut lower, &mut upper, &BoundsPolicy::default());
        prop_assert_eq!(repaired, 0);
        prop_assert_eq!(&lower, &lower0);
        prop_assert_eq!(&upper, &upper0);
    }

    #[test]
    fn prop_repair_always_yields_valid_bounds(
        pairs in prop::collection::vec((any_float(), any_float()), 1..10),
    ) {
        let mut lower: Vec<f64> = pairs.iter().map(|p| p.0).collect();
        let mut upper: Vec<f64> = pairs.iter().map(|p| p.1).collect();
        let policy = BoundsPolicy::default();

        repair_bounds(&mut lower, &mut upper, &policy);
        let (lower1, upper1) = (lower.clone(), upper.clone());
        prop_assert_eq!(repair_bounds(&mut lower, &mut upper, &policy), 0);
        prop_assert_eq!(lower, lower1);
        prop_assert_eq!(upper, upper1);
    }

    #[test]
    fn prop_best_is_minimum_error(
        errors in prop::collection::vec(prop::collection::vec(0.0..100.0f64, 0..4), 1..4),
    ) {
        let runs: Vec<(ModelKind, Vec<SearchRunRecord>)> = ModelKind::ALL
            .iter()
            .zip(&errors)
            .map(|(kind, errs)| (*kind, errs.iter().map(|&e| record(e, vec![e])).collect()))
            .collect();
        let min_error = errors.iter().flatten().copied().fold(f64::INFINITY, f64::min);

        match TargetResult::from_runs(1.0, runs.clone()) {
            Some(result) => {
                prop_assert_eq!(result.best_solution.error, min_error);
                let (kind, _) = select_best(&runs).unwrap();
                prop_assert_eq!(result.best_model, kind);
                prop_assert_eq!(result.comparison_table.len(), runs.len());
            }
            None => prop_assert!(errors.iter().all(|e| e.is_empty())),
        }
    }

    #[test]
    fn prop_serialized_report_has_no_non_finite_numbers(
        fields in prop::collection::vec(any_float(), 3),
        target in any_float(),
    ) {
        let mut rec = record(fields[0].abs(), fields.clone());
        rec.mse = fields[1];
        rec.prediction = fields[2];
        rec.y_pred_on_test = fields.clone();
        let result = TargetResult::from_runs(target, vec![(ModelKind::DecisionTree, vec![rec])]).unwrap();
        let report = OptimizationReport { results: vec![result] };

        let json = report_to_json(&report).unwrap();
        assert_all_numbers_finite(&json);
        let text = serde_json::to_string(&json).unwrap();
        prop_assert!(!text.contains("NaN") && !text.contains("Infinity"));

        let mut job = Job::new("prop");
        job.start().unwrap();
        job.succeed(report).unwrap();
        assert_all_numbers_finite(&job.status().to_json().unwrap());
    }
}
