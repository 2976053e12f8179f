//! Repeated swarm searches for one (surrogate, target) pair.

use crate::bounds::FeatureSpace;
use crate::config::OptimizerConfig;
use crate::core::constants::ACCURACY_TARGET_EPSILON;
use crate::core::error::{InverseDesignError, Result};
use crate::core::numeric::{finite_or_infinity, finite_or_null, finite_or_zero, finite_vec_or_null};
use crate::core::types::ModelKind;
use crate::model::{SurrogateSet, TrainedSurrogate};
use crate::optimizer::objective::Objective;
use crate::optimizer::swarm::{ParticleSwarm, SwarmParams};

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::time::Instant;

/// A feature vector keyed by feature name, serialized in feature order.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureAssignment {
    names: Vec<String>,
    values: Vec<f64>,
}

impl FeatureAssignment {
    /// Pair names with values.
    pub fn new(names: Vec<String>, values: Vec<f64>) -> Result<Self> {
        if names.len() != values.len() {
            return Err(InverseDesignError::dimension_mismatch(
                format!("{} feature names", names.len()),
                format!("{} values", values.len()),
            ));
        }
        Ok(FeatureAssignment { names, values })
    }

    /// Value of a feature by name.
    pub fn get(&self, name: &str) -> Option<f64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.values[i])
    }

    /// Values in feature order.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Feature names in order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// `(name, value)` pairs in feature order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.values.iter().copied())
    }
}

impl Serialize for FeatureAssignment {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.names.len()))?;
        for (name, value) in self.iter() {
            if value.is_finite() {
                map.serialize_entry(name, &value)?;
            } else {
                map.serialize_entry(name, &Option::<f64>::None)?;
            }
        }
        map.end()
    }
}

/// Outcome of one swarm repetition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRunRecord {
    /// Optimized feature vector, raw units
    pub solution: FeatureAssignment,
    /// Surrogate prediction at `solution`
    #[serde(serialize_with = "finite_or_null")]
    pub prediction: f64,
    /// `|prediction - target|`, +∞ when not finite
    #[serde(serialize_with = "finite_or_null")]
    pub error: f64,
    /// Wall-clock seconds spent in the swarm
    #[serde(serialize_with = "finite_or_null")]
    pub runtime: f64,
    /// Objective value the swarm converged to
    #[serde(serialize_with = "finite_or_null")]
    pub fopt: f64,
    /// Held-out MSE of the producing surrogate
    #[serde(serialize_with = "finite_or_null")]
    pub mse: f64,
    /// Held-out R² of the producing surrogate
    #[serde(serialize_with = "finite_or_null")]
    pub r2: f64,
    /// `max(0, 1 - error/|target|)`, 0 for a near-zero target
    #[serde(serialize_with = "finite_or_null")]
    pub accuracy_like: f64,
    /// Held-out predictions of the producing surrogate
    #[serde(serialize_with = "finite_vec_or_null")]
    pub y_pred_on_test: Vec<f64>,
}

/// Bounded relative-accuracy score.
pub fn accuracy_like(error: f64, target: f64) -> f64 {
    if target.abs() > ACCURACY_TARGET_EPSILON {
        (1.0 - error / target.abs()).max(0.0)
    } else {
        0.0
    }
}

/// Seed for one repetition, derived from the configured seed and the
/// repetition's position in the request.
pub fn repetition_seed(base: u64, target_index: usize, model_index: usize, repetition: usize) -> u64 {
    [target_index, model_index, repetition]
        .iter()
        .fold(splitmix64(base), |acc, &part| {
            splitmix64(acc ^ (part as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15))
        })
}

fn splitmix64(x: u64) -> u64 {
    let mut z = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Runs the configured number of swarm repetitions against one surrogate.
#[derive(Debug)]
pub struct SearchRunner<'a> {
    surrogates: &'a SurrogateSet,
    space: &'a FeatureSpace,
    config: &'a OptimizerConfig,
}

impl<'a> SearchRunner<'a> {
    /// Create a runner over a trained set and a search space.
    pub fn new(
        surrogates: &'a SurrogateSet,
        space: &'a FeatureSpace,
        config: &'a OptimizerConfig,
    ) -> Self {
        SearchRunner {
            surrogates,
            space,
            config,
        }
    }

    /// Run every repetition for `surrogate` and `target`.
    ///
    /// Failed repetitions are logged and skipped, so fewer than
    /// `repetitions_per_model` records may come back.
    pub fn run(
        &self,
        surrogate: &TrainedSurrogate,
        model_index: usize,
        target: f64,
        target_index: usize,
    ) -> Vec<SearchRunRecord> {
        let mut records = Vec::with_capacity(self.config.repetitions_per_model);
        for repetition in 0..self.config.repetitions_per_model {
            let mut rng = match self.config.random_seed {
                Some(seed) => StdRng::seed_from_u64(repetition_seed(
                    seed,
                    target_index,
                    model_index,
                    repetition,
                )),
                None => StdRng::from_entropy(),
            };

            match self.run_once(surrogate, target, &mut rng) {
                Ok(record) => {
                    log::debug!(
                        "{} run {} for target {}: prediction={:.6}, error={:.6}, {:.3}s",
                        surrogate.kind(),
                        repetition,
                        target,
                        record.prediction,
                        record.error,
                        record.runtime
                    );
                    records.push(record);
                }
                Err(e) if e.is_recoverable() => {
                    log::warn!(
                        "Optimization failed for {} (run {}): {}",
                        surrogate.kind(),
                        repetition,
                        e
                    );
                }
                Err(e) => {
                    log::error!(
                        "Optimization for {} (run {}) hit a {} error: {}",
                        surrogate.kind(),
                        repetition,
                        e.category(),
                        e
                    );
                }
            }
        }
        records
    }

    /// One swarm search followed by re-prediction at the optimum.
    pub fn run_once(
        &self,
        surrogate: &TrainedSurrogate,
        target: f64,
        rng: &mut StdRng,
    ) -> Result<SearchRunRecord> {
        let objective = Objective::new(self.surrogates, surrogate, target);
        let swarm = ParticleSwarm::new(
            SwarmParams::from(self.config),
            self.space.lower(),
            self.space.upper(),
        )?;

        let start = Instant::now();
        let outcome = swarm.minimize(|x| objective.evaluate(x), rng)?;
        let runtime = start.elapsed().as_secs_f64();

        let prediction = objective.predict(&outcome.position)?;
        if !prediction.is_finite() {
            return Err(InverseDesignError::numerical(format!(
                "{} predicted a non-finite value at the optimum",
                surrogate.kind()
            )));
        }
        let error = (prediction - target).abs();

        let solution = FeatureAssignment::new(
            self.space.names().to_vec(),
            outcome.position.iter().map(|&v| finite_or_zero(v)).collect(),
        )?;

        Ok(SearchRunRecord {
            solution,
            prediction: finite_or_zero(prediction),
            error: finite_or_infinity(error),
            runtime: finite_or_zero(runtime),
            fopt: finite_or_zero(outcome.value),
            mse: surrogate.mse(),
            r2: finite_or_zero(surrogate.r2()),
            accuracy_like: finite_or_zero(accuracy_like(error, target)),
            y_pred_on_test: surrogate.y_pred_on_test().to_vec(),
        })
    }
}

/// Kind and records of one surrogate, in trained order.
pub type ModelRuns = (ModelKind, Vec<SearchRunRecord>);
