//! Inertia-weighted particle swarm minimizer.
//!
//! Particles start uniformly inside the bounds with velocities drawn from
//! `[-(ub - lb), ub - lb]`. Each iteration applies
//!
//! ```text
//! v <- ω·v + φp·rp·(p - x) + φg·rg·(g - x)
//! x <- clip(x + v, lb, ub)
//! ```
//!
//! where `p` is a particle's best position, `g` the swarm's best, and `rp`,
//! `rg` are fresh uniform draws per particle and dimension. The search stops
//! after `max_iterations`, or early once an improvement of the swarm's best
//! is smaller than `min_func` in value or `min_step` in position.

use crate::config::OptimizerConfig;
use crate::core::error::{InverseDesignError, Result};

use rand::Rng;

/// Swarm parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwarmParams {
    /// Number of particles
    pub swarm_size: usize,
    /// Inertia weight ω
    pub inertia_weight: f64,
    /// Cognitive coefficient φp
    pub cognitive_coefficient: f64,
    /// Social coefficient φg
    pub social_coefficient: f64,
    /// Iteration limit
    pub max_iterations: usize,
    /// Early-stop tolerance on the swarm best's movement
    pub min_step: f64,
    /// Early-stop tolerance on the swarm best's improvement
    pub min_func: f64,
}

impl From<&OptimizerConfig> for SwarmParams {
    fn from(config: &OptimizerConfig) -> Self {
        SwarmParams {
            swarm_size: config.swarm_size,
            inertia_weight: config.inertia_weight,
            cognitive_coefficient: config.cognitive_coefficient,
            social_coefficient: config.social_coefficient,
            max_iterations: config.max_iterations,
            min_step: config.min_step,
            min_func: config.min_func,
        }
    }
}

impl Default for SwarmParams {
    fn default() -> Self {
        SwarmParams::from(&OptimizerConfig::default())
    }
}

/// Why the swarm stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Iteration limit reached
    MaxIterations,
    /// Swarm best improved by less than `min_func`
    MinFunc,
    /// Swarm best moved less than `min_step`
    MinStep,
}

/// Best position found and its objective value.
#[derive(Debug, Clone, PartialEq)]
pub struct SwarmOutcome {
    /// Best position, inside the bounds
    pub position: Vec<f64>,
    /// Objective value at `position`
    pub value: f64,
    /// Iterations run after initialization
    pub iterations: usize,
    /// Stopping reason
    pub termination: Termination,
}

/// A particle swarm over a box.
#[derive(Debug, Clone)]
pub struct ParticleSwarm<'a> {
    params: SwarmParams,
    lower: &'a [f64],
    upper: &'a [f64],
}

impl<'a> ParticleSwarm<'a> {
    /// Create a swarm over `[lower, upper]`.
    pub fn new(params: SwarmParams, lower: &'a [f64], upper: &'a [f64]) -> Result<Self> {
        if lower.len() != upper.len() {
            return Err(InverseDesignError::dimension_mismatch(
                format!("{} lower bounds", lower.len()),
                format!("{} upper bounds", upper.len()),
            ));
        }
        if lower.is_empty() {
            return Err(InverseDesignError::optimization(
                "Search space has no dimensions",
            ));
        }
        if let Some(i) = (0..lower.len()).find(|&i| !(upper[i] > lower[i])) {
            return Err(InverseDesignError::optimization(format!(
                "Upper bound must exceed lower bound in dimension {}: lb={}, ub={}",
                i, lower[i], upper[i]
            )));
        }
        if params.swarm_size == 0 {
            return Err(InverseDesignError::invalid_parameter(
                "swarm_size",
                "0",
                "must be at least 1",
            ));
        }
        Ok(ParticleSwarm {
            params,
            lower,
            upper,
        })
    }

    /// Minimize `objective`. Non-finite objective values count as +∞.
    pub fn minimize<F, R>(&self, mut objective: F, rng: &mut R) -> Result<SwarmOutcome>
    where
        F: FnMut(&[f64]) -> f64,
        R: Rng,
    {
        let dims = self.lower.len();
        let size = self.params.swarm_size;
        let span: Vec<f64> = self
            .lower
            .iter()
            .zip(self.upper)
            .map(|(lo, hi)| hi - lo)
            .collect();

        let mut evaluate = |x: &[f64]| {
            let value = objective(x);
            if value.is_nan() {
                f64::INFINITY
            } else {
                value
            }
        };

        let mut positions: Vec<Vec<f64>> = (0..size)
            .map(|_| {
                (0..dims)
                    .map(|d| self.lower[d] + rng.gen::<f64>() * span[d])
                    .collect()
            })
            .collect();
        let mut velocities: Vec<Vec<f64>> = (0..size)
            .map(|_| {
                (0..dims)
                    .map(|d| -span[d] + rng.gen::<f64>() * 2.0 * span[d])
                    .collect()
            })
            .collect();

        let mut best_values: Vec<f64> = positions.iter().map(|x| evaluate(x)).collect();
        let mut best_positions = positions.clone();

        let first = argmin(&best_values);
        let mut global_value = best_values[first];
        let mut global_position = best_positions[first].clone();

        for iteration in 1..=self.params.max_iterations {
            for i in 0..size {
                for d in 0..dims {
                    let rp: f64 = rng.gen();
                    let rg: f64 = rng.gen();
                    velocities[i][d] = self.params.inertia_weight * velocities[i][d]
                        + self.params.cognitive_coefficient
                            * rp
                            * (best_positions[i][d] - positions[i][d])
                        + self.params.social_coefficient
                            * rg
                            * (global_position[d] - positions[i][d]);
                    positions[i][d] =
                        (positions[i][d] + velocities[i][d]).clamp(self.lower[d], self.upper[d]);
                }

                let value = evaluate(&positions[i]);
                if value < best_values[i] {
                    best_values[i] = value;
                    best_positions[i].clone_from(&positions[i]);
                }
            }

            let leader = argmin(&best_values);
            if best_values[leader] < global_value {
                let step = euclidean(&global_position, &best_positions[leader]);
                let improvement = (global_value - best_values[leader]).abs();
                global_value = best_values[leader];
                global_position.clone_from(&best_positions[leader]);

                let termination = if improvement <= self.params.min_func {
                    Some(Termination::MinFunc)
                } else if step <= self.params.min_step {
                    Some(Termination::MinStep)
                } else {
                    None
                };
                if let Some(termination) = termination {
                    return Ok(self.outcome(global_position, global_value, iteration, termination));
                }
            }
        }

        Ok(self.outcome(
            global_position,
            global_value,
            self.params.max_iterations,
            Termination::MaxIterations,
        ))
    }

    fn outcome(
        &self,
        position: Vec<f64>,
        value: f64,
        iterations: usize,
        termination: Termination,
    ) -> SwarmOutcome {
        log::trace!(
            "Swarm stopped after {} iteration(s) ({:?}), best value {}",
            iterations,
            termination,
            value
        );
        SwarmOutcome {
            position,
            value,
            iterations,
            termination,
        }
    }
}

/// Index of the smallest value; the first one wins ties.
fn argmin(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, &value) in values.iter().enumerate() {
        if value < values[best] {
            best = i;
        }
    }
    best
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt()
}
