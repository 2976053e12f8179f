//! Inverting surrogates with particle swarm search.
//!
//! - [`objective`]: absolute prediction error for a candidate vector
//! - [`swarm`]: the particle swarm minimizer
//! - [`runner`]: repeated searches per (surrogate, target) and their records

pub mod objective;
pub mod runner;
pub mod swarm;

pub use objective::{absolute_error, Objective};
pub use runner::{
    accuracy_like, repetition_seed, FeatureAssignment, ModelRuns, SearchRunRecord, SearchRunner,
};
pub use swarm::{ParticleSwarm, SwarmOutcome, SwarmParams, Termination};
