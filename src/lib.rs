//! # Inverse Design
//!
//! Swarm-based inverse optimization over an ensemble of regression
//! surrogates: given labeled rows and the target values an analyst wants to
//! reach, find feature vectors the fitted models predict to land close to
//! each target, with per-model evidence to judge which candidate to trust.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use inverse_design::{optimize, ConfigBuilder};
//! use serde_json::json;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let records = (0..20)
//!     .map(|i| {
//!         let x = i as f64;
//!         json!({"Alpha": x, "Beta": 20.0 - x, "Epsilon": 2.0 * x + 1.0})
//!             .as_object()
//!             .cloned()
//!             .unwrap_or_default()
//!     })
//!     .collect();
//!
//! let config = ConfigBuilder::new()
//!     .swarm_size(20)
//!     .max_iterations(30)
//!     .repetitions_per_model(3)
//!     .random_seed(7)
//!     .build()?;
//!
//! let report = optimize(
//!     records,
//!     vec!["Alpha".into(), "Beta".into()],
//!     "Epsilon",
//!     vec![11.0, 25.0],
//!     config,
//! )?;
//!
//! for result in &report.results {
//!     println!(
//!         "target {} -> {} (error {:.4})",
//!         result.target_value, result.best_model, result.best_solution.error
//!     );
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`core`]: error type, model kinds, constants, non-finite handling
//! - [`config`]: swarm and trainer configuration
//! - [`bounds`]: per-feature search intervals and their repair
//! - [`dataset`]: row validation, the train/test split, standardization
//! - [`request`]: the request payload and its validation
//! - [`model`]: regressors, the model registry and the surrogate trainer
//! - [`optimizer`]: objective, particle swarm and repeated search runs
//! - [`orchestrator`]: per-target best selection across models
//! - [`report`]: flattened best-solution rows
//! - [`job`]: job lifecycle and the status payload

pub mod bounds;
pub mod config;
pub mod core;
pub mod dataset;
pub mod job;
pub mod metrics_eval;
pub mod model;
pub mod optimizer;
pub mod orchestrator;
pub mod report;
pub mod request;

pub use crate::bounds::{derive_bounds, repair_bounds, BoundsPolicy, FeatureSpace};
pub use crate::config::{ConfigBuilder, OptimizerConfig};
pub use crate::core::error::{InverseDesignError, Result};
pub use crate::core::types::ModelKind;
pub use crate::dataset::{Dataset, Record, StandardScaler, TrainTestSplit};
pub use crate::job::{run_job, Job, JobState, JobStatus};
pub use crate::metrics_eval::{evaluate_regression, RegressionMetrics};
pub use crate::model::{
    train_surrogates, ModelRegistry, Regressor, RegressorFactory, SurrogateSet, TrainedSurrogate,
};
pub use crate::optimizer::{
    FeatureAssignment, ParticleSwarm, SearchRunRecord, SearchRunner, SwarmOutcome, SwarmParams,
    Termination,
};
pub use crate::orchestrator::{
    optimize, optimize_with_registry, BestSolution, ComparisonTable, InverseOptimizer,
    OptimizationReport, TargetResult,
};
pub use crate::report::{best_solution_rows, report_to_json, BestSolutionRow};
pub use crate::request::OptimizationRequest;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize logging.
pub fn init() -> Result<()> {
    crate::core::initialize_core()
}
