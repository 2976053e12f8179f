//! Optimizer configuration and its builder.
//!
//! [`OptimizerConfig`] carries every knob of the inverse search: the particle
//! swarm parameters, the repetition count, feature standardization, optional
//! bounds overrides and the bounds repair policy. It deserializes from the
//! request vocabulary used by existing clients (`swarmsize`, `omega`, `phip`,
//! `phig`, `maxiter`, `n_solutions`, `lb`, `ub`, `scale_before_fit`).

use crate::bounds::BoundsPolicy;
use crate::config_error;
use crate::core::constants::*;
use crate::core::error::{InverseDesignError, Result};

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration of one inverse optimization request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Number of particles per swarm
    #[serde(alias = "swarmsize")]
    pub swarm_size: usize,
    /// Inertia weight applied to the previous velocity
    #[serde(alias = "omega")]
    pub inertia_weight: f64,
    /// Attraction towards each particle's own best position
    #[serde(alias = "phip")]
    pub cognitive_coefficient: f64,
    /// Attraction towards the swarm's best position
    #[serde(alias = "phig")]
    pub social_coefficient: f64,
    /// Maximum number of swarm iterations per repetition
    #[serde(alias = "maxiter")]
    pub max_iterations: usize,
    /// Independent search repetitions per (model, target) pair
    #[serde(alias = "n_solutions")]
    pub repetitions_per_model: usize,
    /// Standardize features before fitting the surrogates
    #[serde(alias = "scale_before_fit")]
    pub standardize_features: bool,
    /// Explicit lower bounds, one per feature
    #[serde(alias = "lb")]
    pub lower_bounds: Option<Vec<f64>>,
    /// Explicit upper bounds, one per feature
    #[serde(alias = "ub")]
    pub upper_bounds: Option<Vec<f64>>,
    /// Seed for the swarm; `None` draws fresh entropy for every repetition
    pub random_seed: Option<u64>,
    /// Stop when the swarm's best moves less than this while improving
    #[serde(alias = "minstep")]
    pub min_step: f64,
    /// Stop when the swarm's best improves by less than this
    #[serde(alias = "minfunc")]
    pub min_func: f64,
    /// Constants of the bounds derivation and repair
    pub bounds_policy: BoundsPolicy,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig {
            swarm_size: DEFAULT_SWARM_SIZE,
            inertia_weight: DEFAULT_INERTIA_WEIGHT,
            cognitive_coefficient: DEFAULT_COGNITIVE_COEFFICIENT,
            social_coefficient: DEFAULT_SOCIAL_COEFFICIENT,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            repetitions_per_model: DEFAULT_REPETITIONS_PER_MODEL,
            standardize_features: true,
            lower_bounds: None,
            upper_bounds: None,
            random_seed: None,
            min_step: DEFAULT_MIN_STEP,
            min_func: DEFAULT_MIN_FUNC,
            bounds_policy: BoundsPolicy::default(),
        }
    }
}

impl OptimizerConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.swarm_size == 0 {
            return Err(InverseDesignError::invalid_parameter(
                "swarm_size",
                self.swarm_size.to_string(),
                "must be at least 1",
            ));
        }

        if self.max_iterations == 0 {
            return Err(InverseDesignError::invalid_parameter(
                "max_iterations",
                self.max_iterations.to_string(),
                "must be at least 1",
            ));
        }

        if self.repetitions_per_model == 0 {
            return Err(InverseDesignError::invalid_parameter(
                "repetitions_per_model",
                self.repetitions_per_model.to_string(),
                "must be at least 1",
            ));
        }

        let coefficients = [
            ("inertia_weight", self.inertia_weight),
            ("cognitive_coefficient", self.cognitive_coefficient),
            ("social_coefficient", self.social_coefficient),
            ("min_step", self.min_step),
            ("min_func", self.min_func),
        ];
        for (name, value) in coefficients {
            if !value.is_finite() || value < 0.0 {
                return Err(InverseDesignError::invalid_parameter(
                    name,
                    value.to_string(),
                    "must be finite and non-negative",
                ));
            }
        }

        // A lone bound is ignored and both sides are derived from the data.
        if let (Some(lower), Some(upper)) = (&self.lower_bounds, &self.upper_bounds) {
            if lower.len() != upper.len() {
                return Err(InverseDesignError::invalid_parameter(
                    "lower_bounds",
                    format!("{} entries", lower.len()),
                    format!("must match upper_bounds ({} entries)", upper.len()),
                ));
            }
            if let Some(bad) = lower.iter().chain(upper).find(|v| !v.is_finite()) {
                return Err(InverseDesignError::invalid_parameter(
                    "bounds",
                    bad.to_string(),
                    "bounds overrides must be finite",
                ));
            }
        }

        self.bounds_policy.validate()
    }

    /// Whether explicit bounds replace the data-derived ones.
    pub fn has_bounds_overrides(&self) -> bool {
        self.lower_bounds.is_some() && self.upper_bounds.is_some()
    }

    /// Load configuration from a `.json` or `.toml` file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            InverseDesignError::config(format!("Failed to read config file: {}", e))
        })?;

        let config: OptimizerConfig = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::from_str(&content).map_err(|e| {
                InverseDesignError::config(format!("Failed to parse JSON config: {}", e))
            })?,
            Some("toml") => toml::from_str(&content).map_err(|e| {
                InverseDesignError::config(format!("Failed to parse TOML config: {}", e))
            })?,
            _ => {
                return Err(InverseDesignError::config(
                    "Unsupported config file format. Use .json or .toml",
                ))
            }
        };

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a `.json` or `.toml` file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let content = match path.extension().and_then(|s| s.to_str()) {
            Some("json") => serde_json::to_string_pretty(self).map_err(|e| {
                InverseDesignError::config(format!("Failed to serialize to JSON: {}", e))
            })?,
            Some("toml") => toml::to_string_pretty(self).map_err(|e| {
                InverseDesignError::config(format!("Failed to serialize to TOML: {}", e))
            })?,
            _ => {
                return Err(InverseDesignError::config(
                    "Unsupported config file format. Use .json or .toml",
                ))
            }
        };

        std::fs::write(path, content).map_err(|e| {
            InverseDesignError::config(format!("Failed to write config file: {}", e))
        })?;

        Ok(())
    }

    /// Apply `INVERSE_DESIGN_*` environment variable overrides
    pub fn apply_environment_overrides(&mut self) -> Result<()> {
        if let Some(val) = env_value("SWARM_SIZE")? {
            self.swarm_size = val;
        }
        if let Some(val) = env_value("INERTIA_WEIGHT")? {
            self.inertia_weight = val;
        }
        if let Some(val) = env_value("COGNITIVE_COEFFICIENT")? {
            self.cognitive_coefficient = val;
        }
        if let Some(val) = env_value("SOCIAL_COEFFICIENT")? {
            self.social_coefficient = val;
        }
        if let Some(val) = env_value("MAX_ITERATIONS")? {
            self.max_iterations = val;
        }
        if let Some(val) = env_value("REPETITIONS")? {
            self.repetitions_per_model = val;
        }
        if let Some(val) = env_value("RANDOM_SEED")? {
            self.random_seed = Some(val);
        }
        if let Some(val) = env_value("STANDARDIZE")? {
            self.standardize_features = val;
        }

        self.validate()
    }

    /// Load the default configuration with environment overrides applied
    pub fn load_from_environment() -> Result<Self> {
        let mut config = Self::default();
        config.apply_environment_overrides()?;
        Ok(config)
    }
}

/// Read and parse `INVERSE_DESIGN_<suffix>` if it is set.
fn env_value<T: std::str::FromStr>(suffix: &str) -> Result<Option<T>> {
    let key = format!("{}{}", ENV_PREFIX, suffix);
    match std::env::var(&key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| config_error!("Invalid {}: {}", key, raw)),
        Err(_) => Ok(None),
    }
}

/// Configuration builder for fluent configuration creation
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: OptimizerConfig,
    validation_errors: Vec<String>,
}

impl ConfigBuilder {
    /// Create a new configuration builder
    pub fn new() -> Self {
        ConfigBuilder {
            config: OptimizerConfig::default(),
            validation_errors: Vec::new(),
        }
    }

    /// Set the number of particles per swarm
    pub fn swarm_size(mut self, size: usize) -> Self {
        if size == 0 {
            self.validation_errors
                .push("swarm_size must be at least 1".to_string());
        }
        self.config.swarm_size = size;
        self
    }

    /// Set the inertia weight
    pub fn inertia_weight(mut self, omega: f64) -> Self {
        self.config.inertia_weight = omega;
        self
    }

    /// Set the cognitive coefficient
    pub fn cognitive_coefficient(mut self, phip: f64) -> Self {
        self.config.cognitive_coefficient = phip;
        self
    }

    /// Set the social coefficient
    pub fn social_coefficient(mut self, phig: f64) -> Self {
        self.config.social_coefficient = phig;
        self
    }

    /// Set the maximum number of swarm iterations
    pub fn max_iterations(mut self, iterations: usize) -> Self {
        if iterations == 0 {
            self.validation_errors
                .push("max_iterations must be at least 1".to_string());
        }
        self.config.max_iterations = iterations;
        self
    }

    /// Set the number of repetitions per model and target
    pub fn repetitions_per_model(mut self, repetitions: usize) -> Self {
        if repetitions == 0 {
            self.validation_errors
                .push("repetitions_per_model must be at least 1".to_string());
        }
        self.config.repetitions_per_model = repetitions;
        self
    }

    /// Enable or disable feature standardization
    pub fn standardize_features(mut self, standardize: bool) -> Self {
        self.config.standardize_features = standardize;
        self
    }

    /// Supply explicit search bounds
    pub fn bounds(mut self, lower: Vec<f64>, upper: Vec<f64>) -> Self {
        self.config.lower_bounds = Some(lower);
        self.config.upper_bounds = Some(upper);
        self
    }

    /// Set the random seed
    pub fn random_seed(mut self, seed: u64) -> Self {
        self.config.random_seed = Some(seed);
        self
    }

    /// Set the early-stopping step tolerance
    pub fn min_step(mut self, min_step: f64) -> Self {
        self.config.min_step = min_step;
        self
    }

    /// Set the early-stopping objective tolerance
    pub fn min_func(mut self, min_func: f64) -> Self {
        self.config.min_func = min_func;
        self
    }

    /// Replace the bounds repair policy
    pub fn bounds_policy(mut self, policy: BoundsPolicy) -> Self {
        self.config.bounds_policy = policy;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<OptimizerConfig> {
        if !self.validation_errors.is_empty() {
            return Err(InverseDesignError::config(format!(
                "Configuration validation failed: {}",
                self.validation_errors.join(", ")
            )));
        }

        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
