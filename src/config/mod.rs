//! Configuration management for the inverse optimizer.
//!
//! Settings can come from defaults, a `.json`/`.toml` file, the builder, or
//! `INVERSE_DESIGN_*` environment variables. Every path ends in
//! [`OptimizerConfig::validate`].

pub mod core;

pub use self::core::{ConfigBuilder, OptimizerConfig};

/// Default file name for a persisted optimizer configuration.
pub const DEFAULT_CONFIG_FILE: &str = "inverse_design.toml";

/// Where a configuration was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Built-in defaults
    Default,
    /// A configuration file
    File(String),
    /// Environment variables
    Environment,
    /// An incoming optimization request
    Request,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "defaults"),
            ConfigSource::File(path) => write!(f, "file '{}'", path),
            ConfigSource::Environment => write!(f, "environment"),
            ConfigSource::Request => write!(f, "request"),
        }
    }
}
