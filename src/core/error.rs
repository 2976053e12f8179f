//! Error handling and error types for the inverse design engine.
//!
//! Every fallible operation in the crate returns [`Result`]. Errors are
//! classified by [`InverseDesignError::category`] for logging. The trainer and
//! the search runner skip a failing model kind or repetition either way, and
//! [`InverseDesignError::is_recoverable`] decides whether the skip is logged as
//! a warning or as an error.

use std::io;
use thiserror::Error;

/// Main error type for the inverse design engine.
#[derive(Error, Debug)]
pub enum InverseDesignError {
    /// Configuration and parameter errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Request validation errors (missing fields, malformed rows)
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Dataset construction errors
    #[error("Dataset error: {message}")]
    Dataset { message: String },

    /// Surrogate model fitting errors
    #[error("Training error: {message}")]
    Training { message: String },

    /// Surrogate model prediction errors
    #[error("Prediction error: {message}")]
    Prediction { message: String },

    /// Swarm search errors
    #[error("Optimization error: {message}")]
    Optimization { message: String },

    /// Numerical computation errors (overflow, NaN)
    #[error("Numerical error: {message}")]
    Numerical { message: String },

    /// Invalid job state transition
    #[error("Job state error: cannot move from {from} to {to}")]
    JobState { from: String, to: String },

    /// File I/O errors
    #[error("I/O error: {source}")]
    IO {
        #[from]
        source: io::Error,
    },

    /// JSON serialization errors
    #[error("JSON error: {source}")]
    Json {
        #[from]
        source: serde_json::Error,
    },

    /// Invalid input parameters
    #[error("Invalid parameter: {parameter} = {value}, {reason}")]
    InvalidParameter {
        parameter: String,
        value: String,
        reason: String,
    },

    /// Dimension mismatch errors
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: String, actual: String },
}

/// Type alias for Results using InverseDesignError
pub type Result<T> = std::result::Result<T, InverseDesignError>;

impl InverseDesignError {
    /// Create a configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        InverseDesignError::Config {
            message: message.into(),
        }
    }

    /// Create a request validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        InverseDesignError::Validation {
            message: message.into(),
        }
    }

    /// Create a dataset error
    pub fn dataset<S: Into<String>>(message: S) -> Self {
        InverseDesignError::Dataset {
            message: message.into(),
        }
    }

    /// Create a training error
    pub fn training<S: Into<String>>(message: S) -> Self {
        InverseDesignError::Training {
            message: message.into(),
        }
    }

    /// Create a prediction error
    pub fn prediction<S: Into<String>>(message: S) -> Self {
        InverseDesignError::Prediction {
            message: message.into(),
        }
    }

    /// Create an optimization error
    pub fn optimization<S: Into<String>>(message: S) -> Self {
        InverseDesignError::Optimization {
            message: message.into(),
        }
    }

    /// Create a numerical error
    pub fn numerical<S: Into<String>>(message: S) -> Self {
        InverseDesignError::Numerical {
            message: message.into(),
        }
    }

    /// Create a job state transition error
    pub fn job_state<F, T>(from: F, to: T) -> Self
    where
        F: Into<String>,
        T: Into<String>,
    {
        InverseDesignError::JobState {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter<P, V, R>(parameter: P, value: V, reason: R) -> Self
    where
        P: Into<String>,
        V: Into<String>,
        R: Into<String>,
    {
        InverseDesignError::InvalidParameter {
            parameter: parameter.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a dimension mismatch error
    pub fn dimension_mismatch<E, A>(expected: E, actual: A) -> Self
    where
        E: Into<String>,
        A: Into<String>,
    {
        InverseDesignError::DimensionMismatch {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Whether the failure is expected to stay local to one model kind or one
    /// repetition.
    ///
    /// Training, prediction, optimization, numerical and shape failures are.
    /// Anything else points at a broken request or environment.
    pub fn is_recoverable(&self) -> bool {
        match self {
            InverseDesignError::Config { .. } => false,
            InverseDesignError::Validation { .. } => false,
            InverseDesignError::Dataset { .. } => false,
            InverseDesignError::Training { .. } => true,
            InverseDesignError::Prediction { .. } => true,
            InverseDesignError::Optimization { .. } => true,
            InverseDesignError::Numerical { .. } => true,
            InverseDesignError::JobState { .. } => false,
            InverseDesignError::IO { .. } => false,
            InverseDesignError::Json { .. } => false,
            InverseDesignError::InvalidParameter { .. } => false,
            InverseDesignError::DimensionMismatch { .. } => true,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            InverseDesignError::Config { .. } => "config",
            InverseDesignError::Validation { .. } => "validation",
            InverseDesignError::Dataset { .. } => "dataset",
            InverseDesignError::Training { .. } => "training",
            InverseDesignError::Prediction { .. } => "prediction",
            InverseDesignError::Optimization { .. } => "optimization",
            InverseDesignError::Numerical { .. } => "numerical",
            InverseDesignError::JobState { .. } => "job_state",
            InverseDesignError::IO { .. } => "io",
            InverseDesignError::Json { .. } => "json",
            InverseDesignError::InvalidParameter { .. } => "invalid_parameter",
            InverseDesignError::DimensionMismatch { .. } => "dimension_mismatch",
        }
    }
}

/// Convenience macros for error creation
#[macro_export]
macro_rules! config_error {
    ($msg:expr) => {
        $crate::core::error::InverseDesignError::config($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::InverseDesignError::config(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! validation_error {
    ($msg:expr) => {
        $crate::core::error::InverseDesignError::validation($msg)
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::core::error::InverseDesignError::validation(format!($fmt, $($arg)*))
    };
}

#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            return Err($err.into());
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = InverseDesignError::validation("Features must be a non-empty list");
        assert_eq!(err.category(), "validation");
        assert!(!err.is_recoverable());

        let err = InverseDesignError::training("singular split");
        assert_eq!(err.category(), "training");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_error_macros() {
        let err = config_error!("bad swarm size");
        assert!(matches!(err, InverseDesignError::Config { .. }));

        let err = validation_error!("Feature {} missing in data row {}", "x1", 3);
        assert!(matches!(err, InverseDesignError::Validation { .. }));
        assert!(err.to_string().contains("x1"));

        let check = |n: usize| -> Result<()> {
            ensure!(n > 0, validation_error!("Data must be a non-empty list"));
            Ok(())
        };
        assert!(check(1).is_ok());
        assert!(matches!(check(0), Err(InverseDesignError::Validation { .. })));
    }

    #[test]
    fn test_parameter_errors() {
        let err = InverseDesignError::invalid_parameter("swarm_size", "0", "must be at least 1");
        assert_eq!(err.category(), "invalid_parameter");
        assert!(!err.is_recoverable());
        assert!(err.to_string().contains("swarm_size"));
    }

    #[test]
    fn test_job_state_error_display() {
        let err = InverseDesignError::job_state("SUCCESS", "IN_PROGRESS");
        let msg = err.to_string();
        assert!(msg.contains("SUCCESS"));
        assert!(msg.contains("IN_PROGRESS"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "request.json");
        let err: InverseDesignError = io_err.into();
        assert!(matches!(err, InverseDesignError::IO { .. }));
        assert_eq!(err.category(), "io");
    }
}
