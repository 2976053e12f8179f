//! Training data handling.
//!
//! Turns request records into a dense [`Dataset`], splits it into train and
//! test rows, and standardizes features.

pub mod dataset;
pub mod partition;
pub mod preprocessing;

pub use dataset::{validate_records, Dataset, Record};
pub use partition::{test_fraction, TrainTestSplit};
pub use preprocessing::StandardScaler;
