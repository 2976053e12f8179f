//! Train/test partitioning.
//!
//! The split is a seeded shuffle followed by a cut, with the held-out share
//! widened on small datasets so that at least one row is always evaluated.

use crate::core::constants::*;
use crate::core::error::{InverseDesignError, Result};
use crate::core::types::SampleIndex;
use crate::dataset::Dataset;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Row indices of a train/test split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    /// Rows used for fitting
    pub train_indices: Vec<SampleIndex>,
    /// Rows held out for evaluation
    pub test_indices: Vec<SampleIndex>,
}

/// Held-out fraction for a dataset of `num_data` rows.
///
/// Datasets under [`SMALL_DATASET_ROWS`] rows use `max(0.1, 1/n)`.
pub fn test_fraction(num_data: usize) -> f64 {
    if num_data == 0 {
        return DEFAULT_TEST_FRACTION;
    }
    if num_data < SMALL_DATASET_ROWS {
        SMALL_DATASET_MIN_TEST_FRACTION.max(1.0 / num_data as f64)
    } else {
        DEFAULT_TEST_FRACTION
    }
}

impl TrainTestSplit {
    /// Shuffle `num_data` row indices with `seed` and cut off the held-out share.
    ///
    /// At least one row is held out and at least one is kept for training. A
    /// single-row dataset is used for both.
    pub fn new(num_data: usize, seed: u64) -> Result<Self> {
        if num_data == 0 {
            return Err(InverseDesignError::dataset("Cannot split an empty dataset"));
        }
        if num_data == 1 {
            log::warn!("Single-row dataset: training and evaluating on the same row");
            return Ok(TrainTestSplit {
                train_indices: vec![0],
                test_indices: vec![0],
            });
        }

        let fraction = test_fraction(num_data);
        let num_test = ((fraction * num_data as f64).ceil() as usize).clamp(1, num_data - 1);

        let mut indices: Vec<SampleIndex> = (0..num_data).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);

        let test_indices = indices[..num_test].to_vec();
        let train_indices = indices[num_test..].to_vec();

        log::debug!(
            "Split {} rows into {} train / {} test (test fraction {:.3})",
            num_data,
            train_indices.len(),
            test_indices.len(),
            fraction
        );

        Ok(TrainTestSplit {
            train_indices,
            test_indices,
        })
    }

    /// Materialize the split as `(train, test)` datasets.
    pub fn apply(&self, dataset: &Dataset) -> Result<(Dataset, Dataset)> {
        Ok((
            dataset.subset(&self.train_indices)?,
            dataset.subset(&self.test_indices)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fraction_rules() {
        assert_eq!(test_fraction(100), 0.2);
        assert_eq!(test_fraction(10), 0.2);
        assert_eq!(test_fraction(5), 0.2);
        assert_eq!(test_fraction(4), 0.25);
        assert_eq!(test_fraction(9), 1.0 / 9.0);
    }

    #[test]
    fn test_split_sizes() {
        let split = TrainTestSplit::new(100, 42).unwrap();
        assert_eq!(split.test_indices.len(), 20);
        assert_eq!(split.train_indices.len(), 80);

        let split = TrainTestSplit::new(5, 42).unwrap();
        assert_eq!(split.test_indices.len(), 1);
        assert_eq!(split.train_indices.len(), 4);

        let split = TrainTestSplit::new(2, 42).unwrap();
        assert_eq!(split.test_indices.len(), 1);
        assert_eq!(split.train_indices.len(), 1);
    }

    #[test]
    fn test_split_is_a_partition() {
        let split = TrainTestSplit::new(23, 42).unwrap();
        let mut all: Vec<_> = split
            .train_indices
            .iter()
            .chain(&split.test_indices)
            .copied()
            .collect();
        all.sort_unstable();
        assert_eq!(all, (0..23).collect::<Vec<_>>());
    }

    #[test]
    fn test_split_is_deterministic() {
        assert_eq!(
            TrainTestSplit::new(30, 42).unwrap(),
            TrainTestSplit::new(30, 42).unwrap()
        );
    }

    #[test]
    fn test_single_row_split() {
        let split = TrainTestSplit::new(1, 42).unwrap();
        assert_eq!(split.train_indices, vec![0]);
        assert_eq!(split.test_indices, vec![0]);
        assert!(TrainTestSplit::new(0, 42).is_err());
    }
}
