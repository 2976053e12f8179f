//! Default values for the search, the trainer and the bounds policy.

/// Default number of particles per swarm.
pub const DEFAULT_SWARM_SIZE: usize = 30;

/// Default inertia weight applied to the previous particle velocity.
pub const DEFAULT_INERTIA_WEIGHT: f64 = 0.5;

/// Default cognitive coefficient (attraction to the particle's own best).
pub const DEFAULT_COGNITIVE_COEFFICIENT: f64 = 0.5;

/// Default social coefficient (attraction to the swarm's best).
pub const DEFAULT_SOCIAL_COEFFICIENT: f64 = 0.5;

/// Default maximum number of swarm iterations per repetition.
pub const DEFAULT_MAX_ITERATIONS: usize = 50;

/// Default number of independent repetitions per (model, target) pair.
pub const DEFAULT_REPETITIONS_PER_MODEL: usize = 10;

/// Minimum step of the global best before the swarm stops early.
pub const DEFAULT_MIN_STEP: f64 = 1e-8;

/// Minimum objective improvement before the swarm stops early.
pub const DEFAULT_MIN_FUNC: f64 = 1e-8;

/// Seed used for the train/test split and the tree models.
pub const DEFAULT_MODEL_SEED: u64 = 42;

/// Held-out fraction for regular datasets.
pub const DEFAULT_TEST_FRACTION: f64 = 0.2;

/// Datasets with fewer rows than this use the widened test fraction.
pub const SMALL_DATASET_ROWS: usize = 10;

/// Lower limit of the widened test fraction for small datasets.
pub const SMALL_DATASET_MIN_TEST_FRACTION: f64 = 0.1;

/// Number of trees in the random forest surrogate.
pub const DEFAULT_FOREST_TREES: usize = 100;

/// Number of boosting rounds for both boosted surrogates.
pub const DEFAULT_BOOSTING_ROUNDS: usize = 100;

/// Maximum depth of every tree-based surrogate.
pub const DEFAULT_TREE_MAX_DEPTH: usize = 10;

/// Depth of the symmetric trees in the alternative boosted surrogate.
pub const DEFAULT_OBLIVIOUS_DEPTH: usize = 10;

/// Shrinkage of each gradient boosting round (the XGBoost default `eta`).
pub const DEFAULT_BOOSTING_LEARNING_RATE: f64 = 0.3;

/// Shrinkage of each symmetric-tree boosting round.
pub const DEFAULT_OBLIVIOUS_LEARNING_RATE: f64 = 0.1;

/// L2 regularization of leaf values in the symmetric-tree booster.
pub const DEFAULT_OBLIVIOUS_L2: f64 = 3.0;

/// Half-width of the interval used for an all-zero feature.
pub const DEFAULT_ZERO_FALLBACK_HALF_WIDTH: f64 = 1.0;

/// Relative margin placed around a constant non-zero feature.
pub const DEFAULT_CONSTANT_MARGIN_FACTOR: f64 = 0.5;

/// Smallest margin placed around a constant non-zero feature.
pub const DEFAULT_CONSTANT_MIN_MARGIN: f64 = 1.0;

/// Relative padding applied to both ends of a non-degenerate range.
pub const DEFAULT_RANGE_PADDING_FACTOR: f64 = 0.1;

/// Smallest padding applied to both ends of a non-degenerate range.
pub const DEFAULT_RANGE_MIN_PADDING: f64 = 0.1;

/// Half-width of the interval that replaces a pair still invalid after repair.
pub const DEFAULT_REPAIR_HALF_WIDTH: f64 = 1.0;

/// Targets closer to zero than this get an `accuracy_like` score of zero.
pub const ACCURACY_TARGET_EPSILON: f64 = 1e-10;

/// Variance under which a node is treated as pure during tree growth.
pub const PURE_NODE_VARIANCE: f64 = 1e-12;

/// Prefix for environment variable configuration overrides.
pub const ENV_PREFIX: &str = "INVERSE_DESIGN_";
