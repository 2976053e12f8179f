//! Feature-space bounds for the swarm search.
//!
//! Bounds are derived from the observed per-feature minimum and maximum and
//! then repaired so that every interval is non-empty and finite. The repair
//! never fails: malformed input produces a usable, if arbitrary, interval.

use ndarray::ArrayView2;
use serde::{Deserialize, Serialize};

use crate::core::constants::*;
use crate::core::error::{InverseDesignError, Result};

/// Tunable constants of the bounds derivation and repair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundsPolicy {
    /// Half-width of the symmetric interval used for an all-zero feature
    pub zero_fallback_half_width: f64,
    /// Margin around a constant feature, relative to its magnitude
    pub constant_margin_factor: f64,
    /// Smallest margin around a constant feature
    pub constant_min_margin: f64,
    /// Padding on each end of a non-degenerate range, relative to the range
    pub range_padding_factor: f64,
    /// Smallest padding on each end of a non-degenerate range
    pub range_min_padding: f64,
    /// Half-width of the interval that replaces a pair still invalid after repair
    pub repair_half_width: f64,
}

impl Default for BoundsPolicy {
    fn default() -> Self {
        BoundsPolicy {
            zero_fallback_half_width: DEFAULT_ZERO_FALLBACK_HALF_WIDTH,
            constant_margin_factor: DEFAULT_CONSTANT_MARGIN_FACTOR,
            constant_min_margin: DEFAULT_CONSTANT_MIN_MARGIN,
            range_padding_factor: DEFAULT_RANGE_PADDING_FACTOR,
            range_min_padding: DEFAULT_RANGE_MIN_PADDING,
            repair_half_width: DEFAULT_REPAIR_HALF_WIDTH,
        }
    }
}

impl BoundsPolicy {
    /// Validate the policy constants.
    pub fn validate(&self) -> Result<()> {
        let strictly_positive = [
            ("zero_fallback_half_width", self.zero_fallback_half_width),
            ("constant_min_margin", self.constant_min_margin),
            ("range_min_padding", self.range_min_padding),
            ("repair_half_width", self.repair_half_width),
        ];
        for (name, value) in strictly_positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(InverseDesignError::invalid_parameter(
                    name,
                    value.to_string(),
                    "must be finite and greater than 0",
                ));
            }
        }

        let non_negative = [
            ("constant_margin_factor", self.constant_margin_factor),
            ("range_padding_factor", self.range_padding_factor),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(InverseDesignError::invalid_parameter(
                    name,
                    value.to_string(),
                    "must be finite and non-negative",
                ));
            }
        }
        Ok(())
    }

    /// Interval for a feature whose observed minimum equals its maximum.
    fn constant_interval(&self, value: f64) -> (f64, f64) {
        if value == 0.0 {
            return (
                -self.zero_fallback_half_width,
                self.zero_fallback_half_width,
            );
        }
        let margin = self
            .constant_min_margin
            .max(value.abs() * self.constant_margin_factor);
        (value - margin, value + margin)
    }

    /// Interval for a feature with a genuine observed range.
    fn padded_interval(&self, min: f64, max: f64) -> (f64, f64) {
        let padding = self
            .range_min_padding
            .max((max - min) * self.range_padding_factor);
        (min - padding, max + padding)
    }
}

/// Ordered feature names paired with their search interval.
///
/// Invariant: `upper[i] > lower[i]` and both are finite for every feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpace {
    names: Vec<String>,
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl FeatureSpace {
    /// Derive and repair bounds from the training feature matrix.
    pub fn from_data(
        names: &[String],
        features: ArrayView2<'_, f64>,
        policy: &BoundsPolicy,
    ) -> Result<Self> {
        if names.len() != features.ncols() {
            return Err(InverseDesignError::dimension_mismatch(
                format!("{} feature names", features.ncols()),
                names.len().to_string(),
            ));
        }
        let (mut lower, mut upper) = derive_bounds(features, policy);
        let repaired = repair_bounds(&mut lower, &mut upper, policy);
        if repaired > 0 {
            log::warn!("Repaired {} invalid search interval(s) after derivation", repaired);
        }
        log::debug!("Search bounds - lower: {:?}", lower);
        log::debug!("Search bounds - upper: {:?}", upper);

        Ok(FeatureSpace {
            names: names.to_vec(),
            lower,
            upper,
        })
    }

    /// Use caller-supplied bounds, skipping derivation.
    ///
    /// Only the final repair pass runs, so already-valid overrides are kept
    /// exactly as given.
    pub fn from_overrides(
        names: &[String],
        lower: &[f64],
        upper: &[f64],
        policy: &BoundsPolicy,
    ) -> Result<Self> {
        if lower.len() != names.len() || upper.len() != names.len() {
            return Err(InverseDesignError::validation(format!(
                "Bounds overrides must have one entry per feature: {} features, {} lower, {} upper",
                names.len(),
                lower.len(),
                upper.len()
            )));
        }
        let mut lower = lower.to_vec();
        let mut upper = upper.to_vec();
        let repaired = repair_bounds(&mut lower, &mut upper, policy);
        if repaired > 0 {
            log::warn!("Repaired {} invalid search interval(s) in bounds overrides", repaired);
        }

        Ok(FeatureSpace {
            names: names.to_vec(),
            lower,
            upper,
        })
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the space has no features.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Feature names in search order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Lower bounds in search order.
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// Upper bounds in search order.
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// `(lower, upper)` for one feature.
    pub fn interval(&self, index: usize) -> Option<(f64, f64)> {
        Some((*self.lower.get(index)?, *self.upper.get(index)?))
    }

    /// Whether `point` lies inside the box (inclusive).
    pub fn contains(&self, point: &[f64]) -> bool {
        point.len() == self.len()
            && point
                .iter()
                .zip(self.lower.iter().zip(&self.upper))
                .all(|(&x, (&lo, &hi))| x >= lo && x <= hi)
    }
}

/// Derive per-feature intervals from observed minima and maxima.
///
/// Constant features get a margin around their value, other features are
/// padded at both ends. NaN entries are ignored when computing the extremes.
pub fn derive_bounds(features: ArrayView2<'_, f64>, policy: &BoundsPolicy) -> (Vec<f64>, Vec<f64>) {
    let mut lower = Vec::with_capacity(features.ncols());
    let mut upper = Vec::with_capacity(features.ncols());

    for column in features.columns() {
        let (min, max) = column
            .iter()
            .filter(|v| !v.is_nan())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });

        let (lo, hi) = if min == max {
            policy.constant_interval(min)
        } else {
            policy.padded_interval(min, max)
        };
        lower.push(lo);
        upper.push(hi);
    }

    (lower, upper)
}

/// Replace every interval that is empty, inverted or non-finite.
///
/// The replacement is centred on the pair's midpoint, or on zero when the
/// midpoint is not finite. Valid pairs are left untouched, so the pass is
/// idempotent. Returns the number of intervals replaced.
pub fn repair_bounds(lower: &mut [f64], upper: &mut [f64], policy: &BoundsPolicy) -> usize {
    let mut repaired = 0;
    for (lo, hi) in lower.iter_mut().zip(upper.iter_mut()) {
        if lo.is_finite() && hi.is_finite() && *hi > *lo {
            continue;
        }
        let midpoint = (*lo + *hi) / 2.0;
        let center = if midpoint.is_finite() { midpoint } else { 0.0 };
        let (fixed_lo, fixed_hi) = (
            center - policy.repair_half_width,
            center + policy.repair_half_width,
        );
        log::warn!(
            "Invalid bounds lb={}, ub={}; using lb={}, ub={}",
            lo,
            hi,
            fixed_lo,
            fixed_hi
        );
        *lo = fixed_lo;
        *hi = fixed_hi;
        repaired += 1;
    }
    repaired
}
