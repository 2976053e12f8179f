//! Held-out evaluation metrics for the regression surrogates.

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// Regression evaluation metrics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Root Mean Square Error
    pub rmse: f64,
    /// Mean Absolute Error
    pub mae: f64,
    /// R-squared (coefficient of determination)
    pub r2: f64,
    /// Mean Squared Error
    pub mse: f64,
}

/// Evaluate regression metrics.
///
/// `r2` is NaN when fewer than two values are scored. With constant true
/// values it is 1 for a perfect fit and 0 otherwise. Empty input yields NaN
/// everywhere; callers coerce non-finite metrics.
pub fn evaluate_regression(
    predictions: &ArrayView1<'_, f64>,
    true_values: &ArrayView1<'_, f64>,
) -> RegressionMetrics {
    let n = predictions.len().min(true_values.len());
    if n == 0 {
        return RegressionMetrics {
            rmse: f64::NAN,
            mae: f64::NAN,
            r2: f64::NAN,
            mse: f64::NAN,
        };
    }
    let count = n as f64;

    let mut sum_squared_error = 0.0;
    let mut sum_absolute_error = 0.0;
    for (&pred, &true_val) in predictions.iter().zip(true_values.iter()) {
        let error = pred - true_val;
        sum_squared_error += error * error;
        sum_absolute_error += error.abs();
    }

    let mse = sum_squared_error / count;
    let rmse = mse.sqrt();
    let mae = sum_absolute_error / count;

    let true_mean = true_values.iter().take(n).sum::<f64>() / count;
    let total_sum_squares: f64 = true_values
        .iter()
        .take(n)
        .map(|&t| (t - true_mean) * (t - true_mean))
        .sum();

    let r2 = if n < 2 {
        f64::NAN
    } else if total_sum_squares > 0.0 {
        1.0 - sum_squared_error / total_sum_squares
    } else if sum_squared_error == 0.0 {
        1.0
    } else {
        0.0
    };

    RegressionMetrics { rmse, mae, r2, mse }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::array;

    #[test]
    fn test_perfect_predictions() {
        let y = array![1.0, 2.0, 3.0];
        let metrics = evaluate_regression(&y.view(), &y.view());
        assert_eq!(metrics.mse, 0.0);
        assert_eq!(metrics.r2, 1.0);
    }

    #[test]
    fn test_known_values() {
        let pred = array![2.5, 0.0, 2.0, 8.0];
        let truth = array![3.0, -0.5, 2.0, 7.0];
        let metrics = evaluate_regression(&pred.view(), &truth.view());
        assert_abs_diff_eq!(metrics.mse, 0.375, epsilon = 1e-12);
        assert_abs_diff_eq!(metrics.mae, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(metrics.r2, 0.948_608_137_044_967_9, epsilon = 1e-12);
    }

    #[test]
    fn test_single_sample_r2_is_nan() {
        let metrics = evaluate_regression(&array![1.0].view(), &array![2.0].view());
        assert!(metrics.r2.is_nan());
        assert_eq!(metrics.mse, 1.0);
    }

    #[test]
    fn test_constant_truth() {
        let truth = array![4.0, 4.0];
        let metrics = evaluate_regression(&array![4.0, 5.0].view(), &truth.view());
        assert_eq!(metrics.r2, 0.0);
    }
}
