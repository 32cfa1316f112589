//! Regression metrics of predicted vs true hull distance (MAE, RMSE, R²).
//!
//! Reported next to the discovery metrics so a model's ranking quality can be
//! read against its raw energy accuracy.

use serde::{Deserialize, Serialize};

use crate::domain::HullDistanceSeries;
use crate::error::CoreResult;

/// Error statistics over the pairs where both values are finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    pub mae: Option<f64>,
    pub rmse: Option<f64>,
    /// Coefficient of determination; undefined when the true values are constant.
    pub r2: Option<f64>,
    pub count: usize,
    /// Pairs dropped because either value was NaN or infinite.
    pub n_skipped: usize,
}

/// Compute MAE, RMSE and R² for aligned true/predicted series.
pub fn regression_metrics(
    e_above_hull_true: &HullDistanceSeries,
    e_above_hull_pred: &HullDistanceSeries,
) -> CoreResult<RegressionMetrics> {
    e_above_hull_true.ensure_aligned(e_above_hull_pred)?;
    Ok(regression_metrics_values(
        e_above_hull_true.values(),
        e_above_hull_pred.values(),
    ))
}

/// Slice form of [`regression_metrics`]; pairs are matched positionally and
/// any surplus in the longer slice is ignored.
pub fn regression_metrics_values(e_true: &[f64], e_pred: &[f64]) -> RegressionMetrics {
    let pairs: Vec<(f64, f64)> = e_true
        .iter()
        .zip(e_pred)
        .filter(|(t, p)| t.is_finite() && p.is_finite())
        .map(|(&t, &p)| (t, p))
        .collect();
    let n_skipped = e_true.len().min(e_pred.len()) - pairs.len();
    let count = pairs.len();
    if count == 0 {
        return RegressionMetrics {
            mae: None,
            rmse: None,
            r2: None,
            count,
            n_skipped,
        };
    }

    let n = count as f64;
    let abs_sum: f64 = pairs.iter().map(|(t, p)| (p - t).abs()).sum();
    let sq_sum: f64 = pairs.iter().map(|(t, p)| (p - t).powi(2)).sum();
    let true_mean = pairs.iter().map(|(t, _)| t).sum::<f64>() / n;
    let total_ss: f64 = pairs.iter().map(|(t, _)| (t - true_mean).powi(2)).sum();

    RegressionMetrics {
        mae: Some(abs_sum / n),
        rmse: Some((sq_sum / n).sqrt()),
        r2: if total_ss > 0.0 {
            Some(1.0 - sq_sum / total_ss)
        } else {
            None
        },
        count,
        n_skipped,
    }
}
