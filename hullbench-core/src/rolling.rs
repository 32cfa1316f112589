//! Rolling error profile: windowed MAE of the predicted hull distance as a
//! function of the true hull distance.
//!
//! Window membership is decided by the true hull distance only; the absolute
//! prediction error `|pred - true|` is what gets averaged. The curve therefore
//! shows how accurate a model is near (and away from) the hull, which is where
//! misclassification risk concentrates.

use serde::{Deserialize, Serialize};

use crate::domain::HullDistanceSeries;
use crate::error::{CoreError, CoreResult};
use crate::stats::{mean, standard_error};

/// Window geometry for [`rolling_mae`], in eV/atom.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RollingWindow {
    /// Each bin covers `(center - half_window, center + half_window]`.
    pub half_window: f64,
    /// Spacing between consecutive bin centers.
    pub bin_width: f64,
    /// `[start, end)` range of bin centers.
    pub x_range: (f64, f64),
}

impl Default for RollingWindow {
    fn default() -> Self {
        Self {
            half_window: 0.02,
            bin_width: 0.002,
            x_range: (-0.2, 0.3),
        }
    }
}

impl RollingWindow {
    pub fn validate(&self) -> CoreResult<()> {
        let (lo, hi) = self.x_range;
        if !(self.half_window.is_finite() && self.half_window > 0.0) {
            return Err(CoreError::InvalidParameter(format!(
                "half_window must be positive and finite, got {}",
                self.half_window
            )));
        }
        if !(self.bin_width.is_finite() && self.bin_width > 0.0) {
            return Err(CoreError::InvalidParameter(format!(
                "bin_width must be positive and finite, got {}",
                self.bin_width
            )));
        }
        if !(lo.is_finite() && hi.is_finite() && lo < hi) {
            return Err(CoreError::InvalidParameter(format!(
                "x_range must be finite with start < end, got ({lo}, {hi})"
            )));
        }
        Ok(())
    }

    /// Bin centers `start + i * bin_width` for every center below `end`.
    pub fn bin_centers(&self) -> Vec<f64> {
        let (lo, hi) = self.x_range;
        // Tolerance keeps e.g. 0.5 / 0.002 from yielding an extra bin at `end`.
        let n = ((hi - lo) / self.bin_width - 1e-9).ceil().max(0.0) as usize;
        (0..n).map(|i| lo + i as f64 * self.bin_width).collect()
    }
}

/// One bin of the rolling profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RollingPoint {
    pub bin_center: f64,
    /// Mean absolute error of the window members; `None` for an empty window.
    pub mae: Option<f64>,
    /// Standard error of that mean; `None` for an empty window.
    pub sem: Option<f64>,
    pub count: usize,
}

/// Rolling MAE and SEM of `pred` vs `true`, windowed on `true`.
pub fn rolling_mae(
    e_above_hull_true: &HullDistanceSeries,
    e_above_hull_pred: &HullDistanceSeries,
    window: &RollingWindow,
) -> CoreResult<Vec<RollingPoint>> {
    e_above_hull_true.ensure_aligned(e_above_hull_pred)?;
    rolling_mae_values(
        e_above_hull_true.values(),
        e_above_hull_pred.values(),
        window,
    )
}

/// Slice form of [`rolling_mae`].
///
/// Pairs with a non-finite value never enter any window. The samples are
/// sorted once by true hull distance and both window edges are advanced
/// monotonically as the bin center moves right.
pub fn rolling_mae_values(
    e_true: &[f64],
    e_pred: &[f64],
    window: &RollingWindow,
) -> CoreResult<Vec<RollingPoint>> {
    window.validate()?;
    if e_true.len() != e_pred.len() {
        return Err(CoreError::length_mismatch(e_true.len(), e_pred.len()));
    }

    let mut samples: Vec<(f64, f64)> = e_true
        .iter()
        .zip(e_pred)
        .filter(|(t, p)| t.is_finite() && p.is_finite())
        .map(|(&t, &p)| (t, (p - t).abs()))
        .collect();
    samples.sort_by(|a, b| a.0.total_cmp(&b.0));
    let errors: Vec<f64> = samples.iter().map(|&(_, err)| err).collect();

    let n = samples.len();
    let (mut start, mut end) = (0usize, 0usize);
    let centers = window.bin_centers();
    let mut profile = Vec::with_capacity(centers.len());

    for center in centers {
        let low = center - window.half_window;
        let high = center + window.half_window;
        while end < n && samples[end].0 <= high {
            end += 1;
        }
        while start < end && samples[start].0 <= low {
            start += 1;
        }
        let members = &errors[start..end];
        profile.push(RollingPoint {
            bin_center: center,
            mae: mean(members),
            sem: standard_error(members),
            count: members.len(),
        });
    }
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_window_has_250_bins() {
        let w = RollingWindow::default();
        let centers = w.bin_centers();
        assert_eq!(centers.len(), 250);
        assert!((centers[0] - (-0.2)).abs() < 1e-12);
        assert!(centers.last().unwrap() < &0.3);
    }

    #[test]
    fn invalid_windows_are_rejected() {
        let bad = [
            RollingWindow {
                half_window: 0.0,
                ..Default::default()
            },
            RollingWindow {
                bin_width: -0.1,
                ..Default::default()
            },
            RollingWindow {
                x_range: (0.3, -0.2),
                ..Default::default()
            },
            RollingWindow {
                x_range: (f64::NAN, 0.3),
                ..Default::default()
            },
        ];
        for w in bad {
            assert!(matches!(
                rolling_mae_values(&[0.0], &[0.0], &w),
                Err(CoreError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn membership_is_half_open() {
        // Single bin at 0.0 with half window 0.1 → (-0.1, 0.1]
        let w = RollingWindow {
            half_window: 0.1,
            bin_width: 1.0,
            x_range: (0.0, 0.5),
        };
        let t = [-0.1, -0.05, 0.1, 0.15];
        let p = [0.0, 0.0, 0.0, 0.0];
        let profile = rolling_mae_values(&t, &p, &w).unwrap();
        assert_eq!(profile.len(), 1);
        assert_eq!(profile[0].count, 2);
        // errors of members: 0.05 and 0.1
        assert!((profile[0].mae.unwrap() - 0.075).abs() < 1e-12);
    }

    #[test]
    fn known_window_statistics() {
        let w = RollingWindow {
            half_window: 0.5,
            bin_width: 1.0,
            x_range: (0.0, 2.0),
        };
        // bin 0: (-0.5, 0.5] → errors 1, 3 ; bin 1: (0.5, 1.5] → error 2
        let t = [0.0, 0.2, 1.0];
        let p = [1.0, 3.2, 3.0];
        let profile = rolling_mae_values(&t, &p, &w).unwrap();
        assert_eq!(profile[0].count, 2);
        assert!((profile[0].mae.unwrap() - 2.0).abs() < 1e-12);
        // sample std of [1, 3] = sqrt(2); sem = sqrt(2)/sqrt(2) = 1
        assert!((profile[0].sem.unwrap() - 1.0).abs() < 1e-12);
        assert_eq!(profile[1].count, 1);
        assert!((profile[1].mae.unwrap() - 2.0).abs() < 1e-12);
        assert_eq!(profile[1].sem, Some(0.0));
    }

    #[test]
    fn empty_bins_are_undefined_not_fatal() {
        let w = RollingWindow {
            half_window: 0.01,
            bin_width: 0.1,
            x_range: (0.0, 0.3),
        };
        let profile = rolling_mae_values(&[0.1], &[0.3], &w).unwrap();
        assert_eq!(profile.len(), 3);
        assert_eq!(profile[0].mae, None);
        assert_eq!(profile[0].sem, None);
        assert_eq!(profile[1].count, 1);
        assert!((profile[1].mae.unwrap() - 0.2).abs() < 1e-12);
        assert_eq!(profile[2].mae, None);
    }

    #[test]
    fn matches_brute_force_rescan() {
        let t: Vec<f64> = (0..400)
            .map(|i| -0.25 + (i as f64 * 0.37).sin().abs() * 0.6)
            .collect();
        let p: Vec<f64> = t
            .iter()
            .enumerate()
            .map(|(i, v)| v + ((i % 7) as f64 - 3.0) * 0.01)
            .collect();
        let w = RollingWindow::default();
        let fast = rolling_mae_values(&t, &p, &w).unwrap();
        for point in &fast {
            let members: Vec<f64> = t
                .iter()
                .zip(&p)
                .filter(|(tv, _)| {
                    **tv > point.bin_center - w.half_window
                        && **tv <= point.bin_center + w.half_window
                })
                .map(|(tv, pv)| (pv - tv).abs())
                .collect();
            assert_eq!(point.count, members.len());
            match (point.mae, mean(&members)) {
                (Some(a), Some(b)) => assert!((a - b).abs() < 1e-12),
                (None, None) => {}
                other => panic!("mismatch {other:?}"),
            }
        }
    }

    #[test]
    fn nan_pairs_are_ignored() {
        let w = RollingWindow {
            half_window: 1.0,
            bin_width: 1.0,
            x_range: (0.0, 1.0),
        };
        let profile = rolling_mae_values(&[0.0, f64::NAN, 0.5], &[0.5, 0.0, f64::NAN], &w).unwrap();
        assert_eq!(profile[0].count, 1);
        assert_eq!(profile[0].mae, Some(0.5));
    }
}
