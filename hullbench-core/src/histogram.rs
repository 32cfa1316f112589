//! Classified histogram: per-bin counts of each stability class along the
//! hull-distance axis, plus per-bin classification accuracy.
//!
//! The accuracy of a bin is always taken over the materials whose *true* hull
//! distance falls in it, whichever axis the class counts are binned on.

use serde::{Deserialize, Serialize};

use crate::classify::{classify, ClassCounts, StabilityClass};
use crate::domain::{HullDistanceSeries, StabilityThreshold};
use crate::error::{CoreError, CoreResult};
use crate::metrics::ratio;

/// Which hull distance the class counts are binned by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HullAxis {
    #[default]
    True,
    Predicted,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistogramOptions {
    pub axis: HullAxis,
    pub range: (f64, f64),
    pub bin_width: f64,
}

impl Default for HistogramOptions {
    fn default() -> Self {
        Self {
            axis: HullAxis::True,
            range: (-0.4, 0.4),
            bin_width: 0.02,
        }
    }
}

impl HistogramOptions {
    pub fn validate(&self) -> CoreResult<()> {
        let (lo, hi) = self.range;
        if !(lo.is_finite() && hi.is_finite() && lo < hi) {
            return Err(CoreError::InvalidParameter(format!(
                "histogram range must be finite with start < end, got ({lo}, {hi})"
            )));
        }
        if !(self.bin_width.is_finite() && self.bin_width > 0.0) {
            return Err(CoreError::InvalidParameter(format!(
                "histogram bin_width must be positive and finite, got {}",
                self.bin_width
            )));
        }
        Ok(())
    }

    pub fn n_bins(&self) -> usize {
        let (lo, hi) = self.range;
        ((hi - lo) / self.bin_width - 1e-9).ceil().max(1.0) as usize
    }

    /// Bin of `x`: `[left, right)`, the last bin also closed on the right.
    fn bin_of(&self, x: f64) -> Option<usize> {
        let (lo, hi) = self.range;
        if !(x >= lo && x <= hi) {
            return None;
        }
        let idx = ((x - lo) / self.bin_width).floor() as usize;
        Some(idx.min(self.n_bins() - 1))
    }
}

/// One histogram bin.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub left: f64,
    pub right: f64,
    /// Class counts of materials binned on the chosen axis.
    pub counts: ClassCounts,
    /// Materials whose true hull distance lies in the bin.
    pub n_true: usize,
    /// (tp + tn) / n_true over those materials; `None` for an empty bin.
    pub accuracy: Option<f64>,
}

/// Stacked class histogram and per-bin accuracy.
pub fn classified_histogram(
    e_above_hull_true: &HullDistanceSeries,
    e_above_hull_pred: &HullDistanceSeries,
    threshold: StabilityThreshold,
    options: &HistogramOptions,
) -> CoreResult<Vec<HistogramBin>> {
    options.validate()?;
    let mask = classify(e_above_hull_true, e_above_hull_pred, threshold)?;
    let axis_values = match options.axis {
        HullAxis::True => e_above_hull_true.values(),
        HullAxis::Predicted => e_above_hull_pred.values(),
    };

    let n_bins = options.n_bins();
    let (lo, hi) = options.range;
    let mut counts = vec![ClassCounts::default(); n_bins];
    let mut true_counts = vec![ClassCounts::default(); n_bins];

    for (i, class) in mask.classes().enumerate() {
        if let Some(b) = options.bin_of(axis_values[i]) {
            counts[b].record(class);
        }
        if let Some(b) = options.bin_of(e_above_hull_true.values()[i]) {
            true_counts[b].record(class);
        }
    }

    Ok((0..n_bins)
        .map(|b| {
            let left = lo + b as f64 * options.bin_width;
            let right = (left + options.bin_width).min(hi);
            let in_bin = true_counts[b];
            let correct = in_bin.get(StabilityClass::TruePositive)
                + in_bin.get(StabilityClass::TrueNegative);
            HistogramBin {
                left,
                right,
                counts: counts[b],
                n_true: in_bin.total(),
                accuracy: ratio(correct, in_bin.total()),
            }
        })
        .collect())
}
