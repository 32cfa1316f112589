//! Cumulative rank metrics: precision/recall as a function of how many
//! materials have been called stable.
//!
//! Simulates a discovery campaign: take the material the model believes is
//! most stable, then the next one, and so on, recomputing precision and recall
//! on the growing prefix. A curve ends where the model has found every stable
//! material it is ever going to find (first maximum of recall), so curves from
//! different models have different lengths and are never padded.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::classify::StabilityClass;
use crate::domain::{HullDistanceSeries, ModelId, ModelPredictionTable, StabilityThreshold};
use crate::error::{CoreError, CoreResult};
use crate::interpolate::MonotoneCubic;
use crate::metrics::ratio;

/// Default number of points a curve is thinned to for presentation.
pub const DEFAULT_DOWNSAMPLE_TARGET: usize = 1000;

/// Options for building cumulative curves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CurveOptions {
    /// Thin each curve to about this many points; `None` keeps every rank.
    pub downsample_to: Option<usize>,
}

impl Default for CurveOptions {
    fn default() -> Self {
        Self {
            downsample_to: Some(DEFAULT_DOWNSAMPLE_TARGET),
        }
    }
}

impl CurveOptions {
    pub fn full_resolution() -> Self {
        Self {
            downsample_to: None,
        }
    }

    pub fn validate(&self) -> CoreResult<()> {
        if self.downsample_to == Some(0) {
            return Err(CoreError::InvalidParameter(
                "downsample target must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// One point of a cumulative curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Number of materials taken so far, in predicted-stability order (1-based).
    pub rank: usize,
    /// `None` while no material in the prefix is predicted stable.
    pub precision: Option<f64>,
    /// `None` when the dataset has no actually stable material.
    pub recall: Option<f64>,
}

/// A curve evaluated between ranks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResampledPoint {
    /// The requested abscissa, unrounded.
    pub rank: f64,
    pub precision: Option<f64>,
    pub recall: Option<f64>,
}

/// Cumulative precision/recall for one model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CumulativeCurve {
    pub model: ModelId,
    /// Actually stable materials in the whole dataset.
    pub n_total_pos: usize,
    /// Rank at which recall first reaches its maximum; the curve's last rank
    /// before any downsampling.
    pub truncation_rank: usize,
    pub points: Vec<CurvePoint>,
}

impl CumulativeCurve {
    /// Build the curve of one model from aligned true/predicted series.
    pub fn build(
        model: ModelId,
        e_above_hull_true: &HullDistanceSeries,
        e_above_hull_pred: &HullDistanceSeries,
        threshold: StabilityThreshold,
        options: &CurveOptions,
    ) -> CoreResult<Self> {
        options.validate()?;
        e_above_hull_true.ensure_aligned(e_above_hull_pred)?;
        let e_true = e_above_hull_true.values();
        let n_total_pos = e_true.iter().filter(|&&v| threshold.is_stable(v)).count();
        let mut points = cumulative_points(e_true, e_above_hull_pred.values(), threshold)?;
        let truncation_rank = points.last().map_or(0, |p| p.rank);
        debug!(
            model = %model,
            n_total_pos,
            truncation_rank,
            "cumulative curve truncated"
        );
        if let Some(target) = options.downsample_to {
            points = downsample(&points, target);
        }
        Ok(Self {
            model,
            n_total_pos,
            truncation_rank,
            points,
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&CurvePoint> {
        self.points.last()
    }

    /// Evaluate the monotone interpolant of the curve at arbitrary ranks.
    ///
    /// Ranks outside the curve's own range (or where the metric is undefined
    /// at every point) yield `None`; curves are never extrapolated.
    pub fn resample(&self, ranks: &[f64]) -> Vec<ResampledPoint> {
        let precision = interpolant(&self.points, |p| p.precision);
        let recall = interpolant(&self.points, |p| p.recall);
        ranks
            .iter()
            .map(|&r| ResampledPoint {
                rank: r,
                precision: precision.as_ref().and_then(|f| f.evaluate(r)),
                recall: recall.as_ref().and_then(|f| f.evaluate(r)),
            })
            .collect()
    }
}

/// Cumulative curves for every model in the table, computed in parallel.
///
/// The true series must share the table's index.
pub fn cumulative_curves(
    e_above_hull_true: &HullDistanceSeries,
    predictions: &ModelPredictionTable,
    threshold: StabilityThreshold,
    options: &CurveOptions,
) -> CoreResult<BTreeMap<ModelId, CumulativeCurve>> {
    options.validate()?;
    predictions.ensure_aligned(e_above_hull_true)?;
    let columns: Vec<(&ModelId, &HullDistanceSeries)> = predictions.iter().collect();
    columns
        .par_iter()
        .map(|(model, preds)| {
            CumulativeCurve::build(
                ModelId::clone(model),
                e_above_hull_true,
                preds,
                threshold,
                options,
            )
            .map(|curve| (ModelId::clone(model), curve))
        })
        .collect()
}

/// Cumulative curves for a chosen list of models.
///
/// Misalignment between the true series and the table aborts the whole call.
/// A model id missing from the table only fails its own entry with
/// `UnknownModel`; the other curves are still computed.
pub fn cumulative_curves_for(
    e_above_hull_true: &HullDistanceSeries,
    predictions: &ModelPredictionTable,
    models: &[ModelId],
    threshold: StabilityThreshold,
    options: &CurveOptions,
) -> CoreResult<BTreeMap<ModelId, CoreResult<CumulativeCurve>>> {
    options.validate()?;
    predictions.ensure_aligned(e_above_hull_true)?;
    Ok(models
        .par_iter()
        .map(|model| {
            let curve = predictions.get(model).and_then(|preds| {
                CumulativeCurve::build(model.clone(), e_above_hull_true, preds, threshold, options)
            });
            (model.clone(), curve)
        })
        .collect())
}

/// Full-resolution cumulative points for positionally aligned slices.
///
/// The caller's slices are not reordered; ranking goes through an index
/// permutation sorted by predicted hull distance (stable, NaN last).
pub fn cumulative_points(
    e_true: &[f64],
    e_pred: &[f64],
    threshold: StabilityThreshold,
) -> CoreResult<Vec<CurvePoint>> {
    if e_true.len() != e_pred.len() {
        return Err(CoreError::length_mismatch(e_true.len(), e_pred.len()));
    }
    let n = e_true.len();
    if n == 0 {
        return Ok(Vec::new());
    }
    let n_total_pos = e_true.iter().filter(|&&v| threshold.is_stable(v)).count();

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| cmp_nan_last(e_pred[a], e_pred[b]));

    let mut raw = Vec::with_capacity(n);
    let (mut tp, mut fp) = (0usize, 0usize);
    for (k, &i) in order.iter().enumerate() {
        match StabilityClass::of(e_true[i], e_pred[i], threshold) {
            StabilityClass::TruePositive => tp += 1,
            StabilityClass::FalsePositive => fp += 1,
            StabilityClass::FalseNegative | StabilityClass::TrueNegative => {}
        }
        raw.push((k + 1, tp, fp));
    }

    let truncation_rank = if n_total_pos > 0 {
        // First rank attaining max recall == first rank where tp reaches its final count.
        let tp_final = raw[n - 1].1;
        raw.iter()
            .position(|&(_, tp_k, _)| tp_k == tp_final)
            .map_or(n, |idx| idx + 1)
    } else {
        let n_predicted_stable = e_pred.iter().filter(|&&v| threshold.is_stable(v)).count();
        n_predicted_stable.max(1)
    };

    let points: Vec<CurvePoint> = raw[..truncation_rank]
        .iter()
        .map(|&(rank, tp_k, fp_k)| CurvePoint {
            rank,
            precision: ratio(tp_k, tp_k + fp_k),
            recall: ratio(tp_k, n_total_pos),
        })
        .collect();
    Ok(smooth(points))
}

/// Pass precision and recall through their monotone cubic interpolants on the
/// integer rank grid. Undefined points stay undefined.
fn smooth(points: Vec<CurvePoint>) -> Vec<CurvePoint> {
    let precision = interpolant(&points, |p| p.precision);
    let recall = interpolant(&points, |p| p.recall);
    points
        .into_iter()
        .map(|p| {
            let x = p.rank as f64;
            CurvePoint {
                rank: p.rank,
                precision: p
                    .precision
                    .and_then(|_| precision.as_ref().and_then(|f| f.evaluate(x))),
                recall: p
                    .recall
                    .and_then(|_| recall.as_ref().and_then(|f| f.evaluate(x))),
            }
        })
        .collect()
}

fn interpolant(
    points: &[CurvePoint],
    metric: impl Fn(&CurvePoint) -> Option<f64>,
) -> Option<MonotoneCubic> {
    let (xs, ys): (Vec<f64>, Vec<f64>) = points
        .iter()
        .filter_map(|p| metric(p).map(|y| (p.rank as f64, y)))
        .unzip();
    if xs.is_empty() {
        return None;
    }
    MonotoneCubic::new(xs, ys).ok()
}

/// Keep every `len / target`-th point (at least every point), always keeping
/// the first and last.
pub fn downsample<T: Clone>(points: &[T], target: usize) -> Vec<T> {
    if points.is_empty() {
        return Vec::new();
    }
    let step = (points.len() / target.max(1)).max(1);
    let mut out: Vec<T> = points.iter().step_by(step).cloned().collect();
    if (points.len() - 1) % step != 0 {
        out.push(points[points.len() - 1].clone());
    }
    out
}

fn cmp_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (true, true) => Ordering::Equal,
    }
}
