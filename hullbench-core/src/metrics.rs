//! Discovery metrics: pure functions from class counts to scalar statistics.
//!
//! Every ratio whose denominator is zero is reported as `None` rather than
//! NaN or infinity. A model that calls nothing stable is a legitimate result;
//! the caller decides how to display the undefined precision.

use serde::{Deserialize, Serialize};

use crate::classify::{ClassCounts, ClassMask};

/// Aggregate discovery metrics for one model at one threshold.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryMetrics {
    pub precision: Option<f64>,
    pub recall: Option<f64>,
    pub f1: Option<f64>,
    pub accuracy: Option<f64>,
    pub enrichment: Option<f64>,
    pub prevalence: Option<f64>,
    pub counts: ClassCounts,
}

impl DiscoveryMetrics {
    /// Compute all metrics from class counts.
    pub fn from_counts(counts: ClassCounts) -> Self {
        let precision = precision(&counts);
        let recall = recall(&counts);
        let prevalence = prevalence(&counts);
        Self {
            precision,
            recall,
            f1: f1_score(precision, recall),
            accuracy: accuracy(&counts),
            enrichment: enrichment(precision, prevalence),
            prevalence,
            counts,
        }
    }

    /// Number of materials the metrics were computed over.
    pub fn n(&self) -> usize {
        self.counts.total()
    }

    /// Names of the metrics that are undefined for this classification.
    pub fn undefined_metrics(&self) -> Vec<&'static str> {
        [
            ("precision", self.precision),
            ("recall", self.recall),
            ("f1", self.f1),
            ("accuracy", self.accuracy),
            ("enrichment", self.enrichment),
            ("prevalence", self.prevalence),
        ]
        .into_iter()
        .filter(|(_, v)| v.is_none())
        .map(|(name, _)| name)
        .collect()
    }
}

/// Reduce a class mask to discovery metrics.
pub fn aggregate(mask: &ClassMask) -> DiscoveryMetrics {
    DiscoveryMetrics::from_counts(mask.counts())
}

// ─── Individual metric functions ────────────────────────────────────

/// `num / den`, or `None` when `den == 0`.
pub(crate) fn ratio(num: usize, den: usize) -> Option<f64> {
    if den == 0 {
        None
    } else {
        Some(num as f64 / den as f64)
    }
}

/// Fraction of materials that are actually stable (null rate).
pub fn prevalence(counts: &ClassCounts) -> Option<f64> {
    ratio(counts.actual_positives(), counts.total())
}

/// tp / (tp + fp). Undefined when the model predicts nothing stable.
pub fn precision(counts: &ClassCounts) -> Option<f64> {
    ratio(counts.true_pos, counts.predicted_positives())
}

/// tp / (tp + fn). Undefined when no material is actually stable.
pub fn recall(counts: &ClassCounts) -> Option<f64> {
    ratio(counts.true_pos, counts.actual_positives())
}

/// (tp + tn) / n.
pub fn accuracy(counts: &ClassCounts) -> Option<f64> {
    ratio(counts.true_pos + counts.true_neg, counts.total())
}

/// Harmonic mean of precision and recall.
///
/// Undefined when either input is undefined, and when both are zero (0/0).
pub fn f1_score(precision: Option<f64>, recall: Option<f64>) -> Option<f64> {
    let (p, r) = (precision?, recall?);
    let sum = p + r;
    if sum == 0.0 {
        return None;
    }
    Some(2.0 * p * r / sum)
}

/// Precision over prevalence: how much better than random the stable calls are.
pub fn enrichment(precision: Option<f64>, prevalence: Option<f64>) -> Option<f64> {
    let (p, null) = (precision?, prevalence?);
    if null == 0.0 {
        return None;
    }
    Some(p / null)
}
