//! Stability classification: pure elementwise labelling of materials.
//!
//! Each material is compared to the threshold twice, once on its true hull
//! distance and once on its predicted one. No ordering or neighbour
//! dependence: the label of material `i` depends only on `(true[i], pred[i])`.

use serde::{Deserialize, Serialize};

use crate::domain::{HullDistanceSeries, StabilityThreshold};
use crate::error::{CoreError, CoreResult};

/// The four outcomes of a stability prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StabilityClass {
    TruePositive,
    FalseNegative,
    FalsePositive,
    TrueNegative,
}

impl StabilityClass {
    pub const ALL: [StabilityClass; 4] = [
        StabilityClass::TruePositive,
        StabilityClass::FalseNegative,
        StabilityClass::FalsePositive,
        StabilityClass::TrueNegative,
    ];

    pub fn from_flags(actual_stable: bool, predicted_stable: bool) -> Self {
        match (actual_stable, predicted_stable) {
            (true, true) => StabilityClass::TruePositive,
            (true, false) => StabilityClass::FalseNegative,
            (false, true) => StabilityClass::FalsePositive,
            (false, false) => StabilityClass::TrueNegative,
        }
    }

    /// Label the pair `(e_true, e_pred)` against `threshold`.
    #[inline]
    pub fn of(e_true: f64, e_pred: f64, threshold: StabilityThreshold) -> Self {
        Self::from_flags(threshold.is_stable(e_true), threshold.is_stable(e_pred))
    }

    pub fn is_actual_stable(self) -> bool {
        matches!(
            self,
            StabilityClass::TruePositive | StabilityClass::FalseNegative
        )
    }

    pub fn is_predicted_stable(self) -> bool {
        matches!(
            self,
            StabilityClass::TruePositive | StabilityClass::FalsePositive
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            StabilityClass::TruePositive => "True Positives",
            StabilityClass::FalseNegative => "False Negatives",
            StabilityClass::FalsePositive => "False Positives",
            StabilityClass::TrueNegative => "True Negatives",
        }
    }
}

/// Per-class counts of a classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCounts {
    pub true_pos: usize,
    pub false_neg: usize,
    pub false_pos: usize,
    pub true_neg: usize,
}

impl ClassCounts {
    pub fn record(&mut self, class: StabilityClass) {
        match class {
            StabilityClass::TruePositive => self.true_pos += 1,
            StabilityClass::FalseNegative => self.false_neg += 1,
            StabilityClass::FalsePositive => self.false_pos += 1,
            StabilityClass::TrueNegative => self.true_neg += 1,
        }
    }

    pub fn get(&self, class: StabilityClass) -> usize {
        match class {
            StabilityClass::TruePositive => self.true_pos,
            StabilityClass::FalseNegative => self.false_neg,
            StabilityClass::FalsePositive => self.false_pos,
            StabilityClass::TrueNegative => self.true_neg,
        }
    }

    pub fn total(&self) -> usize {
        self.true_pos + self.false_neg + self.false_pos + self.true_neg
    }

    /// Materials that are actually stable (tp + fn).
    pub fn actual_positives(&self) -> usize {
        self.true_pos + self.false_neg
    }

    /// Materials the model calls stable (tp + fp).
    pub fn predicted_positives(&self) -> usize {
        self.true_pos + self.false_pos
    }
}

impl FromIterator<StabilityClass> for ClassCounts {
    fn from_iter<I: IntoIterator<Item = StabilityClass>>(iter: I) -> Self {
        let mut counts = ClassCounts::default();
        for class in iter {
            counts.record(class);
        }
        counts
    }
}

/// Four mutually exclusive, exhaustive boolean masks over the materials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMask {
    pub true_pos: Vec<bool>,
    pub false_neg: Vec<bool>,
    pub false_pos: Vec<bool>,
    pub true_neg: Vec<bool>,
}

impl ClassMask {
    fn with_capacity(n: usize) -> Self {
        Self {
            true_pos: Vec::with_capacity(n),
            false_neg: Vec::with_capacity(n),
            false_pos: Vec::with_capacity(n),
            true_neg: Vec::with_capacity(n),
        }
    }

    fn push(&mut self, class: StabilityClass) {
        self.true_pos.push(class == StabilityClass::TruePositive);
        self.false_neg.push(class == StabilityClass::FalseNegative);
        self.false_pos.push(class == StabilityClass::FalsePositive);
        self.true_neg.push(class == StabilityClass::TrueNegative);
    }

    pub fn len(&self) -> usize {
        self.true_pos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.true_pos.is_empty()
    }

    /// The class of material `index`.
    pub fn class_at(&self, index: usize) -> Option<StabilityClass> {
        if index >= self.len() {
            return None;
        }
        let class = if self.true_pos[index] {
            StabilityClass::TruePositive
        } else if self.false_neg[index] {
            StabilityClass::FalseNegative
        } else if self.false_pos[index] {
            StabilityClass::FalsePositive
        } else {
            StabilityClass::TrueNegative
        };
        Some(class)
    }

    pub fn classes(&self) -> impl Iterator<Item = StabilityClass> + '_ {
        (0..self.len()).filter_map(move |i| self.class_at(i))
    }

    pub fn mask(&self, class: StabilityClass) -> &[bool] {
        match class {
            StabilityClass::TruePositive => &self.true_pos,
            StabilityClass::FalseNegative => &self.false_neg,
            StabilityClass::FalsePositive => &self.false_pos,
            StabilityClass::TrueNegative => &self.true_neg,
        }
    }

    pub fn counts(&self) -> ClassCounts {
        self.classes().collect()
    }
}

impl FromIterator<StabilityClass> for ClassMask {
    fn from_iter<I: IntoIterator<Item = StabilityClass>>(iter: I) -> Self {
        let iter = iter.into_iter();
        let mut mask = ClassMask::with_capacity(iter.size_hint().0);
        for class in iter {
            mask.push(class);
        }
        mask
    }
}

/// Classify aligned true/predicted series.
///
/// Fails with `InputAlignment` when lengths or id sequences differ.
pub fn classify(
    e_above_hull_true: &HullDistanceSeries,
    e_above_hull_pred: &HullDistanceSeries,
    threshold: StabilityThreshold,
) -> CoreResult<ClassMask> {
    e_above_hull_true.ensure_aligned(e_above_hull_pred)?;
    classify_values(
        e_above_hull_true.values(),
        e_above_hull_pred.values(),
        threshold,
    )
}

/// Classify raw value slices (positional alignment; only lengths are checked).
pub fn classify_values(
    e_true: &[f64],
    e_pred: &[f64],
    threshold: StabilityThreshold,
) -> CoreResult<ClassMask> {
    if e_true.len() != e_pred.len() {
        return Err(CoreError::length_mismatch(e_true.len(), e_pred.len()));
    }
    Ok(e_true
        .iter()
        .zip(e_pred)
        .map(|(&t, &p)| StabilityClass::of(t, p, threshold))
        .collect())
}
