//! Hull-distance series: one value per material, keyed by material id.
//!
//! Ids are held behind an `Arc<[MaterialId]>` so the true series and every
//! model column of a table can share a single index without copying it.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::domain::MaterialId;
use crate::error::{CoreError, CoreResult};

/// Ordered, index-aligned hull distances (eV/atom).
#[derive(Debug, Clone, PartialEq)]
pub struct HullDistanceSeries {
    ids: Arc<[MaterialId]>,
    values: Vec<f64>,
}

impl HullDistanceSeries {
    /// Build a series from explicit ids. Fails on length mismatch or duplicate ids.
    pub fn new(ids: Vec<MaterialId>, values: Vec<f64>) -> CoreResult<Self> {
        if ids.len() != values.len() {
            return Err(CoreError::InputAlignment {
                expected: ids.len(),
                found: values.len(),
                detail: "id and value counts differ".into(),
            });
        }
        let mut seen = HashSet::with_capacity(ids.len());
        for id in &ids {
            if !seen.insert(id) {
                return Err(CoreError::DuplicateMaterial(id.clone()));
            }
        }
        Ok(Self {
            ids: ids.into(),
            values,
        })
    }

    /// Build a series with positional ids `"0"`, `"1"`, ...
    pub fn from_values(values: Vec<f64>) -> Self {
        let ids: Vec<MaterialId> = (0..values.len())
            .map(|i| MaterialId(i.to_string()))
            .collect();
        Self {
            ids: ids.into(),
            values,
        }
    }

    /// Build a series that shares the index of `other`.
    pub fn with_index_of(other: &HullDistanceSeries, values: Vec<f64>) -> CoreResult<Self> {
        if other.len() != values.len() {
            return Err(CoreError::length_mismatch(other.len(), values.len()));
        }
        Ok(Self {
            ids: Arc::clone(&other.ids),
            values,
        })
    }

    /// Predicted hull distance from formation energies:
    /// `e_above_hull_true + e_form_pred - e_form_true`.
    ///
    /// The correction cancels because the hull itself is fixed by the reference
    /// (DFT) energies; only the candidate's own energy moves.
    pub fn from_formation_energies(
        e_above_hull_true: &HullDistanceSeries,
        e_form_true: &HullDistanceSeries,
        e_form_pred: &HullDistanceSeries,
    ) -> CoreResult<Self> {
        e_above_hull_true.ensure_aligned(e_form_true)?;
        e_above_hull_true.ensure_aligned(e_form_pred)?;
        let values = e_above_hull_true
            .values
            .iter()
            .zip(&e_form_true.values)
            .zip(&e_form_pred.values)
            .map(|((each, form_true), form_pred)| each + form_pred - form_true)
            .collect();
        Self::with_index_of(e_above_hull_true, values)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn ids(&self) -> &[MaterialId] {
        &self.ids
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Option<(&MaterialId, f64)> {
        Some((self.ids.get(index)?, *self.values.get(index)?))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&MaterialId, f64)> + '_ {
        self.ids.iter().zip(self.values.iter().copied())
    }

    /// Same length and same id sequence.
    pub fn is_aligned_with(&self, other: &HullDistanceSeries) -> bool {
        self.ensure_aligned(other).is_ok()
    }

    /// Fails with `InputAlignment` naming the first position whose ids differ.
    pub fn ensure_aligned(&self, other: &HullDistanceSeries) -> CoreResult<()> {
        if self.len() != other.len() {
            return Err(CoreError::length_mismatch(self.len(), other.len()));
        }
        if Arc::ptr_eq(&self.ids, &other.ids) {
            return Ok(());
        }
        match self
            .ids
            .iter()
            .zip(other.ids.iter())
            .position(|(a, b)| a != b)
        {
            None => Ok(()),
            Some(pos) => Err(CoreError::InputAlignment {
                expected: self.len(),
                found: other.len(),
                detail: format!(
                    "material id mismatch at position {pos}: '{}' vs '{}'",
                    self.ids[pos], other.ids[pos]
                ),
            }),
        }
    }

    /// Reorder this series into the id order of `target`.
    ///
    /// The id sets must be identical; the result shares `target`'s index.
    pub fn reindex_like(&self, target: &HullDistanceSeries) -> CoreResult<Self> {
        if self.len() != target.len() {
            return Err(CoreError::length_mismatch(target.len(), self.len()));
        }
        if self.is_aligned_with(target) {
            return Self::with_index_of(target, self.values.clone());
        }
        let position: HashMap<&MaterialId, usize> =
            self.ids.iter().enumerate().map(|(i, id)| (id, i)).collect();
        let mut values = Vec::with_capacity(target.len());
        for id in target.ids.iter() {
            match position.get(id) {
                Some(&i) => values.push(self.values[i]),
                None => {
                    return Err(CoreError::InputAlignment {
                        expected: target.len(),
                        found: self.len(),
                        detail: format!("material '{id}' missing from series"),
                    })
                }
            }
        }
        Self::with_index_of(target, values)
    }
}
