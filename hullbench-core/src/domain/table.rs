//! Prediction table: one predicted hull-distance column per model,
//! all sharing the index of a single true-value series.

use std::collections::BTreeMap;

use crate::domain::{HullDistanceSeries, ModelId};
use crate::error::{CoreError, CoreResult};

/// Map of model id → predicted hull distances, aligned to one index.
///
/// Backed by a `BTreeMap` so iteration (and therefore every report built
/// from it) is ordered by model id.
#[derive(Debug, Clone)]
pub struct ModelPredictionTable {
    index: HullDistanceSeries,
    models: BTreeMap<ModelId, HullDistanceSeries>,
}

impl ModelPredictionTable {
    /// Empty table keyed on the index of `index` (typically the true series).
    pub fn for_index(index: &HullDistanceSeries) -> Self {
        Self {
            index: index.clone(),
            models: BTreeMap::new(),
        }
    }

    /// Insert a model column. Misaligned series are rejected.
    pub fn insert(
        &mut self,
        model: impl Into<ModelId>,
        predictions: HullDistanceSeries,
    ) -> CoreResult<Option<HullDistanceSeries>> {
        self.index.ensure_aligned(&predictions)?;
        let shared = HullDistanceSeries::with_index_of(&self.index, predictions.values().to_vec())?;
        Ok(self.models.insert(model.into(), shared))
    }

    /// Insert a model column given positionally, in index order.
    pub fn insert_values(
        &mut self,
        model: impl Into<ModelId>,
        values: Vec<f64>,
    ) -> CoreResult<Option<HullDistanceSeries>> {
        let series = HullDistanceSeries::with_index_of(&self.index, values)?;
        Ok(self.models.insert(model.into(), series))
    }

    pub fn get(&self, model: &ModelId) -> CoreResult<&HullDistanceSeries> {
        self.models
            .get(model)
            .ok_or_else(|| CoreError::UnknownModel(model.clone()))
    }

    pub fn contains(&self, model: &ModelId) -> bool {
        self.models.contains_key(model)
    }

    pub fn model_ids(&self) -> impl Iterator<Item = &ModelId> + '_ {
        self.models.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ModelId, &HullDistanceSeries)> + '_ {
        self.models.iter()
    }

    /// Number of models.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn n_materials(&self) -> usize {
        self.index.len()
    }

    /// The shared index, as a series of the values the table was keyed on.
    pub fn index(&self) -> &HullDistanceSeries {
        &self.index
    }

    /// Fails unless `series` has exactly this table's id sequence.
    pub fn ensure_aligned(&self, series: &HullDistanceSeries) -> CoreResult<()> {
        self.index.ensure_aligned(series)
    }
}
