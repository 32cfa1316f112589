//! Evaluation runner: wires loaded data, config and the core engine into a
//! single report.
//!
//! Two entry points:
//! - `run_from_config()`: loads the CSV named by the config, then evaluates. Used by the CLI.
//! - `run_evaluation()`: takes pre-loaded data. Used by tests and synthetic runs.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use hullbench_core::{
    aggregate, classified_histogram, classify, regression_metrics, rolling_mae, CoreError,
    CoreResult, CumulativeCurve, CurveOptions, DiscoveryMetrics, HistogramBin, HistogramOptions,
    ModelId, RegressionMetrics, RollingPoint, RollingWindow, StabilityThreshold,
};

use crate::config::{ConfigError, EvalConfig};
use crate::data_loader::{load_csv, LoadError, LoadedData};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("evaluation error: {0}")]
    Core(#[from] CoreError),
    #[error("no models selected for evaluation")]
    NoModels,
}

/// Current schema version for persisted reports.
pub const SCHEMA_VERSION: u32 = 1;

/// Everything computed for one model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelReport {
    pub model: ModelId,
    pub discovery: DiscoveryMetrics,
    pub regression: RegressionMetrics,
    pub curve: CumulativeCurve,
    pub rolling: Vec<RollingPoint>,
    pub histogram: Vec<HistogramBin>,
}

/// A requested model that could not be evaluated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedModel {
    pub model: ModelId,
    pub reason: String,
}

/// Complete result of one evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub generated_at: DateTime<Utc>,
    pub config_hash: String,
    pub dataset_hash: String,
    pub stability_threshold: f64,
    pub n_materials: usize,
    /// Actually stable materials in the dataset.
    pub n_total_pos: usize,
    /// Ordered by model id.
    pub models: Vec<ModelReport>,
    #[serde(default)]
    pub skipped: Vec<SkippedModel>,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl EvaluationReport {
    pub fn model(&self, id: &str) -> Option<&ModelReport> {
        self.models.iter().find(|m| m.model.as_str() == id)
    }

    /// Models by descending F1; undefined F1 sorts last.
    pub fn ranked_by_f1(&self) -> Vec<&ModelReport> {
        let mut ranked: Vec<&ModelReport> = self.models.iter().collect();
        ranked.sort_by(|a, b| {
            let key = |m: &ModelReport| m.discovery.f1.unwrap_or(f64::NEG_INFINITY);
            key(b).total_cmp(&key(a))
        });
        ranked
    }
}

/// Load the configured dataset, then evaluate it.
pub fn run_from_config(config: &EvalConfig) -> Result<EvaluationReport, RunError> {
    config.validate()?;
    let data = load_csv(&config.data.path, &config.data)?;
    run_evaluation(config, &data)
}

/// Evaluate every selected model on pre-loaded data: no I/O.
///
/// Models run in parallel. A model named in the config but absent from the
/// data is recorded in `skipped`; the others are still evaluated.
pub fn run_evaluation(
    config: &EvalConfig,
    data: &LoadedData,
) -> Result<EvaluationReport, RunError> {
    config.validate()?;
    let threshold = config.threshold()?;
    let settings = Settings {
        threshold,
        curve: config.curve_options(),
        rolling: config.rolling_window(),
        histogram: config.histogram_options(),
    };
    data.table.ensure_aligned(&data.truth)?;

    // Each model is evaluated once, however often it is listed.
    let requested: Vec<ModelId> = if config.data.models.is_empty() {
        data.table.model_ids().cloned().collect()
    } else {
        let unique: BTreeSet<ModelId> = config.data.models.iter().map(ModelId::new).collect();
        unique.into_iter().collect()
    };
    if requested.is_empty() {
        return Err(RunError::NoModels);
    }

    let n_total_pos = data
        .truth
        .values()
        .iter()
        .filter(|&&e| threshold.is_stable(e))
        .count();
    info!(
        materials = data.n_materials(),
        models = requested.len(),
        n_total_pos,
        threshold = %threshold,
        "evaluating"
    );

    let results: Vec<(ModelId, CoreResult<ModelReport>)> = requested
        .par_iter()
        .map(|model| (model.clone(), evaluate_model(model, data, &settings)))
        .collect();

    let mut models = Vec::with_capacity(results.len());
    let mut skipped = Vec::new();
    for (model, result) in results {
        match result {
            Ok(report) => {
                let undefined = report.discovery.undefined_metrics();
                if !undefined.is_empty() {
                    warn!(model = %model, ?undefined, "degenerate metrics reported as undefined");
                }
                info!(
                    model = %model,
                    f1 = ?report.discovery.f1,
                    precision = ?report.discovery.precision,
                    recall = ?report.discovery.recall,
                    curve_points = report.curve.len(),
                    "model evaluated"
                );
                models.push(report);
            }
            Err(CoreError::UnknownModel(_)) => {
                warn!(model = %model, "model not found in dataset, skipping");
                skipped.push(SkippedModel {
                    model,
                    reason: "not found in dataset".into(),
                });
            }
            Err(e) => return Err(e.into()),
        }
    }
    models.sort_by(|a, b| a.model.cmp(&b.model));

    Ok(EvaluationReport {
        schema_version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        config_hash: config.config_hash(),
        dataset_hash: data.dataset_hash.clone(),
        stability_threshold: threshold.value(),
        n_materials: data.n_materials(),
        n_total_pos,
        models,
        skipped,
    })
}

struct Settings {
    threshold: StabilityThreshold,
    curve: CurveOptions,
    rolling: RollingWindow,
    histogram: HistogramOptions,
}

fn evaluate_model(
    model: &ModelId,
    data: &LoadedData,
    settings: &Settings,
) -> CoreResult<ModelReport> {
    let truth = &data.truth;
    let preds = data.table.get(model)?;
    let mask = classify(truth, preds, settings.threshold)?;
    Ok(ModelReport {
        model: model.clone(),
        discovery: aggregate(&mask),
        regression: regression_metrics(truth, preds)?,
        curve: CumulativeCurve::build(
            model.clone(),
            truth,
            preds,
            settings.threshold,
            &settings.curve,
        )?,
        rolling: rolling_mae(truth, preds, &settings.rolling)?,
        histogram: classified_histogram(truth, preds, settings.threshold, &settings.histogram)?,
    })
}
