//! HullBench Core: stability classification and discovery metrics for
//! crystal-stability predictions.
//!
//! This crate contains the evaluation engine:
//! - Domain types (material/model ids, hull-distance series, prediction tables)
//! - Four-way stability classification at a configurable threshold
//! - Aggregate discovery metrics (precision, recall, F1, accuracy, enrichment)
//! - Regression metrics of the predicted hull distance
//! - Rolling MAE/SEM profile along the true hull distance
//! - Cumulative precision/recall curves with monotone interpolation
//! - Classified histograms with per-bin accuracy
//!
//! Everything here is pure computation over in-memory columns. Loading,
//! configuration and artifact export live in `hullbench-runner`.

pub mod classify;
pub mod cumulative;
pub mod domain;
pub mod error;
pub mod histogram;
pub mod interpolate;
pub mod metrics;
pub mod regression;
pub mod rolling;
pub mod stats;

pub use classify::{classify, classify_values, ClassCounts, ClassMask, StabilityClass};
pub use cumulative::{
    cumulative_curves, cumulative_curves_for, cumulative_points, downsample, CumulativeCurve,
    CurveOptions, CurvePoint, ResampledPoint, DEFAULT_DOWNSAMPLE_TARGET,
};
pub use domain::{HullDistanceSeries, MaterialId, ModelId, ModelPredictionTable, StabilityThreshold};
pub use error::{CoreError, CoreResult};
pub use histogram::{classified_histogram, HistogramBin, HistogramOptions, HullAxis};
pub use interpolate::MonotoneCubic;
pub use metrics::{aggregate, DiscoveryMetrics};
pub use regression::{regression_metrics, regression_metrics_values, RegressionMetrics};
pub use rolling::{rolling_mae, rolling_mae_values, RollingPoint, RollingWindow};
