//! HullBench Runner: evaluation orchestration on top of `hullbench-core`.
//!
//! This crate provides:
//! - TOML evaluation config with defaults and content hashing
//! - CSV loading of true/predicted hull distances with dataset hashing
//! - Deterministic synthetic datasets
//! - Parallel per-model evaluation into a single versioned report
//! - JSON/CSV/Markdown export and artifact bundles

pub mod config;
pub mod data_loader;
pub mod evaluation;
pub mod export;
pub mod synthetic;

pub use config::{
    ConfigError, ConfigHash, DataConfig, EvalConfig, EvaluationConfig, HistogramConfig,
    OutputConfig, RollingConfig,
};
pub use data_loader::{load_csv, parse_csv, LoadError, LoadedData};
pub use evaluation::{
    run_evaluation, run_from_config, EvaluationReport, ModelReport, RunError, SkippedModel,
    SCHEMA_VERSION,
};
pub use export::{
    export_curves_csv, export_histogram_csv, export_json, export_metrics_csv, export_rolling_csv,
    generate_report, import_json, load_artifacts, save_artifacts,
};
pub use synthetic::{generate, SyntheticData, SyntheticModel, SyntheticSpec};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn config_types_are_send_sync() {
        assert_send::<EvalConfig>();
        assert_sync::<EvalConfig>();
        assert_send::<SyntheticSpec>();
        assert_sync::<SyntheticSpec>();
    }

    #[test]
    fn loaded_data_is_send_sync() {
        assert_send::<LoadedData>();
        assert_sync::<LoadedData>();
    }

    #[test]
    fn report_types_are_send_sync() {
        assert_send::<EvaluationReport>();
        assert_sync::<EvaluationReport>();
        assert_send::<ModelReport>();
        assert_sync::<ModelReport>();
    }

    #[test]
    fn error_types_are_send_sync() {
        assert_send::<RunError>();
        assert_sync::<RunError>();
        assert_send::<LoadError>();
        assert_sync::<LoadError>();
        assert_send::<ConfigError>();
        assert_sync::<ConfigError>();
    }
}
