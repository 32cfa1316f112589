//! Serializable evaluation configuration.
//!
//! Loaded from TOML. Every section except `[data]` is optional and falls back
//! to the engine defaults (threshold 0, ±0.02 eV/atom rolling window over
//! [-0.2, 0.3), 1000-point curves, 0.02-wide histogram bins over [-0.4, 0.4]).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use hullbench_core::{
    CoreError, CurveOptions, HistogramOptions, HullAxis, RollingWindow, StabilityThreshold,
    DEFAULT_DOWNSAMPLE_TARGET,
};

/// Errors from loading or validating a config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

impl From<CoreError> for ConfigError {
    fn from(e: CoreError) -> Self {
        ConfigError::Invalid(e.to_string())
    }
}

/// Content hash of a config, used to tie reports back to their inputs.
pub type ConfigHash = String;

/// Full configuration for one evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvalConfig {
    pub data: DataConfig,
    #[serde(default)]
    pub evaluation: EvaluationConfig,
    #[serde(default)]
    pub rolling: RollingConfig,
    #[serde(default)]
    pub histogram: HistogramConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Input table location and column layout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataConfig {
    pub path: PathBuf,
    #[serde(default = "default_id_column")]
    pub id_column: String,
    #[serde(default = "default_true_column")]
    pub true_column: String,
    /// Model columns to evaluate. Empty means every remaining column.
    #[serde(default)]
    pub models: Vec<String>,
}

fn default_id_column() -> String {
    "material_id".into()
}

fn default_true_column() -> String {
    "e_above_hull_true".into()
}

impl DataConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            id_column: default_id_column(),
            true_column: default_true_column(),
            models: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EvaluationConfig {
    /// eV/atom; materials at or below are stable.
    pub stability_threshold: f64,
    /// Points per cumulative curve; 0 keeps every rank.
    pub downsample_to: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            stability_threshold: 0.0,
            downsample_to: DEFAULT_DOWNSAMPLE_TARGET,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RollingConfig {
    pub half_window: f64,
    pub bin_width: f64,
    pub x_min: f64,
    pub x_max: f64,
}

impl Default for RollingConfig {
    fn default() -> Self {
        let window = RollingWindow::default();
        Self {
            half_window: window.half_window,
            bin_width: window.bin_width,
            x_min: window.x_range.0,
            x_max: window.x_range.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HistogramConfig {
    pub axis: HullAxis,
    pub x_min: f64,
    pub x_max: f64,
    pub bin_width: f64,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        let opts = HistogramOptions::default();
        Self {
            axis: opts.axis,
            x_min: opts.range.0,
            x_max: opts.range.1,
            bin_width: opts.bin_width,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("results"),
        }
    }
}

impl EvalConfig {
    /// Config with defaults everywhere, reading `path`.
    pub fn for_input(path: impl Into<PathBuf>) -> Self {
        Self {
            data: DataConfig::new(path),
            evaluation: EvaluationConfig::default(),
            rolling: RollingConfig::default(),
            histogram: HistogramConfig::default(),
            output: OutputConfig::default(),
        }
    }

    /// Load and validate a config file.
    ///
    /// A relative `data.path` is resolved against the config file's directory.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;
        if config.data.path.is_relative() {
            if let Some(parent) = path.parent() {
                config.data.path = parent.join(&config.data.path);
            }
        }
        Ok(config)
    }

    /// Parse and validate a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data.id_column == self.data.true_column {
            return Err(ConfigError::Invalid(format!(
                "id_column and true_column are both '{}'",
                self.data.id_column
            )));
        }
        self.threshold()?;
        self.rolling_window().validate()?;
        self.histogram_options().validate()?;
        self.curve_options().validate()?;
        Ok(())
    }

    pub fn threshold(&self) -> Result<StabilityThreshold, ConfigError> {
        Ok(StabilityThreshold::new(self.evaluation.stability_threshold)?)
    }

    pub fn curve_options(&self) -> CurveOptions {
        match self.evaluation.downsample_to {
            0 => CurveOptions::full_resolution(),
            n => CurveOptions {
                downsample_to: Some(n),
            },
        }
    }

    pub fn rolling_window(&self) -> RollingWindow {
        RollingWindow {
            half_window: self.rolling.half_window,
            bin_width: self.rolling.bin_width,
            x_range: (self.rolling.x_min, self.rolling.x_max),
        }
    }

    pub fn histogram_options(&self) -> HistogramOptions {
        HistogramOptions {
            axis: self.histogram.axis,
            range: (self.histogram.x_min, self.histogram.x_max),
            bin_width: self.histogram.bin_width,
        }
    }

    /// Deterministic BLAKE3 hash of the config's JSON form.
    ///
    /// Two runs with identical configs share a hash. The output section and
    /// the data path are left out: neither affects results, and the data
    /// itself is identified by the report's dataset hash.
    pub fn config_hash(&self) -> ConfigHash {
        let mut hashed = self.clone();
        hashed.output = OutputConfig::default();
        hashed.data.path = PathBuf::new();
        let json = serde_json::to_string(&hashed).expect("EvalConfig serialization failed");
        blake3::hash(json.as_bytes()).to_hex().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FULL: &str = r#"
[data]
path = "preds.csv"
models = ["mace", "chgnet"]

[evaluation]
stability_threshold = 0.1
downsample_to = 500

[rolling]
half_window = 0.05
bin_width = 0.01
x_min = -0.3
x_max = 0.3

[histogram]
axis = "predicted"
x_min = -0.2
x_max = 0.2
bin_width = 0.01

[output]
dir = "out"
"#;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = EvalConfig::from_toml("[data]\npath = \"x.csv\"\n").unwrap();
        assert_eq!(config.data.id_column, "material_id");
        assert_eq!(config.data.true_column, "e_above_hull_true");
        assert!(config.data.models.is_empty());
        assert_eq!(config.threshold().unwrap().value(), 0.0);
        assert_eq!(config.rolling_window(), RollingWindow::default());
        assert_eq!(config.histogram_options(), HistogramOptions::default());
        assert_eq!(config.curve_options(), CurveOptions::default());
        assert_eq!(config.output.dir, PathBuf::from("results"));
    }

    #[test]
    fn full_config_parses() {
        let config = EvalConfig::from_toml(FULL).unwrap();
        assert_eq!(config.data.models, vec!["mace", "chgnet"]);
        assert_eq!(config.threshold().unwrap().value(), 0.1);
        assert_eq!(config.curve_options().downsample_to, Some(500));
        assert_eq!(config.rolling_window().x_range, (-0.3, 0.3));
        assert_eq!(config.histogram_options().axis, HullAxis::Predicted);
        assert_eq!(config.output.dir, PathBuf::from("out"));
    }

    #[test]
    fn zero_downsample_means_full_resolution() {
        let config =
            EvalConfig::from_toml("[data]\npath = \"x.csv\"\n[evaluation]\ndownsample_to = 0\n")
                .unwrap();
        assert_eq!(config.curve_options(), CurveOptions::full_resolution());
    }

    #[test]
    fn missing_data_section_is_parse_error() {
        assert!(matches!(
            EvalConfig::from_toml("[evaluation]\nstability_threshold = 0.0\n"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn invalid_rolling_window_rejected() {
        let toml = "[data]\npath = \"x.csv\"\n[rolling]\nbin_width = 0.0\n";
        assert!(matches!(
            EvalConfig::from_toml(toml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn clashing_columns_rejected() {
        let toml = "[data]\npath = \"x.csv\"\nid_column = \"a\"\ntrue_column = \"a\"\n";
        assert!(matches!(
            EvalConfig::from_toml(toml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn config_hash_deterministic_and_sensitive() {
        let a = EvalConfig::from_toml(FULL).unwrap();
        let mut b = a.clone();
        assert_eq!(a.config_hash(), b.config_hash());
        assert_eq!(a.config_hash().len(), 64);

        b.output.dir = PathBuf::from("elsewhere");
        assert_eq!(a.config_hash(), b.config_hash(), "output dir is not hashed");

        b.evaluation.stability_threshold = 0.0;
        assert_ne!(a.config_hash(), b.config_hash());
    }

    #[test]
    fn from_file_resolves_relative_data_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eval.toml");
        std::fs::write(&path, "[data]\npath = \"preds.csv\"\n").unwrap();
        let config = EvalConfig::from_file(&path).unwrap();
        assert_eq!(config.data.path, dir.path().join("preds.csv"));
    }

    #[test]
    fn config_hash_ignores_checkout_location() {
        let toml = "[data]\npath = \"preds.csv\"\n[evaluation]\nstability_threshold = 0.05\n";
        let (a, b) = (tempfile::tempdir().unwrap(), tempfile::tempdir().unwrap());
        let hashes: Vec<ConfigHash> = [a.path(), b.path()]
            .iter()
            .map(|dir| {
                let path = dir.join("eval.toml");
                std::fs::write(&path, toml).unwrap();
                EvalConfig::from_file(&path).unwrap().config_hash()
            })
            .collect();
        assert_eq!(hashes[0], hashes[1]);
        assert_eq!(hashes[0], EvalConfig::from_toml(toml).unwrap().config_hash());
    }

    #[test]
    fn from_file_missing_is_io_error() {
        let err = EvalConfig::from_file(Path::new("/nonexistent/eval.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
