//! Prediction-table loading for the runner.
//!
//! Reads a CSV with one row per material: an id column, the true hull
//! distance, and one column per model. Every column other than the id and
//! truth columns is treated as a model unless `data.models` names a subset;
//! unlisted columns are then never parsed. Empty cells and `nan` (any case)
//! load as NaN; NaN predictions classify as unstable and rank last.
//!
//! The dataset hash is BLAKE3 over the raw file bytes, so a report can be
//! tied back to the exact file it was computed from.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};

use hullbench_core::{CoreError, HullDistanceSeries, MaterialId, ModelPredictionTable};

use crate::config::DataConfig;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("column '{0}' not found in header")]
    MissingColumn(String),

    #[error("no model columns found besides '{id_column}' and '{true_column}'")]
    NoModels {
        id_column: String,
        true_column: String,
    },

    #[error("row {row}: column '{column}' has non-numeric value '{value}'")]
    BadValue {
        row: usize,
        column: String,
        value: String,
    },

    #[error("dataset has no rows")]
    Empty,

    #[error("invalid dataset: {0}")]
    Core(#[from] CoreError),
}

/// A loaded evaluation dataset.
#[derive(Debug, Clone)]
pub struct LoadedData {
    /// True hull distances, keyed by material id.
    pub truth: HullDistanceSeries,
    /// Model predictions, sharing the truth index.
    pub table: ModelPredictionTable,
    /// BLAKE3 hex digest of the source bytes.
    pub dataset_hash: String,
}

impl LoadedData {
    /// Assemble a dataset from in-memory columns.
    pub fn from_columns(
        ids: Vec<MaterialId>,
        e_above_hull_true: Vec<f64>,
        models: impl IntoIterator<Item = (String, Vec<f64>)>,
        dataset_hash: String,
    ) -> Result<Self, LoadError> {
        if ids.is_empty() {
            return Err(LoadError::Empty);
        }
        let truth = HullDistanceSeries::new(ids, e_above_hull_true)?;
        let mut table = ModelPredictionTable::for_index(&truth);
        for (model, values) in models {
            table.insert_values(model, values)?;
        }
        Ok(Self {
            truth,
            table,
            dataset_hash,
        })
    }

    pub fn n_materials(&self) -> usize {
        self.truth.len()
    }
}

/// Load a prediction CSV from disk.
pub fn load_csv(path: &Path, data: &DataConfig) -> Result<LoadedData, LoadError> {
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let loaded = parse_csv(&bytes, data)?;
    info!(
        path = %path.display(),
        materials = loaded.n_materials(),
        models = loaded.table.len(),
        "dataset loaded"
    );
    Ok(loaded)
}

/// Parse prediction CSV bytes.
pub fn parse_csv(bytes: &[u8], data: &DataConfig) -> Result<LoadedData, LoadError> {
    let dataset_hash = blake3::hash(bytes).to_hex().to_string();
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(bytes);
    let headers = reader.headers()?.clone();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| LoadError::MissingColumn(name.to_string()))
    };
    let id_idx = column(&data.id_column)?;
    let true_idx = column(&data.true_column)?;
    let model_cols: Vec<(usize, String)> = headers
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != id_idx && i != true_idx)
        .filter(|&(_, h)| data.models.is_empty() || data.models.iter().any(|m| m == h))
        .map(|(i, h)| (i, h.to_string()))
        .collect();
    // Listed models absent from the header are left to the runner to skip.
    if model_cols.is_empty() && data.models.is_empty() {
        return Err(LoadError::NoModels {
            id_column: data.id_column.clone(),
            true_column: data.true_column.clone(),
        });
    }

    let mut ids = Vec::new();
    let mut truth = Vec::new();
    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); model_cols.len()];

    for (row_idx, record) in reader.records().enumerate() {
        let record = record?;
        // 1-based line number including header
        let row = row_idx + 2;
        let field = |idx: usize| record.get(idx).unwrap_or("");
        ids.push(MaterialId::new(field(id_idx)));
        truth.push(parse_value(field(true_idx), row, &data.true_column)?);
        for (col, (idx, name)) in columns.iter_mut().zip(&model_cols) {
            col.push(parse_value(field(*idx), row, name)?);
        }
    }

    let n_true_missing = truth.iter().filter(|v| v.is_nan()).count();
    if n_true_missing > 0 {
        warn!(
            count = n_true_missing,
            column = %data.true_column,
            "true hull distance missing; those materials count as unstable"
        );
    }
    for (col, (_, name)) in columns.iter().zip(&model_cols) {
        let missing = col.iter().filter(|v| v.is_nan()).count();
        if missing > 0 {
            debug!(model = %name, missing, "model has missing predictions");
        }
    }

    LoadedData::from_columns(
        ids,
        truth,
        model_cols.into_iter().map(|(_, name)| name).zip(columns),
        dataset_hash,
    )
}

/// Empty and `nan` cells are NaN.
fn parse_value(raw: &str, row: usize, column: &str) -> Result<f64, LoadError> {
    if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
        return Ok(f64::NAN);
    }
    raw.parse::<f64>().map_err(|_| LoadError::BadValue {
        row,
        column: column.to_string(),
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use hullbench_core::ModelId;

    const CSV: &str = "\
material_id,e_above_hull_true,mace,chgnet
wbm-1,-0.05,-0.02,0.01
wbm-2,0.12,0.10,
wbm-3,0.00,NaN,-0.03
";

    fn data() -> DataConfig {
        DataConfig::new("preds.csv")
    }

    #[test]
    fn parses_models_and_missing_cells() {
        let loaded = parse_csv(CSV.as_bytes(), &data()).unwrap();
        assert_eq!(loaded.n_materials(), 3);
        assert_eq!(loaded.table.len(), 2);
        assert_eq!(loaded.truth.values(), &[-0.05, 0.12, 0.0]);
        assert_eq!(loaded.truth.ids()[1], MaterialId::from("wbm-2"));

        let chgnet = loaded.table.get(&ModelId::from("chgnet")).unwrap();
        assert!(chgnet.values()[1].is_nan());
        let mace = loaded.table.get(&ModelId::from("mace")).unwrap();
        assert!(mace.values()[2].is_nan());
        assert!(mace.is_aligned_with(&loaded.truth));
    }

    #[test]
    fn dataset_hash_tracks_bytes() {
        let a = parse_csv(CSV.as_bytes(), &data()).unwrap();
        let b = parse_csv(CSV.as_bytes(), &data()).unwrap();
        assert_eq!(a.dataset_hash, b.dataset_hash);
        let changed = CSV.replace("0.12", "0.13");
        let c = parse_csv(changed.as_bytes(), &data()).unwrap();
        assert_ne!(a.dataset_hash, c.dataset_hash);
    }

    #[test]
    fn custom_column_names() {
        let csv = "id,each_true,m3gnet\nx,0.1,0.2\n";
        let config = DataConfig {
            id_column: "id".into(),
            true_column: "each_true".into(),
            ..data()
        };
        let loaded = parse_csv(csv.as_bytes(), &config).unwrap();
        assert!(loaded.table.contains(&ModelId::from("m3gnet")));
    }

    #[test]
    fn model_subset_ignores_other_columns() {
        let csv = "\
material_id,e_above_hull_true,formula,mace,chgnet
wbm-1,-0.05,NaCl,-0.02,0.01
wbm-2,0.12,Fe2O3,0.10,0.2
";
        let config = DataConfig {
            models: vec!["mace".into(), "sevennet".into()],
            ..data()
        };
        let loaded = parse_csv(csv.as_bytes(), &config).unwrap();
        assert_eq!(loaded.table.len(), 1);
        assert!(loaded.table.contains(&ModelId::from("mace")));
        assert!(!loaded.table.contains(&ModelId::from("chgnet")));
        assert!(!loaded.table.contains(&ModelId::from("sevennet")));
    }

    #[test]
    fn unlisted_text_column_still_fails_without_subset() {
        let csv = "material_id,e_above_hull_true,formula,mace\nx,0.1,NaCl,0.2\n";
        assert!(matches!(
            parse_csv(csv.as_bytes(), &data()),
            Err(LoadError::BadValue { column, .. }) if column == "formula"
        ));
    }

    #[test]
    fn missing_truth_column() {
        let csv = "material_id,mace\nx,0.1\n";
        assert!(matches!(
            parse_csv(csv.as_bytes(), &data()),
            Err(LoadError::MissingColumn(c)) if c == "e_above_hull_true"
        ));
    }

    #[test]
    fn no_model_columns() {
        let csv = "material_id,e_above_hull_true\nx,0.1\n";
        assert!(matches!(
            parse_csv(csv.as_bytes(), &data()),
            Err(LoadError::NoModels { .. })
        ));
    }

    #[test]
    fn bad_value_reports_row_and_column() {
        let csv = "material_id,e_above_hull_true,mace\nx,0.1,0.2\ny,0.1,oops\n";
        match parse_csv(csv.as_bytes(), &data()) {
            Err(LoadError::BadValue { row, column, value }) => {
                assert_eq!(row, 3);
                assert_eq!(column, "mace");
                assert_eq!(value, "oops");
            }
            other => panic!("expected BadValue, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_ids_rejected() {
        let csv = "material_id,e_above_hull_true,mace\nx,0.1,0.2\nx,0.3,0.4\n";
        assert!(matches!(
            parse_csv(csv.as_bytes(), &data()),
            Err(LoadError::Core(CoreError::DuplicateMaterial(_)))
        ));
    }

    #[test]
    fn header_only_is_empty() {
        let csv = "material_id,e_above_hull_true,mace\n";
        assert!(matches!(
            parse_csv(csv.as_bytes(), &data()),
            Err(LoadError::Empty)
        ));
    }

    #[test]
    fn load_csv_missing_file() {
        let err = load_csv(Path::new("/nonexistent/preds.csv"), &data()).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
