//! Reporting and export: JSON, CSV, and Markdown artifact generation.
//!
//! Provides three export formats for evaluation reports:
//! - **JSON**: full round-trip serialization with schema versioning
//! - **CSV**: per-model metrics plus long-format curves, rolling profiles and histograms
//! - **Markdown**: a human-readable leaderboard
//!
//! Undefined metrics are written as `null` in JSON and as empty cells in CSV,
//! never as `NaN`. Unknown schema versions are rejected on load.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::evaluation::{EvaluationReport, SCHEMA_VERSION};

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize an `EvaluationReport` to pretty JSON.
pub fn export_json(report: &EvaluationReport) -> Result<String> {
    serde_json::to_string_pretty(report).context("failed to serialize EvaluationReport to JSON")
}

/// Deserialize an `EvaluationReport` from JSON, rejecting unknown schema versions.
pub fn import_json(json: &str) -> Result<EvaluationReport> {
    let report: EvaluationReport =
        serde_json::from_str(json).context("failed to deserialize EvaluationReport from JSON")?;
    if report.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            report.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(report)
}

// ─── CSV export ─────────────────────────────────────────────────────

fn opt(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.6}")).unwrap_or_default()
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// One row per model.
///
/// Columns: model, n, true_pos, false_neg, false_pos, true_neg, precision,
/// recall, f1, accuracy, enrichment, prevalence, mae, rmse, r2
pub fn export_metrics_csv(report: &EvaluationReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "model",
        "n",
        "true_pos",
        "false_neg",
        "false_pos",
        "true_neg",
        "precision",
        "recall",
        "f1",
        "accuracy",
        "enrichment",
        "prevalence",
        "mae",
        "rmse",
        "r2",
    ])?;
    for m in &report.models {
        let d = &m.discovery;
        let r = &m.regression;
        wtr.write_record([
            m.model.as_str(),
            &d.n().to_string(),
            &d.counts.true_pos.to_string(),
            &d.counts.false_neg.to_string(),
            &d.counts.false_pos.to_string(),
            &d.counts.true_neg.to_string(),
            &opt(d.precision),
            &opt(d.recall),
            &opt(d.f1),
            &opt(d.accuracy),
            &opt(d.enrichment),
            &opt(d.prevalence),
            &opt(r.mae),
            &opt(r.rmse),
            &opt(r.r2),
        ])?;
    }
    finish(wtr)
}

/// Long format, one row per curve point: model, rank, precision, recall.
pub fn export_curves_csv(report: &EvaluationReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["model", "rank", "precision", "recall"])?;
    for m in &report.models {
        for p in &m.curve.points {
            wtr.write_record([
                m.model.as_str(),
                &p.rank.to_string(),
                &opt(p.precision),
                &opt(p.recall),
            ])?;
        }
    }
    finish(wtr)
}

/// Long format: model, bin_center, mae, sem, count.
pub fn export_rolling_csv(report: &EvaluationReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["model", "bin_center", "mae", "sem", "count"])?;
    for m in &report.models {
        for p in &m.rolling {
            wtr.write_record([
                m.model.as_str(),
                &format!("{:.4}", p.bin_center),
                &opt(p.mae),
                &opt(p.sem),
                &p.count.to_string(),
            ])?;
        }
    }
    finish(wtr)
}

/// Long format: model, left, right, per-class counts, n_true, accuracy.
pub fn export_histogram_csv(report: &EvaluationReport) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "model",
        "left",
        "right",
        "true_pos",
        "false_neg",
        "false_pos",
        "true_neg",
        "n_true",
        "accuracy",
    ])?;
    for m in &report.models {
        for b in &m.histogram {
            wtr.write_record([
                m.model.as_str(),
                &format!("{:.4}", b.left),
                &format!("{:.4}", b.right),
                &b.counts.true_pos.to_string(),
                &b.counts.false_neg.to_string(),
                &b.counts.false_pos.to_string(),
                &b.counts.true_neg.to_string(),
                &b.n_true.to_string(),
                &opt(b.accuracy),
            ])?;
        }
    }
    finish(wtr)
}

// ─── Markdown report ────────────────────────────────────────────────

fn pct(v: Option<f64>) -> String {
    v.map(|x| format!("{:.1}%", x * 100.0))
        .unwrap_or_else(|| "n/a".into())
}

fn num(v: Option<f64>, digits: usize) -> String {
    v.map(|x| format!("{x:.digits$}"))
        .unwrap_or_else(|| "n/a".into())
}

/// Markdown leaderboard, models ordered by F1.
pub fn generate_report(report: &EvaluationReport) -> String {
    let mut md = String::with_capacity(2048);

    md.push_str("# Stability Discovery Report\n\n");

    md.push_str("## Metadata\n\n");
    md.push_str("| Field | Value |\n");
    md.push_str("| --- | --- |\n");
    md.push_str(&format!("| Generated | {} |\n", report.generated_at.to_rfc3339()));
    md.push_str(&format!("| Materials | {} |\n", report.n_materials));
    md.push_str(&format!(
        "| Stable (≤ {} eV/atom) | {} |\n",
        report.stability_threshold, report.n_total_pos
    ));
    md.push_str(&format!("| Dataset Hash | {} |\n", report.dataset_hash));
    md.push_str(&format!("| Config Hash | {} |\n", report.config_hash));
    md.push('\n');

    md.push_str("## Leaderboard\n\n");
    md.push_str("| Model | F1 | Precision | Recall | Accuracy | Enrichment | MAE | RMSE | R² |\n");
    md.push_str("| --- | --- | --- | --- | --- | --- | --- | --- | --- |\n");
    for m in report.ranked_by_f1() {
        let d = &m.discovery;
        let r = &m.regression;
        md.push_str(&format!(
            "| {} | {} | {} | {} | {} | {} | {} | {} | {} |\n",
            m.model,
            num(d.f1, 3),
            pct(d.precision),
            pct(d.recall),
            pct(d.accuracy),
            num(d.enrichment, 2),
            num(r.mae, 3),
            num(r.rmse, 3),
            num(r.r2, 3),
        ));
    }
    md.push('\n');

    if !report.skipped.is_empty() {
        md.push_str("## Skipped Models\n\n");
        for s in &report.skipped {
            md.push_str(&format!("- `{}`: {}\n", s.model, s.reason));
        }
        md.push('\n');
    }

    md
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for an evaluation run.
///
/// Creates a directory named `eval_{timestamp}/` under `output_dir`
/// containing:
/// - `manifest.json`: the full `EvaluationReport`
/// - `metrics.csv`: one row of discovery + regression metrics per model
/// - `curves.csv`: cumulative precision/recall
/// - `rolling_mae.csv`: rolling error profiles
/// - `histogram.csv`: classified histograms
/// - `report.md`: Markdown leaderboard
///
/// Returns the path to the created directory.
pub fn save_artifacts(report: &EvaluationReport, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!("eval_{}", chrono::Local::now().format("%Y%m%d_%H%M%S"));
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let files = [
        ("manifest.json", export_json(report)?),
        ("metrics.csv", export_metrics_csv(report)?),
        ("curves.csv", export_curves_csv(report)?),
        ("rolling_mae.csv", export_rolling_csv(report)?),
        ("histogram.csv", export_histogram_csv(report)?),
        ("report.md", generate_report(report)),
    ];
    for (name, content) in &files {
        let path = run_dir.join(name);
        std::fs::write(&path, content)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    info!(dir = %run_dir.display(), "artifacts written");
    Ok(run_dir)
}

/// Load an `EvaluationReport` from an artifact directory's manifest.json,
/// or from a manifest path directly.
///
/// Rejects unknown schema versions.
pub fn load_artifacts(path: &Path) -> Result<EvaluationReport> {
    let manifest_path = if path.is_dir() {
        path.join("manifest.json")
    } else {
        path.to_path_buf()
    };
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EvalConfig;
    use crate::data_loader::LoadedData;
    use crate::evaluation::run_evaluation;
    use hullbench_core::MaterialId;

    fn sample_report() -> EvaluationReport {
        let ids = (0..4).map(|i| MaterialId::new(format!("m{i}"))).collect();
        let data = LoadedData::from_columns(
            ids,
            vec![-0.1, 0.05, -0.02, 0.2],
            vec![
                ("good".to_string(), vec![-0.05, 0.1, -0.01, 0.15]),
                ("inverted".to_string(), vec![0.01, -0.01, 0.01, -0.01]),
            ],
            "abc123".into(),
        )
        .unwrap();
        let mut config = EvalConfig::for_input("unused.csv");
        config.data.models = vec!["good".into(), "inverted".into(), "ghost".into()];
        run_evaluation(&config, &data).unwrap()
    }

    #[test]
    fn json_round_trip() {
        let report = sample_report();
        let json = export_json(&report).unwrap();
        let loaded = import_json(&json).unwrap();
        assert_eq!(loaded.models.len(), report.models.len());
        assert_eq!(loaded.dataset_hash, "abc123");
        assert_eq!(loaded.generated_at, report.generated_at);
        assert_eq!(loaded.models[0].curve, report.models[0].curve);
        assert_eq!(loaded.models[1].discovery, report.models[1].discovery);
    }

    #[test]
    fn undefined_metrics_are_json_null() {
        let report = sample_report();
        let json = export_json(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let inverted = &value["models"][1];
        assert_eq!(inverted["model"], "inverted");
        assert!(inverted["discovery"]["f1"].is_null());
        assert!(!value.to_string().contains("NaN"));
    }

    #[test]
    fn future_schema_rejected() {
        let mut report = sample_report();
        report.schema_version = SCHEMA_VERSION + 1;
        let json = export_json(&report).unwrap();
        let err = import_json(&json).unwrap_err();
        assert!(err.to_string().contains("unsupported schema version"));
    }

    #[test]
    fn missing_schema_version_defaults() {
        let report = sample_report();
        let mut value = serde_json::to_value(&report).unwrap();
        value.as_object_mut().unwrap().remove("schema_version");
        let loaded = import_json(&value.to_string()).unwrap();
        assert_eq!(loaded.schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn metrics_csv_leaves_undefined_cells_empty() {
        let csv = export_metrics_csv(&sample_report()).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("model,n,true_pos"));
        let inverted: Vec<&str> = lines[2].split(',').collect();
        assert_eq!(inverted[0], "inverted");
        // f1 column
        assert_eq!(inverted[8], "");
        assert_eq!(inverted[6], "0.000000");
    }

    #[test]
    fn curves_csv_is_long_format() {
        let report = sample_report();
        let csv = export_curves_csv(&report).unwrap();
        let expected_rows: usize = report.models.iter().map(|m| m.curve.len()).sum();
        assert_eq!(csv.lines().count(), expected_rows + 1);
        assert!(csv.starts_with("model,rank,precision,recall"));
    }

    #[test]
    fn rolling_and_histogram_csv_row_counts() {
        let report = sample_report();
        let rolling = export_rolling_csv(&report).unwrap();
        assert_eq!(rolling.lines().count(), 2 * 250 + 1);
        let hist = export_histogram_csv(&report).unwrap();
        assert_eq!(hist.lines().count(), 2 * 40 + 1);
    }

    #[test]
    fn markdown_lists_models_and_skips() {
        let md = generate_report(&sample_report());
        assert!(md.contains("# Stability Discovery Report"));
        assert!(md.contains("| good | 1.000 |"));
        assert!(md.contains("| inverted | n/a |"));
        assert!(md.contains("`ghost`"));
    }

    #[test]
    fn save_and_load_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        let report = sample_report();
        let run_dir = save_artifacts(&report, dir.path()).unwrap();

        for name in [
            "manifest.json",
            "metrics.csv",
            "curves.csv",
            "rolling_mae.csv",
            "histogram.csv",
            "report.md",
        ] {
            assert!(run_dir.join(name).exists(), "{name} missing");
        }

        let loaded = load_artifacts(&run_dir).unwrap();
        assert_eq!(loaded.schema_version, SCHEMA_VERSION);
        assert_eq!(loaded.config_hash, report.config_hash);

        let via_manifest = load_artifacts(&run_dir.join("manifest.json")).unwrap();
        assert_eq!(via_manifest.n_materials, 4);
    }
}
