//! HullBench CLI: evaluate stability predictions, generate synthetic data,
//! inspect saved reports.
//!
//! Commands:
//! - `evaluate`: score model predictions from a TOML config or a CSV file
//! - `synth`: write a deterministic synthetic prediction CSV
//! - `inspect`: print the summary of a saved report

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use hullbench_runner::{
    generate, load_artifacts, run_from_config, save_artifacts, EvalConfig, EvaluationReport,
    SyntheticSpec,
};

#[derive(Parser)]
#[command(
    name = "hullbench",
    version,
    about = "HullBench CLI: discovery metrics for crystal-stability predictions"
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate model predictions and write the artifact bundle.
    Evaluate {
        /// Path to a TOML config file.
        #[arg(long, conflicts_with = "input")]
        config: Option<PathBuf>,

        /// Prediction CSV (material_id, e_above_hull_true, one column per model).
        #[arg(long)]
        input: Option<PathBuf>,

        /// Stability threshold in eV/atom. Overrides the config value.
        #[arg(long, allow_hyphen_values = true)]
        threshold: Option<f64>,

        /// Output directory for artifacts. Overrides the config value.
        #[arg(long)]
        output_dir: Option<PathBuf>,
    },
    /// Write a deterministic synthetic prediction CSV.
    Synth {
        /// Output CSV path.
        #[arg(long)]
        output: PathBuf,

        /// Number of materials.
        #[arg(long, default_value_t = 10_000)]
        materials: usize,

        /// RNG seed.
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Comma-separated model names (noise grows down the list).
        #[arg(long, value_delimiter = ',')]
        models: Vec<String>,
    },
    /// Print the summary of a saved report (manifest.json or its directory).
    Inspect {
        /// Path to manifest.json or an artifact directory.
        manifest: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Evaluate {
            config,
            input,
            threshold,
            output_dir,
        } => run_evaluate_cmd(config, input, threshold, output_dir),
        Commands::Synth {
            output,
            materials,
            seed,
            models,
        } => run_synth_cmd(&output, materials, seed, &models),
        Commands::Inspect { manifest } => run_inspect_cmd(&manifest),
    }
}

fn run_evaluate_cmd(
    config: Option<PathBuf>,
    input: Option<PathBuf>,
    threshold: Option<f64>,
    output_dir: Option<PathBuf>,
) -> Result<()> {
    let mut eval_config = match (config, input) {
        (Some(path), None) => EvalConfig::from_file(&path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        (None, Some(path)) => EvalConfig::for_input(path),
        _ => bail!("provide exactly one of --config or --input"),
    };
    if let Some(t) = threshold {
        eval_config.evaluation.stability_threshold = t;
    }
    if let Some(dir) = output_dir {
        eval_config.output.dir = dir;
    }

    let report = run_from_config(&eval_config).context("evaluation failed")?;
    let run_dir = save_artifacts(&report, &eval_config.output.dir)?;

    print_summary(&report);
    println!();
    println!("Artifacts saved to: {}", run_dir.display());
    Ok(())
}

fn run_synth_cmd(output: &Path, materials: usize, seed: u64, models: &[String]) -> Result<()> {
    if materials == 0 {
        bail!("--materials must be at least 1");
    }
    let mut spec = if models.is_empty() {
        SyntheticSpec::default()
    } else {
        SyntheticSpec::with_model_names(models)
    };
    spec.n_materials = materials;
    spec.seed = seed;

    let data = generate(&spec);
    let csv = data.to_csv().context("failed to encode synthetic CSV")?;
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    std::fs::write(output, csv).with_context(|| format!("failed to write {}", output.display()))?;
    info!(
        path = %output.display(),
        materials,
        models = spec.models.len(),
        "synthetic dataset written"
    );

    println!(
        "Wrote {} materials x {} models to {}",
        materials,
        spec.models.len(),
        output.display()
    );
    Ok(())
}

fn run_inspect_cmd(manifest: &Path) -> Result<()> {
    let report = load_artifacts(manifest)?;
    print_summary(&report);
    Ok(())
}

fn fmt_opt(v: Option<f64>, digits: usize) -> String {
    v.map(|x| format!("{x:.digits$}"))
        .unwrap_or_else(|| "n/a".into())
}

fn print_summary(report: &EvaluationReport) {
    println!();
    println!("=== Evaluation Report ===");
    println!("Generated:      {}", report.generated_at.to_rfc3339());
    println!("Materials:      {}", report.n_materials);
    println!(
        "Stable:         {} (threshold {} eV/atom)",
        report.n_total_pos, report.stability_threshold
    );
    println!("Dataset Hash:   {}", report.dataset_hash);
    println!("Config Hash:    {}", report.config_hash);
    println!();
    println!("--- Leaderboard (by F1) ---");
    println!(
        "{:<20} {:>7} {:>9} {:>7} {:>9} {:>10} {:>7} {:>7}",
        "Model", "F1", "Precision", "Recall", "Accuracy", "Enrichment", "MAE", "R2"
    );
    for m in report.ranked_by_f1() {
        let d = &m.discovery;
        println!(
            "{:<20} {:>7} {:>9} {:>7} {:>9} {:>10} {:>7} {:>7}",
            m.model.as_str(),
            fmt_opt(d.f1, 3),
            fmt_opt(d.precision, 3),
            fmt_opt(d.recall, 3),
            fmt_opt(d.accuracy, 3),
            fmt_opt(d.enrichment, 2),
            fmt_opt(m.regression.mae, 3),
            fmt_opt(m.regression.r2, 3),
        );
    }
    for s in &report.skipped {
        println!("WARNING: skipped model '{}': {}", s.model, s.reason);
    }
}
