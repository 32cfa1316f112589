//! End-to-end pipeline: synthetic CSV on disk → TOML config → report →
//! artifact bundle → reload.

use std::path::Path;

use hullbench_runner::{
    generate, load_artifacts, run_evaluation, run_from_config, save_artifacts, EvalConfig,
    SyntheticModel, SyntheticSpec,
};
use proptest::prelude::*;

fn write_dataset(dir: &Path, spec: &SyntheticSpec) -> std::path::PathBuf {
    let path = dir.join("preds.csv");
    std::fs::write(&path, generate(spec).to_csv().unwrap()).unwrap();
    path
}

fn spec() -> SyntheticSpec {
    SyntheticSpec {
        n_materials: 2_000,
        seed: 11,
        stable_fraction: 0.2,
        models: vec![
            SyntheticModel::new("oracle", 0.0, 0.0),
            SyntheticModel::new("noisy", 0.1, 0.0),
            SyntheticModel::new("pessimist", 0.02, 0.3),
        ],
    }
}

#[test]
fn config_file_to_artifacts_and_back() {
    let dir = tempfile::tempdir().unwrap();
    write_dataset(dir.path(), &spec());
    let config_path = dir.path().join("eval.toml");
    std::fs::write(
        &config_path,
        r#"
[data]
path = "preds.csv"

[evaluation]
stability_threshold = 0.0
downsample_to = 100
"#,
    )
    .unwrap();

    let config = EvalConfig::from_file(&config_path).unwrap();
    let report = run_from_config(&config).unwrap();
    assert_eq!(report.n_materials, 2_000);
    assert_eq!(report.models.len(), 3);

    let oracle = report.model("oracle").unwrap();
    assert_eq!(oracle.discovery.precision, Some(1.0));
    assert_eq!(oracle.discovery.recall, Some(1.0));
    assert_eq!(oracle.regression.mae, Some(0.0));
    assert_eq!(oracle.curve.truncation_rank, report.n_total_pos);
    let last = oracle.curve.last().unwrap();
    assert_eq!(last.rank, report.n_total_pos);
    assert!((last.recall.unwrap() - 1.0).abs() < 1e-12);
    // step = floor(len / target) keeps fewer than 2 * target points
    assert!(oracle.curve.len() < 2 * 100);

    // a +0.3 eV/atom bias calls almost nothing stable
    let pessimist = report.model("pessimist").unwrap();
    assert!(
        pessimist.discovery.counts.predicted_positives()
            < oracle.discovery.counts.predicted_positives()
    );

    let ranked = report.ranked_by_f1();
    assert_eq!(ranked[0].model.as_str(), "oracle");

    let out = dir.path().join("results");
    let run_dir = save_artifacts(&report, &out).unwrap();
    assert!(run_dir.starts_with(&out));
    let reloaded = load_artifacts(&run_dir).unwrap();
    assert_eq!(reloaded.dataset_hash, report.dataset_hash);
    assert_eq!(reloaded.models.len(), 3);
}

#[test]
fn dataset_hash_matches_file_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_dataset(dir.path(), &spec());
    let report = run_from_config(&EvalConfig::for_input(&path)).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    assert_eq!(report.dataset_hash, blake3::hash(&bytes).to_hex().to_string());
}

#[test]
fn same_inputs_same_metrics() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_dataset(dir.path(), &spec());
    let config = EvalConfig::for_input(&path);
    let a = run_from_config(&config).unwrap();
    let b = run_from_config(&config).unwrap();
    assert_eq!(a.config_hash, b.config_hash);
    for (ma, mb) in a.models.iter().zip(&b.models) {
        assert_eq!(ma.discovery, mb.discovery);
        assert_eq!(ma.curve, mb.curve);
        assert_eq!(ma.rolling, mb.rolling);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn counts_cover_every_material(seed in 0u64..1_000, n in 1usize..400) {
        let spec = SyntheticSpec { n_materials: n, seed, ..SyntheticSpec::default() };
        let data = generate(&spec).into_loaded().unwrap();
        let config = EvalConfig::for_input("mem.csv");
        let report = run_evaluation(&config, &data).unwrap();
        for m in &report.models {
            prop_assert_eq!(m.discovery.n(), n);
            prop_assert_eq!(m.discovery.counts.actual_positives(), report.n_total_pos);
            prop_assert!(m.curve.len() <= n);
            let hist_total: usize = m.histogram.iter().map(|b| b.n_true).sum();
            prop_assert!(hist_total <= n);
        }
    }
}
