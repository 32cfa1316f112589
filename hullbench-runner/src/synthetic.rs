//! Deterministic synthetic prediction datasets.
//!
//! Used for demos, benchmarks and tests when no real model predictions are
//! at hand. True hull distances follow a two-sided mixture: a fraction of
//! materials sits on or below the hull, the rest spreads above it with a
//! heavier tail. Each model adds its own bias and Gaussian noise.
//!
//! Every model draws from its own RNG stream whose seed is derived from the
//! master seed and the model name via BLAKE3, so adding or reordering models
//! never changes another model's predictions.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use hullbench_core::MaterialId;

use crate::config::DataConfig;
use crate::data_loader::{parse_csv, LoadError, LoadedData};

/// One synthetic model: predictions are `true + bias + noise * N(0, 1)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticModel {
    pub name: String,
    /// Standard deviation of the prediction error (eV/atom).
    pub noise: f64,
    /// Systematic offset (eV/atom); positive means the model under-predicts stability.
    pub bias: f64,
}

impl SyntheticModel {
    pub fn new(name: impl Into<String>, noise: f64, bias: f64) -> Self {
        Self {
            name: name.into(),
            noise,
            bias,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntheticSpec {
    pub n_materials: usize,
    pub seed: u64,
    /// Fraction of materials drawn on or below the hull.
    pub stable_fraction: f64,
    pub models: Vec<SyntheticModel>,
}

impl Default for SyntheticSpec {
    fn default() -> Self {
        Self {
            n_materials: 10_000,
            seed: 42,
            stable_fraction: 0.15,
            models: vec![
                SyntheticModel::new("precise", 0.03, 0.0),
                SyntheticModel::new("noisy", 0.12, 0.0),
                SyntheticModel::new("biased", 0.05, 0.04),
            ],
        }
    }
}

impl SyntheticSpec {
    /// Default spec with the given model names, noise increasing down the list.
    pub fn with_model_names(names: &[String]) -> Self {
        let models = names
            .iter()
            .enumerate()
            .map(|(i, name)| SyntheticModel::new(name.clone(), 0.03 * (i + 1) as f64, 0.0))
            .collect();
        Self {
            models,
            ..Self::default()
        }
    }
}

/// Generated columns, positionally aligned.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticData {
    pub ids: Vec<MaterialId>,
    pub e_above_hull_true: Vec<f64>,
    pub predictions: BTreeMap<String, Vec<f64>>,
}

/// Generate a dataset from `spec`. Same spec, same data.
pub fn generate(spec: &SyntheticSpec) -> SyntheticData {
    let mut rng = StdRng::seed_from_u64(spec.seed);
    let stable_fraction = spec.stable_fraction.clamp(0.0, 1.0);

    let ids = (0..spec.n_materials)
        .map(|i| MaterialId::new(format!("syn-{i:06}")))
        .collect();
    let e_above_hull_true: Vec<f64> = (0..spec.n_materials)
        .map(|_| {
            if rng.gen::<f64>() < stable_fraction {
                -(standard_normal(&mut rng) * 0.05).abs()
            } else {
                (standard_normal(&mut rng) * 0.15).abs() + rng.gen_range(0.0..0.05)
            }
        })
        .map(round_mev)
        .collect();

    let predictions = spec
        .models
        .iter()
        .map(|model| {
            let mut model_rng = StdRng::seed_from_u64(sub_seed(spec.seed, &model.name));
            let preds: Vec<f64> = e_above_hull_true
                .iter()
                .map(|e| round_mev(e + model.bias + model.noise * standard_normal(&mut model_rng)))
                .collect();
            (model.name.clone(), preds)
        })
        .collect();

    SyntheticData {
        ids,
        e_above_hull_true,
        predictions,
    }
}

impl SyntheticData {
    /// CSV in the loader's default layout.
    pub fn to_csv(&self) -> Result<String, csv::Error> {
        let mut wtr = csv::Writer::from_writer(vec![]);
        let mut header = vec!["material_id", "e_above_hull_true"];
        header.extend(self.predictions.keys().map(String::as_str));
        wtr.write_record(&header)?;

        for (i, id) in self.ids.iter().enumerate() {
            let mut row = vec![id.to_string(), self.e_above_hull_true[i].to_string()];
            row.extend(self.predictions.values().map(|col| col[i].to_string()));
            wtr.write_record(&row)?;
        }
        let data = wtr.into_inner().map_err(|e| e.into_error())?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    /// Load through the CSV path so the dataset hash matches a file written by
    /// [`SyntheticData::to_csv`].
    pub fn into_loaded(self) -> Result<LoadedData, LoadError> {
        let csv = self.to_csv()?;
        parse_csv(csv.as_bytes(), &DataConfig::new("synthetic.csv"))
    }
}

/// Box–Muller draw from N(0, 1).
fn standard_normal(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen_range(f64::EPSILON..1.0);
    let u2: f64 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
}

/// Keep values at meV/atom resolution so CSV text stays short.
fn round_mev(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}

fn sub_seed(master: u64, model: &str) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&master.to_le_bytes());
    hasher.update(model.as_bytes());
    let hash = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}
