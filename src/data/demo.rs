//! Synthetic count files for trying the pipeline end to end.
//!
//! Each timepoint gets one file per technique, named by the configured
//! template. A latent "true" cell count per sample grows with the timepoint
//! index; the x technique observes it directly and the y technique observes
//! a linear response of it. Replicate-storage techniques get several noisy
//! rows per sample, per-sample techniques get one.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::PathBuf;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{PipelineConfig, StorageKind, Technique};
use crate::error::AppError;

/// Latent counts are drawn uniformly from this range (before growth).
const BASE_RANGE: (f64, f64) = (40.0, 160.0);
/// Multiplicative growth per timepoint index.
const GROWTH_PER_TIMEPOINT: f64 = 0.6;
/// y technique response: `y = slope * true + intercept`.
const Y_RESPONSE: (f64, f64) = (0.9, 5.0);
/// Relative noise of a single replicate reading.
const REPLICATE_NOISE: f64 = 0.08;
/// Relative noise of a pre-aggregated reading.
const SAMPLE_NOISE: f64 = 0.04;

#[derive(Debug, Clone, Copy)]
pub struct DemoOptions {
    pub samples: usize,
    pub replicates: usize,
    pub seed: u64,
}

impl Default for DemoOptions {
    fn default() -> Self {
        Self {
            samples: 12,
            replicates: 3,
            seed: 42,
        }
    }
}

/// Write demo source files for every configured timepoint into `config.data_dir`.
pub fn generate_demo_dataset(config: &PipelineConfig, opts: &DemoOptions) -> Result<Vec<PathBuf>, AppError> {
    if opts.samples == 0 {
        return Err(AppError::new(2, "Sample count must be > 0."));
    }
    if opts.replicates == 0 {
        return Err(AppError::new(2, "Replicate count must be > 0."));
    }

    std::fs::create_dir_all(&config.data_dir).map_err(|e| {
        AppError::new(
            2,
            format!("Failed to create data dir '{}': {e}", config.data_dir.display()),
        )
    })?;

    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(4, format!("Noise distribution error: {e}")))?;

    let mut written = Vec::with_capacity(config.timepoints.len() * 2);
    for (idx, timepoint) in config.timepoints.iter().enumerate() {
        let mut rng = StdRng::seed_from_u64(demo_seed(opts.seed, timepoint));
        let growth = 1.0 + idx as f64 * GROWTH_PER_TIMEPOINT;

        let latent: Vec<f64> = (0..opts.samples)
            .map(|_| rng.gen_range(BASE_RANGE.0..BASE_RANGE.1) * growth)
            .collect();
        let (slope, intercept) = Y_RESPONSE;
        let response: Vec<f64> = latent.iter().map(|v| slope * v + intercept).collect();

        for (technique, means) in [(&config.x_technique, &latent), (&config.y_technique, &response)] {
            let rows = technique_rows(technique, means, opts.replicates, &mut rng, &normal);
            let path = config.source_path(technique, timepoint);
            write_rows(&path, &rows)?;
            written.push(path);
        }
        log::info!("[{timepoint}] wrote demo data for {} samples", opts.samples);
    }

    Ok(written)
}

fn technique_rows(
    technique: &Technique,
    means: &[f64],
    replicates: usize,
    rng: &mut StdRng,
    normal: &Normal<f64>,
) -> Vec<(i64, f64)> {
    let (per_sample, noise) = match technique.storage {
        StorageKind::Replicates => (replicates, REPLICATE_NOISE),
        StorageKind::PerSample => (1, SAMPLE_NOISE),
    };

    let mut rows = Vec::with_capacity(means.len() * per_sample);
    for (i, &mean) in means.iter().enumerate() {
        let key = i as i64 + 1;
        for _ in 0..per_sample {
            let z = normal.sample(rng);
            let count = (mean * (1.0 + noise * z)).round().max(0.0);
            rows.push((key, count));
        }
    }
    rows
}

fn write_rows(path: &std::path::Path, rows: &[(i64, f64)]) -> Result<(), AppError> {
    let fail = |e: csv::Error| AppError::new(2, format!("Failed to write demo file '{}': {e}", path.display()));

    let mut writer = csv::Writer::from_path(path).map_err(fail)?;
    writer.write_record(["Culture Number", "Count"]).map_err(fail)?;
    for (key, count) in rows {
        writer
            .write_record([key.to_string(), format!("{count:.0}")])
            .map_err(fail)?;
    }
    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush demo file '{}': {e}", path.display())))?;
    Ok(())
}

/// Per-timepoint seed: same base seed and label always give the same data.
fn demo_seed(seed: u64, timepoint: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    timepoint.hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate_replicates;
    use crate::domain::AggregationMode;
    use crate::io::load_count_rows;

    fn config_in(dir: &std::path::Path) -> PipelineConfig {
        PipelineConfig {
            data_dir: dir.to_path_buf(),
            timepoints: vec!["24h".to_string(), "48h".to_string()],
            ..PipelineConfig::default()
        }
    }

    #[test]
    fn writes_one_file_per_technique_and_timepoint() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let opts = DemoOptions {
            samples: 5,
            replicates: 3,
            seed: 7,
        };

        let written = generate_demo_dataset(&config, &opts).unwrap();
        assert_eq!(written.len(), 4);

        let dic = load_count_rows(&config.source_path(&config.x_technique, "48h")).unwrap();
        let dapi = load_count_rows(&config.source_path(&config.y_technique, "48h")).unwrap();
        assert_eq!(dic.len(), 15);
        assert_eq!(dapi.len(), 5);
        assert!(dic.iter().all(|r| r.count >= 0.0 && r.count.fract() == 0.0));

        let averaged = aggregate_replicates(&dic, AggregationMode::Complete, config.first_key());
        assert_eq!(averaged.len(), 5);
    }

    #[test]
    fn same_seed_gives_identical_files() {
        let a = tempfile::tempdir().unwrap();
        let b = tempfile::tempdir().unwrap();
        let opts = DemoOptions::default();

        generate_demo_dataset(&config_in(a.path()), &opts).unwrap();
        generate_demo_dataset(&config_in(b.path()), &opts).unwrap();

        let name = "task1_data - DIC-24h.csv";
        let left = std::fs::read_to_string(a.path().join(name)).unwrap();
        let right = std::fs::read_to_string(b.path().join(name)).unwrap();
        assert_eq!(left, right);
    }

    #[test]
    fn rejects_zero_samples() {
        let dir = tempfile::tempdir().unwrap();
        let opts = DemoOptions {
            samples: 0,
            ..DemoOptions::default()
        };
        let err = generate_demo_dataset(&config_in(dir.path()), &opts).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
