//! Per-timepoint pipeline shared by every front-end command.
//!
//! For one timepoint the workflow is a strict chain:
//! load both sources -> aggregate replicates -> pair -> fit -> render -> write
//!
//! Timepoints are independent: they run in parallel on the rayon pool, share
//! no mutable state and each writes its own file. A failing timepoint is
//! recorded in the [`RunReport`] and never stops the others.

use std::path::PathBuf;

use rayon::prelude::*;

use crate::aggregate::{aggregate_replicates, per_sample};
use crate::domain::{AggregatedSample, AggregationMode, CoordinatePair, PipelineConfig, StorageKind, Technique};
use crate::error::PipelineError;
use crate::fit::{FittedLine, fit_line};
use crate::io::load_count_rows;
use crate::plot::{ChartSpec, ensure_font, render_png};
use crate::series::{key_mismatches, pair_series, projections};

/// All computed outputs of a single timepoint.
#[derive(Debug, Clone)]
pub struct TimepointOutput {
    pub timepoint: String,
    pub title: String,
    pub pairs: Vec<CoordinatePair>,
    pub line: FittedLine,
    pub artifact: PathBuf,
}

/// Result of one timepoint, successful or not.
#[derive(Debug)]
pub struct TimepointOutcome {
    pub timepoint: String,
    pub result: Result<TimepointOutput, PipelineError>,
}

/// Outcomes of every configured timepoint, in configuration order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub outcomes: Vec<TimepointOutcome>,
}

impl RunReport {
    pub fn succeeded(&self) -> impl Iterator<Item = &TimepointOutput> {
        self.outcomes.iter().filter_map(|o| o.result.as_ref().ok())
    }

    pub fn failed(&self) -> impl Iterator<Item = (&str, &PipelineError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.timepoint.as_str(), e)))
    }

    pub fn is_success(&self) -> bool {
        self.failed().next().is_none()
    }
}

/// Run every configured timepoint and collect all outcomes.
pub fn run_all(config: &PipelineConfig) -> RunReport {
    ensure_font(config.font.as_deref());

    let outcomes = config
        .timepoints
        .par_iter()
        .map(|timepoint| {
            let result = run_timepoint(config, timepoint);
            if let Err(e) = &result {
                log::error!("[{timepoint}] {e}");
            }
            TimepointOutcome {
                timepoint: timepoint.clone(),
                result,
            }
        })
        .collect();

    RunReport { outcomes }
}

/// Execute the full pipeline for one timepoint.
pub fn run_timepoint(config: &PipelineConfig, timepoint: &str) -> Result<TimepointOutput, PipelineError> {
    log::info!("[{timepoint}] processing");

    let (pairs, line) = fit_timepoint(config, timepoint)?;

    let title = config.chart_title(timepoint);
    let x_label = config.x_technique.axis_label();
    let y_label = config.y_technique.axis_label();
    let spec = ChartSpec::new(
        &title,
        (x_label.as_str(), y_label.as_str()),
        &pairs,
        &line,
        (config.width, config.height),
    );
    let png = render_png(&spec)?;

    let artifact = config.artifact_path(&title);
    if let Some(dir) = artifact.parent() {
        std::fs::create_dir_all(dir).map_err(|source| PipelineError::Persist {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(&artifact, png).map_err(|source| PipelineError::Persist {
        path: artifact.clone(),
        source,
    })?;
    log::info!("[{timepoint}] wrote '{}'", artifact.display());

    Ok(TimepointOutput {
        timepoint: timepoint.to_string(),
        title,
        pairs,
        line,
        artifact,
    })
}

/// Load, aggregate, pair and fit one timepoint without rendering.
pub fn fit_timepoint(
    config: &PipelineConfig,
    timepoint: &str,
) -> Result<(Vec<CoordinatePair>, FittedLine), PipelineError> {
    let (x, y) = rayon::join(
        || load_technique(config, &config.x_technique, timepoint),
        || load_technique(config, &config.y_technique, timepoint),
    );
    let (x, y) = (x?, y?);

    let pairs = pair_series(&x, &y).inspect_err(|e| {
        if let PipelineError::LengthMismatch { x_len, y_len } = e {
            hint_trailing_group(config, *x_len, *y_len, timepoint);
        }
    })?;

    let mismatched = key_mismatches(&x, &y);
    if mismatched > 0 {
        log::warn!("[{timepoint}] {mismatched} of {} pairs join different sample keys", pairs.len());
    }

    let (xs, ys) = projections(&pairs);
    let line = fit_line(&xs, &ys)?;
    log::debug!(
        "[{timepoint}] n={} slope={:.6} intercept={:.6} r2={:.4}",
        line.n,
        line.slope,
        line.intercept,
        line.r_squared
    );

    Ok((pairs, line))
}

/// Load one technique's file and reduce it to one value per sample.
pub fn load_technique(
    config: &PipelineConfig,
    technique: &Technique,
    timepoint: &str,
) -> Result<Vec<AggregatedSample>, PipelineError> {
    let path = config.source_path(technique, timepoint);
    let rows = load_count_rows(&path)?;

    let samples = match technique.storage {
        StorageKind::Replicates => aggregate_replicates(&rows, config.aggregation, config.first_key()),
        StorageKind::PerSample => per_sample(&rows),
    };
    log::debug!(
        "[{timepoint}] {}: {} rows -> {} samples",
        technique.name,
        rows.len(),
        samples.len()
    );
    Ok(samples)
}

fn hint_trailing_group(config: &PipelineConfig, x_len: usize, y_len: usize, timepoint: &str) {
    let replicate_len = match (config.x_technique.storage, config.y_technique.storage) {
        (StorageKind::Replicates, StorageKind::PerSample) => Some((x_len, y_len)),
        (StorageKind::PerSample, StorageKind::Replicates) => Some((y_len, x_len)),
        _ => None,
    };
    if config.aggregation != AggregationMode::Complete
        && matches!(replicate_len, Some((r, p)) if r + 1 == p)
    {
        log::warn!(
            "[{timepoint}] {:?} aggregation did not emit the last replicate group; \
             use `--aggregation complete` to include it",
            config.aggregation
        );
    }
}
