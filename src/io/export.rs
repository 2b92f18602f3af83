//! Export per-timepoint run results to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::path::Path;

use crate::app::pipeline::RunReport;
use crate::error::AppError;

const HEADER: [&str; 8] = [
    "timepoint",
    "status",
    "n_pairs",
    "slope",
    "intercept",
    "r_squared",
    "artifact",
    "error",
];

/// Write one row per timepoint, in configuration order.
pub fn write_summary_csv(path: &Path, report: &RunReport) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|e| AppError::new(2, format!("Failed to create summary CSV '{}': {e}", path.display())))?;

    writer
        .write_record(HEADER)
        .map_err(|e| AppError::new(2, format!("Failed to write summary CSV header: {e}")))?;

    for outcome in &report.outcomes {
        let record = match &outcome.result {
            Ok(out) => [
                outcome.timepoint.clone(),
                "ok".to_string(),
                out.pairs.len().to_string(),
                format!("{:.10}", out.line.slope),
                format!("{:.10}", out.line.intercept),
                format!("{:.6}", out.line.r_squared),
                out.artifact.display().to_string(),
                String::new(),
            ],
            Err(err) => [
                outcome.timepoint.clone(),
                "failed".to_string(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                String::new(),
                err.to_string(),
            ],
        };
        writer
            .write_record(&record)
            .map_err(|e| AppError::new(2, format!("Failed to write summary CSV row: {e}")))?;
    }

    writer
        .flush()
        .map_err(|e| AppError::new(2, format!("Failed to flush summary CSV: {e}")))?;
    Ok(())
}
