//! Run configuration passed into the pipeline orchestrator.
//!
//! Everything that used to be a module-level constant (timepoint list, file
//! name template, technique names) lives here so callers and tests can inject
//! their own fixtures.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{AggregationMode, SampleKey, StorageKind, Technique};
use crate::error::AppError;

pub const TECHNIQUE_PLACEHOLDER: &str = "{technique}";
pub const TIMEPOINT_PLACEHOLDER: &str = "{timepoint}";

pub const DEFAULT_TEMPLATE: &str = "task1_data - {technique}-{timepoint}.csv";
pub const DEFAULT_TIMEPOINTS: [&str; 4] = ["24h", "48h", "72h", "96h"];

/// Fully resolved pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory the source templates are resolved against.
    pub data_dir: PathBuf,
    /// Directory charts are written into.
    pub output_dir: PathBuf,
    /// Timepoint labels, processed independently.
    pub timepoints: Vec<String>,
    /// Source file name template with `{technique}` and `{timepoint}`.
    pub file_template: String,
    /// Technique plotted on the x axis.
    pub x_technique: Technique,
    /// Technique plotted on the y axis.
    pub y_technique: Technique,
    pub aggregation: AggregationMode,
    /// Key the partial and reference aggregators expect first.
    pub first_key: i64,
    pub width: u32,
    pub height: u32,
    /// TTF used for chart text; system fonts are searched when unset.
    pub font: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("task1_data"),
            output_dir: PathBuf::from("."),
            timepoints: DEFAULT_TIMEPOINTS.iter().map(|s| s.to_string()).collect(),
            file_template: DEFAULT_TEMPLATE.to_string(),
            x_technique: Technique::new("DIC", StorageKind::Replicates),
            y_technique: Technique::new("DAPI", StorageKind::PerSample),
            aggregation: AggregationMode::Partial,
            first_key: 1,
            width: 500,
            height: 500,
            font: None,
        }
    }
}

impl PipelineConfig {
    /// Reject configurations that cannot produce any output.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.timepoints.is_empty() {
            return Err(AppError::new(2, "At least one timepoint is required."));
        }
        if let Some(tp) = self.timepoints.iter().find(|tp| tp.trim().is_empty()) {
            return Err(AppError::new(2, format!("Invalid timepoint label '{tp}'.")));
        }
        for placeholder in [TECHNIQUE_PLACEHOLDER, TIMEPOINT_PLACEHOLDER] {
            if !self.file_template.contains(placeholder) {
                return Err(AppError::new(
                    2,
                    format!("File template '{}' is missing `{placeholder}`.", self.file_template),
                ));
            }
        }
        if self.x_technique.name == self.y_technique.name {
            return Err(AppError::new(
                2,
                format!("Both axes use technique '{}'.", self.x_technique.name),
            ));
        }
        if self.width == 0 || self.height == 0 {
            return Err(AppError::new(2, "Chart width and height must be > 0."));
        }
        Ok(())
    }

    pub fn first_key(&self) -> SampleKey {
        SampleKey(self.first_key)
    }

    /// Path of the source file for one technique at one timepoint.
    pub fn source_path(&self, technique: &Technique, timepoint: &str) -> PathBuf {
        let name = self
            .file_template
            .replace(TECHNIQUE_PLACEHOLDER, &technique.name)
            .replace(TIMEPOINT_PLACEHOLDER, timepoint);
        self.data_dir.join(name)
    }

    /// `"<timepoint> - <y technique> vs <x technique> Count"`.
    pub fn chart_title(&self, timepoint: &str) -> String {
        format!(
            "{timepoint} - {} vs {} Count",
            self.y_technique.name, self.x_technique.name
        )
    }

    /// Output image path, named after the chart title.
    pub fn artifact_path(&self, title: &str) -> PathBuf {
        artifact_path_in(&self.output_dir, title)
    }
}

fn artifact_path_in(dir: &Path, title: &str) -> PathBuf {
    // A label like "24h/a" must not escape into a sub-directory.
    let file_name: String = title
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    dir.join(format!("{file_name}.png"))
}
