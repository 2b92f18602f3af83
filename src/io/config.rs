//! Read/write pipeline configuration files.
//!
//! The file is the JSON form of `domain::PipelineConfig`. Missing keys fall
//! back to the defaults, so a file only needs to list what it changes.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use crate::domain::PipelineConfig;
use crate::error::AppError;

/// Read a configuration JSON file.
pub fn read_config_json(path: &Path) -> Result<PipelineConfig, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open config '{}': {e}", path.display())))?;
    let config: PipelineConfig = serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid config '{}': {e}", path.display())))?;
    Ok(config)
}

/// Write a configuration JSON file.
pub fn write_config_json(path: &Path, config: &PipelineConfig) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create config '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(BufWriter::new(file), config)
        .map_err(|e| AppError::new(2, format!("Failed to write config: {e}")))?;
    Ok(())
}
