//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - typed rows and aggregated samples (`CountRow`, `AggregatedSample`)
//! - scatter coordinates (`CoordinatePair`)
//! - per-technique policies (`Technique`, `StorageKind`, `AggregationMode`)
//! - the run configuration (`PipelineConfig`)

pub mod config;
pub mod types;

pub use config::*;
pub use types::*;
