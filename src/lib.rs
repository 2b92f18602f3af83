//! `count-compare` library crate.
//!
//! Compares two cell-counting techniques measured on the same samples:
//! replicate counts are averaged per sample, paired by position with the
//! other technique, fitted with a least-squares line and charted to PNG,
//! once per timepoint.
//!
//! The binary (`ccmp`) is a thin wrapper around this library so the pipeline
//! is testable without spawning processes.

pub mod aggregate;
pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod plot;
pub mod report;
pub mod series;
