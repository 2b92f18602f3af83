//! Input/output helpers.
//!
//! - count-file ingest (`ingest`)
//! - configuration JSON read/write (`config`)
//! - run summary export (`export`)

pub mod config;
pub mod export;
pub mod ingest;

pub use config::*;
pub use export::*;
pub use ingest::*;
