//! Regression fitting between the two techniques.

pub mod line;

pub use line::*;
