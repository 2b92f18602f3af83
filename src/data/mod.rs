//! Synthetic input data.

pub mod demo;

pub use demo::*;
