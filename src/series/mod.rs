//! Paired series construction.
//!
//! Two independently aggregated series are joined purely by position: pair
//! `i` is `(x[i].value, y[i].value)`. Sample keys are not cross-checked, so
//! both files are assumed to list the same samples in the same order.

use crate::domain::{AggregatedSample, CoordinatePair};
use crate::error::PipelineError;

/// Zip two aggregated series into scatter coordinates.
///
/// Fails with [`PipelineError::LengthMismatch`] rather than truncating.
pub fn pair_series(
    x: &[AggregatedSample],
    y: &[AggregatedSample],
) -> Result<Vec<CoordinatePair>, PipelineError> {
    if x.len() != y.len() {
        return Err(PipelineError::LengthMismatch {
            x_len: x.len(),
            y_len: y.len(),
        });
    }

    Ok(x.iter()
        .zip(y)
        .map(|(a, b)| CoordinatePair {
            x: a.value,
            y: b.value,
        })
        .collect())
}

/// Number of positions whose sample keys disagree.
///
/// Diagnostic only; pairing never depends on it.
pub fn key_mismatches(x: &[AggregatedSample], y: &[AggregatedSample]) -> usize {
    x.iter().zip(y).filter(|(a, b)| a.sample != b.sample).count()
}

/// Split pairs into the `(xs, ys)` projections handed to the fitter.
pub fn projections(pairs: &[CoordinatePair]) -> (Vec<f64>, Vec<f64>) {
    pairs.iter().map(|p| (p.x, p.y)).unzip()
}
