//! Simple linear regression `y = slope * x + intercept`.
//!
//! The design matrix is `[1, x_i]` per observation and is solved with the
//! shared SVD least-squares routine.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::math::solve_least_squares;

/// A fitted line. Immutable once computed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FittedLine {
    pub slope: f64,
    pub intercept: f64,
    /// Coefficient of determination on the fitted data.
    pub r_squared: f64,
    /// Number of observations the line was fitted on.
    pub n: usize,
}

impl FittedLine {
    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fit a least-squares line through `(xs[i], ys[i])`.
pub fn fit_line(xs: &[f64], ys: &[f64]) -> Result<FittedLine, PipelineError> {
    if xs.len() != ys.len() {
        return Err(PipelineError::Fit(format!(
            "x and y have different lengths ({} vs {})",
            xs.len(),
            ys.len()
        )));
    }
    let n = xs.len();
    if n < 2 {
        return Err(PipelineError::Fit(format!(
            "need at least 2 points, got {n}"
        )));
    }
    if xs.iter().chain(ys).any(|v| !v.is_finite()) {
        return Err(PipelineError::Fit("input contains non-finite values".to_string()));
    }

    let x_mean = mean(xs);
    let x_spread = xs.iter().map(|x| (x - x_mean).powi(2)).sum::<f64>();
    // Squared x units on both sides.
    if x_spread <= f64::EPSILON * xs.iter().map(|x| x * x).sum::<f64>() {
        return Err(PipelineError::Fit("all x values are identical".to_string()));
    }

    let design = DMatrix::from_fn(n, 2, |i, j| if j == 0 { 1.0 } else { xs[i] });
    let target = DVector::from_column_slice(ys);
    let beta = solve_least_squares(&design, &target)
        .ok_or_else(|| PipelineError::Fit("least squares system is ill-conditioned".to_string()))?;

    let intercept = beta[0];
    let slope = beta[1];

    let y_mean = mean(ys);
    let sst = ys.iter().map(|y| (y - y_mean).powi(2)).sum::<f64>();
    let sse = xs
        .iter()
        .zip(ys)
        .map(|(x, y)| (y - (slope * x + intercept)).powi(2))
        .sum::<f64>();
    // A flat y series is fitted exactly by a flat line.
    let r_squared = if sst > 0.0 { 1.0 - sse / sst } else { 1.0 };

    Ok(FittedLine {
        slope,
        intercept,
        r_squared,
        n,
    })
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}
