//! Ordinary least squares solver.
//!
//! Solves `minimize ‖y - Xβ‖²` for a tall design matrix `X` (one row per
//! observation). SVD is used rather than QR because nalgebra's `QR::solve`
//! only handles square systems.

use nalgebra::{DMatrix, DVector};

/// Singular-value tolerances tried in order, strictest first.
const TOLERANCES: [f64; 3] = [1e-12, 1e-10, 1e-8];

/// Solve a least squares problem using SVD.
///
/// Returns `None` if no tolerance yields a finite solution.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    if x.nrows() != y.len() || x.nrows() == 0 {
        return None;
    }

    let svd = x.clone().svd(true, true);
    TOLERANCES.iter().find_map(|&tol| {
        svd.solve(y, tol)
            .ok()
            .filter(|beta| beta.iter().all(|v| v.is_finite()))
    })
}
