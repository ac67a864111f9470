//! Dense symmetric positive-definite solver for the ridge normal equations.

use ndarray::{Array1, Array2};

/// Solves `a · x = b` for symmetric positive-definite `a` by Cholesky
/// factorisation.
///
/// Returns `None` if `a` is not square, its size does not match `b`, or it
/// is not numerically positive definite.
#[must_use]
pub fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if a.ncols() != n || b.len() != n {
        return None;
    }

    // Lower-triangular factor, a = l · lᵀ
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let dot: f64 = (0..j).map(|k| l[[i, k]] * l[[j, k]]).sum();
            let value = a[[i, j]] - dot;
            if i == j {
                if !(value.is_finite() && value > 0.0) {
                    return None;
                }
                l[[i, i]] = value.sqrt();
            } else {
                l[[i, j]] = value / l[[j, j]];
            }
        }
    }

    // Forward substitution: l · y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let dot: f64 = (0..i).map(|k| l[[i, k]] * y[k]).sum();
        y[i] = (b[i] - dot) / l[[i, i]];
    }

    // Back substitution: lᵀ · x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let dot: f64 = (i + 1..n).map(|k| l[[k, i]] * x[k]).sum();
        x[i] = (y[i] - dot) / l[[i, i]];
    }

    x.iter().all(|v| v.is_finite()).then_some(x)
}
