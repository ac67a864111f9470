//! Polynomial feature expansion.

use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::ShapeError;

/// Expansion of `n_input` features into every monomial up to `degree`.
///
/// Output columns are ordered by degree, then lexicographically by feature
/// index: `1, x0, x1, .., x0², x0·x1, .., x1², ..`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolynomialFeatures {
    /// Highest total degree of a generated term.
    pub degree: usize,
    /// Number of input features.
    pub n_input: usize,
    /// Whether the constant term is emitted as the first column.
    pub include_bias: bool,
}

impl PolynomialFeatures {
    /// Creates an expansion with a bias column.
    #[must_use]
    pub const fn new(n_input: usize, degree: usize) -> Self {
        Self {
            degree,
            n_input,
            include_bias: true,
        }
    }

    /// Feature index multisets, one per output column.
    #[must_use]
    pub fn terms(&self) -> Vec<Vec<usize>> {
        let mut terms = Vec::new();
        if self.include_bias {
            terms.push(Vec::new());
        }

        let mut layer: Vec<Vec<usize>> = vec![Vec::new()];
        for _ in 0..self.degree {
            let next: Vec<Vec<usize>> = layer
                .iter()
                .flat_map(|term| {
                    let start = term.last().copied().unwrap_or(0);
                    (start..self.n_input).map(move |j| {
                        let mut extended = term.clone();
                        extended.push(j);
                        extended
                    })
                })
                .collect();
            terms.extend(next.iter().cloned());
            layer = next;
        }

        terms
    }

    /// Number of output columns.
    #[must_use]
    pub fn n_output(&self) -> usize {
        self.terms().len()
    }

    /// Expands `x` into polynomial terms.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError`] if `x` does not have `n_input` columns.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>, ShapeError> {
        if x.ncols() != self.n_input {
            return Err(ShapeError {
                expected: self.n_input,
                got: x.ncols(),
            });
        }

        let terms = self.terms();
        Ok(Array2::from_shape_fn((x.nrows(), terms.len()), |(i, t)| {
            terms[t].iter().map(|&j| x[[i, j]]).product()
        }))
    }
}
