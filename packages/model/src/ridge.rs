//! L2-regularised least squares with an unpenalised intercept.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::linalg::cholesky_solve;
use crate::{ShapeError, TrainingError};

/// Fitted ridge regression coefficients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ridge {
    /// Regularisation strength the model was fitted with.
    pub alpha: f64,
    /// One coefficient per input column.
    pub coef: Array1<f64>,
    /// Intercept term.
    pub intercept: f64,
}

impl Ridge {
    /// Fits `y ≈ x · coef + intercept`, minimising
    /// `‖y − x·coef − intercept‖² + alpha·‖coef‖²`.
    ///
    /// `x` and `y` are centred first so the intercept is not penalised.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::Empty`] for an empty `x`,
    /// [`TrainingError::Shape`] if `y` does not have one value per row, or
    /// [`TrainingError::NotConverged`] if the system cannot be solved.
    pub fn fit(x: &Array2<f64>, y: &Array1<f64>, alpha: f64) -> Result<Self, TrainingError> {
        if y.len() != x.nrows() {
            return Err(ShapeError {
                expected: x.nrows(),
                got: y.len(),
            }
            .into());
        }
        let (Some(x_mean), Some(y_mean)) = (x.mean_axis(Axis(0)), y.mean()) else {
            return Err(TrainingError::Empty);
        };

        let xc = x - &x_mean;
        let yc = y - y_mean;

        let mut gram = xc.t().dot(&xc);
        for i in 0..gram.nrows() {
            gram[[i, i]] += alpha;
        }
        let rhs = xc.t().dot(&yc);

        let coef = cholesky_solve(&gram, &rhs).ok_or(TrainingError::NotConverged { alpha })?;
        let intercept = y_mean - x_mean.dot(&coef);

        Ok(Self {
            alpha,
            coef,
            intercept,
        })
    }

    /// Predicts one value per row of `x`.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError`] if `x` has the wrong column count.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ShapeError> {
        if x.ncols() != self.coef.len() {
            return Err(ShapeError {
                expected: self.coef.len(),
                got: x.ncols(),
            });
        }
        Ok(x.dot(&self.coef) + self.intercept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn recovers_linear_relationship_with_small_alpha() {
        let x = array![[0.0], [1.0], [2.0], [3.0], [4.0]];
        let y = x.column(0).mapv(|v| 3.0 * v + 5.0);
        let ridge = Ridge::fit(&x, &y, 1e-9).unwrap();
        assert!((ridge.coef[0] - 3.0).abs() < 1e-6);
        assert!((ridge.intercept - 5.0).abs() < 1e-6);
    }

    #[test]
    fn larger_alpha_shrinks_coefficients() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![1.0, 3.0, 5.0, 7.0];
        let weak = Ridge::fit(&x, &y, 0.1).unwrap();
        let strong = Ridge::fit(&x, &y, 100.0).unwrap();
        assert!(strong.coef[0].abs() < weak.coef[0].abs());
    }

    #[test]
    fn constant_column_gets_zero_weight() {
        let x = array![[1.0, 0.0], [1.0, 1.0], [1.0, 2.0]];
        let y = array![2.0, 4.0, 6.0];
        let ridge = Ridge::fit(&x, &y, 1.0).unwrap();
        assert!(ridge.coef[0].abs() < 1e-12);
    }

    #[test]
    fn zero_alpha_with_constant_column_does_not_converge() {
        let x = array![[7.0, 2.0], [7.0, 4.0], [7.0, 6.0]];
        let y = array![1.0, 2.0, 3.0];
        assert!(matches!(
            Ridge::fit(&x, &y, 0.0),
            Err(TrainingError::NotConverged { .. })
        ));
    }

    #[test]
    fn predict_checks_width() {
        let ridge = Ridge {
            alpha: 1.0,
            coef: array![1.0, 2.0],
            intercept: 0.5,
        };
        let out = ridge.predict(&array![[1.0, 1.0]]).unwrap();
        assert!((out[0] - 3.5).abs() < 1e-12);
        assert!(ridge.predict(&array![[1.0]]).is_err());
    }
}
