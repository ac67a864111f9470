//! Per-feature standardisation to zero mean and unit variance.

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};

use crate::ShapeError;

/// Standard deviations below this are treated as zero variance.
const MIN_SCALE: f64 = 10.0 * f64::EPSILON;

/// Fitted column means and scales.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    /// Column means of the fitting data.
    pub mean: Array1<f64>,
    /// Column population standard deviations, with zero-variance columns
    /// set to `1.0`.
    pub scale: Array1<f64>,
}

impl StandardScaler {
    /// Fits means and scales on `x`. Returns `None` if `x` has no rows.
    #[must_use]
    pub fn fit(x: &Array2<f64>) -> Option<Self> {
        let mean = x.mean_axis(Axis(0))?;
        let scale = x
            .std_axis(Axis(0), 0.0)
            .mapv(|s| if s < MIN_SCALE { 1.0 } else { s });
        Some(Self { mean, scale })
    }

    /// Number of input features.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    /// Standardises `x` with the fitted statistics.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError`] if `x` has a different column count.
    pub fn transform(&self, x: &Array2<f64>) -> Result<Array2<f64>, ShapeError> {
        if x.ncols() != self.n_features() {
            return Err(ShapeError {
                expected: self.n_features(),
                got: x.ncols(),
            });
        }
        Ok((x - &self.mean) / &self.scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn standardises_columns() {
        let x = array![[1.0, 10.0], [3.0, 10.0], [5.0, 10.0]];
        let scaler = StandardScaler::fit(&x).unwrap();
        assert!((scaler.mean[0] - 3.0).abs() < 1e-12);
        assert!((scaler.scale[0] - (8.0f64 / 3.0).sqrt()).abs() < 1e-12);
        // constant column keeps unit scale
        assert!((scaler.scale[1] - 1.0).abs() < 1e-12);

        let z = scaler.transform(&x).unwrap();
        let col_mean = z.column(0).sum() / 3.0;
        assert!(col_mean.abs() < 1e-12);
        assert!(z.column(1).iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn rejects_wrong_width() {
        let scaler = StandardScaler::fit(&array![[1.0, 2.0]]).unwrap();
        let err = scaler.transform(&array![[1.0, 2.0, 3.0]]).unwrap_err();
        assert_eq!(
            err,
            ShapeError {
                expected: 2,
                got: 3
            }
        );
    }

    #[test]
    fn empty_input_cannot_be_fitted() {
        assert!(StandardScaler::fit(&Array2::zeros((0, 3))).is_none());
    }
}
