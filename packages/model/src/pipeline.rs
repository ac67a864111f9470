//! The fitted scaler → polynomial → ridge pipeline.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::{PolynomialFeatures, Ridge, ShapeError, StandardScaler, TrainingError};

/// An immutable fitted pipeline mapping pollutant features to AQI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedModel {
    /// Input column names, in the order the model expects them.
    pub feature_names: Vec<String>,
    /// Standardisation statistics from the training rows.
    pub scaler: StandardScaler,
    /// Polynomial expansion applied after scaling.
    pub poly: PolynomialFeatures,
    /// Ridge coefficients over the expanded features.
    pub ridge: Ridge,
}

impl TrainedModel {
    /// Fits every stage on `x`/`y`.
    ///
    /// # Errors
    ///
    /// Returns a [`TrainingError`] if `x` is empty, its width does not
    /// match `feature_names`, or the ridge solve fails.
    pub fn fit(
        x: &Array2<f64>,
        y: &Array1<f64>,
        feature_names: Vec<String>,
        degree: usize,
        alpha: f64,
    ) -> Result<Self, TrainingError> {
        if feature_names.len() != x.ncols() {
            return Err(ShapeError {
                expected: feature_names.len(),
                got: x.ncols(),
            }
            .into());
        }
        let scaler = StandardScaler::fit(x).ok_or(TrainingError::Empty)?;
        let poly = PolynomialFeatures::new(x.ncols(), degree);
        let expanded = poly.transform(&scaler.transform(x)?)?;
        let ridge = Ridge::fit(&expanded, y, alpha)?;

        Ok(Self {
            feature_names,
            scaler,
            poly,
            ridge,
        })
    }

    /// Number of input features expected.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.feature_names.len()
    }

    /// Regularisation strength the model was fitted with.
    #[must_use]
    pub const fn alpha(&self) -> f64 {
        self.ridge.alpha
    }

    /// Predicts one value per row of `x`.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError`] if `x` does not have [`Self::n_features`]
    /// columns.
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>, ShapeError> {
        if x.ncols() != self.n_features() {
            return Err(ShapeError {
                expected: self.n_features(),
                got: x.ncols(),
            });
        }
        let expanded = self.poly.transform(&self.scaler.transform(x)?)?;
        self.ridge.predict(&expanded)
    }

    /// Predicts a single sample.
    ///
    /// # Errors
    ///
    /// Returns [`ShapeError`] if `features` has the wrong length.
    pub fn predict_one(&self, features: &[f64]) -> Result<f64, ShapeError> {
        let row = Array2::from_shape_fn((1, features.len()), |(_, j)| features[j]);
        Ok(self.predict(&row)?[0])
    }

    /// Checks that every stage agrees on widths and holds finite values.
    ///
    /// Returns a description of the first inconsistency found.
    #[must_use]
    pub fn consistency_error(&self) -> Option<String> {
        let n = self.n_features();
        if self.scaler.mean.len() != n || self.scaler.scale.len() != n {
            return Some(format!(
                "scaler width {} does not match {n} features",
                self.scaler.mean.len()
            ));
        }
        if self.poly.n_input != n {
            return Some(format!(
                "polynomial input width {} does not match {n} features",
                self.poly.n_input
            ));
        }
        if self.ridge.coef.len() != self.poly.n_output() {
            return Some(format!(
                "{} coefficients for {} expanded features",
                self.ridge.coef.len(),
                self.poly.n_output()
            ));
        }
        let finite = self
            .scaler
            .mean
            .iter()
            .chain(&self.scaler.scale)
            .chain(&self.ridge.coef)
            .chain([&self.ridge.intercept, &self.ridge.alpha])
            .all(|v| v.is_finite());
        if !finite {
            return Some("non-finite parameter".to_owned());
        }
        None
    }
}
