#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Polynomial ridge regression for AQI estimation.
//!
//! A [`TrainedModel`] is a three-stage pipeline: [`StandardScaler`] →
//! [`PolynomialFeatures`] → [`Ridge`]. [`ModelTrainer`] picks the ridge
//! strength by seeded k-fold grid search, [`metrics`] scores a model on
//! held-out rows, and [`artifact`] persists the fitted pipeline as a
//! single `MessagePack` blob.

pub mod artifact;
pub mod linalg;
pub mod metrics;
pub mod pipeline;
pub mod poly;
pub mod progress;
pub mod ridge;
pub mod scaler;
pub mod trainer;

use aqi_dataset::Dataset;
use ndarray::{Array1, Array2};

pub use artifact::ArtifactError;
pub use metrics::{EvaluationError, EvaluationReport, evaluate};
pub use pipeline::TrainedModel;
pub use poly::PolynomialFeatures;
pub use ridge::Ridge;
pub use scaler::StandardScaler;
pub use trainer::{ModelTrainer, TrainerConfig, TrainingOutcome};

/// Errors that abort model fitting.
#[derive(Debug, thiserror::Error)]
pub enum TrainingError {
    /// Fewer training rows than cross-validation folds.
    #[error("Training set has {rows} rows, fewer than the {folds} folds requested")]
    TooFewRows {
        /// Rows available.
        rows: usize,
        /// Folds requested.
        folds: usize,
    },

    /// No rows to fit on.
    #[error("Training set is empty")]
    Empty,

    /// The trainer configuration is unusable.
    #[error("Invalid trainer configuration: {0}")]
    InvalidConfig(String),

    /// Every candidate alpha produced a non-finite cross-validation score.
    #[error("No candidate alpha produced a usable cross-validation score")]
    NoCandidates,

    /// The regularised normal equations could not be solved.
    #[error("Ridge fit did not converge for alpha={alpha}")]
    NotConverged {
        /// Regularisation strength of the failed fit.
        alpha: f64,
    },

    /// A fitted stage received input of the wrong width.
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

/// Input width did not match what a fitted stage expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("expected {expected} input features, got {got}")]
pub struct ShapeError {
    /// Width the stage was fitted on.
    pub expected: usize,
    /// Width received.
    pub got: usize,
}

/// Errors loading a [`TrainerConfig`] file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid TOML for a [`TrainerConfig`].
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Builds the `rows x features` matrix of a dataset.
///
/// # Errors
///
/// Returns [`ShapeError`] if any record's width differs from the number of
/// feature names.
pub fn features_matrix(dataset: &Dataset) -> Result<Array2<f64>, ShapeError> {
    let width = dataset.n_features();
    if let Some(record) = dataset.records.iter().find(|r| r.features.len() != width) {
        return Err(ShapeError {
            expected: width,
            got: record.features.len(),
        });
    }
    Ok(Array2::from_shape_fn((dataset.len(), width), |(i, j)| {
        dataset.records[i].features[j]
    }))
}

/// Builds the target vector of a dataset.
#[must_use]
pub fn targets(dataset: &Dataset) -> Array1<f64> {
    Array1::from(dataset.targets())
}
