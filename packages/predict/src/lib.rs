#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Single-sample AQI prediction.
//!
//! [`PredictionService`] holds a read-only handle to a [`TrainedModel`]
//! loaded once at startup. Clones share the same model, so a service can be
//! handed to every request worker without locking.

use std::path::Path;
use std::sync::Arc;

use aqi_model::artifact::{self, ArtifactError};
use aqi_model::{ShapeError, TrainedModel};
use aqi_models::{
    AqiAssessment, FeatureOrderError, FeatureVector, InvalidInputError, Pollutant,
    check_feature_order,
};

/// Errors loading a model for serving.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The artefact is missing or unusable.
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// The model was trained on columns other than the six pollutants in
    /// request order.
    #[error("Model cannot serve requests: {0}")]
    FeatureOrder(#[from] FeatureOrderError),
}

/// Errors answering a prediction request.
#[derive(Debug, thiserror::Error)]
pub enum PredictionError {
    /// The request did not carry exactly one finite number per feature.
    #[error("Invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// The loaded model expects a different feature width.
    #[error("Model shape mismatch: {0}")]
    ShapeMismatch(#[from] ShapeError),

    /// The model produced NaN or infinity for a finite input.
    #[error("Model produced a non-finite prediction")]
    NonFinite,
}

/// Answers AQI queries against a shared, immutable model.
#[derive(Debug, Clone)]
pub struct PredictionService {
    model: Arc<TrainedModel>,
}

impl PredictionService {
    /// Wraps an already-fitted model.
    #[must_use]
    pub fn new(model: TrainedModel) -> Self {
        Self {
            model: Arc::new(model),
        }
    }

    /// Loads the model artefact at `path`.
    ///
    /// The model must have been trained on exactly the pollutant columns in
    /// [`Pollutant::all`] order, since requests are matched to model inputs
    /// by position.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError::Artifact`] if the artefact is missing or
    /// unusable, or [`LoadError::FeatureOrder`] if its feature columns are
    /// not the pollutants in request order.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let model = artifact::load(path)?;
        log::info!(
            "Loaded model from {} ({} features: {})",
            path.display(),
            model.n_features(),
            model.feature_names.join(", ")
        );
        check_feature_order(&model.feature_names)?;
        Ok(Self::new(model))
    }

    /// The underlying model.
    #[must_use]
    pub fn model(&self) -> &TrainedModel {
        &self.model
    }

    /// Predicts the AQI for one pollutant vector, rounded to 2 decimals.
    ///
    /// # Errors
    ///
    /// Returns [`PredictionError::ShapeMismatch`] if the model was not
    /// trained on the six pollutant columns, or
    /// [`PredictionError::NonFinite`] if the result is not finite.
    pub fn predict(&self, features: &FeatureVector) -> Result<f64, PredictionError> {
        let aqi = self.model.predict_one(features.as_slice())?;
        if !aqi.is_finite() {
            return Err(PredictionError::NonFinite);
        }
        Ok(round2(aqi))
    }

    /// Validates raw values and predicts.
    ///
    /// # Errors
    ///
    /// Returns [`PredictionError::InvalidInput`] unless `values` holds
    /// exactly one finite number per model feature.
    pub fn predict_values(&self, values: &[f64]) -> Result<f64, PredictionError> {
        let expected = self.model.n_features();
        if values.len() != expected {
            return Err(InvalidInputError::WrongLength {
                expected,
                got: values.len(),
            }
            .into());
        }
        let features = FeatureVector::try_from_values(values)?;
        self.predict(&features)
    }

    /// Predicts and categorizes in one step.
    ///
    /// # Errors
    ///
    /// See [`Self::predict`].
    pub fn assess(&self, features: &FeatureVector) -> Result<AqiAssessment, PredictionError> {
        let aqi = self.predict(features)?;
        log::debug!(
            "Predicted AQI {aqi} for {}={}",
            Pollutant::Pm25,
            features.get(Pollutant::Pm25)
        );
        Ok(AqiAssessment::new(aqi))
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{Array1, Array2};

    fn fit_model(names: Vec<String>) -> TrainedModel {
        let width = names.len();
        let x = Array2::from_shape_fn((30, width), |(i, j)| {
            #[allow(clippy::cast_precision_loss)]
            let (i, j) = (i as f64, j as f64);
            ((i + 1.0) * (j + 0.5)).cos().mul_add(10.0, 20.0 + j)
        });
        let y: Array1<f64> = x
            .rows()
            .into_iter()
            .map(|r| 2.0f64.mul_add(r[0], r[1]) + 10.0)
            .collect();
        TrainedModel::fit(&x, &y, names, 2, 0.1).unwrap()
    }

    fn pollutant_names() -> Vec<String> {
        Pollutant::all().iter().map(ToString::to_string).collect()
    }

    fn service() -> PredictionService {
        PredictionService::new(fit_model(pollutant_names()))
    }

    fn load_saved(name: &str, model: &TrainedModel) -> Result<PredictionService, LoadError> {
        let path = std::env::temp_dir().join(name);
        artifact::save(model, &path).unwrap();
        let result = PredictionService::load(&path);
        let _ = std::fs::remove_file(&path);
        result
    }

    #[test]
    fn load_accepts_pollutant_ordered_model() {
        let service = load_saved("aqi_predict_load_ordered.msgpack", &fit_model(pollutant_names()))
            .unwrap();
        assert_eq!(service.model().feature_names, pollutant_names());
    }

    #[test]
    fn load_rejects_swapped_columns() {
        let mut names = pollutant_names();
        names.swap(0, 1);
        let result = load_saved("aqi_predict_load_swapped.msgpack", &fit_model(names));
        let err = match result {
            Err(LoadError::FeatureOrder(err)) => err,
            other => panic!("expected a feature order error, got {other:?}"),
        };
        assert_eq!(err.found[0], "PM10");
        assert_eq!(err.found[1], "PM2.5");
    }

    #[test]
    fn load_rejects_extra_column() {
        let mut names = pollutant_names();
        names.push("NH3".to_owned());
        let result = load_saved("aqi_predict_load_seven.msgpack", &fit_model(names));
        assert!(matches!(result, Err(LoadError::FeatureOrder(_))));
    }

    #[test]
    fn load_reports_missing_artefact() {
        let path = std::env::temp_dir().join("aqi_predict_load_missing.msgpack");
        let _ = std::fs::remove_file(&path);
        assert!(matches!(
            PredictionService::load(&path),
            Err(LoadError::Artifact(ArtifactError::NotFound(_)))
        ));
    }

    #[test]
    fn six_values_give_finite_aqi() {
        let aqi = service()
            .predict_values(&[20.0, 21.0, 22.0, 23.0, 24.0, 25.0])
            .unwrap();
        assert!(aqi.is_finite());
        assert!(((aqi * 100.0).round() - aqi * 100.0).abs() < 1e-6);
    }

    #[test]
    fn five_values_are_invalid_input() {
        let err = service()
            .predict_values(&[20.0, 21.0, 22.0, 23.0, 24.0])
            .unwrap_err();
        assert!(matches!(
            err,
            PredictionError::InvalidInput(InvalidInputError::WrongLength {
                expected: 6,
                got: 5
            })
        ));
    }

    #[test]
    fn non_finite_value_is_invalid_input() {
        let err = service()
            .predict_values(&[20.0, f64::NAN, 22.0, 23.0, 24.0, 25.0])
            .unwrap_err();
        assert!(matches!(
            err,
            PredictionError::InvalidInput(InvalidInputError::NotFinite {
                pollutant: Pollutant::Pm10
            })
        ));
    }

    #[test]
    fn service_survives_bad_request() {
        let service = service();
        assert!(service.predict_values(&[1.0]).is_err());
        assert!(
            service
                .predict_values(&[20.0, 21.0, 22.0, 23.0, 24.0, 25.0])
                .is_ok()
        );
    }

    #[test]
    fn assess_matches_categorizer() {
        let service = service();
        let features = FeatureVector::try_from_values(&[20.0, 21.0, 22.0, 23.0, 24.0, 25.0]).unwrap();
        let assessment = service.assess(&features).unwrap();
        assert!((assessment.aqi - service.predict(&features).unwrap()).abs() < f64::EPSILON);
        assert_eq!(
            assessment.category,
            aqi_models::categorize(assessment.aqi)
        );
        assert_eq!(
            assessment.health_implications,
            assessment.category.health_implications()
        );
    }

    #[test]
    fn rounds_to_two_decimals() {
        assert!((round2(12.345_6) - 12.35).abs() < 1e-9);
        assert!((round2(-0.004) - 0.0).abs() < 1e-9);
    }
}
