#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the AQI prediction server.
//!
//! These types define the JSON contract of the HTTP surface. They are kept
//! apart from the domain types so field names such as `Date`/`AQI` can
//! follow the wire format without leaking into the library crates.

use aqi_history::MonthlyAqi;
use aqi_models::{AqiAssessment, AqiCategory, FeatureVector, InvalidInputError, Pollutant};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/predict`.
///
/// Elements may be JSON numbers or numeric strings; they are normalised
/// into a [`FeatureVector`] by [`Self::to_features`].
#[derive(Debug, Clone, Deserialize)]
pub struct PredictRequest {
    /// Pollutant values in `PM2.5, PM10, O3, NO2, SO2, CO` order.
    pub features: Vec<serde_json::Value>,
}

impl PredictRequest {
    /// Validates the payload into exactly six finite values.
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidInputError`] for a wrong element count or any
    /// element that is not a finite number.
    pub fn to_features(&self) -> Result<FeatureVector, InvalidInputError> {
        if self.features.len() != FeatureVector::LEN {
            return Err(InvalidInputError::WrongLength {
                expected: FeatureVector::LEN,
                got: self.features.len(),
            });
        }

        let values = Pollutant::all()
            .iter()
            .zip(&self.features)
            .map(|(pollutant, value)| match value {
                serde_json::Value::Number(n) => n.as_f64().ok_or_else(|| {
                    InvalidInputError::NotNumeric {
                        pollutant: *pollutant,
                        value: n.to_string(),
                    }
                }),
                serde_json::Value::String(s) => aqi_models::parse_value(*pollutant, s),
                other => Err(InvalidInputError::NotNumeric {
                    pollutant: *pollutant,
                    value: other.to_string(),
                }),
            })
            .collect::<Result<Vec<f64>, _>>()?;

        FeatureVector::try_from_values(&values)
    }
}

/// Response of `POST /api/predict`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiPrediction {
    /// Predicted AQI, rounded to 2 decimals.
    pub aqi: f64,
    /// Severity category label.
    pub category: AqiCategory,
    /// Health implication text.
    pub health_implications: String,
    /// Cautionary statement.
    pub cautionary_statement: String,
}

impl From<AqiAssessment> for ApiPrediction {
    fn from(assessment: AqiAssessment) -> Self {
        Self {
            aqi: assessment.aqi,
            category: assessment.category,
            health_implications: assessment.health_implications.to_string(),
            cautionary_statement: assessment.cautionary_statement.to_string(),
        }
    }
}

/// Query parameters of `GET /aqi`.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryQueryParams {
    /// City to aggregate.
    pub city: Option<String>,
}

/// One month of the `GET /aqi` series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiMonthlyAqi {
    /// Month formatted as `YYYY-MM`.
    #[serde(rename = "Date")]
    pub date: String,
    /// Mean AQI for the month.
    #[serde(rename = "AQI")]
    pub aqi: f64,
}

impl From<MonthlyAqi> for ApiMonthlyAqi {
    fn from(month: MonthlyAqi) -> Self {
        Self {
            date: month.month,
            aqi: month.aqi,
        }
    }
}

/// Response of `GET /aqi`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiHistory {
    /// Monthly means in ascending month order.
    pub data: Vec<ApiMonthlyAqi>,
}

/// Error body returned by every endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Human-readable description.
    pub error: String,
}

impl ApiError {
    /// Creates an error body from anything displayable.
    pub fn new(error: impl std::fmt::Display) -> Self {
        Self {
            error: error.to_string(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}
