#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Pollutant feature vectors and AQI severity band definitions.
//!
//! This crate defines the contract shared by the training pipeline and
//! the serving path: the fixed pollutant column order of a
//! [`FeatureVector`], and the static [`AQI_BANDS`] table that maps a
//! numeric AQI to an [`AqiCategory`] with its advisory text.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A pollutant measured as one model input feature.
///
/// Variant order is the column order the model is trained with.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Pollutant {
    /// Fine particulate matter (diameter under 2.5 µm)
    #[serde(rename = "PM2.5")]
    #[strum(serialize = "PM2.5")]
    Pm25,
    /// Coarse particulate matter (diameter under 10 µm)
    #[serde(rename = "PM10")]
    #[strum(serialize = "PM10")]
    Pm10,
    /// Ozone
    #[serde(rename = "O3")]
    #[strum(serialize = "O3")]
    O3,
    /// Nitrogen dioxide
    #[serde(rename = "NO2")]
    #[strum(serialize = "NO2")]
    No2,
    /// Sulphur dioxide
    #[serde(rename = "SO2")]
    #[strum(serialize = "SO2")]
    So2,
    /// Carbon monoxide
    #[serde(rename = "CO")]
    #[strum(serialize = "CO")]
    Co,
}

impl Pollutant {
    /// Returns all pollutants in feature column order.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Pm25,
            Self::Pm10,
            Self::O3,
            Self::No2,
            Self::So2,
            Self::Co,
        ]
    }

    /// Returns the zero-based column index of this pollutant.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Error returned when a prediction input cannot be turned into a
/// [`FeatureVector`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum InvalidInputError {
    /// The input had the wrong number of values.
    #[error("expected {expected} feature values, got {got}")]
    WrongLength {
        /// Number of values the model expects.
        expected: usize,
        /// Number of values provided.
        got: usize,
    },

    /// A required field was absent from the request.
    #[error("missing value for {0}")]
    MissingField(Pollutant),

    /// A value could not be parsed as a number.
    #[error("value for {pollutant} is not numeric: '{value}'")]
    NotNumeric {
        /// Pollutant whose value failed to parse.
        pollutant: Pollutant,
        /// The raw value as received.
        value: String,
    },

    /// A value parsed but is NaN or infinite.
    #[error("value for {pollutant} is not finite")]
    NotFinite {
        /// Pollutant whose value was not finite.
        pollutant: Pollutant,
    },
}

/// A model or dataset whose feature columns are not the pollutants in
/// [`Pollutant::all`] order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "feature columns [{}] do not match the pollutant order [{}]",
    found.join(", "),
    expected.join(", ")
)]
pub struct FeatureOrderError {
    /// Pollutant column names in the required order.
    pub expected: Vec<String>,
    /// Column names actually found.
    pub found: Vec<String>,
}

/// Checks that `names` are exactly the pollutant columns in
/// [`Pollutant::all`] order.
///
/// # Errors
///
/// Returns [`FeatureOrderError`] if a column is missing, extra, or out of
/// place.
pub fn check_feature_order<S: AsRef<str>>(names: &[S]) -> Result<(), FeatureOrderError> {
    let matches = names.len() == Pollutant::all().len()
        && names
            .iter()
            .zip(Pollutant::all())
            .all(|(name, pollutant)| {
                let expected: &str = pollutant.as_ref();
                name.as_ref() == expected
            });
    if matches {
        return Ok(());
    }
    Err(FeatureOrderError {
        expected: Pollutant::all().iter().map(ToString::to_string).collect(),
        found: names.iter().map(|n| n.as_ref().to_owned()).collect(),
    })
}

/// Pollutant concentrations in [`Pollutant::all`] order.
///
/// Every element is guaranteed finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector([f64; Self::LEN]);

impl FeatureVector {
    /// Number of pollutant features.
    pub const LEN: usize = 6;

    /// Builds a feature vector from values in column order.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidInputError::WrongLength`] unless exactly
    /// [`Self::LEN`] values are given, or [`InvalidInputError::NotFinite`]
    /// for a NaN or infinite value.
    pub fn try_from_values(values: &[f64]) -> Result<Self, InvalidInputError> {
        let array: [f64; Self::LEN] =
            values.try_into().map_err(|_| InvalidInputError::WrongLength {
                expected: Self::LEN,
                got: values.len(),
            })?;

        for (pollutant, value) in Pollutant::all().iter().zip(array) {
            if !value.is_finite() {
                return Err(InvalidInputError::NotFinite {
                    pollutant: *pollutant,
                });
            }
        }

        Ok(Self(array))
    }

    /// Builds a feature vector from textual fields, looking each pollutant
    /// up by name (e.g. form fields keyed `PM2.5`, `PM10`, ...).
    ///
    /// # Errors
    ///
    /// Returns an [`InvalidInputError`] if any field is absent, not
    /// numeric, or not finite.
    pub fn parse_fields<'a>(
        lookup: impl Fn(Pollutant) -> Option<&'a str>,
    ) -> Result<Self, InvalidInputError> {
        let mut values = [0.0; Self::LEN];
        for pollutant in Pollutant::all() {
            let raw = lookup(*pollutant).ok_or(InvalidInputError::MissingField(*pollutant))?;
            values[pollutant.index()] = parse_value(*pollutant, raw)?;
        }
        Ok(Self(values))
    }

    /// Returns the value for a single pollutant.
    #[must_use]
    pub const fn get(&self, pollutant: Pollutant) -> f64 {
        self.0[pollutant.index()]
    }

    /// Returns the values in column order.
    #[must_use]
    pub const fn as_slice(&self) -> &[f64] {
        &self.0
    }
}

/// Parses a single pollutant value from text.
///
/// # Errors
///
/// Returns [`InvalidInputError::NotNumeric`] if the text is not a number,
/// or [`InvalidInputError::NotFinite`] for `NaN`/`inf`.
pub fn parse_value(pollutant: Pollutant, raw: &str) -> Result<f64, InvalidInputError> {
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| InvalidInputError::NotNumeric {
            pollutant,
            value: raw.to_owned(),
        })?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err(InvalidInputError::NotFinite { pollutant })
    }
}

/// AQI severity category.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum AqiCategory {
    /// AQI 0-50
    #[serde(rename = "Good")]
    #[strum(serialize = "Good")]
    Good,
    /// AQI 51-100
    #[serde(rename = "Moderate")]
    #[strum(serialize = "Moderate")]
    Moderate,
    /// AQI 101-150
    #[serde(rename = "Unhealthy for Sensitive Groups")]
    #[strum(serialize = "Unhealthy for Sensitive Groups")]
    UnhealthyForSensitiveGroups,
    /// AQI 151-200
    #[serde(rename = "Unhealthy")]
    #[strum(serialize = "Unhealthy")]
    Unhealthy,
    /// AQI 201-300
    #[serde(rename = "Very Unhealthy")]
    #[strum(serialize = "Very Unhealthy")]
    VeryUnhealthy,
    /// AQI 301 and above
    #[serde(rename = "Hazardous")]
    #[strum(serialize = "Hazardous")]
    Hazardous,
}

impl AqiCategory {
    /// Returns the health implication text for this category.
    #[must_use]
    pub const fn health_implications(self) -> &'static str {
        match self {
            Self::Good => {
                "Air quality is considered satisfactory, and air pollution poses little or no risk."
            }
            Self::Moderate => {
                "Air quality is acceptable; however, there may be some pollution that poses a \
                 moderate health concern for a very small number of individuals who are \
                 unusually sensitive to air pollution."
            }
            Self::UnhealthyForSensitiveGroups => {
                "Members of sensitive groups may experience health effects. The general public \
                 is not likely to be affected."
            }
            Self::Unhealthy => {
                "Everyone may begin to experience health effects; members of sensitive groups \
                 may experience more serious health effects."
            }
            Self::VeryUnhealthy => {
                "Health alert: everyone may experience more serious health effects."
            }
            Self::Hazardous => {
                "Health warning of emergency conditions. The entire population is more likely \
                 to be affected."
            }
        }
    }

    /// Returns the cautionary statement for this category.
    #[must_use]
    pub const fn cautionary_statement(self) -> &'static str {
        match self {
            Self::Good => "None.",
            Self::Moderate => {
                "Unusually sensitive people should consider reducing prolonged or heavy exertion."
            }
            Self::UnhealthyForSensitiveGroups => {
                "Active children and adults, and people with respiratory disease, such as \
                 asthma, should limit prolonged outdoor exertion."
            }
            Self::Unhealthy => {
                "Active children and adults, and people with respiratory disease, such as \
                 asthma, should avoid prolonged outdoor exertion; everyone else, especially \
                 children, should limit prolonged outdoor exertion."
            }
            Self::VeryUnhealthy | Self::Hazardous => "Everyone should avoid all outdoor exertion.",
        }
    }

    /// Returns all categories from least to most severe.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Good,
            Self::Moderate,
            Self::UnhealthyForSensitiveGroups,
            Self::Unhealthy,
            Self::VeryUnhealthy,
            Self::Hazardous,
        ]
    }
}

/// A fixed AQI range bound to a severity category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AqiBand {
    /// Lowest integer AQI in the band.
    pub lower: u32,
    /// Highest integer AQI in the band, `None` for the open-ended top band.
    pub upper: Option<u32>,
    /// Category assigned to AQI values in this band.
    pub category: AqiCategory,
}

impl AqiBand {
    /// Whether `aqi` falls at or below this band's upper bound.
    #[must_use]
    pub fn covers(&self, aqi: f64) -> bool {
        self.upper.is_none_or(|upper| aqi <= f64::from(upper))
    }
}

/// The AQI banding table, in increasing order.
pub const AQI_BANDS: [AqiBand; 6] = [
    AqiBand {
        lower: 0,
        upper: Some(50),
        category: AqiCategory::Good,
    },
    AqiBand {
        lower: 51,
        upper: Some(100),
        category: AqiCategory::Moderate,
    },
    AqiBand {
        lower: 101,
        upper: Some(150),
        category: AqiCategory::UnhealthyForSensitiveGroups,
    },
    AqiBand {
        lower: 151,
        upper: Some(200),
        category: AqiCategory::Unhealthy,
    },
    AqiBand {
        lower: 201,
        upper: Some(300),
        category: AqiCategory::VeryUnhealthy,
    },
    AqiBand {
        lower: 301,
        upper: None,
        category: AqiCategory::Hazardous,
    },
];

/// Maps an AQI value to its severity category.
///
/// Picks the first band whose upper bound is `>= aqi`. Negative values
/// land in [`AqiCategory::Good`]; `NaN` matches no bounded band and lands
/// in the open-ended top band.
#[must_use]
pub fn categorize(aqi: f64) -> AqiCategory {
    AQI_BANDS
        .iter()
        .find(|band| band.covers(aqi))
        .map_or(AqiCategory::Hazardous, |band| band.category)
}

/// An AQI value together with its category and advisory text.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AqiAssessment {
    /// The AQI value.
    pub aqi: f64,
    /// Severity category.
    pub category: AqiCategory,
    /// Health implication text.
    pub health_implications: &'static str,
    /// Cautionary statement.
    pub cautionary_statement: &'static str,
}

impl AqiAssessment {
    /// Categorizes `aqi` and attaches the advisory text.
    #[must_use]
    pub fn new(aqi: f64) -> Self {
        let category = categorize(aqi);
        Self {
            aqi,
            category,
            health_implications: category.health_implications(),
            cautionary_statement: category.cautionary_statement(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feature_order_accepts_pollutant_columns() {
        assert!(check_feature_order(&["PM2.5", "PM10", "O3", "NO2", "SO2", "CO"]).is_ok());
    }

    #[test]
    fn feature_order_rejects_swapped_and_extra_columns() {
        let err = check_feature_order(&["PM10", "PM2.5", "O3", "NO2", "SO2", "CO"]).unwrap_err();
        assert_eq!(err.found[0], "PM10");
        assert_eq!(err.expected[0], "PM2.5");

        let seven = ["PM2.5", "PM10", "O3", "NO2", "SO2", "CO", "NH3"];
        assert!(check_feature_order(&seven).is_err());
        assert!(check_feature_order::<&str>(&[]).is_err());
    }

    #[test]
    fn categorize_band_edges() {
        assert_eq!(categorize(0.0), AqiCategory::Good);
        assert_eq!(categorize(50.0), AqiCategory::Good);
        assert_eq!(categorize(51.0), AqiCategory::Moderate);
        assert_eq!(categorize(100.0), AqiCategory::Moderate);
        assert_eq!(categorize(150.0), AqiCategory::UnhealthyForSensitiveGroups);
        assert_eq!(categorize(200.0), AqiCategory::Unhealthy);
        assert_eq!(categorize(300.0), AqiCategory::VeryUnhealthy);
        assert_eq!(categorize(301.0), AqiCategory::Hazardous);
        assert_eq!(categorize(5000.0), AqiCategory::Hazardous);
    }

    #[test]
    fn categorize_fractional_values_between_bands() {
        assert_eq!(categorize(50.01), AqiCategory::Moderate);
        assert_eq!(categorize(300.5), AqiCategory::Hazardous);
    }

    #[test]
    fn negative_aqi_is_good() {
        assert_eq!(categorize(-0.5), AqiCategory::Good);
        assert_eq!(categorize(-120.0), AqiCategory::Good);
    }

    #[test]
    fn nan_lands_in_top_band() {
        assert_eq!(categorize(f64::NAN), AqiCategory::Hazardous);
    }

    #[test]
    fn category_labels_match_display() {
        assert_eq!(
            AqiCategory::UnhealthyForSensitiveGroups.to_string(),
            "Unhealthy for Sensitive Groups"
        );
        assert_eq!(
            "Very Unhealthy".parse::<AqiCategory>().unwrap(),
            AqiCategory::VeryUnhealthy
        );
    }

    #[test]
    fn bands_are_ordered_and_contiguous() {
        for pair in AQI_BANDS.windows(2) {
            let upper = pair[0].upper.unwrap();
            assert_eq!(pair[1].lower, upper + 1);
            assert!(pair[0].category < pair[1].category);
        }
        assert_eq!(AQI_BANDS[0].lower, 0);
        assert!(AQI_BANDS[AQI_BANDS.len() - 1].upper.is_none());
        assert_eq!(AQI_BANDS.len(), AqiCategory::all().len());
    }

    #[test]
    fn assessment_carries_advisory_text() {
        let assessment = AqiAssessment::new(42.0);
        assert_eq!(assessment.category, AqiCategory::Good);
        assert_eq!(assessment.cautionary_statement, "None.");
        assert!(assessment.health_implications.starts_with("Air quality is considered"));
    }

    #[test]
    fn feature_vector_requires_six_values() {
        let err = FeatureVector::try_from_values(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap_err();
        assert_eq!(
            err,
            InvalidInputError::WrongLength {
                expected: 6,
                got: 5
            }
        );
        let fv = FeatureVector::try_from_values(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]).unwrap();
        assert!((fv.get(Pollutant::So2) - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn feature_vector_rejects_non_finite() {
        let err =
            FeatureVector::try_from_values(&[1.0, f64::INFINITY, 3.0, 4.0, 5.0, 6.0]).unwrap_err();
        assert_eq!(
            err,
            InvalidInputError::NotFinite {
                pollutant: Pollutant::Pm10
            }
        );
    }

    #[test]
    fn parse_fields_by_pollutant_name() {
        let fields = [
            ("PM2.5", "35.5"),
            ("PM10", " 80 "),
            ("O3", "20"),
            ("NO2", "14.2"),
            ("SO2", "3"),
            ("CO", "0.7"),
        ];
        let fv = FeatureVector::parse_fields(|p| {
            fields
                .iter()
                .find(|(name, _)| *name == p.as_ref())
                .map(|(_, value)| *value)
        })
        .unwrap();
        assert_eq!(fv.as_slice(), &[35.5, 80.0, 20.0, 14.2, 3.0, 0.7]);
    }

    #[test]
    fn parse_fields_reports_bad_values() {
        let err = FeatureVector::parse_fields(|p| match p {
            Pollutant::O3 => Some("abc"),
            _ => Some("1"),
        })
        .unwrap_err();
        assert!(matches!(
            err,
            InvalidInputError::NotNumeric {
                pollutant: Pollutant::O3,
                ..
            }
        ));

        let err = FeatureVector::parse_fields(|p| match p {
            Pollutant::Co => None,
            _ => Some("1"),
        })
        .unwrap_err();
        assert_eq!(err, InvalidInputError::MissingField(Pollutant::Co));

        let err = FeatureVector::parse_fields(|_| Some("NaN")).unwrap_err();
        assert_eq!(
            err,
            InvalidInputError::NotFinite {
                pollutant: Pollutant::Pm25
            }
        );
    }

    #[test]
    fn pollutant_order_and_names() {
        let names: Vec<String> = Pollutant::all().iter().map(ToString::to_string).collect();
        assert_eq!(names, ["PM2.5", "PM10", "O3", "NO2", "SO2", "CO"]);
        for (i, p) in Pollutant::all().iter().enumerate() {
            assert_eq!(p.index(), i);
        }
    }
}
