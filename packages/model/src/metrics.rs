//! Regression metrics on held-out rows.

use std::fmt;

use aqi_dataset::Dataset;
use ndarray::Array1;
use serde::Serialize;

use crate::{ShapeError, TrainedModel, features_matrix, targets};

/// Errors computing evaluation metrics.
#[derive(Debug, thiserror::Error)]
pub enum EvaluationError {
    /// Predictions and targets disagree in length, or the model was fitted
    /// on a different feature width.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(#[from] ShapeError),

    /// There are no rows to evaluate.
    #[error("Test set is empty")]
    EmptyTestSet,
}

/// Error metrics of a model against held-out targets.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EvaluationReport {
    /// Mean absolute error.
    pub mae: f64,
    /// Mean squared error.
    pub mse: f64,
    /// Square root of [`Self::mse`].
    pub rmse: f64,
    /// Coefficient of determination.
    pub r2: f64,
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Mean Absolute Error: {:.2}", self.mae)?;
        writeln!(f, "Mean Squared Error: {:.2}", self.mse)?;
        writeln!(f, "Root Mean Squared Error: {:.2}", self.rmse)?;
        write!(f, "R-squared: {:.2}", self.r2)
    }
}

/// Evaluation metrics plus the per-row values they were computed from.
#[derive(Debug, Clone)]
pub struct Evaluation {
    /// Aggregate metrics.
    pub report: EvaluationReport,
    /// Observed targets, in test-set order.
    pub actual: Array1<f64>,
    /// Model predictions, in test-set order.
    pub predicted: Array1<f64>,
}

/// Computes MAE, MSE, RMSE and R² of `predicted` against `actual`.
///
/// When `actual` has zero variance, R² is `1.0` for a perfect prediction
/// and `0.0` otherwise.
///
/// # Errors
///
/// Returns [`EvaluationError::EmptyTestSet`] for empty input or
/// [`EvaluationError::ShapeMismatch`] if the lengths differ.
pub fn regression_metrics(
    actual: &Array1<f64>,
    predicted: &Array1<f64>,
) -> Result<EvaluationReport, EvaluationError> {
    if predicted.len() != actual.len() {
        return Err(ShapeError {
            expected: actual.len(),
            got: predicted.len(),
        }
        .into());
    }
    let Some(mean) = actual.mean() else {
        return Err(EvaluationError::EmptyTestSet);
    };

    #[allow(clippy::cast_precision_loss)]
    let n = actual.len() as f64;
    let residuals = actual - predicted;

    let mae = residuals.mapv(f64::abs).sum() / n;
    let ss_res = residuals.mapv(|e| e * e).sum();
    let mse = ss_res / n;
    let ss_tot = actual.mapv(|v| (v - mean) * (v - mean)).sum();

    let r2 = if ss_tot > 0.0 {
        1.0 - ss_res / ss_tot
    } else if ss_res == 0.0 {
        1.0
    } else {
        0.0
    };

    Ok(EvaluationReport {
        mae,
        mse,
        rmse: mse.sqrt(),
        r2,
    })
}

/// Scores `model` on every row of `test`.
///
/// # Errors
///
/// Returns [`EvaluationError`] if `test` is empty or has a different
/// feature width than the model.
pub fn evaluate(model: &TrainedModel, test: &Dataset) -> Result<EvaluationReport, EvaluationError> {
    Ok(evaluate_detailed(model, test)?.report)
}

/// Like [`evaluate`], also returning the actual and predicted values.
///
/// # Errors
///
/// See [`evaluate`].
pub fn evaluate_detailed(model: &TrainedModel, test: &Dataset) -> Result<Evaluation, EvaluationError> {
    if test.is_empty() {
        return Err(EvaluationError::EmptyTestSet);
    }
    let predicted = model.predict(&features_matrix(test)?)?;
    let actual = targets(test);
    let report = regression_metrics(&actual, &predicted)?;
    log::debug!("Evaluated {} rows: {report:?}", test.len());

    Ok(Evaluation {
        report,
        actual,
        predicted,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use aqi_dataset::CleanRecord;

    fn dataset(feature_names: &[&str], rows: Vec<(Vec<f64>, f64)>) -> Dataset {
        Dataset {
            feature_names: feature_names.iter().map(|s| (*s).to_owned()).collect(),
            target_name: "AQI".to_owned(),
            records: rows
                .into_iter()
                .map(|(features, target)| CleanRecord { features, target })
                .collect(),
        }
    }

    /// Fits `y = 2a + b + 1` on two features.
    fn linear_model() -> TrainedModel {
        let x = array![
            [1.0, 4.0],
            [2.0, 1.0],
            [3.0, 5.0],
            [4.0, 2.0],
            [5.0, 7.0],
            [6.0, 3.0],
            [7.0, 8.0],
            [8.0, 6.0],
        ];
        let y: Array1<f64> = x
            .rows()
            .into_iter()
            .map(|r| 2.0f64.mul_add(r[0], r[1]) + 1.0)
            .collect();
        TrainedModel::fit(&x, &y, vec!["a".to_owned(), "b".to_owned()], 1, 1e-10).unwrap()
    }

    #[test]
    fn evaluate_exact_model_is_perfect() {
        let test = dataset(
            &["a", "b"],
            vec![
                (vec![1.5, 2.0], 6.0),
                (vec![4.0, 6.0], 15.0),
                (vec![7.5, 3.0], 19.0),
            ],
        );
        let report = evaluate(&linear_model(), &test).unwrap();
        assert!(report.mae < 1e-6);
        assert!(report.mse < 1e-10);
        assert!(report.rmse < 1e-5);
        assert!((report.r2 - 1.0).abs() < 1e-9);
    }

    #[test]
    fn evaluate_rejects_narrower_test_set() {
        let narrow = dataset(&["a"], vec![(vec![1.0], 3.0), (vec![2.0], 5.0)]);
        assert!(matches!(
            evaluate(&linear_model(), &narrow),
            Err(EvaluationError::ShapeMismatch(ShapeError {
                expected: 2,
                got: 1
            }))
        ));
    }

    #[test]
    fn evaluate_rejects_ragged_records() {
        let ragged = dataset(&["a", "b"], vec![(vec![1.0, 2.0], 5.0), (vec![2.0], 5.0)]);
        assert!(matches!(
            evaluate(&linear_model(), &ragged),
            Err(EvaluationError::ShapeMismatch(ShapeError {
                expected: 2,
                got: 1
            }))
        ));
    }

    #[test]
    fn evaluate_rejects_empty_test_set() {
        let empty = dataset(&["a", "b"], Vec::new());
        assert!(matches!(
            evaluate(&linear_model(), &empty),
            Err(EvaluationError::EmptyTestSet)
        ));
    }

    #[test]
    fn perfect_predictions() {
        let y = array![10.0, 20.0, 30.0];
        let report = regression_metrics(&y, &y).unwrap();
        assert!(report.mae.abs() < f64::EPSILON);
        assert!(report.mse.abs() < f64::EPSILON);
        assert!(report.rmse.abs() < f64::EPSILON);
        assert!((report.r2 - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn known_errors() {
        let actual = array![1.0, 2.0, 3.0, 4.0];
        let predicted = array![2.0, 2.0, 3.0, 2.0];
        let report = regression_metrics(&actual, &predicted).unwrap();
        assert!((report.mae - 0.75).abs() < 1e-12);
        assert!((report.mse - 1.25).abs() < 1e-12);
        assert!((report.rmse - 1.25f64.sqrt()).abs() < 1e-12);
        // ss_tot = 5, ss_res = 5
        assert!(report.r2.abs() < 1e-12);
    }

    #[test]
    fn constant_targets() {
        let actual = array![5.0, 5.0];
        assert!((regression_metrics(&actual, &actual).unwrap().r2 - 1.0).abs() < f64::EPSILON);
        let off = array![5.0, 6.0];
        assert!(regression_metrics(&actual, &off).unwrap().r2.abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_empty_and_mismatched() {
        let empty = Array1::<f64>::zeros(0);
        assert!(matches!(
            regression_metrics(&empty, &empty),
            Err(EvaluationError::EmptyTestSet)
        ));
        assert!(matches!(
            regression_metrics(&array![1.0, 2.0], &array![1.0]),
            Err(EvaluationError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn report_displays_two_decimals() {
        let report = EvaluationReport {
            mae: 1.234,
            mse: 2.0,
            rmse: 1.414_213,
            r2: 0.987,
        };
        assert_eq!(
            report.to_string(),
            "Mean Absolute Error: 1.23\nMean Squared Error: 2.00\n\
             Root Mean Squared Error: 1.41\nR-squared: 0.99"
        );
    }
}
