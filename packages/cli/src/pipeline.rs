//! Batch training and evaluation orchestration.
//!
//! Chains load -> clean -> split -> grid search -> evaluate -> save. Any
//! failure aborts the run before an artefact is written.

use std::path::{Path, PathBuf};
use std::time::Instant;

use aqi_cli_utils::{IndicatifProgress, MultiProgress};
use aqi_dataset::{DataCleaner, DataError, Dataset, Split, train_test_split};
use aqi_model::metrics::{Evaluation, evaluate_detailed};
use aqi_models::{FeatureOrderError, check_feature_order};
use aqi_model::{
    ArtifactError, EvaluationError, EvaluationReport, ModelTrainer, TrainerConfig, TrainingError,
    TrainingOutcome, artifact,
};

/// Errors aborting a batch run.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Loading or cleaning the dataset failed.
    #[error(transparent)]
    Data(#[from] DataError),

    /// Model fitting failed.
    #[error(transparent)]
    Training(#[from] TrainingError),

    /// Scoring the model failed.
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),

    /// The dataset's feature columns are not the pollutants in serving
    /// order.
    #[error(transparent)]
    FeatureOrder(#[from] FeatureOrderError),

    /// Reading or writing the artefact failed.
    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    /// Writing the predictions CSV failed.
    #[error("Failed to write predictions: {0}")]
    Output(#[from] csv::Error),
}

/// Result of a completed training run.
pub struct TrainSummary {
    /// Grid search result, including the refitted model.
    pub outcome: TrainingOutcome,
    /// Held-out metrics of the refitted model.
    pub report: EvaluationReport,
    /// Where the artefact was written.
    pub model_path: PathBuf,
}

/// Loads, cleans and splits `data` per `config`.
///
/// # Errors
///
/// Returns [`DataError`] if the file cannot be read, lacks the target
/// column, has no usable rows, or is too small to split.
pub fn prepare(data: &Path, config: &TrainerConfig) -> Result<Split, DataError> {
    let table = aqi_dataset::load_csv(data)?;
    let dataset: Dataset = DataCleaner::new(config.target_column.clone()).clean(&table)?;
    log::debug!("Feature columns: {}", dataset.feature_names.join(", "));
    train_test_split(&dataset, config.test_fraction, config.seed)
}

/// Trains, evaluates and saves a model.
///
/// # Errors
///
/// Returns the first [`PipelineError`] encountered, including
/// [`PipelineError::FeatureOrder`] when the feature columns are not the
/// pollutants in serving order; nothing is written unless every step
/// succeeds.
pub fn train(
    data: &Path,
    model_out: &Path,
    config: &TrainerConfig,
    multi: &MultiProgress,
) -> Result<TrainSummary, PipelineError> {
    let start = Instant::now();
    config.validate()?;

    let split = prepare(data, config)?;
    // Requests are matched to model inputs by position.
    check_feature_order(&split.train.feature_names)?;

    let progress = IndicatifProgress::batch_bar(multi, "Cross-validating");
    let outcome = ModelTrainer::new(config.clone())
        .with_progress(progress)
        .train(&split.train)?;

    for candidate in &outcome.candidates {
        log::info!(
            "  alpha={:<8} mean CV MSE {:.2}",
            candidate.alpha,
            candidate.mean_mse
        );
    }

    let report = aqi_model::evaluate(&outcome.model, &split.test)?;
    for line in report.to_string().lines() {
        log::info!("{line}");
    }

    artifact::save(&outcome.model, model_out)?;

    log::info!("Training finished in {:.1}s", start.elapsed().as_secs_f64());

    Ok(TrainSummary {
        outcome,
        report,
        model_path: model_out.to_path_buf(),
    })
}

/// Re-creates the held-out split of `data` and scores a saved model on it.
///
/// Uses the same seed and test fraction as training so the rows match.
/// When `predictions_out` is given, writes one `actual,predicted` row per
/// test sample.
///
/// # Errors
///
/// Returns a [`PipelineError`] if the model or data cannot be loaded, the
/// model does not fit the data's feature width, or the output cannot be
/// written.
pub fn evaluate(
    data: &Path,
    model_path: &Path,
    config: &TrainerConfig,
    predictions_out: Option<&Path>,
) -> Result<EvaluationReport, PipelineError> {
    let model = artifact::load(model_path)?;
    let split = prepare(data, config)?;
    let evaluation = evaluate_detailed(&model, &split.test)?;

    if let Some(path) = predictions_out {
        write_predictions(path, &evaluation)?;
        log::info!(
            "Wrote {} predictions to {}",
            evaluation.predicted.len(),
            path.display()
        );
    }

    Ok(evaluation.report)
}

fn write_predictions(path: &Path, evaluation: &Evaluation) -> Result<(), csv::Error> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["actual", "predicted", "residual"])?;
    for (actual, predicted) in evaluation.actual.iter().zip(&evaluation.predicted) {
        writer.write_record([
            format!("{actual:.2}"),
            format!("{predicted:.2}"),
            format!("{:.2}", actual - predicted),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
