//! Ridge strength selection by seeded k-fold grid search.
//!
//! Every `(alpha, fold)` pair is an independent fit, so the grid runs on
//! the rayon pool. Scores are collected back in grid order before they are
//! aggregated, which keeps the selected alpha and the refitted
//! coefficients identical regardless of scheduling.

use std::path::Path;
use std::sync::Arc;

use aqi_dataset::{DEFAULT_TARGET_COLUMN, Dataset};
use ndarray::{Array1, Array2, Axis};
use rand::SeedableRng as _;
use rand::rngs::StdRng;
use rand::seq::SliceRandom as _;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::progress::{ProgressCallback, null_progress};
use crate::{ConfigError, TrainedModel, TrainingError, features_matrix, targets};

/// Training pipeline configuration.
///
/// Every field has a default, so a config file only needs to name the
/// values it overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct TrainerConfig {
    /// Candidate ridge strengths.
    pub alphas: Vec<f64>,
    /// Number of cross-validation folds.
    pub folds: usize,
    /// Polynomial expansion degree.
    pub degree: usize,
    /// Seed for the train/test split and fold assignment.
    pub seed: u64,
    /// Fraction of cleaned rows held out for evaluation.
    pub test_fraction: f64,
    /// Name of the target column.
    pub target_column: String,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            alphas: vec![0.1, 1.0, 10.0, 100.0],
            folds: 5,
            degree: 2,
            seed: 42,
            test_fraction: 0.2,
            target_column: DEFAULT_TARGET_COLUMN.to_owned(),
        }
    }
}

impl TrainerConfig {
    /// Loads a config from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Checks the config is usable.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::InvalidConfig`] describing the first
    /// problem found.
    pub fn validate(&self) -> Result<(), TrainingError> {
        if self.alphas.is_empty() {
            return Err(TrainingError::InvalidConfig(
                "at least one alpha is required".to_owned(),
            ));
        }
        if let Some(alpha) = self.alphas.iter().find(|a| !(a.is_finite() && **a > 0.0)) {
            return Err(TrainingError::InvalidConfig(format!(
                "alpha must be positive and finite, got {alpha}"
            )));
        }
        if self.folds < 2 {
            return Err(TrainingError::InvalidConfig(format!(
                "at least 2 folds are required, got {}",
                self.folds
            )));
        }
        if self.degree == 0 {
            return Err(TrainingError::InvalidConfig(
                "polynomial degree must be at least 1".to_owned(),
            ));
        }
        if !(self.test_fraction > 0.0 && self.test_fraction < 1.0) {
            return Err(TrainingError::InvalidConfig(format!(
                "test fraction must be in (0, 1), got {}",
                self.test_fraction
            )));
        }
        Ok(())
    }
}

/// Cross-validation result for one candidate alpha.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateScore {
    /// The candidate ridge strength.
    pub alpha: f64,
    /// Held-out mean squared error of each fold, in fold order.
    pub fold_mse: Vec<f64>,
    /// Mean of `fold_mse`.
    pub mean_mse: f64,
}

/// Result of a completed grid search.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    /// Pipeline refitted on the full training set with the best alpha.
    pub model: TrainedModel,
    /// The selected alpha.
    pub alpha: f64,
    /// Scores of every candidate, in configuration order.
    pub candidates: Vec<CandidateScore>,
}

/// Fits the scaler → polynomial → ridge pipeline with cross-validated
/// alpha selection.
pub struct ModelTrainer {
    config: TrainerConfig,
    progress: Arc<dyn ProgressCallback>,
}

impl ModelTrainer {
    /// Creates a trainer with the given config and no progress reporting.
    #[must_use]
    pub fn new(config: TrainerConfig) -> Self {
        Self {
            config,
            progress: null_progress(),
        }
    }

    /// Reports one unit of progress per cross-validation fit.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressCallback>) -> Self {
        self.progress = progress;
        self
    }

    /// The trainer's configuration.
    #[must_use]
    pub const fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Runs the grid search on `train` and refits the winner on all of it.
    ///
    /// # Errors
    ///
    /// Returns [`TrainingError::InvalidConfig`] for a bad config,
    /// [`TrainingError::TooFewRows`] if `train` has fewer rows than folds,
    /// or the first fit failure encountered in grid order.
    pub fn train(&self, train: &Dataset) -> Result<TrainingOutcome, TrainingError> {
        self.config.validate()?;

        let folds = self.config.folds;
        if train.len() < folds {
            return Err(TrainingError::TooFewRows {
                rows: train.len(),
                folds,
            });
        }

        let x = features_matrix(train)?;
        let y = targets(train);
        let fold_indices = kfold_indices(train.len(), folds, self.config.seed);

        let grid: Vec<(f64, usize)> = self
            .config
            .alphas
            .iter()
            .flat_map(|&alpha| (0..folds).map(move |fold| (alpha, fold)))
            .collect();

        log::info!(
            "Grid search: {} candidates x {folds} folds on {} rows",
            self.config.alphas.len(),
            train.len()
        );
        self.progress.set_total(grid.len() as u64);

        let scores: Vec<Result<f64, TrainingError>> = grid
            .par_iter()
            .map(|&(alpha, fold)| {
                let score = self.fold_mse(&x, &y, &train.feature_names, &fold_indices, fold, alpha);
                self.progress.inc(1);
                score
            })
            .collect();
        let scores = scores.into_iter().collect::<Result<Vec<f64>, _>>()?;

        let candidates: Vec<CandidateScore> = self
            .config
            .alphas
            .iter()
            .zip(scores.chunks(folds))
            .map(|(&alpha, fold_mse)| {
                #[allow(clippy::cast_precision_loss)]
                let mean_mse = fold_mse.iter().sum::<f64>() / fold_mse.len() as f64;
                log::debug!("alpha={alpha}: mean CV MSE {mean_mse:.4}");
                CandidateScore {
                    alpha,
                    fold_mse: fold_mse.to_vec(),
                    mean_mse,
                }
            })
            .collect();

        let best = select_best(&candidates).ok_or(TrainingError::NoCandidates)?;
        self.progress
            .finish(format!("Selected alpha={}", best.alpha));
        log::info!(
            "Selected alpha={} (mean CV MSE {:.4})",
            best.alpha,
            best.mean_mse
        );

        let model = TrainedModel::fit(
            &x,
            &y,
            train.feature_names.clone(),
            self.config.degree,
            best.alpha,
        )?;

        Ok(TrainingOutcome {
            alpha: best.alpha,
            model,
            candidates,
        })
    }

    /// Fits on every fold but `fold` and returns the MSE on `fold`.
    fn fold_mse(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        feature_names: &[String],
        fold_indices: &[Vec<usize>],
        fold: usize,
        alpha: f64,
    ) -> Result<f64, TrainingError> {
        let held_out = &fold_indices[fold];
        let fit_rows: Vec<usize> = fold_indices
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != fold)
            .flat_map(|(_, rows)| rows.iter().copied())
            .collect();

        let model = TrainedModel::fit(
            &x.select(Axis(0), &fit_rows),
            &y.select(Axis(0), &fit_rows),
            feature_names.to_vec(),
            self.config.degree,
            alpha,
        )?;
        let predicted = model.predict(&x.select(Axis(0), held_out))?;
        let actual = y.select(Axis(0), held_out);

        #[allow(clippy::cast_precision_loss)]
        let mse = (&predicted - &actual).mapv(|e| e * e).sum() / held_out.len() as f64;
        Ok(mse)
    }
}

/// Lowest mean MSE wins; equal scores go to the smaller alpha.
fn select_best(candidates: &[CandidateScore]) -> Option<&CandidateScore> {
    candidates
        .iter()
        .filter(|c| c.mean_mse.is_finite())
        .min_by(|a, b| {
            a.mean_mse
                .total_cmp(&b.mean_mse)
                .then(a.alpha.total_cmp(&b.alpha))
        })
}

/// Shuffles `0..rows` with `seed` and cuts it into `k` contiguous folds.
/// The first `rows % k` folds get one extra row. `k == 0` yields no folds.
#[must_use]
pub fn kfold_indices(rows: usize, k: usize, seed: u64) -> Vec<Vec<usize>> {
    if k == 0 {
        return Vec::new();
    }
    let mut indices: Vec<usize> = (0..rows).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let base = rows / k;
    let extra = rows % k;
    let mut folds = Vec::with_capacity(k);
    let mut start = 0;
    for i in 0..k {
        let len = base + usize::from(i < extra);
        folds.push(indices[start..start + len].to_vec());
        start += len;
    }
    folds
}
