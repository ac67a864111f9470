//! Interactive menu shown when `aqi` runs without a subcommand.

use std::path::PathBuf;

use aqi_cli_utils::MultiProgress;
use aqi_model::TrainerConfig;
use aqi_models::{FeatureVector, Pollutant};
use aqi_predict::PredictionService;
use aqi_server::{DEFAULT_HISTORY_PATH, DEFAULT_MODEL_PATH};
use dialoguer::{Confirm, Input, Select};

use crate::pipeline;

/// Top-level tool selection.
enum Tool {
    Train,
    Evaluate,
    Predict,
    History,
    Server,
}

impl Tool {
    const ALL: &[Self] = &[
        Self::Train,
        Self::Evaluate,
        Self::Predict,
        Self::History,
        Self::Server,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Train => "Train model",
            Self::Evaluate => "Evaluate saved model",
            Self::Predict => "Predict AQI",
            Self::History => "Monthly AQI for a city",
            Self::Server => "Start server",
        }
    }
}

/// Prompts for a tool and runs it.
///
/// # Errors
///
/// Returns an error if a prompt fails or the selected tool fails.
#[allow(clippy::future_not_send)]
pub async fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    println!("AQI Toolchain");
    println!();

    let labels: Vec<&str> = Tool::ALL.iter().map(Tool::label).collect();

    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    match Tool::ALL[idx] {
        Tool::Train => {
            let data = prompt_path("Training CSV", "datasets/BOOK2.csv")?;
            let model_out = prompt_path("Save model to", DEFAULT_MODEL_PATH)?;
            let config = prompt_config()?;
            let summary = pipeline::train(&data, &model_out, &config, multi)?;
            println!("Best alpha: {}", summary.outcome.alpha);
            println!("{}", summary.report);
            println!("Model saved to {}", summary.model_path.display());
        }
        Tool::Evaluate => {
            let data = prompt_path("Dataset CSV", "datasets/BOOK2.csv")?;
            let model = prompt_path("Model artefact", DEFAULT_MODEL_PATH)?;
            let report = pipeline::evaluate(&data, &model, &TrainerConfig::default(), None)?;
            println!("{report}");
        }
        Tool::Predict => {
            let model = prompt_path("Model artefact", DEFAULT_MODEL_PATH)?;
            let service = PredictionService::load(&model)?;

            let mut raw = Vec::with_capacity(FeatureVector::LEN);
            for pollutant in Pollutant::all() {
                let value: String = Input::new()
                    .with_prompt(pollutant.to_string())
                    .interact_text()?;
                raw.push(value);
            }
            let features = FeatureVector::parse_fields(|p| Some(raw[p.index()].as_str()))?;
            crate::print_assessment(&service.assess(&features)?);
        }
        Tool::History => {
            let history = prompt_path("Historical readings CSV", DEFAULT_HISTORY_PATH)?;
            let city: String = Input::new().with_prompt("City").interact_text()?;
            crate::print_history(&history, &city)?;
        }
        Tool::Server => {
            // The server uses actix-web's runtime, so we need to run it
            // in a blocking task to avoid nesting tokio runtimes.
            tokio::task::spawn_blocking(|| {
                actix_web::rt::System::new().block_on(aqi_server::interactive::run())
            })
            .await??;
        }
    }

    Ok(())
}

fn prompt_path(prompt: &str, default: &str) -> Result<PathBuf, dialoguer::Error> {
    let value: String = Input::new()
        .with_prompt(prompt)
        .default(default.to_string())
        .interact_text()?;
    Ok(PathBuf::from(value))
}

fn prompt_config() -> Result<TrainerConfig, Box<dyn std::error::Error>> {
    let mut config = TrainerConfig::default();

    if !Confirm::new()
        .with_prompt("Configure advanced options?")
        .default(false)
        .interact()?
    {
        return Ok(config);
    }

    config.seed = Input::new()
        .with_prompt("Random seed")
        .default(config.seed)
        .interact_text()?;
    config.folds = Input::new()
        .with_prompt("Cross-validation folds")
        .default(config.folds)
        .interact_text()?;
    config.test_fraction = Input::new()
        .with_prompt("Test fraction")
        .default(config.test_fraction)
        .interact_text()?;
    config.degree = Input::new()
        .with_prompt("Polynomial degree")
        .default(config.degree)
        .interact_text()?;

    Ok(config)
}
