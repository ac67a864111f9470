#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line toolchain for the AQI regression model.
//!
//! ```text
//! aqi train --data datasets/book2.csv [--model-out PATH] [--config trainer.toml]
//! aqi evaluate --data datasets/book2.csv [--model PATH] [--predictions-out PATH]
//! aqi predict [--model PATH] <PM2.5> <PM10> <O3> <NO2> <SO2> <CO>
//! aqi history [--history PATH] <CITY>
//! aqi cities [--history PATH]
//! aqi serve [--bind-addr ADDR] [--port PORT]
//! ```
//!
//! Running `aqi` with no subcommand enters interactive mode.
//!
//! Uses `indicatif-log-bridge` (via [`aqi_cli_utils::init_logger`]) to
//! route `log` output through `indicatif::MultiProgress` so that log lines
//! and progress bars never fight for the terminal.

mod interactive;
mod pipeline;

use std::path::{Path, PathBuf};

use aqi_model::{ConfigError, TrainerConfig};
use aqi_models::AqiAssessment;
use aqi_predict::PredictionService;
use aqi_server::{DEFAULT_HISTORY_PATH, DEFAULT_MODEL_PATH, ServerConfig};
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "aqi", about = "Train, evaluate and serve the AQI regression model")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Overrides applied on top of the trainer defaults or a config file.
#[derive(Args)]
struct TrainingArgs {
    /// TOML file with trainer settings
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for the train/test split and fold assignment
    #[arg(long)]
    seed: Option<u64>,
    /// Number of cross-validation folds
    #[arg(long)]
    folds: Option<usize>,
    /// Fraction of rows held out for evaluation
    #[arg(long)]
    test_fraction: Option<f64>,
}

impl TrainingArgs {
    fn resolve(&self) -> Result<TrainerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => TrainerConfig::from_toml_file(path)?,
            None => TrainerConfig::default(),
        };
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(folds) = self.folds {
            config.folds = folds;
        }
        if let Some(test_fraction) = self.test_fraction {
            config.test_fraction = test_fraction;
        }
        Ok(config)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Train a model and save it as a MessagePack artefact
    Train {
        /// CSV file of pollutant columns plus the AQI target
        #[arg(long)]
        data: PathBuf,
        /// Where to write the trained model
        #[arg(long, default_value = DEFAULT_MODEL_PATH)]
        model_out: PathBuf,
        #[command(flatten)]
        training: TrainingArgs,
    },
    /// Score a saved model on the held-out split of a dataset
    Evaluate {
        /// CSV file the model was trained on
        #[arg(long)]
        data: PathBuf,
        /// Model artefact to evaluate
        #[arg(long, default_value = DEFAULT_MODEL_PATH)]
        model: PathBuf,
        /// Write actual vs. predicted values to this CSV
        #[arg(long)]
        predictions_out: Option<PathBuf>,
        #[command(flatten)]
        training: TrainingArgs,
    },
    /// Predict the AQI for one set of pollutant readings
    Predict {
        /// Model artefact to use
        #[arg(long, default_value = DEFAULT_MODEL_PATH)]
        model: PathBuf,
        /// PM2.5, PM10, O3, NO2, SO2 and CO, in that order
        #[arg(required = true, allow_negative_numbers = true)]
        values: Vec<f64>,
    },
    /// Show the monthly mean AQI of a city
    History {
        /// Historical readings CSV
        #[arg(long, default_value = DEFAULT_HISTORY_PATH)]
        history: PathBuf,
        /// City name
        city: String,
    },
    /// List cities with historical readings
    Cities {
        /// Historical readings CSV
        #[arg(long, default_value = DEFAULT_HISTORY_PATH)]
        history: PathBuf,
    },
    /// Start the HTTP server
    Serve {
        /// Address to bind to (overrides `BIND_ADDR`)
        #[arg(long)]
        bind_addr: Option<String>,
        /// Port to listen on (overrides `PORT`)
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = aqi_cli_utils::init_logger();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return interactive::run(&multi).await;
    };

    match command {
        Commands::Train {
            data,
            model_out,
            training,
        } => {
            let config = training.resolve()?;
            let summary = pipeline::train(&data, &model_out, &config, &multi)?;
            println!("Best alpha: {}", summary.outcome.alpha);
            println!("{}", summary.report);
            println!("Model saved to {}", summary.model_path.display());
        }
        Commands::Evaluate {
            data,
            model,
            predictions_out,
            training,
        } => {
            let config = training.resolve()?;
            let report = pipeline::evaluate(&data, &model, &config, predictions_out.as_deref())?;
            println!("{report}");
        }
        Commands::Predict { model, values } => {
            let service = PredictionService::load(&model)?;
            let aqi = service.predict_values(&values)?;
            print_assessment(&AqiAssessment::new(aqi));
        }
        Commands::History { history, city } => print_history(&history, &city)?,
        Commands::Cities { history } => {
            let readings = aqi_history::load_csv(&history)?;
            for city in readings.cities() {
                println!("{city}");
            }
        }
        Commands::Serve { bind_addr, port } => {
            let mut config = ServerConfig::from_env();
            if let Some(bind_addr) = bind_addr {
                config.bind_addr = bind_addr;
            }
            if let Some(port) = port {
                config.port = port;
            }
            serve(config).await?;
        }
    }

    Ok(())
}

fn print_assessment(assessment: &AqiAssessment) {
    println!("AQI: {:.2}", assessment.aqi);
    println!("Category: {}", assessment.category);
    println!("Health Implications: {}", assessment.health_implications);
    println!("Cautionary Statement: {}", assessment.cautionary_statement);
}

fn print_history(path: &Path, city: &str) -> Result<(), Box<dyn std::error::Error>> {
    let readings = aqi_history::load_csv(path)?;
    let months = readings.monthly_average(city)?;

    println!("{:<10} AQI", "MONTH");
    println!("{}", "-".repeat(20));
    for month in &months {
        println!("{:<10} {:.2}", month.month, month.aqi);
    }
    Ok(())
}

async fn serve(config: ServerConfig) -> Result<(), Box<dyn std::error::Error>> {
    // The server uses actix-web's runtime, so we need to run it
    // in a blocking task to avoid nesting tokio runtimes.
    tokio::task::spawn_blocking(|| {
        actix_web::rt::System::new().block_on(aqi_server::run_server(config))
    })
    .await??;
    Ok(())
}
