#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for AQI prediction.
//!
//! Serves single-sample predictions (HTML form and JSON), the list of
//! cities with historical readings, monthly AQI series per city, and any
//! static pages found in the configured static directory. The model and
//! the historical readings are loaded once at startup and shared
//! read-only across workers.

mod handlers;
pub mod interactive;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use aqi_history::{HistoricalReadings, HistoryError};
use aqi_predict::{LoadError, PredictionService};

/// Default location of the trained model artefact.
pub const DEFAULT_MODEL_PATH: &str = "data/ridge_regression_model.msgpack";

/// Default location of the historical readings CSV.
pub const DEFAULT_HISTORY_PATH: &str = "data/forecast.csv";

/// Default directory of static pages.
pub const DEFAULT_STATIC_DIR: &str = "static";

/// Errors that prevent the server from starting.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The model artefact is missing, unusable, or was trained on other
    /// columns than the pollutant inputs.
    #[error("Failed to load model: {0}")]
    Model(#[from] LoadError),

    /// The historical readings exist but could not be read.
    #[error("Failed to load historical readings: {0}")]
    History(#[from] HistoryError),

    /// Binding or running the HTTP server failed.
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: String,
    /// Port to listen on.
    pub port: u16,
    /// Model artefact path.
    pub model_path: PathBuf,
    /// Historical readings CSV path.
    pub history_path: PathBuf,
    /// Directory served at `/`.
    pub static_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            history_path: PathBuf::from(DEFAULT_HISTORY_PATH),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
        }
    }
}

impl ServerConfig {
    /// Reads `BIND_ADDR`, `PORT`, `AQI_MODEL_PATH`, `AQI_HISTORY_PATH` and
    /// `AQI_STATIC_DIR`, falling back to defaults for unset or invalid
    /// values.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let path_var = |name: &str, default: PathBuf| {
            std::env::var_os(name).map_or(default, PathBuf::from)
        };

        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            model_path: path_var("AQI_MODEL_PATH", defaults.model_path),
            history_path: path_var("AQI_HISTORY_PATH", defaults.history_path),
            static_dir: path_var("AQI_STATIC_DIR", defaults.static_dir),
        }
    }
}

/// Shared application state.
pub struct AppState {
    /// Prediction service over the loaded model.
    pub predictor: PredictionService,
    /// Historical readings for the city endpoints.
    pub history: Arc<HistoricalReadings>,
}

impl AppState {
    /// Loads the model and historical readings named by `config`.
    ///
    /// A missing history file only disables the history endpoints'
    /// data; a missing or corrupt model is fatal.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Model`] if the model cannot be loaded or
    /// [`ServerError::History`] if the history file exists but is invalid.
    pub fn load(config: &ServerConfig) -> Result<Self, ServerError> {
        log::info!("Loading model from {}...", config.model_path.display());
        let predictor = PredictionService::load(&config.model_path)?;

        let history = load_history(&config.history_path)?;

        Ok(Self {
            predictor,
            history: Arc::new(history),
        })
    }
}

fn load_history(path: &Path) -> Result<HistoricalReadings, HistoryError> {
    if !path.exists() {
        log::warn!(
            "Historical readings not found at {}; city endpoints will be empty",
            path.display()
        );
        return Ok(HistoricalReadings::default());
    }
    log::info!("Loading historical readings from {}...", path.display());
    aqi_history::load_csv(path)
}

/// Registers the API routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/predict", web::post().to(handlers::predict_form))
        .route("/cities", web::get().to(handlers::cities))
        .route("/aqi", web::get().to(handlers::monthly_aqi))
        .service(
            web::scope("/api")
                .route("/health", web::get().to(handlers::health))
                .route("/predict", web::post().to(handlers::api_predict)),
        );
}

/// Starts the AQI API server.
///
/// Loads the model and historical readings, then runs the Actix-Web HTTP
/// server until it is shut down. The caller provides the async runtime
/// (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns a [`ServerError`] if startup state cannot be loaded, or if the
/// HTTP server fails to bind or encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let state = web::Data::new(AppState::load(&config)?);
    let static_dir = config.static_dir.clone();

    log::info!("Starting server on {}:{}", config.bind_addr, config.port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
            // Serve static pages
            .service(Files::new("/", &static_dir).index_file("index.html"))
    })
    .bind((config.bind_addr, config.port))?
    .run()
    .await?;

    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use aqi_history::AqiReading;
    use aqi_history::csv::parse_date;
    use aqi_model::TrainedModel;
    use aqi_models::Pollutant;
    use ndarray::{Array1, Array2};

    use super::*;

    /// Small deterministic model over the six pollutant columns.
    pub fn model() -> TrainedModel {
        let x = Array2::from_shape_fn((40, 6), |(i, j)| {
            #[allow(clippy::cast_precision_loss)]
            let (i, j) = (i as f64, j as f64);
            ((i + 2.0) * (j + 0.3)).sin().mul_add(15.0, 2.0f64.mul_add(j, 30.0))
        });
        let y: Array1<f64> = x
            .rows()
            .into_iter()
            .map(|r| 1.5f64.mul_add(r[0], 0.5 * r[1]) + 5.0)
            .collect();
        let names = Pollutant::all().iter().map(ToString::to_string).collect();
        TrainedModel::fit(&x, &y, names, 2, 1.0).unwrap()
    }

    pub fn state() -> AppState {
        let history = [
            AqiReading::new("X", parse_date("2023-01-01"), Some(10.0)),
            AqiReading::new("X", parse_date("2023-01-15"), Some(20.0)),
            AqiReading::new("X", parse_date("2023-02-01"), Some(30.0)),
            AqiReading::new("Empty", parse_date("2023-02-01"), None),
        ]
        .into_iter()
        .collect();

        AppState {
            predictor: PredictionService::new(model()),
            history: Arc::new(history),
        }
    }
}
