//! Interactive mode for the server.
//!
//! Prompts for bind address, port and data locations before starting the
//! server, using the environment configuration as defaults.

use std::path::PathBuf;

use dialoguer::{Confirm, Input};

use crate::{ServerConfig, ServerError};

/// Runs the server in interactive mode, prompting for configuration.
///
/// Each prompt defaults to the value [`ServerConfig::from_env`] would use,
/// then delegates to [`super::run_server`].
///
/// # Errors
///
/// Returns a [`ServerError`] if the underlying server fails to start.
#[allow(clippy::future_not_send)]
pub async fn run() -> Result<(), ServerError> {
    println!("AQI Prediction Server");
    println!();

    let defaults = ServerConfig::from_env();

    let bind_addr: String = Input::new()
        .with_prompt("Bind address")
        .default(defaults.bind_addr.clone())
        .interact_text()
        .unwrap_or_else(|_| defaults.bind_addr.clone());

    let port: u16 = Input::new()
        .with_prompt("Port")
        .default(defaults.port)
        .interact_text()
        .unwrap_or(defaults.port);

    let model_path = prompt_path("Model artefact", &defaults.model_path);
    let history_path = prompt_path("Historical readings CSV", &defaults.history_path);

    if !Confirm::new()
        .with_prompt(format!("Start server on {bind_addr}:{port}?"))
        .default(true)
        .interact()
        .unwrap_or(true)
    {
        println!("Cancelled.");
        return Ok(());
    }

    super::run_server(ServerConfig {
        bind_addr,
        port,
        model_path,
        history_path,
        ..defaults
    })
    .await
}

fn prompt_path(prompt: &str, default: &std::path::Path) -> PathBuf {
    let default = default.display().to_string();
    let value: String = Input::new()
        .with_prompt(prompt)
        .default(default.clone())
        .interact_text()
        .unwrap_or(default);
    PathBuf::from(value)
}
