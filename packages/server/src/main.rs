#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Standalone entry point for the AQI API server.
//!
//! All configuration comes from the environment (see
//! [`aqi_server::ServerConfig::from_env`]).

#[actix_web::main]
async fn main() -> Result<(), aqi_server::ServerError> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    aqi_server::run_server(aqi_server::ServerConfig::from_env()).await
}
