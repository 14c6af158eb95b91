//! Symptom Predictor — HTTP entry point.
//!
//! ```bash
//! # Defaults: 0.0.0.0:5000, reference CSVs under ./datasets
//! symptom-predictor
//!
//! PREDICTOR_ENV=production PREDICTOR_DATA_DIR=/srv/datasets symptom-predictor
//! PREDICTOR_LISTEN_ADDR=127.0.0.1:8080 symptom-predictor
//! ```

use std::process::ExitCode;

use symptom_predictor::config::ServiceConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match ServiceConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            symptom_predictor::init_tracing(Default::default());
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    symptom_predictor::init_tracing(config.environment);

    match symptom_predictor::run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("Failed to start: {e}");
            ExitCode::FAILURE
        }
    }
}
