pub mod api;
pub mod classifier;
pub mod config;
pub mod prediction;
pub mod reference;

use std::sync::Arc;

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::api::{ApiContext, ServerError};
use crate::classifier::{DiseaseClassifier, InferenceError, NearestNeighborClassifier};
use crate::config::{ConfigError, Environment, ServiceConfig};
use crate::reference::{DataLoadError, ReferenceData};

/// Anything that stops the service from reaching a serving state.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Reference data error: {0}")]
    DataLoad(#[from] DataLoadError),

    #[error("Classifier error: {0}")]
    Classifier(#[from] InferenceError),

    #[error("Server error: {0}")]
    Server(#[from] ServerError),
}

/// Install the global tracing subscriber. `RUST_LOG` wins over the
/// environment default.
pub fn init_tracing(environment: Environment) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter(environment))),
        )
        .init();
}

/// Pick the classifier for this build.
///
/// With `onnx-classifier` and a model file on disk the exported model is
/// used; otherwise the nearest-neighbour index over the encoded dataset.
pub fn load_classifier(
    config: &ServiceConfig,
    reference: &ReferenceData,
) -> Result<Arc<dyn DiseaseClassifier>, InferenceError> {
    if let Some(onnx) = load_onnx_classifier(config)? {
        return Ok(onnx);
    }

    tracing::debug!(model = %config.model_path.display(), "Using nearest-neighbour classifier");

    let index = NearestNeighborClassifier::new(
        reference
            .records()
            .iter()
            .map(|r| (r.disease.clone(), r.features)),
    );
    if index.is_empty() {
        return Err(InferenceError::ModelInit(
            "no dataset rows to index".into(),
        ));
    }

    tracing::info!(rows = index.len(), "Nearest-neighbour classifier ready");
    Ok(Arc::new(index))
}

#[cfg(feature = "onnx-classifier")]
fn load_onnx_classifier(
    config: &ServiceConfig,
) -> Result<Option<Arc<dyn DiseaseClassifier>>, InferenceError> {
    if !config.model_path.exists() {
        return Ok(None);
    }
    let onnx = classifier::OnnxClassifier::load(&config.model_path, &config.classes_path)?;
    Ok(Some(Arc::new(onnx)))
}

#[cfg(not(feature = "onnx-classifier"))]
fn load_onnx_classifier(
    _config: &ServiceConfig,
) -> Result<Option<Arc<dyn DiseaseClassifier>>, InferenceError> {
    Ok(None)
}

/// Load reference data and the classifier, then build the shared context.
pub fn build_context(config: &ServiceConfig) -> Result<ApiContext, StartupError> {
    let reference = Arc::new(ReferenceData::load_from_config(config)?);
    let classifier = load_classifier(config, &reference)?;
    Ok(ApiContext::new(reference, classifier))
}

/// Serve until Ctrl-C.
pub async fn run(config: ServiceConfig) -> Result<(), StartupError> {
    tracing::info!(
        "{} starting v{} ({:?})",
        config::APP_NAME,
        config::APP_VERSION,
        config.environment
    );

    let ctx = build_context(&config)?;
    let mut server = api::start_server(ctx, config.listen_addr).await?;

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }

    server.shutdown();
    server.wait().await;
    Ok(())
}
