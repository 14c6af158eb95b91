use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Application-level constants
pub const APP_NAME: &str = "Symptom Predictor";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Fixed length of every feature vector handed to the classifier.
pub const MAX_SYMPTOMS: usize = 17;

/// Fewest symptoms a prediction request may carry.
pub const MIN_SYMPTOMS: usize = 1;

/// Description returned for a disease absent from the description table.
pub const DESCRIPTION_NOT_AVAILABLE: &str = "Description not available";

const ENV_ENVIRONMENT: &str = "PREDICTOR_ENV";
const ENV_LISTEN_ADDR: &str = "PREDICTOR_LISTEN_ADDR";
const ENV_DATA_DIR: &str = "PREDICTOR_DATA_DIR";
const ENV_MODEL_PATH: &str = "PREDICTOR_MODEL_PATH";
const ENV_CLASSES_PATH: &str = "PREDICTOR_CLASSES_PATH";

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:5000";
const DEFAULT_DATA_DIR: &str = "./datasets";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid listen address: {0}")]
    InvalidListenAddr(String),
}

/// Deployment flavour. Only affects logging verbosity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    /// Parse an environment name. Unknown names fall back to development.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "development" | "dev" | "" => Environment::Development,
            other => {
                tracing::warn!(value = other, "Unknown environment, using development");
                Environment::Development
            }
        }
    }
}

/// Default tracing filter when `RUST_LOG` is unset.
pub fn default_log_filter(environment: Environment) -> &'static str {
    match environment {
        Environment::Development => "symptom_predictor=debug,tower_http=debug,info",
        Environment::Production => "symptom_predictor=info,warn",
    }
}

/// Startup configuration. Read once; static for the process lifetime.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub environment: Environment,
    pub listen_addr: SocketAddr,
    pub dataset_path: PathBuf,
    pub severity_path: PathBuf,
    pub description_path: PathBuf,
    pub precaution_path: PathBuf,
    /// ONNX model, only consulted with the `onnx-classifier` feature.
    pub model_path: PathBuf,
    /// JSON array of class labels matching the model's output indices.
    pub classes_path: PathBuf,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        let mut config = Self {
            environment: Environment::default(),
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            dataset_path: PathBuf::new(),
            severity_path: PathBuf::new(),
            description_path: PathBuf::new(),
            precaution_path: PathBuf::new(),
            model_path: PathBuf::from("./model/classifier.onnx"),
            classes_path: PathBuf::from("./model/classes.json"),
        };
        config.set_data_dir(Path::new(DEFAULT_DATA_DIR));
        config
    }
}

impl ServiceConfig {
    /// Build the config from `PREDICTOR_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env` with an injectable variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(env) = lookup(ENV_ENVIRONMENT) {
            config.environment = Environment::parse(&env);
        }

        let addr = lookup(ENV_LISTEN_ADDR).unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());
        config.listen_addr = addr
            .parse()
            .map_err(|_| ConfigError::InvalidListenAddr(addr.clone()))?;

        if let Some(dir) = lookup(ENV_DATA_DIR) {
            config.set_data_dir(Path::new(&dir));
        }
        if let Some(path) = lookup(ENV_MODEL_PATH) {
            config.model_path = PathBuf::from(path);
        }
        if let Some(path) = lookup(ENV_CLASSES_PATH) {
            config.classes_path = PathBuf::from(path);
        }

        Ok(config)
    }

    /// Point all four reference tables at files inside `dir`.
    pub fn set_data_dir(&mut self, dir: &Path) {
        self.dataset_path = dir.join("dataset.csv");
        self.severity_path = dir.join("Symptom-severity.csv");
        self.description_path = dir.join("symptom_Description.csv");
        self.precaution_path = dir.join("symptom_precaution.csv");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_dataset_layout() {
        let config = ServiceConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.listen_addr.port(), 5000);
        assert!(config.dataset_path.ends_with("dataset.csv"));
        assert!(config.severity_path.ends_with("Symptom-severity.csv"));
        assert!(config.description_path.ends_with("symptom_Description.csv"));
        assert!(config.precaution_path.ends_with("symptom_precaution.csv"));
    }

    #[test]
    fn data_dir_rebases_all_tables() {
        let config =
            ServiceConfig::from_lookup(lookup_from(&[(ENV_DATA_DIR, "/srv/data")])).unwrap();
        assert!(config.dataset_path.starts_with("/srv/data"));
        assert!(config.severity_path.starts_with("/srv/data"));
        assert!(config.description_path.starts_with("/srv/data"));
        assert!(config.precaution_path.starts_with("/srv/data"));
    }

    #[test]
    fn invalid_listen_addr_is_rejected() {
        let result = ServiceConfig::from_lookup(lookup_from(&[(ENV_LISTEN_ADDR, "not-an-addr")]));
        assert!(matches!(result, Err(ConfigError::InvalidListenAddr(_))));
    }

    #[test]
    fn production_environment_parsed() {
        let config =
            ServiceConfig::from_lookup(lookup_from(&[(ENV_ENVIRONMENT, "Production")])).unwrap();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(
            default_log_filter(config.environment),
            "symptom_predictor=info,warn"
        );
    }

    #[test]
    fn unknown_environment_falls_back_to_development() {
        assert_eq!(Environment::parse("staging"), Environment::Development);
    }

    #[test]
    fn symptom_bounds() {
        assert_eq!(MAX_SYMPTOMS, 17);
        assert_eq!(MIN_SYMPTOMS, 1);
    }
}
