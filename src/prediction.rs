//! Prediction pipeline: symptom names → severity vector → classifier →
//! description and precaution enrichment.
//!
//! Stateless per call. The pipeline holds shared read-only handles to the
//! reference data and the classifier, so one instance serves concurrent
//! requests without locking.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::classifier::{DiseaseClassifier, FeatureVector, InferenceError};
use crate::config::{MAX_SYMPTOMS, MIN_SYMPTOMS};
use crate::reference::ReferenceData;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("too few symptoms: at least {min} symptom required")]
    TooFewSymptoms { min: usize },

    #[error("too many symptoms: maximum {max} symptoms allowed, got {got}")]
    TooManySymptoms { max: usize, got: usize },

    #[error("missing 'symptoms' field in request body")]
    MissingField,

    #[error("'symptoms' must be a list of strings")]
    NotAList,

    #[error("malformed request: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum PredictionError {
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("Inference failed: {0}")]
    Inference(#[from] InferenceError),
}

/// Predicted disease with its enrichment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictionResult {
    pub disease: String,
    pub description: String,
    pub precautions: Vec<String>,
}

/// Check symptom count bounds. Runs before any encoding or inference.
pub fn validate_symptoms<S: AsRef<str>>(symptoms: &[S]) -> Result<(), ValidationError> {
    if symptoms.len() < MIN_SYMPTOMS {
        return Err(ValidationError::TooFewSymptoms { min: MIN_SYMPTOMS });
    }
    if symptoms.len() > MAX_SYMPTOMS {
        return Err(ValidationError::TooManySymptoms {
            max: MAX_SYMPTOMS,
            got: symptoms.len(),
        });
    }
    Ok(())
}

pub struct PredictionPipeline {
    reference: Arc<ReferenceData>,
    classifier: Arc<dyn DiseaseClassifier>,
}

impl PredictionPipeline {
    pub fn new(reference: Arc<ReferenceData>, classifier: Arc<dyn DiseaseClassifier>) -> Self {
        Self {
            reference,
            classifier,
        }
    }

    /// Map each symptom to its severity weight in input order, then pad or
    /// truncate to `MAX_SYMPTOMS`. Unknown symptoms weigh 0.
    pub fn encode<S: AsRef<str>>(&self, symptoms: &[S]) -> FeatureVector {
        FeatureVector::from_weights(
            symptoms
                .iter()
                .map(|s| self.reference.severity_weight(s.as_ref())),
        )
    }

    pub fn predict<S: AsRef<str>>(&self, symptoms: &[S]) -> Result<PredictionResult, PredictionError> {
        validate_symptoms(symptoms)?;

        let features = self.encode(symptoms);
        tracing::debug!(
            symptoms = symptoms.len(),
            features = ?features.as_slice(),
            "Encoded symptom vector"
        );

        let labels = self.classifier.predict(std::slice::from_ref(&features))?;
        let disease = labels
            .into_iter()
            .next()
            .ok_or(InferenceError::EmptyOutput)?;

        let result = PredictionResult {
            description: self.reference.description(&disease).to_string(),
            precautions: self.reference.precautions(&disease).to_vec(),
            disease,
        };

        tracing::info!(disease = %result.disease, "Prediction successful");
        Ok(result)
    }
}
