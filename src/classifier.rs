//! Disease classifier capability.
//!
//! The prediction pipeline only sees `DiseaseClassifier`: a batch of
//! fixed-length severity vectors in, one disease label per row out.
//! Two implementations ship:
//! - `NearestNeighborClassifier` — always available, indexes the encoded
//!   disease dataset and returns the label of the closest row.
//! - `OnnxClassifier` — behind the `onnx-classifier` feature, runs an
//!   exported model whose first output is a class-index tensor.

use std::path::PathBuf;

use serde::Serialize;
use thiserror::Error;

use crate::config::MAX_SYMPTOMS;

#[derive(Error, Debug)]
pub enum InferenceError {
    #[error("Classifier returned no labels")]
    EmptyOutput,

    #[error("Classifier emitted unknown class index: {0}")]
    UnknownClass(i64),

    #[error("Classifier model not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Classifier initialization: {0}")]
    ModelInit(String),

    #[error("Classifier failure: {0}")]
    Model(String),
}

// ═══════════════════════════════════════════════════════════
// Feature vector
// ═══════════════════════════════════════════════════════════

/// Severity weights for one request, always exactly `MAX_SYMPTOMS` long.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FeatureVector([f32; MAX_SYMPTOMS]);

impl FeatureVector {
    /// Right-pad with zeros or truncate to `MAX_SYMPTOMS`.
    pub fn from_weights<I>(weights: I) -> Self
    where
        I: IntoIterator<Item = f32>,
    {
        let mut slots = [0.0f32; MAX_SYMPTOMS];
        for (slot, weight) in slots.iter_mut().zip(weights) {
            *slot = weight;
        }
        Self(slots)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn squared_distance(&self, other: &FeatureVector) -> f32 {
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum()
    }
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self([0.0; MAX_SYMPTOMS])
    }
}

/// Opaque pre-trained model: one label per input row.
pub trait DiseaseClassifier: Send + Sync {
    fn predict(&self, batch: &[FeatureVector]) -> Result<Vec<String>, InferenceError>;
}

impl DiseaseClassifier for Box<dyn DiseaseClassifier> {
    fn predict(&self, batch: &[FeatureVector]) -> Result<Vec<String>, InferenceError> {
        (**self).predict(batch)
    }
}

// ═══════════════════════════════════════════════════════════
// Nearest-neighbour classifier
// ═══════════════════════════════════════════════════════════

/// 1-nearest-neighbour over labelled severity vectors.
///
/// Distance is squared Euclidean; ties resolve to the earliest row so the
/// result is deterministic for a given dataset order.
pub struct NearestNeighborClassifier {
    rows: Vec<(String, FeatureVector)>,
}

impl NearestNeighborClassifier {
    pub fn new<I>(rows: I) -> Self
    where
        I: IntoIterator<Item = (String, FeatureVector)>,
    {
        Self {
            rows: rows.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn nearest(&self, query: &FeatureVector) -> Option<&str> {
        let mut best: Option<(&str, f32)> = None;
        for (label, features) in &self.rows {
            let distance = query.squared_distance(features);
            match best {
                Some((_, best_distance)) if distance >= best_distance => {}
                _ => best = Some((label.as_str(), distance)),
            }
        }
        best.map(|(label, _)| label)
    }
}

impl DiseaseClassifier for NearestNeighborClassifier {
    fn predict(&self, batch: &[FeatureVector]) -> Result<Vec<String>, InferenceError> {
        if self.rows.is_empty() {
            return Err(InferenceError::Model(
                "nearest-neighbour index has no rows".into(),
            ));
        }
        batch
            .iter()
            .map(|query| {
                self.nearest(query)
                    .map(str::to_string)
                    .ok_or(InferenceError::EmptyOutput)
            })
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════
// ONNX classifier — behind `onnx-classifier` feature
// ═══════════════════════════════════════════════════════════

#[cfg(feature = "onnx-classifier")]
mod onnx {
    use super::{DiseaseClassifier, FeatureVector, InferenceError, MAX_SYMPTOMS};
    use ort::session::Session;
    use std::path::Path;
    use std::sync::Mutex;

    /// Exported classifier run through ONNX Runtime.
    ///
    /// Input: `[n, MAX_SYMPTOMS]` f32. Output 0: `[n]` i64 class indices,
    /// resolved against the label list loaded from `classes.json`.
    ///
    /// `Session::run` needs `&mut self`, hence the Mutex.
    pub struct OnnxClassifier {
        session: Mutex<Session>,
        classes: Vec<String>,
    }

    impl OnnxClassifier {
        pub fn load(model_path: &Path, classes_path: &Path) -> Result<Self, InferenceError> {
            if !model_path.exists() {
                return Err(InferenceError::ModelNotFound(model_path.to_path_buf()));
            }
            if !classes_path.exists() {
                return Err(InferenceError::ModelNotFound(classes_path.to_path_buf()));
            }

            let classes_json = std::fs::read_to_string(classes_path)
                .map_err(|e| InferenceError::ModelInit(format!("classes read failed: {e}")))?;
            let classes: Vec<String> = serde_json::from_str(&classes_json)
                .map_err(|e| InferenceError::ModelInit(format!("classes parse failed: {e}")))?;

            let session = Session::builder()
                .map_err(|e: ort::Error| InferenceError::ModelInit(e.to_string()))?
                .with_intra_threads(2)
                .map_err(|e: ort::Error| InferenceError::ModelInit(e.to_string()))?
                .commit_from_file(model_path)
                .map_err(|e: ort::Error| {
                    InferenceError::ModelInit(format!("ONNX load failed: {e}"))
                })?;

            tracing::info!(
                model = %model_path.display(),
                classes = classes.len(),
                "ONNX classifier loaded"
            );

            Ok(Self {
                session: Mutex::new(session),
                classes,
            })
        }
    }

    impl DiseaseClassifier for OnnxClassifier {
        fn predict(&self, batch: &[FeatureVector]) -> Result<Vec<String>, InferenceError> {
            use ort::value::TensorRef;

            let flat: Vec<f32> = batch
                .iter()
                .flat_map(|row| row.as_slice().iter().copied())
                .collect();
            let input = ndarray::Array2::from_shape_vec((batch.len(), MAX_SYMPTOMS), flat)
                .map_err(|e| InferenceError::Model(e.to_string()))?;
            let tensor = TensorRef::from_array_view(&input)
                .map_err(|e| InferenceError::Model(e.to_string()))?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| InferenceError::Model("Session lock poisoned".to_string()))?;

            let outputs = session
                .run(ort::inputs![tensor])
                .map_err(|e| InferenceError::Model(format!("ONNX inference failed: {e}")))?;

            let (_shape, indices) = outputs[0]
                .try_extract_tensor::<i64>()
                .map_err(|e| InferenceError::Model(format!("Output extraction: {e}")))?;

            if indices.is_empty() {
                return Err(InferenceError::EmptyOutput);
            }

            indices
                .iter()
                .map(|&idx| {
                    usize::try_from(idx)
                        .ok()
                        .and_then(|i| self.classes.get(i))
                        .cloned()
                        .ok_or(InferenceError::UnknownClass(idx))
                })
                .collect()
        }
    }
}

#[cfg(feature = "onnx-classifier")]
pub use onnx::OnnxClassifier;

#[cfg(test)]
mod tests {
    use super::*;

    fn vector(weights: &[f32]) -> FeatureVector {
        FeatureVector::from_weights(weights.iter().copied())
    }

    #[test]
    fn short_input_is_right_padded() {
        let v = vector(&[1.0, 2.0]);
        assert_eq!(v.as_slice().len(), MAX_SYMPTOMS);
        assert_eq!(&v.as_slice()[..2], &[1.0, 2.0]);
        assert!(v.as_slice()[2..].iter().all(|&w| w == 0.0));
    }

    #[test]
    fn long_input_is_truncated() {
        let weights: Vec<f32> = (1..=20).map(|i| i as f32).collect();
        let v = vector(&weights);
        assert_eq!(v.as_slice().len(), MAX_SYMPTOMS);
        assert_eq!(v.as_slice()[MAX_SYMPTOMS - 1], MAX_SYMPTOMS as f32);
    }

    #[test]
    fn nearest_neighbour_picks_closest_row() {
        let classifier = NearestNeighborClassifier::new(vec![
            ("Cold".to_string(), vector(&[1.0, 2.0])),
            ("Flu".to_string(), vector(&[1.0, 3.0, 5.0])),
        ]);
        let labels = classifier
            .predict(&[vector(&[1.0, 3.0, 4.0]), vector(&[1.0, 2.0])])
            .unwrap();
        assert_eq!(labels, vec!["Flu".to_string(), "Cold".to_string()]);
    }

    #[test]
    fn nearest_neighbour_ties_go_to_first_row() {
        let classifier = NearestNeighborClassifier::new(vec![
            ("First".to_string(), vector(&[2.0])),
            ("Second".to_string(), vector(&[2.0])),
        ]);
        let labels = classifier.predict(&[vector(&[2.0])]).unwrap();
        assert_eq!(labels, vec!["First".to_string()]);
    }

    #[test]
    fn empty_index_is_an_inference_error() {
        let classifier = NearestNeighborClassifier::new(Vec::new());
        assert!(classifier.is_empty());
        let err = classifier.predict(&[FeatureVector::default()]).unwrap_err();
        assert!(matches!(err, InferenceError::Model(_)));
    }

    #[test]
    fn boxed_classifier_delegates() {
        let boxed: Box<dyn DiseaseClassifier> = Box::new(NearestNeighborClassifier::new(vec![(
            "Cold".to_string(),
            vector(&[1.0]),
        )]));
        assert_eq!(boxed.predict(&[vector(&[1.0])]).unwrap(), vec!["Cold"]);
    }
}
