//! Shared types for the HTTP layer.

use std::sync::Arc;

use crate::classifier::DiseaseClassifier;
use crate::prediction::PredictionPipeline;
use crate::reference::ReferenceData;

/// Shared context for all API routes.
///
/// Built once at startup. Everything inside is read-only, so handlers
/// clone the `Arc`s and never lock.
#[derive(Clone)]
pub struct ApiContext {
    pub reference: Arc<ReferenceData>,
    pub pipeline: Arc<PredictionPipeline>,
}

impl ApiContext {
    pub fn new(reference: Arc<ReferenceData>, classifier: Arc<dyn DiseaseClassifier>) -> Self {
        let pipeline = Arc::new(PredictionPipeline::new(reference.clone(), classifier));
        Self {
            reference,
            pipeline,
        }
    }
}

/// Small in-memory context shared by the API test modules.
///
/// Severity {fever:1, cough:2, headache:3}; "Cold" has a description and
/// precautions, "Flu" has neither.
#[cfg(test)]
pub(crate) fn test_context() -> ApiContext {
    use crate::classifier::NearestNeighborClassifier;

    let reference = Arc::new(ReferenceData::from_tables(
        vec![
            ("fever".to_string(), 1.0),
            ("cough".to_string(), 2.0),
            ("headache".to_string(), 3.0),
        ],
        vec![("Cold".to_string(), "Cold description".to_string())],
        vec![(
            "Cold".to_string(),
            vec!["Rest".to_string(), "Hydrate".to_string()],
        )],
        vec![
            (
                "Cold".to_string(),
                vec!["fever".to_string(), "cough".to_string()],
            ),
            (
                "Flu".to_string(),
                vec!["fever".to_string(), "headache".to_string()],
            ),
        ],
    ));
    let classifier = NearestNeighborClassifier::new(
        reference
            .records()
            .iter()
            .map(|r| (r.disease.clone(), r.features)),
    );
    ApiContext::new(reference, Arc::new(classifier))
}
