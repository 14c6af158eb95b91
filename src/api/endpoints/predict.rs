//! `POST /predict` — symptom list in, predicted disease out.
//!
//! The body is parsed as raw JSON so that each structural problem
//! (wrong content type, bad JSON, missing field, non-list) gets its own
//! message instead of a generic extractor rejection.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::Json;
use serde_json::Value;

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::prediction::{PredictionResult, ValidationError};

/// Extract `symptoms` from a request body.
///
/// Count bounds are left to the pipeline; this only checks shape.
pub fn parse_symptoms(body: &[u8]) -> Result<Vec<String>, ValidationError> {
    let value: Value =
        serde_json::from_slice(body).map_err(|e| ValidationError::Malformed(e.to_string()))?;

    let symptoms = value
        .get("symptoms")
        .ok_or(ValidationError::MissingField)?
        .as_array()
        .ok_or(ValidationError::NotAList)?;

    symptoms
        .iter()
        .map(|s| s.as_str().map(str::to_string).ok_or(ValidationError::NotAList))
        .collect()
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim_start().to_ascii_lowercase().starts_with("application/json"))
        .unwrap_or(false)
}

pub async fn predict(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<PredictionResult>, ApiError> {
    if !is_json(&headers) {
        return Err(ApiError::InvalidInput(
            "Content-Type must be application/json".into(),
        ));
    }

    let symptoms = parse_symptoms(&body)?;
    let result = ctx.pipeline.predict(&symptoms)?;

    Ok(Json(result))
}
