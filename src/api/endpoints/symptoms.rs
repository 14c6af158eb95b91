use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct SymptomsResponse {
    pub symptoms: Vec<String>,
    pub count: usize,
}

/// `GET /symptoms` — every symptom name the severity table knows.
pub async fn list(State(ctx): State<ApiContext>) -> Json<SymptomsResponse> {
    let symptoms = ctx.reference.symptoms_list().to_vec();
    Json(SymptomsResponse {
        count: symptoms.len(),
        symptoms,
    })
}
