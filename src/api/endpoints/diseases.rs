use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::api::types::ApiContext;

#[derive(Serialize)]
pub struct DiseasesResponse {
    pub diseases: Vec<String>,
    pub count: usize,
}

/// `GET /diseases` — labels the classifier can emit, in dataset order.
pub async fn list(State(ctx): State<ApiContext>) -> Json<DiseasesResponse> {
    let diseases = ctx.reference.disease_labels().to_vec();
    Json(DiseasesResponse {
        count: diseases.len(),
        diseases,
    })
}
