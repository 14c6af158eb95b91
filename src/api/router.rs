//! API router.
//!
//! Returns a composable `Router` that can be mounted on any axum server.
//!
//! Layers (outermost → innermost): CORS → request tracing → handler.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::endpoints;
use crate::api::types::ApiContext;

/// Build the prediction API router.
///
/// Unknown paths get a JSON 404; known paths hit with the wrong method
/// get a JSON 405.
pub fn api_router(ctx: ApiContext) -> Router {
    Router::new()
        .route(
            "/health",
            get(endpoints::health::check).fallback(endpoints::method_not_allowed),
        )
        .route(
            "/symptoms",
            get(endpoints::symptoms::list).fallback(endpoints::method_not_allowed),
        )
        .route(
            "/diseases",
            get(endpoints::diseases::list).fallback(endpoints::method_not_allowed),
        )
        .route(
            "/predict",
            post(endpoints::predict::predict).fallback(endpoints::method_not_allowed),
        )
        .fallback(endpoints::not_found)
        .with_state(ctx)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::api::types::test_context;
    use crate::config::{DESCRIPTION_NOT_AVAILABLE, MAX_SYMPTOMS};

    fn app() -> Router {
        api_router(test_context())
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    fn predict_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/predict")
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_check_returns_healthy() {
        let response = app().oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["status"], "healthy");
    }

    #[tokio::test]
    async fn symptoms_lists_severity_table() {
        let response = app().oneshot(get_request("/symptoms")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["count"], 3);
        assert_eq!(json["symptoms"][0], "fever");
    }

    #[tokio::test]
    async fn diseases_lists_dataset_labels() {
        let response = app().oneshot(get_request("/diseases")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["count"], 2);
        assert_eq!(json["diseases"], serde_json::json!(["Cold", "Flu"]));
    }

    #[tokio::test]
    async fn predict_returns_enriched_result() {
        let response = app()
            .oneshot(predict_request(r#"{"symptoms":["fever","cough"]}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["disease"], "Cold");
        assert_eq!(json["description"], "Cold description");
        assert_eq!(json["precautions"], serde_json::json!(["Rest", "Hydrate"]));
    }

    #[tokio::test]
    async fn predict_unknown_disease_uses_defaults() {
        let response = app()
            .oneshot(predict_request(r#"{"symptoms":["fever","headache"]}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = json_body(response).await;
        assert_eq!(json["disease"], "Flu");
        assert_eq!(json["description"], DESCRIPTION_NOT_AVAILABLE);
        assert_eq!(json["precautions"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn predict_empty_list_is_400() {
        let response = app()
            .oneshot(predict_request(r#"{"symptoms":[]}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"]["code"], "INVALID_INPUT");
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("at least 1"));
    }

    #[tokio::test]
    async fn predict_too_many_symptoms_is_400() {
        let symptoms = vec!["fever"; MAX_SYMPTOMS + 3];
        let body = serde_json::json!({ "symptoms": symptoms }).to_string();
        let response = app().oneshot(predict_request(&body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert!(json["error"]["message"]
            .as_str()
            .unwrap()
            .contains("maximum 17"));
    }

    #[tokio::test]
    async fn predict_invalid_json_is_400() {
        let response = app()
            .oneshot(predict_request("invalid json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn predict_missing_symptoms_is_400() {
        let response = app()
            .oneshot(predict_request(r#"{"other_field":"value"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"]["code"], "INVALID_INPUT");
    }

    #[tokio::test]
    async fn predict_without_json_content_type_is_invalid_input() {
        let req = Request::builder()
            .method("POST")
            .uri("/predict")
            .header("Content-Type", "text/plain")
            .body(Body::from(r#"{"symptoms":["fever"]}"#))
            .unwrap();
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = json_body(response).await;
        assert_eq!(json["error"]["code"], "INVALID_INPUT");
        assert_eq!(
            json["error"]["message"],
            "Content-Type must be application/json"
        );
    }

    #[tokio::test]
    async fn unknown_route_is_json_404() {
        let response = app().oneshot(get_request("/nonexistent")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = json_body(response).await;
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn wrong_method_is_json_405() {
        let response = app().oneshot(get_request("/predict")).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let json = json_body(response).await;
        assert_eq!(json["error"]["code"], "METHOD_NOT_ALLOWED");
    }
}
