//! API endpoint handlers.

pub mod diseases;
pub mod health;
pub mod predict;
pub mod symptoms;

use axum::http::Uri;

use crate::api::error::ApiError;

/// Fallback for unknown routes.
pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(format!("The requested endpoint {} does not exist", uri.path()))
}

/// Fallback for known routes hit with the wrong method.
pub async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}
