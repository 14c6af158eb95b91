//! HTTP boundary for the prediction service.
//!
//! `api_router()` returns a `Router` that can be mounted on any axum
//! server; `server` owns the listener lifecycle.

pub mod endpoints;
pub mod error;
pub mod router;
pub mod server;
pub mod types;

pub use error::ApiError;
pub use router::api_router;
pub use server::{start_server, ApiServer, ApiSession, ServerError};
pub use types::ApiContext;
