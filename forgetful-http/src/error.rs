//! Translation of [`forgetful_core::error::Error`] into HTTP responses.
//!
//! This is the outermost boundary the crate's doc comment on
//! [`forgetful_core::error::Error`] refers to: nothing upstream of here
//! inspects HTTP status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use forgetful_core::error::Error as CoreError;
use serde_json::json;

/// Wraps a [`CoreError`] (or a locally raised validation failure) for
/// conversion to an HTTP response.
pub struct ApiError(pub CoreError);

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
