//! HTTP-facing error mapping (spec §7 "user-visible failure").

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use podcast_common::CoreError;
use serde_json::json;

pub enum SearchApiError {
    IndexUnavailable,
    BadRequest(String),
    InternalError,
}

impl From<CoreError> for SearchApiError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::NotFound(_) => SearchApiError::IndexUnavailable,
            CoreError::InputInvariantViolation(msg) => SearchApiError::BadRequest(msg),
            _ => SearchApiError::InternalError,
        }
    }
}

impl IntoResponse for SearchApiError {
    fn into_response(self) -> Response {
        let (status, reason) = match &self {
            SearchApiError::IndexUnavailable => (StatusCode::SERVICE_UNAVAILABLE, "IndexUnavailable"),
            SearchApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BadRequest"),
            SearchApiError::InternalError => (StatusCode::INTERNAL_SERVER_ERROR, "InternalError"),
        };
        (status, Json(json!({ "error": reason }))).into_response()
    }
}
