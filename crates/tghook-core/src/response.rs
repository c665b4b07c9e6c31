//! JSON envelope for webhook outcomes.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

use crate::WebhookError;

const FALLBACK_ERROR_BODY: &str = r#"{"error":"internal error"}"#;

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

/// Serializes `payload` with `status`. A serialization failure degrades to a
/// fixed 500 body instead of failing the request.
pub fn json_response<T: Serialize + ?Sized>(status: StatusCode, payload: &T) -> Response {
    match serde_json::to_vec(payload) {
        Ok(body) => (status, [(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(e) => {
            error!("Failed to serialize response body: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [(header::CONTENT_TYPE, "application/json")],
                FALLBACK_ERROR_BODY,
            )
                .into_response()
        }
    }
}

pub fn success_response<T: Serialize + ?Sized>(payload: &T) -> Response {
    json_response(StatusCode::OK, payload)
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        json_response(self.status(), &ErrorBody { error: &message })
    }
}
