//! API response types.
//!
//! Success payloads are wrapped in a `{data}` envelope; error bodies
//! come from `AppError`'s `IntoResponse` impl and carry `{error}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Standard API success envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a success response.
    pub const fn ok(data: T) -> Self {
        Self { data: Some(data) }
    }

    /// An empty `{}` body, for endpoints that resolve to nothing.
    pub const fn empty() -> Self {
        Self { data: None }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Empty success response.
#[must_use]
pub fn ok() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_wraps_payload_in_data() {
        let value = serde_json::to_value(ApiResponse::ok(vec![1, 2])).unwrap();
        assert_eq!(value, serde_json::json!({ "data": [1, 2] }));
    }

    #[test]
    fn test_empty_serializes_to_empty_object() {
        let value = serde_json::to_value(ApiResponse::<()>::empty()).unwrap();
        assert_eq!(value, serde_json::json!({}));
    }
}
