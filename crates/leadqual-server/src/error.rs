//! Mapping of pipeline errors to HTTP responses

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use leadqual_core::LeadQualError;
use serde_json::json;

/// Error returned by a handler, rendered as `{"error": "..."}`
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }
}

impl From<LeadQualError> for ApiError {
    fn from(err: LeadQualError) -> Self {
        let status = match &err {
            LeadQualError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            LeadQualError::MalformedExtraction(_) => StatusCode::UNPROCESSABLE_ENTITY,
            LeadQualError::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
            e if e.is_upstream() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("Request failed: {}", err);
        } else {
            tracing::debug!("Request rejected: {}", err);
        }
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (LeadQualError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (
                LeadQualError::MalformedExtraction("x".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (LeadQualError::Completion("x".into()), StatusCode::BAD_GATEWAY),
            (
                LeadQualError::RetrievalUnavailable("x".into()),
                StatusCode::BAD_GATEWAY,
            ),
            (LeadQualError::DeadlineExceeded(10), StatusCode::GATEWAY_TIMEOUT),
            (
                LeadQualError::Router("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status, status);
        }
    }
}
