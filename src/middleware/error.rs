//! Error response formatting
//!
//! Provides standardized error responses with consistent JSON structure,
//! HTTP status codes, error codes, and user-friendly messages, plus the
//! matching success envelope.

use crate::error::{AppError, ErrorCode};
use axum::{
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Standardized error response structure
///
/// This is returned to clients for all error cases, ensuring
/// consistent error handling across the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Always `false`
    pub success: bool,

    /// Machine-readable error code
    pub error: ErrorCode,

    /// Human-readable error message
    pub message: String,

    /// Request ID for debugging and support
    pub request_id: Option<String>,

    /// ISO 8601 timestamp of the error
    pub timestamp: String,

    /// Optional additional details (e.g., validation errors)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// Whether the client should retry the request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retryable: Option<bool>,
}

impl ErrorResponse {
    /// Create a new error response from an AppError
    pub fn from_app_error(error: &AppError) -> Self {
        Self {
            success: false,
            error: error.error_code(),
            message: error.user_message(),
            request_id: error.request_id.clone(),
            timestamp: Utc::now().to_rfc3339(),
            details: None,
            retryable: Some(error.is_retryable()),
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

/// Implement IntoResponse for AppError to automatically convert errors
/// into HTTP responses with proper status codes and JSON formatting
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status_code.is_server_error() {
            tracing::error!(
                error = %self,
                cause = ?self.cause,
                request_id = ?self.request_id,
                status = %status_code.as_u16(),
                "Server error occurred"
            );
        } else {
            tracing::warn!(
                error = %self,
                request_id = ?self.request_id,
                status = %status_code.as_u16(),
                "Client error occurred"
            );
        }

        let mut error_response = ErrorResponse::from_app_error(&self);
        if let crate::error::AppErrorKind::Validation(err) = &self.kind {
            error_response = error_response.with_details(validation_details(err));
        }
        (status_code, Json(error_response)).into_response()
    }
}

fn validation_details(err: &crate::error::ValidationError) -> serde_json::Value {
    use crate::error::ValidationError;

    match err {
        ValidationError::MissingField { field } => serde_json::json!({ "field": field }),
        ValidationError::InvalidAmount { .. } => serde_json::json!({ "field": "amount" }),
        ValidationError::InvalidCurrency { .. } => serde_json::json!({ "field": "currency" }),
        ValidationError::InvalidMethod { .. } => serde_json::json!({ "field": "method" }),
        ValidationError::InvalidIdentifier { field, value } => {
            serde_json::json!({ "field": field, "value": value })
        }
        ValidationError::InvalidBody { .. } => serde_json::json!({ "field": "body" }),
    }
}

/// Success envelope shared by every JSON endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn data(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// `200 OK` with the success envelope
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(ApiResponse::data(data))).into_response()
}

/// `200 OK` with the success envelope and a message
pub fn success_response_with_message<T: Serialize>(data: T, message: &str) -> Response {
    (
        StatusCode::OK,
        Json(ApiResponse::data(data).with_message(message)),
    )
        .into_response()
}

/// `201 Created` with the success envelope
pub fn created_response<T: Serialize>(data: T, message: &str) -> Response {
    (
        StatusCode::CREATED,
        Json(ApiResponse::data(data).with_message(message)),
    )
        .into_response()
}

/// Helper to extract request ID from request headers
pub fn get_request_id_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

/// Attach the request id from `headers` to an error, if one was assigned
pub fn with_request_id(err: AppError, headers: &HeaderMap) -> AppError {
    match get_request_id_from_headers(headers) {
        Some(request_id) => err.with_request_id(request_id),
        None => err,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, DomainError, ValidationError};
    use uuid::Uuid;

    #[test]
    fn test_error_response_from_app_error() {
        let app_error = AppError::domain(DomainError::PaymentNotFound {
            payment_id: Uuid::nil().to_string(),
        })
        .with_request_id("req_123");

        let error_response = ErrorResponse::from_app_error(&app_error);

        assert!(!error_response.success);
        assert_eq!(error_response.error, ErrorCode::PaymentNotFound);
        assert_eq!(error_response.request_id, Some("req_123".to_string()));
        assert!(error_response.message.contains("payment not found"));
        assert_eq!(error_response.retryable, Some(false));
    }

    #[test]
    fn test_app_error_into_response_status() {
        let app_error = AppError::validation(ValidationError::MissingField {
            field: "currency".to_string(),
        });

        let response = app_error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_success_envelope_omits_empty_fields() {
        let value = serde_json::to_value(ApiResponse::data(vec![1, 2])).unwrap();
        assert_eq!(value, serde_json::json!({ "success": true, "data": [1, 2] }));

        let value =
            serde_json::to_value(ApiResponse::data("x").with_message("done")).unwrap();
        assert_eq!(value["message"], "done");
    }

    #[test]
    fn test_request_id_is_attached_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", "req_abc".parse().unwrap());

        let err = with_request_id(
            AppError::validation(ValidationError::InvalidBody {
                message: "eof".to_string(),
            }),
            &headers,
        );
        assert_eq!(err.request_id.as_deref(), Some("req_abc"));
    }
}
