//! Response types for the payroll engine API.
//!
//! This module defines the error body returned by every endpoint and the
//! mapping from [`EngineError`] to HTTP status codes.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, ErrorClass};

/// API error response structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
    /// Optional details about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    /// Creates a new API error with details.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Some(details.into()),
        }
    }

    /// Creates a malformed JSON error response.
    pub fn malformed_json(message: impl Into<String>) -> Self {
        Self::new("MALFORMED_JSON", message)
    }

    /// Creates a validation error response.
    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }
}

/// API error with HTTP status code.
pub struct ApiErrorResponse {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The error body.
    pub error: ApiError,
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<EngineError> for ApiErrorResponse {
    fn from(error: EngineError) -> Self {
        let status = match error.class() {
            ErrorClass::PerWorker => match &error {
                EngineError::MalformedInput { .. } => StatusCode::BAD_REQUEST,
                _ => StatusCode::UNPROCESSABLE_ENTITY,
            },
            ErrorClass::BatchFatal | ErrorClass::Configuration => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        let details = match &error {
            EngineError::ConfigNotFound { path } => format!("path: {}", path),
            EngineError::ConfigParseError { path, .. } => format!("path: {}", path),
            EngineError::MalformedInput { field, .. } => format!("field: {}", field),
            EngineError::MissingRateData { key, .. } => format!("key: {}", key),
            EngineError::RateAmbiguity { key, date, matches } => {
                format!("key: {}, date: {}, matching rates: {}", key, date, matches)
            }
            EngineError::TaxTableCorrupt { table, .. } => format!("table: {}", table),
        };
        ApiErrorResponse {
            status,
            error: ApiError::with_details(error.code(), error.to_string(), details),
        }
    }
}
