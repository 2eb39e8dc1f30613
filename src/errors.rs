//! Structured error types with machine-readable codes
//! Provides detailed error information for debugging and client error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structured error response for API clients. The human-readable text is
/// carried in `error`, the field the calculator's clients have always read.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Machine-readable error code
    pub code: String,

    /// Human-readable error message
    pub error: String,

    /// Additional error context
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Application error types with proper categorization
#[derive(Debug)]
pub enum AppError {
    // Validation Errors (400)
    InvalidInput { field: String, reason: String },

    // Internal Errors (500)
    ComputationFault(String),

    // Generic wrapper for external errors
    Internal(anyhow::Error),
}

impl AppError {
    /// Get error code for client identification
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "INVALID_INPUT",
            Self::ComputationFault(_) => "COMPUTATION_FAULT",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Self::ComputationFault(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get detailed error message
    pub fn message(&self) -> String {
        match self {
            Self::InvalidInput { field, reason } => {
                format!("Invalid input for field '{field}': {reason}")
            }
            Self::ComputationFault(msg) => format!("Computation fault: {msg}"),
            Self::Internal(err) => format!("Internal error: {err}"),
        }
    }

    /// Convert to structured error response
    pub fn to_response(&self) -> ErrorResponse {
        ErrorResponse {
            code: self.code().to_string(),
            error: self.message(),
            details: None,
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for AppError {}

/// Convert from anyhow::Error to AppError
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err)
    }
}

/// Axum IntoResponse implementation for proper HTTP responses
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = self.to_response();

        (status, Json(body)).into_response()
    }
}

/// Helper trait to convert validation errors
pub trait ValidationErrorExt<T> {
    fn map_validation_err(self, field: &str) -> Result<T>;
}

impl<T> ValidationErrorExt<T> for anyhow::Result<T> {
    fn map_validation_err(self, field: &str) -> Result<T> {
        self.map_err(|e| AppError::InvalidInput {
            field: field.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Type alias for Results using AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AppError::InvalidInput {
            field: "control_size".to_string(),
            reason: "must be at least 1".to_string(),
        };
        assert_eq!(err.code(), "INVALID_INPUT");
        assert_eq!(AppError::ComputationFault("overflow".to_string()).code(), "COMPUTATION_FAULT");
    }

    #[test]
    fn test_status_codes() {
        let err = AppError::InvalidInput {
            field: "control_conversions".to_string(),
            reason: "exceeds sample size".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::ComputationFault("bad".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_response_names_the_field() {
        let err = AppError::InvalidInput {
            field: "variation_size".to_string(),
            reason: "must be at least 1".to_string(),
        };
        let response = err.to_response();

        assert_eq!(response.code, "INVALID_INPUT");
        assert!(response.error.contains("variation_size"));
    }

    #[test]
    fn test_validation_ext_maps_field() {
        let result: anyhow::Result<()> = Err(anyhow::anyhow!("out of range"));
        let mapped = result.map_validation_err("control_size");
        match mapped {
            Err(AppError::InvalidInput { field, reason }) => {
                assert_eq!(field, "control_size");
                assert_eq!(reason, "out of range");
            }
            _ => panic!("expected InvalidInput"),
        }
    }
}
