//! HTTP error handling
//!
//! Maps engine errors onto status codes with a stable JSON body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use orgtree_core::TreeServiceError;
use serde::{Deserialize, Serialize};

/// JSON error body returned by every failing endpoint
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpError {
    /// User-facing error message
    pub message: String,
    /// Machine-readable error code
    pub code: String,
    /// Optional detailed error information for debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl HttpError {
    /// Create a new HTTP error
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: None,
        }
    }

    /// Create a new HTTP error with details
    pub fn with_details(
        message: impl Into<String>,
        code: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
            details: Some(details.into()),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self.code.as_str() {
            "NODE_NOT_FOUND" | "PARENT_NOT_FOUND" => StatusCode::NOT_FOUND,
            "CYCLE_DETECTED" | "VALIDATION_ERROR" | "INVALID_INPUT" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<TreeServiceError> for HttpError {
    fn from(err: TreeServiceError) -> Self {
        let code = err.code();
        match err {
            TreeServiceError::Database(ref inner) => {
                HttpError::with_details(err.to_string(), code, format!("{:?}", inner))
            }
            TreeServiceError::Storage(ref inner) => {
                HttpError::with_details(err.to_string(), code, format!("{:?}", inner))
            }
            _ => HttpError::new(err.to_string(), code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            HttpError::from(TreeServiceError::node_not_found(1)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            HttpError::from(TreeServiceError::parent_not_found(1)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            HttpError::from(TreeServiceError::cycle_detected("loop")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            HttpError::from(TreeServiceError::corrupt_graph(1, 3)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_details_skipped_when_absent() {
        let body = serde_json::to_value(HttpError::new("gone", "NODE_NOT_FOUND")).unwrap();
        assert_eq!(body["code"], "NODE_NOT_FOUND");
        assert!(body.get("details").is_none());
    }
}
