use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// One rejected field of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: String,
}

/// Every violation found in a request, in field declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid request: {}", summarize(.violations))]
pub struct ValidationError {
    pub violations: Vec<FieldViolation>,
}

impl ValidationError {
    pub fn fields(&self) -> Vec<&'static str> {
        self.violations.iter().map(|v| v.field).collect()
    }

    pub fn mentions(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

fn summarize(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failures while scaling or running the regressor on a feature vector.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictionError {
    #[error("feature length mismatch: got {got}, expected {expected}")]
    ShapeMismatch { got: usize, expected: usize },
    #[error("unknown feature column '{0}'")]
    UnknownFeature(String),
    #[error("tree node {node} references missing child {child}")]
    DanglingNode { node: usize, child: usize },
    #[error("feature index {index} out of range for input of length {len}")]
    FeatureIndex { index: usize, len: usize },
    #[error("model produced a non-finite prediction ({0})")]
    NonFinite(f64),
}

/// Errors surfaced by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("malformed request body: {0}")]
    MalformedBody(String),
    #[error("Model not loaded")]
    ModelUnavailable,
    #[error("Prediction error: {0}")]
    Prediction(#[from] PredictionError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::MalformedBody(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Prediction(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation(e) => json!({ "detail": e.violations }),
            ApiError::MalformedBody(msg) => json!({
                "detail": [{ "field": "body", "message": msg }]
            }),
            ApiError::ModelUnavailable | ApiError::Prediction(_) => {
                json!({ "detail": self.to_string() })
            }
        };
        if status.is_server_error() {
            tracing::error!(%status, "request failed: {}", self);
        } else {
            tracing::debug!(%status, "request rejected: {}", self);
        }
        (status, Json(body)).into_response()
    }
}
