use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Request validation failures. Raised before any scoring runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Body is not a JSON object.
    InvalidBody(String),
    /// Required fields absent or null, in canonical field order.
    MissingFields(Vec<String>),
    /// Field present but not numeric-coercible.
    InvalidValue { field: String, reason: String },
}

impl ValidationError {
    /// Machine-readable category used in the error body.
    pub fn category(&self) -> &'static str {
        match self {
            ValidationError::InvalidBody(_) => "invalid_body",
            ValidationError::MissingFields(_) => "missing_fields",
            ValidationError::InvalidValue { .. } => "invalid_value",
        }
    }

    /// Field names the caller has to fix.
    pub fn fields(&self) -> Vec<String> {
        match self {
            ValidationError::InvalidBody(_) => Vec::new(),
            ValidationError::MissingFields(fields) => fields.clone(),
            ValidationError::InvalidValue { field, .. } => vec![field.clone()],
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidBody(msg) => write!(f, "Invalid request body: {}", msg),
            ValidationError::MissingFields(fields) => {
                write!(f, "Missing required fields: {}", fields.join(", "))
            }
            ValidationError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Body returned for any rejected request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
    #[serde(default)]
    pub details: Vec<String>,
}

impl From<&ValidationError> for ErrorBody {
    fn from(err: &ValidationError) -> Self {
        Self {
            error: err.category().to_string(),
            message: err.to_string(),
            details: err.fields(),
        }
    }
}

/// Failures inside the learned path. Never surfaced to clients: the
/// orchestrator falls back to the rule engine, or drops attributions for
/// explainer errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelError {
    /// Artifact missing, unreadable, malformed or failing its checksum.
    Artifact(String),
    /// Input columns do not match what the model expects.
    LayoutMismatch(String),
    /// Model evaluation failed.
    Inference(String),
    /// Classifier returned an index outside low/moderate/high.
    UnknownClass(usize),
    /// Attribution computation failed.
    Explainer(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Artifact(msg) => write!(f, "Model artifact error: {}", msg),
            ModelError::LayoutMismatch(msg) => write!(f, "Feature layout mismatch: {}", msg),
            ModelError::Inference(msg) => write!(f, "Inference error: {}", msg),
            ModelError::UnknownClass(idx) => write!(f, "Unknown risk class index: {}", idx),
            ModelError::Explainer(msg) => write!(f, "Explainer error: {}", msg),
        }
    }
}

impl std::error::Error for ModelError {}

/// Application-specific error types.
#[derive(Debug)]
pub enum AppError {
    /// Request failed validation.
    Validation(ValidationError),
    /// Bad request error (unreadable body, wrong content type).
    BadRequest(String),
    /// Internal server error.
    InternalError(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Validation(e) => write!(f, "Validation error: {}", e),
            AppError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            AppError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err)
    }
}

impl IntoResponse for AppError {
    /// Maps each error variant to an HTTP status code and JSON body.
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::Validation(e) => {
                tracing::debug!("Rejected prediction request: {}", e);
                (StatusCode::BAD_REQUEST, ErrorBody::from(e))
            }
            AppError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: "invalid_body".to_string(),
                    message: msg.clone(),
                    details: Vec::new(),
                },
            ),
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: "internal_error".to_string(),
                        message: "Internal server error".to_string(),
                        details: Vec::new(),
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
