use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

/// Request-level failure taxonomy shared by both services.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("Another request is currently in progress. Please wait and try again.")]
    Busy,

    #[error("{0}")]
    ModelUnavailable(String),

    #[error("{0}")]
    Inference(String),
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Busy => StatusCode::TOO_MANY_REQUESTS,
            ServiceError::ModelUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ServiceError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Validation and unavailability keep the bare `{"error": ...}` shape;
        // busy and inference failures carry the `success` flag.
        match self {
            ServiceError::Validation(msg) | ServiceError::ModelUnavailable(msg) => {
                HttpResponse::build(self.status_code()).json(json!({ "error": msg }))
            }
            ServiceError::Busy | ServiceError::Inference(_) => {
                HttpResponse::build(self.status_code())
                    .json(json!({ "success": false, "error": self.to_string() }))
            }
        }
    }
}

impl From<pyo3::PyErr> for ServiceError {
    fn from(err: pyo3::PyErr) -> Self {
        ServiceError::Inference(err.to_string())
    }
}
