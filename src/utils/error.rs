use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectError {
    #[error("Image processing failed: {0}")]
    Decode(String),

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Model not loaded")]
    ServiceUnavailable,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl DetectError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DetectError::Decode(_) => StatusCode::BAD_REQUEST,
            DetectError::Inference(_) => StatusCode::BAD_REQUEST,
            DetectError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            DetectError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            DetectError::ModelLoad(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            DetectError::Decode(_) => "DECODE_ERROR",
            DetectError::Inference(_) => "INFERENCE_ERROR",
            DetectError::ModelLoad(_) => "MODEL_LOAD_ERROR",
            DetectError::ServiceUnavailable => "SERVICE_UNAVAILABLE",
            DetectError::InvalidInput(_) => "INVALID_INPUT",
            DetectError::Config(_) => "CONFIG_ERROR",
            DetectError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<image::ImageError> for DetectError {
    fn from(err: image::ImageError) -> Self {
        DetectError::Decode(err.to_string())
    }
}

impl IntoResponse for DetectError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "detail": self.to_string(),
            "code": self.error_code(),
        });

        if status.is_server_error() {
            tracing::error!("Request failed: {} ({})", self, status);
        } else {
            tracing::warn!("Request rejected: {} ({})", self, status);
        }

        (status, axum::Json(body)).into_response()
    }
}
