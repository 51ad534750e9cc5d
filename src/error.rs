use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No voice matches language '{0}'")]
    NoMatchingVoice(String),

    #[error("Asset not found: {0}")]
    AssetNotFound(String),

    #[error("Vendor returned {status}: {message}")]
    Upstream {
        status: u16,
        vendor_code: Option<i64>,
        message: String,
    },

    #[error("Too large: {0}")]
    TooLarge(String),

    #[error("Vendor unreachable: {0}")]
    Transport(String),

    #[error("Audio processing failed: {0}")]
    Audio(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl AppError {
    pub fn upstream(status: u16, message: impl Into<String>) -> Self {
        AppError::Upstream {
            status,
            vendor_code: None,
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_code: Option<i64>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut upstream_status = None;
        let mut vendor_code = None;

        let (status, code, message) = match &self {
            AppError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, "INVALID_INPUT", msg.clone()),
            AppError::NoMatchingVoice(_) => (
                StatusCode::NOT_FOUND,
                "NO_MATCHING_VOICE",
                self.to_string(),
            ),
            AppError::AssetNotFound(msg) => {
                (StatusCode::NOT_FOUND, "ASSET_NOT_FOUND", msg.clone())
            }
            AppError::Upstream {
                status,
                vendor_code: code,
                message,
            } => {
                upstream_status = Some(*status);
                vendor_code = *code;
                (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", message.clone())
            }
            AppError::TooLarge(msg) => (
                StatusCode::PAYLOAD_TOO_LARGE,
                "PAYLOAD_TOO_LARGE",
                msg.clone(),
            ),
            AppError::Transport(msg) => (StatusCode::BAD_GATEWAY, "TRANSPORT_ERROR", msg.clone()),
            AppError::Audio(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "AUDIO_ERROR",
                msg.clone(),
            ),
            AppError::IoError(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "IO_ERROR",
                e.to_string(),
            ),
            AppError::JsonError(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "JSON_ERROR",
                e.to_string(),
            ),
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {} - {}", code, message);
        } else {
            tracing::warn!("Request rejected: {} - {}", code, message);
        }

        (
            status,
            Json(ErrorResponse {
                error: message,
                code: code.to_string(),
                upstream_status,
                vendor_code,
            }),
        )
            .into_response()
    }
}
