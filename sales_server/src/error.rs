//! HTTP error responses

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use sales_forecast::ForecastError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors returned by the handlers, rendered as `{"error": message}`
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{0}")]
    BadRequest(String),

    #[error("Model not trained")]
    NotTrained,

    #[error("{0}")]
    PayloadTooLarge(String),

    #[error("{0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, ServerError>;

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) | ServerError::NotTrained => StatusCode::BAD_REQUEST,
            ServerError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<ForecastError> for ServerError {
    fn from(err: ForecastError) -> Self {
        match err {
            ForecastError::NotTrained => ServerError::NotTrained,
            ForecastError::ValidationError(_)
            | ForecastError::ParseError(_)
            | ForecastError::ColumnNotFound(_)
            | ForecastError::InvalidParameter(_)
            | ForecastError::DataError(_)
            | ForecastError::Math(_) => ServerError::BadRequest(err.to_string()),
            ForecastError::ModelError(_)
            | ForecastError::IoError(_)
            | ForecastError::SerializationError(_) => ServerError::Internal(err.to_string()),
        }
    }
}

impl From<MultipartError> for ServerError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServerError::PayloadTooLarge(err.body_text())
        } else {
            ServerError::BadRequest(err.body_text())
        }
    }
}

impl From<tokio::task::JoinError> for ServerError {
    fn from(err: tokio::task::JoinError) -> Self {
        ServerError::Internal(format!("Background task failed: {}", err))
    }
}
