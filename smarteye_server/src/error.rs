use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ffmpeg_common::VideoError;
use serde_json::json;
use tracing::error;

/// Request failures. Everything serialises as `{"error": "..."}`.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The expected file part is absent or empty.
    #[error("{0}")]
    MissingField(String),
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Multipart(#[from] MultipartError),
    /// The upload isn't a decodable image or video.
    #[error("{0}")]
    Decode(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::MissingField(_) | AppError::BadRequest(_) | AppError::Decode(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Multipart(e) => e.status(),
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<VideoError> for AppError {
    fn from(err: VideoError) -> Self {
        if err.is_bad_input() {
            AppError::Decode(format!("Failed to decode video: {err}"))
        } else {
            AppError::Internal(err.into())
        }
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(anyhow::anyhow!("detection task failed: {err}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Multipart(e) => e.body_text(),
            AppError::Internal(e) => {
                error!("Request failed: {e:#}");
                format!("{e:#}")
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_are_bad_request() {
        assert_eq!(
            AppError::MissingField("No image file provided".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(AppError::Decode("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::from(VideoError::NoVideoStream).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn inference_failures_are_internal() {
        let err = AppError::from(VideoError::Frame(anyhow::anyhow!("forward pass failed")));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            AppError::from(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
