//! Mapping from core errors to HTTP responses.
//!
//! API routes answer with a JSON body `{ error, code }`; form routes wrap the
//! same error in [`PageError`] and render an HTML page with the same status.

use autocaption_core::{AutocaptionError, CaptionError, ScheduleError};
use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use super::pages;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Core(#[from] AutocaptionError),

    /// The multipart body could not be read (malformed or over the body limit)
    #[error("Malformed upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error("Caption job not found: {0}")]
    JobNotFound(Uuid),
}

impl From<CaptionError> for ApiError {
    fn from(err: CaptionError) -> Self {
        ApiError::Core(err.into())
    }
}

impl From<ScheduleError> for ApiError {
    fn from(err: ScheduleError) -> Self {
        ApiError::Core(err.into())
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    /// Machine-readable error code
    pub code: String,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(AutocaptionError::Caption(e)) => caption_status(e),
            ApiError::Core(AutocaptionError::Schedule(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Core(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Multipart(e) => e.status(),
            ApiError::JobNotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Core(e) => e.code(),
            ApiError::Multipart(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                "file_too_large"
            }
            ApiError::Multipart(_) => "malformed_upload",
            ApiError::JobNotFound(_) => "not_found",
        }
    }

    /// Message shown to the client. Server-side failures are not echoed back.
    pub fn message(&self) -> String {
        match self {
            ApiError::Core(AutocaptionError::Caption(CaptionError::Inference { .. })) => {
                "The caption service failed to describe this image. Please try again.".to_string()
            }
            ApiError::Core(AutocaptionError::Caption(CaptionError::Timeout { .. })) => {
                "The caption service took too long to respond. Please try again.".to_string()
            }
            ApiError::Core(AutocaptionError::Caption(CaptionError::FileNotFound(_))) => {
                "File not found".to_string()
            }
            ApiError::Core(AutocaptionError::Caption(CaptionError::Storage { .. })) => {
                "Could not store the upload".to_string()
            }
            ApiError::Core(AutocaptionError::Caption(e)) => e.to_string(),
            ApiError::Core(AutocaptionError::Schedule(e)) => e.to_string(),
            ApiError::Core(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    fn log(&self) {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), code = self.code(), error = %self, "Request failed");
        } else {
            tracing::warn!(status = status.as_u16(), code = self.code(), error = %self, "Request rejected");
        }
    }
}

fn caption_status(err: &CaptionError) -> StatusCode {
    match err {
        CaptionError::NoFile | CaptionError::InvalidFilename(_) | CaptionError::InvalidLength { .. } => {
            StatusCode::BAD_REQUEST
        }
        CaptionError::FileTooLarge { .. } | CaptionError::ImageTooLarge { .. } => {
            StatusCode::PAYLOAD_TOO_LARGE
        }
        CaptionError::UnsupportedFormat { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        CaptionError::FileNotFound(_) => StatusCode::NOT_FOUND,
        CaptionError::Inference { .. } => StatusCode::BAD_GATEWAY,
        CaptionError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        CaptionError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();
        let body = ErrorBody {
            error: self.message(),
            code: self.code().to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

/// An [`ApiError`] rendered as an HTML page, for the browser form.
#[derive(Debug)]
pub struct PageError(pub ApiError);

impl From<ApiError> for PageError {
    fn from(err: ApiError) -> Self {
        PageError(err)
    }
}

impl From<AutocaptionError> for PageError {
    fn from(err: AutocaptionError) -> Self {
        PageError(err.into())
    }
}

impl From<CaptionError> for PageError {
    fn from(err: CaptionError) -> Self {
        PageError(err.into())
    }
}

impl From<MultipartError> for PageError {
    fn from(err: MultipartError) -> Self {
        PageError(err.into())
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        self.0.log();
        let status = self.0.status();
        (status, Html(pages::error_page(status, &self.0.message()))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn status_of(err: CaptionError) -> StatusCode {
        ApiError::from(err).status()
    }

    #[test]
    fn test_client_errors() {
        assert_eq!(status_of(CaptionError::NoFile), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(CaptionError::InvalidLength {
                value: "500".into(),
                min: 10,
                max: 200
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(CaptionError::UnsupportedFormat {
                path: PathBuf::from("a.txt"),
                format: "unknown".into()
            }),
            StatusCode::UNSUPPORTED_MEDIA_TYPE
        );
        assert_eq!(
            status_of(CaptionError::FileTooLarge {
                path: PathBuf::from("a.jpg"),
                size_mb: 20,
                max_mb: 16
            }),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            status_of(CaptionError::FileNotFound(PathBuf::from("x.jpg"))),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_upstream_errors() {
        assert_eq!(
            status_of(CaptionError::Inference {
                message: "boom".into(),
                status_code: Some(500)
            }),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(CaptionError::Timeout {
                stage: "caption".into(),
                timeout_ms: 100
            }),
            StatusCode::GATEWAY_TIMEOUT
        );
        assert_eq!(
            ApiError::from(ScheduleError::QueueFull { capacity: 4 }).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_inference_details_not_exposed() {
        let err = ApiError::from(CaptionError::Inference {
            message: "HTTP 401: token hf_secret rejected".into(),
            status_code: Some(401),
        });
        assert!(!err.message().contains("hf_secret"));
        assert_eq!(err.code(), "inference_failed");
    }

    #[test]
    fn test_job_not_found() {
        let err = ApiError::JobNotFound(Uuid::nil());
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.code(), "not_found");
    }
}
