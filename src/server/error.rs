//! HTTP error response conversion.
//!
//! Every failure leaves the API as `{"detail": "<message>"}` with a status
//! chosen from the error kind.

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::SubburnError;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable description of what went wrong
    pub detail: String,
}

/// Wrapper so library errors can be returned from handlers
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<SubburnError> for ApiError {
    fn from(err: SubburnError) -> Self {
        let status = match &err {
            SubburnError::InvalidSubtitleFormat(_) | SubburnError::UnsupportedMedia(_) => {
                StatusCode::UNSUPPORTED_MEDIA_TYPE
            }
            SubburnError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if err.is_client_error() {
            tracing::warn!(status = %status, "Rejected upload: {}", err);
        } else {
            tracing::error!(status = %status, "Upload failed: {}", err);
        }

        Self::new(status, err.to_string())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        tracing::warn!("Malformed multipart request: {}", err.body_text());
        Self::new(err.status(), format!("Failed to read multipart request: {}", err.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { detail: self.detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (SubburnError::InvalidSubtitleFormat("cap.txt".into()), StatusCode::UNSUPPORTED_MEDIA_TYPE),
            (SubburnError::UnsupportedMedia("photo.jpg".into()), StatusCode::UNSUPPORTED_MEDIA_TYPE),
            (SubburnError::ConversionFailed, StatusCode::INTERNAL_SERVER_ERROR),
            (SubburnError::BurnFailed, StatusCode::INTERNAL_SERVER_ERROR),
            (SubburnError::ToolUnavailable("ffmpeg".into()), StatusCode::INTERNAL_SERVER_ERROR),
            (SubburnError::InvalidRequest("missing".into()), StatusCode::UNPROCESSABLE_ENTITY),
        ];

        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn test_detail_carries_message() {
        let err = ApiError::from(SubburnError::BurnFailed);
        assert_eq!(err.detail, "Error during hard subtitling of video");
    }
}
