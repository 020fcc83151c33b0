//! JSON error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::error::FrameError;

/// Body of every error response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Which endpoint an error came from. Selects the user-facing wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    FramedAvatar,
    Frames,
    SmartFrame,
    Badge,
    Themes,
}

impl Endpoint {
    fn internal_message(self) -> &'static str {
        match self {
            Self::FramedAvatar => "Internal Server Error during image processing.",
            Self::Frames => "Internal Server Error: Fallback image is missing.",
            Self::SmartFrame => "Internal Server Error during analysis.",
            Self::Badge => "Internal Server Error during badge generation.",
            Self::Themes => "Failed to load themes.",
        }
    }

    fn user_not_found_message(self) -> &'static str {
        match self {
            Self::FramedAvatar | Self::Frames => {
                "The GitHub user does not exist. Please check the spelling and try again."
            }
            _ => "GitHub user does not exist.",
        }
    }
}

/// An HTTP error with a JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, error: impl Into<String>, message: Option<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: error.into(),
                message,
            },
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "Bad Request", Some(message.into()))
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "Not Found", Some(message.into()))
    }

    /// Maps a library error onto a response. 500s are logged here and their
    /// details withheld from the client.
    pub fn from_frame(err: FrameError, endpoint: Endpoint) -> Self {
        match err {
            FrameError::Validation { message, .. } => Self::bad_request(message),
            FrameError::ThemeNotFound(theme) => {
                Self::new(StatusCode::NOT_FOUND, format!("Theme '{theme}' not found."), None)
            }
            FrameError::UserNotFound(_) => Self::new(
                StatusCode::NOT_FOUND,
                "User not found",
                Some(endpoint.user_not_found_message().to_string()),
            ),
            FrameError::Transient(detail) => {
                tracing::warn!(?endpoint, %detail, "upstream unavailable");
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service temporarily unavailable. Please try again later.",
                    None,
                )
            }
            FrameError::FramesDirMissing(path) => {
                tracing::error!(?endpoint, %path, "frames directory missing");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Frames directory not found",
                    None,
                )
            }
            other => Self::internal(endpoint, other),
        }
    }

    /// A generic 500 for `endpoint`. `detail` is logged, never returned.
    pub fn internal(endpoint: Endpoint, detail: impl std::fmt::Display) -> Self {
        tracing::error!(?endpoint, error = %detail, "request failed");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            endpoint.internal_message(),
            None,
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_is_bad_request_with_message() {
        let err = ApiError::from_frame(
            FrameError::validation("size", "The 'size' parameter must be a valid integer."),
            Endpoint::FramedAvatar,
        );
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.body.error, "Bad Request");
        assert_eq!(err.body.message.as_deref(), Some("The 'size' parameter must be a valid integer."));
    }

    #[test]
    fn theme_not_found_names_theme() {
        let err = ApiError::from_frame(FrameError::ThemeNotFound("nope".into()), Endpoint::FramedAvatar);
        assert_eq!(err.status, StatusCode::NOT_FOUND);
        assert_eq!(
            serde_json::to_value(&err.body).unwrap(),
            serde_json::json!({"error": "Theme 'nope' not found."})
        );
    }

    #[test]
    fn user_not_found_wording_depends_on_endpoint() {
        let strict = ApiError::from_frame(FrameError::UserNotFound("x".into()), Endpoint::FramedAvatar);
        let badge = ApiError::from_frame(FrameError::UserNotFound("x".into()), Endpoint::Badge);

        assert_eq!(strict.body.error, "User not found");
        assert!(strict.body.message.unwrap().contains("check the spelling"));
        assert_eq!(badge.body.message.as_deref(), Some("GitHub user does not exist."));
    }

    #[test]
    fn transient_and_internal_errors() {
        let busy = ApiError::from_frame(FrameError::Transient("timeout".into()), Endpoint::SmartFrame);
        assert_eq!(busy.status, StatusCode::SERVICE_UNAVAILABLE);

        let internal = ApiError::from_frame(
            FrameError::Upstream { status: 502, url: "http://x".into() },
            Endpoint::Badge,
        );
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(internal.body.error, "Internal Server Error during badge generation.");
        assert!(internal.body.message.is_none());
    }
}
