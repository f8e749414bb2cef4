use std::time::Duration;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::Value;

use crate::gemini::GenerateError;

/// Stable discriminant clients switch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ApiKeyNotFound,
    EmptyMessage,
    UpstreamTimeout,
    UpstreamFetchError,
    UpstreamError,
    UpstreamFallbackError,
    Uncaught,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::ApiKeyNotFound => "API_KEY_NOT_FOUND",
            ErrorCode::EmptyMessage => "EMPTY_MESSAGE",
            ErrorCode::UpstreamTimeout => "UPSTREAM_TIMEOUT",
            ErrorCode::UpstreamFetchError => "UPSTREAM_FETCH_ERROR",
            ErrorCode::UpstreamError => "UPSTREAM_ERROR",
            ErrorCode::UpstreamFallbackError => "UPSTREAM_FALLBACK_ERROR",
            ErrorCode::Uncaught => "UNCAUGHT",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// `details` lists the layers tried and their errors, never the key.
    #[error("no API key could be resolved")]
    ApiKeyNotFound { details: Value },
    #[error("empty message")]
    EmptyMessage,
    #[error("upstream timed out after {0:?}")]
    UpstreamTimeout(Duration),
    #[error("upstream fetch failed: {0}")]
    UpstreamFetch(String),
    #[error("upstream returned status {status}")]
    Upstream {
        status: u16,
        body: String,
        fallback: bool,
    },
    #[error("unhandled server error: {0}")]
    Uncaught(String),
}

impl ChatError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ChatError::ApiKeyNotFound { .. } => ErrorCode::ApiKeyNotFound,
            ChatError::EmptyMessage => ErrorCode::EmptyMessage,
            ChatError::UpstreamTimeout(_) => ErrorCode::UpstreamTimeout,
            ChatError::UpstreamFetch(_) => ErrorCode::UpstreamFetchError,
            ChatError::Upstream { fallback: false, .. } => ErrorCode::UpstreamError,
            ChatError::Upstream { fallback: true, .. } => ErrorCode::UpstreamFallbackError,
            ChatError::Uncaught(_) => ErrorCode::Uncaught,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ChatError::ApiKeyNotFound { .. } | ChatError::Uncaught(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ChatError::EmptyMessage => StatusCode::BAD_REQUEST,
            ChatError::UpstreamTimeout(_)
            | ChatError::UpstreamFetch(_)
            | ChatError::Upstream { .. } => StatusCode::BAD_GATEWAY,
        }
    }

    fn body(&self) -> ErrorBody {
        let (error, details, upstream_status) = match self {
            ChatError::ApiKeyNotFound { details } => {
                ("Server missing GEMINI_API_KEY", Some(details.clone()), None)
            }
            ChatError::EmptyMessage => ("Empty message", None, None),
            ChatError::UpstreamTimeout(deadline) => (
                "Gemini request timed out",
                Some(Value::from(format!("no response within {}s", deadline.as_secs()))),
                None,
            ),
            ChatError::UpstreamFetch(message) => {
                ("Gemini request failed", Some(Value::from(message.clone())), None)
            }
            ChatError::Upstream {
                status,
                body,
                fallback,
            } => (
                if *fallback {
                    "Gemini error after fallback"
                } else {
                    "Gemini error"
                },
                Some(Value::from(body.clone())),
                Some(*status),
            ),
            ChatError::Uncaught(message) => {
                ("Unhandled server error", Some(Value::from(message.clone())), None)
            }
        };
        ErrorBody {
            error: error.to_string(),
            code: self.code(),
            details,
            upstream_status,
        }
    }
}

impl From<GenerateError> for ChatError {
    fn from(err: GenerateError) -> Self {
        match err {
            GenerateError::Timeout(deadline) => ChatError::UpstreamTimeout(deadline),
            GenerateError::Transport { message, .. } => ChatError::UpstreamFetch(message),
            GenerateError::Upstream {
                status,
                body,
                fallback,
            } => ChatError::Upstream {
                status,
                body,
                fallback,
            },
            GenerateError::MissingApiKey => ChatError::ApiKeyNotFound {
                details: Value::Null,
            },
            GenerateError::Encode(_) | GenerateError::Decode(_) => {
                ChatError::Uncaught(err.to_string())
            }
        }
    }
}

/// Wire shape of every error response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: String,
    code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    upstream_status: Option<u16>,
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}
