use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of a failed remote call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    ValidationError,
    Unauthorized,
    Forbidden,
    NotFound,
    ServerError,
    Timeout,
    NetworkError,
    Unknown,
}

impl ApiErrorKind {
    pub fn from_status(status: u16) -> Self {
        match status {
            400 | 422 => ApiErrorKind::ValidationError,
            401 => ApiErrorKind::Unauthorized,
            403 => ApiErrorKind::Forbidden,
            404 => ApiErrorKind::NotFound,
            408 => ApiErrorKind::Timeout,
            500 | 502 | 503 | 504 => ApiErrorKind::ServerError,
            _ => ApiErrorKind::Unknown,
        }
    }

    /// Fixed user-facing message for the kind.
    pub fn message(&self) -> &'static str {
        match self {
            ApiErrorKind::NetworkError => "Network error. Please check your internet connection.",
            ApiErrorKind::ServerError => "Server error. Please try again later.",
            ApiErrorKind::Timeout => "The server took too long to respond.",
            ApiErrorKind::Unauthorized => "Authorization required. Please sign in again.",
            ApiErrorKind::Forbidden => "You do not have access to this resource.",
            ApiErrorKind::NotFound => "The requested resource was not found.",
            ApiErrorKind::ValidationError => "Data validation failed.",
            ApiErrorKind::Unknown => "Something went wrong. Please try again later.",
        }
    }
}

/// A failed remote call.
///
/// `status` is the HTTP status, 408 for a client-side timeout and 0 when no
/// response arrived at all.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} (HTTP {status})")]
pub struct ApiError {
    pub kind: ApiErrorKind,
    pub status: u16,
    pub message: String,
    /// Per-field validation messages, when the server sends them.
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

impl ApiError {
    pub fn new(kind: ApiErrorKind, status: u16) -> Self {
        Self {
            kind,
            status,
            message: kind.message().to_string(),
            errors: None,
        }
    }

    pub fn from_status(status: u16) -> Self {
        Self::new(ApiErrorKind::from_status(status), status)
    }

    /// Build from an error response, preferring the server's own message.
    pub(crate) fn from_response(status: u16, body: &serde_json::Value) -> Self {
        let mut err = Self::from_status(status);
        if let Some(message) = body
            .get("message")
            .and_then(serde_json::Value::as_str)
            .filter(|m| !m.is_empty())
        {
            err.message = message.to_string();
        }
        err.errors = body
            .get("errors")
            .cloned()
            .and_then(|e| serde_json::from_value(e).ok());
        err
    }

    pub(crate) fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ApiErrorKind::Timeout, 408)
        } else if let Some(status) = err.status() {
            Self::from_status(status.as_u16())
        } else if err.is_decode() {
            Self {
                message: format!("Invalid response body: {err}"),
                ..Self::new(ApiErrorKind::Unknown, 0)
            }
        } else {
            Self::new(ApiErrorKind::NetworkError, 0)
        }
    }

    pub(crate) fn invalid_body(status: u16, err: &serde_json::Error) -> Self {
        Self {
            message: format!("Invalid response body: {err}"),
            ..Self::new(ApiErrorKind::Unknown, status)
        }
    }

    pub(crate) fn invalid_url(url: &str, err: &url::ParseError) -> Self {
        Self {
            message: format!("Invalid URL '{url}': {err}"),
            ..Self::new(ApiErrorKind::Unknown, 0)
        }
    }

    pub fn user_message(&self) -> &str {
        &self.message
    }

    pub fn is_unauthorized(&self) -> bool {
        self.kind == ApiErrorKind::Unauthorized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_classification() {
        let cases = [
            (400, ApiErrorKind::ValidationError),
            (422, ApiErrorKind::ValidationError),
            (401, ApiErrorKind::Unauthorized),
            (403, ApiErrorKind::Forbidden),
            (404, ApiErrorKind::NotFound),
            (408, ApiErrorKind::Timeout),
            (500, ApiErrorKind::ServerError),
            (502, ApiErrorKind::ServerError),
            (503, ApiErrorKind::ServerError),
            (504, ApiErrorKind::ServerError),
            (418, ApiErrorKind::Unknown),
            (501, ApiErrorKind::Unknown),
        ];
        for (status, kind) in cases {
            assert_eq!(ApiErrorKind::from_status(status), kind, "HTTP {status}");
        }
    }

    #[test]
    fn fixed_messages_per_kind() {
        let err = ApiError::from_status(503);
        assert_eq!(err.user_message(), "Server error. Please try again later.");
        assert_eq!(err.to_string(), "Server error. Please try again later. (HTTP 503)");
    }

    #[test]
    fn server_message_and_field_errors_win() {
        let body = json!({
            "message": "name is required",
            "errors": { "name": ["must not be empty"] }
        });
        let err = ApiError::from_response(422, &body);
        assert_eq!(err.kind, ApiErrorKind::ValidationError);
        assert_eq!(err.message, "name is required");
        assert_eq!(
            err.errors.as_ref().and_then(|e| e.get("name")).map(Vec::len),
            Some(1)
        );

        let bare = ApiError::from_response(404, &serde_json::Value::Null);
        assert_eq!(bare.message, ApiErrorKind::NotFound.message());
        assert!(bare.errors.is_none());
    }
}
