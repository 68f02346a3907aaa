use http::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::models::EventStatus;
use crate::validation::ValidationError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Login required")]
    LoginRequired,
    #[error("Session is no longer valid, signed out")]
    Unauthorized,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Request failed ({status}): {message}")]
    Status { status: StatusCode, message: String },
    #[error("Request timed out")]
    Timeout,
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),
    #[error("Unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error("Event is {0} and can no longer be edited")]
    EventClosed(EventStatus),
}

impl From<reqwest::Error> for ApiError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            ApiError::Timeout
        } else {
            ApiError::Http(value)
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<serde_json::Value>,
    message: Option<String>,
}

impl ApiError {
    /// Maps a non-success response onto the error taxonomy.
    pub(crate) fn from_status(status: StatusCode, body: &str) -> Self {
        let message = error_message(body).unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("unexpected response")
                .to_string()
        });
        match status {
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized,
            StatusCode::NOT_FOUND => ApiError::NotFound(message),
            _ => ApiError::Status { status, message },
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            ApiError::NotFound(_) => Some(StatusCode::NOT_FOUND),
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Http(err) => err.status(),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail {
        Some(serde_json::Value::String(detail)) => Some(detail),
        Some(other) if !other.is_null() => Some(other.to_string()),
        _ => parsed.message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_message_is_preferred() {
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, r#"{"detail": "bad slot"}"#);
        assert_eq!(err.to_string(), "Request failed (400 Bad Request): bad slot");
    }

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, ""),
            ApiError::Unauthorized
        ));
        let not_found = ApiError::from_status(StatusCode::NOT_FOUND, r#"{"message": "no timetable"}"#);
        assert!(not_found.is_not_found());
        assert_eq!(not_found.status(), Some(StatusCode::NOT_FOUND));
        let server = ApiError::from_status(StatusCode::BAD_GATEWAY, "<html>");
        assert!(server.to_string().contains("Bad Gateway"));
    }
}
