use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Every failure the panel can report. `Display` is the banner text.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{message}")]
    Status { status: StatusCode, message: String },

    #[error("Unexpected response from server: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Could not read attachment {path}: {source}")]
    Attachment {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid API URL: {0}")]
    InvalidUrl(String),

    #[error("Request aborted")]
    Aborted,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ApiError {
    /// Build the error for a non-2xx response, preferring the backend's own text.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let from_json = serde_json::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|parsed| parsed.message.or(parsed.error))
            .filter(|text| !text.trim().is_empty());

        let message = match from_json {
            Some(text) => text,
            None if !body.trim().is_empty() && !body.trim_start().starts_with('{') => {
                body.trim().to_string()
            }
            None => format!(
                "Request failed ({} {})",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            ),
        };

        Self::Status { status, message }
    }

    /// Aborted requests are never shown to the user.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_message_prefers_json_message() {
        let err = ApiError::from_status(StatusCode::FORBIDDEN, r#"{"message":"Not a member"}"#);
        assert_eq!(err.to_string(), "Not a member");

        let err = ApiError::from_status(StatusCode::BAD_REQUEST, r#"{"error":"Bad recipients"}"#);
        assert_eq!(err.to_string(), "Bad recipients");
    }

    #[test]
    fn status_message_falls_back_to_text_then_reason() {
        let err = ApiError::from_status(StatusCode::BAD_GATEWAY, "upstream down");
        assert_eq!(err.to_string(), "upstream down");

        let err = ApiError::from_status(StatusCode::NOT_FOUND, "");
        assert_eq!(err.to_string(), "Request failed (404 Not Found)");

        let err = ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, r#"{"code":1}"#);
        assert_eq!(err.to_string(), "Request failed (500 Internal Server Error)");
    }

    #[test]
    fn only_aborted_is_aborted() {
        assert!(ApiError::Aborted.is_aborted());
        assert!(!ApiError::InvalidUrl("x".into()).is_aborted());
    }
}
