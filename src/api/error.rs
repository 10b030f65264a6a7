//! Errors surfaced by the analysis service client.

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Everything that can go wrong while talking to the backend.
///
/// The `Display` text of `Http`, `Rejected` and `TaskFailed` is the
/// backend's own message, unchanged, so it can be shown to the user as is.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ApiError {
    /// The request never produced a response (connect failure, timeout, ...).
    #[error("{0}")]
    Transport(String),

    /// The backend answered with a non-2xx status.
    #[error("{message}")]
    Http { status: u16, message: String },

    /// A 2xx response whose body could not be parsed.
    #[error("Failed to parse response: {0}")]
    Decode(String),

    /// A 2xx envelope that reports failure (`{error}` or `success: false`).
    #[error("{0}")]
    Rejected(String),

    /// The task itself ended in the `failed` state.
    #[error("{0}")]
    TaskFailed(String),
}

impl ApiError {
    /// Build an `Http` error from a non-2xx response body.
    ///
    /// A JSON `message` or `error` field wins; otherwise the trimmed body,
    /// and for an empty body the status' canonical reason.
    pub fn from_response(status: StatusCode, body: &str) -> Self {
        let from_json = serde_json::from_str::<Value>(body).ok().and_then(|json| {
            ["message", "error"]
                .iter()
                .find_map(|key| json.get(key).and_then(Value::as_str).map(String::from))
        });

        let message = from_json.unwrap_or_else(|| {
            let trimmed = body.trim();
            if trimmed.is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            } else {
                trimmed.to_string()
            }
        });

        ApiError::Http {
            status: status.as_u16(),
            message,
        }
    }

    /// Classify a `reqwest` send failure.
    pub fn transport(err: &reqwest::Error, base_url: &str, timeout_seconds: u64) -> Self {
        if err.is_timeout() {
            ApiError::Transport(format!("Request timed out after {}s", timeout_seconds))
        } else if err.is_connect() {
            ApiError::Transport(format!("Cannot connect to the analysis service at {}", base_url))
        } else {
            ApiError::Transport(format!("Failed to send request: {}", err))
        }
    }

    /// Process exit code for a command that ended with this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            ApiError::TaskFailed(_) => 2,
            _ => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_message_is_verbatim() {
        let err = ApiError::from_response(
            StatusCode::TOO_MANY_REQUESTS,
            r#"{"error": "rate limited"}"#,
        );
        assert_eq!(err.to_string(), "rate limited");
        assert_eq!(
            err,
            ApiError::Http {
                status: 429,
                message: "rate limited".to_string()
            }
        );
    }

    #[test]
    fn test_message_field_preferred_over_error() {
        let err = ApiError::from_response(
            StatusCode::BAD_REQUEST,
            r#"{"error": "bad_request", "message": "Profile ID is required"}"#,
        );
        assert_eq!(err.to_string(), "Profile ID is required");
    }

    #[test]
    fn test_plain_body_and_empty_body() {
        let err = ApiError::from_response(StatusCode::BAD_GATEWAY, "  upstream down \n");
        assert_eq!(err.to_string(), "upstream down");

        let err = ApiError::from_response(StatusCode::NOT_FOUND, "");
        assert_eq!(err.to_string(), "Not Found");
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(ApiError::TaskFailed("profile is private".to_string()).exit_code(), 2);
        assert_eq!(ApiError::Transport("Cannot connect".to_string()).exit_code(), 1);
        assert_eq!(
            ApiError::Http {
                status: 500,
                message: "boom".to_string()
            }
            .exit_code(),
            1
        );
        assert_eq!(ApiError::Rejected("nope".to_string()).exit_code(), 1);
    }
}
