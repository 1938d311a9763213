//! Transport error types for the NHL HTTP client.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("HTTP error: {status_code} - {message}")]
    Http { status_code: u16, message: String },

    #[error("Rate limited (retry after {retry_after}s)")]
    RateLimited { retry_after: u64 },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Request failed after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
}

impl ApiError {
    /// Build an error from a non-success response body.
    ///
    /// The NHL endpoints answer errors either with an HTML page or with a
    /// small JSON object carrying `message`; keep the message when present.
    pub fn from_response(status_code: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|json| {
                json.get("message")
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| body.chars().take(200).collect());

        match status_code {
            429 => Self::RateLimited { retry_after: 1 },
            _ => Self::Http {
                status_code,
                message,
            },
        }
    }

    /// Whether this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. }
                | Self::Network(_)
                | Self::Timeout(_)
                | Self::Http {
                    status_code: 500..=599,
                    ..
                }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_response_keeps_json_message() {
        let err = ApiError::from_response(404, r#"{"message":"Game not found"}"#);
        match err {
            ApiError::Http {
                status_code,
                message,
            } => {
                assert_eq!(status_code, 404);
                assert_eq!(message, "Game not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_retryable_classification() {
        assert!(ApiError::from_response(503, "").is_retryable());
        assert!(ApiError::from_response(429, "").is_retryable());
        assert!(!ApiError::from_response(404, "<html>").is_retryable());
        assert!(!ApiError::Deserialization("eof".into()).is_retryable());
    }
}
