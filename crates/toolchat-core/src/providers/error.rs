//! Completion error types

use std::time::Duration;

use thiserror::Error;

/// The model asked for a tool but its arguments could not be decoded.
///
/// Recoverable: the turn reports it, the session carries on.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("could not parse arguments for tool call `{tool_name}`: {reason}")]
pub struct MalformedToolCall {
    /// Tool the model named
    pub tool_name: String,
    /// Undecodable payload, kept for display
    pub raw: String,
    /// Why decoding failed
    pub reason: String,
}

/// Errors that can occur while obtaining a completion
#[derive(Error, Debug)]
pub enum CompletionError {
    /// Network/HTTP error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-success status from the endpoint
    #[error("{provider} API error ({status}): {message}")]
    Status {
        provider: String,
        status: u16,
        message: String,
    },

    /// Response body did not have the expected shape
    #[error("Invalid response from {provider}: {message}")]
    InvalidResponse { provider: String, message: String },

    /// The request exceeded its time bound
    #[error("Completion request timed out after {0:?}")]
    Timeout(Duration),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    MalformedToolCall(#[from] MalformedToolCall),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl CompletionError {
    /// Create a status error
    pub fn status(provider: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            provider: provider.into(),
            status,
            message: message.into(),
        }
    }

    /// Create an invalid response error
    pub fn invalid_response(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidResponse {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Malformed tool calls are surfaced to the user rather than treated as
    /// endpoint failures
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::MalformedToolCall(_))
    }
}

pub type ProviderResult<T> = Result<T, CompletionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_is_recoverable() {
        let err = CompletionError::from(MalformedToolCall {
            tool_name: "foo".into(),
            raw: "<function=foo>not-json</function>".into(),
            reason: "expected value at line 1 column 1".into(),
        });
        assert!(err.is_recoverable());
        assert_eq!(
            err.to_string(),
            "could not parse arguments for tool call `foo`: expected value at line 1 column 1"
        );
        assert!(!CompletionError::status("openai", 500, "boom").is_recoverable());
    }
}
