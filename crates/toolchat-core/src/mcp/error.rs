//! Provider session errors

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors raised by a provider session
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Unsupported provider script {path:?}: must be a .py or .js file")]
    UnsupportedScript { path: PathBuf },

    #[error("Transport error: {0}")]
    Transport(String),

    /// The channel to the provider is gone; the session cannot recover
    #[error("Provider disconnected: {0}")]
    Disconnected(String),

    #[error("{operation} timed out after {timeout:?}")]
    Timeout {
        operation: &'static str,
        timeout: Duration,
    },

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("tool {tool} failed: {message}")]
    ToolExecution { tool: String, message: String },

    #[error("Provider session is closed")]
    Closed,
}

impl SessionError {
    /// True when the provider channel is dead and the session must be torn down
    pub fn is_disconnected(&self) -> bool {
        matches!(self, SessionError::Disconnected(_))
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
