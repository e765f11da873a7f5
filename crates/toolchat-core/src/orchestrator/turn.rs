//! Turn states, outcomes and errors

use thiserror::Error;

use crate::mcp::SessionError;
use crate::providers::CompletionError;

/// Steps of a single query's round-trip, in the order they can occur
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnState {
    AwaitingQuery,
    BuildingCatalog,
    AwaitingCompletion,
    ExecutingTool,
    AwaitingFinalCompletion,
    Done,
}

/// Reasons a turn ended without an answer. Only a provider disconnect
/// ends the session; see [`TurnError::ends_session`].
#[derive(Error, Debug)]
pub enum TurnError {
    /// The tool catalog could not be fetched
    #[error("could not list tools: {0}")]
    Catalog(#[source] SessionError),

    /// The provider channel failed during a tool call
    #[error("tool provider error: {0}")]
    Provider(#[source] SessionError),

    #[error(transparent)]
    Completion(#[from] CompletionError),

    /// The completion that should have answered asked for another tool
    #[error("model requested a second tool call ({0}); only one tool call per query is supported")]
    ChainedToolCall(String),

    #[error("turn cancelled")]
    Cancelled,
}

impl TurnError {
    /// True when the tool provider is gone and later turns cannot use tools
    pub fn ends_session(&self) -> bool {
        match self {
            TurnError::Catalog(e) | TurnError::Provider(e) => e.is_disconnected(),
            _ => false,
        }
    }

    /// True for failures caused by the model's own reply rather than by a service
    pub fn is_recoverable(&self) -> bool {
        matches!(self, TurnError::Completion(e) if e.is_recoverable())
    }
}

/// How a turn ended
#[derive(Debug)]
pub enum TurnOutcome {
    /// Text to show the user
    Answer(String),
    /// The requested tool was missing or reported failure
    ToolFailed { tool: String, message: String },
    Failed(TurnError),
}

impl TurnOutcome {
    pub fn is_answer(&self) -> bool {
        matches!(self, TurnOutcome::Answer(_))
    }

    /// User-facing text; every failure is one `Error: ...` line, followed by
    /// the model's raw reply when its tool call could not be parsed.
    pub fn render(&self) -> String {
        match self {
            TurnOutcome::Answer(text) => text.clone(),
            TurnOutcome::ToolFailed { tool, message } => {
                format!("Error: tool {} failed: {}", tool, message)
            }
            TurnOutcome::Failed(TurnError::Completion(CompletionError::MalformedToolCall(malformed))) => {
                format!("Error: {}\n{}", malformed, malformed.raw)
            }
            TurnOutcome::Failed(err) => format!("Error: {}", err),
        }
    }
}

/// A finished turn and the states it passed through
#[derive(Debug)]
pub struct TurnReport {
    pub outcome: TurnOutcome,
    pub states: Vec<TurnState>,
}

impl TurnReport {
    pub fn render(&self) -> String {
        self.outcome.render()
    }
}
