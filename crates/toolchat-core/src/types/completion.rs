//! Classified endpoint responses

use super::tool::ToolCallRequest;

/// What a single completion asked for.
///
/// Only one tool invocation is carried even when the endpoint returned
/// several; the first one wins.
#[derive(Debug, Clone, PartialEq)]
pub enum CompletionResult {
    /// Plain text answer
    FinalAnswer(String),
    /// The model wants a tool to be run
    ToolInvocation(ToolCallRequest),
}

impl CompletionResult {
    /// The answer text, if this is a final answer
    pub fn as_answer(&self) -> Option<&str> {
        match self {
            CompletionResult::FinalAnswer(text) => Some(text),
            CompletionResult::ToolInvocation(_) => None,
        }
    }

    /// The tool request, if this is an invocation
    pub fn as_invocation(&self) -> Option<&ToolCallRequest> {
        match self {
            CompletionResult::FinalAnswer(_) => None,
            CompletionResult::ToolInvocation(request) => Some(request),
        }
    }
}
