//! Completion client trait definition

use async_trait::async_trait;

use super::error::ProviderResult;
use crate::types::{CompletionResult, Message, ToolDescriptor};

/// One request/response exchange with an inference endpoint.
///
/// Implementations reduce every response to a [`CompletionResult`], so
/// callers never inspect endpoint-specific shapes.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Endpoint name for diagnostics (e.g., "openai", "mock")
    fn name(&self) -> &str;

    /// Send the ordered conversation and the tool catalog.
    ///
    /// An empty `tools` slice sends no tool schema at all.
    async fn complete(&self, messages: &[Message], tools: &[ToolDescriptor]) -> ProviderResult<CompletionResult>;
}
