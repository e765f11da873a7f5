//! The call/response channel to a tool provider

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::error::SessionResult;
use crate::types::{ToolCallResult, ToolDescriptor};

/// Minimal RPC surface of a tool provider.
///
/// `McpClient` implements it over a child process; `MockToolTransport`
/// implements it in memory. `ProviderSession` layers caching, timeouts
/// and lifecycle on top.
#[async_trait]
pub trait ToolTransport: Send + Sync {
    /// List the provider's tools in the order it advertises them
    async fn list_tools(&self) -> SessionResult<Vec<ToolDescriptor>>;

    /// Invoke one tool. A tool-reported failure is returned as a result with
    /// `success == false`, not as an error.
    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> SessionResult<ToolCallResult>;

    /// Release the channel and the provider process. Called at most once.
    async fn shutdown(&mut self) -> SessionResult<()>;

    /// Name the provider reported during the handshake
    fn server_name(&self) -> Option<String> {
        None
    }
}
