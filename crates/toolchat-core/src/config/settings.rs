//! Validated settings handed to the core components

use std::collections::BTreeMap;
use std::fmt::Debug;
use std::time::Duration;

use crate::orchestrator::LoopOptions;
use crate::types::ToolChoice;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Inference endpoint settings
#[derive(Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Base URL without trailing slash, e.g. `http://localhost:9004/v1`
    pub base_url: String,
    /// Bearer credential
    pub api_key: String,
    /// Model identifier; `None` means use the first model the endpoint lists
    pub model: Option<String>,
    /// Bound on every HTTP request
    pub timeout: Duration,
    /// Tool choice policy sent with tool-bearing requests
    pub tool_choice: ToolChoice,
}

impl EndpointConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            tool_choice: ToolChoice::Auto,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Debug for EndpointConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .field("tool_choice", &self.tool_choice)
            .finish()
    }
}

/// How tool provider processes are launched and bounded
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Interpreter for `.py` scripts
    pub python_command: String,
    /// Runtime for `.js` scripts
    pub node_command: String,
    /// Extra environment for the child; the parent environment is inherited
    pub env: BTreeMap<String, String>,
    /// Bound on spawn + `initialize`
    pub handshake_timeout: Duration,
    /// Bound on each `tools/list` and `tools/call`
    pub call_timeout: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            python_command: "python".to_string(),
            node_command: "node".to_string(),
            env: BTreeMap::new(),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }
}

/// Everything the binary needs, validated once at startup
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub endpoint: EndpointConfig,
    pub provider: ProviderConfig,
    pub chat: LoopOptions,
}
