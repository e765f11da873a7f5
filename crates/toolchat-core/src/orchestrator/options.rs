//! Per-loop behavior switches

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_REQUEST_TIMEOUT;

/// What happens to a turn's messages once it is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryPolicy {
    /// Every query starts from the system prompt alone
    #[default]
    Discard,
    /// Successful exchanges are carried into later queries
    Persist,
}

/// How the tool catalog is presented to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolCallStyle {
    /// Send the catalog as the endpoint's `tools` schema
    #[default]
    Native,
    /// Describe the catalog in a user message and expect
    /// `<function=NAME>{...}</function>` back
    Prompted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOptions {
    /// Leading `system` message, if any
    pub system_prompt: Option<String>,
    pub history: HistoryPolicy,
    pub tool_call_style: ToolCallStyle,
    /// Bound on each completion request
    pub completion_timeout: Duration,
}

impl Default for LoopOptions {
    fn default() -> Self {
        Self {
            system_prompt: None,
            history: HistoryPolicy::Discard,
            tool_call_style: ToolCallStyle::Native,
            completion_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl LoopOptions {
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn with_history(mut self, history: HistoryPolicy) -> Self {
        self.history = history;
        self
    }

    pub fn with_tool_call_style(mut self, style: ToolCallStyle) -> Self {
        self.tool_call_style = style;
        self
    }

    pub fn with_completion_timeout(mut self, timeout: Duration) -> Self {
        self.completion_timeout = timeout;
        self
    }
}
