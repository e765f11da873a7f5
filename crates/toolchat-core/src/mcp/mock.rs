//! In-memory tool provider for testing
//!
//! Serves a fixed catalog and scripted per-tool outcomes without spawning
//! a process. Unscripted tools echo their arguments back as JSON text.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::error::{SessionError, SessionResult};
use super::transport::ToolTransport;
use crate::types::{ToolCallResult, ToolDescriptor};

/// Scripted result for one tool
#[derive(Debug, Clone)]
pub enum MockToolOutcome {
    /// Succeed with text content
    Text(String),
    /// Succeed with structured content
    Structured(Value),
    /// The tool reports failure (`success == false`)
    Failure(String),
    /// The channel fails but stays usable
    Transport(String),
    /// The channel is gone
    Disconnected(String),
}

/// Counters shared between a mock transport and the test that owns it
#[derive(Debug, Default)]
pub struct MockTransportStats {
    list_calls: AtomicUsize,
    shutdowns: AtomicUsize,
    calls: Mutex<Vec<(String, Map<String, Value>)>>,
}

impl MockTransportStats {
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    /// Every `call_tool` received, in order
    pub fn calls(&self) -> Vec<(String, Map<String, Value>)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

/// Mock tool provider
pub struct MockToolTransport {
    tools: Vec<ToolDescriptor>,
    outcomes: HashMap<String, MockToolOutcome>,
    delay: Option<Duration>,
    list_error: Option<MockToolOutcome>,
    shutdown_error: Option<String>,
    stats: Arc<MockTransportStats>,
}

impl MockToolTransport {
    /// Create a provider advertising `tools`
    pub fn new(tools: Vec<ToolDescriptor>) -> Self {
        Self {
            tools,
            outcomes: HashMap::new(),
            delay: None,
            list_error: None,
            shutdown_error: None,
            stats: Arc::new(MockTransportStats::default()),
        }
    }

    /// Script the outcome of `tool`
    pub fn with_outcome(mut self, tool: impl Into<String>, outcome: MockToolOutcome) -> Self {
        self.outcomes.insert(tool.into(), outcome);
        self
    }

    /// Delay every list/call by `delay`
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make `list_tools` fail with a transport error
    pub fn with_list_error(mut self, message: impl Into<String>) -> Self {
        self.list_error = Some(MockToolOutcome::Transport(message.into()));
        self
    }

    /// Make `list_tools` fail as if the provider had gone away
    pub fn with_list_disconnect(mut self, message: impl Into<String>) -> Self {
        self.list_error = Some(MockToolOutcome::Disconnected(message.into()));
        self
    }

    /// Make `shutdown` fail (after counting it)
    pub fn with_shutdown_error(mut self, message: impl Into<String>) -> Self {
        self.shutdown_error = Some(message.into());
        self
    }

    /// Handle to the counters; stays valid after the transport is boxed
    pub fn stats(&self) -> Arc<MockTransportStats> {
        Arc::clone(&self.stats)
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ToolTransport for MockToolTransport {
    async fn list_tools(&self) -> SessionResult<Vec<ToolDescriptor>> {
        self.stats.list_calls.fetch_add(1, Ordering::SeqCst);
        self.pause().await;

        match &self.list_error {
            Some(MockToolOutcome::Disconnected(message)) => Err(SessionError::Disconnected(message.clone())),
            Some(MockToolOutcome::Transport(message)) => Err(SessionError::Transport(message.clone())),
            Some(_) | None => Ok(self.tools.clone()),
        }
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> SessionResult<ToolCallResult> {
        if let Ok(mut calls) = self.stats.calls.lock() {
            calls.push((name.to_string(), arguments.clone()));
        }
        self.pause().await;

        match self.outcomes.get(name) {
            Some(MockToolOutcome::Text(text)) => Ok(ToolCallResult::success(name, text.clone())),
            Some(MockToolOutcome::Structured(value)) => Ok(ToolCallResult::structured(name, value.clone())),
            Some(MockToolOutcome::Failure(message)) => Ok(ToolCallResult::failure(name, message.clone())),
            Some(MockToolOutcome::Transport(message)) => Err(SessionError::Transport(message.clone())),
            Some(MockToolOutcome::Disconnected(message)) => Err(SessionError::Disconnected(message.clone())),
            None => Ok(ToolCallResult::success(name, Value::Object(arguments).to_string())),
        }
    }

    async fn shutdown(&mut self) -> SessionResult<()> {
        self.stats.shutdowns.fetch_add(1, Ordering::SeqCst);
        match &self.shutdown_error {
            Some(message) => Err(SessionError::Transport(message.clone())),
            None => Ok(()),
        }
    }

    fn server_name(&self) -> Option<String> {
        Some("mock".to_string())
    }
}
