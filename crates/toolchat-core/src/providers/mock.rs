//! Mock completion client for testing
//!
//! Replays a scripted list of replies without network access and records
//! every request it receives. Replies go through the same classification as
//! real responses, so tool-call parsing is exercised too.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::error::{CompletionError, ProviderResult};
use super::parse::classify;
use super::proto::{FunctionCall, ResponseMessage, ToolCall};
use super::traits::CompletionClient;
use crate::logging::SharedLogger;
use crate::types::{CompletionResult, Message, ToolDescriptor};

/// One scripted reply
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Plain message content
    Text(String),
    /// Structured tool calls as `(name, raw arguments)`, in response order
    ToolCalls(Vec<(String, String)>),
    /// The endpoint fails with a 500
    Error(String),
    /// Wait, then reply
    Delayed(Duration, Box<MockReply>),
}

impl MockReply {
    pub fn text(content: impl Into<String>) -> Self {
        MockReply::Text(content.into())
    }

    /// A single structured tool call
    pub fn tool_call(name: impl Into<String>, arguments: impl Into<String>) -> Self {
        MockReply::ToolCalls(vec![(name.into(), arguments.into())])
    }

    pub fn delayed(self, delay: Duration) -> Self {
        MockReply::Delayed(delay, Box::new(self))
    }
}

/// What the client was asked, captured per `complete` call
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub messages: Vec<Message>,
    pub tools: Vec<ToolDescriptor>,
}

/// Request log shared between a mock client and the test that owns it
#[derive(Debug, Default)]
pub struct MockCompletionLog {
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockCompletionLog {
    /// Every request received, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Mock completion client
pub struct MockCompletionClient {
    script: Mutex<VecDeque<MockReply>>,
    log: Arc<MockCompletionLog>,
    logger: SharedLogger,
}

impl MockCompletionClient {
    /// Create a client that answers with `replies`, one per request
    pub fn new(replies: Vec<MockReply>, logger: SharedLogger) -> Self {
        Self {
            script: Mutex::new(replies.into()),
            log: Arc::new(MockCompletionLog::default()),
            logger,
        }
    }

    /// Handle to the request log; stays valid after the client is boxed
    pub fn log(&self) -> Arc<MockCompletionLog> {
        Arc::clone(&self.log)
    }

    fn next_reply(&self) -> Option<MockReply> {
        self.script.lock().ok().and_then(|mut script| script.pop_front())
    }
}

fn into_message(reply: MockReply) -> ProviderResult<ResponseMessage> {
    match reply {
        MockReply::Text(content) => Ok(ResponseMessage {
            content: Some(content),
            tool_calls: None,
        }),
        MockReply::ToolCalls(calls) => Ok(ResponseMessage {
            content: None,
            tool_calls: Some(
                calls
                    .into_iter()
                    .map(|(name, arguments)| ToolCall {
                        function: FunctionCall {
                            name,
                            arguments: Value::String(arguments),
                        },
                    })
                    .collect(),
            ),
        }),
        MockReply::Error(message) => Err(CompletionError::status("mock", 500, message)),
        MockReply::Delayed(_, reply) => into_message(*reply),
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, messages: &[Message], tools: &[ToolDescriptor]) -> ProviderResult<CompletionResult> {
        if let Ok(mut requests) = self.log.requests.lock() {
            requests.push(RecordedRequest {
                messages: messages.to_vec(),
                tools: tools.to_vec(),
            });
        }

        let Some(mut reply) = self.next_reply() else {
            return Err(CompletionError::Other("mock script exhausted".to_string()));
        };
        while let MockReply::Delayed(delay, inner) = reply {
            tokio::time::sleep(delay).await;
            reply = *inner;
        }

        self.logger
            .debug(&format!("MockCompletionClient: replying with {:?}", reply));
        let classified = classify(into_message(reply)?);
        Ok(classified.result?)
    }
}
