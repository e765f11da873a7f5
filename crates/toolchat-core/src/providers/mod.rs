//! Completion clients
//!
//! A [`CompletionClient`] turns an ordered conversation plus a tool catalog
//! into a [`CompletionResult`](crate::types::CompletionResult):
//!
//! - [`OpenAiClient`]: any OpenAI-compatible `/chat/completions` endpoint
//! - [`MockCompletionClient`]: scripted replies for tests
//!
//! Both recognize tool calls in the structured `tool_calls` field and in the
//! `<function=NAME>{...}</function>` text convention.

mod error;
pub mod mock;
mod openai;
mod parse;
mod proto;
mod traits;

pub use error::{CompletionError, MalformedToolCall, ProviderResult};
pub use mock::{MockCompletionClient, MockCompletionLog, MockReply, RecordedRequest};
pub use openai::OpenAiClient;
pub use parse::parse_function_tag;
pub use traits::CompletionClient;
