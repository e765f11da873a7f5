//! Core types shared by the session, the completion client and the loop

mod cancellation;
mod completion;
mod message;
mod tool;

pub use cancellation::CancellationToken;
pub use completion::CompletionResult;
pub use message::{Message, MessageContent, MessageRole};
pub use tool::{ToolCallRequest, ToolCallResult, ToolChoice, ToolContent, ToolDescriptor};
