//! toolchat core
//!
//! A chat loop that lets an OpenAI-compatible model call tools served by an
//! MCP (Model Context Protocol) provider process.
//!
//! ## Turn flow
//!
//! ```rust,ignore
//! use toolchat_core::{OpenAiClient, OrchestrationLoop, ProviderSession};
//!
//! let client = OpenAiClient::connect(config.endpoint, logger.clone()).await?;
//! let session = ProviderSession::connect("weather.py", &config.provider, logger.clone()).await?;
//!
//! let mut chat = OrchestrationLoop::new(Box::new(client), session, config.chat, logger);
//! let report = chat.run_turn("Any weather alerts in CA?", &cancel).await;
//! println!("{}", report.render());
//!
//! chat.shutdown().await;
//! ```

pub mod config;
pub mod logging;
pub mod mcp;
pub mod orchestrator;
pub mod providers;
pub mod shell;
pub mod tools;
pub mod types;

pub use types::{
    CancellationToken, CompletionResult, Message, MessageContent, MessageRole, ToolCallRequest,
    ToolCallResult, ToolChoice, ToolContent, ToolDescriptor,
};

pub use logging::{Logger, NoOpLogger, SharedLogger, TracingLogger};

pub use config::{ChatConfig, ConfigError, ConfigFile, EndpointConfig, ProviderConfig};

pub use mcp::{McpClient, ProviderSession, SessionError, SessionResult, ToolTransport};

pub use providers::{CompletionClient, CompletionError, MalformedToolCall, OpenAiClient};

pub use orchestrator::{
    HistoryPolicy, LoopOptions, OrchestrationLoop, ToolCallStyle, TurnError, TurnOutcome, TurnReport,
    TurnState,
};

pub use shell::{InteractiveShell, ShellExit};

pub use tools::ToolRegistry;
