//! Provider sessions over MCP (Model Context Protocol)
//!
//! # Example
//!
//! ```rust,ignore
//! use toolchat_core::mcp::ProviderSession;
//!
//! let mut session = ProviderSession::connect("weather.py", &config.provider, logger).await?;
//!
//! let registry = session.list_tools().await?;
//! let result = session.call_tool("get_forecast", args).await?;
//!
//! session.close().await;
//! ```

mod client;
mod error;
pub mod mock;
mod session;
mod transport;

pub use client::{McpClient, ScriptKind};
pub use error::{SessionError, SessionResult};
pub use mock::{MockToolOutcome, MockToolTransport, MockTransportStats};
pub use session::ProviderSession;
pub use transport::ToolTransport;
