//! MCP client over a child process, using the official rmcp SDK
//!
//! The provider script is launched with an interpreter chosen by its file
//! extension and spoken to over its stdin/stdout.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use rmcp::{
    model::{
        CallToolRequestParams, CallToolResult, ClientCapabilities, ClientInfo, Implementation,
        RawContent, Tool,
    },
    service::RunningService,
    transport::{IntoTransport, TokioChildProcess},
    RoleClient, ServiceError, ServiceExt,
};
use serde_json::{Map, Value};
use tokio::process::Command;

use super::error::{SessionError, SessionResult};
use super::transport::ToolTransport;
use crate::config::ProviderConfig;
use crate::logging::SharedLogger;
use crate::types::{ToolCallResult, ToolContent, ToolDescriptor};

/// How a provider script is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptKind {
    /// `.py`, run with the python interpreter
    Python,
    /// `.js`, run with the node runtime
    JavaScript,
}

impl ScriptKind {
    /// Classify a script by extension
    pub fn from_path(path: &Path) -> SessionResult<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("py") => Ok(ScriptKind::Python),
            Some("js") => Ok(ScriptKind::JavaScript),
            _ => Err(SessionError::UnsupportedScript {
                path: path.to_path_buf(),
            }),
        }
    }

    /// Interpreter command configured for this kind
    pub fn interpreter<'a>(&self, config: &'a ProviderConfig) -> &'a str {
        match self {
            ScriptKind::Python => &config.python_command,
            ScriptKind::JavaScript => &config.node_command,
        }
    }
}

/// Build the child command. Multi-word interpreters such as `uv run python`
/// are split on whitespace.
fn build_command(kind: ScriptKind, script: &Path, config: &ProviderConfig) -> SessionResult<Command> {
    let mut words = kind.interpreter(config).split_whitespace();
    let program = words.next().ok_or_else(|| {
        SessionError::Transport(format!("no interpreter configured for {:?} scripts", kind))
    })?;

    let mut command = Command::new(program);
    command
        .args(words)
        .arg(script)
        .envs(&config.env)
        .kill_on_drop(true);
    Ok(command)
}

fn client_info() -> ClientInfo {
    ClientInfo {
        meta: None,
        protocol_version: Default::default(),
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: "toolchat".to_string(),
            title: Some("toolchat".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            website_url: None,
            icons: None,
        },
    }
}

/// MCP client bound to one provider process
pub struct McpClient {
    /// The underlying rmcp running service; `None` once shut down
    client: Option<RunningService<RoleClient, ClientInfo>>,
    logger: SharedLogger,
}

impl McpClient {
    /// Spawn the provider script and perform the `initialize` handshake.
    ///
    /// If the handshake fails or times out, the half-started child is
    /// dropped, which kills it.
    pub async fn spawn_script(
        script: &Path,
        config: &ProviderConfig,
        logger: SharedLogger,
    ) -> SessionResult<Self> {
        let kind = ScriptKind::from_path(script)?;
        let command = build_command(kind, script, config)?;

        logger.info(&format!(
            "[McpClient] Launching provider: {} {}",
            kind.interpreter(config),
            script.display()
        ));

        let transport = TokioChildProcess::new(command)
            .map_err(|e| SessionError::Transport(format!("failed to spawn provider: {}", e)))?;

        Self::serve(transport, config.handshake_timeout, logger).await
    }

    /// Perform the `initialize` handshake over an already-open transport
    pub async fn serve<T, E, A>(
        transport: T,
        handshake_timeout: Duration,
        logger: SharedLogger,
    ) -> SessionResult<Self>
    where
        T: IntoTransport<RoleClient, E, A>,
        E: std::error::Error + Send + Sync + 'static,
    {
        let client = tokio::time::timeout(handshake_timeout, client_info().serve(transport))
            .await
            .map_err(|_| SessionError::Timeout {
                operation: "initialize",
                timeout: handshake_timeout,
            })?
            .map_err(|e| SessionError::Transport(format!("initialize failed: {}", e)))?;

        logger.info("[McpClient] Connected and initialized successfully");

        Ok(Self {
            client: Some(client),
            logger,
        })
    }

    fn running(&self) -> SessionResult<&RunningService<RoleClient, ClientInfo>> {
        self.client.as_ref().ok_or(SessionError::Closed)
    }
}

#[async_trait]
impl ToolTransport for McpClient {
    async fn list_tools(&self) -> SessionResult<Vec<ToolDescriptor>> {
        let tools = self
            .running()?
            .list_all_tools()
            .await
            .map_err(|e| map_service_error(None, e))?;

        self.logger
            .debug(&format!("[McpClient] Listed {} tools", tools.len()));

        Ok(tools.into_iter().map(descriptor_from_mcp).collect())
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> SessionResult<ToolCallResult> {
        self.logger.info(&format!("[McpClient] Calling tool: {}", name));

        let params = CallToolRequestParams {
            meta: None,
            name: name.to_owned().into(),
            arguments: Some(arguments),
            task: None,
        };

        self.running()?
            .call_tool(params)
            .await
            .map(|result| result_from_mcp(name, result))
            .map_err(|e| map_service_error(Some(name), e))
    }

    async fn shutdown(&mut self) -> SessionResult<()> {
        if let Some(client) = self.client.take() {
            self.logger.info("[McpClient] Closing connection");
            client
                .cancel()
                .await
                .map_err(|e| SessionError::Transport(e.to_string()))?;
        }
        Ok(())
    }

    fn server_name(&self) -> Option<String> {
        self.client
            .as_ref()
            .and_then(|client| client.peer_info())
            .map(|info| info.server_info.name.clone())
    }
}

/// A JSON-RPC error reply to a tool call means the tool failed on a healthy
/// channel. A closed or unwritable channel means the provider is gone.
fn map_service_error(tool: Option<&str>, error: ServiceError) -> SessionError {
    match (tool, error) {
        (Some(tool), ServiceError::McpError(err)) => SessionError::ToolExecution {
            tool: tool.to_string(),
            message: err.message.to_string(),
        },
        (_, error @ (ServiceError::TransportClosed | ServiceError::TransportSend(_))) => {
            SessionError::Disconnected(error.to_string())
        }
        (_, other) => SessionError::Transport(other.to_string()),
    }
}

fn descriptor_from_mcp(tool: Tool) -> ToolDescriptor {
    ToolDescriptor {
        name: tool.name.to_string(),
        description: tool.description.map(|d| d.to_string()).unwrap_or_default(),
        input_schema: Value::Object(tool.input_schema.as_ref().clone()),
    }
}

/// Text parts are joined with newlines; structured content is used only
/// when the provider sent no text at all.
fn result_from_mcp(name: &str, result: CallToolResult) -> ToolCallResult {
    let texts: Vec<String> = result
        .content
        .iter()
        .filter_map(|c| match &c.raw {
            RawContent::Text(t) => Some(t.text.clone()),
            _ => None,
        })
        .collect();

    let content = match (texts.is_empty(), result.structured_content) {
        (true, Some(value)) => ToolContent::Structured(value),
        _ => ToolContent::Text(texts.join("\n")),
    };

    ToolCallResult {
        tool_name: name.to_string(),
        content,
        success: !result.is_error.unwrap_or(false),
    }
}
