//! Lifecycle of one connection to a tool provider

use std::path::Path;
use std::time::Duration;

use serde_json::{Map, Value};

use super::client::McpClient;
use super::error::{SessionError, SessionResult};
use super::transport::ToolTransport;
use crate::config::ProviderConfig;
use crate::logging::SharedLogger;
use crate::tools::ToolRegistry;
use crate::types::ToolCallResult;

/// A connected tool provider plus its cached tool registry.
///
/// Owned by exactly one `OrchestrationLoop`; concurrent conversations each
/// need their own session. Call [`ProviderSession::close`] on every exit
/// path. Dropping an open session still kills the child process, but skips
/// the orderly shutdown.
pub struct ProviderSession {
    transport: Option<Box<dyn ToolTransport>>,
    registry: Option<ToolRegistry>,
    call_timeout: Duration,
    logger: SharedLogger,
}

impl ProviderSession {
    /// Launch `script`, perform the handshake and fetch the tool catalog.
    ///
    /// Any failure releases whatever was acquired before returning.
    pub async fn connect(
        script: impl AsRef<Path>,
        config: &ProviderConfig,
        logger: SharedLogger,
    ) -> SessionResult<Self> {
        let client = McpClient::spawn_script(script.as_ref(), config, logger.clone()).await?;
        let mut session = Self::with_transport(Box::new(client), config.call_timeout, logger);

        let listed = session
            .refresh_tools()
            .await
            .map(|registry| registry.names().into_iter().map(str::to_string).collect::<Vec<_>>());

        match listed {
            Ok(names) => {
                let server = session.server_name().unwrap_or_else(|| "provider".to_string());
                session
                    .logger
                    .info(&format!("Connected to {} with tools: {:?}", server, names));
                Ok(session)
            }
            Err(e) => {
                session.close().await;
                Err(e)
            }
        }
    }

    /// Wrap an already-initialized transport
    pub fn with_transport(
        transport: Box<dyn ToolTransport>,
        call_timeout: Duration,
        logger: SharedLogger,
    ) -> Self {
        Self {
            transport: Some(transport),
            registry: None,
            call_timeout,
            logger,
        }
    }

    fn transport(&self) -> SessionResult<&dyn ToolTransport> {
        self.transport.as_deref().ok_or(SessionError::Closed)
    }

    /// The tool catalog, queried once and then served from cache
    pub async fn list_tools(&mut self) -> SessionResult<&ToolRegistry> {
        if self.registry.is_none() {
            return self.refresh_tools().await;
        }
        self.registry.as_ref().ok_or(SessionError::Closed)
    }

    /// Query the provider again and replace the cached catalog
    pub async fn refresh_tools(&mut self) -> SessionResult<&ToolRegistry> {
        let transport = self.transport()?;
        let listed = tokio::time::timeout(self.call_timeout, transport.list_tools())
            .await
            .map_err(|_| SessionError::Timeout {
                operation: "tools/list",
                timeout: self.call_timeout,
            })
            .and_then(|listed| listed);
        let tools = self.close_if_disconnected(listed).await?;

        let registry = ToolRegistry::from_tools(tools)
            .map_err(|e| SessionError::Transport(format!("malformed tool list: {}", e)))?;

        self.logger.debug(&format!(
            "[ProviderSession] Cached {} tools",
            registry.len()
        ));
        Ok(self.registry.insert(registry))
    }

    /// Last known catalog, if any
    pub fn registry(&self) -> Option<&ToolRegistry> {
        self.registry.as_ref()
    }

    /// Invoke `name` and wait for its result, bounded by the call timeout.
    ///
    /// Fails with `ToolNotFound` when `name` is not in the last known
    /// catalog and with `ToolExecution` when the provider reports failure.
    pub async fn call_tool(&mut self, name: &str, arguments: Map<String, Value>) -> SessionResult<ToolCallResult> {
        let registry = self.list_tools().await?;
        let Some(descriptor) = registry.get(name) else {
            return Err(SessionError::ToolNotFound(name.to_string()));
        };

        let missing = descriptor.missing_arguments(&arguments);
        if !missing.is_empty() {
            // The provider is the authority on its schema; let it reject the call.
            self.logger.warn(&format!(
                "[ProviderSession] Calling {} without required arguments {:?}",
                name, missing
            ));
        }

        let transport = self.transport()?;
        let called = tokio::time::timeout(self.call_timeout, transport.call_tool(name, arguments))
            .await
            .map_err(|_| SessionError::Timeout {
                operation: "tools/call",
                timeout: self.call_timeout,
            })
            .and_then(|called| called);
        let result = self.close_if_disconnected(called).await?;

        if !result.success {
            return Err(SessionError::ToolExecution {
                tool: name.to_string(),
                message: result.content.to_text(),
            });
        }
        Ok(result)
    }

    /// A dead channel cannot be reused, so the session releases it at once
    async fn close_if_disconnected<T>(&mut self, result: SessionResult<T>) -> SessionResult<T> {
        if let Err(e) = &result {
            if e.is_disconnected() {
                self.logger
                    .warn(&format!("[ProviderSession] {}; closing session", e));
                self.close().await;
            }
        }
        result
    }

    /// Name the provider reported during the handshake
    pub fn server_name(&self) -> Option<String> {
        self.transport.as_ref().and_then(|t| t.server_name())
    }

    pub fn is_closed(&self) -> bool {
        self.transport.is_none()
    }

    /// Release the provider process and channel. Idempotent; shutdown
    /// failures are logged, never returned.
    pub async fn close(&mut self) {
        self.registry = None;
        let Some(mut transport) = self.transport.take() else {
            return;
        };

        match transport.shutdown().await {
            Ok(()) => self.logger.info("[ProviderSession] Closed"),
            Err(e) => self
                .logger
                .warn(&format!("[ProviderSession] Error while closing: {}", e)),
        }
    }
}

impl Drop for ProviderSession {
    fn drop(&mut self) {
        if self.transport.is_some() {
            self.logger
                .warn("[ProviderSession] Dropped without close(); provider process will be killed");
        }
    }
}
