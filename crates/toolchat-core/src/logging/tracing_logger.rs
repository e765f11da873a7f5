//! Logger that forwards to `tracing`

use super::traits::Logger;

/// Forwards every message to the `tracing` macros under the `toolchat` target.
///
/// The binary installs the subscriber; without one, messages are dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "toolchat", "{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "toolchat", "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "toolchat", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "toolchat", "{}", message);
    }
}
