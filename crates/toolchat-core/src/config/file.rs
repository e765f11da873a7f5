//! File-based configuration (YAML) with environment overrides
//!
//! Default location: `<config_dir>/toolchat/config.yaml`
//! (`~/.config/toolchat/config.yaml` on Linux).
//!
//! ```yaml
//! endpoint:
//!   base_url: http://localhost:9004/v1
//!   api_key: dummy
//!   model: meta-llama/Llama-3.1-8B-Instruct
//! provider:
//!   python_command: uv run python
//!   call_timeout_secs: 30
//! chat:
//!   system_prompt: You are a helpful and friendly climate expert.
//!   history: persist
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};
use super::settings::{
    ChatConfig, EndpointConfig, ProviderConfig, DEFAULT_BASE_URL, DEFAULT_CALL_TIMEOUT,
    DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_REQUEST_TIMEOUT,
};
use crate::orchestrator::{HistoryPolicy, LoopOptions, ToolCallStyle};
use crate::types::ToolChoice;

/// Environment variables consulted for each overridable setting, in order
const BASE_URL_VARS: &[&str] = &["TOOLCHAT_BASE_URL", "OPENAI_BASE_URL"];
const API_KEY_VARS: &[&str] = &["TOOLCHAT_API_KEY", "OPENAI_API_KEY"];
const MODEL_VARS: &[&str] = &["TOOLCHAT_MODEL", "OPENAI_MODEL"];

/// Configuration file structure. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub endpoint: EndpointSection,
    pub provider: ProviderSection,
    pub chat: ChatSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointSection {
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
    pub tool_choice: Option<ToolChoice>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSection {
    pub python_command: Option<String>,
    pub node_command: Option<String>,
    pub env: BTreeMap<String, String>,
    pub handshake_timeout_secs: Option<u64>,
    pub call_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSection {
    pub system_prompt: Option<String>,
    pub history: Option<HistoryPolicy>,
    pub tool_call_style: Option<ToolCallStyle>,
}

impl ConfigFile {
    /// User-level config path
    pub fn default_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")).join(".config"));
        config_dir.join("toolchat").join("config.yaml")
    }

    /// Load from `path`; a missing file yields the empty config
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Parse YAML text; an empty document yields the empty config
    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply overrides from the process environment and validate
    pub fn resolve_from_env(self) -> ConfigResult<ChatConfig> {
        self.resolve(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `env` and validate.
    ///
    /// Environment values win over file values; empty values are ignored.
    pub fn resolve<F>(self, env: F) -> ConfigResult<ChatConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |vars: &[&str]| {
            vars.iter()
                .filter_map(|var| env(*var))
                .find(|value| !value.trim().is_empty())
        };
        let non_empty = |value: Option<String>| value.filter(|v| !v.trim().is_empty());

        let base_url = lookup(BASE_URL_VARS)
            .or(non_empty(self.endpoint.base_url))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::invalid(
                "endpoint.base_url",
                format!("expected an http(s) URL, got {:?}", base_url),
            ));
        }

        let api_key = lookup(API_KEY_VARS)
            .or(non_empty(self.endpoint.api_key))
            .ok_or_else(|| {
                ConfigError::Missing(format!(
                    "endpoint.api_key (or one of {})",
                    API_KEY_VARS.join(", ")
                ))
            })?;

        let mut endpoint = EndpointConfig::new(base_url, api_key).with_timeout(seconds(
            "endpoint.timeout_secs",
            self.endpoint.timeout_secs,
            DEFAULT_REQUEST_TIMEOUT,
        )?);
        endpoint.model = lookup(MODEL_VARS).or(non_empty(self.endpoint.model));
        endpoint.tool_choice = self.endpoint.tool_choice.unwrap_or_default();

        let defaults = ProviderConfig::default();
        let provider = ProviderConfig {
            python_command: non_empty(self.provider.python_command).unwrap_or(defaults.python_command),
            node_command: non_empty(self.provider.node_command).unwrap_or(defaults.node_command),
            env: self.provider.env,
            handshake_timeout: seconds(
                "provider.handshake_timeout_secs",
                self.provider.handshake_timeout_secs,
                DEFAULT_HANDSHAKE_TIMEOUT,
            )?,
            call_timeout: seconds(
                "provider.call_timeout_secs",
                self.provider.call_timeout_secs,
                DEFAULT_CALL_TIMEOUT,
            )?,
        };

        let chat = LoopOptions {
            system_prompt: non_empty(self.chat.system_prompt),
            history: self.chat.history.unwrap_or_default(),
            tool_call_style: self.chat.tool_call_style.unwrap_or_default(),
            completion_timeout: endpoint.timeout,
        };

        Ok(ChatConfig {
            endpoint,
            provider,
            chat,
        })
    }
}

fn seconds(field: &str, value: Option<u64>, default: Duration) -> ConfigResult<Duration> {
    match value {
        None => Ok(default),
        Some(0) => Err(ConfigError::invalid(field, "must be greater than zero")),
        Some(secs) => Ok(Duration::from_secs(secs)),
    }
}
