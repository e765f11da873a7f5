//! Configuration
//!
//! All external settings are collected here and validated once at startup:
//! - `ConfigFile`: YAML file (user level), every field optional
//! - `ChatConfig`: validated result handed to the core components

mod error;
mod file;
mod settings;

pub use error::{ConfigError, ConfigResult};
pub use file::{ChatSection, ConfigFile, EndpointSection, ProviderSection};
pub use settings::{
    ChatConfig, EndpointConfig, ProviderConfig, DEFAULT_BASE_URL, DEFAULT_CALL_TIMEOUT,
    DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_REQUEST_TIMEOUT,
};
