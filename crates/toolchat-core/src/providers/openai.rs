//! OpenAiClient - chat completions against any OpenAI-compatible endpoint

use std::sync::Arc;

use async_trait::async_trait;

use super::error::{CompletionError, ProviderResult};
use super::parse::classify;
use super::proto::{create_request, ChatCompletionResponse, ModelList};
use super::traits::CompletionClient;
use crate::config::EndpointConfig;
use crate::logging::SharedLogger;
use crate::types::{CompletionResult, Message, ToolDescriptor};

const PROVIDER: &str = "openai";

/// Completion client speaking the `/chat/completions` protocol
pub struct OpenAiClient {
    client: reqwest::Client,
    config: Arc<EndpointConfig>,
    model: Option<String>,
    logger: SharedLogger,
}

impl OpenAiClient {
    /// Build a client; every request is bounded by `config.timeout`.
    pub fn new(config: EndpointConfig, logger: SharedLogger) -> ProviderResult<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        let model = config.model.clone();
        Ok(Self {
            client,
            config: Arc::new(config),
            model,
            logger,
        })
    }

    /// Build a client and make sure it has a model, asking the endpoint
    /// when none is configured.
    pub async fn connect(config: EndpointConfig, logger: SharedLogger) -> ProviderResult<Self> {
        let mut client = Self::new(config, logger)?;
        if client.model.is_none() {
            let model = client.discover_model().await?;
            client.logger.info(&format!("[OpenAiClient] Using model: {}", model));
            client.model = Some(model);
        }
        Ok(client)
    }

    /// First model listed by `GET /models`
    pub async fn discover_model(&self) -> ProviderResult<String> {
        let response = self
            .client
            .get(self.url("models"))
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let body = self.check_status(response).await?;

        let models: ModelList = serde_json::from_str(&body).map_err(|e| {
            CompletionError::invalid_response(PROVIDER, format!("failed to parse model list: {}", e))
        })?;
        models
            .data
            .into_iter()
            .next()
            .map(|entry| entry.id)
            .ok_or_else(|| CompletionError::invalid_response(PROVIDER, "endpoint lists no models"))
    }

    /// Model sent with each request, once known
    pub fn model(&self) -> Option<&str> {
        self.model.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn map_send_error(&self, e: reqwest::Error) -> CompletionError {
        if e.is_timeout() {
            CompletionError::Timeout(self.config.timeout)
        } else {
            CompletionError::Http(e)
        }
    }

    /// Read the body, turning non-success statuses into errors
    async fn check_status(&self, response: reqwest::Response) -> ProviderResult<String> {
        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_send_error(e))?;
        if !status.is_success() {
            return Err(CompletionError::status(PROVIDER, status.as_u16(), body));
        }
        Ok(body)
    }
}

#[async_trait]
impl CompletionClient for OpenAiClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn complete(&self, messages: &[Message], tools: &[ToolDescriptor]) -> ProviderResult<CompletionResult> {
        let model = self
            .model
            .as_deref()
            .ok_or_else(|| CompletionError::Other("no model selected".to_string()))?;

        self.logger.debug(&format!(
            "[OpenAiClient] complete: model={}, messages={}, tools={}",
            model,
            messages.len(),
            tools.len()
        ));

        let request = create_request(model, messages, tools, self.config.tool_choice);
        let response = self
            .client
            .post(self.url("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.map_send_error(e))?;
        let body = self.check_status(response).await?;

        let parsed: ChatCompletionResponse = serde_json::from_str(&body).map_err(|e| {
            CompletionError::invalid_response(PROVIDER, format!("failed to parse response: {}", e))
        })?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::invalid_response(PROVIDER, "response has no choices"))?;

        let classified = classify(choice.message);
        if !classified.ignored_calls.is_empty() {
            self.logger.debug(&format!(
                "[OpenAiClient] Ignoring additional tool calls: {:?}",
                classified.ignored_calls
            ));
        }
        Ok(classified.result?)
    }
}
