//! OrchestrationLoop - one query at a time through model and tool provider

use crate::logging::SharedLogger;
use crate::mcp::{ProviderSession, SessionError};
use crate::providers::{CompletionClient, CompletionError};
use crate::tools::render_tool_prompt;
use crate::types::{CancellationToken, CompletionResult, Message, ToolDescriptor};

use super::options::{HistoryPolicy, LoopOptions, ToolCallStyle};
use super::turn::{TurnError, TurnOutcome, TurnReport, TurnState};

/// Drives queries through the completion client and the tool provider.
///
/// Owns its [`ProviderSession`] exclusively. Steps of a turn never overlap;
/// each suspension point is bounded by a timeout.
pub struct OrchestrationLoop {
    client: Box<dyn CompletionClient>,
    session: ProviderSession,
    options: LoopOptions,
    history: Vec<Message>,
    logger: SharedLogger,
}

/// Messages a successful turn contributes to the history
type Exchange = (TurnOutcome, Vec<Message>);

impl OrchestrationLoop {
    pub fn new(
        client: Box<dyn CompletionClient>,
        session: ProviderSession,
        options: LoopOptions,
        logger: SharedLogger,
    ) -> Self {
        Self {
            client,
            session,
            options,
            history: Vec::new(),
            logger,
        }
    }

    pub fn options(&self) -> &LoopOptions {
        &self.options
    }

    /// Messages retained from earlier turns (always empty under `Discard`)
    pub fn history(&self) -> &[Message] {
        &self.history
    }

    pub fn session(&self) -> &ProviderSession {
        &self.session
    }

    pub fn session_mut(&mut self) -> &mut ProviderSession {
        &mut self.session
    }

    /// Answer one query. Failures are reported in the outcome and the loop
    /// accepts the next query. After a provider disconnect the session is
    /// closed, so later turns fail at the catalog step.
    pub async fn run_turn(&mut self, query: &str, cancel: &CancellationToken) -> TurnReport {
        let mut states = vec![TurnState::AwaitingQuery];

        let result = cancel
            .run_until_cancelled(self.drive(query, &mut states))
            .await
            .unwrap_or(Err(TurnError::Cancelled));
        states.push(TurnState::Done);

        let outcome = match result {
            Ok((outcome, messages)) => {
                if self.options.history == HistoryPolicy::Persist && outcome.is_answer() {
                    self.history.extend(messages);
                }
                outcome
            }
            Err(e) => {
                let line = format!("[OrchestrationLoop] Turn failed: {}", e);
                if e.ends_session() {
                    self.logger.error(&line);
                } else if e.is_recoverable() {
                    self.logger.info(&line);
                } else {
                    self.logger.warn(&line);
                }
                TurnOutcome::Failed(e)
            }
        };

        TurnReport { outcome, states }
    }

    /// Close the tool provider session
    pub async fn shutdown(&mut self) {
        self.session.close().await;
    }

    async fn drive(&mut self, query: &str, states: &mut Vec<TurnState>) -> Result<Exchange, TurnError> {
        let query_message = Message::user(query);

        states.push(TurnState::BuildingCatalog);
        let tools: Vec<ToolDescriptor> = self
            .session
            .list_tools()
            .await
            .map_err(TurnError::Catalog)?
            .descriptors()
            .to_vec();

        let mut messages = self.preamble();
        messages.push(query_message.clone());
        let offered: &[ToolDescriptor] = match self.options.tool_call_style {
            ToolCallStyle::Native => &tools,
            ToolCallStyle::Prompted => {
                messages.push(Message::user(render_tool_prompt(&tools)));
                &[]
            }
        };

        states.push(TurnState::AwaitingCompletion);
        let request = match self.complete(&messages, offered).await? {
            CompletionResult::FinalAnswer(text) => {
                let answer = Message::assistant(text.as_str());
                return Ok((TurnOutcome::Answer(text), vec![query_message, answer]));
            }
            CompletionResult::ToolInvocation(request) => request,
        };

        states.push(TurnState::ExecutingTool);
        let shown_args = request.arguments_value().to_string();
        self.logger.info(&format!(
            "[OrchestrationLoop] Calling tool {} with args {}",
            request.tool_name, shown_args
        ));

        let result = match self
            .session
            .call_tool(&request.tool_name, request.arguments.clone())
            .await
        {
            Ok(result) => result,
            Err(SessionError::ToolExecution { tool, message }) => {
                return Ok((TurnOutcome::ToolFailed { tool, message }, Vec::new()));
            }
            Err(SessionError::ToolNotFound(tool)) => {
                let message = "not offered by the tool provider".to_string();
                return Ok((TurnOutcome::ToolFailed { tool, message }, Vec::new()));
            }
            Err(e) => return Err(TurnError::Provider(e)),
        };

        // Tool output goes back as user content, not as an assistant turn.
        let tool_message = Message::user(result.content.to_text());
        let mut follow_up = self.preamble();
        follow_up.push(query_message.clone());
        follow_up.push(tool_message.clone());

        states.push(TurnState::AwaitingFinalCompletion);
        let answer = match self.complete(&follow_up, &[]).await? {
            CompletionResult::FinalAnswer(text) => text,
            CompletionResult::ToolInvocation(chained) => {
                return Err(TurnError::ChainedToolCall(chained.tool_name));
            }
        };

        let rendered = format!(
            "[Calling tool {} with args {}]\n{}",
            request.tool_name, shown_args, answer
        );
        Ok((
            TurnOutcome::Answer(rendered),
            vec![query_message, tool_message, Message::assistant(answer)],
        ))
    }

    /// System prompt followed by retained history
    fn preamble(&self) -> Vec<Message> {
        self.options
            .system_prompt
            .iter()
            .map(|prompt| Message::system(prompt.as_str()))
            .chain(self.history.iter().cloned())
            .collect()
    }

    async fn complete(&self, messages: &[Message], tools: &[ToolDescriptor]) -> Result<CompletionResult, TurnError> {
        self.logger.debug(&format!(
            "[OrchestrationLoop] Requesting completion from {} ({} messages, {} tools)",
            self.client.name(),
            messages.len(),
            tools.len()
        ));
        let timeout = self.options.completion_timeout;
        let result = tokio::time::timeout(timeout, self.client.complete(messages, tools))
            .await
            .map_err(|_| CompletionError::Timeout(timeout))??;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::logging::NoOpLogger;
    use crate::mcp::{MockToolOutcome, MockToolTransport, MockTransportStats};
    use crate::providers::{MockCompletionClient, MockCompletionLog, MockReply};
    use crate::types::MessageRole;

    fn weather_tools() -> Vec<ToolDescriptor> {
        vec![
            ToolDescriptor::new("get_alerts", "Get weather alerts for a US state").with_schema(json!({
                "type": "object",
                "properties": { "state": { "type": "string" } },
                "required": ["state"]
            })),
            ToolDescriptor::new("get_forecast", "Get weather forecast for a location"),
        ]
    }

    struct Harness {
        chat: OrchestrationLoop,
        requests: Arc<MockCompletionLog>,
        provider: Arc<MockTransportStats>,
    }

    fn harness(replies: Vec<MockReply>, transport: MockToolTransport, options: LoopOptions) -> Harness {
        let logger: SharedLogger = Arc::new(NoOpLogger::new());
        let client = MockCompletionClient::new(replies, logger.clone());
        let requests = client.log();
        let provider = transport.stats();
        let session = ProviderSession::with_transport(Box::new(transport), Duration::from_secs(5), logger.clone());
        Harness {
            chat: OrchestrationLoop::new(Box::new(client), session, options, logger),
            requests,
            provider,
        }
    }

    fn weather(replies: Vec<MockReply>) -> Harness {
        let transport = MockToolTransport::new(weather_tools())
            .with_outcome("get_alerts", MockToolOutcome::Text("No active alerts for CA".into()));
        harness(replies, transport, LoopOptions::default())
    }

    #[tokio::test]
    async fn test_direct_answer() {
        let mut h = weather(vec![MockReply::text("Hello!")]);

        let report = h.chat.run_turn("hi", &CancellationToken::new()).await;
        assert_eq!(report.render(), "Hello!");
        assert_eq!(
            report.states,
            vec![
                TurnState::AwaitingQuery,
                TurnState::BuildingCatalog,
                TurnState::AwaitingCompletion,
                TurnState::Done
            ]
        );

        let requests = h.requests.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].tools, weather_tools());
        assert_eq!(requests[0].messages, vec![Message::user("hi")]);
        h.chat.shutdown().await;
    }

    #[tokio::test]
    async fn test_tool_round_trip() {
        let mut h = weather(vec![
            MockReply::tool_call("get_alerts", r#"{"state": "CA"}"#),
            MockReply::text("There are no active alerts in California."),
        ]);

        let report = h.chat.run_turn("Any weather alerts in CA?", &CancellationToken::new()).await;
        assert_eq!(
            report.render(),
            "[Calling tool get_alerts with args {\"state\":\"CA\"}]\nThere are no active alerts in California."
        );
        assert_eq!(
            report.states,
            vec![
                TurnState::AwaitingQuery,
                TurnState::BuildingCatalog,
                TurnState::AwaitingCompletion,
                TurnState::ExecutingTool,
                TurnState::AwaitingFinalCompletion,
                TurnState::Done
            ]
        );

        let calls = h.provider.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "get_alerts");
        assert_eq!(calls[0].1["state"], json!("CA"));

        let requests = h.requests.requests();
        assert_eq!(requests.len(), 2);
        let follow_up = &requests[1];
        assert!(follow_up.tools.is_empty());
        let last = follow_up.messages.last().unwrap();
        assert_eq!(last.role, MessageRole::User);
        assert_eq!(last.text(), Some("No active alerts for CA"));
        assert_eq!(follow_up.messages[0], Message::user("Any weather alerts in CA?"));
        h.chat.shutdown().await;
    }

    #[tokio::test]
    async fn test_structured_tool_result_is_json_text() {
        let transport = MockToolTransport::new(weather_tools())
            .with_outcome("get_forecast", MockToolOutcome::Structured(json!({"temp": 19})));
        let mut h = harness(
            vec![MockReply::tool_call("get_forecast", "{}"), MockReply::text("19 degrees")],
            transport,
            LoopOptions::default(),
        );

        let report = h.chat.run_turn("forecast?", &CancellationToken::new()).await;
        assert!(report.outcome.is_answer());
        let requests = h.requests.requests();
        assert_eq!(requests[1].messages.last().unwrap().text(), Some(r#"{"temp":19}"#));
        h.chat.shutdown().await;
    }

    #[tokio::test]
    async fn test_only_first_tool_call_executes() {
        let mut h = weather(vec![
            MockReply::ToolCalls(vec![
                ("get_alerts".into(), r#"{"state": "CA"}"#.into()),
                ("get_forecast".into(), r#"{"latitude": 38.5}"#.into()),
            ]),
            MockReply::text("done"),
        ]);

        let report = h.chat.run_turn("weather?", &CancellationToken::new()).await;
        assert!(report.outcome.is_answer());
        let names: Vec<String> = h.provider.calls().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["get_alerts".to_string()]);
        h.chat.shutdown().await;
    }

    #[tokio::test]
    async fn test_tool_failure_is_reported_and_loop_continues() {
        let transport = MockToolTransport::new(weather_tools())
            .with_outcome("get_forecast", MockToolOutcome::Failure("NWS API unavailable".into()));
        let mut h = harness(
            vec![
                MockReply::tool_call("get_forecast", r#"{"latitude": 38.5, "longitude": -121.4}"#),
                MockReply::text("Still here."),
            ],
            transport,
            LoopOptions::default(),
        );
        let cancel = CancellationToken::new();

        let report = h.chat.run_turn("forecast for Sacramento", &cancel).await;
        match &report.outcome {
            TurnOutcome::ToolFailed { tool, message } => {
                assert_eq!(tool, "get_forecast");
                assert_eq!(message, "NWS API unavailable");
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(report.render().contains("failed"));
        assert_eq!(h.requests.len(), 1, "no retry and no follow-up completion");

        let next = h.chat.run_turn("hello?", &cancel).await;
        assert_eq!(next.render(), "Still here.");
        h.chat.shutdown().await;
    }

    #[tokio::test]
    async fn test_unknown_tool_is_reported() {
        let mut h = weather(vec![MockReply::tool_call("get_weather", r#"{"city": "Langebaan"}"#)]);

        let report = h.chat.run_turn("weather in Langebaan", &CancellationToken::new()).await;
        assert!(matches!(
            report.outcome,
            TurnOutcome::ToolFailed { ref tool, .. } if tool == "get_weather"
        ));
        assert!(h.provider.calls().is_empty());
        h.chat.shutdown().await;
    }

    #[tokio::test]
    async fn test_malformed_tool_call_is_reported() {
        let mut h = weather(vec![
            MockReply::text("<function=foo>not-json</function>"),
            MockReply::text("recovered"),
        ]);
        let cancel = CancellationToken::new();

        let report = h.chat.run_turn("hi", &cancel).await;
        assert!(matches!(
            report.outcome,
            TurnOutcome::Failed(TurnError::Completion(CompletionError::MalformedToolCall(_)))
        ));
        assert!(report.render().starts_with("Error: could not parse arguments for tool call `foo`"));

        assert_eq!(h.chat.run_turn("again", &cancel).await.render(), "recovered");
        h.chat.shutdown().await;
    }

    #[tokio::test]
    async fn test_catalog_failure_aborts_turn() {
        let transport = MockToolTransport::new(weather_tools()).with_list_error("provider went away");
        let mut h = harness(vec![MockReply::text("unused")], transport, LoopOptions::default());

        let report = h.chat.run_turn("hi", &CancellationToken::new()).await;
        assert!(matches!(report.outcome, TurnOutcome::Failed(TurnError::Catalog(_))));
        assert_eq!(
            report.states,
            vec![TurnState::AwaitingQuery, TurnState::BuildingCatalog, TurnState::Done]
        );
        assert!(h.requests.is_empty());
        h.chat.shutdown().await;
    }

    #[tokio::test]
    async fn test_disconnected_provider_is_released() {
        let transport = MockToolTransport::new(weather_tools()).with_outcome(
            "get_alerts",
            MockToolOutcome::Disconnected("connection closed: EOF".into()),
        );
        let mut h = harness(
            vec![
                MockReply::tool_call("get_alerts", r#"{"state": "CA"}"#),
                MockReply::tool_call("get_alerts", r#"{"state": "NY"}"#),
            ],
            transport,
            LoopOptions::default(),
        );
        let cancel = CancellationToken::new();

        let report = h.chat.run_turn("Alerts in CA?", &cancel).await;
        assert!(matches!(
            report.outcome,
            TurnOutcome::Failed(TurnError::Provider(SessionError::Disconnected(_)))
        ));
        assert!(h.chat.session().is_closed());
        assert_eq!(h.provider.shutdowns(), 1);

        let next = h.chat.run_turn("Alerts in NY?", &cancel).await;
        assert!(matches!(
            next.outcome,
            TurnOutcome::Failed(TurnError::Catalog(SessionError::Closed))
        ));
        assert_eq!(h.provider.calls().len(), 1);
        assert_eq!(h.requests.len(), 1, "no completion without a catalog");

        h.chat.shutdown().await;
        assert_eq!(h.provider.shutdowns(), 1);
    }

    #[tokio::test]
    async fn test_chained_tool_call_is_not_executed() {
        let mut h = weather(vec![
            MockReply::tool_call("get_alerts", r#"{"state": "CA"}"#),
            MockReply::tool_call("get_forecast", "{}"),
        ]);

        let report = h.chat.run_turn("alerts then forecast", &CancellationToken::new()).await;
        assert!(matches!(
            report.outcome,
            TurnOutcome::Failed(TurnError::ChainedToolCall(ref name)) if name == "get_forecast"
        ));
        assert_eq!(h.provider.calls().len(), 1);
        h.chat.shutdown().await;
    }

    #[tokio::test]
    async fn test_completion_error_is_reported() {
        let mut h = weather(vec![MockReply::Error("overloaded".into())]);

        let report = h.chat.run_turn("hi", &CancellationToken::new()).await;
        assert!(report.render().starts_with("Error: "));
        assert!(report.render().contains("overloaded"));
        h.chat.shutdown().await;
    }

    #[tokio::test]
    async fn test_prompted_style() {
        let transport = MockToolTransport::new(weather_tools())
            .with_outcome("get_alerts", MockToolOutcome::Text("No active alerts for CA".into()));
        let options = LoopOptions::default()
            .with_system_prompt("You are a helpful assistant.")
            .with_tool_call_style(ToolCallStyle::Prompted);
        let mut h = harness(
            vec![
                MockReply::text(r#"<function=get_alerts>{"state": "CA"}</function>"#),
                MockReply::text("No alerts."),
            ],
            transport,
            options,
        );

        let report = h.chat.run_turn("Any alerts in CA?", &CancellationToken::new()).await;
        assert!(report.render().ends_with("No alerts."));

        let requests = h.requests.requests();
        let first = &requests[0];
        assert!(first.tools.is_empty());
        assert_eq!(first.messages.len(), 3);
        assert_eq!(first.messages[0].role, MessageRole::System);
        assert_eq!(first.messages[1], Message::user("Any alerts in CA?"));
        let tool_prompt = first.messages[2].text().unwrap();
        assert!(tool_prompt.contains("get_alerts"));
        assert!(tool_prompt.contains("<function="));

        assert_eq!(requests[1].messages.len(), 3);
        assert_eq!(h.provider.calls().len(), 1);
        h.chat.shutdown().await;
    }

    #[tokio::test]
    async fn test_history_discarded_by_default() {
        let mut h = weather(vec![MockReply::text("one"), MockReply::text("two")]);
        let cancel = CancellationToken::new();

        h.chat.run_turn("first", &cancel).await;
        h.chat.run_turn("second", &cancel).await;

        assert!(h.chat.history().is_empty());
        assert_eq!(h.requests.requests()[1].messages, vec![Message::user("second")]);
        h.chat.shutdown().await;
    }

    #[tokio::test]
    async fn test_history_persisted() {
        let transport = MockToolTransport::new(weather_tools())
            .with_outcome("get_alerts", MockToolOutcome::Text("No active alerts for CA".into()));
        let options = LoopOptions::default().with_history(HistoryPolicy::Persist);
        let mut h = harness(
            vec![
                MockReply::tool_call("get_alerts", r#"{"state": "CA"}"#),
                MockReply::text("No alerts in CA."),
                MockReply::Error("down".into()),
                MockReply::text("You asked about CA."),
            ],
            transport,
            options,
        );
        let cancel = CancellationToken::new();

        h.chat.run_turn("Alerts in CA?", &cancel).await;
        assert_eq!(
            h.chat.history(),
            &[
                Message::user("Alerts in CA?"),
                Message::user("No active alerts for CA"),
                Message::assistant("No alerts in CA."),
            ]
        );

        let failed = h.chat.run_turn("lost", &cancel).await;
        assert!(!failed.outcome.is_answer());
        assert_eq!(h.chat.history().len(), 3, "failed turns leave history alone");

        h.chat.run_turn("What did I ask?", &cancel).await;
        let last = h.requests.requests().pop().unwrap();
        assert_eq!(last.messages.len(), 4);
        assert_eq!(last.messages[3], Message::user("What did I ask?"));
        assert_eq!(h.chat.history().len(), 5);
        h.chat.shutdown().await;
    }

    #[tokio::test]
    async fn test_cancelled_before_start() {
        let mut h = weather(vec![MockReply::text("unused")]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = h.chat.run_turn("hi", &cancel).await;
        assert!(matches!(report.outcome, TurnOutcome::Failed(TurnError::Cancelled)));
        assert!(h.requests.is_empty());
        h.chat.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_mid_completion() {
        let mut h = weather(vec![MockReply::text("slow").delayed(Duration::from_secs(30))]);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        });

        let report = h.chat.run_turn("hi", &cancel).await;
        assert!(matches!(report.outcome, TurnOutcome::Failed(TurnError::Cancelled)));
        assert_eq!(report.states.last(), Some(&TurnState::Done));

        h.chat.shutdown().await;
        assert!(h.chat.session().is_closed());
        assert_eq!(h.provider.shutdowns(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_timeout() {
        let options = LoopOptions::default().with_completion_timeout(Duration::from_secs(5));
        let transport = MockToolTransport::new(weather_tools());
        let mut h = harness(
            vec![MockReply::text("too late").delayed(Duration::from_secs(120))],
            transport,
            options,
        );

        let report = h.chat.run_turn("hi", &CancellationToken::new()).await;
        assert!(matches!(
            report.outcome,
            TurnOutcome::Failed(TurnError::Completion(CompletionError::Timeout(_)))
        ));
        h.chat.shutdown().await;
    }
}
