//! InteractiveShell - line-oriented front end for an [`OrchestrationLoop`]

use std::io::{self, Write};

use tokio::io::{AsyncBufRead, AsyncBufReadExt};

use crate::orchestrator::OrchestrationLoop;
use crate::types::CancellationToken;

const QUIT: &str = "quit";

/// Why the shell stopped reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellExit {
    /// The user typed `quit`
    Quit,
    /// Input reached end of file
    EndOfInput,
    /// The cancellation token fired
    Cancelled,
}

/// Reads queries, runs each as one turn and prints the result.
///
/// Per-turn failures are printed as `Error: ...` and the prompt returns;
/// only I/O errors on the shell's own streams end the run early.
pub struct InteractiveShell<R, W> {
    input: R,
    output: W,
}

impl<R, W> InteractiveShell<R, W>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Give back the output stream
    pub fn into_output(self) -> W {
        self.output
    }

    pub async fn run(&mut self, chat: &mut OrchestrationLoop, cancel: &CancellationToken) -> io::Result<ShellExit> {
        writeln!(self.output, "\ntoolchat started")?;
        writeln!(self.output, "Type your queries or '{}' to exit.", QUIT)?;

        loop {
            if cancel.is_cancelled() {
                return Ok(ShellExit::Cancelled);
            }

            write!(self.output, "\nQuery: ")?;
            self.output.flush()?;

            let mut line = String::new();
            let read = match cancel.run_until_cancelled(self.input.read_line(&mut line)).await {
                Some(read) => read?,
                None => return Ok(ShellExit::Cancelled),
            };
            if read == 0 {
                return Ok(ShellExit::EndOfInput);
            }

            let query = line.trim();
            if query.is_empty() {
                continue;
            }
            if query.eq_ignore_ascii_case(QUIT) {
                return Ok(ShellExit::Quit);
            }

            let report = chat.run_turn(query, cancel).await;
            writeln!(self.output, "\n{}", report.render())?;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::logging::{NoOpLogger, SharedLogger};
    use crate::mcp::{MockToolOutcome, MockToolTransport, ProviderSession};
    use crate::orchestrator::LoopOptions;
    use crate::providers::{MockCompletionClient, MockReply};
    use crate::types::ToolDescriptor;

    fn chat(replies: Vec<MockReply>) -> OrchestrationLoop {
        let logger: SharedLogger = Arc::new(NoOpLogger::new());
        let transport = MockToolTransport::new(vec![ToolDescriptor::new("get_forecast", "Forecast")])
            .with_outcome("get_forecast", MockToolOutcome::Failure("NWS API unavailable".into()));
        let session = ProviderSession::with_transport(Box::new(transport), Duration::from_secs(5), logger.clone());
        let client = MockCompletionClient::new(replies, logger.clone());
        OrchestrationLoop::new(Box::new(client), session, LoopOptions::default(), logger)
    }

    async fn run(input: &str, chat: &mut OrchestrationLoop) -> (ShellExit, String) {
        let mut shell = InteractiveShell::new(input.as_bytes(), Vec::new());
        let exit = shell.run(chat, &CancellationToken::new()).await.unwrap();
        (exit, String::from_utf8(shell.into_output()).unwrap())
    }

    #[tokio::test]
    async fn test_quit_is_case_insensitive() {
        let mut chat = chat(vec![MockReply::text("Hello!")]);
        let (exit, output) = run("hi\n  QuIt \nnever read\n", &mut chat).await;

        assert_eq!(exit, ShellExit::Quit);
        assert!(output.starts_with("\ntoolchat started\nType your queries or 'quit' to exit.\n"));
        assert!(output.contains("\nQuery: \nHello!\n"));
        assert_eq!(output.matches("Query: ").count(), 2);
        chat.shutdown().await;
    }

    #[tokio::test]
    async fn test_end_of_input() {
        let mut chat = chat(vec![]);
        let (exit, _) = run("", &mut chat).await;
        assert_eq!(exit, ShellExit::EndOfInput);
        chat.shutdown().await;
    }

    #[tokio::test]
    async fn test_blank_lines_are_skipped() {
        let mut chat = chat(vec![MockReply::text("only once")]);
        let (exit, output) = run("\n   \nhello\n", &mut chat).await;

        assert_eq!(exit, ShellExit::EndOfInput);
        assert_eq!(output.matches("only once").count(), 1);
        chat.shutdown().await;
    }

    #[tokio::test]
    async fn test_turn_failure_keeps_prompting() {
        let mut chat = chat(vec![
            MockReply::tool_call("get_forecast", "{}"),
            MockReply::text("Still here."),
        ]);
        let (exit, output) = run("forecast?\nhello\nquit\n", &mut chat).await;

        assert_eq!(exit, ShellExit::Quit);
        assert!(output.contains("\nError: tool get_forecast failed: NWS API unavailable\n"));
        assert!(output.contains("\nStill here.\n"));
        chat.shutdown().await;
    }

    #[tokio::test]
    async fn test_cancelled_token_stops_shell() {
        let mut chat = chat(vec![]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let mut shell = InteractiveShell::new("hello\n".as_bytes(), Vec::new());
        let exit = shell.run(&mut chat, &cancel).await.unwrap();
        assert_eq!(exit, ShellExit::Cancelled);
        chat.shutdown().await;
    }
}
