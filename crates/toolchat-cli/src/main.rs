//! toolchat: chat with a model that can call the tools of an MCP provider script.
//!
//! ```sh
//! OPENAI_API_KEY=... OPENAI_BASE_URL=http://localhost:9004/v1 toolchat weather.py
//! ```
//!
//! Logs go to stderr (`RUST_LOG` controls them); stdout carries the
//! conversation.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::io::BufReader;
use toolchat_core::{
    CancellationToken, ConfigFile, InteractiveShell, OpenAiClient, OrchestrationLoop, ProviderSession,
    SharedLogger, ShellExit, TracingLogger,
};

#[derive(Parser)]
#[command(name = "toolchat", version, about = "Tool-augmented chat over MCP")]
struct Args {
    /// Tool provider script (`.py` or `.js`)
    script: PathBuf,

    /// Configuration file (defaults to <config dir>/toolchat/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "toolchat=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let result = runtime.block_on(run(args));

    // A pending stdin read holds a blocking thread that never finishes on its own.
    runtime.shutdown_timeout(Duration::from_millis(250));
    result
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config_path = args.config.unwrap_or_else(ConfigFile::default_path);
    let config = ConfigFile::load(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?
        .resolve_from_env()
        .context("invalid configuration")?;

    let logger: SharedLogger = Arc::new(TracingLogger::new());

    let client = OpenAiClient::connect(config.endpoint, logger.clone())
        .await
        .context("failed to reach the completion endpoint")?;
    let session = ProviderSession::connect(&args.script, &config.provider, logger.clone())
        .await
        .with_context(|| format!("failed to start tool provider {}", args.script.display()))?;

    let mut chat = OrchestrationLoop::new(Box::new(client), session, config.chat, logger);

    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            on_signal.cancel();
        }
    });

    let mut shell = InteractiveShell::new(BufReader::new(tokio::io::stdin()), std::io::stdout());
    let result = shell.run(&mut chat, &cancel).await;
    chat.shutdown().await;

    if let ShellExit::Cancelled = result? {
        tracing::info!(target: "toolchat", "Interrupted");
    }
    Ok(())
}
