//! Sage CLI - one-shot commands against the intelligence backend.
//!
//! ```text
//! main() -> Invocation::parse() -> SageConfig -> IntelligenceClient::connect()
//!                                               |
//!                                               v
//!                                   run(command) -> JSON on stdout
//! ```
//!
//! Logs and status notifications go to stderr so stdout stays machine-readable.

mod args;

use std::io::{IsTerminal, stderr};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use sage_config::SageConfig;
use sage_connector::{Endpoint, IntelligenceClient};
use sage_types::AnalysisDepth;
use serde_json::Value;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use args::{Command, Invocation};

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(stderr)
                .with_ansi(stderr().is_terminal())
                .with_target(false),
        )
        .with(env_filter)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let invocation = Invocation::parse();
    init_tracing();

    match run(invocation).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(invocation: Invocation) -> Result<()> {
    let config = SageConfig::load_or_default();
    let server_url = invocation
        .server_url
        .as_deref()
        .unwrap_or(&config.connector.server_url);
    let endpoint = Endpoint::parse(server_url)
        .with_context(|| format!("invalid server address '{server_url}'"))?;
    let depth = invocation
        .depth
        .map_or(config.analysis.depth, AnalysisDepth::from);

    let client = IntelligenceClient::new(endpoint);
    if config.notifications.enabled {
        client.on_status_change(|status| eprintln!("sage: {status}"));
    }

    client.connect().await?;
    let outcome = execute(&client, invocation.command, depth, invocation.limit).await;
    client.dispose().await;

    print_json(&outcome?)
}

async fn execute(
    client: &IntelligenceClient,
    command: Command,
    depth: AnalysisDepth,
    limit: usize,
) -> Result<Value> {
    let value = match command {
        Command::Health => Value::Bool(client.health_check().await),
        Command::Status => Value::Object(client.get_system_status().await),
        Command::Analyze { file } => serde_json::to_value(
            client
                .analyze_file(&file, depth)
                .await
                .with_context(|| format!("analysis of {file} failed"))?,
        )?,
        Command::Suggest { file } => {
            serde_json::to_value(client.file_suggestions(&file, depth).await)?
        }
        Command::Project { dir } => serde_json::to_value(
            client
                .analyze_project(&dir)
                .await
                .with_context(|| format!("analysis of project {dir} failed"))?,
        )?,
        Command::Commit { repository } => serde_json::to_value(
            client
                .generate_commit(repository.as_deref())
                .await
                .context("commit generation failed")?,
        )?,
        Command::Ask { question } => Value::String(
            client
                .ask_question(&question.join(" "), None)
                .await
                .context("no answer from the language model")?,
        ),
        Command::Similar { snippet } => serde_json::to_value(
            client
                .search_similar_code(&snippet.join(" "), limit)
                .await,
        )?,
    };
    Ok(value)
}

fn print_json(value: &Value) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
