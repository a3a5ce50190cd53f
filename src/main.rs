mod app;
mod config;
mod conversation;
mod events;
mod llm;
mod prompts;
mod retry;
mod tui;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;

use crate::app::App;
use crate::config::Config;

#[derive(Parser)]
#[command(name = "askme")]
#[command(version = "0.1.0")]
#[command(about = "Terminal chat assistant for Vedaniti Technologies", long_about = None)]
struct Cli {}

#[tokio::main]
async fn main() -> Result<()> {
    let _cli = Cli::parse();

    let config = Config::load()?;
    init_logging()?;

    // The assistant refuses to start without a credential.
    let Some(api_key) = config.api_key() else {
        eprintln!(
            "⚠️ API key missing! Set {} or add groq_api_key to ~/.askme/config.toml.",
            config::API_KEY_ENV
        );
        std::process::exit(1);
    };

    tracing::info!(model = %config.model, "starting askme");

    let mut app = App::new(&config, api_key);
    app.run().await
}

/// Route logs to a file; the TUI owns the terminal.
fn init_logging() -> Result<()> {
    let log_path = Config::askme_home()?.join("askme.log");
    let log_file =
        std::fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false)
        .init();

    Ok(())
}
