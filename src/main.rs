use anyhow::Result;
use clap::Parser;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing::{debug, error};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod cli;
mod config;
mod session;
mod tui;
mod utils;
mod version;

use cli::Cli;
use config::Config;

#[tokio::main]
async fn main() {
    // Leave the terminal usable before reporting the panic
    std::panic::set_hook(Box::new(|panic_info| {
        tui::reset_terminal();
        error!("Application panicked: {}", panic_info);
        eprintln!("forumterm panicked: {}", panic_info);
        std::process::exit(1);
    }));

    let dotenv = dotenvy::dotenv();

    if let Err(e) = execute(dotenv.is_ok()).await {
        error!("Application error: {:#}", e);
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

async fn execute(dotenv_loaded: bool) -> Result<()> {
    let cli = Cli::parse();
    let config = cli.load_config().await?;

    init_logging(&config, cli.is_interactive(), cli.debug)?;
    if !dotenv_loaded {
        debug!("No .env file loaded");
    }
    match &config.source {
        Some(path) => debug!(path = %path.display(), "Loaded configuration file"),
        None => debug!("No configuration file found, using defaults and environment"),
    }

    cli.execute(config).await
}

/// Interactive mode owns the terminal, so logs go to a file there and to
/// stderr for the one-shot commands.
fn init_logging(config: &Config, interactive: bool, debug: bool) -> Result<()> {
    let default_level = if debug { "forumterm=debug" } else { "forumterm=info" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if interactive {
        let path = config.ensure_log_file()?;
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
    }

    Ok(())
}
