use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, info};

use super::list::{BoardsCommand, PostsCommand, ThreadsCommand};
use crate::api::ForumClient;
use crate::config::Config;
use crate::session::SessionStore;
use crate::tui;

/// forumterm - browse and post to a discussion forum from your terminal
#[derive(Parser)]
#[command(
    name = "forumterm",
    version,
    about = "Browse and post to a discussion forum from your terminal",
    long_about = r#"forumterm is a terminal client for a discussion forum REST API.
Without a subcommand it opens the interactive interface.

Examples:
  forumterm                                  # Start interactive mode
  forumterm --api-url https://forum.example/api
  forumterm boards                           # List boards
  forumterm threads 3 --page 2               # Second page of threads in board 3
  forumterm posts 42                         # First page of posts in thread 42"#
)]
pub struct Cli {
    /// Base URL of the forum API (overrides FORUMTERM_API_URL and config files)
    #[arg(long = "api-url", global = true)]
    pub api_url: Option<String>,

    /// Enable debug logging
    #[arg(short = 'd', long = "debug", global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List boards
    Boards(BoardsCommand),

    /// Print one page of threads from a board
    Threads(ThreadsCommand),

    /// Print one page of posts from a thread
    Posts(PostsCommand),
}

impl Cli {
    /// Whether this invocation takes over the terminal
    pub fn is_interactive(&self) -> bool {
        self.command.is_none()
    }

    /// Configuration with command line overrides applied
    pub async fn load_config(&self) -> Result<Config> {
        let mut config = Config::init().await?;
        if let Some(api_url) = &self.api_url {
            config.api_url = api_url.clone();
        }
        config.validate()?;
        Ok(config)
    }

    pub async fn execute(self, config: Config) -> Result<()> {
        if self.debug {
            debug!("Debug logging enabled");
        }

        let client = ForumClient::from_config(&config)
            .context("Failed to create the API client")?;
        debug!(api_url = client.base_url(), "Configuration initialized");

        match self.command {
            Some(Commands::Boards(cmd)) => cmd.execute(&client).await,
            Some(Commands::Threads(cmd)) => cmd.execute(&client, &config).await,
            Some(Commands::Posts(cmd)) => cmd.execute(&client, &config).await,
            None => {
                info!("Starting interactive mode");
                tui::run(config, client, SessionStore::new()).await?;
                info!("Application finished");
                Ok(())
            }
        }
    }
}
