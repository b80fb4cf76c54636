// ABOUTME: Entry point for aidm, a terminal client for an AI Dungeon Master server.
// ABOUTME: Parses CLI args, loads config, sets up file logging, and launches the app.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use aidm::app::App;
use aidm::config::{Config, Overrides};
use aidm::logging;

/// Chat with an AI Dungeon Master from the terminal.
#[derive(Parser)]
#[command(name = "aidm")]
#[command(version)]
struct Cli {
    /// Backend server address (http or https)
    #[arg(long, env = "AIDM_SERVER")]
    server: Option<String>,

    /// Campaign to play in
    #[arg(long, env = "AIDM_CAMPAIGN")]
    campaign: Option<i64>,

    /// Session to join; omit to chat without a session
    #[arg(long, env = "AIDM_SESSION")]
    session: Option<i64>,

    /// World id; looked up from the campaign when omitted
    #[arg(long, env = "AIDM_WORLD")]
    world: Option<i64>,

    /// Player sending the messages
    #[arg(long, env = "AIDM_PLAYER")]
    player: Option<i64>,

    /// Config file path (defaults to ~/.aidm/config.toml)
    #[arg(long, env = "AIDM_CONFIG")]
    config: Option<PathBuf>,

    /// Log level, e.g. info or aidm=debug
    #[arg(long, env = "AIDM_LOG_LEVEL")]
    log_level: Option<String>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            server: self.server.clone(),
            campaign_id: self.campaign,
            session_id: self.session,
            world_id: self.world,
            player_id: self.player,
            log_level: self.log_level.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.apply(&cli.overrides());
    let session = config
        .resolve_session()
        .context("incomplete session settings")?;

    let log_guard = logging::init(&config.logging)?;
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        log_file = %log_guard.path.display(),
        "aidm starting"
    );

    App::new(config, session).run().await
}
