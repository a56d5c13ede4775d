//! Strictly Arena - Unified CLI
//!
//! Chess game host and matchmaker, separately or in one process.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use std::sync::Arc;
use strictly_arena::{
    ArenaConfig, GameHost, GameHostLink, MatchCommandSink, Matchmaker, SessionRegistry,
    recorder_for,
};
use tracing::{info, instrument};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    initialize_tracing();

    let mut config = ArenaConfig::load(cli.config.as_deref())?;
    if let Some(host) = cli.host {
        config = config.with_bind_host(host);
    }

    match cli.command {
        Command::Host {
            port,
            match_log_url,
        } => {
            if let Some(port) = port {
                config = config.with_game_port(port);
            }
            if let Some(url) = match_log_url {
                config = config.with_match_log_url(url);
            }
            run_host(config).await
        }
        Command::Matchmaker {
            port,
            game_host_url,
        } => {
            if let Some(port) = port {
                config = config.with_match_port(port);
            }
            if let Some(url) = game_host_url {
                config = config.with_game_host_url(url);
            }
            run_matchmaker(config).await
        }
        Command::Standalone {
            game_port,
            match_port,
            match_log_url,
        } => {
            if let Some(port) = game_port {
                config = config.with_game_port(port);
            }
            if let Some(port) = match_port {
                config = config.with_match_port(port);
            }
            if let Some(url) = match_log_url {
                config = config.with_match_log_url(url);
            }
            run_standalone(config).await
        }
    }
}

fn initialize_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,strictly_arena=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn build_host(config: &ArenaConfig) -> GameHost {
    let registry = SessionRegistry::new(recorder_for(config.match_log_url().as_deref()));
    registry.spawn_cleanup(config.cleanup_interval());
    GameHost::new(registry)
}

/// Serve `app` on the configured interface until it fails.
async fn serve(config: &ArenaConfig, port: u16, app: axum::Router) -> Result<()> {
    let addr = format!("{}:{}", config.bind_host(), port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!(%addr, "Listening");
    axum::serve(listener, app).await?;
    Ok(())
}

/// Run the game host
#[instrument(skip_all, fields(port = config.game_port()))]
async fn run_host(config: ArenaConfig) -> Result<()> {
    info!("Starting game host");
    let host = build_host(&config);
    serve(&config, *config.game_port(), host.router()).await
}

/// Run the matchmaker against a remote game host
#[instrument(skip_all, fields(port = config.match_port(), game_host = %config.game_host_url()))]
async fn run_matchmaker(config: ArenaConfig) -> Result<()> {
    info!("Starting matchmaker");
    let link = GameHostLink::spawn(config.game_host_url().clone(), config.link_backoff());
    let sink: Arc<dyn MatchCommandSink> = Arc::new(link);
    let matchmaker = Matchmaker::new(config.matchmaking().clone(), sink);
    let _sweeps = matchmaker.start();
    serve(&config, *config.match_port(), matchmaker.router()).await
}

/// Run both roles in one process, creating matches in-process
#[instrument(skip_all, fields(game_port = config.game_port(), match_port = config.match_port()))]
async fn run_standalone(config: ArenaConfig) -> Result<()> {
    info!("Starting standalone arena");
    let host = build_host(&config);
    let sink: Arc<dyn MatchCommandSink> = Arc::new(host.clone());
    let matchmaker = Matchmaker::new(config.matchmaking().clone(), sink);
    let _sweeps = matchmaker.start();

    tokio::try_join!(
        serve(&config, *config.game_port(), host.router()),
        serve(&config, *config.match_port(), matchmaker.router()),
    )?;
    Ok(())
}
