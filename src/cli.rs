//! Command-line interface for strictly_arena.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Strictly Arena - authoritative chess server with matchmaking
#[derive(Parser, Debug)]
#[command(name = "strictly_arena")]
#[command(about = "Two-player chess game host and rating-based matchmaker", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Interface to bind to
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the game host (match sessions over WebSocket)
    Host {
        /// Port to bind to (overrides PORT_GAME)
        #[arg(short, long)]
        port: Option<u16>,

        /// Endpoint receiving finished games (overrides MATCH_LOG_URL)
        #[arg(long)]
        match_log_url: Option<String>,
    },

    /// Run the matchmaker, forwarding matches to a remote game host
    Matchmaker {
        /// Port to bind to (overrides PORT_MATCH)
        #[arg(short, long)]
        port: Option<u16>,

        /// Game host WebSocket URL (overrides GAME_HOST_URL)
        #[arg(long)]
        game_host_url: Option<String>,
    },

    /// Run the game host and the matchmaker in one process
    Standalone {
        /// Game host port (overrides PORT_GAME)
        #[arg(long)]
        game_port: Option<u16>,

        /// Matchmaker port (overrides PORT_MATCH)
        #[arg(long)]
        match_port: Option<u16>,

        /// Endpoint receiving finished games (overrides MATCH_LOG_URL)
        #[arg(long)]
        match_log_url: Option<String>,
    },
}
