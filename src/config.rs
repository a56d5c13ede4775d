//! Server configuration.
//!
//! Layered: built-in defaults, then an optional TOML file, then environment
//! variables, then command-line flags.

use crate::matchmaking::MatchmakingConfig;
use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Configuration for the game host and the matchmaker.
#[derive(Debug, Clone, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
pub struct ArenaConfig {
    /// Interface both servers bind to.
    #[serde(default = "default_bind_host")]
    bind_host: String,

    /// Game host port (`PORT_GAME`).
    #[serde(default = "default_game_port")]
    game_port: u16,

    /// Matchmaker port (`PORT_MATCH`).
    #[serde(default = "default_match_port")]
    match_port: u16,

    /// WebSocket URL the matchmaker uses to reach the game host (`GAME_HOST_URL`).
    #[serde(default = "default_game_host_url")]
    game_host_url: String,

    /// Endpoint receiving finished games (`MATCH_LOG_URL`). Logged only when unset.
    #[serde(default)]
    #[setters(strip_option)]
    match_log_url: Option<String>,

    /// Seconds between sweeps for sessions without connections.
    #[serde(default = "default_cleanup_interval_secs")]
    cleanup_interval_secs: u64,

    /// Milliseconds to wait before reconnecting to the game host.
    #[serde(default = "default_link_backoff_ms")]
    link_backoff_ms: u64,

    /// Tolerance schedule and sweep cadence.
    #[serde(default)]
    matchmaking: MatchmakingConfig,
}

fn default_bind_host() -> String {
    "0.0.0.0".to_string()
}

fn default_game_port() -> u16 {
    8080
}

fn default_match_port() -> u16 {
    8081
}

fn default_game_host_url() -> String {
    format!("ws://127.0.0.1:{}/ws", default_game_port())
}

fn default_cleanup_interval_secs() -> u64 {
    300
}

fn default_link_backoff_ms() -> u64 {
    3000
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            bind_host: default_bind_host(),
            game_port: default_game_port(),
            match_port: default_match_port(),
            game_host_url: default_game_host_url(),
            match_log_url: None,
            cleanup_interval_secs: default_cleanup_interval_secs(),
            link_backoff_ms: default_link_backoff_ms(),
            matchmaking: MatchmakingConfig::default(),
        }
    }
}

impl ArenaConfig {
    /// Loads configuration from a TOML file. Missing keys take defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(
            game_port = config.game_port,
            match_port = config.match_port,
            "Config loaded successfully"
        );
        Ok(config)
    }

    /// Defaults, or the file at `path` when given; then the process environment.
    #[instrument]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        base.apply_env()
    }

    /// Overrides fields from the process environment.
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Overrides fields from `lookup`: `PORT_GAME`, `PORT_MATCH`,
    /// `GAME_HOST_URL` and `MATCH_LOG_URL`. Empty values are ignored.
    pub fn apply_env_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(port) = var("PORT_GAME") {
            self.game_port = parse_port("PORT_GAME", &port)?;
        }
        if let Some(port) = var("PORT_MATCH") {
            self.match_port = parse_port("PORT_MATCH", &port)?;
        }
        if let Some(url) = var("GAME_HOST_URL") {
            self.game_host_url = url;
        }
        if let Some(url) = var("MATCH_LOG_URL") {
            self.match_log_url = Some(url);
        }
        Ok(self)
    }

    /// Interval between idle-session sweeps.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_secs)
    }

    /// Delay before the matchmaker reconnects to the game host.
    pub fn link_backoff(&self) -> Duration {
        Duration::from_millis(self.link_backoff_ms)
    }
}

// A closure would hide the caller's location from `ConfigError::new`.
#[track_caller]
fn parse_port(key: &str, value: &str) -> Result<u16, ConfigError> {
    match value.trim().parse() {
        Ok(port) => Ok(port),
        Err(e) => Err(ConfigError::new(format!(
            "Invalid {} '{}': {}",
            key, value, e
        ))),
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error at the caller's location.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
