//! Strictly Arena library - authoritative two-player chess server
//!
//! Validates every move against the chess rules, keeps per-match state,
//! keeps both players' clients in sync over WebSockets, and pairs waiting
//! players by rating.
//!
//! # Architecture
//!
//! - **Session**: one match's board, turn, log and bound connections
//! - **Registry**: live sessions by match id, with periodic cleanup
//! - **Host**: routes client frames to sessions (`JOIN_GAME`, `TURN_MOVE`, `GAME_START`)
//! - **Matchmaking**: rating queue with wait-widened tolerance and a resilient
//!   link to the game host
//! - **Recorder**: reports finished games to the match-log service
//!
//! # Example
//!
//! ```no_run
//! use strictly_arena::{GameHost, LogOnlyRecorder, SessionRegistry};
//! use std::sync::Arc;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let registry = SessionRegistry::new(Arc::new(LogOnlyRecorder));
//! let app = GameHost::new(registry).router();
//! let listener = tokio::net::TcpListener::bind("127.0.0.1:8080").await?;
//! axum::serve(listener, app).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod connection;
mod host;
mod matchmaking;
mod protocol;
mod recorder;
mod registry;
mod session;

// Crate-level exports - Configuration
pub use config::{ArenaConfig, ConfigError};

// Crate-level exports - Connections
pub use connection::{ChannelConnection, Connection, ConnectionId, pump_socket};

// Crate-level exports - Wire protocol
pub use protocol::{ClientMessage, GameResult, LastMove, MatchId, PlayerId, ServerMessage};

// Crate-level exports - Match sessions
pub use registry::{SessionRegistry, SharedSession, lock_session};
pub use session::{
    AppliedMove, BindError, GameSnapshot, IllegalMove, MatchSession, PlayerConnection,
};

// Crate-level exports - Game host
pub use host::{GameHost, Seat};

// Crate-level exports - Matchmaking
pub use matchmaking::{
    GameHostLink, JoinQueue, LinkError, MatchCommandSink, MatchConnection, MatchFound,
    Matchmaker, MatchmakerHandle, MatchmakerMessage, MatchmakingConfig, Pairing, QueueEntry,
    QueueRequest, allowed_tolerance, find_pair,
};

// Crate-level exports - Match log
pub use recorder::{FinishedGame, HttpMatchRecorder, LogOnlyRecorder, MatchRecorder, recorder_for};
