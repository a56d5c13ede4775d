//! Rating-based matchmaking.
//!
//! Players wait in a queue; a periodic sweep pairs the first two whose
//! rating gap fits both players' wait-widened tolerance. Each pairing sends
//! a `GAME_START` to the game host and a `MATCH_FOUND` to both players.

mod link;
mod queue;
mod service;
mod wire;

pub use link::{GameHostLink, LinkError};
pub use queue::{MatchmakingConfig, QueueEntry, allowed_tolerance, find_pair};
pub use service::{MatchConnection, Matchmaker, MatchmakerHandle, Pairing};
pub use wire::{JoinQueue, MatchFound, MatchmakerMessage, QueueRequest};

use crate::protocol::ClientMessage;

/// Destination for match-creation commands.
pub trait MatchCommandSink: Send + Sync + std::fmt::Debug {
    /// Delivers a command. Must not block; delivery is the sink's concern.
    fn submit(&self, command: ClientMessage);
}
