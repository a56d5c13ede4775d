//! Matchmaker wire format: `{"type": ..., "payload": {...}}` envelopes.

use crate::protocol::{MatchId, PlayerId};
use serde::{Deserialize, Serialize};
use strictly_chess::Color;

/// Frames accepted by the matchmaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueueRequest {
    /// Enter the queue.
    JoinQueue(JoinQueue),
    /// Leave the queue.
    LeaveQueue,
}

/// Payload of `JOIN_QUEUE`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinQueue {
    /// Account number of the player.
    pub usn: PlayerId,
    /// Display name.
    pub nick: String,
    /// Current rating.
    pub rating: i32,
    /// Cosmetic settings forwarded to the opponent.
    #[serde(default)]
    pub skin_setting: serde_json::Value,
    /// Largest rating gap the player accepts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_diff: Option<u32>,
}

/// Frames sent by the matchmaker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MatchmakerMessage {
    /// An opponent was found.
    MatchFound(MatchFound),
    /// Request could not be served.
    Error {
        /// Human-readable reason.
        message: String,
    },
}

/// Payload of `MATCH_FOUND`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchFound {
    /// Match to join on the game host.
    pub game_id: MatchId,
    /// Color assigned to the recipient.
    pub your_color: Color,
    /// Opponent's display name.
    pub opponent_nick: String,
    /// Recipient's own cosmetic settings.
    pub user_skin_setting: serde_json::Value,
    /// Opponent's cosmetic settings.
    pub opponent_skin_setting: serde_json::Value,
}
