//! Wire messages exchanged with the game host.
//!
//! Frames are JSON objects tagged by a `type` field in SCREAMING_SNAKE_CASE
//! with camelCase fields, e.g. `{"type":"TURN_MOVE","gameId":"match_1","from":"e2","to":"e4"}`.

use derive_more::Display;
use serde::{Deserialize, Serialize};
use strictly_chess::{Board, Color, PieceKind, Square};

/// Opaque match identifier, e.g. `match_1718000000000`.
pub type MatchId = String;

/// Player identity.
///
/// Clients send it either as a string or as a numeric account number; both
/// normalize to the same textual id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize, Deserialize)]
#[serde(from = "RawPlayerId", into = "String")]
pub struct PlayerId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawPlayerId {
    Text(String),
    Number(i64),
}

impl From<RawPlayerId> for PlayerId {
    fn from(raw: RawPlayerId) -> Self {
        match raw {
            RawPlayerId::Text(text) => Self(text),
            RawPlayerId::Number(n) => Self(n.to_string()),
        }
    }
}

impl From<PlayerId> for String {
    fn from(id: PlayerId) -> Self {
        id.0
    }
}

impl From<&str> for PlayerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for PlayerId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl PlayerId {
    /// The textual id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Match outcome.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GameResult {
    /// Still being played.
    #[default]
    Ongoing,
    /// White delivered mate.
    WhiteWin,
    /// Black delivered mate.
    BlackWin,
    /// Stalemate or insufficient material.
    Draw,
}

impl GameResult {
    /// Win for `color`.
    pub fn win_for(color: Color) -> Self {
        match color {
            Color::White => GameResult::WhiteWin,
            Color::Black => GameResult::BlackWin,
        }
    }

    /// Whether no further moves are accepted.
    pub fn is_terminal(self) -> bool {
        self != GameResult::Ongoing
    }

    /// The winning color, if the game was decided.
    pub fn winner(self) -> Option<Color> {
        match self {
            GameResult::WhiteWin => Some(Color::White),
            GameResult::BlackWin => Some(Color::Black),
            GameResult::Ongoing | GameResult::Draw => None,
        }
    }
}

/// Origin and destination of the move a `TURN_RESULT` reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMove {
    /// Origin square.
    pub from: Square,
    /// Destination square.
    pub to: Square,
}

/// Frames accepted by the game host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    /// Bind this connection to a player seat in a match.
    JoinGame {
        /// Match to join.
        game_id: MatchId,
        /// Joining player.
        user_id: PlayerId,
    },
    /// Play a move.
    TurnMove {
        /// Match to play in.
        game_id: MatchId,
        /// Origin square.
        from: Square,
        /// Destination square.
        to: Square,
        /// Promotion choice, required when a pawn reaches the last rank.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        promotion: Option<PieceKind>,
    },
    /// Create a match; sent by the matchmaker.
    GameStart {
        /// New match id.
        game_id: MatchId,
        /// Player with the white pieces.
        white: PlayerId,
        /// Player with the black pieces.
        black: PlayerId,
        /// White's cosmetic settings, passed through untouched.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        white_skin: Option<serde_json::Value>,
        /// Black's cosmetic settings, passed through untouched.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        black_skin: Option<serde_json::Value>,
    },
}

/// Frames sent by the game host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    /// Board state after a move, or a snapshot when `last_move` is null.
    TurnResult {
        /// Pieces in play.
        board: Board,
        /// Side to move next.
        turn: Color,
        /// The move just played.
        last_move: Option<LastMove>,
        /// Every annotation so far.
        log: Vec<String>,
        /// Set when the move removed an enemy piece.
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_capture: bool,
        /// Kind of the capturing piece.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        attacker: Option<PieceKind>,
        /// Kind of the captured piece.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        victim: Option<PieceKind>,
    },
    /// The match reached a terminal result.
    GameOver {
        /// Final result.
        result: GameResult,
        /// Winning color, absent on a draw.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        winner: Option<Color>,
    },
    /// A player's connection closed.
    OpponentDisconnected {
        /// Player whose connection closed.
        user_id: PlayerId,
    },
    /// A player (re)bound a connection.
    OpponentReconnected {
        /// Player who bound.
        user_id: PlayerId,
    },
    /// White's setup matched a named opening.
    OpeningDetected {
        /// Opening name.
        opening_name: String,
        /// ECO code.
        eco_code: String,
    },
    /// Black's reply matched a named defence.
    DefenceDetected {
        /// Defence name.
        defence_name: String,
        /// ECO code.
        eco_code: String,
    },
    /// Reply to `GAME_START`.
    GameStarted {
        /// The match that now exists.
        game_id: MatchId,
    },
    /// Request could not be served.
    Error {
        /// Human-readable reason.
        message: String,
    },
}

impl ServerMessage {
    /// Shorthand for [`ServerMessage::Error`].
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_accepts_numbers() {
        let id: PlayerId = serde_json::from_str("42").unwrap();
        assert_eq!(id.as_str(), "42");
        let id: PlayerId = serde_json::from_str("\"alice\"").unwrap();
        assert_eq!(id, PlayerId::from("alice"));
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"alice\"");
    }

    #[test]
    fn test_result_wire_names() {
        assert_eq!(serde_json::to_string(&GameResult::WhiteWin).unwrap(), "\"white_win\"");
        assert_eq!(GameResult::Draw.to_string(), "draw");
        assert_eq!(GameResult::BlackWin.winner(), Some(Color::Black));
        assert!(!GameResult::Ongoing.is_terminal());
    }
}
