//! Authoritative state for one match.

use crate::connection::{Connection, ConnectionId};
use crate::protocol::{GameResult, LastMove, MatchId, PlayerId, ServerMessage};
use crate::recorder::{FinishedGame, MatchRecorder};
use chrono::Utc;
use derive_more::Display;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use strictly_chess::{
    Board, Color, MoveAnnotation, MovedSet, OpeningKind, PieceKind, RulesError, Square,
    castling_move, detect_opening, format_move_log, is_checkmate, is_insufficient_material,
    is_king_in_check, is_promotion_square, is_stalemate, is_valid_move, promote,
};
use tracing::{debug, info, instrument, warn};

/// Outbound handle for a bound player.
pub type PlayerConnection = Arc<dyn Connection<ServerMessage>>;

/// Why a move was rejected. Rejection never changes the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum IllegalMove {
    /// The match already has a terminal result.
    #[display("Game is over ({result})")]
    GameOver {
        /// The terminal result.
        result: GameResult,
    },
    /// No piece stands on the origin square.
    #[display("No piece on {square}")]
    EmptySquare {
        /// The origin square.
        square: Square,
    },
    /// The piece belongs to the side not on move.
    #[display("Not your turn, {expected} to move")]
    WrongTurn {
        /// Side on move.
        expected: Color,
    },
    /// The piece cannot move that way.
    #[display("Illegal move {from}-{to}")]
    InvalidPattern {
        /// Origin square.
        from: Square,
        /// Destination square.
        to: Square,
    },
    /// The move would leave the mover's king attacked.
    #[display("Move leaves the king in check")]
    ExposesKing,
    /// A pawn reached the last rank without a promotion choice.
    #[display("Promotion piece required")]
    PromotionRequired,
    /// The promotion choice is not queen, rook, bishop or knight.
    #[display("{_0}")]
    InvalidPromotion(RulesError),
}

impl std::error::Error for IllegalMove {}

/// Why a connection could not be bound.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum BindError {
    /// The player is neither white nor black in this match.
    #[display("Player {player} is not part of match {match_id}")]
    NotAParticipant {
        /// Match the player tried to join.
        match_id: MatchId,
        /// Rejected player.
        player: PlayerId,
    },
}

impl std::error::Error for BindError {}

/// Outcome of an accepted move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedMove {
    /// Annotation appended to the log.
    pub log: String,
    /// Kind of the captured piece, if any.
    pub captured: Option<PieceKind>,
    /// Result after the move.
    pub result: GameResult,
}

/// Read-only view of a session's game state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameSnapshot {
    /// Pieces in play.
    pub board: Board,
    /// Side to move.
    pub turn: Color,
    /// Annotations so far.
    pub log: Vec<String>,
    /// Current result.
    pub result: GameResult,
}

/// One match: board, turn, move log, result and bound connections.
///
/// Every mutation goes through [`MatchSession::apply_move`]; the identity
/// (`match_id`, `white`, `black`) is fixed at construction.
#[derive(Debug)]
pub struct MatchSession {
    match_id: MatchId,
    white: PlayerId,
    black: PlayerId,
    board: Board,
    turn: Color,
    log: Vec<String>,
    moved: MovedSet,
    en_passant: Option<Square>,
    result: GameResult,
    opening_announced: bool,
    connections: HashMap<PlayerId, PlayerConnection>,
    recorder: Arc<dyn MatchRecorder>,
}

impl MatchSession {
    /// Creates a session in the standard starting position, white to move.
    #[instrument(skip(recorder))]
    pub fn new(
        match_id: MatchId,
        white: PlayerId,
        black: PlayerId,
        recorder: Arc<dyn MatchRecorder>,
    ) -> Self {
        info!("Creating match session");
        Self {
            match_id,
            white,
            black,
            board: Board::standard(),
            turn: Color::White,
            log: Vec::new(),
            moved: MovedSet::new(),
            en_passant: None,
            result: GameResult::Ongoing,
            opening_announced: false,
            connections: HashMap::new(),
            recorder,
        }
    }

    /// Creates a session from an arbitrary position with `turn` to move.
    ///
    /// Every piece counts as unmoved, so kings and rooks on their home
    /// squares keep their castling rights. No en-passant target is set.
    #[instrument(skip(board, recorder))]
    pub fn from_position(
        match_id: MatchId,
        white: PlayerId,
        black: PlayerId,
        board: Board,
        turn: Color,
        recorder: Arc<dyn MatchRecorder>,
    ) -> Self {
        Self {
            board,
            turn,
            ..Self::new(match_id, white, black, recorder)
        }
    }

    /// Match identifier.
    pub fn match_id(&self) -> &MatchId {
        &self.match_id
    }

    /// Player with the white pieces.
    pub fn white(&self) -> &PlayerId {
        &self.white
    }

    /// Player with the black pieces.
    pub fn black(&self) -> &PlayerId {
        &self.black
    }

    /// Current pieces.
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Side to move.
    pub fn turn(&self) -> Color {
        self.turn
    }

    /// Annotations so far.
    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// Current result.
    pub fn result(&self) -> GameResult {
        self.result
    }

    /// Square a pawn may capture onto en passant on this move only.
    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    /// Color played by `player`, if they are in this match.
    pub fn color_of(&self, player: &PlayerId) -> Option<Color> {
        if *player == self.white {
            Some(Color::White)
        } else if *player == self.black {
            Some(Color::Black)
        } else {
            None
        }
    }

    /// Snapshot of the game state.
    pub fn state(&self) -> GameSnapshot {
        GameSnapshot {
            board: self.board.clone(),
            turn: self.turn,
            log: self.log.clone(),
            result: self.result,
        }
    }

    /// Applies one move for the side on move.
    ///
    /// Castling relocates king and rook together; en passant removes the
    /// pawn behind the destination; a pawn reaching the last rank becomes
    /// `promotion`, which is then mandatory. On success the opponent's
    /// check, mate and draw status is recomputed, the annotation is logged,
    /// the turn flips and every bound connection receives the new state.
    ///
    /// # Errors
    ///
    /// Returns [`IllegalMove`] without touching any state or sending
    /// anything when the move is not allowed.
    #[instrument(skip(self), fields(match_id = %self.match_id, turn = %self.turn))]
    pub fn apply_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> Result<AppliedMove, IllegalMove> {
        if self.result.is_terminal() {
            return Err(IllegalMove::GameOver {
                result: self.result,
            });
        }

        let piece = *self
            .board
            .piece_at(from)
            .ok_or(IllegalMove::EmptySquare { square: from })?;
        let color = piece.color;
        if color != self.turn {
            return Err(IllegalMove::WrongTurn {
                expected: self.turn,
            });
        }

        if !is_valid_move(
            from,
            to,
            piece.kind,
            color,
            &self.board,
            &self.moved,
            self.en_passant,
        ) {
            return Err(IllegalMove::InvalidPattern { from, to });
        }

        let castling = castling_move(from, to, piece.kind, color, &self.board, &self.moved);
        let mut next = self.board.clone();
        let mut captured = None;
        let mut promoted_to = None;

        if let Some(castle) = castling {
            next.remove_at(from);
            if let Some(rook) = next.remove_at(castle.rook_from) {
                next.place(rook.moved_to(castle.rook_to));
            }
            next.place(piece.moved_to(to));
        } else {
            let en_passant_capture = piece.kind == PieceKind::Pawn
                && self.en_passant == Some(to)
                && !self.board.is_occupied(to);
            let captured_square = if en_passant_capture {
                to.offset(0, -color.pawn_direction())
            } else {
                Some(to)
            };
            captured = captured_square
                .and_then(|sq| next.remove_at(sq))
                .map(|victim| victim.kind);

            next.remove_at(from);
            let arrived = piece.moved_to(to);
            let arrived = if is_promotion_square(piece.kind, color, to) {
                let target = promotion.ok_or(IllegalMove::PromotionRequired)?;
                promoted_to = Some(target);
                promote(arrived, target).map_err(IllegalMove::InvalidPromotion)?
            } else {
                arrived
            };
            next.place(arrived);
        }

        if is_king_in_check(color, &next) {
            return Err(IllegalMove::ExposesKing);
        }

        // Commit
        self.board = next;
        self.moved.mark(from);
        if let Some(castle) = castling {
            self.moved.mark(castle.rook_from);
        }
        let double_step = piece.kind == PieceKind::Pawn && from.rank().abs_diff(to.rank()) == 2;
        self.en_passant = if double_step {
            from.offset(0, color.pawn_direction())
        } else {
            None
        };

        let opponent = color.opponent();
        let is_check = is_king_in_check(opponent, &self.board);
        let is_mate = is_checkmate(opponent, &self.board);
        if is_mate {
            self.result = GameResult::win_for(color);
        } else if is_stalemate(opponent, &self.board) || is_insufficient_material(&self.board) {
            self.result = GameResult::Draw;
        }

        let annotation = format_move_log(&MoveAnnotation {
            kind: piece.kind,
            from,
            to,
            is_capture: captured.is_some(),
            promotion: promoted_to,
            castling: castling.map(|c| c.side),
            is_check,
            is_mate,
        });
        self.log.push(annotation.clone());
        self.turn = opponent;

        info!(
            log = %annotation,
            captured = ?captured,
            result = %self.result,
            "Move applied"
        );

        self.broadcast(ServerMessage::TurnResult {
            board: self.board.clone(),
            turn: self.turn,
            last_move: Some(LastMove { from, to }),
            log: self.log.clone(),
            is_capture: captured.is_some(),
            attacker: captured.map(|_| piece.kind),
            victim: captured,
        });
        self.announce_opening();

        if self.result.is_terminal() {
            self.finish();
        }

        Ok(AppliedMove {
            log: annotation,
            captured,
            result: self.result,
        })
    }

    /// Applies a move on behalf of `player`, who must play the side to move.
    ///
    /// # Errors
    ///
    /// Returns [`IllegalMove::WrongTurn`] when `player` is the opponent or
    /// not in this match, otherwise whatever [`apply_move`](Self::apply_move)
    /// returns.
    #[instrument(skip(self), fields(match_id = %self.match_id))]
    pub fn apply_player_move(
        &mut self,
        player: &PlayerId,
        from: Square,
        to: Square,
        promotion: Option<PieceKind>,
    ) -> Result<AppliedMove, IllegalMove> {
        if self.color_of(player) != Some(self.turn) {
            return Err(IllegalMove::WrongTurn {
                expected: self.turn,
            });
        }
        self.apply_move(from, to, promotion)
    }

    /// Sends the one-time opening or defence notice once the log matches.
    fn announce_opening(&mut self) {
        if self.opening_announced {
            return;
        }
        let Some(found) = detect_opening(self.log.as_slice()) else {
            return;
        };
        self.opening_announced = true;
        info!(name = found.name, eco = found.eco, "Opening detected");

        let message = match found.kind {
            OpeningKind::Opening => ServerMessage::OpeningDetected {
                opening_name: found.name.to_string(),
                eco_code: found.eco.to_string(),
            },
            OpeningKind::Defence => ServerMessage::DefenceDetected {
                defence_name: found.name.to_string(),
                eco_code: found.eco.to_string(),
            },
        };
        self.broadcast(message);
    }

    /// Announces the result and hands the game to the recorder.
    fn finish(&self) {
        info!(result = %self.result, plies = self.log.len(), "Game over");
        self.broadcast(self.game_over());
        self.recorder.record(FinishedGame {
            match_id: self.match_id.clone(),
            white_player: self.white.clone(),
            black_player: self.black.clone(),
            result: self.result,
            move_log: self.log.clone(),
            finished_at: Utc::now(),
        });
    }

    fn game_over(&self) -> ServerMessage {
        ServerMessage::GameOver {
            result: self.result,
            winner: self.result.winner(),
        }
    }

    /// Binds `connection` to `player`, replacing any earlier binding.
    ///
    /// The new connection receives the current state (and the result if the
    /// game is over), then every bound connection is told the player is back.
    ///
    /// # Errors
    ///
    /// Returns [`BindError::NotAParticipant`] if `player` is not white or
    /// black in this match.
    #[instrument(skip(self, connection), fields(match_id = %self.match_id, connection_id = connection.id()))]
    pub fn bind(&mut self, player: PlayerId, connection: PlayerConnection) -> Result<(), BindError> {
        if self.color_of(&player).is_none() {
            warn!("Refusing to bind non-participant");
            return Err(BindError::NotAParticipant {
                match_id: self.match_id.clone(),
                player,
            });
        }

        if let Some(previous) = self.connections.insert(player.clone(), connection.clone()) {
            debug!(previous_connection = previous.id(), "Replaced earlier binding");
        }

        connection.send(ServerMessage::TurnResult {
            board: self.board.clone(),
            turn: self.turn,
            last_move: None,
            log: self.log.clone(),
            is_capture: false,
            attacker: None,
            victim: None,
        });
        if self.result.is_terminal() {
            connection.send(self.game_over());
        }

        info!(bound = self.connections.len(), "Player bound");
        self.broadcast(ServerMessage::OpponentReconnected { user_id: player });
        Ok(())
    }

    /// Close handler for a player's connection.
    ///
    /// Unbinds only if `connection_id` is still the player's current
    /// connection, then notifies the remaining connections. Returns whether
    /// anything was unbound.
    #[instrument(skip(self), fields(match_id = %self.match_id))]
    pub fn disconnect(&mut self, player: &PlayerId, connection_id: ConnectionId) -> bool {
        let current = self.connection_id_of(player);
        if current != Some(connection_id) {
            debug!(?current, "Stale close ignored");
            return false;
        }
        self.connections.remove(player);
        info!(bound = self.connections.len(), "Player disconnected");
        self.broadcast(ServerMessage::OpponentDisconnected {
            user_id: player.clone(),
        });
        true
    }

    /// Whether `player` currently has a bound connection.
    pub fn has_user(&self, player: &PlayerId) -> bool {
        self.connections.contains_key(player)
    }

    /// Id of the connection currently bound to `player`.
    pub fn connection_id_of(&self, player: &PlayerId) -> Option<ConnectionId> {
        self.connections.get(player).map(|c| c.id())
    }

    /// Removes a binding without notifying anyone.
    pub fn unbind(&mut self, player: &PlayerId) -> Option<PlayerConnection> {
        self.connections.remove(player)
    }

    /// Number of bound connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Sends `message` to every bound connection.
    pub fn broadcast(&self, message: ServerMessage) {
        for connection in self.connections.values() {
            connection.send(message.clone());
        }
    }
}
