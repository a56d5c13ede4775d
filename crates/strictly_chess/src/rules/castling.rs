//! Castling eligibility.

use super::status::is_king_in_check;
use crate::{Board, Color, MovedSet, PieceKind, Square};
use serde::{Deserialize, Serialize};

/// Which rook the king castles with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CastlingSide {
    /// Short castling, king to the g-file.
    KingSide,
    /// Long castling, king to the c-file.
    QueenSide,
}

impl CastlingSide {
    /// `O-O` or `O-O-O`.
    pub fn notation(self) -> &'static str {
        match self {
            CastlingSide::KingSide => "O-O",
            CastlingSide::QueenSide => "O-O-O",
        }
    }

    fn king_target_file(self) -> u8 {
        match self {
            CastlingSide::KingSide => 6,
            CastlingSide::QueenSide => 2,
        }
    }

    fn rook_files(self) -> (u8, u8) {
        match self {
            CastlingSide::KingSide => (7, 5),
            CastlingSide::QueenSide => (0, 3),
        }
    }

    /// Files that must be empty between king and rook.
    fn between_files(self) -> &'static [u8] {
        match self {
            CastlingSide::KingSide => &[5, 6],
            CastlingSide::QueenSide => &[1, 2, 3],
        }
    }

    /// Files the king stands on or crosses: start, pass-through, destination.
    fn transit_files(self) -> [u8; 3] {
        match self {
            CastlingSide::KingSide => [4, 5, 6],
            CastlingSide::QueenSide => [4, 3, 2],
        }
    }
}

/// Rook relocation that accompanies a castling king move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastlingMove {
    /// Short or long castling.
    pub side: CastlingSide,
    /// Rook origin (h- or a-file).
    pub rook_from: Square,
    /// Rook destination (f- or d-file).
    pub rook_to: Square,
}

/// Detects a castling move and returns the paired rook relocation.
///
/// Requires the king on its home square, neither king nor rook moved,
/// the squares between them empty, and none of the king's transit squares
/// attacked. Transit attacks are found by relocating the king onto each
/// square and re-running check detection.
pub fn castling_move(
    from: Square,
    to: Square,
    kind: PieceKind,
    color: Color,
    board: &Board,
    moved: &MovedSet,
) -> Option<CastlingMove> {
    if kind != PieceKind::King {
        return None;
    }

    let rank = color.home_rank();
    let home = Square::new(4, rank)?;
    if from != home || to.rank() != rank || moved.has_moved(home) {
        return None;
    }

    let side = [CastlingSide::KingSide, CastlingSide::QueenSide]
        .into_iter()
        .find(|side| side.king_target_file() == to.file())?;

    let (rook_file, rook_to_file) = side.rook_files();
    let rook_from = Square::new(rook_file, rank)?;
    let rook_to = Square::new(rook_to_file, rank)?;

    if moved.has_moved(rook_from) {
        return None;
    }
    let rook_present = board
        .piece_at(rook_from)
        .is_some_and(|p| p.kind == PieceKind::Rook && p.color == color);
    if !rook_present {
        return None;
    }

    let blocked = side
        .between_files()
        .iter()
        .filter_map(|&file| Square::new(file, rank))
        .any(|sq| board.is_occupied(sq));
    if blocked {
        return None;
    }

    let attacked = side
        .transit_files()
        .into_iter()
        .filter_map(|file| Square::new(file, rank))
        .any(|sq| is_king_in_check(color, &board.with_move(from, sq)));
    if attacked {
        return None;
    }

    Some(CastlingMove {
        side,
        rook_from,
        rook_to,
    })
}
