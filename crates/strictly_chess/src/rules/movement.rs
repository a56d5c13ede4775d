//! Per-piece movement patterns.

use super::castling::castling_move;
use crate::{Board, Color, MovedSet, PieceKind, Square};

/// File and rank deltas from `from` to `to`.
fn delta(from: Square, to: Square) -> (i8, i8) {
    // Both coordinates are < 8, so the casts cannot wrap.
    (
        to.file() as i8 - from.file() as i8,
        to.rank() as i8 - from.rank() as i8,
    )
}

/// Checks whether a move is legal for the given piece.
///
/// Covers movement patterns, blocking pieces, captures, en passant and
/// castling. Whether the move exposes the mover's own king is a separate
/// question, answered by [`leaves_king_in_check`](super::leaves_king_in_check).
pub fn is_valid_move(
    from: Square,
    to: Square,
    kind: PieceKind,
    color: Color,
    board: &Board,
    moved: &MovedSet,
    en_passant: Option<Square>,
) -> bool {
    if board.piece_at(to).is_some_and(|p| p.color == color) {
        return false;
    }

    if reaches(from, to, kind, color, board, en_passant) {
        return true;
    }

    kind == PieceKind::King && castling_move(from, to, kind, color, board, moved).is_some()
}

/// Whether a `kind` piece of `color` on `from` attacks `to`.
///
/// Pawns attack the two forward diagonals whatever stands there and never
/// the square straight ahead. Every other piece attacks what it reaches.
pub(crate) fn attacks(from: Square, to: Square, kind: PieceKind, color: Color, board: &Board) -> bool {
    if kind == PieceKind::Pawn {
        let (dx, dy) = delta(from, to);
        return dx.abs() == 1 && dy == color.pawn_direction();
    }
    reaches(from, to, kind, color, board, None)
}

/// Raw reachability: the movement pattern of `kind` without castling.
///
/// Assumes the destination is not held by a friendly piece. For a pawn the
/// answer depends on the occupant of `to`; use [`attacks`] for threats.
pub(crate) fn reaches(
    from: Square,
    to: Square,
    kind: PieceKind,
    color: Color,
    board: &Board,
    en_passant: Option<Square>,
) -> bool {
    if from == to {
        return false;
    }
    let (dx, dy) = delta(from, to);

    match kind {
        PieceKind::Pawn => pawn_reaches(from, to, color, board, en_passant),
        PieceKind::Knight => matches!((dx.abs(), dy.abs()), (1, 2) | (2, 1)),
        PieceKind::Bishop => dx.abs() == dy.abs() && is_path_clear(from, to, board),
        PieceKind::Rook => (dx == 0 || dy == 0) && is_path_clear(from, to, board),
        PieceKind::Queen => {
            (dx == 0 || dy == 0 || dx.abs() == dy.abs()) && is_path_clear(from, to, board)
        }
        PieceKind::King => dx.abs() <= 1 && dy.abs() <= 1,
    }
}

fn pawn_reaches(
    from: Square,
    to: Square,
    color: Color,
    board: &Board,
    en_passant: Option<Square>,
) -> bool {
    let direction = color.pawn_direction();
    let (dx, dy) = delta(from, to);
    let target = board.piece_at(to);

    match (dx.abs(), dy) {
        (0, dy) if dy == direction => target.is_none(),
        (0, dy) if dy == 2 * direction && from.rank() == color.pawn_start_rank() => {
            let intermediate = from.offset(0, direction);
            target.is_none() && intermediate.is_some_and(|sq| !board.is_occupied(sq))
        }
        (1, dy) if dy == direction => {
            target.is_some_and(|p| p.color != color) || en_passant == Some(to)
        }
        _ => false,
    }
}

/// Whether every square strictly between `from` and `to` is empty.
///
/// Only meaningful for straight or diagonal lines. Adjacent squares are
/// trivially clear.
pub fn is_path_clear(from: Square, to: Square, board: &Board) -> bool {
    let (dx, dy) = delta(from, to);
    let steps = dx.abs().max(dy.abs());
    if steps <= 1 {
        return true;
    }

    let (file_step, rank_step) = (dx.signum(), dy.signum());
    (1..steps).all(|step| {
        from.offset(file_step * step, rank_step * step)
            .is_none_or(|sq| !board.is_occupied(sq))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Piece;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    #[test]
    fn test_path_clear_adjacent() {
        let board = Board::standard();
        assert!(is_path_clear(sq("a1"), sq("a2"), &board));
    }

    #[test]
    fn test_path_blocked() {
        let board = Board::standard();
        assert!(!is_path_clear(sq("a1"), sq("a3"), &board));
        assert!(is_path_clear(sq("a2"), sq("a6"), &board));
    }

    #[test]
    fn test_pawn_double_step_blocked_by_intermediate() {
        let board = Board::from_pieces([
            Piece::new(PieceKind::Pawn, Color::White, sq("e2")),
            Piece::new(PieceKind::Knight, Color::Black, sq("e3")),
        ]);
        assert!(!reaches(sq("e2"), sq("e4"), PieceKind::Pawn, Color::White, &board, None));
    }

    #[test]
    fn test_pawn_cannot_move_backwards() {
        let board = Board::from_pieces([Piece::new(PieceKind::Pawn, Color::Black, sq("e5"))]);
        assert!(!reaches(sq("e5"), sq("e6"), PieceKind::Pawn, Color::Black, &board, None));
        assert!(reaches(sq("e5"), sq("e4"), PieceKind::Pawn, Color::Black, &board, None));
    }
}
