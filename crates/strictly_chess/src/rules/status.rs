//! Check, checkmate, stalemate and insufficient material.

use super::movement::{attacks, reaches};
use crate::{Board, Color, Piece, PieceKind, Square};
use tracing::{error, instrument};

/// Whether any piece of color `by` attacks `square`.
///
/// Holds for empty and occupied squares alike. Pawns attack diagonally
/// only; castling and en passant are not attacks.
pub fn is_square_attacked(square: Square, by: Color, board: &Board) -> bool {
    board
        .pieces_of(by)
        .any(|p| attacks(p.position, square, p.kind, p.color, board))
}

/// Returns true if any opposing piece can reach the king of `color`.
///
/// A board without a king for `color` is corrupt; it is logged and
/// reported as "not in check".
pub fn is_king_in_check(color: Color, board: &Board) -> bool {
    let Some(king) = board.king_of(color) else {
        error!(?color, "Board has no king for color");
        return false;
    };
    is_square_attacked(king.position, color.opponent(), board)
}

/// Whether moving the piece on `from` to `to` leaves the mover's king
/// attacked. The destination occupant, if any, is treated as captured.
pub fn leaves_king_in_check(from: Square, to: Square, color: Color, board: &Board) -> bool {
    is_king_in_check(color, &board.with_move(from, to))
}

/// Whether `piece` has a destination that keeps its own king safe.
fn has_safe_destination(piece: &Piece, board: &Board) -> bool {
    Square::all().any(|to| {
        let own_piece_there = board.piece_at(to).is_some_and(|p| p.color == piece.color);
        !own_piece_there
            && reaches(piece.position, to, piece.kind, piece.color, board, None)
            && !leaves_king_in_check(piece.position, to, piece.color, board)
    })
}

/// Whether `color` has at least one move that does not leave its king in check.
///
/// Brute force over every piece and all 64 destinations. Castling and en
/// passant are not considered.
pub fn has_legal_move(color: Color, board: &Board) -> bool {
    board
        .pieces_of(color)
        .any(|piece| has_safe_destination(piece, board))
}

/// `color` is in check and has no move out of it.
#[instrument(level = "debug", skip(board), ret)]
pub fn is_checkmate(color: Color, board: &Board) -> bool {
    is_king_in_check(color, board) && !has_legal_move(color, board)
}

/// `color` is not in check but has no legal move.
#[instrument(level = "debug", skip(board), ret)]
pub fn is_stalemate(color: Color, board: &Board) -> bool {
    !is_king_in_check(color, board) && !has_legal_move(color, board)
}

/// King vs king, or king and a single bishop or knight vs bare king.
pub fn is_insufficient_material(board: &Board) -> bool {
    let white: Vec<&Piece> = board.pieces_of(Color::White).collect();
    let black: Vec<&Piece> = board.pieces_of(Color::Black).collect();

    fn king_only(pieces: &[&Piece]) -> bool {
        matches!(pieces, [p] if p.kind == PieceKind::King)
    }
    fn king_and_minor(pieces: &[&Piece]) -> bool {
        pieces.len() == 2
            && pieces.iter().any(|p| p.kind == PieceKind::King)
            && pieces.iter().any(|p| p.kind.is_minor())
    }

    (king_only(&white) && king_only(&black))
        || (king_and_minor(&white) && king_only(&black))
        || (king_and_minor(&black) && king_only(&white))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn piece(kind: PieceKind, color: Color, square: &str) -> Piece {
        Piece::new(kind, color, square.parse().unwrap())
    }

    #[test]
    fn test_missing_king_is_not_check() {
        let board = Board::from_pieces([piece(PieceKind::Queen, Color::Black, "e8")]);
        assert!(!is_king_in_check(Color::White, &board));
    }

    #[test]
    fn test_pawn_attacks_diagonally_only() {
        let board = Board::from_pieces([
            piece(PieceKind::King, Color::White, "e4"),
            piece(PieceKind::Pawn, Color::Black, "e5"),
        ]);
        assert!(!is_king_in_check(Color::White, &board));

        let board = Board::from_pieces([
            piece(PieceKind::King, Color::White, "e4"),
            piece(PieceKind::Pawn, Color::Black, "d5"),
        ]);
        assert!(is_king_in_check(Color::White, &board));
    }

    #[test]
    fn test_two_minor_pieces_are_sufficient() {
        let board = Board::from_pieces([
            piece(PieceKind::King, Color::White, "e1"),
            piece(PieceKind::Knight, Color::White, "b1"),
            piece(PieceKind::Bishop, Color::White, "c1"),
            piece(PieceKind::King, Color::Black, "e8"),
        ]);
        assert!(!is_insufficient_material(&board));
    }
}
