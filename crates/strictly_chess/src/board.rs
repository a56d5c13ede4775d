//! Board representation: an unordered collection of pieces.

use super::types::{Color, Piece, PieceKind, Square};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Back-rank order from the a-file to the h-file.
const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

/// The pieces in play.
///
/// There is no square array: a square is empty when no piece reports it
/// as its position. At most one piece occupies a square.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    pieces: Vec<Piece>,
}

impl Board {
    /// Creates a board from an arbitrary set of pieces.
    pub fn from_pieces(pieces: impl IntoIterator<Item = Piece>) -> Self {
        Self {
            pieces: pieces.into_iter().collect(),
        }
    }

    /// The standard 32-piece starting layout.
    pub fn standard() -> Self {
        let mut pieces = Vec::with_capacity(32);
        for color in [Color::White, Color::Black] {
            let home = color.home_rank();
            let pawns = color.pawn_start_rank();
            for (file, kind) in (0u8..).zip(BACK_RANK) {
                if let Some(square) = Square::new(file, home) {
                    pieces.push(Piece::new(kind, color, square));
                }
                if let Some(square) = Square::new(file, pawns) {
                    pieces.push(Piece::new(PieceKind::Pawn, color, square));
                }
            }
        }
        Self { pieces }
    }

    /// All pieces, in no particular order.
    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    /// The piece on `square`, if any.
    pub fn piece_at(&self, square: Square) -> Option<&Piece> {
        self.pieces.iter().find(|p| p.position == square)
    }

    /// Whether any piece stands on `square`.
    pub fn is_occupied(&self, square: Square) -> bool {
        self.piece_at(square).is_some()
    }

    /// Pieces belonging to `color`.
    pub fn pieces_of(&self, color: Color) -> impl Iterator<Item = &Piece> {
        self.pieces.iter().filter(move |p| p.color == color)
    }

    /// The king of `color`.
    pub fn king_of(&self, color: Color) -> Option<&Piece> {
        self.pieces_of(color).find(|p| p.kind == PieceKind::King)
    }

    /// Removes and returns the piece on `square`.
    pub fn remove_at(&mut self, square: Square) -> Option<Piece> {
        let idx = self.pieces.iter().position(|p| p.position == square)?;
        Some(self.pieces.swap_remove(idx))
    }

    /// Places a piece, replacing whatever stood on its square.
    pub fn place(&mut self, piece: Piece) {
        self.remove_at(piece.position);
        self.pieces.push(piece);
    }

    /// Copy of the board with the piece on `from` moved to `to`,
    /// capturing whatever stood on `to`.
    ///
    /// Used to simulate candidate moves; en passant and castling are not
    /// modelled here.
    pub fn with_move(&self, from: Square, to: Square) -> Board {
        let mut next = self.clone();
        if let Some(piece) = next.remove_at(from) {
            next.place(piece.moved_to(to));
        }
        next
    }
}

/// Squares whose original occupant has moved away at some point.
///
/// Castling eligibility is derived from this set: a king or rook is
/// considered unmoved when its home square is not in it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovedSet {
    squares: HashSet<Square>,
}

impl MovedSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the piece that started on `square` as moved.
    pub fn mark(&mut self, square: Square) {
        self.squares.insert(square);
    }

    /// Whether the piece that started on `square` has moved.
    pub fn has_moved(&self, square: Square) -> bool {
        self.squares.contains(&square)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    #[test]
    fn test_standard_layout() {
        let board = Board::standard();
        assert_eq!(board.pieces().len(), 32);
        assert_eq!(
            board.piece_at(sq("e1")).map(|p| (p.kind, p.color)),
            Some((PieceKind::King, Color::White))
        );
        assert_eq!(
            board.piece_at(sq("d8")).map(|p| (p.kind, p.color)),
            Some((PieceKind::Queen, Color::Black))
        );
        assert_eq!(board.pieces_of(Color::Black).count(), 16);
        assert!(!board.is_occupied(sq("e4")));
    }

    #[test]
    fn test_with_move_captures() {
        let board = Board::from_pieces([
            Piece::new(PieceKind::Rook, Color::White, sq("a1")),
            Piece::new(PieceKind::Knight, Color::Black, sq("a8")),
        ]);
        let next = board.with_move(sq("a1"), sq("a8"));
        assert_eq!(next.pieces().len(), 1);
        assert_eq!(next.piece_at(sq("a8")).map(|p| p.color), Some(Color::White));
        // Original untouched
        assert_eq!(board.pieces().len(), 2);
    }
}
