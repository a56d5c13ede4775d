//! Pawn promotion.

use crate::{Color, Piece, PieceKind, Square};
use tracing::instrument;

/// Error raised by rule operations that take caller-chosen input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum RulesError {
    /// Pawns promote only to queen, rook, bishop or knight.
    #[display("Invalid promotion piece type: {kind}")]
    InvalidPromotion {
        /// The rejected target kind.
        kind: PieceKind,
    },
}

impl std::error::Error for RulesError {}

/// Whether a pawn of `color` arriving on `to` must promote.
pub fn is_promotion_square(kind: PieceKind, color: Color, to: Square) -> bool {
    kind == PieceKind::Pawn && to.rank() == color.promotion_rank()
}

/// Replaces the piece's type, keeping its color and square.
///
/// # Errors
///
/// Returns [`RulesError::InvalidPromotion`] unless `target` is a queen,
/// rook, bishop or knight.
#[instrument(level = "debug")]
pub fn promote(piece: Piece, target: PieceKind) -> Result<Piece, RulesError> {
    if !target.is_promotion_target() {
        return Err(RulesError::InvalidPromotion { kind: target });
    }
    Ok(Piece {
        kind: target,
        ..piece
    })
}
