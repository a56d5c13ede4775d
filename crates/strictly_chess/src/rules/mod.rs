//! Chess rules.
//!
//! Pure functions over an explicit board snapshot. Nothing here holds
//! state between calls: the caller passes the pieces, the moved-square
//! set and the en-passant target every time.

mod castling;
mod movement;
mod promotion;
mod status;

pub use castling::{CastlingMove, CastlingSide, castling_move};
pub use movement::{is_path_clear, is_valid_move};
pub use promotion::{RulesError, is_promotion_square, promote};
pub use status::{
    has_legal_move, is_checkmate, is_insufficient_material, is_king_in_check, is_square_attacked,
    is_stalemate, leaves_king_in_check,
};
