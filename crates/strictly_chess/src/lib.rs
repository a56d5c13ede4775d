//! Strictly Chess - pure chess rules
//!
//! Stateless move legality, check, checkmate, stalemate and draw detection
//! over an explicit board snapshot, plus the short algebraic annotations and
//! the named-opening catalog used for the human-readable move log.
//!
//! # Example
//!
//! ```
//! use strictly_chess::{Board, Color, MovedSet, PieceKind, is_valid_move};
//!
//! let board = Board::standard();
//! let legal = is_valid_move(
//!     "e2".parse().unwrap(),
//!     "e4".parse().unwrap(),
//!     PieceKind::Pawn,
//!     Color::White,
//!     &board,
//!     &MovedSet::new(),
//!     None,
//! );
//! assert!(legal);
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod board;
mod notation;
mod openings;
mod rules;
mod types;

// Crate-level exports - Domain types
pub use board::{Board, MovedSet};
pub use types::{Color, Piece, PieceKind, Square, SquareParseError};

// Crate-level exports - Rules
pub use rules::{
    CastlingMove, CastlingSide, RulesError, castling_move, has_legal_move, is_checkmate,
    is_insufficient_material, is_king_in_check, is_path_clear, is_promotion_square,
    is_square_attacked, is_stalemate, is_valid_move, leaves_king_in_check, promote,
};

// Crate-level exports - Move log
pub use notation::{MoveAnnotation, format_move_log, strip_check_marker};
pub use openings::{MAX_OPENING_PLY, NamedOpening, OPENING_CATALOG, OpeningKind, detect_opening};
