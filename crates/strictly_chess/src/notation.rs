//! Short algebraic move annotations for the human-readable game log.
//!
//! The annotation is informational only. No disambiguation is attempted
//! (`Nbd2` is written `Nd2`), and rule enforcement never reads it back.

use crate::{CastlingSide, PieceKind, Square};
use serde::{Deserialize, Serialize};

/// Everything needed to annotate one ply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveAnnotation {
    /// Kind of the moving piece before any promotion.
    pub kind: PieceKind,
    /// Origin square.
    pub from: Square,
    /// Destination square.
    pub to: Square,
    /// An enemy piece was removed by this move (including en passant).
    pub is_capture: bool,
    /// Kind the pawn promoted to, if any.
    pub promotion: Option<PieceKind>,
    /// Set when the move was a castling move.
    pub castling: Option<CastlingSide>,
    /// The opponent is in check after the move.
    pub is_check: bool,
    /// The opponent is checkmated after the move.
    pub is_mate: bool,
}

/// Formats a move as `Nf3`, `exd5`, `e8=Q+`, `O-O`, `Qxf7#` and so on.
pub fn format_move_log(annotation: &MoveAnnotation) -> String {
    let mut text = match annotation.castling {
        Some(side) => side.notation().to_string(),
        None => {
            let mut body = String::new();
            if annotation.kind == PieceKind::Pawn {
                if annotation.is_capture {
                    body.push(annotation.from.file_char());
                }
            } else {
                body.push_str(annotation.kind.letter());
            }
            if annotation.is_capture {
                body.push('x');
            }
            body.push_str(&annotation.to.to_string());
            if let Some(kind) = annotation.promotion {
                body.push('=');
                body.push_str(kind.letter());
            }
            body
        }
    };

    if annotation.is_mate {
        text.push('#');
    } else if annotation.is_check {
        text.push('+');
    }
    text
}

/// Strips a trailing check or mate marker.
pub fn strip_check_marker(annotation: &str) -> &str {
    annotation.trim_end_matches(['+', '#'])
}
