//! Core domain types for chess.

use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Side to move.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Color {
    /// White (moves first).
    White,
    /// Black.
    Black,
}

impl Color {
    /// Returns the opposing color.
    pub fn opponent(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    /// Rank index (0-based) of the back rank.
    pub fn home_rank(self) -> u8 {
        match self {
            Color::White => 0,
            Color::Black => 7,
        }
    }

    /// Rank index pawns of this color start on.
    pub fn pawn_start_rank(self) -> u8 {
        match self {
            Color::White => 1,
            Color::Black => 6,
        }
    }

    /// Rank index a pawn of this color promotes on.
    pub fn promotion_rank(self) -> u8 {
        self.opponent().home_rank()
    }

    /// Forward rank delta for pawns.
    pub fn pawn_direction(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }
}

/// Kind of chess piece.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum PieceKind {
    /// Pawn.
    #[strum(to_string = "pawn", serialize = "p")]
    Pawn,
    /// Knight.
    #[strum(to_string = "knight", serialize = "n")]
    Knight,
    /// Bishop.
    #[strum(to_string = "bishop", serialize = "b")]
    Bishop,
    /// Rook.
    #[strum(to_string = "rook", serialize = "r")]
    Rook,
    /// Queen.
    #[strum(to_string = "queen", serialize = "q")]
    Queen,
    /// King.
    #[strum(to_string = "king", serialize = "k")]
    King,
}

impl PieceKind {
    /// Letter used in move annotations (empty for pawns).
    pub fn letter(self) -> &'static str {
        match self {
            PieceKind::Pawn => "",
            PieceKind::Knight => "N",
            PieceKind::Bishop => "B",
            PieceKind::Rook => "R",
            PieceKind::Queen => "Q",
            PieceKind::King => "K",
        }
    }

    /// Whether a pawn may be promoted to this kind.
    pub fn is_promotion_target(self) -> bool {
        matches!(
            self,
            PieceKind::Queen | PieceKind::Rook | PieceKind::Bishop | PieceKind::Knight
        )
    }

    /// Bishops and knights.
    pub fn is_minor(self) -> bool {
        matches!(self, PieceKind::Bishop | PieceKind::Knight)
    }
}

/// Error returned when a string is not an algebraic square.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Invalid square '{}': expected a1-h8", input)]
pub struct SquareParseError {
    /// The rejected input.
    pub input: String,
}

/// A board coordinate, file `a`-`h` by rank `1`-`8`.
///
/// Stored as 0-based indices and serialized in algebraic form (`"e4"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    /// Creates a square from 0-based file and rank indices.
    ///
    /// Returns `None` when either index is off the board.
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        (file < 8 && rank < 8).then_some(Self { file, rank })
    }

    /// 0-based file index (`a` = 0).
    pub fn file(self) -> u8 {
        self.file
    }

    /// 0-based rank index (`1` = 0).
    pub fn rank(self) -> u8 {
        self.rank
    }

    /// File letter, `'a'..='h'`.
    pub fn file_char(self) -> char {
        char::from(b'a' + self.file)
    }

    /// Square shifted by the given deltas, if it stays on the board.
    pub fn offset(self, file_delta: i8, rank_delta: i8) -> Option<Self> {
        let file = i8::try_from(self.file).ok()? + file_delta;
        let rank = i8::try_from(self.rank).ok()? + rank_delta;
        Self::new(u8::try_from(file).ok()?, u8::try_from(rank).ok()?)
    }

    /// Iterates all 64 squares, `a1`, `a2`, ..., `h8`.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..8u8).flat_map(|file| (0..8u8).map(move |rank| Square { file, rank }))
    }
}

impl std::fmt::Display for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank + 1)
    }
}

impl FromStr for Square {
    type Err = SquareParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || SquareParseError {
            input: s.to_string(),
        };
        let bytes = s.trim().as_bytes();
        let [file, rank] = bytes else {
            return Err(err());
        };
        let file = file.to_ascii_lowercase();
        if !(b'a'..=b'h').contains(&file) || !(b'1'..=b'8').contains(rank) {
            return Err(err());
        }
        Ok(Self {
            file: file - b'a',
            rank: rank - b'1',
        })
    }
}

impl TryFrom<String> for Square {
    type Error = SquareParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Square> for String {
    fn from(square: Square) -> Self {
        square.to_string()
    }
}

/// A piece standing on a square.
///
/// Pieces are values: moving a piece produces a copy with a new position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    /// Piece kind, serialized as `type` on the wire.
    #[serde(rename = "type")]
    pub kind: PieceKind,
    /// Owner.
    pub color: Color,
    /// Current square.
    pub position: Square,
}

impl Piece {
    /// Creates a piece.
    pub fn new(kind: PieceKind, color: Color, position: Square) -> Self {
        Self {
            kind,
            color,
            position,
        }
    }

    /// Copy of this piece standing on `to`.
    pub fn moved_to(self, to: Square) -> Self {
        Self {
            position: to,
            ..self
        }
    }
}
