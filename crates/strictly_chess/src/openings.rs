//! Named opening and defence catalog.

use crate::notation::strip_check_marker;
use serde::Serialize;

/// Openings are named after White's setup, defences after Black's reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OpeningKind {
    /// Named for White's choice.
    Opening,
    /// Named for Black's choice.
    Defence,
}

/// A catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NamedOpening {
    /// Common name.
    pub name: &'static str,
    /// ECO classification code.
    pub eco: &'static str,
    /// Opening or defence.
    pub kind: OpeningKind,
    /// Move annotations from the initial position, without check markers.
    pub moves: &'static [&'static str],
}

/// Detection stops once the log is longer than this.
pub const MAX_OPENING_PLY: usize = 12;

const fn defence(
    name: &'static str,
    eco: &'static str,
    moves: &'static [&'static str],
) -> NamedOpening {
    NamedOpening {
        name,
        eco,
        kind: OpeningKind::Defence,
        moves,
    }
}

const fn opening(
    name: &'static str,
    eco: &'static str,
    moves: &'static [&'static str],
) -> NamedOpening {
    NamedOpening {
        name,
        eco,
        kind: OpeningKind::Opening,
        moves,
    }
}

/// Catalog scanned in order; the first entry whose moves prefix the log wins.
pub const OPENING_CATALOG: &[NamedOpening] = &[
    defence("Sicilian Defence", "B20", &["e4", "c5"]),
    defence("French Defence", "C00", &["e4", "e6"]),
    defence("Caro-Kann Defence", "B10", &["e4", "c6"]),
    defence("Scandinavian Defence", "B01", &["e4", "d5"]),
    defence("Alekhine's Defence", "B02", &["e4", "Nf6"]),
    defence("Pirc Defence", "B07", &["e4", "d6", "d4", "Nf6"]),
    defence("Petrov's Defence", "C42", &["e4", "e5", "Nf3", "Nf6"]),
    defence("Philidor Defence", "C41", &["e4", "e5", "Nf3", "d6"]),
    opening("Ruy Lopez", "C60", &["e4", "e5", "Nf3", "Nc6", "Bb5"]),
    opening("Italian Game", "C50", &["e4", "e5", "Nf3", "Nc6", "Bc4"]),
    opening("Scotch Game", "C44", &["e4", "e5", "Nf3", "Nc6", "d4"]),
    opening("King's Gambit", "C30", &["e4", "e5", "f4"]),
    opening("Queen's Gambit", "D06", &["d4", "d5", "c4"]),
    defence("King's Indian Defence", "E60", &["d4", "Nf6", "c4", "g6"]),
    defence(
        "Nimzo-Indian Defence",
        "E20",
        &["d4", "Nf6", "c4", "e6", "Nc3", "Bb4"],
    ),
    defence("Dutch Defence", "A80", &["d4", "f5"]),
    opening("English Opening", "A10", &["c4"]),
];

/// Finds the first catalog entry whose move list is a prefix of `log`.
///
/// Returns `None` once the log exceeds [`MAX_OPENING_PLY`]. Check and mate
/// markers in the log are ignored.
pub fn detect_opening<S: AsRef<str>>(log: &[S]) -> Option<&'static NamedOpening> {
    if log.len() > MAX_OPENING_PLY {
        return None;
    }
    OPENING_CATALOG.iter().find(|entry| {
        entry.moves.len() <= log.len()
            && entry
                .moves
                .iter()
                .zip(log)
                .all(|(expected, played)| *expected == strip_check_marker(played.as_ref()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_fits_detection_window() {
        assert!(
            OPENING_CATALOG
                .iter()
                .all(|entry| !entry.moves.is_empty() && entry.moves.len() <= MAX_OPENING_PLY)
        );
    }

    #[test]
    fn test_no_entry_shadows_another() {
        for (i, a) in OPENING_CATALOG.iter().enumerate() {
            for b in &OPENING_CATALOG[i + 1..] {
                let shared = a.moves.len().min(b.moves.len());
                assert_ne!(
                    a.moves[..shared],
                    b.moves[..shared],
                    "{} and {} overlap",
                    a.name,
                    b.name
                );
            }
        }
    }
}
