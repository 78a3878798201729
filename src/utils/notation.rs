//! Coordinate notation: squares as `a1..h8`, moves as `e2e4` / `e7e8q`.

use crate::board::position::Position;
use crate::board::types::Square;
use crate::movegen::generate::generate_legal;
use crate::movegen::moves::Move;

/// Convert a coordinate like `e4` to a square index.
#[inline]
pub fn algebraic_to_square(text: &str) -> Result<Square, String> {
    let bytes = text.as_bytes();
    if bytes.len() != 2 {
        return Err(format!("invalid algebraic square: {text}"));
    }

    let file = bytes[0];
    let rank = bytes[1];

    if !(b'a'..=b'h').contains(&file) {
        return Err(format!("invalid file character: {}", file as char));
    }
    if !(b'1'..=b'8').contains(&rank) {
        return Err(format!("invalid rank character: {}", rank as char));
    }

    Ok((rank - b'1') * 8 + (file - b'a'))
}

/// Convert a square index to its coordinate, e.g. `0 -> a1`.
#[inline]
pub fn square_to_algebraic(square: Square) -> String {
    debug_assert!(square < 64);
    let file_char = char::from(b'a' + square % 8);
    let rank_char = char::from(b'1' + square / 8);
    format!("{file_char}{rank_char}")
}

/// Resolve long algebraic text (`e2e4`, `e7e8q`) against the legal moves of
/// `position`. Returns `None` when the text does not name a legal move.
pub fn parse_long_algebraic(text: &str, position: &Position) -> Option<Move> {
    if text.len() != 4 && text.len() != 5 {
        return None;
    }
    let from = algebraic_to_square(text.get(0..2)?).ok()?;
    let to = algebraic_to_square(text.get(2..4)?).ok()?;
    let promo = match text.as_bytes().get(4).copied() {
        None => None,
        Some(b'q') => Some(crate::board::types::PieceKind::Queen),
        Some(b'r') => Some(crate::board::types::PieceKind::Rook),
        Some(b'b') => Some(crate::board::types::PieceKind::Bishop),
        Some(b'n') => Some(crate::board::types::PieceKind::Knight),
        Some(_) => return None,
    };

    generate_legal(position)
        .into_iter()
        .find(|mv| mv.from() == from && mv.to() == to && mv.promotion_piece() == promo)
}
