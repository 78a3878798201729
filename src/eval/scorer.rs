//! Pluggable static evaluation behind the `BoardScorer` trait.
//!
//! Search delegates leaf scoring to this seam so heuristics can be swapped
//! without touching search code. Scores are centipawns from the perspective
//! of the side to move.

use crate::board::position::Position;
use crate::board::types::{Color, PieceKind, Square};
use crate::eval::endgame::{is_endgame, lone_king_drive_white_minus_black};
use crate::eval::psqt::piece_square_bonus;

pub trait BoardScorer: Send + Sync {
    /// Score from the perspective of the side to move.
    fn score(&self, position: &Position) -> i32;
}

/// Material-only baseline. Useful for deterministic tests where positional
/// terms would obscure the expectation.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialScorer;

impl MaterialScorer {
    fn material_white_minus_black(position: &Position) -> i32 {
        let mut score = 0i32;
        for piece in [
            PieceKind::Pawn,
            PieceKind::Knight,
            PieceKind::Bishop,
            PieceKind::Rook,
            PieceKind::Queen,
        ] {
            let white = position.pieces[Color::White.index()][piece.index()].count_ones() as i32;
            let black = position.pieces[Color::Black.index()][piece.index()].count_ones() as i32;
            score += (white - black) * piece.value();
        }
        score
    }
}

impl BoardScorer for MaterialScorer {
    fn score(&self, position: &Position) -> i32 {
        side_relative(position, Self::material_white_minus_black(position))
    }
}

/// Default evaluator: material + piece-square tables + the lone-king mating
/// drive for KQ-vs-K / KR-vs-K endings.
#[derive(Debug, Clone, Copy, Default)]
pub struct PstScorer;

impl PstScorer {
    fn positional_white_minus_black(position: &Position, endgame: bool) -> i32 {
        let mut score = 0i32;
        for color in [Color::White, Color::Black] {
            let sign = if color == Color::White { 1 } else { -1 };
            for piece in PieceKind::ALL {
                let mut bb = position.pieces[color.index()][piece.index()];
                while bb != 0 {
                    let sq = bb.trailing_zeros() as Square;
                    score += sign * piece_square_bonus(piece, color, sq, endgame);
                    bb &= bb - 1;
                }
            }
        }
        score
    }
}

impl BoardScorer for PstScorer {
    fn score(&self, position: &Position) -> i32 {
        let endgame = is_endgame(position);
        let white_minus_black = MaterialScorer::material_white_minus_black(position)
            + Self::positional_white_minus_black(position, endgame)
            + lone_king_drive_white_minus_black(position);
        side_relative(position, white_minus_black)
    }
}

#[inline]
fn side_relative(position: &Position, white_minus_black: i32) -> i32 {
    match position.side_to_move {
        Color::White => white_minus_black,
        Color::Black => -white_minus_black,
    }
}
