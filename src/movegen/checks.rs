//! Attack queries: square attack tests, checker enumeration, and pin
//! detection. These drive both the legality filter and the search's
//! in-check decisions.

use crate::board::position::Position;
use crate::board::types::{Color, PieceKind, Square};
use crate::tables::attacks::{
    between, bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks,
    BISHOP_RAYS, ROOK_RAYS,
};

#[inline]
pub fn is_king_in_check(position: &Position, color: Color) -> bool {
    match position.king_square(color) {
        Some(king_sq) => is_square_attacked(position, king_sq, color.opposite()),
        None => false,
    }
}

/// True when any piece of `attacker_color` attacks `square` under the current
/// occupancy.
pub fn is_square_attacked(position: &Position, square: Square, attacker_color: Color) -> bool {
    is_square_attacked_with_occupancy(position, square, attacker_color, position.occupancy_all)
}

/// Attack test with a caller-supplied occupancy. King evasions pass occupancy
/// with the moving king removed so sliders see through its origin square.
pub fn is_square_attacked_with_occupancy(
    position: &Position,
    square: Square,
    attacker_color: Color,
    occupancy: u64,
) -> bool {
    let idx = attacker_color.index();

    // A pawn on `square` would attack exactly the squares from which enemy
    // pawns attack `square`, so probe with the defender's attack pattern.
    let pawns = position.pieces[idx][PieceKind::Pawn.index()];
    if pawn_attacks(attacker_color.opposite(), square) & pawns != 0 {
        return true;
    }

    if knight_attacks(square) & position.pieces[idx][PieceKind::Knight.index()] != 0 {
        return true;
    }

    if king_attacks(square) & position.pieces[idx][PieceKind::King.index()] != 0 {
        return true;
    }

    let bishops_queens = position.pieces[idx][PieceKind::Bishop.index()]
        | position.pieces[idx][PieceKind::Queen.index()];
    if bishops_queens != 0 && bishop_attacks(square, occupancy) & bishops_queens != 0 {
        return true;
    }

    let rooks_queens = position.pieces[idx][PieceKind::Rook.index()]
        | position.pieces[idx][PieceKind::Queen.index()];
    if rooks_queens != 0 && rook_attacks(square, occupancy) & rooks_queens != 0 {
        return true;
    }

    false
}

/// All pieces of `attacker_color` attacking `square`, as `(square, kind)`.
pub fn attackers_to_square(
    position: &Position,
    square: Square,
    attacker_color: Color,
) -> Vec<(Square, PieceKind)> {
    attackers_with_occupancy(position, square, attacker_color, position.occupancy_all)
}

pub fn attackers_with_occupancy(
    position: &Position,
    square: Square,
    attacker_color: Color,
    occupancy: u64,
) -> Vec<(Square, PieceKind)> {
    let idx = attacker_color.index();
    let mut attackers = Vec::new();

    let mut push_all = |mut bb: u64, kind: PieceKind| {
        while bb != 0 {
            attackers.push((bb.trailing_zeros() as Square, kind));
            bb &= bb - 1;
        }
    };

    let pawns = position.pieces[idx][PieceKind::Pawn.index()]
        & pawn_attacks(attacker_color.opposite(), square);
    push_all(pawns, PieceKind::Pawn);

    let knights = position.pieces[idx][PieceKind::Knight.index()] & knight_attacks(square);
    push_all(knights, PieceKind::Knight);

    let diag = bishop_attacks(square, occupancy);
    push_all(
        position.pieces[idx][PieceKind::Bishop.index()] & diag,
        PieceKind::Bishop,
    );

    let orth = rook_attacks(square, occupancy);
    push_all(
        position.pieces[idx][PieceKind::Rook.index()] & orth,
        PieceKind::Rook,
    );

    push_all(
        position.pieces[idx][PieceKind::Queen.index()] & (diag | orth),
        PieceKind::Queen,
    );

    let kings = position.pieces[idx][PieceKind::King.index()] & king_attacks(square);
    push_all(kings, PieceKind::King);

    attackers
}

/// Enemy pieces currently giving check to `color`'s king.
pub fn checkers(position: &Position, color: Color) -> Vec<(Square, PieceKind)> {
    match position.king_square(color) {
        Some(king_sq) => attackers_to_square(position, king_sq, color.opposite()),
        None => Vec::new(),
    }
}

/// Absolute pins against `color`'s king. `ray_masks[sq]` is non-zero exactly
/// when the piece on `sq` is pinned, and then holds the squares it may still
/// occupy: the pin ray between king and pinner, plus the pinner itself.
#[derive(Debug, Clone)]
pub struct PinInfo {
    pub pinned: u64,
    ray_masks: [u64; 64],
}

impl PinInfo {
    #[inline]
    pub fn is_pinned(&self, square: Square) -> bool {
        self.pinned & (1u64 << square) != 0
    }

    /// Squares a pinned piece may move to without exposing the king. Only
    /// meaningful when `is_pinned(square)`.
    #[inline]
    pub fn allowed_squares(&self, square: Square) -> u64 {
        self.ray_masks[square as usize]
    }
}

pub fn compute_pins(position: &Position, color: Color) -> PinInfo {
    let mut info = PinInfo {
        pinned: 0,
        ray_masks: [0u64; 64],
    };
    let Some(king_sq) = position.king_square(color) else {
        return info;
    };

    let own = position.occupancy_by_color[color.index()];
    let enemy_idx = color.opposite().index();

    let enemy_orth = position.pieces[enemy_idx][PieceKind::Rook.index()]
        | position.pieces[enemy_idx][PieceKind::Queen.index()];
    let enemy_diag = position.pieces[enemy_idx][PieceKind::Bishop.index()]
        | position.pieces[enemy_idx][PieceKind::Queen.index()];

    let mut candidates =
        (enemy_orth & ROOK_RAYS[king_sq as usize]) | (enemy_diag & BISHOP_RAYS[king_sq as usize]);

    while candidates != 0 {
        let slider_sq = candidates.trailing_zeros() as Square;
        candidates &= candidates - 1;

        // Skip sliders that only see the king on the wrong geometry
        // (a queen can sit on both ray tables).
        let on_orth = ROOK_RAYS[king_sq as usize] & (1u64 << slider_sq) != 0
            && (enemy_orth & (1u64 << slider_sq)) != 0;
        let on_diag = BISHOP_RAYS[king_sq as usize] & (1u64 << slider_sq) != 0
            && (enemy_diag & (1u64 << slider_sq)) != 0;
        if !on_orth && !on_diag {
            continue;
        }

        let between_mask = between(king_sq, slider_sq);
        let blockers = between_mask & position.occupancy_all;

        // Exactly one blocker, and it is ours: an absolute pin.
        if blockers.count_ones() == 1 && blockers & own != 0 {
            let pinned_sq = blockers.trailing_zeros() as usize;
            info.pinned |= blockers;
            info.ray_masks[pinned_sq] = between_mask | (1u64 << slider_sq);
        }
    }

    info
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::position::Position;

    #[test]
    fn rook_checks_along_file() {
        let position =
            Position::from_fen("4k3/8/8/8/4r3/8/8/4K3 w - - 0 1").expect("FEN should parse");
        assert!(is_king_in_check(&position, Color::White));
        assert!(!is_king_in_check(&position, Color::Black));
        let found = checkers(&position, Color::White);
        assert_eq!(found, vec![(28, PieceKind::Rook)]);
    }

    #[test]
    fn pawn_attack_direction_is_color_correct() {
        // Black pawn on d4 attacks c3/e3 where the white king sits.
        let position =
            Position::from_fen("4k3/8/8/8/3p4/4K3/8/8 w - - 0 1").expect("FEN should parse");
        assert!(is_king_in_check(&position, Color::White));

        // A white pawn in the same spot does not check the white king.
        let quiet =
            Position::from_fen("4k3/8/8/8/3P4/4K3/8/8 w - - 0 1").expect("FEN should parse");
        assert!(!is_king_in_check(&quiet, Color::White));
    }

    #[test]
    fn double_check_reports_both_attackers() {
        let position =
            Position::from_fen("4k3/8/8/8/8/5n2/8/4K2r w - - 0 1").expect("FEN should parse");
        let found = checkers(&position, Color::White);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn pinned_bishop_is_detected_with_its_ray() {
        // White bishop on e2 pinned by the rook on e8 against the king on e1.
        let position =
            Position::from_fen("4r1k1/8/8/8/8/8/4B3/4K3 w - - 0 1").expect("FEN should parse");
        let pins = compute_pins(&position, Color::White);
        assert!(pins.is_pinned(12)); // e2
        let allowed = pins.allowed_squares(12);
        assert_ne!(allowed & (1u64 << 60), 0, "capturing the pinner is allowed");
        assert_ne!(allowed & (1u64 << 28), 0, "staying on the ray is allowed");
        assert_eq!(allowed & (1u64 << 19), 0, "leaving the ray is not");
    }

    #[test]
    fn two_blockers_break_the_pin() {
        let position =
            Position::from_fen("4r1k1/8/8/8/4N3/8/4B3/4K3 w - - 0 1").expect("FEN should parse");
        let pins = compute_pins(&position, Color::White);
        assert_eq!(pins.pinned, 0);
    }

    #[test]
    fn enemy_blocker_is_not_a_pin() {
        let position =
            Position::from_fen("4r1k1/8/8/8/4n3/8/8/4K3 w - - 0 1").expect("FEN should parse");
        let pins = compute_pins(&position, Color::White);
        assert_eq!(pins.pinned, 0);
    }

    #[test]
    fn king_removed_occupancy_sees_through() {
        // King on e1 attacked by rook on e8: stepping back along the ray to
        // e2 is still attacked once the king square is vacated.
        let position =
            Position::from_fen("4r1k1/8/8/8/8/8/8/4K3 w - - 0 1").expect("FEN should parse");
        let occ_without_king = position.occupancy_all & !(1u64 << 4);
        assert!(is_square_attacked_with_occupancy(
            &position,
            12,
            Color::Black,
            occ_without_king
        ));
    }
}
