//! Legal move generation: pseudo-legal candidates filtered for king safety.
//!
//! Two filters sit behind the `MoveGenerator` trait. `FilteredMoveGenerator`
//! is the production path: it computes checkers and absolute pins once per
//! position and rejects moves structurally, falling back to make-and-test
//! only for en-passant captures. `BaselineMoveGenerator` applies every
//! candidate and tests king safety directly; it defines correctness, and the
//! fast path must always produce the same move set.

use crate::board::position::Position;
use crate::board::types::PieceKind;
use crate::movegen::apply::{make_move, unmake_move};
use crate::movegen::checks::{
    checkers, compute_pins, is_king_in_check, is_square_attacked_with_occupancy, PinInfo,
};
use crate::movegen::moves::Move;
use crate::movegen::pieces::generate_pseudo_legal;
use crate::tables::attacks::between;

pub trait MoveGenerator: Send + Sync {
    fn legal_moves(&self, position: &Position) -> Vec<Move>;
}

/// Pin-aware legality filter.
pub struct FilteredMoveGenerator;

/// Make-and-test reference filter.
pub struct BaselineMoveGenerator;

/// Generate all legal moves through the production filter. The output order
/// is unspecified; ordering is the search driver's concern.
#[inline]
pub fn generate_legal(position: &Position) -> Vec<Move> {
    FilteredMoveGenerator.legal_moves(position)
}

impl MoveGenerator for FilteredMoveGenerator {
    fn legal_moves(&self, position: &Position) -> Vec<Move> {
        let us = position.side_to_move;
        let Some(king_sq) = position.king_square(us) else {
            return Vec::new();
        };

        let mut pseudo = Vec::with_capacity(64);
        generate_pseudo_legal(position, &mut pseudo);

        let checking = checkers(position, us);
        let pins = compute_pins(position, us);

        // Non-king moves during single check must land here: capture the
        // checker or interpose on a slider's ray.
        let check_mask = match checking.as_slice() {
            [] => !0u64,
            [(checker_sq, _)] => (1u64 << checker_sq) | between(king_sq, *checker_sq),
            _ => 0u64, // double check: king moves only
        };

        let occ_without_king = position.occupancy_all & !(1u64 << king_sq);
        let mut scratch: Option<Position> = None;

        pseudo.retain(|&mv| {
            if mv.moved_piece() == PieceKind::King {
                if mv.is_castling() {
                    // Fully validated during generation (king not in check,
                    // path empty, transit and destination unattacked).
                    return true;
                }
                return !is_square_attacked_with_occupancy(
                    position,
                    mv.to(),
                    us.opposite(),
                    occ_without_king,
                );
            }

            if check_mask == 0 {
                return false;
            }

            if mv.is_en_passant() {
                // The capture removes a pawn that is not on the destination
                // square, which can expose the king along a rank; resolve by
                // playing the move out.
                let scratch = scratch.get_or_insert_with(|| position.clone());
                make_move(scratch, mv);
                let legal = !is_king_in_check(scratch, us);
                unmake_move(scratch);
                return legal;
            }

            if 1u64 << mv.to() & check_mask == 0 {
                return false;
            }

            legal_under_pin(&pins, mv)
        });

        pseudo
    }
}

impl MoveGenerator for BaselineMoveGenerator {
    fn legal_moves(&self, position: &Position) -> Vec<Move> {
        let us = position.side_to_move;
        let mut pseudo = Vec::with_capacity(64);
        generate_pseudo_legal(position, &mut pseudo);

        let mut scratch = position.clone();
        pseudo.retain(|&mv| {
            make_move(&mut scratch, mv);
            let legal = !is_king_in_check(&scratch, us);
            unmake_move(&mut scratch);
            legal
        });
        pseudo
    }
}

#[inline]
fn legal_under_pin(pins: &PinInfo, mv: Move) -> bool {
    !pins.is_pinned(mv.from()) || pins.allowed_squares(mv.from()) & (1u64 << mv.to()) != 0
}
