//! Static Exchange Evaluation.
//!
//! Simulates the capture sequence on a square with both sides always
//! recapturing with their least valuable attacker, revealing x-ray attackers
//! as pieces leave the board. The result is the net material outcome in
//! centipawns for the side making the first capture; either side may stand
//! pat mid-sequence, which the backward minimax pass accounts for.

use crate::board::position::Position;
use crate::board::types::{Color, PieceKind, Square};
use crate::movegen::moves::Move;
use crate::tables::attacks::{bishop_attacks, king_attacks, knight_attacks, pawn_attacks, rook_attacks};

const MAX_EXCHANGE_DEPTH: usize = 32;

/// Net material outcome of playing the capture `mv`. Non-captures score 0.
pub fn static_exchange_evaluation(position: &Position, mv: Move) -> i32 {
    if !mv.is_capture() {
        return 0;
    }

    let us = position.side_to_move;
    let target = mv.to();

    let mut gains = [0i32; MAX_EXCHANGE_DEPTH];
    let mut occupied = position.occupancy_all & !(1u64 << mv.from());

    gains[0] = match mv.captured_piece() {
        Some(victim) => victim.value(),
        None => 0,
    };
    if mv.is_en_passant() {
        let behind = match us {
            Color::White => target - 8,
            Color::Black => target + 8,
        };
        occupied &= !(1u64 << behind);
    }

    // A promoting capture puts a stronger piece on the square and banks the
    // upgrade immediately.
    let mut piece_on_square = mv.moved_piece();
    if let Some(promo) = mv.promotion_piece() {
        gains[0] += promo.value() - PieceKind::Pawn.value();
        piece_on_square = promo;
    }

    let mut depth = 0usize;
    let mut side = us.opposite();

    while depth + 1 < MAX_EXCHANGE_DEPTH {
        let Some((attacker_sq, attacker)) =
            least_valuable_attacker(position, target, side, occupied)
        else {
            break;
        };

        // A king may only conclude the exchange; it cannot recapture into a
        // still-defended square.
        if attacker == PieceKind::King {
            let occupied_after = occupied & !(1u64 << attacker_sq);
            if least_valuable_attacker(position, target, side.opposite(), occupied_after)
                .is_some()
            {
                break;
            }
        }

        depth += 1;
        gains[depth] = piece_on_square.value() - gains[depth - 1];
        occupied &= !(1u64 << attacker_sq);
        piece_on_square = attacker;
        side = side.opposite();
    }

    // Each side stands pat when continuing would lose material.
    while depth > 0 {
        gains[depth - 1] = -(-gains[depth - 1]).max(gains[depth]);
        depth -= 1;
    }
    gains[0]
}

/// Cheapest piece of `side` attacking `target` under `occupied`, with
/// sliders seeing through already-removed pieces.
fn least_valuable_attacker(
    position: &Position,
    target: Square,
    side: Color,
    occupied: u64,
) -> Option<(Square, PieceKind)> {
    let idx = side.index();

    let pawns = position.pieces[idx][PieceKind::Pawn.index()]
        & occupied
        & pawn_attacks(side.opposite(), target);
    if pawns != 0 {
        return Some((pawns.trailing_zeros() as Square, PieceKind::Pawn));
    }

    let knights = position.pieces[idx][PieceKind::Knight.index()] & occupied & knight_attacks(target);
    if knights != 0 {
        return Some((knights.trailing_zeros() as Square, PieceKind::Knight));
    }

    let diag = bishop_attacks(target, occupied);
    let bishops = position.pieces[idx][PieceKind::Bishop.index()] & occupied & diag;
    if bishops != 0 {
        return Some((bishops.trailing_zeros() as Square, PieceKind::Bishop));
    }

    let orth = rook_attacks(target, occupied);
    let rooks = position.pieces[idx][PieceKind::Rook.index()] & occupied & orth;
    if rooks != 0 {
        return Some((rooks.trailing_zeros() as Square, PieceKind::Rook));
    }

    let queens = position.pieces[idx][PieceKind::Queen.index()] & occupied & (diag | orth);
    if queens != 0 {
        return Some((queens.trailing_zeros() as Square, PieceKind::Queen));
    }

    let kings = position.pieces[idx][PieceKind::King.index()] & occupied & king_attacks(target);
    if kings != 0 {
        return Some((kings.trailing_zeros() as Square, PieceKind::King));
    }

    None
}
