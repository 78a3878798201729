//! Make/unmake: in-place move application with exact reversal.
//!
//! `make_move` pushes an `UndoRecord`; `unmake_move` pops it and restores the
//! position bit-for-bit, including the incremental Zobrist key. The pair is
//! the transactional unit of the search: unwinding in reverse order always
//! recovers the pre-search position.

use crate::board::position::Position;
use crate::board::types::{
    Color, PieceKind, Square, CASTLE_BLACK_KINGSIDE, CASTLE_BLACK_QUEENSIDE,
    CASTLE_WHITE_KINGSIDE, CASTLE_WHITE_QUEENSIDE,
};
use crate::board::undo::UndoRecord;
use crate::movegen::moves::Move;
use crate::tables::zobrist::{
    castling_key, en_passant_file_key, piece_square_key, side_to_move_key,
};

/// Apply `mv` to `position`. The move must be pseudo-legal for the side to
/// move; legality (own king safety) is the generator's concern.
pub fn make_move(position: &mut Position, mv: Move) {
    let us = position.side_to_move;
    let them = us.opposite();
    let from = mv.from();
    let to = mv.to();
    let moved = mv.moved_piece();

    position.undo_stack.push(UndoRecord {
        mv,
        captured_piece: mv.captured_piece(),
        prev_castling_rights: position.castling_rights,
        prev_en_passant_square: position.en_passant_square,
        prev_halfmove_clock: position.halfmove_clock,
        prev_zobrist_key: position.zobrist_key,
    });

    let mut key = position.zobrist_key;
    key ^= castling_key(position.castling_rights);
    if let Some(ep) = position.en_passant_square {
        key ^= en_passant_file_key(ep % 8);
    }

    // Lift the mover off its origin square.
    position.clear_piece(us, moved, from);
    key ^= piece_square_key(us, moved, from);

    // Remove the captured piece, which for en passant sits behind the
    // destination square.
    if mv.is_en_passant() {
        let capture_sq = match us {
            Color::White => to - 8,
            Color::Black => to + 8,
        };
        position.clear_piece(them, PieceKind::Pawn, capture_sq);
        key ^= piece_square_key(them, PieceKind::Pawn, capture_sq);
    } else if let Some(captured) = mv.captured_piece() {
        position.clear_piece(them, captured, to);
        key ^= piece_square_key(them, captured, to);
    }

    // Drop the mover (or its promotion) on the destination.
    let landing = mv.promotion_piece().unwrap_or(moved);
    position.set_piece(us, landing, to);
    key ^= piece_square_key(us, landing, to);

    // Castling also moves the rook.
    if mv.is_castling() {
        let (rook_from, rook_to) = castling_rook_squares(us, to);
        position.clear_piece(us, PieceKind::Rook, rook_from);
        position.set_piece(us, PieceKind::Rook, rook_to);
        key ^= piece_square_key(us, PieceKind::Rook, rook_from);
        key ^= piece_square_key(us, PieceKind::Rook, rook_to);
    }

    update_castling_rights(position, moved, us, from, to);
    key ^= castling_key(position.castling_rights);

    position.en_passant_square = if mv.is_double_pawn_push() {
        Some((from + to) / 2)
    } else {
        None
    };
    if let Some(ep) = position.en_passant_square {
        key ^= en_passant_file_key(ep % 8);
    }

    if moved == PieceKind::Pawn || mv.is_capture() {
        position.halfmove_clock = 0;
    } else {
        position.halfmove_clock = position.halfmove_clock.saturating_add(1);
    }
    if us == Color::Black {
        position.fullmove_number = position.fullmove_number.saturating_add(1);
    }

    position.side_to_move = them;
    key ^= side_to_move_key();

    position.zobrist_key = key;
    position.repetition_history.push(key);
    position.recalc_occupancy();
}

/// Reverse the most recent `make_move`. Panics only if the undo stack is
/// empty, which indicates a caller bug.
pub fn unmake_move(position: &mut Position) {
    let undo = position
        .undo_stack
        .pop()
        .expect("unmake_move called with no made move");
    let mv = undo.mv;

    // The side that made the move is the one *not* to move now.
    let us = position.side_to_move.opposite();
    let them = position.side_to_move;
    let from = mv.from();
    let to = mv.to();
    let moved = mv.moved_piece();

    let landing = mv.promotion_piece().unwrap_or(moved);
    position.clear_piece(us, landing, to);
    position.set_piece(us, moved, from);

    if mv.is_en_passant() {
        let capture_sq = match us {
            Color::White => to - 8,
            Color::Black => to + 8,
        };
        position.set_piece(them, PieceKind::Pawn, capture_sq);
    } else if let Some(captured) = undo.captured_piece {
        position.set_piece(them, captured, to);
    }

    if mv.is_castling() {
        let (rook_from, rook_to) = castling_rook_squares(us, to);
        position.clear_piece(us, PieceKind::Rook, rook_to);
        position.set_piece(us, PieceKind::Rook, rook_from);
    }

    position.castling_rights = undo.prev_castling_rights;
    position.en_passant_square = undo.prev_en_passant_square;
    position.halfmove_clock = undo.prev_halfmove_clock;
    position.zobrist_key = undo.prev_zobrist_key;
    if us == Color::Black {
        position.fullmove_number -= 1;
    }
    position.side_to_move = us;
    position.repetition_history.pop();
    position.recalc_occupancy();
}

/// Snapshot returned by `make_null_move` and consumed by `unmake_null_move`.
#[derive(Debug, Clone, Copy)]
pub struct NullMoveUndo {
    prev_en_passant_square: Option<Square>,
    prev_halfmove_clock: u16,
    prev_zobrist_key: u64,
}

/// Pass the turn without moving. Used by null-move pruning; never recorded
/// on the undo stack because it is not a game move.
pub fn make_null_move(position: &mut Position) -> NullMoveUndo {
    let undo = NullMoveUndo {
        prev_en_passant_square: position.en_passant_square,
        prev_halfmove_clock: position.halfmove_clock,
        prev_zobrist_key: position.zobrist_key,
    };

    if let Some(ep) = position.en_passant_square {
        position.zobrist_key ^= en_passant_file_key(ep % 8);
    }
    position.en_passant_square = None;
    position.side_to_move = position.side_to_move.opposite();
    position.zobrist_key ^= side_to_move_key();
    position.halfmove_clock = position.halfmove_clock.saturating_add(1);
    position.repetition_history.push(position.zobrist_key);

    undo
}

pub fn unmake_null_move(position: &mut Position, undo: NullMoveUndo) {
    position.repetition_history.pop();
    position.side_to_move = position.side_to_move.opposite();
    position.en_passant_square = undo.prev_en_passant_square;
    position.halfmove_clock = undo.prev_halfmove_clock;
    position.zobrist_key = undo.prev_zobrist_key;
}

/// Copy-semantics application, used by the baseline generator and tests.
pub fn apply_move(position: &Position, mv: Move) -> Position {
    let mut next = position.clone();
    make_move(&mut next, mv);
    next
}

fn castling_rook_squares(color: Color, king_to: Square) -> (Square, Square) {
    match (color, king_to) {
        (Color::White, 6) => (7, 5),    // h1 -> f1
        (Color::White, 2) => (0, 3),    // a1 -> d1
        (Color::Black, 62) => (63, 61), // h8 -> f8
        (Color::Black, 58) => (56, 59), // a8 -> d8
        _ => unreachable!("castling destination must be g1/c1/g8/c8"),
    }
}

fn update_castling_rights(
    position: &mut Position,
    moved: PieceKind,
    us: Color,
    from: Square,
    to: Square,
) {
    if moved == PieceKind::King {
        position.castling_rights &= match us {
            Color::White => !(CASTLE_WHITE_KINGSIDE | CASTLE_WHITE_QUEENSIDE),
            Color::Black => !(CASTLE_BLACK_KINGSIDE | CASTLE_BLACK_QUEENSIDE),
        };
    }

    // A rook leaving home, or anything landing on a rook home square
    // (capturing the rook), clears the matching right.
    for sq in [from, to] {
        position.castling_rights &= match sq {
            0 => !CASTLE_WHITE_QUEENSIDE,
            7 => !CASTLE_WHITE_KINGSIDE,
            56 => !CASTLE_BLACK_QUEENSIDE,
            63 => !CASTLE_BLACK_KINGSIDE,
            _ => 0xFF,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::position::Position;
    use crate::movegen::generate::generate_legal;
    use crate::tables::zobrist::compute_zobrist_key;
    use crate::utils::notation::parse_long_algebraic;

    fn play(position: &mut Position, text: &str) {
        let mv = parse_long_algebraic(text, position)
            .unwrap_or_else(|| panic!("{text} should be legal"));
        make_move(position, mv);
    }

    #[test]
    fn make_then_unmake_restores_exactly() {
        let original = Position::start();
        for mv in generate_legal(&original) {
            let mut position = original.clone();
            make_move(&mut position, mv);
            assert_ne!(position.zobrist_key, original.zobrist_key);
            unmake_move(&mut position);
            assert_eq!(position, original, "mismatch after unmaking {mv}");
        }
    }

    #[test]
    fn incremental_hash_matches_recomputation_along_a_line() {
        let mut position = Position::start();
        for text in ["e2e4", "e7e5", "g1f3", "b8c6", "f1b5", "g8f6", "e1g1"] {
            play(&mut position, text);
            assert_eq!(
                position.zobrist_key,
                compute_zobrist_key(&position),
                "hash drifted after {text}"
            );
        }
    }

    #[test]
    fn castling_moves_rook_and_clears_rights() {
        let mut position =
            Position::from_fen("4k3/8/8/8/8/8/8/R3K2R w KQ - 0 1").expect("FEN should parse");
        play(&mut position, "e1g1");
        assert_eq!(position.piece_on(6), Some((Color::White, PieceKind::King)));
        assert_eq!(position.piece_on(5), Some((Color::White, PieceKind::Rook)));
        assert_eq!(position.piece_on(7), None);
        assert_eq!(position.castling_rights, 0);

        unmake_move(&mut position);
        assert_eq!(position.piece_on(4), Some((Color::White, PieceKind::King)));
        assert_eq!(position.piece_on(7), Some((Color::White, PieceKind::Rook)));
        assert_eq!(
            position.castling_rights,
            CASTLE_WHITE_KINGSIDE | CASTLE_WHITE_QUEENSIDE
        );
    }

    #[test]
    fn en_passant_capture_removes_the_bypassed_pawn() {
        let mut position =
            Position::from_fen("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3")
                .expect("FEN should parse");
        play(&mut position, "e5f6");
        assert_eq!(position.piece_on(45), Some((Color::White, PieceKind::Pawn)));
        assert_eq!(position.piece_on(37), None, "f5 pawn is gone");

        unmake_move(&mut position);
        assert_eq!(position.piece_on(37), Some((Color::Black, PieceKind::Pawn)));
        assert_eq!(position.piece_on(36), Some((Color::White, PieceKind::Pawn)));
    }

    #[test]
    fn promotion_replaces_the_pawn() {
        let mut position =
            Position::from_fen("4k3/P7/8/8/8/8/8/4K3 w - - 0 1").expect("FEN should parse");
        play(&mut position, "a7a8q");
        assert_eq!(position.piece_on(56), Some((Color::White, PieceKind::Queen)));
        assert_eq!(
            position.pieces[Color::White.index()][PieceKind::Pawn.index()],
            0
        );

        unmake_move(&mut position);
        assert_eq!(position.piece_on(48), Some((Color::White, PieceKind::Pawn)));
    }

    #[test]
    fn rook_capture_on_home_square_clears_opponent_right() {
        let mut position =
            Position::from_fen("r3k3/8/8/8/8/8/8/R3K2R w KQq - 0 1").expect("FEN should parse");
        play(&mut position, "a1a8");
        assert_eq!(
            position.castling_rights & CASTLE_BLACK_QUEENSIDE,
            0,
            "captured rook takes the right with it"
        );
    }

    #[test]
    fn halfmove_clock_resets_on_pawn_move_and_capture() {
        let mut position = Position::start();
        play(&mut position, "g1f3");
        assert_eq!(position.halfmove_clock, 1);
        play(&mut position, "e7e5");
        assert_eq!(position.halfmove_clock, 0);
        play(&mut position, "f3e5");
        assert_eq!(position.halfmove_clock, 0);
    }

    #[test]
    fn fullmove_number_increments_after_black() {
        let mut position = Position::start();
        assert_eq!(position.fullmove_number, 1);
        play(&mut position, "e2e4");
        assert_eq!(position.fullmove_number, 1);
        play(&mut position, "e7e5");
        assert_eq!(position.fullmove_number, 2);
    }

    #[test]
    fn null_move_round_trips_hash_and_state() {
        let mut position =
            Position::from_fen("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 2")
                .expect("FEN should parse");
        let before = position.clone();
        let undo = make_null_move(&mut position);
        assert_eq!(position.side_to_move, Color::Black);
        assert_eq!(position.en_passant_square, None);
        assert_eq!(position.zobrist_key, compute_zobrist_key(&position));
        unmake_null_move(&mut position, undo);
        assert_eq!(position, before);
    }

    #[test]
    fn castling_rights_never_gain_bits_over_random_play() {
        use rand::rngs::StdRng;
        use rand::seq::IndexedRandom;
        use rand::SeedableRng;

        let mut rng = StdRng::seed_from_u64(7);
        let mut position = Position::start();
        let mut prev_rights = position.castling_rights;

        for _ in 0..120 {
            let moves = generate_legal(&position);
            let Some(&mv) = moves.as_slice().choose(&mut rng) else {
                break;
            };
            make_move(&mut position, mv);
            assert_eq!(
                position.castling_rights & !prev_rights,
                0,
                "rights gained a bit"
            );
            prev_rights = position.castling_rights;
        }
    }
}
