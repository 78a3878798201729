//! Undo records for make/unmake.

use crate::board::types::{CastlingRights, PieceKind, Square};
use crate::movegen::moves::Move;

/// State snapshot pushed by `make_move` and consumed by `unmake_move`.
/// Records everything a move can destroy that cannot be recomputed from the
/// move itself: rights, en-passant target, clock, and the prior hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UndoRecord {
    pub mv: Move,
    pub captured_piece: Option<PieceKind>,
    pub prev_castling_rights: CastlingRights,
    pub prev_en_passant_square: Option<Square>,
    pub prev_halfmove_clock: u16,
    pub prev_zobrist_key: u64,
}
