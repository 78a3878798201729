//! Board state: piece placement, rights, clocks, and incremental hashing.

pub mod fen;
pub mod position;
pub mod types;
pub mod undo;

pub use position::Position;
pub use types::{CastlingRights, Color, PieceKind, Square};
pub use undo::UndoRecord;
