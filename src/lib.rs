//! quince_chess: a chess engine core.
//!
//! Given a legal position, the crate enumerates legal moves, searches the
//! game tree under depth/node/time budgets, evaluates leaves, and returns a
//! best move with a principal variation and search statistics. Everything
//! else (boards, UIs, protocols) is an embedding concern; the surface is
//! [`engine::Engine::search`] plus the cooperative
//! [`engine::worker::SearchWorker`] boundary.

pub mod board;
pub mod engine;
pub mod errors;
pub mod eval;
pub mod movegen;
pub mod search;
pub mod tables;
pub mod utils;

pub use board::Position;
pub use engine::{CancelToken, Engine, EngineConfig, SearchLimits, SearchReport, Termination};
pub use errors::{EngineError, EngineResult};
pub use movegen::{generate_legal, Move};
