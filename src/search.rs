//! Search: the driver, its caches, and its ordering heuristics.

pub mod driver;
pub mod ordering;
pub mod see;
pub mod transposition;

pub use driver::{search_root, SearchOutcome, MATE_SCORE};
pub use transposition::TranspositionTable;
