//! Process-wide read-only lookup tables: attack masks, distance grids, and
//! Zobrist keys. Everything here is computed once with fixed inputs and never
//! mutated afterwards.

pub mod attacks;
pub mod distance;
pub mod zobrist;
