//! The `Mover` seam: anything that can pick a move for a position.
//!
//! The searching engine is the real implementation; the seeded random mover
//! exists for harness tests and strength baselines.

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;

use crate::board::position::Position;
use crate::engine::facade::Engine;
use crate::engine::limits::{CancelToken, SearchLimits};
use crate::errors::EngineResult;
use crate::movegen::generate::generate_legal;
use crate::movegen::moves::Move;

pub trait Mover {
    /// Pick a move, or `None` when the position is terminal.
    fn choose_move(&mut self, position: &Position) -> EngineResult<Option<Move>>;
}

/// Uniform random legal mover with a fixed seed, so harness games are
/// reproducible.
pub struct RandomMover {
    rng: StdRng,
}

impl RandomMover {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Mover for RandomMover {
    fn choose_move(&mut self, position: &Position) -> EngineResult<Option<Move>> {
        let legal = generate_legal(position);
        Ok(legal.as_slice().choose(&mut self.rng).copied())
    }
}

/// The searching engine behind the `Mover` seam, at a fixed depth.
pub struct SearchingMover {
    engine: Engine,
    limits: SearchLimits,
}

impl SearchingMover {
    pub fn new(engine: Engine, limits: SearchLimits) -> Self {
        Self { engine, limits }
    }
}

impl Mover for SearchingMover {
    fn choose_move(&mut self, position: &Position) -> EngineResult<Option<Move>> {
        let report = self
            .engine
            .search(position, &self.limits, &CancelToken::new())?;
        Ok(report.best_move)
    }
}
