//! The engine facade: one entry point, `search(position, limits)`.
//!
//! Owns the transposition table across calls so consecutive searches of
//! related positions benefit from each other, and turns the raw driver
//! outcome into a full report with the principal variation and statistics.

use std::time::Instant;

use crate::board::position::Position;
use crate::engine::config::EngineConfig;
use crate::engine::limits::{CancelToken, SearchLimits, Termination};
use crate::eval::scorer::PstScorer;
use crate::movegen::apply::make_move;
use crate::movegen::generate::generate_legal;
use crate::movegen::moves::Move;
use crate::search::driver::search_root;
use crate::search::transposition::TranspositionTable;
use crate::errors::EngineResult;

/// Everything a caller learns from one search.
#[derive(Debug, Clone)]
pub struct SearchReport {
    /// Best move found; `None` only when the root has no legal moves.
    pub best_move: Option<Move>,
    /// Score in centipawns from the root mover's perspective, with mate
    /// scores near ±`MATE_SCORE`.
    pub score_cp: i32,
    /// Best line from the root, recovered from the transposition table.
    pub principal_variation: Vec<Move>,
    /// Deepest fully completed iteration.
    pub depth_reached: u8,
    pub nodes: u64,
    pub time_ms: u64,
    /// Transposition hits per probe over this search.
    pub tt_hit_rate: f64,
    /// Beta cutoffs per node over this search.
    pub cutoff_rate: f64,
    pub termination: Termination,
}

pub struct Engine {
    config: EngineConfig,
    tt: TranspositionTable,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            tt: TranspositionTable::new_with_mb(config.hash_mb),
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Reconfigure; resizing the hash rebuilds the table.
    pub fn set_option(&mut self, name: &str, value: &str) -> EngineResult<()> {
        let old_hash = self.config.hash_mb;
        self.config.set_option(name, value)?;
        if self.config.hash_mb != old_hash {
            self.tt = TranspositionTable::new_with_mb(self.config.hash_mb);
        }
        Ok(())
    }

    /// Forget everything learned from previous searches.
    pub fn new_game(&mut self) {
        self.tt.clear();
    }

    /// Search `position` under `limits`, honoring `cancel` within a bounded
    /// number of nodes. The position is returned unchanged.
    pub fn search(
        &mut self,
        position: &Position,
        limits: &SearchLimits,
        cancel: &CancelToken,
    ) -> EngineResult<SearchReport> {
        limits.validate()?;

        let started = Instant::now();
        let mut root = position.clone();
        let outcome = search_root(
            &mut root,
            &PstScorer,
            &self.config,
            limits,
            cancel,
            &mut self.tt,
        );

        let stats = self.tt.stats();
        let principal_variation = self.principal_variation(position, outcome.depth_reached);

        Ok(SearchReport {
            best_move: outcome.best_move,
            score_cp: outcome.score,
            principal_variation,
            depth_reached: outcome.depth_reached,
            nodes: outcome.nodes,
            time_ms: started.elapsed().as_millis() as u64,
            tt_hit_rate: stats.hit_rate(),
            cutoff_rate: if outcome.nodes == 0 {
                0.0
            } else {
                outcome.beta_cutoffs as f64 / outcome.nodes as f64
            },
            termination: outcome.termination,
        })
    }

    /// Walk the stored best moves from the root, validating each against the
    /// legal move list so a stale or collided entry ends the line instead of
    /// corrupting it.
    fn principal_variation(&mut self, position: &Position, max_len: u8) -> Vec<Move> {
        let mut pv = Vec::new();
        let mut current = position.clone();

        for _ in 0..max_len {
            let Some(entry) = self.tt.probe(current.zobrist_key, 0) else {
                break;
            };
            let candidate = entry.best_move;
            if candidate.is_null() || !generate_legal(&current).contains(&candidate) {
                break;
            }
            pv.push(candidate);
            make_move(&mut current, candidate);
        }

        pv
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::EngineError;
    use crate::search::driver::MATE_SCORE;

    fn engine() -> Engine {
        Engine::new(EngineConfig {
            hash_mb: 8,
            ..EngineConfig::default()
        })
    }

    #[test]
    fn rejects_zero_depth() {
        let mut engine = engine();
        let err = engine
            .search(
                &Position::start(),
                &SearchLimits {
                    max_depth: 0,
                    ..SearchLimits::default()
                },
                &CancelToken::new(),
            )
            .expect_err("zero depth should be rejected");
        assert!(matches!(err, EngineError::LimitsError(_)));
    }

    #[test]
    fn search_does_not_mutate_the_caller_position() {
        let mut engine = engine();
        let position = Position::start();
        let before = position.clone();
        engine
            .search(&position, &SearchLimits::depth(3), &CancelToken::new())
            .expect("search should run");
        assert_eq!(position, before);
    }

    #[test]
    fn report_carries_statistics_and_pv() {
        let mut engine = engine();
        let report = engine
            .search(&Position::start(), &SearchLimits::depth(4), &CancelToken::new())
            .expect("search should run");

        assert_eq!(report.depth_reached, 4);
        assert!(report.nodes > 0);
        assert!(report.best_move.is_some());
        assert!(!report.principal_variation.is_empty());
        assert_eq!(report.principal_variation[0], report.best_move.unwrap());
        assert!((0.0..=1.0).contains(&report.tt_hit_rate));
        assert!((0.0..=1.0).contains(&report.cutoff_rate));
        assert_eq!(report.termination, Termination::Completed);

        // The PV must be a playable line.
        let mut replay = Position::start();
        for mv in &report.principal_variation {
            assert!(generate_legal(&replay).contains(mv));
            make_move(&mut replay, *mv);
        }
    }

    #[test]
    fn mate_in_one_scores_near_mate() {
        let mut engine = engine();
        let position = Position::from_fen(
            "rnbqkbnr/pppp1ppp/8/4p3/6P1/5P2/PPPPP2P/RNBQKBNR b KQkq g3 0 2",
        )
        .expect("FEN should parse");
        let report = engine
            .search(&position, &SearchLimits::depth(2), &CancelToken::new())
            .expect("search should run");
        assert_eq!(report.best_move.unwrap().to_long_algebraic(), "d8h4");
        assert!(report.score_cp >= MATE_SCORE - 2);
    }

    #[test]
    fn terminal_root_reports_no_move() {
        let mut engine = engine();
        let stalemate = Position::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1")
            .expect("FEN should parse");
        let report = engine
            .search(&stalemate, &SearchLimits::depth(3), &CancelToken::new())
            .expect("search should run");
        assert_eq!(report.best_move, None);
        assert_eq!(report.score_cp, 0);
        assert!(report.principal_variation.is_empty());
    }

    #[test]
    fn castling_through_check_is_never_chosen() {
        // White king e1, rook h1, black rook f8: e1g1 must not appear among
        // legal moves, while other king moves survive.
        let position = Position::from_fen("4kr2/8/8/8/8/8/8/4K2R w K - 0 1")
            .expect("FEN should parse");
        let moves = generate_legal(&position);
        assert!(!moves.iter().any(|m| m.to_long_algebraic() == "e1g1"));
        let king_moves: Vec<_> = moves
            .iter()
            .filter(|m| m.moved_piece() == crate::board::types::PieceKind::King)
            .collect();
        assert!(!king_moves.is_empty());
    }

    #[test]
    fn hash_resize_rebuilds_the_table() {
        let mut engine = engine();
        engine
            .search(&Position::start(), &SearchLimits::depth(3), &CancelToken::new())
            .expect("search should run");
        engine.set_option("hash_mb", "4").expect("valid option");
        assert_eq!(engine.config().hash_mb, 4);
    }
}
