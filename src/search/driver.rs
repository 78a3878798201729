//! Iterative-deepening negamax search with alpha-beta pruning.
//!
//! Per-node order of business: draw check, transposition probe, quiescence
//! at the horizon, null-move pruning, razoring at shallow depth, then
//! generate/order/iterate with late-move reductions and bounded extensions.
//! Abort conditions (deadline, node cap, cancellation) are polled between
//! nodes; an aborted iteration never contributes results, the previous
//! completed iteration does.

use std::time::{Duration, Instant};

use crate::board::position::Position;
use crate::board::types::{Color, PieceKind};
use crate::engine::config::EngineConfig;
use crate::engine::limits::{CancelToken, SearchLimits, Termination};
use crate::eval::endgame::is_insufficient_material;
use crate::eval::scorer::BoardScorer;
use crate::movegen::apply::{make_move, make_null_move, unmake_move, unmake_null_move};
use crate::movegen::checks::is_king_in_check;
use crate::movegen::generate::generate_legal;
use crate::movegen::moves::Move;
use crate::search::ordering::{order_captures, order_moves, SearchHeuristics};
use crate::search::see::static_exchange_evaluation;
use crate::search::transposition::{Bound, TranspositionTable};

pub const MATE_SCORE: i32 = 30_000;

const ABORT_CHECK_INTERVAL: u64 = 4_096;
const QUIESCENCE_MAX_PLY: u8 = 16;
const SEE_PRUNE_THRESHOLD: i32 = -100;
const RAZOR_MARGIN_DEPTH_1: i32 = 300;
const RAZOR_MARGIN_DEPTH_2: i32 = 500;
const LMR_MIN_DEPTH: u8 = 3;

/// Raw driver output; the facade wraps this with timing, the principal
/// variation, and table statistics.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub best_move: Option<Move>,
    pub score: i32,
    pub depth_reached: u8,
    pub nodes: u64,
    pub beta_cutoffs: u64,
    pub termination: Termination,
}

struct SearchContext<'a, S: BoardScorer> {
    scorer: &'a S,
    config: &'a EngineConfig,
    tt: &'a mut TranspositionTable,
    heuristics: SearchHeuristics,
    cancel: &'a CancelToken,
    deadline: Option<Instant>,
    node_cap: Option<u64>,
    /// Iteration 1 ignores deadline and node cap so there is always a
    /// completed iteration to fall back on.
    first_iteration: bool,
    nodes: u64,
    beta_cutoffs: u64,
    stopped: Option<Termination>,
}

impl<'a, S: BoardScorer> SearchContext<'a, S> {
    /// Poll abort conditions between nodes. Once set, `stopped` is sticky
    /// and unwinds the whole search.
    #[inline]
    fn should_stop(&mut self) -> bool {
        if self.stopped.is_some() {
            return true;
        }
        if self.nodes % ABORT_CHECK_INTERVAL != 0 {
            return false;
        }
        if self.cancel.is_cancelled() {
            self.stopped = Some(Termination::Cancelled);
            return true;
        }
        if !self.first_iteration {
            if let Some(cap) = self.node_cap {
                if self.nodes >= cap {
                    self.stopped = Some(Termination::NodeCap);
                    return true;
                }
            }
            if let Some(deadline) = self.deadline {
                if Instant::now() >= deadline {
                    self.stopped = Some(Termination::Deadline);
                    return true;
                }
            }
        }
        false
    }
}

/// Run the full iterative-deepening search. `position` is restored to its
/// entry state before returning, whatever the termination reason.
pub fn search_root<S: BoardScorer>(
    position: &mut Position,
    scorer: &S,
    config: &EngineConfig,
    limits: &SearchLimits,
    cancel: &CancelToken,
    tt: &mut TranspositionTable,
) -> SearchOutcome {
    let started = Instant::now();
    tt.new_generation();
    tt.reset_stats();

    let root_moves = generate_legal(position);
    if root_moves.is_empty() {
        // Checkmate or stalemate at the root: terminal score, no move.
        let score = if is_king_in_check(position, position.side_to_move) {
            -MATE_SCORE
        } else {
            0
        };
        return SearchOutcome {
            best_move: None,
            score,
            depth_reached: 0,
            nodes: 0,
            beta_cutoffs: 0,
            termination: Termination::Completed,
        };
    }

    // The game is already drawn at the root: nothing to search for.
    if is_draw(position) {
        return SearchOutcome {
            best_move: Some(root_moves[0]),
            score: 0,
            depth_reached: 0,
            nodes: 0,
            beta_cutoffs: 0,
            termination: Termination::Completed,
        };
    }

    let mut ctx = SearchContext {
        scorer,
        config,
        tt,
        heuristics: SearchHeuristics::default(),
        cancel,
        deadline: limits
            .deadline_ms
            .filter(|ms| *ms > 0)
            .map(|ms| started + Duration::from_millis(ms)),
        node_cap: limits.max_nodes,
        first_iteration: true,
        nodes: 0,
        beta_cutoffs: 0,
        stopped: None,
    };

    let mut best_move = None;
    let mut best_score = 0i32;
    let mut depth_reached = 0u8;
    let mut prev_score = 0i32;
    let mut pv_move = None;
    let mut termination = Termination::Completed;

    for depth in 1..=limits.max_depth {
        ctx.first_iteration = depth == 1;

        let iteration = search_root_with_aspiration(
            position, &mut ctx, &root_moves, depth, prev_score, pv_move,
        );

        let Some((iter_move, iter_score)) = iteration else {
            termination = ctx.stopped.unwrap_or(Termination::Deadline);
            break;
        };

        best_move = Some(iter_move);
        best_score = iter_score;
        depth_reached = depth;
        prev_score = iter_score;
        pv_move = Some(iter_move);

        // A zero deadline asks for exactly the first iteration.
        if limits.deadline_ms == Some(0) {
            if depth < limits.max_depth {
                termination = Termination::Deadline;
            }
            break;
        }
    }

    // Cancelled before iteration 1 finished: fall back to the first legal
    // move rather than returning nothing.
    let best_move = best_move.unwrap_or(root_moves[0]);

    SearchOutcome {
        best_move: Some(best_move),
        score: best_score,
        depth_reached,
        nodes: ctx.nodes,
        beta_cutoffs: ctx.beta_cutoffs,
        termination,
    }
}

/// Aspiration shell: search a ±window around the previous iteration's score
/// and re-search with the full window on any fail.
fn search_root_with_aspiration<S: BoardScorer>(
    position: &mut Position,
    ctx: &mut SearchContext<'_, S>,
    root_moves: &[Move],
    depth: u8,
    prev_score: i32,
    pv_move: Option<Move>,
) -> Option<(Move, i32)> {
    if depth <= 1 {
        return negamax_root(
            position, ctx, root_moves, depth, -MATE_SCORE, MATE_SCORE, pv_move,
        );
    }

    let window = ctx.config.aspiration_window_cp.max(1);
    let alpha = prev_score.saturating_sub(window).max(-MATE_SCORE);
    let beta = prev_score.saturating_add(window).min(MATE_SCORE);

    let (mv, score) = negamax_root(position, ctx, root_moves, depth, alpha, beta, pv_move)?;
    if score <= alpha || score >= beta {
        // Fail low or fail high: the narrow window lied, settle it wide open.
        return negamax_root(
            position, ctx, root_moves, depth, -MATE_SCORE, MATE_SCORE, pv_move,
        );
    }
    Some((mv, score))
}

fn negamax_root<S: BoardScorer>(
    position: &mut Position,
    ctx: &mut SearchContext<'_, S>,
    root_moves: &[Move],
    depth: u8,
    mut alpha: i32,
    beta: i32,
    pv_move: Option<Move>,
) -> Option<(Move, i32)> {
    let hash_move = ctx
        .tt
        .probe(position.zobrist_key, 0)
        .map(|entry| entry.best_move)
        .filter(|mv| !mv.is_null());

    let mut moves = root_moves.to_vec();
    order_moves(position, &mut moves, pv_move, hash_move, 0, &ctx.heuristics);

    let mut best: Option<(Move, i32)> = None;

    for (index, &mv) in moves.iter().enumerate() {
        make_move(position, mv);
        let score = search_child(
            position,
            ctx,
            mv,
            depth,
            alpha,
            beta,
            0,
            0,
            depth,
            index,
            index == 0,
        );
        unmake_move(position);

        let score = -score?;

        if best.map_or(true, |(_, s)| score > s) {
            best = Some((mv, score));
        }
        if score > alpha {
            alpha = score;
        }
        if alpha >= beta {
            ctx.beta_cutoffs += 1;
            break;
        }
    }

    if let Some((mv, score)) = best {
        let bound = if score >= beta { Bound::Lower } else { Bound::Exact };
        ctx.tt.store(position.zobrist_key, depth, score, bound, mv, 0);
    }
    best
}

/// Search the move `mv` that was just made on `position`: decide extension
/// and reduction, recurse, and return the child's score (still from the
/// child's perspective; the caller negates). `ply` is the parent node's ply.
#[allow(clippy::too_many_arguments)]
fn search_child<S: BoardScorer>(
    position: &mut Position,
    ctx: &mut SearchContext<'_, S>,
    mv: Move,
    depth: u8,
    alpha: i32,
    beta: i32,
    ply: u8,
    ext_used: u8,
    root_depth: u8,
    move_index: usize,
    is_pv: bool,
) -> Option<i32> {
    let gives_check = is_king_in_check(position, position.side_to_move);

    let extension = extension_for(
        position,
        mv,
        opponent_previous_move(position),
        gives_check,
        ext_used,
        root_depth,
    );
    let child_depth = depth - 1 + extension;
    let ext_used = ext_used + extension;
    let child_ply = ply.saturating_add(1);

    let reduction = if extension == 0 {
        lmr_reduction(ctx.config, depth, move_index, mv, gives_check, &ctx.heuristics, ply)
    } else {
        0
    };

    if reduction > 0 {
        // Reduced null-window probe first; re-search at full depth when it
        // surprises us.
        let reduced = search_node(
            position,
            ctx,
            child_depth.saturating_sub(reduction),
            -alpha - 1,
            -alpha,
            child_ply,
            ext_used,
            root_depth,
            true,
            false,
        )?;
        if -reduced <= alpha {
            return Some(reduced);
        }
    }

    search_node(
        position, ctx, child_depth, -beta, -alpha, child_ply, ext_used, root_depth, true, is_pv,
    )
}

#[allow(clippy::too_many_arguments)]
fn search_node<S: BoardScorer>(
    position: &mut Position,
    ctx: &mut SearchContext<'_, S>,
    depth: u8,
    mut alpha: i32,
    beta: i32,
    ply: u8,
    ext_used: u8,
    root_depth: u8,
    allow_null: bool,
    is_pv: bool,
) -> Option<i32> {
    ctx.nodes += 1;
    if ctx.should_stop() {
        return None;
    }

    if is_draw(position) {
        return Some(0);
    }

    let alpha_orig = alpha;
    let mut hash_move = None;
    if let Some(entry) = ctx.tt.probe(position.zobrist_key, ply) {
        if TranspositionTable::usable_for_cutoff(&entry, depth, alpha, beta) {
            return Some(entry.score);
        }
        if !entry.best_move.is_null() {
            hash_move = Some(entry.best_move);
        }
    }

    if depth == 0 {
        return quiescence(position, ctx, alpha, beta, ply, 0);
    }

    let in_check = is_king_in_check(position, position.side_to_move);

    // Null move: hand the opponent a free tempo; if the position still fails
    // high, the real search would too.
    if allow_null
        && !in_check
        && depth >= 3
        && position.has_non_pawn_material(position.side_to_move)
        && beta < MATE_SCORE - 1_000
        && ctx.scorer.score(position) >= beta
    {
        let reduction = if depth >= 6 {
            ctx.config.null_move_reduction + 1
        } else {
            ctx.config.null_move_reduction
        };
        let undo = make_null_move(position);
        let score = search_node(
            position,
            ctx,
            depth.saturating_sub(1 + reduction),
            -beta,
            -beta + 1,
            ply.saturating_add(1),
            ext_used,
            root_depth,
            false,
            false,
        );
        unmake_null_move(position, undo);
        if -score? >= beta {
            return Some(beta);
        }
    }

    // Razoring: shallow non-PV nodes far below alpha drop straight to
    // quiescence.
    if !in_check && !is_pv && (depth == 1 || depth == 2) {
        let margin = if depth == 1 {
            RAZOR_MARGIN_DEPTH_1
        } else {
            RAZOR_MARGIN_DEPTH_2
        };
        if ctx.scorer.score(position) + margin < alpha {
            return quiescence(position, ctx, alpha, beta, ply, 0);
        }
    }

    let mut moves = generate_legal(position);
    if moves.is_empty() {
        return Some(if in_check {
            -MATE_SCORE + i32::from(ply)
        } else {
            0
        });
    }

    order_moves(
        position,
        &mut moves,
        None,
        hash_move,
        ply as usize,
        &ctx.heuristics,
    );

    let mut best = -MATE_SCORE;
    let mut best_move = Move::NULL;

    for (index, &mv) in moves.iter().enumerate() {
        make_move(position, mv);
        let score = search_child(
            position,
            ctx,
            mv,
            depth,
            alpha,
            beta,
            ply,
            ext_used,
            root_depth,
            index,
            is_pv && index == 0,
        );
        unmake_move(position);

        let score = -score?;

        if score > best {
            best = score;
            best_move = mv;
        }
        if score > alpha {
            alpha = score;
        }
        if alpha >= beta {
            ctx.beta_cutoffs += 1;
            if mv.is_quiet() {
                ctx.heuristics.record_killer(ply as usize, mv);
                ctx.heuristics
                    .record_cutoff(position.side_to_move, mv, depth);
            }
            break;
        }
    }

    let bound = if best <= alpha_orig {
        Bound::Upper
    } else if best >= beta {
        Bound::Lower
    } else {
        Bound::Exact
    };
    ctx.tt
        .store(position.zobrist_key, depth, best, bound, best_move, ply);

    Some(best)
}

/// Captures-only tactical resolution below the horizon, with stand-pat
/// cutoffs and full evasion search while in check.
fn quiescence<S: BoardScorer>(
    position: &mut Position,
    ctx: &mut SearchContext<'_, S>,
    mut alpha: i32,
    beta: i32,
    ply: u8,
    qply: u8,
) -> Option<i32> {
    ctx.nodes += 1;
    if ctx.should_stop() {
        return None;
    }

    if is_draw(position) {
        return Some(0);
    }

    let in_check = is_king_in_check(position, position.side_to_move);
    if in_check {
        // Stand-pat is meaningless in check; search every evasion.
        let mut moves = generate_legal(position);
        if moves.is_empty() {
            return Some(-MATE_SCORE + i32::from(ply));
        }
        order_moves(position, &mut moves, None, None, ply as usize, &ctx.heuristics);
        for mv in moves {
            make_move(position, mv);
            let score = quiescence(
                position,
                ctx,
                -beta,
                -alpha,
                ply.saturating_add(1),
                qply.saturating_add(1),
            );
            unmake_move(position);
            let score = -score?;
            if score >= beta {
                ctx.beta_cutoffs += 1;
                return Some(beta);
            }
            if score > alpha {
                alpha = score;
            }
        }
        return Some(alpha);
    }

    let stand_pat = ctx.scorer.score(position);
    if stand_pat >= beta {
        return Some(beta);
    }
    if stand_pat > alpha {
        alpha = stand_pat;
    }
    if qply >= QUIESCENCE_MAX_PLY {
        return Some(alpha);
    }

    let mut tactical: Vec<Move> = generate_legal(position)
        .into_iter()
        .filter(|mv| !mv.is_quiet())
        .collect();
    order_captures(position, &mut tactical);

    for mv in tactical {
        // Clearly losing exchanges are not worth resolving.
        if mv.is_capture()
            && !mv.is_promotion()
            && static_exchange_evaluation(position, mv) < SEE_PRUNE_THRESHOLD
        {
            continue;
        }

        make_move(position, mv);
        let score = quiescence(
            position,
            ctx,
            -beta,
            -alpha,
            ply.saturating_add(1),
            qply.saturating_add(1),
        );
        unmake_move(position);
        let score = -score?;

        if score >= beta {
            ctx.beta_cutoffs += 1;
            return Some(beta);
        }
        if score > alpha {
            alpha = score;
        }
    }

    Some(alpha)
}

/// Draw by fifty-move rule, insufficient material, or threefold repetition
/// of the current position since the last irreversible move.
pub fn is_draw(position: &Position) -> bool {
    if position.halfmove_clock >= 100 {
        return true;
    }
    if is_insufficient_material(position) {
        return true;
    }

    // Repetitions can only happen within the reversible-move window.
    let window = usize::from(position.halfmove_clock).saturating_add(1);
    let current = position.zobrist_key;
    let count = position
        .repetition_history
        .iter()
        .rev()
        .take(window)
        .filter(|&&key| key == current)
        .count();
    count >= 3
}

/// Extension for the move that was just made, capped per node and bounded by
/// half the root depth along any line.
fn extension_for(
    position: &Position,
    mv: Move,
    opponent_prev: Option<Move>,
    gives_check: bool,
    ext_used: u8,
    root_depth: u8,
) -> u8 {
    let mut ext = 0u8;

    if gives_check {
        ext += 1;
    }
    if mv.moved_piece() == PieceKind::Pawn && pawn_reached_far_rank(position, mv) {
        ext += 1;
    }
    if let Some(prev) = opponent_prev {
        if mv.is_capture() && prev.is_capture() && prev.to() == mv.to() {
            ext += 1;
        }
    }

    let budget = (root_depth / 2).saturating_sub(ext_used);
    ext.min(2).min(budget)
}

/// The opponent's reply that led here, for recapture detection: with `mv`
/// already made, it sits one below the top of the undo stack.
fn opponent_previous_move(position: &Position) -> Option<Move> {
    let len = position.undo_stack.len();
    if len >= 2 {
        Some(position.undo_stack[len - 2].mv)
    } else {
        None
    }
}

/// Pawn push landing on the 6th or 7th rank from the mover's viewpoint.
/// The mover is the side that is NOT to move; the move was just made.
fn pawn_reached_far_rank(position: &Position, mv: Move) -> bool {
    let mover = position.side_to_move.opposite();
    let rank = mv.to() / 8;
    match mover {
        Color::White => rank == 5 || rank == 6,
        Color::Black => rank == 1 || rank == 2,
    }
}

#[allow(clippy::too_many_arguments)]
fn lmr_reduction(
    config: &EngineConfig,
    depth: u8,
    move_index: usize,
    mv: Move,
    gives_check: bool,
    heuristics: &SearchHeuristics,
    ply: u8,
) -> u8 {
    if depth < LMR_MIN_DEPTH
        || move_index < config.lmr_min_move_index
        || !mv.is_quiet()
        || gives_check
        || heuristics.is_killer(ply as usize, mv)
    {
        return 0;
    }
    if move_index >= config.lmr_min_move_index * 3 {
        2
    } else {
        1
    }
}
