//! Hill climbing over plan neighborhoods.
use crate::constants::DEFAULT_MAX_DEPTH;
use crate::error::GameError;
use crate::neighbors::Neighborhood;
use crate::prereq::{Move, PrereqGraph};
use crate::replay::Objective;
use crate::state::GameState;

/// Knobs for one improvement pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    pub neighborhood: Neighborhood,
    pub objective: Objective,
    /// Lookahead: 1 scores direct neighbors only, each extra level also
    /// explores the single-step neighbors of every neighbor.
    pub depth: usize,
    /// Stop the pass at the first strictly better plan.
    pub first_improvement: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            neighborhood: Neighborhood::default(),
            objective: Objective::default(),
            depth: 1,
            first_improvement: false,
        }
    }
}

/// A plan together with its score under some objective.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPlan {
    pub plan: Vec<Move>,
    pub score: f64,
}

/// One pass over the neighborhood of `seq`, keeping only strictly better
/// plans. Neighbors whose replay fails are skipped. The returned score is
/// never below `seq_score`.
#[must_use]
pub fn find_improvement(
    seq: &[Move],
    seq_score: f64,
    state: &GameState,
    graph: &PrereqGraph,
    opts: &SearchOptions,
) -> ScoredPlan {
    let mut best = ScoredPlan {
        plan: seq.to_vec(),
        score: seq_score,
    };
    explore(seq, state, graph, opts, opts.neighborhood, opts.depth.max(1), &mut best);
    best
}

/// Returns true when a first-improvement pass should stop.
fn explore(
    seq: &[Move],
    state: &GameState,
    graph: &PrereqGraph,
    opts: &SearchOptions,
    neighborhood: Neighborhood,
    depth: usize,
    best: &mut ScoredPlan,
) -> bool {
    for neighbor in neighborhood.neighbors(seq, graph) {
        let score = match opts.objective.score(&neighbor, state) {
            Ok(score) => score,
            Err(err) => {
                log::trace!("skipping infeasible neighbor: {err}");
                continue;
            }
        };
        let improved = score > best.score;
        if improved {
            log::trace!("neighbor improves {:.4} -> {score:.4}", best.score);
            best.score = score;
            best.plan.clone_from(&neighbor);
            if opts.first_improvement {
                return true;
            }
        }
        if depth > 1
            && explore(&neighbor, state, graph, opts, Neighborhood::SingleStep, depth - 1, best)
        {
            return true;
        }
    }
    false
}

/// Settings for a full climb.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClimbOptions {
    pub search: SearchOptions,
    /// Deepest lookahead tried after shallower passes stall.
    pub max_depth: usize,
    /// Give up instead of deepening while the score is below this.
    pub depth_threshold: Option<f64>,
}

impl Default for ClimbOptions {
    fn default() -> Self {
        Self {
            search: SearchOptions::default(),
            max_depth: DEFAULT_MAX_DEPTH,
            depth_threshold: None,
        }
    }
}

/// Repeat improvement passes until the plan is a local optimum.
///
/// Each stalled pass deepens the lookahead by one, up to `max_depth`; an
/// improvement resets it to 1. `on_improve` sees every new best plan and the
/// depth that found it.
///
/// # Errors
///
/// Returns the replay error when `plan` itself cannot be scored.
pub fn climb<F>(
    plan: Vec<Move>,
    state: &GameState,
    graph: &PrereqGraph,
    opts: &ClimbOptions,
    mut on_improve: F,
) -> Result<ScoredPlan, GameError>
where
    F: FnMut(&ScoredPlan, usize),
{
    let score = opts.search.objective.score(&plan, state)?;
    let mut best = ScoredPlan { plan, score };
    let mut depth = 1;
    loop {
        let pass = SearchOptions {
            depth,
            ..opts.search
        };
        let found = find_improvement(&best.plan, best.score, state, graph, &pass);
        if found.score > best.score {
            log::info!(
                "depth {depth}: improved by {:.4} to {:.4}",
                found.score - best.score,
                found.score
            );
            best = found;
            on_improve(&best, depth);
            depth = 1;
            continue;
        }
        if opts.depth_threshold.is_some_and(|thr| best.score < thr) {
            log::debug!("score {:.4} below depth threshold, stopping", best.score);
            break;
        }
        depth += 1;
        if depth > opts.max_depth {
            break;
        }
    }
    Ok(best)
}
