//! Random starting plans and restart-based optimization.
use std::collections::HashSet;

use rand::Rng;

use crate::constants::{RANDOM_WEIGHT_FLOOR, RANDOM_WEIGHT_HALF_LIFE_SECS};
use crate::error::GameError;
use crate::prereq::{Move, PrereqGraph};
use crate::search::{ClimbOptions, ScoredPlan, climb};
use crate::state::GameState;
use crate::upgrade::ProductionMode;

/// Weight of an option reachable in `wait` seconds; sooner is likelier.
#[must_use]
pub fn option_weight(wait: f64) -> f64 {
    RANDOM_WEIGHT_FLOOR + (-wait / RANDOM_WEIGHT_HALF_LIFE_SECS).exp2()
}

/// Build a plausible plan by playing randomly, favoring quick purchases.
///
/// Levels still unbought at the horizon are appended in a random order that
/// respects `graph`. Then `switches[i]` production switches are inserted for
/// upgrade `i`, alternating alternate and primary, somewhere after the
/// upgrade's first level.
///
/// # Errors
///
/// Returns `GameError::NotSwitchable` when switches are requested for an
/// upgrade without an alternate profile.
pub fn random_plan<R>(
    state: &GameState,
    graph: &PrereqGraph,
    switches: &[usize],
    rng: &mut R,
) -> Result<Vec<Move>, GameError>
where
    R: Rng + ?Sized,
{
    let def = state.definition().clone();
    let mut game = state.clone();
    game.update_rates();
    let mut scheduled: HashSet<Move> = (0..def.len())
        .flat_map(|idx| (1..=game.level(idx)).map(move |level| Move::level_up(idx, level)))
        .collect();
    let mut seq = Vec::new();

    let mut options = Vec::new();
    loop {
        options.clear();
        for idx in 0..def.len() {
            if let Some(wait) = game.time_till_level_up(idx)? {
                options.push((idx, wait));
            }
        }
        if options.is_empty() {
            break;
        }
        let total: f64 = options.iter().map(|&(_, wait)| option_weight(wait)).sum();
        let mut roll = rng.gen_range(0.0..total);
        let mut pick = options.len() - 1;
        for (i, &(_, wait)) in options.iter().enumerate() {
            let weight = option_weight(wait);
            if roll < weight {
                pick = i;
                break;
            }
            roll -= weight;
        }
        let (idx, wait) = options[pick];
        game.advance_time(wait);
        game.level_up(idx)?;
        let item = Move::level_up(idx, game.level(idx));
        scheduled.insert(item);
        seq.push(item);
    }
    log::trace!("random play bought {} levels", seq.len());

    let mut extras: Vec<Move> = def
        .upgrades
        .iter()
        .enumerate()
        .flat_map(|(idx, up)| {
            (game.level(idx) + 1..=up.max_level()).map(move |level| Move::level_up(idx, level))
        })
        .collect();
    while !extras.is_empty() {
        let ready: Vec<usize> = extras
            .iter()
            .enumerate()
            .filter(|(_, item)| {
                graph
                    .prerequisites(item)
                    .iter()
                    .all(|p| scheduled.contains(p))
            })
            .map(|(i, _)| i)
            .collect();
        if ready.is_empty() {
            log::warn!("{} levels have unsatisfiable prerequisites", extras.len());
            seq.append(&mut extras);
            break;
        }
        let item = extras.swap_remove(ready[rng.gen_range(0..ready.len())]);
        scheduled.insert(item);
        seq.push(item);
    }

    for (idx, &count) in switches.iter().enumerate() {
        if count == 0 {
            continue;
        }
        let up = def.upgrade(idx)?;
        if !up.as_producer().is_some_and(|p| p.is_switchable()) {
            return Err(GameError::NotSwitchable {
                name: up.name().to_string(),
            });
        }
        let first = Move::level_up(idx, 1);
        let min_idx = seq.iter().position(|m| *m == first).map_or(0, |pos| pos + 1);
        let mut slots: Vec<usize> = (0..count)
            .map(|_| rng.gen_range(min_idx..=seq.len()))
            .collect();
        slots.sort_unstable();
        for (i, slot) in slots.into_iter().enumerate() {
            let mode = if i % 2 == 0 {
                ProductionMode::Alternate
            } else {
                ProductionMode::Primary
            };
            seq.insert(slot + i, Move::switch(idx, mode));
        }
    }
    Ok(seq)
}

/// Settings for restart-based optimization.
#[derive(Debug, Clone, PartialEq)]
pub struct RestartOptions {
    pub climb: ClimbOptions,
    /// Production switches per upgrade index.
    pub switches: Vec<usize>,
    pub restarts: usize,
}

/// Climb from `opts.restarts` random plans in turn and keep the best.
/// `on_best` sees each new overall best and the restart that produced it.
///
/// # Errors
///
/// Propagates errors from [`random_plan`] and [`climb`].
pub fn restarts<R, F>(
    state: &GameState,
    graph: &PrereqGraph,
    opts: &RestartOptions,
    rng: &mut R,
    mut on_best: F,
) -> Result<Option<ScoredPlan>, GameError>
where
    R: Rng + ?Sized,
    F: FnMut(&ScoredPlan, usize),
{
    let mut best: Option<ScoredPlan> = None;
    for round in 0..opts.restarts {
        let plan = random_plan(state, graph, &opts.switches, rng)?;
        let initial = opts.climb.search.objective.score(&plan, state)?;
        let found = climb(plan, state, graph, &opts.climb, |_, _| {})?;
        log::info!(
            "restart {round}: initial {initial:.4}, final {:.4}",
            found.score
        );
        if best.as_ref().is_none_or(|b| found.score > b.score) {
            on_best(&found, round);
            best = Some(found);
        }
    }
    Ok(best)
}
