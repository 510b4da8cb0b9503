//! Replaying a plan against a game state and scoring the outcome.
use std::fmt;
use std::str::FromStr;

use crate::constants::{REPLAY_WAIT_PADDING_SECS, SECS_PER_HOUR, UNREACHABLE_SPARE_SECS};
use crate::error::GameError;
use crate::prereq::Move;
use crate::state::GameState;

/// What the optimizer maximizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Objective {
    /// Final point total at the horizon.
    Points,
    /// Hours to spare after reaching the goal.
    #[default]
    Spare,
}

impl Objective {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Points => "points",
            Self::Spare => "spare",
        }
    }

    /// # Errors
    ///
    /// Propagates the replay error of an infeasible plan.
    pub fn score(self, seq: &[Move], state: &GameState) -> Result<f64, GameError> {
        match self {
            Self::Points => score(seq, state),
            Self::Spare => score_spare(seq, state),
        }
    }
}

impl fmt::Display for Objective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Objective {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "points" => Ok(Self::Points),
            "spare" => Ok(Self::Spare),
            _ => Err(()),
        }
    }
}

/// Whole seconds to wait before buying the next level of `upgrade`, or
/// `None` when it is out of reach.
fn replay_wait(state: &GameState, upgrade: usize) -> Result<Option<f64>, GameError> {
    Ok(state
        .time_till_level_up(upgrade)?
        .map(|t| t.ceil() + REPLAY_WAIT_PADDING_SECS))
}

/// Final point total after replaying `seq` from `state` and running to the
/// horizon. The replay stops at the first unreachable level-up.
///
/// # Errors
///
/// Returns the state error of a move that names an unknown upgrade or
/// switches a producer without an alternate profile.
pub fn score(seq: &[Move], state: &GameState) -> Result<f64, GameError> {
    let mut game = state.clone();
    game.update_rates();
    for item in seq {
        match *item {
            Move::Switch { upgrade, mode } => game.change_prod(upgrade, mode)?,
            Move::LevelUp { upgrade, .. } => {
                let Some(wait) = replay_wait(&game, upgrade)? else {
                    break;
                };
                game.advance_time(wait);
                game.level_up(upgrade)?;
            }
        }
    }
    game.finish();
    Ok(game.points())
}

/// Hours left on the clock when the goal is first reached.
///
/// Unreached goals score the negated hours still needed at the final point
/// rate, or a huge negative number when nothing earns points.
///
/// # Errors
///
/// Same as [`score`].
pub fn score_spare(seq: &[Move], state: &GameState) -> Result<f64, GameError> {
    let mut game = state.clone();
    game.update_rates();
    let goal = game.definition().goal;
    let horizon = game.definition().event_secs;
    for item in seq {
        match *item {
            Move::Switch { upgrade, mode } => game.change_prod(upgrade, mode)?,
            Move::LevelUp { upgrade, .. } => {
                let Some(wait) = replay_wait(&game, upgrade)? else {
                    break;
                };
                let rate = game.point_rate();
                if rate > 0.0 && game.points() + rate * wait > goal {
                    let crossing = game.time() + (goal - game.points()) / rate;
                    return Ok((horizon - crossing) / SECS_PER_HOUR);
                }
                game.advance_time(wait);
                game.level_up(upgrade)?;
            }
        }
    }
    game.finish();
    let spare = if game.point_rate() == 0.0 {
        UNREACHABLE_SPARE_SECS
    } else {
        -(goal - game.points()) / game.point_rate()
    };
    Ok(spare / SECS_PER_HOUR)
}

/// When one move of a replayed plan happened.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelineEntry {
    pub item: Move,
    /// Elapsed seconds at the moment the move was made.
    pub at: f64,
    pub points: f64,
}

/// A replayed plan, move by move.
#[derive(Debug, Clone)]
pub struct Timeline {
    pub entries: Vec<TimelineEntry>,
    /// Moves never reached because a level-up was out of reach.
    pub skipped: Vec<Move>,
    /// Elapsed seconds when the point total first passed the goal.
    pub goal_reached_at: Option<f64>,
    /// State at the horizon.
    pub end: GameState,
}

/// Replay `seq` like [`score`], recording each move.
///
/// # Errors
///
/// Same as [`score`].
pub fn timeline(seq: &[Move], state: &GameState) -> Result<Timeline, GameError> {
    let mut game = state.clone();
    game.update_rates();
    let goal = game.definition().goal;
    let mut entries = Vec::with_capacity(seq.len());
    let mut goal_reached_at = (game.points() >= goal).then_some(game.time());
    let mut reached = seq.len();
    for (i, item) in seq.iter().enumerate() {
        match *item {
            Move::Switch { upgrade, mode } => game.change_prod(upgrade, mode)?,
            Move::LevelUp { upgrade, .. } => {
                let Some(wait) = replay_wait(&game, upgrade)? else {
                    reached = i;
                    break;
                };
                advance_tracking_goal(&mut game, wait, goal, &mut goal_reached_at);
                game.level_up(upgrade)?;
            }
        }
        entries.push(TimelineEntry {
            item: *item,
            at: game.time(),
            points: game.points(),
        });
    }
    let rest = game.time_left();
    advance_tracking_goal(&mut game, rest, goal, &mut goal_reached_at);
    Ok(Timeline {
        entries,
        skipped: seq[reached..].to_vec(),
        goal_reached_at,
        end: game,
    })
}

fn advance_tracking_goal(game: &mut GameState, dt: f64, goal: f64, reached: &mut Option<f64>) {
    let rate = game.point_rate();
    if reached.is_none() && rate > 0.0 && game.points() + rate * dt.min(game.time_left()) >= goal {
        *reached = Some(game.time() + (goal - game.points()) / rate);
    }
    game.advance_time(dt);
}
