//! Interactive play: show what can be bought next and apply the player's picks.
use std::io::{BufRead, Write};

use anyhow::{Result, bail};
use colored::Colorize;
use eventrush_game::{
    GameState, Move, SessionRecorder, format_duration, format_grouped, format_short, parse_plan,
};

/// Shifts of another option's wait below this many seconds are not shown.
const SHIFT_NOISE_SECS: f64 = 1.0;
/// Rate changes below this many percent are not shown.
const BOOST_NOISE_PCT: f64 = 0.1;

/// A level-up that becomes affordable before the event ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Choice {
    pub upgrade: usize,
    pub wait: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    Quit,
}

/// A game being played move by move, with undo.
pub struct Session<E: Write> {
    state: GameState,
    history: Vec<GameState>,
    recorder: Option<SessionRecorder<E>>,
}

impl<E: Write> Session<E> {
    pub fn new(state: GameState, recorder: Option<SessionRecorder<E>>) -> Self {
        Self {
            state,
            history: Vec::new(),
            recorder,
        }
    }

    pub const fn state(&self) -> &GameState {
        &self.state
    }

    /// Reachable level-ups, soonest first.
    pub fn choices(&self) -> Result<Vec<Choice>> {
        let mut choices = Vec::new();
        for upgrade in 0..self.state.definition().len() {
            if let Some(wait) = self.state.time_till_level_up(upgrade)? {
                choices.push(Choice { upgrade, wait });
            }
        }
        choices.sort_by(|a, b| a.wait.total_cmp(&b.wait));
        Ok(choices)
    }

    /// Production switches available right now.
    pub fn switches(&self) -> Vec<Move> {
        self.state
            .definition()
            .upgrades
            .iter()
            .enumerate()
            .filter(|(idx, up)| {
                self.state.level(*idx) > 0 && up.as_producer().is_some_and(|p| p.is_switchable())
            })
            .map(|(idx, _)| Move::switch(idx, self.state.mode(idx).other()))
            .collect()
    }

    /// Apply one line of player input.
    ///
    /// # Errors
    ///
    /// Returns an error for input that names no available move; the session
    /// is left unchanged.
    pub fn apply(&mut self, input: &str) -> Result<Step> {
        let input = input.trim();
        match input {
            "q" | "ex" => return Ok(Step::Quit),
            "u" => {
                let Some(previous) = self.history.pop() else {
                    bail!("nothing to undo");
                };
                self.state = previous;
                if let Some(recorder) = self.recorder.as_mut() {
                    recorder.undo(&self.state);
                }
                return Ok(Step::Continue);
            }
            _ => {}
        }
        let item = match parse_plan(input, &self.state)?.as_slice() {
            [item] => *item,
            _ => bail!("enter one upgrade index, a switch such as 3z, u or q"),
        };
        let snapshot = self.state.clone();
        let choices = self.choices()?;
        let offered: Vec<usize> = choices.iter().map(|c| c.upgrade).collect();
        match item {
            Move::LevelUp { upgrade, .. } => {
                let Some(choice) = choices.into_iter().find(|c| c.upgrade == upgrade) else {
                    bail!("{} is out of reach", item.describe(self.state.definition()));
                };
                self.state.advance_time(choice.wait);
                self.state.level_up(upgrade)?;
            }
            Move::Switch { upgrade, mode } => {
                if !self.switches().contains(&item) {
                    bail!("{} is not available", item.describe(self.state.definition()));
                }
                self.state.change_prod(upgrade, mode)?;
            }
        }
        log::debug!("played {item} at t={}", self.state.time());
        self.history.push(snapshot);
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.record(&item, &self.state, &offered);
        }
        Ok(Step::Continue)
    }

    /// Prompt on `out` and read moves from `input` until the player quits,
    /// input ends, or nothing is left to buy. Returns the final state and
    /// the recorder's writer.
    ///
    /// # Errors
    ///
    /// Returns I/O errors on `input`, `out` or the recorder.
    pub fn run<R, W>(mut self, mut input: R, out: &mut W) -> Result<(GameState, Option<E>)>
    where
        R: BufRead,
        W: Write,
    {
        let mut line = String::new();
        loop {
            write_status(out, &self.state)?;
            let choices = self.choices()?;
            if choices.is_empty() {
                writeln!(out, "{}", "Nothing left to buy; running out the clock.".yellow())?;
                self.state.finish();
                break;
            }
            self.write_choices(out, &choices)?;
            write!(out, "> ")?;
            out.flush()?;
            line.clear();
            if input.read_line(&mut line)? == 0 {
                break;
            }
            match self.apply(&line) {
                Ok(Step::Continue) => {}
                Ok(Step::Quit) => break,
                Err(err) => writeln!(out, "{} {err}", "!".red().bold())?,
            }
        }
        write_status(out, &self.state)?;
        let writer = match self.recorder {
            Some(recorder) => Some(recorder.finish(&self.state)?),
            None => None,
        };
        Ok((self.state, writer))
    }

    fn write_choices<W: Write>(&self, out: &mut W, choices: &[Choice]) -> Result<()> {
        let def = self.state.definition();
        for choice in choices {
            let up = def.upgrade(choice.upgrade)?;
            let level = self.state.level(choice.upgrade) + 1;
            let cost = up.level_cost(level).unwrap_or_default();
            writeln!(
                out,
                "{:>3}  {:<24} {:>10}  cost {}",
                choice.upgrade,
                Move::level_up(choice.upgrade, level).describe(def),
                format_duration(choice.wait),
                describe_cost(cost, &def.resources),
            )?;
            let boost = self.state.pcnt_boost(choice.upgrade)?;
            let mut effects: Vec<String> = boost
                .resources
                .iter()
                .zip(&def.resources)
                .filter_map(|(&pct, name)| describe_pct(pct).map(|p| format!("{name} {p}")))
                .collect();
            if let Some(p) = describe_pct(boost.points) {
                effects.push(format!("{} {p}", def.points_name));
            }
            if !effects.is_empty() {
                writeln!(out, "       {}", effects.join(", "))?;
            }
            let shifts = self.shifts(choice, choices)?;
            if !shifts.is_empty() {
                writeln!(out, "       {}", shifts.join("; "))?;
            }
        }
        for item in self.switches() {
            writeln!(out, "{:>4} {}", item.token(def), item.describe(def))?;
        }
        Ok(())
    }

    /// How buying `choice` now moves the other options, in minutes.
    fn shifts(&self, choice: &Choice, choices: &[Choice]) -> Result<Vec<String>> {
        let def = self.state.definition();
        let mut shifts = Vec::new();
        for other in choices.iter().filter(|c| c.upgrade != choice.upgrade) {
            let after = self
                .state
                .upg_time_after_upg(choice.upgrade, choice.wait, other.upgrade)?;
            let delta = after - other.wait;
            let name = def.upgrade(other.upgrade)?.name();
            if delta < -SHIFT_NOISE_SECS {
                shifts.push(format!("speeds up {name} by {:.1} min", -delta / 60.0));
            } else if delta > SHIFT_NOISE_SECS {
                shifts.push(format!("delays {name} by {:.1} min", delta / 60.0));
            }
        }
        Ok(shifts)
    }
}

fn describe_cost(cost: &[f64], resources: &[String]) -> String {
    let parts: Vec<String> = cost
        .iter()
        .zip(resources)
        .filter(|(c, _)| **c > 0.0)
        .map(|(c, name)| format!("{} {name}", format_short(*c)))
        .collect();
    if parts.is_empty() {
        "free".to_string()
    } else {
        parts.join(", ")
    }
}

fn describe_pct(pct: f64) -> Option<String> {
    if pct.is_infinite() {
        Some("new".to_string())
    } else if pct.is_nan() || pct.abs() < BOOST_NOISE_PCT {
        None
    } else {
        Some(format!("{pct:+.1}%"))
    }
}

fn write_status<W: Write>(out: &mut W, state: &GameState) -> Result<()> {
    let def = state.definition();
    let header = format!(
        "== {} left | {} {} (+{}/min) ==",
        format_duration(state.time_left()),
        format_grouped(state.points()),
        def.points_name,
        format_short(state.point_rate() * 60.0),
    );
    writeln!(out, "{}", header.bright_cyan().bold())?;
    let amounts: Vec<String> = def
        .resources
        .iter()
        .zip(state.amounts().iter().zip(state.rates()))
        .map(|(name, (amount, rate))| {
            format!("{name} {} ({}/min)", format_short(*amount), format_short(rate * 60.0))
        })
        .collect();
    writeln!(out, "{}", amounts.join("  "))?;
    let levels: Vec<String> = def
        .upgrades
        .iter()
        .enumerate()
        .map(|(idx, up)| format!("{} {}", up.name(), state.level(idx)))
        .collect();
    writeln!(out, "levels: {}", levels.join(", "))?;
    Ok(())
}
