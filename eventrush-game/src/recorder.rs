//! CSV export of a played session.
//!
//! Rows stay in memory until [`SessionRecorder::finish`] so that an undo in
//! the play loop can drop the last one. Each row carries one column per
//! upgrade: the level just bought, or `-` for an option that was shown ahead
//! of the one taken.
use std::io::{self, Write};

use crate::numbers::{format_duration, format_short};
use crate::prereq::Move;
use crate::state::GameState;

/// Header of the move column; plan files find exports by it.
pub const MOVE_COLUMN: &str = "upg #";
const END_TOKEN: &str = "-1";
const DEFERRED: &str = "-";

pub struct SessionRecorder<W: Write> {
    out: W,
    rows: Vec<Vec<String>>,
    last_time: f64,
}

impl<W: Write> SessionRecorder<W> {
    /// Start recording from `state`, the position before the first move.
    pub fn new(out: W, state: &GameState) -> Self {
        Self {
            out,
            rows: Vec::new(),
            last_time: state.time(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Add a row for `item`, which has just been applied to `state`.
    ///
    /// `choices` lists the upgrade indices offered before the move, in the
    /// order they were shown.
    pub fn record(&mut self, item: &Move, state: &GameState, choices: &[usize]) {
        let def = state.definition();
        let (cost, levels) = match *item {
            Move::LevelUp { upgrade, level } => {
                let cost = def
                    .upgrades
                    .get(upgrade)
                    .and_then(|up| up.level_cost(level))
                    .map(|cost| format_cost(cost, &def.resources))
                    .unwrap_or_default();
                (cost, level_columns(def.upgrades.len(), upgrade, level, choices))
            }
            Move::Switch { .. } => (String::new(), vec![String::new(); def.upgrades.len()]),
        };
        let row = self.row(item.token(def), item.describe(def), cost, levels, state);
        self.rows.push(row);
    }

    /// Drop the last row; `restored` is the state the play loop went back to.
    pub fn undo(&mut self, restored: &GameState) {
        if self.rows.pop().is_some() {
            self.last_time = restored.time();
        }
    }

    /// Close the session with a `-1` row and write everything out.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    pub fn finish(mut self, state: &GameState) -> io::Result<W> {
        let def = state.definition();
        let blank = vec![String::new(); def.upgrades.len()];
        let end = self.row(END_TOKEN.to_string(), "end".to_string(), String::new(), blank, state);
        self.rows.push(end);
        let mut header = vec![
            "time left".to_string(),
            "after (min)".to_string(),
            MOVE_COLUMN.to_string(),
            "upgrade".to_string(),
            "cost".to_string(),
        ];
        header.extend(def.resources.iter().map(|r| format!("{}/min", abbreviate(r))));
        header.extend(def.upgrades.iter().map(|u| u.name().to_string()));
        header.push(def.points_name.clone());

        let mut writer = csv::Writer::from_writer(self.out);
        writer.write_record(&header)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        log::debug!("session export: {} rows", self.rows.len());
        writer.into_inner().map_err(|err| err.into_error())
    }

    fn row(
        &mut self,
        token: String,
        what: String,
        cost: String,
        levels: Vec<String>,
        state: &GameState,
    ) -> Vec<String> {
        let after = (state.time() - self.last_time) / 60.0;
        self.last_time = state.time();
        let mut row = vec![
            format_duration(state.time_left()),
            format!("{after:.1}"),
            token,
            what,
            cost,
        ];
        row.extend(state.rates().iter().map(|r| format!("{:.3}", r * 60.0)));
        row.extend(levels);
        row.push(format_short(state.points()));
        row
    }
}

fn level_columns(count: usize, bought: usize, level: usize, choices: &[usize]) -> Vec<String> {
    let bought_at = choices.iter().position(|&c| c == bought);
    (0..count)
        .map(|index| {
            if index == bought {
                return level.to_string();
            }
            let shown_at = choices.iter().position(|&c| c == index);
            match (shown_at, bought_at) {
                (Some(shown), Some(taken)) if shown < taken => DEFERRED.to_string(),
                _ => String::new(),
            }
        })
        .collect()
}

fn abbreviate(name: &str) -> String {
    name.chars().take(2).collect()
}

fn format_cost(cost: &[f64], resources: &[String]) -> String {
    cost.iter()
        .zip(resources)
        .filter(|(c, _)| **c > 0.0)
        .map(|(c, name)| format!("{} {}", format_short(*c), abbreviate(name)))
        .collect::<Vec<_>>()
        .join(", ")
}
