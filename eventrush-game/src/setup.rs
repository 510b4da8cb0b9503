//! Mid-event starting points: where a player is right now.
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use num_traits::cast::cast;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::state::GameState;
use crate::upgrade::ProductionMode;

const TIME_LEFT_PATTERN: &str = r"(?ix)
    ^\s*((?P<d>\d+)d)?
    \s*((?P<h>\d+)h)?
    \s*((?P<m>\d+)m)?
    \s*((?P<s>\d+)s)?
    \s*$";

/// Parse a duration such as `1d 2h 3m 4s` into seconds. Every part is
/// optional; an empty string is zero.
///
/// # Errors
///
/// Returns `GameError::TimeLeft` when the text is not such a duration.
pub fn parse_time_left(text: &str) -> Result<f64, GameError> {
    let re = Regex::new(TIME_LEFT_PATTERN).map_err(|err| GameError::TimeLeft(err.to_string()))?;
    let caps = re
        .captures(text)
        .ok_or_else(|| GameError::TimeLeft(text.to_string()))?;
    let mut secs = 0_u64;
    for (group, scale) in [("d", 86_400_u64), ("h", 3_600), ("m", 60), ("s", 1)] {
        if let Some(found) = caps.name(group) {
            let value: u64 = found
                .as_str()
                .parse()
                .map_err(|_| GameError::TimeLeft(text.to_string()))?;
            secs = value
                .checked_mul(scale)
                .and_then(|v| secs.checked_add(v))
                .ok_or_else(|| GameError::TimeLeft(text.to_string()))?;
        }
    }
    cast::<u64, f64>(secs).ok_or_else(|| GameError::TimeLeft(text.to_string()))
}

/// Snapshot of a game in progress, keyed by names rather than indices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StartConfig {
    /// Game file, relative to the start file's directory.
    #[serde(default)]
    pub game: Option<PathBuf>,
    /// Extra amount per spawn added to every positive production.
    #[serde(default)]
    pub bonus: f64,
    #[serde(default)]
    pub time_left: Option<String>,
    #[serde(default)]
    pub points: f64,
    #[serde(default)]
    pub resources: BTreeMap<String, f64>,
    #[serde(default)]
    pub levels: BTreeMap<String, usize>,
    #[serde(default)]
    pub modes: BTreeMap<String, ProductionMode>,
}

impl StartConfig {
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe a start configuration.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// # Errors
    ///
    /// Returns `GameError::Io` or `GameError::Json`.
    pub fn load(path: &Path) -> Result<Self, GameError> {
        let json = fs::read_to_string(path)?;
        Ok(Self::from_json(&json)?)
    }

    /// The game file this start refers to, resolved against `config_path`.
    #[must_use]
    pub fn game_path(&self, config_path: &Path) -> Option<PathBuf> {
        let game = self.game.as_ref()?;
        Some(match config_path.parent() {
            Some(dir) if game.is_relative() => dir.join(game),
            _ => game.clone(),
        })
    }

    /// Overwrite `state` with this snapshot. Names match case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns `GameError::UnknownResource`, `GameError::UnknownUpgradeName`,
    /// `GameError::TimeLeft` (unparsable or longer than the event), or the
    /// error of an impossible level or switch.
    pub fn apply(&self, state: &mut GameState) -> Result<(), GameError> {
        let def = state.definition().clone();
        state.set_external_bonus(vec![self.bonus; def.nres()])?;
        if let Some(text) = &self.time_left {
            let left = parse_time_left(text)?;
            if left > def.event_secs {
                return Err(GameError::TimeLeft(format!(
                    "{text} is longer than the {}s event",
                    def.event_secs
                )));
            }
            state.set_time(def.event_secs - left);
        }
        state.set_points(self.points);
        for (name, &amount) in &self.resources {
            state.set_amount(def.resource_index(name)?, amount)?;
        }
        for (name, &level) in &self.levels {
            state.set_level(def.upgrade_index(name)?, level)?;
        }
        for (name, &mode) in &self.modes {
            state.change_prod(def.upgrade_index(name)?, mode)?;
        }
        log::debug!(
            "start at t={}s with {} points, levels {:?}",
            state.time(),
            state.points(),
            state.levels()
        );
        Ok(())
    }
}
