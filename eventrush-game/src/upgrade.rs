//! Upgrade definitions: producers and boosts with per-level tables.
//!
//! Tables are immutable once a [`crate::GameDefinition`] is built; the level
//! of each upgrade and the active production mode live in
//! [`crate::GameState`].
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which of a producer's two production profiles is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProductionMode {
    #[default]
    Primary,
    Alternate,
}

impl ProductionMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Alternate => "alternate",
        }
    }

    /// The mutually exclusive choice.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Primary => Self::Alternate,
            Self::Alternate => Self::Primary,
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Primary => 0,
            Self::Alternate => 1,
        }
    }
}

impl fmt::Display for ProductionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductionMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(Self::Primary),
            "alternate" => Ok(Self::Alternate),
            _ => Err(()),
        }
    }
}

/// What one spawn of a producer yields at a given level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProductionProfile {
    /// Amount per spawn for each resource; negative amounts are upkeep.
    pub produces: Vec<f64>,
    #[serde(default)]
    pub points: f64,
}

impl ProductionProfile {
    /// A profile that produces nothing and costs nothing.
    #[must_use]
    pub fn paused(nres: usize) -> Self {
        Self {
            produces: vec![0.0; nres],
            points: 0.0,
        }
    }
}

/// Aggregate modifiers collected from all active boosts.
#[derive(Debug, Clone, PartialEq)]
pub struct RateModifiers {
    /// Additive bonus per spawn for each produced resource.
    pub bonuses: Vec<f64>,
    pub time_factor: f64,
    pub point_multiplier: f64,
}

impl RateModifiers {
    #[must_use]
    pub fn new(external_bonus: &[f64]) -> Self {
        Self {
            bonuses: external_bonus.to_vec(),
            time_factor: 1.0,
            point_multiplier: 1.0,
        }
    }
}

/// Upgrade that spawns resources and points at a fixed interval.
#[derive(Debug, Clone, PartialEq)]
pub struct Producer {
    pub name: String,
    pub spawn_secs: f64,
    /// `levels[L - 1]` is the primary profile at level `L`.
    pub levels: Vec<ProductionProfile>,
    /// Optional second profile per level, selected by a production switch.
    pub alternate: Option<Vec<ProductionProfile>>,
    /// `costs[L - 1]` is the price of reaching level `L`.
    pub costs: Vec<Vec<f64>>,
    /// Labels used in plan files for the primary and alternate profiles.
    pub mode_labels: [String; 2],
    /// Index of an earlier upgrade that must be at level 1 first.
    pub needs: Option<usize>,
}

impl Producer {
    #[must_use]
    pub fn is_switchable(&self) -> bool {
        self.alternate.is_some()
    }

    /// Profile active at `level` in `mode`, if the producer is purchased.
    #[must_use]
    pub fn profile(&self, level: usize, mode: ProductionMode) -> Option<&ProductionProfile> {
        let idx = level.checked_sub(1)?;
        match (mode, &self.alternate) {
            (ProductionMode::Alternate, Some(alternate)) => alternate.get(idx),
            _ => self.levels.get(idx),
        }
    }

    #[must_use]
    pub fn mode_label(&self, mode: ProductionMode) -> &str {
        &self.mode_labels[mode.index()]
    }

    /// Adds this producer's per-second output to `rates` and returns its
    /// per-second point contribution. Bonuses apply only to positive amounts.
    pub fn apply_to_rates(
        &self,
        level: usize,
        mode: ProductionMode,
        bonuses: &[f64],
        rates: &mut [f64],
    ) -> f64 {
        let Some(profile) = self.profile(level, mode) else {
            return 0.0;
        };
        for ((rate, &amount), &bonus) in rates.iter_mut().zip(&profile.produces).zip(bonuses) {
            let net = if amount > 0.0 { amount + bonus } else { amount };
            *rate += net / self.spawn_secs;
        }
        profile.points / self.spawn_secs
    }
}

/// One level of a boost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostLevel {
    /// Added to every positive per-spawn production of that resource.
    #[serde(default)]
    pub resource_bonus: Vec<f64>,
    /// Added to the time factor; negative values speed the game up.
    #[serde(default)]
    pub time_factor: f64,
    #[serde(default = "default_point_multiplier")]
    pub point_multiplier: f64,
    pub cost: Vec<f64>,
}

const fn default_point_multiplier() -> f64 {
    1.0
}

/// Upgrade that modifies aggregate rates instead of producing.
#[derive(Debug, Clone, PartialEq)]
pub struct Boost {
    pub name: String,
    pub levels: Vec<BoostLevel>,
}

impl Boost {
    /// Folds the effects of `level` into `mods`; level 0 contributes nothing.
    pub fn apply_modifiers(&self, level: usize, mods: &mut RateModifiers) {
        let Some(effect) = level.checked_sub(1).and_then(|idx| self.levels.get(idx)) else {
            return;
        };
        for (bonus, add) in mods.bonuses.iter_mut().zip(&effect.resource_bonus) {
            *bonus += add;
        }
        mods.time_factor += effect.time_factor;
        mods.point_multiplier *= effect.point_multiplier;
    }
}

/// A purchasable upgrade.
#[derive(Debug, Clone, PartialEq)]
pub enum Upgrade {
    Producer(Producer),
    Boost(Boost),
}

impl Upgrade {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Producer(p) => &p.name,
            Self::Boost(b) => &b.name,
        }
    }

    #[must_use]
    pub fn max_level(&self) -> usize {
        match self {
            Self::Producer(p) => p.costs.len(),
            Self::Boost(b) => b.levels.len(),
        }
    }

    /// Cost of reaching `level` (1-based).
    #[must_use]
    pub fn level_cost(&self, level: usize) -> Option<&[f64]> {
        let idx = level.checked_sub(1)?;
        match self {
            Self::Producer(p) => p.costs.get(idx).map(Vec::as_slice),
            Self::Boost(b) => b.levels.get(idx).map(|l| l.cost.as_slice()),
        }
    }

    #[must_use]
    pub fn as_producer(&self) -> Option<&Producer> {
        match self {
            Self::Producer(p) => Some(p),
            Self::Boost(_) => None,
        }
    }

    #[must_use]
    pub fn is_producer(&self) -> bool {
        matches!(self, Self::Producer(_))
    }

    /// Upgrades whose first level costs nothing start out purchased.
    #[must_use]
    pub fn is_free(&self) -> bool {
        self.level_cost(1)
            .is_some_and(|cost| cost.iter().all(|&c| c <= 0.0))
    }
}
