//! Plan moves and the prerequisite graph between them.
//!
//! The graph encodes an assumption about how games are declared: producers
//! appear in unlock order, each gating the next, and resources appear in
//! order of progression so that the highest-indexed resource a level costs
//! stands in for all of its resource dependencies.
use std::collections::HashMap;
use std::fmt;

use crate::definition::GameDefinition;
use crate::error::GameError;
use crate::upgrade::{ProductionMode, Upgrade};

/// One step of a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Move {
    /// Buy `level` of `upgrade`.
    LevelUp { upgrade: usize, level: usize },
    /// Select a production profile of a switchable producer.
    Switch { upgrade: usize, mode: ProductionMode },
}

impl Move {
    #[must_use]
    pub const fn level_up(upgrade: usize, level: usize) -> Self {
        Self::LevelUp { upgrade, level }
    }

    #[must_use]
    pub const fn switch(upgrade: usize, mode: ProductionMode) -> Self {
        Self::Switch { upgrade, mode }
    }

    #[must_use]
    pub const fn upgrade(&self) -> usize {
        match *self {
            Self::LevelUp { upgrade, .. } | Self::Switch { upgrade, .. } => upgrade,
        }
    }

    #[must_use]
    pub const fn is_switch(&self) -> bool {
        matches!(self, Self::Switch { .. })
    }

    /// Plan-file token: the upgrade index, followed by the mode label for
    /// switches (`4` or `4z`).
    #[must_use]
    pub fn token(&self, def: &GameDefinition) -> String {
        match *self {
            Self::LevelUp { upgrade, .. } => upgrade.to_string(),
            Self::Switch { upgrade, mode } => {
                let label = def
                    .upgrades
                    .get(upgrade)
                    .and_then(Upgrade::as_producer)
                    .map_or_else(|| mode.as_str(), |p| p.mode_label(mode));
                format!("{upgrade}{label}")
            }
        }
    }

    /// Readable description such as `Sawmill -> 2` or `Sawmill: alternate`.
    #[must_use]
    pub fn describe(&self, def: &GameDefinition) -> String {
        let name = def.upgrades.get(self.upgrade()).map_or("?", Upgrade::name);
        match *self {
            Self::LevelUp { level, .. } => format!("{name} -> {level}"),
            Self::Switch { mode, .. } => format!("{name}: {mode}"),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LevelUp { upgrade, level } => write!(f, "{upgrade}@{level}"),
            Self::Switch { upgrade, mode } => write!(f, "{upgrade}/{mode}"),
        }
    }
}

/// Read-only map from each move to the moves that must come before it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrereqGraph {
    needs: HashMap<Move, Vec<Move>>,
}

impl PrereqGraph {
    /// Build the graph for every level and switch of `def`.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Graph` when a level costs a resource that no
    /// producer makes at level 1, including a resource past the end of
    /// `def.resources` on an unvalidated definition.
    pub fn build(def: &GameDefinition) -> Result<Self, GameError> {
        let first_producer = first_producers(def);
        let mut needs: HashMap<Move, Vec<Move>> = HashMap::new();
        for (index, upgrade) in def.upgrades.iter().enumerate() {
            for level in 1..=upgrade.max_level() {
                let record = Move::level_up(index, level);
                let mut reqs = Vec::with_capacity(2);
                if level > 1 {
                    reqs.push(Move::level_up(index, level - 1));
                } else if upgrade.is_producer() && index > 0 {
                    reqs.push(Move::level_up(index - 1, 1));
                }
                let cost = upgrade.level_cost(level).unwrap_or_default();
                if let Some(resource) = cost.iter().rposition(|&c| c > 0.0) {
                    let resource_name = def.resources.get(resource).map_or("?", String::as_str);
                    let producer = first_producer.get(resource).copied().flatten().ok_or_else(|| {
                        GameError::Graph(format!(
                            "{} level {level} costs {resource_name} (resource {resource}) but no producer makes it at level 1",
                            upgrade.name(),
                        ))
                    })?;
                    let dep = Move::level_up(producer, 1);
                    if dep == record {
                        log::warn!(
                            "{} level 1 costs {resource_name}, which only it produces",
                            upgrade.name(),
                        );
                    } else {
                        if producer > index {
                            log::warn!(
                                "{} level {level} depends on later upgrade {}",
                                upgrade.name(),
                                def.upgrades[producer].name()
                            );
                        }
                        if !reqs.contains(&dep) {
                            reqs.push(dep);
                        }
                    }
                }
                needs.insert(record, reqs);
            }
            if upgrade.as_producer().is_some_and(|p| p.is_switchable()) {
                for mode in [ProductionMode::Primary, ProductionMode::Alternate] {
                    needs.insert(
                        Move::switch(index, mode),
                        vec![Move::level_up(index, 1), Move::switch(index, mode.other())],
                    );
                }
            }
        }
        log::debug!(
            "prerequisite graph for {}: {} records over {} upgrades",
            def.name,
            needs.len(),
            def.len()
        );
        Ok(Self { needs })
    }

    /// Direct prerequisites of `item`, including the complementary switch
    /// for switch moves.
    #[must_use]
    pub fn prerequisites(&self, item: &Move) -> &[Move] {
        self.needs.get(item).map(Vec::as_slice).unwrap_or_default()
    }

    #[must_use]
    pub fn requires(&self, item: &Move, prereq: &Move) -> bool {
        self.prerequisites(item).contains(prereq)
    }

    /// True when no move in `seq` comes before one of its prerequisites.
    /// Complementary switch links only pair the two choices and are not
    /// ordering constraints.
    #[must_use]
    pub fn respects_order(&self, seq: &[Move]) -> bool {
        let mut position = HashMap::with_capacity(seq.len());
        for (i, item) in seq.iter().enumerate() {
            position.entry(*item).or_insert(i);
        }
        seq.iter().enumerate().all(|(i, item)| {
            self.prerequisites(item)
                .iter()
                .filter(|p| !p.is_switch())
                .all(|p| position.get(p).is_none_or(|&j| j < i))
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.needs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.needs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Move, &[Move])> {
        self.needs.iter().map(|(k, v)| (k, v.as_slice()))
    }
}

/// Earliest producer whose primary level-1 profile makes each resource.
fn first_producers(def: &GameDefinition) -> Vec<Option<usize>> {
    let mut first = vec![None; def.nres()];
    for (index, upgrade) in def.upgrades.iter().enumerate() {
        let Some(profile) = upgrade
            .as_producer()
            .and_then(|p| p.profile(1, ProductionMode::Primary))
        else {
            continue;
        };
        for (slot, &amount) in first.iter_mut().zip(&profile.produces) {
            if amount > 0.0 && slot.is_none() {
                *slot = Some(index);
            }
        }
    }
    first
}
