//! Immutable description of one event: resources, upgrades and tuning.
use crate::constants::{
    DEFAULT_EVENT_SECS, DEFAULT_OVERSHOOT_SECS, DEFAULT_POINTS_NAME, DEFAULT_TIME_MODIFIER,
};
use crate::error::GameError;
use crate::upgrade::Upgrade;

/// Everything about a game that never changes while it is played.
///
/// Upgrade indices are identities: the prerequisite graph, plans and the
/// game state all refer to upgrades by their position in `upgrades`.
#[derive(Debug, Clone, PartialEq)]
pub struct GameDefinition {
    pub name: String,
    pub resources: Vec<String>,
    pub points_name: String,
    pub upgrades: Vec<Upgrade>,
    pub event_secs: f64,
    /// Point total the spare-time objective measures against.
    pub goal: f64,
    pub overshoot_secs: f64,
    /// Added once to the summed time factor of all boosts.
    pub time_modifier: f64,
}

impl GameDefinition {
    #[must_use]
    pub fn new(name: impl Into<String>, resources: Vec<String>, upgrades: Vec<Upgrade>) -> Self {
        Self {
            name: name.into(),
            resources,
            points_name: DEFAULT_POINTS_NAME.to_string(),
            upgrades,
            event_secs: DEFAULT_EVENT_SECS,
            goal: 0.0,
            overshoot_secs: DEFAULT_OVERSHOOT_SECS,
            time_modifier: DEFAULT_TIME_MODIFIER,
        }
    }

    #[must_use]
    pub const fn with_goal(mut self, goal: f64) -> Self {
        self.goal = goal;
        self
    }

    #[must_use]
    pub const fn with_event_secs(mut self, secs: f64) -> Self {
        self.event_secs = secs;
        self
    }

    #[must_use]
    pub const fn with_overshoot(mut self, secs: f64) -> Self {
        self.overshoot_secs = secs;
        self
    }

    #[must_use]
    pub const fn with_time_modifier(mut self, modifier: f64) -> Self {
        self.time_modifier = modifier;
        self
    }

    #[must_use]
    pub fn nres(&self) -> usize {
        self.resources.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.upgrades.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.upgrades.is_empty()
    }

    /// # Errors
    ///
    /// Returns `GameError::UnknownUpgrade` when `index` is out of range.
    pub fn upgrade(&self, index: usize) -> Result<&Upgrade, GameError> {
        self.upgrades.get(index).ok_or(GameError::UnknownUpgrade {
            index,
            count: self.upgrades.len(),
        })
    }

    /// Case-insensitive lookup by upgrade name.
    ///
    /// # Errors
    ///
    /// Returns `GameError::UnknownUpgradeName` when no upgrade matches.
    pub fn upgrade_index(&self, name: &str) -> Result<usize, GameError> {
        self.upgrades
            .iter()
            .position(|u| u.name().eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| GameError::UnknownUpgradeName(name.to_string()))
    }

    /// Case-insensitive lookup by resource name.
    ///
    /// # Errors
    ///
    /// Returns `GameError::UnknownResource` when no resource matches.
    pub fn resource_index(&self, name: &str) -> Result<usize, GameError> {
        self.resources
            .iter()
            .position(|r| r.eq_ignore_ascii_case(name.trim()))
            .ok_or_else(|| GameError::UnknownResource(name.to_string()))
    }

    /// Check table widths and links before the definition is used.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Definition` naming the first inconsistency found.
    pub fn validate(&self) -> Result<(), GameError> {
        if self.resources.is_empty() {
            return Err(GameError::Definition("game declares no resources".into()));
        }
        if !(self.event_secs.is_finite() && self.event_secs > 0.0) {
            return Err(GameError::Definition(format!(
                "event length must be positive (got {})",
                self.event_secs
            )));
        }
        for (index, upgrade) in self.upgrades.iter().enumerate() {
            self.validate_upgrade(index, upgrade)?;
        }
        Ok(())
    }

    fn validate_upgrade(&self, index: usize, upgrade: &Upgrade) -> Result<(), GameError> {
        let nres = self.nres();
        let name = upgrade.name();
        let bad = |what: String| GameError::Definition(format!("upgrade {index} ({name}): {what}"));
        if upgrade.max_level() == 0 {
            return Err(bad("has no levels".into()));
        }
        for level in 1..=upgrade.max_level() {
            let width = upgrade.level_cost(level).map_or(0, <[f64]>::len);
            if width != nres {
                return Err(bad(format!("level {level} cost has {width} entries, expected {nres}")));
            }
        }
        match upgrade {
            Upgrade::Producer(p) => {
                if !(p.spawn_secs.is_finite() && p.spawn_secs > 0.0) {
                    return Err(bad(format!("spawn interval must be positive (got {})", p.spawn_secs)));
                }
                if p.levels.len() != p.costs.len() {
                    return Err(bad(format!(
                        "{} production levels but {} costs",
                        p.levels.len(),
                        p.costs.len()
                    )));
                }
                let alternate = p.alternate.iter().flatten();
                for profile in p.levels.iter().chain(alternate) {
                    if profile.produces.len() != nres {
                        return Err(bad(format!(
                            "production has {} entries, expected {nres}",
                            profile.produces.len()
                        )));
                    }
                }
                if let Some(alternate) = &p.alternate
                    && alternate.len() != p.levels.len()
                {
                    return Err(bad(format!(
                        "{} alternate levels but {} primary levels",
                        alternate.len(),
                        p.levels.len()
                    )));
                }
                if let Some(needs) = p.needs
                    && needs >= index
                {
                    return Err(bad(format!("needs upgrade {needs}, which is not earlier")));
                }
            }
            Upgrade::Boost(b) => {
                for level in &b.levels {
                    if !level.resource_bonus.is_empty() && level.resource_bonus.len() != nres {
                        return Err(bad(format!(
                            "bonus has {} entries, expected {nres}",
                            level.resource_bonus.len()
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upgrade::{Boost, BoostLevel, Producer, ProductionProfile};

    fn producer(name: &str, produces: Vec<f64>, cost: Vec<f64>) -> Upgrade {
        Upgrade::Producer(Producer {
            name: name.to_string(),
            spawn_secs: 60.0,
            levels: vec![ProductionProfile {
                produces,
                points: 1.0,
            }],
            alternate: None,
            costs: vec![cost],
            mode_labels: ["a".to_string(), "z".to_string()],
            needs: None,
        })
    }

    #[test]
    fn lookups_ignore_case() {
        let def = GameDefinition::new(
            "Test",
            vec!["Wood".into(), "Iron".into()],
            vec![producer("Lumber Mill", vec![1.0, 0.0], vec![0.0, 0.0])],
        );
        assert_eq!(def.upgrade_index("lumber mill").ok(), Some(0));
        assert_eq!(def.resource_index("IRON").ok(), Some(1));
        assert!(matches!(
            def.upgrade_index("mine"),
            Err(GameError::UnknownUpgradeName(_))
        ));
        assert!(matches!(
            def.upgrade(3),
            Err(GameError::UnknownUpgrade { index: 3, count: 1 })
        ));
    }

    #[test]
    fn validate_rejects_width_mismatch() {
        let def = GameDefinition::new(
            "Test",
            vec!["Wood".into(), "Iron".into()],
            vec![producer("Mill", vec![1.0], vec![0.0, 0.0])],
        );
        let err = def.validate().unwrap_err();
        assert!(err.to_string().contains("production has 1 entries"));
    }

    #[test]
    fn validate_rejects_forward_needs() {
        let mut mill = producer("Mill", vec![1.0], vec![0.0]);
        if let Upgrade::Producer(p) = &mut mill {
            p.needs = Some(0);
        }
        let def = GameDefinition::new("Test", vec!["Wood".into()], vec![mill]);
        assert!(def.validate().is_err());
    }

    #[test]
    fn validate_accepts_consistent_tables() {
        let boost = Upgrade::Boost(Boost {
            name: "Saw".to_string(),
            levels: vec![BoostLevel {
                resource_bonus: Vec::new(),
                time_factor: 0.0,
                point_multiplier: 2.0,
                cost: vec![5.0],
            }],
        });
        let def = GameDefinition::new(
            "Test",
            vec!["Wood".into()],
            vec![producer("Mill", vec![1.0], vec![0.0]), boost],
        );
        assert!(def.validate().is_ok());
    }
}
