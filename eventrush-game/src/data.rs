//! JSON game files.
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_EVENT_SECS, DEFAULT_MODE_LABELS, DEFAULT_OVERSHOOT_SECS, DEFAULT_POINTS_NAME,
    DEFAULT_TIME_MODIFIER,
};
use crate::definition::GameDefinition;
use crate::error::GameError;
use crate::upgrade::{Boost, BoostLevel, Producer, ProductionProfile, Upgrade};

/// One producer level as written in a game file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerLevelSpec {
    pub produces: Vec<f64>,
    #[serde(default)]
    pub points: f64,
    pub cost: Vec<f64>,
    /// Second production profile selectable with a switch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate: Option<ProductionProfile>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerSpec {
    pub name: String,
    pub spawn_secs: f64,
    /// Plan-file labels for the primary and alternate profiles.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modes: Option<[String; 2]>,
    pub levels: Vec<ProducerLevelSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoostSpec {
    pub name: String,
    pub levels: Vec<BoostLevel>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum UpgradeSpec {
    Producer(ProducerSpec),
    Boost(BoostSpec),
}

/// A game as stored on disk. Upgrades are listed in unlock order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameFile {
    pub name: String,
    #[serde(default)]
    pub goal: f64,
    #[serde(default = "default_event_secs")]
    pub event_secs: f64,
    #[serde(default = "default_points_name")]
    pub points_name: String,
    #[serde(default = "default_overshoot")]
    pub overshoot_secs: f64,
    #[serde(default = "default_time_modifier")]
    pub time_modifier: f64,
    pub resources: Vec<String>,
    pub upgrades: Vec<UpgradeSpec>,
}

const fn default_event_secs() -> f64 {
    DEFAULT_EVENT_SECS
}

fn default_points_name() -> String {
    DEFAULT_POINTS_NAME.to_string()
}

const fn default_overshoot() -> f64 {
    DEFAULT_OVERSHOOT_SECS
}

const fn default_time_modifier() -> f64 {
    DEFAULT_TIME_MODIFIER
}

impl GameFile {
    /// Parse a game file from JSON text.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON does not describe a game.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// # Errors
    ///
    /// Returns `GameError::Io` or `GameError::Json` when the file cannot be
    /// read or parsed.
    pub fn load(path: &Path) -> Result<Self, GameError> {
        let json = fs::read_to_string(path)?;
        Ok(Self::from_json(&json)?)
    }

    /// Build the validated definition.
    ///
    /// Each producer after the first upgrade needs the upgrade listed just
    /// before it. A producer with an upkeep at level 1 and no declared
    /// alternate gets an all-zero alternate, so that it can be paused.
    ///
    /// # Errors
    ///
    /// Returns `GameError::Definition` when tables are inconsistent.
    pub fn into_definition(self) -> Result<GameDefinition, GameError> {
        let nres = self.resources.len();
        let upgrades = self
            .upgrades
            .into_iter()
            .enumerate()
            .map(|(index, spec)| match spec {
                UpgradeSpec::Producer(p) => build_producer(index, p, nres).map(Upgrade::Producer),
                UpgradeSpec::Boost(b) => Ok(Upgrade::Boost(build_boost(b, nres))),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let def = GameDefinition {
            name: self.name,
            resources: self.resources,
            points_name: self.points_name,
            upgrades,
            event_secs: self.event_secs,
            goal: self.goal,
            overshoot_secs: self.overshoot_secs,
            time_modifier: self.time_modifier,
        };
        def.validate()?;
        log::debug!(
            "loaded game {}: {} resources, {} upgrades",
            def.name,
            def.nres(),
            def.len()
        );
        Ok(def)
    }
}

fn build_producer(index: usize, spec: ProducerSpec, nres: usize) -> Result<Producer, GameError> {
    let bad = |what: &str| GameError::Definition(format!("upgrade {index} ({}): {what}", spec.name));
    let declared = spec.levels.iter().filter(|l| l.alternate.is_some()).count();
    if declared != 0 && declared != spec.levels.len() {
        return Err(bad("alternate production must be given for every level or none"));
    }
    let has_upkeep = spec
        .levels
        .first()
        .is_some_and(|l| l.produces.iter().any(|&a| a < 0.0));
    let alternate = if declared > 0 {
        Some(spec.levels.iter().filter_map(|l| l.alternate.clone()).collect())
    } else if has_upkeep {
        Some(vec![ProductionProfile::paused(nres); spec.levels.len()])
    } else {
        None
    };
    let mode_labels = match spec.modes.clone() {
        Some(labels) => labels,
        None => DEFAULT_MODE_LABELS.map(str::to_string),
    };
    for label in &mode_labels {
        if label.is_empty() || label.chars().any(|c| c.is_ascii_digit() || c.is_whitespace()) {
            return Err(bad(&format!("mode label {label:?} must be non-empty and digit-free")));
        }
    }
    if mode_labels[0].eq_ignore_ascii_case(&mode_labels[1]) {
        return Err(bad("mode labels must differ"));
    }
    let (levels, costs): (Vec<_>, Vec<_>) = spec
        .levels
        .into_iter()
        .map(|l| {
            (
                ProductionProfile {
                    produces: l.produces,
                    points: l.points,
                },
                l.cost,
            )
        })
        .unzip();
    Ok(Producer {
        name: spec.name,
        spawn_secs: spec.spawn_secs,
        levels,
        alternate,
        costs,
        mode_labels,
        needs: index.checked_sub(1),
    })
}

fn build_boost(spec: BoostSpec, nres: usize) -> Boost {
    let levels = spec
        .levels
        .into_iter()
        .map(|mut level| {
            if level.resource_bonus.is_empty() {
                level.resource_bonus = vec![0.0; nres];
            }
            level
        })
        .collect();
    Boost {
        name: spec.name,
        levels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upgrade::ProductionMode;

    const HARVEST: &str = r#"{
        "name": "Harvest",
        "goal": 1000,
        "event_secs": 7200,
        "resources": ["coins", "wood"],
        "upgrades": [
            {"kind": "producer", "name": "Stall", "spawn_secs": 10, "levels": [
                {"produces": [2, 0], "points": 1, "cost": [0, 0]},
                {"produces": [4, 0], "points": 2, "cost": [20, 0]}
            ]},
            {"kind": "producer", "name": "Sawmill", "spawn_secs": 20, "levels": [
                {"produces": [-1, 2], "points": 1, "cost": [30, 0]}
            ]},
            {"kind": "boost", "name": "Banner", "levels": [
                {"point_multiplier": 1.5, "cost": [40, 10]}
            ]},
            {"kind": "producer", "name": "Kiln", "spawn_secs": 30, "modes": ["hot", "cold"], "levels": [
                {"produces": [3, 0], "cost": [50, 20], "alternate": {"produces": [0, 1], "points": 2}}
            ]}
        ]
    }"#;

    #[test]
    fn harvest_loads_with_defaults() {
        let def = GameFile::from_json(HARVEST).unwrap().into_definition().unwrap();
        assert_eq!(def.len(), 4);
        assert_eq!(def.points_name, "points");
        assert_eq!(def.overshoot_secs, DEFAULT_OVERSHOOT_SECS);
        assert_eq!(def.time_modifier, DEFAULT_TIME_MODIFIER);
        let Upgrade::Boost(banner) = &def.upgrades[2] else {
            panic!("banner should be a boost");
        };
        assert_eq!(banner.levels[0].resource_bonus, vec![0.0, 0.0]);
        assert_eq!(banner.levels[0].time_factor, 0.0);
    }

    #[test]
    fn producers_chain_and_pause() {
        let def = GameFile::from_json(HARVEST).unwrap().into_definition().unwrap();
        let stall = def.upgrades[0].as_producer().unwrap();
        let sawmill = def.upgrades[1].as_producer().unwrap();
        let kiln = def.upgrades[3].as_producer().unwrap();
        assert_eq!(stall.needs, None);
        assert_eq!(sawmill.needs, Some(0));
        assert_eq!(kiln.needs, Some(2));
        assert!(!stall.is_switchable());
        assert_eq!(
            sawmill.profile(1, ProductionMode::Alternate),
            Some(&ProductionProfile::paused(2))
        );
        assert_eq!(kiln.mode_label(ProductionMode::Alternate), "cold");
        assert_eq!(kiln.profile(1, ProductionMode::Alternate).unwrap().points, 2.0);
    }

    #[test]
    fn width_mismatch_is_rejected() {
        let json = HARVEST.replace("[4, 0]", "[4]");
        let err = GameFile::from_json(&json).unwrap().into_definition().unwrap_err();
        assert!(matches!(err, GameError::Definition(_)));
    }

    #[test]
    fn numeric_mode_labels_are_rejected() {
        let json = HARVEST.replace(r#"["hot", "cold"]"#, r#"["1", "2"]"#);
        assert!(GameFile::from_json(&json).unwrap().into_definition().is_err());
    }

    #[test]
    fn unknown_kind_fails_to_parse() {
        let json = HARVEST.replace(r#""kind": "boost""#, r#""kind": "gadget""#);
        assert!(GameFile::from_json(&json).is_err());
    }
}
