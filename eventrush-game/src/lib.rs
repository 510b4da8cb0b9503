//! Eventrush Game Engine
//!
//! Deterministic simulation of timed idle-game events (producers, boosts and
//! leveled upgrades paid for in resources) and a local search over the order
//! in which upgrades are bought.
#![forbid(unsafe_code)]

pub mod constants;
pub mod data;
pub mod definition;
pub mod error;
pub mod neighbors;
pub mod numbers;
pub mod plan;
pub mod prereq;
pub mod random;
pub mod recorder;
pub mod replay;
pub mod search;
pub mod setup;
pub mod state;
pub mod upgrade;

#[cfg(test)]
mod fixtures;

// Re-export commonly used types
pub use data::{BoostSpec, GameFile, ProducerLevelSpec, ProducerSpec, UpgradeSpec};
pub use definition::GameDefinition;
pub use error::GameError;
pub use neighbors::{Neighborhood, Neighbors};
pub use numbers::{format_duration, format_grouped, format_short};
pub use plan::{format_plan, parse_plan};
pub use prereq::{Move, PrereqGraph};
pub use random::{RestartOptions, random_plan, restarts};
pub use recorder::SessionRecorder;
pub use replay::{Objective, Timeline, TimelineEntry, score, score_spare, timeline};
pub use search::{ClimbOptions, ScoredPlan, SearchOptions, climb, find_improvement};
pub use setup::{StartConfig, parse_time_left};
pub use state::{GameState, RateBoost};
pub use upgrade::{Boost, BoostLevel, Producer, ProductionMode, ProductionProfile, Upgrade};
