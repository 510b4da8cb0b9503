//! Error taxonomy shared by the simulation, the graph builder and the loaders.
use thiserror::Error;

/// Errors raised for domain-invalid requests and malformed inputs.
///
/// Unreachable targets are not errors: they are reported as `None` by
/// [`crate::GameState::time_till_level_up`].
#[derive(Debug, Error)]
pub enum GameError {
    #[error("unknown upgrade index {index} (game has {count} upgrades)")]
    UnknownUpgrade { index: usize, count: usize },
    #[error("unknown upgrade name {0:?}")]
    UnknownUpgradeName(String),
    #[error("unknown resource name {0:?}")]
    UnknownResource(String),
    #[error("upgrade {name} is at max level {max} already")]
    MaxLevel { name: String, max: usize },
    #[error("upgrade {name} has no alternate production to switch to")]
    NotSwitchable { name: String },
    #[error("prerequisite graph: {0}")]
    Graph(String),
    #[error("game definition: {0}")]
    Definition(String),
    #[error("plan line {line}: {message}")]
    Plan { line: usize, message: String },
    #[error("invalid time left {0:?}")]
    TimeLeft(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_offender() {
        let err = GameError::MaxLevel {
            name: "Farm".to_string(),
            max: 3,
        };
        assert_eq!(err.to_string(), "upgrade Farm is at max level 3 already");
        let err = GameError::UnknownUpgrade { index: 9, count: 4 };
        assert!(err.to_string().contains("index 9"));
    }
}
