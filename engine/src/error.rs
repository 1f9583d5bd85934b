use thiserror::Error;

/// Why a dice notation string could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiceError {
    #[error("empty dice expression")]
    Empty,
    #[error("unexpected '{found}' at position {pos} in dice expression")]
    Unexpected { found: char, pos: usize },
    #[error("dangling operator at end of dice expression")]
    DanglingOperator,
    #[error("number too large in dice expression")]
    NumberTooLarge,
    #[error("dice group '{0}' must have at least one die with at least one side")]
    ZeroDice(String),
    #[error("too many dice ({count}, limit {limit})")]
    TooManyDice { count: u64, limit: u64 },
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to read rule file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse JSON rules from {origin}: {source}")]
    Json {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to parse YAML rules from {origin}: {source}")]
    Yaml {
        origin: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("cannot tell rule format of {0} (expected .json, .yaml or .yml)")]
    UnknownFormat(String),
    #[error("{origin}: expected a list of rules or an object with a 'rules' or 'skills' list")]
    Shape { origin: String },
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("rule '{id}' is defined more than once (again in {origin})")]
    DuplicateRule { id: String, origin: String },
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// Hard failures: continuing would read or write the wrong state.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("character '{0}' not found")]
    CharacterNotFound(String),
    #[error("skill '{0}' not found in the rule registry")]
    SkillNotFound(String),
    #[error("weapon '{0}' not found in the rule registry")]
    WeaponNotFound(String),
    #[error("character '{0}' has no current HP; initialize its state first")]
    StateNotInitialized(String),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("invalid engine config: {0}")]
    Config(String),
}
