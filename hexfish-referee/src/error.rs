//! Error types for match setup and player calls

use std::time::Duration;

use hexfish_core::FishError;

/// Match cannot be set up with the given parameters
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid referee parameter: {0}")]
    InvalidParameter(String),

    #[error("Game setup failed: {0}")]
    Game(#[from] FishError),
}

/// What a player implementation may report back instead of an answer
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PlayerError {
    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("Player disconnected: {0}")]
    Disconnected(String),

    #[error("Player refused: {0}")]
    Refused(String),
}

pub type PlayerResult<T> = std::result::Result<T, PlayerError>;

/// Why a call into a player produced no usable answer
#[derive(Debug, thiserror::Error)]
pub enum CallFailure {
    #[error("No response within {0:?}")]
    Timeout(Duration),

    #[error("Player panicked")]
    Panicked,

    #[error("{0}")]
    Responded(PlayerError),

    #[error("Could not start player worker: {0}")]
    Spawn(String),
}
