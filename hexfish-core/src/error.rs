//! Error types for board and game state operations

use crate::board::Position;
use crate::game::{Action, Color, Phase};

/// Broad class of a [`FishError`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad construction parameters
    Configuration,
    /// A placement or move the rules forbid
    RuleViolation,
    /// An internal reference to something that does not exist
    Consistency,
}

/// Error types for the game engine
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FishError {
    #[error("Malformed board: {0}")]
    MalformedBoard(String),

    #[error("Malformed game state: {0}")]
    MalformedState(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("No tile at {0}: already a hole")]
    NoSuchTile(Position),

    #[error("Position {0} is not on the board")]
    OutOfBounds(Position),

    #[error("Position {0} is occupied or a hole")]
    PositionOccupiedOrHole(Position),

    #[error("Operation needs phase {expected:?}, game is {actual:?}")]
    WrongPhase { expected: Phase, actual: Phase },

    #[error("No avatar of the current player at {0}")]
    NotYourAvatar(Position),

    #[error("Illegal move {0}")]
    IllegalMove(Action),

    #[error("Unknown player {0:?}")]
    NoSuchIdentity(Color),

    #[error("Color {0:?} assigned twice")]
    DuplicateIdentity(Color),

    #[error("Game tree needs a game past the placement phase")]
    GameNotRunning,

    #[error("Action {0} is not legal here")]
    InvalidAction(Action),
}

impl FishError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            FishError::MalformedBoard(_)
            | FishError::MalformedState(_)
            | FishError::InvalidParameter(_)
            | FishError::DuplicateIdentity(_) => ErrorKind::Configuration,
            FishError::NoSuchIdentity(_) | FishError::GameNotRunning => ErrorKind::Consistency,
            FishError::NoSuchTile(_)
            | FishError::OutOfBounds(_)
            | FishError::PositionOccupiedOrHole(_)
            | FishError::WrongPhase { .. }
            | FishError::NotYourAvatar(_)
            | FishError::IllegalMove(_)
            | FishError::InvalidAction(_) => ErrorKind::RuleViolation,
        }
    }

    /// True for errors caused by a forbidden placement or move
    pub fn is_rule_violation(&self) -> bool {
        self.kind() == ErrorKind::RuleViolation
    }
}

pub type Result<T> = std::result::Result<T, FishError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let pos = Position::new(0, 0);
        assert_eq!(FishError::OutOfBounds(pos).kind(), ErrorKind::RuleViolation);
        assert_eq!(FishError::NoSuchIdentity(Color::Red).kind(), ErrorKind::Consistency);
        assert_eq!(
            FishError::InvalidParameter("rows".into()).kind(),
            ErrorKind::Configuration
        );
        assert!(FishError::InvalidAction(Action::new(pos, pos)).is_rule_violation());
    }
}
