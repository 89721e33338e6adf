//! Player capability and a local strategy-driven player
//!
//! Every participant in a match, whether an in-process AI, a proxy for a
//! remote client or a scripted test double, implements [`Player`]. The
//! referee only ever hands it snapshots, so nothing a player does with its
//! arguments can reach the referee's own state.

use hexfish_core::{best_action, place_avatar, Action, Color, GameState, Position};
use serde::{Deserialize, Serialize};

use crate::error::{PlayerError, PlayerResult};
use crate::report::GameReport;

/// Why a player was thrown out of a match
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KickReason {
    /// Tried a placement or move the rules forbid
    Cheating(String),
    /// Timed out, panicked or answered with garbage
    Failing(String),
}

/// Result notices sent by whoever organizes matches
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayerStatus {
    WonGame,
    LostGame,
    WonTournament,
    Discontinued,
}

/// Capability the referee calls into for each decision
///
/// Methods returning `PlayerResult` are acknowledged; an `Err` counts the
/// same as a timeout.
pub trait Player: Send {
    /// Learn the color this player will play as
    fn assign_color(&mut self, _color: Color) -> PlayerResult<()> {
        Ok(())
    }

    /// Learn the colors of the other players
    fn notify_opponents(&mut self, _opponents: Vec<Color>) -> PlayerResult<()> {
        Ok(())
    }

    /// Choose where to place the next avatar
    fn request_placement(&mut self, state: GameState) -> PlayerResult<Position>;

    /// Choose the next move
    fn request_action(&mut self, state: GameState) -> PlayerResult<Action>;

    /// Told it has been removed from the match
    fn kick(&mut self, _reason: KickReason) {}

    /// Latest state after any change
    fn sync(&mut self, _state: GameState) {}

    /// Final standings of the match
    fn report_game_over(&mut self, _report: GameReport) {}

    fn report_status(&mut self, _status: PlayerStatus) -> PlayerResult<()> {
        Ok(())
    }
}

/// In-process player driven by the placement heuristic and minimax search
#[derive(Clone, Debug)]
pub struct LocalPlayer {
    depth: u32,
    color: Option<Color>,
}

impl LocalPlayer {
    pub fn new(depth: u32) -> Self {
        Self { depth, color: None }
    }

    pub fn color(&self) -> Option<Color> {
        self.color
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }
}

impl Player for LocalPlayer {
    fn assign_color(&mut self, color: Color) -> PlayerResult<()> {
        self.color = Some(color);
        Ok(())
    }

    fn request_placement(&mut self, state: GameState) -> PlayerResult<Position> {
        place_avatar(&state).ok_or_else(|| PlayerError::Refused("no open tile left".into()))
    }

    fn request_action(&mut self, state: GameState) -> PlayerResult<Action> {
        let best = best_action(&state, self.depth)
            .map_err(|e| PlayerError::Refused(e.to_string()))?;
        best.map(|scored| scored.action)
            .ok_or_else(|| PlayerError::Refused("no legal move".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexfish_core::{Board, Identity};

    fn game() -> GameState {
        let board = Board::homogeneous(2, 4, 3).unwrap();
        let players = vec![Identity::new(Color::Red, "a"), Identity::new(Color::White, "b")];
        GameState::with_avatar_quota(board, players, 1).unwrap()
    }

    #[test]
    fn test_local_player_places_row_major() {
        let mut player = LocalPlayer::new(1);
        player.assign_color(Color::Red).unwrap();
        assert_eq!(player.color(), Some(Color::Red));
        assert_eq!(player.request_placement(game()).unwrap(), Position::new(0, 0));
    }

    #[test]
    fn test_local_player_moves_legally() {
        let mut state = game();
        state.place_avatar(Position::new(0, 0)).unwrap();
        state.place_avatar(Position::new(3, 2)).unwrap();

        let mut player = LocalPlayer::new(2);
        let action = player.request_action(state.clone()).unwrap();
        assert!(state.possible_actions().contains(&action));
    }

    #[test]
    fn test_local_player_refuses_during_placement() {
        let mut player = LocalPlayer::new(2);
        assert!(matches!(player.request_action(game()), Err(PlayerError::Refused(_))));
    }
}
