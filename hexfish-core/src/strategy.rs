//! Placement heuristic and minimax move search with alpha-beta pruning

use crate::board::Position;
use crate::error::{FishError, Result};
use crate::game::{Action, Color, GameState};
use crate::tree::GameTree;

/// An action together with the score the search expects from it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoredAction {
    pub action: Action,
    /// Mover's fish total at the search horizon
    pub score: i64,
}

// ============================================================================
// PLACEMENT
// ============================================================================

/// First open tile in row-major order, or None if the board is full
pub fn place_avatar(state: &GameState) -> Option<Position> {
    let board = state.board();
    board
        .positions()
        .find(|&pos| board.is_fish_tile(pos) && !state.is_occupied(pos))
}

// ============================================================================
// MINIMAX WITH ALPHA-BETA
// ============================================================================

/// Best action for the turn holder, searching `depth` turns ahead
///
/// Leaves are scored by the mover's own fish total; every other player is
/// assumed to minimize it. Equal scores keep the earliest action in
/// row-major order. Returns `Ok(None)` when the turn holder has no move.
pub fn best_action(state: &GameState, depth: u32) -> Result<Option<ScoredAction>> {
    if depth == 0 {
        return Err(FishError::InvalidParameter("search depth must be positive".into()));
    }

    let tree = GameTree::new(state.clone())?;
    let maximizer = match tree.state().current_turn() {
        Some(color) => color,
        None => return Ok(None),
    };

    let mut best: Option<ScoredAction> = None;
    let mut alpha = i64::MIN;
    for (action, child) in tree.children() {
        let score = search(child, depth - 1, alpha, i64::MAX, maximizer);
        if best.map_or(true, |b| score > b.score) {
            best = Some(ScoredAction { action, score });
            alpha = alpha.max(score);
        }
    }

    Ok(best)
}

fn leaf_score(node: &GameTree, maximizer: Color) -> i64 {
    // A maximizer removed from the game scores nothing
    node.state().score(maximizer).map_or(0, i64::from)
}

fn search(node: &GameTree, depth: u32, mut alpha: i64, mut beta: i64, maximizer: Color) -> i64 {
    if depth == 0 || node.is_leaf() {
        return leaf_score(node, maximizer);
    }

    if node.state().current_turn() == Some(maximizer) {
        let mut best = i64::MIN;
        for (_, child) in node.children() {
            best = best.max(search(child, depth - 1, alpha, beta, maximizer));
            alpha = alpha.max(best);
            if alpha >= beta {
                break;
            }
        }
        best
    } else {
        let mut best = i64::MAX;
        for (_, child) in node.children() {
            best = best.min(search(child, depth - 1, alpha, beta, maximizer));
            beta = beta.min(best);
            if alpha >= beta {
                break;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Board;
    use crate::game::Identity;

    fn p(row: usize, col: usize) -> Position {
        Position::new(row, col)
    }

    fn two_players() -> Vec<Identity> {
        vec![Identity::new(Color::Red, "red"), Identity::new(Color::White, "white")]
    }

    /// Plain minimax without pruning, for cross-checking
    fn minimax(state: &GameState, depth: u32, maximizer: Color) -> i64 {
        let actions = state.possible_actions();
        if depth == 0 || actions.is_empty() {
            return state.score(maximizer).map_or(0, i64::from);
        }
        let scores = actions.into_iter().map(|a| {
            let mut next = state.clone();
            next.apply(a).unwrap();
            minimax(&next, depth - 1, maximizer)
        });
        if state.current_turn() == Some(maximizer) {
            scores.max().unwrap()
        } else {
            scores.min().unwrap()
        }
    }

    #[test]
    fn test_place_avatar_row_major() {
        let board = Board::from_fish_counts(&[vec![0, 1], vec![1, 1]]).unwrap();
        let mut state = GameState::with_avatar_quota(board, two_players(), 1).unwrap();
        assert_eq!(place_avatar(&state), Some(p(0, 1)));
        state.place_avatar(p(0, 1)).unwrap();
        assert_eq!(place_avatar(&state), Some(p(1, 0)));
    }

    #[test]
    fn test_depth_must_be_positive() {
        let board = Board::homogeneous(1, 3, 2).unwrap();
        let mut state = GameState::with_avatar_quota(board, two_players(), 1).unwrap();
        state.place_avatar(p(0, 0)).unwrap();
        state.place_avatar(p(1, 0)).unwrap();
        assert!(matches!(best_action(&state, 0), Err(FishError::InvalidParameter(_))));
    }

    #[test]
    fn test_single_move_before_game_over() {
        // Red's only move is (0,0) -> (2,0), after which nobody can move
        let board = Board::from_fish_counts(&[vec![3, 1], vec![0, 0], vec![2, 0]]).unwrap();
        let mut state = GameState::with_avatar_quota(board, two_players(), 1).unwrap();
        state.place_avatar(p(0, 0)).unwrap();
        state.place_avatar(p(0, 1)).unwrap();

        let best = best_action(&state, 1).unwrap().unwrap();
        assert_eq!(best.action, Action::new(p(0, 0), p(2, 0)));
        assert_eq!(best.score, 3);
    }

    #[test]
    fn test_no_move_returns_none() {
        let board = Board::from_fish_counts(&[vec![1], vec![1]]).unwrap();
        let mut state = GameState::with_avatar_quota(board, two_players(), 1).unwrap();
        state.place_avatar(p(0, 0)).unwrap();
        state.place_avatar(p(1, 0)).unwrap();
        assert_eq!(best_action(&state, 2).unwrap(), None);
    }

    #[test]
    fn test_prefers_more_fish() {
        // White is walled in. Red can reach (0,0), (4,0) or (6,0); only
        // stopping on the 5 first pays off two moves later
        let board = Board::from_fish_counts(&[
            vec![1, 1],
            vec![0, 0],
            vec![2, 0],
            vec![0, 0],
            vec![5, 0],
            vec![0, 0],
            vec![1, 0],
        ])
        .unwrap();
        let mut state = GameState::with_avatar_quota(board, two_players(), 1).unwrap();
        state.place_avatar(p(2, 0)).unwrap();
        state.place_avatar(p(0, 1)).unwrap();

        let best = best_action(&state, 3).unwrap().unwrap();
        assert_eq!(best.action, Action::new(p(2, 0), p(4, 0)));
        assert_eq!(best.score, 7);
        assert_eq!(minimax(&state, 3, Color::Red), best.score);
    }

    #[test]
    fn test_pruning_matches_minimax() {
        let board = Board::from_fish_counts(&[
            vec![1, 3, 2, 1],
            vec![2, 5, 1, 4],
            vec![3, 1, 4, 2],
            vec![5, 2, 1, 3],
        ])
        .unwrap();
        let mut state = GameState::with_avatar_quota(board, two_players(), 2).unwrap();
        for pos in [p(0, 0), p(3, 3), p(1, 2), p(2, 1)] {
            state.place_avatar(pos).unwrap();
        }

        for depth in 1..=3 {
            let best = best_action(&state, depth).unwrap().unwrap();
            assert_eq!(best.score, minimax(&state, depth, Color::Red), "depth {depth}");
            assert!(state.possible_actions().contains(&best.action));
        }
    }

    #[test]
    fn test_ties_keep_row_major_order() {
        let board = Board::homogeneous(1, 4, 3).unwrap();
        let mut state = GameState::with_avatar_quota(board, two_players(), 1).unwrap();
        state.place_avatar(p(1, 1)).unwrap();
        state.place_avatar(p(3, 2)).unwrap();

        // Depth 1 scores every move the same, so the first action wins
        let best = best_action(&state, 1).unwrap().unwrap();
        assert_eq!(best.action, state.possible_actions()[0]);
        assert_eq!(best.score, 1);
    }
}
