//! Integration tests for the HEXFISH engine
//!
//! Exercises board reachability, game state invariants, the game tree and
//! the search together.

use hexfish_core::{
    best_action, place_avatar, Action, Board, Color, GameState, GameTree, Identity, Phase,
    Position, Tile,
};
use rustc_hash::FxHashSet;

// ============================================================================
// TEST FIXTURES
// ============================================================================

fn p(row: usize, col: usize) -> Position {
    Position::new(row, col)
}

fn players(n: usize) -> Vec<Identity> {
    Color::ALL[..n]
        .iter()
        .enumerate()
        .map(|(i, &c)| Identity::new(c, format!("player-{i}")))
        .collect()
}

/// A board with a few holes and uneven fish
fn patchy_board() -> Board {
    Board::from_fish_counts(&[
        vec![1, 2, 0, 3, 1],
        vec![4, 0, 2, 5, 1],
        vec![1, 3, 1, 0, 2],
        vec![0, 2, 4, 1, 3],
        vec![2, 1, 5, 2, 0],
        vec![3, 0, 1, 4, 2],
    ])
    .unwrap()
}

/// Place every avatar with the row-major heuristic
fn placed_game(board: Board, n: usize) -> GameState {
    let mut state = GameState::new(board, players(n)).unwrap();
    while state.phase() == Phase::Placing {
        let pos = place_avatar(&state).unwrap();
        state.place_avatar(pos).unwrap();
    }
    state
}

fn occupied(state: &GameState) -> Vec<Position> {
    state
        .players()
        .iter()
        .flat_map(|r| r.avatars.iter().copied())
        .collect()
}

// ============================================================================
// BOARD
// ============================================================================

#[test]
fn test_reachable_never_crosses_holes() {
    let board = patchy_board();
    for from in board.positions() {
        for to in board.reachable_positions(from).unwrap() {
            assert!(!board.tile(to).unwrap().is_hole(), "{to} is a hole");
            for between in board.connecting_positions(from, to) {
                assert!(board.is_fish_tile(between), "{from} -> {to} jumps {between}");
            }
        }
    }
}

#[test]
fn test_homogeneous_three_by_two() {
    let board = Board::homogeneous(3, 3, 2).unwrap();
    // Doubled-row layout: only the south line and the south-east line fit on 3x2
    let reach: FxHashSet<Position> = board.reachable_positions(p(0, 0)).unwrap().into_iter().collect();
    let expected: FxHashSet<Position> = [p(1, 0), p(2, 0), p(2, 1)].into_iter().collect();
    assert_eq!(reach, expected);
    // Same column one row down is a diagonal step; same row is never a line
    assert!(!reach.contains(&p(0, 1)));
}

// ============================================================================
// GAME STATE
// ============================================================================

#[test]
fn test_first_mover_scores_tile_it_left() {
    let board = Board::homogeneous(2, 3, 2).unwrap();
    let mut state = GameState::with_avatar_quota(board, players(2), 1).unwrap();
    state.place_avatar(p(0, 0)).unwrap();
    state.place_avatar(p(1, 0)).unwrap();

    let actions = state.possible_actions();
    assert_eq!(actions.len(), 1);
    state.apply(actions[0]).unwrap();
    assert_eq!(state.score(Color::Red).unwrap(), 2);
}

#[test]
fn test_move_turns_source_into_hole() {
    let mut state = placed_game(patchy_board(), 3);
    while state.phase() == Phase::Running {
        let mover = state.current_turn().unwrap();
        let action = *state.possible_actions().last().unwrap();
        let fish = state.board().fish_at(action.src).unwrap();
        let before = state.score(mover).unwrap();

        state.apply(action).unwrap();

        assert_eq!(state.board().tile(action.src).unwrap(), Tile::Hole);
        assert_eq!(state.score(mover).unwrap(), before + u32::from(fish));

        let cells = occupied(&state);
        let unique: FxHashSet<Position> = cells.iter().copied().collect();
        assert_eq!(unique.len(), cells.len());
        assert!(cells.iter().all(|&c| state.board().is_fish_tile(c)));
    }

    let final_state = state.clone();
    assert_eq!(final_state.phase(), Phase::Over);
    assert!(state.move_avatar(p(0, 0), p(2, 0)).is_err());
    assert_eq!(state.phase(), Phase::Over);
}

#[test]
fn test_removed_player_cells_stay_tiles() {
    let mut state = placed_game(patchy_board(), 4);
    let white = state.avatars(Color::White).unwrap().to_vec();
    state.remove_player(Color::White).unwrap();
    for pos in white {
        assert!(state.board().is_fish_tile(pos));
        assert!(!state.is_occupied(pos));
    }
    assert_eq!(state.players().len(), 3);
}

// ============================================================================
// TREE & SEARCH
// ============================================================================

#[test]
fn test_tree_children_match_manual_moves() {
    let state = placed_game(patchy_board(), 2);
    let tree = GameTree::new(state.clone()).unwrap();
    for (action, child) in tree.children() {
        let mut expected = state.clone();
        expected.apply(action).unwrap();
        assert_eq!(child.state(), &expected);
    }
}

#[test]
fn test_search_plays_out_a_game() {
    let mut state = placed_game(patchy_board(), 2);
    let mut moves = 0;
    while state.phase() == Phase::Running {
        let best = best_action(&state, 2).unwrap().unwrap();
        assert!(state.possible_actions().contains(&best.action));
        state.apply(best.action).unwrap();
        moves += 1;
    }
    assert!(moves > 0);
    assert_eq!(state.move_log().len(), moves);
}

#[test]
fn test_wire_types_round_trip() {
    let action = Action::new(p(3, 1), p(5, 1));
    let json = serde_json::to_string(&action).unwrap();
    assert_eq!(serde_json::from_str::<Action>(&json).unwrap(), action);

    let tile: Tile = serde_json::from_str(&serde_json::to_string(&Tile::Fish(4)).unwrap()).unwrap();
    assert_eq!(tile, Tile::Fish(4));
}

#[test]
fn test_state_snapshot_round_trip() {
    let mut state = GameState::with_avatar_quota(patchy_board(), players(2), 2).unwrap();
    while state.phase() == Phase::Placing {
        let pos = place_avatar(&state).unwrap();
        state.place_avatar(pos).unwrap();
    }
    for _ in 0..3 {
        match state.possible_actions().first() {
            Some(&action) => state.apply(action).unwrap(),
            None => break,
        }
    }

    let json = serde_json::to_string(&state).unwrap();
    let back: GameState = serde_json::from_str(&json).unwrap();
    assert_eq!(back, state);
    assert_eq!(back.possible_actions(), state.possible_actions());
    assert_eq!(back.move_log(), state.move_log());
    assert_eq!(
        back.board().reachable_positions(p(2, 2)),
        state.board().reachable_positions(p(2, 2))
    );
}

#[test]
fn test_board_decode_rejects_bad_cells() {
    let short = r#"{"rows":2,"cols":2,"tiles":[{"Fish":1},"Hole","Hole"]}"#;
    assert!(serde_json::from_str::<Board>(short).is_err());

    let greedy = r#"{"rows":1,"cols":1,"tiles":[{"Fish":9}]}"#;
    assert!(serde_json::from_str::<Board>(greedy).is_err());
}
