//! HEXFISH Core - Game engine for the hex fish-tile game
//!
//! This crate provides the core game logic:
//! - Board geometry (offset hex grid with holes)
//! - Game state, turn order and move validation
//! - Lazily expanded game tree
//! - Placement heuristic and alpha-beta move search

pub mod board;
pub mod error;
pub mod game;
pub mod strategy;
pub mod tree;

// Re-exports for convenient access
pub use board::{Board, BoardCells, Direction, Position, Tile, MAX_FISH, MIN_FISH};
pub use error::{ErrorKind, FishError, Result};
pub use game::{
    avatars_per_player, Action, Color, GameState, GameStateRecord, Identity, Phase, PlayerRecord,
    MAX_PLAYERS, MIN_PLAYERS,
};
pub use strategy::{best_action, place_avatar, ScoredAction};
pub use tree::GameTree;
