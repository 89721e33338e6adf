//! Game state, turn order and move validation

use std::fmt;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::board::{Board, Direction, Position};
use crate::error::{FishError, Result};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Fewest players a game may start with
pub const MIN_PLAYERS: usize = 2;

/// Most players a game may start with
pub const MAX_PLAYERS: usize = 4;

/// Avatars each player places, for a game with `players` participants
pub fn avatars_per_player(players: usize) -> usize {
    6usize.saturating_sub(players)
}

// ============================================================================
// CORE TYPES
// ============================================================================

/// Player color, unique within a game
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Color {
    Red,
    White,
    Brown,
    Black,
}

impl Color {
    /// Colors in the order they are handed out
    pub const ALL: [Color; MAX_PLAYERS] = [Color::Red, Color::White, Color::Brown, Color::Black];
}

/// A player's color and display name
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    pub color: Color,
    pub name: String,
}

impl Identity {
    pub fn new(color: Color, name: impl Into<String>) -> Self {
        Self {
            color,
            name: name.into(),
        }
    }
}

/// Game phase
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Placing,
    Running,
    Over,
}

/// Moving one avatar from `src` to `dst`
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Action {
    pub src: Position,
    pub dst: Position,
}

impl Action {
    pub const fn new(src: Position, dst: Position) -> Self {
        Self { src, dst }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.src, self.dst)
    }
}

/// Per-player state owned by the game
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub identity: Identity,
    /// Fish collected so far
    pub score: u32,
    /// Avatar positions in placement order
    pub avatars: Vec<Position>,
}

impl PlayerRecord {
    fn new(identity: Identity) -> Self {
        Self {
            identity,
            score: 0,
            avatars: Vec::new(),
        }
    }

    pub fn color(&self) -> Color {
        self.identity.color
    }
}

// ============================================================================
// GAME STATE
// ============================================================================

/// Full game state (clone for an independent snapshot)
///
/// Decoding goes through [`GameStateRecord`] so a snapshot from outside is
/// checked before it can be played on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "GameStateRecord")]
pub struct GameState {
    board: Board,

    /// Players in turn order
    players: Vec<PlayerRecord>,

    phase: Phase,

    /// Index into `players` of the turn holder
    turn: usize,

    /// Avatars each player places
    avatar_quota: usize,

    /// Players known to have no move. Cleared whenever a player leaves,
    /// since a vacated avatar can open lines for others.
    stuck: FxHashSet<Color>,

    /// Executed moves, oldest first
    moves: Vec<Action>,
}

/// Unchecked field-for-field form of a [`GameState`]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameStateRecord {
    pub board: Board,
    pub players: Vec<PlayerRecord>,
    pub phase: Phase,
    pub turn: usize,
    pub avatar_quota: usize,
    pub stuck: FxHashSet<Color>,
    pub moves: Vec<Action>,
}

impl TryFrom<GameStateRecord> for GameState {
    type Error = FishError;

    fn try_from(record: GameStateRecord) -> Result<Self> {
        let malformed = |why: String| Err(FishError::MalformedState(why));

        if record.players.len() > MAX_PLAYERS {
            return malformed(format!("{} players", record.players.len()));
        }
        if record.avatar_quota == 0 {
            return malformed("avatar quota must be positive".into());
        }
        if record.players.is_empty() {
            if record.phase != Phase::Over {
                return malformed("a game without players must be over".into());
            }
        } else if record.turn >= record.players.len() {
            return malformed(format!("turn {} out of range", record.turn));
        }

        let mut colors = FxHashSet::default();
        let mut occupied = FxHashSet::default();
        for player in &record.players {
            if !colors.insert(player.color()) {
                return Err(FishError::DuplicateIdentity(player.color()));
            }
            if player.avatars.len() > record.avatar_quota {
                return malformed(format!("{:?} has too many avatars", player.color()));
            }
            for &pos in &player.avatars {
                if !record.board.is_fish_tile(pos) || !occupied.insert(pos) {
                    return Err(FishError::PositionOccupiedOrHole(pos));
                }
            }
        }
        if let Some(color) = record.stuck.iter().find(|c| !colors.contains(*c)) {
            return Err(FishError::NoSuchIdentity(*color));
        }

        Ok(Self {
            board: record.board,
            players: record.players,
            phase: record.phase,
            turn: record.turn,
            avatar_quota: record.avatar_quota,
            stuck: record.stuck,
            moves: record.moves,
        })
    }
}

impl GameState {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Create a game in the placement phase
    ///
    /// `identities` is the turn order. Each player places
    /// [`avatars_per_player`] avatars.
    pub fn new(board: Board, identities: Vec<Identity>) -> Result<Self> {
        let quota = avatars_per_player(identities.len());
        Self::with_avatar_quota(board, identities, quota)
    }

    /// Create a game with a custom number of avatars per player
    pub fn with_avatar_quota(board: Board, identities: Vec<Identity>, quota: usize) -> Result<Self> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&identities.len()) {
            return Err(FishError::InvalidParameter(format!(
                "a game needs {MIN_PLAYERS}..={MAX_PLAYERS} players, got {}",
                identities.len()
            )));
        }
        if quota == 0 {
            return Err(FishError::InvalidParameter("avatar quota must be positive".into()));
        }

        let mut seen = FxHashSet::default();
        for identity in &identities {
            if !seen.insert(identity.color) {
                return Err(FishError::DuplicateIdentity(identity.color));
            }
        }

        Ok(Self {
            board,
            players: identities.into_iter().map(PlayerRecord::new).collect(),
            phase: Phase::Placing,
            turn: 0,
            avatar_quota: quota,
            stuck: FxHashSet::default(),
            moves: Vec::new(),
        })
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Players still in the game, in turn order
    pub fn players(&self) -> &[PlayerRecord] {
        &self.players
    }

    pub fn avatar_quota(&self) -> usize {
        self.avatar_quota
    }

    /// Moves executed so far
    pub fn move_log(&self) -> &[Action] {
        &self.moves
    }

    /// Color of the turn holder, or None once the game is over
    pub fn current_turn(&self) -> Option<Color> {
        if self.phase == Phase::Over {
            return None;
        }
        self.players.get(self.turn).map(PlayerRecord::color)
    }

    fn record(&self, color: Color) -> Result<&PlayerRecord> {
        self.players
            .iter()
            .find(|p| p.color() == color)
            .ok_or(FishError::NoSuchIdentity(color))
    }

    /// Identity registered for a color
    pub fn identity(&self, color: Color) -> Result<&Identity> {
        self.record(color).map(|p| &p.identity)
    }

    pub fn score(&self, color: Color) -> Result<u32> {
        self.record(color).map(|p| p.score)
    }

    /// Avatar positions of a player, in placement order
    pub fn avatars(&self, color: Color) -> Result<&[Position]> {
        self.record(color).map(|p| p.avatars.as_slice())
    }

    /// Who has an avatar at `pos`, if anyone
    pub fn occupant(&self, pos: Position) -> Option<Color> {
        self.players
            .iter()
            .find(|p| p.avatars.contains(&pos))
            .map(PlayerRecord::color)
    }

    pub fn is_occupied(&self, pos: Position) -> bool {
        self.occupant(pos).is_some()
    }

    /// Players ordered by score, highest first (ties keep turn order)
    pub fn leaderboard(&self) -> Vec<&PlayerRecord> {
        let mut ranked: Vec<&PlayerRecord> = self.players.iter().collect();
        ranked.sort_by(|a, b| b.score.cmp(&a.score));
        ranked
    }

    /// Independent deep copy, safe to hand to untrusted code
    pub fn snapshot(&self) -> GameState {
        self.clone()
    }

    // ========================================================================
    // PLACEMENT
    // ========================================================================

    /// Place an avatar for the turn holder
    pub fn place_avatar(&mut self, pos: Position) -> Result<()> {
        self.expect_phase(Phase::Placing)?;
        if !self.board.contains(pos) {
            return Err(FishError::OutOfBounds(pos));
        }
        if !self.board.is_fish_tile(pos) || self.is_occupied(pos) {
            return Err(FishError::PositionOccupiedOrHole(pos));
        }

        self.players[self.turn].avatars.push(pos);
        self.advance_placement(self.turn + 1);
        Ok(())
    }

    fn has_placed_all(&self, idx: usize) -> bool {
        self.players[idx].avatars.len() >= self.avatar_quota
    }

    /// Hand the placement turn to the first player from `start` on who still
    /// has avatars to place, or begin play if nobody does
    fn advance_placement(&mut self, start: usize) {
        let n = self.players.len();
        if n == 0 {
            self.phase = Phase::Over;
            return;
        }

        for offset in 0..n {
            let idx = (start + offset) % n;
            if !self.has_placed_all(idx) {
                self.turn = idx;
                return;
            }
        }

        self.phase = Phase::Running;
        self.advance_running(0);
    }

    // ========================================================================
    // MOVEMENT
    // ========================================================================

    /// Positions an avatar at `src` could move to right now
    ///
    /// Each straight line stops before the first hole, board edge or avatar.
    pub fn destinations(&self, src: Position) -> Vec<Position> {
        let mut out = Vec::new();
        for dir in Direction::ALL {
            for pos in self.board.ray(src, dir) {
                if self.is_occupied(pos) {
                    break;
                }
                out.push(pos);
            }
        }
        out
    }

    fn actions_for(&self, idx: usize) -> Vec<Action> {
        let mut actions: Vec<Action> = self.players[idx]
            .avatars
            .iter()
            .flat_map(|&src| {
                self.destinations(src)
                    .into_iter()
                    .map(move |dst| Action::new(src, dst))
            })
            .collect();
        actions.sort();
        actions
    }

    fn index_can_move(&self, idx: usize) -> bool {
        self.players[idx]
            .avatars
            .iter()
            .any(|&src| !self.destinations(src).is_empty())
    }

    /// Legal actions for the turn holder, in row-major order of source then
    /// destination; empty outside the running phase
    pub fn possible_actions(&self) -> Vec<Action> {
        if self.phase != Phase::Running || self.players.is_empty() {
            return Vec::new();
        }
        self.actions_for(self.turn)
    }

    /// Move one of the turn holder's avatars
    pub fn move_avatar(&mut self, src: Position, dst: Position) -> Result<()> {
        self.expect_phase(Phase::Running)?;
        let action = Action::new(src, dst);
        if !self.board.contains(src) {
            return Err(FishError::OutOfBounds(src));
        }
        if !self.board.contains(dst) {
            return Err(FishError::OutOfBounds(dst));
        }
        if !self.players[self.turn].avatars.contains(&src) {
            return Err(FishError::NotYourAvatar(src));
        }
        if !self.board.reachable_positions(src)?.contains(&dst) {
            return Err(FishError::IllegalMove(action));
        }
        let blocked = self
            .board
            .connecting_positions(src, dst)
            .into_iter()
            .chain(std::iter::once(dst))
            .any(|pos| self.is_occupied(pos));
        if blocked {
            return Err(FishError::IllegalMove(action));
        }

        self.apply_unchecked(action)
    }

    /// Same as [`GameState::move_avatar`] for an [`Action`]
    pub fn apply(&mut self, action: Action) -> Result<()> {
        self.move_avatar(action.src, action.dst)
    }

    /// Execute a move already known to be legal
    pub(crate) fn apply_unchecked(&mut self, action: Action) -> Result<()> {
        let fish = self.board.fish_at(action.src)?;
        self.board.remove_tile(action.src)?;

        let mover = &mut self.players[self.turn];
        mover.score += u32::from(fish);
        for avatar in mover.avatars.iter_mut() {
            if *avatar == action.src {
                *avatar = action.dst;
            }
        }

        self.moves.push(action);
        self.advance_running(self.turn + 1);
        Ok(())
    }

    /// Hand the turn to the first player from `start` on who can move,
    /// ending the game if nobody can
    fn advance_running(&mut self, start: usize) {
        let n = self.players.len();
        for offset in 0..n {
            let idx = (start + offset) % n;
            let color = self.players[idx].color();
            if self.stuck.contains(&color) {
                continue;
            }
            if self.index_can_move(idx) {
                self.turn = idx;
                return;
            }
            self.stuck.insert(color);
        }

        self.phase = Phase::Over;
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// True if any player still in the game has a legal move
    ///
    /// Always computed from the board, never from the stuck cache.
    pub fn can_anyone_move(&self) -> bool {
        (0..self.players.len()).any(|idx| self.index_can_move(idx))
    }

    /// True if none of the player's avatars can move
    pub fn is_stuck(&self, color: Color) -> Result<bool> {
        let idx = self.index_of(color)?;
        if self.stuck.contains(&color) {
            return Ok(true);
        }
        Ok(!self.index_can_move(idx))
    }

    fn index_of(&self, color: Color) -> Result<usize> {
        self.players
            .iter()
            .position(|p| p.color() == color)
            .ok_or(FishError::NoSuchIdentity(color))
    }

    fn expect_phase(&self, expected: Phase) -> Result<()> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(FishError::WrongPhase {
                expected,
                actual: self.phase,
            })
        }
    }

    // ========================================================================
    // REMOVAL
    // ========================================================================

    /// Eject a player and free the cells its avatars stood on
    ///
    /// The tiles under those avatars are left as they are.
    pub fn remove_player(&mut self, color: Color) -> Result<()> {
        let idx = self.index_of(color)?;
        self.players.remove(idx);
        self.stuck.clear();

        if self.players.is_empty() {
            self.turn = 0;
            self.phase = Phase::Over;
            return Ok(());
        }

        if idx < self.turn {
            self.turn -= 1;
        }
        let start = if idx == self.turn { idx % self.players.len() } else { self.turn };

        match self.phase {
            Phase::Placing => self.advance_placement(start),
            Phase::Running => self.advance_running(start),
            Phase::Over => self.turn = start,
        }
        Ok(())
    }
}
