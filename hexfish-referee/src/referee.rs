//! Referee - runs one match end to end
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: start() - orchestration
//! - Level 2: run_placement(), run_turns(), finish() - phases
//! - Level 3: disqualify(), broadcast_update() - steps
//! - Level 4: board setup and lookup utilities

use std::panic::{self, AssertUnwindSafe};
use std::time::Duration;

use hexfish_core::{
    avatars_per_player, Board, Color, GameState, GameTree, Identity, Phase, Position,
    MAX_FISH, MAX_PLAYERS, MIN_FISH, MIN_PLAYERS,
};
use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::call::PlayerHandle;
use crate::config::RefereeConfig;
use crate::error::{CallFailure, ConfigError, PlayerError, PlayerResult};
use crate::player::{KickReason, Player};
use crate::report::GameReport;

/// Callback receiving a snapshot after every state change
pub type UpdateObserver = Box<dyn FnMut(GameState) + Send>;

/// Callback receiving the final report
pub type ReportObserver = Box<dyn FnMut(GameReport) + Send>;

/// A player entering a match, listed in seniority order
pub struct Participant {
    pub name: String,
    pub player: Box<dyn Player>,
}

impl Participant {
    pub fn new(name: impl Into<String>, player: impl Player + 'static) -> Self {
        Self {
            name: name.into(),
            player: Box::new(player),
        }
    }
}

/// Referee lifecycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefereePhase {
    NotStarted,
    Placing,
    Running,
    Over,
}

struct Seat {
    identity: Identity,
    handle: PlayerHandle,
    /// False once cheating or failing
    active: bool,
}

/// Drives one match and polices its players
pub struct Referee {
    config: RefereeConfig,
    /// The authoritative game; only ever cloned outward
    state: GameState,
    seats: Vec<Seat>,
    phase: RefereePhase,
    cheaters: Vec<Identity>,
    failures: Vec<Identity>,
    report: Option<GameReport>,
    update_observers: Vec<UpdateObserver>,
    report_observers: Vec<ReportObserver>,
}

impl Referee {
    // ========================================================================
    // CONSTRUCTION
    // ========================================================================

    /// Set up a match on a `rows` x `cols` board
    ///
    /// With no `fish_per_tile` a single count is drawn at random for the
    /// whole board. Participants who do not acknowledge their color are
    /// marked failing before play starts.
    pub fn new(
        rows: usize,
        cols: usize,
        participants: Vec<Participant>,
        fish_per_tile: Option<u8>,
        config: RefereeConfig,
    ) -> Result<Self, ConfigError> {
        validate_setup(rows, cols, participants.len(), fish_per_tile)?;

        let mut rng = config.rng();
        let fish = fish_per_tile.unwrap_or_else(|| rng.gen_range(MIN_FISH..=MAX_FISH));
        let mut board = Board::homogeneous(fish, rows, cols)?;
        let needed = participants.len() * avatars_per_player(participants.len());
        let holes = carve_holes(&mut board, &mut rng, config.difficulty_factor, needed);

        let seats: Vec<Seat> = participants
            .into_iter()
            .zip(Color::ALL)
            .map(|(participant, color)| Seat {
                identity: Identity::new(color, participant.name),
                handle: PlayerHandle::new(participant.player),
                active: true,
            })
            .collect();
        let identities = seats.iter().map(|s| s.identity.clone()).collect();
        let state = GameState::new(board, identities)?;

        tracing::info!(
            "Match set up: {}x{} board, {} fish per tile, {} holes, {} players",
            rows,
            cols,
            fish,
            holes,
            seats.len()
        );

        let mut referee = Self {
            config,
            state,
            seats,
            phase: RefereePhase::NotStarted,
            cheaters: Vec::new(),
            failures: Vec::new(),
            report: None,
            update_observers: Vec::new(),
            report_observers: Vec::new(),
        };
        referee.assign_identities();
        Ok(referee)
    }

    fn assign_identities(&mut self) {
        let timeout = self.config.player_timeout;
        let colors: Vec<Color> = self.seats.iter().map(|s| s.identity.color).collect();

        for color in colors.iter().copied() {
            let opponents: Vec<Color> = colors.iter().copied().filter(|&c| c != color).collect();
            let handle = match self.handle(color) {
                Some(h) => h,
                None => continue,
            };
            let acked = handle
                .call(timeout, move |p| p.assign_color(color))
                .and_then(|()| handle.call(timeout, move |p| p.notify_opponents(opponents)));
            if let Err(failure) = acked {
                self.disqualify(color, KickReason::Failing(failure.to_string()));
            }
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn phase(&self) -> RefereePhase {
        self.phase
    }

    pub fn has_started(&self) -> bool {
        self.phase != RefereePhase::NotStarted
    }

    pub fn is_over(&self) -> bool {
        self.phase == RefereePhase::Over
    }

    /// Snapshot of the current game
    pub fn state(&self) -> GameState {
        self.state.snapshot()
    }

    pub fn config(&self) -> &RefereeConfig {
        &self.config
    }

    pub fn cheaters(&self) -> &[Identity] {
        &self.cheaters
    }

    pub fn failures(&self) -> &[Identity] {
        &self.failures
    }

    /// Final report, once the match is over
    pub fn report(&self) -> Option<&GameReport> {
        self.report.as_ref()
    }

    pub fn winners(&self) -> &[Identity] {
        match &self.report {
            Some(report) => &report.winners,
            None => &[],
        }
    }

    pub fn losers(&self) -> &[Identity] {
        match &self.report {
            Some(report) => &report.losers,
            None => &[],
        }
    }

    /// Get called with a snapshot after every placement, move and removal
    pub fn subscribe_game_updates(&mut self, observer: impl FnMut(GameState) + Send + 'static) {
        self.update_observers.push(Box::new(observer));
    }

    /// Get called once with the final report
    pub fn subscribe_final_report(&mut self, observer: impl FnMut(GameReport) + Send + 'static) {
        self.report_observers.push(Box::new(observer));
    }

    // ========================================================================
    // LEVEL 1 - ORCHESTRATION
    // ========================================================================

    /// Play the match to completion
    ///
    /// Calling this again after the first time does nothing.
    pub fn start(&mut self) {
        if self.has_started() {
            return;
        }

        tracing::info!("Match starting with {} players", self.state.players().len());
        self.phase = RefereePhase::Placing;
        self.run_placement();

        if self.state.phase() == Phase::Running {
            self.phase = RefereePhase::Running;
            tracing::debug!("Placement complete, {} players remain", self.state.players().len());
            self.run_turns();
        }

        self.finish();
    }

    // ========================================================================
    // LEVEL 2 - PHASES
    // ========================================================================

    fn run_placement(&mut self) {
        let timeout = self.config.player_timeout;

        while self.state.phase() == Phase::Placing {
            let color = match self.state.current_turn() {
                Some(c) => c,
                None => break,
            };
            let snapshot = self.state.snapshot();
            let reply = self.request(color, timeout, move |p| p.request_placement(snapshot));

            match reply {
                Ok(pos) => self.apply_placement(color, pos),
                Err(failure) => self.disqualify(color, KickReason::Failing(failure.to_string())),
            }
        }
    }

    fn apply_placement(&mut self, color: Color, pos: Position) {
        match self.state.place_avatar(pos) {
            Ok(()) => {
                tracing::debug!("{:?} placed at {}", color, pos);
                self.broadcast_update();
            }
            Err(err) => self.disqualify(color, KickReason::Cheating(err.to_string())),
        }
    }

    fn run_turns(&mut self) {
        let timeout = self.config.player_timeout;

        while self.state.phase() == Phase::Running && self.state.can_anyone_move() {
            let color = match self.state.current_turn() {
                Some(c) => c,
                None => break,
            };
            let tree = match GameTree::new(self.state.snapshot()) {
                Ok(tree) => tree,
                Err(err) => {
                    tracing::error!("Cannot build game tree mid-game: {}", err);
                    break;
                }
            };

            let snapshot = self.state.snapshot();
            let reply = self.request(color, timeout, move |p| p.request_action(snapshot));

            let action = match reply {
                Ok(action) => action,
                Err(failure) => {
                    self.disqualify(color, KickReason::Failing(failure.to_string()));
                    continue;
                }
            };

            let verdict = tree
                .try_action(&action)
                .map(|_| ())
                .and_then(|()| self.state.apply(action));
            match verdict {
                Ok(()) => {
                    tracing::debug!("{:?} moved {}", color, action);
                    self.broadcast_update();
                }
                Err(err) => self.disqualify(color, KickReason::Cheating(err.to_string())),
            }
        }
    }

    fn finish(&mut self) {
        let report = GameReport::new(&self.state, self.cheaters.clone(), self.failures.clone());
        tracing::info!(
            "Match over: winners={:?}, cheaters={}, failures={}",
            report.winners.iter().map(|i| &i.name).collect::<Vec<_>>(),
            report.cheaters.len(),
            report.failures.len()
        );

        let timeout = self.config.player_timeout;
        for seat in self.seats.iter().filter(|s| s.active) {
            let copy = report.clone();
            if let Err(failure) = seat.handle.notify(timeout, move |p| p.report_game_over(copy)) {
                tracing::warn!("{} missed the final report: {}", seat.identity.name, failure);
            }
        }

        for observer in self.report_observers.iter_mut() {
            let copy = report.clone();
            if panic::catch_unwind(AssertUnwindSafe(|| observer(copy))).is_err() {
                tracing::warn!("Report observer panicked");
            }
        }

        self.report = Some(report);
        self.phase = RefereePhase::Over;
    }

    // ========================================================================
    // LEVEL 3 - STEPS
    // ========================================================================

    /// Remove a misbehaving player from the match
    fn disqualify(&mut self, color: Color, reason: KickReason) {
        if self.state.identity(color).is_ok() {
            if let Err(err) = self.state.remove_player(color) {
                tracing::error!("Could not remove {:?} from the game: {}", color, err);
            }
        }

        let seat = match self.seats.iter_mut().find(|s| s.identity.color == color) {
            Some(seat) if seat.active => seat,
            _ => return,
        };
        seat.active = false;
        let identity = seat.identity.clone();
        let handle = seat.handle.clone();

        match &reason {
            KickReason::Cheating(why) => {
                tracing::warn!("{} ({:?}) cheated: {}", identity.name, color, why);
                self.cheaters.push(identity.clone());
            }
            KickReason::Failing(why) => {
                tracing::warn!("{} ({:?}) failed: {}", identity.name, color, why);
                self.failures.push(identity.clone());
            }
        }

        let timeout = self.config.player_timeout;
        if let Err(failure) = handle.notify(timeout, move |p| p.kick(reason)) {
            tracing::debug!("Kick notice to {} not delivered: {}", identity.name, failure);
        }

        self.broadcast_update();
    }

    /// Deliver a snapshot to every observer and active player
    fn broadcast_update(&mut self) {
        let snapshot = self.state.snapshot();

        for observer in self.update_observers.iter_mut() {
            let copy = snapshot.clone();
            if panic::catch_unwind(AssertUnwindSafe(|| observer(copy))).is_err() {
                tracing::warn!("Game update observer panicked");
            }
        }

        let timeout = self.config.player_timeout;
        for seat in self.seats.iter().filter(|s| s.active) {
            let copy = snapshot.clone();
            if let Err(failure) = seat.handle.notify(timeout, move |p| p.sync(copy)) {
                tracing::debug!("Sync to {} not delivered: {}", seat.identity.name, failure);
            }
        }
    }

    // ========================================================================
    // LEVEL 4 - UTILITIES
    // ========================================================================

    fn handle(&self, color: Color) -> Option<PlayerHandle> {
        self.seats
            .iter()
            .find(|s| s.identity.color == color && s.active)
            .map(|s| s.handle.clone())
    }

    fn request<T, F>(&self, color: Color, timeout: Duration, f: F) -> Result<T, CallFailure>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn Player) -> PlayerResult<T> + Send + 'static,
    {
        match self.handle(color) {
            Some(handle) => handle.call(timeout, f),
            None => {
                tracing::error!("Turn holder {:?} has no active seat", color);
                Err(CallFailure::Responded(PlayerError::Disconnected(format!(
                    "{color:?} has no seat"
                ))))
            }
        }
    }
}

/// Check construction parameters
fn validate_setup(
    rows: usize,
    cols: usize,
    players: usize,
    fish_per_tile: Option<u8>,
) -> Result<(), ConfigError> {
    if rows == 0 || cols == 0 {
        return Err(ConfigError::InvalidParameter(format!(
            "board dimensions must be positive, got {rows}x{cols}"
        )));
    }
    if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&players) {
        return Err(ConfigError::InvalidParameter(format!(
            "a match needs {MIN_PLAYERS}..={MAX_PLAYERS} players, got {players}"
        )));
    }
    if let Some(fish) = fish_per_tile {
        if !(MIN_FISH..=MAX_FISH).contains(&fish) {
            return Err(ConfigError::InvalidParameter(format!(
                "fish per tile must be in {MIN_FISH}..={MAX_FISH}, got {fish}"
            )));
        }
    }
    let needed = players * avatars_per_player(players);
    if rows * cols < needed {
        return Err(ConfigError::InvalidParameter(format!(
            "{rows}x{cols} board cannot hold {needed} avatars"
        )));
    }
    Ok(())
}

/// Turn up to `factor` random tiles into holes, leaving at least `keep` tiles
///
/// Returns how many tiles were removed. Picks that land on a hole are
/// skipped rather than redrawn.
fn carve_holes(board: &mut Board, rng: &mut ChaCha8Rng, factor: usize, keep: usize) -> usize {
    let attempts = factor.min(board.open_tile_count().saturating_sub(keep));
    let mut removed = 0;
    for _ in 0..attempts {
        let pos = Position::new(rng.gen_range(0..board.rows()), rng.gen_range(0..board.cols()));
        if board.remove_tile(pos).is_ok() {
            removed += 1;
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_validate_setup() {
        assert!(validate_setup(4, 4, 2, None).is_ok());
        assert!(validate_setup(0, 4, 2, None).is_err());
        assert!(validate_setup(4, 4, 1, None).is_err());
        assert!(validate_setup(4, 4, 5, None).is_err());
        assert!(validate_setup(4, 4, 2, Some(0)).is_err());
        assert!(validate_setup(4, 4, 2, Some(6)).is_err());
        // Two players place eight avatars
        assert!(validate_setup(2, 3, 2, Some(1)).is_err());
        assert!(validate_setup(2, 4, 2, Some(1)).is_ok());
    }

    #[test]
    fn test_carve_holes_keeps_room() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut board = Board::homogeneous(2, 4, 4).unwrap();
        let removed = carve_holes(&mut board, &mut rng, 100, 8);
        assert!(removed <= 8);
        assert_eq!(board.open_tile_count(), 16 - removed);
        assert!(board.open_tile_count() >= 8);
    }

    #[test]
    fn test_carve_holes_zero_factor() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut board = Board::homogeneous(2, 4, 4).unwrap();
        assert_eq!(carve_holes(&mut board, &mut rng, 0, 8), 0);
        assert_eq!(board.open_tile_count(), 16);
    }
}
