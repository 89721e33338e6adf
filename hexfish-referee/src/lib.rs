//! HEXFISH Referee - Running matches between untrusted players
//!
//! This crate provides match infrastructure:
//! - The player capability and a local search-driven player
//! - Deadline-bounded calls into player code
//! - Cheater and failure detection during placement and play
//! - Observer callbacks and the final report
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: Referee::start (orchestration)
//! - Level 2: placement and turn loops (phases)
//! - Level 3: disqualification, broadcasting (steps)
//! - Level 4: board setup, configuration

mod call;
pub mod config;
pub mod error;
pub mod player;
pub mod referee;
pub mod report;

pub use config::RefereeConfig;
pub use error::{CallFailure, ConfigError, PlayerError, PlayerResult};
pub use player::{KickReason, LocalPlayer, Player, PlayerStatus};
pub use referee::{Participant, Referee, RefereePhase, ReportObserver, UpdateObserver};
pub use report::{GameReport, Standing};
