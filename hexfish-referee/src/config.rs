//! Configuration for running a match

use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Referee configuration
#[derive(Clone, Debug)]
pub struct RefereeConfig {
    /// Wall-clock limit for every call into a player
    pub player_timeout: Duration,
    /// Most fish tiles turned into holes before placement starts
    pub difficulty_factor: usize,
    /// Seed for board setup (None = random)
    pub seed: Option<u64>,
}

impl Default for RefereeConfig {
    fn default() -> Self {
        Self {
            player_timeout: Duration::from_secs(10),
            difficulty_factor: 0,
            seed: None,
        }
    }
}

impl RefereeConfig {
    /// Set the per-call player timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.player_timeout = timeout;
        self
    }

    /// Set how many tiles may be removed at setup
    pub fn with_difficulty(mut self, factor: usize) -> Self {
        self.difficulty_factor = factor;
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub(crate) fn rng(&self) -> ChaCha8Rng {
        match self.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        }
    }
}
