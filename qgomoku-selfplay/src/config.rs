//! Configuration types for self-play
//!
//! Level 4 - Utilities and configuration

use qgomoku_core::{Difficulty, Team};
use serde::{Deserialize, Serialize};

/// Match configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Number of games to play
    pub games: usize,
    /// Difficulty of the Wave player
    pub wave: Difficulty,
    /// Difficulty of the Particle player
    pub particle: Difficulty,
    /// Games still running after this turn count as unfinished
    pub max_turns: u32,
    /// Base random seed (None = 42)
    pub seed: Option<u64>,
    /// Whether to run games in parallel
    pub parallel: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            games: 10,
            wave: Difficulty::Medium,
            particle: Difficulty::Medium,
            max_turns: 200,
            seed: None,
            parallel: true,
        }
    }
}

impl MatchConfig {
    /// Create config with specified number of games
    pub fn new(games: usize) -> Self {
        Self {
            games,
            ..Default::default()
        }
    }

    /// Set both players' difficulties
    pub fn with_difficulties(mut self, wave: Difficulty, particle: Difficulty) -> Self {
        self.wave = wave;
        self.particle = particle;
        self
    }

    /// Set random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Difficulty for a side
    pub fn difficulty_for(&self, team: Team) -> Difficulty {
        match team {
            Team::Wave => self.wave,
            Team::Particle => self.particle,
        }
    }

    /// Seed of the game at `index`
    pub fn game_seed(&self, index: usize) -> u64 {
        self.seed.unwrap_or(42).wrapping_add(index as u64)
    }
}
