//! Match play - multiple games between two AI players
//!
//! Level 2 - Phase-level implementation

use qgomoku_core::{Outcome, Team};
use rayon::prelude::*;
use serde::Serialize;
use tracing::info;

use crate::config::MatchConfig;
use crate::game_runner::{play_game, GameRecord};

/// Result of a match (multiple games)
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatchResult {
    /// Wins for the Wave player
    pub wave_wins: u32,
    /// Wins for the Particle player
    pub particle_wins: u32,
    /// Games ending with a full board and no five
    pub draws: u32,
    /// Games cut off by the turn limit
    pub unfinished: u32,
    /// Average game length in turns
    pub avg_turns: f32,
    /// Total games played
    pub games_played: u32,
    /// Individual game records
    pub games: Vec<GameRecord>,
}

impl MatchResult {
    /// Create empty result
    pub fn empty() -> Self {
        Self {
            wave_wins: 0,
            particle_wins: 0,
            draws: 0,
            unfinished: 0,
            avg_turns: 0.0,
            games_played: 0,
            games: Vec::new(),
        }
    }

    /// Wins for a side
    pub fn wins(&self, team: Team) -> u32 {
        match team {
            Team::Wave => self.wave_wins,
            Team::Particle => self.particle_wins,
        }
    }

    /// Win rate for a side
    pub fn win_rate(&self, team: Team) -> f32 {
        if self.games_played == 0 {
            0.0
        } else {
            self.wins(team) as f32 / self.games_played as f32
        }
    }

    /// Draw rate (unfinished games not included)
    pub fn draw_rate(&self) -> f32 {
        if self.games_played == 0 {
            0.0
        } else {
            self.draws as f32 / self.games_played as f32
        }
    }
}

/// Play a full match (Level 1 orchestration)
pub fn play_match(config: &MatchConfig) -> MatchResult {
    if config.games == 0 {
        return MatchResult::empty();
    }

    info!(
        "Playing {} games: Wave ({}) vs Particle ({})",
        config.games, config.wave, config.particle
    );

    let records = execute_games(config);
    aggregate_results(records)
}

// ============================================================================
// Level 2 - Phases
// ============================================================================

/// Execute all games, in parallel when configured
fn execute_games(config: &MatchConfig) -> Vec<GameRecord> {
    if config.parallel {
        (0..config.games)
            .into_par_iter()
            .map(|index| play_game(config, config.game_seed(index)))
            .collect()
    } else {
        (0..config.games)
            .map(|index| play_game(config, config.game_seed(index)))
            .collect()
    }
}

// ============================================================================
// Level 3 - Steps
// ============================================================================

/// Aggregate game records into a match result
fn aggregate_results(records: Vec<GameRecord>) -> MatchResult {
    let mut result = MatchResult::empty();
    let mut total_turns = 0u32;

    for record in &records {
        total_turns += record.turns;
        match record.outcome {
            Some(Outcome::Win(Team::Wave)) => result.wave_wins += 1,
            Some(Outcome::Win(Team::Particle)) => result.particle_wins += 1,
            Some(Outcome::Draw) => result.draws += 1,
            None => result.unfinished += 1,
        }
    }

    result.games_played = records.len() as u32;
    result.avg_turns = if result.games_played > 0 {
        total_turns as f32 / result.games_played as f32
    } else {
        0.0
    };
    result.games = records;
    result
}
