//! Game runner - executes single games
//!
//! Level 3 - Step-level implementation

use qgomoku_core::{Action, AiPlayer, GameSession, Outcome, SessionConfig, Team};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::debug;

use crate::config::MatchConfig;

/// Record of a single game
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GameRecord {
    /// Final result (None when the turn limit was reached)
    pub outcome: Option<Outcome>,
    /// Turns played
    pub turns: u32,
    /// Passes forced by having no legal action
    pub passes: u32,
    /// Successful actions in order
    pub actions: Vec<Action>,
}

impl GameRecord {
    /// Get winner (None for draw or unfinished)
    pub fn winner(&self) -> Option<Team> {
        match self.outcome {
            Some(Outcome::Win(team)) => Some(team),
            _ => None,
        }
    }

    pub fn is_draw(&self) -> bool {
        self.outcome == Some(Outcome::Draw)
    }

    pub fn is_unfinished(&self) -> bool {
        self.outcome.is_none()
    }
}

/// Play one game between two AI players
pub fn play_game(config: &MatchConfig, seed: u64) -> GameRecord {
    let mut session = GameSession::new(SessionConfig::local());
    let (mut wave, mut particle, mut dice) = create_players(config, seed);

    let mut passes = 0;
    let mut actions = Vec::new();

    while !session.is_over() && session.turn() <= config.max_turns {
        let team = session.active_player();
        let player = match team {
            Team::Wave => &mut wave,
            Team::Particle => &mut particle,
        };

        let choice = match player.choose(session.board(), session.turn()) {
            Some(choice) => choice,
            None => {
                passes += 1;
                if session.pass_turn().is_err() {
                    break;
                }
                continue;
            }
        };

        match session.submit(choice.action, team, &mut dice) {
            Ok(outcome) if outcome.success => actions.push(choice.action),
            Ok(outcome) => {
                debug!("{} picked an illegal action: {}", team, outcome.message);
                passes += 1;
                if session.pass_turn().is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    }

    GameRecord {
        outcome: session.winner(),
        turns: session.turn(),
        passes,
        actions,
    }
}

/// Wave AI, Particle AI and the action dice, all derived from one seed
fn create_players(config: &MatchConfig, seed: u64) -> (AiPlayer, AiPlayer, ChaCha8Rng) {
    let wave = AiPlayer::with_seed(config.wave, Team::Wave, seed);
    let particle = AiPlayer::with_seed(config.particle, Team::Particle, seed.wrapping_add(1));
    let dice = ChaCha8Rng::seed_from_u64(seed.wrapping_add(2));
    (wave, particle, dice)
}
