//! Quantum Gomoku Self-Play - AI versus AI matches
//!
//! This crate runs complete games between two computer players and
//! aggregates the results:
//! - Single game runner driving a `GameSession`
//! - Match play, sequential or parallel with rayon
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: play_match (orchestration)
//! - Level 2: execute_games (phase)
//! - Level 3: play_game (step)
//! - Level 4: configuration

mod config;
mod game_runner;
mod match_play;

pub use config::MatchConfig;
pub use game_runner::{play_game, GameRecord};
pub use match_play::{play_match, MatchResult};
