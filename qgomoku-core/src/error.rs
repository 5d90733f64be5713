//! Error types

use crate::board::Team;

/// Failure to parse an action from text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseActionError {
    #[error("empty action")]
    Empty,

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("{action} takes {expected} coordinates, got {got}")]
    WrongArity {
        action: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("invalid coordinate: {0}")]
    InvalidCoordinate(String),

    #[error("coordinate {0} is off the board (0-8)")]
    OffBoard(u8),
}

/// Failure to parse a difficulty level
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown difficulty: {0} (expected easy, medium or hard)")]
pub struct ParseDifficultyError(pub String);

/// Request rejected by the session before reaching the rules engine
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("the game is already over")]
    GameOver,

    #[error("it is {active}'s turn, not {actor}'s")]
    NotYourTurn { active: Team, actor: Team },

    #[error("the AI is playing {0} this turn")]
    AiTurn(Team),

    #[error("AI decision is stale and was discarded")]
    StaleAiTicket,
}
