//! Quantum Gomoku Core - Rules engine and AI
//!
//! This crate provides the core game logic for Quantum Gomoku:
//! - 9x9 board of quantum cells (superposition, wave, particle)
//! - Action resolver for measure, interfere, entangle, quantum leap and break
//! - Five-in-a-row win detection
//! - Line evaluation and a greedy one-ply AI
//! - Game session with turn gating and cancelable AI scheduling

pub mod board;
pub mod win;
pub mod actions;
pub mod eval;
pub mod ai;
pub mod config;
pub mod error;
pub mod session;

// Re-exports for convenient access
pub use board::{
    create_initial_board, Board, Cell, CellState, Pos, Team, BOARD_SIZE, WIN_LENGTH,
};
pub use win::{check_win, count_consecutive_cells, max_line_count, Outcome, WinResult};
pub use actions::{
    execute_action, is_legal_target, legal_targets, Action, ActionKind, ActionOutcome, SoundCue,
};
pub use eval::{evaluate_line, evaluate_position};
pub use ai::{select_action_for, select_ai_action, AiAction, AiPlayer, Difficulty, AI_TEAM};
pub use config::{GameMode, SessionConfig};
pub use error::{ParseActionError, ParseDifficultyError, SessionError};
pub use session::{AiResolution, AiTicket, GameSession, Silent, SoundSink};
