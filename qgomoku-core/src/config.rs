//! Session configuration

use crate::ai::Difficulty;
use crate::board::Team;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default number of log entries kept by a session
pub const DEFAULT_LOG_CAPACITY: usize = 30;

/// Who plays the Particle side
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Two humans share the board
    Local,
    /// Particle is played by the computer
    #[default]
    VsAi,
}

/// Configuration for one game session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub mode: GameMode,
    /// AI strength in vs-AI mode
    pub difficulty: Difficulty,
    /// Maximum log entries retained, oldest dropped first
    pub log_capacity: usize,
    /// Overrides the difficulty's thinking delay
    pub think_time_ms: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            mode: GameMode::VsAi,
            difficulty: Difficulty::Medium,
            log_capacity: DEFAULT_LOG_CAPACITY,
            think_time_ms: None,
        }
    }
}

impl SessionConfig {
    /// Two-player local game
    pub fn local() -> Self {
        Self {
            mode: GameMode::Local,
            ..Default::default()
        }
    }

    /// Game against the computer at the given difficulty
    pub fn vs_ai(difficulty: Difficulty) -> Self {
        Self {
            mode: GameMode::VsAi,
            difficulty,
            ..Default::default()
        }
    }

    /// Load from a JSON file; missing fields take their defaults
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))
    }

    pub fn with_mode(mut self, mode: GameMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn with_log_capacity(mut self, capacity: usize) -> Self {
        self.log_capacity = capacity;
        self
    }

    pub fn with_think_time_ms(mut self, millis: u64) -> Self {
        self.think_time_ms = Some(millis);
        self
    }

    /// Side the computer plays, if any
    pub fn ai_team(&self) -> Option<Team> {
        match self.mode {
            GameMode::Local => None,
            GameMode::VsAi => Some(crate::ai::AI_TEAM),
        }
    }

    /// Delay before the AI commits a move
    pub fn think_time(&self) -> Duration {
        match self.think_time_ms {
            Some(ms) => Duration::from_millis(ms),
            None => self.difficulty.thinking_time(),
        }
    }
}
