//! Game session controller
//!
//! Owns the live board, turn counter, active player and winner. Every change
//! to the board goes through `execute_action`; the session only decides
//! whether a request is allowed and what happens after it resolves.
//!
//! The AI's thinking delay is handled by the caller. `request_ai_move` hands
//! out a ticket stamped with the session epoch; any reset or turn change bumps
//! the epoch, and a ticket presented after that is discarded untouched.

use crate::actions::{execute_action, Action, ActionOutcome, SoundCue};
use crate::ai::{select_action_for, AiAction, Difficulty};
use crate::board::{create_initial_board, Board, Team};
use crate::config::SessionConfig;
use crate::error::SessionError;
use crate::win::{check_win, Outcome};
use rand::Rng;
use std::collections::VecDeque;
use std::time::Duration;
use tracing::{debug, info, warn};

// ============================================================================
// SOUND
// ============================================================================

/// Receives sound cues; playback failures are the sink's problem
pub trait SoundSink {
    fn play(&mut self, cue: SoundCue);
}

/// Sink that ignores every cue
#[derive(Clone, Copy, Debug, Default)]
pub struct Silent;

impl SoundSink for Silent {
    fn play(&mut self, _cue: SoundCue) {}
}

// ============================================================================
// AI SCHEDULING
// ============================================================================

/// Permission to resolve one pending AI move
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AiTicket {
    epoch: u64,
    /// Turn the ticket was issued on
    pub turn: u32,
    /// How long to wait before resolving
    pub delay: Duration,
}

/// What an AI turn did
#[derive(Clone, Debug, PartialEq)]
pub enum AiResolution {
    Played {
        choice: AiAction,
        outcome: ActionOutcome,
    },
    /// No legal action; the turn was passed
    Passed,
}

// ============================================================================
// SESSION
// ============================================================================

pub struct GameSession {
    config: SessionConfig,
    board: Board,
    turn: u32,
    active_player: Team,
    winner: Option<Outcome>,
    /// Bumped on reset, turn change and game end
    epoch: u64,
    log: VecDeque<String>,
    sounds: Box<dyn SoundSink + Send>,
}

impl GameSession {
    pub fn new(config: SessionConfig) -> Self {
        let mut session = Self {
            config,
            board: create_initial_board(),
            turn: 1,
            active_player: Team::Wave,
            winner: None,
            epoch: 0,
            log: VecDeque::new(),
            sounds: Box::new(Silent),
        };
        session.reset();
        session
    }

    pub fn with_sounds(mut self, sounds: Box<dyn SoundSink + Send>) -> Self {
        self.sounds = sounds;
        self
    }

    /// Fresh board, Wave to move, pending AI tickets invalidated
    pub fn reset(&mut self) {
        self.board = create_initial_board();
        self.turn = 1;
        self.active_player = Team::Wave;
        self.winner = None;
        self.epoch += 1;
        self.log.clear();
        self.record("Game started. Wave moves first.".to_string());
        debug!("session reset (epoch {})", self.epoch);
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn active_player(&self) -> Team {
        self.active_player
    }

    pub fn winner(&self) -> Option<Outcome> {
        self.winner
    }

    pub fn is_over(&self) -> bool {
        self.winner.is_some()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Log entries, oldest first
    pub fn log(&self) -> impl Iterator<Item = &str> + '_ {
        self.log.iter().map(String::as_str)
    }

    /// True when the computer is due to move
    pub fn is_ai_turn(&self) -> bool {
        self.config.ai_team() == Some(self.active_player)
    }

    /// Resolve a human request
    pub fn submit<R: Rng + ?Sized>(
        &mut self,
        action: Action,
        actor: Team,
        rng: &mut R,
    ) -> Result<ActionOutcome, SessionError> {
        if self.winner.is_some() {
            return Err(SessionError::GameOver);
        }
        if self.is_ai_turn() {
            return Err(SessionError::AiTurn(self.active_player));
        }
        if actor != self.active_player {
            return Err(SessionError::NotYourTurn {
                active: self.active_player,
                actor,
            });
        }

        Ok(self.commit(action, actor, rng))
    }

    /// Skip the active player's turn
    pub fn pass_turn(&mut self) -> Result<(), SessionError> {
        if self.winner.is_some() {
            return Err(SessionError::GameOver);
        }
        self.record(format!("{} has no legal action and passes", self.active_player));
        self.advance_turn();
        Ok(())
    }

    /// Ticket for the pending AI move, if the AI is due to play
    pub fn request_ai_move(&self) -> Option<AiTicket> {
        if self.winner.is_some() || !self.is_ai_turn() {
            return None;
        }
        Some(AiTicket {
            epoch: self.epoch,
            turn: self.turn,
            delay: self.config.think_time(),
        })
    }

    /// Play the AI move a ticket was issued for
    pub fn resolve_ai_move<R: Rng + ?Sized>(
        &mut self,
        ticket: AiTicket,
        rng: &mut R,
    ) -> Result<AiResolution, SessionError> {
        if ticket.epoch != self.epoch || ticket.turn != self.turn || self.winner.is_some() {
            debug!(
                "discarding stale AI ticket for turn {} (now turn {})",
                ticket.turn, self.turn
            );
            return Err(SessionError::StaleAiTicket);
        }

        self.play_ai_turn(self.config.difficulty, rng)
    }

    /// Let the AI choose and play for whoever is active, bypassing tickets
    pub fn play_ai_turn<R: Rng + ?Sized>(
        &mut self,
        difficulty: Difficulty,
        rng: &mut R,
    ) -> Result<AiResolution, SessionError> {
        if self.winner.is_some() {
            return Err(SessionError::GameOver);
        }

        let team = self.active_player;
        let choice = match select_action_for(&self.board, self.turn, difficulty, team, rng) {
            Some(choice) => choice,
            None => {
                debug!("{} AI found no legal action on turn {}", team, self.turn);
                self.pass_turn()?;
                return Ok(AiResolution::Passed);
            }
        };

        debug!(
            "{} AI picks {} (score {:.1}, {})",
            team, choice.action, choice.score, choice.strategy
        );

        let outcome = self.commit(choice.action, team, rng);
        if !outcome.success {
            warn!("{} AI chose an illegal action: {}", team, outcome.message);
            self.pass_turn()?;
        }

        Ok(AiResolution::Played { choice, outcome })
    }

    /// Resolve an action and apply the consequences
    fn commit<R: Rng + ?Sized>(
        &mut self,
        action: Action,
        actor: Team,
        rng: &mut R,
    ) -> ActionOutcome {
        let mut outcome = execute_action(&self.board, action, actor, self.turn, rng);

        if !outcome.success {
            self.record(format!("{} {}: {}", actor, action, outcome.message));
            return outcome;
        }

        self.board = outcome.board;
        if let Some(cue) = outcome.sound {
            self.sounds.play(cue);
        }
        self.record(format!("Turn {}: {} {}", self.turn, actor, outcome.message));

        if let Some(win) = check_win(&self.board) {
            for pos in win.winning_cells {
                self.board.cell_mut(pos).is_winning_cell = true;
            }
            self.sounds.play(SoundCue::Win);
            self.finish(Outcome::Win(win.winning_team));
        } else if self.board.superposition_count() == 0 {
            self.finish(Outcome::Draw);
        } else {
            self.advance_turn();
        }

        outcome.board = self.board;
        outcome
    }

    fn finish(&mut self, result: Outcome) {
        self.winner = Some(result);
        self.epoch += 1;
        let message = match result {
            Outcome::Win(team) => format!("{} wins on turn {}!", team, self.turn),
            Outcome::Draw => format!("Draw on turn {}: no superposition cells remain", self.turn),
        };
        info!("{}", message);
        self.record(message);
    }

    fn advance_turn(&mut self) {
        self.turn += 1;
        self.active_player = self.active_player.opponent();
        self.epoch += 1;
        debug!("turn {}: {} to move", self.turn, self.active_player);
    }

    fn record(&mut self, entry: String) {
        self.log.push_back(entry);
        while self.log.len() > self.config.log_capacity {
            self.log.pop_front();
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{CellState, Pos};
    use rand::rngs::mock::StepRng;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::sync::{Arc, Mutex};

    fn lucky() -> StepRng {
        StepRng::new(0, 0)
    }

    /// Records cues into a shared list
    struct Recorder(Arc<Mutex<Vec<SoundCue>>>);

    impl SoundSink for Recorder {
        fn play(&mut self, cue: SoundCue) {
            self.0.lock().unwrap().push(cue);
        }
    }

    fn measure(x: u8, y: u8) -> Action {
        Action::Measure(Pos::new(x, y))
    }

    #[test]
    fn test_new_session() {
        let session = GameSession::new(SessionConfig::local());
        assert_eq!(session.turn(), 1);
        assert_eq!(session.active_player(), Team::Wave);
        assert_eq!(session.winner(), None);
        assert_eq!(session.log().count(), 1);
    }

    #[test]
    fn test_turn_gating() {
        let mut session = GameSession::new(SessionConfig::local());
        let err = session.submit(measure(0, 0), Team::Particle, &mut lucky()).unwrap_err();
        assert_eq!(
            err,
            SessionError::NotYourTurn {
                active: Team::Wave,
                actor: Team::Particle
            }
        );

        let outcome = session.submit(measure(0, 0), Team::Wave, &mut lucky()).unwrap();
        assert!(outcome.success);
        assert_eq!(session.turn(), 2);
        assert_eq!(session.active_player(), Team::Particle);
        assert_eq!(session.board().state(Pos::new(0, 0)), CellState::Wave);
    }

    #[test]
    fn test_failed_action_keeps_turn() {
        let mut session = GameSession::new(SessionConfig::local());
        session.submit(measure(0, 0), Team::Wave, &mut lucky()).unwrap();
        let outcome = session.submit(measure(0, 0), Team::Particle, &mut lucky()).unwrap();
        assert!(!outcome.success);
        assert_eq!(session.turn(), 2);
        assert_eq!(session.active_player(), Team::Particle);
    }

    #[test]
    fn test_human_cannot_move_for_ai() {
        let mut session = GameSession::new(SessionConfig::vs_ai(Difficulty::Hard));
        session.submit(measure(4, 4), Team::Wave, &mut lucky()).unwrap();
        let err = session.submit(measure(0, 0), Team::Particle, &mut lucky()).unwrap_err();
        assert_eq!(err, SessionError::AiTurn(Team::Particle));
    }

    #[test]
    fn test_win_flags_cells_and_ends_game() {
        let cues = Arc::new(Mutex::new(Vec::new()));
        let mut session =
            GameSession::new(SessionConfig::local()).with_sounds(Box::new(Recorder(cues.clone())));

        // Wave measures row 0, Particle measures row 8; the lucky rng lands on the mover's color
        for y in 0..5 {
            session.submit(measure(0, y), Team::Wave, &mut lucky()).unwrap();
            if y < 4 {
                session.submit(measure(8, y), Team::Particle, &mut lucky()).unwrap();
            }
        }

        assert_eq!(session.winner(), Some(Outcome::Win(Team::Wave)));
        assert!(session.is_over());
        for y in 0..5 {
            assert!(session.board().cell(Pos::new(0, y)).is_winning_cell);
        }
        assert!(!session.board().cell(Pos::new(8, 0)).is_winning_cell);
        assert_eq!(cues.lock().unwrap().last(), Some(&SoundCue::Win));

        let err = session.submit(measure(4, 4), Team::Particle, &mut lucky()).unwrap_err();
        assert_eq!(err, SessionError::GameOver);
        assert_eq!(session.pass_turn(), Err(SessionError::GameOver));
    }

    #[test]
    fn test_draw_when_board_fills() {
        let mut session = GameSession::new(SessionConfig::local());
        // Runs of two along rows and both diagonals, alternating down columns
        let mut board = Board::new();
        for pos in Board::positions() {
            let state = if (pos.y + 2 * pos.x) % 4 < 2 {
                CellState::Wave
            } else {
                CellState::Particle
            };
            board.set_state(pos, state);
        }
        board.set_state(Pos::new(8, 8), CellState::Superposition);
        assert!(check_win(&board).is_none());
        session.board = board;

        let outcome = session.submit(measure(8, 8), Team::Wave, &mut lucky()).unwrap();
        assert!(outcome.success);
        assert_eq!(session.winner(), Some(Outcome::Draw));
        assert_eq!(session.request_ai_move(), None);
    }

    #[test]
    fn test_ai_ticket_lifecycle() {
        let mut session = GameSession::new(SessionConfig::vs_ai(Difficulty::Easy));
        assert_eq!(session.request_ai_move(), None);

        session.submit(measure(4, 4), Team::Wave, &mut lucky()).unwrap();
        let ticket = session.request_ai_move().expect("AI is due");
        assert_eq!(ticket.turn, 2);
        assert_eq!(ticket.delay, Duration::from_secs(1));

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let resolution = session.resolve_ai_move(ticket, &mut rng).unwrap();
        assert!(matches!(resolution, AiResolution::Played { .. }));
        assert_eq!(session.active_player(), Team::Wave);

        // A second use of the same ticket is stale
        assert_eq!(
            session.resolve_ai_move(ticket, &mut rng),
            Err(SessionError::StaleAiTicket)
        );
    }

    #[test]
    fn test_reset_discards_pending_ai_move() {
        let mut session = GameSession::new(SessionConfig::vs_ai(Difficulty::Medium));
        session.submit(measure(4, 4), Team::Wave, &mut lucky()).unwrap();
        let ticket = session.request_ai_move().expect("AI is due");

        session.reset();
        let before = *session.board();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(
            session.resolve_ai_move(ticket, &mut rng),
            Err(SessionError::StaleAiTicket)
        );
        assert_eq!(*session.board(), before);
        assert_eq!(session.turn(), 1);
    }

    #[test]
    fn test_pass_turn_advances() {
        let mut session = GameSession::new(SessionConfig::local());
        session.pass_turn().unwrap();
        assert_eq!(session.turn(), 2);
        assert_eq!(session.active_player(), Team::Particle);
    }

    #[test]
    fn test_log_is_capped() {
        let mut session = GameSession::new(SessionConfig::local().with_log_capacity(3));
        for _ in 0..10 {
            session.pass_turn().unwrap();
        }
        assert_eq!(session.log().count(), 3);
        assert!(session.log().all(|entry| entry.contains("passes")));
    }

    #[test]
    fn test_play_ai_turn_for_either_side() {
        let mut session = GameSession::new(SessionConfig::local());
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for _ in 0..6 {
            session.play_ai_turn(Difficulty::Hard, &mut rng).unwrap();
        }
        assert_eq!(session.turn(), 7);
        assert!(session.board().links_are_consistent());
    }
}
