//! Play command - interactive game on the terminal
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: load_config(), play_loop()
//! - Level 3: handle_line(), run_ai_turn()
//! - Level 4: command parsing, board rendering
//!
//! The AI's thinking delay is a deadline raced against stdin. Typing `reset`
//! while the AI is thinking cancels its pending move; any other input leaves
//! the deadline where it was.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::Instant;

use qgomoku_core::{
    legal_targets, Action, ActionKind, AiResolution, AiTicket, Board, CellState, Difficulty,
    GameMode, GameSession, Outcome, ParseActionError, Pos, SessionConfig, SoundCue, SoundSink,
    Team, BOARD_SIZE,
};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct PlayArgs {
    /// AI difficulty (easy, medium, hard)
    #[arg(long)]
    pub difficulty: Option<Difficulty>,

    /// Two players share the terminal; no AI
    #[arg(long)]
    pub local: bool,

    /// Session configuration JSON file
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Override the AI thinking delay in milliseconds
    #[arg(long)]
    pub think_ms: Option<u64>,
}

/// One line of user input
#[derive(Clone, Debug, PartialEq)]
enum Command {
    Act(Action),
    Hint(ActionKind),
    Pass,
    Reset,
    Board,
    Log,
    Help,
    Quit,
    Nothing,
}

/// Whether the loop keeps going after a command
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// An AI move waiting out its thinking delay
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PendingAi {
    ticket: AiTicket,
    deadline: Instant,
}

impl PendingAi {
    /// Keep the running deadline while `ticket` names the same pending move
    fn track(pending: Option<PendingAi>, ticket: AiTicket, now: Instant) -> PendingAi {
        match pending {
            Some(held) if held.ticket == ticket => held,
            _ => PendingAi {
                ticket,
                deadline: now + ticket.delay,
            },
        }
    }
}

/// Reports sound cues through the log
struct LoggedSounds;

impl SoundSink for LoggedSounds {
    fn play(&mut self, cue: SoundCue) {
        tracing::debug!("sound: {}", cue.file_name());
    }
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run play command
///
/// This function reads like a table of contents:
/// 1. Load and override the session configuration
/// 2. Run the input loop on a tokio runtime
pub fn run(args: PlayArgs, seed: Option<u64>) -> Result<()> {
    let config = load_config(&args)?;

    match config.mode {
        GameMode::Local => tracing::info!("Starting local two-player game"),
        GameMode::VsAi => tracing::info!("Starting game against the {} AI", config.difficulty),
    }

    let runtime = tokio::runtime::Runtime::new()?;

    runtime.block_on(play_loop(config, seed))
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Config file first, then command-line overrides
fn load_config(args: &PlayArgs) -> Result<SessionConfig> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::load(path)
            .with_context(|| format!("Failed to load session config: {}", path.display()))?,
        None => SessionConfig::default(),
    };

    if args.local {
        config = config.with_mode(GameMode::Local);
    }
    if let Some(difficulty) = args.difficulty {
        config = config.with_difficulty(difficulty);
    }
    if let Some(ms) = args.think_ms {
        config = config.with_think_time_ms(ms);
    }

    Ok(config)
}

/// Read commands until quit or end of input
async fn play_loop(config: SessionConfig, seed: Option<u64>) -> Result<()> {
    let mut session = GameSession::new(config).with_sounds(Box::new(LoggedSounds));
    let mut rng = create_rng(seed);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    print_help();
    print_status(&session);

    let mut pending: Option<PendingAi> = None;

    loop {
        pending = match session.request_ai_move() {
            Some(ticket) => {
                let tracked = PendingAi::track(pending, ticket, Instant::now());
                if pending != Some(tracked) {
                    println!("{} is thinking...", session.active_player());
                }
                Some(tracked)
            }
            None => None,
        };

        if let Some(PendingAi { ticket, deadline }) = pending {
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {
                    run_ai_turn(&mut session, ticket, &mut rng);
                    continue;
                }
                line = lines.next_line() => {
                    let line = match line.context("Failed to read input")? {
                        Some(line) => line,
                        None => return Ok(()),
                    };
                    if handle_line(&mut session, &line, &mut rng) == Flow::Quit {
                        return Ok(());
                    }
                    continue;
                }
            }
        }

        let line = match lines.next_line().await.context("Failed to read input")? {
            Some(line) => line,
            None => return Ok(()),
        };
        if handle_line(&mut session, &line, &mut rng) == Flow::Quit {
            return Ok(());
        }
    }
}

// ============================================================================
// LEVEL 3 - STEPS
// ============================================================================

/// Apply one line of input to the session
fn handle_line(session: &mut GameSession, line: &str, rng: &mut ChaCha8Rng) -> Flow {
    let command = match parse_command(line) {
        Ok(command) => command,
        Err(e) => {
            println!("{} (type 'help' for commands)", e);
            return Flow::Continue;
        }
    };

    match command {
        Command::Nothing => {}
        Command::Quit => return Flow::Quit,
        Command::Help => print_help(),
        Command::Board => print_status(session),
        Command::Hint(kind) => {
            let player = human_team(session);
            let targets = legal_targets(session.board(), kind, player, session.turn());
            println!("{}", format_targets(kind, &targets));
        }
        Command::Log => {
            for entry in session.log() {
                println!("  {}", entry);
            }
        }
        Command::Reset => {
            session.reset();
            println!("New game.");
            print_status(session);
        }
        Command::Pass => {
            if session.is_ai_turn() {
                println!("Wait for the AI to move.");
            } else if let Err(e) = session.pass_turn() {
                println!("{}", e);
            } else {
                print_status(session);
            }
        }
        Command::Act(action) => {
            let actor = human_team(session);
            match session.submit(action, actor, rng) {
                Ok(outcome) => {
                    println!("{}", outcome.message);
                    if outcome.success {
                        print_status(session);
                    }
                }
                Err(e) => println!("{}", e),
            }
        }
    }

    Flow::Continue
}

/// Resolve the AI's pending move and show the result
fn run_ai_turn(session: &mut GameSession, ticket: AiTicket, rng: &mut ChaCha8Rng) {
    match session.resolve_ai_move(ticket, rng) {
        Ok(AiResolution::Played { choice, outcome }) => {
            println!("AI plays {}: {}", choice.action, outcome.message);
        }
        Ok(AiResolution::Passed) => println!("AI has no legal action and passes."),
        Err(e) => {
            tracing::debug!("{}", e);
            return;
        }
    }
    print_status(session);
}

// ============================================================================
// LEVEL 4 - UTILITIES
// ============================================================================

/// Create RNG from seed or random
fn create_rng(seed: Option<u64>) -> ChaCha8Rng {
    match seed {
        Some(s) => ChaCha8Rng::seed_from_u64(s),
        None => ChaCha8Rng::from_entropy(),
    }
}

/// Side the terminal user is playing right now
fn human_team(session: &GameSession) -> Team {
    match session.config().mode {
        GameMode::Local => session.active_player(),
        GameMode::VsAi => Team::Wave,
    }
}

fn parse_command(line: &str) -> Result<Command, ParseActionError> {
    let trimmed = line.trim();
    let command = match trimmed.to_ascii_lowercase().as_str() {
        "" => Command::Nothing,
        "quit" | "exit" | "q" => Command::Quit,
        "help" | "?" | "h" => Command::Help,
        "board" => Command::Board,
        "log" => Command::Log,
        "reset" | "new" => Command::Reset,
        "pass" => Command::Pass,
        _ => match trimmed.split_once(char::is_whitespace) {
            Some((head, kind)) if head.eq_ignore_ascii_case("hint") => {
                Command::Hint(kind.trim().parse()?)
            }
            _ => Command::Act(trimmed.parse()?),
        },
    };
    Ok(command)
}

/// One-line summary of where `kind` can be played
fn format_targets(kind: ActionKind, targets: &[Pos]) -> String {
    if targets.is_empty() {
        return format!("No legal targets for {}.", kind);
    }
    let cells: Vec<String> = targets.iter().map(Pos::to_string).collect();
    format!("{} target(s) for {}: {}", targets.len(), kind, cells.join(" "))
}

/// Grid with row and column indices.
///
/// Each cell is its state letter plus a marker: `~` entangled, `*` pending
/// interference, `#` part of the winning line.
fn render_board(board: &Board) -> String {
    let mut out = String::from("   ");
    for y in 0..BOARD_SIZE {
        out.push_str(&format!(" {} ", y));
    }
    out.push('\n');

    for x in 0..BOARD_SIZE {
        out.push_str(&format!(" {} ", x));
        for y in 0..BOARD_SIZE {
            let cell = board.cell(Pos::new(x as u8, y as u8));
            let symbol = match cell.state {
                CellState::Wave => 'W',
                CellState::Particle => 'P',
                CellState::Superposition => '.',
            };
            let marker = if cell.is_winning_cell {
                '#'
            } else if cell.is_entangled() {
                '~'
            } else if cell.is_interfered() {
                '*'
            } else {
                ' '
            };
            out.push(' ');
            out.push(symbol);
            out.push(marker);
        }
        out.push('\n');
    }

    out
}

fn print_status(session: &GameSession) {
    println!();
    print!("{}", render_board(session.board()));
    match session.winner() {
        Some(Outcome::Win(team)) => println!("{} wins! Type 'reset' to play again.", team),
        Some(Outcome::Draw) => println!("Draw. Type 'reset' to play again."),
        None => println!("Turn {}: {} to move", session.turn(), session.active_player()),
    }
}

fn print_help() {
    println!("Quantum Gomoku: get five confirmed cells of your color in a row.");
    println!("Actions (coordinates are row then column, 0-8):");
    for kind in ActionKind::ALL {
        let usage = if kind.is_paired() { "x y x2 y2" } else { "x y" };
        println!("  {} {}", kind.name(), usage);
    }
    println!("Other commands: hint <action>, pass, board, log, reset, help, quit");
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("  "), Ok(Command::Nothing));
        assert_eq!(parse_command("RESET"), Ok(Command::Reset));
        assert_eq!(parse_command("q"), Ok(Command::Quit));
        assert_eq!(
            parse_command("measure 4 4"),
            Ok(Command::Act(Action::Measure(Pos::new(4, 4))))
        );
        assert!(parse_command("teleport 1 1").is_err());
    }

    #[test]
    fn test_parse_hint() {
        assert_eq!(
            parse_command("hint measure"),
            Ok(Command::Hint(ActionKind::Measure))
        );
        assert_eq!(
            parse_command("HINT  leap"),
            Ok(Command::Hint(ActionKind::QuantumLeap))
        );
        assert!(parse_command("hint teleport").is_err());
    }

    #[test]
    fn test_format_targets() {
        let targets = [Pos::new(0, 0), Pos::new(3, 4)];
        assert_eq!(
            format_targets(ActionKind::QuantumLeap, &targets),
            "2 target(s) for quantum-leap: (0,0) (3,4)"
        );
        assert_eq!(
            format_targets(ActionKind::BreakEntanglement, &[]),
            "No legal targets for break-entanglement."
        );
    }

    #[test]
    fn test_hint_leaves_session_untouched() {
        let mut session = GameSession::new(SessionConfig::local());
        let mut rng = create_rng(Some(3));
        handle_line(&mut session, "measure 4 4", &mut rng);
        let board = *session.board();

        assert_eq!(handle_line(&mut session, "hint entangle", &mut rng), Flow::Continue);
        assert_eq!(*session.board(), board);
        assert_eq!(session.turn(), 2);
    }

    #[test]
    fn test_pending_ai_deadline_survives_other_input() {
        let config = SessionConfig::vs_ai(Difficulty::Easy).with_think_time_ms(1000);
        let mut session = GameSession::new(config);
        let mut rng = create_rng(Some(4));
        handle_line(&mut session, "measure 4 4", &mut rng);

        let start = Instant::now();
        let ticket = session.request_ai_move().expect("AI is due");
        let first = PendingAi::track(None, ticket, start);
        assert_eq!(first.deadline, start + ticket.delay);

        // Viewing the board or trying to move out of turn keeps the clock running
        handle_line(&mut session, "board", &mut rng);
        handle_line(&mut session, "measure 0 0", &mut rng);
        let later = start + std::time::Duration::from_millis(500);
        let ticket = session.request_ai_move().expect("still due");
        assert_eq!(PendingAi::track(Some(first), ticket, later), first);

        // Reset hands the turn back to the human, so nothing is pending
        handle_line(&mut session, "reset", &mut rng);
        assert!(session.request_ai_move().is_none());

        // The next AI turn starts a fresh deadline
        handle_line(&mut session, "measure 4 4", &mut rng);
        let ticket = session.request_ai_move().expect("AI is due again");
        let renewed = PendingAi::track(Some(first), ticket, later);
        assert_ne!(renewed, first);
        assert_eq!(renewed.deadline, later + ticket.delay);
    }

    #[test]
    fn test_load_config_overrides() {
        let args = PlayArgs {
            difficulty: Some(Difficulty::Hard),
            local: true,
            config: None,
            think_ms: Some(0),
        };
        let config = load_config(&args).unwrap();
        assert_eq!(config.mode, GameMode::Local);
        assert_eq!(config.difficulty, Difficulty::Hard);
        assert_eq!(config.think_time_ms, Some(0));
    }

    #[test]
    fn test_load_config_missing_file() {
        let args = PlayArgs {
            difficulty: None,
            local: false,
            config: Some(PathBuf::from("/nonexistent/session.json")),
            think_ms: None,
        };
        assert!(load_config(&args).is_err());
    }

    #[test]
    fn test_render_board_markers() {
        let mut board = Board::from_rows(&["WP"]);
        board.cell_mut(Pos::new(2, 2)).interference = Some(Team::Wave);
        let text = render_board(&board);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), BOARD_SIZE + 1);
        assert!(lines[1].starts_with(" 0  W  P  . "));
        assert!(lines[3].contains(".*"));
    }

    #[test]
    fn test_handle_line_in_local_game() {
        let mut session = GameSession::new(SessionConfig::local());
        let mut rng = create_rng(Some(1));

        assert_eq!(handle_line(&mut session, "measure 0 0", &mut rng), Flow::Continue);
        assert_eq!(session.turn(), 2);
        assert_eq!(session.active_player(), Team::Particle);

        assert_eq!(handle_line(&mut session, "pass", &mut rng), Flow::Continue);
        assert_eq!(session.turn(), 3);

        handle_line(&mut session, "reset", &mut rng);
        assert_eq!(session.turn(), 1);
        assert_eq!(handle_line(&mut session, "quit", &mut rng), Flow::Quit);
    }

    #[test]
    fn test_human_cannot_pass_for_ai() {
        let mut session = GameSession::new(SessionConfig::vs_ai(Difficulty::Easy));
        let mut rng = create_rng(Some(1));
        handle_line(&mut session, "measure 4 4", &mut rng);
        assert!(session.is_ai_turn());
        handle_line(&mut session, "pass", &mut rng);
        assert_eq!(session.turn(), 2);
    }
}
