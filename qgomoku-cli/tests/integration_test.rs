//! Integration tests for Quantum Gomoku
//!
//! Tests the full stack: rules engine, AI, game session and self-play

use qgomoku_core::{
    check_win, create_initial_board, execute_action, select_ai_action, Action, AiPlayer,
    AiResolution, Board, CellState, Difficulty, GameSession, Outcome, Pos, SessionConfig,
    SessionError, Team,
};
use qgomoku_selfplay::{play_match, MatchConfig};
use rand::rngs::mock::StepRng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::time::Instant;

// ============================================================================
// TEST FIXTURES
// ============================================================================

/// Every probabilistic roll succeeds
fn lucky() -> StepRng {
    StepRng::new(0, 0)
}

/// Every probabilistic roll fails
fn unlucky() -> StepRng {
    StepRng::new(u64::MAX, 0)
}

fn pos(x: u8, y: u8) -> Pos {
    Pos::new(x, y)
}

// ============================================================================
// RULES ENGINE SCENARIOS
// ============================================================================

#[test]
fn test_measure_on_fresh_board() {
    let board = create_initial_board();

    let measure = Action::Measure(pos(4, 4));

    let outcome = execute_action(&board, measure, Team::Wave, 1, &mut lucky());
    assert!(outcome.success);
    assert_eq!(outcome.board.state(pos(4, 4)), CellState::Wave);
    assert_eq!(outcome.board.superposition_count(), 80);

    let outcome = execute_action(&board, measure, Team::Wave, 1, &mut unlucky());
    assert_eq!(outcome.board.state(pos(4, 4)), CellState::Particle);

    // The input board is never touched
    assert_eq!(board, create_initial_board());
}

#[test]
fn test_interference_bias_then_measure() {
    let board = create_initial_board();
    let interfere = Action::Interfere(pos(2, 2));
    let biased = execute_action(&board, interfere, Team::Particle, 2, &mut lucky());
    assert!(biased.success);

    // Wave measures, but the Particle bias decides
    let measure = Action::Measure(pos(2, 2));
    let measured = execute_action(&biased.board, measure, Team::Wave, 3, &mut lucky());
    assert_eq!(measured.board.state(pos(2, 2)), CellState::Particle);
    assert!(!measured.board.cell(pos(2, 2)).is_interfered());
}

#[test]
fn test_completing_a_row_wins() {
    let board = Board::from_rows(&["WWWW."]);
    let measure = Action::Measure(pos(0, 4));
    let outcome = execute_action(&board, measure, Team::Wave, 9, &mut lucky());
    let win = check_win(&outcome.board).expect("five in a row");
    assert_eq!(win.winning_team, Team::Wave);
    assert_eq!(win.winning_cells.to_vec(), (0..5).map(|y| pos(0, y)).collect::<Vec<_>>());
}

#[test]
fn test_entangled_flip_and_protection() {
    let board = Board::from_rows(&["W", "", "", "", "", "", "", "", "........P"]);

    let entangle = Action::Entangle(pos(0, 0), pos(8, 8));
    let linked = execute_action(&board, entangle, Team::Wave, 3, &mut lucky());
    assert!(linked.success);
    assert!(linked.board.links_are_consistent());

    // Freshly formed links cannot be broken on the next turn
    let unlink = Action::BreakEntanglement(pos(8, 8));
    let early = execute_action(&linked.board, unlink, Team::Particle, 4, &mut lucky());
    assert!(!early.success);
    assert_eq!(early.board, linked.board);

    let interfere = Action::Interfere(pos(0, 0));
    let flipped = execute_action(&linked.board, interfere, Team::Particle, 4, &mut lucky());
    assert_eq!(flipped.board.state(pos(0, 0)), CellState::Particle);
    assert_eq!(flipped.board.state(pos(8, 8)), CellState::Particle);

    let broken = execute_action(&flipped.board, unlink, Team::Wave, 5, &mut lucky());
    assert!(broken.success);
    assert!(!broken.board.cell(pos(0, 0)).is_entangled());
    assert!(broken.board.links_are_consistent());
}

#[test]
fn test_quantum_leap_keeps_links_symmetric() {
    let board = Board::from_rows(&["P.P"]);
    let entangle = Action::Entangle(pos(0, 0), pos(0, 2));
    let board = execute_action(&board, entangle, Team::Particle, 1, &mut lucky()).board;

    let leap = Action::QuantumLeap {
        from: pos(0, 0),
        to: pos(5, 5),
    };
    let leapt = execute_action(&board, leap, Team::Particle, 3, &mut lucky());
    assert!(leapt.success);
    assert_eq!(leapt.board.state(pos(0, 0)), CellState::Superposition);
    assert_eq!(leapt.board.cell(pos(5, 5)).link, Some(pos(0, 2)));
    assert_eq!(leapt.board.cell(pos(0, 2)).link, Some(pos(5, 5)));
    assert!(leapt.board.links_are_consistent());
}

#[test]
fn test_ai_takes_win_in_one() {
    let board = Board::from_rows(&["", "", "", "", "PPPP."]);
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let choice = select_ai_action(&board, 10, Difficulty::Easy, &mut rng).expect("a move");
    assert_eq!(choice.action, Action::Measure(pos(4, 4)));
    assert_eq!(choice.score, 10000.0);
}

// ============================================================================
// SESSION TESTS
// ============================================================================

#[test]
fn test_full_game_against_ai() {
    let config = SessionConfig::vs_ai(Difficulty::Medium).with_think_time_ms(0);
    let mut session = GameSession::new(config);
    let mut human = AiPlayer::with_seed(Difficulty::Easy, Team::Wave, 11);
    let mut dice = ChaCha8Rng::seed_from_u64(12);

    while !session.is_over() && session.turn() <= 300 {
        if let Some(ticket) = session.request_ai_move() {
            assert_eq!(ticket.delay.as_millis(), 0);
            session.resolve_ai_move(ticket, &mut dice).expect("fresh ticket");
        } else {
            match human.choose(session.board(), session.turn()) {
                Some(choice) => {
                    session.submit(choice.action, Team::Wave, &mut dice).expect("human's turn");
                }
                None => session.pass_turn().expect("game running"),
            }
        }
        assert!(session.board().links_are_consistent());
    }

    if let Some(Outcome::Win(_)) = session.winner() {
        let flagged = Board::positions()
            .filter(|&p| session.board().cell(p).is_winning_cell)
            .count();
        assert!(flagged >= 5);
        assert!(check_win(session.board()).is_some());
    }
}

#[test]
fn test_session_rejects_out_of_turn_play() {
    let mut session = GameSession::new(SessionConfig::vs_ai(Difficulty::Hard));
    let mut dice = ChaCha8Rng::seed_from_u64(1);

    session.submit(Action::Measure(pos(4, 4)), Team::Wave, &mut dice).unwrap();
    assert_eq!(
        session.submit(Action::Measure(pos(0, 0)), Team::Wave, &mut dice),
        Err(SessionError::AiTurn(Team::Particle))
    );

    let ticket = session.request_ai_move().expect("AI is due");
    session.reset();
    assert_eq!(
        session.resolve_ai_move(ticket, &mut dice),
        Err(SessionError::StaleAiTicket)
    );
    assert_eq!(session.board().superposition_count(), 81);
}

#[test]
fn test_ai_resolution_reports_action() {
    let mut session = GameSession::new(SessionConfig::vs_ai(Difficulty::Hard));
    let mut dice = ChaCha8Rng::seed_from_u64(2);
    session.submit(Action::Measure(pos(0, 0)), Team::Wave, &mut dice).unwrap();

    let ticket = session.request_ai_move().expect("AI is due");
    match session.resolve_ai_move(ticket, &mut dice).unwrap() {
        AiResolution::Played { outcome, .. } => assert!(outcome.success),
        AiResolution::Passed => panic!("the AI always has a move early on"),
    }
    assert_eq!(session.turn(), 3);
}

// ============================================================================
// SELF-PLAY TESTS
// ============================================================================

#[test]
fn test_self_play_match() {
    let config = MatchConfig::new(4)
        .with_difficulties(Difficulty::Medium, Difficulty::Hard)
        .with_max_turns(60)
        .with_seed(3);
    let result = play_match(&config);

    assert_eq!(result.games_played, 4);
    assert_eq!(
        result.wave_wins + result.particle_wins + result.draws + result.unfinished,
        4
    );
    assert_eq!(play_match(&config), result);
}

// ============================================================================
// PERFORMANCE TESTS
// ============================================================================

#[test]
fn test_ai_move_performance() {
    let mut board = create_initial_board();
    let mut dice = ChaCha8Rng::seed_from_u64(5);
    // Half-filled board: plenty of own cells for leap and entangle candidates
    for (i, p) in Board::positions().enumerate().filter(|(i, _)| i % 2 == 0) {
        let team = if i % 4 == 0 { Team::Wave } else { Team::Particle };
        board = execute_action(&board, Action::Measure(p), team, 1, &mut dice).board;
    }

    let start = Instant::now();
    let choice = select_ai_action(&board, 2, Difficulty::Hard, &mut dice);
    let elapsed = start.elapsed();

    println!("Hard AI move on a half-filled board: {:?}", elapsed);
    assert!(choice.is_some() || check_win(&board).is_some());
}
