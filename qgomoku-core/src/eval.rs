//! Position evaluation for the AI

use crate::board::{Board, CellState, Pos, LINE_DIRECTIONS, WIN_LENGTH};

/// Half-width of the window examined around a square
const WINDOW_REACH: i8 = 4;

/// Center bonus: `max(0, CENTER_BONUS - CENTER_FALLOFF * distance)`
const CENTER_BONUS: f32 = 15.0;
const CENTER_FALLOFF: f32 = 3.0;

/// Score a 5-cell sub-window by its attacker and defender counts
fn window_score(attacker: usize, defender: usize) -> f32 {
    if defender == 0 {
        match attacker {
            4 => 1000.0,
            3 => 500.0,
            2 => 100.0,
            1 => 10.0,
            _ => 0.0,
        }
    } else if attacker == 0 {
        match defender {
            4 => 900.0,
            3 => 400.0,
            2 => 50.0,
            _ => 0.0,
        }
    } else {
        0.0
    }
}

/// Best sub-window score along one direction through `pos`
pub fn evaluate_line(
    board: &Board,
    pos: Pos,
    dx: i8,
    dy: i8,
    attacker: CellState,
    defender: CellState,
) -> f32 {
    let states: Vec<CellState> = (-WINDOW_REACH..=WINDOW_REACH)
        .filter_map(|step| pos.offset(dx, dy, step))
        .map(|p| board.state(p))
        .collect();

    states
        .windows(WIN_LENGTH)
        .map(|window| {
            let ours = window.iter().filter(|&&s| s == attacker).count();
            let theirs = window.iter().filter(|&&s| s == defender).count();
            window_score(ours, theirs)
        })
        .fold(0.0, f32::max)
}

/// Strategic value of a square.
///
/// With `for_attacker` the square is scored from the attacker's side; otherwise
/// the roles swap and the result measures how much the defender wants it.
/// Adds a bonus for proximity to the center.
pub fn evaluate_position(
    board: &Board,
    pos: Pos,
    for_attacker: bool,
    attacker: CellState,
    defender: CellState,
) -> f32 {
    let (ours, theirs) = if for_attacker {
        (attacker, defender)
    } else {
        (defender, attacker)
    };

    let line_score = LINE_DIRECTIONS
        .iter()
        .map(|&(dx, dy)| evaluate_line(board, pos, dx, dy, ours, theirs))
        .fold(0.0, f32::max);

    let center_bonus = (CENTER_BONUS - pos.distance_to_center() * CENTER_FALLOFF).max(0.0);

    line_score + center_bonus
}
