//! Win detection and line counting

use crate::board::{Board, CellState, Pos, Team, BOARD_SIZE, LINE_DIRECTIONS, WIN_LENGTH};
use serde::{Deserialize, Serialize};

/// A detected five-in-a-row
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinResult {
    pub winning_team: Team,
    pub winning_cells: [Pos; WIN_LENGTH],
}

/// Final result of a game
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    Win(Team),
    Draw,
}

/// Find the first five-in-a-row.
///
/// Scans cells row-major and, from each confirmed cell, looks forward along
/// horizontal, vertical, down-right and up-right in that order. Draws are the
/// caller's business.
pub fn check_win(board: &Board) -> Option<WinResult> {
    for (pos, cell) in board.iter() {
        let team = match cell.state.team() {
            Some(t) => t,
            None => continue,
        };

        for &(dx, dy) in &LINE_DIRECTIONS {
            let mut winning_cells = [pos; WIN_LENGTH];
            let mut count = 1;

            for step in 1..WIN_LENGTH as i8 {
                match pos.offset(dx, dy, step) {
                    Some(next) if board.state(next) == cell.state => {
                        winning_cells[count] = next;
                        count += 1;
                    }
                    _ => break,
                }
            }

            if count >= WIN_LENGTH {
                return Some(WinResult {
                    winning_team: team,
                    winning_cells,
                });
            }
        }
    }

    None
}

/// Count cells matching `state` stepping away from `pos` (exclusive), up to `max_count`
pub fn count_consecutive_cells(
    board: &Board,
    pos: Pos,
    dx: i8,
    dy: i8,
    state: CellState,
    max_count: usize,
) -> usize {
    // No run on the board is longer than a side
    let reach = max_count.min(BOARD_SIZE) as i8;
    let mut count = 0;

    for step in 1..=reach {
        match pos.offset(dx, dy, step) {
            Some(next) if board.state(next) == state => count += 1,
            _ => break,
        }
    }

    count
}

/// Longest line of `state` through `pos` across all four directions, counting `pos` itself
pub fn max_line_count(board: &Board, pos: Pos, state: CellState) -> usize {
    LINE_DIRECTIONS
        .iter()
        .map(|&(dx, dy)| {
            let forward = count_consecutive_cells(board, pos, dx, dy, state, WIN_LENGTH);
            let backward = count_consecutive_cells(board, pos, -dx, -dy, state, WIN_LENGTH);
            forward + backward + 1
        })
        .max()
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::create_initial_board;

    #[test]
    fn test_empty_board_has_no_win() {
        assert_eq!(check_win(&create_initial_board()), None);
    }

    #[test]
    fn test_four_is_not_enough() {
        let board = Board::from_rows(&["WWWW.P"]);
        assert_eq!(check_win(&board), None);
    }

    #[test]
    fn test_vertical_run() {
        let board = Board::from_rows(&["..P", "..P", "..P", "..P", "..P"]);
        let win = check_win(&board).expect("vertical five");
        assert_eq!(win.winning_team, Team::Particle);
        let expected: Vec<_> = (0..5).map(|x| Pos::new(x, 2)).collect();
        assert_eq!(win.winning_cells.to_vec(), expected);
    }

    #[test]
    fn test_up_right_diagonal() {
        let board = Board::from_rows(&[
            ".........",
            ".........",
            ".........",
            ".........",
            "....W....",
            "...W.....",
            "..W......",
            ".W.......",
            "W........",
        ]);
        let win = check_win(&board).expect("diagonal five");
        assert_eq!(win.winning_team, Team::Wave);
        // (4,4) is the first wave cell in row-major order
        assert_eq!(win.winning_cells[0], Pos::new(4, 4));
        assert_eq!(win.winning_cells[4], Pos::new(8, 0));
    }

    #[test]
    fn test_first_found_tie_break() {
        // Row 0 has a wave run, row 2 a particle run: row-major scan reports wave first
        let board = Board::from_rows(&["WWWWW", "", "PPPPP"]);
        let win = check_win(&board).expect("win");
        assert_eq!(win.winning_team, Team::Wave);
    }

    #[test]
    fn test_superposition_never_wins() {
        let board = Board::from_rows(&["WWWW", "PPPP"]);
        assert!(check_win(&board).is_none());
    }

    #[test]
    fn test_count_consecutive_cells() {
        let board = Board::from_rows(&["PPP.P"]);
        let origin = Pos::new(0, 0);
        assert_eq!(count_consecutive_cells(&board, origin, 0, 1, CellState::Particle, 5), 2);
        assert_eq!(count_consecutive_cells(&board, origin, 0, -1, CellState::Particle, 5), 0);
        assert_eq!(count_consecutive_cells(&board, origin, 0, 1, CellState::Particle, 1), 1);
    }

    #[test]
    fn test_count_consecutive_cells_large_limit() {
        let board = Board::from_rows(&["WWWWWWWWW"]);
        let origin = Pos::new(0, 0);
        assert_eq!(count_consecutive_cells(&board, origin, 0, 1, CellState::Wave, 300), 8);
        assert_eq!(count_consecutive_cells(&board, origin, 0, 1, CellState::Wave, usize::MAX), 8);
    }

    #[test]
    fn test_max_line_count() {
        let board = Board::from_rows(&["PP.PP"]);
        let gap = Pos::new(0, 2);
        assert_eq!(max_line_count(&board, gap, CellState::Particle), 5);
        assert_eq!(max_line_count(&board, gap, CellState::Wave), 1);
    }
}
