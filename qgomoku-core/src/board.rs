//! Board model: cells, teams and the fixed 9x9 grid

use serde::{Deserialize, Serialize};
use std::fmt;

/// Board side length
pub const BOARD_SIZE: usize = 9;

/// Run length needed to win
pub const WIN_LENGTH: usize = 5;

/// Line directions (dx, dy) in scan order.
/// Index: 0=horizontal, 1=vertical, 2=diagonal down-right, 3=diagonal up-right
pub const LINE_DIRECTIONS: [(i8, i8); 4] = [(1, 0), (0, 1), (1, 1), (1, -1)];

// ============================================================================
// CORE TYPES
// ============================================================================

/// Team (player) identity
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Wave = 1,
    Particle = 2,
}

impl Team {
    pub fn opponent(self) -> Self {
        match self {
            Team::Wave => Team::Particle,
            Team::Particle => Team::Wave,
        }
    }

    /// Confirmed cell state owned by this team
    pub fn color(self) -> CellState {
        match self {
            Team::Wave => CellState::Wave,
            Team::Particle => CellState::Particle,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Team::Wave => write!(f, "Wave"),
            Team::Particle => write!(f, "Particle"),
        }
    }
}

/// Quantum state of a single cell
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CellState {
    Wave,
    Particle,
    Superposition,
}

impl CellState {
    /// Wave and Particle are confirmed, Superposition is not
    pub fn is_confirmed(self) -> bool {
        !matches!(self, CellState::Superposition)
    }

    /// Team owning this state, if confirmed
    pub fn team(self) -> Option<Team> {
        match self {
            CellState::Wave => Some(Team::Wave),
            CellState::Particle => Some(Team::Particle),
            CellState::Superposition => None,
        }
    }

    /// Opposite confirmed state (Superposition maps to itself)
    pub fn flipped(self) -> Self {
        match self {
            CellState::Wave => CellState::Particle,
            CellState::Particle => CellState::Wave,
            CellState::Superposition => CellState::Superposition,
        }
    }

    fn symbol(self) -> char {
        match self {
            CellState::Wave => 'W',
            CellState::Particle => 'P',
            CellState::Superposition => '.',
        }
    }
}

impl fmt::Display for CellState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellState::Wave => write!(f, "wave"),
            CellState::Particle => write!(f, "particle"),
            CellState::Superposition => write!(f, "superposition"),
        }
    }
}

/// Board coordinates; `x` is the row, `y` the column
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pos {
    pub x: u8,
    pub y: u8,
}

impl Pos {
    pub const fn new(x: u8, y: u8) -> Self {
        Self { x, y }
    }

    /// Step by (dx, dy) times `steps`, None when leaving the board
    pub fn offset(self, dx: i8, dy: i8, steps: i8) -> Option<Pos> {
        let nx = self.x as i16 + dx as i16 * steps as i16;
        let ny = self.y as i16 + dy as i16 * steps as i16;
        let size = BOARD_SIZE as i16;
        if nx < 0 || nx >= size || ny < 0 || ny >= size {
            return None;
        }
        Some(Pos::new(nx as u8, ny as u8))
    }

    /// Euclidean distance to another position
    pub fn distance_to(self, other: Pos) -> f32 {
        let dx = self.x as f32 - other.x as f32;
        let dy = self.y as f32 - other.y as f32;
        (dx * dx + dy * dy).sqrt()
    }

    /// Euclidean distance to the board center (4, 4)
    pub fn distance_to_center(self) -> f32 {
        let center = (BOARD_SIZE / 2) as u8;
        self.distance_to(Pos::new(center, center))
    }

    /// The 8 surrounding positions that lie on the board
    pub fn neighbors(self) -> impl Iterator<Item = Pos> {
        const AROUND: [(i8, i8); 8] = [
            (-1, 0),
            (1, 0),
            (0, -1),
            (0, 1),
            (-1, -1),
            (-1, 1),
            (1, -1),
            (1, 1),
        ];
        AROUND
            .into_iter()
            .filter_map(move |(dx, dy)| self.offset(dx, dy, 1))
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// A single grid cell
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub state: CellState,
    /// Entanglement partner (symmetric)
    pub link: Option<Pos>,
    /// Turn the current entanglement was formed
    pub entanglement_created_at: Option<u32>,
    /// Team owning a pending measurement bias
    pub interference: Option<Team>,
    /// Turn an interference action last touched this cell
    pub interference_created_at: Option<u32>,
    /// Display-only marker set after a win
    pub is_winning_cell: bool,
}

impl Cell {
    pub const fn superposition() -> Self {
        Self {
            state: CellState::Superposition,
            link: None,
            entanglement_created_at: None,
            interference: None,
            interference_created_at: None,
            is_winning_cell: false,
        }
    }

    /// Confirmed cell with no links or interference
    pub const fn confirmed(state: CellState) -> Self {
        Self {
            state,
            ..Self::superposition()
        }
    }

    pub fn is_entangled(&self) -> bool {
        self.link.is_some()
    }

    pub fn is_interfered(&self) -> bool {
        self.interference.is_some()
    }

    fn clear_link(&mut self) {
        self.link = None;
        self.entanglement_created_at = None;
    }
}

impl Default for Cell {
    fn default() -> Self {
        Self::superposition()
    }
}

// ============================================================================
// BOARD
// ============================================================================

/// 9x9 grid stored row-major as `cells[x][y]` (copy to mutate)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    cells: [[Cell; BOARD_SIZE]; BOARD_SIZE],
}

/// Fresh board: every cell in superposition, nothing linked or interfered
pub fn create_initial_board() -> Board {
    Board::new()
}

impl Board {
    pub fn new() -> Self {
        Self {
            cells: [[Cell::superposition(); BOARD_SIZE]; BOARD_SIZE],
        }
    }

    /// Build a board from row strings: `W` wave, `P` particle, anything else superposition.
    /// Missing rows and columns stay in superposition.
    pub fn from_rows(rows: &[&str]) -> Self {
        let mut board = Self::new();
        for (x, row) in rows.iter().enumerate().take(BOARD_SIZE) {
            for (y, ch) in row.chars().enumerate().take(BOARD_SIZE) {
                let state = match ch {
                    'W' | 'w' => CellState::Wave,
                    'P' | 'p' => CellState::Particle,
                    _ => CellState::Superposition,
                };
                board.cells[x][y].state = state;
            }
        }
        board
    }

    pub fn cell(&self, pos: Pos) -> &Cell {
        &self.cells[pos.x as usize][pos.y as usize]
    }

    pub fn cell_mut(&mut self, pos: Pos) -> &mut Cell {
        &mut self.cells[pos.x as usize][pos.y as usize]
    }

    pub fn state(&self, pos: Pos) -> CellState {
        self.cell(pos).state
    }

    /// Set a cell's state directly (fixtures and simulations)
    pub fn set_state(&mut self, pos: Pos, state: CellState) {
        self.cell_mut(pos).state = state;
    }

    /// All positions in row-major order
    pub fn positions() -> impl Iterator<Item = Pos> {
        (0..BOARD_SIZE as u8).flat_map(|x| (0..BOARD_SIZE as u8).map(move |y| Pos::new(x, y)))
    }

    /// Iterate (pos, cell) pairs in row-major order
    pub fn iter(&self) -> impl Iterator<Item = (Pos, &Cell)> + '_ {
        Self::positions().map(move |pos| (pos, self.cell(pos)))
    }

    pub fn count_state(&self, state: CellState) -> usize {
        self.iter().filter(|(_, cell)| cell.state == state).count()
    }

    pub fn superposition_count(&self) -> usize {
        self.count_state(CellState::Superposition)
    }

    /// Link two cells symmetrically, stamping both with `turn`
    pub(crate) fn link(&mut self, a: Pos, b: Pos, created_at: Option<u32>) {
        let first = self.cell_mut(a);
        first.link = Some(b);
        first.entanglement_created_at = created_at;
        let second = self.cell_mut(b);
        second.link = Some(a);
        second.entanglement_created_at = created_at;
    }

    /// Remove the entanglement touching `pos` from both ends; returns the old partner
    pub(crate) fn unlink(&mut self, pos: Pos) -> Option<Pos> {
        let partner = self.cell(pos).link?;
        self.cell_mut(pos).clear_link();
        if self.cell(partner).link == Some(pos) {
            self.cell_mut(partner).clear_link();
        }
        Some(partner)
    }

    /// True when every link is mutual and no cell links to itself
    pub fn links_are_consistent(&self) -> bool {
        self.iter().all(|(pos, cell)| match cell.link {
            None => true,
            Some(partner) => partner != pos && self.cell(partner).link == Some(pos),
        })
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for x in 0..BOARD_SIZE {
            let row: String = self.cells[x].iter().map(|c| c.state.symbol()).collect();
            writeln!(f, "{}", row)?;
        }
        Ok(())
    }
}
