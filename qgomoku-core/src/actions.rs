//! Actions and the action resolver

use crate::board::{Board, Cell, CellState, Pos, Team, BOARD_SIZE};
use crate::error::ParseActionError;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Chance a biased measurement lands on the interfering team's color
pub const INTERFERED_MEASURE_ODDS: f64 = 0.70;

/// Chance an unbiased measurement lands on the measuring team's color
pub const WAVE_MEASURE_ODDS: f64 = 0.60;
pub const PARTICLE_MEASURE_ODDS: f64 = 0.65;

/// Chance interfering with a confirmed cell flips it
pub const FLIP_ODDS: f64 = 0.65;

fn base_measure_odds(team: Team) -> f64 {
    match team {
        Team::Wave => WAVE_MEASURE_ODDS,
        Team::Particle => PARTICLE_MEASURE_ODDS,
    }
}

/// True when `stamp` is exactly the turn before `turn`
fn is_previous_turn(stamp: Option<u32>, turn: u32) -> bool {
    stamp.map_or(false, |t| t + 1 == turn)
}

// ============================================================================
// CORE TYPES
// ============================================================================

/// The five action types
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Measure,
    Interfere,
    Entangle,
    QuantumLeap,
    BreakEntanglement,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        ActionKind::Measure,
        ActionKind::Interfere,
        ActionKind::Entangle,
        ActionKind::QuantumLeap,
        ActionKind::BreakEntanglement,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ActionKind::Measure => "measure",
            ActionKind::Interfere => "interfere",
            ActionKind::Entangle => "entangle",
            ActionKind::QuantumLeap => "quantum-leap",
            ActionKind::BreakEntanglement => "break-entanglement",
        }
    }

    /// Whether the action needs a second cell
    pub fn is_paired(self) -> bool {
        matches!(self, ActionKind::Entangle | ActionKind::QuantumLeap)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActionKind {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "measure" | "m" => Ok(ActionKind::Measure),
            "interfere" | "i" => Ok(ActionKind::Interfere),
            "entangle" | "e" => Ok(ActionKind::Entangle),
            "quantum-leap" | "leap" | "l" => Ok(ActionKind::QuantumLeap),
            "break-entanglement" | "break" | "b" => Ok(ActionKind::BreakEntanglement),
            _ => Err(ParseActionError::UnknownAction(s.to_string())),
        }
    }
}

/// A fully specified action request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Measure(Pos),
    Interfere(Pos),
    Entangle(Pos, Pos),
    QuantumLeap { from: Pos, to: Pos },
    BreakEntanglement(Pos),
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Measure(_) => ActionKind::Measure,
            Action::Interfere(_) => ActionKind::Interfere,
            Action::Entangle(..) => ActionKind::Entangle,
            Action::QuantumLeap { .. } => ActionKind::QuantumLeap,
            Action::BreakEntanglement(_) => ActionKind::BreakEntanglement,
        }
    }

    /// First selected cell
    pub fn cell(&self) -> Pos {
        match *self {
            Action::Measure(p)
            | Action::Interfere(p)
            | Action::Entangle(p, _)
            | Action::BreakEntanglement(p) => p,
            Action::QuantumLeap { from, .. } => from,
        }
    }

    /// Second selected cell for paired actions
    pub fn second_cell(&self) -> Option<Pos> {
        match *self {
            Action::Entangle(_, p) => Some(p),
            Action::QuantumLeap { to, .. } => Some(to),
            _ => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.second_cell() {
            Some(second) => write!(f, "{} {} -> {}", self.kind(), self.cell(), second),
            None => write!(f, "{} {}", self.kind(), self.cell()),
        }
    }
}

impl FromStr for Action {
    type Err = ParseActionError;

    /// Parse `"<action> x y [x2 y2]"`, e.g. `measure 4 4` or `leap 0 0 3 3`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut tokens = s.split_whitespace();
        let kind: ActionKind = tokens.next().ok_or(ParseActionError::Empty)?.parse()?;

        let coords = tokens.map(parse_coordinate).collect::<Result<Vec<u8>, _>>()?;
        let expected = if kind.is_paired() { 4 } else { 2 };
        if coords.len() != expected {
            return Err(ParseActionError::WrongArity {
                action: kind.name(),
                expected,
                got: coords.len(),
            });
        }

        let first = Pos::new(coords[0], coords[1]);
        let action = match kind {
            ActionKind::Measure => Action::Measure(first),
            ActionKind::Interfere => Action::Interfere(first),
            ActionKind::BreakEntanglement => Action::BreakEntanglement(first),
            ActionKind::Entangle => Action::Entangle(first, Pos::new(coords[2], coords[3])),
            ActionKind::QuantumLeap => Action::QuantumLeap {
                from: first,
                to: Pos::new(coords[2], coords[3]),
            },
        };
        Ok(action)
    }
}

fn parse_coordinate(token: &str) -> Result<u8, ParseActionError> {
    let value: u8 = token
        .trim_matches(|c| c == '(' || c == ')' || c == ',')
        .parse()
        .map_err(|_| ParseActionError::InvalidCoordinate(token.to_string()))?;
    if value as usize >= BOARD_SIZE {
        return Err(ParseActionError::OffBoard(value));
    }
    Ok(value)
}

/// Sound notifications the surrounding application may play
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    Measure,
    Interfere,
    Entangle,
    QuantumLeap,
    BreakEntanglement,
    Win,
}

impl SoundCue {
    pub fn file_name(self) -> &'static str {
        match self {
            SoundCue::Measure => "measure.mp3",
            SoundCue::Interfere => "interfere.mp3",
            SoundCue::Entangle => "entangle.mp3",
            SoundCue::QuantumLeap => "quantum-leap.mp3",
            SoundCue::BreakEntanglement => "break-entanglement.mp3",
            SoundCue::Win => "win.mp3",
        }
    }
}

/// Result of resolving one action
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ActionOutcome {
    /// New board on success, the untouched input on failure
    pub board: Board,
    pub message: String,
    pub success: bool,
    pub sound: Option<SoundCue>,
}

impl ActionOutcome {
    fn applied(board: Board, message: String, sound: SoundCue) -> Self {
        Self {
            board,
            message,
            success: true,
            sound: Some(sound),
        }
    }

    fn rejected(board: &Board, message: impl Into<String>) -> Self {
        Self {
            board: *board,
            message: message.into(),
            success: false,
            sound: None,
        }
    }
}

// ============================================================================
// RESOLVER
// ============================================================================

/// Apply `action` for `player` on `turn`, returning a new board.
///
/// The input board is never modified. Randomness is drawn only from `rng`, so
/// the same board, action and RNG state always produce the same outcome.
pub fn execute_action<R: Rng + ?Sized>(
    board: &Board,
    action: Action,
    player: Team,
    turn: u32,
    rng: &mut R,
) -> ActionOutcome {
    match action {
        Action::Measure(pos) => measure(board, pos, player, rng),
        Action::Interfere(pos) => interfere(board, pos, player, turn, rng),
        Action::Entangle(a, b) => entangle(board, a, b, turn),
        Action::QuantumLeap { from, to } => quantum_leap(board, from, to, player),
        Action::BreakEntanglement(pos) => break_entanglement(board, pos, turn),
    }
}

fn measure<R: Rng + ?Sized>(
    board: &Board,
    pos: Pos,
    player: Team,
    rng: &mut R,
) -> ActionOutcome {
    let cell = board.cell(pos);
    if cell.state != CellState::Superposition {
        return ActionOutcome::rejected(
            board,
            format!("{} is not in superposition and cannot be measured", pos),
        );
    }

    let (result, reason) = match cell.interference {
        Some(owner) => {
            let favored = owner.color();
            let result = if rng.gen_bool(INTERFERED_MEASURE_ODDS) {
                favored
            } else {
                favored.flipped()
            };
            (result, format!("{} interference favors {} at 70%", owner, favored))
        }
        None => {
            let odds = base_measure_odds(player);
            let own = player.color();
            let result = if rng.gen_bool(odds) {
                own
            } else {
                own.flipped()
            };
            (result, format!("{} odds {:.0}%", own, odds * 100.0))
        }
    };

    let mut next = *board;
    let target = next.cell_mut(pos);
    target.state = result;
    target.interference = None;
    target.interference_created_at = None;

    ActionOutcome::applied(
        next,
        format!("Measured {} ({}): collapsed to {}", pos, reason, result),
        SoundCue::Measure,
    )
}

fn interfere<R: Rng + ?Sized>(
    board: &Board,
    pos: Pos,
    player: Team,
    turn: u32,
    rng: &mut R,
) -> ActionOutcome {
    let cell = *board.cell(pos);
    if is_previous_turn(cell.interference_created_at, turn) {
        return ActionOutcome::rejected(
            board,
            format!("{} was interfered with last turn and must rest", pos),
        );
    }

    let mut next = *board;

    if cell.state == CellState::Superposition {
        let target = next.cell_mut(pos);
        target.interference = Some(player);
        target.interference_created_at = Some(turn);
        return ActionOutcome::applied(
            next,
            format!(
                "Interfered with {}: the next measurement favors {} at 70%",
                pos,
                player.color()
            ),
            SoundCue::Interfere,
        );
    }

    // The attempt consumes the cooldown whether or not the flip lands
    next.cell_mut(pos).interference_created_at = Some(turn);

    if !rng.gen_bool(FLIP_ODDS) {
        return ActionOutcome::applied(
            next,
            format!(
                "Interference at {} failed: the cell stays {}",
                pos, cell.state
            ),
            SoundCue::Interfere,
        );
    }

    let flipped = cell.state.flipped();
    next.cell_mut(pos).state = flipped;

    let message = match cell.link {
        Some(partner) => {
            let linked = next.cell_mut(partner);
            linked.state = flipped;
            linked.interference_created_at = Some(turn);
            format!(
                "Interference flipped {} to {}; entangled {} followed",
                pos, flipped, partner
            )
        }
        None => format!("Interference flipped {} to {}", pos, flipped),
    };

    ActionOutcome::applied(next, message, SoundCue::Interfere)
}

fn entangle(board: &Board, a: Pos, b: Pos, turn: u32) -> ActionOutcome {
    if a == b {
        return ActionOutcome::rejected(board, "A cell cannot be entangled with itself");
    }

    let (first, second) = (board.cell(a), board.cell(b));
    if !first.state.is_confirmed() || !second.state.is_confirmed() {
        return ActionOutcome::rejected(board, "Cells in superposition cannot be entangled");
    }
    if first.is_entangled() || second.is_entangled() {
        return ActionOutcome::rejected(board, "One of the cells is already entangled");
    }

    let mut next = *board;
    next.link(a, b, Some(turn));

    ActionOutcome::applied(
        next,
        format!("Entangled {} and {}", a, b),
        SoundCue::Entangle,
    )
}

fn quantum_leap(board: &Board, from: Pos, to: Pos, player: Team) -> ActionOutcome {
    if from == to {
        return ActionOutcome::rejected(board, "A quantum leap needs a different destination");
    }

    let source = *board.cell(from);
    if source.state != player.color() {
        return ActionOutcome::rejected(
            board,
            format!("Only {} cells can leap for {}", player.color(), player),
        );
    }

    let mut next = *board;

    {
        let dest = next.cell_mut(to);
        dest.state = source.state;
        dest.interference_created_at = source.interference_created_at;
        dest.interference = None;
    }

    let mut message = format!("{} leaped to {}", from, to);

    match source.link {
        // Landing on the partner would leave the pair pointing at itself
        Some(partner) if partner == to => {
            next.unlink(from);
            message.push_str("; landing on its partner dissolved the entanglement");
        }
        Some(partner) => {
            let created_at = board.cell(partner).entanglement_created_at;
            if next.cell(to).is_entangled() {
                next.unlink(to);
            }
            next.unlink(from);
            next.link(to, partner, created_at);
            message.push_str(&format!("; entanglement with {} moved along", partner));
        }
        None => {}
    }

    *next.cell_mut(from) = Cell::superposition();

    ActionOutcome::applied(next, message, SoundCue::QuantumLeap)
}

fn break_entanglement(board: &Board, pos: Pos, turn: u32) -> ActionOutcome {
    let cell = board.cell(pos);
    if !cell.is_entangled() {
        return ActionOutcome::rejected(board, format!("{} is not entangled", pos));
    }
    if is_previous_turn(cell.entanglement_created_at, turn) {
        return ActionOutcome::rejected(board, "Entanglements formed last turn are protected");
    }

    let mut next = *board;
    let message = match next.unlink(pos) {
        Some(partner) => format!("Broke the entanglement between {} and {}", pos, partner),
        None => format!("Broke the entanglement at {}", pos),
    };

    ActionOutcome::applied(next, message, SoundCue::BreakEntanglement)
}

// ============================================================================
// LEGAL TARGETS
// ============================================================================

/// Whether `cell` can be the first selection for `kind` by `player` on `turn`.
///
/// Entangle needs both of its cells to pass this check. A quantum leap's
/// destination is unrestricted apart from differing from the origin.
pub fn is_legal_target(cell: &Cell, kind: ActionKind, player: Team, turn: u32) -> bool {
    match kind {
        ActionKind::Measure => cell.state == CellState::Superposition,
        ActionKind::Interfere => !is_previous_turn(cell.interference_created_at, turn),
        ActionKind::Entangle => cell.state.is_confirmed() && !cell.is_entangled(),
        ActionKind::QuantumLeap => cell.state == player.color(),
        ActionKind::BreakEntanglement => {
            cell.is_entangled() && !is_previous_turn(cell.entanglement_created_at, turn)
        }
    }
}

/// Every cell `player` may select for `kind` on `turn`, in row-major order
pub fn legal_targets(board: &Board, kind: ActionKind, player: Team, turn: u32) -> Vec<Pos> {
    board
        .iter()
        .filter(|(_, cell)| is_legal_target(cell, kind, player, turn))
        .map(|(pos, _)| pos)
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
