//! Greedy one-ply AI
//!
//! Every legal action is scored with the line evaluator and one is picked
//! according to the difficulty policy. Two short-circuits run first: a move
//! that can complete five for the AI, then a move that blocks the opponent
//! from doing so. There is no lookahead beyond those checks.

use crate::actions::{is_legal_target, legal_targets, Action, ActionKind};
use crate::board::{
    Board, Cell, CellState, Pos, Team, BOARD_SIZE, LINE_DIRECTIONS, WIN_LENGTH,
};
use crate::error::ParseDifficultyError;
use crate::eval::evaluate_position;
use crate::win::{count_consecutive_cells, max_line_count};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Color the computer opponent plays
pub const AI_TEAM: Team = Team::Particle;

/// Score reported for a move that completes five
pub const WIN_SCORE: f32 = 10000.0;

/// Score reported for a move that stops the opponent completing five
pub const THREAT_SCORE: f32 = 9000.0;

/// Defensive value above which an opponent entanglement is worth breaking at once
const THREAT_LINK_VALUE: f32 = 300.0;

/// Base scores per action type
const MEASURE_BASE: f32 = 50.0;
const INTERFERE_BASE: f32 = 30.0;
const ENTANGLE_BASE: f32 = 60.0;
const LEAP_BASE: f32 = 40.0;
const BREAK_BASE: f32 = 35.0;

// ============================================================================
// DIFFICULTY
// ============================================================================

/// AI difficulty level
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Upper bound of the random bonus added to each candidate
    fn jitter_range(self) -> f32 {
        match self {
            Difficulty::Easy => 10.0,
            Difficulty::Medium => 5.0,
            Difficulty::Hard => 0.0,
        }
    }

    fn jitter<R: Rng + ?Sized>(self, rng: &mut R) -> f32 {
        let range = self.jitter_range();
        if range > 0.0 {
            rng.gen_range(0.0..range)
        } else {
            0.0
        }
    }

    /// Pause before the AI commits a move
    pub fn thinking_time(self) -> Duration {
        match self {
            Difficulty::Easy => Duration::from_millis(1000),
            Difficulty::Medium => Duration::from_millis(1500),
            Difficulty::Hard => Duration::from_millis(2000),
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

impl FromStr for Difficulty {
    type Err = ParseDifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" | "normal" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(ParseDifficultyError(s.to_string())),
        }
    }
}

// ============================================================================
// AI PLAYER
// ============================================================================

/// A chosen action with its heuristic score
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AiAction {
    pub action: Action,
    pub score: f32,
    /// Short reason, for logs
    pub strategy: String,
}

/// AI player with its own RNG
pub struct AiPlayer {
    pub difficulty: Difficulty,
    pub team: Team,
    rng: ChaCha8Rng,
}

impl AiPlayer {
    pub fn new(difficulty: Difficulty) -> Self {
        Self::with_seed(difficulty, AI_TEAM, 42)
    }

    pub fn with_seed(difficulty: Difficulty, team: Team, seed: u64) -> Self {
        Self {
            difficulty,
            team,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Pick an action for the current position
    pub fn choose(&mut self, board: &Board, turn: u32) -> Option<AiAction> {
        select_action_for(board, turn, self.difficulty, self.team, &mut self.rng)
    }
}

/// Pick the computer opponent's action (the AI always plays Particle)
pub fn select_ai_action<R: Rng + ?Sized>(
    board: &Board,
    turn: u32,
    difficulty: Difficulty,
    rng: &mut R,
) -> Option<AiAction> {
    select_action_for(board, turn, difficulty, AI_TEAM, rng)
}

/// Pick an action for `team`; `None` means there is nothing legal to do
pub fn select_action_for<R: Rng + ?Sized>(
    board: &Board,
    turn: u32,
    difficulty: Difficulty,
    team: Team,
    rng: &mut R,
) -> Option<AiAction> {
    if let Some(action) = find_immediate_win(board, turn, team) {
        return Some(AiAction {
            action,
            score: WIN_SCORE,
            strategy: "immediate win".to_string(),
        });
    }

    if let Some(action) = find_immediate_threat(board, turn, team) {
        return Some(AiAction {
            action,
            score: THREAT_SCORE,
            strategy: "block threat".to_string(),
        });
    }

    let mut candidates = collect_candidates(board, turn, difficulty, team, rng);
    if candidates.is_empty() {
        return None;
    }

    // Stable sort: equal scores keep enumeration order
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let index = pick_index(candidates.len(), difficulty, rng);
    Some(candidates.swap_remove(index))
}

/// Index into the sorted candidate list according to difficulty policy
fn pick_index<R: Rng + ?Sized>(len: usize, difficulty: Difficulty, rng: &mut R) -> usize {
    let (top_odds, pool_fraction) = match difficulty {
        Difficulty::Easy => (0.2, 0.3),
        Difficulty::Medium => (0.4, 0.1),
        Difficulty::Hard => return 0,
    };

    if rng.gen_bool(top_odds) {
        return 0;
    }

    let pool = ((len as f64 * pool_fraction) as usize).max(1);
    rng.gen_range(0..pool)
}

// ============================================================================
// SHORT-CIRCUITS
// ============================================================================

/// A measure, interfere or quantum-leap that completes five in its best case
fn find_immediate_win(board: &Board, turn: u32, team: Team) -> Option<Action> {
    let me = team.color();
    let them = team.opponent().color();

    // Measure landing on our color
    for pos in legal_targets(board, ActionKind::Measure, team, turn) {
        let mut sim = *board;
        sim.set_state(pos, me);
        if max_line_count(&sim, pos, me) >= WIN_LENGTH {
            return Some(Action::Measure(pos));
        }
    }

    // Interference flipping an opponent cell (and its partner) to our color
    for (pos, cell) in board.iter() {
        if cell.state != them || !is_legal_target(cell, ActionKind::Interfere, team, turn) {
            continue;
        }
        let mut sim = *board;
        sim.set_state(pos, me);
        if let Some(partner) = cell.link {
            sim.set_state(partner, me);
        }
        let completes = max_line_count(&sim, pos, me) >= WIN_LENGTH
            || cell.link.map_or(false, |p| max_line_count(&sim, p, me) >= WIN_LENGTH);
        if completes {
            return Some(Action::Interfere(pos));
        }
    }

    // Quantum leap of one of our cells; the origin falls back to superposition
    for from in legal_targets(board, ActionKind::QuantumLeap, team, turn) {
        for (to, target) in board.iter() {
            if to == from || target.state == me {
                continue;
            }
            let mut sim = *board;
            sim.set_state(from, CellState::Superposition);
            sim.set_state(to, me);
            if max_line_count(&sim, to, me) >= WIN_LENGTH {
                return Some(Action::QuantumLeap { from, to });
            }
        }
    }

    None
}

/// A defensive move against an opponent win next turn
fn find_immediate_threat(board: &Board, turn: u32, team: Team) -> Option<Action> {
    let me = team.color();
    let them = team.opponent().color();

    // Opponent measurement that would complete five
    for (pos, cell) in board.iter() {
        if cell.state != CellState::Superposition {
            continue;
        }
        let mut sim = *board;
        sim.set_state(pos, them);
        if max_line_count(&sim, pos, them) >= WIN_LENGTH {
            let can_bias = cell.interference != Some(team)
                && is_legal_target(cell, ActionKind::Interfere, team, turn);
            return Some(if can_bias {
                Action::Interfere(pos)
            } else {
                Action::Measure(pos)
            });
        }
    }

    // Opponent line of four or more
    for (pos, cell) in board.iter() {
        if cell.state != them || !is_legal_target(cell, ActionKind::Interfere, team, turn) {
            continue;
        }
        let long_line = LINE_DIRECTIONS.iter().any(|&(dx, dy)| {
            let forward = count_consecutive_cells(board, pos, dx, dy, them, WIN_LENGTH);
            let backward = count_consecutive_cells(board, pos, -dx, -dy, them, WIN_LENGTH);
            forward + backward + 1 >= WIN_LENGTH - 1
        });
        if long_line {
            return Some(Action::Interfere(pos));
        }
    }

    // Opponent entanglement anchoring a strong line
    for (pos, cell) in board.iter() {
        if cell.state != them
            || !is_legal_target(cell, ActionKind::BreakEntanglement, team, turn)
        {
            continue;
        }
        let partner = match cell.link {
            Some(p) => p,
            None => continue,
        };
        let here = evaluate_position(board, pos, false, me, them);
        let there = evaluate_position(board, partner, false, me, them);
        if here > THREAT_LINK_VALUE || there > THREAT_LINK_VALUE {
            return Some(Action::BreakEntanglement(pos));
        }
    }

    None
}

// ============================================================================
// CANDIDATE SCORING
// ============================================================================

/// Scoring context for one side on one turn
struct Scorer<'a> {
    board: &'a Board,
    team: Team,
    turn: u32,
    me: CellState,
    them: CellState,
}

impl<'a> Scorer<'a> {
    fn new(board: &'a Board, team: Team, turn: u32) -> Self {
        Self {
            board,
            team,
            turn,
            me: team.color(),
            them: team.opponent().color(),
        }
    }

    /// Cells the resolver accepts as the first selection for `kind`
    fn targets(&self, kind: ActionKind) -> impl Iterator<Item = (Pos, &'a Cell)> {
        let (team, turn) = (self.team, self.turn);
        self.board
            .iter()
            .filter(move |(_, cell)| is_legal_target(cell, kind, team, turn))
    }

    /// Attacking value of a square for us
    fn attack(&self, pos: Pos) -> f32 {
        evaluate_position(self.board, pos, true, self.me, self.them)
    }

    /// Value of a square for the opponent
    fn defend(&self, pos: Pos) -> f32 {
        evaluate_position(self.board, pos, false, self.me, self.them)
    }

    fn own_neighbors(&self, pos: Pos) -> usize {
        pos.neighbors()
            .filter(|&n| self.board.state(n) == self.me)
            .count()
    }

    /// Our confirmed cells that are free to entangle
    fn free_own_cells(&self) -> Vec<Pos> {
        self.targets(ActionKind::Entangle)
            .filter(|(_, c)| c.state == self.me)
            .map(|(p, _)| p)
            .collect()
    }
}

/// Score every legal action instance
fn collect_candidates<R: Rng + ?Sized>(
    board: &Board,
    turn: u32,
    difficulty: Difficulty,
    team: Team,
    rng: &mut R,
) -> Vec<AiAction> {
    let scorer = Scorer::new(board, team, turn);
    let mut out = Vec::new();

    measure_candidates(&scorer, difficulty, rng, &mut out);
    interfere_candidates(&scorer, difficulty, rng, &mut out);
    entangle_candidates(&scorer, difficulty, rng, &mut out);
    leap_candidates(&scorer, difficulty, rng, &mut out);
    break_candidates(&scorer, difficulty, rng, &mut out);

    out
}

fn measure_candidates<R: Rng + ?Sized>(
    s: &Scorer<'_>,
    difficulty: Difficulty,
    rng: &mut R,
    out: &mut Vec<AiAction>,
) {
    for (pos, cell) in s.targets(ActionKind::Measure) {
        let mut score = MEASURE_BASE;
        match cell.interference {
            Some(owner) if owner == s.team => score += 40.0,
            Some(_) => score -= 20.0,
            None => {}
        }

        let value = s.attack(pos);
        let adjacent = s.own_neighbors(pos);
        score += value * 2.0 + adjacent as f32 * 15.0;
        score += difficulty.jitter(rng);

        out.push(AiAction {
            action: Action::Measure(pos),
            score,
            strategy: format!("measure: value={:.0}, adjacent={}", value, adjacent),
        });
    }
}

fn interfere_candidates<R: Rng + ?Sized>(
    s: &Scorer<'_>,
    difficulty: Difficulty,
    rng: &mut R,
    out: &mut Vec<AiAction>,
) {
    for (pos, cell) in s.targets(ActionKind::Interfere) {
        let mut score = INTERFERE_BASE;
        let reason = if cell.state == s.them {
            let line = s.defend(pos);
            score += line * 1.5;
            if cell.is_entangled() {
                score += 100.0;
                format!("opponent line {:.0}, entangled", line)
            } else {
                format!("opponent line {:.0}", line)
            }
        } else if cell.state == CellState::Superposition {
            let value = s.attack(pos);
            score += value;
            format!("bias superposition {:.0}", value)
        } else {
            score -= 20.0;
            "own cell".to_string()
        };

        score += difficulty.jitter(rng);

        out.push(AiAction {
            action: Action::Interfere(pos),
            score,
            strategy: format!("interfere: {}", reason),
        });
    }
}

fn entangle_candidates<R: Rng + ?Sized>(
    s: &Scorer<'_>,
    difficulty: Difficulty,
    rng: &mut R,
    out: &mut Vec<AiAction>,
) {
    let own = s.free_own_cells();

    for (i, &a) in own.iter().enumerate() {
        for &b in &own[i + 1..] {
            let distance = a.distance_to(b);
            let (va, vb) = (s.attack(a), s.attack(b));

            let mut score = ENTANGLE_BASE + distance * 5.0 + va.max(vb);

            let (dx, dy) = (a.x.abs_diff(b.x), a.y.abs_diff(b.y));
            if (dx > 2 && dy > 2) || (dx != 0 && dy != 0) {
                score += 40.0;
            }

            score += difficulty.jitter(rng);

            out.push(AiAction {
                action: Action::Entangle(a, b),
                score,
                strategy: format!(
                    "entangle: distance={:.0}, value={:.0}",
                    distance,
                    (va + vb) / 2.0
                ),
            });
        }
    }
}

fn leap_candidates<R: Rng + ?Sized>(
    s: &Scorer<'_>,
    difficulty: Difficulty,
    rng: &mut R,
    out: &mut Vec<AiAction>,
) {
    let values: Vec<f32> = Board::positions().map(|pos| s.attack(pos)).collect();
    let value_at = |pos: Pos| values[pos.x as usize * BOARD_SIZE + pos.y as usize];

    for (from, cell) in s.targets(ActionKind::QuantumLeap) {
        let current = value_at(from);

        for (to, target) in s.board.iter() {
            if to == from || target.state == s.me {
                continue;
            }

            let value = value_at(to);
            if value <= current {
                continue;
            }

            let mut score = LEAP_BASE + (value - current) * 2.0;
            if value > 100.0 {
                score += 50.0;
            }
            if cell.is_entangled() {
                score += 60.0;
            }
            score += difficulty.jitter(rng);

            out.push(AiAction {
                action: Action::QuantumLeap { from, to },
                score,
                strategy: format!("leap: {:.0} -> {:.0}", current, value),
            });
        }
    }
}

fn break_candidates<R: Rng + ?Sized>(
    s: &Scorer<'_>,
    difficulty: Difficulty,
    rng: &mut R,
    out: &mut Vec<AiAction>,
) {
    let free_own = s.free_own_cells().len();

    for (pos, cell) in s.targets(ActionKind::BreakEntanglement) {
        let partner = match cell.link {
            Some(p) => p,
            None => continue,
        };

        let mut score = BREAK_BASE;
        let reason = if cell.state == s.them {
            let total = s.defend(pos) + s.defend(partner);
            score += total;
            format!("opponent link {:.0}", total)
        } else {
            score -= 20.0;
            if free_own <= 2 {
                score -= 50.0;
            }
            "own link".to_string()
        };

        score += difficulty.jitter(rng);

        out.push(AiAction {
            action: Action::BreakEntanglement(pos),
            score,
            strategy: format!("break: {}", reason),
        });
    }
}

// ============================================================================
// TESTS
// ============================================================================
