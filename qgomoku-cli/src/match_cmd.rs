//! Match command - play games between two AI players
//!
//! ## Architecture (4-layer granularity)
//!
//! - Level 1: run() - orchestration
//! - Level 2: build_config(), play_match(), report_results()
//! - Level 3: (delegated to qgomoku-selfplay crate)
//! - Level 4: formatting utilities

use anyhow::{bail, Result};
use clap::Args;
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use qgomoku_core::{Difficulty, Outcome, Team};
use qgomoku_selfplay::{play_match, MatchConfig, MatchResult};

// ============================================================================
// COMMAND ARGUMENTS (Level 4 - Configuration)
// ============================================================================

#[derive(Args)]
pub struct MatchArgs {
    /// Number of games to play
    #[arg(long, default_value = "10")]
    pub games: usize,

    /// Wave AI difficulty (easy, medium, hard)
    #[arg(long, default_value = "medium")]
    pub wave: Difficulty,

    /// Particle AI difficulty (easy, medium, hard)
    #[arg(long, default_value = "medium")]
    pub particle: Difficulty,

    /// Turn limit per game
    #[arg(long, default_value = "200")]
    pub max_turns: u32,

    /// Run games in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

// ============================================================================
// LEVEL 1 - ORCHESTRATION
// ============================================================================

/// Run match command
///
/// This function reads like a table of contents:
/// 1. Build the match configuration
/// 2. Play the match (multiple games)
/// 3. Report results
pub fn run(args: MatchArgs, seed: Option<u64>) -> Result<()> {
    let config = build_config(&args, seed)?;

    tracing::info!(
        "Starting match: Wave ({}) vs Particle ({}), {} games, seed {}",
        config.wave,
        config.particle,
        config.games,
        config.seed.unwrap_or_default()
    );

    let result = play_match(&config);

    report_results(&result, &args);

    Ok(())
}

// ============================================================================
// LEVEL 2 - PHASES
// ============================================================================

/// Translate arguments into a match configuration
fn build_config(args: &MatchArgs, seed: Option<u64>) -> Result<MatchConfig> {
    if args.games == 0 {
        bail!("--games must be at least 1");
    }
    if args.max_turns == 0 {
        bail!("--max-turns must be at least 1");
    }

    let base_seed = create_rng(seed).next_u64();

    Ok(MatchConfig::new(args.games)
        .with_difficulties(args.wave, args.particle)
        .with_max_turns(args.max_turns)
        .with_seed(base_seed)
        .with_parallel(args.parallel))
}

/// Report match results
fn report_results(result: &MatchResult, args: &MatchArgs) {
    if args.json {
        print_json_results(result, args);
    } else {
        print_text_results(result);
    }
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

fn outcome_label(outcome: Option<Outcome>) -> String {
    match outcome {
        Some(Outcome::Win(team)) => format!("{} wins", team),
        Some(Outcome::Draw) => "Draw".to_string(),
        None => "Unfinished".to_string(),
    }
}

fn percent(count: u32, total: u32) -> f32 {
    if total > 0 {
        count as f32 / total as f32 * 100.0
    } else {
        0.0
    }
}

/// Print results as JSON
fn print_json_results(result: &MatchResult, args: &MatchArgs) {
    #[derive(serde::Serialize)]
    struct JsonGame {
        game_number: usize,
        result: String,
        turns: u32,
        passes: u32,
        actions: usize,
    }

    #[derive(serde::Serialize)]
    struct JsonOutput {
        total_games: u32,
        wave: Difficulty,
        particle: Difficulty,
        wave_wins: u32,
        particle_wins: u32,
        draws: u32,
        unfinished: u32,
        avg_turns: f32,
        wave_win_rate: f32,
        games: Vec<JsonGame>,
    }

    let output = JsonOutput {
        total_games: result.games_played,
        wave: args.wave,
        particle: args.particle,
        wave_wins: result.wave_wins,
        particle_wins: result.particle_wins,
        draws: result.draws,
        unfinished: result.unfinished,
        avg_turns: result.avg_turns,
        wave_win_rate: result.win_rate(Team::Wave),
        games: result
            .games
            .iter()
            .enumerate()
            .map(|(i, g)| JsonGame {
                game_number: i + 1,
                result: outcome_label(g.outcome),
                turns: g.turns,
                passes: g.passes,
                actions: g.actions.len(),
            })
            .collect(),
    };

    if let Ok(json) = serde_json::to_string_pretty(&output) {
        println!("{}", json);
    }
}

/// Print results as text
fn print_text_results(result: &MatchResult) {
    let total = result.games_played;

    println!("\n=== Match Results ===");
    println!("Total games:    {}", total);
    println!(
        "Wave wins:      {} ({:.1}%)",
        result.wave_wins,
        percent(result.wave_wins, total)
    );
    println!(
        "Particle wins:  {} ({:.1}%)",
        result.particle_wins,
        percent(result.particle_wins, total)
    );
    println!(
        "Draws:          {} ({:.1}%)",
        result.draws,
        percent(result.draws, total)
    );
    println!(
        "Unfinished:     {} ({:.1}%)",
        result.unfinished,
        percent(result.unfinished, total)
    );
    println!("Average turns:  {:.1}", result.avg_turns);

    println!("\n--- Games ---");
    for (i, game) in result.games.iter().enumerate() {
        println!(
            "Game {:3}: {:<14} {:3} turns, {} passes",
            i + 1,
            outcome_label(game.outcome),
            game.turns,
            game.passes
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn args(games: usize) -> MatchArgs {
        MatchArgs {
            games,
            wave: Difficulty::Easy,
            particle: Difficulty::Hard,
            max_turns: 50,
            parallel: false,
            json: false,
        }
    }

    #[test]
    fn test_build_config() {
        let config = build_config(&args(4), Some(7)).unwrap();
        assert_eq!(config.games, 4);
        assert_eq!(config.wave, Difficulty::Easy);
        assert_eq!(config.particle, Difficulty::Hard);
        assert_eq!(config.max_turns, 50);
        assert!(!config.parallel);
    }

    #[test]
    fn test_seeded_config_is_reproducible() {
        let a = build_config(&args(2), Some(7)).unwrap();
        let b = build_config(&args(2), Some(7)).unwrap();
        assert_eq!(a.seed, b.seed);
    }

    #[test]
    fn test_zero_games_rejected() {
        assert!(build_config(&args(0), None).is_err());
    }

    #[test]
    fn test_outcome_label() {
        assert_eq!(outcome_label(Some(Outcome::Win(Team::Wave))), "Wave wins");
        assert_eq!(outcome_label(Some(Outcome::Draw)), "Draw");
        assert_eq!(outcome_label(None), "Unfinished");
    }

    #[test]
    fn test_percent() {
        assert_eq!(percent(1, 4), 25.0);
        assert_eq!(percent(3, 0), 0.0);
    }
}
