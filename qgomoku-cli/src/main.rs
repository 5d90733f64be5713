//! Quantum Gomoku CLI - Command-line interface
//!
//! Commands:
//! - play: Play on the terminal against the AI or a friend
//! - match: Run AI versus AI games and report statistics

mod match_cmd;
mod play_cmd;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use match_cmd::MatchArgs;
use play_cmd::PlayArgs;

#[derive(Parser)]
#[command(name = "qgomoku")]
#[command(about = "Quantum Gomoku: five in a row with superposition and entanglement")]
struct Cli {
    /// Random seed for reproducible games
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play an interactive game
    Play(PlayArgs),
    /// Play AI versus AI games
    Match(MatchArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    match cli.command {
        Commands::Play(args) => play_cmd::run(args, cli.seed),
        Commands::Match(args) => match_cmd::run(args, cli.seed),
    }
}

/// Log to stderr so the board on stdout stays readable; RUST_LOG overrides
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
