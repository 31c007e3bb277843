//! inquest CLI - adaptive character-guessing engine
//!
//! This CLI provides a unified interface for:
//! - Playing interactive guessing games
//! - Training the learning components through self-play
//! - Evaluating the engine against a scripted oracle
//! - Inspecting learned state and game-log statistics
//! - Exporting data for further analysis

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "inquest")]
#[command(version, about = "Adaptive character-guessing engine", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play an interactive guessing game
    Play(inquest::cli::commands::play::PlayArgs),

    /// Train the learners through self-play
    Train(inquest::cli::commands::train::TrainArgs),

    /// Evaluate the engine against a scripted oracle
    Simulate(inquest::cli::commands::simulate::SimulateArgs),

    /// Show learning and game-log statistics
    Stats(inquest::cli::commands::stats::StatsArgs),

    /// Export the game log or the learned trait table
    Export(inquest::cli::commands::export::ExportArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Play(args) => inquest::cli::commands::play::execute(args),
        Commands::Train(args) => inquest::cli::commands::train::execute(args),
        Commands::Simulate(args) => inquest::cli::commands::simulate::execute(args),
        Commands::Stats(args) => inquest::cli::commands::stats::execute(args),
        Commands::Export(args) => inquest::cli::commands::export::execute(args),
    }
}
