//! Simulate command - evaluation sweep against the scripted oracle
//!
//! Unlike `train`, a simulation leaves persisted state untouched: it
//! measures how the engine plays right now, without checkpointing or
//! extending the game log.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    cli::{
        commands::{StorageArgs, ensure_parent_dir},
        output::{format_percent, print_section, print_stats_table},
    },
    pipeline::{ProgressObserver, SelectionMode, SimulationConfig, SimulationPipeline},
};

#[derive(Parser, Debug)]
#[command(about = "Evaluate the engine against a scripted oracle")]
pub struct SimulateArgs {
    #[command(flatten)]
    pub storage: StorageArgs,

    /// Number of evaluation games
    #[arg(long, short = 'g', default_value_t = 100)]
    pub games: usize,

    /// Probability that the oracle flips a truthful answer
    #[arg(long, default_value_t = 0.1)]
    pub noise: f64,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Question selection mode (information_gain or agent_policy)
    #[arg(long, short = 'm', default_value = "information_gain")]
    pub mode: SelectionMode,

    /// Show progress bar
    #[arg(long, default_value_t = true)]
    pub progress: bool,

    /// Optional path for a JSON run summary
    #[arg(long)]
    pub summary: Option<PathBuf>,
}

pub fn execute(args: SimulateArgs) -> Result<()> {
    anyhow::ensure!(
        (0.0..=1.0).contains(&args.noise),
        "--noise must lie in [0, 1], got {}",
        args.noise
    );

    let app = args.storage.app(args.seed)?;
    let catalog = app
        .load_catalog(&args.storage.data_dir)
        .with_context(|| format!("failed to load catalog from {}", args.storage.data_dir.display()))?;
    let paths = args.storage.state_paths();
    let mut engine = app.build_engine(Arc::clone(&catalog), &paths);

    print_section("Evaluation Sweep");
    print_stats_table(&[
        ("Games", args.games.to_string()),
        ("Selection mode", args.mode.to_string()),
        ("Answer noise", format_percent(args.noise)),
        (
            "Catalog",
            format!(
                "{} characters, {} questions",
                catalog.entity_count(),
                catalog.question_count()
            ),
        ),
    ]);
    println!();

    let config = SimulationConfig {
        num_games: args.games,
        seed: args.seed,
        noise: args.noise,
        mode: args.mode,
        // Evaluation plays the greedy policy.
        explore: false,
    };

    let mut pipeline = SimulationPipeline::new(config);
    if args.progress {
        pipeline = pipeline.with_observer(Box::new(ProgressObserver::new()));
    }

    let result = pipeline.run(&mut engine).context("evaluation run failed")?;

    print_section("Evaluation Results");
    print_stats_table(&[
        ("Total games", result.total_games.to_string()),
        (
            "Wins",
            format!("{} ({})", result.wins, format_percent(result.win_rate)),
        ),
        (
            "Losses",
            format!("{} ({})", result.losses, format_percent(result.loss_rate)),
        ),
        ("Avg questions", format!("{:.1}", result.avg_questions)),
    ]);

    if let Some(summary_path) = &args.summary {
        ensure_parent_dir(summary_path)?;
        result
            .save(summary_path)
            .context("failed to write the run summary")?;
        println!("\nSummary written to {}", summary_path.display());
    }

    Ok(())
}
