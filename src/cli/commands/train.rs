//! Train command - self-play training of the learning components

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    cli::{
        commands::{StorageArgs, ensure_parent_dir},
        output::{format_percent, print_section, print_stats_table},
    },
    history::GameRecord,
    pipeline::{
        CheckpointConfig, JsonlObserver, ProgressObserver, SelectionMode, SimulationConfig,
        SimulationPipeline,
    },
    ports::{GameObserver, LearningRepository},
};

#[derive(Parser, Debug)]
#[command(about = "Train the learners through self-play")]
pub struct TrainArgs {
    #[command(flatten)]
    pub storage: StorageArgs,

    /// Number of training games
    #[arg(long, short = 'g', default_value_t = 500)]
    pub games: usize,

    /// Probability that the oracle flips a truthful answer
    #[arg(long, default_value_t = 0.1)]
    pub noise: f64,

    /// Random seed for reproducibility
    #[arg(long)]
    pub seed: Option<u64>,

    /// Question selection mode (information_gain or agent_policy)
    #[arg(long, short = 'm', default_value = "agent_policy")]
    pub mode: SelectionMode,

    /// Disable epsilon-greedy exploration
    #[arg(long, default_value_t = false)]
    pub no_explore: bool,

    /// Games between state checkpoints
    #[arg(long, default_value_t = 5)]
    pub checkpoint_interval: usize,

    /// Show progress bar
    #[arg(long, default_value_t = true)]
    pub progress: bool,

    /// Optional file for JSONL per-game observations
    #[arg(long)]
    pub observations: Option<PathBuf>,

    /// Optional path for a JSON run summary
    #[arg(long)]
    pub summary: Option<PathBuf>,
}

/// Appends every finished game to the persistent log as it completes.
struct GameLogObserver {
    repository: Arc<dyn LearningRepository + Send + Sync>,
    path: PathBuf,
}

impl GameObserver for GameLogObserver {
    fn on_game_end(&mut self, _game_num: usize, record: &GameRecord) -> crate::Result<()> {
        self.repository.append_game(record, &self.path)
    }
}

pub fn execute(args: TrainArgs) -> Result<()> {
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

    print_section("Self-Play Training");
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
        (
            "Prior games logged",
            engine.learning().history.game_count().to_string(),
        ),
    ]);
    println!();

    let config = SimulationConfig {
        num_games: args.games,
        seed: args.seed,
        noise: args.noise,
        mode: args.mode,
        explore: !args.no_explore,
    };

    let checkpoints = CheckpointConfig::new(
        app.repository(),
        paths.policy.clone(),
        paths.calibration.clone(),
    )
    .with_interval(args.checkpoint_interval);

    let mut pipeline = SimulationPipeline::new(config)
        .with_checkpoints(checkpoints)
        .with_observer(Box::new(GameLogObserver {
            repository: app.repository(),
            path: paths.game_log.clone(),
        }));
    if args.progress {
        pipeline = pipeline.with_observer(Box::new(ProgressObserver::new()));
    }
    if let Some(observations_path) = &args.observations {
        ensure_parent_dir(observations_path)?;
        let jsonl = JsonlObserver::new(observations_path)
            .context("failed to open the observations file")?;
        pipeline = pipeline.with_observer(Box::new(jsonl));
    }

    let result = pipeline.run(&mut engine).context("training run failed")?;

    print_section("Training Complete");
    let mut rows = vec![
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
    ];
    if let Some(agent) = &engine.learning().agent {
        rows.push(("Episodes", agent.episodes().to_string()));
        rows.push(("Epsilon", format!("{:.3}", agent.epsilon())));
        rows.push(("Q-table entries", agent.q_table_size().to_string()));
    }
    print_stats_table(&rows);

    if let Some(summary_path) = &args.summary {
        ensure_parent_dir(summary_path)?;
        result
            .save(summary_path)
            .context("failed to write the run summary")?;
        println!("\nSummary written to {}", summary_path.display());
    }

    Ok(())
}
