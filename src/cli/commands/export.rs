//! Export command - game log and trait effectiveness in CSV or JSON

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};

use crate::{
    cli::commands::{StorageArgs, ensure_parent_dir},
    export::{GameLogExporter, TraitTableExporter},
    history::HistoryLearner,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExportKind {
    /// One row per logged game
    Games,
    /// Learned per-trait effectiveness, strongest first
    Traits,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

#[derive(Parser, Debug)]
#[command(about = "Export the game log or the learned trait table")]
pub struct ExportArgs {
    #[command(flatten)]
    pub storage: StorageArgs,

    /// What to export
    #[arg(value_enum)]
    pub kind: ExportKind,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value_t = ExportFormat::Csv)]
    pub format: ExportFormat,

    /// Output file
    #[arg(long, short = 'o')]
    pub output: PathBuf,
}

pub fn execute(args: ExportArgs) -> Result<()> {
    let app = args.storage.app(None)?;
    let paths = args.storage.state_paths();

    let games = app
        .repository()
        .load_games(&paths.game_log)
        .context("failed to read the game log")?;

    ensure_parent_dir(&args.output)?;
    let rows = match (args.kind, args.format) {
        (ExportKind::Games, ExportFormat::Csv) => GameLogExporter::export_csv(&games, &args.output),
        (ExportKind::Games, ExportFormat::Json) => {
            GameLogExporter::export_json(&games, &args.output)
        }
        (ExportKind::Traits, ExportFormat::Csv) => {
            TraitTableExporter::export_csv(&HistoryLearner::from_records(games), &args.output)
        }
        (ExportKind::Traits, ExportFormat::Json) => {
            TraitTableExporter::export_json(&HistoryLearner::from_records(games), &args.output)
        }
    }
    .context("export failed")?;

    println!("Wrote {} row(s) to {}", rows, args.output.display());
    Ok(())
}
