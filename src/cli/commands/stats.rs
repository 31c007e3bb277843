//! Stats command - report on logged games and learned state

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    analysis::LearningReport,
    cli::{
        commands::{StorageArgs, ensure_parent_dir},
        output::{format_percent, print_kv, print_section, print_subsection, print_stats_table},
    },
};

#[derive(Parser, Debug)]
#[command(about = "Show learning and game-log statistics")]
pub struct StatsArgs {
    #[command(flatten)]
    pub storage: StorageArgs,

    /// Optional path for the full report as pretty-printed JSON
    #[arg(long)]
    pub json: Option<PathBuf>,
}

pub fn execute(args: StatsArgs) -> Result<()> {
    let app = args.storage.app(None)?;
    let catalog = app
        .load_catalog(&args.storage.data_dir)
        .with_context(|| format!("failed to load catalog from {}", args.storage.data_dir.display()))?;
    let paths = args.storage.state_paths();

    let learning = app.load_learning(&catalog, &paths);
    let report = LearningReport::build(&catalog, &learning);

    print_section("Game Log");
    print_stats_table(&[
        ("Games logged", report.log.total_games.to_string()),
        (
            "Wins / losses",
            format!("{} / {}", report.log.wins, report.log.losses),
        ),
        ("Success rate", format_percent(report.log.success_rate)),
        (
            "Avg questions (wins)",
            format!("{:.1}", report.log.average_questions),
        ),
        (
            "Wrong guesses",
            report.log.total_wrong_guesses.to_string(),
        ),
        (
            "Avg efficiency",
            format!("{:.3}", report.log.average_efficiency),
        ),
    ]);

    print_subsection("History learner");
    print_kv(
        "Learning active",
        if report.history.learning_active {
            "yes"
        } else {
            "no"
        },
    );
    if !report.history.most_picked.is_empty() {
        println!("  Most picked:");
        for (entity, count) in &report.history.most_picked {
            println!("    {entity:24} {count}");
        }
    }
    if !report.top_traits.is_empty() {
        println!("  Top traits (effectiveness / boost):");
        for row in &report.top_traits {
            println!(
                "    {:24} {:.3} / {:.2}x",
                row.trait_id.to_string(),
                row.effectiveness,
                row.boost
            );
        }
    }

    if let Some(agent) = &report.agent {
        print_subsection("Policy agent");
        print_stats_table(&[
            ("Episodes", agent.episodes.to_string()),
            ("Epsilon", format!("{:.3}", agent.epsilon)),
            ("Q-table entries", agent.q_table_size.to_string()),
            ("States visited", agent.unique_states.to_string()),
            (
                "Learning active",
                if agent.learning_active { "yes" } else { "no" }.to_string(),
            ),
        ]);
    }

    if !report.unsettled.is_empty() {
        print_subsection("Least settled calibration cells");
        for cell in &report.unsettled {
            println!(
                "    {} × {} (posterior entropy {:.3})",
                cell.entity, cell.question, cell.entropy
            );
        }
    }

    if let Some(json_path) = &args.json {
        ensure_parent_dir(json_path)?;
        let file = std::fs::File::create(json_path)
            .with_context(|| format!("failed to create {}", json_path.display()))?;
        serde_json::to_writer_pretty(file, &report).context("failed to serialize the report")?;
        println!("\nReport written to {}", json_path.display());
    }

    Ok(())
}
