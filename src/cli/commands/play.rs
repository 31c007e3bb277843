//! Play command - interactive guessing game on the terminal

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use clap::Parser;

use crate::{
    cli::{
        commands::StorageArgs,
        output::{format_percent, print_kv, print_section},
    },
    engine::{Engine, Prompt, SessionState},
    types::Answer,
};

#[derive(Parser, Debug)]
#[command(about = "Play an interactive guessing game")]
pub struct PlayArgs {
    #[command(flatten)]
    pub storage: StorageArgs,

    /// Question budget per game
    #[arg(long, short = 'q', default_value_t = 25)]
    pub max_questions: usize,

    /// Random seed for the policy agent's exploration
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Read one trimmed line, or `None` on end of input.
fn prompt_line(prompt: &str) -> Result<Option<String>> {
    print!("{prompt}");
    std::io::stdout().flush().context("failed to flush stdout")?;

    let mut line = String::new();
    let read = std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn read_answer(text: &str, confirmation: bool) -> Result<Option<Answer>> {
    let prefix = if confirmation { "Just to confirm: " } else { "" };
    loop {
        let Some(line) = prompt_line(&format!("{prefix}{text} "))? else {
            return Ok(None);
        };
        if line.eq_ignore_ascii_case("quit") || line.eq_ignore_ascii_case("q") {
            return Ok(None);
        }
        match line.parse::<Answer>() {
            Ok(answer) => return Ok(Some(answer)),
            Err(error) => println!("{error}"),
        }
    }
}

fn read_yes_no(prompt: &str) -> Result<Option<bool>> {
    loop {
        let Some(line) = prompt_line(prompt)? else {
            return Ok(None);
        };
        match line.to_ascii_lowercase().as_str() {
            "y" | "yes" => return Ok(Some(true)),
            "n" | "no" => return Ok(Some(false)),
            "quit" | "q" => return Ok(None),
            _ => println!("Please answer yes or no."),
        }
    }
}

/// Drive one game to completion. Returns false when the player quit.
fn play_one(engine: &mut Engine) -> Result<bool> {
    loop {
        match engine.next_prompt() {
            Prompt::Ask {
                question_ix,
                confirmation,
            } => {
                let text = engine.catalog().question(question_ix).text().to_string();
                let number = engine.snapshot().questions_asked + 1;
                let Some(answer) = read_answer(&format!("Q{number}. {text}"), confirmation)?
                else {
                    return Ok(false);
                };
                engine.answer_question(question_ix, answer);
            }
            Prompt::Guess {
                entity_ix,
                confidence,
                ..
            } => {
                let name = engine.catalog().entity(entity_ix).id().to_string();
                let prompt =
                    format!("My guess: {name} ({}). Am I right? ", format_percent(confidence));
                let Some(correct) = read_yes_no(&prompt)? else {
                    return Ok(false);
                };
                engine.report_guess(entity_ix, correct);
            }
            Prompt::Done => return Ok(true),
        }
    }
}

fn finish_game(engine: &mut Engine) -> Result<()> {
    match engine.state() {
        SessionState::GuessedCorrect { entity_ix } => {
            let name = engine.catalog().entity(entity_ix).id().to_string();
            println!("\nGot it: {name}!");
        }
        _ => {
            println!("\nYou win, I couldn't work it out.");
            if let Some(line) = prompt_line("Who were you thinking of? (enter to skip) ")? {
                if !line.is_empty() {
                    match engine.reveal_target(&line) {
                        Some(entity_ix) => {
                            let name = engine.catalog().entity(entity_ix).id().to_string();
                            println!("Noted: {name}. I'll remember that.");
                        }
                        None => {
                            println!("'{line}' isn't in my catalog, so this game won't teach me.")
                        }
                    }
                }
            }
        }
    }

    let snapshot = engine.snapshot();
    print_kv("Questions asked", &snapshot.questions_asked.to_string());
    print_kv(
        "Remaining candidates",
        &snapshot.remaining_candidates.to_string(),
    );
    Ok(())
}

pub fn execute(args: PlayArgs) -> Result<()> {
    let config = args.storage.load_config()?.with_max_questions(args.max_questions);
    let app = args.storage.app_with_config(args.seed, config)?;
    let catalog = app
        .load_catalog(&args.storage.data_dir)
        .with_context(|| format!("failed to load catalog from {}", args.storage.data_dir.display()))?;
    let paths = args.storage.state_paths();

    print_section("inquest");
    println!("Think of a character from my catalog and answer honestly.");
    println!("Answers: yes, no, probably, probably_not, unknown ('quit' to stop)");
    println!(
        "Catalog: {} characters, {} questions",
        catalog.entity_count(),
        catalog.question_count()
    );

    loop {
        let mut engine = app.build_engine(catalog.clone(), &paths);
        println!();

        let completed = play_one(&mut engine)?;
        if !completed {
            println!("\nGame abandoned.");
            return Ok(());
        }

        finish_game(&mut engine)?;

        let record = engine.log_game();
        app.repository()
            .append_game(&record, &paths.game_log)
            .context("failed to append to the game log")?;
        app.save_learning(&engine, &paths)
            .context("failed to save learned state")?;

        match read_yes_no("\nPlay again? ")? {
            Some(true) => continue,
            _ => return Ok(()),
        }
    }
}
