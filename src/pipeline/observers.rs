//! Observer pattern for simulation runs
//!
//! Observers allow composable data collection during a run without coupling
//! the game loop to specific output formats.

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    catalog::Question,
    history::GameRecord,
    ports::GameObserver,
    types::{Answer, TurnSnapshot},
};

/// Observation of a single question during a game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepObservation {
    /// Game number
    pub game_num: usize,
    /// Question number within game
    pub step_num: usize,
    /// Question id
    pub question: String,
    /// Trait the question asks about
    pub trait_id: String,
    /// Answer given
    pub answer: Answer,
    /// Belief entropy after the update, in bits
    pub entropy: f64,
    /// Probability of the leading candidate after the update
    pub top_probability: f64,
    /// Candidates still plausible after the update
    pub remaining_candidates: usize,
}

/// Complete observation of a simulated game
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    /// Game number
    pub game_num: usize,
    /// Whether the target was guessed correctly
    pub success: bool,
    /// The hidden target, when known
    pub target: Option<String>,
    /// Incorrect guesses made along the way
    pub wrong_guesses: usize,
    /// Total questions asked
    pub total_questions: usize,
    /// Questions in the game
    pub steps: Vec<StepObservation>,
}

/// Progress bar observer - Shows run progress
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    wins: usize,
    losses: usize,
}

impl ProgressObserver {
    /// Create a new progress observer
    pub fn new() -> Self {
        Self {
            progress_bar: None,
            wins: 0,
            losses: 0,
        }
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl GameObserver for ProgressObserver {
    fn on_run_start(&mut self, total_games: usize) -> Result<()> {
        let pb = ProgressBar::new(total_games as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} games (W:{msg})")
                .map_err(|e| crate::Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_game_end(&mut self, game_num: usize, record: &GameRecord) -> Result<()> {
        if record.success {
            self.wins += 1;
        } else {
            self.losses += 1;
        }

        if let Some(pb) = &self.progress_bar {
            pb.set_position(game_num as u64 + 1);
            pb.set_message(format!("{} L:{}", self.wins, self.losses));
        }
        Ok(())
    }

    fn on_run_end(&mut self) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message(format!("{} L:{}", self.wins, self.losses));
        }
        Ok(())
    }
}

/// Metrics observer - Tracks run metrics
pub struct MetricsObserver {
    wins: usize,
    losses: usize,
    total_games: usize,
    question_counts: Vec<usize>,
}

impl MetricsObserver {
    /// Create a new metrics observer
    pub fn new() -> Self {
        Self {
            wins: 0,
            losses: 0,
            total_games: 0,
            question_counts: Vec::new(),
        }
    }

    /// Get current win rate
    pub fn win_rate(&self) -> f64 {
        if self.total_games == 0 {
            0.0
        } else {
            self.wins as f64 / self.total_games as f64
        }
    }

    /// Get current loss rate
    pub fn loss_rate(&self) -> f64 {
        if self.total_games == 0 {
            0.0
        } else {
            self.losses as f64 / self.total_games as f64
        }
    }

    /// Get average questions per game
    pub fn avg_questions(&self) -> f64 {
        if self.question_counts.is_empty() {
            0.0
        } else {
            self.question_counts.iter().sum::<usize>() as f64 / self.question_counts.len() as f64
        }
    }

    /// Get metrics summary
    pub fn summary(&self) -> MetricsSummary {
        MetricsSummary {
            total_games: self.total_games,
            wins: self.wins,
            losses: self.losses,
            win_rate: self.win_rate(),
            loss_rate: self.loss_rate(),
            avg_questions: self.avg_questions(),
        }
    }
}

/// Summary of run metrics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSummary {
    pub total_games: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
    pub loss_rate: f64,
    pub avg_questions: f64,
}

impl Default for MetricsObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl GameObserver for MetricsObserver {
    fn on_game_start(&mut self, _game_num: usize) -> Result<()> {
        self.question_counts.push(0);
        Ok(())
    }

    fn on_step(
        &mut self,
        _game_num: usize,
        _step_num: usize,
        _question: &Question,
        _answer: Answer,
        _snapshot: &TurnSnapshot,
    ) -> Result<()> {
        if let Some(last) = self.question_counts.last_mut() {
            *last += 1;
        }
        Ok(())
    }

    fn on_game_end(&mut self, _game_num: usize, record: &GameRecord) -> Result<()> {
        self.total_games += 1;
        if record.success {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        Ok(())
    }
}

/// JSONL observer - Exports observations to JSON Lines format
pub struct JsonlObserver {
    writer: BufWriter<File>,
    current_game_steps: Vec<StepObservation>,
    current_game_num: usize,
}

impl JsonlObserver {
    /// Create a new JSONL observer
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        Ok(Self {
            writer,
            current_game_steps: Vec::new(),
            current_game_num: 0,
        })
    }
}

impl GameObserver for JsonlObserver {
    fn on_game_start(&mut self, game_num: usize) -> Result<()> {
        self.current_game_num = game_num;
        self.current_game_steps.clear();
        Ok(())
    }

    fn on_step(
        &mut self,
        game_num: usize,
        step_num: usize,
        question: &Question,
        answer: Answer,
        snapshot: &TurnSnapshot,
    ) -> Result<()> {
        self.current_game_steps.push(StepObservation {
            game_num,
            step_num,
            question: question.id().to_string(),
            trait_id: question.trait_id().to_string(),
            answer,
            entropy: snapshot.entropy,
            top_probability: snapshot.top_probability,
            remaining_candidates: snapshot.remaining_candidates,
        });
        Ok(())
    }

    fn on_game_end(&mut self, _game_num: usize, record: &GameRecord) -> Result<()> {
        let observation = Observation {
            game_num: self.current_game_num,
            success: record.success,
            target: record.target.as_ref().map(|id| id.to_string()),
            wrong_guesses: record.wrong_guesses.len(),
            total_questions: self.current_game_steps.len(),
            steps: self.current_game_steps.clone(),
        };

        // Write as JSONL (one JSON object per line)
        serde_json::to_writer(&mut self.writer, &observation)?;
        writeln!(&mut self.writer)?;
        self.writer.flush()?;

        Ok(())
    }
}
