//! CSV and JSON export of game logs and trait effectiveness

use std::{fs::File, io::BufWriter, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    analysis::{TraitReport, rank_traits},
    history::{GameRecord, HistoryLearner},
};

/// One game as a flat export row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRow {
    pub timestamp: u64,
    /// Empty when the player never revealed their character.
    pub target: String,
    pub success: bool,
    pub questions: usize,
    pub wrong_guesses: usize,
    pub efficiency: f64,
}

impl GameRow {
    fn from_record(record: &GameRecord) -> Self {
        Self {
            timestamp: record.timestamp,
            target: record
                .target
                .as_ref()
                .map(|id| id.to_string())
                .unwrap_or_default(),
            success: record.success,
            questions: record.questions_asked(),
            wrong_guesses: record.wrong_guesses.len(),
            efficiency: record.efficiency,
        }
    }
}

/// Exporter for the game history log
pub struct GameLogExporter;

impl GameLogExporter {
    /// Export logged games to CSV, one row per game.
    ///
    /// # Returns
    /// Number of rows written
    pub fn export_csv(games: &[GameRecord], path: &Path) -> Result<usize> {
        let mut writer = csv::Writer::from_path(path)?;
        for record in games {
            writer.serialize(GameRow::from_record(record))?;
        }
        writer.flush()?;
        Ok(games.len())
    }

    /// Export logged games as a pretty-printed JSON array.
    ///
    /// # Returns
    /// Number of rows written
    pub fn export_json(games: &[GameRecord], path: &Path) -> Result<usize> {
        let rows: Vec<GameRow> = games.iter().map(GameRow::from_record).collect();
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &rows)?;
        Ok(rows.len())
    }
}

/// Exporter for the learned trait effectiveness table
pub struct TraitTableExporter;

impl TraitTableExporter {
    /// Export every scored trait to CSV, strongest first.
    ///
    /// # Returns
    /// Number of rows written
    pub fn export_csv(learner: &HistoryLearner, path: &Path) -> Result<usize> {
        let rows = Self::rows(learner);
        let mut writer = csv::Writer::from_path(path)?;
        for row in &rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(rows.len())
    }

    /// Export every scored trait as a pretty-printed JSON array.
    ///
    /// # Returns
    /// Number of rows written
    pub fn export_json(learner: &HistoryLearner, path: &Path) -> Result<usize> {
        let rows = Self::rows(learner);
        let writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(writer, &rows)?;
        Ok(rows.len())
    }

    fn rows(learner: &HistoryLearner) -> Vec<TraitReport> {
        rank_traits(learner, usize::MAX)
    }
}
