//! Statistical analysis of game logs and learned state

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{
    catalog::Catalog,
    engine::Learning,
    history::{GameRecord, HistoryLearner, HistoryStats},
    identifiers::{EntityId, QuestionId, TraitId},
    likelihoods::CalibrationMap,
    q_learning::AgentStats,
};

/// Trait rows included in a [`LearningReport`].
const TOP_TRAIT_ROWS: usize = 10;

/// Calibration cells included in a [`LearningReport`].
const UNSETTLED_ROWS: usize = 5;

/// Complete analysis of a game log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameLogAnalysis {
    pub total_games: usize,
    pub wins: usize,
    pub losses: usize,
    pub success_rate: f64,
    /// Average question count over won games only.
    pub average_questions: f64,
    pub total_wrong_guesses: usize,
    /// Mean of per-game efficiency (1 / questions for wins, 0 for losses).
    pub average_efficiency: f64,
    pub length_histogram: HashMap<usize, usize>,
}

impl GameLogAnalysis {
    /// Aggregate a slice of logged games.
    pub fn analyze(games: &[GameRecord]) -> Self {
        let mut analysis = GameLogAnalysis {
            total_games: games.len(),
            wins: 0,
            losses: 0,
            success_rate: 0.0,
            average_questions: 0.0,
            total_wrong_guesses: 0,
            average_efficiency: 0.0,
            length_histogram: HashMap::new(),
        };

        let mut won_questions = 0;
        for game in games {
            if game.success {
                analysis.wins += 1;
                won_questions += game.questions_asked();
            } else {
                analysis.losses += 1;
            }
            analysis.total_wrong_guesses += game.wrong_guesses.len();
            *analysis
                .length_histogram
                .entry(game.questions_asked())
                .or_insert(0) += 1;
        }

        if analysis.total_games > 0 {
            analysis.success_rate = analysis.wins as f64 / analysis.total_games as f64;
            analysis.average_efficiency = games.iter().map(|game| game.efficiency).sum::<f64>()
                / analysis.total_games as f64;
        }
        if analysis.wins > 0 {
            analysis.average_questions = won_questions as f64 / analysis.wins as f64;
        }

        analysis
    }
}

/// One trait's learned standing in the history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraitReport {
    pub trait_id: TraitId,
    /// Effectiveness score in the 0 to 2 range.
    pub effectiveness: f64,
    /// Multiplier the selector currently applies to this trait.
    pub boost: f64,
}

/// Rank learned trait effectiveness, strongest first.
pub fn rank_traits(learner: &HistoryLearner, limit: usize) -> Vec<TraitReport> {
    let mut rows: Vec<TraitReport> = learner
        .question_effectiveness()
        .iter()
        .map(|(trait_id, &effectiveness)| TraitReport {
            trait_id: trait_id.clone(),
            effectiveness,
            boost: learner.question_boost(trait_id),
        })
        .collect();
    rows.sort_by(|a, b| {
        b.effectiveness
            .partial_cmp(&a.effectiveness)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.trait_id.cmp(&b.trait_id))
    });
    rows.truncate(limit);
    rows
}

/// A calibration cell whose posterior is still wide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnsettledCell {
    pub entity: EntityId,
    pub question: QuestionId,
    /// Differential entropy of the cell's Beta posterior, in nats.
    pub entropy: f64,
}

/// Resolve the least settled calibration cells to catalog ids.
pub fn unsettled_cells(map: &CalibrationMap, catalog: &Catalog, k: usize) -> Vec<UnsettledCell> {
    map.least_settled(k)
        .into_iter()
        .map(|(entity_ix, question_ix, entropy)| UnsettledCell {
            entity: catalog.entity(entity_ix).id().clone(),
            question: catalog.question(question_ix).id().clone(),
            entropy,
        })
        .collect()
}

/// Everything the stats command reports, in one serializable bundle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LearningReport {
    pub log: GameLogAnalysis,
    pub history: HistoryStats,
    pub top_traits: Vec<TraitReport>,
    pub agent: Option<AgentStats>,
    pub unsettled: Vec<UnsettledCell>,
}

impl LearningReport {
    /// Build a report over the learning state attached to an engine.
    pub fn build(catalog: &Catalog, learning: &Learning) -> Self {
        LearningReport {
            log: GameLogAnalysis::analyze(learning.history.games()),
            history: learning.history.stats(),
            top_traits: rank_traits(&learning.history, TOP_TRAIT_ROWS),
            agent: learning.agent.as_ref().map(|agent| agent.stats()),
            unsettled: learning
                .calibration
                .as_ref()
                .map(|map| unsettled_cells(map, catalog, UNSETTLED_ROWS))
                .unwrap_or_default(),
        }
    }
}
