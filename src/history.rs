//! Game history and the learning signals derived from it.
//!
//! Every finished game is logged as a [`GameRecord`]. The [`HistoryLearner`]
//! folds those records into three signals that feed back into play:
//! per-trait effectiveness boosts for question selection, adaptive priors
//! favouring frequently picked entities, and aggregate statistics for the
//! stats command. Derived values are cached lazily and recomputed after the
//! next logged game.

use std::{
    cell::OnceCell,
    collections::HashMap,
    time::{SystemTime, UNIX_EPOCH},
};

use serde::{Deserialize, Serialize};

use crate::{
    catalog::{Catalog, Question},
    identifiers::{EntityId, QuestionId, TraitId},
    ports::SelectionAdvisor,
    types::{Answer, TurnSnapshot},
    utils::normalize_weighted_pairs,
};

/// Games required before historical boosts influence selection.
pub const MIN_GAMES_FOR_BOOST: usize = 3;

/// Games required before the stats command reports learning as active.
pub const LEARNING_ACTIVE_AFTER: usize = 5;

/// One asked question inside a finished game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedStep {
    pub question: QuestionId,
    pub trait_id: TraitId,
    pub answer: Answer,
    /// Entropy before the answer minus entropy after, in bits. Zero for
    /// unknown answers, negative when an answer widened the field.
    pub entropy_delta: f64,
}

/// A finished game as appended to the history log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Unix timestamp (seconds) when the game was logged.
    pub timestamp: u64,
    /// The player's actual character, when revealed or guessed correctly.
    pub target: Option<EntityId>,
    pub success: bool,
    /// Incorrect guesses made before the game ended.
    pub wrong_guesses: Vec<EntityId>,
    /// 1 / questions asked for wins, 0 for losses.
    pub efficiency: f64,
    pub steps: Vec<RecordedStep>,
}

impl GameRecord {
    /// Build a record for a just-finished game, stamping the current time.
    pub fn new(
        target: Option<EntityId>,
        success: bool,
        wrong_guesses: Vec<EntityId>,
        steps: Vec<RecordedStep>,
    ) -> Self {
        let efficiency = if success {
            1.0 / steps.len().max(1) as f64
        } else {
            0.0
        };
        Self {
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            target,
            success,
            wrong_guesses,
            efficiency,
            steps,
        }
    }

    /// Number of questions asked during this game.
    pub fn questions_asked(&self) -> usize {
        self.steps.len()
    }
}

/// Aggregate history statistics, as reported by the stats command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryStats {
    pub total_games: usize,
    pub success_rate: f64,
    /// Average question count over won games only.
    pub avg_questions: f64,
    /// Up to five most frequently picked entities with their counts.
    pub most_picked: Vec<(EntityId, usize)>,
    pub learning_active: bool,
}

/// Accumulated per-trait observations, used to score effectiveness.
#[derive(Debug, Default)]
struct TraitAccumulator {
    entropy_deltas: Vec<f64>,
    success_count: usize,
    total_count: usize,
    /// Normalized ask positions, recorded for won games only.
    positions: Vec<f64>,
}

/// Learns from logged games which questions worked and who keeps turning up.
#[derive(Debug)]
pub struct HistoryLearner {
    games: Vec<GameRecord>,
    min_games_for_boost: usize,
    effectiveness: OnceCell<HashMap<TraitId, f64>>,
    frequency: OnceCell<HashMap<EntityId, usize>>,
}

impl Default for HistoryLearner {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryLearner {
    /// Create a learner with no history.
    pub fn new() -> Self {
        Self {
            games: Vec::new(),
            min_games_for_boost: MIN_GAMES_FOR_BOOST,
            effectiveness: OnceCell::new(),
            frequency: OnceCell::new(),
        }
    }

    /// Create a learner seeded with previously logged games.
    pub fn from_records(games: Vec<GameRecord>) -> Self {
        Self {
            games,
            ..Self::new()
        }
    }

    /// Override the number of games required before boosts activate.
    pub fn with_min_games(mut self, min_games: usize) -> Self {
        self.min_games_for_boost = min_games;
        self
    }

    pub fn games(&self) -> &[GameRecord] {
        &self.games
    }

    pub fn game_count(&self) -> usize {
        self.games.len()
    }

    /// Append a finished game and drop the cached analytics.
    pub fn log_game(&mut self, record: GameRecord) {
        self.games.push(record);
        self.effectiveness.take();
        self.frequency.take();
    }

    /// Effectiveness score per trait, in the 0 to 2 range.
    ///
    /// Each score is a weighted blend of three components: the average
    /// entropy reduction the trait achieved (half weight, saturating at two
    /// bits), the share of its games that were won (0.3), and how early it
    /// tended to be asked in won games (0.2).
    pub fn question_effectiveness(&self) -> &HashMap<TraitId, f64> {
        self.effectiveness.get_or_init(|| {
            let mut accumulators: HashMap<TraitId, TraitAccumulator> = HashMap::new();

            for game in &self.games {
                let total = game.steps.len().max(1) as f64;
                for (position, step) in game.steps.iter().enumerate() {
                    let acc = accumulators.entry(step.trait_id.clone()).or_default();
                    acc.total_count += 1;
                    acc.entropy_deltas.push(step.entropy_delta);
                    if game.success {
                        acc.success_count += 1;
                        acc.positions.push(position as f64 / total);
                    }
                }
            }

            accumulators
                .into_iter()
                .map(|(trait_id, acc)| {
                    let entropy_score = if acc.entropy_deltas.is_empty() {
                        0.5
                    } else {
                        let mean = acc.entropy_deltas.iter().sum::<f64>()
                            / acc.entropy_deltas.len() as f64;
                        (mean / 2.0).min(1.0)
                    };
                    let success_rate = acc.success_count as f64 / acc.total_count.max(1) as f64;
                    let position_bonus = if acc.positions.is_empty() {
                        0.5
                    } else {
                        1.0 - acc.positions.iter().sum::<f64>() / acc.positions.len() as f64
                    };

                    let score =
                        (0.5 * entropy_score + 0.3 * success_rate + 0.2 * position_bonus) * 2.0;
                    (trait_id, score)
                })
                .collect()
        })
    }

    /// How often each entity has been the player's pick.
    pub fn entity_frequency(&self) -> &HashMap<EntityId, usize> {
        self.frequency.get_or_init(|| {
            let mut frequency = HashMap::new();
            for game in &self.games {
                if let Some(target) = &game.target {
                    *frequency.entry(target.clone()).or_insert(0) += 1;
                }
            }
            frequency
        })
    }

    /// Selection boost for a trait, mapping effectiveness 0..2 onto 0.3..2.5.
    ///
    /// Neutral (1.0) until enough games are logged or for unseen traits.
    pub fn question_boost(&self, trait_id: &TraitId) -> f64 {
        if self.games.len() < self.min_games_for_boost {
            return 1.0;
        }
        match self.question_effectiveness().get(trait_id) {
            Some(score) => 0.3 + 1.1 * score,
            None => 1.0,
        }
    }

    /// Priors blended toward historically frequent picks.
    ///
    /// Observed pick frequency gets 80% of the weight, the catalog prior
    /// 20%, renormalized. With no logged games this returns the catalog
    /// priors unchanged.
    pub fn adaptive_priors(&self, catalog: &Catalog) -> Vec<f64> {
        let total_games = self.games.len();
        if total_games == 0 {
            return catalog.priors().to_vec();
        }

        let frequency = self.entity_frequency();
        let blended: Vec<(usize, f64)> = catalog
            .entities()
            .iter()
            .enumerate()
            .map(|(index, entity)| {
                let count = frequency.get(entity.id()).copied().unwrap_or(0);
                let observed = count as f64 / total_games as f64;
                (index, 0.8 * observed + 0.2 * catalog.priors()[index])
            })
            .collect();

        match normalize_weighted_pairs(blended) {
            Some(normalized) => {
                let mut priors = vec![0.0; catalog.entity_count()];
                for (index, probability) in normalized {
                    priors[index] = probability;
                }
                priors
            }
            None => catalog.priors().to_vec(),
        }
    }

    /// Aggregate statistics over the logged games.
    pub fn stats(&self) -> HistoryStats {
        if self.games.is_empty() {
            return HistoryStats {
                total_games: 0,
                success_rate: 0.0,
                avg_questions: 0.0,
                most_picked: Vec::new(),
                learning_active: false,
            };
        }

        let won: Vec<&GameRecord> = self.games.iter().filter(|game| game.success).collect();
        let avg_questions = if won.is_empty() {
            0.0
        } else {
            won.iter().map(|game| game.questions_asked() as f64).sum::<f64>() / won.len() as f64
        };

        let mut most_picked: Vec<(EntityId, usize)> = self
            .entity_frequency()
            .iter()
            .map(|(id, count)| (id.clone(), *count))
            .collect();
        most_picked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        most_picked.truncate(5);

        HistoryStats {
            total_games: self.games.len(),
            success_rate: won.len() as f64 / self.games.len() as f64,
            avg_questions,
            most_picked,
            learning_active: self.games.len() >= LEARNING_ACTIVE_AFTER,
        }
    }
}

impl SelectionAdvisor for HistoryLearner {
    fn name(&self) -> &str {
        "history"
    }

    fn multiplier(&self, _snapshot: &TurnSnapshot, question: &Question) -> f64 {
        self.question_boost(question.trait_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(trait_id: &str, delta: f64) -> RecordedStep {
        RecordedStep {
            question: QuestionId::new(format!("q_{trait_id}")),
            trait_id: TraitId::new(trait_id),
            answer: Answer::Yes,
            entropy_delta: delta,
        }
    }

    fn record(target: &str, success: bool, steps: Vec<RecordedStep>) -> GameRecord {
        GameRecord::new(Some(EntityId::new(target)), success, Vec::new(), steps)
    }

    fn seeded_learner() -> HistoryLearner {
        HistoryLearner::from_records(vec![
            record("X", true, vec![step("t_a", 1.0), step("t_b", 0.5)]),
            record("X", true, vec![step("t_a", 3.0)]),
            record("Y", false, vec![step("t_b", 0.2)]),
        ])
    }

    #[test]
    fn test_effectiveness_components() {
        let learner = seeded_learner();
        let effectiveness = learner.question_effectiveness();

        // t_a: entropy mean 2.0 saturates to 1.0, always in won games at
        // position 0, success rate 1.0 -> (0.5 + 0.3 + 0.2) * 2 = 2.0
        let t_a = effectiveness[&TraitId::new("t_a")];
        assert!((t_a - 2.0).abs() < 1e-9);

        // t_b: entropy mean 0.35 -> 0.175, success rate 0.5, one won-game
        // position at 1/2 -> bonus 0.5
        let t_b = effectiveness[&TraitId::new("t_b")];
        let expected = (0.5 * 0.175 + 0.3 * 0.5 + 0.2 * 0.5) * 2.0;
        assert!((t_b - expected).abs() < 1e-9);
    }

    #[test]
    fn test_boost_mapping_and_gating() {
        let learner = seeded_learner();
        assert!((learner.question_boost(&TraitId::new("t_a")) - 2.5).abs() < 1e-9);
        // Unseen traits stay neutral.
        assert_eq!(learner.question_boost(&TraitId::new("t_z")), 1.0);

        // Under the game threshold everything is neutral.
        let sparse = HistoryLearner::from_records(vec![record(
            "X",
            true,
            vec![step("t_a", 3.0)],
        )]);
        assert_eq!(sparse.question_boost(&TraitId::new("t_a")), 1.0);
    }

    #[test]
    fn test_adaptive_priors_blend() {
        use crate::catalog::{EntityDef, QuestionDef};

        let catalog = Catalog::from_parts(
            vec![
                EntityDef {
                    id: "X".to_string(),
                    traits: vec!["source_book".to_string()],
                },
                EntityDef {
                    id: "Y".to_string(),
                    traits: vec![],
                },
            ],
            vec![QuestionDef {
                id: "q".to_string(),
                trait_id: "source_book".to_string(),
                text: String::new(),
            }],
            None,
        )
        .unwrap();

        let learner = HistoryLearner::from_records(vec![
            record("X", true, vec![step("t_a", 1.0)]),
            record("X", false, vec![step("t_a", 1.0)]),
        ]);

        // X was picked in both games: 0.8 * 1.0 + 0.2 * 0.5 = 0.9,
        // Y never: 0.2 * 0.5 = 0.1; already normalized.
        let priors = learner.adaptive_priors(&catalog);
        assert!((priors[0] - 0.9).abs() < 1e-9);
        assert!((priors[1] - 0.1).abs() < 1e-9);

        // No history means catalog priors pass through untouched.
        let empty = HistoryLearner::new();
        assert_eq!(empty.adaptive_priors(&catalog), catalog.priors());
    }

    #[test]
    fn test_stats_over_won_games() {
        let learner = seeded_learner();
        let stats = learner.stats();

        assert_eq!(stats.total_games, 3);
        assert!((stats.success_rate - 2.0 / 3.0).abs() < 1e-9);
        assert!((stats.avg_questions - 1.5).abs() < 1e-9);
        assert_eq!(stats.most_picked[0], (EntityId::new("X"), 2));
        assert!(!stats.learning_active);

        let empty = HistoryLearner::new();
        assert_eq!(empty.stats().total_games, 0);
    }

    #[test]
    fn test_cache_invalidated_on_log() {
        let mut learner = seeded_learner();
        assert_eq!(learner.entity_frequency()[&EntityId::new("X")], 2);

        learner.log_game(record("X", true, vec![step("t_a", 2.0)]));
        assert_eq!(learner.entity_frequency()[&EntityId::new("X")], 3);
        assert_eq!(learner.game_count(), 4);
    }

    #[test]
    fn test_efficiency_and_questions_asked() {
        let won = record("X", true, vec![step("t_a", 1.0), step("t_b", 0.5)]);
        assert!((won.efficiency - 0.5).abs() < 1e-12);
        assert_eq!(won.questions_asked(), 2);

        let lost = record("X", false, vec![step("t_a", 1.0)]);
        assert_eq!(lost.efficiency, 0.0);
    }
}
