//! Question selection by expected information gain.
//!
//! Each turn the selector scores every candidate question: the expected
//! entropy reduction of its yes/no split, shaped by the strategy table
//! for the current phase and by any registered advisors. Questions whose
//! trait has already been probed are skipped, as are questions made
//! redundant by a confirmed answer in an exclusive category.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{
    beliefs::BeliefState,
    catalog::{Catalog, TraitCategory},
    ports::SelectionAdvisor,
    strategy::CompiledStrategy,
    types::{PhaseSchedule, TurnSnapshot},
    utils::entropy_from_weights,
};

/// Tunable knobs for question selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// How many leading candidates define a "discriminating" split.
    pub focus_top_n: usize,
    /// Probability at or above which a candidate still counts as plausible.
    pub plausible_threshold: f64,
    /// Categories where one confirmed answer settles the whole group.
    pub exclusive_categories: Vec<TraitCategory>,
    /// Question-count boundaries between the early, mid and late phases.
    pub schedule: PhaseSchedule,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            focus_top_n: 10,
            plausible_threshold: 0.005,
            exclusive_categories: vec![TraitCategory::Source, TraitCategory::Franchise],
            schedule: PhaseSchedule::default(),
        }
    }
}

/// One candidate question with its score breakdown.
#[derive(Debug, Clone)]
pub struct ScoredQuestion {
    pub index: usize,
    /// Expected entropy reduction in bits.
    pub gain: f64,
    /// Combined phase and strategy multiplier.
    pub strategy_factor: f64,
    /// Product of all advisor multipliers.
    pub advisor_factor: f64,
    /// Final score the ranking uses.
    pub score: f64,
}

/// Scores and ranks candidate questions against the current beliefs.
#[derive(Debug)]
pub struct QuestionSelector {
    strategy: CompiledStrategy,
    config: SelectorConfig,
}

impl QuestionSelector {
    pub fn new(strategy: CompiledStrategy, config: SelectorConfig) -> Self {
        Self { strategy, config }
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    /// Belief summary handed to advisors and strategy rules.
    pub fn snapshot(&self, beliefs: &BeliefState) -> TurnSnapshot {
        TurnSnapshot {
            entropy: beliefs.entropy(),
            top_probability: beliefs.top().map(|(_, p)| p).unwrap_or(0.0),
            questions_asked: beliefs.asked_count(),
            remaining_candidates: beliefs.remaining(self.config.plausible_threshold),
        }
    }

    /// Expected reduction in belief entropy from asking one question.
    ///
    /// The candidate set splits into holders and non-holders of the
    /// question's trait. Each branch is weighted by its probability mass
    /// and scored with the entropy of its renormalized beliefs.
    pub fn information_gain(
        &self,
        catalog: &Catalog,
        beliefs: &BeliefState,
        question_ix: usize,
    ) -> f64 {
        let holders = catalog.question(question_ix).holders();
        let mut yes_mass = 0.0;
        let mut yes_weights = Vec::new();
        let mut no_weights = Vec::new();

        for (entity_ix, &probability) in beliefs.probabilities().iter().enumerate() {
            if holders[entity_ix] {
                yes_mass += probability;
                yes_weights.push(probability);
            } else {
                no_weights.push(probability);
            }
        }
        let no_mass = (1.0 - yes_mass).max(0.0);

        let expected = yes_mass * entropy_from_weights(yes_weights)
            + no_mass * entropy_from_weights(no_weights);
        (beliefs.entropy() - expected).max(0.0)
    }

    /// Whether a question splits the current leading candidates.
    ///
    /// True when some but not all of the top candidates hold the trait,
    /// so either answer narrows the plausible set.
    pub fn is_discriminating(
        &self,
        catalog: &Catalog,
        beliefs: &BeliefState,
        question_ix: usize,
    ) -> bool {
        let top = beliefs.top_k(self.config.focus_top_n);
        if top.is_empty() {
            return false;
        }
        let holders = catalog.question(question_ix).holders();
        let held = top.iter().filter(|(ix, _)| holders[*ix]).count();
        held > 0 && held < top.len()
    }

    /// Exclusive categories already settled by an affirmative answer.
    fn confirmed_categories(
        &self,
        catalog: &Catalog,
        beliefs: &BeliefState,
    ) -> HashSet<TraitCategory> {
        beliefs
            .asked()
            .iter()
            .filter(|(_, answer)| answer.is_affirmative())
            .map(|&(question_ix, _)| catalog.question(question_ix).category())
            .filter(|category| self.config.exclusive_categories.contains(category))
            .collect()
    }

    /// All candidates this turn, scored and sorted best first.
    ///
    /// Ties break toward the lower question index so selection stays
    /// deterministic for a given belief state.
    pub fn ranked(
        &self,
        catalog: &Catalog,
        beliefs: &BeliefState,
        advisors: &[&dyn SelectionAdvisor],
    ) -> Vec<ScoredQuestion> {
        let snapshot = self.snapshot(beliefs);
        let phase = self.config.schedule.phase_of(beliefs.asked_count());
        let confirmed = self.confirmed_categories(catalog, beliefs);
        let asked_traits: HashSet<&str> = beliefs
            .asked()
            .iter()
            .map(|&(question_ix, _)| catalog.question(question_ix).trait_id().as_str())
            .collect();

        let mut scored = Vec::new();
        for question_ix in 0..catalog.question_count() {
            let question = catalog.question(question_ix);
            if beliefs.is_asked(question_ix)
                || asked_traits.contains(question.trait_id().as_str())
                || confirmed.contains(&question.category())
            {
                continue;
            }

            let gain = self.information_gain(catalog, beliefs, question_ix);
            let discriminating = self.is_discriminating(catalog, beliefs, question_ix);
            let strategy_factor = self.strategy.multiplier(question_ix, phase, discriminating);
            let advisor_factor: f64 = advisors
                .iter()
                .map(|advisor| advisor.multiplier(&snapshot, question))
                .product();

            scored.push(ScoredQuestion {
                index: question_ix,
                gain,
                strategy_factor,
                advisor_factor,
                score: gain * strategy_factor * advisor_factor,
            });
        }

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.index.cmp(&b.index))
        });
        scored
    }

    /// Pick the best next question, or `None` when nothing is left to ask.
    pub fn select_next(
        &self,
        catalog: &Catalog,
        beliefs: &BeliefState,
        advisors: &[&dyn SelectionAdvisor],
    ) -> Option<usize> {
        self.ranked(catalog, beliefs, advisors)
            .into_iter()
            .next()
            .map(|scored| scored.index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        catalog::{EntityDef, QuestionDef},
        strategy::StrategyTable,
        types::Answer,
    };

    fn entity(id: &str, traits: &[&str]) -> EntityDef {
        EntityDef {
            id: id.to_string(),
            traits: traits.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn question(id: &str, trait_id: &str) -> QuestionDef {
        QuestionDef {
            id: id.to_string(),
            trait_id: trait_id.to_string(),
            text: format!("{trait_id}?"),
        }
    }

    fn catalog() -> Catalog {
        Catalog::from_parts(
            vec![
                entity("a", &["source_book", "color_red"]),
                entity("b", &["source_book", "color_blue"]),
                entity("c", &["source_movie", "color_red"]),
                entity("d", &["source_movie", "color_blue"]),
            ],
            vec![
                question("q_book", "source_book"),
                question("q_movie", "source_movie"),
                question("q_red", "color_red"),
                question("q_all", "universal"),
            ],
            None,
        )
        .unwrap()
    }

    fn selector(catalog: &Catalog) -> QuestionSelector {
        QuestionSelector::new(
            StrategyTable::default().compile(catalog),
            SelectorConfig::default(),
        )
    }

    #[test]
    fn test_even_split_yields_one_bit() {
        let catalog = catalog();
        let selector = selector(&catalog);
        let beliefs = BeliefState::new(catalog.priors());

        // source_book splits 4 uniform candidates in half: 2 - 1 = 1 bit.
        let gain = selector.information_gain(&catalog, &beliefs, 0);
        assert!((gain - 1.0).abs() < 1e-9);

        // A trait nobody holds cannot reduce entropy.
        let gain = selector.information_gain(&catalog, &beliefs, 3);
        assert!(gain.abs() < 1e-9);
    }

    #[test]
    fn test_discriminating_requires_partial_split() {
        let catalog = catalog();
        let selector = selector(&catalog);
        let beliefs = BeliefState::new(catalog.priors());

        assert!(selector.is_discriminating(&catalog, &beliefs, 0));
        // universal is held by nobody in the top set.
        assert!(!selector.is_discriminating(&catalog, &beliefs, 3));
    }

    #[test]
    fn test_asked_trait_not_reconsidered() {
        let catalog = catalog();
        let selector = selector(&catalog);
        let mut beliefs = BeliefState::new(catalog.priors());
        beliefs.mark_asked(2, Answer::Unknown);

        let ranked = selector.ranked(&catalog, &beliefs, &[]);
        assert!(ranked.iter().all(|scored| scored.index != 2));
    }

    #[test]
    fn test_confirmed_source_excludes_sibling_questions() {
        let catalog = catalog();
        let selector = selector(&catalog);
        let answers = crate::types::AnswerModel::default();
        let mut beliefs = BeliefState::new(catalog.priors());
        beliefs.update(0, catalog.question(0).holders(), Answer::Yes, &answers);

        // q_movie probes the same exclusive category and is dropped.
        let ranked = selector.ranked(&catalog, &beliefs, &[]);
        assert!(ranked.iter().all(|scored| scored.index != 1));
        assert!(ranked.iter().any(|scored| scored.index == 2));
    }

    #[test]
    fn test_negative_answer_keeps_category_open() {
        let catalog = catalog();
        let selector = selector(&catalog);
        let answers = crate::types::AnswerModel::default();
        let mut beliefs = BeliefState::new(catalog.priors());
        beliefs.update(0, catalog.question(0).holders(), Answer::No, &answers);

        let ranked = selector.ranked(&catalog, &beliefs, &[]);
        assert!(ranked.iter().any(|scored| scored.index == 1));
    }

    #[test]
    fn test_advisor_reorders_selection() {
        struct Favor;
        impl SelectionAdvisor for Favor {
            fn name(&self) -> &str {
                "favor"
            }
            fn multiplier(
                &self,
                _snapshot: &TurnSnapshot,
                question: &crate::catalog::Question,
            ) -> f64 {
                if question.id().as_str() == "q_red" { 100.0 } else { 1.0 }
            }
        }

        let catalog = catalog();
        let selector = selector(&catalog);
        let beliefs = BeliefState::new(catalog.priors());

        let without = selector.select_next(&catalog, &beliefs, &[]).unwrap();
        assert_ne!(without, 2);

        let favor = Favor;
        let with = selector.select_next(&catalog, &beliefs, &[&favor]).unwrap();
        assert_eq!(with, 2);
    }

    #[test]
    fn test_ranking_is_deterministic_on_ties() {
        let catalog = catalog();
        let selector = selector(&catalog);
        let beliefs = BeliefState::new(catalog.priors());

        // q_book and q_movie have identical gain and factors; the lower
        // index must come first.
        let ranked = selector.ranked(&catalog, &beliefs, &[]);
        let book_pos = ranked.iter().position(|s| s.index == 0).unwrap();
        let movie_pos = ranked.iter().position(|s| s.index == 1).unwrap();
        assert!(book_pos < movie_pos);
    }
}
