//! Stopping policy: when to stop asking questions and commit to a guess.
//!
//! The decision blends three signals. A hard floor stops guesses that
//! would be little better than chance. An early-game guard demands near
//! certainty while plenty of questions remain. Past the guard, the bar
//! adapts to how many candidates are still plausible: with one or two
//! survivors a modest lead is enough, while a crowded field needs high
//! confidence.
//!
//! All constants here are empirically tuned defaults, not derived
//! optima, so they live in plain config structs rather than in code
//! paths.

use serde::{Deserialize, Serialize};

use crate::beliefs::BeliefState;
use crate::catalog::Catalog;

/// Base confidence threshold as a function of questions asked.
///
/// The bar relaxes as the game drags on: a long game means the catalog
/// is genuinely ambiguous and holding out for certainty wastes turns.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSchedule {
    pub early_until: usize,
    pub mid_until: usize,
    pub late_until: usize,
    pub early: f64,
    pub mid: f64,
    pub late: f64,
    pub endgame: f64,
}

impl Default for ThresholdSchedule {
    fn default() -> Self {
        Self {
            early_until: 8,
            mid_until: 12,
            late_until: 18,
            early: 0.75,
            mid: 0.65,
            late: 0.55,
            endgame: 0.45,
        }
    }
}

impl ThresholdSchedule {
    pub fn threshold_for(&self, questions_asked: usize) -> f64 {
        if questions_asked <= self.early_until {
            self.early
        } else if questions_asked <= self.mid_until {
            self.mid
        } else if questions_asked <= self.late_until {
            self.late
        } else {
            self.endgame
        }
    }
}

/// Tunable stopping thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GuessPolicy {
    /// Never guess below this confidence, whatever else holds.
    pub confidence_floor: f64,
    /// Before this many questions, only `early_confidence` justifies a guess.
    pub early_question_guard: usize,
    /// Confidence that overrides the early-question guard.
    pub early_confidence: f64,
    /// Confidence that triggers an immediate guess once past the guard.
    pub immediate_confidence: f64,
    /// Beliefs at or above this count as plausible candidates.
    pub plausible_threshold: f64,
    pub schedule: ThresholdSchedule,
}

impl Default for GuessPolicy {
    fn default() -> Self {
        Self {
            confidence_floor: 0.05,
            early_question_guard: 20,
            early_confidence: 0.95,
            immediate_confidence: 0.90,
            plausible_threshold: 0.005,
            schedule: ThresholdSchedule::default(),
        }
    }
}

impl GuessPolicy {
    /// Confidence bar for the current candidate count.
    ///
    /// Non-decreasing in `remaining_candidates` for any base in the
    /// schedule's range, which keeps the policy honest: more surviving
    /// candidates never make guessing easier.
    pub fn adaptive_threshold(&self, base: f64, remaining_candidates: usize) -> f64 {
        match remaining_candidates {
            0 | 1 => 0.15,
            2 => 0.35,
            3 => base.min(0.55),
            4 => base.min(0.60),
            5 => base.min(0.70),
            6..=8 => (base + 0.05).min(0.90),
            _ => (base + 0.10).min(0.95),
        }
    }

    /// The stopping decision against an explicit base threshold.
    pub fn should_guess_at(
        &self,
        base_threshold: f64,
        top_probability: f64,
        questions_asked: usize,
        remaining_candidates: usize,
    ) -> bool {
        if top_probability < self.confidence_floor {
            return false;
        }
        if questions_asked < self.early_question_guard && top_probability < self.early_confidence {
            return false;
        }
        if top_probability >= self.immediate_confidence {
            return true;
        }
        top_probability >= self.adaptive_threshold(base_threshold, remaining_candidates)
    }

    /// The stopping decision for the current belief state, with the base
    /// threshold drawn from the schedule.
    pub fn evaluate(&self, beliefs: &BeliefState) -> bool {
        let Some((_, top_probability)) = beliefs.top() else {
            return false;
        };
        let questions_asked = beliefs.asked_count();
        self.should_guess_at(
            self.schedule.threshold_for(questions_asked),
            top_probability,
            questions_asked,
            beliefs.remaining(self.plausible_threshold),
        )
    }
}

/// Pick a confirmation question for a candidate about to be guessed.
///
/// Scans the candidate's held traits for an unasked question that the
/// other top-five candidates mostly lack, preferring globally rare
/// traits as a tiebreak. A yes cheaply validates the guess; a no saves
/// it from being wasted.
pub fn confirmation_question(
    catalog: &Catalog,
    beliefs: &BeliefState,
    entity_ix: usize,
) -> Option<usize> {
    let top = beliefs.top_k(5);
    let top_len = top.len() as i64;

    let mut candidates: Vec<(i64, usize, usize, usize)> = Vec::new();
    for (question_ix, question) in catalog.questions().iter().enumerate() {
        if beliefs.is_asked(question_ix) || !question.holders()[entity_ix] {
            continue;
        }
        let other_top_holders = top
            .iter()
            .filter(|&&(ix, _)| ix != entity_ix && question.holders()[ix])
            .count();
        let total_holders = question.holder_count();
        let discrimination = (top_len - other_top_holders as i64) * 1000;
        let rarity_bonus = (10 - total_holders as i64).max(0) * 10;
        candidates.push((
            discrimination + rarity_bonus,
            other_top_holders,
            total_holders,
            question_ix,
        ));
    }

    candidates
        .into_iter()
        .min_by_key(|&(score, other_top, total, question_ix)| {
            (-score, other_top, total, question_ix)
        })
        .map(|(_, _, _, question_ix)| question_ix)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EntityDef, QuestionDef};
    use crate::types::{Answer, AnswerModel};

    fn policy() -> GuessPolicy {
        GuessPolicy::default()
    }

    #[test]
    fn test_schedule_relaxes_over_time() {
        let schedule = ThresholdSchedule::default();
        assert_eq!(schedule.threshold_for(5), 0.75);
        assert_eq!(schedule.threshold_for(8), 0.75);
        assert_eq!(schedule.threshold_for(12), 0.65);
        assert_eq!(schedule.threshold_for(18), 0.55);
        assert_eq!(schedule.threshold_for(22), 0.45);
    }

    #[test]
    fn test_confidence_floor_blocks_weak_guesses() {
        assert!(!policy().should_guess_at(0.45, 0.04, 24, 1));
    }

    #[test]
    fn test_early_guard_demands_near_certainty() {
        let policy = policy();
        assert!(!policy.should_guess_at(0.75, 0.80, 5, 1));
        assert!(policy.should_guess_at(0.75, 0.95, 5, 10));
    }

    #[test]
    fn test_immediate_confidence_past_the_guard() {
        assert!(policy().should_guess_at(0.45, 0.92, 21, 40));
    }

    #[test]
    fn test_adaptive_band_by_candidate_count() {
        let policy = policy();
        // Two survivors: a modest lead suffices.
        assert!(policy.should_guess_at(0.45, 0.40, 21, 2));
        // The same lead is not enough against a crowded field.
        assert!(!policy.should_guess_at(0.45, 0.40, 21, 12));
    }

    #[test]
    fn test_adaptive_threshold_is_monotone_in_candidates() {
        let policy = policy();
        for &base in &[0.45, 0.55, 0.65, 0.75, 0.85] {
            let mut previous = 0.0;
            for remaining in 1..=12 {
                let threshold = policy.adaptive_threshold(base, remaining);
                assert!(
                    threshold >= previous,
                    "threshold dropped at base {base} remaining {remaining}"
                );
                previous = threshold;
            }
        }
    }

    #[test]
    fn test_evaluate_after_decisive_answer() {
        // Two entities split by one trait; a confident yes leaves the
        // holder at 0.95, which clears the early-confidence override.
        let catalog = Catalog::from_parts(
            vec![
                EntityDef {
                    id: "a".to_string(),
                    traits: vec!["color_red".to_string()],
                },
                EntityDef {
                    id: "b".to_string(),
                    traits: vec!["color_blue".to_string()],
                },
            ],
            vec![
                QuestionDef {
                    id: "q_red".to_string(),
                    trait_id: "color_red".to_string(),
                    text: "Red?".to_string(),
                },
                QuestionDef {
                    id: "q_blue".to_string(),
                    trait_id: "color_blue".to_string(),
                    text: "Blue?".to_string(),
                },
            ],
            None,
        )
        .unwrap();
        let mut beliefs = BeliefState::new(catalog.priors());
        let policy = policy();
        assert!(!policy.evaluate(&beliefs));

        beliefs.update(
            0,
            catalog.question(0).holders(),
            Answer::Yes,
            &AnswerModel::default(),
        );
        assert!(policy.evaluate(&beliefs));
    }

    #[test]
    fn test_confirmation_prefers_unique_rare_traits() {
        // Candidate 0 holds a trait shared with the runner-up and one
        // unique trait; confirmation should pick the unique one.
        let catalog = Catalog::from_parts(
            vec![
                EntityDef {
                    id: "target".to_string(),
                    traits: vec!["color_red".to_string(), "ability_flight".to_string()],
                },
                EntityDef {
                    id: "rival".to_string(),
                    traits: vec!["color_red".to_string()],
                },
                EntityDef {
                    id: "bystander".to_string(),
                    traits: vec!["color_red".to_string()],
                },
            ],
            vec![
                QuestionDef {
                    id: "q_red".to_string(),
                    trait_id: "color_red".to_string(),
                    text: "Red?".to_string(),
                },
                QuestionDef {
                    id: "q_flight".to_string(),
                    trait_id: "ability_flight".to_string(),
                    text: "Flies?".to_string(),
                },
            ],
            None,
        )
        .unwrap();
        let beliefs = BeliefState::new(catalog.priors());

        assert_eq!(confirmation_question(&catalog, &beliefs, 0), Some(1));

        // Once asked, the unique trait is off the table and the shared
        // one is all that remains.
        let mut beliefs = BeliefState::new(catalog.priors());
        beliefs.mark_asked(1, Answer::Yes);
        assert_eq!(confirmation_question(&catalog, &beliefs, 0), Some(0));

        // A candidate with every trait question exhausted gets nothing.
        beliefs.mark_asked(0, Answer::Yes);
        assert_eq!(confirmation_question(&catalog, &beliefs, 0), None);
    }
}
