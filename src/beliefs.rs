//! Posterior belief distribution over catalog entities.
//!
//! A [`BeliefState`] starts from the catalog priors and is narrowed by one
//! Bayesian update per answered question. It also remembers which questions
//! have been asked, in order, so selection never repeats one and learning
//! can replay the transcript afterwards.

use std::collections::HashSet;

use crate::{
    types::{Answer, AnswerModel},
    utils::{NormalizationFallback, normalize_weights_with_options, shannon_entropy},
};

/// Probability distribution over entities plus the asked-question transcript.
///
/// Invariant: probabilities always sum to 1 (within float tolerance). If an
/// update zeroes out every candidate the distribution falls back to uniform
/// rather than dividing by zero.
#[derive(Debug, Clone)]
pub struct BeliefState {
    probabilities: Vec<f64>,
    asked: Vec<(usize, Answer)>,
    asked_set: HashSet<usize>,
}

impl BeliefState {
    /// Create a belief state from a normalized prior distribution.
    pub fn new(priors: &[f64]) -> Self {
        Self {
            probabilities: priors.to_vec(),
            asked: Vec::new(),
            asked_set: HashSet::new(),
        }
    }

    /// Reset to the supplied priors and forget the transcript.
    pub fn reset(&mut self, priors: &[f64]) {
        self.probabilities.clear();
        self.probabilities.extend_from_slice(priors);
        self.asked.clear();
        self.asked_set.clear();
    }

    /// Current probabilities, aligned with catalog entity indexes.
    pub fn probabilities(&self) -> &[f64] {
        &self.probabilities
    }

    /// Probability of one entity.
    pub fn probability(&self, entity_ix: usize) -> f64 {
        self.probabilities[entity_ix]
    }

    /// Questions asked so far, in order, with the answers given.
    pub fn asked(&self) -> &[(usize, Answer)] {
        &self.asked
    }

    /// Number of questions asked so far.
    pub fn asked_count(&self) -> usize {
        self.asked.len()
    }

    /// Whether a question has already been asked this game.
    pub fn is_asked(&self, question_ix: usize) -> bool {
        self.asked_set.contains(&question_ix)
    }

    /// Apply a Bayesian update for an answered question.
    ///
    /// Candidates whose trait value agrees with the answer's polarity are
    /// multiplied by the pair's matching likelihood, the rest by the
    /// conflicting likelihood, and the distribution is renormalized.
    /// `Unknown` answers only mark the question as asked.
    pub fn update(
        &mut self,
        question_ix: usize,
        holders: &[bool],
        answer: Answer,
        model: &AnswerModel,
    ) {
        debug_assert_eq!(holders.len(), self.probabilities.len());
        self.mark_asked(question_ix, answer);

        let Some(polarity) = answer.polarity() else {
            return;
        };
        let Some(pair) = model.pair_for(answer) else {
            return;
        };

        for (probability, &held) in self.probabilities.iter_mut().zip(holders) {
            let agrees = held == polarity;
            *probability *= if agrees {
                pair.matching()
            } else {
                pair.conflicting()
            };
        }
        self.renormalize();
    }

    /// Apply a calibrated update using per-entity yes-probabilities.
    ///
    /// Each candidate is multiplied by the likelihood of observing an answer
    /// of the given strength: `strength * p_yes + (1 - strength) * (1 - p_yes)`.
    /// With strength 0.5 (unknown) every candidate scales equally, so the
    /// distribution is unchanged after renormalization.
    pub fn update_calibrated(
        &mut self,
        question_ix: usize,
        yes_probabilities: &[f64],
        answer: Answer,
    ) {
        debug_assert_eq!(yes_probabilities.len(), self.probabilities.len());
        self.mark_asked(question_ix, answer);

        let strength = answer.strength();
        for (probability, &p_yes) in self.probabilities.iter_mut().zip(yes_probabilities) {
            *probability *= strength * p_yes + (1.0 - strength) * (1.0 - p_yes);
        }
        self.renormalize();
    }

    /// Record a question as asked without touching the distribution.
    pub fn mark_asked(&mut self, question_ix: usize, answer: Answer) {
        if self.asked_set.insert(question_ix) {
            self.asked.push((question_ix, answer));
        }
    }

    /// Shannon entropy of the current distribution, in bits.
    pub fn entropy(&self) -> f64 {
        shannon_entropy(self.probabilities.iter().copied())
    }

    /// The most probable entity, with its probability.
    pub fn top(&self) -> Option<(usize, f64)> {
        self.top_k(1).into_iter().next()
    }

    /// The `k` most probable entities, highest first.
    ///
    /// Ties break toward the lower entity index so the ordering is stable
    /// across runs.
    pub fn top_k(&self, k: usize) -> Vec<(usize, f64)> {
        let mut ranked: Vec<(usize, f64)> =
            self.probabilities.iter().copied().enumerate().collect();
        ranked.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        ranked.truncate(k);
        ranked
    }

    /// Number of candidates with probability at or above `min_prob`.
    ///
    /// The comparison is inclusive: a uniform start leaves every candidate
    /// at exactly 1/n, and all of them still count as in play.
    pub fn remaining(&self, min_prob: f64) -> usize {
        self.probabilities.iter().filter(|&&p| p >= min_prob).count()
    }

    /// Multiply one entity's probability by `factor` and renormalize.
    ///
    /// This backs both the wrong-guess penalty (factor well below 1) and the
    /// post-reveal boost (factor well above 1).
    pub fn scale(&mut self, entity_ix: usize, factor: f64) {
        debug_assert!(factor.is_finite() && factor >= 0.0);
        self.probabilities[entity_ix] *= factor;
        self.renormalize();
    }

    fn renormalize(&mut self) {
        if let Some(normalized) = normalize_weights_with_options(
            self.probabilities.iter().copied(),
            NormalizationFallback::Uniform,
            None,
        ) {
            self.probabilities = normalized;
        }
    }
}
