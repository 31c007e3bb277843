//! Core value types shared across the engine.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::identifiers::EntityId;

/// A player's reply to a yes/no question.
///
/// Graded answers (`ProbablyYes`, `ProbablyNo`) carry less evidence than
/// confident ones; `Unknown` carries none at all but still consumes the
/// question so it is never asked again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Answer {
    Yes,
    No,
    ProbablyYes,
    ProbablyNo,
    Unknown,
}

impl Answer {
    /// All answer variants, in display order. Useful for prompts and help text.
    pub const ALL: [Answer; 5] = [
        Answer::Yes,
        Answer::No,
        Answer::ProbablyYes,
        Answer::ProbablyNo,
        Answer::Unknown,
    ];

    /// Direction of the answer: `Some(true)` for affirmative, `Some(false)`
    /// for negative, `None` for unknown.
    pub fn polarity(&self) -> Option<bool> {
        match self {
            Answer::Yes | Answer::ProbablyYes => Some(true),
            Answer::No | Answer::ProbablyNo => Some(false),
            Answer::Unknown => None,
        }
    }

    /// Answer strength on a [0, 1] scale, used for calibration updates.
    ///
    /// A confident yes is 1.0, a confident no is 0.0, graded answers sit
    /// between, and unknown is the uninformative midpoint.
    pub fn strength(&self) -> f64 {
        match self {
            Answer::Yes => 1.0,
            Answer::ProbablyYes => 0.75,
            Answer::Unknown => 0.5,
            Answer::ProbablyNo => 0.25,
            Answer::No => 0.0,
        }
    }

    /// Whether the answer is a confident yes or no.
    pub fn is_confident(&self) -> bool {
        matches!(self, Answer::Yes | Answer::No)
    }

    /// Whether the answer points toward the trait being present.
    ///
    /// Used by the redundancy filter: once a question in an exclusive
    /// category draws an affirmative answer, its siblings are skipped.
    pub fn is_affirmative(&self) -> bool {
        matches!(self, Answer::Yes | Answer::ProbablyYes)
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Answer::Yes => "yes",
            Answer::No => "no",
            Answer::ProbablyYes => "probably",
            Answer::ProbablyNo => "probably_not",
            Answer::Unknown => "unknown",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Answer {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "y" | "yes" => Ok(Answer::Yes),
            "n" | "no" => Ok(Answer::No),
            "p" | "probably" | "probably_yes" => Ok(Answer::ProbablyYes),
            "pn" | "probably_not" | "probably_no" => Ok(Answer::ProbablyNo),
            "u" | "unknown" | "idk" | "skip" => Ok(Answer::Unknown),
            other => Err(crate::Error::ParseAnswer {
                input: other.to_string(),
                expected: "yes, no, probably, probably_not, unknown".to_string(),
            }),
        }
    }
}

/// Likelihoods applied to candidates during a Bayesian update.
///
/// `matching` multiplies candidates whose trait value agrees with the
/// answer's polarity; `conflicting` multiplies the rest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LikelihoodPair {
    matching: f64,
    conflicting: f64,
}

impl LikelihoodPair {
    /// Create a new likelihood pair, validating both values lie in (0, 1).
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::InvalidLikelihood`] if either value is outside
    /// the open unit interval or not finite. A likelihood of exactly zero
    /// would permanently eliminate candidates on a single noisy answer.
    pub fn new(matching: f64, conflicting: f64) -> Result<Self, crate::Error> {
        for value in [matching, conflicting] {
            if !value.is_finite() || value <= 0.0 || value >= 1.0 {
                return Err(crate::Error::InvalidLikelihood { value });
            }
        }
        Ok(LikelihoodPair {
            matching,
            conflicting,
        })
    }

    /// Create a pair from raw values without validation.
    ///
    /// # Safety
    /// This is const and doesn't validate. Only use with known-good constant values.
    pub const fn from_raw(matching: f64, conflicting: f64) -> Self {
        LikelihoodPair {
            matching,
            conflicting,
        }
    }

    /// Likelihood for candidates whose trait agrees with the answer.
    pub fn matching(&self) -> f64 {
        self.matching
    }

    /// Likelihood for candidates whose trait disagrees with the answer.
    pub fn conflicting(&self) -> f64 {
        self.conflicting
    }
}

/// Default likelihood pairs.
pub mod likelihoods {
    use super::LikelihoodPair;

    /// Pair applied for confident answers (yes/no).
    pub const CONFIDENT: LikelihoodPair = LikelihoodPair::from_raw(0.95, 0.05);

    /// Pair applied for hedged answers (probably / probably not).
    pub const HESITANT: LikelihoodPair = LikelihoodPair::from_raw(0.75, 0.25);
}

/// Maps answers to the likelihood pair used in belief updates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnswerModel {
    pub confident: LikelihoodPair,
    pub hesitant: LikelihoodPair,
}

impl AnswerModel {
    /// Likelihood pair for an answer, or `None` for `Unknown` (which never
    /// changes the belief distribution).
    pub fn pair_for(&self, answer: Answer) -> Option<LikelihoodPair> {
        match answer {
            Answer::Yes | Answer::No => Some(self.confident),
            Answer::ProbablyYes | Answer::ProbablyNo => Some(self.hesitant),
            Answer::Unknown => None,
        }
    }
}

impl Default for AnswerModel {
    fn default() -> Self {
        AnswerModel {
            confident: likelihoods::CONFIDENT,
            hesitant: likelihoods::HESITANT,
        }
    }
}

/// Stage of a game, derived from how many questions have been asked.
///
/// Question weighting changes by phase: broad category questions early,
/// discriminating detail questions late.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Early,
    Mid,
    Late,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Early => "early",
            Phase::Mid => "mid",
            Phase::Late => "late",
        };
        write!(f, "{s}")
    }
}

/// Phase boundaries in questions asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSchedule {
    /// A game is in the early phase while `questions_asked <= early_until`.
    pub early_until: usize,
    /// A game is in the mid phase while `questions_asked <= mid_until`.
    pub mid_until: usize,
}

impl PhaseSchedule {
    /// Determine the phase for a given number of questions asked.
    pub fn phase_of(&self, questions_asked: usize) -> Phase {
        if questions_asked <= self.early_until {
            Phase::Early
        } else if questions_asked <= self.mid_until {
            Phase::Mid
        } else {
            Phase::Late
        }
    }
}

impl Default for PhaseSchedule {
    fn default() -> Self {
        PhaseSchedule {
            early_until: 3,
            mid_until: 8,
        }
    }
}

/// A point-in-time view of the game used by advisors and the policy agent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurnSnapshot {
    /// Shannon entropy of the belief distribution, in bits.
    pub entropy: f64,
    /// Probability of the current best candidate.
    pub top_probability: f64,
    /// Questions asked so far this game.
    pub questions_asked: usize,
    /// Candidates still plausibly in play.
    pub remaining_candidates: usize,
}

/// How a finished game ended, reported by the caller to `log_game`.
#[derive(Debug, Clone, PartialEq)]
pub struct GameOutcome {
    /// True if the engine identified the player's character.
    pub success: bool,
    /// The actual character, when the player revealed it.
    pub target: Option<EntityId>,
}

impl GameOutcome {
    /// A game the engine won by guessing `target`.
    pub fn won(target: EntityId) -> Self {
        GameOutcome {
            success: true,
            target: Some(target),
        }
    }

    /// A game the engine lost; `target` is the reveal, if the player gave one.
    pub fn lost(target: Option<EntityId>) -> Self {
        GameOutcome {
            success: false,
            target,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_parsing() {
        assert_eq!("yes".parse::<Answer>().unwrap(), Answer::Yes);
        assert_eq!("Y".parse::<Answer>().unwrap(), Answer::Yes);
        assert_eq!("no".parse::<Answer>().unwrap(), Answer::No);
        assert_eq!("probably".parse::<Answer>().unwrap(), Answer::ProbablyYes);
        assert_eq!(
            "probably_not".parse::<Answer>().unwrap(),
            Answer::ProbablyNo
        );
        assert_eq!("idk".parse::<Answer>().unwrap(), Answer::Unknown);
        assert_eq!(" Skip ".parse::<Answer>().unwrap(), Answer::Unknown);
        assert!("maybe".parse::<Answer>().is_err());
    }

    #[test]
    fn test_answer_polarity_and_strength() {
        assert_eq!(Answer::Yes.polarity(), Some(true));
        assert_eq!(Answer::ProbablyNo.polarity(), Some(false));
        assert_eq!(Answer::Unknown.polarity(), None);

        assert_eq!(Answer::Yes.strength(), 1.0);
        assert_eq!(Answer::ProbablyYes.strength(), 0.75);
        assert_eq!(Answer::Unknown.strength(), 0.5);
        assert_eq!(Answer::ProbablyNo.strength(), 0.25);
        assert_eq!(Answer::No.strength(), 0.0);
    }

    #[test]
    fn test_likelihood_validation() {
        assert!(LikelihoodPair::new(0.95, 0.05).is_ok());
        assert!(LikelihoodPair::new(0.0, 0.5).is_err());
        assert!(LikelihoodPair::new(0.5, 1.0).is_err());
        assert!(LikelihoodPair::new(f64::NAN, 0.5).is_err());
    }

    #[test]
    fn test_answer_model_pairs() {
        let model = AnswerModel::default();
        assert_eq!(
            model.pair_for(Answer::Yes).unwrap().matching(),
            likelihoods::CONFIDENT.matching()
        );
        assert_eq!(
            model.pair_for(Answer::ProbablyNo).unwrap().conflicting(),
            likelihoods::HESITANT.conflicting()
        );
        assert!(model.pair_for(Answer::Unknown).is_none());
    }

    #[test]
    fn test_phase_schedule_boundaries() {
        let schedule = PhaseSchedule::default();
        assert_eq!(schedule.phase_of(0), Phase::Early);
        assert_eq!(schedule.phase_of(3), Phase::Early);
        assert_eq!(schedule.phase_of(4), Phase::Mid);
        assert_eq!(schedule.phase_of(8), Phase::Mid);
        assert_eq!(schedule.phase_of(9), Phase::Late);
    }
}
