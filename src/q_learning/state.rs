//! Discrete state representation for the question-selection policy.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::types::TurnSnapshot;

/// Discretized game state used as a Q-table key.
///
/// Continuous belief features are bucketed so that similar situations
/// share learned values:
///
/// | Feature | Buckets |
/// |---------|---------|
/// | Entropy (bits) | 0-4, whole bits, capped |
/// | Top probability | 0-10, tenths |
/// | Questions asked | 0-5, groups of five |
/// | Remaining candidates | 0-5, groups of ten |
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateKey(String);

impl StateKey {
    /// Bucket a belief snapshot into a discrete state.
    pub fn from_snapshot(snapshot: &TurnSnapshot) -> Self {
        let entropy_bucket = (snapshot.entropy as usize).min(4);
        let probability_bucket = (snapshot.top_probability * 10.0) as usize;
        let questions_bucket = (snapshot.questions_asked / 5).min(5);
        let candidates_bucket = (snapshot.remaining_candidates / 10).min(5);
        Self(format!(
            "{entropy_bucket}_{probability_bucket}_{questions_bucket}_{candidates_bucket}"
        ))
    }

    /// Sentinel state for the step after a game ends.
    pub fn terminal() -> Self {
        Self("terminal".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
