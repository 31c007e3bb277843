//! Serialization support for the question-selection policy.

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    error::Error,
    q_learning::agent::{AgentState, PolicyAgent},
};

/// Versioned snapshot of a trained policy.
///
/// This is the on-disk form handled by [`LearningRepository`]
/// implementations; the version field guards against loading snapshots
/// written by an incompatible release.
///
/// [`LearningRepository`]: crate::ports::LearningRepository
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedPolicy {
    pub version: u32,
    state: AgentState,
}

impl SavedPolicy {
    pub const VERSION: u32 = 1;

    /// Capture the agent's current learned state.
    pub fn from_agent(agent: &PolicyAgent) -> Self {
        Self {
            version: Self::VERSION,
            state: agent.export_state(),
        }
    }

    /// Rebuild an agent from the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnsupportedSnapshotVersion`] when the snapshot
    /// was written by an incompatible release.
    pub fn into_agent(self) -> Result<PolicyAgent> {
        if self.version != Self::VERSION {
            return Err(Error::UnsupportedSnapshotVersion {
                found: self.version,
                expected: Self::VERSION,
            });
        }
        Ok(PolicyAgent::from_state(self.state))
    }
}
