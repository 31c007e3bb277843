//! Q-table implementation for the question-selection policy

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{identifiers::TraitId, q_learning::state::StateKey};

/// Q-table mapping discrete states to per-trait action values
///
/// Values are stored per state so the learning update can take the
/// maximum over every action seen in a successor state, including ones
/// that are no longer askable in the current game.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QTable {
    /// Q-values: state -> trait -> expected return
    q_values: HashMap<String, HashMap<TraitId, f64>>,
    /// Learning rate α
    learning_rate: f64,
    /// Discount factor γ
    discount_factor: f64,
}

impl QTable {
    /// Create a new Q-table. Unseen state-action pairs value 0.
    pub fn new(learning_rate: f64, discount_factor: f64) -> Self {
        Self {
            q_values: HashMap::new(),
            learning_rate,
            discount_factor,
        }
    }

    pub fn discount_factor(&self) -> f64 {
        self.discount_factor
    }

    /// Get Q-value for a state-action pair
    pub fn get(&self, state: &StateKey, action: &TraitId) -> f64 {
        self.q_values
            .get(state.as_str())
            .and_then(|actions| actions.get(action))
            .copied()
            .unwrap_or(0.0)
    }

    /// Set Q-value for a state-action pair
    pub fn set(&mut self, state: StateKey, action: TraitId, value: f64) {
        self.q_values
            .entry(state.into_string())
            .or_default()
            .insert(action, value);
    }

    /// Maximum Q-value over every action recorded for a state
    ///
    /// Returns 0 for states with no recorded actions, including the
    /// terminal sentinel.
    pub fn max_q(&self, state: &StateKey) -> f64 {
        self.q_values
            .get(state.as_str())
            .map(|actions| actions.values().copied().fold(f64::NEG_INFINITY, f64::max))
            .filter(|max| max.is_finite())
            .unwrap_or(0.0)
    }

    /// Highest-valued action among the given candidates
    ///
    /// Ties break toward the earlier candidate so selection is
    /// deterministic for a fixed candidate order.
    pub fn greedy_action<'a>(
        &self,
        state: &StateKey,
        candidates: &'a [TraitId],
    ) -> Option<&'a TraitId> {
        let mut best: Option<(&TraitId, f64)> = None;
        for action in candidates {
            let value = self.get(state, action);
            if best.is_none_or(|(_, best_value)| value > best_value) {
                best = Some((action, value));
            }
        }
        best.map(|(action, _)| action)
    }

    /// Q-learning update: off-policy TD control
    ///
    /// Q(s,a) ← Q(s,a) + α[r + γ max_a' Q(s',a') - Q(s,a)]
    pub fn q_learning_update(
        &mut self,
        state: StateKey,
        action: TraitId,
        reward: f64,
        next_state: &StateKey,
    ) {
        let current_q = self.get(&state, &action);
        let max_next_q = self.max_q(next_state);
        let td_target = reward + self.discount_factor * max_next_q;
        let td_error = td_target - current_q;
        let new_q = current_q + self.learning_rate * td_error;
        self.set(state, action, new_q);
    }

    /// Discard all learned values
    pub fn reset(&mut self) {
        self.q_values.clear();
    }

    /// Total number of state-action values stored
    pub fn size(&self) -> usize {
        self.q_values.values().map(HashMap::len).sum()
    }

    /// Number of distinct states with at least one value
    pub fn state_count(&self) -> usize {
        self.q_values.len()
    }
}
