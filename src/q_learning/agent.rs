//! Q-learning agent for question selection
//!
//! The agent observes a discretized belief state each turn, picks (or
//! nudges) the trait to ask about, and learns from finished games via a
//! discounted backward replay of the episode.

use rand::{Rng, SeedableRng, rngs::StdRng, seq::IndexedRandom};
use serde::{Deserialize, Serialize};

use crate::{
    catalog::Question,
    identifiers::TraitId,
    ports::SelectionAdvisor,
    q_learning::{q_table::QTable, state::StateKey},
    types::TurnSnapshot,
};

/// Reward per asked question, applied to every recorded step.
pub const STEP_REWARD: f64 = -1.0;

/// Terminal penalty when the game ends without a correct guess.
pub const FAILURE_REWARD: f64 = -50.0;

/// Episodes required before the stats report learning as active.
pub const LEARNING_ACTIVE_AFTER: u64 = 5;

/// Hyperparameters for the question-selection policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AgentParams {
    /// Learning rate α
    pub learning_rate: f64,
    /// Discount factor γ
    pub discount_factor: f64,
    /// Initial exploration rate
    pub epsilon: f64,
    /// Multiplicative decay per episode
    pub epsilon_decay: f64,
    /// Exploration floor
    pub min_epsilon: f64,
}

impl Default for AgentParams {
    fn default() -> Self {
        Self {
            learning_rate: 0.15,
            discount_factor: 0.97,
            epsilon: 0.25,
            epsilon_decay: 0.992,
            min_epsilon: 0.05,
        }
    }
}

/// Snapshot of everything the agent has learned, for persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct AgentState {
    pub q_table: QTable,
    pub epsilon: f64,
    pub initial_epsilon: f64,
    pub epsilon_decay: f64,
    pub min_epsilon: f64,
    pub episodes: u64,
    pub rng_seed: Option<u64>,
}

/// Aggregate agent statistics, as reported by the stats command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentStats {
    pub episodes: u64,
    pub epsilon: f64,
    pub q_table_size: usize,
    pub unique_states: usize,
    pub learning_active: bool,
}

fn build_rng(seed: Option<u64>) -> StdRng {
    if let Some(seed) = seed {
        StdRng::seed_from_u64(seed)
    } else {
        StdRng::from_rng(&mut rand::rng())
    }
}

/// Q-learning agent (off-policy TD control)
///
/// During a game the agent records (state, trait, reward) steps. When the
/// game ends the episode is replayed backward: the terminal reward is
/// discounted toward earlier steps and each step gets a standard
/// Q-learning update against its successor state.
#[derive(Debug, Clone)]
pub struct PolicyAgent {
    q_table: QTable,
    epsilon: f64,
    initial_epsilon: f64,
    epsilon_decay: f64,
    min_epsilon: f64,
    episodes: u64,
    trajectory: Vec<(StateKey, TraitId, f64)>,
    rng: StdRng,
    rng_seed: Option<u64>,
}

impl PolicyAgent {
    /// Create a fresh agent with the given hyperparameters.
    pub fn new(params: AgentParams) -> Self {
        Self {
            q_table: QTable::new(params.learning_rate, params.discount_factor),
            epsilon: params.epsilon,
            initial_epsilon: params.epsilon,
            epsilon_decay: params.epsilon_decay,
            min_epsilon: params.min_epsilon,
            episodes: 0,
            trajectory: Vec::new(),
            rng: build_rng(None),
            rng_seed: None,
        }
    }

    /// Seed the exploration RNG for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self.rng_seed = Some(seed);
        self
    }

    /// ε-greedy action selection over the askable traits.
    ///
    /// With `explore` false the agent always exploits, which is what
    /// evaluation runs use. Returns `None` when nothing is askable.
    pub fn choose_action(
        &mut self,
        state: &StateKey,
        candidates: &[TraitId],
        explore: bool,
    ) -> Option<TraitId> {
        if candidates.is_empty() {
            return None;
        }
        if explore && self.rng.random::<f64>() < self.epsilon {
            return candidates.choose(&mut self.rng).cloned();
        }
        self.q_table.greedy_action(state, candidates).cloned()
    }

    /// Learned value of asking one trait in one state.
    pub fn action_value(&self, state: &StateKey, action: &TraitId) -> f64 {
        self.q_table.get(state, action)
    }

    /// Record one asked question for the current episode.
    pub fn record_step(&mut self, state: StateKey, action: TraitId, reward: f64) {
        self.trajectory.push((state, action, reward));
    }

    /// Finish the episode and fold its outcome into the Q-table.
    ///
    /// Wins earn a terminal reward inversely proportional to the number
    /// of questions (a five-question game is worth 20, anything slower
    /// than twenty questions bottoms out at 5); losses cost 50. The
    /// reward is discounted backward through the trajectory so early
    /// questions share in the outcome.
    pub fn end_episode(&mut self, success: bool, total_questions: usize) {
        if self.trajectory.is_empty() {
            return;
        }

        let terminal_reward = if success {
            (100.0 / total_questions.max(1) as f64).max(5.0)
        } else {
            FAILURE_REWARD
        };

        let trajectory = std::mem::take(&mut self.trajectory);
        let mut cumulative_reward = terminal_reward;

        for i in (0..trajectory.len()).rev() {
            let (state, action, step_reward) = trajectory[i].clone();
            let total_reward = step_reward + cumulative_reward;

            let next_state = if i + 1 < trajectory.len() {
                trajectory[i + 1].0.clone()
            } else {
                StateKey::terminal()
            };

            self.q_table
                .q_learning_update(state, action, total_reward, &next_state);

            cumulative_reward *= self.q_table.discount_factor();
        }

        self.epsilon = (self.epsilon * self.epsilon_decay).max(self.min_epsilon);
        self.episodes += 1;
    }

    /// Episodes completed over the agent's lifetime.
    pub fn episodes(&self) -> u64 {
        self.episodes
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn q_table_size(&self) -> usize {
        self.q_table.size()
    }

    /// Whether enough episodes have run for the policy to matter.
    pub fn learning_active(&self) -> bool {
        self.episodes >= LEARNING_ACTIVE_AFTER
    }

    pub fn stats(&self) -> AgentStats {
        AgentStats {
            episodes: self.episodes,
            epsilon: self.epsilon,
            q_table_size: self.q_table.size(),
            unique_states: self.q_table.state_count(),
            learning_active: self.learning_active(),
        }
    }

    /// Drop everything learned and restore the initial exploration rate.
    pub fn reset(&mut self) {
        self.q_table.reset();
        self.epsilon = self.initial_epsilon;
        self.episodes = 0;
        self.trajectory.clear();
        self.rng = build_rng(self.rng_seed);
    }

    pub(crate) fn export_state(&self) -> AgentState {
        AgentState {
            q_table: self.q_table.clone(),
            epsilon: self.epsilon,
            initial_epsilon: self.initial_epsilon,
            epsilon_decay: self.epsilon_decay,
            min_epsilon: self.min_epsilon,
            episodes: self.episodes,
            rng_seed: self.rng_seed,
        }
    }

    pub(crate) fn from_state(state: AgentState) -> Self {
        Self {
            q_table: state.q_table,
            epsilon: state.epsilon,
            initial_epsilon: state.initial_epsilon,
            epsilon_decay: state.epsilon_decay,
            min_epsilon: state.min_epsilon,
            episodes: state.episodes,
            trajectory: Vec::new(),
            rng: build_rng(state.rng_seed),
            rng_seed: state.rng_seed,
        }
    }
}

impl SelectionAdvisor for PolicyAgent {
    fn name(&self) -> &str {
        "policy"
    }

    /// Nudge a question's score by its learned value, clamped to [0.5, 2].
    ///
    /// A Q-value of zero is neutral, so an untrained agent leaves the
    /// information-gain ranking untouched.
    fn multiplier(&self, snapshot: &TurnSnapshot, question: &Question) -> f64 {
        let state = StateKey::from_snapshot(snapshot);
        let value = self.action_value(&state, question.trait_id());
        (1.0 + value / 100.0).clamp(0.5, 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(entropy: f64) -> TurnSnapshot {
        TurnSnapshot {
            entropy,
            top_probability: 0.2,
            questions_asked: 0,
            remaining_candidates: 20,
        }
    }

    fn state(entropy: f64) -> StateKey {
        StateKey::from_snapshot(&snapshot(entropy))
    }

    #[test]
    fn test_successful_episode_rewards_backward() {
        let mut agent = PolicyAgent::new(AgentParams {
            learning_rate: 1.0,
            discount_factor: 0.5,
            epsilon: 0.0,
            epsilon_decay: 1.0,
            min_epsilon: 0.0,
        });

        let first = state(3.0);
        let second = state(2.0);
        agent.record_step(first.clone(), TraitId::new("t_a"), STEP_REWARD);
        agent.record_step(second.clone(), TraitId::new("t_b"), STEP_REWARD);
        agent.end_episode(true, 2);

        // Terminal reward = max(5, 100/2) = 50.
        // Last step: Q = -1 + 50 = 49 (terminal successor contributes 0).
        let last_q = agent.action_value(&second, &TraitId::new("t_b"));
        assert!((last_q - 49.0).abs() < 1e-9);

        // First step: reward -1 + 0.5*50 = 24, target 24 + 0.5*49 = 48.5.
        let first_q = agent.action_value(&first, &TraitId::new("t_a"));
        assert!((first_q - 48.5).abs() < 1e-9);

        assert_eq!(agent.episodes(), 1);
    }

    #[test]
    fn test_failed_episode_penalizes() {
        let mut agent = PolicyAgent::new(AgentParams {
            learning_rate: 1.0,
            discount_factor: 0.5,
            epsilon: 0.0,
            epsilon_decay: 1.0,
            min_epsilon: 0.0,
        });

        let only = state(3.0);
        agent.record_step(only.clone(), TraitId::new("t_a"), STEP_REWARD);
        agent.end_episode(false, 1);

        // Q = -1 + (-50) = -51.
        let q = agent.action_value(&only, &TraitId::new("t_a"));
        assert!((q + 51.0).abs() < 1e-9);
    }

    #[test]
    fn test_slow_win_floors_at_five() {
        let mut agent = PolicyAgent::new(AgentParams {
            learning_rate: 1.0,
            discount_factor: 1.0,
            ..AgentParams::default()
        });

        let s = state(1.0);
        agent.record_step(s.clone(), TraitId::new("t_a"), 0.0);
        agent.end_episode(true, 40);

        // 100/40 = 2.5 is floored to 5.
        assert!((agent.action_value(&s, &TraitId::new("t_a")) - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_epsilon_decays_per_episode() {
        let mut agent = PolicyAgent::new(AgentParams {
            epsilon: 0.25,
            epsilon_decay: 0.5,
            min_epsilon: 0.1,
            ..AgentParams::default()
        });

        agent.record_step(state(1.0), TraitId::new("t_a"), STEP_REWARD);
        agent.end_episode(true, 1);
        assert!((agent.epsilon() - 0.125).abs() < 1e-9);

        agent.record_step(state(1.0), TraitId::new("t_a"), STEP_REWARD);
        agent.end_episode(true, 1);
        assert!((agent.epsilon() - 0.1).abs() < 1e-9);

        // An empty episode changes nothing.
        agent.end_episode(true, 1);
        assert_eq!(agent.episodes(), 2);
    }

    #[test]
    fn test_exploit_prefers_learned_action() {
        let mut agent = PolicyAgent::new(AgentParams::default()).with_seed(7);
        let s = state(3.0);
        let good = TraitId::new("t_good");
        let bad = TraitId::new("t_bad");

        agent.record_step(s.clone(), good.clone(), STEP_REWARD);
        agent.end_episode(true, 1);

        let chosen = agent
            .choose_action(&s, &[bad.clone(), good.clone()], false)
            .unwrap();
        assert_eq!(chosen, good);

        assert_eq!(agent.choose_action(&s, &[], true), None);
    }

    #[test]
    fn test_advisor_multiplier_clamps() {
        let mut agent = PolicyAgent::new(AgentParams {
            learning_rate: 1.0,
            discount_factor: 1.0,
            ..AgentParams::default()
        });

        // Fresh agent is neutral.
        let question_source = crate::catalog::Catalog::from_parts(
            vec![crate::catalog::EntityDef {
                id: "x".to_string(),
                traits: vec!["t_a".to_string()],
            }],
            vec![crate::catalog::QuestionDef {
                id: "q".to_string(),
                trait_id: "t_a".to_string(),
                text: String::new(),
            }],
            None,
        )
        .unwrap();
        let question = question_source.question(0);

        let fresh_snapshot = snapshot(3.0);
        assert!((agent.multiplier(&fresh_snapshot, question) - 1.0).abs() < 1e-9);

        // A heavily penalized action clamps at the lower bound.
        agent.record_step(state(3.0), TraitId::new("t_a"), STEP_REWARD);
        agent.end_episode(false, 1);
        assert!((agent.multiplier(&fresh_snapshot, question) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_reset_restores_initial_conditions() {
        let mut agent = PolicyAgent::new(AgentParams {
            epsilon: 0.25,
            epsilon_decay: 0.5,
            min_epsilon: 0.01,
            ..AgentParams::default()
        });

        agent.record_step(state(1.0), TraitId::new("t_a"), STEP_REWARD);
        agent.end_episode(true, 1);
        assert!(agent.q_table_size() > 0);

        agent.reset();
        assert_eq!(agent.q_table_size(), 0);
        assert_eq!(agent.episodes(), 0);
        assert!((agent.epsilon() - 0.25).abs() < 1e-9);
        assert!(!agent.learning_active());
    }
}
