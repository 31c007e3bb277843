//! Q-learning policy for question selection
//!
//! This module implements an off-policy temporal difference learner that
//! discovers which traits are worth asking about in which situations.
//! States discretize the belief posture (entropy, confidence, progress),
//! actions are traits, and rewards favour fast correct guesses.
//!
//! ## Reward Scheme
//!
//! - Each asked question costs 1
//! - A correct guess earns `max(5, 100 / questions)`
//! - A finished game without a correct guess costs 50
//!
//! The terminal reward is discounted backward through the episode so the
//! opening questions of a short win are also reinforced.
//!
//! ## Usage Example
//!
//! ```no_run
//! use inquest::q_learning::{AgentParams, PolicyAgent};
//!
//! let mut agent = PolicyAgent::new(AgentParams::default()).with_seed(42);
//!
//! // During a game: record each asked question, then close the episode.
//! // agent.record_step(state, trait_id, inquest::q_learning::STEP_REWARD);
//! agent.end_episode(true, 9);
//! ```

pub mod agent;
pub mod q_table;
pub mod serialization;
pub mod state;

// Public re-exports
pub use agent::{AgentParams, AgentStats, FAILURE_REWARD, PolicyAgent, STEP_REWARD};
pub use q_table::QTable;
pub use serialization::SavedPolicy;
pub use state::StateKey;
