//! inquest - adaptive character-guessing engine
//!
//! This crate provides:
//! - Bayesian belief tracking over a catalog of characters
//! - Information-gain question selection with phase-aware weighting
//! - An adaptive stopping policy for when to commit to a guess
//! - Three learners: history effectiveness, a Q-learning question
//!   policy, and per-pair Beta answer calibration
//! - Self-play training and evaluation pipelines with persistence

pub mod adapters;
pub mod analysis;
pub mod app;
pub mod beliefs;
pub mod catalog;
pub mod cli;
pub mod engine;
pub mod error;
pub mod export;
pub mod guess;
pub mod history;
pub mod identifiers;
pub mod likelihoods;
pub mod pipeline;
pub mod ports;
pub mod q_learning;
pub mod selector;
pub mod strategy;
pub mod types;
pub mod utils;

pub use app::{App, EngineConfig, StatePaths};
pub use beliefs::BeliefState;
pub use catalog::Catalog;
pub use engine::{Engine, EngineOptions, Learning, Prompt, SessionState};
pub use error::{Error, Result};
pub use identifiers::{EntityId, QuestionId, TraitId};
pub use types::{Answer, GameOutcome, Phase, TurnSnapshot};
