//! Engine configuration
//!
//! Every empirically tuned constant in the system lives here as data
//! with a default, so experiments can override any of them from a JSON
//! file or from code without touching the modules that consume them.

use std::{fs::File, io::BufReader, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    Result,
    engine::EngineOptions,
    error::Error,
    guess::GuessPolicy,
    q_learning::AgentParams,
    selector::SelectorConfig,
    strategy::StrategyTable,
    types::AnswerModel,
};

/// Complete tuning surface for one engine plus its policy agent.
///
/// The engine half converts into [`EngineOptions`]; the `agent` half is
/// consumed wherever a fresh [`crate::q_learning::PolicyAgent`] is built.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Hard budget of questions per game, confirmations included.
    pub max_questions: usize,
    /// Guesses allowed before the engine stops volunteering them.
    pub max_guesses: usize,
    /// Belief multiplier applied to an entity after a failed guess.
    pub wrong_guess_penalty: f64,
    /// Multiplier applied when a confirmation question comes back negative.
    pub confirmation_penalty: f64,
    /// Belief multiplier applied to a revealed target mid-game.
    pub reveal_boost: f64,
    /// One surviving candidate above this probability ends the search.
    pub single_candidate_threshold: f64,
    pub answer_model: AnswerModel,
    pub guess_policy: GuessPolicy,
    pub selector: SelectorConfig,
    pub strategy: StrategyTable,
    pub agent: AgentParams,
}

impl Default for EngineConfig {
    fn default() -> Self {
        let options = EngineOptions::default();
        Self {
            max_questions: options.max_questions,
            max_guesses: options.max_guesses,
            wrong_guess_penalty: options.wrong_guess_penalty,
            confirmation_penalty: options.confirmation_penalty,
            reveal_boost: options.reveal_boost,
            single_candidate_threshold: options.single_candidate_threshold,
            answer_model: options.answer_model,
            guess_policy: options.guess_policy,
            selector: options.selector,
            strategy: options.strategy,
            agent: AgentParams::default(),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_questions(mut self, max_questions: usize) -> Self {
        self.max_questions = max_questions;
        self
    }

    pub fn with_max_guesses(mut self, max_guesses: usize) -> Self {
        self.max_guesses = max_guesses;
        self
    }

    pub fn with_guess_policy(mut self, policy: GuessPolicy) -> Self {
        self.guess_policy = policy;
        self
    }

    pub fn with_strategy(mut self, strategy: StrategyTable) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_agent_params(mut self, params: AgentParams) -> Self {
        self.agent = params;
        self
    }

    /// Materialize the engine half of the configuration.
    pub fn options(&self) -> EngineOptions {
        EngineOptions {
            max_questions: self.max_questions,
            max_guesses: self.max_guesses,
            answer_model: self.answer_model,
            guess_policy: self.guess_policy,
            selector: self.selector.clone(),
            strategy: self.strategy.clone(),
            wrong_guess_penalty: self.wrong_guess_penalty,
            confirmation_penalty: self.confirmation_penalty,
            reveal_boost: self.reveal_boost,
            single_candidate_threshold: self.single_candidate_threshold,
        }
    }

    /// Load a configuration from a JSON file.
    ///
    /// Missing fields fall back to their defaults, so a config file only
    /// needs to name the values it overrides.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open config file {path:?}"),
            source,
        })?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|source| Error::Io {
            operation: format!("create config file {path:?}"),
            source,
        })?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Reject configurations that would wedge or corrupt a game.
    pub fn validate(&self) -> Result<()> {
        if self.max_questions == 0 {
            return Err(Error::InvalidConfiguration {
                message: "max_questions must be at least 1".to_string(),
            });
        }
        for (name, value) in [
            ("wrong_guess_penalty", self.wrong_guess_penalty),
            ("confirmation_penalty", self.confirmation_penalty),
            ("reveal_boost", self.reveal_boost),
        ] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(Error::InvalidConfiguration {
                    message: format!("{name} must be a positive finite number, got {value}"),
                });
            }
        }
        if !(0.0..=1.0).contains(&self.single_candidate_threshold) {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "single_candidate_threshold must lie in [0, 1], got {}",
                    self.single_candidate_threshold
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_default_config_matches_engine_defaults() {
        let config = EngineConfig::default();
        let options = config.options();
        let reference = EngineOptions::default();

        assert_eq!(options.max_questions, reference.max_questions);
        assert_eq!(options.max_guesses, reference.max_guesses);
        assert_eq!(options.guess_policy, reference.guess_policy);
        assert_eq!(options.strategy, reference.strategy);
        assert_eq!(options.wrong_guess_penalty, reference.wrong_guess_penalty);
    }

    #[test]
    fn test_builders_override_fields() {
        let config = EngineConfig::new()
            .with_max_questions(25)
            .with_max_guesses(5);
        let options = config.options();
        assert_eq!(options.max_questions, 25);
        assert_eq!(options.max_guesses, 5);
    }

    #[test]
    fn test_json_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let config = EngineConfig::new().with_max_questions(25);
        config.save(&path).unwrap();

        let restored = EngineConfig::load(&path).unwrap();
        assert_eq!(restored.max_questions, 25);
        assert_eq!(restored.strategy, config.strategy);
        assert_eq!(restored.guess_policy, config.guess_policy);
    }

    #[test]
    fn test_partial_config_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("partial.json");
        std::fs::write(&path, r#"{"max_questions": 30}"#).unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.max_questions, 30);
        assert_eq!(config.max_guesses, EngineConfig::default().max_guesses);
    }

    #[test]
    fn test_validate_rejects_degenerate_values() {
        let mut config = EngineConfig::default();
        config.max_questions = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.wrong_guess_penalty = 0.0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.single_candidate_threshold = 1.5;
        assert!(config.validate().is_err());
    }
}
