//! Dependency injection container
//!
//! This module wires the domain layer to its infrastructure adapters.
//! The [`App`] owns the learning repository and the engine configuration
//! and hands out fully assembled engines; production code uses
//! [`App::new`] with the file-backed repository, tests use
//! [`App::for_testing`] to swap in an in-memory one.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    Result,
    adapters::{FileRepository, InMemoryRepository},
    app::config::EngineConfig,
    catalog::Catalog,
    engine::{Engine, Learning},
    error::Error,
    history::HistoryLearner,
    likelihoods::{CalibrationMap, SavedCalibration},
    ports::LearningRepository,
    q_learning::{PolicyAgent, SavedPolicy},
};

/// Default file name for the policy snapshot.
pub const POLICY_FILE: &str = "policy.msgpack";

/// Default file name for the calibration snapshot.
pub const CALIBRATION_FILE: &str = "calibration.msgpack";

/// Default file name for the append-only game log.
pub const GAME_LOG_FILE: &str = "games.jsonl";

/// Where one installation keeps its learned state.
#[derive(Debug, Clone)]
pub struct StatePaths {
    pub policy: PathBuf,
    pub calibration: PathBuf,
    pub game_log: PathBuf,
}

impl StatePaths {
    /// Conventional layout: all three files in one directory.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            policy: dir.join(POLICY_FILE),
            calibration: dir.join(CALIBRATION_FILE),
            game_log: dir.join(GAME_LOG_FILE),
        }
    }
}

/// A snapshot that is not there yet is normal on first run; anything
/// else gets surfaced as a warning before degrading to a fresh state.
fn is_missing(error: &Error) -> bool {
    match error {
        Error::SnapshotMissing { .. } => true,
        Error::Io { source, .. } => source.kind() == std::io::ErrorKind::NotFound,
        _ => false,
    }
}

/// Application container owning shared infrastructure.
pub struct App {
    repository: Arc<dyn LearningRepository + Send + Sync>,
    config: EngineConfig,
    default_seed: Option<u64>,
}

impl App {
    /// Production container backed by the file repository.
    pub fn new() -> Self {
        Self {
            repository: Arc::new(FileRepository::new()),
            config: EngineConfig::default(),
            default_seed: None,
        }
    }

    /// Builder for tests, defaulting to an in-memory repository.
    pub fn for_testing() -> AppBuilder {
        AppBuilder::default()
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_default_seed(mut self, seed: u64) -> Self {
        self.default_seed = Some(seed);
        self
    }

    pub fn repository(&self) -> Arc<dyn LearningRepository + Send + Sync> {
        Arc::clone(&self.repository)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn default_seed(&self) -> Option<u64> {
        self.default_seed
    }

    /// Load the catalog from a data directory.
    ///
    /// # Errors
    ///
    /// Returns an error when catalog files are missing or malformed; a
    /// broken catalog is fatal, unlike absent learned state.
    pub fn load_catalog(&self, data_dir: &Path) -> Result<Arc<Catalog>> {
        Ok(Arc::new(Catalog::load(data_dir)?))
    }

    /// Assemble the learning components from persisted state.
    ///
    /// Absent files degrade to empty state with neutral multipliers:
    /// a fresh agent, an unseeded-but-valid calibration map, an empty
    /// history. Corrupt or version-mismatched files do the same after
    /// a warning on stderr, so a bad snapshot never blocks play.
    pub fn load_learning(&self, catalog: &Catalog, paths: &StatePaths) -> Learning {
        let history = match self.repository.load_games(&paths.game_log) {
            Ok(games) => HistoryLearner::from_records(games),
            Err(error) => {
                eprintln!(
                    "Warning: could not read game log {:?} ({error}); starting with empty history",
                    paths.game_log
                );
                HistoryLearner::new()
            }
        };

        let fresh_agent = || {
            let agent = PolicyAgent::new(self.config.agent);
            match self.default_seed {
                Some(seed) => agent.with_seed(seed),
                None => agent,
            }
        };
        let agent = match self.repository.load_policy(&paths.policy) {
            Ok(saved) => saved.into_agent().unwrap_or_else(|error| {
                eprintln!("Warning: discarding policy snapshot ({error})");
                fresh_agent()
            }),
            Err(error) => {
                if !is_missing(&error) {
                    eprintln!("Warning: could not read policy snapshot ({error})");
                }
                fresh_agent()
            }
        };

        let calibration = match self.repository.load_calibration(&paths.calibration) {
            Ok(saved) => saved.into_map(catalog).unwrap_or_else(|error| {
                eprintln!("Warning: discarding calibration snapshot ({error})");
                CalibrationMap::seeded(catalog)
            }),
            Err(error) => {
                if !is_missing(&error) {
                    eprintln!("Warning: could not read calibration snapshot ({error})");
                }
                CalibrationMap::seeded(catalog)
            }
        };

        Learning::new()
            .with_history(history)
            .with_agent(agent)
            .with_calibration(calibration)
    }

    /// Build an engine over a catalog, restoring all learned state.
    pub fn build_engine(&self, catalog: Arc<Catalog>, paths: &StatePaths) -> Engine {
        let learning = self.load_learning(&catalog, paths);
        Engine::new(catalog, self.config.options(), learning)
    }

    /// Snapshot the engine's learned state through the repository.
    pub fn save_learning(&self, engine: &Engine, paths: &StatePaths) -> Result<()> {
        let learning = engine.learning();
        if let Some(agent) = &learning.agent {
            self.repository
                .save_policy(&SavedPolicy::from_agent(agent), &paths.policy)?;
        }
        if let Some(calibration) = &learning.calibration {
            self.repository.save_calibration(
                &SavedCalibration::from_map(calibration, engine.catalog()),
                &paths.calibration,
            )?;
        }
        Ok(())
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder used by [`App::for_testing`].
pub struct AppBuilder {
    repository: Arc<dyn LearningRepository + Send + Sync>,
    config: EngineConfig,
    default_seed: Option<u64>,
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self {
            repository: Arc::new(InMemoryRepository::new()),
            config: EngineConfig::default(),
            default_seed: None,
        }
    }
}

impl AppBuilder {
    pub fn with_repository<R>(mut self, repository: R) -> Self
    where
        R: LearningRepository + Send + Sync + 'static,
    {
        self.repository = Arc::new(repository);
        self
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_default_seed(mut self, seed: u64) -> Self {
        self.default_seed = Some(seed);
        self
    }

    pub fn build(self) -> App {
        App {
            repository: self.repository,
            config: self.config,
            default_seed: self.default_seed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EntityDef, QuestionDef};
    use crate::history::{GameRecord, RecordedStep};
    use crate::types::Answer;

    fn catalog() -> Arc<Catalog> {
        Arc::new(
            Catalog::from_parts(
                vec![
                    EntityDef {
                        id: "robin".to_string(),
                        traits: vec!["color_red".to_string()],
                    },
                    EntityDef {
                        id: "jay".to_string(),
                        traits: vec!["color_blue".to_string()],
                    },
                ],
                vec![
                    QuestionDef {
                        id: "q_red".to_string(),
                        trait_id: "color_red".to_string(),
                        text: "Is it red?".to_string(),
                    },
                    QuestionDef {
                        id: "q_blue".to_string(),
                        trait_id: "color_blue".to_string(),
                        text: "Is it blue?".to_string(),
                    },
                ],
                None,
            )
            .unwrap(),
        )
    }

    fn paths() -> StatePaths {
        StatePaths::in_dir(Path::new("state"))
    }

    #[test]
    fn test_build_engine_with_no_saved_state() {
        let app = App::for_testing().with_default_seed(7).build();
        let engine = app.build_engine(catalog(), &paths());

        let learning = engine.learning();
        assert_eq!(learning.history.game_count(), 0);
        assert_eq!(learning.agent.as_ref().unwrap().episodes(), 0);
        assert!(learning.calibration.is_some());
    }

    #[test]
    fn test_save_then_rebuild_restores_learned_state() {
        let app = App::for_testing().with_default_seed(7).build();
        let paths = paths();

        let mut engine = app.build_engine(catalog(), &paths);
        if let Some(agent) = engine.learning_mut().agent.as_mut() {
            agent.end_episode(true, 4);
            agent.end_episode(false, 20);
        }
        app.save_learning(&engine, &paths).unwrap();

        let restored = app.build_engine(catalog(), &paths);
        assert_eq!(restored.learning().agent.as_ref().unwrap().episodes(), 2);
    }

    #[test]
    fn test_game_log_feeds_history() {
        let app = App::for_testing().build();
        let paths = paths();

        let record = GameRecord::new(
            Some("robin".into()),
            true,
            Vec::new(),
            vec![RecordedStep {
                question: "q_red".into(),
                trait_id: "color_red".into(),
                answer: Answer::Yes,
                entropy_delta: 1.0,
            }],
        );
        app.repository()
            .append_game(&record, &paths.game_log)
            .unwrap();

        let engine = app.build_engine(catalog(), &paths);
        assert_eq!(engine.learning().history.game_count(), 1);
    }

    #[test]
    fn test_custom_config_flows_into_engine() {
        let config = EngineConfig::new().with_max_questions(25);
        let app = App::for_testing().with_config(config).build();
        let engine = app.build_engine(catalog(), &paths());
        assert_eq!(engine.options().max_questions, 25);
    }
}
