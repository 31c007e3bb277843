//! Self-play simulation pipeline
//!
//! Runs batches of games against a scripted oracle: each game draws a
//! secret target from the catalog, answers questions truthfully (with
//! optional noise), and feeds the finished game back into the engine's
//! learning components.

use std::{fmt, path::PathBuf, str::FromStr, sync::Arc};

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    Result,
    catalog::Catalog,
    engine::{Engine, Prompt},
    error::Error,
    history::GameRecord,
    likelihoods::SavedCalibration,
    ports::{GameObserver, LearningRepository},
    q_learning::SavedPolicy,
    types::Answer,
};

/// How the engine picks the next question during a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionMode {
    /// Rank questions by expected information gain.
    InformationGain,
    /// Let the policy agent choose the trait to ask about.
    AgentPolicy,
}

impl fmt::Display for SelectionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SelectionMode::InformationGain => "information_gain",
            SelectionMode::AgentPolicy => "agent_policy",
        };
        write!(f, "{s}")
    }
}

impl FromStr for SelectionMode {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gain" | "information_gain" => Ok(SelectionMode::InformationGain),
            "policy" | "agent" | "agent_policy" => Ok(SelectionMode::AgentPolicy),
            other => Err(Error::ParseSelectionMode {
                input: other.to_string(),
                expected: "information_gain, agent_policy".to_string(),
            }),
        }
    }
}

/// Simulation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Number of games to play
    pub num_games: usize,

    /// Random seed for target draws and answer noise
    pub seed: Option<u64>,

    /// Probability that the oracle flips a truthful answer
    pub noise: f64,

    /// Question selection mode
    pub mode: SelectionMode,

    /// Whether the policy agent may explore (ignored without an agent)
    pub explore: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            num_games: 500,
            seed: None,
            noise: 0.1,
            mode: SelectionMode::InformationGain,
            explore: true,
        }
    }
}

/// Result of a simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationResult {
    /// Total games played
    pub total_games: usize,

    /// Games ending in a correct guess
    pub wins: usize,

    /// Games ending without finding the target
    pub losses: usize,

    /// Win rate
    pub win_rate: f64,

    /// Loss rate
    pub loss_rate: f64,

    /// Average questions per game, confirmations included
    pub avg_questions: f64,
}

impl SimulationResult {
    /// Create a new simulation result
    pub fn new(total_games: usize, wins: usize, losses: usize, question_counts: &[usize]) -> Self {
        let win_rate = if total_games > 0 {
            wins as f64 / total_games as f64
        } else {
            0.0
        };
        let loss_rate = if total_games > 0 {
            losses as f64 / total_games as f64
        } else {
            0.0
        };
        let avg_questions = if question_counts.is_empty() {
            0.0
        } else {
            question_counts.iter().sum::<usize>() as f64 / question_counts.len() as f64
        };

        Self {
            total_games,
            wins,
            losses,
            win_rate,
            loss_rate,
            avg_questions,
        }
    }

    /// Save result to JSON file
    pub fn save<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, self)?;
        Ok(())
    }

    /// Load result from JSON file
    pub fn load<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let result = serde_json::from_reader(file)?;
        Ok(result)
    }
}

/// Periodic snapshotting of learned state during a run.
///
/// Long runs survive interruption by writing the policy and calibration
/// snapshots every `interval` games, plus once more after the last game.
pub struct CheckpointConfig {
    repository: Arc<dyn LearningRepository + Send + Sync>,
    policy_path: PathBuf,
    calibration_path: PathBuf,
    interval: usize,
}

impl CheckpointConfig {
    /// Checkpoint through the given repository every five games.
    pub fn new(
        repository: Arc<dyn LearningRepository + Send + Sync>,
        policy_path: PathBuf,
        calibration_path: PathBuf,
    ) -> Self {
        Self {
            repository,
            policy_path,
            calibration_path,
            interval: 5,
        }
    }

    /// Override the checkpoint interval.
    pub fn with_interval(mut self, interval: usize) -> Self {
        assert!(interval > 0, "checkpoint interval must be a positive integer");
        self.interval = interval;
        self
    }
}

/// Simulation pipeline driving an engine through scripted games
pub struct SimulationPipeline {
    config: SimulationConfig,
    observers: Vec<Box<dyn GameObserver>>,
    checkpoints: Option<CheckpointConfig>,
}

impl SimulationPipeline {
    /// Create a new simulation pipeline
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            observers: Vec::new(),
            checkpoints: None,
        }
    }

    /// Add an observer to the pipeline
    pub fn with_observer(mut self, observer: Box<dyn GameObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Snapshot learned state at regular intervals during the run
    pub fn with_checkpoints(mut self, checkpoints: CheckpointConfig) -> Self {
        self.checkpoints = Some(checkpoints);
        self
    }

    /// Run the configured number of games against the oracle.
    ///
    /// The engine's learning components accumulate across games: priors
    /// adapt, the calibration map absorbs every revealed target, and the
    /// policy agent closes one episode per game.
    pub fn run(&mut self, engine: &mut Engine) -> Result<SimulationResult> {
        self.seed_agent(engine);
        let mut rng = match self.config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_rng(&mut rand::rng()),
        };

        let mut wins = 0;
        let mut losses = 0;
        let mut total_games: usize = 0;
        let mut last_checkpoint = 0;
        let mut question_counts = Vec::with_capacity(self.config.num_games);

        // Notify observers of run start
        for observer in &mut self.observers {
            observer.on_run_start(self.config.num_games)?;
        }

        // Play games
        for game_num in 0..self.config.num_games {
            let record = self.play_game(game_num, engine, &mut rng)?;

            if record.success {
                wins += 1;
            } else {
                losses += 1;
            }
            question_counts.push(record.questions_asked());

            // Notify observers of game end
            for observer in &mut self.observers {
                observer.on_game_end(game_num, &record)?;
            }

            total_games += 1;

            if let Some(cp) = &self.checkpoints {
                if total_games.is_multiple_of(cp.interval) {
                    save_checkpoint(cp, engine)?;
                    last_checkpoint = total_games;
                }
            }
        }

        // Final checkpoint for the tail of the run
        if let Some(cp) = &self.checkpoints {
            if total_games > 0 && last_checkpoint != total_games {
                save_checkpoint(cp, engine)?;
            }
        }

        // Notify observers of run end
        for observer in &mut self.observers {
            observer.on_run_end()?;
        }

        Ok(SimulationResult::new(
            total_games,
            wins,
            losses,
            &question_counts,
        ))
    }

    fn seed_agent(&self, engine: &mut Engine) {
        if let Some(seed) = self.config.seed {
            let learning = engine.learning_mut();
            if let Some(agent) = learning.agent.take() {
                learning.agent = Some(agent.with_seed(seed.wrapping_add(1)));
            }
        }
    }

    fn pick_question(&self, engine: &mut Engine, suggested: usize) -> usize {
        match self.config.mode {
            SelectionMode::InformationGain => suggested,
            SelectionMode::AgentPolicy => engine
                .select_with_policy(self.config.explore)
                .unwrap_or(suggested),
        }
    }

    /// Truthful answer for the hidden target, with a noise-chance flip.
    fn oracle_answer(
        &self,
        catalog: &Catalog,
        question_ix: usize,
        target_ix: usize,
        rng: &mut StdRng,
    ) -> Answer {
        let truthful = catalog.question(question_ix).holders()[target_ix];
        let flip = rng.random::<f64>() < self.config.noise;
        if truthful != flip {
            Answer::Yes
        } else {
            Answer::No
        }
    }

    fn play_game(
        &mut self,
        game_num: usize,
        engine: &mut Engine,
        rng: &mut StdRng,
    ) -> Result<GameRecord> {
        // Notify observers of game start
        for observer in &mut self.observers {
            observer.on_game_start(game_num)?;
        }

        engine.reset();
        let target_ix = rng.random_range(0..engine.catalog().entity_count());
        let target_id = engine.catalog().entity(target_ix).id().clone();

        let mut step_num = 0;
        loop {
            match engine.next_prompt() {
                Prompt::Ask {
                    question_ix,
                    confirmation,
                } => {
                    // A confirmation validates one specific trait; only
                    // regular probes are open to the agent's policy.
                    let question_ix = if confirmation {
                        question_ix
                    } else {
                        self.pick_question(engine, question_ix)
                    };
                    let answer = self.oracle_answer(engine.catalog(), question_ix, target_ix, rng);
                    engine.answer_question(question_ix, answer);

                    let snapshot = engine.snapshot();
                    let question = engine.catalog().question(question_ix);
                    for observer in &mut self.observers {
                        observer.on_step(game_num, step_num, question, answer, &snapshot)?;
                    }
                    step_num += 1;
                }
                Prompt::Guess { entity_ix, .. } => {
                    engine.report_guess(entity_ix, entity_ix == target_ix);
                }
                Prompt::Done => break,
            }
        }

        // The oracle always discloses the target so lost games still
        // teach the calibration map and the prior blend.
        engine.reveal_target(target_id.as_str());
        Ok(engine.log_game())
    }
}

fn save_checkpoint(cp: &CheckpointConfig, engine: &Engine) -> Result<()> {
    let learning = engine.learning();
    if let Some(agent) = &learning.agent {
        cp.repository
            .save_policy(&SavedPolicy::from_agent(agent), &cp.policy_path)?;
    }
    if let Some(calibration) = &learning.calibration {
        cp.repository.save_calibration(
            &SavedCalibration::from_map(calibration, engine.catalog()),
            &cp.calibration_path,
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::{EntityDef, QuestionDef};
    use crate::engine::{EngineOptions, Learning};
    use crate::q_learning::{AgentParams, PolicyAgent};

    fn catalog() -> Arc<Catalog> {
        let entities = ["robin", "eagle", "shark", "salmon"]
            .iter()
            .enumerate()
            .map(|(ix, id)| EntityDef {
                id: id.to_string(),
                traits: vec![format!("trait_{ix}")],
            })
            .collect();
        let questions = (0..4)
            .map(|ix| QuestionDef {
                id: format!("q_{ix}"),
                trait_id: format!("trait_{ix}"),
                text: format!("Has trait {ix}?"),
            })
            .collect();
        Arc::new(Catalog::from_parts(entities, questions, None).unwrap())
    }

    #[test]
    fn test_simulation_pipeline() {
        let config = SimulationConfig {
            num_games: 10,
            seed: Some(42),
            noise: 0.0,
            mode: SelectionMode::InformationGain,
            explore: false,
        };

        let mut pipeline = SimulationPipeline::new(config);
        let mut engine = Engine::new(catalog(), EngineOptions::default(), Learning::new());

        let result = pipeline.run(&mut engine).unwrap();

        assert_eq!(result.total_games, 10);
        assert_eq!(result.wins + result.losses, 10);
        // A truthful oracle over fully separable entities never loses.
        assert_eq!(result.wins, 10);
        assert!(result.avg_questions > 0.0);
        assert_eq!(engine.learning().history.game_count(), 10);
    }

    #[test]
    fn test_agent_policy_mode_closes_episodes() {
        let config = SimulationConfig {
            num_games: 5,
            seed: Some(7),
            noise: 0.1,
            mode: SelectionMode::AgentPolicy,
            explore: true,
        };

        let learning =
            Learning::new().with_agent(PolicyAgent::new(AgentParams::default()).with_seed(1));
        let mut engine = Engine::new(catalog(), EngineOptions::default(), learning);

        let mut pipeline = SimulationPipeline::new(config);
        let result = pipeline.run(&mut engine).unwrap();

        assert_eq!(result.total_games, 5);
        let agent = engine.learning().agent.as_ref().unwrap();
        assert_eq!(agent.episodes(), 5);
        assert!(agent.q_table_size() > 0);
    }

    #[test]
    fn test_seeded_runs_are_reproducible() {
        let config = SimulationConfig {
            num_games: 8,
            seed: Some(99),
            noise: 0.2,
            mode: SelectionMode::InformationGain,
            explore: false,
        };

        let run = |config: SimulationConfig| {
            let mut engine = Engine::new(catalog(), EngineOptions::default(), Learning::new());
            SimulationPipeline::new(config).run(&mut engine).unwrap()
        };

        let first = run(config.clone());
        let second = run(config);
        assert_eq!(first.wins, second.wins);
        assert!((first.avg_questions - second.avg_questions).abs() < 1e-12);
    }

    #[test]
    fn test_checkpoints_snapshot_learned_state() {
        use crate::adapters::InMemoryRepository;
        use crate::likelihoods::CalibrationMap;
        use std::path::Path;

        let catalog = catalog();
        let repo = Arc::new(InMemoryRepository::new());
        let learning = Learning::new()
            .with_agent(PolicyAgent::new(AgentParams::default()).with_seed(2))
            .with_calibration(CalibrationMap::seeded(&catalog));
        let mut engine = Engine::new(catalog, EngineOptions::default(), learning);

        let config = SimulationConfig {
            num_games: 7,
            seed: Some(13),
            noise: 0.0,
            mode: SelectionMode::InformationGain,
            explore: false,
        };
        let checkpoints = CheckpointConfig::new(
            repo.clone(),
            PathBuf::from("policy.msgpack"),
            PathBuf::from("calibration.msgpack"),
        );

        SimulationPipeline::new(config)
            .with_checkpoints(checkpoints)
            .run(&mut engine)
            .unwrap();

        // Interval save at game 5 plus the final save at game 7.
        assert!(repo.contains(Path::new("policy.msgpack")));
        assert!(repo.contains(Path::new("calibration.msgpack")));
        let saved = repo
            .load_policy(Path::new("policy.msgpack"))
            .unwrap()
            .into_agent()
            .unwrap();
        assert_eq!(saved.episodes(), 7);
    }

    #[test]
    fn test_selection_mode_parsing() {
        assert_eq!(
            "gain".parse::<SelectionMode>().unwrap(),
            SelectionMode::InformationGain
        );
        assert_eq!(
            "agent_policy".parse::<SelectionMode>().unwrap(),
            SelectionMode::AgentPolicy
        );
        assert_eq!(SelectionMode::AgentPolicy.to_string(), "agent_policy");
        assert!("greedy".parse::<SelectionMode>().is_err());
    }
}
