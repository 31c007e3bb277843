//! Per-session game engine.
//!
//! An [`Engine`] is one explicit, caller-owned playthrough context: it
//! wires the belief state, question selector, stopping policy and the
//! learning components together behind a small surface. Nothing here is
//! global; construct one engine per session (or reuse it across games
//! with [`Engine::reset`]) and drop it when done.
//!
//! Two levels of API are exposed. The primitives (`select_next`,
//! `update`, `should_guess`, `best_guess`, `penalize`, `boost`,
//! `log_game`) give callers full control. On top of them,
//! [`Engine::next_prompt`] and the report methods drive the whole
//! turn state machine, including confirmation questions, wrong-guess
//! recovery and the final-guess endgame, so interactive and simulated
//! games share one flow.

use std::sync::Arc;

use crate::{
    beliefs::BeliefState,
    catalog::Catalog,
    guess::{self, GuessPolicy},
    history::{GameRecord, HistoryLearner, MIN_GAMES_FOR_BOOST, RecordedStep},
    identifiers::{EntityId, QuestionId},
    likelihoods::CalibrationMap,
    ports::SelectionAdvisor,
    q_learning::{PolicyAgent, STEP_REWARD, StateKey},
    selector::{QuestionSelector, SelectorConfig},
    strategy::StrategyTable,
    types::{Answer, AnswerModel, TurnSnapshot},
};

/// Tuned constants for one engine instance.
///
/// Every value here is an empirical default, not a derived optimum;
/// callers are expected to override them freely.
#[derive(Debug, Clone)]
pub struct EngineOptions {
    /// Hard budget of questions per game, confirmations included.
    pub max_questions: usize,
    /// Guesses allowed before the engine stops volunteering them.
    pub max_guesses: usize,
    pub answer_model: AnswerModel,
    pub guess_policy: GuessPolicy,
    pub selector: SelectorConfig,
    pub strategy: StrategyTable,
    /// Belief multiplier applied to an entity after a failed guess.
    pub wrong_guess_penalty: f64,
    /// Harsher multiplier applied when a confirmation question comes
    /// back negative, since the player directly contradicted the trait.
    pub confirmation_penalty: f64,
    /// Belief multiplier applied to a revealed target mid-game.
    pub reveal_boost: f64,
    /// When exactly one entity stays above this probability, the engine
    /// stops asking and guesses it.
    pub single_candidate_threshold: f64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            max_questions: 20,
            max_guesses: 3,
            answer_model: AnswerModel::default(),
            guess_policy: GuessPolicy::default(),
            selector: SelectorConfig::default(),
            strategy: StrategyTable::default(),
            wrong_guess_penalty: 1e-3,
            confirmation_penalty: 1e-4,
            reveal_boost: 1e3,
            single_candidate_threshold: 0.01,
        }
    }
}

impl EngineOptions {
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

    pub fn with_answer_model(mut self, model: AnswerModel) -> Self {
        self.answer_model = model;
        self
    }

    pub fn with_selector(mut self, selector: SelectorConfig) -> Self {
        self.selector = selector;
        self
    }
}

/// Learning components attached to an engine.
///
/// The history learner is always present (an empty one contributes
/// neutral multipliers); the policy agent and calibration map are
/// optional. Presence is enablement: an attached agent records steps
/// and closes episodes, an attached calibration map replaces the fixed
/// likelihood pairs with learned per-entity yes-probabilities.
#[derive(Debug, Default)]
pub struct Learning {
    pub history: HistoryLearner,
    pub agent: Option<PolicyAgent>,
    pub calibration: Option<CalibrationMap>,
}

impl Learning {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_agent(mut self, agent: PolicyAgent) -> Self {
        self.agent = Some(agent);
        self
    }

    pub fn with_calibration(mut self, calibration: CalibrationMap) -> Self {
        self.calibration = Some(calibration);
        self
    }

    pub fn with_history(mut self, history: HistoryLearner) -> Self {
        self.history = history;
        self
    }

    /// Advisors to consult during selection, in application order.
    pub fn advisors(&self) -> Vec<&dyn SelectionAdvisor> {
        let mut advisors: Vec<&dyn SelectionAdvisor> = vec![&self.history];
        if let Some(agent) = &self.agent {
            advisors.push(agent);
        }
        advisors
    }
}

/// Where the session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Collecting answers.
    Asking,
    /// A confirmation question for this entity is in flight.
    Confirming { entity_ix: usize },
    /// The game ended with a correct guess.
    GuessedCorrect { entity_ix: usize },
    /// A guess failed; the entity was penalized and play continues.
    GuessedIncorrectContinuing,
    /// The game ended without finding the target.
    Exhausted,
}

/// What the engine wants from the caller next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Prompt {
    /// Put this question to the player and report the answer.
    Ask {
        question_ix: usize,
        /// True when this validates a pending guess rather than probing.
        confirmation: bool,
    },
    /// Present this guess and report whether it was right.
    Guess {
        entity_ix: usize,
        confidence: f64,
        /// True when the game ends after this guess either way.
        terminal: bool,
    },
    /// The game is over; nothing left to do but [`Engine::log_game`].
    Done,
}

/// One playthrough context: beliefs, selection, stopping and learning.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use inquest::catalog::{Catalog, EntityDef, QuestionDef};
/// use inquest::engine::{Engine, EngineOptions, Learning};
/// use inquest::types::Answer;
///
/// let catalog = Arc::new(Catalog::from_parts(
///     vec![
///         EntityDef { id: "robin".into(), traits: vec!["color_red".into()] },
///         EntityDef { id: "jay".into(), traits: vec!["color_blue".into()] },
///     ],
///     vec![
///         QuestionDef {
///             id: "q_red".into(),
///             trait_id: "color_red".into(),
///             text: "Is it red?".into(),
///         },
///         QuestionDef {
///             id: "q_blue".into(),
///             trait_id: "color_blue".into(),
///             text: "Is it blue?".into(),
///         },
///     ],
///     None,
/// )?);
///
/// let mut engine = Engine::new(catalog, EngineOptions::default(), Learning::new());
/// let question_ix = engine.select_next().unwrap();
/// engine.answer_question(question_ix, Answer::Yes);
/// assert!(engine.should_guess());
/// # Ok::<(), inquest::Error>(())
/// ```
pub struct Engine {
    catalog: Arc<Catalog>,
    options: EngineOptions,
    selector: QuestionSelector,
    beliefs: BeliefState,
    learning: Learning,
    state: SessionState,
    steps: Vec<RecordedStep>,
    wrong_guesses: Vec<usize>,
    guesses_made: usize,
    target: Option<usize>,
    pending_terminal: bool,
}

impl Engine {
    pub fn new(catalog: Arc<Catalog>, options: EngineOptions, learning: Learning) -> Self {
        let selector = QuestionSelector::new(
            options.strategy.compile(&catalog),
            options.selector.clone(),
        );
        let priors = effective_priors(&catalog, &learning.history);
        Self {
            beliefs: BeliefState::new(&priors),
            catalog,
            options,
            selector,
            learning,
            state: SessionState::Asking,
            steps: Vec::new(),
            wrong_guesses: Vec::new(),
            guesses_made: 0,
            target: None,
            pending_terminal: false,
        }
    }

    /// Start a fresh game, re-deriving priors from the current history.
    pub fn reset(&mut self) {
        let priors = effective_priors(&self.catalog, &self.learning.history);
        self.beliefs = BeliefState::new(&priors);
        self.state = SessionState::Asking;
        self.steps.clear();
        self.wrong_guesses.clear();
        self.guesses_made = 0;
        self.target = None;
        self.pending_terminal = false;
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn beliefs(&self) -> &BeliefState {
        &self.beliefs
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn learning(&self) -> &Learning {
        &self.learning
    }

    pub fn learning_mut(&mut self) -> &mut Learning {
        &mut self.learning
    }

    /// Take the learning components back, consuming the engine.
    pub fn into_learning(self) -> Learning {
        self.learning
    }

    /// Whether the game has reached a terminal state.
    pub fn is_over(&self) -> bool {
        matches!(
            self.state,
            SessionState::GuessedCorrect { .. } | SessionState::Exhausted
        )
    }

    /// Turn summary: entropy, top probability, asked and remaining counts.
    pub fn snapshot(&self) -> TurnSnapshot {
        self.selector.snapshot(&self.beliefs)
    }

    pub fn entropy(&self) -> f64 {
        self.beliefs.entropy()
    }

    /// Plausible candidates under the stopping policy's threshold.
    pub fn remaining(&self) -> usize {
        self.beliefs
            .remaining(self.options.guess_policy.plausible_threshold)
    }

    /// Best question to ask next by shaped information gain, or `None`
    /// when every question has been asked or filtered out.
    pub fn select_next(&self) -> Option<usize> {
        let advisors = self.learning.advisors();
        self.selector
            .select_next(&self.catalog, &self.beliefs, &advisors)
    }

    /// Pick the next question with the policy agent's epsilon-greedy rule.
    ///
    /// The agent chooses among the traits of the currently askable
    /// questions; without an attached agent this degrades to the shaped
    /// information-gain choice.
    pub fn select_with_policy(&mut self, explore: bool) -> Option<usize> {
        let ranked = {
            let advisors = self.learning.advisors();
            self.selector.ranked(&self.catalog, &self.beliefs, &advisors)
        };
        if ranked.is_empty() {
            return None;
        }
        let Some(agent) = self.learning.agent.as_mut() else {
            return ranked.first().map(|scored| scored.index);
        };

        let traits: Vec<_> = ranked
            .iter()
            .map(|scored| self.catalog.question(scored.index).trait_id().clone())
            .collect();
        let state = StateKey::from_snapshot(&self.selector.snapshot(&self.beliefs));
        let chosen = agent.choose_action(&state, &traits, explore)?;
        ranked
            .iter()
            .find(|scored| self.catalog.question(scored.index).trait_id() == &chosen)
            .map(|scored| scored.index)
    }

    /// Fold an answer into the beliefs, addressing the question by id.
    ///
    /// Unknown ids and repeated questions are warned about and ignored;
    /// the belief state never observes them.
    pub fn update(&mut self, question_id: &QuestionId, answer: Answer) {
        match self.catalog.question_ix(question_id) {
            Some(question_ix) => self.apply_answer(question_ix, answer),
            None => eprintln!("Warning: ignoring answer for unknown question '{question_id}'"),
        }
    }

    /// Fold an answer into the beliefs, addressing the question by index.
    pub fn answer_question(&mut self, question_ix: usize, answer: Answer) {
        self.apply_answer(question_ix, answer);
    }

    fn apply_answer(&mut self, question_ix: usize, answer: Answer) {
        if question_ix >= self.catalog.question_count() {
            eprintln!("Warning: ignoring answer for out-of-range question index {question_ix}");
            return;
        }
        if self.beliefs.is_asked(question_ix) {
            eprintln!(
                "Warning: question '{}' was already asked, ignoring repeat answer",
                self.catalog.question(question_ix).id()
            );
            return;
        }

        let snapshot_before = self.selector.snapshot(&self.beliefs);
        let question = self.catalog.question(question_ix);

        if let Some(calibration) = &self.learning.calibration {
            let yes_probabilities = calibration.yes_probabilities(question_ix);
            self.beliefs
                .update_calibrated(question_ix, &yes_probabilities, answer);
        } else {
            self.beliefs.update(
                question_ix,
                question.holders(),
                answer,
                &self.options.answer_model,
            );
        }

        self.steps.push(RecordedStep {
            question: question.id().clone(),
            trait_id: question.trait_id().clone(),
            answer,
            entropy_delta: snapshot_before.entropy - self.beliefs.entropy(),
        });

        if let SessionState::Confirming { entity_ix } = self.state {
            // A denied confirmation rules the candidate out far harder
            // than a failed guess; any other answer lets the guess
            // proceed.
            if answer.polarity() == Some(false) {
                self.beliefs.scale(entity_ix, self.options.confirmation_penalty);
                self.state = SessionState::Asking;
            }
            return;
        }

        if self.state == SessionState::GuessedIncorrectContinuing {
            self.state = SessionState::Asking;
        }
        if let Some(agent) = &mut self.learning.agent {
            agent.record_step(
                StateKey::from_snapshot(&snapshot_before),
                question.trait_id().clone(),
                STEP_REWARD,
            );
        }
    }

    /// Whether the stopping policy would commit to a guess right now.
    pub fn should_guess(&self) -> bool {
        self.options.guess_policy.evaluate(&self.beliefs)
    }

    /// The current leading candidate with its probability.
    pub fn best_guess(&self) -> Option<(usize, f64)> {
        self.beliefs.top()
    }

    pub fn top_k(&self, k: usize) -> Vec<(usize, f64)> {
        self.beliefs.top_k(k)
    }

    /// Confirmation question for the current leading candidate.
    pub fn confirmation_question(&self) -> Option<usize> {
        let (entity_ix, _) = self.beliefs.top()?;
        guess::confirmation_question(&self.catalog, &self.beliefs, entity_ix)
    }

    /// Damp an entity's belief after an incorrect guess.
    pub fn penalize(&mut self, entity_id: &EntityId) {
        match self.catalog.entity_ix(entity_id) {
            Some(entity_ix) => {
                self.beliefs.scale(entity_ix, self.options.wrong_guess_penalty);
            }
            None => eprintln!("Warning: cannot penalize unknown entity '{entity_id}'"),
        }
    }

    /// Concentrate belief on an entity known to be the target.
    pub fn boost(&mut self, entity_id: &EntityId) {
        match self.catalog.entity_ix(entity_id) {
            Some(entity_ix) => {
                self.beliefs.scale(entity_ix, self.options.reveal_boost);
            }
            None => eprintln!("Warning: cannot boost unknown entity '{entity_id}'"),
        }
    }

    /// Record the player's revealed character, boosting it while the
    /// game is still live so follow-up guesses find it.
    ///
    /// The query goes through the catalog's lenient lookup (exact id,
    /// then substring, then word overlap). Returns the resolved index,
    /// or `None` when nothing matches.
    pub fn reveal_target(&mut self, query: &str) -> Option<usize> {
        let entity_ix = {
            let entity = self.catalog.find_entity(query)?;
            self.catalog.entity_ix(entity.id())?
        };
        self.target = Some(entity_ix);
        if !self.is_over() {
            self.beliefs.scale(entity_ix, self.options.reveal_boost);
        }
        Some(entity_ix)
    }

    /// Decide the next move of the session state machine.
    ///
    /// The order of checks mirrors one turn of play: a pending confirmed
    /// guess goes out first, then budget exhaustion, then the
    /// single-survivor shortcut, then the endgame retry after a failed
    /// guess, then the regular stop-or-ask decision.
    pub fn next_prompt(&mut self) -> Prompt {
        if self.is_over() {
            return Prompt::Done;
        }
        if let SessionState::Confirming { entity_ix } = self.state {
            return self.guess_prompt(entity_ix, false);
        }
        let Some((top_ix, _)) = self.beliefs.top() else {
            return Prompt::Done;
        };
        let asked = self.beliefs.asked_count();

        if asked >= self.options.max_questions {
            return self.guess_prompt(top_ix, true);
        }
        if self
            .beliefs
            .remaining(self.options.single_candidate_threshold)
            == 1
        {
            return self.guess_prompt(top_ix, true);
        }
        if self.state == SessionState::GuessedIncorrectContinuing
            && asked + 2 >= self.options.max_questions
        {
            return self.guess_prompt(top_ix, true);
        }
        if self.guesses_made < self.options.max_guesses && self.should_guess() {
            if let Some(question_ix) =
                guess::confirmation_question(&self.catalog, &self.beliefs, top_ix)
            {
                self.state = SessionState::Confirming { entity_ix: top_ix };
                return Prompt::Ask {
                    question_ix,
                    confirmation: true,
                };
            }
            return self.guess_prompt(top_ix, false);
        }
        match self.select_next() {
            Some(question_ix) => Prompt::Ask {
                question_ix,
                confirmation: false,
            },
            None => self.guess_prompt(top_ix, true),
        }
    }

    fn guess_prompt(&mut self, entity_ix: usize, terminal: bool) -> Prompt {
        self.pending_terminal = terminal;
        Prompt::Guess {
            entity_ix,
            confidence: self.beliefs.probability(entity_ix),
            terminal,
        }
    }

    /// Report the outcome of a prompted guess.
    ///
    /// A wrong non-terminal guess penalizes the entity and keeps the
    /// game going; a wrong terminal guess ends it.
    pub fn report_guess(&mut self, entity_ix: usize, correct: bool) {
        self.guesses_made += 1;
        let terminal = std::mem::take(&mut self.pending_terminal);
        if correct {
            self.target = Some(entity_ix);
            self.state = SessionState::GuessedCorrect { entity_ix };
            return;
        }
        self.wrong_guesses.push(entity_ix);
        if terminal {
            self.state = SessionState::Exhausted;
        } else {
            self.beliefs.scale(entity_ix, self.options.wrong_guess_penalty);
            self.state = SessionState::GuessedIncorrectContinuing;
        }
    }

    /// Close out the game: build its record and feed every attached
    /// learning component.
    ///
    /// The history learner and calibration map only see games whose
    /// target is known (guessed correctly or revealed); the policy agent
    /// closes its episode either way. Call once per game, then
    /// [`Engine::reset`].
    pub fn log_game(&mut self) -> GameRecord {
        let success = matches!(self.state, SessionState::GuessedCorrect { .. });
        let target_id = self.target.map(|ix| self.catalog.entity(ix).id().clone());
        let wrong_guesses = self
            .wrong_guesses
            .iter()
            .map(|&ix| self.catalog.entity(ix).id().clone())
            .collect();
        let record = GameRecord::new(
            target_id,
            success,
            wrong_guesses,
            std::mem::take(&mut self.steps),
        );

        if let Some(target_ix) = self.target {
            self.learning.history.log_game(record.clone());
            if let Some(calibration) = &mut self.learning.calibration {
                calibration.learn_from_game(target_ix, self.beliefs.asked());
            }
        }
        if let Some(agent) = &mut self.learning.agent {
            agent.end_episode(success, record.questions_asked());
        }
        record
    }
}

/// Priors for a new game: the catalog's own weights until enough games
/// are logged, then the history learner's frequency blend.
fn effective_priors(catalog: &Catalog, history: &HistoryLearner) -> Vec<f64> {
    if history.game_count() >= MIN_GAMES_FOR_BOOST {
        history.adaptive_priors(catalog)
    } else {
        catalog.priors().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EntityDef, QuestionDef};
    use crate::q_learning::AgentParams;

    fn entity(id: &str, traits: &[&str]) -> EntityDef {
        EntityDef {
            id: id.to_string(),
            traits: traits.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn question(id: &str, trait_id: &str) -> QuestionDef {
        QuestionDef {
            id: id.to_string(),
            trait_id: trait_id.to_string(),
            text: format!("{trait_id}?"),
        }
    }

    fn two_entity_catalog() -> Arc<Catalog> {
        Arc::new(
            Catalog::from_parts(
                vec![entity("a", &["trait_x"]), entity("b", &["trait_y"])],
                vec![question("q_x", "trait_x"), question("q_y", "trait_y")],
                None,
            )
            .unwrap(),
        )
    }

    fn engine(catalog: Arc<Catalog>) -> Engine {
        Engine::new(catalog, EngineOptions::default(), Learning::new())
    }

    #[test]
    fn test_decisive_answer_reaches_guess() {
        let mut engine = engine(two_entity_catalog());

        // Both questions split the field evenly; ties go to the lower
        // index.
        let first = engine.select_next().unwrap();
        assert_eq!(first, 0);

        engine.answer_question(first, Answer::Yes);
        let (top_ix, confidence) = engine.best_guess().unwrap();
        assert_eq!(top_ix, 0);
        assert!((confidence - 0.95).abs() < 1e-9);
        assert!(engine.should_guess());
    }

    #[test]
    fn test_unknown_answer_consumes_question_only() {
        let mut engine = engine(two_entity_catalog());
        let before = engine.beliefs().probabilities().to_vec();

        engine.answer_question(0, Answer::Unknown);
        assert_eq!(engine.beliefs().asked_count(), 1);
        assert_eq!(engine.beliefs().probabilities(), before.as_slice());
    }

    #[test]
    fn test_unknown_question_id_is_ignored() {
        let mut engine = engine(two_entity_catalog());
        engine.update(&QuestionId::new("no_such_question"), Answer::Yes);
        engine.answer_question(99, Answer::Yes);
        assert_eq!(engine.beliefs().asked_count(), 0);
    }

    #[test]
    fn test_repeat_answer_is_ignored() {
        let mut engine = engine(two_entity_catalog());
        engine.answer_question(0, Answer::Yes);
        let after_first = engine.beliefs().probabilities().to_vec();

        engine.answer_question(0, Answer::No);
        assert_eq!(engine.beliefs().asked_count(), 1);
        assert_eq!(engine.beliefs().probabilities(), after_first.as_slice());
    }

    #[test]
    fn test_single_survivor_triggers_terminal_guess() {
        let mut engine = engine(two_entity_catalog());
        engine.answer_question(0, Answer::Yes);
        engine.answer_question(1, Answer::No);

        match engine.next_prompt() {
            Prompt::Guess {
                entity_ix,
                terminal,
                ..
            } => {
                assert_eq!(entity_ix, 0);
                assert!(terminal);
            }
            other => panic!("expected a terminal guess, got {other:?}"),
        }
    }

    #[test]
    fn test_denied_confirmation_penalizes_and_resumes() {
        let catalog = Arc::new(
            Catalog::from_parts(
                vec![
                    entity("a", &["trait_x", "trait_u"]),
                    entity("b", &[]),
                    entity("c", &[]),
                ],
                vec![question("q_x", "trait_x"), question("q_u", "trait_u")],
                None,
            )
            .unwrap(),
        );
        // Drop the early guard so a 0.90 lead can trigger a guess on the
        // very first turn.
        let policy = GuessPolicy {
            early_question_guard: 0,
            ..GuessPolicy::default()
        };
        let options = EngineOptions::default().with_guess_policy(policy);
        let mut engine = Engine::new(catalog, options, Learning::new());

        engine.answer_question(0, Answer::Yes);
        assert!(engine.best_guess().unwrap().1 > 0.90);

        // The engine wants to validate its guess with the unique trait.
        let prompt = engine.next_prompt();
        assert_eq!(
            prompt,
            Prompt::Ask {
                question_ix: 1,
                confirmation: true
            }
        );
        assert_eq!(engine.state(), SessionState::Confirming { entity_ix: 0 });

        // Denial crushes the candidate and play resumes.
        engine.answer_question(1, Answer::No);
        assert_eq!(engine.state(), SessionState::Asking);
        assert!(engine.beliefs().probability(0) < 0.01);
        assert_eq!(engine.beliefs().asked_count(), 2);
    }

    #[test]
    fn test_wrong_guess_then_reveal_recovers() {
        let catalog = Arc::new(
            Catalog::from_parts(
                vec![
                    entity("a", &["trait_x"]),
                    entity("b", &["trait_x"]),
                    entity("c", &[]),
                ],
                vec![question("q_x", "trait_x")],
                None,
            )
            .unwrap(),
        );
        let mut engine = Engine::new(catalog, EngineOptions::default(), Learning::new());
        engine.answer_question(0, Answer::Yes);

        let (top_ix, _) = engine.best_guess().unwrap();
        engine.report_guess(top_ix, false);
        assert_eq!(engine.state(), SessionState::GuessedIncorrectContinuing);
        assert!(engine.beliefs().probability(top_ix) < 0.01);

        let revealed = engine.reveal_target("b").unwrap();
        assert_eq!(revealed, 1);
        assert_eq!(engine.best_guess().unwrap().0, 1);
    }

    #[test]
    fn test_exhausted_budget_forces_guess() {
        let catalog = two_entity_catalog();
        let options = EngineOptions::default().with_max_questions(1);
        let mut engine = Engine::new(catalog, options, Learning::new());

        engine.answer_question(0, Answer::ProbablyYes);
        match engine.next_prompt() {
            Prompt::Guess { terminal, .. } => assert!(terminal),
            other => panic!("expected a forced guess, got {other:?}"),
        }

        let (top_ix, _) = engine.best_guess().unwrap();
        engine.report_guess(top_ix, false);
        assert_eq!(engine.state(), SessionState::Exhausted);
        assert_eq!(engine.next_prompt(), Prompt::Done);
    }

    #[test]
    fn test_log_game_feeds_learning() {
        let catalog = two_entity_catalog();
        let learning = Learning::new()
            .with_agent(PolicyAgent::new(AgentParams::default()).with_seed(7))
            .with_calibration(CalibrationMap::seeded(&catalog));
        let mut engine = Engine::new(Arc::clone(&catalog), EngineOptions::default(), learning);

        engine.answer_question(0, Answer::Yes);
        let (top_ix, _) = engine.best_guess().unwrap();
        engine.report_guess(top_ix, true);

        let record = engine.log_game();
        assert!(record.success);
        assert_eq!(record.target.as_ref().map(|id| id.as_str()), Some("a"));
        assert_eq!(record.questions_asked(), 1);

        let learning = engine.into_learning();
        assert_eq!(learning.history.game_count(), 1);
        assert_eq!(learning.agent.unwrap().episodes(), 1);
        // The confirmed yes sharpened the target's calibration cell.
        let calibration = learning.calibration.unwrap();
        assert!(calibration.mean(0, 0) > 0.9);
    }

    #[test]
    fn test_unrevealed_game_skips_history() {
        let mut engine = engine(two_entity_catalog());
        engine.answer_question(0, Answer::Yes);

        let record = engine.log_game();
        assert!(record.target.is_none());
        assert!(!record.success);
        assert_eq!(engine.learning().history.game_count(), 0);
    }

    #[test]
    fn test_policy_selection_matches_gain_without_agent() {
        let mut engine = engine(two_entity_catalog());
        let by_gain = engine.select_next();
        let by_policy = engine.select_with_policy(false);
        assert_eq!(by_gain, by_policy);
    }

    #[test]
    fn test_reset_clears_session_state() {
        let mut engine = engine(two_entity_catalog());
        engine.answer_question(0, Answer::Yes);
        let (top_ix, _) = engine.best_guess().unwrap();
        engine.report_guess(top_ix, true);
        engine.log_game();

        engine.reset();
        assert_eq!(engine.state(), SessionState::Asking);
        assert_eq!(engine.beliefs().asked_count(), 0);
        assert_eq!(engine.remaining(), 2);
    }
}
