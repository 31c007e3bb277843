//! Observer port - abstraction for game observation and data collection
//!
//! This port defines the interface for observing simulation events,
//! allowing composable data collection without coupling the game loop
//! to specific output formats or metrics.

use crate::{
    Result,
    catalog::Question,
    history::GameRecord,
    types::{Answer, TurnSnapshot},
};

/// Observer trait for monitoring simulated game runs
///
/// Observers can be composed to collect different types of data during a
/// run. Examples include:
/// - Progress bars for user feedback
/// - JSONL export for analysis
/// - Aggregate outcome tracking for evaluation
///
/// # Design Philosophy
///
/// This trait represents a **port** in hexagonal architecture - a boundary
/// between the game pipeline and external observation mechanisms.
/// Different observation strategies are **adapters** that implement this
/// port.
///
/// # Event Sequence
///
/// The observer methods are called in the following order:
/// 1. `on_run_start(total_games)` - Once at the beginning
/// 2. For each game:
///    - `on_game_start(game_num)`
///    - `on_step(...)` - For each question asked
///    - `on_game_end(game_num, record)`
/// 3. `on_run_end()` - Once at the end
///
/// # Examples
///
/// ```no_run
/// use inquest::{
///     history::GameRecord,
///     ports::GameObserver,
/// };
///
/// struct CustomObserver {
///     wins: usize,
/// }
///
/// impl GameObserver for CustomObserver {
///     fn on_game_end(
///         &mut self,
///         _game_num: usize,
///         record: &GameRecord,
///     ) -> inquest::Result<()> {
///         if record.success {
///             self.wins += 1;
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait GameObserver: Send {
    /// Called when a run starts.
    ///
    /// This is the first method called in the observation lifecycle.
    ///
    /// # Parameters
    ///
    /// * `total_games` - Total number of games that will be played
    ///
    /// # Default Implementation
    ///
    /// Does nothing. Override to initialize observation state.
    fn on_run_start(&mut self, _total_games: usize) -> Result<()> {
        Ok(())
    }

    /// Called when a game starts.
    ///
    /// # Parameters
    ///
    /// * `game_num` - Index of the game (0-based)
    ///
    /// # Default Implementation
    ///
    /// Does nothing. Override to reset per-game state.
    fn on_game_start(&mut self, _game_num: usize) -> Result<()> {
        Ok(())
    }

    /// Called for each question asked in a game.
    ///
    /// This method is invoked after the answer has been folded into the
    /// belief state, so the snapshot reflects the post-answer posture.
    ///
    /// # Parameters
    ///
    /// * `game_num` - Index of the current game
    /// * `step_num` - Question number within the game (0-based)
    /// * `question` - The question that was asked
    /// * `answer` - The answer that was given
    /// * `snapshot` - Belief summary after the update
    ///
    /// # Default Implementation
    ///
    /// Does nothing. Override to observe individual turns.
    fn on_step(
        &mut self,
        _game_num: usize,
        _step_num: usize,
        _question: &Question,
        _answer: Answer,
        _snapshot: &TurnSnapshot,
    ) -> Result<()> {
        Ok(())
    }

    /// Called when a game ends.
    ///
    /// # Parameters
    ///
    /// * `game_num` - Index of the completed game
    /// * `record` - The finished game as it will be logged
    ///
    /// # Default Implementation
    ///
    /// Does nothing. Override to record game outcomes.
    fn on_game_end(&mut self, _game_num: usize, _record: &GameRecord) -> Result<()> {
        Ok(())
    }

    /// Called when the run completes.
    ///
    /// This is the last method called in the observation lifecycle.
    /// Use this to finalize outputs, close files, or display summaries.
    ///
    /// # Default Implementation
    ///
    /// Does nothing. Override to perform cleanup or final reporting.
    fn on_run_end(&mut self) -> Result<()> {
        Ok(())
    }
}
