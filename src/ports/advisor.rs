//! Advisor port - abstraction for pluggable selection influence
//!
//! This port defines the interface for components that reshape question
//! scores during selection, allowing learned signals (game history,
//! reinforcement policies) to steer the picker without coupling it to
//! any particular learning mechanism.

use crate::{catalog::Question, types::TurnSnapshot};

/// Advisor trait - multiplies into a question's selection score
///
/// Advisors are consulted once per candidate question each turn. The
/// selector multiplies every advisor's factor into the question's
/// information-gain score, so a factor of 1.0 leaves the ranking
/// untouched, above 1.0 promotes the question and below 1.0 demotes it.
///
/// # Design Philosophy
///
/// This trait represents a **port** in hexagonal architecture - a boundary
/// between the selection core and external learning mechanisms. Different
/// learning strategies are **adapters** that implement this port.
///
/// # Examples
///
/// ```no_run
/// use inquest::{
///     catalog::Question,
///     ports::SelectionAdvisor,
///     types::TurnSnapshot,
/// };
///
/// struct FlatAdvisor;
///
/// impl SelectionAdvisor for FlatAdvisor {
///     fn name(&self) -> &str {
///         "flat"
///     }
///
///     fn multiplier(&self, _snapshot: &TurnSnapshot, _question: &Question) -> f64 {
///         1.0
///     }
/// }
/// ```
pub trait SelectionAdvisor: Send {
    /// Get the advisor's name.
    ///
    /// Used for identification in logging and verbose selection output.
    fn name(&self) -> &str;

    /// Score factor for one candidate question at the current turn.
    ///
    /// # Parameters
    ///
    /// * `snapshot` - Belief summary at the moment of selection
    /// * `question` - The candidate under consideration
    ///
    /// # Returns
    ///
    /// A non-negative factor multiplied into the question's score.
    /// Return 1.0 to leave the question's ranking unchanged.
    fn multiplier(&self, snapshot: &TurnSnapshot, question: &Question) -> f64;
}
