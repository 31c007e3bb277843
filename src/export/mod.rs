//! Export functionality for analysis and research
//!
//! This module writes the game history log and the learned trait table out
//! as CSV or JSON so runs can be compared in external tooling.

mod tables;

pub use tables::{GameLogExporter, GameRow, TraitTableExporter};
