//! Analysis tools for studying game logs and learned policies
//!
//! This module aggregates logged games and the state of the three learners
//! into serializable reports for the stats command and the exporters.

pub mod stats;

pub use stats::{
    GameLogAnalysis, LearningReport, TraitReport, UnsettledCell, rank_traits, unsettled_cells,
};
