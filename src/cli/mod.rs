//! CLI infrastructure for the inquest guessing engine
//!
//! This module provides the command-line interface for playing
//! interactive games, self-play training, evaluation sweeps, and
//! inspecting or exporting learned state.

pub mod commands;
pub mod output;
