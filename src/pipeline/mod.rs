//! Simulation pipeline abstractions
//!
//! This module provides composable pipelines for:
//! - Running batches of games against a scripted oracle
//! - Training the learning components through self-play
//! - Recording observations during a run

pub mod observers;
pub mod simulation;

// Re-export observer implementations (adapters)
pub use observers::{
    JsonlObserver, MetricsObserver, MetricsSummary, Observation, ProgressObserver, StepObservation,
};
pub use simulation::{
    CheckpointConfig, SelectionMode, SimulationConfig, SimulationPipeline, SimulationResult,
};

pub use crate::ports::GameObserver;
