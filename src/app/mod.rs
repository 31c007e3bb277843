//! Application layer: configuration and dependency injection
//!
//! The modules below sit between the CLI and the domain:
//!
//! ```text
//!   cli commands
//!        │
//!   App (container.rs) ── EngineConfig (config.rs)
//!        │
//!   Engine + Learning ── LearningRepository adapter
//! ```
//!
//! The [`App`] container decides which repository adapter backs the
//! system and restores learned state when building engines, so command
//! code never touches file formats directly.

pub mod config;
pub mod container;

pub use config::EngineConfig;
pub use container::{App, AppBuilder, StatePaths};
