//! Subcommand implementations

pub mod export;
pub mod play;
pub mod simulate;
pub mod stats;
pub mod train;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::app::{App, EngineConfig, StatePaths};

/// Arguments shared by every command that touches persisted state.
#[derive(Debug, clap::Args)]
pub struct StorageArgs {
    /// Directory holding the entity and question catalog
    #[arg(long, short = 'd', default_value = "data")]
    pub data_dir: PathBuf,

    /// Directory holding learned state (snapshots and the game log)
    #[arg(long, short = 's', default_value = "state")]
    pub state_dir: PathBuf,

    /// Optional engine configuration file (JSON, partial overrides allowed)
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
}

impl StorageArgs {
    pub fn state_paths(&self) -> StatePaths {
        StatePaths::in_dir(&self.state_dir)
    }

    pub fn load_config(&self) -> Result<EngineConfig> {
        match &self.config {
            Some(path) => EngineConfig::load(path)
                .with_context(|| format!("failed to load config from {}", path.display())),
            None => Ok(EngineConfig::default()),
        }
    }

    /// Build the production container, creating the state directory.
    pub fn app(&self, seed: Option<u64>) -> Result<App> {
        self.app_with_config(seed, self.load_config()?)
    }

    /// Like [`StorageArgs::app`], but with an already-adjusted config.
    pub fn app_with_config(&self, seed: Option<u64>, config: EngineConfig) -> Result<App> {
        std::fs::create_dir_all(&self.state_dir).with_context(|| {
            format!("failed to create state directory {}", self.state_dir.display())
        })?;
        let mut app = App::new().with_config(config);
        if let Some(seed) = seed {
            app = app.with_default_seed(seed);
        }
        Ok(app)
    }
}

pub(crate) fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory {}", parent.display()))?;
    }
    Ok(())
}
