//! In-memory learning repository for testing.
//!
//! This adapter provides a pure in-memory implementation of
//! LearningRepository, enabling fast tests without any file system I/O.

use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, Mutex},
};

use crate::{
    Result, error::Error, history::GameRecord, likelihoods::SavedCalibration,
    ports::LearningRepository, q_learning::SavedPolicy,
};

/// In-memory repository for testing.
///
/// Snapshots and game logs live in shared HashMaps keyed by path, avoiding
/// file system I/O entirely. Perfect for fast, isolated tests.
///
/// # Examples
///
/// ```
/// use inquest::adapters::InMemoryRepository;
/// use inquest::ports::LearningRepository;
/// use inquest::q_learning::{AgentParams, PolicyAgent, SavedPolicy};
/// use std::path::Path;
///
/// let repo = InMemoryRepository::new();
/// let agent = PolicyAgent::new(AgentParams::default());
///
/// // Save to "memory" (not disk)
/// repo.save_policy(&SavedPolicy::from_agent(&agent), Path::new("policy"))?;
///
/// // Load from "memory"
/// let loaded = repo.load_policy(Path::new("policy"))?;
/// # Ok::<(), inquest::Error>(())
/// ```
///
/// # Thread Safety
///
/// This repository is thread-safe and can be safely cloned and shared across
/// threads. All clones share the same underlying storage.
#[derive(Clone)]
pub struct InMemoryRepository {
    snapshots: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    games: Arc<Mutex<HashMap<String, Vec<GameRecord>>>>,
}

impl InMemoryRepository {
    /// Create a new empty in-memory repository.
    pub fn new() -> Self {
        Self {
            snapshots: Arc::new(Mutex::new(HashMap::new())),
            games: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Get the number of snapshots currently stored.
    ///
    /// Useful for testing to verify save operations occurred.
    pub fn snapshot_count(&self) -> usize {
        self.snapshots.lock().unwrap().len()
    }

    /// Total game records across all stored logs.
    pub fn game_count(&self) -> usize {
        self.games.lock().unwrap().values().map(Vec::len).sum()
    }

    /// Clear all stored snapshots and game logs.
    ///
    /// Useful for resetting state between tests.
    pub fn clear(&self) {
        self.snapshots.lock().unwrap().clear();
        self.games.lock().unwrap().clear();
    }

    /// Check if a snapshot exists at the given path.
    pub fn contains(&self, path: &Path) -> bool {
        let key = path.to_string_lossy().to_string();
        self.snapshots.lock().unwrap().contains_key(&key)
    }

    fn store<T: serde::Serialize>(&self, value: &T, path: &Path, what: &str) -> Result<()> {
        let key = path.to_string_lossy().to_string();

        let bytes = rmp_serde::to_vec(value).map_err(|e| Error::SerializationContext {
            operation: format!("serialize {what} for in-memory storage"),
            message: e.to_string(),
        })?;

        self.snapshots.lock().unwrap().insert(key, bytes);
        Ok(())
    }

    fn fetch<T: serde::de::DeserializeOwned>(&self, path: &Path, what: &str) -> Result<T> {
        let key = path.to_string_lossy().to_string();
        let snapshots = self.snapshots.lock().unwrap();

        let bytes = snapshots
            .get(&key)
            .ok_or_else(|| Error::SnapshotMissing { path: key.clone() })?;

        rmp_serde::from_slice(bytes).map_err(|e| Error::SerializationContext {
            operation: format!("deserialize {what} from in-memory storage"),
            message: e.to_string(),
        })
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl LearningRepository for InMemoryRepository {
    fn save_policy(&self, policy: &SavedPolicy, path: &Path) -> Result<()> {
        self.store(policy, path, "policy snapshot")
    }

    fn load_policy(&self, path: &Path) -> Result<SavedPolicy> {
        self.fetch(path, "policy snapshot")
    }

    fn save_calibration(&self, calibration: &SavedCalibration, path: &Path) -> Result<()> {
        self.store(calibration, path, "calibration snapshot")
    }

    fn load_calibration(&self, path: &Path) -> Result<SavedCalibration> {
        self.fetch(path, "calibration snapshot")
    }

    fn append_game(&self, record: &GameRecord, path: &Path) -> Result<()> {
        let key = path.to_string_lossy().to_string();
        self.games
            .lock()
            .unwrap()
            .entry(key)
            .or_default()
            .push(record.clone());
        Ok(())
    }

    fn load_games(&self, path: &Path) -> Result<Vec<GameRecord>> {
        let key = path.to_string_lossy().to_string();
        Ok(self
            .games
            .lock()
            .unwrap()
            .get(&key)
            .cloned()
            .unwrap_or_default())
    }
}
