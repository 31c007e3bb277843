//! Repository port for learned-state persistence.
//!
//! This module defines the trait boundary between the domain and
//! infrastructure layers for storing policy snapshots, calibration
//! snapshots, and the append-only game log.

use std::path::Path;

use crate::{
    Result, history::GameRecord, likelihoods::SavedCalibration, q_learning::SavedPolicy,
};

/// Port for persisting and loading everything the system learns.
///
/// This trait abstracts the storage mechanism, allowing different
/// implementations (MessagePack files, in-memory stores, databases)
/// without coupling the domain logic to specific serialization formats.
///
/// Policy and calibration snapshots are whole-value saves; the game log
/// is append-only so that interrupted runs never lose earlier games.
///
/// # Examples
///
/// ```no_run
/// use inquest::ports::LearningRepository;
/// use inquest::q_learning::SavedPolicy;
/// use std::path::Path;
///
/// fn checkpoint<R: LearningRepository>(
///     repo: &R,
///     policy: &SavedPolicy,
///     path: &Path,
/// ) -> inquest::Result<()> {
///     repo.save_policy(policy, path)
/// }
/// ```
pub trait LearningRepository {
    /// Save a policy snapshot to persistent storage.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The path cannot be created or written to
    /// - Serialization fails
    /// - I/O errors occur during writing
    fn save_policy(&self, policy: &SavedPolicy, path: &Path) -> Result<()>;

    /// Load a policy snapshot from persistent storage.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file does not exist or cannot be read
    /// - The file format is invalid or corrupted
    /// - The snapshot version is unsupported
    fn load_policy(&self, path: &Path) -> Result<SavedPolicy>;

    /// Save a calibration snapshot to persistent storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be written or serialization
    /// fails.
    fn save_calibration(&self, calibration: &SavedCalibration, path: &Path) -> Result<()>;

    /// Load a calibration snapshot from persistent storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, the format is
    /// invalid, or the snapshot version is unsupported.
    fn load_calibration(&self, path: &Path) -> Result<SavedCalibration>;

    /// Append one finished game to the game log.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be opened for appending or the
    /// record cannot be serialized.
    fn append_game(&self, record: &GameRecord, path: &Path) -> Result<()>;

    /// Load all logged games, oldest first.
    ///
    /// A missing log file is not an error; it yields an empty history.
    ///
    /// # Errors
    ///
    /// Returns an error if the log exists but cannot be read or contains
    /// malformed records.
    fn load_games(&self, path: &Path) -> Result<Vec<GameRecord>>;
}
