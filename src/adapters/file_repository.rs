//! File-backed implementation of the learning repository.
//!
//! Policy and calibration snapshots use rmp_serde's compact MessagePack
//! encoding. The game log is JSON Lines: one record per line, opened in
//! append mode so interrupted runs never lose earlier games.

use std::{
    fs::{File, OpenOptions},
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use crate::{
    Result, error::Error, history::GameRecord, likelihoods::SavedCalibration,
    ports::LearningRepository, q_learning::SavedPolicy,
};

/// Learning repository storing snapshots and the game log on disk.
///
/// # Examples
///
/// ```no_run
/// use inquest::adapters::FileRepository;
/// use inquest::ports::LearningRepository;
/// use inquest::q_learning::{AgentParams, PolicyAgent, SavedPolicy};
/// use std::path::Path;
///
/// let repo = FileRepository::new();
/// let agent = PolicyAgent::new(AgentParams::default());
///
/// repo.save_policy(&SavedPolicy::from_agent(&agent), Path::new("policy.msgpack"))?;
/// let restored = repo.load_policy(Path::new("policy.msgpack"))?.into_agent()?;
/// # Ok::<(), inquest::Error>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FileRepository;

impl FileRepository {
    pub fn new() -> Self {
        Self
    }

    fn write_msgpack<T: serde::Serialize>(value: &T, path: &Path, what: &str) -> Result<()> {
        let mut file = File::create(path).map_err(|source| Error::Io {
            operation: format!("create file {path:?}"),
            source,
        })?;

        rmp_serde::encode::write(&mut file, value).map_err(|e| Error::SerializationContext {
            operation: format!("serialize {what} to MessagePack"),
            message: e.to_string(),
        })?;

        Ok(())
    }

    fn read_msgpack<T: serde::de::DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open file {path:?}"),
            source,
        })?;

        rmp_serde::decode::from_read(&file).map_err(|e| Error::SerializationContext {
            operation: format!("deserialize {what} from MessagePack"),
            message: e.to_string(),
        })
    }
}

impl LearningRepository for FileRepository {
    fn save_policy(&self, policy: &SavedPolicy, path: &Path) -> Result<()> {
        Self::write_msgpack(policy, path, "policy snapshot")
    }

    fn load_policy(&self, path: &Path) -> Result<SavedPolicy> {
        Self::read_msgpack(path, "policy snapshot")
    }

    fn save_calibration(&self, calibration: &SavedCalibration, path: &Path) -> Result<()> {
        Self::write_msgpack(calibration, path, "calibration snapshot")
    }

    fn load_calibration(&self, path: &Path) -> Result<SavedCalibration> {
        Self::read_msgpack(path, "calibration snapshot")
    }

    fn append_game(&self, record: &GameRecord, path: &Path) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| Error::Io {
                operation: format!("open game log {path:?} for appending"),
                source,
            })?;

        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, record)?;
        writeln!(&mut writer).map_err(|source| Error::Io {
            operation: format!("append to game log {path:?}"),
            source,
        })?;
        writer.flush().map_err(|source| Error::Io {
            operation: format!("flush game log {path:?}"),
            source,
        })?;

        Ok(())
    }

    fn load_games(&self, path: &Path) -> Result<Vec<GameRecord>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open game log {path:?}"),
            source,
        })?;

        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|source| Error::Io {
                operation: format!("read game log {path:?}"),
                source,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            records.push(serde_json::from_str(&line)?);
        }
        Ok(records)
    }
}
