//! Save/load persistence for run history and the save-and-quit snapshot
//!
//! Features:
//! - Single JSON document (high score, history, saved run)
//! - Atomic writes (tmp → save)
//! - Unreadable or malformed files fall back to an empty store

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::history::{RunHistory, RunRecord};
use crate::sim::RunSnapshot;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write `value` as pretty JSON to a sibling temp file, then rename it
/// over `path`. A crash mid-write leaves the previous file intact.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            fs::create_dir_all(dir)?;
        }
    }
    let json = serde_json::to_string_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Storage for finished runs and the interrupted run
pub trait RunStore {
    fn load_last_saved_run(&self) -> Option<RunSnapshot>;
    fn save_run_snapshot(&mut self, snapshot: &RunSnapshot) -> Result<(), PersistenceError>;
    /// Record a finished run. Also drops any saved snapshot.
    fn record_completed_run(
        &mut self,
        score: u64,
        difficulty: &str,
        floor: u32,
    ) -> Result<(), PersistenceError>;
    fn query_high_score(&self) -> u64;
    /// Most recent first, at most 20
    fn query_history(&self) -> Vec<RunRecord>;
}

/// On-disk document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveData {
    pub history: RunHistory,
    pub saved_run: Option<RunSnapshot>,
}

impl SaveData {
    fn record(&mut self, score: u64, difficulty: &str, floor: u32) {
        if self.history.add(RunRecord::new(score, difficulty, floor)) {
            log::info!("new high score: {}", score);
        }
        self.saved_run = None;
    }
}

/// In-memory store, for headless runs and tests
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    pub data: SaveData,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RunStore for MemoryStore {
    fn load_last_saved_run(&self) -> Option<RunSnapshot> {
        self.data.saved_run.clone()
    }

    fn save_run_snapshot(&mut self, snapshot: &RunSnapshot) -> Result<(), PersistenceError> {
        self.data.saved_run = Some(snapshot.clone());
        Ok(())
    }

    fn record_completed_run(
        &mut self,
        score: u64,
        difficulty: &str,
        floor: u32,
    ) -> Result<(), PersistenceError> {
        self.data.record(score, difficulty, floor);
        Ok(())
    }

    fn query_high_score(&self) -> u64 {
        self.data.history.high_score
    }

    fn query_history(&self) -> Vec<RunRecord> {
        self.data.history.entries.clone()
    }
}

/// JSON file store. The whole document is rewritten on every change.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
    data: SaveData,
}

impl JsonFileStore {
    /// Open the store at `path`. A missing file starts empty; an
    /// unreadable one is logged and replaced on the next write.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let data = match Self::read(&path) {
            Ok(Some(data)) => {
                log::info!(
                    "loaded {} history entries from {}",
                    data.history.entries.len(),
                    path.display()
                );
                data
            }
            Ok(None) => SaveData::default(),
            Err(e) => {
                log::warn!("could not load {}: {}; starting fresh", path.display(), e);
                SaveData::default()
            }
        };
        Self { path, data }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn data(&self) -> &SaveData {
        &self.data
    }

    fn read(path: &Path) -> Result<Option<SaveData>, PersistenceError> {
        if !path.exists() {
            return Ok(None);
        }
        let json = fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    fn flush(&self) -> Result<(), PersistenceError> {
        write_json_atomic(&self.path, &self.data)
    }
}

impl RunStore for JsonFileStore {
    fn load_last_saved_run(&self) -> Option<RunSnapshot> {
        self.data.saved_run.clone()
    }

    fn save_run_snapshot(&mut self, snapshot: &RunSnapshot) -> Result<(), PersistenceError> {
        self.data.saved_run = Some(snapshot.clone());
        self.flush()?;
        log::info!("run saved to {}", self.path.display());
        Ok(())
    }

    fn record_completed_run(
        &mut self,
        score: u64,
        difficulty: &str,
        floor: u32,
    ) -> Result<(), PersistenceError> {
        self.data.record(score, difficulty, floor);
        self.flush()
    }

    fn query_high_score(&self) -> u64 {
        self.data.history.high_score
    }

    fn query_history(&self) -> Vec<RunRecord> {
        self.data.history.entries.clone()
    }
}
