//! Run history and high score
//!
//! Keeps the 20 most recent finished runs, newest first.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Maximum number of finished runs to keep
pub const MAX_HISTORY: usize = 20;

/// One finished run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub score: u64,
    /// "Easy", "Normal", "Hard" or "Risk N"
    pub difficulty: String,
    pub floor: u32,
    /// Unix timestamp (seconds) when the run ended
    pub timestamp: u64,
}

impl RunRecord {
    pub fn new(score: u64, difficulty: &str, floor: u32) -> Self {
        Self {
            score,
            difficulty: difficulty.to_string(),
            floor,
            timestamp: now_secs(),
        }
    }
}

/// High score plus recent runs
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunHistory {
    pub high_score: u64,
    /// Most recent first
    pub entries: Vec<RunRecord>,
}

impl RunHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished run. Returns true if it set a new high score.
    pub fn add(&mut self, record: RunRecord) -> bool {
        let new_best = record.score > self.high_score;
        if new_best {
            self.high_score = record.score;
        }
        self.entries.insert(0, record);
        self.entries.truncate(MAX_HISTORY);
        new_best
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Most recent run, if any
    pub fn latest(&self) -> Option<&RunRecord> {
        self.entries.first()
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
