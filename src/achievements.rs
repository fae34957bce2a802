//! Achievement tracking
//!
//! The session reports progress through [`AchievementTracker`]. The
//! ledger below is the stock tracker: lifetime stats, the unlock catalog,
//! a notification queue and optional JSON persistence.

use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::persistence::{PersistenceError, write_json_atomic};
use crate::sim::Weapon;

/// What a progress report counts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressCategory {
    /// Enemies killed (additive)
    KillCount,
    /// Bosses killed (additive)
    BossKill,
    /// Seconds survived in one run (best)
    SurvivalTime,
    /// Score of one run (best)
    Score,
    /// Difficulty level of a finished run (best)
    Difficulty,
    /// Floor reached (best)
    Floor,
    /// A run started
    GameStart,
    /// A run was won (additive)
    GameComplete,
    /// Kills with a specific weapon (additive)
    WeaponKill(Weapon),
}

/// Narrow interface the session talks to
pub trait AchievementTracker {
    fn report_progress(&mut self, category: ProgressCategory, amount: u64);
    fn has_pending_notification(&self) -> bool;
    /// Next unlocked achievement waiting to be shown
    fn pop_notification(&mut self) -> Option<&'static Achievement>;
}

/// Tracker that ignores everything
#[derive(Debug, Default)]
pub struct NullTracker;

impl AchievementTracker for NullTracker {
    fn report_progress(&mut self, _category: ProgressCategory, _amount: u64) {}

    fn has_pending_notification(&self) -> bool {
        false
    }

    fn pop_notification(&mut self) -> Option<&'static Achievement> {
        None
    }
}

/// Catalog entry
#[derive(Debug, PartialEq, Eq)]
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub category: ProgressCategory,
    pub target: u64,
    pub points: u32,
}

const fn entry(
    id: &'static str,
    name: &'static str,
    description: &'static str,
    category: ProgressCategory,
    target: u64,
    points: u32,
) -> Achievement {
    Achievement {
        id,
        name,
        description,
        category,
        target,
        points,
    }
}

pub static CATALOG: [Achievement; 18] = [
    entry("first_kill", "First Blood", "Kill your first enemy", ProgressCategory::KillCount, 1, 10),
    entry("killer", "Killer", "Kill 50 enemies in total", ProgressCategory::KillCount, 50, 50),
    entry("massacre", "Massacre", "Kill 200 enemies in total", ProgressCategory::KillCount, 200, 100),
    entry("survivor", "Survivor", "Survive for more than 5 minutes", ProgressCategory::SurvivalTime, 300, 30),
    entry("endurance", "Endurance", "Survive for more than 10 minutes", ProgressCategory::SurvivalTime, 600, 80),
    entry("high_scorer", "High Scorer", "Score 1000 points in a single game", ProgressCategory::Score, 1000, 40),
    entry("score_master", "Score Master", "Score 5000 points in a single game", ProgressCategory::Score, 5000, 150),
    entry("boss_slayer", "Boss Slayer", "Defeat your first boss", ProgressCategory::BossKill, 1, 60),
    entry("boss_hunter", "Boss Hunter", "Defeat 5 bosses in total", ProgressCategory::BossKill, 5, 200),
    entry("risk_taker", "Risk Taker", "Finish a run on difficulty 10+", ProgressCategory::Difficulty, 10, 70),
    entry("challenger", "Challenger", "Finish a run on max difficulty (20)", ProgressCategory::Difficulty, 20, 300),
    entry("explorer", "Explorer", "Reach floor 5", ProgressCategory::Floor, 5, 50),
    entry("deep_diver", "Deep Diver", "Reach floor 10", ProgressCategory::Floor, 10, 120),
    entry("tower_master", "Tower Master", "Reach the final floor (15)", ProgressCategory::Floor, 15, 200),
    entry("ultimate_conqueror", "Ultimate Conqueror", "Clear all 15 floors", ProgressCategory::GameComplete, 1, 500),
    entry("grenadier", "Grenadier", "Kill 20 enemies with grenades", ProgressCategory::WeaponKill(Weapon::Grenade), 20, 40),
    entry("first_game", "Welcome Warrior", "Start your first game", ProgressCategory::GameStart, 1, 5),
    entry("persistent", "Persistent", "Play 10 games in total", ProgressCategory::GameStart, 10, 30),
];

/// Look up a catalog entry by id
pub fn find(id: &str) -> Option<&'static Achievement> {
    CATALOG.iter().find(|a| a.id == id)
}

/// Lifetime statistics
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifetimeStats {
    pub total_kills: u64,
    pub total_boss_kills: u64,
    pub max_survival_time: u64,
    pub max_score: u64,
    pub max_difficulty: u64,
    pub max_floor: u64,
    pub game_count: u64,
    pub game_completions: u64,
    /// Kills per weapon slot
    pub weapon_kills: [u64; 3],
}

impl LifetimeStats {
    fn apply(&mut self, category: ProgressCategory, amount: u64) {
        match category {
            ProgressCategory::KillCount => self.total_kills += amount,
            ProgressCategory::BossKill => self.total_boss_kills += amount,
            ProgressCategory::SurvivalTime => self.max_survival_time = self.max_survival_time.max(amount),
            ProgressCategory::Score => self.max_score = self.max_score.max(amount),
            ProgressCategory::Difficulty => self.max_difficulty = self.max_difficulty.max(amount),
            ProgressCategory::Floor => self.max_floor = self.max_floor.max(amount),
            ProgressCategory::GameStart => self.game_count += 1,
            ProgressCategory::GameComplete => self.game_completions += amount,
            ProgressCategory::WeaponKill(w) => self.weapon_kills[w.index()] += amount,
        }
    }

    /// Current value counted against an achievement of this category
    pub fn current(&self, category: ProgressCategory) -> u64 {
        match category {
            ProgressCategory::KillCount => self.total_kills,
            ProgressCategory::BossKill => self.total_boss_kills,
            ProgressCategory::SurvivalTime => self.max_survival_time,
            ProgressCategory::Score => self.max_score,
            ProgressCategory::Difficulty => self.max_difficulty,
            ProgressCategory::Floor => self.max_floor,
            ProgressCategory::GameStart => self.game_count,
            ProgressCategory::GameComplete => self.game_completions,
            ProgressCategory::WeaponKill(w) => self.weapon_kills[w.index()],
        }
    }
}

/// Persisted part of the ledger
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AchievementData {
    /// Achievement id -> unix time of the unlock
    pub unlocked: BTreeMap<String, u64>,
    pub stats: LifetimeStats,
}

/// Stock achievement tracker
#[derive(Debug, Default)]
pub struct AchievementLedger {
    data: AchievementData,
    notifications: VecDeque<&'static Achievement>,
    path: Option<PathBuf>,
}

impl AchievementLedger {
    /// Ledger that is never written to disk
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load the ledger at `path`; it is saved back after every report.
    /// A missing or unreadable file starts a fresh ledger.
    pub fn open(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let data = match Self::read(&path) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("could not load achievements from {}: {}", path.display(), e);
                AchievementData::default()
            }
        };
        Self {
            data,
            notifications: VecDeque::new(),
            path: Some(path),
        }
    }

    fn read(path: &Path) -> Result<AchievementData, PersistenceError> {
        if !path.exists() {
            return Ok(AchievementData::default());
        }
        let json = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    /// Write the ledger to its file, if it has one
    pub fn save(&self) -> Result<(), PersistenceError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        write_json_atomic(path, &self.data)
    }

    pub fn stats(&self) -> &LifetimeStats {
        &self.data.stats
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.data.unlocked.contains_key(id)
    }

    /// Unlocked achievements in catalog order
    pub fn unlocked(&self) -> Vec<&'static Achievement> {
        CATALOG.iter().filter(|a| self.is_unlocked(a.id)).collect()
    }

    /// Progress toward an achievement in 0.0..=1.0
    pub fn progress(&self, id: &str) -> f32 {
        if self.is_unlocked(id) {
            return 1.0;
        }
        match find(id) {
            Some(a) if a.target > 0 => {
                (self.data.stats.current(a.category) as f32 / a.target as f32).min(1.0)
            }
            _ => 0.0,
        }
    }

    pub fn total_points(&self) -> u32 {
        self.unlocked().iter().map(|a| a.points).sum()
    }

    pub fn completion_percentage(&self) -> f32 {
        self.unlocked().len() as f32 / CATALOG.len() as f32 * 100.0
    }

    fn check_unlocks(&mut self) {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        for a in CATALOG.iter() {
            if self.is_unlocked(a.id) || self.data.stats.current(a.category) < a.target {
                continue;
            }
            self.data.unlocked.insert(a.id.to_string(), now);
            self.notifications.push_back(a);
            log::info!("achievement unlocked: {}", a.name);
        }
    }
}

impl AchievementTracker for AchievementLedger {
    fn report_progress(&mut self, category: ProgressCategory, amount: u64) {
        self.data.stats.apply(category, amount);
        self.check_unlocks();
        if let Err(e) = self.save() {
            log::warn!("could not save achievements: {}", e);
        }
    }

    fn has_pending_notification(&self) -> bool {
        !self.notifications.is_empty()
    }

    fn pop_notification(&mut self) -> Option<&'static Achievement> {
        self.notifications.pop_front()
    }
}
