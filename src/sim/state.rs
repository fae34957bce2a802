//! Run state and core simulation types
//!
//! The run state owns every room container. Rooms are rebuilt wholesale;
//! only the player and the scheduler (with its permanent bonus ledger)
//! survive a rebuild.

use glam::Vec2;
use rand::Rng;
use rand::SeedableRng;
use rand::seq::IndexedRandom;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::boss::{BOSS_WARNING_TICKS, Boss, BossExplosion, BossStage};
use super::collision::Rect;
use super::combat::KillSource;
use super::enemy::{Enemy, EnemyKind};
use super::player::{FireBinding, Player, Skill, Weapon};
use super::projectile::{Bullet, Grenade};
use super::rewards::{RewardKind, ShopOffer};
use super::risk::Difficulty;
use super::scheduler::Scheduler;
use crate::consts::*;

/// Current phase of the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Room in progress
    Fighting,
    /// Room cleared, waiting for a reward pick
    RewardSelect,
    /// Floor finished, shop open
    Shop,
    /// Simulation frozen by the player
    Paused,
    /// Player died
    GameOver,
    /// Every floor cleared
    Victory,
}

impl GamePhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, GamePhase::GameOver | GamePhase::Victory)
    }
}

/// What killed the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    /// Body contact with an enemy or the boss
    Collision,
    /// Bomber/charger burst, boss field or own grenade
    Explosion,
    /// Enemy bullet
    Projectile,
}

impl DeathCause {
    pub fn description(&self) -> &'static str {
        match self {
            DeathCause::Collision => "Crushed by enemies",
            DeathCause::Explosion => "Blown up",
            DeathCause::Projectile => "Shot by enemies",
        }
    }
}

/// Who took a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    Player,
    Enemy(u64),
    Boss,
}

/// Discrete things that happened during a tick. Drained by the session,
/// which forwards them to the effect sink and the achievement tracker.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Shot { weapon: Weapon },
    Explosion { pos: Vec2, radius: f32 },
    Hit { target: HitTarget, damage: i32 },
    /// A boss hit shrugged off by immunity
    Immune,
    PowerUpCollected { kind: PowerUpKind },
    SkillActivated { skill: Skill },
    BossWarning,
    BossSpawned { level: u32 },
    BossKilled,
    EnemyKilled { kind: EnemyKind, source: KillSource },
    RoomStarted { floor: u32, room: u32, boss: bool },
    RoomCleared { floor: u32, room: u32 },
    FloorReached { floor: u32 },
    GameOver { cause: DeathCause, score: u64, floor: u32, room: u32 },
    Victory { score: u64, floor: u32 },
}

/// Static rectangle that blocks movement and sometimes bullets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wall {
    pub rect: Rect,
}

impl Wall {
    /// Chance a bullet overlapping a wall is stopped, rolled per tick
    pub const BLOCK_CHANCE: f64 = 0.3;

    pub fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            rect: Rect::new(x, y, w, h),
        }
    }
}

/// Pickup types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    Health,
    Shield,
    Points,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 3] = [PowerUpKind::Health, PowerUpKind::Shield, PowerUpKind::Points];
}

pub const POWERUP_RADIUS: f32 = 12.0;
pub const POWERUP_LIFETIME_TICKS: u32 = 300;
pub const POWERUP_SPAWN_INTERVAL: u32 = 600;
pub const MAX_POWERUPS: usize = 3;
/// Chance a contact/bullet kill drops a power-up
pub const POWERUP_DROP_CHANCE: f64 = 0.2;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerUp {
    pub pos: Vec2,
    pub radius: f32,
    pub kind: PowerUpKind,
    pub ttl_ticks: u32,
}

impl PowerUp {
    pub fn new(pos: Vec2, rng: &mut impl Rng) -> Self {
        Self {
            pos,
            radius: POWERUP_RADIUS,
            kind: *PowerUpKind::ALL.choose(rng).unwrap_or(&PowerUpKind::Points),
            ttl_ticks: POWERUP_LIFETIME_TICKS,
        }
    }

    /// Apply the pickup to the player
    pub fn apply(&self, player: &mut Player) {
        match self.kind {
            PowerUpKind::Health => player.heal(20),
            PowerUpKind::Shield => player.add_shield(20),
            PowerUpKind::Points => player.score += 50,
        }
    }
}

/// Run setup chosen before the first room
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunConfig {
    pub difficulty: Difficulty,
    /// Pin risk for the whole run (Normal preset rules apply)
    pub fixed_risk: Option<u8>,
    pub skill: Skill,
    pub fire_binding: FireBinding,
}

impl RunConfig {
    /// Difficulty label recorded in the run history
    pub fn label(&self) -> String {
        match self.fixed_risk {
            Some(risk) => format!("Risk {}", risk),
            None => self.difficulty.as_str().to_string(),
        }
    }

    /// Difficulty level reported to the achievement tracker
    pub fn achievement_level(&self) -> u32 {
        match self.fixed_risk {
            Some(risk) => risk as u32,
            None => self.difficulty.achievement_level(),
        }
    }
}

/// Complete state of one run
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub config: RunConfig,
    pub phase: GamePhase,
    /// Simulation ticks spent fighting (pauses and menus excluded)
    pub time_ticks: u64,
    pub player: Player,
    pub scheduler: Scheduler,
    pub walls: Vec<Wall>,
    /// Insertion order is processing order
    pub enemies: Vec<Enemy>,
    pub bullets: Vec<Bullet>,
    pub enemy_bullets: Vec<Bullet>,
    pub grenades: Vec<Grenade>,
    pub powerups: Vec<PowerUp>,
    pub powerup_timer: u32,
    pub boss: Option<Boss>,
    pub boss_stage: BossStage,
    pub boss_explosions: Vec<BossExplosion>,
    pub reward_options: Vec<RewardKind>,
    pub shop_offers: Vec<ShopOffer>,
    pub kills: u32,
    pub boss_kills: u32,
    pub death_cause: Option<DeathCause>,
    /// Events produced since the last drain
    pub events: Vec<GameEvent>,
    next_id: u64,
}

impl GameState {
    /// Start a fresh run with the given seed
    pub fn new(seed: u64, config: RunConfig) -> Self {
        let scheduler = match config.fixed_risk {
            Some(risk) => Scheduler::with_fixed_risk(risk),
            None => Scheduler::new(config.difficulty),
        };
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            config,
            phase: GamePhase::Fighting,
            time_ticks: 0,
            player: Player::new(config.skill, config.fire_binding),
            scheduler,
            walls: Vec::new(),
            enemies: Vec::new(),
            bullets: Vec::new(),
            enemy_bullets: Vec::new(),
            grenades: Vec::new(),
            powerups: Vec::new(),
            powerup_timer: 0,
            boss: None,
            boss_stage: BossStage::Inactive,
            boss_explosions: Vec::new(),
            reward_options: Vec::new(),
            shop_offers: Vec::new(),
            kills: 0,
            boss_kills: 0,
            death_cause: None,
            events: Vec::new(),
            next_id: 1,
        };
        state.start_room();
        log::info!(
            "run start: seed {} difficulty {} skill {}",
            seed,
            config.label(),
            config.skill.as_str()
        );
        state
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Scheduler spawn check for this tick
    pub fn update_spawning(&mut self) -> Option<EnemyKind> {
        self.scheduler.update_spawning(
            &mut self.enemies,
            &self.walls,
            &mut self.next_id,
            &mut self.rng,
        )
    }

    /// Rebuild every room container and enter the current room
    pub fn start_room(&mut self) {
        self.enemies.clear();
        self.bullets.clear();
        self.enemy_bullets.clear();
        self.grenades.clear();
        self.powerups.clear();
        self.powerup_timer = 0;
        self.boss = None;
        self.boss_explosions.clear();
        self.reward_options.clear();
        self.shop_offers.clear();

        let boss_room = self.scheduler.begin_room(&mut self.rng);
        self.boss_stage = if boss_room {
            self.events.push(GameEvent::BossWarning);
            BossStage::Warning {
                ticks_left: BOSS_WARNING_TICKS,
            }
        } else {
            BossStage::Inactive
        };

        self.walls = self.scheduler.gen_walls(&mut self.rng);
        self.scheduler
            .place_player(&mut self.player, &self.walls, &mut self.rng);
        self.phase = GamePhase::Fighting;
        self.events.push(GameEvent::RoomStarted {
            floor: self.scheduler.floor,
            room: self.scheduler.room,
            boss: boss_room,
        });
    }

    pub fn alive_enemies(&self) -> usize {
        self.enemies.iter().filter(|e| e.is_alive()).count()
    }

    /// Room cleared: everything spawned, nothing alive, no boss due or present
    pub fn room_cleared(&self) -> bool {
        self.scheduler.room_cleared(
            self.alive_enemies(),
            self.boss.is_some(),
            self.boss_stage.is_pending(),
        )
    }

    /// Drop enemies marked dead by the current sub-step
    pub fn sweep_enemies(&mut self) {
        self.enemies.retain(|e| !e.removed);
    }

    /// Seconds of fighting so far
    pub fn survival_secs(&self) -> f32 {
        self.time_ticks as f32 / TICK_RATE as f32
    }

    /// End the run if the player is dead. Returns true if it ended now.
    pub fn check_player_death(&mut self, cause: DeathCause) -> bool {
        if self.phase.is_terminal() || !self.player.is_dead() {
            return false;
        }
        self.phase = GamePhase::GameOver;
        self.death_cause = Some(cause);
        log::info!(
            "game over: {} (score {}, floor {} room {})",
            cause.description(),
            self.player.score,
            self.scheduler.floor,
            self.scheduler.room
        );
        self.events.push(GameEvent::GameOver {
            cause,
            score: self.player.score,
            floor: self.scheduler.floor,
            room: self.scheduler.room,
        });
        true
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}
