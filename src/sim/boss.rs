//! Boss encounter: movement, charge dashes, explosion fields, immunity

use glam::Vec2;
use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::collision::circles_overlap;
use super::player::Player;
use super::risk::RiskModifiers;
use crate::consts::*;

pub const BOSS_RADIUS: f32 = 45.0;
/// Ticks of warning before the boss appears
pub const BOSS_WARNING_TICKS: u32 = 180;
/// Ticks between passive explosions
pub const BOSS_EXPLOSION_INTERVAL: u32 = 420;
/// Ticks of spawn animation during which the boss stands still
pub const BOSS_SPAWN_EFFECT_TICKS: u32 = 60;
pub const BOSS_CONTACT_DAMAGE: i32 = 10;
pub const BOSS_CHARGE_CONTACT_DAMAGE: i32 = 20;
pub const BOSS_CONTACT_COOLDOWN_TICKS: u32 = 30;
pub const BOSS_KILL_SCORE: u64 = 500;
pub const BOSS_KILL_GOLD: u32 = 30;

const BASE_HEALTH: f32 = 500.0 * 120.0;
const CHARGE_SPEED: f32 = 8.0;
const CHARGE_TICKS: u32 = 60;
const CHARGE_RECOVERY_TICKS: u32 = 120;
const CHARGE_CHANCE: f64 = 0.02;
const TURN_CHANCE: f64 = 0.01;
const TURN_SPEEDS: [f32; 4] = [-3.0, -2.0, 2.0, 3.0];

/// Where the boss encounter of the current room stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BossStage {
    /// Not a boss room
    #[default]
    Inactive,
    /// Countdown before the boss spawns
    Warning { ticks_left: u32 },
    /// Boss alive
    Engaged,
    /// Boss killed in this room
    Defeated,
}

impl BossStage {
    pub fn is_pending(&self) -> bool {
        matches!(self, BossStage::Warning { .. })
    }
}

/// Expanding ring centred where the boss stood when it went off
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BossExplosion {
    pub pos: Vec2,
    pub radius: f32,
    pub max_radius: f32,
    pub damage: i32,
    /// Each field hurts the player at most once
    pub damaged_player: bool,
}

impl BossExplosion {
    /// Grow one tick, damaging the player on first contact. Returns the
    /// damage dealt this tick.
    pub fn update(&mut self, player: &mut Player) -> i32 {
        self.radius += 5.0;
        if self.damaged_player || !circles_overlap(self.pos, self.radius, player.pos, player.radius) {
            return 0;
        }
        self.damaged_player = true;
        player.take_damage(self.damage);
        self.damage
    }

    pub fn finished(&self) -> bool {
        self.radius >= self.max_radius
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    pub pos: Vec2,
    pub radius: f32,
    pub vel: Vec2,
    pub health: i32,
    pub max_health: i32,
    pub level: u32,
    pub immune_chance: f32,
    pub explosion_cooldown: u32,
    pub spawn_effect_timer: u32,
    pub contact_cooldown: u32,
    pub flash: u32,
    pub charging: bool,
    pub charge_timer: u32,
    pub charge_dir: Vec2,
    pub charge_cooldown: u32,
}

impl Boss {
    pub fn new(level: u32, risk: &RiskModifiers, rng: &mut impl Rng) -> Self {
        let level = level.max(1);
        let level_mult = 1.0 + (level - 1) as f32 * 0.5;
        let max_health = (BASE_HEALTH * risk.boss_health_mult * level_mult).floor() as i32;
        let vx = if rng.random_bool(0.5) { 3.0 } else { -3.0 };
        let vy = if rng.random_bool(0.5) { 3.0 } else { -3.0 };
        let vel = Vec2::new(vx, vy);

        Self {
            pos: Vec2::new(ARENA_WIDTH / 2.0, ARENA_HEIGHT / 4.0),
            radius: BOSS_RADIUS,
            vel,
            health: max_health,
            max_health,
            level,
            immune_chance: (0.2 + risk.boss_immune_bonus).clamp(0.0, 0.8),
            // Goes off on its first active tick
            explosion_cooldown: 0,
            spawn_effect_timer: BOSS_SPAWN_EFFECT_TICKS,
            contact_cooldown: 0,
            flash: 0,
            charging: false,
            charge_timer: 0,
            charge_dir: Vec2::ZERO,
            charge_cooldown: 0,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }

    /// Bounce around the arena, occasionally changing speed or dashing
    pub fn update_movement(&mut self, rng: &mut impl Rng) {
        if self.spawn_effect_timer > 0 {
            self.spawn_effect_timer -= 1;
            return;
        }
        self.flash = self.flash.saturating_sub(1);

        if self.charging {
            let next = self.pos + self.charge_dir * CHARGE_SPEED;
            let r = self.radius;
            if (r..=ARENA_WIDTH - r).contains(&next.x) && (r..=ARENA_HEIGHT - r).contains(&next.y) {
                self.pos = next;
            }
            self.charge_timer = self.charge_timer.saturating_sub(1);
            if self.charge_timer == 0 {
                self.charging = false;
                self.charge_cooldown = CHARGE_RECOVERY_TICKS;
            }
            return;
        }

        self.pos += self.vel;
        if self.pos.x <= self.radius || self.pos.x >= ARENA_WIDTH - self.radius {
            self.vel.x = -self.vel.x;
        }
        if self.pos.y <= self.radius || self.pos.y >= ARENA_HEIGHT - self.radius {
            self.vel.y = -self.vel.y;
        }
        if rng.random_bool(TURN_CHANCE) {
            self.vel.x = *TURN_SPEEDS.choose(rng).unwrap_or(&3.0);
        }
        if rng.random_bool(TURN_CHANCE) {
            self.vel.y = *TURN_SPEEDS.choose(rng).unwrap_or(&3.0);
        }
        self.charge_cooldown = self.charge_cooldown.saturating_sub(1);
        if self.charge_cooldown == 0 && rng.random_bool(CHARGE_CHANCE) {
            let angle = rng.random_range(0.0..std::f32::consts::TAU);
            self.charge_dir = crate::direction_from_angle(angle);
            self.charging = true;
            self.charge_timer = CHARGE_TICKS;
            log::debug!("boss charges");
        }
    }

    /// Tick the explosion timer; true when a new field should start
    pub fn explosion_due(&mut self) -> bool {
        if self.explosion_cooldown > 0 {
            self.explosion_cooldown -= 1;
            return false;
        }
        self.explosion_cooldown = BOSS_EXPLOSION_INTERVAL;
        true
    }

    pub fn create_explosion(&self, risk: &RiskModifiers) -> BossExplosion {
        BossExplosion {
            pos: self.pos,
            radius: 10.0,
            max_radius: 180.0 + risk.boss_explosion_radius_bonus as f32,
            damage: 20 + risk.boss_explosion_damage_bonus,
            damaged_player: false,
        }
    }

    /// Apply a hit. Non-grenade hits may be shrugged off by immunity.
    /// Returns true if the damage landed.
    pub fn take_damage(&mut self, amount: i32, from_grenade: bool, rng: &mut impl Rng) -> bool {
        if !from_grenade && rng.random::<f32>() < self.immune_chance {
            return false;
        }
        self.health -= amount.max(0);
        self.flash = 5;
        true
    }

    /// Resolve body contact with the player. Returns damage dealt, if any.
    pub fn contact(&mut self, player: &mut Player) -> Option<i32> {
        if self.contact_cooldown == 0
            && circles_overlap(self.pos, self.radius, player.pos, player.radius)
        {
            let dmg = if self.charging {
                BOSS_CHARGE_CONTACT_DAMAGE
            } else {
                BOSS_CONTACT_DAMAGE
            };
            player.take_damage(dmg);
            self.vel = -self.vel;
            self.contact_cooldown = BOSS_CONTACT_COOLDOWN_TICKS;
            return Some(dmg);
        }
        self.contact_cooldown = self.contact_cooldown.saturating_sub(1);
        None
    }

    pub fn health_ratio(&self) -> f32 {
        if self.max_health <= 0 {
            0.0
        } else {
            (self.health as f32 / self.max_health as f32).clamp(0.0, 1.0)
        }
    }
}
