//! Save-and-quit run snapshot
//!
//! Stores the player's stats, the live enemies and the room position.
//! Restoring clamps every field, so a hand-edited or truncated save still
//! produces a valid run.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::enemy::Enemy;
use super::player::{FireBinding, Player, Weapon};
use super::risk::{MAX_RISK, RiskModifiers};
use super::scheduler::PermanentBonuses;
use super::state::{GameState, RunConfig};
use crate::clamp_to_arena;
use crate::consts::*;

/// Player fields kept across save-and-quit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSnapshot {
    pub x: f32,
    pub y: f32,
    pub health: i32,
    pub max_health: i32,
    pub shield: i32,
    pub shield_max: i32,
    /// Slot index, clamped on restore
    pub weapon: i64,
    pub score: u64,
    pub gold: u32,
    pub speed: f32,
    pub bullet_damage: i32,
    pub attack_boost_active: bool,
    pub attack_boost_duration: u32,
    pub attack_boost_cooldown: u32,
    pub grenade_cooldown: u32,
    pub fire_binding: FireBinding,
}

impl Default for PlayerSnapshot {
    fn default() -> Self {
        let p = Player::default();
        Self {
            x: p.pos.x,
            y: p.pos.y,
            health: p.health,
            max_health: p.max_health,
            shield: p.shield,
            shield_max: p.shield_max,
            weapon: 0,
            score: 0,
            gold: 0,
            speed: p.speed,
            bullet_damage: p.bullet_damage,
            attack_boost_active: false,
            attack_boost_duration: 0,
            attack_boost_cooldown: 0,
            grenade_cooldown: 0,
            fire_binding: p.fire_binding,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnemySnapshot {
    pub x: f32,
    pub y: f32,
    pub health: i32,
}

/// Everything a continued run needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunSnapshot {
    pub player: PlayerSnapshot,
    pub enemies: Vec<EnemySnapshot>,
    pub score: u64,
    pub floor: u32,
    pub room: u32,
    pub risk: u8,
    pub bonuses: PermanentBonuses,
    pub kills: u32,
    pub time_ticks: u64,
}

impl Default for RunSnapshot {
    fn default() -> Self {
        Self {
            player: PlayerSnapshot::default(),
            enemies: Vec::new(),
            score: 0,
            floor: 1,
            room: 1,
            risk: 0,
            bonuses: PermanentBonuses::default(),
            kills: 0,
            time_ticks: 0,
        }
    }
}

impl RunSnapshot {
    /// Capture the parts of a run that survive save-and-quit
    pub fn capture(state: &GameState) -> Self {
        let p = &state.player;
        Self {
            player: PlayerSnapshot {
                x: p.pos.x,
                y: p.pos.y,
                health: p.health,
                max_health: p.max_health,
                shield: p.shield,
                shield_max: p.shield_max,
                weapon: p.weapon.index() as i64,
                score: p.score,
                gold: p.gold,
                speed: p.speed,
                bullet_damage: p.bullet_damage,
                attack_boost_active: p.attack_boost_active,
                attack_boost_duration: p.attack_boost_duration,
                attack_boost_cooldown: p.attack_boost_cooldown,
                grenade_cooldown: p.grenade_cooldown,
                fire_binding: p.fire_binding,
            },
            enemies: state
                .enemies
                .iter()
                .filter(|e| e.is_alive())
                .map(|e| EnemySnapshot {
                    x: e.pos.x,
                    y: e.pos.y,
                    health: e.health,
                })
                .collect(),
            score: p.score,
            floor: state.scheduler.floor,
            room: state.scheduler.room,
            risk: state.scheduler.risk,
            bonuses: state.scheduler.bonuses,
            kills: state.kills,
            time_ticks: state.time_ticks,
        }
    }

    /// Build a run from this snapshot. The room is regenerated; saved
    /// enemies come back as basic enemies.
    pub fn restore(&self, seed: u64, config: RunConfig) -> GameState {
        let mut state = GameState::new(seed, config);

        state.scheduler.floor = self.floor.clamp(1, MAX_FLOORS);
        state.scheduler.room = self.room.clamp(1, ROOMS_PER_FLOOR);
        state.scheduler.bonuses = sanitize_bonuses(self.bonuses);
        state.start_room();
        if !state.scheduler.risk_fixed {
            state.scheduler.risk = self.risk.min(MAX_RISK);
            state.scheduler.modifiers = RiskModifiers::for_risk(state.scheduler.risk);
        }

        let s = &self.player;
        let p = &mut state.player;
        p.max_health = s.max_health.max(1);
        p.health = s.health.clamp(1, p.max_health);
        p.shield_max = s.shield_max.max(0);
        p.shield = s.shield.clamp(0, p.shield_max);
        p.weapon = Weapon::from_index(s.weapon);
        p.score = s.score.max(self.score);
        p.gold = s.gold;
        if s.speed.is_finite() && s.speed > 0.0 {
            p.speed = s.speed;
        }
        p.bullet_damage = s.bullet_damage.max(1);
        p.attack_boost_active = s.attack_boost_active && s.attack_boost_duration > 0;
        p.attack_boost_duration = if p.attack_boost_active {
            s.attack_boost_duration
        } else {
            0
        };
        p.attack_boost_cooldown = s.attack_boost_cooldown;
        p.grenade_cooldown = s.grenade_cooldown;
        p.fire_binding = s.fire_binding;
        if s.x.is_finite() && s.y.is_finite() {
            p.pos = clamp_to_arena(Vec2::new(s.x, s.y), p.radius);
        }

        for saved in &self.enemies {
            if !(saved.x.is_finite() && saved.y.is_finite()) || saved.health <= 0 {
                continue;
            }
            let id = state.next_entity_id();
            let enemy = Enemy::restored(id, Vec2::new(saved.x, saved.y), saved.health, &mut state.rng);
            state.enemies.push(enemy);
        }

        state.kills = self.kills;
        state.time_ticks = self.time_ticks;
        log::info!(
            "restored run: floor {} room {} with {} enemies",
            state.scheduler.floor,
            state.scheduler.room,
            state.enemies.len()
        );
        state
    }
}

/// Bonuses never go negative, even from a damaged save
fn sanitize_bonuses(b: PermanentBonuses) -> PermanentBonuses {
    let finite = |v: f32| if v.is_finite() { v.max(0.0) } else { 0.0 };
    PermanentBonuses {
        health_bonus: b.health_bonus.max(0),
        damage_bonus: finite(b.damage_bonus),
        grenade_damage_bonus: b.grenade_damage_bonus.max(0),
        speed_bonus: finite(b.speed_bonus),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_restore_keeps_progress() {
        let mut state = GameState::new(5, RunConfig::default());
        state.scheduler.floor = 3;
        state.scheduler.room = 2;
        state.player.gold = 42;
        state.player.score = 900;
        state.player.weapon = Weapon::Shotgun;
        state.enemies.clear();
        let id = state.next_entity_id();
        let e = Enemy::restored(id, Vec2::new(120.0, 90.0), 30, &mut state.rng);
        state.enemies.push(e);

        let snap = RunSnapshot::capture(&state);
        let json = serde_json::to_string(&snap).unwrap();
        let back: RunSnapshot = serde_json::from_str(&json).unwrap();
        let restored = back.restore(6, RunConfig::default());

        assert_eq!((restored.scheduler.floor, restored.scheduler.room), (3, 2));
        assert_eq!(restored.player.gold, 42);
        assert_eq!(restored.player.score, 900);
        assert_eq!(restored.player.weapon, Weapon::Shotgun);
        assert_eq!(restored.enemies.len(), 1);
        assert_eq!(restored.enemies[0].health, 30);
        assert_eq!(restored.scheduler.risk, state.scheduler.risk);
    }

    #[test]
    fn test_malformed_snapshot_is_clamped() {
        let json = r#"{
            "player": {"x": -500.0, "y": 9000.0, "health": 900, "shield": -5, "weapon": 17},
            "enemies": [{"x": 10.0, "y": 10.0, "health": -3}, {"x": 2000.0, "y": 50.0, "health": 999}],
            "floor": 99,
            "room": 0,
            "risk": 200
        }"#;
        let snap: RunSnapshot = serde_json::from_str(json).unwrap();
        let state = snap.restore(1, RunConfig::default());

        assert_eq!(state.scheduler.floor, MAX_FLOORS);
        assert_eq!(state.scheduler.room, 1);
        assert_eq!(state.scheduler.risk, MAX_RISK);
        assert_eq!(state.player.health, state.player.max_health);
        assert_eq!(state.player.shield, 0);
        assert_eq!(state.player.weapon, Weapon::Grenade);
        assert_eq!(state.player.pos, Vec2::new(20.0, ARENA_HEIGHT - 20.0));
        assert_eq!(state.enemies.len(), 1);
        let e = &state.enemies[0];
        assert_eq!(e.pos.x, ARENA_WIDTH - e.radius);
        assert_eq!(e.health, e.max_health);
    }

    #[test]
    fn test_empty_object_uses_defaults() {
        let snap: RunSnapshot = serde_json::from_str("{}").unwrap();
        assert_eq!(snap, RunSnapshot::default());
        let state = snap.restore(2, RunConfig::default());
        assert_eq!((state.scheduler.floor, state.scheduler.room), (1, 1));
        assert!(state.enemies.is_empty());
    }
}
