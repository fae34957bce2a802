//! Bullets and grenades

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::player::Weapon;
use crate::is_off_screen;

/// Grenades detonate after travelling this far
pub const GRENADE_MAX_DISTANCE: f32 = 320.0;
/// Burst radius of a grenade detonation
pub const GRENADE_EXPLOSION_RADIUS: f32 = 155.0;
/// Base grenade damage before bonuses and risk
pub const GRENADE_BASE_DAMAGE: i32 = 50;
/// Damage dealt to the player by an enemy bullet
pub const ENEMY_BULLET_DAMAGE: i32 = 10;

/// Who fired a bullet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BulletOwner {
    Player,
    Enemy,
}

/// A straight-flying bullet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub owner: BulletOwner,
    /// Weapon credited for kills (player bullets only)
    pub weapon: Option<Weapon>,
}

impl Bullet {
    /// Player bullet travelling with velocity `vel`
    pub fn player(pos: Vec2, vel: Vec2, radius: f32, weapon: Weapon) -> Self {
        Self {
            pos,
            vel,
            radius,
            owner: BulletOwner::Player,
            weapon: Some(weapon),
        }
    }

    /// Enemy bullet falling straight down
    pub fn enemy(pos: Vec2, speed: f32) -> Self {
        Self {
            pos,
            vel: Vec2::new(0.0, speed),
            radius: 5.0,
            owner: BulletOwner::Enemy,
            weapon: None,
        }
    }

    pub fn advance(&mut self) {
        self.pos += self.vel;
    }

    pub fn off_screen(&self) -> bool {
        is_off_screen(self.pos)
    }
}

/// A thrown grenade. Detonation is driven by distance covered, not by
/// elapsed ticks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grenade {
    pub pos: Vec2,
    /// Signed vertical speed per tick (negative flies up)
    pub speed: f32,
    pub radius: f32,
    pub explosion_radius: f32,
    pub fly_distance: f32,
    pub max_distance: f32,
    pub exploded: bool,
}

impl Grenade {
    pub fn new(pos: Vec2, speed: f32) -> Self {
        Self {
            pos,
            speed,
            radius: 8.0,
            explosion_radius: GRENADE_EXPLOSION_RADIUS,
            fly_distance: 0.0,
            max_distance: GRENADE_MAX_DISTANCE,
            exploded: false,
        }
    }

    /// Ticks left before detonation (fuse display only)
    pub fn fuse_ticks(&self) -> u32 {
        let step = self.speed.abs().max(1.0);
        ((self.max_distance - self.fly_distance).max(0.0) / step).ceil() as u32
    }

    /// Advance one tick. Returns true on the tick the grenade detonates.
    pub fn update(&mut self) -> bool {
        if self.exploded {
            return false;
        }
        self.pos.y += self.speed;
        // A stalled grenade still burns down its fuse
        self.fly_distance += self.speed.abs().max(1.0);
        if self.fly_distance >= self.max_distance {
            self.exploded = true;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grenade_detonates_by_distance() {
        let mut g = Grenade::new(Vec2::new(400.0, 500.0), -8.0);
        let mut updates = 0;
        while !g.update() {
            updates += 1;
            assert!(updates < 1000);
        }
        // 320 / 8 = 40 updates, the 40th returns true
        assert_eq!(updates + 1, 40);
        assert!((g.pos.y - (500.0 - 320.0)).abs() < 1e-3);
        // Only reports detonation once
        assert!(!g.update());
    }

    #[test]
    fn test_grenade_speed_changes_fuse_length() {
        let mut g = Grenade::new(Vec2::ZERO, 7.0);
        let mut n = 0;
        loop {
            n += 1;
            if g.update() {
                break;
            }
        }
        // ceil(320 / 7) = 46
        assert_eq!(n, 46);
    }

    #[test]
    fn test_fuse_ticks_counts_down() {
        let mut g = Grenade::new(Vec2::ZERO, -8.0);
        assert_eq!(g.fuse_ticks(), 40);
        g.update();
        assert_eq!(g.fuse_ticks(), 39);
    }

    #[test]
    fn test_bullet_off_screen() {
        let mut b = Bullet::enemy(Vec2::new(100.0, 617.0), 5.0);
        assert!(!b.off_screen());
        b.advance();
        assert!(b.off_screen());
    }
}
