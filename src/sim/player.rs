//! The player: movement, weapons, skills and damage intake

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::circle_hits_any;
use super::projectile::{Bullet, GRENADE_BASE_DAMAGE, Grenade};
use super::risk::RiskModifiers;
use super::scheduler::PermanentBonuses;
use super::state::Wall;
use crate::clamp_to_arena;
use crate::consts::*;

pub const PLAYER_RADIUS: f32 = 20.0;
pub const PLAYER_BASE_SPEED: f32 = 2.5;
pub const PLAYER_BASE_HEALTH: i32 = 100;
pub const PLAYER_BASE_SHIELD_MAX: i32 = 60;
pub const PLAYER_BASE_BULLET_DAMAGE: i32 = 10;

/// Shared cooldown used by every skill except rapid fire
pub const SKILL_COOLDOWN_TICKS: u32 = 900;
pub const ATTACK_BOOST_DURATION_TICKS: u32 = 300;
pub const ATTACK_BOOST_COOLDOWN_TICKS: u32 = 900;
pub const GRENADE_COOLDOWN_TICKS: u32 = 600;
/// Frames of hit flash after taking health damage
const HIT_FLASH_TICKS: u32 = 10;

/// Muzzle offset above the player center
const MUZZLE_OFFSET: f32 = 30.0;

/// Selectable weapons, in slot order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Weapon {
    #[default]
    Pistol,
    Shotgun,
    Grenade,
}

impl Weapon {
    pub const ALL: [Weapon; 3] = [Weapon::Pistol, Weapon::Shotgun, Weapon::Grenade];

    /// Slot index (0 pistol, 1 shotgun, 2 grenade)
    pub fn index(&self) -> usize {
        match self {
            Weapon::Pistol => 0,
            Weapon::Shotgun => 1,
            Weapon::Grenade => 2,
        }
    }

    /// Weapon for a slot index; out-of-range values clamp to the nearest slot
    pub fn from_index(index: i64) -> Self {
        match index {
            i if i <= 0 => Weapon::Pistol,
            1 => Weapon::Shotgun,
            _ => Weapon::Grenade,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Weapon::Pistol => "Pistol",
            Weapon::Shotgun => "Shotgun",
            Weapon::Grenade => "Grenade",
        }
    }

    /// Gun cooldown after firing, before the rapid-fire reduction
    fn base_cooldown(&self) -> u32 {
        match self {
            Weapon::Pistol => 15,
            Weapon::Shotgun => 30,
            Weapon::Grenade => 20,
        }
    }

    /// Next weapon in the given direction, wrapping around
    pub fn cycled(&self, direction: i32) -> Self {
        let idx = (self.index() as i32 + direction).rem_euclid(3);
        Weapon::from_index(idx as i64)
    }
}

/// One-shot skill picked before the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Skill {
    /// Attack speed up (halved gun cooldown) and +50% bullet damage for 5s
    #[default]
    RapidFire,
    /// +40 shield and heal 40
    Fortify,
    /// Ten cone volleys of buckshot at once
    TripleCone,
}

impl Skill {
    pub fn as_str(&self) -> &'static str {
        match self {
            Skill::RapidFire => "rapid",
            Skill::Fortify => "fortify",
            Skill::TripleCone => "triple",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "rapid" | "rapid-fire" | "rapidfire" => Some(Skill::RapidFire),
            "fortify" => Some(Skill::Fortify),
            "triple" | "triple-cone" | "buckshot" => Some(Skill::TripleCone),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Skill::RapidFire => "Attack speed up for 5s. CD 15s",
            Skill::Fortify => "+40 Shield and Heal 40. CD 15s",
            Skill::TripleCone => "Fire 3 shotgun volleys instantly. CD 15s",
        }
    }
}

/// Which control fires the current weapon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FireBinding {
    #[default]
    Keyboard,
    Mouse,
}

/// The player character
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub radius: f32,
    pub speed: f32,
    pub health: i32,
    pub max_health: i32,
    pub shield: i32,
    pub shield_max: i32,
    /// Cosmetic hit flash (no gameplay effect)
    pub flash: u32,
    pub weapon: Weapon,
    /// Shared cooldown for every weapon
    pub gun_cooldown: u32,
    pub grenade_cooldown: u32,
    pub attack_boost_active: bool,
    pub attack_boost_duration: u32,
    pub attack_boost_cooldown: u32,
    pub collision_cooldown: u32,
    pub bullet_damage: i32,
    pub score: u64,
    pub gold: u32,
    pub skill: Skill,
    pub skill_cooldown: u32,
    pub fire_binding: FireBinding,
}

impl Default for Player {
    fn default() -> Self {
        Self::new(Skill::default(), FireBinding::default())
    }
}

impl Player {
    pub fn new(skill: Skill, fire_binding: FireBinding) -> Self {
        Self {
            pos: Vec2::new(ARENA_WIDTH / 2.0, ARENA_HEIGHT - 80.0),
            radius: PLAYER_RADIUS,
            speed: PLAYER_BASE_SPEED,
            health: PLAYER_BASE_HEALTH,
            max_health: PLAYER_BASE_HEALTH,
            shield: 0,
            shield_max: PLAYER_BASE_SHIELD_MAX,
            flash: 0,
            weapon: Weapon::Pistol,
            gun_cooldown: 0,
            grenade_cooldown: 0,
            attack_boost_active: false,
            attack_boost_duration: 0,
            attack_boost_cooldown: 0,
            collision_cooldown: 0,
            bullet_damage: PLAYER_BASE_BULLET_DAMAGE,
            score: 0,
            gold: 0,
            skill,
            skill_cooldown: 0,
            fire_binding,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }

    pub fn add_gold(&mut self, amount: u32) {
        self.gold = self.gold.saturating_add(amount);
    }

    /// Spend gold if affordable; never goes negative
    pub fn spend_gold(&mut self, amount: u32) -> bool {
        if self.gold >= amount {
            self.gold -= amount;
            true
        } else {
            false
        }
    }

    pub fn heal(&mut self, amount: i32) {
        self.health = (self.health + amount.max(0)).min(self.max_health);
    }

    pub fn add_shield(&mut self, amount: i32) {
        self.shield = (self.shield + amount.max(0)).clamp(0, self.shield_max);
    }

    /// Apply incoming damage: shield absorbs first, the rest comes off
    /// health (clamped at 0). Returns the health actually lost.
    pub fn take_damage(&mut self, amount: i32) -> i32 {
        let mut dmg = amount.max(0);
        if dmg == 0 {
            return 0;
        }
        if self.shield > 0 {
            let absorbed = self.shield.min(dmg);
            self.shield -= absorbed;
            dmg -= absorbed;
        }
        if dmg > 0 {
            let before = self.health;
            self.health = (self.health - dmg).max(0);
            self.flash = HIT_FLASH_TICKS;
            return before - self.health;
        }
        0
    }

    /// Move along `axis` (each component in -1..=1). The step is rejected
    /// entirely if the destination overlaps a wall.
    pub fn move_by(&mut self, axis: Vec2, walls: &[Wall]) {
        let axis = axis.clamp(Vec2::splat(-1.0), Vec2::splat(1.0));
        if axis == Vec2::ZERO {
            return;
        }
        let next = clamp_to_arena(self.pos + axis * self.speed, self.radius);
        if !circle_hits_any(next, self.radius, walls.iter().map(|w| w.rect)) {
            self.pos = next;
        }
    }

    /// Per-tick cooldown bookkeeping
    pub fn update_skills(&mut self) {
        self.flash = self.flash.saturating_sub(1);
        if self.attack_boost_active {
            self.attack_boost_duration = self.attack_boost_duration.saturating_sub(1);
            if self.attack_boost_duration == 0 {
                self.attack_boost_active = false;
            }
        }
        self.attack_boost_cooldown = self.attack_boost_cooldown.saturating_sub(1);
        self.skill_cooldown = self.skill_cooldown.saturating_sub(1);
        self.collision_cooldown = self.collision_cooldown.saturating_sub(1);
        self.gun_cooldown = self.gun_cooldown.saturating_sub(1);
        self.grenade_cooldown = self.grenade_cooldown.saturating_sub(1);
    }

    pub fn switch_weapon(&mut self, direction: i32) {
        self.weapon = self.weapon.cycled(direction);
    }

    /// Fire the current weapon if its cooldowns allow. Returns the weapon
    /// that fired.
    pub fn shoot(&mut self, bullets: &mut Vec<Bullet>, grenades: &mut Vec<Grenade>) -> Option<Weapon> {
        if self.gun_cooldown > 0 {
            return None;
        }
        let muzzle = self.pos - Vec2::new(0.0, MUZZLE_OFFSET);
        let rapid = self.attack_boost_active && self.weapon != Weapon::Grenade;
        let cooldown = if rapid {
            self.weapon.base_cooldown() / 2
        } else {
            self.weapon.base_cooldown()
        };

        match self.weapon {
            Weapon::Pistol => {
                bullets.push(Bullet::player(muzzle, Vec2::new(0.0, -10.0), 5.0, Weapon::Pistol));
            }
            Weapon::Shotgun => {
                for (dx, speed) in [(-10.0, 10.0), (0.0, 12.0), (10.0, 10.0)] {
                    bullets.push(Bullet::player(
                        muzzle + Vec2::new(dx, 0.0),
                        Vec2::new(0.0, -speed),
                        8.0,
                        Weapon::Shotgun,
                    ));
                }
            }
            Weapon::Grenade => {
                if self.grenade_cooldown > 0 {
                    return None;
                }
                grenades.push(Grenade::new(muzzle, -8.0));
                self.grenade_cooldown = GRENADE_COOLDOWN_TICKS;
            }
        }
        self.gun_cooldown = cooldown;
        Some(self.weapon)
    }

    pub fn activate_attack_boost(&mut self) -> bool {
        if self.attack_boost_cooldown > 0 {
            return false;
        }
        self.attack_boost_active = true;
        self.attack_boost_duration = ATTACK_BOOST_DURATION_TICKS;
        self.attack_boost_cooldown = ATTACK_BOOST_COOLDOWN_TICKS;
        true
    }

    /// Trigger the selected skill. Returns false while it is cooling down.
    pub fn activate_skill(&mut self, bullets: &mut Vec<Bullet>) -> bool {
        match self.skill {
            Skill::RapidFire => self.activate_attack_boost(),
            Skill::Fortify => {
                if self.skill_cooldown > 0 {
                    return false;
                }
                self.heal(40);
                self.add_shield(40);
                self.skill_cooldown = SKILL_COOLDOWN_TICKS;
                true
            }
            Skill::TripleCone => {
                if self.skill_cooldown > 0 {
                    return false;
                }
                let muzzle = self.pos - Vec2::new(0.0, MUZZLE_OFFSET);
                for volley in 0..10 {
                    let t = volley as f32 / 9.0;
                    let spread = (36.0 + 24.0 * t).floor();
                    let speed = 11.0 + (2.0 * t).floor();
                    fire_cone(bullets, muzzle, spread, 7, speed);
                }
                self.skill_cooldown = SKILL_COOLDOWN_TICKS;
                true
            }
        }
    }

    /// Damage of a player bullet after boost, risk and permanent bonus
    pub fn effective_damage(&self, base: i32, risk: &RiskModifiers, bonuses: &PermanentBonuses) -> i32 {
        let mut dmg = base as f32;
        if self.attack_boost_active {
            dmg *= 1.5;
        }
        dmg *= risk.player_damage_mult.max(0.1);
        dmg *= 1.0 + bonuses.damage_bonus;
        (dmg.floor() as i32).max(1)
    }

    /// Grenade damage: independent base, milder boost multiplier
    pub fn grenade_damage(&self, risk: &RiskModifiers, bonuses: &PermanentBonuses) -> i32 {
        let mut dmg = (GRENADE_BASE_DAMAGE + bonuses.grenade_damage_bonus) as f32;
        dmg *= risk.player_damage_mult.max(0.1);
        if self.attack_boost_active {
            dmg *= 1.2;
        }
        (dmg.floor() as i32).max(1)
    }

    /// Ratio helpers for HUD bars; safe with zero maxima
    pub fn health_ratio(&self) -> f32 {
        if self.max_health <= 0 {
            0.0
        } else {
            (self.health as f32 / self.max_health as f32).clamp(0.0, 1.0)
        }
    }

    pub fn shield_ratio(&self) -> f32 {
        if self.shield_max <= 0 {
            0.0
        } else {
            (self.shield as f32 / self.shield_max as f32).clamp(0.0, 1.0)
        }
    }
}

/// Evenly spaced pellets across `spread_deg`, centered on straight up
fn fire_cone(bullets: &mut Vec<Bullet>, origin: Vec2, spread_deg: f32, pellets: u32, speed: f32) {
    let angles: Vec<f32> = if pellets <= 1 {
        vec![0.0]
    } else {
        let start = -spread_deg / 2.0;
        let step = spread_deg / (pellets - 1) as f32;
        (0..pellets).map(|i| start + i as f32 * step).collect()
    };
    for deg in angles {
        let rad = deg.to_radians();
        let vel = Vec2::new(speed * rad.sin(), -speed * rad.cos());
        bullets.push(Bullet::player(origin, vel, 6.0, Weapon::Shotgun));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bonuses() -> PermanentBonuses {
        PermanentBonuses::default()
    }

    #[test]
    fn test_damage_absorption_order() {
        let mut p = Player::default();
        p.shield = 15;
        let lost = p.take_damage(20);
        assert_eq!(p.shield, 0);
        assert_eq!(lost, 5);
        assert_eq!(p.health, 95);
        assert_eq!(p.flash, HIT_FLASH_TICKS);
    }

    #[test]
    fn test_shield_only_hit_does_not_flash() {
        let mut p = Player::default();
        p.shield = 30;
        assert_eq!(p.take_damage(10), 0);
        assert_eq!(p.shield, 20);
        assert_eq!(p.health, 100);
        assert_eq!(p.flash, 0);
    }

    #[test]
    fn test_health_sequence_clamps_at_zero() {
        let mut p = Player::default();
        p.take_damage(30);
        assert_eq!(p.health, 70);
        p.take_damage(80);
        assert_eq!(p.health, 0);
        assert!(p.is_dead());
        // Negative damage is ignored
        p.take_damage(-50);
        assert_eq!(p.health, 0);
    }

    #[test]
    fn test_effective_damage_formula() {
        let mut p = Player::default();
        let risk = RiskModifiers::for_risk(0);
        assert_eq!(p.effective_damage(10, &risk, &bonuses()), 10);

        p.attack_boost_active = true;
        assert_eq!(p.effective_damage(10, &risk, &bonuses()), 15);

        // risk 20 -> 0.76: 10 * 1.5 * 0.76 = 11.4 -> 11
        let risk = RiskModifiers::for_risk(20);
        assert_eq!(p.effective_damage(10, &risk, &bonuses()), 11);

        let mut b = bonuses();
        b.damage_bonus = 0.1;
        // 15 * 0.76 * 1.1 = 12.54 -> 12
        assert_eq!(p.effective_damage(10, &risk, &b), 12);

        // Never below 1
        p.attack_boost_active = false;
        assert_eq!(p.effective_damage(0, &risk, &b), 1);
    }

    #[test]
    fn test_grenade_damage_formula() {
        let mut p = Player::default();
        let risk = RiskModifiers::for_risk(0);
        assert_eq!(p.grenade_damage(&risk, &bonuses()), 50);
        p.attack_boost_active = true;
        assert_eq!(p.grenade_damage(&risk, &bonuses()), 60);

        let mut b = bonuses();
        b.grenade_damage_bonus = 15;
        let risk = RiskModifiers::for_risk(10);
        // 65 * 0.9 * 1.2 = 70.2 -> 70
        assert_eq!(p.grenade_damage(&risk, &b), 70);
    }

    #[test]
    fn test_weapon_cooldowns_and_rapid_fire() {
        let mut p = Player::default();
        let mut bullets = Vec::new();
        let mut grenades = Vec::new();

        assert_eq!(p.shoot(&mut bullets, &mut grenades), Some(Weapon::Pistol));
        assert_eq!(p.gun_cooldown, 15);
        assert_eq!(bullets.len(), 1);
        assert_eq!(p.shoot(&mut bullets, &mut grenades), None);

        p.gun_cooldown = 0;
        p.weapon = Weapon::Shotgun;
        p.activate_attack_boost();
        p.shoot(&mut bullets, &mut grenades);
        assert_eq!(bullets.len(), 4);
        assert_eq!(p.gun_cooldown, 15);

        p.gun_cooldown = 0;
        p.weapon = Weapon::Grenade;
        assert_eq!(p.shoot(&mut bullets, &mut grenades), Some(Weapon::Grenade));
        assert_eq!(grenades.len(), 1);
        assert_eq!(p.gun_cooldown, 20);
        assert_eq!(p.grenade_cooldown, GRENADE_COOLDOWN_TICKS);

        p.gun_cooldown = 0;
        assert_eq!(p.shoot(&mut bullets, &mut grenades), None);
    }

    #[test]
    fn test_triple_cone_fires_seventy_pellets() {
        let mut p = Player::new(Skill::TripleCone, FireBinding::Keyboard);
        let mut bullets = Vec::new();
        assert!(p.activate_skill(&mut bullets));
        assert_eq!(bullets.len(), 70);
        assert!(bullets.iter().all(|b| b.vel.y < 0.0));
        assert!(!p.activate_skill(&mut bullets));
    }

    #[test]
    fn test_fortify_caps_at_maxima() {
        let mut p = Player::new(Skill::Fortify, FireBinding::Keyboard);
        p.health = 90;
        p.shield = 50;
        let mut bullets = Vec::new();
        assert!(p.activate_skill(&mut bullets));
        assert_eq!(p.health, 100);
        assert_eq!(p.shield, 60);
        assert_eq!(p.skill_cooldown, SKILL_COOLDOWN_TICKS);
    }

    #[test]
    fn test_attack_boost_expires() {
        let mut p = Player::default();
        assert!(p.activate_attack_boost());
        for _ in 0..ATTACK_BOOST_DURATION_TICKS {
            p.update_skills();
        }
        assert!(!p.attack_boost_active);
        assert!(!p.activate_attack_boost());
    }

    #[test]
    fn test_weapon_index_clamps() {
        assert_eq!(Weapon::from_index(-4), Weapon::Pistol);
        assert_eq!(Weapon::from_index(1), Weapon::Shotgun);
        assert_eq!(Weapon::from_index(9), Weapon::Grenade);
        assert_eq!(Weapon::Pistol.cycled(-1), Weapon::Grenade);
        assert_eq!(Weapon::Grenade.cycled(1), Weapon::Pistol);
    }

    #[test]
    fn test_move_blocked_by_wall() {
        let mut p = Player::default();
        p.pos = Vec2::new(100.0, 100.0);
        let walls = vec![Wall::new(123.0, 80.0, 20.0, 40.0)];
        p.move_by(Vec2::new(1.0, 0.0), &walls);
        assert_eq!(p.pos, Vec2::new(100.0, 100.0));
        p.move_by(Vec2::new(-1.0, 0.0), &walls);
        assert_eq!(p.pos, Vec2::new(97.5, 100.0));
    }

    #[test]
    fn test_spend_gold_never_negative() {
        let mut p = Player::default();
        p.add_gold(10);
        assert!(!p.spend_gold(11));
        assert_eq!(p.gold, 10);
        assert!(p.spend_gold(10));
        assert_eq!(p.gold, 0);
    }
}
