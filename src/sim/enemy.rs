//! Enemy variants: patrolling shooters, bombers and chargers

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{Rect, circle_hits_any, circles_overlap};
use super::player::Player;
use super::projectile::Bullet;
use super::state::Wall;
use crate::consts::*;
use crate::clamp_to_arena;

pub const ENEMY_RADIUS: f32 = 18.0;
pub const ENEMY_BASE_HEALTH: i32 = 50;
/// Enemies never move faster than this after scaling
pub const ENEMY_MAX_SPEED: f32 = 3.5;
/// Ticks both sides wait after a contact hit
pub const CONTACT_COOLDOWN_TICKS: u32 = 30;
/// Contact damage dealt to the player / taken by the enemy
pub const CONTACT_DAMAGE_TO_PLAYER: i32 = 5;
pub const CONTACT_DAMAGE_TO_ENEMY: i32 = 10;
pub const ENEMY_BULLET_SPEED: f32 = 5.0;
/// Chargers self-detonate after travelling this far
pub const CHARGE_DISTANCE: f32 = 260.0;

const SPAWN_ATTEMPTS: u32 = 100;

/// Enemy variant tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyKind {
    Basic,
    Bomber,
    Charger,
}

impl EnemyKind {
    pub const ALL: [EnemyKind; 3] = [EnemyKind::Basic, EnemyKind::Bomber, EnemyKind::Charger];

    /// Base health before floor/risk scaling
    pub fn base_health(&self) -> i32 {
        match self {
            Self::Basic => ENEMY_BASE_HEALTH,
            Self::Bomber => (ENEMY_BASE_HEALTH as f32 * 0.8) as i32,
            Self::Charger => (ENEMY_BASE_HEALTH as f32 * 0.9) as i32,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Bomber => "bomber",
            Self::Charger => "charger",
        }
    }
}

/// Charger dash state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChargeState {
    pub charging: bool,
    pub speed: f32,
    pub dir: Vec2,
    pub travelled: f32,
    /// Ticks of patrol left before the next charge
    pub cooldown: u32,
    pub explode_radius: f32,
    pub explode_damage: i32,
}

impl ChargeState {
    fn for_risk(risk: u8, rng: &mut impl Rng) -> Self {
        let r = risk as f32;
        let lo = (120.0 - 3.0 * r).max(40.0) as u32;
        let hi = ((240.0 - 5.0 * r).max(80.0) as u32).max(lo);
        Self {
            charging: false,
            speed: 6.0 + 0.15 * r,
            dir: Vec2::ZERO,
            travelled: 0.0,
            cooldown: rng.random_range(lo..=hi),
            explode_radius: 110.0 + (1.5 * r).floor(),
            explode_damage: 26 + (0.8 * r).floor() as i32,
        }
    }
}

/// Per-variant data carried by an enemy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Behavior {
    Basic,
    /// On death: burst hitting the player and other live enemies
    Bomber { death_radius: f32, death_damage: i32 },
    /// Charges at the player and self-detonates (player only)
    Charger(ChargeState),
}

impl Behavior {
    fn for_kind(kind: EnemyKind, risk: u8, rng: &mut impl Rng) -> Self {
        let r = risk as f32;
        match kind {
            EnemyKind::Basic => Behavior::Basic,
            EnemyKind::Bomber => Behavior::Bomber {
                death_radius: 80.0 + (1.5 * r).floor(),
                death_damage: 18 + (0.6 * r).floor() as i32,
            },
            EnemyKind::Charger => Behavior::Charger(ChargeState::for_risk(risk, rng)),
        }
    }
}

/// Result of one enemy movement step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveOutcome {
    /// The enemy touched the player this step
    pub collided: bool,
    /// The player's health reached zero from this step
    pub player_died: bool,
    /// This enemy died (contact damage or self-detonation)
    pub enemy_died: bool,
    /// A charger blew itself up
    pub detonated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    /// Stable id for the lifetime of the run
    pub id: u64,
    pub pos: Vec2,
    pub radius: f32,
    pub health: i32,
    pub max_health: i32,
    pub speed: f32,
    /// Horizontal patrol direction, -1 or 1
    pub direction: f32,
    pub shoot_cooldown: i32,
    pub contact_cooldown: u32,
    pub flash: u32,
    pub behavior: Behavior,
    /// Marked dead this tick; swept out after the current sub-step
    #[serde(skip)]
    pub removed: bool,
}

impl Enemy {
    /// Spawn a fresh enemy in the upper half of the arena, away from walls
    pub fn spawn(id: u64, kind: EnemyKind, risk: u8, walls: &[Wall], rng: &mut impl Rng) -> Self {
        let radius = ENEMY_RADIUS;
        let speed = rng.random_range(1.0..=2.5);
        let shoot_cooldown = rng.random_range(30..=120);
        let direction = if rng.random_bool(0.5) { 1.0 } else { -1.0 };

        let mut pos = Vec2::ZERO;
        for _ in 0..SPAWN_ATTEMPTS {
            let x = rng.random_range(radius as i32..=(ARENA_WIDTH - radius) as i32) as f32;
            let y = rng.random_range(radius as i32..=(ARENA_HEIGHT / 2.0) as i32) as f32;
            pos = Vec2::new(x, y);
            let body = Rect::around_circle(pos, radius);
            if !walls.iter().any(|w| body.intersects(&w.rect)) {
                break;
            }
        }

        let behavior = Behavior::for_kind(kind, risk, rng);
        let health = kind.base_health();
        Self {
            id,
            pos,
            radius,
            health,
            max_health: health,
            speed,
            direction,
            shoot_cooldown,
            contact_cooldown: 0,
            flash: 0,
            behavior,
            removed: false,
        }
    }

    /// A basic enemy restored from a saved run
    pub fn restored(id: u64, pos: Vec2, health: i32, rng: &mut impl Rng) -> Self {
        let mut enemy = Self::spawn(id, EnemyKind::Basic, 0, &[], rng);
        enemy.pos = clamp_to_arena(pos, enemy.radius);
        enemy.health = health.clamp(1, enemy.max_health);
        enemy
    }

    pub fn kind(&self) -> EnemyKind {
        match self.behavior {
            Behavior::Basic => EnemyKind::Basic,
            Behavior::Bomber { .. } => EnemyKind::Bomber,
            Behavior::Charger(_) => EnemyKind::Charger,
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.removed && self.health > 0
    }

    pub fn is_charging(&self) -> bool {
        matches!(&self.behavior, Behavior::Charger(c) if c.charging)
    }

    /// Floor/room/risk strength scaling applied once at spawn
    pub fn apply_scale(&mut self, scale: f32, speed_mult: f32) {
        self.max_health = ((self.max_health as f32 * scale).floor() as i32).max(1);
        self.health = self.max_health;
        let speed = self.speed * (1.0 + (scale - 1.0) * 0.5) * speed_mult;
        self.speed = speed.clamp(0.0, ENEMY_MAX_SPEED);
    }

    /// Bomber death burst (radius, damage)
    pub fn death_burst(&self) -> Option<(f32, i32)> {
        match self.behavior {
            Behavior::Bomber {
                death_radius,
                death_damage,
            } => Some((death_radius, death_damage)),
            _ => None,
        }
    }

    pub fn take_hit(&mut self, amount: i32) {
        self.health -= amount.max(0);
        self.flash = 5;
    }

    /// Advance movement by one tick, resolving contact with the player
    pub fn move_step(&mut self, walls: &[Wall], player: &mut Player) -> MoveOutcome {
        if let Behavior::Charger(state) = &self.behavior {
            if state.charging {
                let state = state.clone();
                return self.charge_step(state, walls, player);
            }
        }

        let outcome = self.patrol_step(walls, player);

        if let Behavior::Charger(state) = &mut self.behavior {
            if state.cooldown > 0 {
                state.cooldown -= 1;
            } else {
                let to_player = player.pos - self.pos;
                state.dir = to_player.try_normalize().unwrap_or(Vec2::X);
                state.charging = true;
                state.travelled = 0.0;
                log::debug!("enemy {} starts charging", self.id);
            }
        }
        outcome
    }

    /// Horizontal patrol shared by every variant when not charging
    fn patrol_step(&mut self, walls: &[Wall], player: &mut Player) -> MoveOutcome {
        let dx = self.speed * self.direction;
        let next = Vec2::new(self.pos.x + dx, self.pos.y);
        if circle_hits_any(next, self.radius, walls.iter().map(|w| w.rect)) {
            self.direction = -self.direction;
        } else {
            self.pos.x += dx;
        }

        // Bounce off the side edges, stepping back in so we do not stick
        if self.pos.x <= self.radius {
            self.pos.x = self.radius + self.speed;
            self.direction = 1.0;
        } else if self.pos.x >= ARENA_WIDTH - self.radius {
            self.pos.x = ARENA_WIDTH - self.radius - self.speed;
            self.direction = -1.0;
        }
        self.pos.y = self.pos.y.clamp(self.radius, ARENA_HEIGHT - self.radius);

        if self.contact_cooldown > 0 {
            self.contact_cooldown -= 1;
            return MoveOutcome::default();
        }
        if !circles_overlap(self.pos, self.radius, player.pos, player.radius) {
            return MoveOutcome::default();
        }

        player.take_damage(CONTACT_DAMAGE_TO_PLAYER);
        self.take_hit(CONTACT_DAMAGE_TO_ENEMY);
        self.contact_cooldown = CONTACT_COOLDOWN_TICKS;
        player.collision_cooldown = CONTACT_COOLDOWN_TICKS;

        MoveOutcome {
            collided: true,
            player_died: self.health > 0 && player.is_dead(),
            enemy_died: self.health <= 0,
            detonated: false,
        }
    }

    fn charge_step(&mut self, mut state: ChargeState, walls: &[Wall], player: &mut Player) -> MoveOutcome {
        let next = clamp_to_arena(self.pos + state.dir * state.speed, self.radius);
        let body = Rect::around_circle(next, self.radius);

        let outcome = if walls.iter().any(|w| body.intersects(&w.rect)) {
            Some(false)
        } else {
            self.pos = next;
            state.travelled += state.speed;
            if circles_overlap(self.pos, self.radius, player.pos, player.radius) {
                Some(true)
            } else if state.travelled >= CHARGE_DISTANCE {
                Some(false)
            } else {
                None
            }
        };

        let result = match outcome {
            None => MoveOutcome::default(),
            Some(collided) => {
                if circles_overlap(self.pos, state.explode_radius, player.pos, player.radius) {
                    player.take_damage(state.explode_damage);
                }
                self.health = 0;
                MoveOutcome {
                    collided,
                    player_died: player.is_dead(),
                    enemy_died: true,
                    detonated: true,
                }
            }
        };
        self.behavior = Behavior::Charger(state);
        result
    }

    /// Count down the shot timer and fire when it runs out
    pub fn try_shoot(&mut self, rng: &mut impl Rng) -> Option<Bullet> {
        self.shoot_cooldown -= 1;
        if self.shoot_cooldown > 0 {
            return None;
        }
        self.shoot_cooldown = rng.random_range(60..=180);
        Some(Bullet::enemy(self.pos + Vec2::new(0.0, 30.0), ENEMY_BULLET_SPEED))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(7)
    }

    #[test]
    fn test_variant_base_health() {
        assert_eq!(EnemyKind::Basic.base_health(), 50);
        assert_eq!(EnemyKind::Bomber.base_health(), 40);
        assert_eq!(EnemyKind::Charger.base_health(), 45);
    }

    #[test]
    fn test_spawn_in_upper_half() {
        let mut rng = rng();
        for id in 0..50 {
            let e = Enemy::spawn(id, EnemyKind::Basic, 0, &[], &mut rng);
            assert!(e.pos.y <= ARENA_HEIGHT / 2.0);
            assert!(e.pos.x >= e.radius && e.pos.x <= ARENA_WIDTH - e.radius);
            assert!((1.0..=2.5).contains(&e.speed));
        }
    }

    #[test]
    fn test_bomber_and_charger_scale_with_risk() {
        let mut rng = rng();
        let b = Enemy::spawn(1, EnemyKind::Bomber, 10, &[], &mut rng);
        assert_eq!(b.death_burst(), Some((95.0, 24)));

        let c = Enemy::spawn(2, EnemyKind::Charger, 10, &[], &mut rng);
        let Behavior::Charger(state) = &c.behavior else {
            panic!("expected charger");
        };
        assert!((state.speed - 7.5).abs() < 1e-5);
        assert_eq!(state.explode_radius, 125.0);
        assert_eq!(state.explode_damage, 34);
        assert!((90..=190).contains(&state.cooldown));
    }

    #[test]
    fn test_scale_caps_speed() {
        let mut rng = rng();
        let mut e = Enemy::spawn(1, EnemyKind::Basic, 0, &[], &mut rng);
        e.speed = 2.5;
        e.apply_scale(4.0, 1.5);
        assert_eq!(e.max_health, 200);
        assert_eq!(e.health, 200);
        assert_eq!(e.speed, ENEMY_MAX_SPEED);
    }

    #[test]
    fn test_contact_damages_both_sides() {
        let mut rng = rng();
        let mut player = Player::default();
        let mut e = Enemy::spawn(1, EnemyKind::Basic, 0, &[], &mut rng);
        e.pos = player.pos + Vec2::new(10.0, 0.0);
        e.speed = 0.0;

        let out = e.move_step(&[], &mut player);
        assert!(out.collided);
        assert!(!out.enemy_died);
        assert_eq!(player.health, 95);
        assert_eq!(e.health, 40);

        // Cooldown prevents a second hit next tick
        let out = e.move_step(&[], &mut player);
        assert!(!out.collided);
        assert_eq!(player.health, 95);
    }

    #[test]
    fn test_patrol_reverses_at_wall() {
        let mut rng = rng();
        let mut player = Player::default();
        let mut e = Enemy::spawn(1, EnemyKind::Basic, 0, &[], &mut rng);
        e.pos = Vec2::new(200.0, 100.0);
        e.speed = 2.0;
        e.direction = 1.0;
        let walls = vec![Wall::new(219.0, 80.0, 20.0, 40.0)];
        e.move_step(&walls, &mut player);
        assert_eq!(e.direction, -1.0);
        assert_eq!(e.pos.x, 200.0);
    }

    #[test]
    fn test_charger_detonates_after_distance() {
        let mut rng = rng();
        let mut player = Player::default();
        player.pos = Vec2::new(400.0, 580.0);
        let mut e = Enemy::spawn(1, EnemyKind::Charger, 0, &[], &mut rng);
        e.pos = Vec2::new(400.0, 40.0);
        if let Behavior::Charger(state) = &mut e.behavior {
            state.charging = true;
            state.dir = Vec2::Y;
        }
        let mut steps = 0;
        loop {
            steps += 1;
            let out = e.move_step(&[], &mut player);
            if out.enemy_died {
                assert!(out.detonated);
                break;
            }
            assert!(steps < 100);
        }
        // 260 / 6 -> 44 steps
        assert_eq!(steps, 44);
        // Too far away to be hurt
        assert_eq!(player.health, 100);
    }

    #[test]
    fn test_shoot_countdown() {
        let mut rng = rng();
        let mut e = Enemy::spawn(1, EnemyKind::Basic, 0, &[], &mut rng);
        e.shoot_cooldown = 2;
        assert!(e.try_shoot(&mut rng).is_none());
        let bullet = e.try_shoot(&mut rng).expect("fires at zero");
        assert_eq!(bullet.pos, e.pos + Vec2::new(0.0, 30.0));
        assert!((60..=180).contains(&e.shoot_cooldown));
    }
}
