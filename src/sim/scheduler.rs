//! Floor/room progression, risk escalation and enemy spawning

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use super::enemy::{Enemy, EnemyKind};
use super::player::Player;
use super::risk::{Difficulty, MAX_RISK, RiskModifiers};
use super::state::Wall;
use crate::consts::*;

/// Attempts to place each wall before using the fallback platform
const WALL_PLACEMENT_ATTEMPTS: u32 = 200;
const WALL_MARGIN: i32 = 40;
const WALL_GAP: f32 = 12.0;
const PLAYER_PLACEMENT_ATTEMPTS: u32 = 120;

/// Stat increases that stay for the rest of the run. Never decreases.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PermanentBonuses {
    pub health_bonus: i32,
    /// Fractional bullet damage bonus (0.1 = +10%)
    pub damage_bonus: f32,
    pub grenade_damage_bonus: i32,
    pub speed_bonus: f32,
}

/// What a boss victory granted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BossBonus {
    pub health: i32,
    pub damage: f32,
    pub grenade: i32,
    pub speed: f32,
}

/// Where the run goes after a cleared room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomAdvance {
    /// Next room on the same floor
    NextRoom,
    /// The floor was finished; shop before the next one
    NextFloor,
    /// The last room of the last floor was cleared
    Victory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scheduler {
    pub floor: u32,
    pub room: u32,
    pub difficulty: Difficulty,
    pub risk: u8,
    /// Risk pinned for the whole run
    pub risk_fixed: bool,
    pub modifiers: RiskModifiers,
    pub bonuses: PermanentBonuses,
    pub spawned: u32,
    pub target: u32,
    pub cap: u32,
    pub timer: u32,
}

impl Scheduler {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            floor: 1,
            room: 1,
            difficulty,
            risk: 0,
            risk_fixed: false,
            modifiers: RiskModifiers::for_risk(0),
            bonuses: PermanentBonuses::default(),
            spawned: 0,
            target: 0,
            cap: 0,
            timer: 0,
        }
    }

    /// Normal preset with risk pinned to `risk` for the whole run
    pub fn with_fixed_risk(risk: u8) -> Self {
        let mut sched = Self::new(Difficulty::Normal);
        sched.risk = risk.min(MAX_RISK);
        sched.risk_fixed = true;
        sched.modifiers = RiskModifiers::for_risk(sched.risk);
        sched
    }

    pub fn is_boss_floor(&self) -> bool {
        self.floor >= BOSS_FLOOR_INTERVAL && self.floor % BOSS_FLOOR_INTERVAL == 0
    }

    pub fn is_boss_room(&self) -> bool {
        self.is_boss_floor() && self.room == BOSS_ROOM
    }

    pub fn is_final_floor(&self) -> bool {
        self.floor >= MAX_FLOORS
    }

    /// Boss level (floor / 5), 0 off boss floors
    pub fn boss_level(&self) -> u32 {
        if self.is_boss_floor() {
            self.floor / BOSS_FLOOR_INTERVAL
        } else {
            0
        }
    }

    /// Reset the per-room counters and escalate risk. Returns true if this
    /// is a boss room.
    pub fn begin_room(&mut self, rng: &mut impl Rng) -> bool {
        self.spawned = 0;
        self.timer = 0;
        self.cap = (5 + self.room as i32 + self.difficulty.cap_offset()).max(3) as u32;
        let base = (6 + 2 * (self.floor as i32 - 1) + self.difficulty.base_enemies_offset()).max(3);
        self.target = base as u32 + rng.random_range(0..=3);

        let boss_room = self.is_boss_room();
        if boss_room {
            self.target = 0;
        }

        if !self.risk_fixed {
            self.risk = (self.risk + self.difficulty.risk_increment()).min(MAX_RISK);
        }
        self.modifiers = RiskModifiers::for_risk(self.risk);

        log::info!(
            "room start: floor {} room {} risk {} target {} cap {}{}",
            self.floor,
            self.room,
            self.risk,
            self.target,
            self.cap,
            if boss_room { " (boss)" } else { "" }
        );
        boss_room
    }

    /// Random non-overlapping wall layout for the current room
    pub fn gen_walls(&self, rng: &mut impl Rng) -> Vec<Wall> {
        let count = 5 + self.room % 3;
        let mut walls: Vec<Wall> = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let mut placed = false;
            for _ in 0..WALL_PLACEMENT_ATTEMPTS {
                let w = rng.random_range(80..=180);
                let h = rng.random_range(16..=28);
                let x = rng.random_range(WALL_MARGIN..=ARENA_WIDTH as i32 - w - WALL_MARGIN);
                let y = rng.random_range(80..=ARENA_HEIGHT as i32 - h - 120);
                let candidate = Wall::new(x as f32, y as f32, w as f32, h as f32);
                let spaced = candidate.rect.inflate(WALL_GAP);
                if walls.iter().any(|other| spaced.intersects(&other.rect)) {
                    continue;
                }
                walls.push(candidate);
                placed = true;
                break;
            }
            if !placed {
                walls.push(Wall::new(WALL_MARGIN as f32, 120.0, 100.0, 20.0));
            }
        }
        walls
    }

    /// Move the player to a wall-free spot in the lower half
    pub fn place_player(&self, player: &mut Player, walls: &[Wall], rng: &mut impl Rng) {
        let r = player.radius as i32;
        for _ in 0..PLAYER_PLACEMENT_ATTEMPTS {
            let x = rng.random_range(r + 10..=ARENA_WIDTH as i32 - r - 10);
            let y = rng.random_range(ARENA_HEIGHT as i32 / 2..=ARENA_HEIGHT as i32 - r - 10);
            let pos = Vec2::new(x as f32, y as f32);
            let body = Rect::around_circle(pos, player.radius);
            if !walls.iter().any(|w| body.intersects(&w.rect)) {
                player.pos = pos;
                return;
            }
        }
        player.pos = Vec2::new(player.radius + 20.0, ARENA_HEIGHT - player.radius - 20.0);
    }

    /// Spawn-kind weights (basic, bomber, charger), normalized
    pub fn kind_weights(&self) -> [f32; 3] {
        let base = if self.floor >= 6 {
            [0.5, 0.3, 0.2]
        } else {
            [0.6, 0.25, 0.15]
        };
        let r = self.risk as f32;
        let w = [
            (base[0] - 0.01 * r).max(0.05),
            (base[1] + 0.005 * r).max(0.05),
            (base[2] + 0.005 * r).max(0.05),
        ];
        let sum: f32 = w.iter().sum();
        [w[0] / sum, w[1] / sum, w[2] / sum]
    }

    pub fn pick_kind(&self, rng: &mut impl Rng) -> EnemyKind {
        let roll: f32 = rng.random();
        let mut acc = 0.0;
        for (kind, weight) in EnemyKind::ALL.into_iter().zip(self.kind_weights()) {
            acc += weight;
            if roll <= acc {
                return kind;
            }
        }
        EnemyKind::Basic
    }

    /// Strength multiplier for enemies spawned in the current room
    pub fn strength_scale(&self) -> f32 {
        let floor_room = 1.0 + 0.25 * (self.floor as f32 - 1.0) + 0.1 * (self.room as f32 - 1.0);
        (floor_room + self.difficulty.enemy_scale_bonus()) * self.modifiers.enemy_health_mult
    }

    /// Advance the spawn timer and spawn one enemy when due
    pub fn update_spawning(
        &mut self,
        enemies: &mut Vec<Enemy>,
        walls: &[Wall],
        next_id: &mut u64,
        rng: &mut impl Rng,
    ) -> Option<EnemyKind> {
        self.timer += 1;
        let alive = enemies.iter().filter(|e| e.is_alive()).count() as u32;
        if self.spawned >= self.target
            || alive >= self.cap
            || self.timer < self.difficulty.spawn_interval()
        {
            return None;
        }

        let kind = self.pick_kind(rng);
        let mut enemy = Enemy::spawn(*next_id, kind, self.risk, walls, rng);
        *next_id += 1;
        enemy.apply_scale(self.strength_scale(), self.modifiers.enemy_speed_mult);
        log::debug!(
            "spawn {} #{} hp {} speed {:.2}",
            kind.name(),
            enemy.id,
            enemy.max_health,
            enemy.speed
        );
        enemies.push(enemy);
        self.spawned += 1;
        self.timer = 0;
        Some(kind)
    }

    pub fn room_cleared(&self, alive_enemies: usize, boss_present: bool, boss_pending: bool) -> bool {
        self.spawned >= self.target && alive_enemies == 0 && !boss_present && !boss_pending
    }

    /// Permanent bonus for beating a boss. None off boss floors.
    pub fn apply_boss_victory_bonus(&mut self, player: &mut Player) -> Option<BossBonus> {
        if self.boss_level() == 0 {
            return None;
        }
        let bonus = BossBonus {
            health: 20,
            damage: 0.1,
            grenade: 15,
            speed: 0.2,
        };
        self.bonuses.health_bonus += bonus.health;
        player.max_health += bonus.health;
        player.heal(bonus.health);
        self.bonuses.damage_bonus += bonus.damage;
        self.bonuses.grenade_damage_bonus += bonus.grenade;
        self.bonuses.speed_bonus += bonus.speed;
        player.speed += bonus.speed;
        log::info!("boss victory bonus applied: {:?}", bonus);
        Some(bonus)
    }

    /// Move past the cleared room
    pub fn advance(&mut self) -> RoomAdvance {
        self.room += 1;
        if self.room <= ROOMS_PER_FLOOR {
            return RoomAdvance::NextRoom;
        }
        if self.floor < MAX_FLOORS {
            self.floor += 1;
            self.room = 1;
            self.bonuses.grenade_damage_bonus += 5;
            log::info!("floor {} reached", self.floor);
            return RoomAdvance::NextFloor;
        }
        // Stay on the last room so floor/room never leave their ranges
        self.room = ROOMS_PER_FLOOR;
        RoomAdvance::Victory
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_room_counters_normal() {
        let mut rng = Pcg32::seed_from_u64(11);
        let mut s = Scheduler::new(Difficulty::Normal);
        assert!(!s.begin_room(&mut rng));
        assert_eq!(s.cap, 6);
        assert!((6..=9).contains(&s.target));
        assert_eq!(s.risk, 2);
    }

    #[test]
    fn test_easy_floors_are_clamped() {
        let mut rng = Pcg32::seed_from_u64(11);
        let mut s = Scheduler::new(Difficulty::Easy);
        s.begin_room(&mut rng);
        assert_eq!(s.cap, 4);
        assert!((4..=7).contains(&s.target));
    }

    #[test]
    fn test_risk_caps_and_fixed_mode() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut s = Scheduler::new(Difficulty::Hard);
        for _ in 0..10 {
            s.begin_room(&mut rng);
        }
        assert_eq!(s.risk, MAX_RISK);

        let mut s = Scheduler::with_fixed_risk(7);
        for _ in 0..5 {
            s.begin_room(&mut rng);
        }
        assert_eq!(s.risk, 7);
        assert_eq!(s.difficulty, Difficulty::Normal);
    }

    #[test]
    fn test_boss_room_has_no_enemies() {
        let mut rng = Pcg32::seed_from_u64(1);
        let mut s = Scheduler::new(Difficulty::Normal);
        s.floor = 5;
        s.room = 4;
        assert!(s.begin_room(&mut rng));
        assert_eq!(s.target, 0);
        assert_eq!(s.boss_level(), 1);
        s.floor = 10;
        assert_eq!(s.boss_level(), 2);
        s.floor = 6;
        assert_eq!(s.boss_level(), 0);
    }

    #[test]
    fn test_kind_weights() {
        let mut s = Scheduler::new(Difficulty::Normal);
        let w = s.kind_weights();
        assert!((w[0] - 0.6).abs() < 1e-5);
        assert!((w.iter().sum::<f32>() - 1.0).abs() < 1e-5);

        s.floor = 6;
        s.risk = 20;
        let w = s.kind_weights();
        // 0.3, 0.4, 0.3 before normalizing
        assert!((w[0] - 0.3).abs() < 1e-5);
        assert!((w[1] - 0.4).abs() < 1e-5);
    }

    #[test]
    fn test_strength_scale() {
        let mut s = Scheduler::new(Difficulty::Hard);
        s.floor = 3;
        s.room = 2;
        s.modifiers = RiskModifiers::for_risk(0);
        // 1 + 0.5 + 0.1 + 0.2
        assert!((s.strength_scale() - 1.8).abs() < 1e-5);
    }

    #[test]
    fn test_spawn_respects_interval_target_and_cap() {
        let mut rng = Pcg32::seed_from_u64(5);
        let mut s = Scheduler::new(Difficulty::Normal);
        s.begin_room(&mut rng);
        s.target = 2;
        s.cap = 5;
        let mut enemies = Vec::new();
        let mut next_id = 0;
        let mut spawned_at = Vec::new();
        for tick in 1..=400 {
            if s.update_spawning(&mut enemies, &[], &mut next_id, &mut rng).is_some() {
                spawned_at.push(tick);
            }
        }
        assert_eq!(spawned_at, vec![90, 180]);
        assert_eq!(enemies.len(), 2);
        assert_eq!(enemies[1].id, 1);
    }

    #[test]
    fn test_walls_do_not_overlap() {
        let mut rng = Pcg32::seed_from_u64(9);
        let mut s = Scheduler::new(Difficulty::Normal);
        for room in 1..=4 {
            s.room = room;
            let walls = s.gen_walls(&mut rng);
            assert_eq!(walls.len() as u32, 5 + room % 3);
            for (i, a) in walls.iter().enumerate() {
                for b in walls.iter().skip(i + 1) {
                    if a.rect != b.rect {
                        assert!(!a.rect.intersects(&b.rect));
                    }
                }
            }
        }
    }

    #[test]
    fn test_player_placed_in_lower_half() {
        let mut rng = Pcg32::seed_from_u64(9);
        let s = Scheduler::new(Difficulty::Normal);
        let walls = s.gen_walls(&mut rng);
        let mut player = Player::default();
        s.place_player(&mut player, &walls, &mut rng);
        assert!(player.pos.y >= ARENA_HEIGHT / 2.0);
        let body = Rect::around_circle(player.pos, player.radius);
        assert!(!walls.iter().any(|w| body.intersects(&w.rect)));
    }

    #[test]
    fn test_advance_wraps_and_stops_at_victory() {
        let mut s = Scheduler::new(Difficulty::Normal);
        assert_eq!(s.advance(), RoomAdvance::NextRoom);
        s.room = 4;
        assert_eq!(s.advance(), RoomAdvance::NextFloor);
        assert_eq!((s.floor, s.room), (2, 1));
        assert_eq!(s.bonuses.grenade_damage_bonus, 5);

        s.floor = MAX_FLOORS;
        s.room = 4;
        assert_eq!(s.advance(), RoomAdvance::Victory);
        assert_eq!(s.floor, MAX_FLOORS);
        assert!(s.room <= ROOMS_PER_FLOOR);
    }

    #[test]
    fn test_boss_bonus_only_on_boss_floor() {
        let mut s = Scheduler::new(Difficulty::Normal);
        let mut p = Player::default();
        assert!(s.apply_boss_victory_bonus(&mut p).is_none());
        s.floor = 5;
        p.health = 50;
        let bonus = s.apply_boss_victory_bonus(&mut p).expect("boss floor");
        assert_eq!(bonus.health, 20);
        assert_eq!(p.max_health, 120);
        assert_eq!(p.health, 70);
        assert!((p.speed - 2.7).abs() < 1e-5);
        assert_eq!(s.bonuses.grenade_damage_bonus, 15);
    }
}
