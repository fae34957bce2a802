//! Damage resolution, kill credit and on-death chain reactions
//!
//! Enemies are never removed while a sub-step is iterating them. A death
//! marks the enemy `removed`, credits the kill and runs its death hook;
//! the caller sweeps marked enemies once the sub-step is done. Bomber
//! bursts pick their targets from a snapshot of indices and re-check
//! liveness before every hit, so nested chains never double-credit.

use rand::Rng;

use super::boss::{BOSS_KILL_GOLD, BOSS_KILL_SCORE, BossStage};
use super::collision::within_burst;
use super::player::Weapon;
use super::state::{DeathCause, GameEvent, GameState, HitTarget, POWERUP_DROP_CHANCE, PowerUp};

/// Gold awarded for every enemy kill
pub const KILL_GOLD: u32 = 5;
pub const KILL_SCORE: u64 = 10;
pub const GRENADE_KILL_SCORE: u64 = 15;

/// How an enemy died
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillSource {
    /// Body contact, including a charger blowing itself up
    Contact,
    Bullet(Weapon),
    Grenade,
    /// Caught in a bomber's death burst
    Chain,
}

impl KillSource {
    pub fn score(&self) -> u64 {
        match self {
            KillSource::Grenade => GRENADE_KILL_SCORE,
            _ => KILL_SCORE,
        }
    }

    pub fn drops_powerup(&self) -> bool {
        matches!(self, KillSource::Contact | KillSource::Bullet(_))
    }

    /// Weapon credited for the kill, if any
    pub fn weapon(&self) -> Option<Weapon> {
        match self {
            KillSource::Bullet(w) => Some(*w),
            KillSource::Grenade => Some(Weapon::Grenade),
            _ => None,
        }
    }
}

/// Mark the enemy at `idx` dead, credit the kill and run its death hook.
/// A stale or already-removed index is a no-op.
pub fn resolve_enemy_death(state: &mut GameState, idx: usize, source: KillSource) {
    let Some(enemy) = state.enemies.get_mut(idx) else {
        return;
    };
    if enemy.removed {
        return;
    }
    enemy.removed = true;
    let (pos, radius, kind, burst) = (enemy.pos, enemy.radius, enemy.kind(), enemy.death_burst());

    state.kills += 1;
    state.player.score += source.score();
    state.player.add_gold(KILL_GOLD);
    state.events.push(GameEvent::Explosion { pos, radius });
    state.events.push(GameEvent::EnemyKilled { kind, source });
    log::debug!("{} killed by {:?}", kind.name(), source);

    if source.drops_powerup() && state.rng.random_bool(POWERUP_DROP_CHANCE) {
        let drop = PowerUp::new(pos, &mut state.rng);
        state.powerups.push(drop);
    }

    if let Some((burst_radius, burst_damage)) = burst {
        bomber_burst(state, idx, burst_radius, burst_damage);
    }
}

/// Bomber death burst: hurts the player and every other live enemy in range
fn bomber_burst(state: &mut GameState, origin: usize, radius: f32, damage: i32) {
    let pos = state.enemies[origin].pos;
    state.events.push(GameEvent::Explosion { pos, radius });

    if within_burst(pos, radius, state.player.pos, state.player.radius) {
        state.player.take_damage(damage);
        state.events.push(GameEvent::Hit {
            target: HitTarget::Player,
            damage,
        });
        state.check_player_death(DeathCause::Explosion);
    }

    let targets: Vec<usize> = state
        .enemies
        .iter()
        .enumerate()
        .filter(|(i, e)| *i != origin && e.is_alive() && within_burst(pos, radius, e.pos, e.radius))
        .map(|(i, _)| i)
        .collect();

    for i in targets {
        // A nested chain may already have taken this one
        if !state.enemies[i].is_alive() {
            continue;
        }
        state.enemies[i].take_hit(damage);
        state.events.push(GameEvent::Hit {
            target: HitTarget::Enemy(state.enemies[i].id),
            damage,
        });
        if state.enemies[i].health <= 0 {
            resolve_enemy_death(state, i, KillSource::Chain);
        }
    }
}

/// Apply a player hit to the enemy at `idx`; resolves the death if lethal
pub fn damage_enemy(state: &mut GameState, idx: usize, damage: i32, source: KillSource) {
    let Some(enemy) = state.enemies.get_mut(idx) else {
        return;
    };
    if !enemy.is_alive() {
        return;
    }
    enemy.take_hit(damage);
    let (id, dead) = (enemy.id, enemy.health <= 0);
    state.events.push(GameEvent::Hit {
        target: HitTarget::Enemy(id),
        damage,
    });
    if dead {
        resolve_enemy_death(state, idx, source);
    }
}

/// Apply a hit to the boss. Returns true if the damage landed.
pub fn damage_boss(state: &mut GameState, damage: i32, from_grenade: bool) -> bool {
    let Some(boss) = state.boss.as_mut() else {
        return false;
    };
    if !boss.take_damage(damage, from_grenade, &mut state.rng) {
        state.events.push(GameEvent::Immune);
        return false;
    }
    let dead = boss.is_dead();
    state.events.push(GameEvent::Hit {
        target: HitTarget::Boss,
        damage,
    });
    if dead {
        kill_boss(state);
    }
    true
}

fn kill_boss(state: &mut GameState) {
    let Some(boss) = state.boss.take() else {
        return;
    };
    state.boss_stage = BossStage::Defeated;
    state.boss_explosions.clear();
    state.boss_kills += 1;
    state.player.score += BOSS_KILL_SCORE;
    state.player.add_gold(BOSS_KILL_GOLD);
    state.events.push(GameEvent::Explosion {
        pos: boss.pos,
        radius: boss.radius * 2.0,
    });
    state.events.push(GameEvent::BossKilled);
    log::info!("boss level {} defeated", boss.level);
}

/// Resolve a grenade burst at `pos`: enemies, then the thrower, then the boss
pub fn detonate_grenade(state: &mut GameState, pos: glam::Vec2, radius: f32) {
    let damage = state
        .player
        .grenade_damage(&state.scheduler.modifiers, &state.scheduler.bonuses);
    state.events.push(GameEvent::Explosion { pos, radius });

    let targets: Vec<usize> = state
        .enemies
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_alive() && within_burst(pos, radius, e.pos, e.radius))
        .map(|(i, _)| i)
        .collect();
    for i in targets {
        damage_enemy(state, i, damage, KillSource::Grenade);
    }

    if within_burst(pos, radius, state.player.pos, state.player.radius) {
        let self_damage = damage / 2;
        state.player.take_damage(self_damage);
        state.events.push(GameEvent::Hit {
            target: HitTarget::Player,
            damage: self_damage,
        });
        state.check_player_death(DeathCause::Explosion);
    }

    let boss_in_range = state
        .boss
        .as_ref()
        .is_some_and(|b| within_burst(pos, radius, b.pos, b.radius));
    if boss_in_range {
        damage_boss(state, damage, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::enemy::{Enemy, EnemyKind};
    use crate::sim::risk::RiskModifiers;
    use crate::sim::state::RunConfig;
    use glam::Vec2;

    fn arena() -> GameState {
        let mut state = GameState::new(9, RunConfig::default());
        state.walls.clear();
        state.scheduler.modifiers = RiskModifiers::for_risk(0);
        state.player.pos = Vec2::new(700.0, 560.0);
        state
    }

    fn add(state: &mut GameState, kind: EnemyKind, pos: Vec2, health: i32) -> usize {
        let id = state.next_entity_id();
        let mut e = Enemy::spawn(id, kind, 0, &[], &mut state.rng);
        e.pos = pos;
        e.health = health;
        state.enemies.push(e);
        state.enemies.len() - 1
    }

    #[test]
    fn test_kill_credit_by_source() {
        assert_eq!(KillSource::Grenade.score(), 15);
        assert_eq!(KillSource::Chain.score(), 10);
        assert!(KillSource::Bullet(Weapon::Pistol).drops_powerup());
        assert!(!KillSource::Grenade.drops_powerup());
        assert_eq!(KillSource::Grenade.weapon(), Some(Weapon::Grenade));
        assert_eq!(KillSource::Chain.weapon(), None);
    }

    #[test]
    fn test_stale_index_is_noop() {
        let mut state = arena();
        resolve_enemy_death(&mut state, 3, KillSource::Contact);
        damage_enemy(&mut state, 3, 10, KillSource::Contact);
        assert_eq!(state.kills, 0);
    }

    #[test]
    fn test_double_resolve_credits_once() {
        let mut state = arena();
        let i = add(&mut state, EnemyKind::Basic, Vec2::new(100.0, 100.0), 0);
        resolve_enemy_death(&mut state, i, KillSource::Chain);
        resolve_enemy_death(&mut state, i, KillSource::Chain);
        assert_eq!(state.kills, 1);
        assert_eq!(state.player.gold, KILL_GOLD);
    }

    #[test]
    fn test_bomber_chain_reaches_bomber_of_bomber() {
        let mut state = arena();
        let a = add(&mut state, EnemyKind::Bomber, Vec2::new(100.0, 100.0), 1);
        add(&mut state, EnemyKind::Bomber, Vec2::new(160.0, 100.0), 10);
        // Out of reach of the first burst but inside the second
        add(&mut state, EnemyKind::Basic, Vec2::new(240.0, 100.0), 10);
        add(&mut state, EnemyKind::Basic, Vec2::new(500.0, 100.0), 10);

        damage_enemy(&mut state, a, 10, KillSource::Bullet(Weapon::Pistol));
        state.sweep_enemies();

        assert_eq!(state.kills, 3);
        assert_eq!(state.enemies.len(), 1);
        assert_eq!(state.player.gold, 3 * KILL_GOLD);
        assert_eq!(state.player.score, 30);
    }

    #[test]
    fn test_grenade_self_damage_and_kill() {
        let mut state = arena();
        state.player.pos = Vec2::new(400.0, 400.0);
        add(&mut state, EnemyKind::Basic, Vec2::new(420.0, 380.0), 30);
        detonate_grenade(&mut state, Vec2::new(400.0, 390.0), 155.0);
        state.sweep_enemies();
        assert!(state.enemies.is_empty());
        assert_eq!(state.player.score, 15);
        // Half of 50
        assert_eq!(state.player.health, 75);
    }

    #[test]
    fn test_only_contact_and_bullet_kills_drop_powerups() {
        let mut state = arena();
        for source in [KillSource::Grenade, KillSource::Chain] {
            for _ in 0..100 {
                let i = add(&mut state, EnemyKind::Basic, Vec2::new(100.0, 100.0), 0);
                resolve_enemy_death(&mut state, i, source);
            }
        }
        assert!(state.powerups.is_empty());

        for source in [KillSource::Contact, KillSource::Bullet(Weapon::Shotgun)] {
            for _ in 0..100 {
                let i = add(&mut state, EnemyKind::Basic, Vec2::new(100.0, 100.0), 0);
                resolve_enemy_death(&mut state, i, source);
            }
        }
        // Roughly one in five
        let drops = state.powerups.len();
        assert!((10..=80).contains(&drops), "{} drops", drops);
    }
}
