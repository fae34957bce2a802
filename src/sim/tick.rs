//! Fixed timestep simulation tick
//!
//! Advances one run by one tick: the combat resolution loop while
//! fighting, or the discrete menu transitions (reward pick, shop, pause).

use glam::Vec2;
use rand::Rng;

use super::boss::{Boss, BossStage};
use super::collision::{circle_rect_overlap, circles_overlap};
use super::combat::{KillSource, damage_boss, damage_enemy, detonate_grenade, resolve_enemy_death};
use super::enemy::Behavior;
use super::player::{FireBinding, Weapon};
use super::projectile::ENEMY_BULLET_DAMAGE;
use super::rewards::{PurchaseError, ShopItemKind, purchase, roll_rewards, roll_shop};
use super::scheduler::RoomAdvance;
use super::state::{
    DeathCause, GameEvent, GamePhase, GameState, HitTarget, MAX_POWERUPS, POWERUP_SPAWN_INTERVAL,
    PowerUp, Wall,
};
use crate::consts::*;

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Movement axis, each component in -1..=1 (y grows downward)
    pub move_dir: Vec2,
    /// Keyboard fire control held
    pub fire_key: bool,
    /// Mouse fire control held
    pub fire_click: bool,
    /// Select a weapon slot (clamped to a valid slot)
    pub select_weapon: Option<i64>,
    /// Cycle weapons: negative for previous, positive for next
    pub cycle_weapon: i32,
    /// Trigger the selected skill
    pub activate_skill: bool,
    /// Pause toggle
    pub pause: bool,
    /// Reward or shop slot picked this tick
    pub choose: Option<usize>,
    /// Leave the shop
    pub proceed: bool,
    /// Demo mode - the simulation drives itself
    pub autopilot: bool,
}

/// Advance the run by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput) {
    if state.phase.is_terminal() {
        return;
    }

    let mut input = input.clone();
    if input.autopilot {
        autopilot(state, &mut input);
    }

    match state.phase {
        GamePhase::Paused => {
            if input.pause {
                log::info!("resumed");
                state.phase = GamePhase::Fighting;
            }
            return;
        }
        GamePhase::RewardSelect => {
            if let Some(slot) = input.choose {
                select_reward(state, slot);
            }
            return;
        }
        GamePhase::Shop => {
            if let Some(slot) = input.choose {
                match buy_shop_item(state, slot) {
                    Ok(item) => log::info!("bought {}", item.label()),
                    Err(e) => log::debug!("purchase refused: {}", e),
                }
            }
            if input.proceed {
                leave_shop(state);
            }
            return;
        }
        GamePhase::Fighting => {
            if input.pause {
                log::info!("paused");
                state.phase = GamePhase::Paused;
                return;
            }
        }
        GamePhase::GameOver | GamePhase::Victory => return,
    }

    state.time_ticks += 1;

    // 0. Boss overlay
    update_boss(state);
    if state.phase.is_terminal() {
        return;
    }

    // 1. Player movement, actions and cooldowns
    update_player(state, &input);

    // 2. Spawning
    state.update_spawning();

    // 3. Power-ups
    update_powerups(state);

    // 4. Enemies
    update_enemies(state);
    if state.phase.is_terminal() {
        return;
    }

    // 5. Grenades
    update_grenades(state);
    if state.phase.is_terminal() {
        return;
    }

    // 6-7. Bullets
    update_player_bullets(state);
    update_enemy_bullets(state);
    if state.phase.is_terminal() {
        return;
    }

    // 8. Cosmetic timers
    for enemy in &mut state.enemies {
        enemy.flash = enemy.flash.saturating_sub(1);
    }

    if state.room_cleared() {
        state.phase = GamePhase::RewardSelect;
        state.reward_options = roll_rewards(&mut state.rng);
        log::info!(
            "room cleared: floor {} room {}",
            state.scheduler.floor,
            state.scheduler.room
        );
        state.events.push(GameEvent::RoomCleared {
            floor: state.scheduler.floor,
            room: state.scheduler.room,
        });
    }
}

/// Warning countdown, boss movement, explosion fields and boss contact
fn update_boss(state: &mut GameState) {
    if let BossStage::Warning { ticks_left } = state.boss_stage {
        let left = ticks_left.saturating_sub(1);
        if left == 0 {
            let level = state.scheduler.boss_level().max(1);
            state.boss = Some(Boss::new(level, &state.scheduler.modifiers, &mut state.rng));
            state.boss_stage = BossStage::Engaged;
            state.events.push(GameEvent::BossSpawned { level });
            log::info!("boss level {} spawned", level);
        } else {
            state.boss_stage = BossStage::Warning { ticks_left: left };
        }
    }

    let Some(boss) = state.boss.as_mut() else {
        return;
    };
    boss.update_movement(&mut state.rng);
    if boss.explosion_due() {
        let field = boss.create_explosion(&state.scheduler.modifiers);
        state.events.push(GameEvent::Explosion {
            pos: field.pos,
            radius: field.max_radius,
        });
        state.boss_explosions.push(field);
    }

    let mut field_damage = 0;
    for field in &mut state.boss_explosions {
        field_damage += field.update(&mut state.player);
    }
    state.boss_explosions.retain(|f| !f.finished());

    let contact = boss.contact(&mut state.player);

    if field_damage > 0 {
        state.events.push(GameEvent::Hit {
            target: HitTarget::Player,
            damage: field_damage,
        });
        if state.check_player_death(DeathCause::Explosion) {
            return;
        }
    }
    if let Some(damage) = contact {
        state.events.push(GameEvent::Hit {
            target: HitTarget::Player,
            damage,
        });
        state.check_player_death(DeathCause::Collision);
    }
}

fn update_player(state: &mut GameState, input: &TickInput) {
    if let Some(slot) = input.select_weapon {
        state.player.weapon = Weapon::from_index(slot);
    }
    if input.cycle_weapon != 0 {
        state.player.switch_weapon(input.cycle_weapon.signum());
    }

    if input.activate_skill && state.player.activate_skill(&mut state.bullets) {
        log::debug!("skill {} activated", state.player.skill.as_str());
        state.events.push(GameEvent::SkillActivated {
            skill: state.player.skill,
        });
    }

    let fire = match state.player.fire_binding {
        FireBinding::Keyboard => input.fire_key,
        FireBinding::Mouse => input.fire_click,
    };
    if fire {
        if let Some(weapon) = state.player.shoot(&mut state.bullets, &mut state.grenades) {
            state.events.push(GameEvent::Shot { weapon });
        }
    }

    state.player.move_by(input.move_dir, &state.walls);
    state.player.update_skills();
}

fn update_powerups(state: &mut GameState) {
    state.powerup_timer += 1;
    if state.powerup_timer >= POWERUP_SPAWN_INTERVAL && state.powerups.len() < MAX_POWERUPS {
        let x = state.rng.random_range(50..=ARENA_WIDTH as i32 - 50) as f32;
        let y = state.rng.random_range(100..=ARENA_HEIGHT as i32 - 100) as f32;
        let pickup = PowerUp::new(Vec2::new(x, y), &mut state.rng);
        state.powerups.push(pickup);
        state.powerup_timer = 0;
    }

    let player = &mut state.player;
    let events = &mut state.events;
    state.powerups.retain_mut(|p| {
        p.ttl_ticks = p.ttl_ticks.saturating_sub(1);
        if p.ttl_ticks == 0 {
            return false;
        }
        if circles_overlap(p.pos, p.radius, player.pos, player.radius) {
            p.apply(player);
            events.push(GameEvent::PowerUpCollected { kind: p.kind });
            return false;
        }
        true
    });
}

/// Every enemy moves, then shoots unless it died this tick
fn update_enemies(state: &mut GameState) {
    for i in 0..state.enemies.len() {
        if !state.enemies[i].is_alive() {
            continue;
        }
        let before = state.player.health + state.player.shield;
        let outcome = state.enemies[i].move_step(&state.walls, &mut state.player);
        let taken = before - (state.player.health + state.player.shield);

        if outcome.detonated {
            let radius = match &state.enemies[i].behavior {
                Behavior::Charger(c) => c.explode_radius,
                _ => state.enemies[i].radius,
            };
            state.events.push(GameEvent::Explosion {
                pos: state.enemies[i].pos,
                radius,
            });
        }
        if taken > 0 {
            state.events.push(GameEvent::Hit {
                target: HitTarget::Player,
                damage: taken,
            });
        }

        // Settle the cause of a lethal move before any death burst runs
        if state.player.is_dead() {
            let cause = if outcome.detonated {
                DeathCause::Explosion
            } else {
                DeathCause::Collision
            };
            state.check_player_death(cause);
        }

        if outcome.enemy_died {
            resolve_enemy_death(state, i, KillSource::Contact);
        } else if let Some(bullet) = state.enemies[i].try_shoot(&mut state.rng) {
            state.enemy_bullets.push(bullet);
        }

        // A bomber's death burst ends the run itself
        if state.phase.is_terminal() {
            break;
        }
    }
    state.sweep_enemies();
}

fn update_grenades(state: &mut GameState) {
    let mut detonations = Vec::new();
    for grenade in &mut state.grenades {
        if grenade.update() {
            detonations.push((grenade.pos, grenade.explosion_radius));
        }
    }
    state.grenades.retain(|g| !g.exploded);

    for (pos, radius) in detonations {
        detonate_grenade(state, pos, radius);
        if state.phase.is_terminal() {
            break;
        }
    }
    state.sweep_enemies();
}

/// True if an overlapping wall stops the bullet this tick
fn wall_blocks(walls: &[Wall], pos: Vec2, radius: f32, rng: &mut impl Rng) -> bool {
    walls
        .iter()
        .filter(|w| circle_rect_overlap(pos, radius, &w.rect))
        .any(|_| rng.random_bool(Wall::BLOCK_CHANCE))
}

/// Player bullets: first live enemy in insertion order absorbs the bullet,
/// otherwise the boss may
fn update_player_bullets(state: &mut GameState) {
    let bullets = std::mem::take(&mut state.bullets);
    let mut kept = Vec::with_capacity(bullets.len());
    let damage = state.player.effective_damage(
        state.player.bullet_damage,
        &state.scheduler.modifiers,
        &state.scheduler.bonuses,
    );

    for mut bullet in bullets {
        bullet.advance();
        if bullet.off_screen() {
            continue;
        }
        if wall_blocks(&state.walls, bullet.pos, bullet.radius, &mut state.rng) {
            state.events.push(GameEvent::Explosion {
                pos: bullet.pos,
                radius: bullet.radius,
            });
            continue;
        }

        let target = state
            .enemies
            .iter()
            .position(|e| e.is_alive() && circles_overlap(bullet.pos, bullet.radius, e.pos, e.radius));
        if let Some(i) = target {
            let weapon = bullet.weapon.unwrap_or(state.player.weapon);
            damage_enemy(state, i, damage, KillSource::Bullet(weapon));
            continue;
        }

        let hits_boss = state
            .boss
            .as_ref()
            .is_some_and(|b| circles_overlap(bullet.pos, bullet.radius, b.pos, b.radius));
        if hits_boss {
            damage_boss(state, damage, false);
            continue;
        }
        kept.push(bullet);
    }
    // Nothing adds player bullets while they resolve
    state.bullets = kept;
    state.sweep_enemies();
}

fn update_enemy_bullets(state: &mut GameState) {
    let bullets = std::mem::take(&mut state.enemy_bullets);
    let mut kept = Vec::with_capacity(bullets.len());

    for mut bullet in bullets {
        bullet.advance();
        if bullet.off_screen() {
            continue;
        }
        if wall_blocks(&state.walls, bullet.pos, bullet.radius, &mut state.rng) {
            continue;
        }
        if circles_overlap(bullet.pos, bullet.radius, state.player.pos, state.player.radius) {
            state.player.take_damage(ENEMY_BULLET_DAMAGE);
            state.events.push(GameEvent::Hit {
                target: HitTarget::Player,
                damage: ENEMY_BULLET_DAMAGE,
            });
            if state.check_player_death(DeathCause::Projectile) {
                break;
            }
            continue;
        }
        kept.push(bullet);
    }
    state.enemy_bullets = kept;
}

/// Apply the reward in `slot` and move on. Invalid slots are ignored.
pub fn select_reward(state: &mut GameState, slot: usize) {
    if state.phase != GamePhase::RewardSelect {
        return;
    }
    let Some(reward) = state.reward_options.get(slot).copied() else {
        return;
    };
    reward.apply(&mut state.player);
    log::info!("reward picked: {}", reward.label());

    if state.boss_stage == BossStage::Defeated {
        state.scheduler.apply_boss_victory_bonus(&mut state.player);
    }
    state.reward_options.clear();

    match state.scheduler.advance() {
        RoomAdvance::NextRoom => state.start_room(),
        RoomAdvance::NextFloor => {
            state.phase = GamePhase::Shop;
            state.shop_offers = roll_shop(&mut state.rng);
            state.events.push(GameEvent::FloorReached {
                floor: state.scheduler.floor,
            });
        }
        RoomAdvance::Victory => {
            state.phase = GamePhase::Victory;
            log::info!(
                "victory: score {} kills {} bosses {}",
                state.player.score,
                state.kills,
                state.boss_kills
            );
            state.events.push(GameEvent::Victory {
                score: state.player.score,
                floor: state.scheduler.floor,
            });
        }
    }
}

/// Buy the shop item in `slot`
pub fn buy_shop_item(state: &mut GameState, slot: usize) -> Result<ShopItemKind, PurchaseError> {
    purchase(
        &mut state.shop_offers,
        slot,
        &mut state.player,
        &mut state.scheduler.bonuses,
    )
}

/// Close the shop and enter the next floor's first room
pub fn leave_shop(state: &mut GameState) {
    if state.phase == GamePhase::Shop {
        state.start_room();
    }
}

/// Demo driver: chase the nearest target horizontally, fire constantly,
/// take the first reward and skip shops
fn autopilot(state: &GameState, input: &mut TickInput) {
    match state.phase {
        GamePhase::RewardSelect => input.choose = Some(0),
        GamePhase::Shop => input.proceed = true,
        GamePhase::Fighting => {
            let me = state.player.pos;
            let target = state
                .enemies
                .iter()
                .filter(|e| e.is_alive())
                .map(|e| e.pos)
                .chain(state.boss.as_ref().map(|b| b.pos))
                .min_by(|a, b| {
                    a.distance_squared(me)
                        .partial_cmp(&b.distance_squared(me))
                        .unwrap_or(std::cmp::Ordering::Equal)
                });
            input.move_dir = match target {
                Some(t) if (t.x - me.x).abs() > 4.0 => Vec2::new((t.x - me.x).signum(), 0.0),
                _ => Vec2::ZERO,
            };
            input.fire_key = true;
            input.fire_click = true;
        }
        _ => {}
    }
}
