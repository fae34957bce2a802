//! Warrior Rimer - top-down roguelike combat simulation
//!
//! Core modules:
//! - `sim`: Fixed-tick simulation (entities, combat, spawning, room progression)
//! - `session`: Run lifecycle, wires the simulation to its collaborators
//! - `achievements`: Progress tracker interface and the default ledger
//! - `persistence`: Saved runs, high score and history
//! - `history`: Finished-run records
//! - `effects`: Audio/visual effect sink interface
//! - `settings`: Player run preferences

pub mod achievements;
pub mod effects;
pub mod history;
pub mod persistence;
pub mod session;
pub mod settings;
pub mod sim;

pub use history::RunHistory;
pub use session::Session;
pub use settings::{DifficultyMode, Settings};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Simulation ticks per second (one tick per rendered frame)
    pub const TICK_RATE: u32 = 60;
    /// Seconds per tick, used for survival-time reporting only
    pub const SIM_DT: f32 = 1.0 / TICK_RATE as f32;

    /// Arena dimensions (pixels)
    pub const ARENA_WIDTH: f32 = 800.0;
    pub const ARENA_HEIGHT: f32 = 600.0;

    /// Progression shape
    pub const ROOMS_PER_FLOOR: u32 = 4;
    pub const MAX_FLOORS: u32 = 15;
    /// Boss appears on this room of every boss floor
    pub const BOSS_ROOM: u32 = 4;
    /// Every Nth floor is a boss floor
    pub const BOSS_FLOOR_INTERVAL: u32 = 5;

    /// Projectiles further than this outside the arena are dropped
    pub const OFFSCREEN_MARGIN: f32 = 20.0;
}

/// True if `pos` lies outside the arena by more than the off-screen margin
#[inline]
pub fn is_off_screen(pos: Vec2) -> bool {
    use consts::*;
    pos.x < -OFFSCREEN_MARGIN
        || pos.x > ARENA_WIDTH + OFFSCREEN_MARGIN
        || pos.y < -OFFSCREEN_MARGIN
        || pos.y > ARENA_HEIGHT + OFFSCREEN_MARGIN
}

/// Clamp a circle center so the circle stays inside the arena
#[inline]
pub fn clamp_to_arena(pos: Vec2, radius: f32) -> Vec2 {
    use consts::*;
    let r = radius.max(0.0);
    Vec2::new(
        pos.x.clamp(r, (ARENA_WIDTH - r).max(r)),
        pos.y.clamp(r, (ARENA_HEIGHT - r).max(r)),
    )
}

/// Unit vector for an angle in radians
#[inline]
pub fn direction_from_angle(theta: f32) -> Vec2 {
    Vec2::new(theta.cos(), theta.sin())
}
