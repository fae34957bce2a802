//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (enemy insertion order)
//! - No rendering, audio or storage dependencies

pub mod boss;
pub mod collision;
pub mod combat;
pub mod enemy;
pub mod player;
pub mod projectile;
pub mod rewards;
pub mod risk;
pub mod scheduler;
pub mod snapshot;
pub mod state;
pub mod tick;

pub use boss::{Boss, BossExplosion, BossStage};
pub use collision::{Rect, circle_rect_overlap, circles_overlap};
pub use combat::KillSource;
pub use enemy::{Enemy, EnemyKind};
pub use player::{FireBinding, Player, Skill, Weapon};
pub use projectile::{Bullet, Grenade};
pub use rewards::{PurchaseError, RewardKind, ShopItemKind, ShopOffer};
pub use risk::{Difficulty, MAX_RISK, RiskModifiers};
pub use scheduler::{PermanentBonuses, RoomAdvance, Scheduler};
pub use snapshot::{EnemySnapshot, RunSnapshot};
pub use state::{
    DeathCause, GameEvent, GamePhase, GameState, HitTarget, PowerUp, PowerUpKind, RunConfig, Wall,
};
pub use tick::{TickInput, buy_shop_item, leave_shop, select_reward, tick};
