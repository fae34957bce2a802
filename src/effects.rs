//! Presentation effect hooks (sound, particles, screen shake)
//!
//! The simulation never calls these; the session forwards game events
//! to a sink after each tick. Sink failures are logged and dropped.

use glam::Vec2;

use crate::sim::{GameEvent, HitTarget, PowerUpKind, Skill, Weapon};

/// Effect sink failure
#[derive(Debug, thiserror::Error)]
pub enum EffectError {
    #[error("Effect backend unavailable: {0}")]
    Unavailable(String),
    #[error("Effect playback failed: {0}")]
    Playback(String),
}

/// Presentation cue derived from a game event
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Effect {
    Shot(Weapon),
    Explosion { pos: Vec2, radius: f32 },
    Hit(HitTarget),
    PowerUp(PowerUpKind),
    SkillActivate(Skill),
    BossSpawn,
}

impl Effect {
    /// Cue for an event, if it has one
    pub fn from_event(event: &GameEvent) -> Option<Self> {
        match *event {
            GameEvent::Shot { weapon } => Some(Effect::Shot(weapon)),
            GameEvent::Explosion { pos, radius } => Some(Effect::Explosion { pos, radius }),
            GameEvent::Hit { target, .. } => Some(Effect::Hit(target)),
            GameEvent::PowerUpCollected { kind } => Some(Effect::PowerUp(kind)),
            GameEvent::SkillActivated { skill } => Some(Effect::SkillActivate(skill)),
            GameEvent::BossSpawned { .. } => Some(Effect::BossSpawn),
            _ => None,
        }
    }
}

/// Receiver of presentation cues
pub trait EffectSink {
    fn on_shot(&mut self, weapon: Weapon) -> Result<(), EffectError>;
    fn on_explosion(&mut self, pos: Vec2, radius: f32) -> Result<(), EffectError>;
    fn on_hit(&mut self, target: HitTarget) -> Result<(), EffectError>;
    fn on_powerup(&mut self, kind: PowerUpKind) -> Result<(), EffectError>;
    fn on_skill_activate(&mut self, skill: Skill) -> Result<(), EffectError>;
    fn on_boss_spawn(&mut self) -> Result<(), EffectError>;

    /// Route a cue to its hook
    fn play(&mut self, effect: Effect) -> Result<(), EffectError> {
        match effect {
            Effect::Shot(weapon) => self.on_shot(weapon),
            Effect::Explosion { pos, radius } => self.on_explosion(pos, radius),
            Effect::Hit(target) => self.on_hit(target),
            Effect::PowerUp(kind) => self.on_powerup(kind),
            Effect::SkillActivate(skill) => self.on_skill_activate(skill),
            Effect::BossSpawn => self.on_boss_spawn(),
        }
    }
}

/// Sink that does nothing
#[derive(Debug, Default)]
pub struct NullEffectSink;

impl EffectSink for NullEffectSink {
    fn on_shot(&mut self, _weapon: Weapon) -> Result<(), EffectError> {
        Ok(())
    }

    fn on_explosion(&mut self, _pos: Vec2, _radius: f32) -> Result<(), EffectError> {
        Ok(())
    }

    fn on_hit(&mut self, _target: HitTarget) -> Result<(), EffectError> {
        Ok(())
    }

    fn on_powerup(&mut self, _kind: PowerUpKind) -> Result<(), EffectError> {
        Ok(())
    }

    fn on_skill_activate(&mut self, _skill: Skill) -> Result<(), EffectError> {
        Ok(())
    }

    fn on_boss_spawn(&mut self) -> Result<(), EffectError> {
        Ok(())
    }
}

/// Headless sink: writes every cue to the debug log
#[derive(Debug)]
pub struct LogEffectSink {
    muted: bool,
    /// Cues written so far
    pub played: u64,
}

impl Default for LogEffectSink {
    fn default() -> Self {
        Self::new()
    }
}

impl LogEffectSink {
    pub fn new() -> Self {
        Self {
            muted: false,
            played: 0,
        }
    }

    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    fn emit(&mut self, what: std::fmt::Arguments) -> Result<(), EffectError> {
        if self.muted {
            return Ok(());
        }
        self.played += 1;
        log::debug!("fx: {}", what);
        Ok(())
    }
}

impl EffectSink for LogEffectSink {
    fn on_shot(&mut self, weapon: Weapon) -> Result<(), EffectError> {
        self.emit(format_args!("shot {}", weapon.name()))
    }

    fn on_explosion(&mut self, pos: Vec2, radius: f32) -> Result<(), EffectError> {
        self.emit(format_args!("explosion at ({:.0}, {:.0}) r {:.0}", pos.x, pos.y, radius))
    }

    fn on_hit(&mut self, target: HitTarget) -> Result<(), EffectError> {
        self.emit(format_args!("hit {:?}", target))
    }

    fn on_powerup(&mut self, kind: PowerUpKind) -> Result<(), EffectError> {
        self.emit(format_args!("powerup {:?}", kind))
    }

    fn on_skill_activate(&mut self, skill: Skill) -> Result<(), EffectError> {
        self.emit(format_args!("skill {}", skill.as_str()))
    }

    fn on_boss_spawn(&mut self) -> Result<(), EffectError> {
        self.emit(format_args!("boss spawn"))
    }
}
