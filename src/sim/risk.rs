//! Risk dial and difficulty presets
//!
//! Risk is a 0..=20 scalar. Every multiplier below is recomputed from it
//! whenever a room starts. From risk 12 upward an `extra` term makes the
//! curve steeper.

use serde::{Deserialize, Serialize};

/// Highest risk level
pub const MAX_RISK: u8 = 20;
/// Risk level where the curve starts to steepen
pub const RISK_ACCELERATION_START: u8 = 12;

/// Difficulty preset chosen before a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" | "norm" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    /// Ticks between enemy spawns
    pub fn spawn_interval(&self) -> u32 {
        match self {
            Difficulty::Easy => 110,
            Difficulty::Normal => 90,
            Difficulty::Hard => 70,
        }
    }

    /// Offset applied to the simultaneous-enemy cap
    pub fn cap_offset(&self) -> i32 {
        match self {
            Difficulty::Easy => -2,
            Difficulty::Normal => 0,
            Difficulty::Hard => 2,
        }
    }

    /// Offset applied to the number of enemies per room
    pub fn base_enemies_offset(&self) -> i32 {
        match self {
            Difficulty::Easy => -2,
            Difficulty::Normal => 0,
            Difficulty::Hard => 2,
        }
    }

    /// Added to the floor/room strength scale
    pub fn enemy_scale_bonus(&self) -> f32 {
        match self {
            Difficulty::Easy => -0.1,
            Difficulty::Normal => 0.0,
            Difficulty::Hard => 0.2,
        }
    }

    /// Risk gained every time a room starts
    pub fn risk_increment(&self) -> u8 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Normal => 2,
            Difficulty::Hard => 3,
        }
    }

    /// Level reported to the achievement tracker when a run ends
    pub fn achievement_level(&self) -> u32 {
        match self {
            Difficulty::Easy => 3,
            Difficulty::Normal => 5,
            Difficulty::Hard => 8,
        }
    }
}

/// Multipliers derived from the current risk level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskModifiers {
    pub enemy_health_mult: f32,
    pub enemy_speed_mult: f32,
    pub player_damage_mult: f32,
    pub boss_health_mult: f32,
    pub boss_immune_bonus: f32,
    pub boss_explosion_radius_bonus: i32,
    pub boss_explosion_damage_bonus: i32,
}

impl Default for RiskModifiers {
    fn default() -> Self {
        Self::for_risk(0)
    }
}

impl RiskModifiers {
    /// Compute every multiplier for a risk level (clamped to 0..=20)
    pub fn for_risk(risk: u8) -> Self {
        let r = risk.min(MAX_RISK) as f32;
        let extra = (r - RISK_ACCELERATION_START as f32).max(0.0);

        Self {
            enemy_health_mult: 1.0 + 0.02 * r + 0.01 * extra,
            enemy_speed_mult: 1.0 + 0.01 * r + 0.005 * extra,
            player_damage_mult: (1.0 - (0.01 * r + 0.005 * extra)).max(0.6),
            boss_health_mult: 1.0 + 0.03 * r + 0.015 * extra,
            boss_immune_bonus: (0.02 * r + 0.005 * extra).min(0.5),
            boss_explosion_radius_bonus: (2.0 * r + extra).floor() as i32,
            boss_explosion_damage_bonus: (r + 0.5 * extra).floor() as i32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_zero_is_neutral() {
        let m = RiskModifiers::for_risk(0);
        assert_eq!(m.enemy_health_mult, 1.0);
        assert_eq!(m.enemy_speed_mult, 1.0);
        assert_eq!(m.player_damage_mult, 1.0);
        assert_eq!(m.boss_health_mult, 1.0);
        assert_eq!(m.boss_immune_bonus, 0.0);
        assert_eq!(m.boss_explosion_radius_bonus, 0);
        assert_eq!(m.boss_explosion_damage_bonus, 0);
    }

    #[test]
    fn test_risk_twenty_values() {
        let m = RiskModifiers::for_risk(20);
        // extra = 8
        assert!((m.enemy_health_mult - 1.48).abs() < 1e-5);
        assert!((m.enemy_speed_mult - 1.24).abs() < 1e-5);
        assert!((m.player_damage_mult - 0.76).abs() < 1e-5);
        assert!((m.boss_health_mult - 1.72).abs() < 1e-5);
        assert!((m.boss_immune_bonus - 0.44).abs() < 1e-5);
        assert_eq!(m.boss_explosion_radius_bonus, 48);
        assert_eq!(m.boss_explosion_damage_bonus, 24);
    }

    #[test]
    fn test_risk_is_clamped() {
        assert_eq!(RiskModifiers::for_risk(200), RiskModifiers::for_risk(MAX_RISK));
    }

    #[test]
    fn test_difficulty_parse() {
        assert_eq!(Difficulty::from_str("HARD"), Some(Difficulty::Hard));
        assert_eq!(Difficulty::from_str("norm"), Some(Difficulty::Normal));
        assert_eq!(Difficulty::from_str("nightmare"), None);
        assert_eq!(Difficulty::Easy.risk_increment(), 1);
        assert_eq!(Difficulty::Hard.spawn_interval(), 70);
    }
}
