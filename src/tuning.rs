//! Data-driven game balance
//!
//! Every session starts from [`Tuning::default`]. A JSON document may
//! override any subset of fields (missing fields keep their defaults).
//! Velocities and speeds are in world units per simulation tick.

use serde::{Deserialize, Serialize};

use crate::seconds_to_ticks;

/// Errors that can occur while loading tuning overrides.
#[derive(Debug, Clone, PartialEq)]
pub enum TuningError {
    /// The document is not valid JSON for [`Tuning`]
    Parse(String),
    /// A field holds a value the simulation cannot run with
    Invalid { field: &'static str, reason: String },
}

impl core::fmt::Display for TuningError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TuningError::Parse(msg) => write!(f, "Invalid tuning JSON: {msg}"),
            TuningError::Invalid { field, reason } => {
                write!(f, "Invalid tuning value for `{field}`: {reason}")
            }
        }
    }
}

impl std::error::Error for TuningError {}

/// Gameplay constants
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Arena ===
    /// Horizontal wall distance from center
    pub boundary_x: f32,
    /// Ceiling height; the floor threshold is `-boundary_y - lost_margin`
    pub boundary_y: f32,
    /// Extra distance below `-boundary_y` before a ball counts as lost
    pub lost_margin: f32,

    // === Paddle ===
    pub paddle_speed: f32,
    pub paddle_width: f32,
    pub paddle_height: f32,
    pub paddle_y: f32,

    // === Ball ===
    pub ball_radius: f32,
    pub ball_speed: f32,
    pub ball_max_speed: f32,
    /// Horizontal velocity per unit of offset from paddle center
    pub paddle_deflection: f32,
    /// Multiplicative speed-up on paddle contact
    pub paddle_speedup: f32,
    /// Session-wide cap on simultaneous balls
    pub max_balls: usize,

    // === Bricks ===
    pub brick_width: f32,
    pub brick_height: f32,
    pub brick_padding: f32,
    pub brick_cols: u32,
    pub max_brick_rows: u32,
    pub brick_start_y: f32,
    pub multi_ball_chance: f32,
    pub item_chance: f32,
    pub hit_flash_ticks: u64,

    // === Powerups ===
    pub powerup_fall_speed: f32,
    pub powerup_size: f32,
    pub grow_factor: f32,
    pub grow_duration_ticks: u64,

    // === Session ===
    pub starting_lives: u8,
    /// Level index of the boss sector (the last level)
    pub final_level: u32,

    // === Boss ===
    pub boss_max_hp: u32,
    pub boss_ball_damage: u32,
    pub boss_reflect_damage: u32,
    pub boss_fire_chance: f32,
    pub boss_half_width: f32,
    pub boss_half_height: f32,
    pub boss_center_y: f32,
    pub boss_sway_x: f32,
    pub boss_sway_y: f32,
    pub projectile_speed: f32,
    pub projectile_radius: f32,
    pub projectile_return_boost: f32,

    // === Cosmetics ===
    pub max_particles: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            boundary_x: 6.0,
            boundary_y: 5.0,
            lost_margin: 1.0,

            paddle_speed: 0.15,
            paddle_width: 2.0,
            paddle_height: 0.3,
            paddle_y: -3.5,

            ball_radius: 0.15,
            ball_speed: 0.12,
            ball_max_speed: 0.25,
            paddle_deflection: 0.2,
            paddle_speedup: 1.05,
            max_balls: 8,

            brick_width: 1.2,
            brick_height: 0.5,
            brick_padding: 0.1,
            brick_cols: 6,
            max_brick_rows: 6,
            brick_start_y: 1.5,
            multi_ball_chance: 0.05,
            item_chance: 0.05,
            hit_flash_ticks: seconds_to_ticks(0.1),

            powerup_fall_speed: 0.05,
            powerup_size: 0.4,
            grow_factor: 2.0,
            grow_duration_ticks: seconds_to_ticks(10.0),

            starting_lives: 3,
            final_level: 5,

            boss_max_hp: 500,
            boss_ball_damage: 10,
            boss_reflect_damage: 20,
            boss_fire_chance: 0.01,
            boss_half_width: 2.7,
            boss_half_height: 1.5,
            boss_center_y: 2.0,
            boss_sway_x: 3.0,
            boss_sway_y: 1.0,
            projectile_speed: 0.15,
            projectile_radius: 0.2,
            projectile_return_boost: 1.5,

            max_particles: 256,
        }
    }
}

impl Tuning {
    /// Parse a (possibly partial) JSON override document and validate it
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning =
            serde_json::from_str(json).map_err(|e| TuningError::Parse(e.to_string()))?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Check that the values describe a playable session
    pub fn validate(&self) -> Result<(), TuningError> {
        fn positive(field: &'static str, value: f32) -> Result<(), TuningError> {
            if value > 0.0 && value.is_finite() {
                Ok(())
            } else {
                Err(TuningError::Invalid {
                    field,
                    reason: format!("must be a positive number, got {value}"),
                })
            }
        }

        fn chance(field: &'static str, value: f32) -> Result<(), TuningError> {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(TuningError::Invalid {
                    field,
                    reason: format!("must be within [0, 1], got {value}"),
                })
            }
        }

        positive("boundary_x", self.boundary_x)?;
        positive("boundary_y", self.boundary_y)?;
        positive("paddle_width", self.paddle_width)?;
        positive("paddle_height", self.paddle_height)?;
        positive("paddle_speed", self.paddle_speed)?;
        positive("ball_radius", self.ball_radius)?;
        positive("ball_speed", self.ball_speed)?;
        positive("brick_width", self.brick_width)?;
        positive("brick_height", self.brick_height)?;
        positive("grow_factor", self.grow_factor)?;
        positive("projectile_speed", self.projectile_speed)?;
        chance("multi_ball_chance", self.multi_ball_chance)?;
        chance("item_chance", self.item_chance)?;
        chance("boss_fire_chance", self.boss_fire_chance)?;

        if self.ball_max_speed < self.ball_speed {
            return Err(TuningError::Invalid {
                field: "ball_max_speed",
                reason: format!(
                    "must be at least ball_speed ({}), got {}",
                    self.ball_speed, self.ball_max_speed
                ),
            });
        }
        if self.paddle_width >= self.boundary_x * 2.0 {
            return Err(TuningError::Invalid {
                field: "paddle_width",
                reason: "paddle must fit between the walls".to_string(),
            });
        }
        if self.starting_lives == 0 {
            return Err(TuningError::Invalid {
                field: "starting_lives",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_balls == 0 {
            return Err(TuningError::Invalid {
                field: "max_balls",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(2..=8).contains(&self.final_level) {
            return Err(TuningError::Invalid {
                field: "final_level",
                reason: format!("must be within 2..=8, got {}", self.final_level),
            });
        }
        if self.brick_cols == 0 || self.max_brick_rows == 0 {
            return Err(TuningError::Invalid {
                field: "brick_cols",
                reason: "brick grid must have at least one row and column".to_string(),
            });
        }
        if self.boss_max_hp == 0 {
            return Err(TuningError::Invalid {
                field: "boss_max_hp",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Y coordinate below which balls and pickups are gone
    #[inline]
    pub fn lost_y(&self) -> f32 {
        -self.boundary_y - self.lost_margin
    }

    /// Horizontal travel limit for a paddle of the given width
    #[inline]
    pub fn paddle_limit(&self, width: f32) -> f32 {
        (self.boundary_x - width / 2.0).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(Tuning::default().validate(), Ok(()));
    }

    #[test]
    fn test_partial_override_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "final_level": 4, "starting_lives": 5 }"#)
            .expect("partial override should parse");
        assert_eq!(tuning.final_level, 4);
        assert_eq!(tuning.starting_lives, 5);
        assert_eq!(tuning.boss_max_hp, 500);
        assert!((tuning.ball_speed - 0.12).abs() < f32::EPSILON);
    }

    #[test]
    fn test_bad_json() {
        assert!(matches!(
            Tuning::from_json("{ not json"),
            Err(TuningError::Parse(_))
        ));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = Tuning::from_json(r#"{ "item_chance": 1.5 }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid { field: "item_chance", .. }));

        let err = Tuning::from_json(r#"{ "starting_lives": 0 }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid { field: "starting_lives", .. }));

        let err = Tuning::from_json(r#"{ "ball_max_speed": 0.05 }"#).unwrap_err();
        assert!(err.to_string().contains("ball_max_speed"));
    }

    #[test]
    fn test_lost_y_and_paddle_limit() {
        let tuning = Tuning::default();
        assert!((tuning.lost_y() - (-6.0)).abs() < f32::EPSILON);
        assert!((tuning.paddle_limit(2.0) - 5.0).abs() < f32::EPSILON);
        assert!((tuning.paddle_limit(4.0) - 4.0).abs() < f32::EPSILON);
    }
}
