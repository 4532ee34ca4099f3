//! Simulation module
//!
//! All gameplay logic lives here. This module is pure:
//! - One fixed step per `tick` call
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering, audio or platform dependencies

pub mod aabb;
pub mod boss;
pub mod collision;
pub mod layout;
pub mod powerup;
pub mod state;
pub mod tick;

pub use aabb::Aabb;
pub use boss::{Boss, BossState, Projectile};
pub use collision::BrickCollision;
pub use layout::{Pattern, build_level};
pub use powerup::{Powerup, PowerupKind};
pub use state::{
    Ball, Brick, BrickKind, GameEvent, GamePhase, GameState, Paddle, Particle, BOSS_COLOR,
    PADDLE_COLOR,
};
pub use tick::{TickInput, start_level, tick};
