//! Falling pickups, the timed paddle-grow effect, and multi-ball spawning

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;
use super::state::{Ball, GameEvent, GameState};

/// Pickup types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerupKind {
    /// Doubles paddle width for a while
    PaddleGrow,
}

/// A falling pickup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Powerup {
    pub id: u32,
    pub kind: PowerupKind,
    pub pos: Vec2,
    pub active: bool,
}

impl Powerup {
    pub fn aabb(&self, size: f32) -> Aabb {
        Aabb::new(self.pos, Vec2::splat(size))
    }
}

/// Drop a pickup where an item brick was destroyed
pub fn spawn_pickup(state: &mut GameState, kind: PowerupKind, pos: Vec2) {
    let id = state.next_entity_id();
    state.powerups.push(Powerup {
        id,
        kind,
        pos,
        active: true,
    });
    state.push_event(GameEvent::PowerupSpawned { pos });
    log::debug!("Pickup {:?} spawned at ({:.2}, {:.2})", kind, pos.x, pos.y);
}

/// Apply a caught pickup to the paddle
pub fn apply_powerup(state: &mut GameState, kind: PowerupKind) {
    match kind {
        PowerupKind::PaddleGrow => {
            let now = state.time_ticks;
            let paddle = &mut state.paddle;
            paddle.width = paddle.base_width * state.tuning.grow_factor;
            // Catching again while grown only refreshes the timer
            paddle.grow_until = Some(now + state.tuning.grow_duration_ticks);
            let x = paddle.x;
            paddle.move_to(x, &state.tuning);
        }
    }
    state.push_event(GameEvent::PowerupCollected { kind });
    log::debug!("Pickup {:?} collected", kind);
}

/// Revert timed effects whose end tick has passed
pub fn expire_effects(state: &mut GameState) {
    if let Some(until) = state.paddle.grow_until {
        if state.time_ticks >= until {
            state.paddle.width = state.paddle.base_width;
            state.paddle.grow_until = None;
            state.push_event(GameEvent::PowerupExpired {
                kind: PowerupKind::PaddleGrow,
            });
        }
    }
}

/// Move pickups, apply the ones the paddle catches, drop the ones that fall out
pub fn update_powerups(state: &mut GameState) {
    let paddle_box = state.paddle.aabb();
    let fall = state.tuning.powerup_fall_speed;
    let size = state.tuning.powerup_size;
    let floor = state.tuning.lost_y();

    let mut caught = Vec::new();
    for powerup in state.powerups.iter_mut().filter(|p| p.active) {
        powerup.pos.y -= fall;
        if powerup.aabb(size).intersects(&paddle_box) {
            powerup.active = false;
            caught.push(powerup.kind);
        } else if powerup.pos.y < floor {
            powerup.active = false;
        }
    }
    state.powerups.retain(|p| p.active);

    for kind in caught {
        apply_powerup(state, kind);
    }
}

/// Add up to two free balls at `pos`, bounded by the session ball cap.
/// Returns how many were spawned.
pub fn spawn_multiball(state: &mut GameState, pos: Vec2) -> usize {
    let room = state.tuning.max_balls.saturating_sub(state.balls.len());
    let count = room.min(2);
    let speed = state.tuning.ball_speed;

    for _ in 0..count {
        let id = state.next_entity_id();
        let vx = state.rng.random_range(-0.5f32..0.5) * speed;
        state.balls.push(Ball::free(id, pos, Vec2::new(vx, speed)));
    }
    if count > 0 {
        state.push_event(GameEvent::MultiBall { spawned: count });
    }
    count
}
