//! Collision detection and response for the ball
//!
//! Everything is axis-aligned: the ball is a circle, the rest are boxes.
//! Responses are instantaneous sign changes on one velocity component; no
//! swept tests, so a fast ball may sink into a wall by up to one tick of
//! travel before it turns around.

use glam::Vec2;

use super::boss::Boss;
use super::state::{Ball, Brick, BrickKind, Paddle};
use crate::tuning::Tuning;

/// Outcome of testing one ball against the brick set
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BrickCollision {
    None,
    /// Brick took a hit and is still standing
    Hit { id: u32, pos: Vec2 },
    /// Brick reached zero hit-points
    Destroyed { id: u32, kind: BrickKind, pos: Vec2 },
}

/// Bounce off the side walls and ceiling. Returns true on contact.
///
/// The component is pointed back into the arena rather than blindly
/// flipped, so a ball still outside next tick does not flip back out.
pub fn resolve_walls(ball: &mut Ball, tuning: &Tuning) -> bool {
    let mut hit = false;
    if ball.pos.x > tuning.boundary_x {
        ball.vel.x = -ball.vel.x.abs();
        hit = true;
    } else if ball.pos.x < -tuning.boundary_x {
        ball.vel.x = ball.vel.x.abs();
        hit = true;
    }
    if ball.pos.y > tuning.boundary_y {
        ball.vel.y = -ball.vel.y.abs();
        hit = true;
    }
    hit
}

/// Ball fell past the floor threshold
#[inline]
pub fn is_lost(ball: &Ball, tuning: &Tuning) -> bool {
    ball.pos.y < tuning.lost_y()
}

/// Bounce off the paddle. Returns true on contact.
///
/// Horizontal speed comes from where the ball struck relative to the paddle
/// center; vertical speed always points up. Each contact speeds the ball up
/// until it reaches the cap.
pub fn resolve_paddle(ball: &mut Ball, paddle: &Paddle, tuning: &Tuning) -> bool {
    if !paddle.aabb().intersects_circle(ball.pos, tuning.ball_radius) {
        return false;
    }

    let offset = ball.pos.x - paddle.x;
    ball.vel.x = offset * tuning.paddle_deflection;
    ball.vel.y = ball.vel.y.abs();

    if ball.vel.length() < tuning.ball_max_speed {
        ball.vel *= tuning.paddle_speedup;
    }
    // Steep deflections can overshoot the cap on their own
    ball.vel = ball.vel.clamp_length_max(tuning.ball_max_speed);
    true
}

/// Point `vy` away from a box centered at `center_y`. Returns false if the
/// ball was already heading away, which means it is still inside a box it
/// bounced off on an earlier tick.
fn bounce_vertically(ball: &mut Ball, center_y: f32) -> bool {
    let below = ball.pos.y < center_y;
    let approaching = if below { ball.vel.y > 0.0 } else { ball.vel.y < 0.0 };
    if !approaching {
        return false;
    }
    ball.vel.y = if below {
        -ball.vel.y.abs()
    } else {
        ball.vel.y.abs()
    };
    true
}

/// Test bricks in order and resolve the first one the ball overlaps while
/// moving toward it.
///
/// At most one brick is resolved per ball per tick. A ball leaving a brick
/// it already bounced off passes through without another hit.
pub fn resolve_bricks(
    ball: &mut Ball,
    bricks: &mut [Brick],
    tuning: &Tuning,
    now: u64,
) -> BrickCollision {
    for brick in bricks.iter_mut().filter(|b| b.active) {
        if !brick.aabb().intersects_circle(ball.pos, tuning.ball_radius)
            || !bounce_vertically(ball, brick.pos.y)
        {
            continue;
        }

        let destroyed = brick.hit(now, tuning.hit_flash_ticks);
        return if destroyed {
            BrickCollision::Destroyed {
                id: brick.id,
                kind: brick.kind,
                pos: brick.pos,
            }
        } else {
            BrickCollision::Hit {
                id: brick.id,
                pos: brick.pos,
            }
        };
    }
    BrickCollision::None
}

/// Bounce off an active boss. Returns true on a fresh contact (damage is
/// the caller's job); a ball still inside after bouncing does not count.
pub fn resolve_boss(ball: &mut Ball, boss: &Boss, tuning: &Tuning) -> bool {
    if !boss.is_active() || !boss.aabb(tuning).intersects_circle(ball.pos, tuning.ball_radius) {
        return false;
    }
    bounce_vertically(ball, boss.pos.y)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ball_at(x: f32, y: f32, vx: f32, vy: f32) -> Ball {
        Ball::free(1, Vec2::new(x, y), Vec2::new(vx, vy))
    }

    fn brick_at(id: u32, x: f32, y: f32, kind: BrickKind) -> Brick {
        Brick::new(id, kind, Vec2::new(x, y), Vec2::new(1.2, 0.5))
    }

    #[test]
    fn test_side_walls() {
        let tuning = Tuning::default();
        let mut ball = ball_at(6.05, 0.0, 0.1, 0.1);
        assert!(resolve_walls(&mut ball, &tuning));
        assert!(ball.vel.x < 0.0);

        let mut ball = ball_at(-6.05, 0.0, -0.1, 0.1);
        assert!(resolve_walls(&mut ball, &tuning));
        assert!(ball.vel.x > 0.0);

        let mut ball = ball_at(0.0, 0.0, 0.1, 0.1);
        assert!(!resolve_walls(&mut ball, &tuning));
        assert_eq!(ball.vel, Vec2::new(0.1, 0.1));
    }

    #[test]
    fn test_ball_outside_wall_does_not_flip_back() {
        let tuning = Tuning::default();
        let mut ball = ball_at(6.2, 0.0, 0.1, 0.0);
        resolve_walls(&mut ball, &tuning);
        ball.pos += ball.vel;
        // Still outside after one tick of travel inward
        assert!(ball.pos.x > tuning.boundary_x);
        resolve_walls(&mut ball, &tuning);
        assert!(ball.vel.x < 0.0);
    }

    #[test]
    fn test_straight_back_bounce() {
        let tuning = Tuning::default();
        let paddle = Paddle::new(&tuning);
        let mut ball = ball_at(paddle.x, paddle.y + 0.2, 0.08, 0.12);
        assert!(resolve_paddle(&mut ball, &paddle, &tuning));
        assert_eq!(ball.vel.x, 0.0);
        assert!(ball.vel.y >= 0.12);
    }

    #[test]
    fn test_paddle_angle_control() {
        let tuning = Tuning::default();
        let paddle = Paddle::new(&tuning);
        let mut left = ball_at(paddle.x - 0.8, paddle.y + 0.2, 0.0, -0.12);
        let mut right = ball_at(paddle.x + 0.8, paddle.y + 0.2, 0.0, -0.12);
        resolve_paddle(&mut left, &paddle, &tuning);
        resolve_paddle(&mut right, &paddle, &tuning);
        assert!(left.vel.x < 0.0);
        assert!(right.vel.x > 0.0);
        assert!((left.vel.x + right.vel.x).abs() < 1e-6);
    }

    #[test]
    fn test_paddle_speed_capped() {
        let tuning = Tuning::default();
        let paddle = Paddle::new(&tuning);
        let mut ball = ball_at(paddle.x + 0.9, paddle.y + 0.2, 0.0, -0.24);
        resolve_paddle(&mut ball, &paddle, &tuning);
        assert!(ball.vel.length() <= tuning.ball_max_speed + 1e-6);
    }

    #[test]
    fn test_steep_deflection_capped() {
        let tuning = Tuning::default();
        let paddle = Paddle::new(&tuning);
        // Already at the cap: no speed-up, but the edge deflection adds vx
        let mut ball = ball_at(paddle.x + 0.9, paddle.y + 0.2, 0.0, -tuning.ball_max_speed);
        assert!(resolve_paddle(&mut ball, &paddle, &tuning));
        assert!(ball.vel.length() <= tuning.ball_max_speed + 1e-6);
        assert!(ball.vel.x > 0.0 && ball.vel.y > 0.0);
    }

    #[test]
    fn test_paddle_miss() {
        let tuning = Tuning::default();
        let paddle = Paddle::new(&tuning);
        let mut ball = ball_at(paddle.x + 3.0, paddle.y, 0.0, -0.12);
        assert!(!resolve_paddle(&mut ball, &paddle, &tuning));
        assert_eq!(ball.vel, Vec2::new(0.0, -0.12));
    }

    #[test]
    fn test_one_brick_per_tick() {
        let tuning = Tuning::default();
        // Two overlapping bricks at the same spot
        let mut bricks = vec![
            brick_at(1, 0.0, 2.0, BrickKind::Hard),
            brick_at(2, 0.0, 2.0, BrickKind::Hard),
        ];
        let mut ball = ball_at(0.0, 1.8, 0.0, 0.12);
        let result = resolve_bricks(&mut ball, &mut bricks, &tuning, 0);
        assert_eq!(
            result,
            BrickCollision::Hit {
                id: 1,
                pos: Vec2::new(0.0, 2.0)
            }
        );
        assert_eq!(bricks[0].hp, 1);
        assert_eq!(bricks[1].hp, 2);
        assert!(ball.vel.y < 0.0);
    }

    #[test]
    fn test_brick_destroyed_reports_kind() {
        let tuning = Tuning::default();
        let mut bricks = vec![brick_at(9, 1.0, 2.0, BrickKind::Item)];
        let mut ball = ball_at(1.0, 1.8, 0.0, 0.12);
        let result = resolve_bricks(&mut ball, &mut bricks, &tuning, 0);
        assert_eq!(
            result,
            BrickCollision::Destroyed {
                id: 9,
                kind: BrickKind::Item,
                pos: Vec2::new(1.0, 2.0)
            }
        );
        assert!(!bricks[0].active);

        // Inactive bricks are skipped
        let mut ball = ball_at(1.0, 1.8, 0.0, 0.12);
        assert_eq!(
            resolve_bricks(&mut ball, &mut bricks, &tuning, 1),
            BrickCollision::None
        );
    }

    #[test]
    fn test_boss_bounce_only_when_active() {
        let tuning = Tuning::default();
        let mut boss = Boss::new(&tuning);
        let mut ball = ball_at(0.0, 0.45, 0.05, 0.12);
        assert!(!resolve_boss(&mut ball, &boss, &tuning));

        boss.activate(&tuning);
        assert!(resolve_boss(&mut ball, &boss, &tuning));
        assert!(ball.vel.y < 0.0);
    }

    #[test]
    fn test_side_entry_hits_brick_once() {
        let tuning = Tuning::default();
        let mut bricks = vec![brick_at(1, 0.0, 2.0, BrickKind::Armored)];
        // Skims in from the left just below the center line
        let mut ball = ball_at(-0.9, 1.95, 0.1, 0.01);
        let mut hits = 0;
        for now in 0..20 {
            ball.pos += ball.vel;
            if resolve_bricks(&mut ball, &mut bricks, &tuning, now) != BrickCollision::None {
                hits += 1;
            }
        }
        assert_eq!(hits, 1);
        assert_eq!(bricks[0].hp, 2);
        assert!(ball.vel.y < 0.0);
    }

    #[test]
    fn test_ball_leaving_brick_passes_through() {
        let tuning = Tuning::default();
        let mut bricks = vec![brick_at(1, 0.0, 2.0, BrickKind::Hard)];
        // Above the center and moving up: already on its way out
        let mut ball = ball_at(0.0, 2.1, 0.0, 0.12);
        assert_eq!(
            resolve_bricks(&mut ball, &mut bricks, &tuning, 0),
            BrickCollision::None
        );
        assert_eq!(bricks[0].hp, 2);
        assert_eq!(ball.vel.y, 0.12);
    }

    #[test]
    fn test_side_entry_hits_boss_once() {
        let tuning = Tuning::default();
        let mut boss = Boss::new(&tuning);
        boss.activate(&tuning);
        let edge = boss.pos.x - tuning.boss_half_width - 0.1;
        let mut ball = ball_at(edge, boss.pos.y - 0.3, 0.2, 0.12);
        let mut hits = 0;
        for _ in 0..60 {
            ball.pos += ball.vel;
            if resolve_boss(&mut ball, &boss, &tuning) {
                hits += 1;
            }
        }
        assert_eq!(hits, 1);
        assert!(ball.vel.y < 0.0);
    }

    #[test]
    fn test_boss_bounce_from_above() {
        let tuning = Tuning::default();
        let mut boss = Boss::new(&tuning);
        boss.activate(&tuning);
        let mut ball = ball_at(0.0, boss.pos.y + tuning.boss_half_height + 0.1, 0.0, -0.12);
        assert!(resolve_boss(&mut ball, &boss, &tuning));
        assert!(ball.vel.y > 0.0);
    }

    proptest! {
        #[test]
        fn prop_paddle_always_bounces_up(
            offset in -1.0f32..1.0,
            vx in -0.25f32..0.25,
            vy in -0.25f32..0.25,
        ) {
            let tuning = Tuning::default();
            let paddle = Paddle::new(&tuning);
            prop_assume!(vy != 0.0);
            let mut ball = ball_at(paddle.x + offset, paddle.y + 0.2, vx, vy);
            prop_assert!(resolve_paddle(&mut ball, &paddle, &tuning));
            prop_assert!(ball.vel.y > 0.0);
        }

        #[test]
        fn prop_ceiling_reflects_vertical(
            x in -5.9f32..5.9,
            above in 0.001f32..0.25,
            vy in 0.001f32..0.25,
        ) {
            let tuning = Tuning::default();
            let mut ball = ball_at(x, tuning.boundary_y + above, 0.05, vy);
            prop_assert!(resolve_walls(&mut ball, &tuning));
            prop_assert!(ball.vel.y < 0.0);
            prop_assert_eq!(ball.vel.y, -vy);
        }

        #[test]
        fn prop_brick_hp_drops_by_one(hp in 1u8..=3, dx in -0.6f32..0.6) {
            let tuning = Tuning::default();
            let kind = match hp {
                1 => BrickKind::Normal,
                2 => BrickKind::Hard,
                _ => BrickKind::Armored,
            };
            let mut bricks = vec![brick_at(1, 0.0, 2.0, kind)];
            let mut ball = ball_at(dx, 1.8, 0.0, 0.12);
            let result = resolve_bricks(&mut ball, &mut bricks, &tuning, 0);
            prop_assert_eq!(bricks[0].hp, hp - 1);
            prop_assert_eq!(bricks[0].active, hp > 1);
            prop_assert_eq!(matches!(result, BrickCollision::Destroyed { .. }), hp == 1);
        }
    }
}
