//! Fixed timestep simulation tick
//!
//! Core game loop that advances the session one frame. Velocities are in
//! arena units per tick, so `tick` takes no `dt`.

use glam::Vec2;
use rand::Rng;

use super::collision::{self, BrickCollision};
use super::layout;
use super::powerup::{self, PowerupKind};
use super::state::{BOSS_COLOR, BrickKind, GameEvent, GamePhase, GameState, PADDLE_COLOR};

/// Input commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Move-left key held
    pub left: bool,
    /// Move-right key held
    pub right: bool,
    /// Absolute paddle x (from pointer/touch position). Overrides the keys.
    pub target_x: Option<f32>,
    /// Release resting balls
    pub launch: bool,
    /// Pause toggle
    pub pause: bool,
    /// Demo mode - the simulation drives the paddle
    pub autopilot: bool,
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput) {
    // Handle pause toggle
    if input.pause {
        match state.phase {
            GamePhase::Playing | GamePhase::Boss => {
                state.resume_phase = state.phase;
                state.phase = GamePhase::Paused;
                state.push_event(GameEvent::Paused);
                return;
            }
            GamePhase::Paused => {
                state.phase = state.resume_phase;
                state.push_event(GameEvent::Resumed);
            }
            _ => {}
        }
    }

    // Don't tick if paused or finished
    if state.phase == GamePhase::Paused || state.is_terminal() {
        return;
    }

    state.time_ticks += 1;

    let mut input = input.clone();
    if input.autopilot {
        autopilot(state, &mut input);
    }

    move_paddle(state, &input);
    powerup::expire_effects(state);

    if input.launch {
        launch_resting(state);
    }

    let outcome = update_balls(state);
    apply_brick_hits(state, &outcome);
    apply_boss_hits(state, outcome.boss_hits);

    handle_lost_balls(state, &outcome.lost);
    if state.phase == GamePhase::GameOver {
        return;
    }

    update_boss(state);
    powerup::update_powerups(state);
    state.update_particles();

    check_level_clear(state);
}

/// Enter `level`: clear the field, build its bricks or wake the boss, and
/// put one resting ball on the paddle
pub fn start_level(state: &mut GameState, level: u32) {
    state.level = level;
    state.bricks.clear();
    state.powerups.clear();
    state.boss.deactivate();

    let boss = level >= state.tuning.final_level;
    if boss {
        state.boss.activate(&state.tuning);
        state.phase = GamePhase::Boss;
        log::info!("Sector {}: boss encounter ({} hp)", level, state.boss.hp);
    } else {
        layout::build_level(state, level);
        state.phase = GamePhase::Playing;
    }
    state.resume_phase = state.phase;

    state.reset_balls();
    state.push_event(GameEvent::LevelStarted { level, boss });
}

/// What happened to the balls this tick, applied after the ball pass
#[derive(Debug, Default)]
struct BallOutcome {
    paddle_hits: Vec<Vec2>,
    /// Bricks that took a hit but survived (id, center)
    hits: Vec<(u32, Vec2)>,
    /// Bricks destroyed (kind, center)
    destroyed: Vec<(BrickKind, Vec2)>,
    boss_hits: u32,
    /// IDs of balls that fell out
    lost: Vec<u32>,
}

fn move_paddle(state: &mut GameState, input: &TickInput) {
    if let Some(target) = input.target_x {
        state.paddle.move_to(target, &state.tuning);
    } else {
        let speed = state.tuning.paddle_speed;
        let mut dx = 0.0;
        if input.left {
            dx -= speed;
        }
        if input.right {
            dx += speed;
        }
        if dx != 0.0 {
            state.paddle.move_by(dx, &state.tuning);
        }
    }

    // Resting balls ride along
    for ball in state.balls.iter_mut().filter(|b| !b.active) {
        ball.follow_paddle(&state.paddle);
    }
}

fn launch_resting(state: &mut GameState) {
    let mut launched = false;
    for ball in state.balls.iter_mut().filter(|b| !b.active) {
        ball.launch();
        launched = true;
    }
    if launched {
        state.push_event(GameEvent::Launched);
    }
}

/// Integrate and resolve every active ball: walls, lost, paddle, bricks, boss
fn update_balls(state: &mut GameState) -> BallOutcome {
    let now = state.time_ticks;
    let mut outcome = BallOutcome::default();

    for ball in state.balls.iter_mut().filter(|b| b.active) {
        ball.pos += ball.vel;

        if collision::resolve_walls(ball, &state.tuning) {
            state.events.push(GameEvent::WallHit);
        }

        if collision::is_lost(ball, &state.tuning) {
            outcome.lost.push(ball.id);
            continue;
        }

        if collision::resolve_paddle(ball, &state.paddle, &state.tuning) {
            state.events.push(GameEvent::PaddleHit { pos: ball.pos });
            outcome.paddle_hits.push(ball.pos);
        }

        match collision::resolve_bricks(ball, &mut state.bricks, &state.tuning, now) {
            BrickCollision::None => {}
            BrickCollision::Hit { id, pos } => {
                state.events.push(GameEvent::BrickHit { id, pos });
                outcome.hits.push((id, pos));
            }
            BrickCollision::Destroyed { kind, pos, .. } => {
                outcome.destroyed.push((kind, pos));
            }
        }

        if collision::resolve_boss(ball, &state.boss, &state.tuning) {
            // Jitter keeps the ball from locking into a vertical loop
            ball.vel.x += (state.rng.random::<f32>() - 0.5) * 0.1;
            outcome.boss_hits += 1;
        }
    }

    for pos in std::mem::take(&mut outcome.paddle_hits) {
        state.emit_particles(pos, PADDLE_COLOR, 5);
    }

    outcome
}

/// Score, particles and special-brick effects for this tick's brick contacts
fn apply_brick_hits(state: &mut GameState, outcome: &BallOutcome) {
    for &(id, pos) in &outcome.hits {
        let color = state
            .bricks
            .iter()
            .find(|b| b.id == id)
            .map_or(BrickKind::Normal.color(), |b| b.kind.color());
        state.emit_particles(pos, color, 15);
    }

    for &(kind, pos) in &outcome.destroyed {
        let score = kind.score();
        state.score += u64::from(score);
        state.push_event(GameEvent::BrickDestroyed { kind, pos, score });
        state.emit_particles(pos, kind.color(), 15);

        match kind {
            BrickKind::MultiBall => {
                powerup::spawn_multiball(state, pos);
            }
            BrickKind::Item => powerup::spawn_pickup(state, PowerupKind::PaddleGrow, pos),
            _ => {}
        }
    }
}

fn apply_boss_hits(state: &mut GameState, hits: u32) {
    let now = state.time_ticks;
    let damage = state.tuning.boss_ball_damage;
    for _ in 0..hits {
        let defeated = state
            .boss
            .take_damage(damage, now, state.tuning.hit_flash_ticks);
        let (pos, hp) = (state.boss.pos, state.boss.hp);
        state.push_event(GameEvent::BossHit { damage, hp });
        state.emit_particles(pos, BOSS_COLOR, 20);
        if defeated {
            state.push_event(GameEvent::BossDefeated);
            break;
        }
    }
}

/// Extra balls just disappear; losing the last one costs a life
fn handle_lost_balls(state: &mut GameState, lost: &[u32]) {
    for &id in lost {
        if state.balls.len() > 1 {
            state.balls.retain(|b| b.id != id);
            state.push_event(GameEvent::BallLost {
                remaining: state.balls.len(),
            });
            continue;
        }

        state.lives = state.lives.saturating_sub(1);
        state.push_event(GameEvent::LifeLost { lives: state.lives });

        if state.lives == 0 {
            state.balls.clear();
            state.phase = GamePhase::GameOver;
            state.push_event(GameEvent::GameOver);
            log::info!(
                "Game over at sector {} with score {}",
                state.level,
                state.score
            );
            return;
        }

        log::debug!("Life lost, {} remaining", state.lives);
        state.reset_balls();
    }
}

fn update_boss(state: &mut GameState) {
    if !state.boss.is_active() {
        return;
    }
    let hp_before = state.boss.hp;
    let paddle_box = state.paddle.aabb();
    state.boss.update(
        state.time_ticks,
        &paddle_box,
        &state.tuning,
        &mut state.rng,
        &mut state.events,
    );
    if state.boss.hp < hp_before {
        let pos = state.boss.pos;
        state.emit_particles(pos, BOSS_COLOR, 20);
    }
}

/// Advance to the next level, or finish the run after the final one
fn check_level_clear(state: &mut GameState) {
    if state.bricks_remaining() > 0 || state.boss.is_active() {
        return;
    }

    let level = state.level;
    state.push_event(GameEvent::LevelCleared { level });

    if level < state.tuning.final_level {
        start_level(state, level + 1);
    } else {
        state.phase = GamePhase::Won;
        state.balls.clear();
        state.powerups.clear();
        state.push_event(GameEvent::Victory);
        log::info!("Victory with score {}", state.score);
    }
}

/// Demo mode: launch, track the most urgent ball, grab pickups when safe
fn autopilot(state: &GameState, input: &mut TickInput) {
    if state.balls.iter().any(|b| !b.active) {
        input.launch = true;
    }

    let tuning = &state.tuning;
    let contact_y = tuning.paddle_y + tuning.paddle_height / 2.0 + tuning.ball_radius;

    // Lowest descending ball is the threat
    let threat = state
        .balls
        .iter()
        .filter(|b| b.active && b.vel.y < 0.0)
        .min_by(|a, b| {
            a.pos
                .y
                .partial_cmp(&b.pos.y)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

    let target = if let Some(ball) = threat {
        let ticks = ((ball.pos.y - contact_y) / -ball.vel.y).max(0.0);
        let landing = fold_into_arena(ball.pos.x + ball.vel.x * ticks, tuning.boundary_x);

        // Strike a little off-center so the return angle varies
        let time_factor = state.time_ticks as f32 * 0.01;
        let offset = time_factor.sin() * 0.3;
        Some(landing - offset)
    } else {
        // Safe: chase the lowest pickup
        state
            .powerups
            .iter()
            .filter(|p| p.active)
            .min_by(|a, b| {
                a.pos
                    .y
                    .partial_cmp(&b.pos.y)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|p| p.pos.x)
    };

    // Steer at key speed rather than jumping like a pointer would
    if let Some(target) = target {
        let speed = tuning.paddle_speed;
        let dx = (target - state.paddle.x).clamp(-speed, speed);
        input.target_x = Some(state.paddle.x + dx);
        input.left = false;
        input.right = false;
    }
}

/// Fold an unbounded x back into [-limit, limit] as if reflected by the walls
fn fold_into_arena(x: f32, limit: f32) -> f32 {
    let span = 2.0 * limit;
    let mut u = (x + limit).rem_euclid(2.0 * span);
    if u > span {
        u = 2.0 * span - u;
    }
    u - limit
}
