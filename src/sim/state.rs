//! Game state and core simulation types
//!
//! One `GameState` owns every entity of a running session. It is threaded
//! through `tick` once per frame; nothing lives in globals.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;
use super::boss::Boss;
use super::powerup::{Powerup, PowerupKind};
use crate::tuning::Tuning;

/// Coarse session phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Brick level in progress
    Playing,
    /// Modal overlay open; simulation frozen
    Paused,
    /// Final level, boss encounter in progress
    Boss,
    /// Boss defeated (terminal)
    Won,
    /// Lives exhausted (terminal)
    GameOver,
}

impl GamePhase {
    /// Terminal phases only leave via restart
    pub fn is_terminal(self) -> bool {
        matches!(self, GamePhase::Won | GamePhase::GameOver)
    }
}

/// Things that happened during a tick, consumed by audio, HUD and effects
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    Launched,
    WallHit,
    PaddleHit { pos: Vec2 },
    BrickHit { id: u32, pos: Vec2 },
    BrickDestroyed { kind: BrickKind, pos: Vec2, score: u32 },
    BossHit { damage: u32, hp: u32 },
    BossFired,
    ProjectileReflected,
    BossDefeated,
    PowerupSpawned { pos: Vec2 },
    PowerupCollected { kind: PowerupKind },
    PowerupExpired { kind: PowerupKind },
    MultiBall { spawned: usize },
    /// A ball left the arena while others remain
    BallLost { remaining: usize },
    /// The last ball left the arena
    LifeLost { lives: u8 },
    LevelStarted { level: u32, boss: bool },
    LevelCleared { level: u32 },
    Paused,
    Resumed,
    Victory,
    GameOver,
}

/// A ball entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ball {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    /// False while resting on the paddle waiting for launch
    pub active: bool,
}

impl Ball {
    /// A ball resting on the paddle with its launch velocity primed
    pub fn resting(id: u32, paddle: &Paddle, tuning: &Tuning, rng: &mut Pcg32) -> Self {
        let dir = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
        let mut ball = Self {
            id,
            pos: Vec2::ZERO,
            vel: Vec2::new(dir * tuning.ball_speed * 0.5, tuning.ball_speed),
            active: false,
        };
        ball.follow_paddle(paddle);
        ball
    }

    /// A free-flying ball
    pub fn free(id: u32, pos: Vec2, vel: Vec2) -> Self {
        Self {
            id,
            pos,
            vel,
            active: true,
        }
    }

    /// Resting balls ride just above the paddle
    pub fn follow_paddle(&mut self, paddle: &Paddle) {
        self.pos = Vec2::new(paddle.x, paddle.y + 0.5);
    }

    pub fn launch(&mut self) {
        self.active = true;
    }
}

/// The player's paddle
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paddle {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Width without powerups
    pub base_width: f32,
    /// Tick at which paddle-grow ends (None = not grown)
    pub grow_until: Option<u64>,
}

impl Paddle {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            x: 0.0,
            y: tuning.paddle_y,
            width: tuning.paddle_width,
            height: tuning.paddle_height,
            base_width: tuning.paddle_width,
            grow_until: None,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(Vec2::new(self.x, self.y), Vec2::new(self.width, self.height))
    }

    /// Move by `dx`, staying between the walls
    pub fn move_by(&mut self, dx: f32, tuning: &Tuning) {
        self.move_to(self.x + dx, tuning);
    }

    /// Jump to `x`, staying between the walls
    pub fn move_to(&mut self, x: f32, tuning: &Tuning) {
        let limit = tuning.paddle_limit(self.width);
        self.x = x.clamp(-limit, limit);
    }

    pub fn is_grown(&self) -> bool {
        self.grow_until.is_some()
    }
}

/// Brick categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BrickKind {
    #[default]
    Normal,
    Hard,
    Armored,
    /// Spawns two extra balls when destroyed
    MultiBall,
    /// Drops a paddle-grow pickup when destroyed
    Item,
}

impl BrickKind {
    pub fn hit_points(self) -> u8 {
        match self {
            BrickKind::Normal | BrickKind::MultiBall | BrickKind::Item => 1,
            BrickKind::Hard => 2,
            BrickKind::Armored => 3,
        }
    }

    pub fn score(self) -> u32 {
        match self {
            BrickKind::Normal => 100,
            BrickKind::Hard => 200,
            BrickKind::Armored => 300,
            BrickKind::MultiBall | BrickKind::Item => 150,
        }
    }

    /// Base color (0xRRGGBB) for rendering and particles
    pub fn color(self) -> u32 {
        match self {
            BrickKind::Normal => 0x00ff00,
            BrickKind::Hard => 0x888888,
            BrickKind::Armored => 0xffd700,
            BrickKind::MultiBall => 0xff00ff,
            BrickKind::Item => 0x00aaff,
        }
    }
}

/// A brick entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brick {
    pub id: u32,
    pub kind: BrickKind,
    pub pos: Vec2,
    pub size: Vec2,
    pub hp: u8,
    pub active: bool,
    /// Hit-flash end tick (cosmetic)
    #[serde(default)]
    pub flash_until: u64,
}

impl Brick {
    pub fn new(id: u32, kind: BrickKind, pos: Vec2, size: Vec2) -> Self {
        Self {
            id,
            kind,
            pos,
            size,
            hp: kind.hit_points(),
            active: true,
            flash_until: 0,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.pos, self.size)
    }

    /// Take one hit. Returns true if this hit destroyed the brick.
    pub fn hit(&mut self, now: u64, flash_ticks: u64) -> bool {
        if !self.active || self.hp == 0 {
            return false;
        }
        self.hp -= 1;
        if self.hp == 0 {
            self.active = false;
            true
        } else {
            self.flash_until = now + flash_ticks;
            false
        }
    }

    pub fn is_flashing(&self, now: u64) -> bool {
        self.active && now < self.flash_until
    }
}

/// A particle for visual effects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: u32,
    pub life: f32, // 1 -> 0
}

/// Paddle color (particles on paddle contact)
pub const PADDLE_COLOR: u32 = 0x00ffff;
/// Boss color (particles on boss hits)
pub const BOSS_COLOR: u32 = 0xff0000;

fn default_rng() -> Pcg32 {
    Pcg32::seed_from_u64(0)
}

/// Complete game state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed
    pub seed: u64,
    #[serde(skip, default = "default_rng")]
    pub rng: Pcg32,
    pub tuning: Tuning,
    /// Current level (1-based)
    pub level: u32,
    pub lives: u8,
    pub score: u64,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub phase: GamePhase,
    /// Phase to return to when unpausing
    pub resume_phase: GamePhase,
    pub paddle: Paddle,
    pub balls: Vec<Ball>,
    pub bricks: Vec<Brick>,
    pub boss: Boss,
    pub powerups: Vec<Powerup>,
    /// Visual particles (not gameplay-affecting)
    pub particles: Vec<Particle>,
    /// Events raised by the most recent tick
    #[serde(skip)]
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    /// New session with default tuning
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(seed, Tuning::default())
    }

    /// New session, starting at level 1
    pub fn with_tuning(seed: u64, tuning: Tuning) -> Self {
        let mut state = Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            level: 1,
            lives: tuning.starting_lives,
            score: 0,
            time_ticks: 0,
            phase: GamePhase::Playing,
            resume_phase: GamePhase::Playing,
            paddle: Paddle::new(&tuning),
            balls: Vec::new(),
            bricks: Vec::new(),
            boss: Boss::new(&tuning),
            powerups: Vec::new(),
            particles: Vec::new(),
            events: Vec::new(),
            next_id: 1,
            tuning,
        };

        super::tick::start_level(&mut state, 1);
        state
    }

    /// Reset score, lives, level and entities, keeping the tuning
    pub fn restart(&mut self, seed: u64) {
        let tuning = self.tuning.clone();
        *self = Self::with_tuning(seed, tuning);
        log::info!("Session restarted with seed {}", seed);
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Replace all balls with a single ball resting on the paddle
    pub fn reset_balls(&mut self) {
        self.balls.clear();
        self.spawn_resting_ball();
    }

    /// Spawn a ball resting on the paddle
    pub fn spawn_resting_ball(&mut self) {
        let id = self.next_entity_id();
        let ball = Ball::resting(id, &self.paddle, &self.tuning, &mut self.rng);
        self.balls.push(ball);
    }

    /// Number of bricks still standing
    pub fn bricks_remaining(&self) -> usize {
        self.bricks.iter().filter(|b| b.active).count()
    }

    pub fn is_terminal(&self) -> bool {
        self.phase.is_terminal()
    }

    /// Spawn a burst of particles, respecting the particle cap
    pub fn emit_particles(&mut self, pos: Vec2, color: u32, count: usize) {
        let room = self
            .tuning
            .max_particles
            .saturating_sub(self.particles.len());
        for _ in 0..count.min(room) {
            let vel = Vec2::new(
                (self.rng.random::<f32>() - 0.5) * 0.3,
                (self.rng.random::<f32>() - 0.5) * 0.3,
            );
            self.particles.push(Particle {
                pos,
                vel,
                color,
                life: 1.0,
            });
        }
    }

    /// Advance particles one tick and drop dead ones
    pub fn update_particles(&mut self) {
        for particle in self.particles.iter_mut() {
            particle.pos += particle.vel;
            particle.life -= 0.02;
        }
        self.particles.retain(|p| p.life > 0.0);
    }

    /// Record an event for this tick
    #[inline]
    pub fn push_event(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take every event raised since the last drain
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_session() {
        let state = GameState::new(42);
        assert_eq!(state.level, 1);
        assert_eq!(state.lives, 3);
        assert_eq!(state.score, 0);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.balls.len(), 1);
        assert!(!state.balls[0].active);
        assert!(state.bricks_remaining() > 0);
    }

    #[test]
    fn test_resting_ball_velocity() {
        let tuning = Tuning::default();
        let paddle = Paddle::new(&tuning);
        let mut rng = Pcg32::seed_from_u64(7);
        let ball = Ball::resting(1, &paddle, &tuning, &mut rng);
        assert!((ball.vel.x.abs() - 0.06).abs() < 1e-6);
        assert!((ball.vel.y - 0.12).abs() < 1e-6);
        assert!((ball.pos.y - (paddle.y + 0.5)).abs() < 1e-6);
    }

    #[test]
    fn test_paddle_clamped_to_walls() {
        let tuning = Tuning::default();
        let mut paddle = Paddle::new(&tuning);
        paddle.move_to(100.0, &tuning);
        assert!((paddle.x - 5.0).abs() < 1e-6);
        paddle.move_by(-100.0, &tuning);
        assert!((paddle.x + 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_brick_hits_until_destroyed() {
        let mut brick = Brick::new(1, BrickKind::Armored, Vec2::ZERO, Vec2::new(1.2, 0.5));
        assert_eq!(brick.hp, 3);
        assert!(!brick.hit(10, 6));
        assert_eq!(brick.hp, 2);
        assert!(brick.is_flashing(12));
        assert!(!brick.is_flashing(16));
        assert!(!brick.hit(20, 6));
        assert!(brick.hit(30, 6));
        assert_eq!(brick.hp, 0);
        assert!(!brick.active);

        // Destroyed bricks stay destroyed
        assert!(!brick.hit(40, 6));
        assert_eq!(brick.hp, 0);
        assert!(!brick.active);
    }

    #[test]
    fn test_particle_cap_and_decay() {
        let mut state = GameState::new(1);
        state.tuning.max_particles = 10;
        state.emit_particles(Vec2::ZERO, PADDLE_COLOR, 8);
        state.emit_particles(Vec2::ZERO, PADDLE_COLOR, 8);
        assert_eq!(state.particles.len(), 10);

        for _ in 0..60 {
            state.update_particles();
        }
        assert!(state.particles.is_empty());
    }

    #[test]
    fn test_restart_resets_session() {
        let mut state = GameState::new(5);
        state.score = 1234;
        state.lives = 1;
        state.level = 3;
        state.restart(6);
        assert_eq!(state.score, 0);
        assert_eq!(state.lives, 3);
        assert_eq!(state.level, 1);
        assert_eq!(state.seed, 6);
    }
}
