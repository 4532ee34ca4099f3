//! Boss encounter for the final sector
//!
//! Inactive -> Active (on entering the final level) -> Defeated (hp hits 0).
//! While active the boss sways on a figure-eight and occasionally fires at
//! the paddle. A projectile that touches the paddle is reflected back up,
//! and a reflected projectile that reaches the boss hurts it.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;
use super::state::GameEvent;
use crate::tuning::Tuning;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BossState {
    Inactive,
    Active,
    Defeated,
}

/// A boss shot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Projectile {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Bounced off the paddle; now dangerous to the boss
    pub reflected: bool,
}

impl Projectile {
    pub fn aabb(&self, radius: f32) -> Aabb {
        Aabb::from_half(self.pos, Vec2::splat(radius))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Boss {
    pub state: BossState,
    pub pos: Vec2,
    pub hp: u32,
    pub max_hp: u32,
    pub projectiles: Vec<Projectile>,
    /// Hit-flash end tick (cosmetic)
    #[serde(default)]
    pub flash_until: u64,
}

impl Boss {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            state: BossState::Inactive,
            pos: Vec2::new(0.0, tuning.boss_center_y),
            hp: tuning.boss_max_hp,
            max_hp: tuning.boss_max_hp,
            projectiles: Vec::new(),
            flash_until: 0,
        }
    }

    /// Enter the encounter at full health
    pub fn activate(&mut self, tuning: &Tuning) {
        self.state = BossState::Active;
        self.max_hp = tuning.boss_max_hp;
        self.hp = self.max_hp;
        self.pos = Vec2::new(0.0, tuning.boss_center_y);
        self.projectiles.clear();
        self.flash_until = 0;
    }

    /// Leave the encounter without a result (level change or restart)
    pub fn deactivate(&mut self) {
        self.state = BossState::Inactive;
        self.projectiles.clear();
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.state == BossState::Active
    }

    pub fn aabb(&self, tuning: &Tuning) -> Aabb {
        Aabb::from_half(
            self.pos,
            Vec2::new(tuning.boss_half_width, tuning.boss_half_height),
        )
    }

    /// Health as a fraction of max (drives the HUD bar)
    pub fn hp_fraction(&self) -> f32 {
        if self.max_hp == 0 {
            0.0
        } else {
            self.hp as f32 / self.max_hp as f32
        }
    }

    /// Apply damage. Returns true if this damage defeated the boss.
    pub fn take_damage(&mut self, amount: u32, now: u64, flash_ticks: u64) -> bool {
        if !self.is_active() {
            return false;
        }
        self.hp = self.hp.saturating_sub(amount);
        self.flash_until = now + flash_ticks;
        if self.hp == 0 {
            self.state = BossState::Defeated;
            self.projectiles.clear();
            log::info!("Boss defeated");
            return true;
        }
        false
    }

    pub fn is_flashing(&self, now: u64) -> bool {
        now < self.flash_until
    }

    /// Figure-eight sway driven by elapsed milliseconds
    pub fn sway_position(elapsed_ms: f64, tuning: &Tuning) -> Vec2 {
        let x = (elapsed_ms * 0.001).sin() as f32 * tuning.boss_sway_x;
        let y = tuning.boss_center_y + (elapsed_ms * 0.002).sin() as f32 * tuning.boss_sway_y;
        Vec2::new(x, y)
    }

    /// Fire one shot from the boss center toward `target`
    pub fn fire_at(&mut self, target: Vec2, tuning: &Tuning) {
        let mut dir = (target - self.pos).normalize_or_zero();
        if dir == Vec2::ZERO {
            dir = Vec2::NEG_Y;
        }
        self.projectiles.push(Projectile {
            pos: self.pos,
            vel: dir * tuning.projectile_speed,
            reflected: false,
        });
    }

    /// Advance the boss one tick: sway, maybe fire, move projectiles
    pub fn update(
        &mut self,
        now: u64,
        paddle_box: &Aabb,
        tuning: &Tuning,
        rng: &mut Pcg32,
        events: &mut Vec<GameEvent>,
    ) {
        if !self.is_active() {
            return;
        }

        self.pos = Self::sway_position(crate::ticks_to_ms(now), tuning);

        if rng.random::<f32>() < tuning.boss_fire_chance {
            self.fire_at(paddle_box.center, tuning);
            events.push(GameEvent::BossFired);
        }

        let boss_box = self.aabb(tuning);
        let radius = tuning.projectile_radius;
        let floor = -tuning.boundary_y;
        let ceiling = tuning.boundary_y + tuning.lost_margin;
        let mut reflected_hits = 0u32;

        self.projectiles.retain_mut(|p| {
            p.pos += p.vel;
            let shot_box = p.aabb(radius);

            if !p.reflected && shot_box.intersects(paddle_box) {
                p.reflected = true;
                p.vel = Vec2::new(
                    p.vel.x * tuning.projectile_return_boost,
                    p.vel.y.abs() * tuning.projectile_return_boost,
                );
                events.push(GameEvent::ProjectileReflected);
            }

            if p.reflected && shot_box.intersects(&boss_box) {
                reflected_hits += 1;
                return false;
            }

            if p.pos.y < floor || (p.reflected && p.pos.y > ceiling) {
                return false;
            }
            true
        });

        for _ in 0..reflected_hits {
            let defeated = self.take_damage(tuning.boss_reflect_damage, now, tuning.hit_flash_ticks);
            events.push(GameEvent::BossHit {
                damage: tuning.boss_reflect_damage,
                hp: self.hp,
            });
            if defeated {
                events.push(GameEvent::BossDefeated);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn quiet_tuning() -> Tuning {
        Tuning {
            boss_fire_chance: 0.0,
            ..Default::default()
        }
    }

    fn paddle_box(tuning: &Tuning) -> Aabb {
        Aabb::new(
            Vec2::new(0.0, tuning.paddle_y),
            Vec2::new(tuning.paddle_width, tuning.paddle_height),
        )
    }

    #[test]
    fn test_activation_and_defeat() {
        let tuning = quiet_tuning();
        let mut boss = Boss::new(&tuning);
        assert!(!boss.is_active());
        // Inactive bosses ignore damage
        assert!(!boss.take_damage(10, 0, 6));
        assert_eq!(boss.hp, 500);

        boss.activate(&tuning);
        assert!(boss.is_active());
        for _ in 0..10 {
            assert!(!boss.take_damage(10, 0, 6));
        }
        assert_eq!(boss.hp, 400);

        assert!(boss.take_damage(1000, 0, 6));
        assert_eq!(boss.hp, 0);
        assert_eq!(boss.state, BossState::Defeated);
    }

    #[test]
    fn test_sway_stays_near_center() {
        let tuning = Tuning::default();
        for ms in [0.0, 500.0, 1570.0, 3141.0, 10_000.0] {
            let pos = Boss::sway_position(ms, &tuning);
            assert!(pos.x.abs() <= tuning.boss_sway_x + 1e-4);
            assert!((pos.y - tuning.boss_center_y).abs() <= tuning.boss_sway_y + 1e-4);
        }
    }

    #[test]
    fn test_projectile_aimed_at_paddle() {
        let tuning = quiet_tuning();
        let mut boss = Boss::new(&tuning);
        boss.activate(&tuning);
        boss.fire_at(Vec2::new(3.0, tuning.paddle_y), &tuning);
        let shot = &boss.projectiles[0];
        assert!(shot.vel.y < 0.0);
        assert!(shot.vel.x > 0.0);
        assert!((shot.vel.length() - tuning.projectile_speed).abs() < 1e-5);
    }

    #[test]
    fn test_projectile_reflects_off_paddle() {
        let tuning = quiet_tuning();
        let mut boss = Boss::new(&tuning);
        boss.activate(&tuning);
        let pb = paddle_box(&tuning);
        boss.projectiles.push(Projectile {
            pos: Vec2::new(0.0, tuning.paddle_y + 0.3),
            vel: Vec2::new(0.02, -0.15),
            reflected: false,
        });

        let mut rng = Pcg32::seed_from_u64(1);
        let mut events = Vec::new();
        boss.update(1, &pb, &tuning, &mut rng, &mut events);

        let shot = &boss.projectiles[0];
        assert!(shot.reflected);
        assert!((shot.vel.y - 0.225).abs() < 1e-5);
        assert!((shot.vel.x - 0.03).abs() < 1e-5);
        assert!(events.contains(&GameEvent::ProjectileReflected));
    }

    #[test]
    fn test_reflected_projectile_damages_boss() {
        let tuning = quiet_tuning();
        let mut boss = Boss::new(&tuning);
        boss.activate(&tuning);
        let pb = paddle_box(&tuning);
        let mut rng = Pcg32::seed_from_u64(1);

        for hit in 1..=25u32 {
            let mut events = Vec::new();
            // Recompute where the boss will be this tick so the shot lands
            let at = Boss::sway_position(crate::ticks_to_ms(hit as u64), &tuning);
            boss.projectiles.push(Projectile {
                pos: at,
                vel: Vec2::ZERO,
                reflected: true,
            });
            boss.update(hit as u64, &pb, &tuning, &mut rng, &mut events);
            assert_eq!(boss.hp, 500 - 20 * hit);
            assert!(boss.projectiles.is_empty());
            if hit < 25 {
                assert!(boss.is_active());
            } else {
                assert_eq!(boss.state, BossState::Defeated);
                assert!(events.contains(&GameEvent::BossDefeated));
            }
        }
    }

    #[test]
    fn test_unreflected_projectile_leaves_floor() {
        let tuning = quiet_tuning();
        let mut boss = Boss::new(&tuning);
        boss.activate(&tuning);
        // Paddle far away so the shot misses it
        let pb = Aabb::new(Vec2::new(5.0, tuning.paddle_y), Vec2::new(2.0, 0.3));
        boss.projectiles.push(Projectile {
            pos: Vec2::new(-4.0, -4.9),
            vel: Vec2::new(0.0, -0.15),
            reflected: false,
        });
        let mut rng = Pcg32::seed_from_u64(1);
        let mut events = Vec::new();
        boss.update(1, &pb, &tuning, &mut rng, &mut events);
        assert!(boss.projectiles.is_empty());
        assert_eq!(boss.hp, 500);
    }
}
