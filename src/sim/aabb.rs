//! Axis-aligned boxes for paddle, bricks, boss and pickups
//!
//! Everything in the arena is a box seen from the camera plane; only the
//! ball is treated as a sphere (circle in 2D).

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// An axis-aligned box stored as center and half extents
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub center: Vec2,
    pub half: Vec2,
}

impl Aabb {
    pub fn new(center: Vec2, size: Vec2) -> Self {
        Self {
            center,
            half: size * 0.5,
        }
    }

    /// Box from center and half extents
    pub fn from_half(center: Vec2, half: Vec2) -> Self {
        Self { center, half }
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.center - self.half
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.center + self.half
    }

    /// Closest point inside the box to `point`
    #[inline]
    pub fn closest_point(&self, point: Vec2) -> Vec2 {
        point.clamp(self.min(), self.max())
    }

    pub fn contains_point(&self, point: Vec2) -> bool {
        let d = (point - self.center).abs();
        d.x <= self.half.x && d.y <= self.half.y
    }

    /// Sphere/box overlap (touching counts)
    pub fn intersects_circle(&self, center: Vec2, radius: f32) -> bool {
        self.closest_point(center).distance_squared(center) <= radius * radius
    }

    /// Box/box overlap (touching counts)
    pub fn intersects(&self, other: &Aabb) -> bool {
        let d = (other.center - self.center).abs();
        let reach = self.half + other.half;
        d.x <= reach.x && d.y <= reach.y
    }
}
