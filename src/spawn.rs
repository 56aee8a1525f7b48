//! Random sampling context for layout generation.
//!
//! Wraps a seedable RNG and exposes the sampling primitives the layout
//! generators are built from.

use glam::{Vec2, Vec3};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::{PI, TAU};

/// Source of random draws for one generation pass.
///
/// A seeded context is fully deterministic: the same seed and the same
/// sequence of calls produce the same values.
///
/// ```ignore
/// let mut ctx = SpawnContext::seeded(7);
/// let p = ctx.random_in_sphere(25.0);
/// assert!(p.length() <= 25.0);
/// ```
pub struct SpawnContext {
    rng: SmallRng,
}

impl SpawnContext {
    /// Deterministic context.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Context seeded from OS entropy; different every run.
    pub fn from_entropy() -> Self {
        Self {
            rng: SmallRng::from_entropy(),
        }
    }

    /// Seeded when `seed` is given, entropy-seeded otherwise.
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }

    // ========== Random primitives ==========

    /// Random f32 in `[0, 1)`.
    #[inline]
    pub fn random(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Random f32 in `[min, max)`.
    #[inline]
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        min + self.random() * (max - min)
    }

    /// Random angle in `[0, 2π)`.
    #[inline]
    pub fn random_angle(&mut self) -> f32 {
        self.random() * TAU
    }

    // ========== Position helpers ==========

    /// Random point inside a solid sphere of given radius, centered at origin.
    ///
    /// Uniform in volume: the radius is `R·cbrt(u)` and the polar angle is
    /// `acos(2u - 1)`, so neither the center nor the poles are over-sampled.
    pub fn random_in_sphere(&mut self, radius: f32) -> Vec3 {
        let r = radius * self.random().cbrt();
        let theta = self.random_angle();
        let phi = (2.0 * self.random() - 1.0).clamp(-1.0, 1.0).acos();

        Vec3::new(
            r * phi.sin() * theta.cos(),
            r * phi.sin() * theta.sin(),
            r * phi.cos(),
        )
    }

    /// Random point inside a disk of given radius, returned as `(x, z)`.
    ///
    /// Uses `sqrt(u)` on the radius for uniform area density.
    /// When `angle` is `Some`, that azimuth is used instead of a random one.
    pub fn random_in_disk(&mut self, radius: f32, angle: Option<f32>) -> Vec2 {
        let angle = match angle {
            Some(angle) => angle,
            None => self.random_angle(),
        };
        let r = self.random().sqrt() * radius;
        Vec2::new(angle.cos() * r, angle.sin() * r)
    }

    /// Random Euler angle in `[0, π)`.
    #[inline]
    pub fn random_half_turn(&mut self) -> f32 {
        self.random() * PI
    }
}
