//! Layout generation for both populations.
//!
//! Every element gets two static positions: a *scatter* sample drawn uniformly
//! from a solid sphere, and an *assembled* sample drawn from a cone whose apex
//! points up. Everything is generated once; per-frame motion is derived from
//! these records and never written back.
//!
//! Shapes are validated on construction, so a [`SphereShape`] or
//! [`ConeShape`] in hand is always usable and generation itself cannot fail.
//!
//! # Example
//!
//! ```ignore
//! let scatter = SphereShape::new(25.0)?;
//! let cone = ConeShape::new(14.0, 5.5)?;
//! let field = PointField::generate(15_000, scatter, cone, Some(7));
//! assert_eq!(field.len(), 15_000);
//! ```

use crate::config::{self, Settings};
use crate::error::ConfigError;
use crate::spawn::SpawnContext;
use glam::Vec3;
use std::ops::Range;

/// Solid sphere centered at the origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereShape {
    radius: f32,
}

impl SphereShape {
    /// Fails unless `radius` is finite and positive.
    pub fn new(radius: f32) -> Result<Self, ConfigError> {
        let radius = config::extent("scatter_radius", radius)?;
        Ok(Self { radius })
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Uniform-volume sample.
    pub fn sample(&self, ctx: &mut SpawnContext) -> Vec3 {
        ctx.random_in_sphere(self.radius)
    }
}

/// Upright cone centered vertically on the origin.
///
/// The cone spans `y ∈ [-height/2, height/2]` and its radius tapers linearly
/// from `base_radius` at the bottom to zero at the top. Samples are drawn from
/// the central `span` of that height, which defaults to the full height.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConeShape {
    height: f32,
    base_radius: f32,
    span: f32,
}

impl ConeShape {
    /// Fails unless both extents are finite and positive.
    pub fn new(height: f32, base_radius: f32) -> Result<Self, ConfigError> {
        let height = config::extent("cone_height", height)?;
        let base_radius = config::extent("cone_radius", base_radius)?;
        Ok(Self {
            height,
            base_radius,
            span: height,
        })
    }

    /// Trim `margin` off the sampled span, half at each end.
    pub fn with_margin(self, margin: f32) -> Result<Self, ConfigError> {
        if !(margin.is_finite() && margin >= 0.0 && margin < self.height) {
            return Err(ConfigError::OutOfRange {
                name: "entities.height_margin",
                value: margin,
                min: 0.0,
                max: self.height,
            });
        }
        Ok(Self {
            span: self.height - margin,
            ..self
        })
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn base_radius(&self) -> f32 {
        self.base_radius
    }

    /// Vertical extent actually sampled.
    pub fn span(&self) -> f32 {
        self.span
    }

    /// 0 at the base, 1 at the apex.
    #[inline]
    pub fn normalized_height(&self, y: f32) -> f32 {
        (y + self.height / 2.0) / self.height
    }

    /// Cone radius at height `y`.
    #[inline]
    pub fn radius_at(&self, y: f32) -> f32 {
        (1.0 - self.normalized_height(y)) * self.base_radius
    }

    /// Uniform-area sample of the disk at a uniformly drawn height.
    ///
    /// With `azimuth` set, the angle is fixed and only height and radius
    /// are random.
    pub fn sample(&self, ctx: &mut SpawnContext, azimuth: Option<f32>) -> Vec3 {
        let y = (ctx.random() - 0.5) * self.span;
        let local = self.radius_at(y).max(0.0);
        let disk = ctx.random_in_disk(local, azimuth);
        Vec3::new(disk.x, y, disk.y)
    }
}

// ============================================================================
// Homogeneous population
// ============================================================================

/// One element of the point population.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub index: u32,
    pub scatter: Vec3,
    pub assembled: Vec3,
    /// Uniform in `[0, 1)`; drives size and color variation.
    pub random: f32,
}

/// The point population as parallel arrays.
///
/// Point `i` is `(scatter[i], assembled[i], random[i])`. The layout matches the
/// per-vertex attribute streams uploaded to the GPU.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointField {
    scatter: Vec<Vec3>,
    assembled: Vec<Vec3>,
    random: Vec<f32>,
}

impl PointField {
    /// Generate `count` points. `seed = None` draws from OS entropy.
    pub fn generate(
        count: usize,
        scatter: SphereShape,
        cone: ConeShape,
        seed: Option<u64>,
    ) -> Self {
        let mut ctx = SpawnContext::new(seed);
        let mut field = Self {
            scatter: Vec::with_capacity(count),
            assembled: Vec::with_capacity(count),
            random: Vec::with_capacity(count),
        };

        for _ in 0..count {
            field.scatter.push(scatter.sample(&mut ctx));
            field.assembled.push(cone.sample(&mut ctx, None));
            field.random.push(ctx.random());
        }

        tracing::debug!(count, ?seed, "Generated point field");
        field
    }

    /// Generate from validated settings.
    pub fn from_settings(settings: &Settings, seed: Option<u64>) -> Result<Self, ConfigError> {
        Ok(Self::generate(
            settings.point_count,
            settings.point_scatter()?,
            settings.point_cone()?,
            seed,
        ))
    }

    pub fn len(&self) -> usize {
        self.scatter.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scatter.is_empty()
    }

    pub fn scatter(&self) -> &[Vec3] {
        &self.scatter
    }

    pub fn assembled(&self) -> &[Vec3] {
        &self.assembled
    }

    pub fn random(&self) -> &[f32] {
        &self.random
    }

    /// Point `index`, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<Point> {
        Some(Point {
            index: index as u32,
            scatter: *self.scatter.get(index)?,
            assembled: self.assembled[index],
            random: self.random[index],
        })
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = Point> + '_ {
        (0..self.len()).map(move |i| Point {
            index: i as u32,
            scatter: self.scatter[i],
            assembled: self.assembled[i],
            random: self.random[i],
        })
    }
}

// ============================================================================
// Heterogeneous population
// ============================================================================

/// Mesh an entity is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Box,
    Sphere,
}

impl EntityKind {
    pub const ALL: [EntityKind; 2] = [EntityKind::Box, EntityKind::Sphere];
}

/// One element of the entity population. Immutable after generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entity {
    /// Stable index, `0..count`.
    pub index: u32,
    pub kind: EntityKind,
    pub scatter: Vec3,
    pub assembled: Vec3,
    /// Euler angles, XYZ order.
    pub rotation: Vec3,
    pub scale: f32,
    /// Linear RGB.
    pub color: Vec3,
    /// Scales jitter amplitude and phase rate.
    pub weight: f32,
}

/// Three-band color draw. Bands are tested from the highest threshold down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PaletteBands {
    pub base: Vec3,
    pub accent: Vec3,
    pub rare: Vec3,
    pub accent_threshold: f32,
    pub rare_threshold: f32,
}

impl PaletteBands {
    pub fn pick(&self, u: f32) -> Vec3 {
        let (high, high_color, low, low_color) = if self.rare_threshold >= self.accent_threshold {
            (self.rare_threshold, self.rare, self.accent_threshold, self.accent)
        } else {
            (self.accent_threshold, self.accent, self.rare_threshold, self.rare)
        };

        if u > high {
            high_color
        } else if u > low {
            low_color
        } else {
            self.base
        }
    }
}

/// Everything needed to generate the entity population.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityParams {
    pub scatter: SphereShape,
    pub cone: ConeShape,
    /// Azimuth increment per index on the cone.
    pub spiral_step: f32,
    /// Draws above this become boxes.
    pub box_threshold: f32,
    pub palette: PaletteBands,
    pub scale_range: Range<f32>,
    pub weight_range: Range<f32>,
}

impl EntityParams {
    pub fn from_settings(settings: &Settings) -> Result<Self, ConfigError> {
        settings.validate()?;
        let palette = settings.palette()?;
        let t = &settings.entities;
        Ok(Self {
            scatter: settings.entity_scatter()?,
            cone: settings.entity_cone()?,
            spiral_step: t.spiral_step,
            box_threshold: t.box_threshold,
            palette: PaletteBands {
                base: palette.gold,
                accent: palette.accent,
                rare: palette.emerald,
                accent_threshold: t.accent_threshold,
                rare_threshold: t.emerald_threshold,
            },
            scale_range: t.scale_range[0]..t.scale_range[1],
            weight_range: t.weight_range[0]..t.weight_range[1],
        })
    }
}

/// Generate `count` entities. `seed = None` draws from OS entropy.
///
/// Assembled azimuth is `index · spiral_step`, so entities climb the cone in
/// a spiral instead of clumping.
pub fn generate_entities(count: usize, params: &EntityParams, seed: Option<u64>) -> Vec<Entity> {
    let mut ctx = SpawnContext::new(seed);
    let mut entities = Vec::with_capacity(count);

    for i in 0..count {
        let kind = if ctx.random() > params.box_threshold {
            EntityKind::Box
        } else {
            EntityKind::Sphere
        };

        let scatter = params.scatter.sample(&mut ctx);
        let assembled = params
            .cone
            .sample(&mut ctx, Some(i as f32 * params.spiral_step));
        let color = params.palette.pick(ctx.random());
        let rotation = Vec3::new(ctx.random_half_turn(), ctx.random_half_turn(), 0.0);
        let scale = ctx.random_range(params.scale_range.start, params.scale_range.end);
        let weight = ctx.random_range(params.weight_range.start, params.weight_range.end);

        entities.push(Entity {
            index: i as u32,
            kind,
            scatter,
            assembled,
            rotation,
            scale,
            color,
            weight,
        });
    }

    tracing::debug!(count, ?seed, "Generated entities");
    entities
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> EntityParams {
        EntityParams::from_settings(&Settings::default()).unwrap()
    }

    #[test]
    fn test_shapes_reject_bad_extents() {
        assert!(SphereShape::new(-1.0).is_err());
        assert!(SphereShape::new(f32::INFINITY).is_err());
        assert!(SphereShape::new(0.0).is_err());
        assert!(ConeShape::new(14.0, f32::NAN).is_err());
        assert!(ConeShape::new(-14.0, 5.5).is_err());
        assert!(ConeShape::new(14.0, 5.5).unwrap().with_margin(-1.0).is_err());
    }

    #[test]
    fn test_cone_radius_taper() {
        let cone = ConeShape::new(14.0, 5.5).unwrap();
        assert!((cone.radius_at(-7.0) - 5.5).abs() < 1e-6);
        assert!(cone.radius_at(7.0).abs() < 1e-6);
        assert!((cone.radius_at(0.0) - 2.75).abs() < 1e-6);
    }

    #[test]
    fn test_zero_count_is_empty() {
        let field = PointField::generate(
            0,
            SphereShape::new(1.0).unwrap(),
            ConeShape::new(1.0, 1.0).unwrap(),
            Some(1),
        );
        assert!(field.is_empty());
        assert!(generate_entities(0, &params(), Some(1)).is_empty());
    }

    #[test]
    fn test_point_field_is_deterministic() {
        let settings = Settings {
            point_count: 64,
            ..Settings::default()
        };
        let a = PointField::from_settings(&settings, Some(9)).unwrap();
        let b = PointField::from_settings(&settings, Some(9)).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_eq!(a.iter().len(), 64);
        assert_eq!(a.get(3).unwrap().index, 3);
        assert!(a.get(64).is_none());
    }

    #[test]
    fn test_entity_indices_are_stable() {
        let entities = generate_entities(50, &params(), Some(5));
        for (i, e) in entities.iter().enumerate() {
            assert_eq!(e.index as usize, i);
        }
    }

    #[test]
    fn test_entity_attribute_ranges() {
        let entities = generate_entities(500, &params(), Some(11));
        for e in &entities {
            assert!((0.15..0.45).contains(&e.scale));
            assert!((0.5..1.0).contains(&e.weight));
            assert!((0.0..std::f32::consts::PI).contains(&e.rotation.x));
            assert!((0.0..std::f32::consts::PI).contains(&e.rotation.y));
            assert_eq!(e.rotation.z, 0.0);
            assert!(e.scatter.length() <= 30.0 + 1e-4);
        }
    }

    #[test]
    fn test_entity_spiral_azimuth() {
        let p = params();
        let entities = generate_entities(40, &p, Some(2));
        for e in &entities {
            let r = Vec3::new(e.assembled.x, 0.0, e.assembled.z).length();
            if r < 1e-3 {
                continue;
            }
            let expected = e.index as f32 * p.spiral_step;
            let actual = e.assembled.z.atan2(e.assembled.x);
            let diff = (actual - expected).rem_euclid(std::f32::consts::TAU);
            assert!(diff < 1e-3 || diff > std::f32::consts::TAU - 1e-3);
        }
    }

    #[test]
    fn test_entity_height_respects_margin() {
        let p = params();
        for e in generate_entities(400, &p, Some(3)) {
            assert!(e.assembled.y.abs() <= 6.0 + 1e-4);
        }
    }

    #[test]
    fn test_kind_split_roughly_forty_sixty() {
        let entities = generate_entities(10_000, &params(), Some(17));
        let boxes = entities.iter().filter(|e| e.kind == EntityKind::Box).count();
        let frac = boxes as f32 / entities.len() as f32;
        assert!((frac - 0.4).abs() < 0.03, "box fraction {frac}");
    }

    #[test]
    fn test_palette_bands() {
        let bands = params().palette;
        assert_eq!(bands.pick(0.5), bands.base);
        assert_eq!(bands.pick(0.8), bands.accent);
        assert_eq!(bands.pick(0.95), bands.rare);
    }

    #[test]
    fn test_palette_band_frequencies() {
        let p = params();
        let entities = generate_entities(10_000, &p, Some(23));
        let count = |c: Vec3| entities.iter().filter(|e| e.color == c).count() as f32 / 10_000.0;
        assert!((count(p.palette.base) - 0.7).abs() < 0.03);
        assert!((count(p.palette.accent) - 0.2).abs() < 0.03);
        assert!((count(p.palette.rare) - 0.1).abs() < 0.03);
    }
}
