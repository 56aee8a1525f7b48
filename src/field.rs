//! Per-point evaluation of the homogeneous population.
//!
//! The same procedure exists twice: as Rust ([`evaluate_point`],
//! [`shade_fragment`]) and as WGSL ([`POINT_SHADER_WGSL`]) for the viewer.
//! Both read the static point arrays plus one [`FieldParams`] per frame and
//! share no other state, so every point can be evaluated independently.
//!
//! # Per-point procedure
//!
//! ```text
//! scattered   = scatter + (cos(0.3T + 5r)·0.2, sin(0.5T + 10r)·0.5, 0)
//! formed      = assembled + outward · sin(1.5T + 0.5·assembled.y)·0.05
//! position    = mix(scattered, formed, mix)
//! size        = (40r + 20) / depth · mix(1, 0.6, mix)
//! base color  = mix(deep, light, 0.3r)
//! ```
//!
//! `outward` is the horizontal direction away from the cone axis.

use crate::config::Palette;
use crate::layout::PointField;
use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec2, Vec3, Vec4};
use rayon::prelude::*;

/// Points closer to the eye than this (or behind it) get size zero.
pub const DEPTH_EPSILON: f32 = 1e-4;

const GLOW_COLOR: Vec3 = Vec3::new(1.0, 0.9, 0.5);

/// Shared per-frame inputs of the point kernel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldParams {
    /// Transition progress in `[0, 1]`.
    pub mix: f32,
    /// Elapsed seconds.
    pub time: f32,
    pub color_deep: Vec3,
    pub color_light: Vec3,
    /// Object-to-view transform; depth is `-z` of the view-space position.
    pub model_view: Mat4,
}

impl FieldParams {
    pub fn new(mix: f32, time: f32, palette: &Palette) -> Self {
        Self {
            mix,
            time,
            color_deep: palette.deep,
            color_light: palette.light,
            model_view: Mat4::IDENTITY,
        }
    }

    pub fn with_model_view(mut self, model_view: Mat4) -> Self {
        self.model_view = model_view;
        self
    }

    /// Uniform block for [`POINT_SHADER_WGSL`]. `viewport` is in pixels.
    pub fn to_uniforms(&self, projection: Mat4, viewport: Vec2) -> FieldUniforms {
        FieldUniforms {
            model_view: self.model_view.to_cols_array_2d(),
            projection: projection.to_cols_array_2d(),
            color_deep: self.color_deep.extend(1.0).to_array(),
            color_light: self.color_light.extend(1.0).to_array(),
            mix: self.mix,
            time: self.time,
            viewport: viewport.max(Vec2::ONE).to_array(),
        }
    }
}

/// GPU mirror of [`FieldParams`]. Layout matches `FieldUniforms` in the WGSL.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FieldUniforms {
    pub model_view: [[f32; 4]; 4],
    pub projection: [[f32; 4]; 4],
    pub color_deep: [f32; 4],
    pub color_light: [f32; 4],
    pub mix: f32,
    pub time: f32,
    pub viewport: [f32; 2],
}

/// Result of evaluating one point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointSample {
    /// Object-space position.
    pub position: Vec3,
    /// Sprite diameter in pixels.
    pub size: f32,
    /// Linear RGB before radial shading.
    pub color: Vec3,
}

/// Horizontal unit vector pointing away from the cone axis; zero on the axis.
#[inline]
pub fn outward_normal(p: Vec3) -> Vec3 {
    Vec3::new(p.x, 0.0, p.z).normalize_or_zero()
}

/// Evaluate one point for the current frame.
pub fn evaluate_point(scatter: Vec3, assembled: Vec3, random: f32, params: &FieldParams) -> PointSample {
    let t = params.time;
    let m = params.mix;

    let mut scattered = scatter;
    scattered.y += (t * 0.5 + random * 10.0).sin() * 0.5;
    scattered.x += (t * 0.3 + random * 5.0).cos() * 0.2;

    let breath = (t * 1.5 + assembled.y * 0.5).sin() * 0.05;
    let formed = assembled + outward_normal(assembled) * breath;

    let position = scattered * (1.0 - m) + formed * m;

    let depth = -params.model_view.transform_point3(position).z;
    let size = if depth > DEPTH_EPSILON {
        (40.0 * random + 20.0) / depth * mix_f32(1.0, 0.6, m)
    } else {
        0.0
    };

    PointSample {
        position,
        size,
        color: params.color_deep.lerp(params.color_light, random * 0.3),
    }
}

/// Radial sprite shading. `point_coord` is in `[0, 1]²` across the sprite.
///
/// Returns `None` outside the inscribed circle; otherwise RGBA with alpha
/// equal to the radial strength.
pub fn shade_fragment(base_color: Vec3, point_coord: Vec2, params: &FieldParams) -> Option<Vec4> {
    let d = (point_coord - Vec2::splat(0.5)).length();
    if d > 0.5 {
        return None;
    }
    let strength = (1.0 - d * 2.0).powf(1.5);
    let glow = GLOW_COLOR.lerp(params.color_deep, params.mix * 0.8);
    let color = glow.lerp(base_color, strength);
    Some(color.extend(strength))
}

#[inline]
fn mix_f32(a: f32, b: f32, t: f32) -> f32 {
    a * (1.0 - t) + b * t
}

/// A way of running [`evaluate_point`] over a whole field.
///
/// Implementations must produce exactly `evaluate_point(scatter[i],
/// assembled[i], random[i], params)` at `out[i]`. The output vector is
/// reused across frames.
pub trait PointKernel {
    fn evaluate(&self, field: &PointField, params: &FieldParams, out: &mut Vec<PointSample>);
}

/// Plain loop on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialKernel;

/// Data-parallel over the rayon thread pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParallelKernel;

impl PointKernel for SequentialKernel {
    fn evaluate(&self, field: &PointField, params: &FieldParams, out: &mut Vec<PointSample>) {
        evaluate_field(field, params, out);
    }
}

impl PointKernel for ParallelKernel {
    fn evaluate(&self, field: &PointField, params: &FieldParams, out: &mut Vec<PointSample>) {
        evaluate_field_par(field, params, out);
    }
}

pub fn evaluate_field(field: &PointField, params: &FieldParams, out: &mut Vec<PointSample>) {
    out.clear();
    out.extend(
        field
            .scatter()
            .iter()
            .zip(field.assembled())
            .zip(field.random())
            .map(|((&s, &a), &r)| evaluate_point(s, a, r, params)),
    );
}

pub fn evaluate_field_par(field: &PointField, params: &FieldParams, out: &mut Vec<PointSample>) {
    out.resize(field.len(), PointSample::default());
    let (scatter, assembled, random) = (field.scatter(), field.assembled(), field.random());
    out.par_iter_mut().enumerate().for_each(|(i, sample)| {
        *sample = evaluate_point(scatter[i], assembled[i], random[i], params);
    });
}

/// Render shader for the point population.
///
/// Each point is one instance of a six-vertex quad. Per-instance vertex
/// buffers: `@location(0)` scatter, `@location(1)` assembled, `@location(2)`
/// random. Uniforms at `@group(0) @binding(0)`. Meant for additive blending
/// with depth writes off.
pub const POINT_SHADER_WGSL: &str = r#"
const DEPTH_EPSILON: f32 = 0.0001;

struct FieldUniforms {
    model_view: mat4x4<f32>,
    projection: mat4x4<f32>,
    color_deep: vec4<f32>,
    color_light: vec4<f32>,
    mix_factor: f32,
    time: f32,
    viewport: vec2<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: FieldUniforms;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) point_coord: vec2<f32>,
    @location(1) base_color: vec3<f32>,
};

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) scatter: vec3<f32>,
    @location(1) assembled: vec3<f32>,
    @location(2) rnd: f32,
) -> VertexOutput {
    let t = uniforms.time;
    let m = uniforms.mix_factor;

    var scattered = scatter;
    scattered.y += sin(t * 0.5 + rnd * 10.0) * 0.5;
    scattered.x += cos(t * 0.3 + rnd * 5.0) * 0.2;

    let horizontal = vec3<f32>(assembled.x, 0.0, assembled.z);
    let radial = length(horizontal);
    var outward = vec3<f32>(0.0, 0.0, 0.0);
    if (radial > 0.0) {
        outward = horizontal / radial;
    }
    let breath = sin(t * 1.5 + assembled.y * 0.5) * 0.05;
    let formed = assembled + outward * breath;

    let position = mix(scattered, formed, m);
    let view = uniforms.model_view * vec4<f32>(position, 1.0);

    let depth = -view.z;
    var size = 0.0;
    if (depth > DEPTH_EPSILON) {
        size = (40.0 * rnd + 20.0) / depth * mix(1.0, 0.6, m);
    }

    var corners = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, -1.0),
        vec2<f32>(1.0, 1.0),
        vec2<f32>(-1.0, 1.0),
    );
    let corner = corners[vertex_index % 6u];

    // size is a diameter in pixels, so the half extent in NDC is size / viewport
    let clip = uniforms.projection * view;
    let offset = corner * size / uniforms.viewport * clip.w;

    var out: VertexOutput;
    out.clip_position = vec4<f32>(clip.xy + offset, clip.zw);
    out.point_coord = corner * 0.5 + vec2<f32>(0.5, 0.5);
    out.base_color = mix(uniforms.color_deep.rgb, uniforms.color_light.rgb, rnd * 0.3);
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let d = length(in.point_coord - vec2<f32>(0.5, 0.5));
    if (d > 0.5) {
        discard;
    }
    let strength = pow(1.0 - d * 2.0, 1.5);
    let glow = mix(vec3<f32>(1.0, 0.9, 0.5), uniforms.color_deep.rgb, uniforms.mix_factor * 0.8);
    let color = mix(glow, in.base_color, strength);
    return vec4<f32>(color, strength);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    /// Validates WGSL code using naga.
    fn validate_wgsl(code: &str) -> Result<(), String> {
        let module = naga::front::wgsl::parse_str(code)
            .map_err(|e| format!("WGSL parse error: {:?}", e))?;

        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator
            .validate(&module)
            .map_err(|e| format!("WGSL validation error: {:?}", e))?;

        Ok(())
    }

    fn params(mix: f32, time: f32) -> FieldParams {
        let palette = Settings::default().palette().unwrap();
        let view = Mat4::look_at_rh(Vec3::new(0.0, 0.0, 40.0), Vec3::ZERO, Vec3::Y);
        FieldParams::new(mix, time, &palette).with_model_view(view)
    }

    fn field(n: usize) -> PointField {
        let settings = Settings {
            point_count: n,
            ..Settings::default()
        };
        PointField::from_settings(&settings, Some(31)).unwrap()
    }

    #[test]
    fn test_point_shader_is_valid_wgsl() {
        if let Err(e) = validate_wgsl(POINT_SHADER_WGSL) {
            panic!("Point shader failed validation:\n{}", e);
        }
    }

    #[test]
    fn test_uniform_layout() {
        assert_eq!(std::mem::size_of::<FieldUniforms>(), 176);
        assert_eq!(std::mem::size_of::<FieldUniforms>() % 16, 0);
    }

    #[test]
    fn test_scattered_side_noise() {
        let p = params(0.0, 2.0);
        let s = Vec3::new(1.0, 2.0, 3.0);
        let r = 0.4;
        let sample = evaluate_point(s, Vec3::ZERO, r, &p);
        assert!((sample.position.x - (1.0 + (0.6f32 + 2.0).cos() * 0.2)).abs() < 1e-5);
        assert!((sample.position.y - (2.0 + (1.0f32 + 4.0).sin() * 0.5)).abs() < 1e-5);
        assert_eq!(sample.position.z, 3.0);
    }

    #[test]
    fn test_assembled_side_breathes_outward() {
        let p = params(1.0, 0.7);
        let a = Vec3::new(3.0, 1.0, 4.0);
        let sample = evaluate_point(Vec3::ZERO, a, 0.2, &p);
        let breath = (0.7f32 * 1.5 + 0.5).sin() * 0.05;
        let expected = a + Vec3::new(0.6, 0.0, 0.8) * breath;
        assert!((sample.position - expected).length() < 1e-5);
    }

    #[test]
    fn test_axis_point_does_not_breathe() {
        let p = params(1.0, 3.3);
        let a = Vec3::new(0.0, 2.0, 0.0);
        let sample = evaluate_point(Vec3::ZERO, a, 0.5, &p);
        assert_eq!(sample.position, a);
        assert_eq!(outward_normal(a), Vec3::ZERO);
    }

    #[test]
    fn test_size_attenuates_with_depth_and_mix() {
        let near = evaluate_point(Vec3::new(0.0, 0.0, 20.0), Vec3::ZERO, 0.5, &params(0.0, 0.0));
        let far = evaluate_point(Vec3::new(0.0, 0.0, -20.0), Vec3::ZERO, 0.5, &params(0.0, 0.0));
        assert!(near.size > far.size);

        // depth 40 at the origin, mix 1 shrinks to 0.6
        let sample = evaluate_point(Vec3::ZERO, Vec3::ZERO, 0.5, &params(1.0, 0.0));
        assert!((sample.size - 40.0 / 40.0 * 0.6).abs() < 1e-4);
    }

    #[test]
    fn test_points_behind_eye_have_zero_size() {
        let p = params(0.0, 0.0);
        let behind = evaluate_point(Vec3::new(0.0, 0.0, 60.0), Vec3::ZERO, 0.5, &p);
        assert_eq!(behind.size, 0.0);
        let at_eye = evaluate_point(Vec3::new(0.0, 0.0, 40.0), Vec3::ZERO, 0.0, &p);
        assert_eq!(at_eye.size, 0.0);
    }

    #[test]
    fn test_base_color_blend() {
        let p = params(0.0, 0.0);
        let sample = evaluate_point(Vec3::ZERO, Vec3::ZERO, 0.0, &p);
        assert_eq!(sample.color, p.color_deep);
    }

    #[test]
    fn test_shade_fragment_discards_outside_circle() {
        let p = params(0.5, 0.0);
        assert!(shade_fragment(Vec3::ONE, Vec2::new(0.0, 0.0), &p).is_none());
        assert!(shade_fragment(Vec3::ONE, Vec2::new(1.0, 0.5), &p).is_some());
    }

    #[test]
    fn test_shade_fragment_center_is_base_color() {
        let p = params(0.3, 0.0);
        let base = Vec3::new(0.2, 0.4, 0.1);
        let rgba = shade_fragment(base, Vec2::splat(0.5), &p).unwrap();
        assert!((rgba.truncate() - base).length() < 1e-6);
        assert_eq!(rgba.w, 1.0);
    }

    #[test]
    fn test_shade_fragment_rim_is_glow() {
        let p = params(0.0, 0.0);
        let rgba = shade_fragment(Vec3::ZERO, Vec2::new(1.0, 0.5), &p).unwrap();
        assert!(rgba.w.abs() < 1e-6);
        assert!((rgba.truncate() - GLOW_COLOR).length() < 1e-5);
    }

    #[test]
    fn test_kernels_agree() {
        let f = field(2_000);
        let p = params(0.37, 5.5);
        let mut seq = Vec::new();
        let mut par = Vec::new();
        SequentialKernel.evaluate(&f, &p, &mut seq);
        ParallelKernel.evaluate(&f, &p, &mut par);
        assert_eq!(seq.len(), 2_000);
        assert_eq!(seq, par);
        assert_eq!(seq[17], evaluate_point(f.scatter()[17], f.assembled()[17], f.random()[17], &p));
    }

    #[test]
    fn test_kernel_output_shrinks_with_field() {
        let mut out = Vec::new();
        evaluate_field_par(&field(100), &params(0.5, 1.0), &mut out);
        assert_eq!(out.len(), 100);
        evaluate_field_par(&field(10), &params(0.5, 1.0), &mut out);
        assert_eq!(out.len(), 10);
        evaluate_field(&field(0), &params(0.5, 1.0), &mut out);
        assert!(out.is_empty());
    }
}
