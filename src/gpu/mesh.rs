//! Meshes and shader for the instanced entity batches.

use bytemuck::{Pod, Zeroable};
use std::f32::consts::{PI, TAU};

/// Mesh vertex: position and unit normal.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub const ATTRIBUTES: [wgpu::VertexAttribute; 2] =
        wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// Per-instance layout matching [`crate::instances::InstanceRaw`]: four
/// model-matrix columns then the color.
pub const INSTANCE_ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
    2 => Float32x4,
    3 => Float32x4,
    4 => Float32x4,
    5 => Float32x4,
    6 => Float32x4,
];

pub fn instance_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<crate::instances::InstanceRaw>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &INSTANCE_ATTRIBUTES,
    }
}

/// Indexed triangle list.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl Mesh {
    /// Axis-aligned cube with edge length `size`, flat-shaded.
    pub fn cube(size: f32) -> Self {
        let h = size / 2.0;
        // (normal, tangent u, tangent v) per face, with u × v = normal
        let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
            ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
            ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
            ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
            ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
            ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
            ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
        ];

        let mut mesh = Mesh::default();
        for (n, u, v) in faces {
            let base = mesh.vertices.len() as u16;
            for (su, sv) in [(-1.0, -1.0), (1.0, -1.0), (1.0, 1.0), (-1.0, 1.0)] {
                let position = [0, 1, 2].map(|k| (n[k] + su * u[k] + sv * v[k]) * h);
                mesh.vertices.push(Vertex {
                    position,
                    normal: n,
                });
            }
            mesh.indices
                .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        mesh
    }

    /// Latitude/longitude sphere.
    pub fn uv_sphere(radius: f32, segments: u16, rings: u16) -> Self {
        let segments = segments.max(3);
        let rings = rings.max(2);
        let mut mesh = Mesh::default();

        for ring in 0..=rings {
            let phi = ring as f32 / rings as f32 * PI;
            for seg in 0..=segments {
                let theta = seg as f32 / segments as f32 * TAU;
                let normal = [phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin()];
                mesh.vertices.push(Vertex {
                    position: normal.map(|c| c * radius),
                    normal,
                });
            }
        }

        let stride = segments + 1;
        for ring in 0..rings {
            for seg in 0..segments {
                let a = ring * stride + seg;
                let b = a + stride;
                mesh.indices
                    .extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
            }
        }
        mesh
    }

    pub fn index_count(&self) -> u32 {
        self.indices.len() as u32
    }
}

/// Camera and lighting shared by the mesh pipeline.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct MeshUniforms {
    pub view_proj: [[f32; 4]; 4],
    /// Translation applied to every instance before the camera.
    pub model: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    /// Direction toward the key light, and its color.
    pub key_direction: [f32; 4],
    pub key_color: [f32; 4],
    pub fill_direction: [f32; 4],
    pub fill_color: [f32; 4],
    /// rgb ambient, w unused.
    pub ambient: [f32; 4],
}

/// Lit instanced mesh shader.
pub const MESH_SHADER_WGSL: &str = r#"
struct MeshUniforms {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    camera_position: vec4<f32>,
    key_direction: vec4<f32>,
    key_color: vec4<f32>,
    fill_direction: vec4<f32>,
    fill_color: vec4<f32>,
    ambient: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: MeshUniforms;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) color: vec4<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec3<f32>,
};

@vertex
fn vs_main(vert: VertexInput, inst: InstanceInput) -> VertexOutput {
    let instance_model = mat4x4<f32>(
        inst.model_0,
        inst.model_1,
        inst.model_2,
        inst.model_3,
    );
    let model = uniforms.model * instance_model;
    let world = model * vec4<f32>(vert.position, 1.0);

    var out: VertexOutput;
    out.clip_position = uniforms.view_proj * world;
    out.world_position = world.xyz;
    // uniform scale, so the model matrix can transform normals directly
    out.normal = (model * vec4<f32>(vert.normal, 0.0)).xyz;
    out.color = inst.color.rgb;
    return out;
}

fn shade_light(n: vec3<f32>, v: vec3<f32>, l: vec3<f32>, color: vec3<f32>) -> vec3<f32> {
    let diffuse = max(dot(n, l), 0.0);
    let h = normalize(l + v);
    let specular = pow(max(dot(n, h), 0.0), 48.0);
    return color * (diffuse + specular);
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let n = normalize(in.normal);
    let v = normalize(uniforms.camera_position.xyz - in.world_position);

    let key = shade_light(n, v, normalize(uniforms.key_direction.xyz), uniforms.key_color.rgb);
    let fill = shade_light(n, v, normalize(uniforms.fill_direction.xyz), uniforms.fill_color.rgb);

    let lit = in.color * (uniforms.ambient.rgb + key + fill);
    return vec4<f32>(lit, 1.0);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn test_mesh_shader_is_valid_wgsl() {
        if let Err(e) = validate_wgsl(MESH_SHADER_WGSL) {
            panic!("Mesh shader failed validation:\n{}", e);
        }
    }

    #[test]
    fn test_cube_counts_and_extent() {
        let cube = Mesh::cube(1.0);
        assert_eq!(cube.vertices.len(), 24);
        assert_eq!(cube.index_count(), 36);
        for v in &cube.vertices {
            for c in v.position {
                assert!((c.abs() - 0.5).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_cube_winding_faces_out() {
        let cube = Mesh::cube(2.0);
        for tri in cube.indices.chunks(3) {
            let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| glam::Vec3::from(cube.vertices[i as usize].position));
            let face_normal = (b - a).cross(c - a);
            let n = glam::Vec3::from(cube.vertices[tri[0] as usize].normal);
            assert!(face_normal.dot(n) > 0.0);
        }
    }

    #[test]
    fn test_sphere_vertices_on_radius() {
        let sphere = Mesh::uv_sphere(0.7, 32, 32);
        assert_eq!(sphere.vertices.len(), 33 * 33);
        assert_eq!(sphere.index_count(), 32 * 32 * 6);
        for v in &sphere.vertices {
            let p = glam::Vec3::from(v.position);
            assert!((p.length() - 0.7).abs() < 1e-5);
        }
        let max = *sphere.indices.iter().max().unwrap() as usize;
        assert!(max < sphere.vertices.len());
    }

    #[test]
    fn test_uniform_sizes() {
        assert_eq!(std::mem::size_of::<MeshUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<Vertex>(), 24);
    }
}
