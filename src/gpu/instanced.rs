//! Render pass for the entity batches: one instanced draw per kind.

use crate::instances::{InstanceBatch, InstanceBatches, InstanceRaw};
use crate::layout::EntityKind;
use bytemuck::Zeroable;
use wgpu::util::DeviceExt;

use super::mesh::{self, Mesh, MeshUniforms, Vertex, MESH_SHADER_WGSL};
use super::{create_vertex_buffer, DEPTH_FORMAT};

/// Geometry for each entity kind.
fn mesh_for(kind: EntityKind) -> Mesh {
    match kind {
        EntityKind::Box => Mesh::cube(1.0),
        EntityKind::Sphere => Mesh::uv_sphere(0.7, 32, 32),
    }
}

struct KindBuffers {
    kind: EntityKind,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    index_count: u32,
    instance_buffer: wgpu::Buffer,
    /// Instances the buffer can hold.
    capacity: usize,
    count: u32,
}

impl KindBuffers {
    fn new(device: &wgpu::Device, kind: EntityKind, capacity: usize) -> Self {
        let mesh = mesh_for(kind);
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Entity Mesh Vertex Buffer"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });

        // index data must be a multiple of four bytes
        let mut indices = mesh.indices.clone();
        if indices.len() % 2 == 1 {
            indices.push(0);
        }
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Entity Mesh Index Buffer"),
            contents: bytemuck::cast_slice(&indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        Self {
            kind,
            vertex_buffer,
            index_buffer,
            index_count: mesh.index_count(),
            instance_buffer: instance_buffer(device, capacity),
            capacity,
            count: 0,
        }
    }

    fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, batch: &InstanceBatch) {
        if batch.len() > self.capacity {
            self.capacity = batch.len();
            self.instance_buffer = instance_buffer(device, self.capacity);
        }
        if !batch.is_empty() {
            queue.write_buffer(&self.instance_buffer, 0, batch.as_bytes());
        }
        self.count = batch.len() as u32;
    }
}

fn instance_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
    let zeroed = vec![InstanceRaw::zeroed(); capacity];
    create_vertex_buffer(device, "Entity Instance Buffer", bytemuck::cast_slice(&zeroed))
}

/// Lit meshes for both entity kinds.
pub(crate) struct InstancedPass {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    kinds: Vec<KindBuffers>,
    /// Generation of the batches last uploaded.
    uploaded: Option<u64>,
}

impl InstancedPass {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, batches: &InstanceBatches) -> Self {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Entity Uniform Buffer"),
            contents: bytemuck::bytes_of(&MeshUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Entity Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Entity Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Entity Shader"),
            source: wgpu::ShaderSource::Wgsl(MESH_SHADER_WGSL.into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Entity Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Entity Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[Vertex::layout(), mesh::instance_layout()],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let kinds = EntityKind::ALL
            .iter()
            .map(|&kind| KindBuffers::new(device, kind, batches.batch(kind).len()))
            .collect();

        Self {
            pipeline,
            uniform_buffer,
            bind_group,
            kinds,
            uploaded: None,
        }
    }

    pub fn write_uniforms(&self, queue: &wgpu::Queue, uniforms: &MeshUniforms) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    /// Copy the batches to the GPU unless this generation is already there.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, batches: &InstanceBatches) {
        if self.uploaded == Some(batches.generation()) {
            return;
        }
        for buffers in &mut self.kinds {
            buffers.upload(device, queue, batches.batch(buffers.kind));
        }
        self.uploaded = Some(batches.generation());
    }

    /// Force the next [`upload`](Self::upload), e.g. after the batches were rebuilt.
    pub fn invalidate(&mut self) {
        self.uploaded = None;
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        for buffers in &self.kinds {
            if buffers.count == 0 {
                continue;
            }
            pass.set_vertex_buffer(0, buffers.vertex_buffer.slice(..));
            pass.set_vertex_buffer(1, buffers.instance_buffer.slice(..));
            pass.set_index_buffer(buffers.index_buffer.slice(..), wgpu::IndexFormat::Uint16);
            pass.draw_indexed(0..buffers.index_count, 0, 0..buffers.count);
        }
    }
}
