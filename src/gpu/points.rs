//! Render pass for the point population.

use crate::field::{FieldUniforms, POINT_SHADER_WGSL};
use crate::layout::PointField;
use bytemuck::Zeroable;
use wgpu::util::DeviceExt;

use super::{create_vertex_buffer, DEPTH_FORMAT};

/// Alpha-weighted additive blending; overlapping sprites brighten.
const ADDITIVE: wgpu::BlendState = wgpu::BlendState {
    color: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
    alpha: wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::One,
        operation: wgpu::BlendOperation::Add,
    },
};

/// Static point arrays on the GPU plus the kernel pipeline.
pub(crate) struct PointPass {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    scatter_buffer: wgpu::Buffer,
    assembled_buffer: wgpu::Buffer,
    random_buffer: wgpu::Buffer,
    count: u32,
}

impl PointPass {
    pub fn new(device: &wgpu::Device, format: wgpu::TextureFormat, field: &PointField) -> Self {
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Point Uniform Buffer"),
            contents: bytemuck::bytes_of(&FieldUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Point Bind Group Layout"),
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
            label: Some("Point Bind Group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Point Shader"),
            source: wgpu::ShaderSource::Wgsl(POINT_SHADER_WGSL.into()),
        });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Point Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let scatter_attr = wgpu::vertex_attr_array![0 => Float32x3];
        let assembled_attr = wgpu::vertex_attr_array![1 => Float32x3];
        let random_attr = wgpu::vertex_attr_array![2 => Float32];

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Point Pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: 12,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &scatter_attr,
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: 12,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &assembled_attr,
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: 4,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &random_attr,
                    },
                ],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(ADDITIVE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            // sprites are tested against the meshes but never occlude each other
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: false,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let (scatter_buffer, assembled_buffer, random_buffer) = field_buffers(device, field);

        Self {
            pipeline,
            uniform_buffer,
            bind_group,
            scatter_buffer,
            assembled_buffer,
            random_buffer,
            count: field.len() as u32,
        }
    }

    /// Replace the static arrays, e.g. after the population was resized.
    pub fn set_field(&mut self, device: &wgpu::Device, field: &PointField) {
        let (scatter, assembled, random) = field_buffers(device, field);
        self.scatter_buffer = scatter;
        self.assembled_buffer = assembled;
        self.random_buffer = random;
        self.count = field.len() as u32;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn write_uniforms(&self, queue: &wgpu::Queue, uniforms: &FieldUniforms) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(uniforms));
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        if self.count == 0 {
            return;
        }
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.set_vertex_buffer(0, self.scatter_buffer.slice(..));
        pass.set_vertex_buffer(1, self.assembled_buffer.slice(..));
        pass.set_vertex_buffer(2, self.random_buffer.slice(..));
        pass.draw(0..6, 0..self.count);
    }
}

fn field_buffers(device: &wgpu::Device, field: &PointField) -> (wgpu::Buffer, wgpu::Buffer, wgpu::Buffer) {
    (
        create_vertex_buffer(device, "Point Scatter Buffer", bytemuck::cast_slice(field.scatter())),
        create_vertex_buffer(device, "Point Assembled Buffer", bytemuck::cast_slice(field.assembled())),
        create_vertex_buffer(device, "Point Random Buffer", bytemuck::cast_slice(field.random())),
    )
}
