//! GPU state for the reference viewer.
//!
//! Draws the entity batches as lit instanced meshes, then the point
//! population as additive sprites evaluated by the WGSL point kernel.

mod camera;
mod instanced;
pub mod mesh;
mod points;

use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3};
use wgpu::util::DeviceExt;
use winit::window::Window;

pub use camera::Camera;

use crate::error::GpuError;
use crate::scene::Scene;
use instanced::InstancedPass;
use mesh::MeshUniforms;
use points::PointPass;

pub(crate) const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Both populations are drawn shifted down so the cone sits in frame.
const SCENE_OFFSET: Vec3 = Vec3::new(0.0, -4.0, 0.0);

const KEY_LIGHT_POSITION: Vec3 = Vec3::new(10.0, 10.0, 10.0);
const FILL_LIGHT_POSITION: Vec3 = Vec3::new(-10.0, -5.0, -10.0);
const AMBIENT: f32 = 0.2;
const KEY_INTENSITY: f32 = 1.5;
const FILL_INTENSITY: f32 = 1.0;

pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    depth_texture: wgpu::TextureView,
    points: PointPass,
    entities: InstancedPass,
    clear_color: wgpu::Color,
    pub camera: Camera,
}

impl GpuState {
    pub async fn new(window: Arc<Window>, scene: &Scene) -> Result<Self, GpuError> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        tracing::info!(adapter = ?adapter.get_info().name, "Selected GPU adapter");

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .ok_or(GpuError::NoSurfaceFormat)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = create_depth_texture(&device, &config);
        let points = PointPass::new(&device, config.format, scene.points());
        let entities = InstancedPass::new(&device, config.format, scene.batches());

        let background = scene.palette().background;
        let clear_color = wgpu::Color {
            r: background.x as f64,
            g: background.y as f64,
            b: background.z as f64,
            a: 1.0,
        };

        tracing::info!(
            format = ?config.format,
            points = points.count(),
            entities = scene.entities().len(),
            "GPU initialized"
        );

        Ok(Self {
            surface,
            device,
            queue,
            config,
            depth_texture,
            points,
            entities,
            clear_color,
            camera: Camera::new(),
        })
    }

    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>) {
        if new_size.width > 0 && new_size.height > 0 {
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = create_depth_texture(&self.device, &self.config);
        }
    }

    /// Re-upload the static point arrays after the population changed.
    pub fn reload_points(&mut self, scene: &Scene) {
        self.points.set_field(&self.device, scene.points());
    }

    /// Force the entity batches to be uploaded on the next render.
    pub fn reload_entities(&mut self) {
        self.entities.invalidate();
    }

    fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height as f32
    }

    fn write_uniforms(&self, scene: &Scene) {
        let model = Mat4::from_translation(SCENE_OFFSET);
        let view = self.camera.view_matrix();
        let projection = self.camera.projection(self.aspect());
        let viewport = Vec2::new(self.config.width as f32, self.config.height as f32);

        let field = scene
            .field_params()
            .with_model_view(view * model)
            .to_uniforms(projection, viewport);
        self.points.write_uniforms(&self.queue, &field);

        let palette = scene.palette();
        let mesh = MeshUniforms {
            view_proj: (projection * view).to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            camera_position: self.camera.position().extend(1.0).to_array(),
            key_direction: KEY_LIGHT_POSITION.normalize().extend(0.0).to_array(),
            key_color: (palette.light * KEY_INTENSITY).extend(1.0).to_array(),
            fill_direction: FILL_LIGHT_POSITION.normalize().extend(0.0).to_array(),
            fill_color: (palette.emerald * FILL_INTENSITY).extend(1.0).to_array(),
            ambient: Vec3::splat(AMBIENT).extend(1.0).to_array(),
        };
        self.entities.write_uniforms(&self.queue, &mesh);
    }

    pub fn render(&mut self, scene: &Scene) -> Result<(), wgpu::SurfaceError> {
        self.write_uniforms(scene);
        self.entities
            .upload(&self.device, &self.queue, scene.batches());

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            // opaque meshes first so the sprites depth-test against them
            self.entities.draw(&mut render_pass);
            self.points.draw(&mut render_pass);
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

/// Vertex buffer holding `contents`; never zero-sized.
pub(crate) fn create_vertex_buffer(device: &wgpu::Device, label: &str, contents: &[u8]) -> wgpu::Buffer {
    if contents.is_empty() {
        return device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: 16,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
    }
    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
    })
}

fn create_depth_texture(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}
