//! Windowed reference host.
//!
//! Owns the window, the GPU state and the frame clock, drives
//! [`Scene::frame`] once per redraw and maps input to the toggle.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::error::ViewerError;
use crate::gpu::GpuState;
use crate::input::{Action, Controls};
use crate::scene::Scene;
use crate::time::FrameClock;
use crate::transition::Target;

const MAX_POINTS: usize = 1_000_000;
const MIN_GROWN_POINTS: usize = 1_000;
const MAX_ENTITIES: usize = 20_000;
const MIN_GROWN_ENTITIES: usize = 10;

/// Open a window and run `scene` until it is closed.
pub fn run(scene: Scene) -> Result<(), ViewerError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut viewer = Viewer::new(scene);
    event_loop.run_app(&mut viewer)?;

    match viewer.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct Viewer {
    scene: Scene,
    window: Option<Arc<Window>>,
    gpu: Option<GpuState>,
    controls: Controls,
    clock: FrameClock,
    auto_rotate: bool,
    /// First fatal error; reported once the event loop returns.
    error: Option<ViewerError>,
}

impl Viewer {
    fn new(scene: Scene) -> Self {
        Self {
            scene,
            window: None,
            gpu: None,
            controls: Controls::new(),
            clock: FrameClock::new(),
            auto_rotate: true,
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), ViewerError> {
        let window_attrs = Window::default_attributes()
            .with_title("arbor")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu = pollster::block_on(GpuState::new(window.clone(), &self.scene))?;
        self.window = Some(window);
        self.gpu = Some(gpu);
        Ok(())
    }

    fn apply(&mut self, action: Action, event_loop: &ActiveEventLoop) {
        match action {
            Action::ToggleTarget => {
                let target = self.scene.toggle();
                tracing::info!(?target, "Toggled");
            }
            Action::TogglePause => self.clock.toggle_pause(),
            Action::ToggleAutoRotate => self.auto_rotate = !self.auto_rotate,
            Action::GrowPoints => {
                let count = (self.scene.points().len() * 2).clamp(MIN_GROWN_POINTS, MAX_POINTS);
                self.resize_points(count);
            }
            Action::ShrinkPoints => self.resize_points(self.scene.points().len() / 2),
            Action::GrowEntities => {
                let count =
                    (self.scene.entities().len() * 2).clamp(MIN_GROWN_ENTITIES, MAX_ENTITIES);
                self.resize_entities(count);
            }
            Action::ShrinkEntities => self.resize_entities(self.scene.entities().len() / 2),
            Action::Quit => event_loop.exit(),
        }
    }

    fn resize_points(&mut self, count: usize) {
        if let Err(err) = self.scene.resize_points(count) {
            tracing::warn!(%err, "Could not resize point population");
            return;
        }
        if let Some(gpu) = &mut self.gpu {
            gpu.reload_points(&self.scene);
        }
    }

    fn resize_entities(&mut self, count: usize) {
        if let Err(err) = self.scene.resize_entities(count) {
            tracing::warn!(%err, "Could not resize entity population");
            return;
        }
        if let Some(gpu) = &mut self.gpu {
            gpu.reload_entities();
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let actions: Vec<Action> = self.controls.take_actions().collect();
        for action in actions {
            self.apply(action, event_loop);
        }

        let (elapsed, delta) = self.clock.tick();
        self.scene.frame(elapsed, delta);

        let Some(gpu) = &mut self.gpu else {
            return;
        };

        let (drag, scroll) = self.controls.take_motion();
        gpu.camera.orbit(drag.x, drag.y);
        gpu.camera.zoom(scroll);
        if self.auto_rotate && self.scene.target() == Target::Assembled {
            gpu.camera.auto_rotate(delta);
        }

        match gpu.render(&self.scene) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.resize(winit::dpi::PhysicalSize {
                    width: gpu.config.width,
                    height: gpu.config.height,
                })
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                tracing::error!("GPU out of memory");
                event_loop.exit();
            }
            Err(err) => tracing::warn!(?err, "Render error"),
        }
    }
}

impl ApplicationHandler for Viewer {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.init(event_loop) {
            tracing::error!(%err, "Viewer initialization failed");
            self.error = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(physical_size);
                }
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            other => self.controls.handle_event(&other),
        }
    }
}
