//! # Arbor - dual-state particle morphing
//!
//! Two procedurally generated populations, a large cloud of points and a few
//! hundred lit meshes, morph between a scattered sphere and an assembled cone
//! under one damped progress value.
//!
//! ## Quick Start
//!
//! ```ignore
//! use arbor::prelude::*;
//!
//! let mut scene = Scene::new(Settings::default(), Some(7))?;
//! scene.set_target(Target::Assembled);
//!
//! let mut clock = FrameClock::new();
//! loop {
//!     let (elapsed, delta) = clock.tick();
//!     let batches = scene.frame(elapsed, delta);
//!     // upload `batches` and draw the points with `scene.field_params()`
//! }
//! ```
//!
//! ## Pieces
//!
//! - [`layout`]: scatter and cone samples for both populations, generated once.
//! - [`transition`]: frame-rate independent exponential damping of progress.
//! - [`instances`]: per-frame transforms and colors of the entities, written
//!   into reusable GPU-ready batches.
//! - [`field`]: the per-point kernel, on the CPU (sequential or rayon) and as
//!   WGSL for the GPU.
//! - [`scene`]: owns all of the above; the one object a host drives.
//!
//! The `arbor` binary is a small `wgpu` viewer around a [`Scene`]: Space
//! toggles between the two states, drag to orbit, scroll to zoom.
//!
//! ## Randomness
//!
//! Generation is deterministic for a given seed. `None` seeds from OS entropy.
//!
//! ## Logging
//!
//! The library emits [`tracing`] events (generation, target changes, settings
//! and GPU setup); install a subscriber to see them.

pub mod color;
pub mod config;
pub mod error;
pub mod field;
mod gpu;
pub mod input;
pub mod instances;
pub mod layout;
pub mod scene;
mod spawn;
pub mod time;
pub mod transition;
pub mod viewer;

pub use bytemuck;
pub use config::{Palette, Settings};
pub use error::{ConfigError, GpuError, SettingsError, ViewerError};
pub use field::{FieldParams, FieldUniforms, PointKernel, PointSample};
pub use glam::{Vec2, Vec3, Vec4};
pub use gpu::Camera;
pub use instances::{InstanceBatch, InstanceBatches, InstanceRaw};
pub use layout::{Entity, EntityKind, PointField};
pub use scene::Scene;
pub use spawn::SpawnContext;
pub use time::FrameClock;
pub use transition::{Target, TransitionState};

/// Convenient re-exports for common usage.
pub mod prelude {
    pub use crate::config::{Palette, Settings};
    pub use crate::error::{ConfigError, SettingsError};
    pub use crate::field::{
        evaluate_field, evaluate_field_par, evaluate_point, FieldParams, ParallelKernel, PointKernel,
        PointSample, SequentialKernel,
    };
    pub use crate::instances::{InstanceBatches, InstanceRaw};
    pub use crate::layout::{generate_entities, Entity, EntityKind, EntityParams, PointField};
    pub use crate::scene::Scene;
    pub use crate::time::FrameClock;
    pub use crate::transition::{damp, Target, TransitionState};
    pub use crate::{Vec2, Vec3, Vec4};
}
