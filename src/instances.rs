//! Per-frame transforms and colors for the entity population.
//!
//! Each frame every entity's pose is recomputed from its static record, the
//! shared progress `t` and the elapsed time `T`:
//!
//! | Step | Formula |
//! |------|---------|
//! | Blend | `scatter·(1-t) + assembled·t` |
//! | Float (`t < 0.95`) | `y += sin(T·weight + index) · 0.05 · (1-t)·weight` |
//! | Spin (`t < 0.95`) | `rotation += (T·0.2, T·0.1, 0) · (1-t)·weight` |
//! | Pulse | `scale · (0.8 + 0.2·sin(2T + index))` |
//! | Glow | HSL lightness `+ sin(t·π) · 2.0 · 0.1` |
//!
//! Results go into pre-allocated [`InstanceBatch`]es, one per [`EntityKind`],
//! overwritten in place every frame.

use crate::color;
use crate::layout::{Entity, EntityKind};
use bytemuck::{Pod, Zeroable};
use glam::{EulerRot, Mat4, Quat, Vec3};
use std::f32::consts::PI;

/// Above this progress, entities stop floating and spinning.
pub const JITTER_CUTOFF: f32 = 0.95;

const FLOAT_AMPLITUDE: f32 = 0.05;
const SPIN_RATE: Vec3 = Vec3::new(0.2, 0.1, 0.0);
const GLOW_ENERGY: f32 = 2.0;
const GLOW_LIGHTNESS: f32 = 0.1;

/// One entity's derived pose for a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InstancePose {
    pub position: Vec3,
    /// Euler angles, XYZ order.
    pub rotation: Vec3,
    pub scale: f32,
    /// Linear RGB.
    pub color: Vec3,
}

impl InstancePose {
    /// Scale, then rotate, then translate.
    pub fn matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(
            EulerRot::XYZ,
            self.rotation.x,
            self.rotation.y,
            self.rotation.z,
        );
        Mat4::from_scale_rotation_translation(Vec3::splat(self.scale), rotation, self.position)
    }

    pub fn to_raw(&self) -> InstanceRaw {
        InstanceRaw {
            model: self.matrix().to_cols_array_2d(),
            color: self.color.extend(1.0).to_array(),
        }
    }
}

/// Linear blend of the two static positions.
///
/// Written as `a·(1-t) + b·t` so both endpoints are reproduced exactly.
#[inline]
pub fn blend_position(entity: &Entity, t: f32) -> Vec3 {
    entity.scatter * (1.0 - t) + entity.assembled * t
}

/// Lightness offset applied to the base color; peaks at `t = 0.5`.
#[inline]
pub fn brightness_offset(t: f32) -> f32 {
    (t * PI).sin() * GLOW_ENERGY * GLOW_LIGHTNESS
}

/// Perpetual scale pulse, independent of progress.
#[inline]
pub fn pulse(index: u32, elapsed: f32) -> f32 {
    0.8 + 0.2 * (elapsed * 2.0 + index as f32).sin()
}

/// Derive one entity's pose. Pure; stores nothing.
pub fn entity_pose(entity: &Entity, t: f32, elapsed: f32) -> InstancePose {
    let mut position = blend_position(entity, t);
    let mut rotation = entity.rotation;

    if t < JITTER_CUTOFF {
        let float = (1.0 - t) * entity.weight;
        let phase = elapsed * entity.weight + entity.index as f32;
        position.y += phase.sin() * FLOAT_AMPLITUDE * float;
        rotation += SPIN_RATE * elapsed * float;
    }

    let offset = brightness_offset(t);
    let color = if offset == 0.0 {
        entity.color
    } else {
        color::offset_hsl(entity.color, 0.0, 0.0, offset)
    };

    InstancePose {
        position,
        rotation,
        scale: entity.scale * pulse(entity.index, elapsed),
        color,
    }
}

/// GPU layout of one instance: column-major model matrix and RGBA color.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct InstanceRaw {
    pub model: [[f32; 4]; 4],
    pub color: [f32; 4],
}

/// Instances of one kind, in ascending entity-index order.
#[derive(Debug, Clone)]
pub struct InstanceBatch {
    kind: EntityKind,
    /// Slot → entity index.
    entity_ids: Vec<u32>,
    instances: Vec<InstanceRaw>,
}

impl InstanceBatch {
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Entity index stored in each slot.
    pub fn entity_ids(&self) -> &[u32] {
        &self.entity_ids
    }

    pub fn instances(&self) -> &[InstanceRaw] {
        &self.instances
    }

    /// Raw bytes for a single buffer upload.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }
}

/// Output buffers for the whole entity population.
///
/// Sized once from the entity list; [`update`](Self::update) only overwrites
/// slots. The generation counter bumps once per update so a host can tell
/// whether it has uploaded the latest frame.
#[derive(Debug, Clone)]
pub struct InstanceBatches {
    batches: [InstanceBatch; 2],
    entity_count: usize,
    generation: u64,
}

impl InstanceBatches {
    pub fn new(entities: &[Entity]) -> Self {
        let batches = EntityKind::ALL.map(|kind| {
            let entity_ids: Vec<u32> = entities
                .iter()
                .filter(|e| e.kind == kind)
                .map(|e| e.index)
                .collect();
            let instances = vec![InstanceRaw::zeroed(); entity_ids.len()];
            InstanceBatch {
                kind,
                entity_ids,
                instances,
            }
        });

        Self {
            batches,
            entity_count: entities.len(),
            generation: 0,
        }
    }

    /// Recompute every slot for progress `t` at time `elapsed`.
    pub fn update(&mut self, entities: &[Entity], t: f32, elapsed: f32) {
        debug_assert_eq!(entities.len(), self.entity_count, "batches built for another population");

        for batch in &mut self.batches {
            for (slot, &id) in batch.instances.iter_mut().zip(&batch.entity_ids) {
                if let Some(entity) = entities.get(id as usize) {
                    *slot = entity_pose(entity, t, elapsed).to_raw();
                }
            }
        }
        self.generation += 1;
    }

    pub fn batch(&self, kind: EntityKind) -> &InstanceBatch {
        match kind {
            EntityKind::Box => &self.batches[0],
            EntityKind::Sphere => &self.batches[1],
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &InstanceBatch> {
        self.batches.iter()
    }

    /// Number of completed updates.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Total instances over all kinds.
    pub fn len(&self) -> usize {
        self.entity_count
    }

    pub fn is_empty(&self) -> bool {
        self.entity_count == 0
    }
}
