//! The per-frame entry point tying everything together.
//!
//! A [`Scene`] owns both populations, the shared transition and the reusable
//! instance batches. A host calls [`Scene::frame`] once per redraw and reads
//! the results back by reference.

use crate::config::{Palette, Settings};
use crate::error::ConfigError;
use crate::field::FieldParams;
use crate::instances::InstanceBatches;
use crate::layout::{generate_entities, Entity, EntityParams, PointField};
use crate::transition::{Target, TransitionState};

/// Both populations plus the state that animates them.
#[derive(Debug, Clone)]
pub struct Scene {
    settings: Settings,
    palette: Palette,
    entity_params: EntityParams,
    points: PointField,
    entities: Vec<Entity>,
    batches: InstanceBatches,
    transition: TransitionState,
    elapsed: f32,
    seed: Option<u64>,
}

impl Scene {
    /// Validate `settings` and generate both populations.
    ///
    /// With a seed, the points use `seed` and the entities `seed + 1`, so the
    /// whole scene is reproducible.
    pub fn new(settings: Settings, seed: Option<u64>) -> Result<Self, ConfigError> {
        settings.validate()?;
        let palette = settings.palette()?;
        let entity_params = EntityParams::from_settings(&settings)?;
        let transition = TransitionState::new(settings.time_constant)?;

        let points = PointField::from_settings(&settings, seed)?;
        let entities = generate_entities(settings.entity_count, &entity_params, entity_seed(seed));
        let batches = InstanceBatches::new(&entities);

        tracing::info!(
            points = points.len(),
            entities = entities.len(),
            ?seed,
            "Scene generated"
        );

        let mut scene = Self {
            settings,
            palette,
            entity_params,
            points,
            entities,
            batches,
            transition,
            elapsed: 0.0,
            seed,
        };
        scene.refresh_instances();
        Ok(scene)
    }

    /// Advance the transition by `delta` and recompute every instance at
    /// time `elapsed`.
    pub fn frame(&mut self, elapsed: f32, delta: f32) -> &InstanceBatches {
        self.elapsed = elapsed;
        self.transition.advance(delta);
        self.refresh_instances();
        &self.batches
    }

    fn refresh_instances(&mut self) {
        self.batches
            .update(&self.entities, self.transition.progress(), self.elapsed);
    }

    pub fn set_target(&mut self, target: Target) {
        self.transition.set_target(target);
    }

    /// Flip between scattered and assembled; returns the new target.
    pub fn toggle(&mut self) -> Target {
        self.transition.toggle()
    }

    pub fn target(&self) -> Target {
        self.transition.target()
    }

    pub fn progress(&self) -> f32 {
        self.transition.progress()
    }

    pub fn transition(&self) -> &TransitionState {
        &self.transition
    }

    /// Time passed to the last [`frame`](Self::frame).
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Point-kernel inputs for the current frame, with an identity
    /// model-view. Hosts attach their camera with
    /// [`FieldParams::with_model_view`].
    pub fn field_params(&self) -> FieldParams {
        FieldParams::new(self.transition.progress(), self.elapsed, &self.palette)
    }

    /// Regenerate the point population at a new size.
    pub fn resize_points(&mut self, count: usize) -> Result<(), ConfigError> {
        if count == self.points.len() {
            return Ok(());
        }
        let settings = Settings {
            point_count: count,
            ..self.settings.clone()
        };
        self.points = PointField::from_settings(&settings, self.seed)?;
        self.settings = settings;
        tracing::info!(count, "Resized point population");
        Ok(())
    }

    /// Regenerate the entity population at a new size.
    pub fn resize_entities(&mut self, count: usize) -> Result<(), ConfigError> {
        if count == self.entities.len() {
            return Ok(());
        }
        self.entities = generate_entities(count, &self.entity_params, entity_seed(self.seed));
        self.batches = InstanceBatches::new(&self.entities);
        self.settings.entity_count = count;
        self.refresh_instances();
        tracing::info!(count, "Resized entity population");
        Ok(())
    }

    pub fn points(&self) -> &PointField {
        &self.points
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn batches(&self) -> &InstanceBatches {
        &self.batches
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }
}

fn entity_seed(seed: Option<u64>) -> Option<u64> {
    seed.map(|s| s.wrapping_add(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::EntityKind;

    fn small() -> Settings {
        Settings {
            point_count: 200,
            entity_count: 40,
            ..Settings::default()
        }
    }

    #[test]
    fn test_new_rejects_invalid_settings() {
        let settings = Settings {
            time_constant: 0.0,
            ..small()
        };
        assert!(Scene::new(settings, Some(1)).is_err());

        let settings = Settings {
            cone_radius: -1.0,
            ..small()
        };
        assert!(Scene::new(settings, Some(1)).is_err());
    }

    #[test]
    fn test_starts_scattered() {
        let scene = Scene::new(small(), Some(1)).unwrap();
        assert_eq!(scene.target(), Target::Scattered);
        assert_eq!(scene.progress(), 0.0);
        assert_eq!(scene.points().len(), 200);
        assert_eq!(scene.entities().len(), 40);
        assert_eq!(scene.batches().generation(), 1);
    }

    #[test]
    fn test_frame_advances_progress_and_generation() {
        let mut scene = Scene::new(small(), Some(1)).unwrap();
        scene.set_target(Target::Assembled);
        scene.frame(0.016, 0.016);
        assert!(scene.progress() > 0.0);
        assert_eq!(scene.elapsed(), 0.016);
        assert_eq!(scene.batches().generation(), 2);
    }

    #[test]
    fn test_field_params_track_transition() {
        let mut scene = Scene::new(small(), Some(1)).unwrap();
        scene.toggle();
        scene.frame(1.5, 0.4);
        let params = scene.field_params();
        assert_eq!(params.mix, scene.progress());
        assert_eq!(params.time, 1.5);
        assert_eq!(params.color_deep, scene.palette().deep);
    }

    #[test]
    fn test_resize_regenerates() {
        let mut scene = Scene::new(small(), Some(4)).unwrap();
        scene.resize_points(50).unwrap();
        assert_eq!(scene.points().len(), 50);
        assert_eq!(scene.settings().point_count, 50);

        scene.resize_entities(0).unwrap();
        assert!(scene.batches().is_empty());
        scene.frame(1.0, 0.1);

        scene.resize_entities(12).unwrap();
        let total: usize = EntityKind::ALL
            .iter()
            .map(|&k| scene.batches().batch(k).len())
            .sum();
        assert_eq!(total, 12);
    }

    #[test]
    fn test_seeded_scenes_match() {
        let a = Scene::new(small(), Some(9)).unwrap();
        let b = Scene::new(small(), Some(9)).unwrap();
        assert_eq!(a.points(), b.points());
        assert_eq!(a.entities(), b.entities());
    }
}
