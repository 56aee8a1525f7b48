//! Orbit camera for the viewer.

use glam::{Mat4, Vec3};
use std::f32::consts::{FRAC_PI_2, FRAC_PI_6, TAU};

const MIN_DISTANCE: f32 = 10.0;
const MAX_DISTANCE: f32 = 40.0;
/// Lowest pitch: the camera may dip 30° below the horizon.
const MIN_PITCH: f32 = -FRAC_PI_6;
const MAX_PITCH: f32 = FRAC_PI_2 - 0.01;
/// Radians per second while auto-rotating (one turn per minute).
const AUTO_ROTATE_SPEED: f32 = TAU / 60.0;

/// Orbit camera looking at a fixed target.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
}

impl Camera {
    /// Slightly above the horizon, 25 units back.
    pub fn new() -> Self {
        let offset = Vec3::new(0.0, 2.0, 25.0);
        Self {
            yaw: 0.0,
            pitch: (offset.y / offset.z).atan(),
            distance: offset.length(),
            target: Vec3::ZERO,
            fov_y: 50.0_f32.to_radians(),
        }
    }

    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect.max(1e-3), 0.1, 100.0)
    }

    /// Rotate by a mouse drag of `(dx, dy)` pixels.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.yaw -= dx * 0.005;
        self.pitch = (self.pitch + dy * 0.005).clamp(MIN_PITCH, MAX_PITCH);
    }

    /// Move closer for positive `scroll`.
    pub fn zoom(&mut self, scroll: f32) {
        self.distance = (self.distance - scroll).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Spin around the target for `dt` seconds.
    pub fn auto_rotate(&mut self, dt: f32) {
        self.yaw = (self.yaw + AUTO_ROTATE_SPEED * dt).rem_euclid(TAU);
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_position() {
        let camera = Camera::new();
        assert!((camera.position() - Vec3::new(0.0, 2.0, 25.0)).length() < 1e-4);
    }

    #[test]
    fn test_zoom_clamps() {
        let mut camera = Camera::new();
        camera.zoom(100.0);
        assert_eq!(camera.distance, MIN_DISTANCE);
        camera.zoom(-100.0);
        assert_eq!(camera.distance, MAX_DISTANCE);
    }

    #[test]
    fn test_orbit_clamps_pitch() {
        let mut camera = Camera::new();
        camera.orbit(0.0, -10_000.0);
        assert_eq!(camera.pitch, MIN_PITCH);
        camera.orbit(0.0, 10_000.0);
        assert_eq!(camera.pitch, MAX_PITCH);
    }

    #[test]
    fn test_auto_rotate_wraps() {
        let mut camera = Camera::new();
        camera.auto_rotate(90.0);
        assert!((0.0..TAU).contains(&camera.yaw));
        assert!((camera.yaw - TAU / 2.0).abs() < 1e-3);
    }
}
