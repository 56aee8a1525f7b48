//! Frame clock supplying `(elapsed, delta)` to the scene.
//!
//! Elapsed time is the sum of the deltas handed out, so pausing, scaling or
//! switching to a fixed step never makes it jump.
//!
//! # Example
//!
//! ```ignore
//! let mut clock = FrameClock::new();
//!
//! // Once per redraw:
//! let (elapsed, delta) = clock.tick();
//! scene.frame(elapsed, delta);
//! ```

use std::time::{Duration, Instant};

/// Wall-clock frame timing with pause, time scale and a fixed-step mode.
#[derive(Debug)]
pub struct FrameClock {
    last_frame: Instant,
    elapsed_secs: f32,
    delta_secs: f32,
    frame_count: u64,
    fps: f32,
    fps_frame_count: u64,
    fps_update_time: Instant,
    fps_update_interval: Duration,
    paused: bool,
    /// Replaces the measured delta when set.
    fixed_delta: Option<f32>,
    time_scale: f32,
}

impl FrameClock {
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            last_frame: now,
            elapsed_secs: 0.0,
            delta_secs: 0.0,
            frame_count: 0,
            fps: 0.0,
            fps_frame_count: 0,
            fps_update_time: now,
            fps_update_interval: Duration::from_millis(500),
            paused: false,
            fixed_delta: None,
            time_scale: 1.0,
        }
    }

    /// Measure the time since the previous tick and advance by it.
    ///
    /// Returns `(elapsed, delta)` in seconds. While paused, delta is zero.
    pub fn tick(&mut self) -> (f32, f32) {
        let now = Instant::now();
        let raw = now.duration_since(self.last_frame).as_secs_f32();
        self.last_frame = now;

        let result = self.advance_by(self.fixed_delta.unwrap_or(raw));

        let since = now.duration_since(self.fps_update_time);
        if since >= self.fps_update_interval {
            let frames = self.frame_count - self.fps_frame_count;
            self.fps = frames as f32 / since.as_secs_f32();
            self.fps_frame_count = self.frame_count;
            self.fps_update_time = now;
        }

        result
    }

    /// Advance by an explicit delta instead of measuring one.
    ///
    /// Time scale and pause still apply. Negative or non-finite deltas count
    /// as zero.
    pub fn advance_by(&mut self, delta: f32) -> (f32, f32) {
        self.delta_secs = if self.paused || !delta.is_finite() || delta < 0.0 {
            0.0
        } else {
            delta * self.time_scale
        };
        self.elapsed_secs += self.delta_secs;
        self.frame_count += 1;
        (self.elapsed_secs, self.delta_secs)
    }

    #[inline]
    pub fn elapsed(&self) -> f32 {
        self.elapsed_secs
    }

    #[inline]
    pub fn delta(&self) -> f32 {
        self.delta_secs
    }

    /// Ticks since creation, paused ones included.
    #[inline]
    pub fn frame(&self) -> u64 {
        self.frame_count
    }

    /// Frames per second, refreshed twice a second.
    #[inline]
    pub fn fps(&self) -> f32 {
        self.fps
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            // don't count the paused interval as one long frame
            self.last_frame = Instant::now();
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Use a constant delta per tick, e.g. `Some(1.0 / 60.0)`.
    pub fn set_fixed_delta(&mut self, delta: Option<f32>) {
        self.fixed_delta = delta.filter(|d| d.is_finite() && *d > 0.0);
    }

    #[inline]
    pub fn fixed_delta(&self) -> Option<f32> {
        self.fixed_delta
    }

    /// Speed multiplier; negative values clamp to zero.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = if scale.is_finite() { scale.max(0.0) } else { 1.0 };
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_elapsed_is_sum_of_deltas() {
        let mut clock = FrameClock::new();
        clock.advance_by(0.25);
        clock.advance_by(0.5);
        let (elapsed, delta) = clock.advance_by(0.25);
        assert_eq!(elapsed, 1.0);
        assert_eq!(delta, 0.25);
        assert_eq!(clock.frame(), 3);
    }

    #[test]
    fn test_pause_freezes_time() {
        let mut clock = FrameClock::new();
        clock.advance_by(1.0);
        clock.pause();
        let (elapsed, delta) = clock.advance_by(5.0);
        assert_eq!(elapsed, 1.0);
        assert_eq!(delta, 0.0);
        clock.toggle_pause();
        assert!(!clock.is_paused());
        assert_eq!(clock.advance_by(1.0).0, 2.0);
    }

    #[test]
    fn test_time_scale() {
        let mut clock = FrameClock::new();
        clock.set_time_scale(0.5);
        assert_eq!(clock.advance_by(2.0), (1.0, 1.0));
        clock.set_time_scale(-3.0);
        assert_eq!(clock.time_scale(), 0.0);
    }

    #[test]
    fn test_bad_deltas_count_as_zero() {
        let mut clock = FrameClock::new();
        assert_eq!(clock.advance_by(-1.0), (0.0, 0.0));
        assert_eq!(clock.advance_by(f32::NAN), (0.0, 0.0));
    }

    #[test]
    fn test_fixed_delta() {
        let mut clock = FrameClock::new();
        clock.set_fixed_delta(Some(1.0 / 60.0));
        let (_, delta) = clock.tick();
        assert_eq!(delta, 1.0 / 60.0);
        clock.set_fixed_delta(Some(0.0));
        assert_eq!(clock.fixed_delta(), None);
    }
}
